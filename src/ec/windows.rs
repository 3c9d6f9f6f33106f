//! Port I/O gateway backed by the WinRing0 wrapper DLL.
//!
//! The wrapper exports C entry points over the WinRing0 kernel driver:
//! `LoadWinRing0`, `InitWinRing0`, `ReadPort`, `WritePort`, `GetStatus`,
//! `DeinitWinRing0`. All of them are resolved up front; a missing export is
//! a load failure, and `GetStatus` supplies the provider status code
//! reported when activation is refused. Each gateway instance owns its own
//! module handle — nothing here is process-global, so independent
//! controllers (and tests) can coexist.

use std::ffi::OsStr;
use std::os::windows::ffi::OsStrExt;

use windows::core::{PCSTR, PCWSTR};
use windows::Win32::Foundation::{FreeLibrary, HMODULE};
use windows::Win32::System::LibraryLoader::{GetProcAddress, LoadLibraryW};

use crate::errors::EcControlError;

use super::PortGateway;

/// Wrapper DLL looked up next to the executable / on the loader path.
const PROVIDER_LIBRARY: &str = "winring_wrapper.dll";

// The wrapper is plain C; BOOL is a 32-bit int.
type LoadFn = unsafe extern "system" fn() -> i32;
type InitFn = unsafe extern "system" fn() -> i32;
type ReadPortFn = unsafe extern "system" fn(u16) -> u8;
type WritePortFn = unsafe extern "system" fn(u16, u8);
type StatusFn = unsafe extern "system" fn() -> u32;
type DeinitFn = unsafe extern "system" fn();

/// The five I/O primitives plus the status query, resolved from the DLL.
struct ProviderApi {
    load: LoadFn,
    init: InitFn,
    read_port: ReadPortFn,
    write_port: WritePortFn,
    status: StatusFn,
    deinit: DeinitFn,
}

impl ProviderApi {
    /// Resolve every entry point or fail without keeping the module.
    unsafe fn resolve(module: HMODULE) -> Result<Self, EcControlError> {
        Ok(Self {
            load: symbol(module, b"LoadWinRing0\0")?,
            init: symbol(module, b"InitWinRing0\0")?,
            read_port: symbol(module, b"ReadPort\0")?,
            write_port: symbol(module, b"WritePort\0")?,
            status: symbol(module, b"GetStatus\0")?,
            deinit: symbol(module, b"DeinitWinRing0\0")?,
        })
    }
}

unsafe fn symbol<F: Copy>(module: HMODULE, name: &'static [u8]) -> Result<F, EcControlError> {
    match GetProcAddress(module, PCSTR(name.as_ptr())) {
        Some(proc) => Ok(std::mem::transmute_copy(&proc)),
        None => Err(EcControlError::LoadFailure(format!(
            "missing provider entry point '{}'",
            String::from_utf8_lossy(&name[..name.len() - 1])
        ))),
    }
}

/// Hardware gateway over the dynamically loaded WinRing0 wrapper.
pub struct DriverGateway {
    library: Option<HMODULE>,
    api: Option<ProviderApi>,
    active: bool,
}

impl DriverGateway {
    pub fn new() -> Self {
        Self {
            library: None,
            api: None,
            active: false,
        }
    }
}

impl PortGateway for DriverGateway {
    fn load(&mut self) -> Result<(), EcControlError> {
        if self.library.is_some() {
            return Ok(());
        }

        let path = to_wide(PROVIDER_LIBRARY);
        let module = unsafe { LoadLibraryW(PCWSTR(path.as_ptr())) }.map_err(|error| {
            EcControlError::LoadFailure(format!(
                "could not load {PROVIDER_LIBRARY}: {error} \
                 (ensure the DLL and WinRing0x64.dll sit next to the executable)"
            ))
        })?;

        let api = match unsafe { ProviderApi::resolve(module) } {
            Ok(api) => api,
            Err(error) => {
                unsafe {
                    let _ = FreeLibrary(module);
                }
                return Err(error);
            }
        };

        if unsafe { (api.load)() } == 0 {
            unsafe {
                let _ = FreeLibrary(module);
            }
            return Err(EcControlError::LoadFailure(
                "provider failed to load the WinRing0 driver".into(),
            ));
        }

        self.library = Some(module);
        self.api = Some(api);
        Ok(())
    }

    fn init(&mut self) -> Result<(), EcControlError> {
        let Some(api) = self.api.as_ref() else {
            return Err(EcControlError::LoadFailure(
                "provider is not loaded".into(),
            ));
        };

        if unsafe { (api.init)() } == 0 {
            let status = unsafe { (api.status)() };
            return Err(EcControlError::InitFailure(status));
        }

        self.active = true;
        Ok(())
    }

    fn read_port(&mut self, port: u16) -> u8 {
        if !self.active {
            return 0;
        }
        match self.api.as_ref() {
            Some(api) => unsafe { (api.read_port)(port) },
            None => 0,
        }
    }

    fn write_port(&mut self, port: u16, value: u8) {
        if !self.active {
            return;
        }
        if let Some(api) = self.api.as_ref() {
            unsafe { (api.write_port)(port, value) }
        }
    }

    fn deinit(&mut self) {
        if self.active {
            if let Some(api) = self.api.as_ref() {
                unsafe { (api.deinit)() }
            }
        }
        if let Some(module) = self.library.take() {
            unsafe {
                let _ = FreeLibrary(module);
            }
        }
        self.api = None;
        self.active = false;
    }
}

impl Drop for DriverGateway {
    fn drop(&mut self) {
        self.deinit();
    }
}

/// Null-terminated wide string for the Win32 W-APIs.
fn to_wide(s: &str) -> Vec<u16> {
    OsStr::new(s).encode_wide().chain(std::iter::once(0)).collect()
}
