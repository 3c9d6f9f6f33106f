pub mod controller;
pub mod protocol;
pub mod registers;
pub mod sim;
#[cfg(target_os = "windows")]
mod windows;

use crate::errors::EcControlError;

pub use controller::EcController;

/// Capability interface over the privileged port I/O provider.
///
/// The provider exposes exactly these primitives: resolve itself (`load`),
/// activate raw port access (`init`), 8-bit port read/write, and teardown
/// (`deinit`). Implementations never interpret EC semantics.
pub trait PortGateway {
    /// Resolve the provider and its entry points. Fails with
    /// [`EcControlError::LoadFailure`] when the provider cannot be located
    /// or an entry point is missing.
    fn load(&mut self) -> Result<(), EcControlError>;

    /// Activate privileged port access. Fails with
    /// [`EcControlError::InitFailure`] carrying the provider's status code
    /// when activation is refused.
    fn init(&mut self) -> Result<(), EcControlError>;

    /// Read one byte from an I/O port.
    ///
    /// Returns 0 without touching hardware when the provider is not active.
    /// Callers that need to distinguish "refused, zero returned" from
    /// "hardware reported zero" must consult the controller's initialization
    /// state, not the payload.
    fn read_port(&mut self, port: u16) -> u8;

    /// Write one byte to an I/O port. A no-op when the provider is not
    /// active.
    fn write_port(&mut self, port: u16, value: u8);

    /// Release the provider. Idempotent, safe after a failed or partial
    /// initialization.
    fn deinit(&mut self);
}

impl<G: PortGateway + ?Sized> PortGateway for Box<G> {
    fn load(&mut self) -> Result<(), EcControlError> {
        self.as_mut().load()
    }

    fn init(&mut self) -> Result<(), EcControlError> {
        self.as_mut().init()
    }

    fn read_port(&mut self, port: u16) -> u8 {
        self.as_mut().read_port(port)
    }

    fn write_port(&mut self, port: u16, value: u8) {
        self.as_mut().write_port(port, value)
    }

    fn deinit(&mut self) {
        self.as_mut().deinit()
    }
}

/// Create the hardware-backed gateway for this platform.
pub fn create_gateway() -> Result<Box<dyn PortGateway>, EcControlError> {
    #[cfg(target_os = "windows")]
    {
        Ok(Box::new(windows::DriverGateway::new()))
    }
    #[cfg(not(target_os = "windows"))]
    {
        Err(EcControlError::LoadFailure(
            "raw port I/O is only available through the WinRing0 provider on Windows; \
             use --simulate on other platforms"
                .into(),
        ))
    }
}
