use thiserror::Error;

#[derive(Error, Debug)]
pub enum EcControlError {
    #[error("failed to load the port I/O provider: {0}")]
    LoadFailure(String),

    #[error("port I/O provider refused to initialize (status 0x{0:08X})")]
    InitFailure(u32),

    #[error("EC controller is not initialized")]
    NotInitialized,

    #[error("table '{table}' has {actual} entries, expected {expected}")]
    InvalidShape {
        table: &'static str,
        actual: usize,
        expected: usize,
    },
}
