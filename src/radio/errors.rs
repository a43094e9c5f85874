use thiserror::Error;

/// Errors raised while talking to the radio over its serial link.
#[derive(Debug, Error)]
pub enum RadioError {
    /// Read/write failure on the byte stream.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure opening or configuring the serial port.
    #[error("serial port {port}: {reason}")]
    Serial { port: String, reason: String },

    /// Another sender panicked while holding the write lock.
    #[error("command channel lock poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, RadioError>;
