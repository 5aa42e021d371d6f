use thiserror::Error;

use croco_core::RtcError;
use croco_gameboy::HeaderError;
use croco_lib::ProtocolError;

/// Errors that can occur during CLI command execution.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    /// I/O error
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// Talking to the cartridge failed
    #[error("{0}")]
    Protocol(#[from] ProtocolError),

    /// RTC record could not be decoded
    #[error("Invalid RTC record: {0}")]
    Rtc(#[from] RtcError),

    /// ROM image could not be analyzed
    #[error("Invalid ROM: {0}")]
    Header(#[from] HeaderError),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Runtime creation or async error
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Catch-all for other errors
    #[error("{0}")]
    Other(String),
}

impl CliError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub(crate) fn runtime(msg: impl Into<String>) -> Self {
        Self::Runtime(msg.into())
    }

    pub(crate) fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}
