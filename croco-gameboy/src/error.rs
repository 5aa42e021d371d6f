use thiserror::Error;

/// Errors that can occur while reading a ROM header.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HeaderError {
    /// The buffer ends before the header region does
    #[error("Malformed header: expected at least {expected} bytes, got {actual}")]
    Malformed { expected: usize, actual: usize },

    /// The ROM size code at 0x148 is beyond any cartridge this device holds
    #[error("Unsupported ROM size code {0:#04x}")]
    UnsupportedRomSize(u8),
}
