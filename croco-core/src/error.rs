use thiserror::Error;

/// Errors raised while decoding or rewriting an RTC record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RtcError {
    /// The buffer does not hold exactly one 48-byte record
    #[error("RTC record must be {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// The stored timestamp does not fit a signed 64-bit seconds value
    #[error("RTC timestamp {0} is out of range")]
    TimestampOutOfRange(u64),

    /// A negative timestamp cannot be written to the unsigned field
    #[error("cannot store negative RTC timestamp {0}")]
    NegativeTimestamp(i64),
}
