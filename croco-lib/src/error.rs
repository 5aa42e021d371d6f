use std::fmt;

use croco_core::RtcError;
use thiserror::Error;

/// Device operation that answers with a status byte.
///
/// Used to name the failing step when the cartridge refuses a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    RomUpload,
    RomChunk,
    DeleteRom,
    SavegameDownload,
    SavegameUpload,
    SavegameChunk,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::RomUpload => "ROM not accepted",
            Self::RomChunk => "ROM chunk not accepted",
            Self::DeleteRom => "Delete failed",
            Self::SavegameDownload => "Savegame download not accepted",
            Self::SavegameUpload => "Savegame upload not accepted",
            Self::SavegameChunk => "Savegame chunk not accepted",
        };
        f.write_str(msg)
    }
}

/// Errors that can occur while talking to the cartridge.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// I/O failure on the physical channel (including timeouts)
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The response frame echoed a different command id
    #[error("Protocol mismatch: sent command {sent}, device answered {received}")]
    ProtocolMismatch { sent: u8, received: u8 },

    /// The transport returned fewer bytes than the command's response needs
    #[error("Short response to command {command}: expected {expected} bytes, got {actual}")]
    ShortResponse {
        command: u8,
        expected: usize,
        actual: usize,
    },

    /// The device answered with a non-zero status byte
    #[error("{operation} (status {status})")]
    Rejected { operation: Operation, status: u8 },

    /// A downloaded chunk carried an unexpected bank/chunk address
    #[error(
        "Sequence mismatch: expected bank {expected_bank} chunk {expected_chunk}, got bank {bank} chunk {chunk}"
    )]
    SequenceMismatch {
        expected_bank: u16,
        expected_chunk: u16,
        bank: u16,
        chunk: u16,
    },

    /// The slot has no clock hardware (not an error for end users)
    #[error("No RTC data for slot {slot}")]
    RtcUnavailable { slot: u8 },

    /// The device did not confirm an RTC write
    #[error("Storing RTC data for slot {slot} failed (device echoed {echoed})")]
    RtcStoreFailed { slot: u8, echoed: u8 },

    /// A request payload does not fit one frame
    #[error("Payload of {0} bytes exceeds the 63-byte frame limit")]
    PayloadTooLarge(usize),

    /// The ROM needs more banks than the cartridge has free
    #[error("Not enough free banks available on cart: ROM needs {needed}, {available} free")]
    InsufficientSpace { needed: u16, available: u16 },

    /// The slot name is empty or does not fit the name field
    #[error("Invalid ROM name: {0}")]
    InvalidName(String),

    /// The buffer handed to an upload is smaller than the declared transfer
    #[error("Source buffer too short: expected {expected} bytes, got {actual}")]
    SourceTooShort { expected: usize, actual: usize },

    /// A savegame file does not match the slot's RAM size
    #[error(
        "Wrong savegame size: expected {expected} bytes (or {expected} + 48 with RTC), got {actual}"
    )]
    InvalidSaveSize { expected: usize, actual: usize },

    /// An RTC record could not be decoded or rewritten
    #[error(transparent)]
    Rtc(#[from] RtcError),
}

impl ProtocolError {
    pub fn rejected(operation: Operation, status: u8) -> Self {
        Self::Rejected { operation, status }
    }

    pub fn invalid_name(msg: impl Into<String>) -> Self {
        Self::InvalidName(msg.into())
    }

    /// True for the expected "slot has no clock" signal.
    pub fn is_rtc_unavailable(&self) -> bool {
        matches!(self, Self::RtcUnavailable { .. })
    }
}
