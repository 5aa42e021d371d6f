use serde::{Deserialize, Serialize};

/// What a bulk transfer is moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayloadKind {
    /// A ROM image, moved in 16 KiB banks
    Rom,
    /// Cartridge save RAM, moved in 8 KiB banks (or one 512-byte MBC2 region)
    SaveRam,
}

impl PayloadKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Rom => "ROM",
            Self::SaveRam => "save RAM",
        }
    }
}

/// Progress snapshot emitted after every chunk of a bulk transfer.
///
/// Sent over a tokio channel so frontends can render a progress bar
/// without stalling the transfer loop. `bytes_done` only ever grows within
/// one transfer and equals `total_bytes` exactly on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferProgress {
    pub kind: PayloadKind,
    /// Bytes moved and acknowledged so far
    pub bytes_done: u64,
    /// Bytes the transfer declared up front
    pub total_bytes: u64,
    /// Fully transferred banks
    pub banks_done: u16,
    /// Banks the transfer declared up front
    pub total_banks: u16,
}

impl TransferProgress {
    pub fn started(kind: PayloadKind, total_bytes: u64, total_banks: u16) -> Self {
        Self {
            kind,
            bytes_done: 0,
            total_bytes,
            banks_done: 0,
            total_banks,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.bytes_done == self.total_bytes
    }

    /// Returns the progress fraction (0.0 to 1.0).
    pub fn percentage(&self) -> f64 {
        if self.total_bytes == 0 {
            1.0
        } else {
            self.bytes_done as f64 / self.total_bytes as f64
        }
    }
}
