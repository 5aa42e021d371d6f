//! Shared leaf types for the Croco Cartridge host toolkit.
//!
//! Nothing in this crate touches a transport: it holds the RTC record codec,
//! the transfer progress model and small byte/text helpers used by the
//! protocol client and the ROM analysis crate.

pub mod error;
pub mod progress;
pub mod rtc;
pub mod util;

pub use error::RtcError;
pub use progress::{PayloadKind, TransferProgress};
pub use rtc::{RTC_RECORD_SIZE, RtcRecord, decode_timestamp, encode_timestamp};

/// Size of one ROM bank on the cartridge (16 KiB).
pub const ROM_BANK_SIZE: usize = 0x4000;

/// Size of one save-RAM bank on the cartridge (8 KiB).
pub const RAM_BANK_SIZE: usize = 0x2000;

/// Size of the fixed MBC2 internal RAM region (512 bytes).
pub const MBC2_RAM_SIZE: usize = 0x200;

/// Size of one transfer chunk, the unit of a single round trip.
pub const CHUNK_SIZE: usize = 32;

/// Sentinel speed-change bank meaning "no speed switch found".
pub const NO_SPEED_CHANGE_BANK: u16 = 0xFFFF;
