//! Savegame files as stored on the host.
//!
//! A save file is the raw save RAM, optionally followed by the slot's
//! 48-byte RTC record (UTC timestamp). MBC2 cartridges always use a 512-byte
//! RAM image.

use croco_core::{RTC_RECORD_SIZE, RtcRecord};

use crate::command::RomSlotInfo;
use crate::error::ProtocolError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveFile {
    pub ram: Vec<u8>,
    pub rtc: Option<RtcRecord>,
}

impl SaveFile {
    /// Split a save file read from disk, validating its size for `slot`.
    ///
    /// Accepts exactly the slot's RAM size, or that size plus one RTC record.
    pub fn from_bytes(bytes: &[u8], slot: &RomSlotInfo) -> Result<Self, ProtocolError> {
        let ram_size = slot.save_ram_size();
        if bytes.len() == ram_size {
            return Ok(Self {
                ram: bytes.to_vec(),
                rtc: None,
            });
        }
        if bytes.len() == ram_size + RTC_RECORD_SIZE {
            return Ok(Self {
                ram: bytes[..ram_size].to_vec(),
                rtc: Some(RtcRecord::from_slice(&bytes[ram_size..])?),
            });
        }
        Err(ProtocolError::InvalidSaveSize {
            expected: ram_size,
            actual: bytes.len(),
        })
    }

    /// Serialize as RAM followed by the RTC record, if any.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.ram.len() + RTC_RECORD_SIZE);
        bytes.extend_from_slice(&self.ram);
        if let Some(rtc) = &self.rtc {
            bytes.extend_from_slice(rtc.as_bytes());
        }
        bytes
    }

    pub fn has_rtc(&self) -> bool {
        self.rtc.is_some()
    }
}
