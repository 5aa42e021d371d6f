//! The cartridge command table.
//!
//! Every command has a fixed request shape and a fixed response length for a
//! given feature step. [`Command::response_len`] and the encode/decode
//! functions below are the only place those byte layouts are written down;
//! the session and transfer code never index into raw responses themselves.
//!
//! | Id | Command | Request | Response |
//! |---|---|---|---|
//! | 254 | device info | - | step, hw, major, minor, patch, build type, build id (4), dirty |
//! | 253 | serial id | - | 8 bytes |
//! | 1 | ROM utilization | - | roms, used banks (2), max banks (2) |
//! | 2 | request ROM upload | banks (2), name (17), \[speed bank (2)\] | status |
//! | 3 | send ROM chunk | bank (2), chunk (2), data (32) | status |
//! | 4 | ROM info | slot | name (17), RAM banks, \[MBC, ROM banks (2)\] |
//! | 5 | delete ROM | slot | status, reserved |
//! | 6 | request savegame download | slot | status, reserved |
//! | 7 | receive savegame chunk | - | bank (2), chunk (2), data (32) |
//! | 8 | request savegame upload | slot | status |
//! | 9 | send savegame chunk | bank (2), chunk (2), data (32) | status |
//! | 10 | fetch RTC | slot | slot echo, record (48) |
//! | 11 | send RTC | slot, record (48) | slot echo, record (48) |
//!
//! All multi-byte integers are big-endian.

use croco_core::util::{hex_upper, nul_padded, read_nul_terminated, read_u16_be, read_u32_be};
use croco_core::{CHUNK_SIZE, RTC_RECORD_SIZE, RtcRecord};
use croco_gameboy::MbcType;

use crate::capability::{Capabilities, DeviceInfo, FirmwareVersion};
use crate::error::{Operation, ProtocolError};

/// Width of the NUL-padded name field.
pub const NAME_FIELD_SIZE: usize = 17;
/// Longest slot name that still leaves room for the terminating NUL.
pub const MAX_NAME_LEN: usize = NAME_FIELD_SIZE - 1;

const SERIAL_ID_SIZE: usize = 8;
const CHUNK_HEADER_SIZE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    RomUtilization = 1,
    RequestRomUpload = 2,
    SendRomChunk = 3,
    RomInfo = 4,
    DeleteRom = 5,
    RequestSavegameDownload = 6,
    ReceiveSavegameChunk = 7,
    RequestSavegameUpload = 8,
    SendSavegameChunk = 9,
    FetchRtc = 10,
    SendRtc = 11,
    SerialId = 253,
    DeviceInfo = 254,
}

impl Command {
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Response payload length, excluding the echoed command id.
    pub fn response_len(self, caps: &Capabilities) -> usize {
        match self {
            Self::DeviceInfo => 11,
            Self::SerialId => SERIAL_ID_SIZE,
            Self::RomUtilization => 5,
            Self::RequestRomUpload
            | Self::SendRomChunk
            | Self::RequestSavegameUpload
            | Self::SendSavegameChunk => 1,
            Self::RomInfo if caps.supports_mbc_info() => NAME_FIELD_SIZE + 4,
            Self::RomInfo => NAME_FIELD_SIZE + 1,
            Self::DeleteRom | Self::RequestSavegameDownload => 2,
            Self::ReceiveSavegameChunk => CHUNK_HEADER_SIZE + CHUNK_SIZE,
            Self::FetchRtc | Self::SendRtc => 1 + RTC_RECORD_SIZE,
        }
    }
}

// -- Records ----------------------------------------------------------------

/// Slot table occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RomUtilization {
    pub rom_count: u8,
    pub used_banks: u16,
    pub max_banks: u16,
}

impl RomUtilization {
    pub fn free_banks(&self) -> u16 {
        self.max_banks.saturating_sub(self.used_banks)
    }
}

/// One entry of the on-device ROM table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomSlotInfo {
    pub slot: u8,
    pub name: String,
    pub ram_banks: u8,
    /// Only reported by feature step 3 firmware
    pub mbc: Option<MbcType>,
    /// Only reported by feature step 3 firmware
    pub rom_banks: Option<u16>,
}

impl RomSlotInfo {
    /// Size of the slot's save RAM in bytes (512 for MBC2).
    pub fn save_ram_size(&self) -> usize {
        match self.mbc {
            Some(mbc) => mbc.save_ram_size(self.ram_banks),
            None => self.ram_banks as usize * croco_core::RAM_BANK_SIZE,
        }
    }

    pub fn has_save_ram(&self) -> bool {
        self.save_ram_size() > 0
    }
}

/// One chunk received during a savegame download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveChunk {
    pub bank: u16,
    pub chunk: u16,
    pub data: Vec<u8>,
}

/// Echo and record returned by the RTC commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtcReply {
    pub slot: u8,
    pub record: RtcRecord,
}

// -- Encoders ---------------------------------------------------------------

/// Payload of a ROM upload request.
///
/// The speed-change bank is only appended when the firmware understands it.
pub fn encode_rom_upload_request(
    caps: &Capabilities,
    bank_count: u16,
    name: &str,
    speed_change_bank: u16,
) -> Result<Vec<u8>, ProtocolError> {
    validate_name(name)?;
    let mut payload = Vec::with_capacity(2 + NAME_FIELD_SIZE + 2);
    payload.extend_from_slice(&bank_count.to_be_bytes());
    payload.extend(nul_padded(name, NAME_FIELD_SIZE).unwrap_or_default());
    if caps.supports_speed_change_bank() {
        payload.extend_from_slice(&speed_change_bank.to_be_bytes());
    }
    Ok(payload)
}

/// Slot names must be non-empty and leave room for the terminating NUL.
pub fn validate_name(name: &str) -> Result<(), ProtocolError> {
    if name.is_empty() {
        return Err(ProtocolError::invalid_name("ROM name must not be empty"));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(ProtocolError::invalid_name(format!(
            "'{}' is {} bytes, at most {} fit",
            name,
            name.len(),
            MAX_NAME_LEN
        )));
    }
    Ok(())
}

/// Payload of a ROM or savegame chunk: bank, chunk index, then the data.
pub fn encode_chunk(bank: u16, chunk: u16, data: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(CHUNK_HEADER_SIZE + data.len());
    payload.extend_from_slice(&bank.to_be_bytes());
    payload.extend_from_slice(&chunk.to_be_bytes());
    payload.extend_from_slice(data);
    payload
}

pub fn encode_rtc_store(slot: u8, record: &RtcRecord) -> Vec<u8> {
    let mut payload = Vec::with_capacity(1 + RTC_RECORD_SIZE);
    payload.push(slot);
    payload.extend_from_slice(record.as_bytes());
    payload
}

// -- Decoders ---------------------------------------------------------------
//
// Each decoder receives a body of exactly `response_len` bytes, which the
// frame codec has already checked.

pub fn decode_device_info(body: &[u8]) -> DeviceInfo {
    DeviceInfo {
        feature_step: body[0],
        hw_version: body[1],
        firmware: FirmwareVersion {
            major: body[2],
            minor: body[3],
            patch: body[4],
            build_type: char::from(body[5]),
            build_id: read_u32_be(body, 6),
            dirty: body[10] != 0,
        },
    }
}

pub fn decode_serial_id(body: &[u8]) -> String {
    hex_upper(&body[..SERIAL_ID_SIZE])
}

pub fn decode_rom_utilization(body: &[u8]) -> RomUtilization {
    RomUtilization {
        rom_count: body[0],
        used_banks: read_u16_be(body, 1),
        max_banks: read_u16_be(body, 3),
    }
}

pub fn decode_rom_info(slot: u8, caps: &Capabilities, body: &[u8]) -> RomSlotInfo {
    let name = read_nul_terminated(&body[..NAME_FIELD_SIZE]);
    let ram_banks = body[NAME_FIELD_SIZE];

    let (mbc, rom_banks) = if caps.supports_mbc_info() {
        let code = body[NAME_FIELD_SIZE + 1];
        let mbc = MbcType::from_device_code(code);
        if mbc.is_none() {
            log::warn!("Slot {} reports unknown MBC code {}", slot, code);
        }
        (mbc, Some(read_u16_be(body, NAME_FIELD_SIZE + 2)))
    } else {
        (None, None)
    };

    RomSlotInfo {
        slot,
        name,
        ram_banks,
        mbc,
        rom_banks,
    }
}

pub fn decode_save_chunk(body: &[u8]) -> SaveChunk {
    SaveChunk {
        bank: read_u16_be(body, 0),
        chunk: read_u16_be(body, 2),
        data: body[CHUNK_HEADER_SIZE..CHUNK_HEADER_SIZE + CHUNK_SIZE].to_vec(),
    }
}

pub fn decode_rtc_reply(body: &[u8]) -> Result<RtcReply, ProtocolError> {
    Ok(RtcReply {
        slot: body[0],
        record: RtcRecord::from_slice(&body[1..1 + RTC_RECORD_SIZE])?,
    })
}

/// Map a status byte to `Ok` (zero) or a rejection for `operation`.
pub fn check_status(operation: Operation, status: u8) -> Result<(), ProtocolError> {
    if status == 0 {
        Ok(())
    } else {
        Err(ProtocolError::rejected(operation, status))
    }
}

#[cfg(test)]
#[path = "tests/command_tests.rs"]
mod tests;
