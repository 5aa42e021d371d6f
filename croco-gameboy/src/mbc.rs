//! Memory bank controller identification.
//!
//! The cartridge only distinguishes the controllers it can emulate. Two
//! encodings exist: the cartridge-type byte at 0x147 of a ROM header, and the
//! one-byte code the firmware reports in its ROM-info response (feature step
//! 3 and later).

use std::fmt;

use croco_core::{MBC2_RAM_SIZE, RAM_BANK_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MbcType {
    None,
    Mbc1,
    Mbc2,
    Mbc3,
    Mbc5,
}

impl MbcType {
    /// Map a header cartridge-type byte (0x147) to a controller.
    pub fn from_cartridge_type(code: u8) -> Option<Self> {
        match code {
            0x00 => Some(Self::None),
            0x01..=0x03 => Some(Self::Mbc1),
            0x05..=0x07 => Some(Self::Mbc2),
            0x0F..=0x13 => Some(Self::Mbc3),
            0x19..=0x1E => Some(Self::Mbc5),
            _ => None,
        }
    }

    /// Map the controller code reported by the firmware.
    pub fn from_device_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::Mbc1),
            2 => Some(Self::Mbc2),
            3 => Some(Self::Mbc3),
            4 => Some(Self::Mbc5),
            _ => None,
        }
    }

    pub fn device_code(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::Mbc1 => 1,
            Self::Mbc2 => 2,
            Self::Mbc3 => 3,
            Self::Mbc5 => 4,
        }
    }

    /// Size in bytes of the save RAM backing `ram_banks` banks.
    ///
    /// MBC2 carries a fixed 512-byte internal RAM whatever the bank count.
    pub fn save_ram_size(&self, ram_banks: u8) -> usize {
        match self {
            Self::Mbc2 => MBC2_RAM_SIZE,
            _ => ram_banks as usize * RAM_BANK_SIZE,
        }
    }
}

impl fmt::Display for MbcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "ROM only",
            Self::Mbc1 => "MBC1",
            Self::Mbc2 => "MBC2",
            Self::Mbc3 => "MBC3",
            Self::Mbc5 => "MBC5",
        };
        f.write_str(name)
    }
}

/// True for the MBC3 cartridge types that carry a real-time clock.
pub fn cartridge_has_rtc(code: u8) -> bool {
    matches!(code, 0x0F | 0x10)
}

/// Number of 8 KiB RAM banks declared by the RAM size byte (0x149).
pub fn ram_bank_count(code: u8) -> u8 {
    const BANKS: [u8; 6] = [0, 0, 1, 4, 16, 8];
    BANKS.get(code as usize).copied().unwrap_or(0)
}

/// Human-readable cartridge type name for a 0x147 code.
pub fn cartridge_type_name(code: u8) -> &'static str {
    match code {
        0x00 => "ROM ONLY",
        0x01 => "MBC1",
        0x02 => "MBC1+RAM",
        0x03 => "MBC1+RAM+BATTERY",
        0x05 => "MBC2",
        0x06 => "MBC2+BATTERY",
        0x0F => "MBC3+TIMER+BATTERY",
        0x10 => "MBC3+TIMER+RAM+BATTERY",
        0x11 => "MBC3",
        0x12 => "MBC3+RAM",
        0x13 => "MBC3+RAM+BATTERY",
        0x19 => "MBC5",
        0x1A => "MBC5+RAM",
        0x1B => "MBC5+RAM+BATTERY",
        0x1C => "MBC5+RUMBLE",
        0x1D => "MBC5+RUMBLE+RAM",
        0x1E => "MBC5+RUMBLE+RAM+BATTERY",
        _ => "Unknown",
    }
}
