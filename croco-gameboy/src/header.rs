//! Game Boy cartridge header parsing.
//!
//! The header lives at 0x100–0x14F of bank 0. Only the fields the cartridge
//! needs are read:
//!
//! | Offset | Field |
//! |---|---|
//! | 0x134–0x143 | Title (16 bytes, 15 on CGB cartridges) |
//! | 0x143 | CGB flag (0x80 compatible, 0xC0 exclusive) |
//! | 0x147 | Cartridge type |
//! | 0x148 | ROM size code (`2 << code` banks) |
//! | 0x149 | RAM size code |

use croco_core::{NO_SPEED_CHANGE_BANK, ROM_BANK_SIZE};

use crate::error::HeaderError;
use crate::mbc::{self, MbcType};
use crate::speed_switch::find_speed_change_bank;

/// First byte past the cartridge header.
pub const HEADER_END: usize = 0x150;

const TITLE_OFFSET: usize = 0x134;
const TITLE_LEN: usize = 16;
const CGB_TITLE_LEN: usize = 15;
const CGB_FLAG_OFFSET: usize = 0x143;
const CARTRIDGE_TYPE_OFFSET: usize = 0x147;
const ROM_SIZE_OFFSET: usize = 0x148;
const RAM_SIZE_OFFSET: usize = 0x149;

/// Largest ROM size code (8 MiB, 512 banks).
const MAX_ROM_SIZE_CODE: u8 = 0x08;

/// Parsed cartridge header plus the speed-switch bank for CGB ROMs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomHeader {
    /// Title from the header, used as the default slot name
    pub name: String,
    /// Number of 16 KiB banks the header declares
    pub bank_count: u16,
    /// CGB flag is 0x80 or 0xC0
    pub color_capable: bool,
    /// Bank holding the speed-switch STOP, `0xFFFF` if none
    pub speed_change_bank: u16,
    pub cartridge_type: u8,
    pub mbc: Option<MbcType>,
    pub has_rtc: bool,
    pub ram_banks: u8,
}

impl RomHeader {
    /// ROM size in bytes implied by the bank count.
    pub fn rom_size(&self) -> usize {
        self.bank_count as usize * ROM_BANK_SIZE
    }

    pub fn has_speed_change_bank(&self) -> bool {
        self.speed_change_bank != NO_SPEED_CHANGE_BANK
    }
}

/// Parse the header fields of a ROM image. No code scanning is done here;
/// `speed_change_bank` is always the "not found" sentinel.
pub fn parse_header(rom: &[u8]) -> Result<RomHeader, HeaderError> {
    if rom.len() < HEADER_END {
        return Err(HeaderError::Malformed {
            expected: HEADER_END,
            actual: rom.len(),
        });
    }

    let size_code = rom[ROM_SIZE_OFFSET];
    if size_code > MAX_ROM_SIZE_CODE {
        return Err(HeaderError::UnsupportedRomSize(size_code));
    }
    let bank_count = 1u16 << (size_code + 1);

    let color_capable = matches!(rom[CGB_FLAG_OFFSET], 0x80 | 0xC0);

    // The last title byte doubles as the CGB flag on color cartridges
    let window = if color_capable { CGB_TITLE_LEN } else { TITLE_LEN };
    let title = &rom[TITLE_OFFSET..TITLE_OFFSET + window];
    let name_len = title.iter().position(|&b| b == 0).unwrap_or(window);
    let name = String::from_utf8_lossy(&title[..name_len]).into_owned();

    let cartridge_type = rom[CARTRIDGE_TYPE_OFFSET];

    Ok(RomHeader {
        name,
        bank_count,
        color_capable,
        speed_change_bank: NO_SPEED_CHANGE_BANK,
        cartridge_type,
        mbc: MbcType::from_cartridge_type(cartridge_type),
        has_rtc: mbc::cartridge_has_rtc(cartridge_type),
        ram_banks: mbc::ram_bank_count(rom[RAM_SIZE_OFFSET]),
    })
}

/// Parse the header and, for CGB ROMs, locate the speed-switch bank.
pub fn analyze(rom: &[u8]) -> Result<RomHeader, HeaderError> {
    let mut header = parse_header(rom)?;
    if header.color_capable {
        header.speed_change_bank = find_speed_change_bank(rom);
    }

    log::debug!(
        "ROM '{}': {} banks, CGB: {}, speed change bank: {:#06x}",
        header.name,
        header.bank_count,
        header.color_capable,
        header.speed_change_bank,
    );
    if rom.len() < header.rom_size() {
        log::warn!(
            "ROM image is {} bytes but the header declares {}",
            rom.len(),
            header.rom_size()
        );
    }

    Ok(header)
}

#[cfg(test)]
#[path = "tests/header_tests.rs"]
mod tests;
