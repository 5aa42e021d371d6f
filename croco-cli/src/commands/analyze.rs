use std::path::Path;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use croco_core::util::format_bytes;
use croco_gameboy::{RomHeader, mbc};

use crate::CliError;

/// Run the analyze command.
pub(crate) fn run_analyze(path: &Path) -> Result<(), CliError> {
    let rom = std::fs::read(path)?;
    let header = croco_gameboy::analyze(&rom)?;

    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("?");
    log::info!("{}", file_name.if_supports_color(Stdout, |t| t.bold()));
    for line in format_header(&header) {
        log::info!("  {}", line);
    }
    log::info!(
        "  {:<18}{}",
        "File size:",
        size_verdict(rom.len() as u64, header.rom_size() as u64)
    );
    Ok(())
}

/// Header fields as aligned "label: value" lines.
pub(crate) fn format_header(header: &RomHeader) -> Vec<String> {
    let field = |label: &str, value: String| format!("{:<18}{}", format!("{}:", label), value);

    let speed_bank = if !header.color_capable {
        "not scanned (DMG only)".to_string()
    } else if header.has_speed_change_bank() {
        header.speed_change_bank.to_string()
    } else {
        "none".to_string()
    };
    let mbc = match header.mbc {
        Some(m) => m.to_string(),
        None => "unsupported".to_string(),
    };

    vec![
        field("Name", header.name.clone()),
        field(
            "ROM size",
            format!(
                "{} ({} banks)",
                format_bytes(header.rom_size() as u64),
                header.bank_count
            ),
        ),
        field("CGB", yes_no(header.color_capable)),
        field("Speed change bank", speed_bank),
        field(
            "Cartridge type",
            format!(
                "{:#04x} {}",
                header.cartridge_type,
                mbc::cartridge_type_name(header.cartridge_type)
            ),
        ),
        field("MBC", mbc),
        field("RAM banks", header.ram_banks.to_string()),
        field("RTC", yes_no(header.has_rtc)),
    ]
}

fn yes_no(flag: bool) -> String {
    if flag { "yes" } else { "no" }.to_string()
}

fn size_verdict(file_size: u64, expected_size: u64) -> String {
    if file_size == expected_size {
        format!(
            "{} {}",
            format_bytes(file_size),
            "OK".if_supports_color(Stdout, |t| t.green()),
        )
    } else if file_size < expected_size {
        format!(
            "{} {} (missing {})",
            format_bytes(file_size),
            "TRUNCATED".if_supports_color(Stdout, |t| t.bright_red()),
            format_bytes(expected_size - file_size),
        )
    } else {
        format!(
            "{} {} (+{})",
            format_bytes(file_size),
            "OVERSIZED".if_supports_color(Stdout, |t| t.yellow()),
            format_bytes(file_size - expected_size),
        )
    }
}

#[cfg(test)]
mod tests {
    use croco_gameboy::MbcType;

    use super::*;

    fn header() -> RomHeader {
        RomHeader {
            name: "POKEMON_GLD".into(),
            bank_count: 128,
            color_capable: true,
            speed_change_bank: 0xFFFF,
            cartridge_type: 0x10,
            mbc: Some(MbcType::Mbc3),
            has_rtc: true,
            ram_banks: 4,
        }
    }

    #[test]
    fn test_format_header() {
        let lines = format_header(&header());
        assert_eq!(lines[0], "Name:             POKEMON_GLD");
        assert!(lines[1].ends_with("2 MB (128 banks)"));
        assert!(lines[3].ends_with("none"));
        assert!(lines[5].ends_with("MBC3"));
        assert!(lines[7].ends_with("yes"));
    }

    #[test]
    fn test_dmg_rom_is_not_scanned() {
        let mut h = header();
        h.color_capable = false;
        assert!(format_header(&h)[3].ends_with("not scanned (DMG only)"));
    }
}
