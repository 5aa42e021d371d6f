use std::path::Path;

use chrono::{DateTime, Local};
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use croco_core::{MBC2_RAM_SIZE, RAM_BANK_SIZE, RTC_RECORD_SIZE, RtcRecord};

use crate::CliError;

/// Decode the RTC record appended to a save file.
pub(crate) fn run_rtc_show(path: &Path) -> Result<(), CliError> {
    let bytes = std::fs::read(path)?;
    let Some(record) = rtc_tail(&bytes) else {
        log::info!(
            "{}",
            format!("{} has no RTC record", path.display())
                .if_supports_color(Stdout, |t| t.dimmed())
        );
        return Ok(());
    };

    let secs = record.timestamp()?;
    log::info!("{}", path.display().if_supports_color(Stdout, |t| t.bold()));
    log::info!("  Timestamp:  {}", secs);
    match DateTime::from_timestamp(secs, 0) {
        Some(utc) => {
            log::info!("  UTC:        {}", utc.format("%Y-%m-%d %H:%M:%S"));
            log::info!(
                "  Local:      {}",
                utc.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S %:z")
            );
        }
        None => log::warn!("Timestamp {} is outside the calendar range", secs),
    }
    log::debug!("Record: {:02x?}", record.as_bytes());
    Ok(())
}

/// The trailing RTC record, if the file length is a RAM image plus one.
pub(crate) fn rtc_tail(bytes: &[u8]) -> Option<RtcRecord> {
    let ram_len = bytes.len().checked_sub(RTC_RECORD_SIZE)?;
    if ram_len != MBC2_RAM_SIZE && (ram_len == 0 || ram_len % RAM_BANK_SIZE != 0) {
        return None;
    }
    RtcRecord::from_slice(&bytes[ram_len..]).ok()
}
