use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use croco_core::ROM_BANK_SIZE;
use croco_core::util::format_bytes;
use croco_lib::{RomSlotInfo, RomUtilization};

use crate::device::{connect, load_settings, runtime};
use crate::{CliError, DeviceArgs};

/// Show device info, serial id and storage usage.
pub(crate) fn run_info(args: &DeviceArgs) -> Result<(), CliError> {
    let settings = load_settings();
    let rt = runtime()?;

    rt.block_on(async {
        let mut session = connect(args, &settings).await?;
        let snapshot = session.snapshot().await?;
        let info = &snapshot.info;

        log::info!(
            "{}",
            "Croco Cartridge".if_supports_color(Stdout, |t| t.bold())
        );
        log::info!("  Serial:        {}", snapshot.serial_id);
        log::info!("  Hardware rev:  {}", info.hw_version);
        log::info!("  Firmware:      {}", info.firmware);
        log::info!("  Feature step:  {}", info.feature_step);
        crate::log_blank();
        log_utilization(&snapshot.utilization);
        Ok::<_, CliError>(())
    })
}

/// List the ROMs stored on the cartridge.
pub(crate) fn run_list(args: &DeviceArgs) -> Result<(), CliError> {
    let settings = load_settings();
    let rt = runtime()?;

    rt.block_on(async {
        let mut session = connect(args, &settings).await?;
        let (utilization, roms) = session.list_roms().await?;

        if roms.is_empty() {
            log::info!(
                "{}",
                "No ROMs on the cartridge".if_supports_color(Stdout, |t| t.dimmed())
            );
        }
        for rom in &roms {
            log::info!("{}", format_slot(rom));
        }
        crate::log_blank();
        log_utilization(&utilization);
        Ok::<_, CliError>(())
    })
}

pub(crate) fn format_slot(rom: &RomSlotInfo) -> String {
    let mut details = Vec::new();
    if let Some(banks) = rom.rom_banks {
        details.push(format_bytes(banks as u64 * ROM_BANK_SIZE as u64));
    }
    if let Some(mbc) = rom.mbc {
        details.push(mbc.to_string());
    }
    if rom.has_save_ram() {
        details.push(format!("{} save", format_bytes(rom.save_ram_size() as u64)));
    } else if rom.ram_banks == 0 {
        details.push("no save".to_string());
    }

    format!(
        "  {:>3}  {:<16}  {}",
        rom.slot,
        rom.name,
        details
            .join(", ")
            .if_supports_color(Stdout, |t| t.dimmed())
    )
}

fn log_utilization(util: &RomUtilization) {
    log::info!(
        "  {} ROMs, {} of {} banks used ({} free)",
        util.rom_count,
        util.used_banks,
        util.max_banks,
        format_bytes(util.free_banks() as u64 * ROM_BANK_SIZE as u64)
            .if_supports_color(Stdout, |t| t.cyan()),
    );
}

/// Slot info for `slot`, checking it against the slot count first.
pub(crate) async fn slot_info(
    session: &mut crate::device::Session,
    slot: u8,
) -> Result<RomSlotInfo, CliError> {
    let util = session.rom_utilization().await?;
    if slot >= util.rom_count {
        return Err(CliError::other(format!(
            "Slot {} is empty, the cartridge holds {} ROMs",
            slot, util.rom_count
        )));
    }
    let info = session.rom_info(slot).await?;
    log::debug!(
        "Slot {}: '{}', {} RAM banks, {} bytes of save RAM",
        slot,
        info.name,
        info.ram_banks,
        info.save_ram_size()
    );
    Ok(info)
}
