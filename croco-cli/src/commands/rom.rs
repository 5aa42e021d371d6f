use std::path::Path;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;
use tokio::sync::mpsc;

use croco_lib::RomUpload;
use croco_lib::async_util::run_with_progress;

use crate::commands::device::slot_info;
use crate::device::{connect, load_settings, runtime};
use crate::progress;
use crate::{CliError, DeviceArgs};

/// Analyze a ROM image and upload it to the next free slot.
pub(crate) fn run_upload(
    args: &DeviceArgs,
    path: &Path,
    name: Option<String>,
) -> Result<(), CliError> {
    let rom = std::fs::read(path)?;
    let header = croco_gameboy::analyze(&rom)?;

    let mut request = RomUpload::from_header(&header);
    if let Some(name) = name {
        request = request.with_name(name);
    }
    log::info!(
        "Uploading {} as '{}' ({} banks{})",
        path.display(),
        request.name.if_supports_color(Stdout, |t| t.cyan()),
        request.bank_count,
        if header.has_speed_change_bank() {
            format!(", speed switch in bank {}", header.speed_change_bank)
        } else {
            String::new()
        }
    );

    let settings = load_settings();
    let rt = runtime()?;
    rt.block_on(async {
        let mut session = connect(args, &settings).await?;
        let pb = progress::transfer_bar("ROM");
        let (tx, rx) = mpsc::unbounded_channel();

        let task = async {
            let tx = tx;
            session.upload_rom(&request, &rom, Some(&tx)).await
        };
        let result = run_with_progress(task, rx, |p| progress::apply(&pb, p)).await;
        if let Err(e) = result {
            pb.abandon();
            return Err(e.into());
        }

        progress::finish(
            &pb,
            &format!(
                "{} Uploaded '{}'",
                "\u{2714}".if_supports_color(Stdout, |t| t.green()),
                request.name
            ),
            header.rom_size() as u64,
        );
        Ok::<_, CliError>(())
    })
}

/// Delete the ROM in `slot`, asking first unless `yes` is set.
pub(crate) fn run_delete(args: &DeviceArgs, slot: u8, yes: bool) -> Result<(), CliError> {
    let settings = load_settings();
    let rt = runtime()?;

    rt.block_on(async {
        let mut session = connect(args, &settings).await?;
        let info = slot_info(&mut session, slot).await?;

        if !yes && !crate::confirm(&format!("Delete '{}' from slot {}?", info.name, slot))? {
            log::info!("Aborted");
            return Ok(());
        }

        session.delete_rom(slot).await?;
        log::info!(
            "{} Deleted '{}'",
            "\u{2714}".if_supports_color(Stdout, |t| t.green()),
            info.name
        );
        Ok::<_, CliError>(())
    })
}
