use std::path::{Path, PathBuf};

use chrono::Local;
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;
use tokio::sync::mpsc;

use croco_lib::SaveFile;
use croco_lib::async_util::run_with_progress;

use crate::commands::device::slot_info;
use crate::device::{connect, fixed_zone, load_settings, runtime};
use crate::progress;
use crate::{CliError, DeviceArgs};

/// Download a slot's savegame to `output` (default `<name>.sav`).
pub(crate) fn run_download(
    args: &DeviceArgs,
    slot: u8,
    output: Option<PathBuf>,
) -> Result<(), CliError> {
    let settings = load_settings();
    let zone = fixed_zone(&settings);
    let rt = runtime()?;

    rt.block_on(async {
        let mut session = connect(args, &settings).await?;
        let info = slot_info(&mut session, slot).await?;
        if !info.has_save_ram() {
            return Err(CliError::other(format!("'{}' has no save RAM", info.name)));
        }

        let pb = progress::transfer_bar("Save RAM");
        let (tx, rx) = mpsc::unbounded_channel();
        let task = async {
            let tx = tx;
            match zone {
                Some(offset) => session.download_savegame(&info, &offset, Some(&tx)).await,
                None => session.download_savegame(&info, &Local, Some(&tx)).await,
            }
        };
        let save = match run_with_progress(task, rx, |p| progress::apply(&pb, p)).await {
            Ok(save) => save,
            Err(e) => {
                pb.abandon();
                return Err(e.into());
            }
        };

        let path = output.unwrap_or_else(|| default_save_path(&info.name));
        let bytes = save.to_bytes();
        std::fs::write(&path, &bytes)?;
        progress::finish(
            &pb,
            &format!(
                "{} Saved {}{}",
                "\u{2714}".if_supports_color(Stdout, |t| t.green()),
                path.display(),
                if save.has_rtc() { " with RTC" } else { "" }
            ),
            bytes.len() as u64,
        );
        Ok::<_, CliError>(())
    })
}

/// Overwrite a slot's savegame from `file`, asking first unless `yes`.
pub(crate) fn run_upload(
    args: &DeviceArgs,
    slot: u8,
    file: &Path,
    yes: bool,
) -> Result<(), CliError> {
    let bytes = std::fs::read(file)?;
    let settings = load_settings();
    let zone = fixed_zone(&settings);
    let rt = runtime()?;

    rt.block_on(async {
        let mut session = connect(args, &settings).await?;
        let info = slot_info(&mut session, slot).await?;
        let save = SaveFile::from_bytes(&bytes, &info)?;

        if !yes
            && !crate::confirm(&format!(
                "Overwrite the savegame of '{}' in slot {}?",
                info.name, slot
            ))?
        {
            log::info!("Aborted");
            return Ok(());
        }

        let pb = progress::transfer_bar("Save RAM");
        let (tx, rx) = mpsc::unbounded_channel();
        let task = async {
            let tx = tx;
            match zone {
                Some(offset) => {
                    session
                        .upload_savegame(&info, &save, &offset, Some(&tx))
                        .await
                }
                None => session.upload_savegame(&info, &save, &Local, Some(&tx)).await,
            }
        };
        if let Err(e) = run_with_progress(task, rx, |p| progress::apply(&pb, p)).await {
            pb.abandon();
            return Err(e.into());
        }

        progress::finish(
            &pb,
            &format!(
                "{} Restored savegame of '{}'{}",
                "\u{2714}".if_supports_color(Stdout, |t| t.green()),
                info.name,
                if save.has_rtc() { " with RTC" } else { "" }
            ),
            save.ram.len() as u64,
        );
        Ok::<_, CliError>(())
    })
}

/// `<name>.sav` with characters that are awkward in file names replaced.
fn default_save_path(name: &str) -> PathBuf {
    let stem: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect();
    let stem = stem.trim();
    PathBuf::from(format!(
        "{}.sav",
        if stem.is_empty() { "savegame" } else { stem }
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_save_path() {
        assert_eq!(default_save_path("POKEMON GOLD"), PathBuf::from("POKEMON GOLD.sav"));
        assert_eq!(default_save_path("A/B:C"), PathBuf::from("A_B_C.sav"));
        assert_eq!(default_save_path("  "), PathBuf::from("savegame.sav"));
    }
}
