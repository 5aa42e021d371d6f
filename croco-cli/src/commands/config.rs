use std::path::PathBuf;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use croco_lib::settings;

use crate::CliError;

/// Show the settings file location and its contents.
pub(crate) fn run_config_show() -> Result<(), CliError> {
    let path = settings::settings_path();

    log::info!(
        "{}",
        "Croco Configuration".if_supports_color(Stdout, |t| t.bold()),
    );
    crate::log_blank();

    if path.exists() {
        log::info!(
            "  Settings file: {} {}",
            path.display().if_supports_color(Stdout, |t| t.cyan()),
            "(exists)".if_supports_color(Stdout, |t| t.green()),
        );
    } else {
        log::info!(
            "  Settings file: {} {}",
            path.display().if_supports_color(Stdout, |t| t.cyan()),
            "(not found)".if_supports_color(Stdout, |t| t.dimmed()),
        );
    }
    crate::log_blank();

    let current = settings::load()
        .map_err(|e| CliError::config(format!("Cannot read settings: {}", e)))?;
    match &current.device.port {
        Some(port) => log::info!("  Port:       {}", port.display()),
        None => log::info!(
            "  Port:       {}",
            "not set".if_supports_color(Stdout, |t| t.dimmed())
        ),
    }
    match current.device.timeout_ms {
        Some(ms) => log::info!("  Timeout:    {} ms", ms),
        None => log::info!(
            "  Timeout:    {}",
            "none".if_supports_color(Stdout, |t| t.dimmed())
        ),
    }
    match current.rtc.fixed_offset() {
        Some(offset) => log::info!("  RTC zone:   UTC{}", offset),
        None => log::info!("  RTC zone:   system local time"),
    }

    if let Some(raw) = settings::load_settings_string() {
        log::debug!("Raw settings:\n{}", raw);
    }
    Ok(())
}

/// Print the settings file path.
pub(crate) fn run_config_path() -> Result<(), CliError> {
    log::info!("{}", settings::settings_path().display());
    Ok(())
}

pub(crate) fn run_set_port(port: PathBuf) -> Result<(), CliError> {
    let mut current = settings::load()
        .map_err(|e| CliError::config(format!("Cannot read settings: {}", e)))?;
    if !port.exists() {
        log::warn!("{} does not exist right now", port.display());
    }
    let shown = port.display().to_string();
    current.device.port = Some(port);
    settings::save(&current)?;
    log::info!(
        "Saved port {}",
        shown.if_supports_color(Stdout, |t| t.cyan())
    );
    Ok(())
}

pub(crate) fn run_clear_port() -> Result<(), CliError> {
    let mut current = settings::load()
        .map_err(|e| CliError::config(format!("Cannot read settings: {}", e)))?;
    if current.device.port.take().is_none() {
        log::info!("No port was saved");
        return Ok(());
    }
    settings::save(&current)?;
    log::info!("Cleared saved port");
    Ok(())
}
