//! Connecting to the cartridge from CLI arguments and saved settings.

use std::time::Duration;

use chrono::FixedOffset;
use croco_lib::{DeviceSession, SerialTransport, Settings, settings};

use crate::{CliError, DeviceArgs};

pub(crate) type Session = DeviceSession<SerialTransport>;

/// Load settings, treating a broken file as a warning rather than fatal.
pub(crate) fn load_settings() -> Settings {
    match settings::load() {
        Ok(s) => s,
        Err(e) => {
            log::warn!("Ignoring settings file: {}", e);
            Settings::default()
        }
    }
}

pub(crate) fn runtime() -> Result<tokio::runtime::Runtime, CliError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CliError::runtime(format!("Failed to create tokio runtime: {}", e)))
}

/// Open the port (CLI flag, then settings) and negotiate a session.
pub(crate) async fn connect(args: &DeviceArgs, settings: &Settings) -> Result<Session, CliError> {
    let port = settings::resolve_port(args.port.clone(), settings).ok_or_else(|| {
        CliError::config("No device port given. Use --port or `croco config set-port <PATH>`")
    })?;
    let timeout = args
        .timeout_ms
        .map(Duration::from_millis)
        .or_else(|| settings.device.timeout());

    let mut transport = SerialTransport::open(&port)
        .map_err(|e| CliError::other(format!("Cannot open {}: {}", port.display(), e)))?;
    if let Some(t) = timeout {
        transport = transport.with_timeout(t);
    }

    let session = DeviceSession::connect(transport).await;
    if session.device_info().is_fallback() {
        log::warn!("Device did not report its firmware, using the oldest protocol");
    }
    Ok(session)
}

/// Fixed offset from the settings, or `None` for the system zone.
pub(crate) fn fixed_zone(settings: &Settings) -> Option<FixedOffset> {
    let zone = settings.rtc.fixed_offset();
    if let Some(offset) = zone {
        log::debug!("Using fixed RTC offset {}", offset);
    }
    zone
}
