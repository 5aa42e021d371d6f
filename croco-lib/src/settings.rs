//! Persistent host settings.
//!
//! Stored at `~/.config/croco/settings.toml`:
//!
//! ```toml
//! [device]
//! port = "/dev/ttyACM0"
//! timeout_ms = 2000
//!
//! [rtc]
//! utc_offset_minutes = 60
//! ```
//!
//! Every field is optional. A missing file is the same as an empty one.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub device: DeviceSettings,
    pub rtc: RtcSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSettings {
    /// Serial device node of the cartridge
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<PathBuf>,
    /// Per-read/write timeout in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RtcSettings {
    /// Fixed UTC offset for RTC conversion instead of the system zone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utc_offset_minutes: Option<i32>,
}

impl DeviceSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

impl RtcSettings {
    /// The configured fixed offset, or `None` to use the system zone.
    ///
    /// Out-of-range offsets (beyond ±24h) are ignored with a warning.
    pub fn fixed_offset(&self) -> Option<FixedOffset> {
        let minutes = self.utc_offset_minutes?;
        let offset = minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt);
        if offset.is_none() {
            log::warn!("Ignoring invalid RTC UTC offset of {} minutes", minutes);
        }
        offset
    }
}

/// Canonical path to the settings file: `~/.config/croco/settings.toml`.
pub fn settings_path() -> PathBuf {
    let config = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    config.join("croco").join("settings.toml")
}

/// Load settings from the canonical path.
pub fn load() -> io::Result<Settings> {
    load_from(&settings_path())
}

/// Load settings from `path`; a missing file yields the defaults.
pub fn load_from(path: &Path) -> io::Result<Settings> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Settings::default()),
        Err(e) => return Err(e),
    };
    toml::from_str(&contents).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{}: {}", path.display(), e),
        )
    })
}

pub fn save(settings: &Settings) -> io::Result<()> {
    save_to(&settings_path(), settings)
}

/// Write settings to `path` atomically (temp file, then rename).
pub fn save_to(path: &Path, settings: &Settings) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let serialized = toml::to_string_pretty(settings).map_err(io::Error::other)?;
    let tmp = path.with_extension("toml.tmp");
    std::fs::write(&tmp, &serialized)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Resolve the device port using a priority chain:
///
/// 1. CLI override (if `Some`)
/// 2. Saved `device.port` in `settings.toml`
pub fn resolve_port(cli_override: Option<PathBuf>, settings: &Settings) -> Option<PathBuf> {
    cli_override.or_else(|| settings.device.port.clone())
}

/// Load the settings file as a pretty-printed TOML string for display.
pub fn load_settings_string() -> Option<String> {
    let contents = std::fs::read_to_string(settings_path()).ok()?;
    let doc: toml::Value = contents.parse().ok()?;
    toml::to_string_pretty(&doc).ok()
}

#[cfg(test)]
#[path = "tests/settings_tests.rs"]
mod tests;
