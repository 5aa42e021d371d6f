//! Firmware capability negotiation.
//!
//! Every session starts with a device-info exchange. The reported feature
//! step decides which optional fields travel in later frames:
//!
//! | Capability | Feature step | Below the threshold |
//! |---|---|---|
//! | speed-change bank | ≥ 2 | upload request omits the 2-byte bank field |
//! | MBC info | ≥ 3 | ROM info has no MBC byte or ROM bank count |
//!
//! Old firmware may not understand the device-info command at all, so a
//! failed exchange degrades to feature step 0 instead of failing the connect.

use std::fmt;

use crate::command::Command;
use crate::error::ProtocolError;
use crate::frame::FrameCodec;
use crate::transport::Transport;

/// Highest feature step this host knows how to use.
pub const LATEST_FEATURE_STEP: u8 = 3;

/// Build type reported when the device could not be queried.
pub const UNKNOWN_BUILD_TYPE: char = '?';

/// Feature flags derived from the negotiated feature step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    feature_step: u8,
}

impl Capabilities {
    pub fn from_feature_step(feature_step: u8) -> Self {
        Self { feature_step }
    }

    pub fn feature_step(&self) -> u8 {
        self.feature_step
    }

    /// Upload requests carry the speed-change bank.
    pub fn supports_speed_change_bank(&self) -> bool {
        self.feature_step >= 2
    }

    /// ROM info responses carry the MBC type and ROM bank count.
    pub fn supports_mbc_info(&self) -> bool {
        self.feature_step >= 3
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareVersion {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
    /// Single-character build flavour (`R` release, `D` debug, ...)
    pub build_type: char,
    /// Short git hash the firmware was built from
    pub build_id: u32,
    /// Built from a tree with uncommitted changes
    pub dirty: bool,
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}{} ({:08x}{})",
            self.major,
            self.minor,
            self.patch,
            self.build_type,
            self.build_id,
            if self.dirty { ", dirty" } else { "" }
        )
    }
}

/// Result of the device-info command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub feature_step: u8,
    pub hw_version: u8,
    pub firmware: FirmwareVersion,
}

impl DeviceInfo {
    /// Conservative stand-in used when the device does not answer the query.
    pub fn fallback() -> Self {
        Self {
            feature_step: 0,
            hw_version: 0,
            firmware: FirmwareVersion {
                major: 0,
                minor: 0,
                patch: 0,
                build_type: UNKNOWN_BUILD_TYPE,
                build_id: 0,
                dirty: false,
            },
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.firmware.build_type == UNKNOWN_BUILD_TYPE
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities::from_feature_step(self.feature_step)
    }
}

/// Query device info, propagating any failure.
pub async fn query_device_info<T: Transport>(
    codec: &mut FrameCodec<T>,
) -> Result<DeviceInfo, ProtocolError> {
    let command = Command::DeviceInfo;
    let body = codec
        .execute(
            command.id(),
            &[],
            command.response_len(&Capabilities::default()),
        )
        .await?;
    Ok(crate::command::decode_device_info(&body))
}

/// Query device info, falling back to feature step 0 on any failure.
pub async fn negotiate<T: Transport>(codec: &mut FrameCodec<T>) -> DeviceInfo {
    match query_device_info(codec).await {
        Ok(info) => {
            log_advisories(&info);
            info
        }
        Err(e) => {
            log::warn!(
                "Device info unavailable ({}), assuming the oldest protocol",
                e
            );
            DeviceInfo::fallback()
        }
    }
}

fn log_advisories(info: &DeviceInfo) {
    let fw = &info.firmware;
    log::debug!(
        "Firmware {} on hardware rev {}, feature step {}",
        fw,
        info.hw_version,
        info.feature_step
    );
    if fw.major == 0 && fw.minor < 4 {
        log::warn!(
            "Firmware {} is outdated, please update the cartridge firmware",
            fw
        );
    }
    if info.feature_step > LATEST_FEATURE_STEP {
        log::warn!(
            "Device reports feature step {}, this host only knows up to {}",
            info.feature_step,
            LATEST_FEATURE_STEP
        );
    }
}
