//! Typed operations against a connected cartridge.
//!
//! [`DeviceSession`] owns the frame codec and the capabilities negotiated
//! at connect time. Every method is one or more strictly sequential
//! exchanges; the `&mut self` receivers make overlapping exchanges
//! impossible.

use chrono::TimeZone;
use croco_core::RtcRecord;
use croco_gameboy::RomHeader;

use crate::capability::{self, Capabilities, DeviceInfo};
use crate::command::{self, Command, RomSlotInfo, RomUtilization};
use crate::error::{Operation, ProtocolError};
use crate::frame::FrameCodec;
use crate::savegame::SaveFile;
use crate::transfer::{self, ProgressSender, TransferPlan};
use crate::transport::Transport;

/// Parameters of a ROM upload request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomUpload {
    /// Slot name, 1 to 16 bytes
    pub name: String,
    pub bank_count: u16,
    /// Bank holding the speed-switch, `0xFFFF` if none
    pub speed_change_bank: u16,
}

impl RomUpload {
    pub fn from_header(header: &RomHeader) -> Self {
        Self {
            name: header.name.clone(),
            bank_count: header.bank_count,
            speed_change_bank: header.speed_change_bank,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Device info, serial and slot table in one read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSnapshot {
    pub info: DeviceInfo,
    pub serial_id: String,
    pub utilization: RomUtilization,
    pub roms: Vec<RomSlotInfo>,
}

/// A negotiated connection to one cartridge.
#[derive(Debug)]
pub struct DeviceSession<T> {
    codec: FrameCodec<T>,
    info: DeviceInfo,
    caps: Capabilities,
}

impl<T: Transport> DeviceSession<T> {
    /// Negotiate capabilities over `transport`.
    ///
    /// Never fails: a device that does not answer the info query is driven
    /// with the oldest protocol shape.
    pub async fn connect(transport: T) -> Self {
        let mut codec = FrameCodec::new(transport);
        let info = capability::negotiate(&mut codec).await;
        let caps = info.capabilities();
        log::info!(
            "Connected: feature step {}, firmware {}",
            caps.feature_step(),
            info.firmware
        );
        Self { codec, info, caps }
    }

    pub fn device_info(&self) -> &DeviceInfo {
        &self.info
    }

    pub fn capabilities(&self) -> Capabilities {
        self.caps
    }

    pub fn transport(&self) -> &T {
        self.codec.transport()
    }

    pub fn into_transport(self) -> T {
        self.codec.into_inner()
    }

    async fn exchange(
        &mut self,
        command: Command,
        payload: &[u8],
    ) -> Result<Vec<u8>, ProtocolError> {
        let len = command.response_len(&self.caps);
        self.codec.execute(command.id(), payload, len).await
    }

    /// Query device info again and replace the stored snapshot.
    ///
    /// The negotiated capabilities stay as they were at connect time.
    pub async fn refresh_device_info(&mut self) -> Result<&DeviceInfo, ProtocolError> {
        let info = capability::query_device_info(&mut self.codec).await?;
        if info.feature_step != self.caps.feature_step() {
            log::warn!(
                "Feature step changed from {} to {} mid-session, reconnect to use it",
                self.caps.feature_step(),
                info.feature_step
            );
        }
        self.info = info;
        Ok(&self.info)
    }

    pub async fn serial_id(&mut self) -> Result<String, ProtocolError> {
        let body = self.exchange(Command::SerialId, &[]).await?;
        Ok(command::decode_serial_id(&body))
    }

    pub async fn rom_utilization(&mut self) -> Result<RomUtilization, ProtocolError> {
        let body = self.exchange(Command::RomUtilization, &[]).await?;
        Ok(command::decode_rom_utilization(&body))
    }

    pub async fn rom_info(&mut self, slot: u8) -> Result<RomSlotInfo, ProtocolError> {
        let body = self.exchange(Command::RomInfo, &[slot]).await?;
        Ok(command::decode_rom_info(slot, &self.caps, &body))
    }

    /// Utilization plus the info record of every occupied slot.
    pub async fn list_roms(
        &mut self,
    ) -> Result<(RomUtilization, Vec<RomSlotInfo>), ProtocolError> {
        let utilization = self.rom_utilization().await?;
        let mut roms = Vec::with_capacity(utilization.rom_count as usize);
        for slot in 0..utilization.rom_count {
            roms.push(self.rom_info(slot).await?);
        }
        Ok((utilization, roms))
    }

    pub async fn snapshot(&mut self) -> Result<DeviceSnapshot, ProtocolError> {
        let info = self.refresh_device_info().await?.clone();
        let serial_id = self.serial_id().await?;
        let (utilization, roms) = self.list_roms().await?;
        Ok(DeviceSnapshot {
            info,
            serial_id,
            utilization,
            roms,
        })
    }

    /// Announce a ROM upload. The speed-change bank is only sent to
    /// firmware that understands it.
    pub async fn request_rom_upload(&mut self, request: &RomUpload) -> Result<(), ProtocolError> {
        let payload = command::encode_rom_upload_request(
            &self.caps,
            request.bank_count,
            &request.name,
            request.speed_change_bank,
        )?;
        let body = self.exchange(Command::RequestRomUpload, &payload).await?;
        command::check_status(Operation::RomUpload, body[0])
    }

    /// Validate, announce and transfer a ROM image.
    ///
    /// The name, the image size and the free bank count are all checked
    /// before the first frame is sent.
    pub async fn upload_rom(
        &mut self,
        request: &RomUpload,
        rom: &[u8],
        progress: Option<&ProgressSender>,
    ) -> Result<(), ProtocolError> {
        command::validate_name(&request.name)?;
        let plan = TransferPlan::rom(request.bank_count);
        if rom.len() < plan.total_bytes() {
            return Err(ProtocolError::SourceTooShort {
                expected: plan.total_bytes(),
                actual: rom.len(),
            });
        }

        let utilization = self.rom_utilization().await?;
        if request.bank_count > utilization.free_banks() {
            return Err(ProtocolError::InsufficientSpace {
                needed: request.bank_count,
                available: utilization.free_banks(),
            });
        }

        self.request_rom_upload(request).await?;
        transfer::upload_bulk(
            &mut self.codec,
            Command::SendRomChunk,
            Operation::RomChunk,
            &plan,
            rom,
            progress,
        )
        .await?;
        log::info!("Uploaded '{}' ({} banks)", request.name, request.bank_count);
        Ok(())
    }

    pub async fn delete_rom(&mut self, slot: u8) -> Result<(), ProtocolError> {
        let body = self.exchange(Command::DeleteRom, &[slot]).await?;
        command::check_status(Operation::DeleteRom, body[0])
    }

    pub async fn request_savegame_download(&mut self, slot: u8) -> Result<(), ProtocolError> {
        let body = self
            .exchange(Command::RequestSavegameDownload, &[slot])
            .await?;
        command::check_status(Operation::SavegameDownload, body[0])
    }

    pub async fn request_savegame_upload(&mut self, slot: u8) -> Result<(), ProtocolError> {
        let body = self
            .exchange(Command::RequestSavegameUpload, &[slot])
            .await?;
        command::check_status(Operation::SavegameUpload, body[0])
    }

    /// Read the slot's RTC record as stored on the device (local time).
    ///
    /// `RtcUnavailable` means the slot has no clock; callers should treat
    /// it as a normal answer.
    pub async fn fetch_rtc(&mut self, slot: u8) -> Result<RtcRecord, ProtocolError> {
        let body = match self.exchange(Command::FetchRtc, &[slot]).await {
            Ok(body) => body,
            Err(ProtocolError::ProtocolMismatch { .. }) => {
                return Err(ProtocolError::RtcUnavailable { slot });
            }
            Err(e) => return Err(e),
        };
        let reply = command::decode_rtc_reply(&body)?;
        if reply.slot != slot {
            return Err(ProtocolError::RtcUnavailable { slot });
        }
        Ok(reply.record)
    }

    /// Write an RTC record (device local time) to the slot.
    pub async fn store_rtc(&mut self, slot: u8, record: &RtcRecord) -> Result<(), ProtocolError> {
        let payload = command::encode_rtc_store(slot, record);
        let body = self.exchange(Command::SendRtc, &payload).await?;
        let reply = command::decode_rtc_reply(&body)?;
        if reply.slot != slot {
            return Err(ProtocolError::RtcStoreFailed {
                slot,
                echoed: reply.slot,
            });
        }
        Ok(())
    }

    /// Download a slot's save RAM and, when present, its RTC record
    /// converted to UTC using `tz`.
    pub async fn download_savegame<Tz: TimeZone>(
        &mut self,
        slot: &RomSlotInfo,
        tz: &Tz,
        progress: Option<&ProgressSender>,
    ) -> Result<SaveFile, ProtocolError> {
        let rtc = match self.fetch_rtc(slot.slot).await {
            Ok(record) => Some(record.to_utc(tz)?),
            Err(e) => {
                log::debug!("No RTC for slot {}: {}", slot.slot, e);
                None
            }
        };

        self.request_savegame_download(slot.slot).await?;
        let plan = TransferPlan::save_ram(slot.ram_banks, slot.mbc);
        let ram = transfer::download_bulk(&mut self.codec, &plan, progress).await?;
        log::info!(
            "Downloaded {} bytes of save RAM from slot {}{}",
            ram.len(),
            slot.slot,
            if rtc.is_some() { " with RTC" } else { "" }
        );
        Ok(SaveFile { ram, rtc })
    }

    /// Upload save RAM to a slot, then its RTC record (converted from UTC
    /// to device local time) if the file carries one.
    pub async fn upload_savegame<Tz: TimeZone>(
        &mut self,
        slot: &RomSlotInfo,
        save: &SaveFile,
        tz: &Tz,
        progress: Option<&ProgressSender>,
    ) -> Result<(), ProtocolError> {
        let plan = TransferPlan::save_ram(slot.ram_banks, slot.mbc);
        if save.ram.len() < plan.total_bytes() {
            return Err(ProtocolError::SourceTooShort {
                expected: plan.total_bytes(),
                actual: save.ram.len(),
            });
        }
        let rtc = save
            .rtc
            .as_ref()
            .map(|record| record.to_device_local(tz))
            .transpose()?;

        self.request_savegame_upload(slot.slot).await?;
        transfer::upload_bulk(
            &mut self.codec,
            Command::SendSavegameChunk,
            Operation::SavegameChunk,
            &plan,
            &save.ram,
            progress,
        )
        .await?;

        if let Some(record) = rtc {
            self.store_rtc(slot.slot, &record).await?;
        }
        log::info!("Uploaded save RAM to slot {}", slot.slot);
        Ok(())
    }
}
