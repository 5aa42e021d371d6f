//! In-memory cartridge that answers protocol frames like the firmware does.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io;

use croco_lib::Transport;

const ROM_BANK: usize = 0x4000;
const RAM_BANK: usize = 0x2000;

#[derive(Debug, Clone)]
pub struct SimRom {
    pub name: String,
    pub ram_banks: u8,
    pub mbc_code: u8,
    pub rom_banks: u16,
    pub data: Vec<u8>,
    pub save: Vec<u8>,
    pub rtc: Option<[u8; 48]>,
}

impl SimRom {
    pub fn new(name: &str, rom_banks: u16, ram_banks: u8, mbc_code: u8) -> Self {
        let save_len = if mbc_code == 2 {
            512
        } else {
            ram_banks as usize * RAM_BANK
        };
        Self {
            name: name.to_string(),
            ram_banks,
            mbc_code,
            rom_banks,
            data: Vec::new(),
            save: (0..save_len).map(|i| (i % 251) as u8).collect(),
            rtc: None,
        }
    }

    pub fn with_rtc(mut self, timestamp: u64) -> Self {
        let mut record = [0u8; 48];
        record[..5].copy_from_slice(&[1, 2, 3, 4, 5]);
        record[40..48].copy_from_slice(&timestamp.to_le_bytes());
        self.rtc = Some(record);
        self
    }
}

struct PendingUpload {
    bank_count: u16,
    name: String,
    data: Vec<u8>,
}

/// Scripted cartridge. Every written frame is recorded in `frames`.
pub struct SimulatedDevice {
    pub feature_step: u8,
    pub firmware: (u8, u8, u8),
    /// Answer the device-info command with a wrong echo, like firmware that
    /// predates it
    pub legacy_firmware: bool,
    pub max_banks: u16,
    pub roms: Vec<SimRom>,
    pub frames: Vec<Vec<u8>>,
    /// Status byte to answer for a command id instead of 0
    pub reject: HashMap<u8, u8>,
    /// Command id whose response echo is corrupted
    pub corrupt_echo: Option<u8>,
    /// Download chunk index at which the device skips one chunk ahead
    pub skip_download_chunk: Option<usize>,
    /// Echo this slot id instead of the requested one on RTC store
    pub rtc_store_echo: Option<u8>,
    /// Speed-change bank from the last upload request, if it carried one
    pub last_speed_change_bank: Option<u16>,
    pending: VecDeque<u8>,
    upload: Option<PendingUpload>,
    download: Option<(usize, usize)>,
    save_upload: Option<usize>,
}

impl SimulatedDevice {
    pub fn new(feature_step: u8) -> Self {
        Self {
            feature_step,
            firmware: (1, 0, 2),
            legacy_firmware: false,
            max_banks: 512,
            roms: Vec::new(),
            frames: Vec::new(),
            reject: HashMap::new(),
            corrupt_echo: None,
            skip_download_chunk: None,
            rtc_store_echo: None,
            last_speed_change_bank: None,
            pending: VecDeque::new(),
            upload: None,
            download: None,
            save_upload: None,
        }
    }

    pub fn with_rom(mut self, rom: SimRom) -> Self {
        self.roms.push(rom);
        self
    }

    /// Frames written with `command` as their first byte.
    pub fn frames_for(&self, command: u8) -> Vec<&Vec<u8>> {
        self.frames.iter().filter(|f| f[0] == command).collect()
    }

    fn used_banks(&self) -> u16 {
        self.roms.iter().map(|r| r.rom_banks).sum()
    }

    fn status(&self, command: u8) -> u8 {
        self.reject.get(&command).copied().unwrap_or(0)
    }

    fn respond(&mut self, frame: &[u8]) -> Vec<u8> {
        let command = frame[0];
        let payload = &frame[1..];
        let mut out = vec![command];

        match command {
            254 => {
                if self.legacy_firmware {
                    out[0] = 0;
                }
                let (major, minor, patch) = self.firmware;
                out.extend_from_slice(&[self.feature_step, 2, major, minor, patch, b'R']);
                out.extend_from_slice(&0xC0FFEE01u32.to_be_bytes());
                out.push(0);
            }
            253 => out.extend_from_slice(&[0x10, 0x32, 0x54, 0x76, 0x98, 0xBA, 0xDC, 0xFE]),
            1 => {
                out.push(self.roms.len() as u8);
                out.extend_from_slice(&self.used_banks().to_be_bytes());
                out.extend_from_slice(&self.max_banks.to_be_bytes());
            }
            2 => {
                let bank_count = u16::from_be_bytes([payload[0], payload[1]]);
                let name_field = &payload[2..19];
                let end = name_field.iter().position(|&b| b == 0).unwrap_or(17);
                let name = String::from_utf8_lossy(&name_field[..end]).into_owned();
                self.last_speed_change_bank = (payload.len() == 21)
                    .then(|| u16::from_be_bytes([payload[19], payload[20]]));
                let status = self.status(command);
                if status == 0 {
                    self.upload = Some(PendingUpload {
                        bank_count,
                        name,
                        data: vec![0; bank_count as usize * ROM_BANK],
                    });
                }
                out.push(status);
            }
            3 => {
                let status = self.status(command);
                if status == 0 {
                    self.store_rom_chunk(payload);
                }
                out.push(status);
            }
            4 => {
                let rom = &self.roms[payload[0] as usize];
                let mut name = [0u8; 17];
                name[..rom.name.len()].copy_from_slice(rom.name.as_bytes());
                out.extend_from_slice(&name);
                out.push(rom.ram_banks);
                if self.feature_step >= 3 {
                    out.push(rom.mbc_code);
                    out.extend_from_slice(&rom.rom_banks.to_be_bytes());
                }
            }
            5 => {
                let status = self.status(command);
                if status == 0 {
                    self.roms.remove(payload[0] as usize);
                }
                out.extend_from_slice(&[status, 0]);
            }
            6 => {
                let status = self.status(command);
                if status == 0 {
                    self.download = Some((payload[0] as usize, 0));
                }
                out.extend_from_slice(&[status, 0]);
            }
            7 => self.next_download_chunk(&mut out),
            8 => {
                let status = self.status(command);
                if status == 0 {
                    self.save_upload = Some(payload[0] as usize);
                }
                out.push(status);
            }
            9 => {
                let status = self.status(command);
                if status == 0 {
                    self.store_save_chunk(payload);
                }
                out.push(status);
            }
            10 => {
                let slot = payload[0];
                match self.roms.get(slot as usize).and_then(|r| r.rtc) {
                    Some(record) => {
                        out.push(slot);
                        out.extend_from_slice(&record);
                    }
                    None => {
                        out.push(0xFF);
                        out.extend_from_slice(&[0u8; 48]);
                    }
                }
            }
            11 => {
                let slot = payload[0];
                let mut record = [0u8; 48];
                record.copy_from_slice(&payload[1..49]);
                self.roms[slot as usize].rtc = Some(record);
                out.push(self.rtc_store_echo.unwrap_or(slot));
                out.extend_from_slice(&record);
            }
            other => panic!("simulated device got unknown command {other}"),
        }

        if self.corrupt_echo == Some(command) {
            out[0] = command.wrapping_add(1);
        }
        out
    }

    fn store_rom_chunk(&mut self, payload: &[u8]) {
        let bank = u16::from_be_bytes([payload[0], payload[1]]) as usize;
        let chunk = u16::from_be_bytes([payload[2], payload[3]]) as usize;
        let Some(upload) = self.upload.as_mut() else {
            panic!("ROM chunk without upload request");
        };
        let offset = bank * ROM_BANK + chunk * 32;
        upload.data[offset..offset + 32].copy_from_slice(&payload[4..36]);

        if offset + 32 == upload.data.len() {
            let Some(done) = self.upload.take() else {
                return;
            };
            let mut rom = SimRom::new(&done.name, done.bank_count, 0, 0);
            rom.data = done.data;
            self.roms.push(rom);
        }
    }

    fn next_download_chunk(&mut self, out: &mut Vec<u8>) {
        let Some((slot, index)) = self.download.as_mut() else {
            panic!("savegame chunk without download request");
        };
        let mut chunk_index = *index;
        if self.skip_download_chunk == Some(chunk_index) {
            chunk_index += 1;
        }
        *index += 1;

        let save = &self.roms[*slot].save;
        let offset = chunk_index * 32;
        let bank = (offset / RAM_BANK) as u16;
        let chunk = ((offset % RAM_BANK) / 32) as u16;
        out.extend_from_slice(&bank.to_be_bytes());
        out.extend_from_slice(&chunk.to_be_bytes());
        out.extend_from_slice(&save[offset..offset + 32]);
    }

    fn store_save_chunk(&mut self, payload: &[u8]) {
        let Some(slot) = self.save_upload else {
            panic!("savegame chunk without upload request");
        };
        let bank = u16::from_be_bytes([payload[0], payload[1]]) as usize;
        let chunk = u16::from_be_bytes([payload[2], payload[3]]) as usize;
        let offset = bank * RAM_BANK + chunk * 32;
        let save = &mut self.roms[slot].save;
        if save.len() < offset + 32 {
            save.resize(offset + 32, 0);
        }
        save[offset..offset + 32].copy_from_slice(&payload[4..36]);
    }
}

impl Transport for SimulatedDevice {
    async fn write(&mut self, data: &[u8]) -> io::Result<()> {
        self.frames.push(data.to_vec());
        let response = self.respond(data);
        self.pending.extend(response);
        Ok(())
    }

    async fn read(&mut self, len: usize) -> io::Result<Vec<u8>> {
        if self.pending.len() < len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "simulated device has nothing more to say",
            ));
        }
        Ok(self.pending.drain(..len).collect())
    }

    async fn discard_pending(&mut self) -> io::Result<usize> {
        let stale = self.pending.len();
        self.pending.clear();
        Ok(stale)
    }
}
