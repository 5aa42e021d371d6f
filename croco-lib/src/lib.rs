//! Host-side protocol engine for the Croco Cartridge.
//!
//! Layers, bottom up:
//!
//! - [`transport`]: the byte channel ([`Transport`]), a tokio stream adapter
//!   and the serial port opener
//! - [`frame`]: request/response framing with echo validation
//! - [`capability`]: device-info negotiation and feature gating
//! - [`command`]: the command table with typed request/response records
//! - [`transfer`]: chunked bulk upload and download with progress
//! - [`client`]: [`DeviceSession`], the typed operations frontends call
//!
//! Plus [`savegame`] for the on-disk save file layout and [`settings`] for
//! the persisted host configuration.

pub mod async_util;
pub mod capability;
pub mod client;
pub mod command;
pub mod error;
pub mod frame;
pub mod savegame;
pub mod settings;
pub mod transfer;
pub mod transport;

pub use capability::{Capabilities, DeviceInfo, FirmwareVersion};
pub use client::{DeviceSession, DeviceSnapshot, RomUpload};
pub use command::{Command, RomSlotInfo, RomUtilization};
pub use error::{Operation, ProtocolError};
pub use frame::FrameCodec;
pub use savegame::SaveFile;
pub use settings::Settings;
pub use transfer::{ProgressSender, TransferPlan};
pub use transport::{SerialTransport, StreamTransport, Transport};
