//! Game Boy / Game Boy Color ROM analysis for the Croco Cartridge.
//!
//! Everything here runs on an in-memory ROM buffer:
//!
//! - [`header`] parses the cartridge header (name, bank count, CGB flag,
//!   memory controller)
//! - [`speed_switch`] scans CGB code for the double-speed switch sequence
//! - [`mbc`] maps cartridge-type and device codes to memory bank controllers

pub mod error;
pub mod header;
pub mod mbc;
pub mod speed_switch;

pub use error::HeaderError;
pub use header::{RomHeader, analyze, parse_header};
pub use mbc::MbcType;
pub use speed_switch::{find_speed_change_bank, find_speed_switch_offset};
