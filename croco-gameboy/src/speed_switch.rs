//! Locate the CGB double-speed switch in ROM code.
//!
//! CGB games enter double-speed mode by writing KEY1 (`LDH [$4D], A`,
//! encoded `E0 4D`) and then executing `STOP` (`10`). The firmware has to
//! keep the bank holding that `STOP` mapped while the CPU changes speed, so
//! the host reports the bank alongside the upload request.
//!
//! The scan is a four-state automaton over the raw bytes, one forward pass,
//! stopping at the first match:
//!
//! ```text
//! Idle            --E0-->       SawStore
//! SawStore        --4D-->       SawOperand     (anything else -> Idle)
//! SawOperand      --10-->       match
//! SawOperand      --C9/FF-->    Idle           (RET, RST 38 / erased flash)
//! SawOperand      --E0/F0-->    SkipOperand    (another LDH in between)
//! SkipOperand     --any-->      SawOperand
//! ```
//!
//! Embedded `LDH` instructions skip their operand byte and resume waiting
//! for `STOP`, so `E0 4D E0 4D 10` still matches.

use croco_core::{NO_SPEED_CHANGE_BANK, ROM_BANK_SIZE};

const LDH_STORE: u8 = 0xE0;
const LDH_LOAD: u8 = 0xF0;
const KEY1_REGISTER: u8 = 0x4D;
const STOP: u8 = 0x10;
const RET: u8 = 0xC9;
const RST_38: u8 = 0xFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScanState {
    Idle,
    SawStore,
    SawOperand,
    SkipOperand,
}

/// Outcome of feeding one byte to the automaton.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Next(ScanState),
    Matched,
}

pub(crate) fn step(state: ScanState, byte: u8) -> Step {
    use ScanState::*;

    match (state, byte) {
        (Idle, LDH_STORE) => Step::Next(SawStore),
        (Idle, _) => Step::Next(Idle),
        (SawStore, KEY1_REGISTER) => Step::Next(SawOperand),
        (SawStore, _) => Step::Next(Idle),
        (SawOperand, STOP) => Step::Matched,
        (SawOperand, RET | RST_38) => Step::Next(Idle),
        (SawOperand, LDH_STORE | LDH_LOAD) => Step::Next(SkipOperand),
        (SawOperand, _) => Step::Next(SawOperand),
        (SkipOperand, _) => Step::Next(SawOperand),
    }
}

/// Offset of the `STOP` byte completing the first speed-switch sequence.
pub fn find_speed_switch_offset(rom: &[u8]) -> Option<usize> {
    let mut state = ScanState::Idle;
    for (offset, &byte) in rom.iter().enumerate() {
        match step(state, byte) {
            Step::Matched => return Some(offset),
            Step::Next(next) => state = next,
        }
    }
    None
}

/// Bank holding the speed-switch `STOP`, or `0xFFFF` when there is none.
pub fn find_speed_change_bank(rom: &[u8]) -> u16 {
    match find_speed_switch_offset(rom) {
        Some(offset) => {
            let bank = offset / ROM_BANK_SIZE;
            log::debug!("Speed change stop at {:#x} (bank {})", offset, bank);
            // A ROM large enough to overflow u16 banks is rejected by the
            // header parser long before this point.
            u16::try_from(bank).unwrap_or(NO_SPEED_CHANGE_BANK)
        }
        None => NO_SPEED_CHANGE_BANK,
    }
}

#[cfg(test)]
#[path = "tests/speed_switch_tests.rs"]
mod tests;
