//! Chunked bulk transfers.
//!
//! ROM images and save RAM move 32 bytes per round trip, bank by bank. A
//! transfer either moves exactly the declared byte count or stops at the
//! first error; there is no resume and no rollback, so an aborted upload
//! leaves the target slot in an undefined state until it is rewritten.

use croco_core::{
    CHUNK_SIZE, MBC2_RAM_SIZE, PayloadKind, RAM_BANK_SIZE, ROM_BANK_SIZE, TransferProgress,
};
use croco_gameboy::MbcType;
use tokio::sync::mpsc::UnboundedSender;

use crate::capability::Capabilities;
use crate::command::{self, Command};
use crate::error::{Operation, ProtocolError};
use crate::frame::FrameCodec;
use crate::transport::Transport;

/// Channel half that receives progress snapshots.
pub type ProgressSender = UnboundedSender<TransferProgress>;

/// Bank geometry of one bulk transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferPlan {
    pub kind: PayloadKind,
    pub bank_count: u16,
    pub bank_size: usize,
}

/// Position of one chunk within a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkAddress {
    pub bank: u16,
    pub chunk: u16,
    /// Byte offset into the flat payload
    pub offset: usize,
}

impl TransferPlan {
    /// A ROM image of `bank_count` 16 KiB banks.
    pub fn rom(bank_count: u16) -> Self {
        Self {
            kind: PayloadKind::Rom,
            bank_count,
            bank_size: ROM_BANK_SIZE,
        }
    }

    /// Save RAM of `ram_banks` 8 KiB banks, or the single 512-byte MBC2
    /// region regardless of `ram_banks`.
    pub fn save_ram(ram_banks: u8, mbc: Option<MbcType>) -> Self {
        match mbc {
            Some(MbcType::Mbc2) => Self {
                kind: PayloadKind::SaveRam,
                bank_count: 1,
                bank_size: MBC2_RAM_SIZE,
            },
            _ => Self {
                kind: PayloadKind::SaveRam,
                bank_count: u16::from(ram_banks),
                bank_size: RAM_BANK_SIZE,
            },
        }
    }

    pub fn chunk_size(&self) -> usize {
        CHUNK_SIZE
    }

    pub fn chunks_per_bank(&self) -> usize {
        self.bank_size / CHUNK_SIZE
    }

    pub fn total_bytes(&self) -> usize {
        self.bank_count as usize * self.bank_size
    }

    pub fn total_chunks(&self) -> usize {
        self.bank_count as usize * self.chunks_per_bank()
    }

    /// Every chunk in transfer order: banks ascending, chunks ascending.
    pub fn chunks(&self) -> impl Iterator<Item = ChunkAddress> {
        let bank_size = self.bank_size;
        let per_bank = self.chunks_per_bank();
        (0..self.bank_count).flat_map(move |bank| {
            (0..per_bank).map(move |chunk| ChunkAddress {
                bank,
                chunk: chunk as u16,
                offset: bank as usize * bank_size + chunk * CHUNK_SIZE,
            })
        })
    }

    fn progress_at(&self, bytes_done: usize) -> TransferProgress {
        let mut progress =
            TransferProgress::started(self.kind, self.total_bytes() as u64, self.bank_count);
        progress.bytes_done = bytes_done as u64;
        progress.banks_done = (bytes_done / self.bank_size) as u16;
        progress
    }
}

fn report(progress: Option<&ProgressSender>, update: TransferProgress) {
    if let Some(tx) = progress {
        // A dropped receiver only means nobody is watching
        let _ = tx.send(update);
    }
}

/// Send `source` to the device chunk by chunk with `command`.
///
/// Each chunk must be acknowledged with status 0; a non-zero status aborts
/// the transfer with a rejection naming `operation`. `source` must hold at
/// least the planned byte count, checked before anything is sent.
pub async fn upload_bulk<T: Transport>(
    codec: &mut FrameCodec<T>,
    command: Command,
    operation: Operation,
    plan: &TransferPlan,
    source: &[u8],
    progress: Option<&ProgressSender>,
) -> Result<(), ProtocolError> {
    let total = plan.total_bytes();
    if source.len() < total {
        return Err(ProtocolError::SourceTooShort {
            expected: total,
            actual: source.len(),
        });
    }

    let caps = Capabilities::default();
    report(progress, plan.progress_at(0));
    for addr in plan.chunks() {
        let data = &source[addr.offset..addr.offset + CHUNK_SIZE];
        let payload = command::encode_chunk(addr.bank, addr.chunk, data);
        let body = codec
            .execute(command.id(), &payload, command.response_len(&caps))
            .await?;
        command::check_status(operation, body[0])?;
        report(progress, plan.progress_at(addr.offset + CHUNK_SIZE));
    }

    log::debug!(
        "Uploaded {} bytes of {} in {} chunks",
        total,
        plan.kind.display_name(),
        plan.total_chunks()
    );
    Ok(())
}

/// Receive a savegame chunk by chunk and assemble it.
///
/// The device streams chunks in order after a download request; every
/// echoed (bank, chunk) pair is checked against the expected sequence and
/// the first mismatch aborts the transfer.
pub async fn download_bulk<T: Transport>(
    codec: &mut FrameCodec<T>,
    plan: &TransferPlan,
    progress: Option<&ProgressSender>,
) -> Result<Vec<u8>, ProtocolError> {
    let command = Command::ReceiveSavegameChunk;
    let caps = Capabilities::default();
    let mut buffer = Vec::with_capacity(plan.total_bytes());

    report(progress, plan.progress_at(0));
    for addr in plan.chunks() {
        let body = codec
            .execute(command.id(), &[], command.response_len(&caps))
            .await?;
        let chunk = command::decode_save_chunk(&body);
        if chunk.bank != addr.bank || chunk.chunk != addr.chunk {
            return Err(ProtocolError::SequenceMismatch {
                expected_bank: addr.bank,
                expected_chunk: addr.chunk,
                bank: chunk.bank,
                chunk: chunk.chunk,
            });
        }
        buffer.extend_from_slice(&chunk.data);
        report(progress, plan.progress_at(buffer.len()));
    }

    Ok(buffer)
}
