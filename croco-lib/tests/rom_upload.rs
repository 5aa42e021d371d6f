mod common;

use common::{SimRom, SimulatedDevice};
use croco_core::TransferProgress;
use croco_lib::{DeviceSession, Operation, ProtocolError, RomUpload};
use tokio::sync::mpsc;

fn patterned_rom(banks: usize) -> Vec<u8> {
    (0..banks * 0x4000).map(|i| (i * 7 % 256) as u8).collect()
}

fn request(name: &str, bank_count: u16, speed_change_bank: u16) -> RomUpload {
    RomUpload {
        name: name.to_string(),
        bank_count,
        speed_change_bank,
    }
}

#[tokio::test]
async fn test_upload_request_length_follows_feature_step() {
    for (step, expected_len) in [(1u8, 19usize), (2, 21), (3, 21)] {
        let mut session = DeviceSession::connect(SimulatedDevice::new(step)).await;
        session
            .request_rom_upload(&request("GAME", 2, 1))
            .await
            .unwrap();

        let frames = session.transport().frames_for(2);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].len() - 1, expected_len, "feature step {step}");
    }
}

#[tokio::test]
async fn test_speed_change_bank_reaches_capable_firmware() {
    let mut session = DeviceSession::connect(SimulatedDevice::new(2)).await;
    session
        .request_rom_upload(&request("GAME", 8, 5))
        .await
        .unwrap();
    assert_eq!(session.transport().last_speed_change_bank, Some(5));

    let mut session = DeviceSession::connect(SimulatedDevice::new(1)).await;
    session
        .request_rom_upload(&request("GAME", 8, 5))
        .await
        .unwrap();
    assert_eq!(session.transport().last_speed_change_bank, None);
}

#[tokio::test]
async fn test_upload_four_banks() {
    let rom = patterned_rom(4);
    let mut session = DeviceSession::connect(SimulatedDevice::new(3)).await;
    let (tx, mut rx) = mpsc::unbounded_channel::<TransferProgress>();

    session
        .upload_rom(&request("FOURBANKS", 4, 0xFFFF), &rom, Some(&tx))
        .await
        .unwrap();
    drop(tx);

    let device = session.transport();
    let chunks = device.frames_for(3);
    assert_eq!(chunks.len(), 2048);

    let addresses: Vec<(u16, u16)> = chunks
        .iter()
        .map(|f| {
            (
                u16::from_be_bytes([f[1], f[2]]),
                u16::from_be_bytes([f[3], f[4]]),
            )
        })
        .collect();
    assert!(addresses.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(addresses[0], (0, 0));
    assert_eq!(addresses[2047], (3, 511));

    assert_eq!(device.roms.len(), 1);
    assert_eq!(device.roms[0].name, "FOURBANKS");
    assert_eq!(device.roms[0].data, rom);

    let mut updates = Vec::new();
    while let Ok(p) = rx.try_recv() {
        updates.push(p);
    }
    assert!(updates.windows(2).all(|w| w[0].bytes_done <= w[1].bytes_done));
    let last = updates.last().unwrap();
    assert_eq!(last.bytes_done, 4 * 0x4000);
    assert_eq!(last.banks_done, 4);
    assert!(last.is_complete());
}

#[tokio::test]
async fn test_insufficient_space_sends_nothing() {
    let mut device = SimulatedDevice::new(3).with_rom(SimRom::new("BIG", 508, 0, 0));
    device.max_banks = 512;
    let mut session = DeviceSession::connect(device).await;

    let err = session
        .upload_rom(&request("NEXT", 8, 0xFFFF), &patterned_rom(8), None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ProtocolError::InsufficientSpace {
            needed: 8,
            available: 4
        }
    ));
    assert!(session.transport().frames_for(2).is_empty());
    assert!(session.transport().frames_for(3).is_empty());
}

#[tokio::test]
async fn test_invalid_names_are_refused_before_sending() {
    let mut session = DeviceSession::connect(SimulatedDevice::new(3)).await;
    let rom = patterned_rom(2);

    for name in ["", "THIS NAME IS TOO LONG"] {
        let err = session
            .upload_rom(&request(name, 2, 0xFFFF), &rom, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidName(_)), "{name:?}");
    }
    assert_eq!(session.transport().frames.len(), 1);
}

#[tokio::test]
async fn test_short_image_is_refused() {
    let mut session = DeviceSession::connect(SimulatedDevice::new(3)).await;
    let err = session
        .upload_rom(&request("SHORT", 4, 0xFFFF), &patterned_rom(2), None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ProtocolError::SourceTooShort {
            expected: 0x10000,
            actual: 0x8000
        }
    ));
    assert!(session.transport().frames_for(3).is_empty());
}

#[tokio::test]
async fn test_rejected_upload_request() {
    let mut device = SimulatedDevice::new(3);
    device.reject.insert(2, 3);
    let mut session = DeviceSession::connect(device).await;

    let err = session
        .upload_rom(&request("NOPE", 2, 0xFFFF), &patterned_rom(2), None)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "ROM not accepted (status 3)");
    assert!(session.transport().frames_for(3).is_empty());
}

#[tokio::test]
async fn test_rejected_chunk_aborts_transfer() {
    let mut device = SimulatedDevice::new(3);
    device.reject.insert(3, 1);
    let mut session = DeviceSession::connect(device).await;

    let err = session
        .upload_rom(&request("ABORT", 2, 0xFFFF), &patterned_rom(2), None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ProtocolError::Rejected {
            operation: Operation::RomChunk,
            ..
        }
    ));
    assert_eq!(session.transport().frames_for(3).len(), 1);
    assert!(session.transport().roms.is_empty());
}
