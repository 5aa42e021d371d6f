use std::collections::VecDeque;
use std::io;

use super::*;

/// Records writes and answers reads from a queue of canned bytes.
#[derive(Default)]
struct Scripted {
    written: Vec<Vec<u8>>,
    replies: VecDeque<u8>,
    discards: usize,
}

impl Scripted {
    fn replying(bytes: &[u8]) -> Self {
        Self {
            written: Vec::new(),
            replies: bytes.iter().copied().collect(),
            discards: 0,
        }
    }
}

impl Transport for Scripted {
    async fn write(&mut self, data: &[u8]) -> io::Result<()> {
        self.written.push(data.to_vec());
        Ok(())
    }

    async fn read(&mut self, len: usize) -> io::Result<Vec<u8>> {
        if self.replies.len() < len {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        Ok(self.replies.drain(..len).collect())
    }

    async fn discard_pending(&mut self) -> io::Result<usize> {
        self.discards += 1;
        Ok(0)
    }
}

#[test]
fn test_frame_encoding() {
    let frame = Frame::new(4, &[7]).unwrap();
    assert_eq!(frame.encode(), vec![4, 7]);
    assert_eq!(Frame::new(1, &[]).unwrap().encode(), vec![1]);
}

#[test]
fn test_payload_limit() {
    assert!(Frame::new(3, &[0u8; MAX_PAYLOAD_SIZE]).is_ok());
    assert!(matches!(
        Frame::new(3, &[0u8; MAX_PAYLOAD_SIZE + 1]),
        Err(ProtocolError::PayloadTooLarge(64))
    ));
}

#[test]
fn test_decode_strips_echo() {
    assert_eq!(decode_response(5, &[5, 0, 1], 2).unwrap(), vec![0, 1]);
}

#[test]
fn test_decode_mismatch() {
    let err = decode_response(5, &[6, 0, 1], 2).unwrap_err();
    assert!(matches!(
        err,
        ProtocolError::ProtocolMismatch {
            sent: 5,
            received: 6
        }
    ));
}

#[test]
fn test_decode_short() {
    assert!(matches!(
        decode_response(5, &[5], 2),
        Err(ProtocolError::ShortResponse { actual: 0, .. })
    ));
    assert!(matches!(
        decode_response(5, &[], 2),
        Err(ProtocolError::ShortResponse {
            expected: 2,
            actual: 0,
            ..
        })
    ));
}

#[tokio::test]
async fn test_execute_writes_id_then_payload() {
    let mut codec = FrameCodec::new(Scripted::replying(&[4, 1, 2, 3]));
    let body = codec.execute(4, &[9], 3).await.unwrap();

    assert_eq!(body, vec![1, 2, 3]);
    assert_eq!(codec.transport().written, vec![vec![4, 9]]);
}

#[tokio::test]
async fn test_execute_every_payload_size() {
    for len in 0..=MAX_PAYLOAD_SIZE {
        let payload: Vec<u8> = (0..len as u8).collect();
        let mut codec = FrameCodec::new(Scripted::replying(&[9, 0]));
        codec.execute(9, &payload, 1).await.unwrap();

        let written = &codec.transport().written[0];
        assert_eq!(written.len(), len + 1);
        assert_eq!(written[0], 9);
        assert_eq!(&written[1..], &payload[..]);
    }
}

#[tokio::test]
async fn test_oversized_payload_never_reaches_transport() {
    let mut codec = FrameCodec::new(Scripted::default());
    let err = codec.execute(3, &[0u8; 100], 1).await.unwrap_err();

    assert!(matches!(err, ProtocolError::PayloadTooLarge(100)));
    assert!(codec.transport().written.is_empty());
}

#[tokio::test]
async fn test_transport_failure_propagates() {
    let mut codec = FrameCodec::new(Scripted::default());
    let err = codec.execute(1, &[], 5).await.unwrap_err();
    match err {
        ProtocolError::Transport(e) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_failed_exchange_resyncs_once() {
    let mut codec = FrameCodec::new(Scripted::replying(&[2, 0, 1, 7, 1, 8]));

    assert!(matches!(
        codec.execute(1, &[], 1).await,
        Err(ProtocolError::ProtocolMismatch { .. })
    ));
    assert_eq!(codec.transport().discards, 0);

    assert_eq!(codec.execute(1, &[], 1).await.unwrap(), vec![7]);
    assert_eq!(codec.transport().discards, 1);

    assert_eq!(codec.execute(1, &[], 1).await.unwrap(), vec![8]);
    assert_eq!(codec.transport().discards, 1);
}

#[tokio::test]
async fn test_rejected_status_does_not_resync() {
    let mut codec = FrameCodec::new(Scripted::replying(&[3, 1, 3, 0]));
    assert_eq!(codec.execute(3, &[], 1).await.unwrap(), vec![1]);
    assert_eq!(codec.execute(3, &[], 1).await.unwrap(), vec![0]);
    assert_eq!(codec.transport().discards, 0);
}
