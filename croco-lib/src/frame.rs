//! Request/response framing.
//!
//! A request frame is the command id followed by an optional payload, at most
//! 64 bytes in total. The response is a fixed-length frame whose first byte
//! echoes the command id; the length is known from the command table, so no
//! length prefix travels on the wire.

use crate::error::ProtocolError;
use crate::transport::Transport;

/// Largest request frame the firmware accepts.
pub const MAX_FRAME_SIZE: usize = 64;
/// Largest payload that fits alongside the command id.
pub const MAX_PAYLOAD_SIZE: usize = MAX_FRAME_SIZE - 1;

/// A request frame: command id plus payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    command: u8,
    payload: Vec<u8>,
}

impl Frame {
    pub fn new(command: u8, payload: &[u8]) -> Result<Self, ProtocolError> {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge(payload.len()));
        }
        Ok(Self {
            command,
            payload: payload.to_vec(),
        })
    }

    pub fn command(&self) -> u8 {
        self.command
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Wire bytes: `[command, payload...]`.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(1 + self.payload.len());
        bytes.push(self.command);
        bytes.extend_from_slice(&self.payload);
        bytes
    }
}

/// Check a raw response against the command it answers and strip the echo.
///
/// `expected_len` counts the payload only, not the echoed id.
pub fn decode_response(
    command: u8,
    response: &[u8],
    expected_len: usize,
) -> Result<Vec<u8>, ProtocolError> {
    let Some((&echo, body)) = response.split_first() else {
        return Err(ProtocolError::ShortResponse {
            command,
            expected: expected_len,
            actual: 0,
        });
    };
    if echo != command {
        return Err(ProtocolError::ProtocolMismatch {
            sent: command,
            received: echo,
        });
    }
    if body.len() < expected_len {
        return Err(ProtocolError::ShortResponse {
            command,
            expected: expected_len,
            actual: body.len(),
        });
    }
    Ok(body[..expected_len].to_vec())
}

/// Runs one request/response exchange at a time over a [`Transport`].
///
/// `execute` takes `&mut self`, so a codec can never have two exchanges in
/// flight. Callers that share a session between tasks wrap it in a
/// `tokio::sync::Mutex`.
///
/// An exchange that fails on I/O or with a wrong echo may leave part of a
/// reply on the line. The next `execute` discards pending input before
/// sending, so one failed exchange does not misalign every later one.
#[derive(Debug)]
pub struct FrameCodec<T> {
    transport: T,
    needs_resync: bool,
}

impl<T: Transport> FrameCodec<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            needs_resync: false,
        }
    }

    /// Send `command` with `payload`, then read the echoed id plus
    /// `response_len` payload bytes.
    ///
    /// Returns the response payload.
    pub async fn execute(
        &mut self,
        command: u8,
        payload: &[u8],
        response_len: usize,
    ) -> Result<Vec<u8>, ProtocolError> {
        let frame = Frame::new(command, payload)?;
        if self.needs_resync {
            let stale = self.transport.discard_pending().await?;
            if stale > 0 {
                log::debug!("Discarded {} stale bytes before command {}", stale, command);
            }
            self.needs_resync = false;
        }

        let result = self.exchange(&frame, response_len).await;
        if matches!(
            result,
            Err(ProtocolError::Transport(_) | ProtocolError::ProtocolMismatch { .. })
        ) {
            self.needs_resync = true;
        }
        result
    }

    async fn exchange(
        &mut self,
        frame: &Frame,
        response_len: usize,
    ) -> Result<Vec<u8>, ProtocolError> {
        let request = frame.encode();
        log::trace!("-> {:02x?}", request);
        self.transport.write(&request).await?;

        let response = self.transport.read(response_len + 1).await?;
        log::trace!("<- {:02x?}", response);
        decode_response(frame.command(), &response, response_len)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }
}

#[cfg(test)]
#[path = "tests/frame_tests.rs"]
mod tests;
