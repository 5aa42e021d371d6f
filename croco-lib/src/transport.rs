//! Byte channel to the cartridge.
//!
//! The cartridge enumerates as a USB CDC serial device. [`Transport`] is the
//! seam the protocol layers are written against, and [`StreamTransport`]
//! adapts any tokio stream (a raw-mode serial port, a socket, an in-memory
//! duplex) to it.

use std::future::Future;
use std::io;
use std::path::Path;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_serial::{
    ClearBuffer, DataBits, FlowControl, Parity, SerialPort, SerialPortBuilderExt, SerialStream,
    StopBits,
};

/// Line rate requested when opening the port. The CDC firmware ignores it.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Quiet period that ends a discard when no timeout is configured.
const DEFAULT_SETTLE: Duration = Duration::from_millis(100);

/// A bidirectional byte channel.
///
/// Implementations must deliver writes in order and make `read` return
/// exactly `len` bytes or fail.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn write(&mut self, data: &[u8]) -> io::Result<()>;

    async fn read(&mut self, len: usize) -> io::Result<Vec<u8>>;

    /// Throw away input left over from an abandoned exchange and return how
    /// many bytes were dropped.
    async fn discard_pending(&mut self) -> io::Result<usize> {
        Ok(0)
    }
}

/// [`Transport`] over a tokio stream with an optional per-operation timeout.
#[derive(Debug)]
pub struct StreamTransport<S> {
    stream: S,
    timeout: Option<Duration>,
}

/// The transport used for real hardware.
pub type SerialTransport = StreamTransport<SerialStream>;

impl<S> StreamTransport<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            timeout: None,
        }
    }

    /// Fail reads and writes that take longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl StreamTransport<SerialStream> {
    /// Open the cartridge's serial port (e.g. `/dev/ttyACM0`, `COM3`) as a
    /// raw 8N1 line without flow control.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let port = tokio_serial::new(path.to_string_lossy(), DEFAULT_BAUD_RATE)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .open_native_async()?;
        port.clear(ClearBuffer::Input)?;
        log::debug!("Opened {} at {} baud", path.display(), DEFAULT_BAUD_RATE);
        Ok(Self::new(port))
    }
}

impl<S> Transport for StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    async fn write(&mut self, data: &[u8]) -> io::Result<()> {
        let stream = &mut self.stream;
        with_deadline(self.timeout, async move {
            stream.write_all(data).await?;
            stream.flush().await
        })
        .await
    }

    async fn read(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        with_deadline(self.timeout, self.stream.read_exact(&mut buf)).await?;
        Ok(buf)
    }

    /// Read until the line stays quiet for one timeout period.
    async fn discard_pending(&mut self) -> io::Result<usize> {
        let settle = self.timeout.unwrap_or(DEFAULT_SETTLE);
        let mut scratch = [0u8; 64];
        let mut discarded = 0;
        loop {
            match tokio::time::timeout(settle, self.stream.read(&mut scratch)).await {
                Ok(Ok(0)) | Err(_) => return Ok(discarded),
                Ok(Ok(n)) => discarded += n,
                Ok(Err(e)) => return Err(e),
            }
        }
    }
}

async fn with_deadline<T>(
    timeout: Option<Duration>,
    fut: impl Future<Output = io::Result<T>>,
) -> io::Result<T> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| {
            io::Error::new(
                io::ErrorKind::TimedOut,
                format!("no answer from device within {} ms", limit.as_millis()),
            )
        })?,
        None => fut.await,
    }
}
