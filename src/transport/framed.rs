//! Framed transport - symmetric length-prefixed framing.
//!
//! Wraps another transport and frames its I/O: each flush emits one frame
//! (`[length: u32 BE][payload]`), each read pulls exactly one frame into
//! the read buffer. Header and payload go out in a single underlying write;
//! one concatenated buffer is far cheaper than two channel operations.

use bytes::{Bytes, BytesMut};

use super::{RefillBuffer, Transport, TransportFactory};
use crate::error::Result;
use crate::protocol::{
    decode_frame_header, encode_frame_header, DEFAULT_MAX_FRAME_SIZE, FRAME_HEADER_SIZE,
};

/// Transport wrapper adding length-prefixed framing on read and write.
///
/// # Example
///
/// ```
/// use bytewire::transport::{FramedTransport, MemoryTransport, Transport};
///
/// let mut framed = FramedTransport::new(MemoryTransport::new());
/// framed.write(b"hello").unwrap();
/// framed.flush().unwrap();
/// assert_eq!(framed.inner().get_value(), b"\x00\x00\x00\x05hello");
/// ```
pub struct FramedTransport<T> {
    inner: T,
    rbuf: Bytes,
    wbuf: BytesMut,
    max_frame_size: u32,
}

impl<T: Transport> FramedTransport<T> {
    /// Wrap `inner` with the default maximum frame size.
    pub fn new(inner: T) -> Self {
        Self::with_max_frame_size(inner, DEFAULT_MAX_FRAME_SIZE)
    }

    /// Wrap `inner`, rejecting inbound frames larger than `max_frame_size`.
    pub fn with_max_frame_size(inner: T, max_frame_size: u32) -> Self {
        Self {
            inner,
            rbuf: Bytes::new(),
            wbuf: BytesMut::new(),
            max_frame_size,
        }
    }

    /// Get a reference to the inner transport.
    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Get a mutable reference to the inner transport.
    pub fn inner_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Unwrap, returning the inner transport. Buffered but unflushed writes
    /// are discarded.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Read one whole frame from the inner transport and return its payload.
    ///
    /// The header is validated before the payload read: a negative or
    /// oversized length fails without consuming payload bytes.
    fn read_frame(&mut self) -> Result<Bytes> {
        let header = self.inner.read_all(FRAME_HEADER_SIZE)?;
        let len = decode_frame_header(
            [header[0], header[1], header[2], header[3]],
            self.max_frame_size,
        )?;
        self.inner.read_all(len as usize)
    }
}

impl<T: Transport> Transport for FramedTransport<T> {
    fn open(&mut self) -> Result<()> {
        self.inner.open()
    }

    fn close(&mut self) -> Result<()> {
        self.inner.close()
    }

    fn is_open(&self) -> bool {
        self.inner.is_open()
    }

    fn read(&mut self, max: usize) -> Result<Bytes> {
        if self.rbuf.is_empty() {
            self.rbuf = self.read_frame()?;
        }
        let take = max.min(self.rbuf.len());
        Ok(self.rbuf.split_to(take))
    }

    fn write(&mut self, buf: &[u8]) -> Result<()> {
        self.wbuf.extend_from_slice(buf);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        // Empty the write buffer before the send attempt; a failed flush
        // never re-sends a half-built frame.
        let payload = self.wbuf.split().freeze();
        let wsz = payload.len() as u32;

        let mut frame = Vec::with_capacity(FRAME_HEADER_SIZE + payload.len());
        frame.extend_from_slice(&encode_frame_header(wsz));
        frame.extend_from_slice(&payload);

        tracing::trace!(len = wsz, "sending frame");
        self.inner.write(&frame)?;
        self.inner.flush()
    }

    fn refill_buffer(&mut self) -> Option<&mut dyn RefillBuffer> {
        Some(self)
    }
}

impl<T: Transport> RefillBuffer for FramedTransport<T> {
    fn buffer(&self) -> Bytes {
        self.rbuf.clone()
    }

    fn refill(&mut self, partial: &[u8], required: usize) -> Result<Bytes> {
        let mut acc = BytesMut::with_capacity(required.max(partial.len()));
        acc.extend_from_slice(partial);

        // Whole frames only: keep pulling frames until the requirement is
        // covered.
        while acc.len() < required {
            let payload = self.read_frame()?;
            acc.extend_from_slice(&payload);
        }

        self.rbuf = acc.freeze();
        Ok(self.rbuf.clone())
    }
}

/// Factory that wraps base transports in [`FramedTransport`].
#[derive(Debug, Clone, Copy)]
pub struct FramedTransportFactory {
    /// Maximum inbound frame size for produced transports.
    pub max_frame_size: u32,
}

impl Default for FramedTransportFactory {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

impl<T: Transport> TransportFactory<T> for FramedTransportFactory {
    type Output = FramedTransport<T>;

    fn get_transport(&self, base: T) -> FramedTransport<T> {
        FramedTransport::with_max_frame_size(base, self.max_frame_size)
    }
}
