//! In-memory transport - its own buffer is the storage.
//!
//! A transport with no underlying channel, used to stage encoded bytes in
//! memory: construct it empty to collect writes, or pre-loaded to serve
//! reads. Reading back bytes written to the same instance is not supported;
//! load a fresh instance instead.

use bytes::{Bytes, BytesMut};

use super::{RefillBuffer, Transport};
use crate::error::{Result, TransportError};

/// Transport backed entirely by an in-memory buffer.
///
/// # Example
///
/// ```
/// use bytewire::transport::{MemoryTransport, Transport};
///
/// let mut out = MemoryTransport::new();
/// out.write(b"staged").unwrap();
/// assert_eq!(out.get_value(), b"staged");
///
/// let mut src = MemoryTransport::with_bytes(b"staged".to_vec());
/// assert_eq!(&src.read_all(6).unwrap()[..], b"staged");
/// ```
pub struct MemoryTransport {
    rbuf: Bytes,
    wbuf: BytesMut,
    open: bool,
}

impl MemoryTransport {
    /// Create an empty transport for collecting writes.
    pub fn new() -> Self {
        Self {
            rbuf: Bytes::new(),
            wbuf: BytesMut::new(),
            open: true,
        }
    }

    /// Create a transport pre-loaded with bytes to read.
    pub fn with_bytes(value: impl Into<Bytes>) -> Self {
        Self {
            rbuf: value.into(),
            wbuf: BytesMut::new(),
            open: true,
        }
    }

    /// Create a pre-loaded transport whose reads start at `offset`.
    ///
    /// An offset past the end yields an immediately exhausted transport.
    pub fn with_bytes_at(value: impl Into<Bytes>, offset: usize) -> Self {
        let mut rbuf: Bytes = value.into();
        let skip = offset.min(rbuf.len());
        let _ = rbuf.split_to(skip);
        Self {
            rbuf,
            wbuf: BytesMut::new(),
            open: true,
        }
    }

    /// All bytes written so far.
    pub fn get_value(&self) -> &[u8] {
        &self.wbuf
    }

    fn ensure_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(TransportError::NotOpen("memory transport is closed".into()))
        }
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MemoryTransport {
    fn open(&mut self) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn read(&mut self, max: usize) -> Result<Bytes> {
        self.ensure_open()?;
        let take = max.min(self.rbuf.len());
        Ok(self.rbuf.split_to(take))
    }

    fn write(&mut self, buf: &[u8]) -> Result<()> {
        self.ensure_open()?;
        self.wbuf.extend_from_slice(buf);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.ensure_open()
    }

    fn refill_buffer(&mut self) -> Option<&mut dyn RefillBuffer> {
        Some(self)
    }
}

impl RefillBuffer for MemoryTransport {
    fn buffer(&self) -> Bytes {
        self.rbuf.clone()
    }

    /// A memory transport cannot produce more bytes than it was given.
    fn refill(&mut self, _partial: &[u8], _required: usize) -> Result<Bytes> {
        Err(TransportError::EndOfStream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_get_value_unframed() {
        let mut transport = MemoryTransport::new();
        transport.write(b"alpha").unwrap();
        transport.write(b"beta").unwrap();
        transport.flush().unwrap();

        assert_eq!(transport.get_value(), b"alphabeta");
    }

    #[test]
    fn test_preloaded_reads_in_order() {
        let mut transport = MemoryTransport::with_bytes(b"0123456789".to_vec());

        assert_eq!(&transport.read(4).unwrap()[..], b"0123");
        assert_eq!(&transport.read_all(6).unwrap()[..], b"456789");
        // Exhausted: empty read signals end of stream.
        assert!(transport.read(1).unwrap().is_empty());
    }

    #[test]
    fn test_read_past_end_is_end_of_stream() {
        let mut transport = MemoryTransport::with_bytes(b"abc".to_vec());

        match transport.read_all(4) {
            Err(TransportError::EndOfStream) => {}
            other => panic!("expected EndOfStream, got {:?}", other),
        }
    }

    #[test]
    fn test_offset_skips_prefix() {
        let mut transport = MemoryTransport::with_bytes_at(b"skipkeep".to_vec(), 4);
        assert_eq!(&transport.read_all(4).unwrap()[..], b"keep");
    }

    #[test]
    fn test_offset_past_end_reads_nothing() {
        let mut transport = MemoryTransport::with_bytes_at(b"ab".to_vec(), 10);
        assert!(transport.read(1).unwrap().is_empty());
    }

    #[test]
    fn test_close_marks_not_open() {
        let mut transport = MemoryTransport::new();
        assert!(transport.is_open());

        transport.close().unwrap();
        assert!(!transport.is_open());

        assert!(matches!(
            transport.read(1),
            Err(TransportError::NotOpen(_))
        ));
        assert!(matches!(
            transport.write(b"x"),
            Err(TransportError::NotOpen(_))
        ));
    }

    #[test]
    fn test_refill_always_fails() {
        let mut transport = MemoryTransport::with_bytes(b"plenty of bytes".to_vec());
        match transport.refill(b"", 1) {
            Err(TransportError::EndOfStream) => {}
            other => panic!("expected EndOfStream, got {:?}", other),
        }
    }

    #[test]
    fn test_buffer_snapshot_tracks_cursor() {
        let mut transport = MemoryTransport::with_bytes(b"abcdef".to_vec());
        transport.read(2).unwrap();
        assert_eq!(&transport.buffer()[..], b"cdef");
    }
}
