//! Buffered transport - read-ahead window plus write coalescing.
//!
//! Wraps another transport and buffers its I/O: reads pull a fixed-size
//! window ahead of demand, writes accumulate until `flush` sends them as a
//! single underlying write. Underlying channel operations dominate latency
//! on socket-backed channels, so both directions aim for as few of them as
//! possible.

use bytes::{Bytes, BytesMut};

use super::{RefillBuffer, Transport, TransportFactory};
use crate::error::Result;

/// Default read window size in bytes.
pub const DEFAULT_WINDOW_SIZE: usize = 4096;

/// Transport wrapper adding a read-ahead window and an unbounded
/// write-coalescing buffer.
///
/// # Example
///
/// ```
/// use bytewire::transport::{BufferedTransport, MemoryTransport, Transport};
///
/// let inner = MemoryTransport::with_bytes(b"hello".to_vec());
/// let mut buffered = BufferedTransport::new(inner);
/// assert_eq!(&buffered.read_all(5).unwrap()[..], b"hello");
/// ```
pub struct BufferedTransport<T> {
    inner: T,
    rbuf: Bytes,
    wbuf: BytesMut,
    window: usize,
}

impl<T: Transport> BufferedTransport<T> {
    /// Wrap `inner` with the default read window.
    pub fn new(inner: T) -> Self {
        Self::with_window(inner, DEFAULT_WINDOW_SIZE)
    }

    /// Wrap `inner` with a custom read window size.
    pub fn with_window(inner: T, window: usize) -> Self {
        Self {
            inner,
            rbuf: Bytes::new(),
            wbuf: BytesMut::new(),
            window,
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
}

impl<T: Transport> Transport for BufferedTransport<T> {
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
            // One bulk fetch, never a partial refill mid-read.
            self.rbuf = self.inner.read(max.max(self.window))?;
        }
        let take = max.min(self.rbuf.len());
        Ok(self.rbuf.split_to(take))
    }

    fn write(&mut self, buf: &[u8]) -> Result<()> {
        self.wbuf.extend_from_slice(buf);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        // The write buffer is emptied before the send attempt, so a failed
        // flush never re-sends these bytes later.
        let out = self.wbuf.split().freeze();
        self.inner.write(&out)?;
        self.inner.flush()
    }

    fn refill_buffer(&mut self) -> Option<&mut dyn RefillBuffer> {
        Some(self)
    }
}

impl<T: Transport> RefillBuffer for BufferedTransport<T> {
    fn buffer(&self) -> Bytes {
        self.rbuf.clone()
    }

    fn refill(&mut self, partial: &[u8], required: usize) -> Result<Bytes> {
        let mut acc = BytesMut::with_capacity(required.max(partial.len() + self.window));
        acc.extend_from_slice(partial);

        if required < self.window {
            // Opportunistic bulk fetch of a full window.
            acc.extend_from_slice(&self.inner.read(self.window)?);
        }
        if acc.len() < required {
            // Cover the exact shortfall.
            let shortfall = required - acc.len();
            acc.extend_from_slice(&self.inner.read_all(shortfall)?);
        }

        self.rbuf = acc.freeze();
        Ok(self.rbuf.clone())
    }
}

/// Factory that wraps base transports in [`BufferedTransport`].
#[derive(Debug, Clone, Copy)]
pub struct BufferedTransportFactory {
    /// Read window size for produced transports.
    pub window: usize,
}

impl Default for BufferedTransportFactory {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW_SIZE,
        }
    }
}

impl<T: Transport> TransportFactory<T> for BufferedTransportFactory {
    type Output = BufferedTransport<T>;

    fn get_transport(&self, base: T) -> BufferedTransport<T> {
        BufferedTransport::with_window(base, self.window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;

    /// Inner transport that records every read request size and write call.
    struct RecordingTransport {
        data: Bytes,
        read_requests: Vec<usize>,
        writes: Vec<Vec<u8>>,
        flushes: usize,
    }

    impl RecordingTransport {
        fn new(data: &[u8]) -> Self {
            Self {
                data: Bytes::copy_from_slice(data),
                read_requests: Vec::new(),
                writes: Vec::new(),
                flushes: 0,
            }
        }
    }

    impl Transport for RecordingTransport {
        fn open(&mut self) -> Result<()> {
            Ok(())
        }

        fn close(&mut self) -> Result<()> {
            Ok(())
        }

        fn is_open(&self) -> bool {
            true
        }

        fn read(&mut self, max: usize) -> Result<Bytes> {
            self.read_requests.push(max);
            let take = max.min(self.data.len());
            Ok(self.data.split_to(take))
        }

        fn write(&mut self, buf: &[u8]) -> Result<()> {
            self.writes.push(buf.to_vec());
            Ok(())
        }

        fn flush(&mut self) -> Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    #[test]
    fn test_read_fetches_window_not_request_size() {
        let inner = RecordingTransport::new(&[0xAB; 10]);
        let mut buffered = BufferedTransport::new(inner);

        let bytes = buffered.read(10).unwrap();
        assert_eq!(bytes.len(), 10);

        // Exactly one underlying fetch, asking for max(10, 4096) = 4096.
        assert_eq!(buffered.inner().read_requests, vec![4096]);
    }

    #[test]
    fn test_read_served_from_buffer_without_underlying_io() {
        let inner = RecordingTransport::new(b"abcdefgh");
        let mut buffered = BufferedTransport::with_window(inner, 8);

        assert_eq!(&buffered.read(4).unwrap()[..], b"abcd");
        assert_eq!(&buffered.read(4).unwrap()[..], b"efgh");

        // Both reads served by the single initial fetch.
        assert_eq!(buffered.inner().read_requests.len(), 1);
    }

    #[test]
    fn test_read_larger_than_window_requests_full_size() {
        let inner = RecordingTransport::new(&[0u8; 100]);
        let mut buffered = BufferedTransport::with_window(inner, 16);

        buffered.read(100).unwrap();
        assert_eq!(buffered.inner().read_requests, vec![100]);
    }

    #[test]
    fn test_writes_coalesce_into_single_underlying_write() {
        let inner = RecordingTransport::new(b"");
        let mut buffered = BufferedTransport::new(inner);

        buffered.write(b"hello ").unwrap();
        buffered.write(b"world").unwrap();

        // Nothing reaches the channel before flush.
        assert!(buffered.inner().writes.is_empty());

        buffered.flush().unwrap();

        assert_eq!(buffered.inner().writes, vec![b"hello world".to_vec()]);
        assert_eq!(buffered.inner().flushes, 1);
    }

    #[test]
    fn test_flush_clears_buffer_so_no_double_send() {
        let inner = RecordingTransport::new(b"");
        let mut buffered = BufferedTransport::new(inner);

        buffered.write(b"once").unwrap();
        buffered.flush().unwrap();
        buffered.flush().unwrap();

        assert_eq!(
            buffered.inner().writes,
            vec![b"once".to_vec(), Vec::new()]
        );
    }

    #[test]
    fn test_refill_bulk_fetch_for_small_requests() {
        let inner = RecordingTransport::new(&[0x11; 64]);
        let mut buffered = BufferedTransport::with_window(inner, 32);

        let buf = buffered.refill(b"pre", 8).unwrap();
        assert_eq!(&buf[..3], b"pre");
        assert_eq!(buf.len(), 3 + 32);

        // A single window-sized bulk read covered the request.
        assert_eq!(buffered.inner().read_requests, vec![32]);
        assert_eq!(buffered.buffer(), buf);
    }

    #[test]
    fn test_refill_covers_shortfall_exactly() {
        // Window 8: the request of 20 skips the bulk fetch and reads the
        // exact shortfall through read_all.
        let inner = RecordingTransport::new(&[0x22; 64]);
        let mut buffered = BufferedTransport::with_window(inner, 8);

        let buf = buffered.refill(b"abcd", 20).unwrap();
        assert_eq!(buf.len(), 20);
        assert_eq!(&buf[..4], b"abcd");
        assert_eq!(buffered.inner().read_requests, vec![16]);
    }

    #[test]
    fn test_refill_end_of_stream_on_exhausted_channel() {
        let inner = RecordingTransport::new(b"xy");
        let mut buffered = BufferedTransport::with_window(inner, 4);

        let result = buffered.refill(b"", 10);
        match result {
            Err(TransportError::EndOfStream) => {}
            other => panic!("expected EndOfStream, got {:?}", other),
        }
    }

    #[test]
    fn test_capability_is_exposed() {
        let inner = RecordingTransport::new(b"");
        let mut buffered = BufferedTransport::new(inner);
        assert!(buffered.refill_buffer().is_some());
    }

    #[test]
    fn test_factory_propagates_window() {
        let factory = BufferedTransportFactory { window: 128 };
        let mut buffered = factory.get_transport(RecordingTransport::new(&[0u8; 256]));

        buffered.read(1).unwrap();
        assert_eq!(buffered.inner().read_requests, vec![128]);
    }
}
