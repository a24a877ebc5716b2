//! File transport - pass-through adapter for blocking byte-stream handles.
//!
//! Adapts anything implementing `Read + Write` (a file, a TCP stream, a
//! pipe) to the [`Transport`] contract. No buffering, no framing; wrap it
//! in [`BufferedTransport`](super::BufferedTransport) or
//! [`FramedTransport`](super::FramedTransport) for those.

use std::io::{Read, Write};

use bytes::Bytes;

use super::Transport;
use crate::error::Result;

/// Transport delegating directly to a blocking byte-stream handle.
///
/// The handle is considered open for the lifetime of the transport; `close`
/// flushes, and dropping the transport closes the handle.
pub struct FileTransport<F> {
    handle: F,
}

impl<F: Read + Write> FileTransport<F> {
    /// Wrap a blocking byte-stream handle.
    pub fn new(handle: F) -> Self {
        Self { handle }
    }

    /// Get a reference to the underlying handle.
    pub fn inner(&self) -> &F {
        &self.handle
    }

    /// Get a mutable reference to the underlying handle.
    pub fn inner_mut(&mut self) -> &mut F {
        &mut self.handle
    }

    /// Unwrap, returning the underlying handle.
    pub fn into_inner(self) -> F {
        self.handle
    }
}

impl<F: Read + Write> Transport for FileTransport<F> {
    fn open(&mut self) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.handle.flush()?;
        Ok(())
    }

    fn is_open(&self) -> bool {
        true
    }

    fn read(&mut self, max: usize) -> Result<Bytes> {
        let mut buf = vec![0u8; max];
        let n = self.handle.read(&mut buf)?;
        buf.truncate(n);
        Ok(buf.into())
    }

    fn write(&mut self, buf: &[u8]) -> Result<()> {
        self.handle.write_all(buf)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.handle.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_delegates_to_handle() {
        let mut transport = FileTransport::new(Cursor::new(b"stream bytes".to_vec()));

        assert_eq!(&transport.read(6).unwrap()[..], b"stream");
        assert_eq!(&transport.read_all(6).unwrap()[..], b" bytes");
    }

    #[test]
    fn test_read_at_end_returns_empty() {
        let mut transport = FileTransport::new(Cursor::new(Vec::new()));
        assert!(transport.read(16).unwrap().is_empty());
    }

    #[test]
    fn test_write_delegates_to_handle() {
        let mut transport = FileTransport::new(Cursor::new(Vec::new()));

        transport.write(b"first ").unwrap();
        transport.write(b"second").unwrap();
        transport.flush().unwrap();

        assert_eq!(transport.inner().get_ref(), b"first second");
    }

    #[test]
    fn test_always_reports_open() {
        let mut transport = FileTransport::new(Cursor::new(Vec::new()));
        assert!(transport.is_open());
        transport.close().unwrap();
        assert!(transport.is_open());
    }

    #[test]
    fn test_roundtrip_through_real_file() {
        let mut file = tempfile::tempfile().unwrap();

        {
            let mut transport = FileTransport::new(&mut file);
            transport.write(b"persisted").unwrap();
            transport.flush().unwrap();
        }

        use std::io::{Seek, SeekFrom};
        file.seek(SeekFrom::Start(0)).unwrap();

        let mut transport = FileTransport::new(&mut file);
        assert_eq!(&transport.read_all(9).unwrap()[..], b"persisted");
    }
}
