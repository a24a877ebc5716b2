//! Transport module - the shared capability contract and its wrapping layers.
//!
//! Every transport satisfies the same [`Transport`] contract, so layers
//! compose into a chain that ends at the raw channel:
//!
//! ```text
//! encoder ─► SecureTransport ─► BufferedTransport ─► FileTransport ─► channel
//!            (wrap + frame)     (read-ahead +        (pass-through)
//!                                write coalescing)
//! ```
//!
//! On read the chain runs in reverse. A transport that keeps an internal
//! read buffer can additionally expose [`RefillBuffer`], letting a fast
//! external decoder pull bytes straight out of the buffer instead of going
//! through `read`.

mod buffered;
mod file;
mod framed;
mod memory;
mod secure;

pub use buffered::{BufferedTransport, BufferedTransportFactory, DEFAULT_WINDOW_SIZE};
pub use file::FileTransport;
pub use framed::{FramedTransport, FramedTransportFactory};
pub use memory::MemoryTransport;
pub use secure::SecureTransport;

use bytes::{Bytes, BytesMut};

use crate::error::{Result, TransportError};

/// Capability contract implemented by every transport in a chain.
///
/// All operations are synchronous and block the calling thread. Exactly one
/// logical caller drives an instance at a time; there are no internal locks.
pub trait Transport {
    /// Open the transport. Not implicitly re-invoked; a closed transport
    /// stays closed until `open` is called again.
    fn open(&mut self) -> Result<()>;

    /// Close the transport and release the underlying channel.
    fn close(&mut self) -> Result<()>;

    /// Whether the transport is currently open.
    fn is_open(&self) -> bool;

    /// Read up to `max` bytes.
    ///
    /// Returns between 0 and `max` bytes; an empty result signals end of
    /// stream (the assumed channels are strictly blocking, so a zero-length
    /// read is never "no data yet").
    fn read(&mut self, max: usize) -> Result<Bytes>;

    /// Read exactly `n` bytes.
    ///
    /// The provided implementation loops over `read` accumulating chunks
    /// until `n` bytes are collected. Transports with cheaper exact reads
    /// may override it.
    ///
    /// # Errors
    ///
    /// `EndOfStream` if the stream ends before `n` bytes were read. Bytes
    /// consumed up to that point are not restored.
    fn read_all(&mut self, n: usize) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(n);
        while buf.len() < n {
            let chunk = self.read(n - buf.len())?;
            if chunk.is_empty() {
                return Err(TransportError::EndOfStream);
            }
            buf.extend_from_slice(&chunk);
        }
        Ok(buf.freeze())
    }

    /// Write bytes. Buffering transports defer all I/O to `flush`.
    fn write(&mut self, buf: &[u8]) -> Result<()>;

    /// Flush buffered bytes down the chain.
    fn flush(&mut self) -> Result<()>;

    /// Access the buffer refill capability, if this transport exposes one.
    ///
    /// The default is `None`; transports with an internal read buffer
    /// return `Some(self)`. Callers obtain the capability through this
    /// typed accessor, never by probing the concrete type.
    fn refill_buffer(&mut self) -> Option<&mut dyn RefillBuffer> {
        None
    }
}

/// Optional capability: direct access to a transport's read buffer.
///
/// Intended for a fast external decoder that drains the buffer itself and
/// asks the transport to refill it wholesale instead of issuing many small
/// `read` calls.
pub trait RefillBuffer {
    /// Owned snapshot of the current read buffer, valid until the next
    /// [`refill`](RefillBuffer::refill).
    fn buffer(&self) -> Bytes;

    /// Replace the read buffer with `partial` followed by newly fetched
    /// bytes, and return it.
    ///
    /// `partial` is whatever the decoder already pulled out of the previous
    /// buffer and must be served again first. The returned buffer holds at
    /// least `required` bytes.
    ///
    /// # Errors
    ///
    /// `EndOfStream` if `required` bytes cannot be produced.
    fn refill(&mut self, partial: &[u8], required: usize) -> Result<Bytes>;
}

/// Factory wiring one wrapping layer onto a base transport.
///
/// Factories are pure constructors: no state beyond configuration.
pub trait TransportFactory<T: Transport> {
    /// The wrapped transport type this factory produces.
    type Output: Transport;

    /// Wrap `base` in one layer.
    fn get_transport(&self, base: T) -> Self::Output;
}

/// Factory that returns the base transport unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityFactory;

impl<T: Transport> TransportFactory<T> for IdentityFactory {
    type Output = T;

    fn get_transport(&self, base: T) -> T {
        base
    }
}
