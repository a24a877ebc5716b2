//! # bytewire
//!
//! Blocking transport layer for a binary RPC wire protocol.
//!
//! This crate moves bytes between an encoded-message layer and an
//! underlying byte channel, providing three composable services:
//!
//! - **Buffering** ([`BufferedTransport`](transport::BufferedTransport)):
//!   fixed-size read-ahead window, write coalescing into one send per flush
//! - **Framing** ([`FramedTransport`](transport::FramedTransport)):
//!   symmetric 4-byte big-endian length-prefixed frames
//! - **Negotiated security** ([`SecureTransport`](transport::SecureTransport)):
//!   challenge/response handshake, then per-frame wrap/unwrap through an
//!   external [`SecuritySession`](secure::SecuritySession) engine
//!
//! Every layer satisfies the same [`Transport`](transport::Transport)
//! contract, so layers stack freely: secure over buffered over a raw
//! channel adapter. Transports with an internal read buffer also expose
//! [`RefillBuffer`](transport::RefillBuffer) for decoders that drain the
//! buffer directly.
//!
//! All I/O is synchronous and blocking; one logical caller drives a given
//! transport instance at a time.
//!
//! ## Example
//!
//! ```
//! use bytewire::transport::{FramedTransport, MemoryTransport, Transport};
//!
//! let mut framed = FramedTransport::new(MemoryTransport::new());
//! framed.write(b"hello").unwrap();
//! framed.flush().unwrap();
//!
//! // One frame on the wire: 4-byte big-endian length, then the payload.
//! assert_eq!(framed.inner().get_value(), b"\x00\x00\x00\x05hello");
//! ```

pub mod error;
pub mod protocol;
pub mod secure;
pub mod transport;

pub use error::{Result, TransportError};
pub use transport::{
    BufferedTransport, BufferedTransportFactory, FileTransport, FramedTransport,
    FramedTransportFactory, IdentityFactory, MemoryTransport, RefillBuffer, SecureTransport,
    Transport, TransportFactory,
};
