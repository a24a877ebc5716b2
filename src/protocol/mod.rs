//! Protocol module - on-wire shapes shared by the transport layers.
//!
//! This module implements the binary headers used on the wire:
//! - 4-byte frame length header encoding/decoding with size validation
//! - 5-byte negotiation message header (status byte + payload length)
//! - Negotiation status codes

mod wire_format;

pub use wire_format::{
    decode_frame_header, decode_negotiation_header, encode_frame_header,
    encode_negotiation_header, Status, DEFAULT_MAX_FRAME_SIZE, FRAME_HEADER_SIZE,
    NEGOTIATION_HEADER_SIZE,
};
