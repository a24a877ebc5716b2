//! Negotiated secure transport - handshake state machine plus wrapped framing.
//!
//! Drives a challenge/response handshake over an inner transport, then
//! frames and cryptographically wraps all application traffic:
//!
//! ```text
//! open():   Start(mechanism) ─► Ok(initial response) ─► peer rounds ─► Complete
//! flush():  [ length: u32 BE ][ wrap(buffered bytes) ]
//! read():   [ length: u32 BE ][ wrapped payload ] ─► unwrap ─► read buffer
//! ```
//!
//! No application payload is framed or wrapped before the negotiation
//! completes; a failed negotiation leaves the transport permanently
//! unopened.

use bytes::{Bytes, BytesMut};

use super::{RefillBuffer, Transport};
use crate::error::{Result, TransportError};
use crate::protocol::{
    decode_frame_header, decode_negotiation_header, encode_frame_header,
    encode_negotiation_header, Status, DEFAULT_MAX_FRAME_SIZE, FRAME_HEADER_SIZE,
    NEGOTIATION_HEADER_SIZE,
};
use crate::secure::{Negotiation, NegotiationState, SecurityConfig, SecuritySession};

/// Transport wrapper that negotiates a secure session before letting
/// application traffic flow.
///
/// Generic over the inner transport and the external security engine that
/// owns the cryptographic state.
pub struct SecureTransport<T, S> {
    inner: T,
    session: S,
    config: SecurityConfig,
    negotiation: Negotiation,
    rbuf: Bytes,
    wbuf: BytesMut,
    max_frame_size: u32,
    disposed: bool,
}

impl<T: Transport, S: SecuritySession> SecureTransport<T, S> {
    /// Wrap `inner` with the default maximum frame size.
    pub fn new(inner: T, session: S, config: SecurityConfig) -> Self {
        Self::with_max_frame_size(inner, session, config, DEFAULT_MAX_FRAME_SIZE)
    }

    /// Wrap `inner`, rejecting inbound wrapped frames larger than
    /// `max_frame_size`.
    pub fn with_max_frame_size(
        inner: T,
        session: S,
        config: SecurityConfig,
        max_frame_size: u32,
    ) -> Self {
        Self {
            inner,
            session,
            config,
            negotiation: Negotiation::new(),
            rbuf: Bytes::new(),
            wbuf: BytesMut::new(),
            max_frame_size,
            disposed: false,
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

    /// The negotiation record: phase, last exchanged message, round count.
    pub fn negotiation(&self) -> &Negotiation {
        &self.negotiation
    }

    /// The mechanism configuration this transport negotiates with.
    pub fn config(&self) -> &SecurityConfig {
        &self.config
    }

    /// Send one negotiation message and flush it to the peer.
    fn send_message(&mut self, status: Status, payload: &[u8]) -> Result<()> {
        let mut msg = Vec::with_capacity(NEGOTIATION_HEADER_SIZE + payload.len());
        msg.extend_from_slice(&encode_negotiation_header(status, payload.len() as u32));
        msg.extend_from_slice(payload);
        self.inner.write(&msg)?;
        self.inner.flush()
    }

    /// Receive one negotiation message.
    fn recv_message(&mut self) -> Result<(Status, Bytes)> {
        let header = self.inner.read_all(NEGOTIATION_HEADER_SIZE)?;
        let (status, len) = decode_negotiation_header([
            header[0], header[1], header[2], header[3], header[4],
        ])?;
        let payload = if len > 0 {
            self.inner.read_all(len as usize)?
        } else {
            Bytes::new()
        };
        Ok((status, payload))
    }

    /// Run the handshake to completion or first failure.
    fn run_handshake(&mut self) -> Result<()> {
        if !self.inner.is_open() {
            self.inner.open()?;
        }

        tracing::debug!(
            mechanism = %self.config.mechanism,
            host = %self.config.host,
            service = %self.config.service,
            "starting negotiation"
        );
        self.negotiation.start();

        let mechanism = self.config.mechanism.clone();
        self.send_message(Status::Start, mechanism.as_bytes())?;

        let initial = self.session.process(None)?;
        self.send_message(Status::Ok, &initial)?;

        loop {
            let (status, challenge) = self.recv_message()?;
            self.negotiation.observe(status, &challenge);
            tracing::debug!(status = ?status, len = challenge.len(), "negotiation round");

            match status {
                Status::Ok => {
                    let response = self.session.process(Some(challenge.as_ref()))?;
                    self.send_message(Status::Ok, &response)?;
                }
                Status::Complete => {
                    if !self.session.is_complete() {
                        return Err(TransportError::NotOpen(
                            "peer signalled completion before the mechanism finished".into(),
                        ));
                    }
                    self.negotiation.complete();
                    tracing::debug!(rounds = self.negotiation.rounds(), "negotiation complete");
                    return Ok(());
                }
                other => {
                    return Err(TransportError::NotOpen(format!(
                        "negotiation failed with peer status {:?}: {}",
                        other,
                        String::from_utf8_lossy(&challenge)
                    )));
                }
            }
        }
    }

    /// Read one wrapped frame and return the unwrapped payload.
    fn read_frame(&mut self) -> Result<Bytes> {
        let header = self.inner.read_all(FRAME_HEADER_SIZE)?;
        let len = decode_frame_header(
            [header[0], header[1], header[2], header[3]],
            self.max_frame_size,
        )?;
        let wrapped = self.inner.read_all(len as usize)?;
        let clear = self.session.unwrap(&wrapped)?;
        Ok(Bytes::from(clear))
    }

    fn ensure_negotiated(&self) -> Result<()> {
        if self.negotiation.is_complete() {
            Ok(())
        } else {
            Err(TransportError::NotOpen(
                "secure session not negotiated".into(),
            ))
        }
    }

    fn dispose_session(&mut self) {
        if !self.disposed {
            self.session.dispose();
            self.disposed = true;
        }
    }
}

impl<T: Transport, S: SecuritySession> Transport for SecureTransport<T, S> {
    fn open(&mut self) -> Result<()> {
        match self.negotiation.state() {
            NegotiationState::Complete => return Err(TransportError::AlreadyOpen),
            NegotiationState::Aborted => {
                return Err(TransportError::NotOpen(
                    "previous negotiation aborted".into(),
                ))
            }
            _ => {}
        }

        match self.run_handshake() {
            Ok(()) => Ok(()),
            Err(err) => {
                // No partial-success state survives a failed handshake.
                tracing::warn!(error = %err, "negotiation aborted");
                self.negotiation.abort();
                self.dispose_session();
                Err(err)
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        self.dispose_session();
        self.inner.close()
    }

    fn is_open(&self) -> bool {
        self.negotiation.is_complete() && self.inner.is_open()
    }

    fn read(&mut self, max: usize) -> Result<Bytes> {
        self.ensure_negotiated()?;
        if self.rbuf.is_empty() {
            self.rbuf = self.read_frame()?;
        }
        let take = max.min(self.rbuf.len());
        Ok(self.rbuf.split_to(take))
    }

    fn write(&mut self, buf: &[u8]) -> Result<()> {
        self.ensure_negotiated()?;
        self.wbuf.extend_from_slice(buf);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.ensure_negotiated()?;

        // The clear bytes leave the buffer before any send attempt.
        let clear = self.wbuf.split().freeze();
        let wrapped = self.session.wrap(&clear)?;

        let mut frame = Vec::with_capacity(FRAME_HEADER_SIZE + wrapped.len());
        frame.extend_from_slice(&encode_frame_header(wrapped.len() as u32));
        frame.extend_from_slice(&wrapped);

        tracing::trace!(clear = clear.len(), wrapped = wrapped.len(), "sending wrapped frame");
        self.inner.write(&frame)?;
        self.inner.flush()
    }

    fn refill_buffer(&mut self) -> Option<&mut dyn RefillBuffer> {
        Some(self)
    }
}

impl<T: Transport, S: SecuritySession> RefillBuffer for SecureTransport<T, S> {
    fn buffer(&self) -> Bytes {
        self.rbuf.clone()
    }

    fn refill(&mut self, partial: &[u8], required: usize) -> Result<Bytes> {
        self.ensure_negotiated()?;

        let mut acc = BytesMut::with_capacity(required.max(partial.len()));
        acc.extend_from_slice(partial);

        while acc.len() < required {
            let payload = self.read_frame()?;
            acc.extend_from_slice(&payload);
        }

        self.rbuf = acc.freeze();
        Ok(self.rbuf.clone())
    }
}
