//! Encoder and decoder for packet payloads.
//!
//! Payload layout (integers little-endian, trailer mandatory):
//!
//! ```text
//! +------------+-----------+------+-----------+
//! | request_id | packet_id | body | 0x00 0x00 |
//! |  4 bytes   |  4 bytes  |  ... |  2 bytes  |
//! +------------+-----------+------+-----------+
//! ```

use crate::error::ProtocolError;
use crate::hook::{HookOutcome, Hooks};
use crate::packet::Envelope;
use crate::registry::RegistryPair;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::sync::Arc;

/// Request id plus packet id.
const PAYLOAD_HEADER_SIZE: usize = 8;

/// The double null byte closing every payload.
const TRAILER: [u8; 2] = [0x00, 0x00];

/// Translates between envelopes and frame payloads using a registry pair,
/// firing the send/deliver hooks along the way.
pub struct PacketCodec {
    registries: RegistryPair,
    hooks: Arc<Hooks>,
}

impl PacketCodec {
    pub fn new(registries: RegistryPair) -> Self {
        Self::with_hooks(registries, Arc::new(Hooks::new()))
    }

    pub fn with_hooks(registries: RegistryPair, hooks: Arc<Hooks>) -> Self {
        Self { registries, hooks }
    }

    pub fn registries(&self) -> &RegistryPair {
        &self.registries
    }

    pub fn registries_mut(&mut self) -> &mut RegistryPair {
        &mut self.registries
    }

    /// Encodes an envelope into a frame payload.
    ///
    /// Returns `Ok(None)` when the before-send hook vetoes the envelope;
    /// nothing must be written in that case.
    pub fn encode(&self, envelope: Envelope) -> Result<Option<BytesMut>, ProtocolError> {
        let envelope = match self.hooks.fire_before_send(envelope) {
            HookOutcome::Proceed(envelope) => envelope,
            HookOutcome::Veto => {
                tracing::debug!("outgoing packet vetoed by before-send hook");
                return Ok(None);
            }
        };

        let packet_id = self
            .registries
            .outbound()
            .find_id(envelope.packet.packet_type());

        let mut payload = BytesMut::new();
        payload.put_i32_le(envelope.id);
        payload.put_i32_le(packet_id);
        envelope.packet.encode_body(&mut payload);
        payload.put_slice(&TRAILER);

        tracing::trace!(
            id = envelope.id,
            packet_id,
            len = payload.len(),
            "encoded packet"
        );

        self.hooks.fire_after_send(&envelope);
        Ok(Some(payload))
    }

    /// Decodes one frame payload into an envelope.
    ///
    /// Returns `Ok(None)` when the before-deliver hook vetoes the envelope;
    /// the frame is consumed but nothing is delivered.
    pub fn decode(&self, payload: Bytes) -> Result<Option<Envelope>, ProtocolError> {
        if payload.len() < PAYLOAD_HEADER_SIZE + TRAILER.len() {
            return Err(ProtocolError::TruncatedPayload {
                len: payload.len(),
            });
        }

        let mut buf = payload;
        let id = buf.get_i32_le();
        let packet_id = buf.get_i32_le();

        // Everything up to the final two bytes is body; the final two bytes
        // must be exactly the trailer, with nothing after them.
        let body = buf.split_to(buf.len() - TRAILER.len());
        if buf[..] != TRAILER[..] {
            return Err(ProtocolError::TrailerViolation);
        }

        let packet = self.registries.inbound().create(packet_id, body)?;
        tracing::trace!(id, packet_id, "decoded packet");

        match self.hooks.fire_before_deliver(Envelope::new(id, packet)) {
            HookOutcome::Proceed(envelope) => Ok(Some(envelope)),
            HookOutcome::Veto => {
                tracing::debug!(id, packet_id, "inbound packet vetoed by before-deliver hook");
                Ok(None)
            }
        }
    }
}
