//! The fixed catalog of wire packets.
//!
//! Packet bodies are plain single-byte text (7-bit clean); the request
//! correlation id and the numeric packet id live in the payload header
//! written by the codec, not in the body.

use crate::error::ProtocolError;
use crate::MAX_RESPONSE_BODY;
use bytes::{BufMut, Bytes, BytesMut};

/// Request id reserved for server-initiated notices, most importantly
/// authentication rejections.
pub const NOTICE_ID: i32 = -1;

/// Traffic direction a packet id is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Client to server.
    Serverbound,
    /// Server to client.
    Clientbound,
}

/// Type tag for every packet in the catalog.
///
/// The same numeric id can mean different types in different directions:
/// 0x03 is an authentication request serverbound but an authentication
/// response (or a response chunk) clientbound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketType {
    AuthRequest,
    AuthResponse,
    Execute,
    Response,
    ResponseChunk,
}

impl PacketType {
    /// The id this type declares for itself, used when a registry holds no
    /// explicit binding (notably for response chunks, which are produced by
    /// splitting and never registered).
    pub fn declared_id(self) -> i32 {
        match self {
            PacketType::AuthRequest => 0x03,
            PacketType::AuthResponse => 0x03,
            PacketType::Execute => 0x02,
            PacketType::Response => 0x00,
            PacketType::ResponseChunk => 0x03,
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            PacketType::AuthRequest | PacketType::Execute => Direction::Serverbound,
            PacketType::AuthResponse | PacketType::Response | PacketType::ResponseChunk => {
                Direction::Clientbound
            }
        }
    }

    /// Constructs a packet of this type from body bytes.
    pub fn decode(self, body: Bytes) -> Result<Packet, ProtocolError> {
        match self {
            PacketType::AuthRequest => Ok(Packet::AuthRequest {
                password: text_body(self, body)?,
            }),
            PacketType::AuthResponse => Ok(Packet::AuthResponse),
            PacketType::Execute => Ok(Packet::Execute {
                command: text_body(self, body)?,
            }),
            PacketType::Response => {
                let text = if body.is_empty() {
                    None
                } else {
                    Some(text_body(self, body)?)
                };
                Ok(Packet::Response { text })
            }
            PacketType::ResponseChunk => Ok(Packet::ResponseChunk { data: body }),
        }
    }
}

fn text_body(ty: PacketType, body: Bytes) -> Result<String, ProtocolError> {
    String::from_utf8(body.to_vec()).map_err(|_| ProtocolError::InvalidPacket {
        id: ty.declared_id(),
        reason: "body is not valid text",
    })
}

/// A decoded wire packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// Client credentials, presented once per connection.
    AuthRequest { password: String },
    /// Authentication verdict. The body is empty; accept/reject is carried
    /// entirely by the envelope id ([`NOTICE_ID`] means rejected, an echoed
    /// request id means accepted).
    AuthResponse,
    /// A command line to execute.
    Execute { command: String },
    /// Command output. `None` encodes as an empty body.
    Response { text: Option<String> },
    /// One slice of an oversized response body, produced only by
    /// [`Packet::split`] and never a standalone command result.
    ResponseChunk { data: Bytes },
}

impl Packet {
    pub fn packet_type(&self) -> PacketType {
        match self {
            Packet::AuthRequest { .. } => PacketType::AuthRequest,
            Packet::AuthResponse => PacketType::AuthResponse,
            Packet::Execute { .. } => PacketType::Execute,
            Packet::Response { .. } => PacketType::Response,
            Packet::ResponseChunk { .. } => PacketType::ResponseChunk,
        }
    }

    /// Serializes the packet body (header and trailer are the codec's job).
    pub fn encode_body(&self, buf: &mut BytesMut) {
        match self {
            Packet::AuthRequest { password } => buf.put_slice(password.as_bytes()),
            Packet::AuthResponse => {}
            Packet::Execute { command } => buf.put_slice(command.as_bytes()),
            Packet::Response { text } => {
                if let Some(text) = text {
                    buf.put_slice(text.as_bytes());
                }
            }
            Packet::ResponseChunk { data } => buf.put_slice(data),
        }
    }

    /// Splits an oversized response body into wire-sized chunks.
    ///
    /// Returns `None` for anything that fits a single packet (including
    /// non-response packets); chunks preserve the original byte order.
    pub fn split(&self) -> Option<Vec<Packet>> {
        if !matches!(self, Packet::Response { .. }) {
            return None;
        }

        let mut body = BytesMut::new();
        self.encode_body(&mut body);
        if body.len() <= MAX_RESPONSE_BODY {
            return None;
        }

        let mut body = body.freeze();
        let mut chunks = Vec::with_capacity(body.len().div_ceil(MAX_RESPONSE_BODY));
        while !body.is_empty() {
            let take = body.len().min(MAX_RESPONSE_BODY);
            chunks.push(Packet::ResponseChunk {
                data: body.split_to(take),
            });
        }
        Some(chunks)
    }
}

/// A request-correlation id paired with exactly one packet; the unit of
/// exchange between the codec and the connection handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub id: i32,
    pub packet: Packet,
}

impl Envelope {
    pub fn new(id: i32, packet: Packet) -> Self {
        Self { id, packet }
    }

    /// A server-initiated notice (no request to correlate with).
    pub fn notice(packet: Packet) -> Self {
        Self::new(NOTICE_ID, packet)
    }
}
