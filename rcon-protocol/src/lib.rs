//! # rcon-protocol
//!
//! Wire protocol implementation for rcond (remote console).
//!
//! This crate provides:
//! - Length-prefixed stream framing (little-endian, partial-read tolerant)
//! - The fixed packet catalog: authentication, command execution, responses
//! - Direction-scoped packet registries with a client/server role swap
//! - Payload encoding/decoding with the double-null trailer
//! - Veto-capable extension hooks threaded through the codec

pub mod codec;
pub mod error;
pub mod frame;
pub mod hook;
pub mod packet;
pub mod registry;

pub use codec::PacketCodec;
pub use error::ProtocolError;
pub use frame::{FrameDecoder, FRAME_HEADER_SIZE};
pub use hook::{HookOutcome, Hooks};
pub use packet::{Direction, Envelope, Packet, PacketType, NOTICE_ID};
pub use registry::{PacketRegistry, RegistryPair};

/// Default port for rcond servers.
pub const DEFAULT_PORT: u16 = 27015;

/// Largest frame payload accepted by default (1 MiB).
///
/// The length prefix itself imposes no bound, so decoders enforce this cap to
/// keep a hostile peer from forcing unbounded buffering.
pub const MAX_FRAME_LEN: u32 = 1024 * 1024;

/// Largest serialized response body carried by a single packet; anything
/// bigger is split into chunks of this size.
pub const MAX_RESPONSE_BODY: usize = 4096;
