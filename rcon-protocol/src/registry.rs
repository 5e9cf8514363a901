//! Direction-scoped packet registries.
//!
//! Each peer holds two registries, one per traffic direction, because a wire
//! id only has meaning relative to who sent it. A server role is a client
//! role with the two registries swapped; that swap is the entire relationship
//! between the roles.

use crate::error::ProtocolError;
use crate::packet::{Direction, Packet, PacketType};
use bytes::Bytes;
use std::collections::HashMap;

/// Bidirectional id <-> type map for one traffic direction.
#[derive(Debug, Clone, Default)]
pub struct PacketRegistry {
    by_id: HashMap<i32, PacketType>,
    by_type: HashMap<PacketType, i32>,
}

impl PacketRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `ty` to `id`, replacing any previous binding of either side.
    pub fn register(&mut self, id: i32, ty: PacketType) {
        if let Some(previous) = self.by_id.insert(id, ty) {
            if previous != ty {
                self.by_type.remove(&previous);
            }
        }
        if let Some(old_id) = self.by_type.insert(ty, id) {
            if old_id != id {
                self.by_id.remove(&old_id);
            }
        }
    }

    /// Resolves a wire id to its packet type.
    pub fn find_type(&self, id: i32) -> Result<PacketType, ProtocolError> {
        self.by_id
            .get(&id)
            .copied()
            .ok_or(ProtocolError::UnknownPacket(id))
    }

    /// Resolves the wire id for a type, falling back to the type's declared
    /// id when no binding was registered. Statically known types therefore
    /// always encode, even unregistered ones like response chunks.
    pub fn find_id(&self, ty: PacketType) -> i32 {
        match self.by_type.get(&ty) {
            Some(id) => *id,
            None => {
                tracing::debug!(?ty, "no registered id, falling back to declared id");
                ty.declared_id()
            }
        }
    }

    /// Decodes body bytes into a packet instance for the given wire id.
    pub fn create(&self, id: i32, body: Bytes) -> Result<Packet, ProtocolError> {
        let ty = self.find_type(id)?;
        match ty.decode(body) {
            Err(ProtocolError::InvalidPacket { reason, .. }) => {
                Err(ProtocolError::InvalidPacket { id, reason })
            }
            other => other,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// The inbound/outbound registry pair a peer decodes and encodes with.
#[derive(Debug, Clone)]
pub struct RegistryPair {
    inbound: PacketRegistry,
    outbound: PacketRegistry,
}

impl RegistryPair {
    /// The registries for the client side of a connection: clientbound
    /// packets decode inbound, serverbound packets encode outbound.
    /// Response chunks are deliberately left unregistered; they encode via
    /// the declared-id fallback and clients opt into decoding them.
    pub fn client() -> Self {
        let mut pair = Self {
            inbound: PacketRegistry::new(),
            outbound: PacketRegistry::new(),
        };
        for ty in [
            PacketType::AuthRequest,
            PacketType::AuthResponse,
            PacketType::Execute,
            PacketType::Response,
        ] {
            let registry = match ty.direction() {
                Direction::Clientbound => &mut pair.inbound,
                Direction::Serverbound => &mut pair.outbound,
            };
            registry.register(ty.declared_id(), ty);
        }
        pair
    }

    /// The registries for the server side: the client pair with the
    /// directions swapped.
    pub fn server() -> Self {
        Self::client().swapped()
    }

    /// Swaps which registry is inbound and which is outbound.
    pub fn swapped(self) -> Self {
        Self {
            inbound: self.outbound,
            outbound: self.inbound,
        }
    }

    pub fn inbound(&self) -> &PacketRegistry {
        &self.inbound
    }

    pub fn outbound(&self) -> &PacketRegistry {
        &self.outbound
    }

    pub fn inbound_mut(&mut self) -> &mut PacketRegistry {
        &mut self.inbound
    }

    pub fn outbound_mut(&mut self) -> &mut PacketRegistry {
        &mut self.outbound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_find() {
        let mut registry = PacketRegistry::new();
        registry.register(0x02, PacketType::Execute);

        assert_eq!(registry.find_type(0x02).unwrap(), PacketType::Execute);
        assert_eq!(registry.find_id(PacketType::Execute), 0x02);
    }

    #[test]
    fn test_unknown_id() {
        let registry = PacketRegistry::new();
        assert!(matches!(
            registry.find_type(0x7f),
            Err(ProtocolError::UnknownPacket(0x7f))
        ));
    }

    #[test]
    fn test_find_id_falls_back_to_declared() {
        let registry = PacketRegistry::new();
        // Never registered, still resolvable.
        assert_eq!(registry.find_id(PacketType::ResponseChunk), 0x03);
    }

    #[test]
    fn test_rebind_replaces_both_sides() {
        let mut registry = PacketRegistry::new();
        registry.register(0x03, PacketType::AuthResponse);
        registry.register(0x03, PacketType::ResponseChunk);

        assert_eq!(registry.find_type(0x03).unwrap(), PacketType::ResponseChunk);
        // The displaced type falls back to its declared id.
        assert_eq!(registry.find_id(PacketType::AuthResponse), 0x03);

        // Re-registering a type under a new id drops the old id binding.
        registry.register(0x0a, PacketType::ResponseChunk);
        assert_eq!(registry.find_id(PacketType::ResponseChunk), 0x0a);
        assert!(registry.find_type(0x03).is_err());
    }

    #[test]
    fn test_create_decodes_body() {
        let mut registry = PacketRegistry::new();
        registry.register(0x02, PacketType::Execute);

        let packet = registry
            .create(0x02, Bytes::from_static(b"status"))
            .unwrap();
        assert_eq!(
            packet,
            Packet::Execute {
                command: "status".to_string()
            }
        );
    }

    #[test]
    fn test_create_reports_wire_id() {
        let mut registry = PacketRegistry::new();
        registry.register(0x09, PacketType::Execute);

        let result = registry.create(0x09, Bytes::from_static(&[0xFF]));
        assert!(matches!(
            result,
            Err(ProtocolError::InvalidPacket { id: 0x09, .. })
        ));
    }

    #[test]
    fn test_client_role_orientation() {
        let pair = RegistryPair::client();

        // Clientbound packets decode inbound.
        assert_eq!(
            pair.inbound().find_type(0x00).unwrap(),
            PacketType::Response
        );
        assert_eq!(
            pair.inbound().find_type(0x03).unwrap(),
            PacketType::AuthResponse
        );

        // Serverbound packets encode outbound.
        assert_eq!(pair.outbound().find_id(PacketType::AuthRequest), 0x03);
        assert_eq!(pair.outbound().find_id(PacketType::Execute), 0x02);
    }

    #[test]
    fn test_server_role_is_swapped_client() {
        let pair = RegistryPair::server();

        // The server decodes what the client encodes, and vice versa.
        assert_eq!(
            pair.inbound().find_type(0x02).unwrap(),
            PacketType::Execute
        );
        assert_eq!(
            pair.inbound().find_type(0x03).unwrap(),
            PacketType::AuthRequest
        );
        assert_eq!(pair.outbound().find_id(PacketType::Response), 0x00);
        assert_eq!(pair.outbound().find_id(PacketType::AuthResponse), 0x03);
    }

    #[test]
    fn test_registration_survives_role_swap() {
        // A binding added to one role's outbound registry resolves in the
        // corresponding other role's inbound registry.
        let mut client = RegistryPair::client();
        client.outbound_mut().register(0x0c, PacketType::Execute);

        let server = client.clone().swapped();
        assert_eq!(
            server.inbound().find_type(0x0c).unwrap(),
            PacketType::Execute
        );

        let mut server = RegistryPair::server();
        server.outbound_mut().register(0x0d, PacketType::Response);
        let client = server.swapped();
        assert_eq!(
            client.inbound().find_type(0x0d).unwrap(),
            PacketType::Response
        );
    }
}
