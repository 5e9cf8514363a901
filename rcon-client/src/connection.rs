//! Connection management.
//!
//! The protocol is strict request/response lock-step per connection, so the
//! connection is a plain mutable object: send one envelope, read one reply.
//! No pipelining, no pending-request table.

use crate::error::ClientError;
use crate::stream::ClientStream;
use bytes::BytesMut;
use rcon_protocol::packet::{Envelope, Packet, PacketType, NOTICE_ID};
use rcon_protocol::{frame, FrameDecoder, PacketCodec, RegistryPair, MAX_FRAME_LEN, MAX_RESPONSE_BODY};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::net::TcpStream;

/// Connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Server address.
    pub addr: SocketAddr,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Timeout for a single request/reply exchange.
    pub request_timeout: Duration,
    /// Maximum accepted frame length.
    pub max_frame_len: u32,
}

impl ConnectionConfig {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_frame_len: MAX_FRAME_LEN,
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// A lock-step connection to an rcond server.
pub struct Connection {
    config: ConnectionConfig,
    stream: Option<ClientStream>,
    frames: FrameDecoder,
    codec: PacketCodec,
    next_id: i32,
    authenticated: bool,
}

impl Connection {
    /// Creates a new connection (not yet connected).
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            frames: FrameDecoder::with_max_len(config.max_frame_len),
            codec: PacketCodec::new(RegistryPair::client()),
            stream: None,
            next_id: 1,
            authenticated: false,
            config,
        }
    }

    /// Wraps the client half of an in-process pipe handed out by
    /// `Server::attach_local`; already connected.
    pub fn local(stream: DuplexStream) -> Self {
        let mut connection = Self::new(ConnectionConfig::new(SocketAddr::from(([127, 0, 0, 1], 0))));
        connection.stream = Some(stream.into());
        connection
    }

    /// Connects to the configured server address over TCP.
    pub async fn connect(&mut self) -> Result<(), ClientError> {
        tracing::debug!("connecting to {}", self.config.addr);

        let tcp_stream = tokio::time::timeout(
            self.config.connect_timeout,
            TcpStream::connect(self.config.addr),
        )
        .await
        .map_err(|_| ClientError::Timeout)??;

        tcp_stream.set_nodelay(true).ok();
        self.stream = Some(tcp_stream.into());
        self.frames.clear();
        self.authenticated = false;

        tracing::debug!("connected to {}", self.config.addr);
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Presents the password. Accepted replies echo the request id; a
    /// rejection carries the notice id and is followed by the server closing
    /// the connection.
    pub async fn authenticate(&mut self, password: &str) -> Result<(), ClientError> {
        let id = self.next_request_id();
        self.send(Envelope::new(
            id,
            Packet::AuthRequest {
                password: password.to_string(),
            },
        ))
        .await?;

        let reply = self.read_envelope().await?;
        match reply.packet {
            Packet::AuthResponse if reply.id == id => {
                self.authenticated = true;
                // From here on a clientbound 0x03 is a response chunk, not an
                // authentication verdict.
                self.codec.registries_mut().inbound_mut().register(
                    PacketType::ResponseChunk.declared_id(),
                    PacketType::ResponseChunk,
                );
                tracing::debug!("authenticated");
                Ok(())
            }
            Packet::AuthResponse => Err(ClientError::AuthenticationDenied),
            _ => Err(ClientError::UnexpectedReply("expected authentication response")),
        }
    }

    /// Executes a command and returns the response text (`None` when the
    /// server answered with an empty body).
    ///
    /// Oversized responses arrive as consecutive chunks and are reassembled
    /// in arrival order; the reply is considered complete at the first chunk
    /// shorter than the maximum chunk size. A split body whose length is an
    /// exact multiple of the chunk size is therefore ambiguous on the wire;
    /// the protocol carries no sequence or count field to resolve it.
    pub async fn execute(&mut self, command: &str) -> Result<Option<String>, ClientError> {
        if !self.authenticated {
            return Err(ClientError::NotAuthenticated);
        }

        let id = self.next_request_id();
        self.send(Envelope::new(
            id,
            Packet::Execute {
                command: command.to_string(),
            },
        ))
        .await?;

        let mut assembled: Option<BytesMut> = None;
        loop {
            let reply = self.read_envelope().await?;
            match reply.packet {
                Packet::Response { text } if assembled.is_none() => return Ok(text),
                Packet::ResponseChunk { data } => {
                    let buffer = assembled.get_or_insert_with(BytesMut::new);
                    let done = data.len() < MAX_RESPONSE_BODY;
                    buffer.extend_from_slice(&data);
                    if done {
                        let text = String::from_utf8(buffer.to_vec()).map_err(|_| {
                            ClientError::UnexpectedReply("chunked response is not valid text")
                        })?;
                        return Ok(Some(text));
                    }
                }
                _ => {
                    tracing::warn!(id = reply.id, "ignoring unexpected reply packet");
                }
            }
        }
    }

    /// Closes the connection.
    pub async fn close(&mut self) -> Result<(), ClientError> {
        if let Some(mut stream) = self.stream.take() {
            tracing::debug!("closing connection");
            let _ = stream.shutdown().await;
        }
        self.authenticated = false;
        self.frames.clear();
        Ok(())
    }

    fn next_request_id(&mut self) -> i32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        // The notice id is reserved for the server.
        if self.next_id == NOTICE_ID {
            self.next_id = 0;
        }
        id
    }

    async fn send(&mut self, envelope: Envelope) -> Result<(), ClientError> {
        let payload = match self.codec.encode(envelope)? {
            Some(payload) => payload,
            // Vetoed by a before-send hook; nothing goes on the wire.
            None => return Ok(()),
        };
        let framed = frame::encode(&payload, self.config.max_frame_len)?;

        let stream = self.stream.as_mut().ok_or(ClientError::NotConnected)?;
        stream.write_all(&framed).await?;
        Ok(())
    }

    async fn read_envelope(&mut self) -> Result<Envelope, ClientError> {
        let request_timeout = self.config.request_timeout;
        match tokio::time::timeout(request_timeout, self.read_envelope_inner()).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout),
        }
    }

    async fn read_envelope_inner(&mut self) -> Result<Envelope, ClientError> {
        loop {
            // Drain anything already buffered before touching the socket.
            while let Some(payload) = self.frames.decode()? {
                if let Some(envelope) = self.codec.decode(payload)? {
                    return Ok(envelope);
                }
            }

            let stream = self.stream.as_mut().ok_or(ClientError::NotConnected)?;
            let mut buf = [0u8; 8192];
            let n = stream.read(&mut buf).await?;
            if n == 0 {
                return Err(ClientError::ConnectionClosed);
            }
            self.frames.extend(&buf[..n]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ConnectionConfig::new(SocketAddr::from(([127, 0, 0, 1], 27015)));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.max_frame_len, MAX_FRAME_LEN);
    }

    #[test]
    fn test_config_builders() {
        let config = ConnectionConfig::new(SocketAddr::from(([127, 0, 0, 1], 27015)))
            .with_connect_timeout(Duration::from_secs(1))
            .with_request_timeout(Duration::from_secs(2));
        assert_eq!(config.connect_timeout, Duration::from_secs(1));
        assert_eq!(config.request_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_request_ids_skip_the_notice_id() {
        let mut connection =
            Connection::new(ConnectionConfig::new(SocketAddr::from(([127, 0, 0, 1], 0))));
        connection.next_id = i32::MAX;

        assert_eq!(connection.next_request_id(), i32::MAX);
        // Wraps past i32::MIN .. -2 one id at a time; force the edge.
        connection.next_id = -2;
        assert_eq!(connection.next_request_id(), -2);
        assert_eq!(connection.next_request_id(), 0);
    }

    #[tokio::test]
    async fn test_execute_requires_authentication() {
        let (client_half, _server_half) = tokio::io::duplex(1024);
        let mut connection = Connection::local(client_half);
        let result = connection.execute("status").await;
        assert!(matches!(result, Err(ClientError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn test_send_requires_connection() {
        let mut connection =
            Connection::new(ConnectionConfig::new(SocketAddr::from(([127, 0, 0, 1], 0))));
        let result = connection.authenticate("pw").await;
        assert!(matches!(result, Err(ClientError::NotConnected)));
    }
}
