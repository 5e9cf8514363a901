//! Per-connection protocol driver.
//!
//! One task owns one connection; frames, codec state, and the
//! authentication flag are never shared, so the whole pipeline runs without
//! locks. Structural decode errors abort the connection (the stream can no
//! longer be trusted); command failures are answered and the connection
//! stays open.

use crate::auth::{AuthOutcome, AuthState, Authenticator};
use crate::command::{CommandRegistry, Dispatch};
use crate::error::ServerError;
use crate::stream::ServerStream;
use rcon_protocol::packet::{Envelope, Packet};
use rcon_protocol::{frame, FrameDecoder, PacketCodec};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::broadcast;

/// Reply for a command name with no registered handler.
const NO_SUCH_COMMAND: &str = "Error: No such command or configuration variable.";

/// Drives the protocol for a single accepted connection.
pub struct Connection {
    id: String,
    peer: String,
    stream: ServerStream,
    frames: FrameDecoder,
    codec: PacketCodec,
    auth: AuthState,
    authenticator: Authenticator,
    commands: Arc<CommandRegistry>,
    idle_timeout: Duration,
    max_frame_len: u32,
}

impl Connection {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        stream: ServerStream,
        peer: String,
        codec: PacketCodec,
        authenticator: Authenticator,
        commands: Arc<CommandRegistry>,
        idle_timeout: Duration,
        max_frame_len: u32,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            peer,
            stream,
            frames: FrameDecoder::with_max_len(max_frame_len),
            codec,
            auth: AuthState::Unauthenticated,
            authenticator,
            commands,
            idle_timeout,
            max_frame_len,
        }
    }

    pub fn conn_id(&self) -> &str {
        &self.id
    }

    /// Runs the connection until the peer disconnects, the idle timeout
    /// fires, an unrecoverable decode error occurs, or the server shuts
    /// down.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> Result<(), ServerError> {
        tracing::info!(conn = %self.id, peer = %self.peer, "client connected");

        let mut buf = [0u8; 8192];

        loop {
            tokio::select! {
                result = self.stream.read(&mut buf) => {
                    match result {
                        Ok(0) => {
                            tracing::debug!(conn = %self.id, "connection closed by peer");
                            return Ok(());
                        }
                        Ok(n) => self.frames.extend(&buf[..n]),
                        Err(e) => {
                            tracing::debug!(conn = %self.id, "read error: {}", e);
                            return Err(ServerError::Io(e));
                        }
                    }
                }

                // Recreated on every loop turn, so any read resets it: fires
                // only after a full idle period without data.
                _ = tokio::time::sleep(self.idle_timeout) => {
                    tracing::debug!(conn = %self.id, "idle timeout, closing");
                    return Ok(());
                }

                _ = shutdown.recv() => {
                    tracing::debug!(conn = %self.id, "shutdown signal received");
                    return Err(ServerError::ShuttingDown);
                }
            }

            while let Some(payload) = self.frames.decode()? {
                let envelope = match self.codec.decode(payload)? {
                    Some(envelope) => envelope,
                    // Vetoed by the before-deliver hook; frame consumed.
                    None => continue,
                };
                if !self.handle_envelope(envelope).await? {
                    return Ok(());
                }
            }
        }
    }

    /// Processes one inbound envelope. Returns `false` when the connection
    /// must close.
    async fn handle_envelope(&mut self, envelope: Envelope) -> Result<bool, ServerError> {
        // The gate sees all pre-auth traffic plus repeated authentication
        // requests after the transition.
        if self.auth == AuthState::Unauthenticated
            || matches!(envelope.packet, Packet::AuthRequest { .. })
        {
            return self.handle_auth(envelope).await;
        }

        match &envelope.packet {
            Packet::Execute { command } => {
                let command = command.clone();
                self.handle_command(&command, envelope.id).await?;
                Ok(true)
            }
            other => {
                tracing::warn!(
                    conn = %self.id,
                    packet = ?other.packet_type(),
                    "ignoring unexpected inbound packet"
                );
                Ok(true)
            }
        }
    }

    async fn handle_auth(&mut self, envelope: Envelope) -> Result<bool, ServerError> {
        match self.authenticator.evaluate(self.auth, &envelope) {
            AuthOutcome::Accept { reply } => {
                self.auth = AuthState::Authenticated;
                tracing::info!(conn = %self.id, peer = %self.peer, "client authenticated");
                self.send(reply).await?;
                Ok(true)
            }
            AuthOutcome::AcknowledgeRepeat { reply } => {
                tracing::debug!(conn = %self.id, "repeating authentication acknowledgement");
                self.send(reply).await?;
                Ok(true)
            }
            AuthOutcome::Reject { reply } => {
                tracing::info!(conn = %self.id, peer = %self.peer, "authentication rejected, closing");
                self.send(reply).await?;
                Ok(false)
            }
        }
    }

    async fn handle_command(&mut self, command: &str, request_id: i32) -> Result<(), ServerError> {
        tracing::debug!(conn = %self.id, command, "executing command");

        if command.is_empty() {
            return self
                .send(Envelope::new(
                    request_id,
                    Packet::Response {
                        text: Some(String::new()),
                    },
                ))
                .await;
        }

        match self.commands.dispatch(command, request_id) {
            Dispatch::Handled(reply) => self.send(reply).await,
            Dispatch::Vetoed => {
                tracing::debug!(conn = %self.id, command, "response vetoed by hook");
                Ok(())
            }
            Dispatch::Unknown => {
                self.send(Envelope::new(
                    request_id,
                    Packet::Response {
                        text: Some(NO_SUCH_COMMAND.to_string()),
                    },
                ))
                .await
            }
        }
    }

    /// Encodes and writes an envelope, splitting oversized response bodies
    /// into chunks that all carry the original request id.
    async fn send(&mut self, envelope: Envelope) -> Result<(), ServerError> {
        match envelope.packet.split() {
            Some(chunks) => {
                tracing::debug!(conn = %self.id, chunks = chunks.len(), "splitting oversized response");
                for chunk in chunks {
                    self.write(Envelope::new(envelope.id, chunk)).await?;
                }
                Ok(())
            }
            None => self.write(envelope).await,
        }
    }

    async fn write(&mut self, envelope: Envelope) -> Result<(), ServerError> {
        if let Some(payload) = self.codec.encode(envelope)? {
            let framed = frame::encode(&payload, self.max_frame_len)?;
            self.stream.write_all(&framed).await?;
        }
        Ok(())
    }
}
