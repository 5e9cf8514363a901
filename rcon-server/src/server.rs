//! TCP server implementation.

use crate::auth::Authenticator;
use crate::command::CommandRegistry;
use crate::connection::Connection;
use crate::error::ServerError;
use crate::stream::ServerStream;
use rcon_protocol::{Hooks, PacketCodec, RegistryPair, DEFAULT_PORT, MAX_FRAME_LEN};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::DuplexStream;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

/// Buffer capacity of the in-process duplex transport.
const LOCAL_PIPE_CAPACITY: usize = 64 * 1024;

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Address to bind to.
    pub bind_addr: SocketAddr,
    /// Password clients must present; `None` means authentication can never
    /// succeed and every connection is rejected.
    pub password: Option<String>,
    /// Idle read timeout; a connection that sends nothing for this long is
    /// closed regardless of authentication state.
    pub idle_timeout: Duration,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Maximum accepted frame length.
    pub max_frame_len: u32,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind_addr", &self.bind_addr)
            .field("password_set", &self.password.is_some())
            .field("idle_timeout", &self.idle_timeout)
            .field("max_connections", &self.max_connections)
            .field("max_frame_len", &self.max_frame_len)
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
            password: None,
            idle_timeout: Duration::from_secs(120),
            max_connections: 128,
            max_frame_len: MAX_FRAME_LEN,
        }
    }
}

impl ServerConfig {
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            ..Default::default()
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }
}

/// Server statistics.
#[derive(Debug, Default)]
pub struct ServerStats {
    pub connections_total: AtomicU64,
    pub connections_active: AtomicU64,
    pub errors_total: AtomicU64,
}

/// The RCON server: accepts TCP connections (and in-process pipes) and runs
/// one protocol driver per connection.
pub struct Server {
    config: ServerConfig,
    commands: Arc<CommandRegistry>,
    hooks: Arc<Hooks>,
    stats: Arc<ServerStats>,
    shutdown: broadcast::Sender<()>,
    running: AtomicBool,
}

impl Server {
    /// Creates a new server with the given command table.
    pub fn new(config: ServerConfig, commands: CommandRegistry) -> Self {
        Self::with_hooks(config, commands, Arc::new(Hooks::new()))
    }

    /// Creates a new server sharing one hook set between the codec and the
    /// command dispatcher.
    pub fn with_hooks(config: ServerConfig, mut commands: CommandRegistry, hooks: Arc<Hooks>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        commands.set_hooks(hooks.clone());
        Self {
            config,
            commands: Arc::new(commands),
            hooks,
            stats: Arc::new(ServerStats::default()),
            shutdown: shutdown_tx,
            running: AtomicBool::new(false),
        }
    }

    /// Binds the configured address and runs the accept loop until shutdown.
    pub async fn run(&self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener).await
    }

    /// Runs the accept loop on an already-bound listener (useful for
    /// ephemeral ports).
    pub async fn serve(&self, listener: TcpListener) -> Result<(), ServerError> {
        self.running.store(true, Ordering::SeqCst);
        tracing::info!("server listening on {}", listener.local_addr()?);

        let mut shutdown_rx = self.shutdown.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((tcp_stream, addr)) => {
                            if self.stats.connections_active.load(Ordering::Relaxed)
                                >= self.config.max_connections as u64
                            {
                                tracing::warn!("connection limit reached, rejecting {}", addr);
                                continue;
                            }
                            tcp_stream.set_nodelay(true).ok();
                            self.spawn_connection(tcp_stream.into(), addr.to_string());
                        }
                        Err(e) => {
                            tracing::error!("accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("server shutting down");
                    break;
                }
            }
        }

        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Serves one in-process connection and returns the client half of the
    /// pipe. The connection goes through the same driver as TCP clients,
    /// authentication included.
    pub fn attach_local(&self) -> DuplexStream {
        let (client_half, server_half) = tokio::io::duplex(LOCAL_PIPE_CAPACITY);
        self.spawn_connection(server_half.into(), "local".to_string());
        client_half
    }

    fn spawn_connection(&self, stream: ServerStream, peer: String) {
        self.stats.connections_total.fetch_add(1, Ordering::Relaxed);
        self.stats.connections_active.fetch_add(1, Ordering::Relaxed);

        let connection = Connection::new(
            stream,
            peer.clone(),
            PacketCodec::with_hooks(RegistryPair::server(), self.hooks.clone()),
            Authenticator::from_option(self.config.password.clone()),
            self.commands.clone(),
            self.config.idle_timeout,
            self.config.max_frame_len,
        );

        let stats = self.stats.clone();
        let shutdown = self.shutdown.subscribe();

        tokio::spawn(async move {
            if let Err(e) = connection.run(shutdown).await {
                tracing::debug!("connection {} error: {}", peer, e);
                stats.errors_total.fetch_add(1, Ordering::Relaxed);
            }
            stats.connections_active.fetch_sub(1, Ordering::Relaxed);
            tracing::info!("client disconnected: {}", peer);
        });
    }

    /// Initiates server shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(());
    }

    /// Returns whether the accept loop is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Returns server statistics.
    pub fn stats(&self) -> &ServerStats {
        &self.stats
    }
}
