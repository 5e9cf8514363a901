//! High-level client API.

use crate::connection::{Connection, ConnectionConfig};
use crate::error::ClientError;
use tokio::io::DuplexStream;

/// High-level client: connect once, authenticate once, execute commands.
pub struct Client {
    conn: Connection,
}

impl Client {
    /// Creates a new client with the given configuration.
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            conn: Connection::new(config),
        }
    }

    /// Creates a client over an in-process pipe from `Server::attach_local`.
    pub fn local(stream: DuplexStream) -> Self {
        Self {
            conn: Connection::local(stream),
        }
    }

    /// Connects to the server.
    pub async fn connect(&mut self) -> Result<(), ClientError> {
        self.conn.connect().await
    }

    /// Authenticates with the server password.
    pub async fn authenticate(&mut self, password: &str) -> Result<(), ClientError> {
        self.conn.authenticate(password).await
    }

    /// Executes a command, mapping an empty response body to an empty
    /// string.
    pub async fn execute(&mut self, command: &str) -> Result<String, ClientError> {
        Ok(self.conn.execute(command).await?.unwrap_or_default())
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_connected()
    }

    pub fn is_authenticated(&self) -> bool {
        self.conn.is_authenticated()
    }

    /// Closes the connection.
    pub async fn close(&mut self) -> Result<(), ClientError> {
        self.conn.close().await
    }

    /// Returns the underlying connection.
    pub fn connection(&mut self) -> &mut Connection {
        &mut self.conn
    }
}
