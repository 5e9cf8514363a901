//! # rcon-server
//!
//! RCON server for rcond.
//!
//! This crate provides:
//! - TCP connection handling with async I/O, plus an in-process transport
//! - The per-connection authentication gate
//! - Command registration and dispatch
//! - YAML/environment configuration

pub mod auth;
pub mod command;
pub mod config;
pub mod connection;
pub mod error;
pub mod server;
pub mod stream;

pub use auth::{AuthOutcome, AuthState, Authenticator};
pub use command::{CommandError, CommandHandler, CommandRegistry, Dispatch, FnHandler};
pub use config::{AuthConfig, Config, NetworkConfig};
pub use error::ServerError;
pub use server::{Server, ServerConfig};
pub use stream::ServerStream;
