//! # rcon-client
//!
//! Client library for rcond.
//!
//! This crate provides:
//! - Async TCP client (plus the in-process pipe transport)
//! - One-shot authentication per connection
//! - Lock-step command execution with chunked-response reassembly

pub mod client;
pub mod connection;
pub mod error;
pub mod stream;

pub use client::Client;
pub use connection::{Connection, ConnectionConfig};
pub use error::ClientError;
pub use stream::ClientStream;
