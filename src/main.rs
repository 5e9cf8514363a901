//! rcond - Remote Console Server
//!
//! A TCP remote-console server: clients authenticate once per connection and
//! issue text commands over a binary request/response protocol.

use rcon_server::{CommandError, CommandRegistry, Config, FnHandler, Server};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// The built-in command table. Embedders link against rcon-server and
/// register their own handlers; the standalone daemon ships a small set.
fn builtin_commands(started: Instant) -> CommandRegistry {
    let mut commands = CommandRegistry::new();

    commands.register(
        "echo",
        FnHandler::with_usage("<text...>", |args: &[&str]| Ok(args.join(" "))),
    );

    commands.register(
        "status",
        FnHandler::new(move |_: &[&str]| {
            Ok(format!(
                "rcond {} up {}s",
                env!("CARGO_PKG_VERSION"),
                started.elapsed().as_secs()
            ))
        }),
    );

    commands.register(
        "version",
        FnHandler::new(|args: &[&str]| {
            if !args.is_empty() {
                return Err(CommandError::Usage);
            }
            Ok(env!("CARGO_PKG_VERSION").to_string())
        }),
    );

    commands
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration (from file if RCOND_CONFIG is set, then env overrides)
    let mut config = match Config::load() {
        Ok(c) => {
            if let Ok(path) = std::env::var("RCOND_CONFIG") {
                tracing::info!("Loaded config from {}", path);
            }
            c
        }
        Err(e) => {
            // If a config file was explicitly specified, fail on error
            if std::env::var("RCOND_CONFIG").is_ok() {
                tracing::error!("Failed to load config: {}", e);
                return Err(e.into());
            }
            tracing::info!("Using default configuration");
            Config::default()
        }
    };

    // Load the password from an external file if configured
    if let Err(e) = config.load_secrets() {
        tracing::error!("Failed to load password file: {}", e);
        return Err(e.into());
    }

    tracing::info!("Starting rcond");
    tracing::info!("  Bind address: {}", config.network.bind_addr);
    tracing::info!("  Idle timeout: {}s", config.network.idle_timeout_secs);

    if config.auth.is_enabled() {
        tracing::info!("  Authentication: enabled");
    } else {
        // Still start, but no client will ever get past the gate.
        tracing::warn!("  Authentication: no password configured, all clients will be rejected");
    }

    let commands = builtin_commands(Instant::now());
    tracing::info!("  Commands: {} registered", commands.len());

    let server = Arc::new(Server::new(config.to_server_config(), commands));

    // Spawn shutdown signal handler
    let shutdown_server = server.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Received shutdown signal, stopping server...");
        shutdown_server.shutdown();
    });

    // Run server (blocks until shutdown)
    server.run().await?;

    tracing::info!("Server stopped");
    Ok(())
}
