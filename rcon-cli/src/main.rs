//! rcon-cli - Command-line client for rcond
//!
//! Provides both an interactive shell and one-shot command execution.

mod repl;

use clap::{Parser, Subcommand};
use colored::Colorize;
use rcon_client::{Client, ConnectionConfig};
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rcon-cli")]
#[command(about = "Command-line client for rcond remote console servers")]
#[command(version)]
struct Cli {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:27015")]
    server: SocketAddr,

    /// Server password
    #[arg(short, long, env = "RCOND_PASSWORD")]
    password: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive shell
    Shell,

    /// Execute a single command and print the response
    Exec {
        /// The command line to send
        #[arg(required = true, num_args = 1..)]
        command: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let password = match cli.password {
        Some(password) => password,
        None => {
            eprintln!(
                "{}: no password given (use --password or RCOND_PASSWORD)",
                "Error".red()
            );
            std::process::exit(1);
        }
    };

    let mut client = Client::new(ConnectionConfig::new(cli.server));

    if let Err(e) = client.connect().await {
        eprintln!("{}: {}", "Connection failed".red(), e);
        std::process::exit(1);
    }
    if let Err(e) = client.authenticate(&password).await {
        eprintln!("{}: {}", "Authentication failed".red(), e);
        std::process::exit(1);
    }

    match cli.command {
        Some(Commands::Exec { command }) => {
            let line = command.join(" ");
            match client.execute(&line).await {
                Ok(output) => println!("{}", output),
                Err(e) => {
                    eprintln!("{}: {}", "Error".red(), e);
                    std::process::exit(1);
                }
            }
            client.close().await?;
        }
        Some(Commands::Shell) | None => {
            repl::run(client, cli.server).await?;
        }
    }

    Ok(())
}
