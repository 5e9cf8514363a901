//! Interactive shell.

use colored::Colorize;
use rcon_client::Client;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};
use std::net::SocketAddr;

const HELP_TEXT: &str = r#"
Anything you type is sent to the server as a command.

Local commands:
  help          Show this help
  quit, exit    Leave the shell
"#;

pub async fn run(mut client: Client, addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", "rcond shell".bold().cyan());
    println!("Connected to {}.", addr);
    println!("Type 'help' for local commands.\n");

    let config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .build();
    let mut rl: Editor<(), DefaultHistory> = Editor::with_config(config)?;

    let history_path = std::env::var("HOME")
        .map(|h| std::path::PathBuf::from(h).join(".rcond_history"))
        .unwrap_or_else(|_| ".rcond_history".into());
    let _ = rl.load_history(&history_path);

    loop {
        let prompt = format!("{} ", "rcon>".cyan());
        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match line {
                    "help" => println!("{}", HELP_TEXT),
                    "quit" | "exit" => break,
                    _ => match client.execute(line).await {
                        Ok(output) => println!("{}\n", output),
                        Err(e) => {
                            println!("{}: {}\n", "Error".red(), e);
                            // A timeout may be transient; anything else
                            // means the session is done.
                            if !matches!(e, rcon_client::ClientError::Timeout) {
                                break;
                            }
                        }
                    },
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("^D");
                break;
            }
            Err(err) => {
                println!("{}: {:?}", "Error".red(), err);
                break;
            }
        }
    }

    let _ = rl.save_history(&history_path);

    let _ = client.close().await;
    println!("{}", "Disconnected.".dimmed());

    Ok(())
}
