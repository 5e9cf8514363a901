//! Command registration and dispatch.
//!
//! The table maps case-sensitive command names to handlers. It is populated
//! once at startup and read-only afterwards, so connections share it behind
//! an `Arc` without locking.

use rcon_protocol::hook::{HookOutcome, Hooks};
use rcon_protocol::packet::{Envelope, Packet};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Failure modes a command handler may signal.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The arguments did not match the command's usage.
    #[error("usage error")]
    Usage,
    /// The command ran and failed; the message is relayed to the client.
    #[error("{0}")]
    Failed(String),
}

/// A named command capable of producing response text.
pub trait CommandHandler: Send + Sync {
    /// Executes the command with its positional arguments.
    fn handle(&self, command: &str, args: &[&str]) -> Result<String, CommandError>;

    /// One-line argument summary appended to usage errors.
    fn usage(&self) -> &str {
        ""
    }
}

/// Adapter turning a closure into a command handler.
pub struct FnHandler<F> {
    usage: String,
    handler: F,
}

impl<F> FnHandler<F>
where
    F: Fn(&[&str]) -> Result<String, CommandError> + Send + Sync,
{
    pub fn new(handler: F) -> Self {
        Self {
            usage: String::new(),
            handler,
        }
    }

    pub fn with_usage(usage: impl Into<String>, handler: F) -> Self {
        Self {
            usage: usage.into(),
            handler,
        }
    }
}

impl<F> CommandHandler for FnHandler<F>
where
    F: Fn(&[&str]) -> Result<String, CommandError> + Send + Sync,
{
    fn handle(&self, _command: &str, args: &[&str]) -> Result<String, CommandError> {
        (self.handler)(args)
    }

    fn usage(&self) -> &str {
        &self.usage
    }
}

/// Outcome of dispatching one command line.
#[derive(Debug)]
pub enum Dispatch {
    /// A handler produced a response, ready to send.
    Handled(Envelope),
    /// A handler ran but the after-command hook vetoed the response;
    /// nothing must be sent.
    Vetoed,
    /// No handler is registered under the command's name; the caller owns
    /// the "no such command" reply.
    Unknown,
}

/// Maps command names to handlers and converts handler outcomes into
/// response text.
pub struct CommandRegistry {
    commands: HashMap<String, Box<dyn CommandHandler>>,
    hooks: Arc<Hooks>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::with_hooks(Arc::new(Hooks::new()))
    }

    pub fn with_hooks(hooks: Arc<Hooks>) -> Self {
        Self {
            commands: HashMap::new(),
            hooks,
        }
    }

    /// Replaces the hook set; used by the server to share one set across
    /// codec and dispatcher.
    pub fn set_hooks(&mut self, hooks: Arc<Hooks>) {
        self.hooks = hooks;
    }

    /// Registers `handler` under `name` (case-sensitive), replacing any
    /// previous registration.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: impl CommandHandler + 'static,
    ) -> &mut Self {
        self.commands.insert(name.into(), Box::new(handler));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Dispatches a command line: splits it on single spaces (empty tokens
    /// discarded), looks up the first token, runs the handler, and wraps the
    /// outcome as a response envelope under `request_id`.
    pub fn dispatch(&self, command_line: &str, request_id: i32) -> Dispatch {
        let mut tokens = command_line.split(' ').filter(|t| !t.is_empty());
        let name = match tokens.next() {
            Some(name) => name,
            None => return Dispatch::Unknown,
        };
        let handler = match self.commands.get(name) {
            Some(handler) => handler,
            None => return Dispatch::Unknown,
        };
        let args: Vec<&str> = tokens.collect();

        let text = match handler.handle(name, &args) {
            Ok(text) => text,
            Err(CommandError::Usage) => {
                tracing::debug!(command = name, "usage error");
                let usage = handler.usage();
                if usage.is_empty() {
                    format!("Usage: {name}")
                } else {
                    format!("Usage: {name} {usage}")
                }
            }
            Err(CommandError::Failed(message)) => {
                tracing::debug!(command = name, %message, "command failed");
                format!("Error: {message}")
            }
        };

        let reply = Envelope::new(request_id, Packet::Response { text: Some(text) });
        match self.hooks.fire_after_command(reply) {
            HookOutcome::Proceed(reply) => Dispatch::Handled(reply),
            HookOutcome::Veto => Dispatch::Vetoed,
        }
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}
