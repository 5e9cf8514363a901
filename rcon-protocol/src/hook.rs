//! Extension hooks threaded through the codec and dispatcher.
//!
//! Four fixed slots instead of a general event bus: before-send and
//! before-deliver may replace or veto an envelope, after-send is
//! notification only, after-command gates a command's response right before
//! it is written.

use crate::packet::Envelope;

/// Outcome of a veto-capable hook.
pub enum HookOutcome {
    /// Continue with the (possibly replaced) envelope.
    Proceed(Envelope),
    /// Drop the envelope; the triggering operation becomes a no-op.
    Veto,
}

/// A hook that may replace or veto an envelope.
pub type EnvelopeHook = Box<dyn Fn(Envelope) -> HookOutcome + Send + Sync>;

/// A notification-only hook.
pub type NotifyHook = Box<dyn Fn(&Envelope) + Send + Sync>;

/// The four extension points of the protocol engine. Empty slots are no-ops.
#[derive(Default)]
pub struct Hooks {
    before_send: Option<EnvelopeHook>,
    after_send: Option<NotifyHook>,
    before_deliver: Option<EnvelopeHook>,
    after_command: Option<EnvelopeHook>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_before_send<F>(mut self, hook: F) -> Self
    where
        F: Fn(Envelope) -> HookOutcome + Send + Sync + 'static,
    {
        self.before_send = Some(Box::new(hook));
        self
    }

    pub fn with_after_send<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Envelope) + Send + Sync + 'static,
    {
        self.after_send = Some(Box::new(hook));
        self
    }

    pub fn with_before_deliver<F>(mut self, hook: F) -> Self
    where
        F: Fn(Envelope) -> HookOutcome + Send + Sync + 'static,
    {
        self.before_deliver = Some(Box::new(hook));
        self
    }

    pub fn with_after_command<F>(mut self, hook: F) -> Self
    where
        F: Fn(Envelope) -> HookOutcome + Send + Sync + 'static,
    {
        self.after_command = Some(Box::new(hook));
        self
    }

    /// Fires before an outgoing envelope is encoded.
    pub fn fire_before_send(&self, envelope: Envelope) -> HookOutcome {
        fire(&self.before_send, envelope)
    }

    /// Fires after an envelope has been encoded for write.
    pub fn fire_after_send(&self, envelope: &Envelope) {
        if let Some(hook) = &self.after_send {
            hook(envelope);
        }
    }

    /// Fires after decode, before the connection handler sees the envelope.
    pub fn fire_before_deliver(&self, envelope: Envelope) -> HookOutcome {
        fire(&self.before_deliver, envelope)
    }

    /// Fires on a command's response envelope before it is written.
    pub fn fire_after_command(&self, envelope: Envelope) -> HookOutcome {
        fire(&self.after_command, envelope)
    }
}

fn fire(slot: &Option<EnvelopeHook>, envelope: Envelope) -> HookOutcome {
    match slot {
        Some(hook) => hook(envelope),
        None => HookOutcome::Proceed(envelope),
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("before_send", &self.before_send.is_some())
            .field("after_send", &self.after_send.is_some())
            .field("before_deliver", &self.before_deliver.is_some())
            .field("after_command", &self.after_command.is_some())
            .finish()
    }
}
