//! Per-connection authentication gate.
//!
//! Every connection starts unauthenticated. The gate sees all traffic until
//! the connection authenticates, and repeated authentication requests
//! afterwards; any other pre-auth traffic is a protocol violation answered
//! with a rejection and a close, never silently dropped.

use rcon_protocol::packet::{Envelope, Packet};

/// Authentication state of one connection. Owned exclusively by that
/// connection's task; no state survives a disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Unauthenticated,
    Authenticated,
}

/// What the connection must do with an envelope that reached the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Password accepted: transition to `Authenticated`, send the reply.
    Accept { reply: Envelope },
    /// Already authenticated: acknowledge again, change nothing.
    AcknowledgeRepeat { reply: Envelope },
    /// Send the rejection reply, then close the connection.
    Reject { reply: Envelope },
}

/// Validates authentication requests against the configured password.
#[derive(Debug, Clone)]
pub struct Authenticator {
    password: Option<String>,
}

impl Authenticator {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: Some(password.into()),
        }
    }

    /// An authenticator with no password configured; it rejects everything,
    /// since authentication can never succeed against a disabled server.
    pub fn disabled() -> Self {
        Self { password: None }
    }

    pub fn from_option(password: Option<String>) -> Self {
        Self { password }
    }

    /// Runs one transition of the gate for an inbound envelope.
    ///
    /// Accepted replies echo the request id; rejections carry the notice id
    /// so the client can tell them apart.
    pub fn evaluate(&self, state: AuthState, envelope: &Envelope) -> AuthOutcome {
        match (&envelope.packet, state) {
            (Packet::AuthRequest { .. }, AuthState::Authenticated) => {
                AuthOutcome::AcknowledgeRepeat {
                    reply: Envelope::new(envelope.id, Packet::AuthResponse),
                }
            }
            (Packet::AuthRequest { password }, AuthState::Unauthenticated) => {
                match &self.password {
                    Some(configured) if !configured.is_empty() && configured == password => {
                        AuthOutcome::Accept {
                            reply: Envelope::new(envelope.id, Packet::AuthResponse),
                        }
                    }
                    _ => AuthOutcome::Reject {
                        reply: Envelope::notice(Packet::AuthResponse),
                    },
                }
            }
            // Any other traffic before authentication is a protocol
            // violation.
            _ => AuthOutcome::Reject {
                reply: Envelope::notice(Packet::AuthResponse),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcon_protocol::packet::NOTICE_ID;

    fn auth_request(id: i32, password: &str) -> Envelope {
        Envelope::new(
            id,
            Packet::AuthRequest {
                password: password.to_string(),
            },
        )
    }

    #[test]
    fn test_correct_password_accepts_and_echoes_id() {
        let auth = Authenticator::new("hunter2");
        let outcome = auth.evaluate(AuthState::Unauthenticated, &auth_request(7, "hunter2"));
        match outcome {
            AuthOutcome::Accept { reply } => {
                assert_eq!(reply.id, 7);
                assert_eq!(reply.packet, Packet::AuthResponse);
            }
            other => panic!("expected accept, got {other:?}"),
        }
    }

    #[test]
    fn test_wrong_password_rejects() {
        let auth = Authenticator::new("hunter2");
        let outcome = auth.evaluate(AuthState::Unauthenticated, &auth_request(7, "Hunter2"));
        match outcome {
            AuthOutcome::Reject { reply } => assert_eq!(reply.id, NOTICE_ID),
            other => panic!("expected reject, got {other:?}"),
        }
    }

    #[test]
    fn test_no_password_configured_rejects_everything() {
        let auth = Authenticator::disabled();
        let outcome = auth.evaluate(AuthState::Unauthenticated, &auth_request(1, "anything"));
        assert!(matches!(outcome, AuthOutcome::Reject { .. }));

        let auth = Authenticator::new("");
        let outcome = auth.evaluate(AuthState::Unauthenticated, &auth_request(1, ""));
        assert!(matches!(outcome, AuthOutcome::Reject { .. }));
    }

    #[test]
    fn test_command_before_auth_rejects() {
        let auth = Authenticator::new("hunter2");
        let envelope = Envelope::new(
            3,
            Packet::Execute {
                command: "status".to_string(),
            },
        );
        let outcome = auth.evaluate(AuthState::Unauthenticated, &envelope);
        match outcome {
            AuthOutcome::Reject { reply } => assert_eq!(reply.id, NOTICE_ID),
            other => panic!("expected reject, got {other:?}"),
        }
    }

    #[test]
    fn test_repeat_auth_acknowledges_with_own_id() {
        let auth = Authenticator::new("hunter2");
        let outcome = auth.evaluate(AuthState::Authenticated, &auth_request(9, "hunter2"));
        match outcome {
            AuthOutcome::AcknowledgeRepeat { reply } => assert_eq!(reply.id, 9),
            other => panic!("expected acknowledgement, got {other:?}"),
        }

        // Even a wrong password is acknowledged once authenticated; the gate
        // is idempotent after the transition.
        let outcome = auth.evaluate(AuthState::Authenticated, &auth_request(10, "wrong"));
        assert!(matches!(outcome, AuthOutcome::AcknowledgeRepeat { .. }));
    }
}
