use crate::error::SessionError;
use std::fmt;

/// Tag of a session state, without the signed-in user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    Unresolved,
    Authenticating,
    SignedOut,
    SignedIn,
}

impl SessionPhase {
    /// Every phase, in declaration order
    pub const ALL: [SessionPhase; 4] = [
        SessionPhase::Unresolved,
        SessionPhase::Authenticating,
        SessionPhase::SignedOut,
        SessionPhase::SignedIn,
    ];
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::Unresolved => "unresolved",
            SessionPhase::Authenticating => "authenticating",
            SessionPhase::SignedOut => "signed-out",
            SessionPhase::SignedIn => "signed-in",
        };
        f.write_str(name)
    }
}

/// Validates a session transition.
///
/// Self-transitions are not transitions; callers treat them as no-ops
/// before asking.
pub fn validate_transition(from: SessionPhase, to: SessionPhase) -> Result<(), SessionError> {
    if allowed(from, to) {
        Ok(())
    } else {
        Err(SessionError::invalid_transition(from, to))
    }
}

pub fn allowed_transitions(from: SessionPhase) -> Vec<SessionPhase> {
    use SessionPhase::*;
    match from {
        Unresolved => vec![SignedOut, SignedIn, Authenticating],
        SignedOut => vec![Authenticating],
        Authenticating => vec![SignedIn, SignedOut],
        SignedIn => vec![SignedOut],
    }
}

fn allowed(from: SessionPhase, to: SessionPhase) -> bool {
    allowed_transitions(from).into_iter().any(|s| s == to)
}
