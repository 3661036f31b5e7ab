//! Authentication session state
//!
//! ```text
//! Unresolved     ──► SignedOut | SignedIn(User) | Authenticating
//! SignedOut      ──► Authenticating
//! Authenticating ──► SignedIn(User) | SignedOut
//! SignedIn(User) ──► SignedOut
//! ```
//!
//! The reducer performs no I/O. Persisting the user before a sign-in
//! becomes observable, and deleting it before a sign-out does, is the
//! controller's job.

mod transitions;

pub use transitions::{allowed_transitions, validate_transition, SessionPhase};

use crate::error::{SessionError, SignInFailure};
use crate::store::{Reducer, Store};
use crate::types::User;

/// Current authentication state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Durable storage has not been consulted yet
    #[default]
    Unresolved,
    /// A sign-in is in flight
    Authenticating,
    /// Nobody is signed in
    SignedOut,
    /// Exactly one user is signed in
    SignedIn(User),
}

impl SessionState {
    /// Tag of this state
    #[inline]
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        match self {
            Self::Unresolved => SessionPhase::Unresolved,
            Self::Authenticating => SessionPhase::Authenticating,
            Self::SignedOut => SessionPhase::SignedOut,
            Self::SignedIn(_) => SessionPhase::SignedIn,
        }
    }

    /// Signed-in user, if any
    #[inline]
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::SignedIn(user) => Some(user),
            _ => None,
        }
    }

    /// Check if a user is signed in
    #[inline]
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::SignedIn(_))
    }

    /// Check if the session is still settling
    ///
    /// True before restore completes and while a sign-in is in flight.
    #[inline]
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Unresolved | Self::Authenticating)
    }
}

/// Session actions
#[derive(Debug, Clone)]
pub enum SessionAction {
    /// Result of reading durable storage at start-up
    Restored(Option<User>),
    /// User asked to sign in
    BeginSignIn,
    /// Identity provider produced a user (already persisted)
    CompleteSignIn(User),
    /// Settle a pending state to signed-out
    ///
    /// Leaves an established sign-in alone.
    AbortSignIn,
    /// Sign out (entry already deleted, or deletion failed and was logged)
    ///
    /// Rejected before the session is restored.
    SignOut,
}

/// Session transition function
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionReducer;

impl Reducer for SessionReducer {
    type State = SessionState;
    type Action = SessionAction;
    type Error = SessionError;

    fn reduce(state: &SessionState, action: SessionAction) -> Result<SessionState, SessionError> {
        let from = state.phase();

        match action {
            SessionAction::Restored(saved) => {
                let next = match saved {
                    Some(user) => SessionState::SignedIn(user),
                    None => SessionState::SignedOut,
                };
                if from != SessionPhase::Unresolved {
                    return Err(SessionError::invalid_transition(from, next.phase()));
                }
                validate_transition(from, next.phase())?;
                Ok(next)
            }
            SessionAction::BeginSignIn => {
                validate_transition(from, SessionPhase::Authenticating)?;
                Ok(SessionState::Authenticating)
            }
            SessionAction::CompleteSignIn(user) => {
                if from != SessionPhase::Authenticating {
                    return Err(SignInFailure::NotAuthenticating(from).into());
                }
                Ok(SessionState::SignedIn(user))
            }
            SessionAction::AbortSignIn => match from {
                SessionPhase::Unresolved | SessionPhase::Authenticating => {
                    validate_transition(from, SessionPhase::SignedOut)?;
                    Ok(SessionState::SignedOut)
                }
                SessionPhase::SignedOut | SessionPhase::SignedIn => Ok(state.clone()),
            },
            SessionAction::SignOut => match from {
                // Restore has not run yet
                SessionPhase::Unresolved => Err(SessionError::invalid_transition(
                    from,
                    SessionPhase::SignedOut,
                )),
                SessionPhase::SignedOut => Ok(SessionState::SignedOut),
                SessionPhase::Authenticating | SessionPhase::SignedIn => {
                    validate_transition(from, SessionPhase::SignedOut)?;
                    Ok(SessionState::SignedOut)
                }
            },
        }
    }
}

/// Store holding the authentication session
pub type SessionStore = Store<SessionReducer>;

impl SessionStore {
    /// Create session store in the unresolved state
    #[must_use]
    pub fn unresolved() -> Self {
        Self::new(SessionState::Unresolved)
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.with_state(SessionState::phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserId;
    use pretty_assertions::assert_eq;

    fn ada() -> User {
        User::new(UserId(1), "ada@example.com", "Ada")
    }

    fn reduce(state: &SessionState, action: SessionAction) -> Result<SessionState, SessionError> {
        SessionReducer::reduce(state, action)
    }

    #[test]
    fn restore_with_saved_user_signs_in() {
        let next = reduce(&SessionState::Unresolved, SessionAction::Restored(Some(ada()))).unwrap();
        assert_eq!(next, SessionState::SignedIn(ada()));
    }

    #[test]
    fn restore_without_user_signs_out() {
        let next = reduce(&SessionState::Unresolved, SessionAction::Restored(None)).unwrap();
        assert_eq!(next, SessionState::SignedOut);
    }

    #[test]
    fn restore_runs_once() {
        let err = reduce(&SessionState::SignedOut, SessionAction::Restored(None)).unwrap_err();
        assert!(matches!(err, SessionError::InvalidTransition { from: SessionPhase::SignedOut, .. }));

        let err = reduce(&SessionState::Authenticating, SessionAction::Restored(Some(ada()))).unwrap_err();
        assert!(matches!(err, SessionError::InvalidTransition { .. }));
    }

    #[test]
    fn begin_from_signed_out_or_unresolved() {
        for from in [SessionState::SignedOut, SessionState::Unresolved] {
            assert_eq!(
                reduce(&from, SessionAction::BeginSignIn).unwrap(),
                SessionState::Authenticating
            );
        }
    }

    #[test]
    fn begin_rejected_when_signed_in_or_authenticating() {
        for from in [SessionState::SignedIn(ada()), SessionState::Authenticating] {
            let err = reduce(&from, SessionAction::BeginSignIn).unwrap_err();
            assert!(matches!(err, SessionError::InvalidTransition { .. }));
        }
    }

    #[test]
    fn complete_only_from_authenticating() {
        let next = reduce(&SessionState::Authenticating, SessionAction::CompleteSignIn(ada())).unwrap();
        assert_eq!(next.user(), Some(&ada()));

        let err = reduce(&SessionState::SignedOut, SessionAction::CompleteSignIn(ada())).unwrap_err();
        assert!(matches!(
            err,
            SessionError::SignInFailed(SignInFailure::NotAuthenticating(SessionPhase::SignedOut))
        ));
    }

    #[test]
    fn abort_settles_pending_states_only() {
        assert_eq!(
            reduce(&SessionState::Authenticating, SessionAction::AbortSignIn).unwrap(),
            SessionState::SignedOut
        );
        assert_eq!(
            reduce(&SessionState::Unresolved, SessionAction::AbortSignIn).unwrap(),
            SessionState::SignedOut
        );
        assert_eq!(
            reduce(&SessionState::SignedIn(ada()), SessionAction::AbortSignIn).unwrap(),
            SessionState::SignedIn(ada())
        );
    }

    #[test]
    fn sign_out_succeeds_once_resolved() {
        for from in [
            SessionState::Authenticating,
            SessionState::SignedOut,
            SessionState::SignedIn(ada()),
        ] {
            assert_eq!(reduce(&from, SessionAction::SignOut).unwrap(), SessionState::SignedOut);
        }
    }

    #[test]
    fn sign_out_before_restore_is_rejected() {
        let err = reduce(&SessionState::Unresolved, SessionAction::SignOut).unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidTransition {
                from: SessionPhase::Unresolved,
                to: SessionPhase::SignedOut
            }
        ));
    }

    #[test]
    fn loading_flags() {
        assert!(SessionState::Unresolved.is_loading());
        assert!(SessionState::Authenticating.is_loading());
        assert!(!SessionState::SignedOut.is_loading());
        assert!(SessionState::SignedIn(ada()).is_authenticated());
    }

    #[test]
    fn store_rejection_keeps_signed_in() {
        let store = SessionStore::unresolved();
        store.dispatch(SessionAction::Restored(Some(ada()))).unwrap();

        assert!(store.dispatch(SessionAction::BeginSignIn).is_err());
        assert_eq!(store.state(), SessionState::SignedIn(ada()));
        assert_eq!(store.phase(), SessionPhase::SignedIn);
    }
}
