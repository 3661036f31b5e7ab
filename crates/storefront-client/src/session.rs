//! Session orchestration
//!
//! Couples the session store to durable storage and the identity provider.
//! Storage is always written (or cleared) before the matching transition is
//! dispatched, so a subscriber that observes `SignedIn` can rely on the user
//! being persisted. Operations that touch storage run one at a time so a
//! rollback can never delete a record another completion just wrote.

use crate::api::ProfileApi;
use crate::storage::SessionVault;
use std::sync::Arc;
use storefront_core::{
    SessionAction, SessionError, SessionPhase, SessionState, SessionStore, SignInFailure, User,
};
use tokio::sync::Mutex;

/// Drives the session store
pub struct SessionController {
    store: Arc<SessionStore>,
    vault: SessionVault,
    profiles: Arc<dyn ProfileApi>,
    // Serializes check, persist and dispatch
    gate: Mutex<()>,
}

impl SessionController {
    /// Create controller
    #[must_use]
    pub fn new(store: Arc<SessionStore>, vault: SessionVault, profiles: Arc<dyn ProfileApi>) -> Self {
        Self {
            store,
            vault,
            profiles,
            gate: Mutex::new(()),
        }
    }

    /// Store this controller dispatches into
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Snapshot of the session state
    #[inline]
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.store.state()
    }

    /// Resolve the start-up session from durable storage
    ///
    /// A saved user signs in without any network call. A missing record, a
    /// failed read or a corrupt record all resolve to signed-out.
    ///
    /// # Errors
    /// `SessionError::InvalidTransition` if the session was already resolved.
    pub async fn restore_session(&self) -> Result<SessionState, SessionError> {
        let _gate = self.gate.lock().await;
        let from = self.store.phase();
        if from != SessionPhase::Unresolved {
            return Err(SessionError::invalid_transition(from, SessionPhase::SignedOut));
        }

        let saved = match self.vault.load().await {
            Ok(saved) => saved,
            Err(e) => {
                tracing::warn!(error = %e, "could not read saved session, starting signed out");
                None
            }
        };

        tracing::info!(restored = saved.is_some(), "session restored");
        self.store.dispatch(SessionAction::Restored(saved))?;
        Ok(self.store.state())
    }

    /// Enter the authenticating state
    ///
    /// # Errors
    /// `SessionError::InvalidTransition` when already signed in or signing in.
    pub fn begin_sign_in(&self) -> Result<(), SessionError> {
        self.store.dispatch(SessionAction::BeginSignIn)?;
        tracing::debug!("sign-in started");
        Ok(())
    }

    /// Finish a sign-in with the user the identity provider produced
    ///
    /// Persists `user`, then transitions to signed-in. On any failure the
    /// store is settled so it is not left loading.
    ///
    /// # Errors
    /// - `SignInFailure::NotAuthenticating` if no sign-in is in progress
    /// - `SignInFailure::Storage` if the user cannot be persisted
    pub async fn complete_sign_in(&self, user: User) -> Result<User, SessionError> {
        let _gate = self.gate.lock().await;
        let from = self.store.phase();
        if from != SessionPhase::Authenticating {
            self.settle();
            return Err(SignInFailure::NotAuthenticating(from).into());
        }

        if let Err(e) = self.vault.save(&user).await {
            tracing::error!(error = %e, "could not persist session");
            self.settle();
            return Err(SignInFailure::Storage(e).into());
        }

        if let Err(e) = self.store.dispatch(SessionAction::CompleteSignIn(user.clone())) {
            // Sign-in was abandoned while the write was in flight
            if let Err(clear) = self.vault.clear().await {
                tracing::warn!(error = %clear, "could not roll back persisted session");
            }
            self.settle();
            return Err(e);
        }

        tracing::info!(user = %user.id, "signed in");
        Ok(user)
    }

    /// Sign in with an identity provider bearer token
    ///
    /// # Errors
    /// - `SessionError::InvalidTransition` if a sign-in cannot start
    /// - `SignInFailure::Profile` if the userinfo fetch fails
    /// - see [`SessionController::complete_sign_in`]
    pub async fn sign_in_with_token(&self, token: &str) -> Result<User, SessionError> {
        self.begin_sign_in()?;

        let profile = match self.profiles.fetch_profile(token).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::error!(error = %e, "userinfo fetch failed");
                self.settle();
                return Err(SignInFailure::Profile(e).into());
            }
        };

        self.complete_sign_in(profile.into_user()).await
    }

    /// Abandon a pending sign-in
    ///
    /// Returns whether the state changed.
    pub fn abort_sign_in(&self) -> bool {
        self.settle()
    }

    fn settle(&self) -> bool {
        match self.store.dispatch(SessionAction::AbortSignIn) {
            Ok(changed) => changed,
            Err(e) => {
                tracing::error!(error = %e, "could not settle session");
                false
            }
        }
    }

    /// Sign out
    ///
    /// The saved user is deleted first; a deletion failure is logged and the
    /// in-memory sign-out still happens. Before the session is restored this
    /// does nothing, leaving the saved record for the restore to find.
    pub async fn sign_out(&self) {
        let _gate = self.gate.lock().await;
        if self.store.phase() == SessionPhase::Unresolved {
            tracing::warn!("sign-out before session restore ignored");
            return;
        }

        if let Err(e) = self.vault.clear().await {
            tracing::warn!(error = %e, "could not delete saved session");
        }

        match self.store.dispatch(SessionAction::SignOut) {
            Ok(_) => tracing::info!("signed out"),
            Err(e) => tracing::error!(error = %e, "sign-out rejected"),
        }
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("phase", &self.store.phase())
            .field("vault", &self.vault)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockProfileApi;
    use crate::storage::{KeyValueStorage, MemoryStorage, MockKeyValueStorage, SESSION_KEY};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::io;
    use std::time::Duration;
    use storefront_core::{FetchError, Resource, StorageError, StorageOp, UserId, UserProfile};

    fn ada() -> User {
        User::new(UserId(42), "ada@example.com", "Ada")
    }

    fn controller(storage: Arc<dyn KeyValueStorage>, profiles: MockProfileApi) -> SessionController {
        SessionController::new(
            Arc::new(SessionStore::unresolved()),
            SessionVault::new(storage),
            Arc::new(profiles),
        )
    }

    fn no_profiles() -> MockProfileApi {
        let mut profiles = MockProfileApi::new();
        profiles.expect_fetch_profile().never();
        profiles
    }

    #[tokio::test]
    async fn restore_with_saved_user_signs_in_without_network() {
        let storage = MemoryStorage::new();
        SessionVault::new(Arc::new(storage.clone())).save(&ada()).await.unwrap();
        let session = controller(Arc::new(storage), no_profiles());

        let state = session.restore_session().await.unwrap();

        assert_eq!(state, SessionState::SignedIn(ada()));
    }

    #[tokio::test]
    async fn restore_twice_is_rejected() {
        let session = controller(Arc::new(MemoryStorage::new()), no_profiles());

        session.restore_session().await.unwrap();
        let err = session.restore_session().await.unwrap_err();

        assert!(matches!(err, SessionError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn restore_read_failure_signs_out() {
        let mut storage = MockKeyValueStorage::new();
        storage.expect_get().returning(|key| {
            Err(StorageError::io(StorageOp::Read, key, io::Error::other("disk gone")))
        });
        let session = controller(Arc::new(storage), no_profiles());

        let state = session.restore_session().await.unwrap();
        assert_eq!(state, SessionState::SignedOut);
    }

    #[tokio::test]
    async fn token_sign_in_persists_before_signed_in() {
        let storage = MemoryStorage::new();
        let mut profiles = MockProfileApi::new();
        profiles.expect_fetch_profile().returning(|_| {
            Ok(UserProfile {
                id: "42".to_string(),
                email: "ada@example.com".to_string(),
                name: "Ada".to_string(),
                picture: None,
            })
        });
        let session = controller(Arc::new(storage.clone()), profiles);
        session.restore_session().await.unwrap();

        let mut rx = session.store().subscribe();
        let user = session.sign_in_with_token("token").await.unwrap();

        assert_eq!(user, ada());
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), SessionState::SignedIn(ada()));
        assert!(storage.get(SESSION_KEY).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn profile_failure_settles_signed_out() {
        let mut profiles = MockProfileApi::new();
        profiles
            .expect_fetch_profile()
            .returning(|_| Err(FetchError::status(Resource::UserProfile, 401)));
        let session = controller(Arc::new(MemoryStorage::new()), profiles);
        session.restore_session().await.unwrap();

        let err = session.sign_in_with_token("expired").await.unwrap_err();

        assert!(err.is_sign_in_failure());
        assert_eq!(session.state(), SessionState::SignedOut);
        assert!(!session.state().is_loading());
    }

    #[tokio::test]
    async fn persist_failure_settles_signed_out() {
        let mut storage = MockKeyValueStorage::new();
        storage.expect_get().returning(|_| Ok(None));
        storage.expect_put().returning(|key, _| {
            Err(StorageError::io(StorageOp::Write, key, io::Error::other("full")))
        });
        let session = controller(Arc::new(storage), no_profiles());
        session.restore_session().await.unwrap();
        session.begin_sign_in().unwrap();

        let err = session.complete_sign_in(ada()).await.unwrap_err();

        assert!(matches!(err, SessionError::SignInFailed(SignInFailure::Storage(_))));
        assert_eq!(session.state(), SessionState::SignedOut);
    }

    #[tokio::test]
    async fn sign_out_survives_delete_failure() {
        let mut storage = MockKeyValueStorage::new();
        storage
            .expect_get()
            .returning(|_| Ok(Some(serde_json::to_string(&ada()).unwrap())));
        storage.expect_delete().returning(|key| {
            Err(StorageError::io(StorageOp::Delete, key, io::Error::other("read-only")))
        });
        let session = controller(Arc::new(storage), no_profiles());
        session.restore_session().await.unwrap();

        session.sign_out().await;

        assert_eq!(session.state(), SessionState::SignedOut);
    }

    #[tokio::test]
    async fn complete_without_begin_is_rejected() {
        let session = controller(Arc::new(MemoryStorage::new()), no_profiles());
        session.restore_session().await.unwrap();

        let err = session.complete_sign_in(ada()).await.unwrap_err();

        assert!(err.is_sign_in_failure());
        assert_eq!(session.state(), SessionState::SignedOut);
    }

    /// Memory storage whose writes take a while to land
    #[derive(Clone)]
    struct SlowWrites {
        inner: MemoryStorage,
        delay: Duration,
    }

    #[async_trait]
    impl KeyValueStorage for SlowWrites {
        async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key).await
        }

        async fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
            tokio::time::sleep(self.delay).await;
            self.inner.put(key, value).await
        }

        async fn delete(&self, key: &str) -> Result<(), StorageError> {
            self.inner.delete(key).await
        }
    }

    #[tokio::test]
    async fn overlapping_completions_keep_winner_persisted() {
        let storage = SlowWrites {
            inner: MemoryStorage::new(),
            delay: Duration::from_millis(20),
        };
        let session = controller(Arc::new(storage.clone()), no_profiles());
        session.restore_session().await.unwrap();
        session.begin_sign_in().unwrap();

        let first = User::new(UserId(1), "one@example.com", "One");
        let second = User::new(UserId(2), "two@example.com", "Two");
        let (a, b) = tokio::join!(
            session.complete_sign_in(first),
            session.complete_sign_in(second)
        );

        assert_ne!(a.is_ok(), b.is_ok());
        let signed_in = session.state().user().cloned().unwrap();
        let stored = SessionVault::new(Arc::new(storage.inner.clone()))
            .load()
            .await
            .unwrap();
        assert_eq!(stored, Some(signed_in));
    }

    #[tokio::test]
    async fn sign_out_before_restore_keeps_saved_user() {
        let storage = MemoryStorage::new();
        SessionVault::new(Arc::new(storage.clone())).save(&ada()).await.unwrap();
        let session = controller(Arc::new(storage.clone()), no_profiles());

        session.sign_out().await;

        assert_eq!(session.state(), SessionState::Unresolved);
        assert_eq!(storage.len(), 1);
        let state = session.restore_session().await.unwrap();
        assert_eq!(state, SessionState::SignedIn(ada()));
    }
}
