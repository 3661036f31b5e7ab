//! Action-driven state containers
//!
//! A [`Store`] owns one state value and changes it only through its
//! [`Reducer`]. Reads clone the current value or borrow it briefly;
//! subscribers receive a `tokio::sync::watch` receiver that is woken on every
//! change.
//!
//! Dispatch runs the reducer while holding the channel's write lock, so
//! concurrent dispatches are serialized and the later one wins. A dispatch
//! that leaves the state equal to its previous value does not notify.

use std::convert::Infallible;
use std::fmt;
use std::marker::PhantomData;
use tokio::sync::watch;

/// Pure transition function for a store
pub trait Reducer {
    /// State held by the store
    type State: Clone + PartialEq + Send + Sync + 'static;
    /// Actions the store accepts
    type Action: fmt::Debug + Send;
    /// Rejection of an action in the current state
    type Error;

    /// Compute the next state
    ///
    /// # Errors
    /// Returns the reducer's error when `action` is not accepted in `state`;
    /// the store then keeps `state` unchanged.
    fn reduce(state: &Self::State, action: Self::Action) -> Result<Self::State, Self::Error>;
}

/// State container driven by a [`Reducer`]
pub struct Store<R: Reducer> {
    sender: watch::Sender<R::State>,
    _reducer: PhantomData<fn() -> R>,
}

impl<R: Reducer> Store<R> {
    /// Create store holding `initial`
    #[must_use]
    pub fn new(initial: R::State) -> Self {
        let (sender, _) = watch::channel(initial);
        Self {
            sender,
            _reducer: PhantomData,
        }
    }

    /// Apply an action
    ///
    /// Returns whether the state changed.
    ///
    /// # Errors
    /// Propagates the reducer's rejection; the state is left untouched.
    pub fn dispatch(&self, action: R::Action) -> Result<bool, R::Error> {
        tracing::trace!(?action, "dispatch");

        let mut outcome = Ok(false);
        self.sender.send_if_modified(|state| match R::reduce(state, action) {
            Ok(next) if next != *state => {
                *state = next;
                outcome = Ok(true);
                true
            }
            Ok(_) => false,
            Err(err) => {
                outcome = Err(err);
                false
            }
        });
        outcome
    }

    /// Snapshot of the current state
    #[must_use]
    pub fn state(&self) -> R::State {
        self.sender.borrow().clone()
    }

    /// Read the current state without cloning it
    ///
    /// Holds the read lock for the duration of `f`; do not dispatch from it.
    pub fn with_state<T>(&self, f: impl FnOnce(&R::State) -> T) -> T {
        f(&self.sender.borrow())
    }

    /// Subscribe to state changes
    ///
    /// The receiver starts with the current state marked as seen.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<R::State> {
        self.sender.subscribe()
    }

    /// Number of live subscribers
    #[inline]
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<R> Store<R>
where
    R: Reducer<Error = Infallible>,
{
    /// Apply an action that cannot be rejected
    ///
    /// Returns whether the state changed.
    pub fn apply(&self, action: R::Action) -> bool {
        match self.dispatch(action) {
            Ok(changed) => changed,
            Err(never) => match never {},
        }
    }
}

impl<R: Reducer> Default for Store<R>
where
    R::State: Default,
{
    fn default() -> Self {
        Self::new(R::State::default())
    }
}

impl<R: Reducer> fmt::Debug for Store<R>
where
    R::State: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &*self.sender.borrow())
            .field("subscribers", &self.sender.receiver_count())
            .finish()
    }
}
