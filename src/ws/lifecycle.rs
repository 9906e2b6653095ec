//! Client lifecycle state machine.
//!
//! `Connecting → Active → Draining → Closed`, strictly forward. Both pumps
//! hold a [`Lifecycle`] and watch it, so whichever pump fails first moves
//! the client to `Draining` and the other one notices and exits.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

/// Where a client is in its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClientState {
    /// Upgraded and identified, not yet registered.
    Connecting,
    /// Registered; both pumps running.
    Active,
    /// Unregistration requested; pumps are winding down.
    Draining,
    /// Both pumps exited and the connection is closed.
    Closed,
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connecting => "connecting",
            Self::Active => "active",
            Self::Draining => "draining",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Shared, observable [`ClientState`].
#[derive(Debug, Clone)]
pub struct Lifecycle {
    state: Arc<watch::Sender<ClientState>>,
}

impl Lifecycle {
    /// Starts a new lifecycle in [`ClientState::Connecting`].
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(ClientState::Connecting);
        Self {
            state: Arc::new(state),
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> ClientState {
        *self.state.borrow()
    }

    /// Moves to `next` if it is later than the current state.
    ///
    /// Returns `true` if the state changed. Backward moves are ignored.
    pub fn advance(&self, next: ClientState) -> bool {
        self.state.send_if_modified(|current| {
            if next > *current {
                *current = next;
                true
            } else {
                false
            }
        })
    }

    /// Subscribes to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ClientState> {
        self.state.subscribe()
    }

    /// Waits until the state is `target` or later, and returns it.
    pub async fn reached(&self, target: ClientState) -> ClientState {
        let mut rx = self.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        match rx.wait_for(|state| *state >= target).await {
            Ok(state) => *state,
            Err(_) => self.state(),
        }
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn starts_connecting_and_moves_forward() {
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.state(), ClientState::Connecting);

        assert!(lifecycle.advance(ClientState::Active));
        assert!(lifecycle.advance(ClientState::Draining));
        assert_eq!(lifecycle.state(), ClientState::Draining);
    }

    #[test]
    fn never_moves_backward() {
        let lifecycle = Lifecycle::new();
        lifecycle.advance(ClientState::Draining);

        assert!(!lifecycle.advance(ClientState::Active));
        assert!(!lifecycle.advance(ClientState::Draining));
        assert_eq!(lifecycle.state(), ClientState::Draining);
    }

    #[test]
    fn states_may_be_skipped() {
        let lifecycle = Lifecycle::new();
        assert!(lifecycle.advance(ClientState::Closed));
        assert_eq!(lifecycle.state(), ClientState::Closed);
    }

    #[tokio::test]
    async fn reached_wakes_on_later_state() {
        let lifecycle = Lifecycle::new();
        let observer = lifecycle.clone();
        let waiter = tokio::spawn(async move { observer.reached(ClientState::Draining).await });

        lifecycle.advance(ClientState::Active);
        lifecycle.advance(ClientState::Closed);

        let Ok(state) = waiter.await else {
            panic!("waiter panicked");
        };
        assert_eq!(state, ClientState::Closed);
    }
}
