use std::sync::{
    Mutex, PoisonError,
    atomic::{AtomicBool, Ordering},
};

use serde::Serialize;

/// Process-wide view of whether the cache store can be used.
///
/// Starts disconnected. Only the store adapter flips it, and only in
/// response to store events (ready, error, close).
#[derive(Debug, Default)]
pub struct ConnectivityState {
    connected: AtomicBool,
    closed: AtomicBool,
    last_error: Mutex<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectivitySnapshot {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl ConnectivityState {
    pub fn new() -> Self { Self::default() }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub fn is_closed(&self) -> bool { self.closed.load(Ordering::Acquire) }

    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn snapshot(&self) -> ConnectivitySnapshot {
        ConnectivitySnapshot {
            connected: self.is_connected(),
            last_error: self.last_error(),
        }
    }

    /// Returns `true` when this call moved the state to connected.
    pub(crate) fn mark_ready(&self) -> bool {
        if self.is_closed() {
            return false;
        }
        let transitioned = !self.connected.swap(true, Ordering::AcqRel);
        if transitioned {
            self.set_last_error(None);
        }
        transitioned
    }

    /// Returns `true` when this call moved the state to disconnected.
    pub(crate) fn mark_disconnected(&self, reason: impl Into<String>) -> bool {
        let transitioned = self.connected.swap(false, Ordering::AcqRel);
        if transitioned {
            self.set_last_error(Some(reason.into()));
        }
        transitioned
    }

    /// Records the reason the store never became (or stopped being)
    /// available without counting it as a transition.
    pub(crate) fn record_error(&self, reason: impl Into<String>) {
        self.set_last_error(Some(reason.into()));
    }

    pub(crate) fn mark_closed(&self) {
        self.closed.store(true, Ordering::Release);
        self.connected.store(false, Ordering::Release);
        self.set_last_error(Some("closed".into()));
    }

    fn set_last_error(&self, value: Option<String>) {
        *self
            .last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_disconnected() {
        let state = ConnectivityState::new();

        assert!(!state.is_connected());
        assert_eq!(state.last_error(), None);
    }

    #[test]
    fn transitions_are_reported_once() {
        let state = ConnectivityState::new();

        assert!(state.mark_ready());
        assert!(!state.mark_ready());
        assert!(state.mark_disconnected("connection reset"));
        assert!(!state.mark_disconnected("connection reset again"));
        assert_eq!(state.last_error().as_deref(), Some("connection reset"));
    }

    #[test]
    fn closed_state_is_terminal() {
        let state = ConnectivityState::new();
        state.mark_ready();
        state.mark_closed();

        assert!(!state.mark_ready());
        assert_eq!(
            state.snapshot(),
            ConnectivitySnapshot {
                connected: false,
                last_error: Some("closed".into()),
            }
        );
    }
}
