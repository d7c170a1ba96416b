//! Picture-taken handshake
//!
//! Single-slot rendezvous between the camera's callback thread (producer)
//! and the capture loop (consumer). A signal with nobody waiting is kept
//! until the next `wait`; further signals before that are collapsed into
//! the one already pending. It never counts.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::debug;

/// Handshake slot state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandshakeState {
    #[default]
    Idle,
    Signaled,
}

/// Wakes the capture loop once the camera delivered a picture
#[derive(Debug, Default)]
pub struct CaptureHandshake {
    /// Check-and-clear of the slot always happens under this lock
    state: Mutex<HandshakeState>,
    notify: Notify,
}

impl CaptureHandshake {
    /// Create an idle handshake
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the picture as taken and wake the waiter, if any.
    ///
    /// Safe to call from any thread, with or without a waiter present.
    pub fn signal(&self) {
        let mut state = self.lock();
        if *state == HandshakeState::Signaled {
            debug!("Handshake already signaled, collapsing");
        }
        *state = HandshakeState::Signaled;
        drop(state);
        self.notify.notify_one();
    }

    /// Consume a pending signal without waiting
    pub fn try_wait(&self) -> bool {
        let mut state = self.lock();
        if *state == HandshakeState::Signaled {
            *state = HandshakeState::Idle;
            true
        } else {
            false
        }
    }

    /// Wait until signaled, with no timeout
    pub async fn wait(&self) {
        // A signal racing with the check leaves a permit in `notify`, so the
        // next `notified()` returns at once and the loop re-checks the slot.
        while !self.try_wait() {
            self.notify.notified().await;
        }
    }

    /// Wait at most `timeout`; returns whether a signal was consumed
    pub async fn wait_timeout(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.wait()).await.is_ok()
    }

    /// Current slot state
    pub fn state(&self) -> HandshakeState {
        *self.lock()
    }

    fn lock(&self) -> MutexGuard<'_, HandshakeState> {
        // The guarded value is a plain enum, so a poisoned lock is still usable
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
