//! One-shot cancellation signal for cooperative pipeline shutdown.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

/// A broadcastable, one-shot stop notification.
///
/// The signal has exactly two states, active and fired, and transitions
/// once, irreversibly. Firing is idempotent - only the first reason is kept.
/// Any number of observers may query or await the signal concurrently
/// without blocking the firer.
#[derive(Clone)]
pub struct CancellationSignal {
    shared: Arc<Shared>,
}

struct Shared {
    /// Whether the signal has fired.
    fired: AtomicBool,
    /// The reason the signal fired (first one wins).
    reason: RwLock<Option<String>>,
    /// Broadcast channel observers wait on.
    notify: watch::Sender<bool>,
}

impl CancellationSignal {
    /// Creates a new, unfired signal.
    #[must_use]
    pub fn new() -> Self {
        let (notify, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                fired: AtomicBool::new(false),
                reason: RwLock::new(None),
                notify,
            }),
        }
    }

    /// Fires the signal with a reason.
    ///
    /// This is idempotent - only the first reason is kept, and later calls
    /// are no-ops. Safe to call concurrently with observation.
    pub fn fire(&self, reason: impl Into<String>) {
        if self
            .shared
            .fired
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            let reason = reason.into();
            debug!(reason = %reason, "cancellation signal fired");
            *self.shared.reason.write() = Some(reason);
            self.shared.notify.send_replace(true);
        }
    }

    /// Arms a timer that fires the signal after `delay`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn fire_after(&self, delay: Duration) {
        let signal = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            signal.fire("deadline elapsed");
        });
    }

    /// Waits until the signal fires.
    ///
    /// Resolves immediately if the signal has already fired. Cancel-safe:
    /// dropping the returned future mid-wait loses nothing.
    pub async fn cancelled(&self) {
        if self.is_fired() {
            return;
        }
        let mut rx = self.shared.notify.subscribe();
        // The sender lives inside the shared state we borrow from, so
        // wait_for cannot observe a closed channel while we are here.
        let _ = rx.wait_for(|fired| *fired).await;
    }

    /// Returns whether the signal has fired.
    #[must_use]
    pub fn is_fired(&self) -> bool {
        self.shared.fired.load(Ordering::SeqCst)
    }

    /// Returns the reason the signal fired, if it has.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        self.shared.reason.read().clone()
    }
}

impl Default for CancellationSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancellationSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationSignal")
            .field("fired", &self.is_fired())
            .field("reason", &self.reason())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_starts_unfired() {
        let signal = CancellationSignal::new();
        assert!(!signal.is_fired());
        assert!(signal.reason().is_none());
    }

    #[test]
    fn test_signal_fire() {
        let signal = CancellationSignal::new();
        signal.fire("operator requested");

        assert!(signal.is_fired());
        assert_eq!(signal.reason(), Some("operator requested".to_string()));
    }

    #[test]
    fn test_signal_fire_idempotent() {
        let signal = CancellationSignal::new();
        signal.fire("first");
        signal.fire("second");

        // First reason wins
        assert_eq!(signal.reason(), Some("first".to_string()));
    }

    #[tokio::test]
    async fn test_cancelled_resolves_on_fire() {
        let signal = CancellationSignal::new();

        let waiter = {
            let signal = signal.clone();
            tokio::spawn(async move {
                signal.cancelled().await;
            })
        };

        signal.fire("test");
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should resolve after fire")
            .expect("waiter task should not panic");
    }

    #[tokio::test]
    async fn test_cancelled_resolves_immediately_when_already_fired() {
        let signal = CancellationSignal::new();
        signal.fire("early");

        tokio::time::timeout(Duration::from_millis(100), signal.cancelled())
            .await
            .expect("already-fired signal should resolve at once");
    }

    #[tokio::test]
    async fn test_many_concurrent_observers() {
        let signal = CancellationSignal::new();

        let waiters: Vec<_> = (0..32)
            .map(|_| {
                let signal = signal.clone();
                tokio::spawn(async move {
                    signal.cancelled().await;
                })
            })
            .collect();

        signal.fire("broadcast");

        for waiter in waiters {
            tokio::time::timeout(Duration::from_secs(1), waiter)
                .await
                .expect("every observer should be released")
                .expect("observer task should not panic");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fire_after() {
        let signal = CancellationSignal::new();
        signal.fire_after(Duration::from_secs(30));

        assert!(!signal.is_fired());

        tokio::time::sleep(Duration::from_secs(31)).await;
        signal.cancelled().await;
        assert!(signal.is_fired());
        assert_eq!(signal.reason(), Some("deadline elapsed".to_string()));
    }
}
