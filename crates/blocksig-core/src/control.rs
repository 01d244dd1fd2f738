//! Run control: the shared cancellation signal.
//!
//! Every pipeline stage holds the same `CancellationSignal`. Any stage may
//! trip it after a failure; bounded buffers register as listeners so that
//! threads blocked on a full or empty buffer wake up and abort instead of
//! waiting forever.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

/// Returned by blocking operations that gave up because the run was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

impl std::fmt::Display for Cancelled {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pipeline cancelled")
    }
}

impl std::error::Error for Cancelled {}

/// Woken exactly once when the signal trips.
pub trait CancelListener: Send + Sync {
    fn on_cancel(&self);
}

/// One-way shared flag: unsignaled -> signaled, never back.
#[derive(Default)]
pub struct CancellationSignal {
    tripped: AtomicBool,
    listeners: Mutex<Vec<Weak<dyn CancelListener>>>,
}

impl CancellationSignal {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// True once any stage has tripped the signal.
    pub fn is_cancelled(&self) -> bool {
        self.tripped.load(Ordering::Acquire)
    }

    /// Trip the signal and wake every registered listener. Idempotent; only
    /// the first call notifies.
    pub fn cancel(&self) {
        if self.tripped.swap(true, Ordering::AcqRel) {
            return;
        }
        tracing::debug!("cancellation signal tripped");
        let listeners = std::mem::take(&mut *self.lock_listeners());
        for listener in listeners.iter().filter_map(Weak::upgrade) {
            listener.on_cancel();
        }
    }

    /// Register a listener. If the signal already tripped, the listener is
    /// notified immediately.
    pub fn subscribe(&self, listener: Weak<dyn CancelListener>) {
        {
            let mut listeners = self.lock_listeners();
            if !self.is_cancelled() {
                listeners.push(listener);
                return;
            }
        }
        if let Some(listener) = listener.upgrade() {
            listener.on_cancel();
        }
    }

    /// Guard that trips the signal if the owning thread unwinds, so a
    /// panicking stage cannot leave its siblings blocked.
    pub fn trip_on_panic(self: &Arc<Self>) -> PanicTrip {
        PanicTrip {
            signal: Arc::clone(self),
        }
    }

    fn lock_listeners(&self) -> std::sync::MutexGuard<'_, Vec<Weak<dyn CancelListener>>> {
        self.listeners
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}

impl std::fmt::Debug for CancellationSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationSignal")
            .field("tripped", &self.is_cancelled())
            .finish()
    }
}

/// See [`CancellationSignal::trip_on_panic`].
pub struct PanicTrip {
    signal: Arc<CancellationSignal>,
}

impl Drop for PanicTrip {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.signal.cancel();
        }
    }
}
