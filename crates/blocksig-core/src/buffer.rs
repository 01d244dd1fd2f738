//! Bounded blocking FIFO shared between pipeline stages.
//!
//! `put` blocks while the buffer is full and `take` blocks while it is empty
//! and still open. Both return promptly once the run's cancellation signal
//! trips. After `close`, remaining items can still be taken until the buffer
//! is drained; putting into a closed buffer is a bug and panics.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, Weak};

use crate::control::{CancelListener, CancellationSignal, Cancelled};

/// Outcome of a blocking `take`.
#[derive(Debug, PartialEq, Eq)]
pub enum Take<T> {
    Item(T),
    /// Closed and fully drained; the consumer should exit normally.
    Drained,
    Cancelled,
}

#[derive(Debug)]
struct State<T> {
    items: VecDeque<T>,
    closed: bool,
    cancelled: bool,
}

/// Capacity-limited concurrent FIFO. Share via the `Arc` returned by `new`.
#[derive(Debug)]
pub struct BoundedBuffer<T> {
    capacity: usize,
    state: Mutex<State<T>>,
    not_full: Condvar,
    not_empty: Condvar,
}

impl<T: Send + 'static> BoundedBuffer<T> {
    /// Create a buffer holding at most `capacity` items, woken by `signal`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize, signal: &CancellationSignal) -> Arc<Self> {
        assert!(capacity > 0, "BoundedBuffer capacity must be > 0");
        let buffer = Arc::new(Self {
            capacity,
            state: Mutex::new(State {
                items: VecDeque::with_capacity(capacity.min(1024)),
                closed: false,
                cancelled: false,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        });
        let weak: Weak<Self> = Arc::downgrade(&buffer);
        signal.subscribe(weak);
        buffer
    }
}

impl<T> BoundedBuffer<T> {
    /// Snapshot of the current item count.
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append `item`, blocking while the buffer is full.
    ///
    /// Returns `Err(Cancelled)` if the run was cancelled before space became
    /// available; the item is dropped.
    ///
    /// # Panics
    ///
    /// Panics if the buffer has been closed.
    pub fn put(&self, item: T) -> Result<(), Cancelled> {
        let mut st = self.lock();
        assert!(!st.closed, "put into a closed BoundedBuffer");
        while !st.cancelled && st.items.len() >= self.capacity {
            st = self
                .not_full
                .wait(st)
                .unwrap_or_else(|poison| poison.into_inner());
        }
        if st.cancelled {
            return Err(Cancelled);
        }
        st.items.push_back(item);
        drop(st);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Remove the oldest item, blocking while the buffer is empty and open.
    pub fn take(&self) -> Take<T> {
        let mut st = self.lock();
        loop {
            if st.cancelled {
                return Take::Cancelled;
            }
            if let Some(item) = st.items.pop_front() {
                drop(st);
                self.not_full.notify_one();
                return Take::Item(item);
            }
            if st.closed {
                return Take::Drained;
            }
            st = self
                .not_empty
                .wait(st)
                .unwrap_or_else(|poison| poison.into_inner());
        }
    }

    /// Mark the buffer as receiving no further input and wake idle consumers.
    pub fn close(&self) {
        self.lock().closed = true;
        self.not_empty.notify_all();
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}

impl<T: Send> CancelListener for BoundedBuffer<T> {
    fn on_cancel(&self) {
        // Set under the lock so a waiter cannot miss the wakeup between its
        // check and its wait.
        self.lock().cancelled = true;
        self.not_full.notify_all();
        self.not_empty.notify_all();
    }
}
