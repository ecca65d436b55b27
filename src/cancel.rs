//! Cooperative cancellation between the scheduler and the running effect.
//!
//! One flag exists per scheduler. The scheduler holds the [`CancelFlag`] and
//! is the only writer; effects get a [`CancelToken`], which can only read.
//! The flag is level-triggered: once raised, every check sees `true` until
//! the scheduler resets it.
//!
//! ## Rust concepts
//! - `Arc<AtomicBool>` shared between threads without a mutex
//! - Splitting one shared value into a write type and a read type, so the
//!   compiler rejects an effect that tries to raise or reset the flag
//! - `Instant::checked_add` instead of `+`, which panics on overflow

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Longest stretch an effect sleeps without looking at the flag.
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Write side, owned by the scheduler.
#[derive(Debug, Default)]
pub struct CancelFlag {
    raised: Arc<AtomicBool>,
}

/// Read side, handed to every effect run.
///
/// Rust concept: Ordering
/// Every load and store uses `SeqCst`. A raise made before `join` is then
/// visible to the effect thread, and a reset made after it is visible to the
/// next effect, with no further reasoning about weaker orderings.
#[derive(Clone, Debug)]
pub struct CancelToken {
    raised: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            raised: Arc::clone(&self.raised),
        }
    }

    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }

    pub fn reset(&self) {
        self.raised.store(false, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }
}

impl CancelToken {
    /// A token nobody can raise. Handy for driving an effect to completion.
    pub fn never() -> Self {
        Self {
            raised: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }

    /// Sleep for `duration`, waking early if cancelled.
    ///
    /// Returns `true` if the effect should keep going.
    /// A duration too large to represent sleeps until cancelled.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now().checked_add(duration);
        loop {
            if self.is_cancelled() {
                return false;
            }
            let remaining = match deadline {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                None => POLL_INTERVAL,
            };
            if remaining.is_zero() {
                return true;
            }
            thread::sleep(remaining.min(POLL_INTERVAL));
        }
    }
}
