//! Single-flight effect scheduler.
//!
//! At most one effect runs at a time, each on its own thread with exclusive
//! use of the [`Controller`]. Starting an effect first stops whatever is
//! running: raise the cancel flag, join the thread, clear the state, reset
//! the flag. Only then is the new thread spawned.
//!
//! ## Locks
//! - `control` serializes `start`, `stop` and `shutdown` against each other
//!   and is held across the join, so stop-then-start is atomic to callers.
//! - `state` guards "what is running". It is only held for reads and writes,
//!   never across a join, so `status` never waits on an effect.
//! - `controller` is held by the effect thread for its whole run.
//!
//! A job that ends on its own (finished, failed or panicked) clears the
//! state itself, unless a stop has already claimed its handle, in which case
//! the stopper does it. Whoever takes the state lock first decides.
//!
//! ## Rust concepts
//! - `MutexGuard` scoping: a guard unlocks when it goes out of scope, so the
//!   `state` guard in `stop_current` lives in its own block and is gone
//!   before `join` is called
//! - `std::thread::Builder` for named threads whose spawn can fail
//! - `std::panic::catch_unwind` to turn an effect panic into a value
//! - `PoisonError::into_inner` to keep using a mutex after a panic

use crate::cancel::CancelFlag;
use crate::controller::Controller;
use crate::effects::{Args, Effect, EffectRegistry};
use crate::settings::SharedSettings;
use serde::Serialize;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("Effect '{0}' does not exist")]
    UnknownEffect(String),
    #[error("No effect is currently running")]
    NoActiveEffect,
    #[error("failed to spawn effect thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// What the scheduler is doing right now.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SchedulerStatus {
    Idle,
    Running {
        /// Name of the running effect
        effect: String,
    },
}

/// The running effect as the scheduler records it.
///
/// Rust concept: Option::take
/// `handle.take()` moves the `JoinHandle` out and leaves `None` behind.
/// Only one caller can ever join a thread, and the `None` doubles as the
/// marker that a stop is in progress.
struct Job {
    id: u64,
    name: String,
    /// Taken by the stopper; `None` means a stop owns this job's teardown.
    handle: Option<JoinHandle<()>>,
}

#[derive(Default)]
struct State {
    current: Option<Job>,
    next_id: u64,
}

struct Shared {
    state: Mutex<State>,
    cancel: CancelFlag,
    controller: Mutex<Controller>,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn controller(&self) -> MutexGuard<'_, Controller> {
        self.controller.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct Scheduler {
    registry: EffectRegistry,
    settings: SharedSettings,
    shared: Arc<Shared>,
    control: Mutex<()>,
}

impl Scheduler {
    pub fn new(registry: EffectRegistry, controller: Controller) -> Self {
        Self {
            registry,
            settings: controller.settings().clone(),
            shared: Arc::new(Shared {
                state: Mutex::new(State::default()),
                cancel: CancelFlag::new(),
                controller: Mutex::new(controller),
            }),
            control: Mutex::new(()),
        }
    }

    pub fn registry(&self) -> &EffectRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &SharedSettings {
        &self.settings
    }

    pub fn status(&self) -> SchedulerStatus {
        match &self.shared.state().current {
            Some(job) => SchedulerStatus::Running {
                effect: job.name.clone(),
            },
            None => SchedulerStatus::Idle,
        }
    }

    /// Stop whatever is running, then launch `name` on a fresh thread.
    ///
    /// Returns once the new effect is recorded as running; it does not wait
    /// for it to finish. Starting the running effect again restarts it.
    pub fn start(&self, name: &str, args: Args) -> Result<(), SchedulerError> {
        let effect = self
            .registry
            .get(name)
            .ok_or_else(|| SchedulerError::UnknownEffect(name.to_string()))?;

        let _serial = self.control.lock().unwrap_or_else(PoisonError::into_inner);
        match self.stop_current() {
            Ok(()) | Err(SchedulerError::NoActiveEffect) => {}
            Err(e) => return Err(e),
        }

        // Held across the spawn so the job cannot look for itself before it
        // has been recorded.
        let mut state = self.shared.state();
        self.shared.cancel.reset();
        let id = state.next_id;
        state.next_id += 1;

        let shared = Arc::clone(&self.shared);
        let job_name = name.to_string();
        let handle = thread::Builder::new()
            .name(format!("effect-{name}"))
            .spawn(move || run_job(&shared, id, &job_name, effect.as_ref(), &args))
            .map_err(SchedulerError::Spawn)?;

        state.current = Some(Job {
            id,
            name: name.to_string(),
            handle: Some(handle),
        });
        tracing::info!(effect = name, job = id, "Effect started");
        Ok(())
    }

    /// Signal the running effect and block until its thread has returned.
    pub fn stop(&self) -> Result<(), SchedulerError> {
        let _serial = self.control.lock().unwrap_or_else(PoisonError::into_inner);
        self.stop_current()
    }

    /// Stop anything running and blank the strip.
    pub fn shutdown(&self) {
        let _serial = self.control.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(SchedulerError::NoActiveEffect) = self.stop_current() {
            tracing::debug!("Nothing running at shutdown");
        }
        let mut ctrl = self.shared.controller();
        ctrl.clear();
        if let Err(e) = ctrl.show() {
            tracing::warn!("Failed to blank strip on shutdown: {}", e);
        }
    }

    /// Caller must hold `control`.
    fn stop_current(&self) -> Result<(), SchedulerError> {
        let (id, name, handle) = {
            let mut state = self.shared.state();
            let job = state.current.as_mut().ok_or(SchedulerError::NoActiveEffect)?;
            (job.id, job.name.clone(), job.handle.take())
        };

        self.shared.cancel.raise();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::error!(effect = %name, "Effect thread panicked outside its job wrapper");
            }
        }

        // The job leaves its record alone once the handle is gone, and
        // `control` keeps any other stopper out, so the record is still ours.
        let mut state = self.shared.state();
        debug_assert!(state.current.as_ref().is_some_and(|job| job.id == id));
        state.current = None;
        self.shared.cancel.reset();
        tracing::info!(effect = %name, job = id, "Effect stopped");
        Ok(())
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        let _serial = self.control.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = self.stop_current();
    }
}

/// Body of every effect thread.
///
/// Runs the effect with the controller locked, contains errors and panics,
/// then returns the scheduler to idle unless a stop is already doing so.
///
/// Rust concept: catch_unwind inside the guard
/// The controller guard is taken outside `catch_unwind`, so a panic unwinds
/// only the closure and the guard drops normally afterwards. Had the panic
/// unwound through the guard, the mutex would be poisoned for every later
/// effect.
fn run_job(shared: &Shared, id: u64, name: &str, effect: &dyn Effect, args: &Args) {
    let token = shared.cancel.token();
    let outcome = {
        let mut ctrl = shared.controller();
        panic::catch_unwind(AssertUnwindSafe(|| effect.run(&mut ctrl, args, &token)))
    };

    match outcome {
        Ok(Ok(())) if token.is_cancelled() => {
            tracing::debug!(effect = name, job = id, "Effect observed cancellation");
        }
        Ok(Ok(())) => tracing::info!(effect = name, job = id, "Effect finished"),
        Ok(Err(e)) => tracing::error!(effect = name, job = id, "Effect failed: {}", e),
        Err(payload) => tracing::error!(
            effect = name,
            job = id,
            "Effect panicked: {}",
            panic_message(payload.as_ref())
        ),
    }

    let mut state = shared.state();
    let owns_teardown = state
        .current
        .as_ref()
        .is_some_and(|job| job.id == id && job.handle.is_some());
    if owns_teardown {
        state.current = None;
        shared.cancel.reset();
        tracing::debug!(effect = name, job = id, "Scheduler idle");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}
