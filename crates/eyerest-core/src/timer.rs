//! Single-shot cancellable timer.
//!
//! `arm` spawns a tokio task that sleeps until the deadline and then runs the
//! callback. Firing and cancelling both race for one compare-and-swap on the
//! handle's resolution state, so a timer ends either `Fired` or `Cancelled`,
//! never both.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use uuid::Uuid;

use crate::error::SchedulerError;

const PENDING: u8 = 0;
const FIRED: u8 = 1;
const CANCELLED: u8 = 2;

/// Terminal (or pending) state of an armed timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerOutcome {
    Pending,
    Fired,
    Cancelled,
}

type AnomalyHook = Arc<dyn Fn(SchedulerError) + Send + Sync>;

#[derive(Debug)]
struct Resolution {
    id: Uuid,
    state: AtomicU8,
}

impl Resolution {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: AtomicU8::new(PENDING),
        }
    }

    /// Try to move from pending to `outcome`. `Ok(false)` means the other
    /// outcome already won.
    fn claim(&self, outcome: u8) -> Result<bool, SchedulerError> {
        match self
            .state
            .compare_exchange(PENDING, outcome, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => Ok(true),
            Err(FIRED) if outcome == FIRED => Err(SchedulerError::RaceAnomaly { task_id: self.id }),
            Err(_) => Ok(false),
        }
    }

    fn outcome(&self) -> TimerOutcome {
        match self.state.load(Ordering::Acquire) {
            FIRED => TimerOutcome::Fired,
            CANCELLED => TimerOutcome::Cancelled,
            _ => TimerOutcome::Pending,
        }
    }
}

/// Arms single-shot timers on a tokio runtime.
#[derive(Clone)]
pub struct CancellableTimer {
    runtime: Handle,
    on_anomaly: Option<AnomalyHook>,
}

impl fmt::Debug for CancellableTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellableTimer")
            .field("on_anomaly", &self.on_anomaly.is_some())
            .finish()
    }
}

impl CancellableTimer {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            on_anomaly: None,
        }
    }

    /// Timer bound to the runtime of the calling task.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    /// Install a hook receiving invariant violations observed by timer tasks.
    pub fn with_anomaly_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(SchedulerError) + Send + Sync + 'static,
    {
        self.on_anomaly = Some(Arc::new(hook));
        self
    }

    /// Run `callback` once, no earlier than `delay` from now.
    ///
    /// Returns immediately; the wait happens on a spawned task.
    pub fn arm<F>(&self, delay: Duration, callback: F) -> TimerHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let resolution = Arc::new(Resolution::new());
        let deadline = Instant::now() + delay;
        let shared = Arc::clone(&resolution);
        let on_anomaly = self.on_anomaly.clone();

        let task = self.runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            match shared.claim(FIRED) {
                Ok(true) => callback(),
                Ok(false) => tracing::debug!(task_id = %shared.id, "timer cancelled before firing"),
                Err(err) => {
                    tracing::error!("{err}");
                    if let Some(hook) = on_anomaly {
                        hook(err);
                    }
                }
            }
        });

        tracing::trace!(task_id = %resolution.id, delay_ms = delay.as_millis() as u64, "timer armed");
        TimerHandle {
            resolution,
            deadline,
            task: task.abort_handle(),
        }
    }
}

/// Handle to one armed timer.
#[derive(Debug)]
pub struct TimerHandle {
    resolution: Arc<Resolution>,
    deadline: Instant,
    task: AbortHandle,
}

impl TimerHandle {
    pub fn id(&self) -> Uuid {
        self.resolution.id
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn outcome(&self) -> TimerOutcome {
        self.resolution.outcome()
    }

    pub fn is_pending(&self) -> bool {
        self.outcome() == TimerOutcome::Pending
    }

    /// Cancel the timer. Returns `true` only if this call prevented the
    /// callback; calling it again, or after firing, returns `false`.
    pub fn cancel(&self) -> bool {
        match self.resolution.claim(CANCELLED) {
            Ok(true) => {
                self.task.abort();
                tracing::trace!(task_id = %self.resolution.id, "timer cancelled");
                true
            }
            Ok(false) | Err(_) => false,
        }
    }
}
