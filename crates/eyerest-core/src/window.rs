//! Reminder window scheduler.
//!
//! While the clock runs, the reminder window is surfaced again every
//! `reopen_interval`. After surfacing, a shorter follow-up timer gives the
//! user a grace period and then restarts the long interval:
//!
//! ```text
//! loop signal / close -> [reopen_interval] -> surface -> [follow_up] -> rearm
//! ```
//!
//! Every rearm decision reads the clock state; when the clock is not
//! Running the chain stops until the next loop signal.

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tokio::sync::watch;

use crate::clock::{ClockState, LoopObserver};
use crate::collaborators::WindowPresenter;
use crate::error::CoreError;
use crate::storage::WindowConfig;
use crate::timer::{CancellableTimer, TimerHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSettings {
    pub reopen_interval: Duration,
    pub follow_up: Duration,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            reopen_interval: Duration::from_secs(30 * 60),
            follow_up: Duration::from_secs(3 * 60),
        }
    }
}

impl From<&WindowConfig> for WindowSettings {
    fn from(config: &WindowConfig) -> Self {
        Self {
            reopen_interval: config.reopen_interval(),
            follow_up: config.follow_up(),
        }
    }
}

pub struct ReminderWindowScheduler {
    this: Weak<Self>,
    settings: WindowSettings,
    timer: CancellableTimer,
    clock_state: watch::Receiver<ClockState>,
    presenter: Arc<dyn WindowPresenter>,
    reopen: Mutex<Option<TimerHandle>>,
    follow_up: Mutex<Option<TimerHandle>>,
}

impl ReminderWindowScheduler {
    pub fn new(
        settings: WindowSettings,
        timer: CancellableTimer,
        clock_state: watch::Receiver<ClockState>,
        presenter: Arc<dyn WindowPresenter>,
    ) -> Arc<Self> {
        let reporter = Arc::clone(&presenter);
        let timer =
            timer.with_anomaly_hook(move |err| reporter.report_error(&CoreError::from(err)));
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            settings,
            timer,
            clock_state,
            presenter,
            reopen: Mutex::new(None),
            follow_up: Mutex::new(None),
        })
    }

    pub fn settings(&self) -> &WindowSettings {
        &self.settings
    }

    /// The reminder window was closed by the user.
    pub fn on_close(&self) {
        self.rearm();
    }

    /// Tray click: hide the window when visible, surface it otherwise.
    pub fn toggle_window(&self) {
        if self.presenter.is_window_visible() {
            self.presenter.hide_window();
        } else {
            self.presenter.surface_window();
        }
    }

    pub fn pending_reopen(&self) -> bool {
        lock(&self.reopen).as_ref().is_some_and(TimerHandle::is_pending)
    }

    pub fn pending_follow_up(&self) -> bool {
        lock(&self.follow_up).as_ref().is_some_and(TimerHandle::is_pending)
    }

    /// Cancel both timers. Used when the host shuts down.
    pub fn cancel_all(&self) {
        cancel_slot(&mut lock(&self.follow_up));
        cancel_slot(&mut lock(&self.reopen));
    }

    fn rearm(&self) {
        cancel_slot(&mut lock(&self.follow_up));

        let mut reopen = lock(&self.reopen);
        cancel_slot(&mut reopen);

        let state = *self.clock_state.borrow();
        if state != ClockState::Running {
            tracing::debug!(?state, "clock not running, reopen not armed");
            return;
        }

        let this = self.this.clone();
        *reopen = Some(self.timer.arm(self.settings.reopen_interval, move || {
            if let Some(scheduler) = this.upgrade() {
                scheduler.reopen_fired();
            }
        }));
        tracing::debug!(
            interval_secs = self.settings.reopen_interval.as_secs(),
            "reopen armed"
        );
    }

    fn reopen_fired(&self) {
        tracing::info!("surfacing reminder window");
        self.presenter.surface_window();

        let mut follow_up = lock(&self.follow_up);
        cancel_slot(&mut follow_up);
        let this = self.this.clone();
        *follow_up = Some(self.timer.arm(self.settings.follow_up, move || {
            if let Some(scheduler) = this.upgrade() {
                scheduler.rearm();
            }
        }));
    }
}

impl LoopObserver for ReminderWindowScheduler {
    fn on_loop_signal(&self) {
        self.rearm();
    }
}

impl Drop for ReminderWindowScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

fn lock(slot: &Mutex<Option<TimerHandle>>) -> MutexGuard<'_, Option<TimerHandle>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn cancel_slot(slot: &mut Option<TimerHandle>) {
    if let Some(previous) = slot.take() {
        previous.cancel();
    }
}
