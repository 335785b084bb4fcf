//! Reminder clock implementation.
//!
//! The reminder clock is a per-second state machine. It does not use
//! internal threads - the host calls `tick()` once per second, in every
//! state, and the clock only counts while Running.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//! ```
//!
//! `reset()` keeps the current state and starts a new run segment.
//!
//! ## Usage
//!
//! ```ignore
//! let mut clock = ReminderClock::new(settings, collaborators, dispatcher);
//! clock.start();
//! // Once per second:
//! for event in clock.tick() { /* display */ }
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use super::thresholds::{ThresholdAction, ThresholdTable};
use crate::collaborators::Collaborators;
use crate::dispatch::TaskDispatcher;
use crate::error::CoreError;
use crate::events::Event;
use crate::ramp::{ChannelRamp, RampDirection, DEFAULT_STEP_DELAY};
use crate::storage::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockState {
    Idle,
    Running,
    Paused,
}

/// Receives the loop signal: emitted when the clock starts and when a rest
/// loop completes. Implementations must return without blocking.
pub trait LoopObserver: Send + Sync {
    fn on_loop_signal(&self);
}

/// Tunables of the reminder clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockSettings {
    /// Base unit, in seconds, that every threshold multiplier scales.
    pub test_time: u64,
    /// The alarm plays once elapsed seconds exceed this.
    pub alarm_timeout_secs: u64,
    pub ramp_delta: f64,
    pub damping_factor: f64,
    pub step_delay: Duration,
    pub speech_enabled: bool,
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            test_time: 10,
            alarm_timeout_secs: 40,
            ramp_delta: 0.5,
            damping_factor: 0.3,
            step_delay: DEFAULT_STEP_DELAY,
            speech_enabled: true,
        }
    }
}

impl From<&Config> for ClockSettings {
    fn from(config: &Config) -> Self {
        Self {
            test_time: config.clock.test_time,
            alarm_timeout_secs: config.clock.alarm_timeout_secs,
            ramp_delta: config.ramp.delta,
            damping_factor: config.ramp.damping_factor,
            step_delay: Duration::from_millis(config.ramp.step_delay_ms),
            speech_enabled: config.announcer.speech_enabled,
        }
    }
}

/// Core reminder clock.
///
/// Only the tick driver mutates the counter, flags and state. Side effects
/// are dispatched and never awaited.
pub struct ReminderClock {
    settings: ClockSettings,
    table: ThresholdTable,
    state: ClockState,
    published: watch::Sender<ClockState>,
    elapsed_seconds: u64,
    alarm_playing: bool,
    /// Channel-A level captured at the duck threshold.
    baseline: Option<f64>,
    collaborators: Collaborators,
    ramp: ChannelRamp,
    dispatcher: TaskDispatcher,
    observer: Option<Arc<dyn LoopObserver>>,
}

impl ReminderClock {
    /// Create a clock with the standard threshold table.
    ///
    /// Starts in the `Idle` state at zero seconds.
    pub fn new(
        settings: ClockSettings,
        collaborators: Collaborators,
        dispatcher: TaskDispatcher,
    ) -> Self {
        let ramp = ChannelRamp::with_step_delay(
            Arc::clone(&collaborators.mixer),
            settings.step_delay,
        );
        let (published, _) = watch::channel(ClockState::Idle);
        Self {
            settings,
            table: ThresholdTable::standard(),
            state: ClockState::Idle,
            published,
            elapsed_seconds: 0,
            alarm_playing: false,
            baseline: None,
            collaborators,
            ramp,
            dispatcher,
            observer: None,
        }
    }

    /// Replace the threshold table (fired flags start cleared).
    pub fn with_table(mut self, mut table: ThresholdTable) -> Self {
        table.reset();
        self.table = table;
        self
    }

    pub fn set_loop_observer(&mut self, observer: Arc<dyn LoopObserver>) {
        self.observer = Some(observer);
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn alarm_playing(&self) -> bool {
        self.alarm_playing
    }

    pub fn baseline(&self) -> Option<f64> {
        self.baseline
    }

    pub fn settings(&self) -> &ClockSettings {
        &self.settings
    }

    pub fn table(&self) -> &ThresholdTable {
        &self.table
    }

    /// Read-only view of the state for other execution contexts.
    pub fn subscribe(&self) -> watch::Receiver<ClockState> {
        self.published.subscribe()
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.state,
            elapsed_seconds: self.elapsed_seconds,
            alarm_playing: self.alarm_playing,
            baseline: self.baseline,
            next_threshold_secs: self
                .table
                .next_trigger(self.elapsed_seconds, self.settings.test_time),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        match self.state {
            ClockState::Idle | ClockState::Paused => {
                self.set_state(ClockState::Running);
                tracing::info!(elapsed = self.elapsed_seconds, "rest clock started");
                self.signal_loop();
                Some(Event::ClockStarted {
                    elapsed_seconds: self.elapsed_seconds,
                    at: Utc::now(),
                })
            }
            ClockState::Running => None, // Already running.
        }
    }

    pub fn pause(&mut self) -> Option<Event> {
        match self.state {
            ClockState::Running => {
                self.set_state(ClockState::Paused);
                tracing::info!(elapsed = self.elapsed_seconds, "rest clock paused");
                Some(Event::ClockPaused {
                    elapsed_seconds: self.elapsed_seconds,
                    at: Utc::now(),
                })
            }
            _ => None,
        }
    }

    /// Start a new run segment without changing state.
    pub fn reset(&mut self) -> Option<Event> {
        self.elapsed_seconds = 0;
        self.alarm_playing = false;
        self.table.reset();
        tracing::info!(state = ?self.state, "rest clock reset");
        Some(Event::ClockReset {
            state: self.state,
            at: Utc::now(),
        })
    }

    /// Call once per second. Returns the events produced by this second.
    pub fn tick(&mut self) -> Vec<Event> {
        if self.state != ClockState::Running {
            return Vec::new();
        }
        self.elapsed_seconds += 1;
        let elapsed = self.elapsed_seconds;
        let mut events = Vec::new();

        if elapsed > self.settings.alarm_timeout_secs && !self.alarm_playing {
            self.alarm_playing = true;
            self.dispatch_alarm();
            events.push(Event::AlarmTriggered {
                elapsed_seconds: elapsed,
                at: Utc::now(),
            });
        }

        for (multiplier, action) in self.table.take_due(elapsed, self.settings.test_time) {
            tracing::debug!(elapsed, %multiplier, ?action, "threshold reached");
            self.run_action(action);
            events.push(Event::ThresholdFired {
                multiplier,
                action,
                elapsed_seconds: elapsed,
                at: Utc::now(),
            });
        }
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn set_state(&mut self, state: ClockState) {
        self.state = state;
        self.published.send_replace(state);
    }

    fn signal_loop(&self) {
        if let Some(observer) = &self.observer {
            observer.on_loop_signal();
        }
    }

    fn run_action(&mut self, action: ThresholdAction) {
        match action {
            ThresholdAction::CaptureAndDuck => match self.collaborators.mixer.channel_a_level() {
                Ok(level) => {
                    let level = level.clamp(0.0, 1.0);
                    self.baseline = Some(level);
                    self.dispatch_ramp(level, RampDirection::Duck);
                }
                Err(err) => {
                    tracing::warn!("skipping duck, baseline unavailable: {err}");
                    self.collaborators.presenter.report_error(&CoreError::from(err));
                }
            },
            ThresholdAction::Announce => self.dispatch_speech(),
            ThresholdAction::Restore => match self.baseline {
                Some(level) => self.dispatch_ramp(level, RampDirection::Restore),
                None => tracing::warn!("skipping restore, no baseline captured"),
            },
            ThresholdAction::CompleteLoop => self.signal_loop(),
        }
    }

    fn dispatch_ramp(&self, baseline: f64, direction: RampDirection) {
        let ramp = self.ramp.clone();
        let presenter = Arc::clone(&self.collaborators.presenter);
        let delta = self.settings.ramp_delta;
        let damping = self.settings.damping_factor;

        self.dispatcher.spawn(direction.label(), async move {
            match ramp.apply(baseline, delta, damping, direction).await {
                Ok(report) => tracing::debug!(?report, "ramp complete"),
                Err(err) => {
                    tracing::error!(direction = direction.label(), "ramp aborted: {err}");
                    presenter.report_error(&CoreError::from(err));
                }
            }
        });
    }

    fn dispatch_speech(&self) {
        if !self.settings.speech_enabled {
            return;
        }
        let announcer = Arc::clone(&self.collaborators.announcer);
        let text = format!("{} seconds", self.elapsed_seconds);
        self.dispatcher.spawn_blocking("speech", move || {
            if let Err(err) = announcer.speak(&text) {
                tracing::warn!("{err}");
            }
        });
    }

    fn dispatch_alarm(&self) {
        let announcer = Arc::clone(&self.collaborators.announcer);
        self.dispatcher.spawn_blocking("alarm", move || {
            if let Err(err) = announcer.play_alarm() {
                tracing::warn!("{err}");
            }
        });
    }
}
