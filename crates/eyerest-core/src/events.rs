use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::{ClockState, Multiplier, ThresholdAction};

/// Every clock transition and fired side effect produces an Event.
/// The host displays them; the CLI prints them as JSON lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    ClockStarted {
        elapsed_seconds: u64,
        at: DateTime<Utc>,
    },
    ClockPaused {
        elapsed_seconds: u64,
        at: DateTime<Utc>,
    },
    ClockReset {
        state: ClockState,
        at: DateTime<Utc>,
    },
    ThresholdFired {
        multiplier: Multiplier,
        action: ThresholdAction,
        elapsed_seconds: u64,
        at: DateTime<Utc>,
    },
    /// Elapsed time passed the alarm timeout; the alarm sound was dispatched.
    AlarmTriggered {
        elapsed_seconds: u64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: ClockState,
        elapsed_seconds: u64,
        alarm_playing: bool,
        baseline: Option<f64>,
        next_threshold_secs: Option<u64>,
        at: DateTime<Utc>,
    },
}
