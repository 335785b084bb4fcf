mod engine;
mod thresholds;

pub use engine::{ClockSettings, ClockState, LoopObserver, ReminderClock};
pub use thresholds::{
    Multiplier, Threshold, ThresholdAction, ThresholdBinding, ThresholdTable, STANDARD_BINDINGS,
};
