//! # Eyerest Core Library
//!
//! This library provides the core logic of the Eyerest eye-rest reminder.
//! While a rest countdown runs it cross-fades two volume channels (ducking
//! the foreground application while raising the ambient channel), speaks
//! progress prompts, sounds an alarm, and later reverses the fade. A
//! long-period scheduler reopens the reminder window while resting continues.
//!
//! ## Architecture
//!
//! - **Reminder Clock**: A per-second state machine that requires the host to
//!   invoke `tick()` once per second; thresholds fire exactly once per run
//! - **Crossfade**: A pure curve generator plus a paced ramp applying it
//! - **Window Scheduler**: Self-rearming reopen timer built on a cancellable
//!   single-shot timer
//! - **Storage**: TOML-based configuration
//!
//! OS volume control, speech, sound and window presentation are external
//! collaborators behind the traits in [`collaborators`].
//!
//! ## Key Components
//!
//! - [`ReminderClock`]: Core clock state machine
//! - [`generate_curve`]: Crossfade curve generator
//! - [`ChannelRamp`]: Paced curve application
//! - [`ReminderWindowScheduler`]: Reopen/follow-up scheduling
//! - [`Config`]: Application configuration management

pub mod clock;
pub mod collaborators;
pub mod curve;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod ramp;
pub mod storage;
pub mod timer;
pub mod window;

#[cfg(test)]
mod testing;

pub use clock::{
    ClockSettings, ClockState, LoopObserver, ReminderClock, ThresholdAction, ThresholdBinding,
    ThresholdTable,
};
pub use collaborators::{Announcer, Channel, Collaborators, VolumeMixer, WindowPresenter};
pub use curve::{generate_curve, Curve, CurvePoint};
pub use dispatch::TaskDispatcher;
pub use error::{AnnounceError, ChannelError, ConfigError, CoreError, SchedulerError, ThresholdError};
pub use events::Event;
pub use ramp::{ChannelRamp, RampDirection, RampReport};
pub use storage::Config;
pub use timer::{CancellableTimer, TimerHandle, TimerOutcome};
pub use window::{ReminderWindowScheduler, WindowSettings};
