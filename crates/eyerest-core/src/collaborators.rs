//! Traits for the external collaborators the core drives.
//!
//! The actual OS volume control, speech synthesis, sound playback and window
//! presentation live outside this crate. The clock, the ramp and the window
//! scheduler only see these traits, injected at construction.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{AnnounceError, ChannelError, CoreError};

/// The two volume channels that are cross-faded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Ambient / system master volume.
    A,
    /// Foreground application session.
    B,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::A => write!(f, "channel A"),
            Channel::B => write!(f, "channel B"),
        }
    }
}

/// Volume setters for the two channels.
///
/// Setters take percentages in `0.0..=100.0`; the level getter returns a
/// scalar in `0.0..=1.0`.
pub trait VolumeMixer: Send + Sync {
    fn channel_a_level(&self) -> Result<f64, ChannelError>;
    fn set_channel_a(&self, percent: f64) -> Result<(), ChannelError>;
    fn set_channel_b(&self, percent: f64) -> Result<(), ChannelError>;

    /// Dispatch to the setter for `channel`.
    fn set(&self, channel: Channel, percent: f64) -> Result<(), ChannelError> {
        match channel {
            Channel::A => self.set_channel_a(percent),
            Channel::B => self.set_channel_b(percent),
        }
    }
}

/// Spoken prompts and the alarm sound.
pub trait Announcer: Send + Sync {
    fn speak(&self, text: &str) -> Result<(), AnnounceError>;
    fn play_alarm(&self) -> Result<(), AnnounceError>;
}

/// The reminder window (or tray) owned by the host UI.
pub trait WindowPresenter: Send + Sync {
    /// Show, raise and focus the reminder window.
    fn surface_window(&self);
    fn hide_window(&self);
    fn is_window_visible(&self) -> bool;

    /// Receive an error from a background side effect.
    fn report_error(&self, error: &CoreError) {
        tracing::error!("background task failed: {error}");
    }
}

/// The collaborator set injected into the clock.
#[derive(Clone)]
pub struct Collaborators {
    pub mixer: Arc<dyn VolumeMixer>,
    pub announcer: Arc<dyn Announcer>,
    pub presenter: Arc<dyn WindowPresenter>,
}
