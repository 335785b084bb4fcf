//! Console stand-ins for the OS collaborators.
//!
//! The mixer keeps its levels in memory, the announcer and the presenter
//! log what a desktop host would do.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use eyerest_core::error::{AnnounceError, ChannelError, CoreError};
use eyerest_core::{Announcer, Channel, VolumeMixer, WindowPresenter};

/// In-memory two-channel mixer.
pub struct SimulatedMixer {
    levels: Mutex<(f64, f64)>,
}

impl SimulatedMixer {
    /// Start with channel A at `level` (0.0..=1.0) and channel B at full.
    pub fn new(level: f64) -> Self {
        Self {
            levels: Mutex::new((level.clamp(0.0, 1.0) * 100.0, 100.0)),
        }
    }

    pub fn levels(&self) -> (f64, f64) {
        *self.levels.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn store(&self, channel: Channel, percent: f64) -> Result<(), ChannelError> {
        if !(0.0..=100.0).contains(&percent) {
            return Err(ChannelError::SetFailed {
                channel,
                percent,
                message: "level out of range".to_string(),
            });
        }
        let mut levels = self.levels.lock().unwrap_or_else(|p| p.into_inner());
        match channel {
            Channel::A => levels.0 = percent,
            Channel::B => levels.1 = percent,
        }
        tracing::debug!(%channel, percent, "volume set");
        Ok(())
    }
}

impl VolumeMixer for SimulatedMixer {
    fn channel_a_level(&self) -> Result<f64, ChannelError> {
        Ok(self.levels().0 / 100.0)
    }

    fn set_channel_a(&self, percent: f64) -> Result<(), ChannelError> {
        self.store(Channel::A, percent)
    }

    fn set_channel_b(&self, percent: f64) -> Result<(), ChannelError> {
        self.store(Channel::B, percent)
    }
}

pub struct LogAnnouncer;

impl Announcer for LogAnnouncer {
    fn speak(&self, text: &str) -> Result<(), AnnounceError> {
        tracing::info!(text, "speak");
        Ok(())
    }

    fn play_alarm(&self) -> Result<(), AnnounceError> {
        tracing::info!("alarm");
        Ok(())
    }
}

#[derive(Default)]
pub struct ConsolePresenter {
    visible: AtomicBool,
}

impl WindowPresenter for ConsolePresenter {
    fn surface_window(&self) {
        self.visible.store(true, Ordering::SeqCst);
        tracing::info!("window surfaced");
    }

    fn hide_window(&self) {
        self.visible.store(false, Ordering::SeqCst);
        tracing::info!("window hidden");
    }

    fn is_window_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    fn report_error(&self, error: &CoreError) {
        tracing::error!("{error}");
    }
}
