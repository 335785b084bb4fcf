//! Paced application of a crossfade curve to the two volume channels.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::collaborators::{Channel, VolumeMixer};
use crate::curve::generate_curve;
use crate::error::ChannelError;

/// Default pause between two setpoints.
pub const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RampDirection {
    /// Walk the curve forward: channel A up, channel B down.
    Duck,
    /// Walk the same curve backward to the starting levels.
    Restore,
}

impl RampDirection {
    pub fn is_reversed(self) -> bool {
        self == RampDirection::Restore
    }

    /// Setter order within one step. The channel being lowered goes first so
    /// both channels are never loud at the same time.
    pub fn channel_order(self) -> [Channel; 2] {
        match self {
            RampDirection::Duck => [Channel::A, Channel::B],
            RampDirection::Restore => [Channel::B, Channel::A],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RampDirection::Duck => "duck",
            RampDirection::Restore => "restore",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RampReport {
    pub direction: RampDirection,
    pub steps_applied: usize,
}

/// Applies curves to one channel pair.
///
/// Clones share the same channel pair: a ramp started while another is still
/// pacing waits for it to finish or abort.
#[derive(Clone)]
pub struct ChannelRamp {
    mixer: Arc<dyn VolumeMixer>,
    step_delay: Duration,
    in_flight: Arc<Mutex<()>>,
}

impl ChannelRamp {
    pub fn new(mixer: Arc<dyn VolumeMixer>) -> Self {
        Self::with_step_delay(mixer, DEFAULT_STEP_DELAY)
    }

    pub fn with_step_delay(mixer: Arc<dyn VolumeMixer>, step_delay: Duration) -> Self {
        Self {
            mixer,
            step_delay,
            in_flight: Arc::new(Mutex::new(())),
        }
    }

    pub fn step_delay(&self) -> Duration {
        self.step_delay
    }

    /// Generate the curve for `(baseline, delta, damping_factor)` and apply it.
    ///
    /// # Errors
    ///
    /// Returns the first setter failure; the remaining steps are not applied.
    pub async fn apply(
        &self,
        baseline: f64,
        delta: f64,
        damping_factor: f64,
        direction: RampDirection,
    ) -> Result<RampReport, ChannelError> {
        let _guard = self.in_flight.lock().await;

        let mut curve = generate_curve(baseline, delta, damping_factor);
        if direction.is_reversed() {
            curve = curve.reversed();
        }
        tracing::debug!(
            direction = direction.label(),
            baseline,
            steps = curve.len(),
            "ramp started"
        );

        let mut steps_applied = 0;
        for point in curve {
            for channel in direction.channel_order() {
                let percent = match channel {
                    Channel::A => point.channel_a,
                    Channel::B => point.channel_b,
                };
                self.mixer.set(channel, percent)?;
            }
            steps_applied += 1;
            tokio::time::sleep(self.step_delay).await;
        }

        tracing::debug!(direction = direction.label(), steps_applied, "ramp finished");
        Ok(RampReport {
            direction,
            steps_applied,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingMixer;
    use tokio::time::Instant;

    fn ramp_over(mixer: &Arc<RecordingMixer>) -> ChannelRamp {
        ChannelRamp::new(Arc::clone(mixer) as Arc<dyn VolumeMixer>)
    }

    #[tokio::test(start_paused = true)]
    async fn duck_sets_channel_a_first() {
        let mixer = Arc::new(RecordingMixer::with_level(0.2));
        let report = ramp_over(&mixer)
            .apply(0.2, 0.8, 0.3, RampDirection::Duck)
            .await
            .unwrap();

        assert_eq!(report.steps_applied, 17);
        let setpoints = mixer.setpoints();
        assert_eq!(setpoints.len(), 34);
        assert_eq!(setpoints[0], (Channel::A, 20.0));
        assert_eq!(setpoints[1], (Channel::B, 100.0));
        assert_eq!(setpoints[33], (Channel::B, 4.83));
    }

    #[tokio::test(start_paused = true)]
    async fn restore_walks_backward_channel_b_first() {
        let mixer = Arc::new(RecordingMixer::with_level(1.0));
        ramp_over(&mixer)
            .apply(0.2, 0.8, 0.3, RampDirection::Restore)
            .await
            .unwrap();

        let setpoints = mixer.setpoints();
        assert_eq!(setpoints[0], (Channel::B, 4.83));
        assert_eq!(setpoints[1], (Channel::A, 100.0));
        assert_eq!(setpoints[setpoints.len() - 2], (Channel::B, 100.0));
        assert_eq!(setpoints[setpoints.len() - 1], (Channel::A, 20.0));
    }

    #[tokio::test(start_paused = true)]
    async fn each_step_is_paced() {
        let mixer = Arc::new(RecordingMixer::with_level(0.2));
        let started = Instant::now();
        ramp_over(&mixer)
            .apply(0.2, 0.8, 0.3, RampDirection::Duck)
            .await
            .unwrap();

        assert_eq!(started.elapsed(), DEFAULT_STEP_DELAY * 17);
    }

    #[tokio::test(start_paused = true)]
    async fn setter_failure_aborts_the_ramp() {
        let mixer = Arc::new(RecordingMixer::with_level(0.2).failing_on_call(3));
        let err = ramp_over(&mixer)
            .apply(0.2, 0.8, 0.3, RampDirection::Duck)
            .await
            .unwrap_err();

        assert!(matches!(err, ChannelError::SetFailed { channel: Channel::B, .. }));
        // Step 0 complete, step 1 stopped after channel A.
        assert_eq!(mixer.setpoints().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_ramps_do_not_interleave() {
        let mixer = Arc::new(RecordingMixer::with_level(0.2));
        let ramp = ramp_over(&mixer);

        let first = tokio::spawn({
            let ramp = ramp.clone();
            async move { ramp.apply(0.2, 0.5, 0.3, RampDirection::Duck).await }
        });
        tokio::task::yield_now().await;
        let second = tokio::spawn({
            let ramp = ramp.clone();
            async move { ramp.apply(0.2, 0.5, 0.3, RampDirection::Restore).await }
        });

        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();

        let setpoints = mixer.setpoints();
        let (duck, restore) = setpoints.split_at(setpoints.len() / 2);
        assert_eq!(duck.first(), Some(&(Channel::A, 20.0)));
        assert_eq!(duck.last().map(|s| s.0), Some(Channel::B));
        assert_eq!(restore.first().map(|s| s.0), Some(Channel::B));
        assert_eq!(restore.last(), Some(&(Channel::A, 20.0)));
    }
}
