//! Recording fakes of the collaborator traits, shared by the unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::clock::LoopObserver;
use crate::collaborators::{Announcer, Channel, VolumeMixer, WindowPresenter};
use crate::error::{AnnounceError, ChannelError, CoreError};

/// Records every setpoint; can be told to fail reads or the n-th set call.
pub struct RecordingMixer {
    level: f64,
    fail_read: bool,
    fail_on_call: Option<usize>,
    calls: AtomicUsize,
    setpoints: Mutex<Vec<(Channel, f64)>>,
}

impl RecordingMixer {
    pub fn with_level(level: f64) -> Self {
        Self {
            level,
            fail_read: false,
            fail_on_call: None,
            calls: AtomicUsize::new(0),
            setpoints: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_read() -> Self {
        Self {
            fail_read: true,
            ..Self::with_level(0.0)
        }
    }

    /// Fail the set call with this 0-based index.
    pub fn failing_on_call(mut self, index: usize) -> Self {
        self.fail_on_call = Some(index);
        self
    }

    pub fn setpoints(&self) -> Vec<(Channel, f64)> {
        self.setpoints.lock().unwrap().clone()
    }

    fn record(&self, channel: Channel, percent: f64) -> Result<(), ChannelError> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on_call == Some(index) {
            return Err(ChannelError::SetFailed {
                channel,
                percent,
                message: "device unplugged".into(),
            });
        }
        self.setpoints.lock().unwrap().push((channel, percent));
        Ok(())
    }
}

impl VolumeMixer for RecordingMixer {
    fn channel_a_level(&self) -> Result<f64, ChannelError> {
        if self.fail_read {
            return Err(ChannelError::ReadFailed {
                message: "no default endpoint".into(),
            });
        }
        Ok(self.level)
    }

    fn set_channel_a(&self, percent: f64) -> Result<(), ChannelError> {
        self.record(Channel::A, percent)
    }

    fn set_channel_b(&self, percent: f64) -> Result<(), ChannelError> {
        self.record(Channel::B, percent)
    }
}

/// Records prompts and alarms; a failing announcer records the attempt and
/// then reports an error.
#[derive(Default)]
pub struct RecordingAnnouncer {
    pub spoken: Mutex<Vec<String>>,
    pub alarms: AtomicUsize,
    fail: bool,
}

impl RecordingAnnouncer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }

    pub fn alarms(&self) -> usize {
        self.alarms.load(Ordering::SeqCst)
    }
}

impl Announcer for RecordingAnnouncer {
    fn speak(&self, text: &str) -> Result<(), AnnounceError> {
        self.spoken.lock().unwrap().push(text.to_string());
        if self.fail {
            return Err(AnnounceError::Speech("no voice installed".into()));
        }
        Ok(())
    }

    fn play_alarm(&self) -> Result<(), AnnounceError> {
        self.alarms.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AnnounceError::Alarm("sound file missing".into()));
        }
        Ok(())
    }
}

/// Poll `condition` while blocking-pool side effects finish on real threads.
pub fn wait_until(condition: impl Fn() -> bool) {
    for _ in 0..400 {
        if condition() {
            return;
        }
        std::thread::sleep(std::time::Duration::from_millis(5));
    }
    panic!("condition not reached in time");
}

#[derive(Default)]
pub struct RecordingPresenter {
    pub surfaced: AtomicUsize,
    pub visible: AtomicBool,
    pub errors: Mutex<Vec<String>>,
}

impl RecordingPresenter {
    pub fn surfaced(&self) -> usize {
        self.surfaced.load(Ordering::SeqCst)
    }

    pub fn error_count(&self) -> usize {
        self.errors.lock().unwrap().len()
    }
}

impl WindowPresenter for RecordingPresenter {
    fn surface_window(&self) {
        self.surfaced.fetch_add(1, Ordering::SeqCst);
        self.visible.store(true, Ordering::SeqCst);
    }

    fn hide_window(&self) {
        self.visible.store(false, Ordering::SeqCst);
    }

    fn is_window_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    fn report_error(&self, error: &CoreError) {
        self.errors.lock().unwrap().push(error.to_string());
    }
}

#[derive(Default)]
pub struct CountingObserver {
    pub signals: AtomicUsize,
}

impl CountingObserver {
    pub fn signals(&self) -> usize {
        self.signals.load(Ordering::SeqCst)
    }
}

impl LoopObserver for CountingObserver {
    fn on_loop_signal(&self) {
        self.signals.fetch_add(1, Ordering::SeqCst);
    }
}
