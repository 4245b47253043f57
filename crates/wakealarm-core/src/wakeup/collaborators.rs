//! Output devices driven by the wake-up orchestrator.
//!
//! Implementations wrap whatever the platform offers (a terminal bell in the
//! CLI, recording fakes in tests). Every method is expected to return
//! quickly; none of them may block waiting on playback.

use serde::{Deserialize, Serialize};

use crate::alarm::Alarm;
use crate::error::AlarmError;

/// Vibration waveform in milliseconds: no delay, 500 on, 500 off.
pub const VIBRATION_PATTERN: [u64; 3] = [0, 500, 500];

/// Index the waveform repeats from.
pub const VIBRATION_REPEAT_INDEX: usize = 0;

/// Stream and loudness an alarm's audio and speech go out on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioAttributes {
    /// 0..=100
    pub volume: u32,
    pub source: String,
}

impl AudioAttributes {
    pub fn for_alarm(alarm: &Alarm) -> Self {
        Self {
            volume: alarm.volume.min(100),
            source: alarm.audio_source.clone(),
        }
    }
}

pub trait MediaPlayer {
    /// Start the alarm's media from the beginning.
    fn play(&mut self, alarm: &Alarm, repeat: bool, shuffle: bool) -> Result<(), AlarmError>;

    fn stop(&mut self);

    /// Free the underlying player. Safe to call more than once.
    fn release(&mut self);

    fn has_media(&self, alarm: &Alarm) -> bool {
        alarm.has_media()
    }
}

pub trait SpeechEngine {
    /// Queue `text` for speaking. The engine reports progress through
    /// [`SpeechCallbacks`](super::SpeechCallbacks).
    fn speak(&mut self, text: &str, attrs: &AudioAttributes) -> Result<(), AlarmError>;

    fn is_speaking(&self) -> bool;

    /// Text queued but not yet spoken.
    fn has_pending_buffer(&self) -> bool;

    fn stop(&mut self);

    fn shutdown(&mut self);
}

pub trait Vibrator {
    /// Play `pattern`, looping from `repeat_index` when given.
    fn vibrate(&mut self, pattern: &[u64], repeat_index: Option<usize>) -> Result<(), AlarmError>;

    fn cancel(&mut self);
}

/// Source of a vibrator when the one handed to the orchestrator is missing.
pub trait VibratorProvider {
    fn acquire(&mut self) -> Option<Box<dyn Vibrator + Send>>;
}

/// Everything one orchestrator owns exclusively.
pub struct Devices {
    pub media: Box<dyn MediaPlayer + Send>,
    pub speech: Box<dyn SpeechEngine + Send>,
    pub vibrator: Option<Box<dyn Vibrator + Send>>,
    pub vibrator_provider: Option<Box<dyn VibratorProvider + Send>>,
}

impl std::fmt::Debug for Devices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Devices")
            .field("vibrator", &self.vibrator.is_some())
            .field("vibrator_provider", &self.vibrator_provider.is_some())
            .finish_non_exhaustive()
    }
}
