//! Wake-up orchestration: what happens between an alarm firing and the
//! user dismissing it.

mod collaborators;
mod engine;
mod session;
pub mod speech;

pub use collaborators::{
    AudioAttributes, Devices, MediaPlayer, SpeechEngine, Vibrator, VibratorProvider,
    VIBRATION_PATTERN, VIBRATION_REPEAT_INDEX,
};
pub use engine::{
    auto_dismiss_delay, SpeechCallbacks, WakeUpOrchestrator, WakeUpSignal, WakeUpState,
    AUTO_DISMISS_LEAD,
};
pub use session::WakeUpSession;
