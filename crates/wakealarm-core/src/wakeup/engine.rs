//! Wake-up orchestrator.
//!
//! Drives the output devices of one ringing alarm: time announcements,
//! looping audio, the vibration waveform and the auto-dismiss safety net.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> (Announcing | Playing) <-> Paused -> Terminated
//!          Announcing <-> Playing
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let (wake, mut signals) = WakeUpOrchestrator::new(alarm, settings, devices, Handle::current());
//! wake.start();
//! // The speech engine reports through wake.speech_callbacks().
//! if let Some(WakeUpSignal::AutoDismiss(alarm)) = signals.recv().await { /* dismiss */ }
//! wake.cleanup();
//! ```
//!
//! State lives behind a mutex shared with the timer tasks. A timer only acts
//! while holding the lock and only if the orchestrator has not been cleaned
//! up, so nothing fires after [`WakeUpOrchestrator::cleanup`] returns.
//! Speech engines must report through [`SpeechCallbacks`] from outside
//! their `speak` call.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::collaborators::{
    AudioAttributes, Devices, Vibrator, VIBRATION_PATTERN, VIBRATION_REPEAT_INDEX,
};
use super::speech::time_to_say;
use crate::alarm::Alarm;
use crate::events::Event;
use crate::settings::AlarmSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WakeUpState {
    Idle,
    /// Speaking the time; audio and vibration start once it is done.
    Announcing,
    Playing,
    Paused,
    Terminated,
}

/// Messages from the orchestrator to its owner.
#[derive(Debug, Clone, PartialEq)]
pub enum WakeUpSignal {
    /// The alarm rang for its full auto-dismiss period. Carries the alarm
    /// with its active time updated.
    AutoDismiss(Alarm),
}

/// The auto-dismiss timer fires this long before the configured period ends.
pub const AUTO_DISMISS_LEAD: Duration = Duration::from_secs(2);

/// Delay of the auto-dismiss timer; `None` when auto-dismiss is off.
pub fn auto_dismiss_delay(minutes: u32) -> Option<Duration> {
    if minutes == 0 {
        return None;
    }
    Some(Duration::from_secs(u64::from(minutes) * 60).saturating_sub(AUTO_DISMISS_LEAD))
}

type Shared = Arc<Mutex<Inner>>;

struct Inner {
    alarm: Alarm,
    settings: AlarmSettings,
    state: WakeUpState,
    devices: Devices,
    started: Option<Instant>,
    /// Audio and vibration have been started at least once.
    audible: bool,
    auto_dismiss: Option<AbortHandle>,
    announcer: Option<AbortHandle>,
    signals: mpsc::UnboundedSender<WakeUpSignal>,
    handle: Handle,
}

impl Inner {
    fn speech_enabled(&self) -> bool {
        self.settings.speak_to_me || self.alarm.use_tts
    }

    fn speech_frequency_min(&self) -> u32 {
        if self.alarm.use_tts {
            self.alarm.tts_frequency
        } else {
            self.settings.speak_frequency_min
        }
    }

    fn flush_time_active(&mut self) {
        if let Some(started) = self.started.take() {
            let elapsed = i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX);
            self.alarm.add_to_time_active(elapsed);
        }
    }
}

fn lock(shared: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Coordinates the devices of one ringing alarm.
///
/// Dropping the orchestrator cleans it up.
pub struct WakeUpOrchestrator {
    shared: Shared,
}

impl WakeUpOrchestrator {
    /// Create an idle orchestrator. Timers run on `handle`.
    pub fn new(
        alarm: Alarm,
        settings: AlarmSettings,
        devices: Devices,
        handle: Handle,
    ) -> (Self, mpsc::UnboundedReceiver<WakeUpSignal>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let inner = Inner {
            alarm,
            settings,
            state: WakeUpState::Idle,
            devices,
            started: None,
            audible: false,
            auto_dismiss: None,
            announcer: None,
            signals: tx,
            handle,
        };
        (
            Self {
                shared: Arc::new(Mutex::new(inner)),
            },
            rx,
        )
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> WakeUpState {
        lock(&self.shared).state
    }

    /// Snapshot of the alarm, including the active time accumulated so far.
    pub fn alarm(&self) -> Alarm {
        let inner = lock(&self.shared);
        let mut alarm = inner.alarm.clone();
        if let Some(started) = inner.started {
            let elapsed = i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX);
            alarm.add_to_time_active(elapsed);
        }
        alarm
    }

    pub fn alarm_id(&self) -> i64 {
        lock(&self.shared).alarm.id
    }

    /// Handle for the speech engine to report progress with.
    pub fn speech_callbacks(&self) -> SpeechCallbacks {
        SpeechCallbacks {
            shared: Arc::downgrade(&self.shared),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&self) -> Option<Event> {
        let mut inner = lock(&self.shared);
        if inner.state != WakeUpState::Idle {
            return None;
        }
        inner.started = Some(Instant::now());
        info!(alarm_id = inner.alarm.id, "wake-up started");

        if inner.speech_enabled() {
            inner.state = WakeUpState::Announcing;
            announce(&self.shared, &mut inner);
        } else {
            start_playback(&mut inner);
        }
        arm_auto_dismiss(&self.shared, &mut inner);

        Some(Event::WakeUpStarted {
            alarm_id: inner.alarm.id,
            state: inner.state,
            at: Utc::now(),
        })
    }

    /// Silence the speech engine. Audio and vibration keep going.
    pub fn pause(&self) -> Option<Event> {
        let mut inner = lock(&self.shared);
        match inner.state {
            WakeUpState::Announcing | WakeUpState::Playing => {
                inner.devices.speech.stop();
                // No "done speaking" follows a stopped announcement, so the
                // alarm must not be left waiting on one.
                if inner.state == WakeUpState::Announcing {
                    if inner.audible {
                        vibrate(&mut inner);
                    } else {
                        start_playback(&mut inner);
                    }
                }
                inner.state = WakeUpState::Paused;
                debug!(alarm_id = inner.alarm.id, "wake-up paused");
                Some(Event::WakeUpPaused {
                    alarm_id: inner.alarm.id,
                    at: Utc::now(),
                })
            }
            _ => None,
        }
    }

    pub fn resume(&self) -> Option<Event> {
        let mut inner = lock(&self.shared);
        if inner.state != WakeUpState::Paused {
            return None;
        }
        if inner.speech_enabled() {
            inner.state = WakeUpState::Announcing;
            if let Some(task) = inner.announcer.take() {
                task.abort();
            }
            announce(&self.shared, &mut inner);
        } else {
            inner.state = WakeUpState::Playing;
        }
        debug!(alarm_id = inner.alarm.id, state = ?inner.state, "wake-up resumed");
        Some(Event::WakeUpResumed {
            alarm_id: inner.alarm.id,
            state: inner.state,
            at: Utc::now(),
        })
    }

    /// Stop everything and release the devices. Safe to call from any
    /// state and more than once; only the first call returns an event.
    pub fn cleanup(&self) -> Option<Event> {
        let mut inner = lock(&self.shared);
        if inner.state == WakeUpState::Terminated {
            return None;
        }
        inner.state = WakeUpState::Terminated;

        if let Some(task) = inner.auto_dismiss.take() {
            task.abort();
        }
        if let Some(task) = inner.announcer.take() {
            task.abort();
        }

        cancel_vibration(&mut inner);
        inner.devices.media.stop();
        inner.devices.media.release();
        inner.devices.speech.shutdown();
        inner.flush_time_active();

        info!(
            alarm_id = inner.alarm.id,
            time_active_ms = inner.alarm.time_active,
            "wake-up finished"
        );
        Some(Event::WakeUpFinished {
            alarm_id: inner.alarm.id,
            at: Utc::now(),
        })
    }

    /// Same as [`SpeechCallbacks::on_start_speaking`].
    pub fn on_start_speaking(&self) {
        on_start_speaking(&mut lock(&self.shared));
    }

    /// Same as [`SpeechCallbacks::on_done_speaking`].
    pub fn on_done_speaking(&self) {
        on_done_speaking(&mut lock(&self.shared));
    }
}

impl Drop for WakeUpOrchestrator {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Cloneable handle a speech engine uses to report progress. Does nothing
/// once the orchestrator is gone.
#[derive(Clone)]
pub struct SpeechCallbacks {
    shared: Weak<Mutex<Inner>>,
}

impl SpeechCallbacks {
    pub fn on_start_speaking(&self) {
        if let Some(shared) = self.shared.upgrade() {
            on_start_speaking(&mut lock(&shared));
        }
    }

    pub fn on_done_speaking(&self) {
        if let Some(shared) = self.shared.upgrade() {
            on_done_speaking(&mut lock(&shared));
        }
    }
}

impl std::fmt::Debug for SpeechCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechCallbacks")
            .field("attached", &(self.shared.strong_count() > 0))
            .finish()
    }
}

fn on_start_speaking(inner: &mut Inner) {
    match inner.state {
        WakeUpState::Announcing | WakeUpState::Playing => cancel_vibration(inner),
        WakeUpState::Terminated | WakeUpState::Paused | WakeUpState::Idle => {}
    }
}

fn on_done_speaking(inner: &mut Inner) {
    match inner.state {
        WakeUpState::Terminated | WakeUpState::Paused | WakeUpState::Idle => {}
        WakeUpState::Announcing | WakeUpState::Playing => start_playback(inner),
    }
}

// ── Channels ─────────────────────────────────────────────────────────

fn start_playback(inner: &mut Inner) {
    inner.state = WakeUpState::Playing;
    inner.audible = true;
    play_media(inner);
    vibrate(inner);
}

fn play_media(inner: &mut Inner) {
    let Inner {
        alarm,
        settings,
        devices,
        ..
    } = inner;
    if !devices.media.has_media(alarm) {
        debug!(alarm_id = alarm.id, "no media, audio skipped");
        return;
    }
    devices.media.stop();
    if let Err(e) = devices.media.play(alarm, true, settings.shuffle) {
        warn!(alarm_id = alarm.id, error = %e, "audio unavailable");
    }
}

fn vibrator(devices: &mut Devices) -> Option<&mut (dyn Vibrator + Send + 'static)> {
    if devices.vibrator.is_none() {
        devices.vibrator = devices
            .vibrator_provider
            .as_mut()
            .and_then(|provider| provider.acquire());
    }
    devices.vibrator.as_deref_mut()
}

fn cancel_vibration(inner: &mut Inner) {
    if let Some(v) = vibrator(&mut inner.devices) {
        v.cancel();
    }
}

fn vibrate(inner: &mut Inner) {
    cancel_vibration(inner);
    if !inner.alarm.vibrate {
        return;
    }
    match vibrator(&mut inner.devices) {
        Some(v) => {
            if let Err(e) = v.vibrate(&VIBRATION_PATTERN, Some(VIBRATION_REPEAT_INDEX)) {
                warn!(alarm_id = inner.alarm.id, error = %e, "vibration unavailable");
            }
        }
        None => warn!(alarm_id = inner.alarm.id, "no vibrator, vibration skipped"),
    }
}

fn announce(shared: &Shared, inner: &mut Inner) {
    let speech = &mut inner.devices.speech;
    if speech.is_speaking() || speech.has_pending_buffer() {
        debug!(alarm_id = inner.alarm.id, "speech busy, announcement skipped");
    } else {
        let text = time_to_say(Local::now().naive_local(), inner.settings.use_24_hour);
        let attrs = AudioAttributes::for_alarm(&inner.alarm);
        match inner.devices.speech.speak(&text, &attrs) {
            Ok(()) => inner.state = WakeUpState::Announcing,
            Err(e) => {
                warn!(alarm_id = inner.alarm.id, error = %e, "speech unavailable");
                if inner.state != WakeUpState::Playing {
                    start_playback(inner);
                }
            }
        }
    }

    let freq = inner.speech_frequency_min();
    if freq > 0 {
        schedule_announcement(shared, inner, Duration::from_secs(u64::from(freq) * 60));
    }
}

// ── Timers ───────────────────────────────────────────────────────────

fn schedule_announcement(shared: &Shared, inner: &mut Inner, delay: Duration) {
    if let Some(task) = inner.announcer.take() {
        task.abort();
    }
    let weak = Arc::downgrade(shared);
    let task = inner.handle.spawn(async move {
        tokio::time::sleep(delay).await;
        let Some(shared) = weak.upgrade() else {
            return;
        };
        let mut inner = lock(&shared);
        if inner.state == WakeUpState::Terminated {
            return;
        }
        inner.announcer = None;
        if inner.state == WakeUpState::Paused {
            debug!(alarm_id = inner.alarm.id, "paused, announcement deferred");
            schedule_announcement(&shared, &mut inner, delay);
            return;
        }
        announce(&shared, &mut inner);
    });
    inner.announcer = Some(task.abort_handle());
    debug!(alarm_id = inner.alarm.id, delay_secs = delay.as_secs(), "announcement scheduled");
}

fn arm_auto_dismiss(shared: &Shared, inner: &mut Inner) {
    let Some(delay) = auto_dismiss_delay(inner.settings.auto_dismiss_min) else {
        debug!(alarm_id = inner.alarm.id, "auto-dismiss disabled");
        return;
    };
    let weak = Arc::downgrade(shared);
    let task = inner.handle.spawn(async move {
        tokio::time::sleep(delay).await;
        let Some(shared) = weak.upgrade() else {
            return;
        };
        let mut inner = lock(&shared);
        if inner.state == WakeUpState::Terminated {
            return;
        }
        inner.auto_dismiss = None;
        let mut alarm = inner.alarm.clone();
        if let Some(started) = inner.started {
            let elapsed = i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX);
            alarm.add_to_time_active(elapsed);
        }
        info!(alarm_id = alarm.id, "auto-dismissing alarm");
        if inner.signals.send(WakeUpSignal::AutoDismiss(alarm)).is_err() {
            debug!("auto-dismiss signal dropped, no receiver");
        }
    });
    inner.auto_dismiss = Some(task.abort_handle());
    debug!(alarm_id = inner.alarm.id, delay_secs = delay.as_secs(), "auto-dismiss armed");
}
