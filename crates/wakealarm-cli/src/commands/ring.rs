//! `ring`: sound an alarm in the terminal until it is dismissed, snoozed or
//! auto-dismissed.
//!
//! Audio is the terminal bell, speech is printed text and vibration is a
//! status line. Input is read line by line from stdin.

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::debug;
use wakealarm_core::wakeup::{
    AudioAttributes, Devices, MediaPlayer, SpeechCallbacks, SpeechEngine, Vibrator,
};
use wakealarm_core::{
    Alarm, AlarmError, AlarmService, Config, Database, WakeUpOrchestrator, WakeUpSignal,
    WakeUpState,
};

use super::{now, print_json, service, CommandResult};

/// How long the terminal "speaks" each comma-separated chunk.
const SPOKEN_CHUNK: Duration = Duration::from_millis(400);

pub fn run(id: i64) -> CommandResult {
    let config = Config::load()?;
    let db = Database::open()?;
    let svc = service(&db, &config);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(ring(&svc, id))
}

const HELP: &str = "Enter or d: dismiss, s: snooze, p: pause/resume speech";

#[derive(Debug, PartialEq, Eq)]
enum Key {
    Dismiss,
    Snooze,
    TogglePause,
}

/// Unrecognized input is ignored so a typo never dismisses the alarm.
fn parse_key(line: &str) -> Option<Key> {
    match line {
        "" | "d" | "dismiss" => Some(Key::Dismiss),
        "s" | "snooze" => Some(Key::Snooze),
        "p" | "pause" => Some(Key::TogglePause),
        _ => None,
    }
}

enum Outcome {
    Dismissed,
    AutoDismissed,
    Snoozed,
}

async fn ring(svc: &AlarmService<&Database, &Database>, id: i64) -> CommandResult {
    svc.activate(id)?;
    let alarm = svc.get(id)?;
    let settings = *svc.settings();

    let slot = CallbackSlot::default();
    let devices = Devices {
        media: Box::new(TerminalMedia::default()),
        speech: Box::new(TerminalSpeech::new(Handle::current(), slot.clone())),
        vibrator: Some(Box::new(TerminalVibrator)),
        vibrator_provider: None,
    };
    let (wake, mut signals) =
        WakeUpOrchestrator::new(alarm.clone(), settings, devices, Handle::current());
    slot.attach(wake.speech_callbacks());
    wake.start();

    let label = if alarm.name.is_empty() {
        format!("Alarm {id}")
    } else {
        alarm.name_for_message(40)
    };
    println!(
        "{label} is ringing ({}). {HELP}",
        alarm.clock_time(settings.use_24_hour)
    );

    let mut input = spawn_stdin_reader();
    let mut stdin_open = true;
    let outcome = loop {
        tokio::select! {
            Some(WakeUpSignal::AutoDismiss(_)) = signals.recv() => break Outcome::AutoDismissed,
            line = input.recv(), if stdin_open => match line.as_deref().map(parse_key) {
                None => stdin_open = false,
                Some(Some(Key::Dismiss)) => break Outcome::Dismissed,
                Some(Some(Key::Snooze)) => {
                    if wake.alarm().can_snooze(&settings) {
                        break Outcome::Snoozed;
                    }
                    println!("Snooze limit reached.");
                }
                Some(Some(Key::TogglePause)) => {
                    if wake.state() == WakeUpState::Paused {
                        wake.resume();
                    } else {
                        wake.pause();
                    }
                }
                Some(None) => println!("{HELP}"),
            },
            else => break Outcome::Dismissed,
        }
    };

    wake.cleanup();
    svc.record_time_active(id, wake.alarm().time_active)?;
    drop(wake);

    let event = match outcome {
        Outcome::Snoozed => svc.snooze(id, now())?,
        Outcome::Dismissed => svc.dismiss(id, now())?,
        Outcome::AutoDismissed => {
            println!("No response, alarm dismissed.");
            svc.dismiss(id, now())?
        }
    };
    print_json(&event)?;
    Ok(())
}

/// Lines typed on stdin, trimmed and lowercased. Closed at end of input.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line.trim().to_ascii_lowercase()).is_err() {
                break;
            }
        }
    });
    rx
}

/// Speech callbacks, filled in once the orchestrator exists.
#[derive(Clone, Default)]
struct CallbackSlot(Arc<Mutex<Option<SpeechCallbacks>>>);

impl CallbackSlot {
    fn attach(&self, callbacks: SpeechCallbacks) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = Some(callbacks);
    }

    fn get(&self) -> Option<SpeechCallbacks> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[derive(Default)]
struct TerminalMedia {
    playing: bool,
}

impl MediaPlayer for TerminalMedia {
    fn play(&mut self, alarm: &Alarm, _repeat: bool, shuffle: bool) -> Result<(), AlarmError> {
        self.playing = true;
        let title = if alarm.media_title.is_empty() {
            "bell"
        } else {
            alarm.media_title.as_str()
        };
        eprintln!("\x07[playing {title}{}]", if shuffle { ", shuffled" } else { "" });
        Ok(())
    }

    fn stop(&mut self) {
        self.playing = false;
    }

    fn release(&mut self) {
        self.playing = false;
    }

    // The bell stands in when the alarm has no media of its own.
    fn has_media(&self, _alarm: &Alarm) -> bool {
        true
    }
}

struct TerminalSpeech {
    handle: Handle,
    callbacks: CallbackSlot,
    speaking: Arc<AtomicBool>,
    utterance: Option<AbortHandle>,
}

impl TerminalSpeech {
    fn new(handle: Handle, callbacks: CallbackSlot) -> Self {
        Self {
            handle,
            callbacks,
            speaking: Arc::new(AtomicBool::new(false)),
            utterance: None,
        }
    }

    fn silence(&mut self) {
        if let Some(task) = self.utterance.take() {
            task.abort();
        }
        self.speaking.store(false, Ordering::SeqCst);
    }
}

impl SpeechEngine for TerminalSpeech {
    fn speak(&mut self, text: &str, attrs: &AudioAttributes) -> Result<(), AlarmError> {
        self.silence();
        println!("\"{}\"", text.replace(", ", " "));
        debug!(volume = attrs.volume, source = %attrs.source, "speaking");

        self.speaking.store(true, Ordering::SeqCst);
        let speaking = Arc::clone(&self.speaking);
        let callbacks = self.callbacks.clone();
        let chunks = u32::try_from(text.split(", ").count()).unwrap_or(u32::MAX);
        // Runs after `speak` returns; the orchestrator is locked until then.
        let task = self.handle.spawn(async move {
            if let Some(cb) = callbacks.get() {
                cb.on_start_speaking();
            }
            tokio::time::sleep(SPOKEN_CHUNK.saturating_mul(chunks)).await;
            speaking.store(false, Ordering::SeqCst);
            if let Some(cb) = callbacks.get() {
                cb.on_done_speaking();
            }
        });
        self.utterance = Some(task.abort_handle());
        Ok(())
    }

    fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::SeqCst)
    }

    fn has_pending_buffer(&self) -> bool {
        false
    }

    fn stop(&mut self) {
        self.silence();
    }

    fn shutdown(&mut self) {
        self.silence();
    }
}

struct TerminalVibrator;

impl Vibrator for TerminalVibrator {
    fn vibrate(&mut self, pattern: &[u64], repeat_index: Option<usize>) -> Result<(), AlarmError> {
        debug!(?pattern, ?repeat_index, "vibrating");
        eprintln!("[bzzz]");
        Ok(())
    }

    fn cancel(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_explicit_input_dismisses() {
        assert_eq!(parse_key(""), Some(Key::Dismiss));
        assert_eq!(parse_key("d"), Some(Key::Dismiss));
        assert_eq!(parse_key("dismiss"), Some(Key::Dismiss));
        assert_eq!(parse_key("s"), Some(Key::Snooze));
        assert_eq!(parse_key("p"), Some(Key::TogglePause));
        assert_eq!(parse_key("snoze"), None);
        assert_eq!(parse_key("x"), None);
    }
}
