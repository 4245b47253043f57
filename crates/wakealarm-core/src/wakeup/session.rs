use tokio::runtime::Handle;
use tokio::sync::mpsc;

use super::collaborators::Devices;
use super::engine::{WakeUpOrchestrator, WakeUpSignal};
use crate::alarm::Alarm;
use crate::events::Event;
use crate::settings::AlarmSettings;

/// Owner of the single wake-up that may be running at a time.
///
/// Starting a new wake-up tears the previous one down first, so two
/// orchestrators never hold devices at once.
pub struct WakeUpSession {
    handle: Handle,
    current: Option<WakeUpOrchestrator>,
}

impl WakeUpSession {
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            current: None,
        }
    }

    /// Stop whatever is ringing and start ringing `alarm`.
    ///
    /// Returns the events of both steps and the new orchestrator's signal
    /// channel.
    pub fn begin(
        &mut self,
        alarm: Alarm,
        settings: AlarmSettings,
        devices: Devices,
    ) -> (Vec<Event>, mpsc::UnboundedReceiver<WakeUpSignal>) {
        let mut events: Vec<Event> = self.finish().into_iter().collect();
        let (wake, signals) =
            WakeUpOrchestrator::new(alarm, settings, devices, self.handle.clone());
        events.extend(wake.start());
        self.current = Some(wake);
        (events, signals)
    }

    pub fn current(&self) -> Option<&WakeUpOrchestrator> {
        self.current.as_ref()
    }

    pub fn is_ringing(&self, alarm_id: i64) -> bool {
        self.current
            .as_ref()
            .is_some_and(|wake| wake.alarm_id() == alarm_id)
    }

    /// Clean up and drop the running orchestrator, if any.
    pub fn finish(&mut self) -> Option<Event> {
        self.current.take().and_then(|wake| wake.cleanup())
    }
}

impl std::fmt::Debug for WakeUpSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WakeUpSession")
            .field("ringing", &self.current.as_ref().map(|w| w.alarm_id()))
            .finish()
    }
}
