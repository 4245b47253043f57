use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::wakeup::WakeUpState;

/// Every state change of an alarm or a wake-up produces an Event.
/// The CLI prints them; front ends can poll or subscribe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    AlarmCreated {
        alarm_id: i64,
        next_run: NaiveDateTime,
        at: DateTime<Utc>,
    },
    AlarmDeleted {
        alarm_id: i64,
        at: DateTime<Utc>,
    },
    AlarmEnabled {
        alarm_id: i64,
        next_run: NaiveDateTime,
        at: DateTime<Utc>,
    },
    AlarmDisabled {
        alarm_id: i64,
        at: DateTime<Utc>,
    },
    /// The alarm's trigger fired and it started ringing.
    AlarmActivated {
        alarm_id: i64,
        at: DateTime<Utc>,
    },
    AlarmSnoozed {
        alarm_id: i64,
        snooze_count: u32,
        until: NaiveDateTime,
        at: DateTime<Utc>,
    },
    /// `next_run` is `None` when the dismissal switched a one-shot alarm off.
    AlarmDismissed {
        alarm_id: i64,
        next_run: Option<NaiveDateTime>,
        at: DateTime<Utc>,
    },
    AlarmDismissedEarly {
        alarm_id: i64,
        at: DateTime<Utc>,
    },
    WakeUpStarted {
        alarm_id: i64,
        state: WakeUpState,
        at: DateTime<Utc>,
    },
    WakeUpPaused {
        alarm_id: i64,
        at: DateTime<Utc>,
    },
    WakeUpResumed {
        alarm_id: i64,
        state: WakeUpState,
        at: DateTime<Utc>,
    },
    WakeUpFinished {
        alarm_id: i64,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn alarm_id(&self) -> i64 {
        match self {
            Event::AlarmCreated { alarm_id, .. }
            | Event::AlarmDeleted { alarm_id, .. }
            | Event::AlarmEnabled { alarm_id, .. }
            | Event::AlarmDisabled { alarm_id, .. }
            | Event::AlarmActivated { alarm_id, .. }
            | Event::AlarmSnoozed { alarm_id, .. }
            | Event::AlarmDismissed { alarm_id, .. }
            | Event::AlarmDismissedEarly { alarm_id, .. }
            | Event::WakeUpStarted { alarm_id, .. }
            | Event::WakeUpPaused { alarm_id, .. }
            | Event::WakeUpResumed { alarm_id, .. }
            | Event::WakeUpFinished { alarm_id, .. } => *alarm_id,
        }
    }
}
