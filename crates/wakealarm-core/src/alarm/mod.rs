//! Alarm entity, ordering and lifecycle transitions.

pub mod codec;
mod collection;
mod entity;
mod ordering;
mod transition;

pub use collection::{insertion_index, next_alarm, sorted_alarms, Bucket};
pub use entity::{Alarm, AlarmBuilder, AlarmEdit, MediaType};
