//! Calendar event produced from a schedule grid.

use chrono::{DateTime, Duration, NaiveDate};
use chrono_tz::Tz;
use serde::Serialize;

/// One discrete calendar entry.
///
/// Two events are the same only if all five fields match exactly; equality,
/// hashing and ordering are derived from that tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Event {
    /// Course or appointment title
    pub title: String,

    /// Lecturer, empty when the cell did not name one
    #[serde(skip_serializing_if = "String::is_empty")]
    pub lecturer: String,

    /// Room, empty when the cell did not name one
    #[serde(skip_serializing_if = "String::is_empty")]
    pub room: String,

    /// Start instant in the schedule's time zone
    pub start: DateTime<Tz>,

    /// End instant, always after `start`
    pub end: DateTime<Tz>,
}

impl Event {
    /// Length of the event.
    pub fn duration(&self) -> Duration {
        self.end.signed_duration_since(self.start)
    }

    /// Local calendar date the event starts on.
    pub fn date(&self) -> NaiveDate {
        self.start.date_naive()
    }

    /// Whether the event has a positive duration.
    pub fn is_valid(&self) -> bool {
        self.end > self.start
    }

    /// Text used for the calendar description: labeled lecturer and room
    /// lines, each omitted when empty.
    pub fn description(&self, lecturer_label: &str, room_label: &str) -> String {
        let mut lines = Vec::with_capacity(2);
        if !self.lecturer.is_empty() {
            lines.push(format!("{}: {}", lecturer_label, self.lecturer));
        }
        if !self.room.is_empty() {
            lines.push(format!("{}: {}", room_label, self.room));
        }
        lines.join("\n")
    }
}
