//! Workbook-level post-processing: deduplication, ordering and the
//! retention window.

use crate::error::{Error, Result};
use crate::model::Event;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Longest window side accepted from configuration, roughly a century.
pub const MAX_WINDOW_DAYS: i64 = 36_525;

/// Keep events between `past_days` before and `future_days` after "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionWindow {
    /// Days before "now" an event may have ended
    pub past_days: i64,
    /// Days after "now" an event may start
    pub future_days: i64,
}

impl Default for RetentionWindow {
    fn default() -> Self {
        Self {
            past_days: 7,
            future_days: 120,
        }
    }
}

impl RetentionWindow {
    /// Create a window.
    pub fn new(past_days: i64, future_days: i64) -> Self {
        Self {
            past_days,
            future_days,
        }
    }

    /// Fail unless both sides are between zero and [`MAX_WINDOW_DAYS`].
    pub fn validate(&self) -> Result<()> {
        for (name, days) in [("past_days", self.past_days), ("future_days", self.future_days)] {
            if !(0..=MAX_WINDOW_DAYS).contains(&days) {
                return Err(Error::Config(format!(
                    "{} must be between 0 and {}, got {}",
                    name, MAX_WINDOW_DAYS, days
                )));
            }
        }
        Ok(())
    }

    /// Inclusive bounds of the window around `now`.
    ///
    /// A side that does not fit the date range is left open.
    pub fn bounds(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let from = Duration::try_days(self.past_days)
            .and_then(|d| now.checked_sub_signed(d))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let until = Duration::try_days(self.future_days)
            .and_then(|d| now.checked_add_signed(d))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        (from, until)
    }

    /// Whether the event interval intersects the window.
    pub fn contains(&self, event: &Event, now: DateTime<Utc>) -> bool {
        let (from, until) = self.bounds(now);
        event.end.with_timezone(&Utc) >= from && event.start.with_timezone(&Utc) <= until
    }

    /// Drop events outside the window, keeping the order of the rest.
    pub fn apply(&self, events: Vec<Event>, now: DateTime<Utc>) -> Vec<Event> {
        events.into_iter().filter(|e| self.contains(e, now)).collect()
    }
}

/// Remove exact duplicates, keeping the first occurrence of each event.
pub fn dedup_events(events: Vec<Event>) -> Vec<Event> {
    let mut seen = HashSet::with_capacity(events.len());
    events
        .into_iter()
        .filter(|event| seen.insert(event.clone()))
        .collect()
}

/// Sort events chronologically; ties are broken by end and then title.
pub fn sort_events(events: &mut [Event]) {
    events.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then_with(|| a.end.cmp(&b.end))
            .then_with(|| a.title.cmp(&b.title))
    });
}
