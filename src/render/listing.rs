//! Day grouping shared by the listing renderers.

use crate::model::Event;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Events grouped by the local calendar date they start on.
///
/// Days are ascending; events within a day are sorted by start.
pub fn group_by_day(events: &[Event]) -> Vec<(NaiveDate, Vec<&Event>)> {
    let mut days: BTreeMap<NaiveDate, Vec<&Event>> = BTreeMap::new();
    for event in events {
        days.entry(event.date()).or_default().push(event);
    }

    days.into_iter()
        .map(|(date, mut items)| {
            items.sort_by_key(|e| e.start);
            (date, items)
        })
        .collect()
}

/// `HH:MM–HH:MM` in the events' own time zone.
pub fn time_range(event: &Event) -> String {
    format!(
        "{}\u{2013}{}",
        event.start.format("%H:%M"),
        event.end.format("%H:%M")
    )
}

/// Time range followed by ` | room` and ` | lecturer` when present.
pub fn summary_line(event: &Event) -> String {
    let mut line = time_range(event);
    for extra in [&event.room, &event.lecturer] {
        if !extra.is_empty() {
            line.push_str(" | ");
            line.push_str(extra);
        }
    }
    line
}
