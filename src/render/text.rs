//! Plain text agenda renderer.

use crate::error::Result;
use crate::model::Event;
use unicode_width::UnicodeWidthStr;

use super::html::day_heading;
use super::listing::{group_by_day, time_range};
use super::options::RenderOptions;

/// Render events as a terminal agenda, one block per day.
///
/// Titles are padded to a common display width so room and lecturer line
/// up, also for wide characters.
pub fn to_text(events: &[Event], options: &RenderOptions) -> Result<String> {
    let title_width = events
        .iter()
        .map(|e| UnicodeWidthStr::width(e.title.as_str()))
        .max()
        .unwrap_or(0);

    let mut output = String::new();
    for (i, (date, items)) in group_by_day(events).into_iter().enumerate() {
        if i > 0 {
            output.push('\n');
        }
        output.push_str(&day_heading(date, options));
        output.push('\n');

        for event in items {
            let mut line = format!("  {}  {}", time_range(event), event.title);
            let extras: Vec<&str> = [event.room.as_str(), event.lecturer.as_str()]
                .into_iter()
                .filter(|s| !s.is_empty())
                .collect();
            if !extras.is_empty() {
                let pad = title_width - UnicodeWidthStr::width(event.title.as_str());
                line.push_str(&" ".repeat(pad + 2));
                line.push_str(&extras.join("  "));
            }
            output.push_str(line.trim_end());
            output.push('\n');
        }
    }

    Ok(output)
}
