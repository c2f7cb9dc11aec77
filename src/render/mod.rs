//! Output rendering for schedules.
//!
//! This module provides renderers for converting events to a calendar
//! feed (iCalendar), an HTML listing page, a plain text agenda and JSON.
//!
//! # Example
//!
//! ```no_run
//! use gridcal::{parse_file, render::*, ScheduleOptions};
//!
//! let schedule = parse_file("stundenplan.xlsx", &ScheduleOptions::default())?;
//! let options = RenderOptions::german().with_feed_link("stundenplan.ics");
//!
//! // Calendar feed
//! let ics = to_ics(&schedule.events, &options)?;
//!
//! // Listing page
//! let html = to_html(&schedule.events, &options)?;
//!
//! // Everything, including the per-sheet report
//! let json = to_json(&schedule, JsonFormat::Pretty)?;
//! # Ok::<(), gridcal::Error>(())
//! ```

mod html;
mod ics;
mod json;
mod listing;
mod options;
mod text;

pub use html::{escape_html, to_html};
pub use ics::{escape_text, event_uid, to_ics};
pub use json::{to_json, to_json_default, JsonFormat};
pub use listing::{group_by_day, summary_line, time_range};
pub use options::RenderOptions;
pub use text::to_text;
