//! Schedule extraction options.

use crate::error::{Error, Result};
use chrono::Duration;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use super::filter::RetentionWindow;

/// Largest grace period accepted, one day.
pub const MAX_GRACE_MINUTES: i64 = 24 * 60;

const GERMAN_WEEKDAYS: [&str; 7] = [
    "Montag",
    "Dienstag",
    "Mittwoch",
    "Donnerstag",
    "Freitag",
    "Samstag",
    "Sonntag",
];

const ENGLISH_WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Language of the weekday headers printed above each day column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekdayLocale {
    /// Montag .. Sonntag
    #[default]
    German,
    /// Monday .. Sunday
    English,
    /// Any other set of names, Monday first.
    Custom(Vec<String>),
}

impl WeekdayLocale {
    /// Weekday names, Monday first.
    pub fn names(&self) -> Vec<&str> {
        match self {
            WeekdayLocale::German => GERMAN_WEEKDAYS.to_vec(),
            WeekdayLocale::English => ENGLISH_WEEKDAYS.to_vec(),
            WeekdayLocale::Custom(names) => names.iter().map(String::as_str).collect(),
        }
    }

    /// Whether `text` is exactly one of the weekday names, ignoring case,
    /// surrounding whitespace and Unicode composition differences.
    pub fn matches(&self, text: &str) -> bool {
        let needle = fold(text.trim());
        if needle.is_empty() {
            return false;
        }
        self.names().iter().any(|name| fold(name) == needle)
    }

    /// Parse a locale name as used on the command line.
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "de" | "german" | "deutsch" => Ok(WeekdayLocale::German),
            "en" | "english" => Ok(WeekdayLocale::English),
            other => Err(Error::Config(format!("unknown weekday locale '{}'", other))),
        }
    }
}

fn fold(s: &str) -> String {
    s.nfc().collect::<String>().to_lowercase()
}

/// Where a merged run of cells ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotEnd {
    /// At the last row's own time label.
    #[default]
    LastLabel,
    /// At the end of the last row's slot: the time label of the row that
    /// terminated the run, falling back to the last row's own label when
    /// no later label follows.
    NextSlot,
}

/// Thresholds used to discover the grid structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorOptions {
    /// Number of leading columns considered for the time axis
    pub time_scan_columns: usize,
    /// Number of leading rows sampled per candidate time column
    pub time_scan_rows: usize,
    /// A time column needs strictly more parseable cells than this
    pub min_time_cells: usize,
    /// Number of leading rows searched for weekday headers
    pub header_scan_rows: usize,
    /// How many rows below a weekday header a date may appear
    pub date_lookahead: usize,
    /// Rows inspected (including the candidate) when confirming the grid start
    pub grid_probe_rows: usize,
    /// Parseable time cells required within the probe window
    pub grid_min_times: usize,
}

impl Default for LocatorOptions {
    fn default() -> Self {
        Self {
            time_scan_columns: 5,
            time_scan_rows: 200,
            min_time_cells: 5,
            header_scan_rows: 30,
            date_lookahead: 4,
            grid_probe_rows: 10,
            grid_min_times: 3,
        }
    }
}

/// Options for turning a workbook into events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleOptions {
    /// Time zone the printed times are in
    pub timezone: Tz,

    /// Language of the weekday headers
    pub locale: WeekdayLocale,

    /// Structure discovery thresholds
    pub locator: LocatorOptions,

    /// How the end of a run is determined
    pub slot_end: SlotEnd,

    /// Minutes added to the end of every event
    pub grace_minutes: i64,

    /// Cell texts that mean "no value" (compared case-insensitively)
    pub placeholders: Vec<String>,

    /// Keep only events near "now"; `None` keeps everything
    pub retention: Option<RetentionWindow>,
}

impl Default for ScheduleOptions {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::Europe::Vienna,
            locale: WeekdayLocale::German,
            locator: LocatorOptions::default(),
            slot_end: SlotEnd::LastLabel,
            grace_minutes: 5,
            placeholders: vec!["nan".to_string()],
            retention: Some(RetentionWindow::default()),
        }
    }
}

impl ScheduleOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options from JSON; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Check numeric settings that come from outside, such as the grace
    /// period and the retention window.
    pub fn validate(&self) -> Result<()> {
        if !(0..=MAX_GRACE_MINUTES).contains(&self.grace_minutes) {
            return Err(Error::Config(format!(
                "grace_minutes must be between 0 and {}, got {}",
                MAX_GRACE_MINUTES, self.grace_minutes
            )));
        }
        match self.retention {
            Some(ref window) => window.validate(),
            None => Ok(()),
        }
    }

    /// Set the time zone.
    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// Set the time zone by IANA name, e.g. `Europe/Vienna`.
    pub fn with_timezone_name(self, name: &str) -> Result<Self> {
        let tz = name
            .parse::<Tz>()
            .map_err(|_| Error::Config(format!("unknown time zone '{}'", name)))?;
        Ok(self.with_timezone(tz))
    }

    /// Set the weekday header language.
    pub fn with_locale(mut self, locale: WeekdayLocale) -> Self {
        self.locale = locale;
        self
    }

    /// Set the locator thresholds.
    pub fn with_locator(mut self, locator: LocatorOptions) -> Self {
        self.locator = locator;
        self
    }

    /// Set how runs end.
    pub fn with_slot_end(mut self, slot_end: SlotEnd) -> Self {
        self.slot_end = slot_end;
        self
    }

    /// Set the grace period added to event ends.
    pub fn with_grace_minutes(mut self, minutes: i64) -> Self {
        self.grace_minutes = minutes.clamp(0, MAX_GRACE_MINUTES);
        self
    }

    /// Add a "no value" placeholder text.
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholders.push(placeholder.into());
        self
    }

    /// Set the retention window.
    pub fn with_retention(mut self, window: RetentionWindow) -> Self {
        self.retention = Some(window);
        self
    }

    /// Keep all events regardless of date.
    pub fn without_retention(mut self) -> Self {
        self.retention = None;
        self
    }

    /// Grace period as a duration, `None` if it does not fit one.
    pub fn grace(&self) -> Option<Duration> {
        Duration::try_minutes(self.grace_minutes)
    }

    /// Whether trimmed cell text counts as "no value".
    pub fn is_placeholder(&self, text: &str) -> bool {
        text.is_empty() || self.placeholders.iter().any(|p| p.eq_ignore_ascii_case(text))
    }
}
