//! Rendering options configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schedule::WeekdayLocale;

/// Options shared by the calendar feed and listing renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Calendar name announced to feed subscribers
    pub calendar_name: String,

    /// Label of the lecturer line in event descriptions
    pub lecturer_label: String,

    /// Label of the room line in event descriptions
    pub room_label: String,

    /// Heading and `<title>` of the listing page
    pub page_title: String,

    /// Line shown under the page heading
    pub subtitle: Option<String>,

    /// Link to the calendar feed shown on the listing page
    pub feed_link: Option<String>,

    /// Text of the feed link
    pub feed_link_text: String,

    /// Language of the day headings in listings
    pub day_names: WeekdayLocale,

    /// Fixed `DTSTAMP`; the current time when unset
    pub timestamp: Option<DateTime<Utc>>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            calendar_name: "Schedule".to_string(),
            lecturer_label: "Lecturer".to_string(),
            room_label: "Room".to_string(),
            page_title: "Schedule".to_string(),
            subtitle: None,
            feed_link: None,
            feed_link_text: "Subscribe to calendar (ICS)".to_string(),
            day_names: WeekdayLocale::English,
            timestamp: None,
        }
    }
}

impl RenderOptions {
    /// Create new render options.
    pub fn new() -> Self {
        Self::default()
    }

    /// German labels and day names.
    pub fn german() -> Self {
        Self {
            calendar_name: "Stundenplan".to_string(),
            lecturer_label: "Dozent".to_string(),
            room_label: "Raum".to_string(),
            page_title: "Stundenplan".to_string(),
            feed_link_text: "Kalender abonnieren (ICS)".to_string(),
            day_names: WeekdayLocale::German,
            ..Self::default()
        }
    }

    /// Labels and day names matching a weekday header locale.
    pub fn for_locale(locale: &WeekdayLocale) -> Self {
        match locale {
            WeekdayLocale::German => Self::german(),
            WeekdayLocale::English => Self::default(),
            WeekdayLocale::Custom(_) => Self {
                day_names: locale.clone(),
                ..Self::default()
            },
        }
    }

    /// Set the calendar name.
    pub fn with_calendar_name(mut self, name: impl Into<String>) -> Self {
        self.calendar_name = name.into();
        self
    }

    /// Set the listing page title.
    pub fn with_page_title(mut self, title: impl Into<String>) -> Self {
        self.page_title = title.into();
        self
    }

    /// Set the line under the page heading.
    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    /// Link the listing page to a calendar feed.
    pub fn with_feed_link(mut self, href: impl Into<String>) -> Self {
        self.feed_link = Some(href.into());
        self
    }

    /// Pin the `DTSTAMP` of generated feeds.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Day name for a weekday, Monday being 0.
    pub(crate) fn day_name(&self, weekday: chrono::Weekday) -> String {
        self.day_names
            .names()
            .get(weekday.num_days_from_monday() as usize)
            .map(|name| name.to_string())
            .unwrap_or_else(|| weekday.to_string())
    }
}
