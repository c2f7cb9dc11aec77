//! HTML listing page renderer.

use crate::error::Result;
use crate::model::Event;
use chrono::{Datelike, NaiveDate};

use super::listing::{group_by_day, summary_line};
use super::options::RenderOptions;

const STYLE: &str = "\
body{font-family:system-ui,-apple-system,Segoe UI,Roboto,Arial,sans-serif;margin:16px}
.day{margin:12px 0;padding:12px;border:1px solid #ddd;border-radius:12px}
.ev{padding:8px 10px;border-radius:10px;border:1px solid #eee;margin:8px 0}
.t{font-weight:600}
.sub{color:#555;font-size:0.9rem}
.hdr{display:flex;justify-content:space-between;align-items:center;margin-bottom:8px}
.badge{font-size:0.8rem;background:#f3f3f3;border-radius:999px;padding:2px 8px}";

/// Render a self-contained HTML page listing events by day.
pub fn to_html(events: &[Event], options: &RenderOptions) -> Result<String> {
    let mut out = String::new();
    let title = escape_html(&options.page_title);

    out.push_str("<!doctype html>\n");
    out.push_str("<meta charset=\"utf-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    out.push_str(&format!("<title>{}</title>\n", title));
    out.push_str(&format!("<style>\n{}\n</style>\n", STYLE));

    out.push_str("<div class=\"hdr\">\n");
    out.push_str(&format!("  <h1>{}</h1>\n", title));
    if let Some(ref href) = options.feed_link {
        out.push_str(&format!(
            "  <a class=\"badge\" href=\"{}\">{}</a>\n",
            escape_html(href),
            escape_html(&options.feed_link_text)
        ));
    }
    out.push_str("</div>\n");

    if let Some(ref subtitle) = options.subtitle {
        out.push_str(&format!("<div>{}</div>\n", escape_html(subtitle)));
    }

    for (date, items) in group_by_day(events) {
        out.push_str("<div class=\"day\">\n");
        out.push_str(&format!(
            "  <div class=\"t\">{}</div>\n",
            escape_html(&day_heading(date, options))
        ));
        for event in items {
            out.push_str("  <div class=\"ev\">\n");
            out.push_str(&format!(
                "    <div class=\"t\">{}</div>\n",
                escape_html(&event.title)
            ));
            out.push_str(&format!(
                "    <div class=\"sub\">{}</div>\n",
                escape_html(&summary_line(event))
            ));
            out.push_str("  </div>\n");
        }
        out.push_str("</div>\n");
    }

    Ok(out)
}

/// `Weekday, DD.MM.YYYY` in the configured language.
pub(crate) fn day_heading(date: NaiveDate, options: &RenderOptions) -> String {
    format!(
        "{}, {}",
        options.day_name(date.weekday()),
        date.format("%d.%m.%Y")
    )
}

/// Escape text for element content and quoted attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
