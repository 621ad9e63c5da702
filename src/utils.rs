//! Utility helpers shared across the WASM frontend.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};
use unicode_segmentation::UnicodeSegmentation;

/// Escape the characters that would otherwise open markup.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Cut `text` to at most `max` user-perceived characters, appending `…`
/// when something was dropped.
pub fn truncate_graphemes(text: &str, max: usize) -> String {
    let mut graphemes = text.graphemes(true);
    let head: String = graphemes.by_ref().take(max).collect();
    if graphemes.next().is_some() {
        format!("{}…", head.trim_end())
    } else {
        head
    }
}

/// Number of user-perceived characters (used by the form length limits).
pub fn grapheme_len(text: &str) -> usize {
    text.graphemes(true).count()
}

/// `HH:MM` in the browser's local time zone.
pub fn clock_label(now: DateTime<Local>) -> String {
    now.format("%H:%M").to_string()
}

pub fn now_clock_label() -> String {
    clock_label(Local::now())
}

/// Backend timestamps come as RFC 3339, as a naive `YYYY-MM-DD HH:MM:SS`
/// (UTC) or as a bare `YYYY-MM-DD` date, read as midnight UTC.
pub fn parse_backend_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

/// Short Spanish relative date ("hace 3 días").  Falls back to the raw
/// string when it cannot be parsed.
pub fn relative_date(raw: &str, now: DateTime<Utc>) -> String {
    let Some(then) = parse_backend_timestamp(raw) else {
        return raw.to_string();
    };
    let delta = now.signed_duration_since(then);
    let minutes = delta.num_minutes();
    let hours = delta.num_hours();
    let days = delta.num_days();

    if minutes < 1 {
        "hace un momento".to_string()
    } else if minutes < 60 {
        plural("hace", minutes, "minuto", "minutos")
    } else if hours < 24 {
        plural("hace", hours, "hora", "horas")
    } else if days < 30 {
        plural("hace", days, "día", "días")
    } else {
        then.format("%d/%m/%Y").to_string()
    }
}

fn plural(prefix: &str, n: i64, one: &str, many: &str) -> String {
    format!("{} {} {}", prefix, n, if n == 1 { one } else { many })
}
