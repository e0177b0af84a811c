//! Display helpers for note screens. Nothing here is persisted.

use chrono::{DateTime, Local, TimeZone, Utc};

const LABEL_FORMAT: &str = "%d/%m/%Y, %H:%M:%S";

/// `"last edited: DD/MM/YYYY, HH:MM:SS"` in the machine's local time.
pub fn last_edited_label(date: DateTime<Utc>) -> String {
    last_edited_label_in(date, &Local)
}

pub fn last_edited_label_in<Tz>(date: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!(
        "last edited: {}",
        date.with_timezone(tz).format(LABEL_FORMAT)
    )
}

/// Relative age such as `"5 minutes ago"`. Dates after `now` read as
/// `"now"`.
pub fn edited_ago(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(date);
    let formatter = timeago::Formatter::new();
    formatter.convert(elapsed.to_std().unwrap_or_default())
}

/// Word and character counts shown under the editor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextStats {
    pub words: usize,
    pub chars: usize,
}

impl TextStats {
    pub fn of(content: &str) -> Self {
        Self {
            words: content.split_whitespace().count(),
            chars: content.chars().count(),
        }
    }
}
