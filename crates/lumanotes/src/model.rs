//! # Domain Model
//!
//! A [`Note`] is identified by a [`NoteId`] and carries free-form content plus
//! two derived fields: a display title and a last-modified timestamp. Where
//! the note lives is its [`LifecycleState`]:
//!
//! ```text
//! Active   -> note_{id}, title_{id}, date_{id}
//! Pinned   -> pinned_note_{id}, pinned_title_{id}, pinned_date_{id}
//! Trashed  -> trash_note_{id}, trash_title_{id}, trash_date_{id}
//! ```
//!
//! The state is a storage location, not a flag: a note's three fields always
//! live together under exactly one of these namespaces (see [`crate::keys`]).
//!
//! ## Identity
//!
//! Ids are creation timestamps rendered as RFC 3339 with millisecond
//! precision (`2024-05-01T09:30:00.123Z`). Lexicographic order on ids is
//! therefore creation order. [`NoteId::generate`] bumps past the previous id
//! when the clock has not advanced, so ids stay unique within a process.
//!
//! ## Stored Dates
//!
//! Dates are persisted as RFC 3339 strings. Older data may hold epoch
//! milliseconds instead; [`parse_stored_date`] accepts both.

use chrono::{DateTime, Duration, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    /// Issues a fresh id from the current time, strictly greater than `last`.
    pub fn generate(last: Option<&NoteId>) -> Self {
        let now = truncate_to_millis(Utc::now());
        let issued = match last.and_then(|id| parse_stored_date(id.as_str())) {
            Some(prev) if now <= prev => prev + Duration::milliseconds(1),
            _ => now,
        };
        Self(format_stored_date(issued))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The creation time encoded in the id, if it is a timestamp id.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        parse_stored_date(&self.0)
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NoteId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NoteId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for NoteId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleState {
    Active,
    Pinned,
    Trashed,
}

impl LifecycleState {
    /// Order in which namespaces are consulted when an id shows up in more
    /// than one of them.
    pub const PRECEDENCE: [LifecycleState; 3] = [
        LifecycleState::Pinned,
        LifecycleState::Active,
        LifecycleState::Trashed,
    ];

    pub fn prefix(self) -> &'static str {
        match self {
            LifecycleState::Active => "",
            LifecycleState::Pinned => "pinned_",
            LifecycleState::Trashed => "trash_",
        }
    }

    pub fn is_pinned(self) -> bool {
        self == LifecycleState::Pinned
    }

    /// Active and Pinned notes are "live": loadable, editable, listed on the
    /// main screen.
    pub fn is_live(self) -> bool {
        !matches!(self, LifecycleState::Trashed)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Active => "active",
            LifecycleState::Pinned => "pinned",
            LifecycleState::Trashed => "trashed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteField {
    Content,
    Title,
    Date,
}

impl NoteField {
    pub const ALL: [NoteField; 3] = [NoteField::Content, NoteField::Title, NoteField::Date];

    pub fn as_str(self) -> &'static str {
        match self {
            NoteField::Content => "note",
            NoteField::Title => "title",
            NoteField::Date => "date",
        }
    }
}

/// How a view should open a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Edit,
    Preview,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Note {
    pub id: NoteId,
    pub content: String,
    pub title: String,
    pub last_modified: DateTime<Utc>,
    pub state: LifecycleState,
}

impl Note {
    pub fn is_pinned(&self) -> bool {
        self.state.is_pinned()
    }

    /// Notes with something in them open in preview; blank ones open for editing.
    pub fn preferred_view_mode(&self) -> ViewMode {
        if self.content.is_empty() {
            ViewMode::Edit
        } else {
            ViewMode::Preview
        }
    }

    /// Title with markdown markers removed, for list rows.
    pub fn display_title(&self) -> String {
        crate::title::display_title(&self.title)
    }
}

pub fn format_stored_date(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_stored_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    // Legacy: epoch milliseconds
    raw.parse::<i64>()
        .ok()
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
}

fn truncate_to_millis(date: DateTime<Utc>) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(date.timestamp_millis())
        .single()
        .unwrap_or(date)
}
