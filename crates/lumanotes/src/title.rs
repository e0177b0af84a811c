//! # Title Derivation
//!
//! Titles are never authored. They are derived from the first line of a
//! note's content every time the content is saved:
//!
//! - empty first line → [`UNTITLED`]
//! - first line longer than [`TRUNCATE_THRESHOLD`] chars → first
//!   [`TRUNCATE_AT`] chars followed by `"..."`
//! - otherwise the first line as is
//!
//! The threshold and the cut point differ: lines of 51..=80 chars keep every
//! character and still get the ellipsis, lines above 80 chars are cut to 80
//! first. Stored titles in the wild follow this rule, so it stays.
//!
//! Lengths are counted in `char`s.
//!
//! ## Display Pass
//!
//! List views run [`display_title`] on top of the stored title to hide
//! markdown markers (`# * > _`). A title made only of such markers is shown
//! unchanged rather than blanked out, and the leftover text is trimmed. This
//! pass is never persisted.

pub const UNTITLED: &str = "Untitled";
pub const TRUNCATE_THRESHOLD: usize = 50;
pub const TRUNCATE_AT: usize = 80;
pub const ELLIPSIS: &str = "...";

const MARKDOWN_MARKERS: [char; 4] = ['#', '*', '>', '_'];

/// Title persisted alongside `content`.
pub fn derive_title(content: &str) -> String {
    let first_line = content.split('\n').next().unwrap_or_default();
    if first_line.is_empty() {
        return UNTITLED.to_string();
    }

    if first_line.chars().count() > TRUNCATE_THRESHOLD {
        let mut cut: String = first_line.chars().take(TRUNCATE_AT).collect();
        cut.push_str(ELLIPSIS);
        cut
    } else {
        first_line.to_string()
    }
}

/// Title as shown in list rows.
pub fn display_title(title: &str) -> String {
    if title.chars().all(|c| MARKDOWN_MARKERS.contains(&c)) {
        return title.to_string();
    }
    let stripped: String = title
        .chars()
        .filter(|c| !MARKDOWN_MARKERS.contains(c))
        .collect();
    let trimmed = stripped.trim();
    if trimmed.is_empty() {
        // Markers plus whitespace: nothing readable would be left.
        return title.to_string();
    }
    trimmed.to_string()
}

/// Full derivation used when rendering straight from content.
pub fn sanitize_for_display(content: &str) -> String {
    display_title(&derive_title(content))
}
