use crate::model::Note;

/// Notes whose title or content contains `query`, ignoring case.
///
/// A linear scan in input order; an empty query returns every note. The
/// input is left untouched and the matches are cloned out.
pub fn filter_notes(notes: &[Note], query: &str) -> Vec<Note> {
    if query.is_empty() {
        return notes.to_vec();
    }
    let needle = query.to_lowercase();
    notes
        .iter()
        .filter(|note| matches(note, &needle))
        .cloned()
        .collect()
}

/// Borrowing variant of [`filter_notes`] for views that keep their own copy.
pub fn filter_refs<'a>(notes: &'a [Note], query: &str) -> Vec<&'a Note> {
    let needle = query.to_lowercase();
    notes
        .iter()
        .filter(|note| needle.is_empty() || matches(note, &needle))
        .collect()
}

fn matches(note: &Note, needle: &str) -> bool {
    note.title.to_lowercase().contains(needle) || note.content.to_lowercase().contains(needle)
}
