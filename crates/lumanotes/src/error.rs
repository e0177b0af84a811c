use crate::model::NoteId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotesError {
    #[error("Note not found: {0}")]
    NoteNotFound(NoteId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),

    /// A batch that the store could not apply atomically stopped part way.
    /// The keys it touched may now be duplicated across namespaces.
    #[error("Partial write: {applied} of {total} operations applied ({reason})")]
    PartialWrite {
        applied: usize,
        total: usize,
        reason: String,
    },

    #[error("Config error: {0}")]
    Config(#[from] confique::Error),
}

impl NotesError {
    /// True for failures of the underlying key-value service, as opposed to
    /// lookups that found nothing.
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            NotesError::Io(_)
                | NotesError::Serialization(_)
                | NotesError::Store(_)
                | NotesError::PartialWrite { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, NotesError>;
