//! # Note Repository
//!
//! The only writer of note keys. Every operation goes through the same three
//! steps:
//!
//! 1. **Resolve** the note's lifecycle state from the in-memory state index.
//! 2. **Write** one [`WriteBatch`] holding every key the operation touches,
//!    built from [`NoteKey`] so a note's three fields always move together.
//! 3. **Publish** a [`NoteEvent`] on the bus when views need to know.
//!
//! ## State Index
//!
//! Rather than probing `pinned_note_{id}`, then `note_{id}`, then
//! `trash_note_{id}` on every call, the repository scans the store's keys
//! once (on first use) and keeps `id → state` up to date as it writes. An id
//! found under several namespaces (a move that was interrupted under an older
//! release) resolves Pinned, then Active, then Trashed, and is logged;
//! [`NoteRepository::doctor`] can clean it up.
//!
//! ## Operation Map
//!
//! | Operation       | From            | To        | Event             |
//! |-----------------|-----------------|-----------|-------------------|
//! | `create`        | -               | Active    | -                 |
//! | `save`          | Active / Pinned | unchanged | `NoteSaved`       |
//! | `toggle_pin`    | Active / Pinned | the other | `PinStateChanged` |
//! | `move_to_trash` | Active / Pinned | Trashed   | -                 |
//! | `restore`       | Trashed         | Active    | -                 |
//! | `purge`         | Trashed         | ⊥         | -                 |
//! | `empty_trash`   | Trashed (all)   | ⊥         | -                 |
//!
//! ## Timestamps
//!
//! `save` always re-stamps the date. Lifecycle transitions keep it unless
//! [`RepositoryOptions::touch_on_transition`] is set.
//!
//! ## Failure Model
//!
//! Store errors surface unchanged; nothing is retried or rolled back. Calls
//! for one id complete in the order they are awaited, but two callers working
//! on the same id at once can interleave.

use crate::error::{NotesError, Result};
use crate::events::{EventBus, NoteEvent};
use crate::keys::{KeyScan, NoteKey};
use crate::model::{format_stored_date, parse_stored_date, LifecycleState, Note, NoteField, NoteId};
use crate::store::{KvStore, WriteBatch};
use crate::title::{derive_title, UNTITLED};
use chrono::Utc;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

mod doctor;
mod list;
mod pinning;
mod trash;

pub use doctor::ConsistencyReport;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepositoryOptions {
    /// Re-stamp `last_modified` on pin, trash and restore, not just on save.
    pub touch_on_transition: bool,
}

pub struct NoteRepository<S: KvStore> {
    store: S,
    bus: Rc<EventBus>,
    options: RepositoryOptions,
    index: RefCell<Option<HashMap<NoteId, LifecycleState>>>,
    last_id: RefCell<Option<NoteId>>,
}

impl<S: KvStore> NoteRepository<S> {
    pub fn new(store: S, bus: Rc<EventBus>) -> Self {
        Self {
            store,
            bus,
            options: RepositoryOptions::default(),
            index: RefCell::new(None),
            last_id: RefCell::new(None),
        }
    }

    pub fn with_options(mut self, options: RepositoryOptions) -> Self {
        self.options = options;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn bus(&self) -> &Rc<EventBus> {
        &self.bus
    }

    pub fn options(&self) -> RepositoryOptions {
        self.options
    }

    /// Create an empty Active note.
    pub async fn create(&self) -> Result<Note> {
        self.ensure_index().await?;
        let id = self.next_id();
        let state = LifecycleState::initial();
        let [content_key, title_key, date_key] = NoteKey::triple(state, &id);

        let mut batch = WriteBatch::new();
        batch
            .set(content_key, "")
            .set(title_key, UNTITLED)
            .set(date_key, id.as_str());
        self.store.apply(&batch).await?;
        self.record(&id, Some(state));

        log::info!("created note {}", id);
        let last_modified = id.created_at().unwrap_or_else(Utc::now);
        Ok(Note {
            id,
            content: String::new(),
            title: UNTITLED.to_string(),
            last_modified,
            state,
        })
    }

    /// Read an Active or Pinned note. Trashed and unknown ids are
    /// [`NotesError::NoteNotFound`].
    pub async fn load(&self, id: &NoteId) -> Result<Note> {
        log::debug!("load {}", id);
        let state = self.resolve_live(id).await?;
        let fields = self.read_fields(state, id).await?;
        if fields.is_empty() {
            self.record(id, None);
            return Err(NotesError::NoteNotFound(id.clone()));
        }
        Ok(fields.into_note(id, state))
    }

    /// Replace a live note's content. Title and date are derived here and
    /// written in the same batch; `NoteSaved` follows a successful write.
    ///
    /// Every call re-stamps the note, so callers should skip it when the
    /// content has not changed since it was loaded.
    pub async fn save(&self, id: &NoteId, content: &str) -> Result<Note> {
        log::debug!("save {} ({} bytes)", id, content.len());
        let state = self.resolve_live(id).await?;
        let title = derive_title(content);
        let now = Utc::now();
        let [content_key, title_key, date_key] = NoteKey::triple(state, id);

        let mut batch = WriteBatch::new();
        batch
            .set(content_key, content)
            .set(title_key, title.as_str())
            .set(date_key, format_stored_date(now));
        self.store.apply(&batch).await?;

        self.bus.emit(&NoteEvent::NoteSaved {
            id: id.clone(),
            title: title.clone(),
        });
        Ok(Note {
            id: id.clone(),
            content: content.to_string(),
            title,
            last_modified: now,
            state,
        })
    }

    /// Drop every key in the store, note or not, and forget the index.
    pub async fn reset(&self) -> Result<()> {
        self.store.clear().await?;
        *self.index.borrow_mut() = Some(HashMap::new());
        log::info!("store cleared");
        Ok(())
    }

    /// Current lifecycle state of `id`, or `None` if it does not exist.
    pub async fn state_of(&self, id: &NoteId) -> Result<Option<LifecycleState>> {
        self.ensure_index().await?;
        Ok(self.lookup(id))
    }

    // --- State index ---

    async fn ensure_index(&self) -> Result<()> {
        if self.index.borrow().is_some() {
            return Ok(());
        }
        let keys = self.store.list_keys().await?;
        let scan = KeyScan::from_keys(&keys);
        for id in scan.duplicated() {
            log::warn!(
                "note {} is stored under several namespaces {:?}; using {:?}",
                id,
                scan.states_of(&id),
                scan.resolve(&id)
            );
        }
        log::debug!("indexed {} notes from {} keys", scan.len(), keys.len());
        *self.index.borrow_mut() = Some(scan.resolved());
        Ok(())
    }

    fn lookup(&self, id: &NoteId) -> Option<LifecycleState> {
        self.index
            .borrow()
            .as_ref()
            .and_then(|index| index.get(id).copied())
    }

    /// Update the index after a write. `None` removes the id.
    fn record(&self, id: &NoteId, state: Option<LifecycleState>) {
        if let Some(index) = self.index.borrow_mut().as_mut() {
            match state {
                Some(state) => {
                    index.insert(id.clone(), state);
                }
                None => {
                    index.remove(id);
                }
            }
        }
    }

    async fn resolve_live(&self, id: &NoteId) -> Result<LifecycleState> {
        self.ensure_index().await?;
        match self.lookup(id) {
            Some(state) if state.is_live() => Ok(state),
            _ => Err(NotesError::NoteNotFound(id.clone())),
        }
    }

    fn next_id(&self) -> NoteId {
        let mut last = self.last_id.borrow_mut();
        let mut id = NoteId::generate(last.as_ref());
        // Never collide with a note already in the store.
        while self.lookup(&id).is_some() {
            id = NoteId::generate(Some(&id));
        }
        *last = Some(id.clone());
        id
    }

    // --- Field access ---

    async fn read_fields(&self, state: LifecycleState, id: &NoteId) -> Result<StoredFields> {
        let [content_key, title_key, date_key] = NoteKey::triple(state, id);
        let mut content = self.store.get(&content_key.to_string()).await?;
        if content.is_none() && state == LifecycleState::Trashed {
            content = self.store.get(&NoteKey::legacy_trash_body(id)).await?;
        }
        Ok(StoredFields {
            content,
            title: self.store.get(&title_key.to_string()).await?,
            date: self.store.get(&date_key.to_string()).await?,
        })
    }

    /// Batch moving `fields` from `from` to `to`, destination writes first.
    fn move_batch(
        &self,
        id: &NoteId,
        fields: &StoredFields,
        from: LifecycleState,
        to: LifecycleState,
    ) -> WriteBatch {
        let date = match (&fields.date, self.options.touch_on_transition) {
            (Some(date), false) => date.clone(),
            _ => format_stored_date(Utc::now()),
        };
        let [content_to, title_to, date_to] = NoteKey::triple(to, id);
        let mut batch = WriteBatch::new();
        batch
            .set(content_to, fields.content.clone().unwrap_or_default())
            .set(title_to, fields.title.clone().unwrap_or_else(|| UNTITLED.to_string()))
            .set(date_to, date);
        for key in NoteKey::triple(from, id) {
            batch.remove(key);
        }
        if from == LifecycleState::Trashed {
            batch.remove(NoteKey::legacy_trash_body(id));
        }
        batch
    }
}

/// Raw values of a note's three keys under one namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct StoredFields {
    pub content: Option<String>,
    pub title: Option<String>,
    pub date: Option<String>,
}

impl StoredFields {
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.title.is_none() && self.date.is_none()
    }

    pub fn get(&self, field: NoteField) -> Option<&String> {
        match field {
            NoteField::Content => self.content.as_ref(),
            NoteField::Title => self.title.as_ref(),
            NoteField::Date => self.date.as_ref(),
        }
    }

    /// Missing title reads as "Untitled"; a missing or unreadable date falls
    /// back to the id's creation time, then to now.
    pub fn into_note(self, id: &NoteId, state: LifecycleState) -> Note {
        let last_modified = self
            .date
            .as_deref()
            .and_then(parse_stored_date)
            .or_else(|| id.created_at())
            .unwrap_or_else(Utc::now);
        Note {
            id: id.clone(),
            content: self.content.unwrap_or_default(),
            title: self.title.unwrap_or_else(|| UNTITLED.to_string()),
            last_modified,
            state,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::store::memory::MemoryStore;

    pub fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    pub fn make_repo() -> NoteRepository<MemoryStore> {
        init_logging();
        NoteRepository::new(MemoryStore::new(), Rc::new(EventBus::new()))
    }

    pub fn repo_with(store: MemoryStore) -> NoteRepository<MemoryStore> {
        init_logging();
        NoteRepository::new(store, Rc::new(EventBus::new()))
    }
}
