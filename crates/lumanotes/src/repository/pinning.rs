use super::NoteRepository;
use crate::error::{NotesError, Result};
use crate::events::NoteEvent;
use crate::lifecycle::{Outcome, Transition};
use crate::model::NoteId;
use crate::store::KvStore;

impl<S: KvStore> NoteRepository<S> {
    /// Move a live note between Active and Pinned, carrying all three
    /// fields in one batch. Returns the new pin state.
    pub async fn toggle_pin(&self, id: &NoteId) -> Result<bool> {
        let from = self.resolve_live(id).await?;
        let to = match from.apply(Transition::TogglePin) {
            Some(Outcome::Moved(to)) => to,
            _ => return Err(NotesError::NoteNotFound(id.clone())),
        };

        let fields = self.read_fields(from, id).await?;
        if fields.is_empty() {
            self.record(id, None);
            return Err(NotesError::NoteNotFound(id.clone()));
        }

        let batch = self.move_batch(id, &fields, from, to);
        self.store.apply(&batch).await?;
        self.record(id, Some(to));

        let is_pinned = to.is_pinned();
        log::info!("note {} {}", id, if is_pinned { "pinned" } else { "unpinned" });
        self.bus.emit(&NoteEvent::PinStateChanged {
            id: id.clone(),
            is_pinned,
        });
        Ok(is_pinned)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::RepositoryOptions;
    use crate::error::NotesError;
    use crate::events::{EventKind, NoteEvent};
    use crate::model::{LifecycleState, NoteId};
    use crate::store::memory::MemoryStore;
    use crate::store::KvStore;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[tokio::test]
    async fn pinning_moves_all_three_keys() {
        let repo = make_repo();
        let note = repo.create().await.unwrap();
        repo.save(&note.id, "Pin me\nbody").await.unwrap();

        assert!(repo.toggle_pin(&note.id).await.unwrap());

        let data = repo.store().snapshot();
        for field in ["note", "title", "date"] {
            assert!(!data.contains_key(&format!("{}_{}", field, note.id)));
            assert!(data.contains_key(&format!("pinned_{}_{}", field, note.id)));
        }
        let loaded = repo.load(&note.id).await.unwrap();
        assert_eq!(loaded.state, LifecycleState::Pinned);
        assert_eq!(loaded.content, "Pin me\nbody");
    }

    #[tokio::test]
    async fn toggle_twice_restores_state_and_fields() {
        let repo = make_repo();
        let note = repo.create().await.unwrap();
        repo.save(&note.id, "Stable\ncontent").await.unwrap();
        let before = repo.load(&note.id).await.unwrap();

        assert!(repo.toggle_pin(&note.id).await.unwrap());
        assert!(!repo.toggle_pin(&note.id).await.unwrap());

        let after = repo.load(&note.id).await.unwrap();
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn pin_keeps_timestamp_by_default() {
        let repo = make_repo();
        let note = repo.create().await.unwrap();
        let saved = repo.save(&note.id, "x").await.unwrap();

        repo.toggle_pin(&note.id).await.unwrap();
        let loaded = repo.load(&note.id).await.unwrap();
        assert_eq!(
            loaded.last_modified.timestamp_millis(),
            saved.last_modified.timestamp_millis()
        );
    }

    #[tokio::test]
    async fn pin_touches_timestamp_when_configured() {
        let store = MemoryStore::new();
        store
            .set("note_2000-01-01T00:00:00.000Z", "old")
            .await
            .unwrap();
        store
            .set("title_2000-01-01T00:00:00.000Z", "old")
            .await
            .unwrap();
        store
            .set("date_2000-01-01T00:00:00.000Z", "2000-01-01T00:00:00.000Z")
            .await
            .unwrap();
        let repo = repo_with(store).with_options(RepositoryOptions {
            touch_on_transition: true,
        });
        let id = NoteId::from("2000-01-01T00:00:00.000Z");

        repo.toggle_pin(&id).await.unwrap();
        let loaded = repo.load(&id).await.unwrap();
        assert!(loaded.last_modified.timestamp() > 946_684_800);
    }

    #[tokio::test]
    async fn toggle_publishes_new_pin_state() {
        let repo = make_repo();
        let note = repo.create().await.unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        repo.bus().subscribe(EventKind::PinStateChanged, move |e| {
            sink.borrow_mut().push(e.clone())
        });

        repo.toggle_pin(&note.id).await.unwrap();
        repo.toggle_pin(&note.id).await.unwrap();

        assert_eq!(
            *seen.borrow(),
            vec![
                NoteEvent::PinStateChanged {
                    id: note.id.clone(),
                    is_pinned: true
                },
                NoteEvent::PinStateChanged {
                    id: note.id.clone(),
                    is_pinned: false
                },
            ]
        );
    }

    #[tokio::test]
    async fn toggle_of_trashed_note_is_not_found() {
        let repo = make_repo();
        let note = repo.create().await.unwrap();
        repo.move_to_trash(&note.id).await.unwrap();

        let err = repo.toggle_pin(&note.id).await.unwrap_err();
        assert!(matches!(err, NotesError::NoteNotFound(_)));
    }

    #[tokio::test]
    async fn failed_toggle_leaves_note_in_place() {
        let repo = make_repo();
        let note = repo.create().await.unwrap();
        repo.save(&note.id, "keep").await.unwrap();

        repo.store().fail_after(2);
        assert!(repo.toggle_pin(&note.id).await.is_err());
        repo.store().fail_after(usize::MAX);

        let loaded = repo.load(&note.id).await.unwrap();
        assert_eq!(loaded.state, LifecycleState::Active);
        assert_eq!(loaded.content, "keep");
    }

    #[tokio::test]
    async fn interrupted_toggle_on_plain_store_duplicates_instead_of_losing() {
        let repo = repo_with(MemoryStore::non_atomic());
        let note = repo.create().await.unwrap();
        repo.save(&note.id, "precious").await.unwrap();

        // Three destination writes succeed, the first source removal fails.
        repo.store().fail_after(3);
        let err = repo.toggle_pin(&note.id).await.unwrap_err();
        assert!(matches!(err, NotesError::PartialWrite { applied: 3, .. }));

        let data = repo.store().snapshot();
        assert_eq!(
            data.get(&format!("note_{}", note.id)),
            Some(&"precious".to_string())
        );
        assert_eq!(
            data.get(&format!("pinned_note_{}", note.id)),
            Some(&"precious".to_string())
        );
    }
}
