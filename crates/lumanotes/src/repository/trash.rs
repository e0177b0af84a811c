use super::NoteRepository;
use crate::error::{NotesError, Result};
use crate::keys::{KeyScan, NoteKey};
use crate::lifecycle::{Outcome, Transition};
use crate::model::{LifecycleState, NoteId};
use crate::store::{KvStore, WriteBatch};
use std::collections::BTreeSet;

impl<S: KvStore> NoteRepository<S> {
    /// Move a live note to the trash. Pin state is not remembered.
    pub async fn move_to_trash(&self, id: &NoteId) -> Result<()> {
        let from = self.resolve_live(id).await?;
        let to = match from.apply(Transition::Trash) {
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
        log::info!("note {} moved to trash from {}", id, from);
        Ok(())
    }

    /// Bring a trashed note back as Active.
    ///
    /// Returns `false` without touching the store when `id` has nothing in
    /// the trash.
    pub async fn restore(&self, id: &NoteId) -> Result<bool> {
        self.ensure_index().await?;
        let from = LifecycleState::Trashed;
        let to = match self.lookup(id).and_then(|s| s.apply(Transition::Restore)) {
            Some(Outcome::Moved(to)) => to,
            _ => {
                log::debug!("restore {}: not in trash", id);
                return Ok(false);
            }
        };

        let fields = self.read_fields(from, id).await?;
        if fields.is_empty() {
            self.record(id, None);
            return Ok(false);
        }

        let batch = self.move_batch(id, &fields, from, to);
        self.store.apply(&batch).await?;
        self.record(id, Some(to));
        log::info!("note {} restored", id);
        Ok(true)
    }

    /// Permanently remove the trashed copy of `id`. Removing a note that is
    /// not in the trash is a no-op.
    pub async fn purge(&self, id: &NoteId) -> Result<()> {
        self.ensure_index().await?;
        let mut batch = WriteBatch::new();
        for key in NoteKey::triple(LifecycleState::Trashed, id) {
            batch.remove(key);
        }
        batch.remove(NoteKey::legacy_trash_body(id));
        self.store.apply(&batch).await?;

        let outcome = self.lookup(id).and_then(|s| s.apply(Transition::Purge));
        if outcome == Some(Outcome::Removed) {
            self.record(id, None);
        }
        log::info!("note {} purged", id);
        Ok(())
    }

    /// Remove every trashed note, legacy `trash_{id}` bodies included.
    /// Returns how many notes were removed.
    pub async fn empty_trash(&self) -> Result<usize> {
        self.ensure_index().await?;
        let keys = self.store.list_keys().await?;
        let scan = KeyScan::from_keys(&keys);

        let mut batch = WriteBatch::new();
        let mut purged = BTreeSet::new();
        for key in scan.keys_in(LifecycleState::Trashed) {
            purged.insert(key.id.clone());
            batch.remove(key);
        }
        for id in scan.legacy_bodies() {
            batch.remove(NoteKey::legacy_trash_body(&id));
            purged.insert(id);
        }
        if batch.is_empty() {
            return Ok(0);
        }

        self.store.apply(&batch).await?;
        for id in &purged {
            if self.lookup(id) == Some(LifecycleState::Trashed) {
                self.record(id, None);
            }
        }
        log::info!("emptied trash: {} notes, {} keys", purged.len(), batch.len());
        Ok(purged.len())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::error::NotesError;
    use crate::model::{LifecycleState, NoteId};
    use crate::store::memory::MemoryStore;
    use crate::store::KvStore;

    fn ids(notes: &[crate::model::Note]) -> Vec<NoteId> {
        notes.iter().map(|n| n.id.clone()).collect()
    }

    #[tokio::test]
    async fn trash_moves_note_out_of_live_lists() {
        let repo = make_repo();
        let note = repo.create().await.unwrap();
        repo.save(&note.id, "Bye").await.unwrap();

        repo.move_to_trash(&note.id).await.unwrap();

        assert!(repo.list_active().await.unwrap().is_empty());
        assert!(repo.list_pinned().await.unwrap().is_empty());
        let trashed = repo.list_trashed().await.unwrap();
        assert_eq!(ids(&trashed), vec![note.id.clone()]);
        assert_eq!(trashed[0].content, "Bye");
        assert_eq!(trashed[0].state, LifecycleState::Trashed);
    }

    #[tokio::test]
    async fn trashed_note_cannot_be_loaded_or_saved() {
        let repo = make_repo();
        let note = repo.create().await.unwrap();
        repo.move_to_trash(&note.id).await.unwrap();

        assert!(matches!(
            repo.load(&note.id).await,
            Err(NotesError::NoteNotFound(_))
        ));
        assert!(matches!(
            repo.save(&note.id, "x").await,
            Err(NotesError::NoteNotFound(_))
        ));
        assert!(matches!(
            repo.move_to_trash(&note.id).await,
            Err(NotesError::NoteNotFound(_))
        ));
    }

    #[tokio::test]
    async fn trash_fills_missing_title_and_date() {
        let store = MemoryStore::with_entries([("note_abc", "orphan body")]);
        let repo = repo_with(store);
        let id = NoteId::from("abc");

        repo.move_to_trash(&id).await.unwrap();

        let data = repo.store().snapshot();
        assert_eq!(data.get("trash_title_abc"), Some(&"Untitled".to_string()));
        assert!(data.contains_key("trash_date_abc"));
        assert!(!data.contains_key("note_abc"));
    }

    #[tokio::test]
    async fn restore_returns_pinned_note_as_active() {
        let repo = make_repo();
        let note = repo.create().await.unwrap();
        repo.save(&note.id, "Was pinned").await.unwrap();
        repo.toggle_pin(&note.id).await.unwrap();

        repo.move_to_trash(&note.id).await.unwrap();
        assert!(repo.restore(&note.id).await.unwrap());

        assert_eq!(ids(&repo.list_active().await.unwrap()), vec![note.id.clone()]);
        assert!(repo.list_pinned().await.unwrap().is_empty());
        assert!(repo.list_trashed().await.unwrap().is_empty());
        assert_eq!(repo.load(&note.id).await.unwrap().content, "Was pinned");
    }

    #[tokio::test]
    async fn restore_of_live_or_unknown_note_is_noop() {
        let repo = make_repo();
        let note = repo.create().await.unwrap();
        let before = repo.store().snapshot();

        assert!(!repo.restore(&note.id).await.unwrap());
        assert!(!repo.restore(&NoteId::from("ghost")).await.unwrap());
        assert_eq!(repo.store().snapshot(), before);
    }

    #[tokio::test]
    async fn purge_removes_trash_keys_entirely() {
        let repo = make_repo();
        let note = repo.create().await.unwrap();
        repo.move_to_trash(&note.id).await.unwrap();

        repo.purge(&note.id).await.unwrap();

        assert!(repo.list_trashed().await.unwrap().is_empty());
        for field in ["note", "title", "date"] {
            let key = format!("trash_{}_{}", field, note.id);
            assert_eq!(repo.store().get(&key).await.unwrap(), None);
        }
        assert_eq!(repo.state_of(&note.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn purge_leaves_live_notes_alone() {
        let repo = make_repo();
        let note = repo.create().await.unwrap();

        repo.purge(&note.id).await.unwrap();

        assert_eq!(
            repo.state_of(&note.id).await.unwrap(),
            Some(LifecycleState::Active)
        );
        assert!(repo.load(&note.id).await.is_ok());
    }

    #[tokio::test]
    async fn empty_trash_matches_purging_each_note() {
        let by_empty = make_repo();
        let by_purge = make_repo();
        for repo in [&by_empty, &by_purge] {
            for n in 0..3 {
                let note = repo.create().await.unwrap();
                repo.save(&note.id, &format!("note {n}")).await.unwrap();
                if n != 1 {
                    repo.move_to_trash(&note.id).await.unwrap();
                }
            }
        }

        assert_eq!(by_empty.empty_trash().await.unwrap(), 2);
        for note in by_purge.list_trashed().await.unwrap() {
            by_purge.purge(&note.id).await.unwrap();
        }

        assert!(by_empty.list_trashed().await.unwrap().is_empty());
        assert!(by_purge.list_trashed().await.unwrap().is_empty());
        let left_empty: Vec<String> = by_empty.store().snapshot().into_values().collect();
        let left_purge: Vec<String> = by_purge.store().snapshot().into_values().collect();
        assert_eq!(left_empty.len(), 3);
        assert_eq!(left_purge.len(), 3);
        assert!(left_empty.contains(&"note 1".to_string()));
    }

    #[tokio::test]
    async fn empty_trash_on_empty_trash_writes_nothing() {
        let repo = make_repo();
        repo.create().await.unwrap();
        repo.store().set_fail_writes(true);
        assert_eq!(repo.empty_trash().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn empty_trash_sweeps_partial_triples() {
        let store = MemoryStore::with_entries([
            ("trash_note_a", "x"),
            ("trash_date_b", "2024-01-01T00:00:00.000Z"),
            ("note_c", "live"),
        ]);
        let repo = repo_with(store);

        assert_eq!(repo.empty_trash().await.unwrap(), 2);
        assert_eq!(repo.store().list_keys().await.unwrap(), vec!["note_c"]);
    }

    fn legacy_trash_store() -> MemoryStore {
        MemoryStore::with_entries([
            ("trash_old", "kept by an earlier release"),
            ("trash_title_old", "kept by an earlier release"),
            ("trash_date_old", "2024-01-01T00:00:00.000Z"),
            ("trash_bare", "body only"),
            ("note_live", "live"),
        ])
    }

    #[tokio::test]
    async fn empty_trash_sweeps_legacy_bodies() {
        let repo = repo_with(legacy_trash_store());

        assert_eq!(repo.empty_trash().await.unwrap(), 2);
        assert_eq!(repo.store().list_keys().await.unwrap(), vec!["note_live"]);
        assert_eq!(repo.state_of(&NoteId::from("bare")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn legacy_body_is_listed_restored_and_purged() {
        let repo = repo_with(legacy_trash_store());
        let old = NoteId::from("old");

        let trashed = repo.list_trashed().await.unwrap();
        // `bare` has no date, so it sorts as the newest.
        assert_eq!(ids(&trashed), vec![NoteId::from("bare"), old.clone()]);
        assert_eq!(trashed[0].content, "body only");
        assert_eq!(trashed[1].content, "kept by an earlier release");

        assert!(repo.restore(&old).await.unwrap());
        assert_eq!(repo.load(&old).await.unwrap().content, "kept by an earlier release");
        assert_eq!(repo.store().get("trash_old").await.unwrap(), None);

        repo.purge(&NoteId::from("bare")).await.unwrap();
        assert_eq!(repo.store().get("trash_bare").await.unwrap(), None);
        assert!(repo.list_trashed().await.unwrap().is_empty());
    }
}
