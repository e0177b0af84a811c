use super::NoteRepository;
use crate::error::Result;
use crate::keys::KeyScan;
use crate::model::{LifecycleState, Note, NoteId};
use crate::store::KvStore;

impl<S: KvStore> NoteRepository<S> {
    /// Active notes, most recently modified first.
    pub async fn list_active(&self) -> Result<Vec<Note>> {
        self.list(LifecycleState::Active).await
    }

    /// Pinned notes, most recently modified first.
    pub async fn list_pinned(&self) -> Result<Vec<Note>> {
        self.list(LifecycleState::Pinned).await
    }

    /// Trashed notes, most recently modified first.
    pub async fn list_trashed(&self) -> Result<Vec<Note>> {
        self.list(LifecycleState::Trashed).await
    }

    /// Every note with a field under `state`'s namespace. A note stored under
    /// several namespaces shows up only in the one it resolves to.
    ///
    /// The listing comes from a fresh key scan, never from the index; the
    /// index entries it observes are overwritten with what the scan found.
    async fn list(&self, state: LifecycleState) -> Result<Vec<Note>> {
        self.ensure_index().await?;
        let keys = self.store.list_keys().await?;
        let scan = KeyScan::from_keys(&keys);

        let mut notes = Vec::new();
        for id in scan.ids_in(state) {
            let resolved = scan.resolve(&id);
            if resolved != Some(state) {
                self.record(&id, resolved);
                continue;
            }
            let fields = self.read_fields(state, &id).await?;
            if fields.is_empty() {
                continue;
            }
            self.record(&id, Some(state));
            notes.push(fields.into_note(&id, state));
        }
        self.forget_moved(&scan, state);

        notes.sort_by(|a, b| {
            b.last_modified
                .cmp(&a.last_modified)
                .then_with(|| b.id.cmp(&a.id))
        });
        log::debug!("listed {} {} notes", notes.len(), state);
        Ok(notes)
    }

    /// Re-resolve index entries for `state` that the scan no longer places
    /// there.
    fn forget_moved(&self, scan: &KeyScan, state: LifecycleState) {
        let indexed: Vec<NoteId> = match self.index.borrow().as_ref() {
            Some(index) => index
                .iter()
                .filter(|(_, s)| **s == state)
                .map(|(id, _)| id.clone())
                .collect(),
            None => return,
        };
        for id in indexed {
            let found = scan.resolve(&id);
            if found != Some(state) {
                log::debug!("note {} left {} behind the repository", id, state);
                self.record(&id, found);
            }
        }
    }
}
