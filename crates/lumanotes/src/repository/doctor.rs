use super::NoteRepository;
use crate::error::Result;
use crate::keys::{KeyScan, NoteKey};
use crate::model::{format_stored_date, LifecycleState, NoteField, NoteId};
use crate::store::{KvStore, WriteBatch};
use crate::title::derive_title;
use chrono::Utc;
use std::collections::BTreeSet;

/// What [`NoteRepository::doctor`] found, and fixed when asked to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsistencyReport {
    /// Notes with fields under more than one namespace.
    pub duplicated: Vec<NoteId>,
    /// Namespaces holding only part of a note's triple.
    pub incomplete: Vec<(NoteId, LifecycleState)>,
    /// Trashed notes whose body still sits under the legacy `trash_{id}` key.
    pub legacy_bodies: Vec<NoteId>,
    /// Notes rewritten by the repair pass.
    pub repaired: usize,
}

impl ConsistencyReport {
    pub fn is_clean(&self) -> bool {
        self.duplicated.is_empty() && self.incomplete.is_empty() && self.legacy_bodies.is_empty()
    }
}

impl<S: KvStore> NoteRepository<S> {
    /// Scan the store for notes left behind by interrupted moves.
    ///
    /// With `repair`, each affected note keeps the namespace it resolves to
    /// (Pinned, then Active, then Trashed): copies elsewhere are removed and
    /// missing fields are filled in. A legacy `trash_{id}` body is moved to
    /// `trash_note_{id}` when the trashed copy is kept and dropped otherwise.
    /// Each note is fixed in its own batch.
    pub async fn doctor(&self, repair: bool) -> Result<ConsistencyReport> {
        self.ensure_index().await?;
        let keys = self.store.list_keys().await?;
        let scan = KeyScan::from_keys(&keys);

        let mut report = ConsistencyReport {
            duplicated: scan.duplicated(),
            incomplete: scan.incomplete(),
            legacy_bodies: scan.legacy_bodies(),
            repaired: 0,
        };
        for id in &report.duplicated {
            log::warn!("note {} found under {:?}", id, scan.states_of(id));
        }
        for (id, state) in &report.incomplete {
            log::warn!("note {} is incomplete under {}", id, state);
        }
        for id in &report.legacy_bodies {
            log::warn!("note {} has a legacy trash body", id);
        }
        if !repair || report.is_clean() {
            return Ok(report);
        }

        let affected: BTreeSet<NoteId> = report
            .duplicated
            .iter()
            .cloned()
            .chain(report.incomplete.iter().map(|(id, _)| id.clone()))
            .chain(report.legacy_bodies.iter().cloned())
            .collect();

        for id in affected {
            let Some(keep) = scan.resolve(&id) else {
                continue;
            };
            let batch = self.repair_batch(&scan, &id, keep).await?;
            if batch.is_empty() {
                continue;
            }
            self.store.apply(&batch).await?;
            self.record(&id, Some(keep));
            report.repaired += 1;
            log::info!("repaired note {} as {}", id, keep);
        }
        Ok(report)
    }

    async fn repair_batch(
        &self,
        scan: &KeyScan,
        id: &NoteId,
        keep: LifecycleState,
    ) -> Result<WriteBatch> {
        let mut batch = WriteBatch::new();
        let others: Vec<LifecycleState> = scan
            .states_of(id)
            .into_iter()
            .filter(|state| *state != keep)
            .collect();

        // Trashed reads already fall back to the legacy body.
        let present = self.read_fields(keep, id).await?;
        let missing: Vec<NoteKey> = NoteKey::triple(keep, id)
            .into_iter()
            .filter(|key| !scan.contains(key))
            .collect();
        if !missing.is_empty() {
            // Content and date may come from another copy; the title always
            // follows the content that is kept.
            let mut fields = present;
            for state in &others {
                let copy = self.read_fields(*state, id).await?;
                fields.content = fields.content.or(copy.content);
                fields.date = fields.date.or(copy.date);
            }
            let content = fields.content.clone().unwrap_or_default();
            for key in missing {
                let value = match (key.field, fields.get(key.field)) {
                    (_, Some(value)) => value.clone(),
                    (NoteField::Content, None) => String::new(),
                    (NoteField::Title, None) => derive_title(&content),
                    (NoteField::Date, None) => format_stored_date(Utc::now()),
                };
                batch.set(key, value);
            }
        }

        for state in others {
            for key in NoteKey::triple(state, id) {
                batch.remove(key);
            }
        }
        if scan.has_legacy_body(id) {
            batch.remove(NoteKey::legacy_trash_body(id));
        }
        Ok(batch)
    }
}
