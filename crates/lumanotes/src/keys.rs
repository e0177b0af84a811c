//! # Key Namespace Builder
//!
//! Every note field is stored under a key built from its lifecycle state, its
//! field name and its id:
//!
//! ```text
//! "{prefix}{field}_{id}"    prefix ∈ {"", "pinned_", "trash_"}
//!                           field  ∈ {"note", "title", "date"}
//! ```
//!
//! This layout is shared with data written by earlier releases and must not
//! change. [`NoteKey`] is the only place the format is spelled out; the
//! repository never concatenates key strings itself.
//!
//! Earlier releases kept a trashed note's body at `trash_{id}` instead of
//! `trash_note_{id}`. [`NoteKey::legacy_trash_body`] names that key; it is
//! read as a fallback and removed whenever the trashed note is moved, purged
//! or repaired.

use crate::model::{LifecycleState, NoteField, NoteId};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NoteKey {
    pub state: LifecycleState,
    pub field: NoteField,
    pub id: NoteId,
}

impl NoteKey {
    pub fn new(state: LifecycleState, field: NoteField, id: &NoteId) -> Self {
        Self {
            state,
            field,
            id: id.clone(),
        }
    }

    /// The content, title and date keys of `id` under one namespace.
    pub fn triple(state: LifecycleState, id: &NoteId) -> [NoteKey; 3] {
        NoteField::ALL.map(|field| NoteKey::new(state, field, id))
    }

    /// Where earlier releases kept a trashed note's body.
    pub fn legacy_trash_body(id: &NoteId) -> String {
        format!("{}{}", LifecycleState::Trashed.prefix(), id)
    }

    /// Id of a legacy `trash_{id}` body key. Only meaningful for keys that
    /// [`parse`](Self::parse) rejected.
    fn parse_legacy_trash_body(raw: &str) -> Option<NoteId> {
        let id = raw.strip_prefix(LifecycleState::Trashed.prefix())?;
        if id.is_empty() {
            return None;
        }
        Some(NoteId::from(id))
    }

    /// Inverse of `to_string`. Keys outside the note namespace yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        for state in [LifecycleState::Pinned, LifecycleState::Trashed] {
            if let Some(rest) = raw.strip_prefix(state.prefix()) {
                if let Some(key) = Self::parse_field(state, rest) {
                    return Some(key);
                }
            }
        }
        Self::parse_field(LifecycleState::Active, raw)
    }

    fn parse_field(state: LifecycleState, rest: &str) -> Option<Self> {
        NoteField::ALL.into_iter().find_map(|field| {
            let id = rest.strip_prefix(field.as_str())?.strip_prefix('_')?;
            if id.is_empty() {
                return None;
            }
            Some(NoteKey {
                state,
                field,
                id: NoteId::from(id),
            })
        })
    }
}

impl fmt::Display for NoteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}_{}",
            self.state.prefix(),
            self.field.as_str(),
            self.id
        )
    }
}

/// Which fields of which notes exist under which namespace, from one
/// `list_keys` pass. Keys outside the note namespace are skipped.
#[derive(Debug, Default)]
pub struct KeyScan {
    notes: BTreeMap<NoteId, HashMap<LifecycleState, Vec<NoteField>>>,
    legacy_bodies: BTreeSet<NoteId>,
}

impl KeyScan {
    pub fn from_keys<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let mut scan = KeyScan::default();
        for raw in keys {
            if let Some(key) = NoteKey::parse(raw.as_ref()) {
                scan.notes
                    .entry(key.id)
                    .or_default()
                    .entry(key.state)
                    .or_default()
                    .push(key.field);
            } else if let Some(id) = NoteKey::parse_legacy_trash_body(raw.as_ref()) {
                // Counts as a trashed note even when no other field is left.
                scan.notes
                    .entry(id.clone())
                    .or_default()
                    .entry(LifecycleState::Trashed)
                    .or_default();
                scan.legacy_bodies.insert(id);
            }
        }
        scan
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Ids with at least one field under `state`, in id order.
    pub fn ids_in(&self, state: LifecycleState) -> Vec<NoteId> {
        self.notes
            .iter()
            .filter(|(_, states)| states.contains_key(&state))
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Every namespace holding a field of `id`, most authoritative first.
    pub fn states_of(&self, id: &NoteId) -> Vec<LifecycleState> {
        match self.notes.get(id) {
            Some(states) => LifecycleState::PRECEDENCE
                .into_iter()
                .filter(|s| states.contains_key(s))
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn resolve(&self, id: &NoteId) -> Option<LifecycleState> {
        self.states_of(id).into_iter().next()
    }

    pub fn resolved(&self) -> HashMap<NoteId, LifecycleState> {
        self.notes
            .keys()
            .filter_map(|id| self.resolve(id).map(|state| (id.clone(), state)))
            .collect()
    }

    /// Ids whose fields are spread over more than one namespace.
    pub fn duplicated(&self) -> Vec<NoteId> {
        self.notes
            .iter()
            .filter(|(_, states)| states.len() > 1)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Namespaces holding only part of a note's triple.
    pub fn incomplete(&self) -> Vec<(NoteId, LifecycleState)> {
        let mut found = Vec::new();
        for (id, states) in &self.notes {
            for state in LifecycleState::PRECEDENCE {
                if let Some(fields) = states.get(&state) {
                    if NoteField::ALL.iter().any(|f| !fields.contains(f)) {
                        found.push((id.clone(), state));
                    }
                }
            }
        }
        found
    }

    /// Whether `key` was among the scanned keys.
    pub fn contains(&self, key: &NoteKey) -> bool {
        self.notes
            .get(&key.id)
            .and_then(|states| states.get(&key.state))
            .is_some_and(|fields| fields.contains(&key.field))
    }

    /// Ids with a body under the legacy `trash_{id}` key.
    pub fn legacy_bodies(&self) -> Vec<NoteId> {
        self.legacy_bodies.iter().cloned().collect()
    }

    pub fn has_legacy_body(&self, id: &NoteId) -> bool {
        self.legacy_bodies.contains(id)
    }

    /// All keys present under `state`.
    pub fn keys_in(&self, state: LifecycleState) -> Vec<NoteKey> {
        self.notes
            .iter()
            .filter_map(|(id, states)| states.get(&state).map(|fields| (id, fields)))
            .flat_map(|(id, fields)| fields.iter().map(move |f| NoteKey::new(state, *f, id)))
            .collect()
    }
}
