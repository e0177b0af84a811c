//! # Storage Layer
//!
//! Notes are persisted in a plain string key-value service. The [`KvStore`]
//! trait is that service's contract: `get`, `set`, `remove`, `list_keys`,
//! `clear`, plus [`KvStore::apply`] for multi-key changes.
//!
//! ## Why Batches
//!
//! Moving a note between lifecycle states touches six keys: three writes
//! under the destination namespace and three removals under the source. If
//! the process dies half way, the note's fields end up split across two
//! namespaces. A [`WriteBatch`] groups those operations so that:
//!
//! - Stores that can commit in one step (both stores in this crate) apply
//!   the whole batch or nothing.
//! - Stores that cannot fall back to the trait's default `apply`, which runs
//!   every `Set` before any `Remove`. An interruption then leaves a
//!   duplicate rather than a loss, and is reported as
//!   [`NotesError::PartialWrite`].
//!
//! ## Implementations
//!
//! - [`memory::MemoryStore`]: in-process map, for tests and ephemeral use.
//!   Supports failure injection.
//! - [`file::FileStore`]: a JSON object on disk, rewritten atomically
//!   (write to a temp file, then rename) on every change.
//!
//! ## Concurrency
//!
//! Stores are single-threaded (`RefCell` inside, `&self` methods) and their
//! futures are not `Send`. Each call is awaited before the next starts; there
//! is no locking across callers.

use crate::error::{NotesError, Result};

pub mod file;
pub mod memory;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    Set { key: String, value: String },
    Remove { key: String },
}

impl BatchOp {
    pub fn key(&self) -> &str {
        match self {
            BatchOp::Set { key, .. } | BatchOp::Remove { key } => key,
        }
    }
}

/// An ordered set of writes meant to land together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl ToString, value: impl Into<String>) -> &mut Self {
        self.ops.push(BatchOp::Set {
            key: key.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn remove(&mut self, key: impl ToString) -> &mut Self {
        self.ops.push(BatchOp::Remove {
            key: key.to_string(),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }

    /// Sets first, then removes; relative order within each group is kept.
    pub fn writes_before_removes(&self) -> impl Iterator<Item = &BatchOp> {
        let sets = self.ops.iter().filter(|op| matches!(op, BatchOp::Set { .. }));
        let removes = self
            .ops
            .iter()
            .filter(|op| matches!(op, BatchOp::Remove { .. }));
        sets.chain(removes)
    }
}

/// String-keyed durable storage.
///
/// `get` returns `Ok(None)` for missing keys; `Err` is reserved for real I/O
/// failures. `remove` of a missing key is not an error.
#[allow(async_fn_in_trait)]
pub trait KvStore {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;

    async fn list_keys(&self) -> Result<Vec<String>>;

    async fn clear(&self) -> Result<()>;

    /// Apply every operation in `batch`.
    ///
    /// The default runs operations one at a time, sets before removes. It is
    /// not atomic; implementations that can commit in one step should
    /// override it.
    async fn apply(&self, batch: &WriteBatch) -> Result<()> {
        apply_sequentially(self, batch).await
    }
}

/// Non-atomic batch application: sets first, then removes, stopping at the
/// first failure.
pub async fn apply_sequentially<S: KvStore + ?Sized>(store: &S, batch: &WriteBatch) -> Result<()> {
    let total = batch.len();
    for (applied, op) in batch.writes_before_removes().enumerate() {
        let outcome = match op {
            BatchOp::Set { key, value } => store.set(key, value).await,
            BatchOp::Remove { key } => store.remove(key).await,
        };
        if let Err(err) = outcome {
            if applied == 0 {
                return Err(err);
            }
            log::error!(
                "batch stopped after {} of {} operations at {}: {}",
                applied,
                total,
                op.key(),
                err
            );
            return Err(NotesError::PartialWrite {
                applied,
                total,
                reason: err.to_string(),
            });
        }
    }
    Ok(())
}
