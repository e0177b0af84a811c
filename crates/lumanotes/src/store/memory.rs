use super::{apply_sequentially, BatchOp, KvStore, WriteBatch};
use crate::error::{NotesError, Result};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

/// In-memory key-value store. Does NOT persist data.
///
/// Uses `RefCell` for interior mutability; the crate is single-threaded, so
/// all trait methods can take `&self`.
///
/// Failure injection for tests:
/// - [`set_fail_writes`](Self::set_fail_writes) makes every write fail.
/// - [`fail_after`](Self::fail_after) lets `n` more key writes through, then
///   fails.
pub struct MemoryStore {
    data: RefCell<BTreeMap<String, String>>,
    atomic: bool,
    fail_writes: Cell<bool>,
    writes_left: Cell<Option<usize>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            data: RefCell::new(BTreeMap::new()),
            atomic: true,
            fail_writes: Cell::new(false),
            writes_left: Cell::new(None),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store without multi-key transactions: batches are applied one key
    /// at a time, like a bare key-value service would.
    pub fn non_atomic() -> Self {
        Self {
            atomic: false,
            ..Self::default()
        }
    }

    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let store = Self::default();
        store.data.borrow_mut().extend(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into())),
        );
        store
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    pub fn fail_after(&self, writes: usize) {
        self.writes_left.set(Some(writes));
    }

    pub fn len(&self) -> usize {
        self.data.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.borrow().is_empty()
    }

    /// Copy of the raw contents, for assertions.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.data.borrow().clone()
    }

    fn check_write(&self, count: usize) -> Result<()> {
        if self.fail_writes.get() {
            return Err(NotesError::Store("Simulated write error".to_string()));
        }
        if let Some(left) = self.writes_left.get() {
            if left < count {
                self.writes_left.set(Some(0));
                return Err(NotesError::Store("Simulated write error".to_string()));
            }
            self.writes_left.set(Some(left - count));
        }
        Ok(())
    }
}

impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.data.borrow().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.check_write(1)?;
        self.data
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.check_write(1)?;
        self.data.borrow_mut().remove(key);
        Ok(())
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        Ok(self.data.borrow().keys().cloned().collect())
    }

    async fn clear(&self) -> Result<()> {
        self.check_write(1)?;
        self.data.borrow_mut().clear();
        Ok(())
    }

    async fn apply(&self, batch: &WriteBatch) -> Result<()> {
        if !self.atomic {
            return apply_sequentially(self, batch).await;
        }

        self.check_write(batch.len())?;
        let mut data = self.data.borrow_mut();
        for op in batch.ops() {
            match op {
                BatchOp::Set { key, value } => {
                    data.insert(key.clone(), value.clone());
                }
                BatchOp::Remove { key } => {
                    data.remove(key);
                }
            }
        }
        Ok(())
    }
}
