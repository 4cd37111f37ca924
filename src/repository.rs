/// Record persistence
///
/// Pages keep their records in a string key/value store, one JSON array per
/// collection. `LocalStore` is the in-memory store; `StoreRepository` reads
/// and writes one collection in it.

use crate::error::{Error, Result};
use crate::record::Record;
use crate::table::Table;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Loads and saves a whole collection at once
pub trait RecordRepository {
    /// Stored records, or `None` if nothing has been stored yet
    fn load(&self) -> Result<Option<Vec<Record>>>;

    fn save(&self, records: &[Record]) -> Result<()>;
}

/// Shared string key/value store. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct LocalStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl LocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_item(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    pub fn set_item(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.borrow_mut().insert(key.into(), value.into());
    }

    pub fn remove_item(&self, key: &str) -> Option<String> {
        self.entries.borrow_mut().remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

/// One collection stored as a JSON array under `key`
#[derive(Debug, Clone)]
pub struct StoreRepository {
    store: LocalStore,
    key: String,
}

impl StoreRepository {
    pub fn new(store: LocalStore, key: impl Into<String>) -> Self {
        StoreRepository { store, key: key.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Write the current contents of `table`
    pub fn save_table(&self, table: &Table) -> Result<()> {
        self.save(table.records())
    }
}

impl RecordRepository for StoreRepository {
    fn load(&self) -> Result<Option<Vec<Record>>> {
        match self.store.get_item(&self.key) {
            Some(json) => {
                let records: Vec<Record> = serde_json::from_str(&json)
                    .map_err(|e| Error::Repository(format!("'{}' holds malformed data: {}", self.key, e)))?;
                Ok(Some(records))
            }
            None => Ok(None),
        }
    }

    fn save(&self, records: &[Record]) -> Result<()> {
        let json = serde_json::to_string(records)?;
        self.store.set_item(self.key.clone(), json);
        Ok(())
    }
}

/// Load the stored records, writing `seed` first if nothing is stored yet.
pub fn load_or_seed<R: RecordRepository + ?Sized>(repository: &R, seed: Vec<Record>) -> Result<Vec<Record>> {
    if let Some(records) = repository.load()? {
        return Ok(records);
    }
    log::info!("seeding repository with {} records", seed.len());
    repository.save(&seed)?;
    Ok(seed)
}

/// Pretty-printed JSON array of `records`, as offered by "Export" actions.
pub fn export_records(records: &[Record]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}
