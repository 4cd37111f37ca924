/// TableView Record Collection
///
/// A Table is the full, caller-owned collection of records behind a view.
/// Every record has a key produced by the table's key function; keys are
/// unique and do not change while the record stays in the table.
///
/// Mutations record a change in the table's changeset so views sharing the
/// table can prune their selection and invalidate cached orderings.
///
/// # Examples
///
/// ```
/// use tableview::{Record, RecordKey, Table};
///
/// let mut jobs = Table::keyed_by("jobs", "id");
/// jobs.append_record(Record::new().with("id", 1).with("status", "Success")).unwrap();
/// jobs.append_record(Record::new().with("id", 2).with("status", "Failed")).unwrap();
///
/// assert_eq!(jobs.len(), 2);
/// assert!(jobs.append_record(Record::new().with("id", 2)).is_err());
///
/// let removed = jobs.remove_record(&RecordKey::Int(1)).unwrap();
/// assert_eq!(removed.get("status").and_then(|v| v.as_str()), Some("Success"));
/// assert_eq!(jobs.len(), 1);
/// ```

use crate::changeset::{Changeset, RecordChange};
use crate::error::{Error, Result};
use crate::record::{key_by_field, KeyFn, Record, RecordKey};
use std::collections::{HashMap, HashSet};
use std::fmt;

pub struct Table {
    name: String,
    key_fn: KeyFn,
    records: Vec<Record>,
    /// keys[i] is the key of records[i]
    keys: Vec<RecordKey>,
    positions: HashMap<RecordKey, usize>,
    /// Tracks changes for views sharing this table
    changeset: Changeset,
}

impl Table {
    /// Create an empty table with a custom key function.
    pub fn new(name: impl Into<String>, key_fn: KeyFn) -> Self {
        Table {
            name: name.into(),
            key_fn,
            records: Vec::new(),
            keys: Vec::new(),
            positions: HashMap::new(),
            changeset: Changeset::new(),
        }
    }

    /// Create an empty table keyed by one field (dotted paths allowed).
    pub fn keyed_by(name: impl Into<String>, field: &str) -> Self {
        Self::new(name, key_by_field(field))
    }

    /// Create a table holding `records`, rejecting missing or duplicate keys.
    pub fn from_records(name: impl Into<String>, key_fn: KeyFn, records: Vec<Record>) -> Result<Self> {
        let mut table = Self::new(name, key_fn);
        table.append_records(records)?;
        Ok(table)
    }

    /// Create a table from a JSON array of objects.
    ///
    /// # Example
    ///
    /// ```
    /// use tableview::Table;
    ///
    /// let json = r#"[{"id": 1, "name": "Alice"}, {"id": 2, "name": "Bob"}]"#;
    /// let table = Table::from_json("users", "id", json).unwrap();
    /// assert_eq!(table.len(), 2);
    /// ```
    pub fn from_json(name: impl Into<String>, key_field: &str, json: &str) -> Result<Self> {
        let records: Vec<Record> = serde_json::from_str(json)?;
        Self::from_records(name, key_by_field(key_field), records)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Key of a record under this table's key function.
    pub fn key_of(&self, record: &Record) -> Result<RecordKey> {
        (self.key_fn)(record).ok_or(Error::MissingKey)
    }

    pub fn contains_key(&self, key: &RecordKey) -> bool {
        self.positions.contains_key(key)
    }

    /// Position of a record in insertion order.
    pub fn position(&self, key: &RecordKey) -> Option<usize> {
        self.positions.get(key).copied()
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn get_by_key(&self, key: &RecordKey) -> Option<&Record> {
        self.position(key).map(|i| &self.records[i])
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn keys(&self) -> &[RecordKey] {
        &self.keys
    }

    /// Iterate `(key, record)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&RecordKey, &Record)> {
        self.keys.iter().zip(self.records.iter())
    }

    pub fn append_record(&mut self, record: Record) -> Result<RecordKey> {
        let index = self.records.len();
        self.insert_record(index, record)
    }

    /// Append multiple records at once.
    ///
    /// Every record is validated before any is inserted, so on error the
    /// table is left untouched.
    pub fn append_records(&mut self, records: Vec<Record>) -> Result<usize> {
        let mut batch_keys = Vec::with_capacity(records.len());
        let mut seen = HashSet::with_capacity(records.len());

        for record in &records {
            let key = self.key_of(record)?;
            if self.contains_key(&key) || !seen.insert(key.clone()) {
                return Err(Error::DuplicateKey(key));
            }
            batch_keys.push(key);
        }

        let count = records.len();
        for (key, record) in batch_keys.into_iter().zip(records) {
            let index = self.records.len();
            self.positions.insert(key.clone(), index);
            self.keys.push(key.clone());
            self.records.push(record);
            self.changeset.push(RecordChange::Inserted { key, index });
        }

        Ok(count)
    }

    pub fn insert_record(&mut self, index: usize, record: Record) -> Result<RecordKey> {
        if index > self.records.len() {
            return Err(Error::IndexOutOfRange { index, len: self.records.len() });
        }

        let key = self.key_of(&record)?;
        if self.contains_key(&key) {
            return Err(Error::DuplicateKey(key));
        }

        self.records.insert(index, record);
        self.keys.insert(index, key.clone());
        if index + 1 == self.records.len() {
            self.positions.insert(key.clone(), index);
        } else {
            self.reindex();
        }

        self.changeset.push(RecordChange::Inserted { key: key.clone(), index });
        Ok(key)
    }

    /// Modify a record in place.
    ///
    /// The update must leave the record's key unchanged; otherwise the
    /// original record is restored and `KeyChanged` is returned.
    pub fn update_record<F>(&mut self, key: &RecordKey, update: F) -> Result<()>
    where
        F: FnOnce(&mut Record),
    {
        let index = self
            .position(key)
            .ok_or_else(|| Error::UnknownRecord(key.clone()))?;

        let original = self.records[index].clone();
        update(&mut self.records[index]);

        match (self.key_fn)(&self.records[index]) {
            Some(new_key) if new_key == *key => {}
            Some(new_key) => {
                self.records[index] = original;
                return Err(Error::KeyChanged { old: key.clone(), new: new_key });
            }
            None => {
                self.records[index] = original;
                return Err(Error::MissingKey);
            }
        }

        self.changeset.push(RecordChange::Updated { key: key.clone() });
        Ok(())
    }

    pub fn remove_record(&mut self, key: &RecordKey) -> Result<Record> {
        let index = self
            .position(key)
            .ok_or_else(|| Error::UnknownRecord(key.clone()))?;

        let record = self.records.remove(index);
        self.keys.remove(index);
        self.reindex();

        self.changeset.push(RecordChange::Removed { key: key.clone(), index });
        Ok(record)
    }

    /// Remove every record whose key is in `keys`; unknown keys are skipped.
    ///
    /// Returns the removed records in their former order.
    pub fn remove_records(&mut self, keys: &[RecordKey]) -> Vec<Record> {
        let doomed: HashSet<&RecordKey> = keys.iter().collect();
        self.retain_with_key(|key, _| !doomed.contains(key))
    }

    /// Keep only records matching `keep`, returning how many were removed.
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&Record) -> bool,
    {
        self.retain_with_key(|_, record| keep(record)).len()
    }

    fn retain_with_key<F>(&mut self, mut keep: F) -> Vec<Record>
    where
        F: FnMut(&RecordKey, &Record) -> bool,
    {
        let records = std::mem::take(&mut self.records);
        let keys = std::mem::take(&mut self.keys);
        let mut removed = Vec::new();

        for (original_index, (key, record)) in keys.into_iter().zip(records).enumerate() {
            if keep(&key, &record) {
                self.keys.push(key);
                self.records.push(record);
            } else {
                // Index as seen after earlier removals in this batch
                let index = original_index - removed.len();
                self.changeset.push(RecordChange::Removed { key, index });
                removed.push(record);
            }
        }

        if !removed.is_empty() {
            self.reindex();
        }
        removed
    }

    /// Replace the whole collection (e.g. after reloading from a repository).
    ///
    /// The new records are validated first; on error the table is unchanged.
    pub fn replace_all(&mut self, records: Vec<Record>) -> Result<()> {
        let mut replacement = Table::new(self.name.clone(), self.key_fn.clone());
        replacement.append_records(records)?;

        self.records = replacement.records;
        self.keys = replacement.keys;
        self.positions = replacement.positions;
        self.changeset.push(RecordChange::Reset);

        log::debug!("table '{}' replaced with {} records", self.name, self.records.len());
        Ok(())
    }

    fn reindex(&mut self) {
        self.positions.clear();
        for (index, key) in self.keys.iter().enumerate() {
            self.positions.insert(key.clone(), index);
        }
    }

    // === Changeset API for views ===

    /// Returns a reference to the change log
    pub fn changeset(&self) -> &Changeset {
        &self.changeset
    }

    /// Returns the current revision; it moves on every mutation
    pub fn revision(&self) -> u64 {
        self.changeset.revision()
    }

    /// Drop changes up to `revision` once every view has synced past it
    pub fn compact_changeset(&mut self, revision: u64) {
        self.changeset.compact(revision);
    }

    /// Serialize the collection as a pretty-printed JSON array.
    ///
    /// This is the export payload ("Export logs" and friends).
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.records)?)
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Table {{ name: '{}', records: {}, revision: {} }}",
            self.name,
            self.records.len(),
            self.revision()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::FieldValue;

    fn job(id: i64, status: &str) -> Record {
        Record::new()
            .with("id", id)
            .with("name", format!("Automation Job {}", id))
            .with("status", status)
    }

    fn jobs() -> Table {
        let mut table = Table::keyed_by("jobs", "id");
        table
            .append_records(vec![job(1, "Success"), job(2, "Running"), job(3, "Failed")])
            .unwrap();
        table
    }

    #[test]
    fn test_table_basic() {
        let table = jobs();
        assert_eq!(table.len(), 3);
        assert_eq!(table.keys(), &[RecordKey::Int(1), RecordKey::Int(2), RecordKey::Int(3)]);
        assert_eq!(table.position(&RecordKey::Int(3)), Some(2));
        assert_eq!(
            table.get_by_key(&RecordKey::Int(2)).unwrap().get("status"),
            Some(&FieldValue::from("Running"))
        );
    }

    #[test]
    fn test_table_rejects_missing_and_duplicate_keys() {
        let mut table = jobs();

        let err = table.append_record(Record::new().with("name", "no id")).unwrap_err();
        assert!(matches!(err, Error::MissingKey));

        let err = table.append_record(job(2, "Pending")).unwrap_err();
        assert!(matches!(err, Error::DuplicateKey(RecordKey::Int(2))));

        // A bad record in a batch leaves the table untouched
        let revision = table.revision();
        let err = table.append_records(vec![job(4, "Pending"), job(4, "Pending")]).unwrap_err();
        assert!(matches!(err, Error::DuplicateKey(RecordKey::Int(4))));
        assert_eq!(table.len(), 3);
        assert_eq!(table.revision(), revision);
    }

    #[test]
    fn test_table_insert() {
        let mut table = jobs();
        table.insert_record(1, job(10, "Pending")).unwrap();

        assert_eq!(table.len(), 4);
        assert_eq!(table.position(&RecordKey::Int(10)), Some(1));
        assert_eq!(table.position(&RecordKey::Int(2)), Some(2));
        assert_eq!(table.position(&RecordKey::Int(3)), Some(3));

        let err = table.insert_record(9, job(11, "Pending")).unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange { index: 9, len: 4 }));
    }

    #[test]
    fn test_table_delete() {
        let mut table = jobs();
        let removed = table.remove_record(&RecordKey::Int(2)).unwrap();
        assert_eq!(removed.get("status"), Some(&FieldValue::from("Running")));

        assert_eq!(table.len(), 2);
        assert!(!table.contains_key(&RecordKey::Int(2)));
        assert_eq!(table.position(&RecordKey::Int(3)), Some(1));

        let err = table.remove_record(&RecordKey::Int(2)).unwrap_err();
        assert!(matches!(err, Error::UnknownRecord(RecordKey::Int(2))));
    }

    #[test]
    fn test_table_remove_many_records_changes() {
        let mut table = jobs();
        let before = table.revision();

        let removed = table.remove_records(&[RecordKey::Int(1), RecordKey::Int(3), RecordKey::Int(99)]);
        assert_eq!(removed.len(), 2);
        assert_eq!(table.keys(), &[RecordKey::Int(2)]);
        assert_eq!(table.position(&RecordKey::Int(2)), Some(0));

        let changes = table.changeset().changes_since(before).unwrap();
        assert_eq!(
            changes,
            &[
                RecordChange::Removed { key: RecordKey::Int(1), index: 0 },
                RecordChange::Removed { key: RecordKey::Int(3), index: 1 },
            ]
        );
    }

    #[test]
    fn test_table_update() {
        let mut table = jobs();
        table
            .update_record(&RecordKey::Int(3), |r| {
                r.set("status", "Success");
            })
            .unwrap();
        assert_eq!(
            table.get_by_key(&RecordKey::Int(3)).unwrap().get("status"),
            Some(&FieldValue::from("Success"))
        );

        // Changing the key is refused and rolled back
        let err = table
            .update_record(&RecordKey::Int(3), |r| {
                r.set("id", 30);
                r.set("status", "Failed");
            })
            .unwrap_err();
        assert!(matches!(err, Error::KeyChanged { .. }));
        let record = table.get_by_key(&RecordKey::Int(3)).unwrap();
        assert_eq!(record.get("status"), Some(&FieldValue::from("Success")));
    }

    #[test]
    fn test_table_retain() {
        let mut table = jobs();
        let removed = table.retain(|r| r.get("status") != Some(&FieldValue::from("Failed")));
        assert_eq!(removed, 1);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_table_replace_all() {
        let mut table = jobs();
        table.replace_all(vec![job(7, "Pending")]).unwrap();
        assert_eq!(table.keys(), &[RecordKey::Int(7)]);
        assert_eq!(table.changeset().changes_since(table.revision() - 1).unwrap(), &[RecordChange::Reset]);

        let err = table.replace_all(vec![Record::new()]).unwrap_err();
        assert!(matches!(err, Error::MissingKey));
        assert_eq!(table.keys(), &[RecordKey::Int(7)]);
    }

    #[test]
    fn test_table_json_round_trip() {
        let table = jobs();
        let json = table.to_json().unwrap();
        assert!(json.contains("\"status\": \"Running\""));

        let restored = Table::from_json("jobs", "id", &json).unwrap();
        assert_eq!(restored.records(), table.records());
    }

    #[test]
    fn test_table_from_json_rejects_non_arrays() {
        let err = Table::from_json("jobs", "id", r#"{"id": 1}"#).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }
}
