use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::types::{Record, RecordType, RecordUpdate};

type Key = (i64, String, RecordType);

/// Persistence seam for record rows.
///
/// `apply` is all-or-nothing: either every update lands or the store is
/// left exactly as it was. An update whose `replaces`/`Remove` target no
/// longer matches the stored row is a `Conflict` (someone else won).
pub trait RecordStore {
    fn records(&self, user_id: i64, activity_type: &str) -> Result<Vec<Record>, StoreError>;

    fn apply(&mut self, updates: &[RecordUpdate]) -> Result<(), StoreError>;
}

fn key_of(r: &Record) -> Key {
    (r.user_id, r.activity_type.clone(), r.record_type)
}

fn same_row(a: &Record, b: &Record) -> bool {
    a.workout_id == b.workout_id && a.value == b.value
}

fn apply_to(rows: &mut BTreeMap<Key, Record>, updates: &[RecordUpdate]) -> Result<(), StoreError> {
    for u in updates {
        match u {
            RecordUpdate::Set { record, replaces } => {
                let key = key_of(record);
                match (rows.get(&key), replaces) {
                    (None, None) => {}
                    (Some(stored), Some(old)) if same_row(stored, old) => {}
                    (stored, _) => {
                        return Err(StoreError::Conflict(format!(
                            "{} for user {} / {}: stored={:?}",
                            record.record_type.as_str(),
                            record.user_id,
                            record.activity_type,
                            stored.map(|r| r.workout_id.as_str())
                        )))
                    }
                }
                rows.insert(key, record.clone());
            }
            RecordUpdate::Remove { record } => {
                let key = key_of(record);
                match rows.get(&key) {
                    Some(stored) if same_row(stored, record) => {
                        rows.remove(&key);
                    }
                    _ => {
                        return Err(StoreError::Conflict(format!(
                            "remove {} for user {}: row changed",
                            record.record_type.as_str(),
                            record.user_id
                        )))
                    }
                }
            }
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordStore {
    rows: BTreeMap<Key, Record>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Record> {
        self.rows.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl RecordStore for InMemoryRecordStore {
    fn records(&self, user_id: i64, activity_type: &str) -> Result<Vec<Record>, StoreError> {
        Ok(self
            .rows
            .values()
            .filter(|r| r.user_id == user_id && r.activity_type == activity_type)
            .cloned()
            .collect())
    }

    fn apply(&mut self, updates: &[RecordUpdate]) -> Result<(), StoreError> {
        let mut next = self.rows.clone();
        apply_to(&mut next, updates)?;
        self.rows = next;
        Ok(())
    }
}

/// Records kept in a JSON file; writes go through a temp file + rename.
#[derive(Debug)]
pub struct JsonFileRecordStore {
    path: PathBuf,
    inner: InMemoryRecordStore,
}

impl JsonFileRecordStore {
    /// Open (or start) a store at `path`. A missing file is an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let mut inner = InMemoryRecordStore::new();
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            let rows: Vec<Record> = serde_json::from_str(&contents)?;
            for r in rows {
                inner.rows.insert(key_of(&r), r);
            }
            log::info!("[storage] loaded {} record(s) from {}", inner.len(), path.display());
        } else {
            log::info!("[storage] {} not found, starting empty", path.display());
        }
        Ok(Self { path, inner })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn all(&self) -> Vec<Record> {
        self.inner.all()
    }

    fn write(&self, rows: &BTreeMap<Key, Record>) -> Result<(), StoreError> {
        let list: Vec<&Record> = rows.values().collect();
        let json = serde_json::to_string_pretty(&list)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl RecordStore for JsonFileRecordStore {
    fn records(&self, user_id: i64, activity_type: &str) -> Result<Vec<Record>, StoreError> {
        self.inner.records(user_id, activity_type)
    }

    fn apply(&mut self, updates: &[RecordUpdate]) -> Result<(), StoreError> {
        let mut next = self.inner.rows.clone();
        apply_to(&mut next, updates)?;
        self.write(&next)?;
        self.inner.rows = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn rec(workout: &str, value: f64) -> Record {
        Record {
            user_id: 1,
            activity_type: "hiking".into(),
            record_type: RecordType::LongestDistance,
            value,
            workout_id: workout.into(),
            workout_date: Utc::now(),
        }
    }

    #[test]
    fn failed_batch_leaves_store_untouched() {
        let mut store = InMemoryRecordStore::new();
        store
            .apply(&[RecordUpdate::Set { record: rec("a", 5.0), replaces: None }])
            .unwrap();

        let mut other = rec("b", 1.0);
        other.record_type = RecordType::MaxSpeed;
        let batch = [
            RecordUpdate::Set { record: other, replaces: None },
            // stale: claims there is no current distance record
            RecordUpdate::Set { record: rec("c", 9.0), replaces: None },
        ];
        assert!(matches!(store.apply(&batch), Err(StoreError::Conflict(_))));
        assert_eq!(store.len(), 1);
        assert_eq!(store.all()[0].workout_id, "a");
    }

    #[test]
    fn remove_requires_matching_row() {
        let mut store = InMemoryRecordStore::new();
        store
            .apply(&[RecordUpdate::Set { record: rec("a", 5.0), replaces: None }])
            .unwrap();
        assert!(store.apply(&[RecordUpdate::Remove { record: rec("z", 5.0) }]).is_err());
        store.apply(&[RecordUpdate::Remove { record: rec("a", 5.0) }]).unwrap();
        assert!(store.is_empty());
    }
}
