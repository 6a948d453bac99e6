//! The record store.
//!
//! Holds named collections of JSON records and one persistence handle.
//! Every mutation builds the next state, writes it through the persistence
//! backend, and only then replaces the in-memory state, so a failed write
//! leaves the store exactly as it was before the call.

use serde_json::{Map, Value};

use crate::observability::metrics;
use crate::store::criteria::Criteria;
use crate::store::persistence::{MemoryPersistence, Persistence, Snapshot};
use crate::store::record::{Record, ID_FIELD};
use crate::store::StoreError;

/// Single-writer collection store.
#[derive(Debug)]
pub struct Store {
    collections: Snapshot,
    persistence: Box<dyn Persistence>,
}

impl Store {
    /// Open a store, restoring the last committed snapshot.
    pub fn open(persistence: impl Persistence + 'static) -> Result<Self, StoreError> {
        let collections = persistence.load()?;
        for (name, records) in &collections {
            metrics::record_store_size(name, records.len());
        }
        Ok(Self {
            collections,
            persistence: Box::new(persistence),
        })
    }

    /// Empty store backed by memory only.
    pub fn in_memory() -> Self {
        Self {
            collections: Snapshot::new(),
            persistence: Box::new(MemoryPersistence::new()),
        }
    }

    /// Append a record to its collection.
    pub fn insert<R: Record>(&mut self, record: &R) -> Result<(), StoreError> {
        let row = to_row(R::COLLECTION, record)?;
        self.commit(R::COLLECTION, |rows| rows.push(row))?;
        tracing::debug!(collection = R::COLLECTION, id = record.id(), "Record inserted");
        Ok(())
    }

    /// Records matching `criteria`, in insertion order.
    /// A collection that was never written to yields nothing.
    pub fn select<R: Record>(&self, criteria: &Criteria) -> Result<Vec<R>, StoreError> {
        self.rows(R::COLLECTION)
            .iter()
            .filter(|row| criteria.matches(row))
            .map(|row| from_row(R::COLLECTION, row))
            .collect()
    }

    /// Exact lookup by id.
    pub fn find<R: Record>(&self, id: &str) -> Result<Option<R>, StoreError> {
        self.rows(R::COLLECTION)
            .iter()
            .find(|row| row_id(row) == Some(id))
            .map(|row| from_row(R::COLLECTION, row))
            .transpose()
    }

    /// Replace the record with `id` by `record`, keeping `id`.
    /// No-op when the id is unknown.
    pub fn update<R: Record>(&mut self, id: &str, record: &R) -> Result<(), StoreError> {
        let Some(index) = self.position(R::COLLECTION, id) else {
            tracing::debug!(collection = R::COLLECTION, id, "Update of unknown record ignored");
            return Ok(());
        };

        let mut row = to_row(R::COLLECTION, record)?;
        row.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
        self.commit(R::COLLECTION, |rows| rows[index] = row)?;
        tracing::debug!(collection = R::COLLECTION, id, "Record updated");
        Ok(())
    }

    /// Remove the record with `id`. No-op when the id is unknown.
    pub fn delete<R: Record>(&mut self, id: &str) -> Result<(), StoreError> {
        let Some(index) = self.position(R::COLLECTION, id) else {
            return Ok(());
        };

        self.commit(R::COLLECTION, |rows| {
            rows.remove(index);
        })?;
        tracing::debug!(collection = R::COLLECTION, id, "Record deleted");
        Ok(())
    }

    /// Number of records in a collection.
    pub fn len(&self, collection: &str) -> usize {
        self.rows(collection).len()
    }

    /// Names of all collections that exist.
    pub fn collections(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }

    fn rows(&self, collection: &str) -> &[Map<String, Value>] {
        self.collections
            .get(collection)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn position(&self, collection: &str, id: &str) -> Option<usize> {
        self.rows(collection)
            .iter()
            .position(|row| row_id(row) == Some(id))
    }

    /// Apply `mutate` to a copy of the state, persist it, then swap it in.
    fn commit<F>(&mut self, collection: &str, mutate: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Vec<Map<String, Value>>),
    {
        let mut next = self.collections.clone();
        mutate(next.entry(collection.to_string()).or_default());

        if let Err(e) = self.persistence.save(&next) {
            tracing::error!(collection, error = %e, "Failed to persist store");
            return Err(e);
        }

        self.collections = next;
        metrics::record_store_size(collection, self.len(collection));
        Ok(())
    }
}

fn row_id(row: &Map<String, Value>) -> Option<&str> {
    row.get(ID_FIELD).and_then(Value::as_str)
}

fn to_row<R: Record>(collection: &str, record: &R) -> Result<Map<String, Value>, StoreError> {
    match serde_json::to_value(record)? {
        Value::Object(row) => Ok(row),
        other => Err(StoreError::Corrupt {
            collection: collection.to_string(),
            source: serde::ser::Error::custom(format!(
                "records must serialize to objects, got {other}"
            )),
        }),
    }
}

fn from_row<R: Record>(collection: &str, row: &Map<String, Value>) -> Result<R, StoreError> {
    serde_json::from_value(Value::Object(row.clone())).map_err(|source| StoreError::Corrupt {
        collection: collection.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: String,
        title: String,
        body: Option<String>,
    }

    impl Record for Note {
        const COLLECTION: &'static str = "notes";

        fn id(&self) -> &str {
            &self.id
        }
    }

    fn note(id: &str, title: &str, body: Option<&str>) -> Note {
        Note {
            id: id.to_string(),
            title: title.to_string(),
            body: body.map(str::to_string),
        }
    }

    fn all() -> Criteria {
        Criteria::new()
    }

    #[test]
    fn test_unknown_collection_selects_nothing() {
        let store = Store::in_memory();
        assert!(store.select::<Note>(&all()).unwrap().is_empty());
        assert_eq!(store.len("notes"), 0);
        assert_eq!(store.collections().count(), 0);
    }

    #[test]
    fn test_insert_preserves_order() {
        let mut store = Store::in_memory();
        store.insert(&note("1", "first", None)).unwrap();
        store.insert(&note("2", "second", None)).unwrap();
        store.insert(&note("3", "third", None)).unwrap();

        let ids: Vec<_> = store
            .select::<Note>(&all())
            .unwrap()
            .into_iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(ids, ["1", "2", "3"]);
    }

    #[test]
    fn test_select_title_ignores_null_description() {
        let mut store = Store::in_memory();
        store.insert(&note("1", "xabcx", Some("zzz"))).unwrap();
        store.insert(&note("2", "nope", Some("abc"))).unwrap();
        store.insert(&note("3", "abc", None)).unwrap();

        let criteria = Criteria::new()
            .field("title", Some("abc"))
            .field("body", None::<String>);
        let found = store.select::<Note>(&criteria).unwrap();

        assert_eq!(found, vec![note("1", "xabcx", Some("zzz")), note("3", "abc", None)]);
    }

    #[test]
    fn test_find_is_exact() {
        let mut store = Store::in_memory();
        store.insert(&note("abc-1", "a", None)).unwrap();

        assert!(store.find::<Note>("abc").unwrap().is_none());
        assert_eq!(store.find::<Note>("abc-1").unwrap().unwrap().title, "a");
    }

    #[test]
    fn test_update_replaces_and_keeps_id() {
        let mut store = Store::in_memory();
        store.insert(&note("1", "old", Some("body"))).unwrap();

        store.update("1", &note("ignored", "new", None)).unwrap();

        let updated = store.find::<Note>("1").unwrap().unwrap();
        assert_eq!(updated, note("1", "new", None));
        assert_eq!(store.len("notes"), 1);
    }

    #[test]
    fn test_update_and_delete_unknown_are_noops() {
        let persistence = MemoryPersistence::new();
        let mut store = Store::open(persistence.clone()).unwrap();
        store.insert(&note("1", "a", None)).unwrap();

        persistence.fail_writes(true);
        store.update("missing", &note("missing", "b", None)).unwrap();
        store.delete::<Note>("missing").unwrap();

        assert_eq!(store.select::<Note>(&all()).unwrap(), vec![note("1", "a", None)]);
    }

    #[test]
    fn test_delete_removes_record() {
        let mut store = Store::in_memory();
        store.insert(&note("1", "a", None)).unwrap();
        store.insert(&note("2", "b", None)).unwrap();

        store.delete::<Note>("1").unwrap();

        assert!(store.find::<Note>("1").unwrap().is_none());
        assert_eq!(store.len("notes"), 1);
    }

    #[test]
    fn test_reopen_restores_state() {
        let persistence = MemoryPersistence::new();
        let mut store = Store::open(persistence.clone()).unwrap();
        for i in 0..5 {
            store
                .insert(&note(&i.to_string(), &format!("n{i}"), None))
                .unwrap();
        }
        let before = store.select::<Note>(&all()).unwrap();
        drop(store);

        let reopened = Store::open(persistence).unwrap();
        assert_eq!(reopened.select::<Note>(&all()).unwrap(), before);
    }

    #[test]
    fn test_failed_write_leaves_state_untouched() {
        let persistence = MemoryPersistence::new();
        let mut store = Store::open(persistence.clone()).unwrap();
        store.insert(&note("1", "a", None)).unwrap();

        persistence.fail_writes(true);
        assert!(matches!(
            store.insert(&note("2", "b", None)),
            Err(StoreError::Io(_))
        ));
        assert!(store.update("1", &note("1", "changed", None)).is_err());
        assert!(store.delete::<Note>("1").is_err());

        assert_eq!(store.select::<Note>(&all()).unwrap(), vec![note("1", "a", None)]);
        assert_eq!(persistence.saved()["notes"].len(), 1);
    }

    #[test]
    fn test_malformed_row_is_reported() {
        let persistence = MemoryPersistence::new();
        let row = match serde_json::json!({ "id": "1", "title": 42 }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        persistence
            .save(&Snapshot::from([("notes".to_string(), vec![row])]))
            .unwrap();

        let store = Store::open(persistence).unwrap();
        assert!(matches!(
            store.select::<Note>(&all()),
            Err(StoreError::Corrupt { .. })
        ));
    }
}
