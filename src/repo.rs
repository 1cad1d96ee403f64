use std::marker::PhantomData;
use std::sync::atomic::{AtomicI64, Ordering};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ValidationError, Violation};
use crate::model::RecordId;
use crate::store::Store;
use crate::sync::{SyncHandle, SyncVerb};

/// An entity kind managed by a [`Repository`]: one JSON array under one
/// storage key, records addressed by id.
pub trait Record: Serialize + DeserializeOwned + Clone {
    /// Collection name used in sync operation descriptors.
    const KIND: &'static str;

    fn id(&self) -> RecordId;
    fn set_id(&mut self, id: RecordId);

    /// Required-field and format checks on the record itself.
    fn field_violations(&self) -> Vec<Violation>;

    /// Uniqueness check against one other record of the same kind. The
    /// repository never passes the record being replaced.
    fn conflict_with(&self, _other: &Self) -> Option<Violation> {
        None
    }

    /// Fill creation metadata on first insert.
    fn stamp_created(&mut self) {}
}

static LAST_ID: AtomicI64 = AtomicI64::new(0);

/// Epoch-millis record id, bumped past the previous one when two creations
/// land on the same tick. Ids are never reused within a process.
pub fn next_record_id() -> RecordId {
    loop {
        let last = LAST_ID.load(Ordering::SeqCst);
        let now = chrono::Utc::now().timestamp_millis();
        let candidate = if now > last { now } else { last + 1 };
        if LAST_ID
            .compare_exchange(last, candidate, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            return candidate;
        }
    }
}

/// Generic CRUD engine for one entity collection. Validates, mutates the
/// local collection, persists the whole collection through the store, then
/// hands the operation to the sync shim. The shim never blocks or reverts
/// the local write.
pub struct Repository<'a, R: Record> {
    store: &'a Store,
    sync: &'a SyncHandle,
    key: String,
    _marker: PhantomData<R>,
}

impl<'a, R: Record> Repository<'a, R> {
    pub fn open(store: &'a Store, sync: &'a SyncHandle, key: impl Into<String>) -> Self {
        Repository {
            store,
            sync,
            key: key.into(),
            _marker: PhantomData,
        }
    }

    /// All records in insertion order.
    pub fn list(&self) -> Vec<R> {
        self.store.read_or(&self.key, Vec::new())
    }

    pub fn find_by(&self, mut pred: impl FnMut(&R) -> bool) -> Option<R> {
        self.list().into_iter().find(|r| pred(r))
    }

    /// Insert (id unset) or replace-by-id. Rejects atomically with every
    /// violated constraint when any required field, format, or uniqueness
    /// check fails; uniqueness checks skip the record being replaced.
    pub fn upsert(&self, mut record: R) -> Result<R, ValidationError> {
        let mut all = self.list();

        let mut violations = record.field_violations();
        for existing in &all {
            if record.id() != 0 && existing.id() == record.id() {
                continue;
            }
            if let Some(v) = record.conflict_with(existing) {
                if !violations.iter().any(|hit| hit.field == v.field) {
                    violations.push(v);
                }
            }
        }
        if !violations.is_empty() {
            return Err(ValidationError::new(violations));
        }

        let verb;
        if record.id() == 0 {
            record.set_id(next_record_id());
            record.stamp_created();
            all.push(record.clone());
            verb = SyncVerb::Create;
        } else if let Some(slot) = all.iter_mut().find(|r| r.id() == record.id()) {
            *slot = record.clone();
            verb = SyncVerb::Update;
        } else {
            // Replay of a fully-specified record: keep the caller's id.
            all.push(record.clone());
            verb = SyncVerb::Create;
        }

        self.store.write(&self.key, &all);
        self.sync.push_record(R::KIND, verb, record.id(), &record);
        Ok(record)
    }

    /// Delete by id; a no-op when absent. Dependent collections are not
    /// touched (no cascading deletes).
    pub fn remove(&self, id: RecordId) {
        let mut all = self.list();
        let before = all.len();
        all.retain(|r| r.id() != id);
        if all.len() == before {
            return;
        }
        self.store.write(&self.key, &all);
        self.sync.push_delete(R::KIND, id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Teacher;
    use crate::store::keys;

    fn teacher(name: &str, mobile: &str) -> Teacher {
        Teacher {
            id: 0,
            name: name.to_string(),
            mobile: mobile.to_string(),
            subject: "गणित".to_string(),
            class_assigned: "5 वी".to_string(),
            created_at: String::new(),
            is_active: true,
        }
    }

    #[test]
    fn ids_are_monotonic_even_within_one_tick() {
        let mut prev = next_record_id();
        for _ in 0..100 {
            let id = next_record_id();
            assert!(id > prev);
            prev = id;
        }
    }

    #[test]
    fn insert_assigns_id_and_created_at() {
        let store = Store::in_memory();
        let sync = SyncHandle::disabled();
        let repo = Repository::<Teacher>::open(&store, &sync, keys::TEACHERS);

        let saved = repo.upsert(teacher("सुनीता पाटील", "9123456780")).expect("insert");
        assert_ne!(saved.id, 0);
        assert!(!saved.created_at.is_empty());
        assert_eq!(repo.list().len(), 1);
    }

    #[test]
    fn duplicate_mobile_is_rejected_with_the_field_named() {
        let store = Store::in_memory();
        let sync = SyncHandle::disabled();
        let repo = Repository::<Teacher>::open(&store, &sync, keys::TEACHERS);

        repo.upsert(teacher("सुनीता पाटील", "9123456780")).expect("first insert");
        let err = repo
            .upsert(teacher("अनिल जाधव", "9123456780"))
            .expect_err("duplicate mobile");
        assert!(err.violations.iter().any(|v| v.field == "mobile"));
        assert_eq!(repo.list().len(), 1);
    }

    #[test]
    fn editing_a_record_keeps_its_own_mobile() {
        let store = Store::in_memory();
        let sync = SyncHandle::disabled();
        let repo = Repository::<Teacher>::open(&store, &sync, keys::TEACHERS);

        let saved = repo.upsert(teacher("सुनीता पाटील", "9123456780")).expect("insert");
        let mut edited = saved.clone();
        edited.subject = "विज्ञान".to_string();
        let edited = repo.upsert(edited).expect("edit with own mobile");
        assert_eq!(edited.id, saved.id);
        assert_eq!(repo.list().len(), 1);
    }

    #[test]
    fn all_violations_are_reported_at_once() {
        let store = Store::in_memory();
        let sync = SyncHandle::disabled();
        let repo = Repository::<Teacher>::open(&store, &sync, keys::TEACHERS);

        let err = repo.upsert(teacher("", "98")).expect_err("blank name, bad mobile");
        let fields: Vec<&str> = err.violations.iter().map(|v| v.field.as_str()).collect();
        assert!(fields.contains(&"name"));
        assert!(fields.contains(&"mobile"));
    }

    #[test]
    fn upsert_is_idempotent_under_replay() {
        let store = Store::in_memory();
        let sync = SyncHandle::disabled();
        let repo = Repository::<Teacher>::open(&store, &sync, keys::TEACHERS);

        let saved = repo.upsert(teacher("सुनीता पाटील", "9123456780")).expect("insert");
        repo.upsert(saved.clone()).expect("replay");
        let all = repo.list();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, saved.id);
    }

    #[test]
    fn remove_is_a_noop_for_unknown_ids() {
        let store = Store::in_memory();
        let sync = SyncHandle::disabled();
        let repo = Repository::<Teacher>::open(&store, &sync, keys::TEACHERS);

        let saved = repo.upsert(teacher("सुनीता पाटील", "9123456780")).expect("insert");
        repo.remove(999);
        assert_eq!(repo.list().len(), 1);
        repo.remove(saved.id);
        assert!(repo.list().is_empty());
    }

    #[test]
    fn failed_upsert_leaves_the_collection_untouched() {
        let store = Store::in_memory();
        let sync = SyncHandle::disabled();
        let repo = Repository::<Teacher>::open(&store, &sync, keys::TEACHERS);

        repo.upsert(teacher("सुनीता पाटील", "9123456780")).expect("insert");
        let mut bad = teacher("अनिल जाधव", "9123456780");
        bad.subject = String::new();
        assert!(repo.upsert(bad).is_err());
        let all = repo.list();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "सुनीता पाटील");
    }
}
