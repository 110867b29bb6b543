use std::marker::PhantomData;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use log::{debug, warn};

use super::local_storage::LocalStorage;
use super::store_traits::{
    place_new, prepare_for_insert, ScopedRecord, UserScopeListener, UserScopedStore,
};
use crate::constants::{GUEST_NAMESPACE, STORAGE_KEY_PREFIX};
use crate::errors::{DatabaseError, Error, Result};

/// Storage key for one kind of record, e.g. `bigstep-api-keys-guest`.
pub fn storage_key(kind: &str, user_id: Option<&str>) -> String {
    let namespace = user_id.filter(|id| !id.is_empty()).unwrap_or(GUEST_NAMESPACE);
    format!("{}-{}-{}", STORAGE_KEY_PREFIX, kind, namespace)
}

struct Snapshot<T> {
    user_id: Option<String>,
    records: Vec<T>,
}

/// Store persisted as one JSON array per user under a namespaced key.
///
/// Signed-out use goes to the guest namespace. Switching users replaces the
/// whole view with the records found under the new key.
pub struct LocalStore<T: ScopedRecord> {
    storage: Arc<dyn LocalStorage>,
    state: RwLock<Snapshot<T>>,
    _kind: PhantomData<fn() -> T>,
}

impl<T: ScopedRecord> LocalStore<T> {
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        Self::for_user(storage, None)
    }

    pub fn for_user(storage: Arc<dyn LocalStorage>, user_id: Option<&str>) -> Self {
        let records = Self::load(storage.as_ref(), user_id);
        Self {
            storage,
            state: RwLock::new(Snapshot {
                user_id: user_id.map(str::to_string),
                records,
            }),
            _kind: PhantomData,
        }
    }

    /// Missing or unreadable data loads as an empty list.
    fn load(storage: &dyn LocalStorage, user_id: Option<&str>) -> Vec<T> {
        let key = storage_key(T::KIND, user_id);
        match storage.get_item(&key) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<T>>(&raw) {
                Ok(records) => records,
                Err(e) => {
                    warn!("Discarding unreadable data under '{}': {}", key, e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Failed to read '{}' from local storage: {}", key, e);
                Vec::new()
            }
        }
    }

    fn persist(&self, user_id: Option<&str>, records: &[T]) -> Result<()> {
        let key = storage_key(T::KIND, user_id);
        let serialized = serde_json::to_string(records)?;
        self.storage.set_item(&key, &serialized)
    }

    /// Apply `op` to a copy of the records, persist, then publish the copy.
    fn mutate<R, F>(&self, op: F) -> Result<R>
    where
        F: FnOnce(&mut Vec<T>, &str) -> Result<R>,
    {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let owner = state
            .user_id
            .clone()
            .unwrap_or_else(|| GUEST_NAMESPACE.to_string());
        let mut next = state.records.clone();
        let out = op(&mut next, &owner)?;
        self.persist(state.user_id.as_deref(), &next)?;
        state.records = next;
        Ok(out)
    }

    /// Drop every record under the current key.
    pub fn clear(&self) -> Result<()> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let key = storage_key(T::KIND, state.user_id.as_deref());
        self.storage.remove_item(&key)?;
        state.records.clear();
        Ok(())
    }
}

#[async_trait]
impl<T: ScopedRecord> UserScopeListener for LocalStore<T> {
    async fn set_user_id(&self, user_id: Option<&str>) -> Result<()> {
        let records = Self::load(self.storage.as_ref(), user_id);
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        debug!(
            "{} store switched to '{}' ({} records)",
            T::KIND,
            storage_key(T::KIND, user_id),
            records.len()
        );
        state.user_id = user_id.map(str::to_string);
        state.records = records;
        Ok(())
    }
}

#[async_trait]
impl<T: ScopedRecord> UserScopedStore<T> for LocalStore<T> {
    fn current_user_id(&self) -> Option<String> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .user_id
            .clone()
    }

    fn list(&self) -> Vec<T> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .records
            .clone()
    }

    async fn add(&self, record: T) -> Result<T> {
        self.mutate(|records, owner| {
            let record = prepare_for_insert(record, owner);
            if records.iter().any(|r| r.id() == record.id()) {
                return Err(Error::Database(DatabaseError::UniqueViolation(format!(
                    "{} {} already exists",
                    T::KIND,
                    record.id()
                ))));
            }
            place_new(records, record.clone());
            Ok(record)
        })
    }

    async fn update(&self, id: &str, patch: T::Patch) -> Result<T> {
        self.mutate(|records, _| {
            let record = records
                .iter_mut()
                .find(|r| r.id() == id)
                .ok_or_else(|| Error::not_found(format!("{} {}", T::KIND, id)))?;
            record.apply_patch(patch);
            Ok(record.clone())
        })
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.mutate(|records, _| {
            let before = records.len();
            records.retain(|r| r.id() != id);
            if records.len() == before {
                return Err(Error::not_found(format!("{} {}", T::KIND, id)));
            }
            Ok(())
        })
    }

    async fn refetch(&self) -> Result<()> {
        let user_id = self.current_user_id();
        let records = Self::load(self.storage.as_ref(), user_id.as_deref());
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.user_id == user_id {
            state.records = records;
        }
        Ok(())
    }
}
