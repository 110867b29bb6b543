use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::errors::Result;

/// A record that always belongs to exactly one user.
pub trait ScopedRecord: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Partial update applied by `update(id, patch)`.
    type Patch: Clone + Send + Sync + 'static;

    /// Kind segment of the local storage key, e.g. `api-keys`.
    const KIND: &'static str;

    /// Whether new records go to the front of the list.
    const NEWEST_FIRST: bool;

    fn id(&self) -> &str;
    fn user_id(&self) -> &str;
    fn assign_owner(&mut self, id: String, user_id: String);
    fn apply_patch(&mut self, patch: Self::Patch);
}

/// Tag a record with its owner, generating an id when none was given.
pub fn prepare_for_insert<T: ScopedRecord>(mut record: T, user_id: &str) -> T {
    let id = match record.id().trim() {
        "" => Uuid::new_v4().to_string(),
        existing => existing.to_string(),
    };
    record.assign_owner(id, user_id.to_string());
    record
}

/// Insert a record at the position its kind dictates.
pub(crate) fn place_new<T: ScopedRecord>(records: &mut Vec<T>, record: T) {
    if T::NEWEST_FIRST {
        records.insert(0, record);
    } else {
        records.push(record);
    }
}

/// Row storage queried by user id (the remote strategy's backing store).
///
/// Every method filters on the owning user; a row owned by someone else is
/// indistinguishable from a missing one.
#[async_trait]
pub trait UserScopedRepository<T: ScopedRecord>: Send + Sync {
    fn list_for_user(&self, user_id: &str) -> Result<Vec<T>>;
    fn get_for_user(&self, user_id: &str, id: &str) -> Result<Option<T>>;
    async fn insert(&self, record: T) -> Result<T>;
    async fn update(&self, user_id: &str, id: &str, patch: T::Patch) -> Result<T>;
    async fn delete(&self, user_id: &str, id: &str) -> Result<usize>;
}

/// Receives the signed-in user id whenever it changes.
#[async_trait]
pub trait UserScopeListener: Send + Sync {
    async fn set_user_id(&self, user_id: Option<&str>) -> Result<()>;
}

/// In-memory view over one kind of user-scoped record.
#[async_trait]
pub trait UserScopedStore<T: ScopedRecord>: UserScopeListener {
    fn current_user_id(&self) -> Option<String>;

    fn list(&self) -> Vec<T>;

    fn get(&self, id: &str) -> Option<T> {
        self.list().into_iter().find(|r| r.id() == id)
    }

    async fn add(&self, record: T) -> Result<T>;
    async fn update(&self, id: &str, patch: T::Patch) -> Result<T>;
    async fn delete(&self, id: &str) -> Result<()>;
    async fn refetch(&self) -> Result<()>;
}
