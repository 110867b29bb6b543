use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use super::store_traits::{ScopedRecord, UserScopedRepository};
use crate::errors::{DatabaseError, Error, Result};

/// Process-local repository, used when no database is configured and in tests.
pub struct InMemoryRepository<T: ScopedRecord> {
    rows: RwLock<Vec<T>>,
}

impl<T: ScopedRecord> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
        }
    }
}

impl<T: ScopedRecord> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl<T: ScopedRecord> UserScopedRepository<T> for InMemoryRepository<T> {
    fn list_for_user(&self, user_id: &str) -> Result<Vec<T>> {
        let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
        let mut owned: Vec<T> = rows
            .iter()
            .filter(|r| r.user_id() == user_id)
            .cloned()
            .collect();
        if T::NEWEST_FIRST {
            owned.reverse();
        }
        Ok(owned)
    }

    fn get_for_user(&self, user_id: &str, id: &str) -> Result<Option<T>> {
        let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
        Ok(rows
            .iter()
            .find(|r| r.user_id() == user_id && r.id() == id)
            .cloned())
    }

    async fn insert(&self, record: T) -> Result<T> {
        let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
        if rows
            .iter()
            .any(|r| r.user_id() == record.user_id() && r.id() == record.id())
        {
            return Err(Error::Database(DatabaseError::UniqueViolation(format!(
                "{} {} already exists",
                T::KIND,
                record.id()
            ))));
        }
        rows.push(record.clone());
        Ok(record)
    }

    async fn update(&self, user_id: &str, id: &str, patch: T::Patch) -> Result<T> {
        let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
        let row = rows
            .iter_mut()
            .find(|r| r.user_id() == user_id && r.id() == id)
            .ok_or_else(|| Error::not_found(format!("{} {}", T::KIND, id)))?;
        row.apply_patch(patch);
        Ok(row.clone())
    }

    async fn delete(&self, user_id: &str, id: &str) -> Result<usize> {
        let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
        let before = rows.len();
        rows.retain(|r| !(r.user_id() == user_id && r.id() == id));
        Ok(before - rows.len())
    }
}
