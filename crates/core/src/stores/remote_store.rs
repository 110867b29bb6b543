use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use log::{debug, warn};

use super::store_traits::{
    place_new, prepare_for_insert, ScopedRecord, UserScopeListener, UserScopedRepository,
    UserScopedStore,
};
use crate::errors::{Error, Result};

struct Snapshot<T> {
    user_id: Option<String>,
    generation: u64,
    records: Vec<T>,
}

/// Store backed by a repository queried by user id.
///
/// Mutations write through the repository first, then re-query the user's
/// rows. Every user switch bumps a generation counter. Results of a fetch or write
/// started under an older generation are dropped rather than published, so a
/// slow query for a previous user never lands in the current view.
pub struct RemoteStore<T: ScopedRecord, R: ?Sized + UserScopedRepository<T>> {
    repository: Arc<R>,
    state: RwLock<Snapshot<T>>,
}

impl<T: ScopedRecord, R: ?Sized + UserScopedRepository<T>> RemoteStore<T, R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            state: RwLock::new(Snapshot {
                user_id: None,
                generation: 0,
                records: Vec::new(),
            }),
        }
    }

    fn scope(&self) -> (Option<String>, u64) {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        (state.user_id.clone(), state.generation)
    }

    fn require_user(&self) -> Result<(String, u64)> {
        match self.scope() {
            (Some(user_id), generation) => Ok((user_id, generation)),
            (None, _) => Err(Error::Unauthenticated),
        }
    }

    /// Re-query after a successful write. If the re-query fails the write still
    /// stands, so `fallback` patches the view with what the repository returned.
    fn resync<F>(&self, user_id: &str, generation: u64, fallback: F)
    where
        F: FnOnce(&mut Vec<T>),
    {
        match self.repository.list_for_user(user_id) {
            Ok(fetched) => self.publish(generation, move |records| *records = fetched),
            Err(e) => {
                warn!("Re-query of {} failed after write: {}", T::KIND, e);
                self.publish(generation, fallback);
            }
        }
    }

    /// Publish `op`'s changes only if the user has not switched since `generation`.
    fn publish<F>(&self, generation: u64, op: F)
    where
        F: FnOnce(&mut Vec<T>),
    {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.generation == generation {
            op(&mut state.records);
        } else {
            debug!("Discarding stale {} result (user switched)", T::KIND);
        }
    }
}

#[async_trait]
impl<T, R> UserScopeListener for RemoteStore<T, R>
where
    T: ScopedRecord,
    R: ?Sized + UserScopedRepository<T>,
{
    async fn set_user_id(&self, user_id: Option<&str>) -> Result<()> {
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.user_id = user_id.map(str::to_string);
            state.generation += 1;
            state.records.clear();
        }
        if user_id.is_some() {
            self.refetch().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<T, R> UserScopedStore<T> for RemoteStore<T, R>
where
    T: ScopedRecord,
    R: ?Sized + UserScopedRepository<T>,
{
    fn current_user_id(&self) -> Option<String> {
        self.scope().0
    }

    fn list(&self) -> Vec<T> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .records
            .clone()
    }

    async fn add(&self, record: T) -> Result<T> {
        let (user_id, generation) = self.require_user()?;
        let record = prepare_for_insert(record, &user_id);
        let stored = self.repository.insert(record).await?;
        let published = stored.clone();
        self.resync(&user_id, generation, move |records| {
            place_new(records, published)
        });
        Ok(stored)
    }

    async fn update(&self, id: &str, patch: T::Patch) -> Result<T> {
        let (user_id, generation) = self.require_user()?;
        let stored = self.repository.update(&user_id, id, patch).await?;
        let published = stored.clone();
        self.resync(&user_id, generation, move |records| {
            match records.iter_mut().find(|r| r.id() == published.id()) {
                Some(slot) => *slot = published,
                None => place_new(records, published),
            }
        });
        Ok(stored)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let (user_id, generation) = self.require_user()?;
        let removed = self.repository.delete(&user_id, id).await?;
        if removed == 0 {
            return Err(Error::not_found(format!("{} {}", T::KIND, id)));
        }
        self.resync(&user_id, generation, |records| records.retain(|r| r.id() != id));
        Ok(())
    }

    async fn refetch(&self) -> Result<()> {
        let (user_id, generation) = self.scope();
        let Some(user_id) = user_id else {
            self.publish(generation, Vec::clear);
            return Ok(());
        };

        match self.repository.list_for_user(&user_id) {
            Ok(fetched) => {
                self.publish(generation, move |records| *records = fetched);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to load {} for user {}: {}", T::KIND, user_id, e);
                Err(e)
            }
        }
    }
}
