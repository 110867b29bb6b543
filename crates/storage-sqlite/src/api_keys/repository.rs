use async_trait::async_trait;
use diesel::prelude::*;
use diesel::SqliteConnection;
use std::sync::Arc;

use bigstep_core::api_keys::{ApiKeyRecord, ApiKeyUpdate};
use bigstep_core::stores::{ScopedRecord, UserScopedRepository};
use bigstep_core::{Error, Result};

use super::model::ApiKeyDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::api_keys;

pub struct ApiKeyRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl ApiKeyRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        ApiKeyRepository { pool, writer }
    }
}

fn find_owned(conn: &mut SqliteConnection, owner: &str, key_id: &str) -> Result<Option<ApiKeyDB>> {
    Ok(api_keys::table
        .filter(api_keys::user_id.eq(owner))
        .filter(api_keys::id.eq(key_id))
        .first::<ApiKeyDB>(conn)
        .optional()
        .map_err(StorageError::from)?)
}

#[async_trait]
impl UserScopedRepository<ApiKeyRecord> for ApiKeyRepository {
    fn list_for_user(&self, owner: &str) -> Result<Vec<ApiKeyRecord>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = api_keys::table
            .filter(api_keys::user_id.eq(owner))
            .order((api_keys::created_at.desc(), api_keys::id.desc()))
            .load::<ApiKeyDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(ApiKeyRecord::from).collect())
    }

    fn get_for_user(&self, owner: &str, key_id: &str) -> Result<Option<ApiKeyRecord>> {
        let mut conn = get_connection(&self.pool)?;
        Ok(find_owned(&mut conn, owner, key_id)?.map(ApiKeyRecord::from))
    }

    async fn insert(&self, record: ApiKeyRecord) -> Result<ApiKeyRecord> {
        let row = ApiKeyDB::from(record);
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<ApiKeyRecord> {
                let stored = diesel::insert_into(api_keys::table)
                    .values(&row)
                    .returning(ApiKeyDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Ok(ApiKeyRecord::from(stored))
            })
            .await
    }

    async fn update(&self, owner: &str, key_id: &str, patch: ApiKeyUpdate) -> Result<ApiKeyRecord> {
        let owner = owner.to_string();
        let key_id = key_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<ApiKeyRecord> {
                let mut record: ApiKeyRecord = find_owned(conn, &owner, &key_id)?
                    .map(ApiKeyRecord::from)
                    .ok_or_else(|| Error::not_found(format!("api key {}", key_id)))?;
                record.apply_patch(patch);

                let row = ApiKeyDB::from(record.clone());
                diesel::update(
                    api_keys::table
                        .filter(api_keys::user_id.eq(&owner))
                        .filter(api_keys::id.eq(&key_id)),
                )
                .set(&row)
                .execute(conn)
                .map_err(StorageError::from)?;
                Ok(record)
            })
            .await
    }

    async fn delete(&self, owner: &str, key_id: &str) -> Result<usize> {
        let owner = owner.to_string();
        let key_id = key_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                Ok(diesel::delete(
                    api_keys::table
                        .filter(api_keys::user_id.eq(owner))
                        .filter(api_keys::id.eq(key_id)),
                )
                .execute(conn)
                .map_err(StorageError::from)?)
            })
            .await
    }
}
