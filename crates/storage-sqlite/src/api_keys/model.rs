//! Database models for API keys.

use diesel::prelude::*;

use bigstep_core::api_keys::ApiKeyRecord;

use crate::utils::{from_db_timestamp, to_db_timestamp};

/// Database model for API keys
#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Clone)]
#[diesel(table_name = crate::schema::api_keys)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ApiKeyDB {
    pub id: String,
    pub user_id: String,
    pub provider: String,
    pub api_key: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ApiKeyDB> for ApiKeyRecord {
    fn from(db: ApiKeyDB) -> Self {
        Self {
            id: db.id,
            provider: db.provider,
            key: db.api_key,
            user_id: db.user_id,
            created_at: from_db_timestamp(&db.created_at),
            updated_at: from_db_timestamp(&db.updated_at),
        }
    }
}

impl From<ApiKeyRecord> for ApiKeyDB {
    fn from(record: ApiKeyRecord) -> Self {
        Self {
            created_at: to_db_timestamp(&record.created_at),
            updated_at: to_db_timestamp(&record.updated_at),
            id: record.id,
            user_id: record.user_id,
            provider: record.provider,
            api_key: record.key,
        }
    }
}
