//! Database models for model profiles.

use diesel::prelude::*;

use bigstep_core::model_profiles::ModelProfile;

use crate::utils::{from_db_timestamp, to_db_timestamp};

/// Database model for model profiles, keyed by `(user_id, id)`.
#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone,
)]
#[diesel(table_name = crate::schema::model_profiles)]
#[diesel(primary_key(user_id, id))]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ModelProfileDB {
    pub user_id: String,
    pub id: String,
    pub name: String,
    pub description: String,
    pub api_key_id: Option<String>,
    pub provider: String,
    pub system_prompt: String,
    pub model: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ModelProfileDB> for ModelProfile {
    fn from(db: ModelProfileDB) -> Self {
        Self {
            id: db.id,
            name: db.name,
            description: db.description,
            api_key_id: db.api_key_id,
            provider: db.provider,
            system_prompt: db.system_prompt,
            model: db.model,
            user_id: db.user_id,
            created_at: from_db_timestamp(&db.created_at),
            updated_at: from_db_timestamp(&db.updated_at),
        }
    }
}

impl From<ModelProfile> for ModelProfileDB {
    fn from(profile: ModelProfile) -> Self {
        Self {
            created_at: to_db_timestamp(&profile.created_at),
            updated_at: to_db_timestamp(&profile.updated_at),
            user_id: profile.user_id,
            id: profile.id,
            name: profile.name,
            description: profile.description,
            api_key_id: profile.api_key_id,
            provider: profile.provider,
            system_prompt: profile.system_prompt,
            model: profile.model,
        }
    }
}
