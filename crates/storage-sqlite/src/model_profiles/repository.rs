use async_trait::async_trait;
use diesel::prelude::*;
use diesel::SqliteConnection;
use std::sync::Arc;

use bigstep_core::model_profiles::{ModelProfile, ModelProfileUpdate};
use bigstep_core::stores::{ScopedRecord, UserScopedRepository};
use bigstep_core::{Error, Result};

use super::model::ModelProfileDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::model_profiles;

pub struct ModelProfileRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl ModelProfileRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        ModelProfileRepository { pool, writer }
    }
}

fn find_owned(
    conn: &mut SqliteConnection,
    owner: &str,
    profile_id: &str,
) -> Result<Option<ModelProfileDB>> {
    Ok(model_profiles::table
        .find((owner, profile_id))
        .first::<ModelProfileDB>(conn)
        .optional()
        .map_err(StorageError::from)?)
}

#[async_trait]
impl UserScopedRepository<ModelProfile> for ModelProfileRepository {
    /// Oldest first, matching the order profiles were added.
    fn list_for_user(&self, owner: &str) -> Result<Vec<ModelProfile>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = model_profiles::table
            .filter(model_profiles::user_id.eq(owner))
            .order((model_profiles::created_at.asc(), model_profiles::id.asc()))
            .load::<ModelProfileDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(ModelProfile::from).collect())
    }

    fn get_for_user(&self, owner: &str, profile_id: &str) -> Result<Option<ModelProfile>> {
        let mut conn = get_connection(&self.pool)?;
        Ok(find_owned(&mut conn, owner, profile_id)?.map(ModelProfile::from))
    }

    async fn insert(&self, profile: ModelProfile) -> Result<ModelProfile> {
        let row = ModelProfileDB::from(profile);
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<ModelProfile> {
                let stored = diesel::insert_into(model_profiles::table)
                    .values(&row)
                    .returning(ModelProfileDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Ok(ModelProfile::from(stored))
            })
            .await
    }

    async fn update(
        &self,
        owner: &str,
        profile_id: &str,
        patch: ModelProfileUpdate,
    ) -> Result<ModelProfile> {
        let owner = owner.to_string();
        let profile_id = profile_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<ModelProfile> {
                let mut profile: ModelProfile = find_owned(conn, &owner, &profile_id)?
                    .map(ModelProfile::from)
                    .ok_or_else(|| Error::not_found(format!("model profile {}", profile_id)))?;
                profile.apply_patch(patch);

                let row = ModelProfileDB::from(profile.clone());
                diesel::update(model_profiles::table.find((&owner, &profile_id)))
                    .set(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(profile)
            })
            .await
    }

    async fn delete(&self, owner: &str, profile_id: &str) -> Result<usize> {
        let owner = owner.to_string();
        let profile_id = profile_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                Ok(
                    diesel::delete(model_profiles::table.find((owner, profile_id)))
                        .execute(conn)
                        .map_err(StorageError::from)?,
                )
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, run_migrations, spawn_writer};
    use bigstep_core::model_profiles::NewModelProfile;
    use bigstep_core::stores::prepare_for_insert;
    use tempfile::tempdir;

    async fn create_test_repository() -> (ModelProfileRepository, tempfile::TempDir) {
        let temp_dir = tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db").to_string_lossy().to_string();
        let pool = create_pool(&db_path).expect("Failed to create pool");
        run_migrations(&pool).expect("Failed to run migrations");
        let writer = spawn_writer((*pool).clone());
        (ModelProfileRepository::new(pool, writer), temp_dir)
    }

    fn profile(owner: &str, id: &str) -> ModelProfile {
        let new_profile = NewModelProfile {
            id: Some(id.to_string()),
            name: id.to_uppercase(),
            description: None,
            api_key_id: Some("key-1".to_string()),
            provider: "openai".to_string(),
            system_prompt: Some("Be terse.".to_string()),
            model: Some("gpt-4".to_string()),
        };
        prepare_for_insert(ModelProfile::from(new_profile), owner)
    }

    #[tokio::test]
    async fn test_same_profile_id_for_different_users() {
        let (repo, _tmp) = create_test_repository().await;
        repo.insert(profile("u1", "gpt-4")).await.unwrap();
        repo.insert(profile("u2", "gpt-4")).await.unwrap();
        repo.insert(profile("u1", "fast")).await.unwrap();

        let ids: Vec<String> = repo
            .list_for_user("u1")
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["gpt-4", "fast"]);

        assert!(repo.insert(profile("u1", "gpt-4")).await.is_err());
    }

    #[tokio::test]
    async fn test_update_can_clear_optional_fields() {
        let (repo, _tmp) = create_test_repository().await;
        repo.insert(profile("u1", "gpt-4")).await.unwrap();

        let updated = repo
            .update(
                "u1",
                "gpt-4",
                ModelProfileUpdate {
                    api_key_id: Some(String::new()),
                    model: Some(String::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.api_key_id, None);
        assert_eq!(updated.model, None);

        let reloaded = repo.get_for_user("u1", "gpt-4").unwrap().unwrap();
        assert_eq!(reloaded.api_key_id, None);
        assert_eq!(reloaded.model, None);
        assert_eq!(reloaded.system_prompt, "Be terse.");
    }

    #[tokio::test]
    async fn test_other_users_rows_are_invisible() {
        let (repo, _tmp) = create_test_repository().await;
        repo.insert(profile("u1", "gpt-4")).await.unwrap();

        assert!(repo.get_for_user("u2", "gpt-4").unwrap().is_none());
        assert!(repo
            .update("u2", "gpt-4", ModelProfileUpdate::default())
            .await
            .unwrap_err()
            .is_not_found());
        assert_eq!(repo.delete("u2", "gpt-4").await.unwrap(), 0);
        assert_eq!(repo.delete("u1", "gpt-4").await.unwrap(), 1);
    }
}
