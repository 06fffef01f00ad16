use async_trait::async_trait;
use quire_core::types::{DbId, Timestamp, VersionNumber};
use quire_db::models::draft::{CreateDraft, Draft, DraftSummary, UpdateDraft};
use quire_db::models::draft_version::{AppendDraftVersion, DraftVersion};
use quire_db::repositories::{DraftRepo, DraftVersionRepo};
use quire_db::DbPool;

use super::{DraftStore, StoreError, StoreResult};

/// [`DraftStore`] backed by PostgreSQL through the `quire-db` repositories.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct PgDraftStore {
    pool: DbPool,
}

impl PgDraftStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl DraftStore for PgDraftStore {
    async fn create_draft(&self, input: &CreateDraft) -> StoreResult<(Draft, DraftVersion)> {
        Ok(DraftRepo::create(&self.pool, input).await?)
    }

    async fn find_draft(&self, id: DbId) -> StoreResult<Option<Draft>> {
        Ok(DraftRepo::find_by_id(&self.pool, id).await?)
    }

    async fn list_drafts(&self, workspace_id: DbId) -> StoreResult<Vec<DraftSummary>> {
        Ok(DraftRepo::list_for_workspace(&self.pool, workspace_id).await?)
    }

    async fn list_draft_ids(&self) -> StoreResult<Vec<DbId>> {
        Ok(DraftRepo::list_ids(&self.pool).await?)
    }

    async fn update_metadata(&self, id: DbId, input: &UpdateDraft) -> StoreResult<Option<Draft>> {
        Ok(DraftRepo::update_metadata(&self.pool, id, input).await?)
    }

    async fn delete_draft(&self, id: DbId) -> StoreResult<bool> {
        Ok(DraftRepo::delete(&self.pool, id).await?)
    }

    async fn append_version(&self, input: &AppendDraftVersion) -> StoreResult<DraftVersion> {
        DraftVersionRepo::append(&self.pool, input)
            .await?
            .ok_or(StoreError::Conflict {
                draft_id: input.draft_id,
                expected_version: input.expected_version,
            })
    }

    async fn find_version(
        &self,
        draft_id: DbId,
        version: VersionNumber,
    ) -> StoreResult<Option<DraftVersion>> {
        Ok(DraftVersionRepo::find_by_version(&self.pool, draft_id, version).await?)
    }

    async fn latest_version(&self, draft_id: DbId) -> StoreResult<Option<DraftVersion>> {
        Ok(DraftVersionRepo::find_latest(&self.pool, draft_id).await?)
    }

    async fn list_versions(&self, draft_id: DbId) -> StoreResult<Vec<DraftVersion>> {
        Ok(DraftVersionRepo::list_for_draft(&self.pool, draft_id).await?)
    }

    async fn list_version_numbers(&self, draft_id: DbId) -> StoreResult<Vec<VersionNumber>> {
        Ok(DraftVersionRepo::list_numbers(&self.pool, draft_id).await?)
    }

    async fn save_working_copy(
        &self,
        id: DbId,
        content: &serde_json::Value,
        saved_at: Timestamp,
    ) -> StoreResult<Option<Draft>> {
        Ok(DraftRepo::save_working_copy(&self.pool, id, content, saved_at).await?)
    }

    async fn clear_working_copy(&self, id: DbId) -> StoreResult<Option<Draft>> {
        Ok(DraftRepo::clear_working_copy(&self.pool, id).await?)
    }
}
