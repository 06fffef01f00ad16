//! Persistence port for drafts and their revision chains.
//!
//! The managers only talk to storage through [`DraftStore`]. An
//! implementation must make two writes atomic: creating a draft together
//! with version 1, and appending a version together with the pointer
//! update (conditioned on the pointer still holding the expected value).

use async_trait::async_trait;
use quire_core::types::{DbId, Timestamp, VersionNumber};
use quire_db::models::draft::{CreateDraft, Draft, DraftSummary, UpdateDraft};
use quire_db::models::draft_version::{AppendDraftVersion, DraftVersion};

pub mod memory;
pub mod postgres;

pub use memory::MemoryDraftStore;
pub use postgres::PgDraftStore;

/// Failures reported by a [`DraftStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The conditional append found the draft changed since it was read.
    #[error("Draft {draft_id} no longer at version {expected_version}")]
    Conflict {
        draft_id: DbId,
        expected_version: VersionNumber,
    },

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage operations the version-control core is built on.
///
/// Lookups return `Ok(None)` (or `false`) for missing rows; deciding whether
/// that is an error is left to the caller.
#[async_trait]
pub trait DraftStore: Send + Sync {
    /// Insert a draft at version 1 together with its first version.
    async fn create_draft(&self, input: &CreateDraft) -> StoreResult<(Draft, DraftVersion)>;

    async fn find_draft(&self, id: DbId) -> StoreResult<Option<Draft>>;

    /// Drafts of a workspace with version counts, most recently updated first.
    async fn list_drafts(&self, workspace_id: DbId) -> StoreResult<Vec<DraftSummary>>;

    /// Ids of all drafts, ascending.
    async fn list_draft_ids(&self) -> StoreResult<Vec<DbId>>;

    async fn update_metadata(&self, id: DbId, input: &UpdateDraft) -> StoreResult<Option<Draft>>;

    /// Delete a draft and every version it owns.
    async fn delete_draft(&self, id: DbId) -> StoreResult<bool>;

    /// Append `expected_version + 1` and advance the pointer, atomically.
    ///
    /// Fails with [`StoreError::Conflict`] (writing nothing) if the draft is
    /// gone, its pointer moved, or the working-copy condition in `input`
    /// no longer holds.
    async fn append_version(&self, input: &AppendDraftVersion) -> StoreResult<DraftVersion>;

    async fn find_version(
        &self,
        draft_id: DbId,
        version: VersionNumber,
    ) -> StoreResult<Option<DraftVersion>>;

    async fn latest_version(&self, draft_id: DbId) -> StoreResult<Option<DraftVersion>>;

    /// All versions of a draft, newest first.
    async fn list_versions(&self, draft_id: DbId) -> StoreResult<Vec<DraftVersion>>;

    /// Stored version numbers of a draft, ascending.
    async fn list_version_numbers(&self, draft_id: DbId) -> StoreResult<Vec<VersionNumber>>;

    async fn save_working_copy(
        &self,
        id: DbId,
        content: &serde_json::Value,
        saved_at: Timestamp,
    ) -> StoreResult<Option<Draft>>;

    async fn clear_working_copy(&self, id: DbId) -> StoreResult<Option<Draft>>;
}
