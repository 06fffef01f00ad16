//! Repository for the `drafts` table.
//!
//! Creating a draft also writes its first version; both rows go in one
//! transaction so a draft never exists without version 1.

use sqlx::PgPool;
use quire_core::drafts::STATUS_DRAFT;
use quire_core::types::{DbId, Timestamp};
use quire_core::versioning::FIRST_VERSION;

use crate::models::draft::{CreateDraft, Draft, DraftSummary, UpdateDraft};
use crate::models::draft_version::{CreateDraftVersion, DraftVersion};
use crate::repositories::draft_version_repo::DraftVersionRepo;

/// Column list for drafts queries.
const COLUMNS: &str = "id, workspace_id, created_by, title, status, current_version, \
    working_copy, working_copy_saved_at, created_at, updated_at";

/// Provides CRUD and working-copy operations for drafts.
pub struct DraftRepo;

impl DraftRepo {
    /// Insert a draft and its first version in a single transaction.
    pub async fn create(
        pool: &PgPool,
        input: &CreateDraft,
    ) -> Result<(Draft, DraftVersion), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO drafts (workspace_id, created_by, title, status, current_version)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        let draft = sqlx::query_as::<_, Draft>(&query)
            .bind(input.workspace_id)
            .bind(input.created_by)
            .bind(&input.title)
            .bind(STATUS_DRAFT)
            .bind(FIRST_VERSION)
            .fetch_one(&mut *tx)
            .await?;

        let first = CreateDraftVersion {
            content: input.content.clone(),
            content_html: None,
            content_markdown: None,
            change_summary: input.change_summary.clone(),
            created_by: input.created_by,
        };
        let version = DraftVersionRepo::insert(&mut *tx, draft.id, FIRST_VERSION, &first).await?;

        tx.commit().await?;
        Ok((draft, version))
    }

    /// Find a draft by its primary key.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Draft>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM drafts WHERE id = $1");
        sqlx::query_as::<_, Draft>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List drafts in a workspace with their version counts, most recently
    /// touched first.
    pub async fn list_for_workspace(
        pool: &PgPool,
        workspace_id: DbId,
    ) -> Result<Vec<DraftSummary>, sqlx::Error> {
        sqlx::query_as::<_, DraftSummary>(
            "SELECT d.id, d.workspace_id, d.created_by, d.title, d.status,
                    d.current_version, d.working_copy_saved_at,
                    (SELECT COUNT(*) FROM draft_versions v WHERE v.draft_id = d.id)
                        AS version_count,
                    d.created_at, d.updated_at
             FROM drafts d
             WHERE d.workspace_id = $1
             ORDER BY d.updated_at DESC, d.id DESC",
        )
        .bind(workspace_id)
        .fetch_all(pool)
        .await
    }

    /// List the ids of every draft, oldest first.
    pub async fn list_ids(pool: &PgPool) -> Result<Vec<DbId>, sqlx::Error> {
        let rows: Vec<(DbId,)> = sqlx::query_as("SELECT id FROM drafts ORDER BY id")
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Update title and/or status. Only non-`None` fields are applied.
    ///
    /// Returns `None` if no draft with the given `id` exists.
    pub async fn update_metadata(
        pool: &PgPool,
        id: DbId,
        input: &UpdateDraft,
    ) -> Result<Option<Draft>, sqlx::Error> {
        let query = format!(
            "UPDATE drafts SET
                title = COALESCE($2, title),
                status = COALESCE($3, status),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Draft>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.status)
            .fetch_optional(pool)
            .await
    }

    /// Delete a draft; its versions go with it (`ON DELETE CASCADE`).
    /// Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM drafts WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ── Working copy ─────────────────────────────────────────────────

    /// Overwrite the working copy and its saved-at stamp.
    ///
    /// Returns `None` if no draft with the given `id` exists.
    pub async fn save_working_copy(
        pool: &PgPool,
        id: DbId,
        content: &serde_json::Value,
        saved_at: Timestamp,
    ) -> Result<Option<Draft>, sqlx::Error> {
        let query = format!(
            "UPDATE drafts SET
                working_copy = $2,
                working_copy_saved_at = $3,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Draft>(&query)
            .bind(id)
            .bind(content)
            .bind(saved_at)
            .fetch_optional(pool)
            .await
    }

    /// Clear the working copy. Leaves `updated_at` alone when there was
    /// nothing to clear.
    ///
    /// Returns `None` if no draft with the given `id` exists.
    pub async fn clear_working_copy(pool: &PgPool, id: DbId) -> Result<Option<Draft>, sqlx::Error> {
        let query = format!(
            "UPDATE drafts SET
                working_copy = NULL,
                working_copy_saved_at = NULL,
                updated_at = CASE WHEN working_copy IS NULL THEN updated_at ELSE NOW() END
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Draft>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
