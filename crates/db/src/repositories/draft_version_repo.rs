//! Repository for the `draft_versions` table.
//!
//! Versions are append-only. New rows enter through [`DraftVersionRepo::append`],
//! which advances the owning draft's pointer in the same transaction.

use sqlx::{PgConnection, PgPool};
use quire_core::types::{DbId, VersionNumber};

use crate::models::draft_version::{AppendDraftVersion, CreateDraftVersion, DraftVersion};

/// Column list for draft_versions queries.
const COLUMNS: &str = "id, draft_id, version, content, content_html, content_markdown, \
    change_summary, created_by, created_at";

/// Unique constraint guarding `(draft_id, version)`.
pub const UQ_DRAFT_VERSION: &str = "uq_draft_versions_draft_version";

/// PostgreSQL error code for unique constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

/// Provides append and lookup operations for draft versions.
pub struct DraftVersionRepo;

impl DraftVersionRepo {
    /// Insert a version row with an explicit version number on an open
    /// connection or transaction.
    pub(crate) async fn insert(
        conn: &mut PgConnection,
        draft_id: DbId,
        version: VersionNumber,
        input: &CreateDraftVersion,
    ) -> Result<DraftVersion, sqlx::Error> {
        let query = format!(
            "INSERT INTO draft_versions
                (draft_id, version, content, content_html, content_markdown,
                 change_summary, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DraftVersion>(&query)
            .bind(draft_id)
            .bind(version)
            .bind(&input.content)
            .bind(&input.content_html)
            .bind(&input.content_markdown)
            .bind(&input.change_summary)
            .bind(input.created_by)
            .fetch_one(conn)
            .await
    }

    /// Append version `expected_version + 1` and advance the draft's pointer
    /// to it, atomically.
    ///
    /// The pointer update runs first and only matches while the draft still
    /// points at `expected_version` (and, when `clear_working_copy` is set,
    /// while the working copy still carries that timestamp). The row lock it
    /// takes makes a concurrent appender wait and then match nothing.
    ///
    /// Returns `Ok(None)` when the condition no longer holds or the draft is
    /// gone; nothing is written in that case. Dropping the returned future
    /// mid-way rolls the transaction back.
    pub async fn append(
        pool: &PgPool,
        input: &AppendDraftVersion,
    ) -> Result<Option<DraftVersion>, sqlx::Error> {
        let next = input.expected_version.saturating_add(1);
        let clear = input.clear_working_copy.is_some();

        let mut tx = pool.begin().await?;

        let advanced = sqlx::query(
            "UPDATE drafts SET
                current_version = $3,
                working_copy = CASE WHEN $4 THEN NULL ELSE working_copy END,
                working_copy_saved_at = CASE WHEN $4 THEN NULL ELSE working_copy_saved_at END,
                updated_at = NOW()
             WHERE id = $1
               AND current_version = $2
               AND (NOT $4 OR working_copy_saved_at = $5)",
        )
        .bind(input.draft_id)
        .bind(input.expected_version)
        .bind(next)
        .bind(clear)
        .bind(input.clear_working_copy)
        .execute(&mut *tx)
        .await?;

        if advanced.rows_affected() == 0 {
            tx.rollback().await?;
            tracing::debug!(
                draft_id = input.draft_id,
                expected_version = input.expected_version,
                "Pointer moved or working copy changed, append skipped"
            );
            return Ok(None);
        }

        let version = match Self::insert(&mut *tx, input.draft_id, next, &input.version).await {
            Ok(version) => version,
            Err(err) if is_duplicate_version(&err) => {
                tx.rollback().await?;
                tracing::debug!(draft_id = input.draft_id, version = next, "Version already stored");
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        tx.commit().await?;
        Ok(Some(version))
    }

    /// Find a specific version of a draft.
    pub async fn find_by_version(
        pool: &PgPool,
        draft_id: DbId,
        version: VersionNumber,
    ) -> Result<Option<DraftVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM draft_versions
             WHERE draft_id = $1 AND version = $2"
        );
        sqlx::query_as::<_, DraftVersion>(&query)
            .bind(draft_id)
            .bind(version)
            .fetch_optional(pool)
            .await
    }

    /// Get the highest-numbered version of a draft.
    pub async fn find_latest(
        pool: &PgPool,
        draft_id: DbId,
    ) -> Result<Option<DraftVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM draft_versions
             WHERE draft_id = $1
             ORDER BY version DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, DraftVersion>(&query)
            .bind(draft_id)
            .fetch_optional(pool)
            .await
    }

    /// List all versions of a draft, newest first.
    pub async fn list_for_draft(
        pool: &PgPool,
        draft_id: DbId,
    ) -> Result<Vec<DraftVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM draft_versions
             WHERE draft_id = $1
             ORDER BY version DESC"
        );
        sqlx::query_as::<_, DraftVersion>(&query)
            .bind(draft_id)
            .fetch_all(pool)
            .await
    }

    /// List just the stored version numbers of a draft, ascending.
    pub async fn list_numbers(
        pool: &PgPool,
        draft_id: DbId,
    ) -> Result<Vec<VersionNumber>, sqlx::Error> {
        let rows: Vec<(VersionNumber,)> = sqlx::query_as(
            "SELECT version FROM draft_versions WHERE draft_id = $1 ORDER BY version",
        )
        .bind(draft_id)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(v,)| v).collect())
    }

    /// Count the versions stored for a draft.
    pub async fn count_for_draft(pool: &PgPool, draft_id: DbId) -> Result<i64, sqlx::Error> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM draft_versions WHERE draft_id = $1")
                .bind(draft_id)
                .fetch_one(pool)
                .await?;
        Ok(row.0)
    }
}

/// Whether `err` is a unique violation on `(draft_id, version)`.
fn is_duplicate_version(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some(UNIQUE_VIOLATION)
                && db_err.constraint() == Some(UQ_DRAFT_VERSION)
        }
        _ => false,
    }
}
