//! Draft version (revision) models.
//!
//! Versions are immutable snapshots of draft content. They are only ever
//! inserted through [`AppendDraftVersion`] or as version 1 of a new draft.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use quire_core::types::{DbId, Timestamp, VersionNumber};

/// A row from the `draft_versions` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct DraftVersion {
    pub id: DbId,
    pub draft_id: DbId,
    pub version: VersionNumber,
    pub content: serde_json::Value,
    pub content_html: Option<String>,
    pub content_markdown: Option<String>,
    pub change_summary: Option<String>,
    pub created_by: DbId,
    pub created_at: Timestamp,
}

/// Content and attribution for a revision about to be written.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDraftVersion {
    pub content: serde_json::Value,
    pub content_html: Option<String>,
    pub content_markdown: Option<String>,
    pub change_summary: Option<String>,
    pub created_by: DbId,
}

/// A conditional append to a draft's chain.
///
/// The write only goes through while the draft's pointer still equals
/// `expected_version`; the new revision becomes `expected_version + 1`.
#[derive(Debug, Clone)]
pub struct AppendDraftVersion {
    pub draft_id: DbId,
    pub expected_version: VersionNumber,
    pub version: CreateDraftVersion,
    /// When set, the working copy is cleared in the same write, and only if
    /// its `working_copy_saved_at` still equals this timestamp.
    pub clear_working_copy: Option<Timestamp>,
}
