//! Draft models and DTOs.
//!
//! Defines the database row struct for `drafts`, the list projection with
//! revision counts, and the create/update inputs used by the draft service.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use quire_core::types::{DbId, Timestamp, VersionNumber};

use crate::models::draft_version::DraftVersion;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A draft row from the `drafts` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Draft {
    pub id: DbId,
    pub workspace_id: DbId,
    pub created_by: DbId,
    pub title: String,
    pub status: String,
    pub current_version: VersionNumber,
    pub working_copy: Option<serde_json::Value>,
    pub working_copy_saved_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Draft {
    /// Whether autosaved edits are waiting to be committed or discarded.
    pub fn has_working_copy(&self) -> bool {
        self.working_copy.is_some()
    }
}

/// A draft in a workspace listing, with the size of its revision chain.
///
/// Working-copy content is left out; listings only need to know whether
/// one exists.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct DraftSummary {
    pub id: DbId,
    pub workspace_id: DbId,
    pub created_by: DbId,
    pub title: String,
    pub status: String,
    pub current_version: VersionNumber,
    pub working_copy_saved_at: Option<Timestamp>,
    pub version_count: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A draft together with its head revision, as shown to an editor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DraftDetail {
    pub draft: Draft,
    pub latest_version: DraftVersion,
}

// ---------------------------------------------------------------------------
// Create DTO
// ---------------------------------------------------------------------------

/// Input for creating a draft together with its first revision.
///
/// `content` is already resolved (defaulted by the caller when the user
/// supplied none).
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDraft {
    pub workspace_id: DbId,
    pub created_by: DbId,
    pub title: String,
    pub content: serde_json::Value,
    pub change_summary: Option<String>,
}

// ---------------------------------------------------------------------------
// Update DTO
// ---------------------------------------------------------------------------

/// Metadata patch for a draft. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDraft {
    pub title: Option<String>,
    pub status: Option<String>,
}
