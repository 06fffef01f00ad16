//! Draft Registry: draft lifecycle and metadata.

use std::sync::Arc;

use quire_core::drafts::{
    empty_document, validate_change_summary, validate_content, validate_status, validate_title,
    INITIAL_VERSION_SUMMARY,
};
use quire_core::error::CoreError;
use quire_core::types::DbId;
use quire_db::models::draft::{CreateDraft, Draft, DraftDetail, DraftSummary, UpdateDraft};

use crate::error::DraftResult;
use crate::store::DraftStore;

pub struct DraftRegistry<S: DraftStore + ?Sized> {
    store: Arc<S>,
}

impl<S: DraftStore + ?Sized> Clone for DraftRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: DraftStore + ?Sized> DraftRegistry<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Create a draft at version 1.
    ///
    /// Missing content defaults to an empty document and a missing summary to
    /// "Initial version". The draft and its first revision are written
    /// together.
    pub async fn create_draft(
        &self,
        workspace_id: DbId,
        creator_id: DbId,
        title: &str,
        content: Option<serde_json::Value>,
        change_summary: Option<String>,
    ) -> DraftResult<DraftDetail> {
        let title = title.trim();
        validate_title(title)?;
        validate_change_summary(change_summary.as_deref())?;
        let content = match content {
            Some(content) => {
                validate_content(&content)?;
                content
            }
            None => empty_document(),
        };

        let input = CreateDraft {
            workspace_id,
            created_by: creator_id,
            title: title.to_string(),
            content,
            change_summary: Some(change_summary.unwrap_or_else(|| INITIAL_VERSION_SUMMARY.to_string())),
        };
        let (draft, latest_version) = self.store.create_draft(&input).await?;

        tracing::info!(
            draft_id = draft.id,
            workspace_id,
            creator_id,
            "Draft created"
        );
        Ok(DraftDetail {
            draft,
            latest_version,
        })
    }

    /// Load a draft together with the revision its pointer names.
    pub async fn get_draft(&self, id: DbId) -> DraftResult<DraftDetail> {
        let draft = self
            .store
            .find_draft(id)
            .await?
            .ok_or_else(|| CoreError::draft_not_found(id))?;
        let latest_version = self
            .store
            .find_version(id, draft.current_version)
            .await?
            .ok_or_else(|| {
                CoreError::Internal(format!(
                    "Draft {id} points at missing version {}",
                    draft.current_version
                ))
            })?;

        Ok(DraftDetail {
            draft,
            latest_version,
        })
    }

    /// Drafts of a workspace, most recently updated first.
    pub async fn list_drafts(&self, workspace_id: DbId) -> DraftResult<Vec<DraftSummary>> {
        Ok(self.store.list_drafts(workspace_id).await?)
    }

    /// Change title and/or status. Never creates a revision.
    pub async fn update_metadata(&self, id: DbId, mut input: UpdateDraft) -> DraftResult<Draft> {
        if let Some(title) = input.title.as_mut() {
            *title = title.trim().to_string();
            validate_title(title)?;
        }
        if let Some(status) = input.status.as_deref() {
            validate_status(status)?;
        }

        let draft = self
            .store
            .update_metadata(id, &input)
            .await?
            .ok_or_else(|| CoreError::draft_not_found(id))?;

        tracing::info!(draft_id = id, status = %draft.status, "Draft metadata updated");
        Ok(draft)
    }

    /// Delete a draft and its whole revision chain.
    pub async fn delete_draft(&self, id: DbId) -> DraftResult<()> {
        if !self.store.delete_draft(id).await? {
            return Err(CoreError::draft_not_found(id).into());
        }
        tracing::info!(draft_id = id, "Draft deleted");
        Ok(())
    }
}
