//! Autosave Coordinator: the draft's mutable working copy.
//!
//! Saving and discarding are single-row overwrites that never touch the
//! revision chain. Committing promotes the working copy to a revision through
//! [`VersionChain`], clearing it in the same write as the pointer update.

use std::sync::Arc;

use chrono::Utc;
use quire_core::drafts::{validate_change_summary, validate_content};
use quire_core::error::CoreError;
use quire_core::types::DbId;
use quire_db::models::draft::Draft;
use quire_db::models::draft_version::{CreateDraftVersion, DraftVersion};

use crate::chain::{PendingAppend, VersionChain};
use crate::error::DraftResult;
use crate::store::DraftStore;

pub struct Autosave<S: DraftStore + ?Sized> {
    store: Arc<S>,
    chain: VersionChain<S>,
}

impl<S: DraftStore + ?Sized> Clone for Autosave<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            chain: self.chain.clone(),
        }
    }
}

impl<S: DraftStore + ?Sized> Autosave<S> {
    pub fn new(store: Arc<S>, chain: VersionChain<S>) -> Self {
        Self { store, chain }
    }

    /// Overwrite the working copy and stamp it with the current time.
    ///
    /// Last writer wins; the version pointer is never read or changed.
    pub async fn save_working_copy(
        &self,
        draft_id: DbId,
        content: serde_json::Value,
    ) -> DraftResult<Draft> {
        validate_content(&content)?;

        let saved_at = Utc::now();
        let draft = self
            .store
            .save_working_copy(draft_id, &content, saved_at)
            .await?
            .ok_or_else(|| CoreError::draft_not_found(draft_id))?;

        tracing::debug!(draft_id, %saved_at, "Working copy saved");
        Ok(draft)
    }

    /// Throw the working copy away. A draft without one is returned as is.
    pub async fn discard_working_copy(&self, draft_id: DbId) -> DraftResult<Draft> {
        let draft = self
            .store
            .clear_working_copy(draft_id)
            .await?
            .ok_or_else(|| CoreError::draft_not_found(draft_id))?;

        tracing::info!(draft_id, version = draft.current_version, "Working copy discarded");
        Ok(draft)
    }

    /// Promote the working copy to the next revision and clear it.
    ///
    /// Each attempt re-reads the working copy and only clears it if its
    /// timestamp is unchanged when the revision is written, so a racing
    /// discard, commit, or autosave sends the attempt back for a fresh read.
    /// Fails with `InvalidState` once there is nothing left to commit.
    pub async fn commit_working_copy(
        &self,
        draft_id: DbId,
        author_id: DbId,
        change_summary: Option<String>,
    ) -> DraftResult<DraftVersion> {
        validate_change_summary(change_summary.as_deref())?;

        self.chain
            .append_with(draft_id, |draft| {
                let (Some(content), Some(saved_at)) =
                    (draft.working_copy.clone(), draft.working_copy_saved_at)
                else {
                    return Err(CoreError::InvalidState("nothing to commit".into()).into());
                };
                Ok(PendingAppend {
                    version: CreateDraftVersion {
                        content,
                        content_html: None,
                        content_markdown: None,
                        change_summary: change_summary.clone(),
                        created_by: author_id,
                    },
                    clear_working_copy: Some(saved_at),
                })
            })
            .await
    }
}
