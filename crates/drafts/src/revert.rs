//! Revert Engine: roll a draft back by re-appending an older revision.
//!
//! History is never rewritten. Reverting to `N` appends a copy of revision
//! `N` (content and stored renderings) as the new head.

use std::sync::Arc;

use quire_core::error::CoreError;
use quire_core::types::{DbId, VersionNumber};
use quire_core::versioning::revert_summary;
use quire_db::models::draft_version::{CreateDraftVersion, DraftVersion};

use crate::chain::{PendingAppend, VersionChain};
use crate::error::DraftResult;
use crate::store::DraftStore;

pub struct RevertEngine<S: DraftStore + ?Sized> {
    store: Arc<S>,
    chain: VersionChain<S>,
}

impl<S: DraftStore + ?Sized> Clone for RevertEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            chain: self.chain.clone(),
        }
    }
}

impl<S: DraftStore + ?Sized> RevertEngine<S> {
    pub fn new(store: Arc<S>, chain: VersionChain<S>) -> Self {
        Self { store, chain }
    }

    /// Append a copy of `target_version` as the draft's new head.
    ///
    /// The working copy is left as is.
    pub async fn revert_to_version(
        &self,
        draft_id: DbId,
        target_version: VersionNumber,
        author_id: DbId,
    ) -> DraftResult<DraftVersion> {
        self.chain.load_draft(draft_id).await?;
        let target = self
            .store
            .find_version(draft_id, target_version)
            .await?
            .ok_or(CoreError::VersionNotFound {
                draft_id,
                version: target_version,
            })?;

        let copy = CreateDraftVersion {
            content: target.content,
            content_html: target.content_html,
            content_markdown: target.content_markdown,
            change_summary: Some(revert_summary(target_version)),
            created_by: author_id,
        };
        let version = self
            .chain
            .append_with(draft_id, |_| {
                Ok(PendingAppend {
                    version: copy.clone(),
                    clear_working_copy: None,
                })
            })
            .await?;

        tracing::info!(
            draft_id,
            target_version,
            new_version = version.version,
            "Draft reverted"
        );
        Ok(version)
    }
}
