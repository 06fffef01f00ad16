//! Version Chain Manager: the single path that appends revisions.
//!
//! An append reads the draft's pointer `V`, asks the store to write
//! revision `V + 1` and move the pointer, conditioned on the pointer still
//! being `V`. A lost race comes back as [`StoreError::Conflict`]; the append
//! is then retried against a fresh read, a bounded number of times.

use std::sync::Arc;

use quire_core::drafts::{validate_change_summary, validate_content};
use quire_core::error::CoreError;
use quire_core::types::{DbId, Timestamp, VersionNumber};
use quire_core::versioning::{next_version, retry_delay};
use quire_db::models::draft::Draft;
use quire_db::models::draft_version::{AppendDraftVersion, CreateDraftVersion, DraftVersion};
use serde::Deserialize;

use crate::config::VersioningConfig;
use crate::error::DraftResult;
use crate::store::{DraftStore, StoreError};

/// Content and attribution for a revision to append.
#[derive(Debug, Clone, Deserialize)]
pub struct NewRevision {
    pub content: serde_json::Value,
    pub author_id: DbId,
    pub change_summary: Option<String>,
    pub content_html: Option<String>,
    pub content_markdown: Option<String>,
}

impl NewRevision {
    pub fn new(content: serde_json::Value, author_id: DbId) -> Self {
        Self {
            content,
            author_id,
            change_summary: None,
            content_html: None,
            content_markdown: None,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.change_summary = Some(summary.into());
        self
    }

    /// Attach pre-rendered HTML and/or Markdown forms, stored verbatim.
    pub fn with_renderings(mut self, html: Option<String>, markdown: Option<String>) -> Self {
        self.content_html = html;
        self.content_markdown = markdown;
        self
    }

    /// Check content shape and summary length.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_content(&self.content)?;
        validate_change_summary(self.change_summary.as_deref())
    }

    fn to_row(&self) -> CreateDraftVersion {
        CreateDraftVersion {
            content: self.content.clone(),
            content_html: self.content_html.clone(),
            content_markdown: self.content_markdown.clone(),
            change_summary: self.change_summary.clone(),
            created_by: self.author_id,
        }
    }
}

/// What one append attempt should write, decided from a fresh draft read.
#[derive(Debug, Clone)]
pub(crate) struct PendingAppend {
    pub version: CreateDraftVersion,
    /// Clear the working copy in the same write, provided it still carries
    /// this timestamp.
    pub clear_working_copy: Option<Timestamp>,
}

/// Appends and reads revisions of drafts.
pub struct VersionChain<S: DraftStore + ?Sized> {
    store: Arc<S>,
    config: VersioningConfig,
}

impl<S: DraftStore + ?Sized> Clone for VersionChain<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

impl<S: DraftStore + ?Sized> VersionChain<S> {
    pub fn new(store: Arc<S>, config: VersioningConfig) -> Self {
        Self { store, config }
    }

    /// Append `revision` as the draft's new head.
    ///
    /// Leaves the working copy untouched. Fails with `NotFound` if the draft
    /// does not exist and with `ConcurrencyConflict` once every attempt lost
    /// its race.
    pub async fn append_revision(
        &self,
        draft_id: DbId,
        revision: NewRevision,
    ) -> DraftResult<DraftVersion> {
        revision.validate()?;
        self.append_with(draft_id, |_| {
            Ok(PendingAppend {
                version: revision.to_row(),
                clear_working_copy: None,
            })
        })
        .await
    }

    /// Run the read / conditional-append loop.
    ///
    /// `prepare` sees the draft as read at the start of each attempt and
    /// decides what to write; returning an error stops without writing.
    pub(crate) async fn append_with<F>(&self, draft_id: DbId, mut prepare: F) -> DraftResult<DraftVersion>
    where
        F: FnMut(&Draft) -> DraftResult<PendingAppend> + Send,
    {
        let max_attempts = self.config.max_append_attempts.max(1);

        for attempt in 1..=max_attempts {
            let draft = self.load_draft(draft_id).await?;
            let pending = prepare(&draft)?;
            next_version(draft.current_version)?;

            let input = AppendDraftVersion {
                draft_id,
                expected_version: draft.current_version,
                version: pending.version,
                clear_working_copy: pending.clear_working_copy,
            };

            match self.store.append_version(&input).await {
                Ok(version) => {
                    tracing::info!(
                        draft_id,
                        version = version.version,
                        author_id = version.created_by,
                        attempt,
                        "Revision appended"
                    );
                    return Ok(version);
                }
                Err(StoreError::Conflict { expected_version, .. }) => {
                    tracing::warn!(
                        draft_id,
                        expected_version,
                        attempt,
                        max_attempts,
                        "Append lost a race, retrying"
                    );
                    if attempt < max_attempts {
                        tokio::time::sleep(retry_delay(self.config.retry_base_delay, attempt)).await;
                    }
                }
                Err(err) => return Err(err.into()),
            }
        }

        tracing::error!(draft_id, max_attempts, "Giving up on append after repeated conflicts");
        Err(CoreError::ConcurrencyConflict {
            draft_id,
            attempts: max_attempts,
        }
        .into())
    }

    /// Fetch one revision. `NotFound` if the draft is missing,
    /// `VersionNotFound` if only the version is.
    pub async fn get_revision(
        &self,
        draft_id: DbId,
        version: VersionNumber,
    ) -> DraftResult<DraftVersion> {
        self.load_draft(draft_id).await?;
        self.store
            .find_version(draft_id, version)
            .await?
            .ok_or_else(|| CoreError::VersionNotFound { draft_id, version }.into())
    }

    /// The draft's head revision.
    pub async fn latest_revision(&self, draft_id: DbId) -> DraftResult<DraftVersion> {
        self.store
            .latest_version(draft_id)
            .await?
            .ok_or_else(|| CoreError::draft_not_found(draft_id).into())
    }

    /// All revisions of a draft, newest first.
    pub async fn list_revisions(&self, draft_id: DbId) -> DraftResult<Vec<DraftVersion>> {
        self.load_draft(draft_id).await?;
        Ok(self.store.list_versions(draft_id).await?)
    }

    pub(crate) async fn load_draft(&self, draft_id: DbId) -> DraftResult<Draft> {
        self.store
            .find_draft(draft_id)
            .await?
            .ok_or_else(|| CoreError::draft_not_found(draft_id).into())
    }
}
