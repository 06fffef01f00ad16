use std::sync::Arc;

use quire_core::types::{DbId, VersionNumber};
use quire_db::models::draft::{Draft, DraftDetail, DraftSummary, UpdateDraft};
use quire_db::models::draft_version::DraftVersion;
use quire_db::DbPool;

use crate::audit::{AuditReport, ChainAuditor};
use crate::autosave::Autosave;
use crate::chain::{NewRevision, VersionChain};
use crate::config::VersioningConfig;
use crate::error::DraftResult;
use crate::registry::DraftRegistry;
use crate::revert::RevertEngine;
use crate::store::{DraftStore, MemoryDraftStore, PgDraftStore};

/// Every draft operation over one shared store.
///
/// Cheap to clone; clones share the store.
pub struct DraftService<S: DraftStore + ?Sized> {
    registry: DraftRegistry<S>,
    chain: VersionChain<S>,
    autosave: Autosave<S>,
    revert: RevertEngine<S>,
    store: Arc<S>,
}

impl<S: DraftStore + ?Sized> Clone for DraftService<S> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            chain: self.chain.clone(),
            autosave: self.autosave.clone(),
            revert: self.revert.clone(),
            store: Arc::clone(&self.store),
        }
    }
}

impl DraftService<PgDraftStore> {
    /// Service backed by PostgreSQL.
    pub fn postgres(pool: DbPool, config: VersioningConfig) -> Self {
        Self::new(Arc::new(PgDraftStore::new(pool)), config)
    }
}

impl DraftService<MemoryDraftStore> {
    /// Service backed by a fresh in-memory store.
    pub fn in_memory(config: VersioningConfig) -> Self {
        Self::new(Arc::new(MemoryDraftStore::new()), config)
    }
}

impl<S: DraftStore + ?Sized> DraftService<S> {
    pub fn new(store: Arc<S>, config: VersioningConfig) -> Self {
        let chain = VersionChain::new(Arc::clone(&store), config);
        Self {
            registry: DraftRegistry::new(Arc::clone(&store)),
            autosave: Autosave::new(Arc::clone(&store), chain.clone()),
            revert: RevertEngine::new(Arc::clone(&store), chain.clone()),
            chain,
            store,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    // ── Drafts ───────────────────────────────────────────────────────

    pub async fn create_draft(
        &self,
        workspace_id: DbId,
        creator_id: DbId,
        title: &str,
        content: Option<serde_json::Value>,
        change_summary: Option<String>,
    ) -> DraftResult<DraftDetail> {
        self.registry
            .create_draft(workspace_id, creator_id, title, content, change_summary)
            .await
    }

    pub async fn get_draft(&self, id: DbId) -> DraftResult<DraftDetail> {
        self.registry.get_draft(id).await
    }

    pub async fn list_drafts(&self, workspace_id: DbId) -> DraftResult<Vec<DraftSummary>> {
        self.registry.list_drafts(workspace_id).await
    }

    pub async fn update_metadata(&self, id: DbId, input: UpdateDraft) -> DraftResult<Draft> {
        self.registry.update_metadata(id, input).await
    }

    pub async fn delete_draft(&self, id: DbId) -> DraftResult<()> {
        self.registry.delete_draft(id).await
    }

    // ── Revisions ────────────────────────────────────────────────────

    pub async fn append_revision(
        &self,
        draft_id: DbId,
        revision: NewRevision,
    ) -> DraftResult<DraftVersion> {
        self.chain.append_revision(draft_id, revision).await
    }

    pub async fn get_revision(
        &self,
        draft_id: DbId,
        version: VersionNumber,
    ) -> DraftResult<DraftVersion> {
        self.chain.get_revision(draft_id, version).await
    }

    pub async fn latest_revision(&self, draft_id: DbId) -> DraftResult<DraftVersion> {
        self.chain.latest_revision(draft_id).await
    }

    pub async fn list_revisions(&self, draft_id: DbId) -> DraftResult<Vec<DraftVersion>> {
        self.chain.list_revisions(draft_id).await
    }

    pub async fn revert_to_version(
        &self,
        draft_id: DbId,
        target_version: VersionNumber,
        author_id: DbId,
    ) -> DraftResult<DraftVersion> {
        self.revert
            .revert_to_version(draft_id, target_version, author_id)
            .await
    }

    // ── Working copy ─────────────────────────────────────────────────

    pub async fn save_working_copy(
        &self,
        draft_id: DbId,
        content: serde_json::Value,
    ) -> DraftResult<Draft> {
        self.autosave.save_working_copy(draft_id, content).await
    }

    pub async fn discard_working_copy(&self, draft_id: DbId) -> DraftResult<Draft> {
        self.autosave.discard_working_copy(draft_id).await
    }

    pub async fn commit_working_copy(
        &self,
        draft_id: DbId,
        author_id: DbId,
        change_summary: Option<String>,
    ) -> DraftResult<DraftVersion> {
        self.autosave
            .commit_working_copy(draft_id, author_id, change_summary)
            .await
    }

    // ── Maintenance ──────────────────────────────────────────────────

    /// Verify every stored chain.
    pub async fn audit(&self) -> DraftResult<AuditReport> {
        ChainAuditor::new(Arc::clone(&self.store)).audit_all().await
    }
}
