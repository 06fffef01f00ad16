//! In-process [`DraftStore`] used by tests and by embedders that do not
//! need durability.
//!
//! All state sits behind one `RwLock`, so each trait method is atomic. The
//! conditional append checks exactly what the PostgreSQL implementation
//! checks and reports the same [`StoreError::Conflict`].

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use quire_core::drafts::STATUS_DRAFT;
use quire_core::types::{DbId, Timestamp, VersionNumber};
use quire_core::versioning::FIRST_VERSION;
use quire_db::models::draft::{CreateDraft, Draft, DraftSummary, UpdateDraft};
use quire_db::models::draft_version::{AppendDraftVersion, CreateDraftVersion, DraftVersion};
use tokio::sync::RwLock;

use super::{DraftStore, StoreError, StoreResult};

#[derive(Debug, Default)]
struct MemoryState {
    last_draft_id: DbId,
    last_version_id: DbId,
    drafts: BTreeMap<DbId, Draft>,
    /// Versions per draft in ascending version order.
    versions: BTreeMap<DbId, Vec<DraftVersion>>,
}

impl MemoryState {
    fn push_version(
        &mut self,
        draft_id: DbId,
        version: VersionNumber,
        input: &CreateDraftVersion,
        now: Timestamp,
    ) -> DraftVersion {
        self.last_version_id += 1;
        let row = DraftVersion {
            id: self.last_version_id,
            draft_id,
            version,
            content: input.content.clone(),
            content_html: input.content_html.clone(),
            content_markdown: input.content_markdown.clone(),
            change_summary: input.change_summary.clone(),
            created_by: input.created_by,
            created_at: now,
        };
        self.versions.entry(draft_id).or_default().push(row.clone());
        row
    }
}

/// A [`DraftStore`] holding everything in memory.
#[derive(Debug, Default)]
pub struct MemoryDraftStore {
    state: RwLock<MemoryState>,
    injected_conflicts: AtomicU32,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` calls to `append_version` fail with
    /// [`StoreError::Conflict`] without writing, as if another writer had
    /// won each race.
    pub fn inject_append_conflicts(&self, count: u32) {
        self.injected_conflicts.store(count, Ordering::SeqCst);
    }

    fn take_injected_conflict(&self) -> bool {
        self.injected_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl DraftStore for MemoryDraftStore {
    async fn create_draft(&self, input: &CreateDraft) -> StoreResult<(Draft, DraftVersion)> {
        let mut state = self.state.write().await;
        let now = Utc::now();

        state.last_draft_id += 1;
        let draft = Draft {
            id: state.last_draft_id,
            workspace_id: input.workspace_id,
            created_by: input.created_by,
            title: input.title.clone(),
            status: STATUS_DRAFT.to_string(),
            current_version: FIRST_VERSION,
            working_copy: None,
            working_copy_saved_at: None,
            created_at: now,
            updated_at: now,
        };
        state.drafts.insert(draft.id, draft.clone());

        let first = CreateDraftVersion {
            content: input.content.clone(),
            content_html: None,
            content_markdown: None,
            change_summary: input.change_summary.clone(),
            created_by: input.created_by,
        };
        let version = state.push_version(draft.id, FIRST_VERSION, &first, now);

        Ok((draft, version))
    }

    async fn find_draft(&self, id: DbId) -> StoreResult<Option<Draft>> {
        Ok(self.state.read().await.drafts.get(&id).cloned())
    }

    async fn list_drafts(&self, workspace_id: DbId) -> StoreResult<Vec<DraftSummary>> {
        let state = self.state.read().await;
        let mut rows: Vec<DraftSummary> = state
            .drafts
            .values()
            .filter(|d| d.workspace_id == workspace_id)
            .map(|d| DraftSummary {
                id: d.id,
                workspace_id: d.workspace_id,
                created_by: d.created_by,
                title: d.title.clone(),
                status: d.status.clone(),
                current_version: d.current_version,
                working_copy_saved_at: d.working_copy_saved_at,
                version_count: state.versions.get(&d.id).map_or(0, |v| v.len() as i64),
                created_at: d.created_at,
                updated_at: d.updated_at,
            })
            .collect();
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn list_draft_ids(&self) -> StoreResult<Vec<DbId>> {
        Ok(self.state.read().await.drafts.keys().copied().collect())
    }

    async fn update_metadata(&self, id: DbId, input: &UpdateDraft) -> StoreResult<Option<Draft>> {
        let mut state = self.state.write().await;
        let Some(draft) = state.drafts.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = &input.title {
            draft.title = title.clone();
        }
        if let Some(status) = &input.status {
            draft.status = status.clone();
        }
        draft.updated_at = Utc::now();
        Ok(Some(draft.clone()))
    }

    async fn delete_draft(&self, id: DbId) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        let removed = state.drafts.remove(&id).is_some();
        state.versions.remove(&id);
        Ok(removed)
    }

    async fn append_version(&self, input: &AppendDraftVersion) -> StoreResult<DraftVersion> {
        let conflict = StoreError::Conflict {
            draft_id: input.draft_id,
            expected_version: input.expected_version,
        };
        if self.take_injected_conflict() {
            return Err(conflict);
        }

        let mut state = self.state.write().await;
        let now = Utc::now();
        let next = input.expected_version.saturating_add(1);

        let Some(draft) = state.drafts.get_mut(&input.draft_id) else {
            return Err(conflict);
        };
        if draft.current_version != input.expected_version {
            return Err(conflict);
        }
        if let Some(saved_at) = input.clear_working_copy {
            if draft.working_copy_saved_at != Some(saved_at) {
                return Err(conflict);
            }
            draft.working_copy = None;
            draft.working_copy_saved_at = None;
        }
        draft.current_version = next;
        draft.updated_at = now;

        Ok(state.push_version(input.draft_id, next, &input.version, now))
    }

    async fn find_version(
        &self,
        draft_id: DbId,
        version: VersionNumber,
    ) -> StoreResult<Option<DraftVersion>> {
        let state = self.state.read().await;
        Ok(state
            .versions
            .get(&draft_id)
            .and_then(|chain| chain.iter().find(|v| v.version == version))
            .cloned())
    }

    async fn latest_version(&self, draft_id: DbId) -> StoreResult<Option<DraftVersion>> {
        let state = self.state.read().await;
        Ok(state
            .versions
            .get(&draft_id)
            .and_then(|chain| chain.last())
            .cloned())
    }

    async fn list_versions(&self, draft_id: DbId) -> StoreResult<Vec<DraftVersion>> {
        let state = self.state.read().await;
        Ok(state
            .versions
            .get(&draft_id)
            .map(|chain| chain.iter().rev().cloned().collect())
            .unwrap_or_default())
    }

    async fn list_version_numbers(&self, draft_id: DbId) -> StoreResult<Vec<VersionNumber>> {
        let state = self.state.read().await;
        Ok(state
            .versions
            .get(&draft_id)
            .map(|chain| chain.iter().map(|v| v.version).collect())
            .unwrap_or_default())
    }

    async fn save_working_copy(
        &self,
        id: DbId,
        content: &serde_json::Value,
        saved_at: Timestamp,
    ) -> StoreResult<Option<Draft>> {
        let mut state = self.state.write().await;
        let Some(draft) = state.drafts.get_mut(&id) else {
            return Ok(None);
        };
        draft.working_copy = Some(content.clone());
        draft.working_copy_saved_at = Some(saved_at);
        draft.updated_at = Utc::now();
        Ok(Some(draft.clone()))
    }

    async fn clear_working_copy(&self, id: DbId) -> StoreResult<Option<Draft>> {
        let mut state = self.state.write().await;
        let Some(draft) = state.drafts.get_mut(&id) else {
            return Ok(None);
        };
        if draft.working_copy.is_some() {
            draft.working_copy = None;
            draft.working_copy_saved_at = None;
            draft.updated_at = Utc::now();
        }
        Ok(Some(draft.clone()))
    }
}
