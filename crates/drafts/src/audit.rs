//! Offline check that stored chains satisfy the version invariant.

use std::sync::Arc;

use quire_core::types::DbId;
use quire_core::versioning::{verify_chain, ChainViolation};

use crate::error::DraftResult;
use crate::store::DraftStore;

/// A broken chain found by [`ChainAuditor::audit_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftViolation {
    pub draft_id: DbId,
    pub violation: ChainViolation,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditReport {
    pub drafts_checked: usize,
    pub violations: Vec<DraftViolation>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

pub struct ChainAuditor<S: DraftStore + ?Sized> {
    store: Arc<S>,
}

impl<S: DraftStore + ?Sized> ChainAuditor<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Check one draft. `Ok(None)` when the chain is sound or the draft no
    /// longer exists.
    pub async fn audit_draft(&self, draft_id: DbId) -> DraftResult<Option<ChainViolation>> {
        let Some(draft) = self.store.find_draft(draft_id).await? else {
            return Ok(None);
        };
        let versions = self.store.list_version_numbers(draft_id).await?;
        Ok(verify_chain(draft.current_version, &versions).err())
    }

    /// Check every draft in the store.
    pub async fn audit_all(&self) -> DraftResult<AuditReport> {
        let ids = self.store.list_draft_ids().await?;
        let mut report = AuditReport::default();

        for draft_id in ids {
            report.drafts_checked += 1;
            if let Some(violation) = self.audit_draft(draft_id).await? {
                tracing::warn!(draft_id, %violation, "Chain violation");
                report.violations.push(DraftViolation {
                    draft_id,
                    violation,
                });
            }
        }

        tracing::info!(
            drafts_checked = report.drafts_checked,
            violations = report.violations.len(),
            "Chain audit finished"
        );
        Ok(report)
    }
}
