use crate::types::{DbId, VersionNumber};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Version {version} not found for draft {draft_id}")]
    VersionNotFound {
        draft_id: DbId,
        version: VersionNumber,
    },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Concurrent modification of draft {draft_id}: gave up after {attempts} attempts")]
    ConcurrencyConflict { draft_id: DbId, attempts: u32 },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a missing draft.
    pub fn draft_not_found(id: DbId) -> Self {
        CoreError::NotFound { entity: "Draft", id }
    }

    /// `true` for both entity and version lookups that found nothing.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::NotFound { .. } | CoreError::VersionNotFound { .. }
        )
    }
}
