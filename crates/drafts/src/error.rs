use quire_core::error::CoreError;

use crate::store::StoreError;

/// Error type returned by every draft operation.
///
/// Wraps [`CoreError`] for domain failures and [`StoreError`] for
/// infrastructure faults coming out of the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    /// A domain-level error from `quire_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A storage fault the core does not try to recover from.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Convenience type alias for draft operation results.
pub type DraftResult<T> = Result<T, DraftError>;

impl DraftError {
    /// `true` if the draft or the requested version does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DraftError::Core(core) if core.is_not_found())
    }

    /// `true` if retrying the same request later may succeed.
    ///
    /// Editors should present this as "please retry your save".
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DraftError::Core(CoreError::ConcurrencyConflict { .. })
                | DraftError::Store(StoreError::Conflict { .. })
        )
    }

    /// `true` for state errors such as committing with no working copy,
    /// which editors treat as a no-op rather than a failure.
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, DraftError::Core(CoreError::InvalidState(_)))
    }
}
