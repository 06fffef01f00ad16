//! Revision-chain arithmetic and invariants.
//!
//! A draft with N revisions stores versions exactly `1..=N` and its
//! `current_version` pointer equals N. Everything that creates or audits
//! revisions goes through the helpers here.

use std::time::Duration;

use crate::error::CoreError;
use crate::types::VersionNumber;

/// Version number of the revision created together with a draft.
pub const FIRST_VERSION: VersionNumber = 1;

/// Upper bound on a single retry delay.
pub const MAX_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Compute the version number that follows `current`.
pub fn next_version(current: VersionNumber) -> Result<VersionNumber, CoreError> {
    if current < FIRST_VERSION {
        return Err(CoreError::Internal(format!(
            "Current version {current} is below {FIRST_VERSION}"
        )));
    }
    current
        .checked_add(1)
        .ok_or_else(|| CoreError::Internal(format!("Version number overflow after {current}")))
}

/// Change summary recorded on a revision produced by reverting.
pub fn revert_summary(target: VersionNumber) -> String {
    format!("Reverted to version {target}")
}

/// Delay before retry `attempt` (1-based) of a conflicting append.
///
/// Doubles from `base` on every attempt, capped at [`MAX_RETRY_DELAY`].
pub fn retry_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
    base.saturating_mul(factor).min(MAX_RETRY_DELAY)
}

// ---------------------------------------------------------------------------
// Chain verification
// ---------------------------------------------------------------------------

/// A way in which a draft's stored chain disagrees with the invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainViolation {
    #[error("draft has no revisions")]
    Empty,

    #[error("expected version {expected}, found {found}")]
    Gap {
        expected: VersionNumber,
        found: VersionNumber,
    },

    #[error("version {0} is stored more than once")]
    Duplicate(VersionNumber),

    #[error("pointer is {pointer} but the highest stored version is {highest}")]
    PointerMismatch {
        pointer: VersionNumber,
        highest: VersionNumber,
    },
}

/// Check a draft's pointer against its stored version numbers.
///
/// `versions` may be in any order.
pub fn verify_chain(
    current_version: VersionNumber,
    versions: &[VersionNumber],
) -> Result<(), ChainViolation> {
    if versions.is_empty() {
        return Err(ChainViolation::Empty);
    }

    let mut sorted = versions.to_vec();
    sorted.sort_unstable();

    let mut expected = FIRST_VERSION;
    for (i, &found) in sorted.iter().enumerate() {
        if i > 0 && sorted[i - 1] == found {
            return Err(ChainViolation::Duplicate(found));
        }
        if found != expected {
            return Err(ChainViolation::Gap { expected, found });
        }
        expected += 1;
    }

    let highest = sorted[sorted.len() - 1];
    if highest != current_version {
        return Err(ChainViolation::PointerMismatch {
            pointer: current_version,
            highest,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_version_increments_by_one() {
        assert_eq!(next_version(1).unwrap(), 2);
        assert_eq!(next_version(41).unwrap(), 42);
    }

    #[test]
    fn test_next_version_rejects_invalid_pointer() {
        assert!(next_version(0).is_err());
        assert!(next_version(-3).is_err());
    }

    #[test]
    fn test_next_version_overflow() {
        assert!(next_version(VersionNumber::MAX).is_err());
    }

    #[test]
    fn test_revert_summary_text() {
        assert_eq!(revert_summary(3), "Reverted to version 3");
    }

    #[test]
    fn test_retry_delay_doubles_and_caps() {
        let base = Duration::from_millis(10);
        assert_eq!(retry_delay(base, 1), Duration::from_millis(10));
        assert_eq!(retry_delay(base, 2), Duration::from_millis(20));
        assert_eq!(retry_delay(base, 3), Duration::from_millis(40));
        assert_eq!(retry_delay(base, 10), MAX_RETRY_DELAY);
        assert_eq!(retry_delay(base, 200), MAX_RETRY_DELAY);
    }

    #[test]
    fn test_retry_delay_zero_base() {
        assert_eq!(retry_delay(Duration::ZERO, 4), Duration::ZERO);
    }

    #[test]
    fn test_verify_chain_accepts_contiguous_chain() {
        assert!(verify_chain(1, &[1]).is_ok());
        assert!(verify_chain(4, &[4, 2, 3, 1]).is_ok());
    }

    #[test]
    fn test_verify_chain_empty() {
        assert_eq!(verify_chain(1, &[]), Err(ChainViolation::Empty));
    }

    #[test]
    fn test_verify_chain_gap() {
        assert_eq!(
            verify_chain(3, &[1, 3]),
            Err(ChainViolation::Gap {
                expected: 2,
                found: 3
            })
        );
        assert_eq!(
            verify_chain(2, &[2]),
            Err(ChainViolation::Gap {
                expected: 1,
                found: 2
            })
        );
    }

    #[test]
    fn test_verify_chain_duplicate() {
        assert_eq!(
            verify_chain(2, &[1, 2, 2]),
            Err(ChainViolation::Duplicate(2))
        );
    }

    #[test]
    fn test_verify_chain_pointer_mismatch() {
        assert_eq!(
            verify_chain(2, &[1, 2, 3]),
            Err(ChainViolation::PointerMismatch {
                pointer: 2,
                highest: 3
            })
        );
        assert_eq!(
            verify_chain(5, &[1, 2, 3]),
            Err(ChainViolation::PointerMismatch {
                pointer: 5,
                highest: 3
            })
        );
    }
}
