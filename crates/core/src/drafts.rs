//! Draft metadata rules: lifecycle statuses, input validation and defaults.
//!
//! The draft service and the persistence layer both rely on these so a
//! title or status accepted in one place is accepted everywhere.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Status constants
// ---------------------------------------------------------------------------

pub const STATUS_DRAFT: &str = "DRAFT";
pub const STATUS_REVIEW: &str = "REVIEW";
pub const STATUS_READY: &str = "READY";
pub const STATUS_PUBLISHED: &str = "PUBLISHED";

/// All valid draft lifecycle statuses.
pub const VALID_STATUSES: &[&str] = &[STATUS_DRAFT, STATUS_REVIEW, STATUS_READY, STATUS_PUBLISHED];

// ---------------------------------------------------------------------------
// Limits and defaults
// ---------------------------------------------------------------------------

/// Maximum title length in characters.
pub const MAX_TITLE_LEN: usize = 255;

/// Maximum change summary length in characters.
pub const MAX_CHANGE_SUMMARY_LEN: usize = 1_000;

/// Change summary recorded on revision 1 when the caller supplies none.
pub const INITIAL_VERSION_SUMMARY: &str = "Initial version";

/// Document type of the empty document used when a draft starts blank.
pub const EMPTY_DOCUMENT_TYPE: &str = "doc";

// ---------------------------------------------------------------------------
// Status enum
// ---------------------------------------------------------------------------

/// Draft lifecycle status with string conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DraftStatus {
    #[default]
    Draft,
    Review,
    Ready,
    Published,
}

impl DraftStatus {
    /// Return the database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => STATUS_DRAFT,
            Self::Review => STATUS_REVIEW,
            Self::Ready => STATUS_READY,
            Self::Published => STATUS_PUBLISHED,
        }
    }

    /// Parse from a string, returning an error for unknown statuses.
    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            STATUS_DRAFT => Ok(Self::Draft),
            STATUS_REVIEW => Ok(Self::Review),
            STATUS_READY => Ok(Self::Ready),
            STATUS_PUBLISHED => Ok(Self::Published),
            other => Err(CoreError::Validation(format!(
                "Invalid status '{other}'. Valid statuses: {}",
                VALID_STATUSES.join(", ")
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a draft title (non-empty after trimming, <= 255 chars).
pub fn validate_title(title: &str) -> Result<(), CoreError> {
    if title.trim().is_empty() {
        return Err(CoreError::Validation("Title must not be empty".into()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(CoreError::Validation(format!(
            "Title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate a draft status against the known set.
pub fn validate_status(status: &str) -> Result<(), CoreError> {
    DraftStatus::from_str(status).map(|_| ())
}

/// Validate an optional change summary (<= 1000 chars).
pub fn validate_change_summary(summary: Option<&str>) -> Result<(), CoreError> {
    match summary {
        Some(s) if s.chars().count() > MAX_CHANGE_SUMMARY_LEN => Err(CoreError::Validation(
            format!("Change summary must be at most {MAX_CHANGE_SUMMARY_LEN} characters"),
        )),
        _ => Ok(()),
    }
}

/// Validate that document content is a JSON object.
///
/// The internal structure is never inspected beyond that.
pub fn validate_content(content: &Value) -> Result<(), CoreError> {
    if content.is_object() {
        Ok(())
    } else {
        Err(CoreError::Validation(
            "Content must be a JSON object".to_string(),
        ))
    }
}

/// The document a draft starts with when no initial content is supplied.
pub fn empty_document() -> Value {
    json!({ "type": EMPTY_DOCUMENT_TYPE, "content": [] })
}
