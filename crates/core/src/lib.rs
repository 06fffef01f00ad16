//! Domain rules for the Quire draft version-control core.
//!
//! Everything here is free of I/O and internal dependencies so the
//! persistence layer, the draft service and the maintenance tooling can all
//! share one definition of what a valid draft and a valid chain look like.

pub mod drafts;
pub mod error;
pub mod types;
pub mod versioning;
