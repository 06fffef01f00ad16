//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods
//! that accept `&PgPool` as the first argument.

pub mod draft_repo;
pub mod draft_version_repo;

pub use draft_repo::DraftRepo;
pub use draft_version_repo::DraftVersionRepo;
