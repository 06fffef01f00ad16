//! Version-control core for collaboratively authored drafts.
//!
//! A draft owns an append-only chain of numbered revisions plus one mutable
//! working copy that autosave keeps overwriting. The managers in this crate
//! keep the draft's `current_version` pointer and its chain in agreement
//! under concurrent writers:
//!
//! - [`registry::DraftRegistry`] creates, reads, updates and deletes drafts.
//! - [`chain::VersionChain`] is the only path that appends revisions.
//! - [`autosave::Autosave`] saves, discards and commits the working copy.
//! - [`revert::RevertEngine`] re-appends a historical revision as the new head.
//! - [`audit::ChainAuditor`] checks stored chains against the invariant.
//!
//! [`service::DraftService`] bundles all of them over one [`store::DraftStore`].

pub mod audit;
pub mod autosave;
pub mod chain;
pub mod config;
pub mod error;
pub mod registry;
pub mod revert;
pub mod service;
pub mod store;

pub use config::VersioningConfig;
pub use error::{DraftError, DraftResult};
pub use service::DraftService;
