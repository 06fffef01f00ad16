//! End-to-end draft lifecycle over the in-memory store.
//!
//! create -> autosave -> commit -> revert, plus the read paths an editor
//! uses along the way.

use std::time::Duration;

use assert_matches::assert_matches;
use quire_core::drafts::{STATUS_PUBLISHED, STATUS_READY};
use quire_core::error::CoreError;
use quire_db::models::draft::UpdateDraft;
use quire_drafts::chain::NewRevision;
use quire_drafts::{DraftError, DraftService, VersioningConfig};
use serde_json::json;

fn service() -> DraftService<quire_drafts::store::MemoryDraftStore> {
    DraftService::in_memory(VersioningConfig {
        max_append_attempts: 5,
        retry_base_delay: Duration::from_millis(1),
    })
}

#[tokio::test]
async fn test_save_commit_revert_scenario() {
    let svc = service();

    let created = svc
        .create_draft(1, 10, "T", Some(json!({"type": "doc"})), None)
        .await
        .unwrap();
    let id = created.draft.id;
    assert_eq!(created.draft.current_version, 1);
    assert_eq!(svc.list_revisions(id).await.unwrap().len(), 1);

    let draft = svc
        .save_working_copy(id, json!({"type": "doc", "edited": true}))
        .await
        .unwrap();
    assert!(draft.has_working_copy());
    assert_eq!(draft.current_version, 1);

    let v2 = svc.commit_working_copy(id, 10, None).await.unwrap();
    assert_eq!(v2.version, 2);
    assert_eq!(v2.content, json!({"type": "doc", "edited": true}));
    let detail = svc.get_draft(id).await.unwrap();
    assert_eq!(detail.draft.current_version, 2);
    assert!(!detail.draft.has_working_copy());

    let v3 = svc.revert_to_version(id, 1, 10).await.unwrap();
    assert_eq!(v3.version, 3);
    assert_eq!(v3.content, json!({"type": "doc"}));
    assert_eq!(v3.change_summary.as_deref(), Some("Reverted to version 1"));

    let history = svc.list_revisions(id).await.unwrap();
    let numbers: Vec<_> = history.iter().map(|v| v.version).collect();
    assert_eq!(numbers, vec![3, 2, 1]);
    assert_eq!(history[2].content, json!({"type": "doc"}));
    assert_eq!(history[1].content, json!({"type": "doc", "edited": true}));

    let detail = svc.get_draft(id).await.unwrap();
    assert_eq!(detail.draft.current_version, 3);
    assert_eq!(detail.latest_version, v3);
    assert!(svc.audit().await.unwrap().is_clean());
}

#[tokio::test]
async fn test_discard_leaves_chain_untouched() {
    let svc = service();
    let id = svc.create_draft(1, 10, "Discard", None, None).await.unwrap().draft.id;
    svc.append_revision(id, NewRevision::new(json!({"type": "doc", "n": 2}), 10))
        .await
        .unwrap();

    svc.save_working_copy(id, json!({"type": "doc", "scratch": true}))
        .await
        .unwrap();
    let draft = svc.discard_working_copy(id).await.unwrap();

    assert!(!draft.has_working_copy());
    assert_eq!(draft.current_version, 2);
    let detail = svc.get_draft(id).await.unwrap();
    assert!(detail.draft.working_copy.is_none());
    assert_eq!(detail.latest_version.content, json!({"type": "doc", "n": 2}));
}

#[tokio::test]
async fn test_manual_append_keeps_working_copy() {
    let svc = service();
    let id = svc.create_draft(1, 10, "Manual", None, None).await.unwrap().draft.id;
    svc.save_working_copy(id, json!({"type": "doc", "wip": true}))
        .await
        .unwrap();

    svc.append_revision(id, NewRevision::new(json!({"type": "doc", "saved": true}), 10))
        .await
        .unwrap();

    let draft = svc.get_draft(id).await.unwrap().draft;
    assert_eq!(draft.current_version, 2);
    assert_eq!(draft.working_copy, Some(json!({"type": "doc", "wip": true})));
}

#[tokio::test]
async fn test_metadata_changes_never_create_versions() {
    let svc = service();
    let id = svc.create_draft(1, 10, "Meta", None, None).await.unwrap().draft.id;

    for status in [STATUS_READY, STATUS_PUBLISHED] {
        svc.update_metadata(
            id,
            UpdateDraft {
                title: Some(format!("Meta {status}")),
                status: Some(status.to_string()),
            },
        )
        .await
        .unwrap();
    }

    let detail = svc.get_draft(id).await.unwrap();
    assert_eq!(detail.draft.title, "Meta PUBLISHED");
    assert_eq!(detail.draft.status, STATUS_PUBLISHED);
    assert_eq!(detail.draft.current_version, 1);
    assert_eq!(svc.list_revisions(id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_drafts_orders_by_recent_activity() {
    let svc = service();
    let older = svc.create_draft(1, 10, "Older", None, None).await.unwrap().draft.id;
    let newer = svc.create_draft(1, 10, "Newer", None, None).await.unwrap().draft.id;
    svc.create_draft(2, 10, "Other workspace", None, None).await.unwrap();

    tokio::time::sleep(Duration::from_millis(2)).await;
    svc.append_revision(older, NewRevision::new(json!({"type": "doc"}), 10))
        .await
        .unwrap();

    let listed = svc.list_drafts(1).await.unwrap();
    let ids: Vec<_> = listed.iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![older, newer]);
    assert_eq!(listed[0].version_count, 2);
    assert_eq!(listed[1].version_count, 1);
}

#[tokio::test]
async fn test_deleted_draft_rejects_every_operation() {
    let svc = service();
    let id = svc.create_draft(1, 10, "Doomed", None, None).await.unwrap().draft.id;
    svc.delete_draft(id).await.unwrap();

    assert_matches!(svc.get_draft(id).await, Err(e) if e.is_not_found());
    assert_matches!(svc.list_revisions(id).await, Err(e) if e.is_not_found());
    assert_matches!(svc.get_revision(id, 1).await, Err(e) if e.is_not_found());
    assert_matches!(
        svc.append_revision(id, NewRevision::new(json!({"type": "doc"}), 10)).await,
        Err(e) if e.is_not_found()
    );
    assert_matches!(
        svc.save_working_copy(id, json!({"type": "doc"})).await,
        Err(e) if e.is_not_found()
    );
    assert_matches!(svc.discard_working_copy(id).await, Err(e) if e.is_not_found());
    assert_matches!(svc.commit_working_copy(id, 10, None).await, Err(e) if e.is_not_found());
    assert_matches!(svc.revert_to_version(id, 1, 10).await, Err(e) if e.is_not_found());
}

#[tokio::test]
async fn test_validation_errors() {
    let svc = service();
    let id = svc.create_draft(1, 10, "Valid", None, None).await.unwrap().draft.id;

    let long_title = "x".repeat(256);
    assert_matches!(
        svc.create_draft(1, 10, &long_title, None, None).await,
        Err(DraftError::Core(CoreError::Validation(_)))
    );

    let long_summary = "s".repeat(1_001);
    assert_matches!(
        svc.append_revision(
            id,
            NewRevision::new(json!({"type": "doc"}), 10).with_summary(long_summary.clone())
        )
        .await,
        Err(DraftError::Core(CoreError::Validation(_)))
    );

    svc.save_working_copy(id, json!({"type": "doc"})).await.unwrap();
    assert_matches!(
        svc.commit_working_copy(id, 10, Some(long_summary)).await,
        Err(DraftError::Core(CoreError::Validation(_)))
    );
    assert_matches!(
        svc.save_working_copy(id, json!(null)).await,
        Err(DraftError::Core(CoreError::Validation(_)))
    );

    let draft = svc.get_draft(id).await.unwrap().draft;
    assert_eq!(draft.current_version, 1);
    assert!(draft.has_working_copy(), "failed commit must keep the working copy");
}
