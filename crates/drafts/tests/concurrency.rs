//! Concurrent writers against one draft.
//!
//! Runs on the multi-threaded runtime so that appends, commits and discards
//! really interleave.

use std::collections::HashSet;
use std::time::Duration;

use quire_core::versioning::verify_chain;
use quire_drafts::chain::NewRevision;
use quire_drafts::store::{DraftStore, MemoryDraftStore};
use quire_drafts::{DraftService, VersioningConfig};
use serde_json::json;

const WRITERS: usize = 12;

fn service(max_append_attempts: u32) -> DraftService<MemoryDraftStore> {
    DraftService::in_memory(VersioningConfig {
        max_append_attempts,
        retry_base_delay: Duration::from_millis(1),
    })
}

async fn assert_chain_sound(svc: &DraftService<MemoryDraftStore>, draft_id: i64) {
    let draft = svc.store().find_draft(draft_id).await.unwrap().unwrap();
    let versions = svc.store().list_version_numbers(draft_id).await.unwrap();
    assert_eq!(verify_chain(draft.current_version, &versions), Ok(()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_appends_get_distinct_consecutive_versions() {
    // A writer can only lose to each of the others once.
    let svc = service(WRITERS as u32 + 1);
    let id = svc.create_draft(1, 1, "Race", None, None).await.unwrap().draft.id;

    let handles: Vec<_> = (0..WRITERS)
        .map(|n| {
            let svc = svc.clone();
            tokio::spawn(async move {
                svc.append_revision(id, NewRevision::new(json!({"type": "doc", "writer": n}), n as i64))
                    .await
            })
        })
        .collect();

    let mut assigned = HashSet::new();
    for result in futures::future::join_all(handles).await {
        let version = result.unwrap().unwrap();
        assert!(assigned.insert(version.version), "version {} assigned twice", version.version);
    }

    let expected: HashSet<i32> = (2..=WRITERS as i32 + 1).collect();
    assert_eq!(assigned, expected);
    assert_eq!(
        svc.get_draft(id).await.unwrap().draft.current_version,
        WRITERS as i32 + 1
    );
    assert_chain_sound(&svc, id).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_double_commit_creates_one_revision() {
    let svc = service(WRITERS as u32 + 1);
    let id = svc.create_draft(1, 1, "Double click", None, None).await.unwrap().draft.id;
    svc.save_working_copy(id, json!({"type": "doc", "wip": true}))
        .await
        .unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let svc = svc.clone();
            tokio::spawn(async move { svc.commit_working_copy(id, 1, None).await })
        })
        .collect();

    let mut committed = 0;
    for result in futures::future::join_all(handles).await {
        match result.unwrap() {
            Ok(version) => {
                committed += 1;
                assert_eq!(version.content, json!({"type": "doc", "wip": true}));
            }
            Err(err) => assert!(err.is_invalid_state(), "unexpected error: {err}"),
        }
    }

    assert_eq!(committed, 1);
    let draft = svc.get_draft(id).await.unwrap().draft;
    assert_eq!(draft.current_version, 2);
    assert!(!draft.has_working_copy());
    assert_chain_sound(&svc, id).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_commit_racing_discard_never_resurrects_content() {
    for round in 0..20 {
        let svc = service(4);
        let id = svc.create_draft(1, 1, "Commit vs discard", None, None).await.unwrap().draft.id;
        svc.save_working_copy(id, json!({"type": "doc", "round": round}))
            .await
            .unwrap();

        let committer = {
            let svc = svc.clone();
            tokio::spawn(async move { svc.commit_working_copy(id, 1, None).await })
        };
        let discarder = {
            let svc = svc.clone();
            tokio::spawn(async move { svc.discard_working_copy(id).await })
        };
        let (commit, discard) = (committer.await.unwrap(), discarder.await.unwrap());

        discard.unwrap();
        let draft = svc.get_draft(id).await.unwrap().draft;
        assert!(!draft.has_working_copy());
        match commit {
            Ok(version) => {
                assert_eq!(version.version, 2);
                assert_eq!(draft.current_version, 2);
            }
            Err(err) => {
                assert!(err.is_invalid_state(), "unexpected error: {err}");
                assert_eq!(draft.current_version, 1);
            }
        }
        assert_chain_sound(&svc, id).await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_autosaves_do_not_disturb_appends() {
    let svc = service(WRITERS as u32 + 1);
    let id = svc.create_draft(1, 1, "Busy", None, None).await.unwrap().draft.id;

    let appends: Vec<_> = (0..WRITERS)
        .map(|n| {
            let svc = svc.clone();
            tokio::spawn(async move {
                svc.append_revision(id, NewRevision::new(json!({"type": "doc", "n": n}), 1))
                    .await
                    .map(|_| ())
            })
        })
        .collect();
    let saves: Vec<_> = (0..WRITERS)
        .map(|n| {
            let svc = svc.clone();
            tokio::spawn(async move {
                svc.save_working_copy(id, json!({"type": "doc", "autosave": n}))
                    .await
                    .map(|_| ())
            })
        })
        .collect();

    for result in futures::future::join_all(appends.into_iter().chain(saves)).await {
        result.unwrap().unwrap();
    }

    let draft = svc.get_draft(id).await.unwrap().draft;
    assert_eq!(draft.current_version, WRITERS as i32 + 1);
    assert!(draft.has_working_copy());
    assert_chain_sound(&svc, id).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_independent_drafts_do_not_interfere() {
    let svc = service(3);
    let a = svc.create_draft(1, 1, "A", None, None).await.unwrap().draft.id;
    let b = svc.create_draft(1, 1, "B", None, None).await.unwrap().draft.id;

    let handles: Vec<_> = [a, b]
        .into_iter()
        .map(|id| {
            let svc = svc.clone();
            tokio::spawn(async move {
                for _ in 0..10 {
                    svc.append_revision(id, NewRevision::new(json!({"type": "doc"}), 1))
                        .await?;
                }
                Ok::<_, quire_drafts::DraftError>(())
            })
        })
        .collect();
    for result in futures::future::join_all(handles).await {
        result.unwrap().unwrap();
    }

    assert_eq!(svc.get_draft(a).await.unwrap().draft.current_version, 11);
    assert_eq!(svc.get_draft(b).await.unwrap().draft.current_version, 11);
    assert!(svc.audit().await.unwrap().is_clean());
}

#[tokio::test]
async fn test_exhausted_retries_surface_conflict_and_write_nothing() {
    let svc = service(3);
    let id = svc.create_draft(1, 1, "Contended", None, None).await.unwrap().draft.id;
    svc.store().inject_append_conflicts(3);

    let err = svc
        .append_revision(id, NewRevision::new(json!({"type": "doc"}), 1))
        .await
        .unwrap_err();

    assert!(err.is_transient());
    assert_eq!(svc.list_revisions(id).await.unwrap().len(), 1);

    // The next request goes through once contention is gone.
    let v2 = svc
        .append_revision(id, NewRevision::new(json!({"type": "doc"}), 1))
        .await
        .unwrap();
    assert_eq!(v2.version, 2);
}
