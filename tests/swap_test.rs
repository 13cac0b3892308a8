mod common;

use common::*;
use settle_sync::domain::error::CoreError;
use settle_sync::domain::swap::{SwapAction, SwapStatus};
use settle_sync::infra::postgres::{grant_repo, swap_repo};
use settle_sync::services::swap_engine::{expire_stale, transition};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

struct Parties {
    requester: Uuid,
    responder: Uuid,
    requested_item: Uuid,
    offered_item: Uuid,
}

impl Parties {
    fn new() -> Self {
        Self {
            requester: Uuid::now_v7(),
            responder: Uuid::now_v7(),
            requested_item: Uuid::now_v7(),
            offered_item: Uuid::now_v7(),
        }
    }
}

async fn seed_swap(pool: &sqlx::PgPool, p: &Parties) -> Uuid {
    swap_repo::create(
        pool,
        p.requester,
        p.responder,
        p.requested_item,
        p.offered_item,
    )
    .await
    .unwrap()
}

fn notifier() -> Arc<RecordingNotifier> {
    Arc::new(RecordingNotifier::default())
}

// ── 1. responder_accepts ───────────────────────────────────────────────────

#[tokio::test]
async fn responder_accepts() {
    let pool = setup_pool("settle_sync_test_swap").await;
    let p = Parties::new();
    let id = seed_swap(&pool, &p).await;
    let grants = RecordingGrants::default();

    let status = transition(&pool, &grants, notifier(), id, Some(p.responder), SwapAction::Accept)
        .await
        .unwrap();
    assert_eq!(status, SwapStatus::Accepted);
    assert_eq!(get_swap_status(&pool, id).await, "accepted");
}

// ── 2. responder_declines ──────────────────────────────────────────────────

#[tokio::test]
async fn responder_declines() {
    let pool = setup_pool("settle_sync_test_swap").await;
    let p = Parties::new();
    let id = seed_swap(&pool, &p).await;
    let grants = RecordingGrants::default();

    let status = transition(&pool, &grants, notifier(), id, Some(p.responder), SwapAction::Decline)
        .await
        .unwrap();
    assert_eq!(status, SwapStatus::Declined);
}

// ── 3. requester_cancels ───────────────────────────────────────────────────

#[tokio::test]
async fn requester_cancels() {
    let pool = setup_pool("settle_sync_test_swap").await;
    let p = Parties::new();
    let id = seed_swap(&pool, &p).await;
    let grants = RecordingGrants::default();

    let status = transition(&pool, &grants, notifier(), id, Some(p.requester), SwapAction::Cancel)
        .await
        .unwrap();
    assert_eq!(status, SwapStatus::Cancelled);
}

// ── 4. requester_cannot_accept_own_request ─────────────────────────────────

#[tokio::test]
async fn requester_cannot_accept_own_request() {
    let pool = setup_pool("settle_sync_test_swap").await;
    let p = Parties::new();
    let id = seed_swap(&pool, &p).await;
    let grants = RecordingGrants::default();

    let err = transition(&pool, &grants, notifier(), id, Some(p.requester), SwapAction::Accept)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Auth(_)));
    assert_eq!(get_swap_status(&pool, id).await, "requested");
}

// ── 5. responder_cannot_cancel ─────────────────────────────────────────────

#[tokio::test]
async fn responder_cannot_cancel() {
    let pool = setup_pool("settle_sync_test_swap").await;
    let p = Parties::new();
    let id = seed_swap(&pool, &p).await;
    let grants = RecordingGrants::default();

    let err = transition(&pool, &grants, notifier(), id, Some(p.responder), SwapAction::Cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Auth(_)));
}

// ── 6. outsider_cannot_fulfill ─────────────────────────────────────────────

#[tokio::test]
async fn outsider_cannot_fulfill() {
    let pool = setup_pool("settle_sync_test_swap").await;
    let p = Parties::new();
    let id = seed_swap(&pool, &p).await;
    let grants = RecordingGrants::default();

    transition(&pool, &grants, notifier(), id, Some(p.responder), SwapAction::Accept)
        .await
        .unwrap();

    let err = transition(&pool, &grants, notifier(), id, Some(Uuid::now_v7()), SwapAction::Fulfill)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Auth(_)));
    assert_eq!(get_swap_status(&pool, id).await, "accepted");
}

// ── 7. fulfill_from_requested_is_conflict ──────────────────────────────────

#[tokio::test]
async fn fulfill_from_requested_is_conflict() {
    let pool = setup_pool("settle_sync_test_swap").await;
    let p = Parties::new();
    let id = seed_swap(&pool, &p).await;
    let grants = RecordingGrants::default();

    let err = transition(&pool, &grants, notifier(), id, Some(p.requester), SwapAction::Fulfill)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));
    assert!(grants.granted().is_empty());
}

// ── 8. fulfill_grants_both_parties ─────────────────────────────────────────

#[tokio::test]
async fn fulfill_grants_both_parties() {
    let pool = setup_pool("settle_sync_test_swap").await;
    let p = Parties::new();
    let id = seed_swap(&pool, &p).await;
    let grants = RecordingGrants::default();

    transition(&pool, &grants, notifier(), id, Some(p.responder), SwapAction::Accept)
        .await
        .unwrap();
    let status = transition(&pool, &grants, notifier(), id, Some(p.requester), SwapAction::Fulfill)
        .await
        .unwrap();
    assert_eq!(status, SwapStatus::Fulfilled);

    let granted = grants.granted();
    assert_eq!(granted.len(), 2);
    assert!(granted.contains(&(p.requester, p.requested_item)));
    assert!(granted.contains(&(p.responder, p.offered_item)));
}

// ── 9. grant_failure_does_not_roll_back_fulfillment ────────────────────────

#[tokio::test]
async fn grant_failure_does_not_roll_back_fulfillment() {
    let pool = setup_pool("settle_sync_test_swap").await;
    let p = Parties::new();
    let id = seed_swap(&pool, &p).await;
    let grants = RecordingGrants::failing();

    transition(&pool, &grants, notifier(), id, Some(p.responder), SwapAction::Accept)
        .await
        .unwrap();
    let status = transition(&pool, &grants, notifier(), id, Some(p.responder), SwapAction::Fulfill)
        .await
        .unwrap();
    assert_eq!(status, SwapStatus::Fulfilled);
    assert_eq!(get_swap_status(&pool, id).await, "fulfilled");
}

// ── 10. terminal_states_reject_everything ──────────────────────────────────

#[tokio::test]
async fn terminal_states_reject_everything() {
    let pool = setup_pool("settle_sync_test_swap").await;
    let p = Parties::new();
    let id = seed_swap(&pool, &p).await;
    let grants = RecordingGrants::default();

    transition(&pool, &grants, notifier(), id, Some(p.responder), SwapAction::Decline)
        .await
        .unwrap();

    for (actor, action) in [
        (Some(p.responder), SwapAction::Accept),
        (Some(p.responder), SwapAction::Decline),
        (Some(p.requester), SwapAction::Cancel),
        (Some(p.requester), SwapAction::Fulfill),
        (None, SwapAction::Expire),
    ] {
        let err = transition(&pool, &grants, notifier(), id, actor, action)
            .await
            .unwrap_err();
        assert!(
            matches!(err, CoreError::Conflict(_)),
            "{action} from declined should be a conflict"
        );
    }
}

// ── 11. human_cannot_expire ────────────────────────────────────────────────

#[tokio::test]
async fn human_cannot_expire() {
    let pool = setup_pool("settle_sync_test_swap").await;
    let p = Parties::new();
    let id = seed_swap(&pool, &p).await;
    let grants = RecordingGrants::default();

    for actor in [p.requester, p.responder, Uuid::now_v7()] {
        let err = transition(&pool, &grants, notifier(), id, Some(actor), SwapAction::Expire)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Auth(_)));
    }
    assert_eq!(get_swap_status(&pool, id).await, "requested");
}

// ── 12. unknown_swap_is_not_found ──────────────────────────────────────────

#[tokio::test]
async fn unknown_swap_is_not_found() {
    let pool = setup_pool("settle_sync_test_swap").await;
    let grants = RecordingGrants::default();

    let err = transition(
        &pool,
        &grants,
        notifier(),
        Uuid::now_v7(),
        Some(Uuid::now_v7()),
        SwapAction::Accept,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}

// ── 13. transition_writes_audit_entry ──────────────────────────────────────

#[tokio::test]
async fn transition_writes_audit_entry() {
    let pool = setup_pool("settle_sync_test_swap").await;
    let p = Parties::new();
    let id = seed_swap(&pool, &p).await;
    let grants = RecordingGrants::default();

    transition(&pool, &grants, notifier(), id, Some(p.responder), SwapAction::Accept)
        .await
        .unwrap();

    let audits = get_audit_entries(&pool, id).await;
    assert_eq!(audits.len(), 1);
    assert_eq!(audits[0].action, "status_changed");
    assert_eq!(audits[0].detail["old_status"], "requested");
    assert_eq!(audits[0].detail["new_status"], "accepted");
    assert_eq!(audits[0].actor, p.responder.to_string());
}

// ── 14. fulfillment_notifies_both_parties ──────────────────────────────────

#[tokio::test]
async fn fulfillment_notifies_both_parties() {
    let pool = setup_pool("settle_sync_test_swap").await;
    let p = Parties::new();
    let id = seed_swap(&pool, &p).await;
    let grants = RecordingGrants::default();
    let sink = notifier();

    transition(&pool, &grants, sink.clone(), id, Some(p.responder), SwapAction::Accept)
        .await
        .unwrap();
    transition(&pool, &grants, sink.clone(), id, Some(p.requester), SwapAction::Fulfill)
        .await
        .unwrap();

    // Fan-out is spawned; give it a beat to land.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let notified = sink.notified();
    assert!(notified.contains(&(p.requester, "swap_fulfilled".to_string())));
    assert!(notified.contains(&(p.responder, "swap_fulfilled".to_string())));
}

// ── 15. expiry_sweep_expires_only_stale_requested ──────────────────────────

#[tokio::test]
async fn expiry_sweep_expires_only_stale_requested() {
    let pool = setup_pool("settle_sync_test_swap").await;
    let grants = RecordingGrants::default();

    let stale_a = Parties::new();
    let stale_b = Parties::new();
    let fresh = Parties::new();
    let accepted = Parties::new();

    let id_a = seed_swap(&pool, &stale_a).await;
    let id_b = seed_swap(&pool, &stale_b).await;
    let id_fresh = seed_swap(&pool, &fresh).await;
    let id_accepted = seed_swap(&pool, &accepted).await;

    backdate_swap(&pool, id_a, 100).await;
    backdate_swap(&pool, id_b, 100).await;
    backdate_swap(&pool, id_accepted, 100).await;
    transition(
        &pool,
        &grants,
        notifier(),
        id_accepted,
        Some(accepted.responder),
        SwapAction::Accept,
    )
    .await
    .unwrap();

    let report = expire_stale(&pool, &grants, notifier(), Duration::from_secs(72 * 3600))
        .await
        .unwrap();

    assert_eq!(report.expired, 2);
    assert_eq!(report.failed, 0);
    assert_eq!(get_swap_status(&pool, id_a).await, "expired");
    assert_eq!(get_swap_status(&pool, id_b).await, "expired");
    assert_eq!(get_swap_status(&pool, id_fresh).await, "requested");
    assert_eq!(get_swap_status(&pool, id_accepted).await, "accepted");
}

// ── 16. pg_grants_are_idempotent ───────────────────────────────────────────

#[tokio::test]
async fn pg_grants_are_idempotent() {
    let pool = setup_pool("settle_sync_test_swap").await;
    let user = Uuid::now_v7();
    let item = Uuid::now_v7();

    grant_repo::insert_grant(&pool, user, item).await.unwrap();
    grant_repo::insert_grant(&pool, user, item).await.unwrap();
    assert!(grant_repo::has_grant(&pool, user, item).await.unwrap());

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM content_grants WHERE user_id = $1 AND item_id = $2",
    )
    .bind(user)
    .bind(item)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(count, 1);
}
