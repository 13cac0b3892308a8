use {
    crate::domain::{
        audit::NewAuditEntry,
        collaborators::{ContentGrants, NotificationSink},
        error::CoreError,
        swap::{SwapAction, SwapRequest, SwapStatus},
    },
    crate::infra::postgres::{audit_repo::insert_audit_entry, swap_repo},
    chrono::Utc,
    sqlx::PgPool,
    std::{sync::Arc, time::Duration},
    uuid::Uuid,
};

/// Drive one guarded transition of the swap state machine.
///
/// `actor` is `None` for the system (scheduler-driven expiry). Order of
/// guards: existence (404), actor role (403), state legality (409), then
/// a compare-and-swap write conditioned on the loaded status — under two
/// concurrent calls exactly one CAS applies and the other reports a
/// conflict, never a double transition.
pub async fn transition(
    pool: &PgPool,
    grants: &dyn ContentGrants,
    notifier: Arc<dyn NotificationSink>,
    swap_id: Uuid,
    actor: Option<Uuid>,
    action: SwapAction,
) -> Result<SwapStatus, CoreError> {
    let swap = swap_repo::get(pool, swap_id)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("swap {swap_id} not found")))?;

    let role = swap.classify(actor);
    swap.authorize(role, action)?;
    let target = swap.check_transition(action)?;

    let applied = swap_repo::cas_status(pool, swap_id, swap.status, target).await?;
    if !applied {
        return Err(CoreError::Conflict(format!(
            "swap {swap_id} changed concurrently, {action} not applied"
        )));
    }

    record_transition(pool, &swap, actor, action, target).await;

    // The CAS above guarantees this branch runs at most once per swap.
    // A grant failure after the status write is logged for manual
    // reconciliation; the transition is never rolled back.
    if target == SwapStatus::Fulfilled {
        fulfill(grants, &swap).await;
    }

    fan_out(notifier, &swap, target);

    Ok(target)
}

async fn record_transition(
    pool: &PgPool,
    swap: &SwapRequest,
    actor: Option<Uuid>,
    action: SwapAction,
    target: SwapStatus,
) {
    let audit = NewAuditEntry {
        id: Uuid::now_v7(),
        entity_type: "swap_request".to_string(),
        entity_id: Some(swap.id),
        external_id: None,
        event_id: None,
        action: "status_changed".to_string(),
        actor: actor
            .map(|id| id.to_string())
            .unwrap_or_else(|| "system".to_string()),
        detail: serde_json::json!({
            "action": action.as_str(),
            "old_status": swap.status.as_str(),
            "new_status": target.as_str(),
        }),
    };
    if let Err(e) = insert_audit_entry(pool, &audit).await {
        tracing::error!(swap_id = %swap.id, error = %e, "audit write failed after transition");
    }
}

async fn fulfill(grants: &dyn ContentGrants, swap: &SwapRequest) {
    // Each party gains access to the item the other side put up.
    for (user_id, item_id) in [
        (swap.requester_id, swap.requested_item_id),
        (swap.responder_id, swap.offered_item_id),
    ] {
        if let Err(e) = grants.grant_access(user_id, item_id).await {
            tracing::error!(
                swap_id = %swap.id,
                %user_id,
                %item_id,
                error = %e,
                "content grant failed after fulfillment, needs manual reconciliation"
            );
        }
    }
}

/// Post-commit notification fan-out. Spawned fire-and-forget: failures
/// are logged and never block or reverse the transition.
fn fan_out(notifier: Arc<dyn NotificationSink>, swap: &SwapRequest, target: SwapStatus) {
    let recipients: Vec<Uuid> = match target {
        SwapStatus::Accepted | SwapStatus::Declined => vec![swap.requester_id],
        SwapStatus::Cancelled => vec![swap.responder_id],
        SwapStatus::Fulfilled | SwapStatus::Expired => {
            vec![swap.requester_id, swap.responder_id]
        }
        SwapStatus::Requested => vec![],
    };

    let kind = format!("swap_{}", target.as_str());
    let title = format!("Swap {}", target.as_str());
    let body = format!("Your swap request is now {}.", target.as_str());
    let swap_id = swap.id;

    tokio::spawn(async move {
        for user_id in recipients {
            if let Err(e) = notifier.notify(user_id, &kind, &title, &body).await {
                tracing::warn!(%swap_id, %user_id, error = %e, "notification failed");
            }
        }
    });
}

#[derive(Debug, Default)]
pub struct ExpiryReport {
    pub expired: u64,
    pub failed: u64,
}

/// Expire every `requested` swap older than `age`. Driven by the external
/// scheduler; per-row failures are logged and never abort the batch.
pub async fn expire_stale(
    pool: &PgPool,
    grants: &dyn ContentGrants,
    notifier: Arc<dyn NotificationSink>,
    age: Duration,
) -> Result<ExpiryReport, CoreError> {
    let cutoff = Utc::now() - chrono::Duration::seconds(age.as_secs() as i64);
    let ids = swap_repo::stale_requested_ids(pool, cutoff).await?;

    let mut report = ExpiryReport::default();
    for id in ids {
        match transition(pool, grants, notifier.clone(), id, None, SwapAction::Expire).await {
            Ok(_) => report.expired += 1,
            Err(e) => {
                tracing::warn!(swap_id = %id, error = %e, "expiry failed for swap, continuing");
                report.failed += 1;
            }
        }
    }

    tracing::info!(expired = report.expired, failed = report.failed, "expiry sweep done");
    Ok(report)
}
