use {
    crate::domain::{
        audit::NewAuditEntry,
        error::CoreError,
        event::{EventOutcome, LedgerCommand, ProviderEvent},
    },
    crate::infra::postgres::{audit_repo::insert_audit_entry, event_repo, ledger_repo},
    sqlx::PgPool,
    uuid::Uuid,
};

/// Apply one validated provider event exactly once: dedup check, ledger
/// write, then record the event as processed.
///
/// The processed-event row is written only after the ledger write
/// succeeds. A transient failure therefore surfaces to the provider as a
/// 500 and its redelivery re-attempts the (idempotent) write instead of
/// being silently swallowed. Two concurrent deliveries may both get past
/// the dedup check; the ledger's unique constraints make the second a
/// no-op, and the second `mark_processed` hits `ON CONFLICT DO NOTHING`.
pub async fn apply_event(
    pool: &PgPool,
    event: &ProviderEvent,
    actor: &str,
) -> Result<EventOutcome, CoreError> {
    if event_repo::is_processed(pool, event.event_id.as_str()).await? {
        return Ok(EventOutcome::Duplicate);
    }

    let outcome = match &event.command {
        LedgerCommand::Purchase(purchase) => {
            let result = ledger_repo::create_purchase(pool, purchase).await?;
            if result.created {
                let audit = purchase.audit_entry(actor, event.event_id.as_str(), "created");
                insert_audit_entry(pool, &audit).await?;
                EventOutcome::Created(result.id)
            } else {
                tracing::info!(purchase_id = %result.id, "purchase already settled, no-op");
                EventOutcome::Exists(result.id)
            }
        }
        LedgerCommand::Payout(payout) => {
            let result = ledger_repo::create_payout(pool, payout).await?;
            if result.created {
                let audit = payout.audit_entry(actor, event.event_id.as_str(), "created");
                insert_audit_entry(pool, &audit).await?;
                EventOutcome::Created(result.id)
            } else {
                tracing::info!(payout_id = %result.id, "payout already settled, no-op");
                EventOutcome::Exists(result.id)
            }
        }
        LedgerCommand::Passthrough => {
            let audit = NewAuditEntry {
                id: Uuid::now_v7(),
                entity_type: "provider_event".to_string(),
                entity_id: None,
                external_id: None,
                event_id: Some(event.event_id.as_str().to_string()),
                action: "event_received".to_string(),
                actor: actor.to_string(),
                detail: serde_json::json!({
                    "event_type": event.event_type,
                    "passthrough": true,
                    "correlation_id": event.correlation_id,
                }),
            };
            insert_audit_entry(pool, &audit).await?;
            EventOutcome::Logged
        }
    };

    let newly_recorded = event_repo::mark_processed(pool, event).await?;
    if !newly_recorded {
        tracing::info!("event recorded by a concurrent delivery");
    }

    Ok(outcome)
}
