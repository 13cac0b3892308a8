use {
    crate::{
        AppState,
        adapters::{api_errors::ApiError, signature},
        domain::{
            error::CoreError,
            event::{EventEnvelope, LedgerCommand, ProviderEvent, payload_fingerprint},
            id::{CheckoutSessionId, EventId, TransferId},
            ledger::{NewPayout, NewPurchase, PayoutStatus, PurchaseStatus},
            metadata,
            money::{Currency, Money, MoneyAmount},
        },
        services::ledger_pipeline::apply_event,
    },
    axum::{Json, body::Bytes, extract::State, http::HeaderMap},
    uuid::Uuid,
};

const SIGNATURE_HEADER: &str = "Webhook-Signature";

fn convert_amount(object: &serde_json::Value, key: &str) -> Result<MoneyAmount, CoreError> {
    let raw = object
        .get(key)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| CoreError::Validation(format!("missing or non-integer {key}")))?;
    MoneyAmount::new(raw)
}

fn convert_currency(object: &serde_json::Value) -> Result<Currency, CoreError> {
    let raw = object
        .get("currency")
        .and_then(|v| v.as_str())
        .ok_or_else(|| CoreError::Validation("missing currency".into()))?;
    Currency::try_from(raw)
}

fn object_id(object: &serde_json::Value) -> Result<&str, CoreError> {
    object
        .get("id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| CoreError::Validation("event object has no id".into()))
}

/// `checkout.session.completed` → purchase row. Business ids come from
/// the session metadata via candidate-key lookup.
fn purchase_from_session(object: &serde_json::Value) -> Result<NewPurchase, CoreError> {
    let session_id = CheckoutSessionId::new(object_id(object)?)?;
    let amount = convert_amount(object, "amount_total")?;
    let currency = convert_currency(object)?;
    let meta = object
        .get("metadata")
        .cloned()
        .unwrap_or(serde_json::Value::Null);

    let buyer_id = metadata::required_uuid(&meta, metadata::BUYER_KEYS)?;
    let prompt_id = metadata::required_uuid(&meta, metadata::PROMPT_KEYS)?;
    let seller_id = metadata::optional_uuid(&meta, metadata::SELLER_KEYS)?;

    Ok(NewPurchase {
        id: Uuid::now_v7(),
        buyer_id,
        seller_id,
        prompt_id,
        checkout_session_id: session_id,
        money: Money::new(amount, currency),
        status: PurchaseStatus::Completed,
        metadata: meta,
    })
}

/// `transfer.paid` → payout row keyed on the provider transfer id.
fn payout_from_transfer(object: &serde_json::Value) -> Result<NewPayout, CoreError> {
    let transfer_id = TransferId::new(object_id(object)?)?;
    let amount = convert_amount(object, "amount")?;
    let currency = convert_currency(object)?;
    let destination = object
        .get("destination")
        .and_then(|v| v.as_str())
        .ok_or_else(|| CoreError::Validation("missing destination".into()))?
        .to_string();
    let meta = object
        .get("metadata")
        .cloned()
        .unwrap_or(serde_json::Value::Null);
    let seller_id = metadata::required_uuid(&meta, metadata::SELLER_KEYS)?;

    Ok(NewPayout {
        id: Uuid::now_v7(),
        seller_id,
        transfer_id,
        money: Money::new(amount, currency),
        destination_account: destination,
        status: PayoutStatus::Paid,
    })
}

#[tracing::instrument(
    name = "webhook",
    skip_all,
    fields(
        event_id = tracing::field::Empty,
        event_type = tracing::field::Empty,
        correlation_id = tracing::field::Empty,
    )
)]
pub async fn provider_webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let sig = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            CoreError::SignatureRejected(format!("missing {SIGNATURE_HEADER} header"))
        })?;

    // Verification runs on the unmodified raw bytes — any parsing or
    // re-serialization before this point would invalidate the digest.
    signature::verify(
        &body,
        sig,
        &state.webhook_secret,
        state.signature_tolerance_secs,
        chrono::Utc::now().timestamp(),
    )?;

    let envelope = EventEnvelope::parse(&body)?;
    let event_id = EventId::new(envelope.id.clone())?;
    let correlation_id = Uuid::now_v7();

    tracing::Span::current()
        .record("event_id", tracing::field::display(event_id.as_str()))
        .record("event_type", tracing::field::display(&envelope.event_type))
        .record("correlation_id", tracing::field::display(&correlation_id));

    let command = match envelope.event_type.as_str() {
        "checkout.session.completed" => {
            LedgerCommand::Purchase(purchase_from_session(&envelope.data.object)?)
        }
        "transfer.paid" => LedgerCommand::Payout(payout_from_transfer(&envelope.data.object)?),
        _ => LedgerCommand::Passthrough,
    };

    let event = ProviderEvent {
        event_id,
        event_type: envelope.event_type,
        provider_ts: envelope.created,
        fingerprint: payload_fingerprint(&body),
        correlation_id,
        command,
    };

    let outcome = apply_event(&state.pool, &event, "webhook:provider").await?;
    tracing::info!(kind = event.command.kind(), status = outcome.status(), "event applied");
    Ok(Json(serde_json::json!({ "status": outcome.status() })))
}
