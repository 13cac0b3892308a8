use {
    crate::domain::{error::CoreError, event::ProviderEvent},
    chrono::{DateTime, Utc},
    sqlx::PgPool,
};

/// Has this exact provider event already been fully applied?
pub async fn is_processed(pool: &PgPool, event_id: &str) -> Result<bool, CoreError> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM processed_events WHERE external_event_id = $1)",
    )
    .bind(event_id)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

/// Record the event as processed. A conflict on `external_event_id` means
/// a concurrent delivery already recorded it — a successful no-op, not an
/// error. Returns `true` if this call inserted the row.
pub async fn mark_processed(pool: &PgPool, event: &ProviderEvent) -> Result<bool, CoreError> {
    let inserted: Option<bool> = sqlx::query_scalar(
        r#"
        INSERT INTO processed_events
            (external_event_id, event_type, payload_fingerprint, correlation_id)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (external_event_id) DO NOTHING
        RETURNING true
        "#,
    )
    .bind(event.event_id.as_str())
    .bind(&event.event_type)
    .bind(&event.fingerprint)
    .bind(event.correlation_id)
    .fetch_optional(pool)
    .await?;

    Ok(inserted.is_some())
}

/// Retention cleanup: drop dedup rows older than the cutoff. The dedup
/// window only needs to outlive the provider's maximum redelivery horizon.
pub async fn purge_older_than(pool: &PgPool, cutoff: DateTime<Utc>) -> Result<u64, CoreError> {
    let result = sqlx::query("DELETE FROM processed_events WHERE processed_at < $1")
        .bind(cutoff)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
