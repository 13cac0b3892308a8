use {
    crate::domain::{
        error::CoreError,
        swap::{SwapRequest, SwapStatus},
    },
    chrono::{DateTime, Utc},
    sqlx::PgPool,
    uuid::Uuid,
};

#[derive(sqlx::FromRow)]
struct SwapRow {
    id: Uuid,
    requester_id: Uuid,
    responder_id: Uuid,
    requested_item_id: Uuid,
    offered_item_id: Uuid,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<SwapRow> for SwapRequest {
    type Error = CoreError;

    fn try_from(row: SwapRow) -> Result<Self, Self::Error> {
        Ok(SwapRequest {
            id: row.id,
            requester_id: row.requester_id,
            responder_id: row.responder_id,
            requested_item_id: row.requested_item_id,
            offered_item_id: row.offered_item_id,
            status: SwapStatus::try_from(row.status.as_str())?,
            created_at: row.created_at,
        })
    }
}

pub async fn get(pool: &PgPool, id: Uuid) -> Result<Option<SwapRequest>, CoreError> {
    let row: Option<SwapRow> = sqlx::query_as(
        r#"
        SELECT id, requester_id, responder_id, requested_item_id, offered_item_id,
               status, created_at
        FROM swap_requests
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(SwapRequest::try_from).transpose()
}

/// Create a swap in `requested` status on behalf of the requester.
pub async fn create(
    pool: &PgPool,
    requester_id: Uuid,
    responder_id: Uuid,
    requested_item_id: Uuid,
    offered_item_id: Uuid,
) -> Result<Uuid, CoreError> {
    let id = Uuid::now_v7();
    sqlx::query(
        r#"
        INSERT INTO swap_requests
            (id, requester_id, responder_id, requested_item_id, offered_item_id, status)
        VALUES ($1, $2, $3, $4, $5, 'requested')
        "#,
    )
    .bind(id)
    .bind(requester_id)
    .bind(responder_id)
    .bind(requested_item_id)
    .bind(offered_item_id)
    .execute(pool)
    .await?;
    Ok(id)
}

/// Compare-and-swap on the status column. The update only applies if the
/// status still equals `expected` at write time; zero rows affected means
/// a concurrent transition won and the caller must report a conflict.
pub async fn cas_status(
    pool: &PgPool,
    id: Uuid,
    expected: SwapStatus,
    target: SwapStatus,
) -> Result<bool, CoreError> {
    let result = sqlx::query(
        r#"
        UPDATE swap_requests
        SET status = $1, updated_at = now()
        WHERE id = $2 AND status = $3
        "#,
    )
    .bind(target.as_str())
    .bind(id)
    .bind(expected.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Ids of `requested` swaps created before the cutoff, oldest first.
pub async fn stale_requested_ids(
    pool: &PgPool,
    cutoff: DateTime<Utc>,
) -> Result<Vec<Uuid>, CoreError> {
    let ids: Vec<Uuid> = sqlx::query_scalar(
        r#"
        SELECT id FROM swap_requests
        WHERE status = 'requested' AND created_at < $1
        ORDER BY created_at
        "#,
    )
    .bind(cutoff)
    .fetch_all(pool)
    .await?;
    Ok(ids)
}
