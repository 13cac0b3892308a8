use {
    crate::{
        AppState,
        adapters::api_errors::ApiError,
        domain::{error::CoreError, swap::SwapAction},
        services::swap_engine,
    },
    axum::{
        Json,
        extract::{Path, State},
        http::HeaderMap,
    },
    uuid::Uuid,
};

/// Set by the upstream auth layer once the session is validated.
const ACTOR_HEADER: &str = "X-User-Id";

fn actor_from_headers(headers: &HeaderMap) -> Result<Uuid, CoreError> {
    let raw = headers
        .get(ACTOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| CoreError::Auth(format!("missing {ACTOR_HEADER} header")))?;
    Uuid::parse_str(raw).map_err(|_| CoreError::Auth(format!("malformed {ACTOR_HEADER} header")))
}

#[tracing::instrument(name = "swap_action", skip_all, fields(swap_id = %swap_id, action = %action))]
pub async fn swap_action_handler(
    State(state): State<AppState>,
    Path((swap_id, action)): Path<(Uuid, String)>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor = actor_from_headers(&headers)?;
    let action = SwapAction::try_from(action.as_str())?;

    let new_status = swap_engine::transition(
        &state.pool,
        state.grants.as_ref(),
        state.notifier.clone(),
        swap_id,
        Some(actor),
        action,
    )
    .await?;

    Ok(Json(serde_json::json!({ "status": new_status.as_str() })))
}

fn check_scheduler_token(state: &AppState, headers: &HeaderMap) -> Result<(), CoreError> {
    let presented = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| CoreError::Auth("missing scheduler credential".into()))?;
    if presented != state.scheduler_token.as_ref() {
        return Err(CoreError::Auth("invalid scheduler credential".into()));
    }
    Ok(())
}

/// Scheduler-only sweep: expires `requested` swaps older than the
/// configured age. Per-row failures are tolerated, never abort the batch.
#[tracing::instrument(name = "expire_sweep", skip_all)]
pub async fn expire_sweep_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    check_scheduler_token(&state, &headers)?;

    let report = swap_engine::expire_stale(
        &state.pool,
        state.grants.as_ref(),
        state.notifier.clone(),
        state.swap_expiry_age,
    )
    .await?;

    Ok(Json(serde_json::json!({
        "expired": report.expired,
        "failed": report.failed,
    })))
}
