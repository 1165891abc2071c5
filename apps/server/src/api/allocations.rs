use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post, put},
    Json, Router,
};
use rebalancer_core::{
    allocation::compute_allocations, snapshot::PortfolioSnapshot, AllocationResult, Allocator,
    AllocatorUpdate, RebalanceMode,
};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComputeRequest {
    /// Inline snapshot; the configured provider is used when absent.
    snapshot: Option<serde_json::Value>,
    #[serde(default)]
    mode: RebalanceMode,
    #[serde(default)]
    investment_amount: Decimal,
    selected_portfolio: Option<String>,
}

/// Stateless one-shot computation.
async fn compute(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ComputeRequest>,
) -> ApiResult<Json<AllocationResult>> {
    let snapshot = match body.snapshot {
        Some(raw) => PortfolioSnapshot::from_value(raw)?,
        None => state.fetch_snapshot().await?,
    };
    let result = compute_allocations(
        &snapshot,
        body.mode,
        body.investment_amount,
        body.selected_portfolio.as_deref(),
    )?;
    Ok(Json(result))
}

/// Returns the server-held controller, fetching its snapshot on first use.
async fn loaded<'a>(
    state: &AppState,
    slot: &'a mut Option<Allocator>,
) -> ApiResult<&'a mut Allocator> {
    if slot.is_none() {
        let snapshot = state.fetch_snapshot().await?;
        *slot = Some(Allocator::new(snapshot));
    }
    slot.as_mut()
        .ok_or_else(|| ApiError::ServiceUnavailable("Allocator not loaded".to_string()))
}

async fn get_allocations(State(state): State<Arc<AppState>>) -> ApiResult<Json<AllocationResult>> {
    let mut guard = state.allocator.write().await;
    let allocator = loaded(&state, &mut guard).await?;
    Ok(Json(allocator.result()?.clone()))
}

/// Applies a partial state update and recomputes once; nothing changes if
/// any field is rejected. An explicit `"selectedPortfolio": null` resets the
/// selection to the first portfolio.
async fn update_state(
    State(state): State<Arc<AppState>>,
    Json(update): Json<AllocatorUpdate>,
) -> ApiResult<Json<AllocationResult>> {
    let mut guard = state.allocator.write().await;
    let allocator = loaded(&state, &mut guard).await?;
    Ok(Json(allocator.apply(update)?.clone()))
}

/// Refetches the snapshot; the previous one stays in place if the fetch fails.
async fn reload(State(state): State<Arc<AppState>>) -> ApiResult<Json<AllocationResult>> {
    let snapshot = state.fetch_snapshot().await?;
    let mut guard = state.allocator.write().await;
    if let Some(allocator) = guard.as_mut() {
        return Ok(Json(allocator.replace_snapshot(snapshot)?.clone()));
    }
    let allocator = guard.insert(Allocator::new(snapshot));
    Ok(Json(allocator.result()?.clone()))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/allocations", get(get_allocations))
        .route("/allocations/compute", post(compute))
        .route("/allocations/state", put(update_state))
        .route("/allocations/reload", post(reload))
}
