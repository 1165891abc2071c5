use std::collections::HashMap;
use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use rebalancer_core::capacity::{simulate_capacity, CapacityInput, CapacityMatrix, CapacityTargets};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{error::ApiResult, main_lib::AppState};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SimulateRequest {
    input: CapacityInput,
    #[serde(default)]
    country_targets: HashMap<String, Decimal>,
    #[serde(default)]
    category_targets: HashMap<String, Decimal>,
}

async fn simulate(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SimulateRequest>,
) -> ApiResult<Json<CapacityMatrix>> {
    let targets = CapacityTargets {
        country_targets: body.country_targets,
        category_targets: body.category_targets,
    };
    let matrix = simulate_capacity(&body.input, &targets, &state.ipf_config)?;
    Ok(Json(matrix))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/capacity/simulate", post(simulate))
}
