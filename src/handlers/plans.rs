use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::AppError;
use crate::ports::DataPlan;
use crate::validation::parse_network;
use crate::AppState;

pub async fn list_plans(
    State(state): State<AppState>,
    Path(network): Path<String>,
) -> Result<Json<Vec<DataPlan>>, AppError> {
    let network = parse_network(&network)?;
    let plans = state.vendor.list_plans(network).await?;
    Ok(Json(plans))
}
