use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use bigdecimal::BigDecimal;
use serde::Deserialize;

use crate::domain::Transaction;
use crate::error::AppError;
use crate::services::FundingSession;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct FundingRequest {
    pub email: String,
    pub amount: BigDecimal,
}

pub async fn initiate_funding(
    State(state): State<AppState>,
    payload: Result<Json<FundingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<FundingSession>), AppError> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let session = state
        .funding
        .initiate(&request.email, &request.amount)
        .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn verify_funding(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<Json<Transaction>, AppError> {
    let tx = state.funding.verify(&reference).await?;
    Ok(Json(tx))
}
