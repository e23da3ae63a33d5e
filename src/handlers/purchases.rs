use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Serialize;

use crate::domain::PurchaseRequest;
use crate::error::AppError;
use crate::services::{ErrorKind, PurchaseReceipt, PurchaseResult};
use crate::AppState;

/// Wire form of a purchase outcome. Orchestrator failures are reported in
/// the body, not through the status code.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PurchaseResponse {
    Success {
        success: bool,
        #[serde(flatten)]
        receipt: PurchaseReceipt,
    },
    Failure {
        success: bool,
        error_kind: ErrorKind,
        error_message: String,
    },
}

impl From<PurchaseResult> for PurchaseResponse {
    fn from(result: PurchaseResult) -> Self {
        match result {
            Ok(receipt) => PurchaseResponse::Success {
                success: true,
                receipt,
            },
            Err(e) => PurchaseResponse::Failure {
                success: false,
                error_kind: e.kind(),
                error_message: e.to_string(),
            },
        }
    }
}

pub async fn create_purchase(
    State(state): State<AppState>,
    payload: Result<Json<PurchaseRequest>, JsonRejection>,
) -> Result<Json<PurchaseResponse>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let result = state.orchestrator.purchase(request).await;
    Ok(Json(result.into()))
}
