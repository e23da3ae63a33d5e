use axum::{extract::State, Json};

use crate::domain::WalletSnapshot;
use crate::error::AppError;
use crate::AppState;

pub async fn get_balance(State(state): State<AppState>) -> Result<Json<WalletSnapshot>, AppError> {
    let snapshot = state.balances.fetch_snapshot().await?;
    Ok(Json(snapshot))
}
