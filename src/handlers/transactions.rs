use axum::{extract::State, Json};

use crate::domain::Transaction;
use crate::AppState;

pub async fn list_transactions(State(state): State<AppState>) -> Json<Vec<Transaction>> {
    Json(state.ledger.list().await)
}
