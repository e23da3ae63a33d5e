pub mod adapters;
pub mod cli;
pub mod clients;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod ports;
pub mod services;
pub mod startup;
pub mod utils;
pub mod validation;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::ports::{BalanceService, VendorGateway};
use crate::services::{FundingService, LedgerStore, PurchaseOrchestrator};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: PurchaseOrchestrator,
    pub ledger: LedgerStore,
    pub balances: Arc<dyn BalanceService>,
    pub vendor: Arc<dyn VendorGateway>,
    pub funding: FundingService,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/purchases", post(handlers::purchases::create_purchase))
        .route("/transactions", get(handlers::transactions::list_transactions))
        .route("/plans/:network", get(handlers::plans::list_plans))
        .route("/wallet/balance", get(handlers::wallet::get_balance))
        .route("/funding", post(handlers::funding::initiate_funding))
        .route(
            "/funding/:reference/verify",
            post(handlers::funding::verify_funding),
        )
        .layer(axum::middleware::from_fn(
            middleware::request_logger_middleware,
        ))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
