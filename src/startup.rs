use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

use crate::adapters::{FileKeyValueStore, PostgresLedgerRepository};
use crate::clients::{
    AggregatorClient, PaystackClient, DEFAULT_FAILURE_THRESHOLD, DEFAULT_RESET_TIMEOUT_SECS,
};
use crate::config::{mask_password, mask_secret, Config};
use crate::ports::{BalanceService, PaymentGateway, SessionProvider, StaticSession, VendorGateway};
use crate::services::{BalanceSync, FundingService, LedgerStore, PurchaseOrchestrator};
use crate::{db, AppState};

/// Wires the clients, the ledger and the services from configuration.
/// Connects to Postgres and runs migrations when `DATABASE_URL` is set.
pub async fn build_state(config: &Config) -> Result<AppState> {
    let timeout = Duration::from_secs(config.http_timeout_secs);

    let aggregator = Arc::new(AggregatorClient::with_circuit_breaker(
        config.vendor_api_url.clone(),
        config.vendor_api_token.clone(),
        timeout,
        DEFAULT_FAILURE_THRESHOLD,
        DEFAULT_RESET_TIMEOUT_SECS,
    ));
    let paystack = Arc::new(PaystackClient::with_circuit_breaker(
        config.payment_api_url.clone(),
        config.payment_secret_key.clone(),
        timeout,
        DEFAULT_FAILURE_THRESHOLD,
        DEFAULT_RESET_TIMEOUT_SECS,
    ));
    tracing::info!("Vendor API client initialized with URL: {}", config.vendor_api_url);

    let ledger = build_ledger(config).await?;

    let balances: Arc<dyn BalanceService> = aggregator.clone();
    let vendor: Arc<dyn VendorGateway> = aggregator;
    let gateway: Arc<dyn PaymentGateway> = paystack;

    let balance_sync = BalanceSync::new(Arc::clone(&balances));
    let orchestrator = PurchaseOrchestrator::new(
        Arc::clone(&balances),
        Arc::clone(&vendor),
        ledger.clone(),
        balance_sync,
    );
    let funding = FundingService::new(gateway, ledger.clone());

    Ok(AppState {
        orchestrator,
        ledger,
        balances,
        vendor,
        funding,
    })
}

pub async fn build_ledger(config: &Config) -> Result<LedgerStore> {
    let local = Arc::new(FileKeyValueStore::new(config.ledger_data_dir.clone()));
    let session: Arc<dyn SessionProvider> = match &config.ledger_owner_id {
        Some(owner_id) => Arc::new(StaticSession::owned_by(owner_id.clone())),
        None => Arc::new(StaticSession::anonymous()),
    };

    let ledger = LedgerStore::new(local, session);

    let Some(database_url) = &config.database_url else {
        tracing::info!(data_dir = %config.ledger_data_dir.display(), "Using local ledger only");
        return Ok(ledger);
    };

    let pool = db::create_pool(database_url)
        .await
        .context("Failed to connect to the remote ledger database")?;
    db::run_migrations(&pool).await?;
    tracing::info!("Remote ledger enabled");

    Ok(ledger.with_remote(Arc::new(PostgresLedgerRepository::new(pool))))
}

pub struct ValidationReport {
    pub environment: bool,
    pub data_dir: bool,
    pub database: Option<bool>,
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.environment && self.data_dir && self.database.unwrap_or(true)
    }

    pub fn print(&self) {
        println!("\n=== Configuration Report ===");
        println!("Environment Variables: {}", status(self.environment));
        println!("Ledger Directory:      {}", status(self.data_dir));
        match self.database {
            Some(ok) => println!("Remote Ledger:         {}", status(ok)),
            None => println!("Remote Ledger:         disabled"),
        }

        if !self.errors.is_empty() {
            println!("\nErrors:");
            for error in &self.errors {
                println!("  ❌ {}", error);
            }
        }

        println!("\nOverall Status: {}", if self.is_valid() { "✅ PASS" } else { "❌ FAIL" });
        println!("============================\n");
    }
}

fn status(ok: bool) -> &'static str {
    if ok { "✅ OK" } else { "❌ FAIL" }
}

pub fn print_config(config: &Config) {
    println!("Configuration:");
    println!("  Server Port: {}", config.server_port);
    println!("  Vendor API URL: {}", config.vendor_api_url);
    println!("  Vendor API Token: {}", mask_secret(&config.vendor_api_token));
    println!("  Payment API URL: {}", config.payment_api_url);
    println!("  Payment Secret Key: {}", mask_secret(&config.payment_secret_key));
    println!("  Ledger Data Dir: {}", config.ledger_data_dir.display());
    match &config.database_url {
        Some(url) => println!("  Database URL: {}", mask_password(url)),
        None => println!("  Database URL: (not set)"),
    }
    println!(
        "  Ledger Owner: {}",
        config.ledger_owner_id.as_deref().unwrap_or("(anonymous)")
    );
    println!("  HTTP Timeout: {}s", config.http_timeout_secs);
}

pub async fn validate_environment(config: &Config) -> ValidationReport {
    let mut report = ValidationReport {
        environment: true,
        data_dir: true,
        database: None,
        errors: Vec::new(),
    };

    if let Err(e) = validate_env_vars(config) {
        report.environment = false;
        report.errors.push(format!("Environment: {}", e));
    }

    if let Err(e) = tokio::fs::create_dir_all(&config.ledger_data_dir).await {
        report.data_dir = false;
        report.errors.push(format!("Ledger directory: {}", e));
    }

    if let Some(database_url) = &config.database_url {
        match validate_database(database_url).await {
            Ok(()) => report.database = Some(true),
            Err(e) => {
                report.database = Some(false);
                report.errors.push(format!("Database: {}", e));
            }
        }
    }

    report
}

fn validate_env_vars(config: &Config) -> Result<()> {
    for (name, url) in [
        ("VENDOR_API_URL", &config.vendor_api_url),
        ("PAYMENT_API_URL", &config.payment_api_url),
    ] {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            anyhow::bail!("{} must be an http(s) URL", name);
        }
    }

    if config.http_timeout_secs == 0 {
        anyhow::bail!("HTTP_TIMEOUT_SECS must be greater than zero");
    }

    Ok(())
}

async fn validate_database(database_url: &str) -> Result<()> {
    let pool = db::create_pool(database_url)
        .await
        .context("Failed to connect")?;
    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .context("Failed to execute test query")?;
    Ok(())
}
