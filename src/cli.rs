use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::startup;
use crate::validation::parse_network;

#[derive(Parser)]
#[command(name = "topup-core")]
#[command(about = "Topup Core - wallet airtime and data purchases", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Transaction ledger commands
    #[command(subcommand)]
    Tx(TxCommands),

    /// List the data plans offered for a network
    Plans {
        /// MTN, AIRTEL, GLO or 9MOBILE
        #[arg(value_name = "NETWORK")]
        network: String,
    },

    /// Show the current wallet balances
    Balance,

    /// Configuration validation
    Config,
}

#[derive(Subcommand)]
pub enum TxCommands {
    /// List ledger entries, newest first
    List {
        /// Show at most this many entries
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

pub async fn handle_tx_list(config: &Config, limit: Option<usize>) -> anyhow::Result<()> {
    let ledger = startup::build_ledger(config).await?;
    let entries = ledger.list().await;

    if entries.is_empty() {
        println!("No transactions found");
        return Ok(());
    }

    println!(
        "{:<40} {:<18} {:>12} {:<10} {:<20}",
        "Reference", "Type", "Amount", "Status", "Created"
    );
    println!("{}", "-".repeat(104));

    for tx in entries.iter().take(limit.unwrap_or(usize::MAX)) {
        println!(
            "{:<40} {:<18} {:>12} {:<10} {:<20}",
            tx.reference,
            tx.transaction_type.as_str(),
            tx.amount.to_string(),
            tx.status.as_str(),
            tx.created_at.format("%Y-%m-%d %H:%M:%S")
        );
    }

    Ok(())
}

pub async fn handle_plans(config: &Config, network: &str) -> anyhow::Result<()> {
    let network = parse_network(network)?;
    let state = startup::build_state(config).await?;
    let plans = state.vendor.list_plans(network).await?;

    if plans.is_empty() {
        println!("No data plans found for {}", network);
        return Ok(());
    }

    println!("{:<20} {:<40} {:>10} {:<12}", "Code", "Name", "Price", "Validity");
    println!("{}", "-".repeat(85));
    for plan in plans {
        println!(
            "{:<20} {:<40} {:>10} {:<12}",
            plan.code,
            plan.name,
            plan.price.to_string(),
            plan.validity.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}

pub async fn handle_balance(config: &Config) -> anyhow::Result<()> {
    let state = startup::build_state(config).await?;
    let snapshot = state.balances.fetch_snapshot().await?;

    println!(
        "General balance: {} {}",
        snapshot.general_balance,
        snapshot.currency.as_deref().unwrap_or("")
    );
    for (name, wallet) in &snapshot.sub_balances {
        let balance = wallet
            .balance
            .as_ref()
            .map(|b| b.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<20} {} {}",
            name,
            balance,
            wallet.currency.as_deref().unwrap_or("")
        );
    }

    Ok(())
}

pub async fn handle_config_validate(config: &Config) -> anyhow::Result<()> {
    tracing::info!("Validating configuration...");

    startup::print_config(config);
    let report = startup::validate_environment(config).await;
    report.print();

    if !report.is_valid() {
        anyhow::bail!("Configuration is invalid");
    }

    tracing::info!("Configuration is valid");
    Ok(())
}
