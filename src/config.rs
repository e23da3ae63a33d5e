use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;

use crate::clients::{aggregator, paystack, DEFAULT_TIMEOUT_SECS};

pub const DEFAULT_SERVER_PORT: u16 = 3000;
pub const DEFAULT_DATA_DIR: &str = "./data";

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub vendor_api_url: String,
    pub vendor_api_token: String,
    pub payment_api_url: String,
    pub payment_secret_key: String,
    pub ledger_data_dir: PathBuf,
    pub database_url: Option<String>,
    pub ledger_owner_id: Option<String>,
    pub http_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok(); // Load .env file if present

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| optional(key).with_context(|| format!("{} must be set", key));

        let server_port = match optional("SERVER_PORT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("SERVER_PORT is not a valid port: {}", raw))?,
            None => DEFAULT_SERVER_PORT,
        };

        let http_timeout_secs = match optional("HTTP_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("HTTP_TIMEOUT_SECS is not a number: {}", raw))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Config {
            server_port,
            vendor_api_url: optional("VENDOR_API_URL")
                .unwrap_or_else(|| aggregator::DEFAULT_BASE_URL.to_string()),
            vendor_api_token: required("VENDOR_API_TOKEN")?,
            payment_api_url: optional("PAYMENT_API_URL")
                .unwrap_or_else(|| paystack::DEFAULT_BASE_URL.to_string()),
            payment_secret_key: required("PAYMENT_SECRET_KEY")?,
            ledger_data_dir: optional("LEDGER_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            database_url: optional("DATABASE_URL"),
            ledger_owner_id: optional("LEDGER_OWNER_ID"),
            http_timeout_secs,
        })
    }
}

/// Keeps the first four characters of a secret.
pub fn mask_secret(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{}****", visible)
    }
}

pub fn mask_password(url: &str) -> String {
    if let Some(at_pos) = url.rfind('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            if let Some(slash_pos) = url[..colon_pos].rfind("//") {
                let prefix = &url[..slash_pos + 2];
                let user = &url[slash_pos + 2..colon_pos];
                let suffix = &url[at_pos..];
                return format!("{}{}:****{}", prefix, user, suffix);
            }
        }
    }
    url.to_string()
}
