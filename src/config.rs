//! Configuration module for the mint client
//!
//! This module handles configuration loading from TOML files and
//! environment variables, and validates the result.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use solana_sdk::{commitment_config::CommitmentLevel, pubkey::Pubkey};
use std::str::FromStr;
use std::time::Duration;

use crate::orchestrator::MintSettings;
use crate::poller::MIN_POLL_INTERVAL;
use crate::session::SessionSettings;

/// Candy machine v1 program
pub const DEFAULT_PROGRAM_ID: &str = "cndyAnrLdpjq1Ssp1z8xxDsB8dxe7u4HL5Nxi2K5WXZ";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// RPC endpoint configuration
    pub rpc: RpcConfig,

    /// Wallet configuration
    pub wallet: WalletConfig,

    /// Candy machine addresses and placeholder start date
    pub candy_machine: CandyMachineConfig,

    /// Mint attempt parameters
    #[serde(default)]
    pub mint: MintConfig,

    /// Monitoring and metrics
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// RPC endpoint URL
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "default_rpc_timeout")]
    pub timeout_secs: u64,

    /// Commitment level for confirmation ("processed", "confirmed", "finalized")
    #[serde(default = "default_commitment")]
    pub commitment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Path to keypair file
    pub keypair_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandyMachineConfig {
    /// Candy machine program id
    #[serde(default = "default_program_id")]
    pub program_id: String,

    /// Candy machine account
    pub id: String,

    /// Treasury receiving mint proceeds
    pub treasury: String,

    /// Placeholder start date (unix seconds) until the on-chain value is read
    #[serde(default)]
    pub start_date: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintConfig {
    /// Confirmation deadline in milliseconds
    #[serde(default = "default_tx_timeout_ms")]
    pub tx_timeout_ms: u64,

    /// Status poll interval in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Enable Prometheus metrics
    #[serde(default = "default_true")]
    pub enable_metrics: bool,

    /// Metrics port
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

// Default value functions
fn default_rpc_timeout() -> u64 { 30 }
fn default_commitment() -> String { "confirmed".to_string() }
fn default_program_id() -> String { DEFAULT_PROGRAM_ID.to_string() }
fn default_tx_timeout_ms() -> u64 { 30_000 }
fn default_poll_interval_ms() -> u64 { 2_000 }
fn default_metrics_port() -> u16 { 9090 }
fn default_true() -> bool { true }

impl Default for MintConfig {
    fn default() -> Self {
        Self {
            tx_timeout_ms: default_tx_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enable_metrics: default_true(),
            metrics_port: default_metrics_port(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc: RpcConfig {
                url: "https://api.devnet.solana.com".to_string(),
                timeout_secs: default_rpc_timeout(),
                commitment: default_commitment(),
            },
            wallet: WalletConfig {
                keypair_path: "~/.config/solana/id.json".to_string(),
            },
            candy_machine: CandyMachineConfig {
                program_id: default_program_id(),
                id: Pubkey::default().to_string(),
                treasury: Pubkey::default().to_string(),
                start_date: 0,
            },
            mint: MintConfig::default(),
            monitoring: MonitoringConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration with `.env` and environment variable overrides
    pub fn from_file_with_env(path: &str) -> Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `CANDY_MINT_*` overrides using `lookup` to read variables
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("CANDY_MINT_RPC_URL") {
            self.rpc.url = url;
        }
        if let Some(path) = lookup("CANDY_MINT_KEYPAIR") {
            self.wallet.keypair_path = path;
        }
        if let Some(id) = lookup("CANDY_MINT_MACHINE_ID") {
            self.candy_machine.id = id;
        }
        if let Some(treasury) = lookup("CANDY_MINT_TREASURY") {
            self.candy_machine.treasury = treasury;
        }
        if let Some(start) = lookup("CANDY_MINT_START_DATE") {
            self.candy_machine.start_date = start
                .trim()
                .parse()
                .with_context(|| format!("CANDY_MINT_START_DATE is not a unix timestamp: {}", start))?;
        }
        if let Some(timeout) = lookup("CANDY_MINT_TX_TIMEOUT_MS") {
            self.mint.tx_timeout_ms = timeout
                .trim()
                .parse()
                .with_context(|| format!("CANDY_MINT_TX_TIMEOUT_MS is not a number: {}", timeout))?;
        }
        Ok(())
    }

    /// Validate addresses, commitment and timing values
    pub fn validate(&self) -> Result<()> {
        self.program_id()?;
        self.candy_machine_id()?;
        self.treasury()?;
        self.commitment()?;
        self.start_date()?;
        if self.rpc.url.is_empty() {
            return Err(anyhow!("rpc.url must not be empty"));
        }
        if self.mint.tx_timeout_ms == 0 {
            return Err(anyhow!("mint.tx_timeout_ms must be greater than 0"));
        }
        if Duration::from_millis(self.mint.poll_interval_ms) < MIN_POLL_INTERVAL {
            return Err(anyhow!(
                "mint.poll_interval_ms {} is below the minimum of {}ms",
                self.mint.poll_interval_ms,
                MIN_POLL_INTERVAL.as_millis()
            ));
        }
        Ok(())
    }

    pub fn program_id(&self) -> Result<Pubkey> {
        parse_pubkey("candy_machine.program_id", &self.candy_machine.program_id)
    }

    pub fn candy_machine_id(&self) -> Result<Pubkey> {
        parse_pubkey("candy_machine.id", &self.candy_machine.id)
    }

    pub fn treasury(&self) -> Result<Pubkey> {
        parse_pubkey("candy_machine.treasury", &self.candy_machine.treasury)
    }

    pub fn commitment(&self) -> Result<CommitmentLevel> {
        CommitmentLevel::from_str(&self.rpc.commitment)
            .map_err(|_| anyhow!("Unknown commitment level: {}", self.rpc.commitment))
    }

    pub fn start_date(&self) -> Result<DateTime<Utc>> {
        DateTime::from_timestamp(self.candy_machine.start_date, 0)
            .ok_or_else(|| anyhow!("start_date out of range: {}", self.candy_machine.start_date))
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc.timeout_secs)
    }

    /// Session parameters derived from this configuration
    pub fn session_settings(&self) -> Result<SessionSettings> {
        Ok(SessionSettings {
            treasury: self.treasury()?,
            start_date: self.start_date()?,
            mint: MintSettings {
                tx_timeout: Duration::from_millis(self.mint.tx_timeout_ms),
                commitment: self.commitment()?,
            },
            poll_interval: Duration::from_millis(self.mint.poll_interval_ms),
        })
    }
}

fn parse_pubkey(field: &str, value: &str) -> Result<Pubkey> {
    Pubkey::from_str(value.trim()).map_err(|e| anyhow!("Invalid {} '{}': {}", field, value, e))
}
