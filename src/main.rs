//! Candy Mint - terminal mint client
//!
//! Drives a single mint session against a candy machine, either on an
//! in-memory simulated network or through Solana RPC.
//!
//! Commands are read from stdin, one per line:
//!
//! - `mint`: request a mint (ignored while busy or not yet enabled)
//! - `status`: print the current snapshot
//! - `dismiss`: close the current alert
//! - `quit`: exit

// Compiler warning configuration
#![deny(unused_imports)]
#![deny(unused_mut)]
#![deny(unused_variables)]
#![warn(unused_must_use)]

use anyhow::{Context, Result};
use clap::Parser;
use solana_sdk::signature::Keypair;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use candy_mint::config::Config;
use candy_mint::eligibility::countdown_text;
use candy_mint::endpoints;
use candy_mint::rpc::RpcNetwork;
use candy_mint::simulation::{SimulatedNetwork, SimulationConfig};
use candy_mint::types::{Mode, Severity};
use candy_mint::wallet::{shorten_address, WalletManager};
use candy_mint::{MintAttempt, MintSession, MintSnapshot};

/// Starting balance of the simulated wallet
const SIMULATION_FUNDING_LAMPORTS: u64 = 5_000_000_000;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Operating mode (simulation or production)
    #[arg(short, long, default_value = "simulation")]
    mode: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Metrics port (overrides the config file)
    #[arg(long)]
    metrics_port: Option<u16>,

    /// Mint once as soon as minting becomes enabled
    #[arg(long)]
    auto_mint: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.json_logs)?;

    info!("🍬 Starting Candy Mint");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    info!("📋 Loading configuration from: {}", args.config);
    let config = load_config(&args.config)?;

    let mode = match args.mode.as_str() {
        "production" => Mode::Production,
        "simulation" => Mode::Simulation,
        _ => {
            warn!("Unknown mode '{}', defaulting to simulation", args.mode);
            Mode::Simulation
        }
    };
    info!("🎯 Operating Mode: {:?}", mode);

    if config.monitoring.enable_metrics {
        let metrics_port = args.metrics_port.unwrap_or(config.monitoring.metrics_port);
        info!("📊 Starting metrics server on port {}", metrics_port);
        tokio::spawn(async move {
            if let Err(e) = endpoints::endpoint_server(metrics_port).await {
                error!("Metrics server error: {}", e);
            }
        });
    }

    let (session, wallet) = match mode {
        Mode::Production => build_production(&config)?,
        Mode::Simulation => build_simulation(&config).await?,
    };
    info!("💼 Wallet address: {}", wallet.pubkey());

    session.connect_wallet(wallet.pubkey()).await;
    let countdown = session.spawn_countdown();

    info!("✅ Session ready, commands: mint | status | dismiss | quit");
    log_status(&session.snapshot(), session.countdown_remaining());

    let result = run_event_loop(session, args.auto_mint).await;
    countdown.abort();
    result
}

/// Initialize logging subsystem
fn init_logging(verbose: bool, json: bool) -> Result<()> {
    let env_filter = if verbose {
        "candy_mint=debug,info"
    } else {
        "candy_mint=info,warn,error"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| env_filter.into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()?;
    }

    Ok(())
}

/// Load configuration from file with fallback to defaults
fn load_config(path: &str) -> Result<Config> {
    let config = if std::path::Path::new(path).exists() {
        Config::from_file_with_env(path)
            .with_context(|| format!("Failed to load config from {}", path))?
    } else {
        warn!("Config file '{}' not found, using defaults", path);
        let mut config = Config::default();
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn build_production(config: &Config) -> Result<(MintSession, WalletManager)> {
    info!("🔑 Loading wallet from: {}", config.wallet.keypair_path);
    let wallet =
        WalletManager::from_file(&config.wallet.keypair_path).context("Failed to load wallet")?;

    info!("🌐 Connecting to RPC endpoint: {}", config.rpc.url);
    let network = RpcNetwork::new(
        config.rpc.url.clone(),
        config.rpc_timeout(),
        config.commitment()?,
        wallet.clone(),
        config.program_id()?,
        config.candy_machine_id()?,
    );

    let session = MintSession::new(Arc::new(network), config.session_settings()?);
    Ok((session, wallet))
}

async fn build_simulation(config: &Config) -> Result<(MintSession, WalletManager)> {
    let wallet = match WalletManager::from_file(&config.wallet.keypair_path) {
        Ok(wallet) => wallet,
        Err(e) => {
            warn!("Could not load wallet ({}), using an ephemeral keypair", e);
            WalletManager::from_keypair(Keypair::new())
        }
    };

    let start_date = config.start_date()?;
    let network = Arc::new(SimulatedNetwork::new(SimulationConfig {
        go_live_date: (config.candy_machine.start_date > 0).then_some(start_date),
        ..SimulationConfig::default()
    }));
    network
        .fund(wallet.pubkey(), SIMULATION_FUNDING_LAMPORTS)
        .await;
    info!(
        candy_machine = %network.handle().candy_machine,
        "🧪 Simulated candy machine ready"
    );

    let mut settings = config.session_settings()?;
    settings.treasury = network.treasury();
    Ok((MintSession::new(network, settings), wallet))
}

/// Main event loop
async fn run_event_loop(session: MintSession, auto_mint: bool) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut changes = session.subscribe();
    let mut status_interval = tokio::time::interval(Duration::from_secs(60));
    status_interval.tick().await;

    let mut pending_auto_mint = auto_mint;
    let mut last_alert = session.snapshot().alert.clone();

    if pending_auto_mint && session.is_mint_enabled() {
        pending_auto_mint = false;
        spawn_mint(&session);
    }

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                match line.context("Failed to read stdin")? {
                    Some(line) => match line.trim() {
                        "" => {}
                        "mint" => spawn_mint(&session),
                        "status" => log_status(&session.snapshot(), session.countdown_remaining()),
                        "dismiss" => session.dismiss_alert(),
                        "quit" | "exit" => break,
                        other => warn!("Unknown command '{}'", other),
                    },
                    None => {
                        info!("stdin closed, waiting for Ctrl-C");
                        stdin_open = false;
                    }
                }
            }

            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = session.snapshot();
                if snapshot.alert.open && snapshot.alert != last_alert {
                    log_alert(&snapshot);
                }
                last_alert = snapshot.alert.clone();

                if pending_auto_mint && snapshot.mint_enabled() {
                    pending_auto_mint = false;
                    spawn_mint(&session);
                }
            }

            _ = status_interval.tick() => {
                log_status(&session.snapshot(), session.countdown_remaining());
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal");
                break;
            }
        }
    }

    info!("👋 Shutting down");
    Ok(())
}

fn spawn_mint(session: &MintSession) {
    let session = session.clone();
    tokio::spawn(async move {
        match session.mint().await {
            MintAttempt::Busy => info!("Mint already in progress"),
            MintAttempt::NotEligible => info!("Minting is not enabled yet"),
            MintAttempt::PreconditionNotMet => info!("Wallet or candy machine not ready"),
            MintAttempt::SubmissionFailed { message } => {
                info!(alert = %message, "Mint submission failed")
            }
            MintAttempt::Completed { signature, outcome } => {
                info!(signature = %signature, outcome = outcome.label(), "Mint attempt finished")
            }
        }
    });
}

fn log_alert(snapshot: &MintSnapshot) {
    match snapshot.alert.severity {
        Some(Severity::Error) | Some(Severity::Warning) => {
            warn!("🔔 {}", snapshot.alert.message)
        }
        _ => info!("🔔 {}", snapshot.alert.message),
    }
}

fn log_status(snapshot: &MintSnapshot, remaining: Option<Duration>) {
    let wallet = snapshot
        .wallet
        .map(|w| shorten_address(&w.to_string(), 4))
        .unwrap_or_else(|| "-".to_string());

    info!("📊 Status:");
    info!("   Wallet: {} ({:.4} SOL)", wallet, snapshot.balance_sol());
    info!(
        "   Items: {} available, {} redeemed, {} remaining",
        snapshot.counters.items_available,
        snapshot.counters.items_redeemed,
        snapshot.counters.items_remaining
    );
    if snapshot.is_sold_out {
        info!("   SOLD OUT");
    } else if snapshot.is_active {
        info!("   Minting is live (enabled: {})", snapshot.mint_enabled());
    } else {
        let remaining = remaining.unwrap_or_default();
        info!("   Starts in {}", countdown_text(remaining));
    }
    if snapshot.is_minting {
        info!("   Mint in progress...");
    }
}
