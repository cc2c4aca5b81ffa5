//! Mint session: the components wired together behind one handle
//!
//! The hosting event loop calls into the session on the same triggers a
//! reactive front-end would react to: a wallet identity becoming
//! available, the user pressing mint, the user dismissing the alert.
//! Presentation reads [`MintSnapshot`]s and waits on [`MintSession::subscribe`].

use chrono::{DateTime, Utc};
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::eligibility::EligibilityGate;
use crate::metrics::metrics;
use crate::network::{BalanceSource, MintNetwork, MintSubmitter, ProgramStateSource, TransactionStatusSource};
use crate::orchestrator::{MintOrchestrator, MintSettings};
use crate::poller::ConfirmationPoller;
use crate::refresher::ProgramStateRefresher;
use crate::store::{MintSnapshot, MintStore};
use crate::types::MintAttempt;

/// Static parameters of a session
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Treasury receiving mint proceeds
    pub treasury: Pubkey,
    /// Placeholder start date until the first refresh
    pub start_date: DateTime<Utc>,
    pub mint: MintSettings,
    pub poll_interval: Duration,
}

#[derive(Clone)]
pub struct MintSession {
    store: Arc<MintStore>,
    orchestrator: Arc<MintOrchestrator>,
    refresher: ProgramStateRefresher,
    gate: EligibilityGate,
    treasury: Pubkey,
}

impl MintSession {
    /// Build a session backed by a single network implementation
    pub fn new<N>(network: Arc<N>, settings: SessionSettings) -> Self
    where
        N: MintNetwork + 'static,
    {
        Self::from_parts(
            network.clone(),
            network.clone(),
            network.clone(),
            network,
            settings,
        )
    }

    /// Build a session from individual collaborators
    pub fn from_parts(
        state_source: Arc<dyn ProgramStateSource>,
        submitter: Arc<dyn MintSubmitter>,
        status_source: Arc<dyn TransactionStatusSource>,
        balances: Arc<dyn BalanceSource>,
        settings: SessionSettings,
    ) -> Self {
        let store = Arc::new(MintStore::new(settings.start_date));
        let refresher = ProgramStateRefresher::new(state_source, balances, Arc::clone(&store));
        let poller = ConfirmationPoller::new(status_source, settings.poll_interval);
        let orchestrator = Arc::new(MintOrchestrator::new(
            submitter,
            poller,
            refresher.clone(),
            Arc::clone(&store),
            settings.mint,
        ));
        let gate = EligibilityGate::new(Arc::clone(&store));

        Self {
            store,
            orchestrator,
            refresher,
            gate,
            treasury: settings.treasury,
        }
    }

    pub fn store(&self) -> &Arc<MintStore> {
        &self.store
    }

    pub fn snapshot(&self) -> Arc<MintSnapshot> {
        self.store.snapshot()
    }

    /// Change notifications for the presentation layer
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.store.subscribe()
    }

    /// A wallet identity became available: fetch balance and program state.
    ///
    /// Reconnecting the same wallet is a no-op.
    pub async fn connect_wallet(&self, wallet: Pubkey) {
        if self.store.snapshot().wallet == Some(wallet) {
            debug!(wallet = %wallet, "Wallet already connected");
            return;
        }
        info!(wallet = %wallet, "🔑 Wallet connected");
        self.store.set_wallet(Some(wallet));
        self.refresher.refresh_balance(Some(&wallet)).await;
        self.refresher.refresh_quietly(Some(&wallet)).await;
    }

    pub fn disconnect_wallet(&self) {
        info!("Wallet disconnected");
        self.store.set_wallet(None);
    }

    /// Re-read program state outside of a mint attempt
    pub async fn refresh(&self) {
        let wallet = self.store.snapshot().wallet;
        self.refresher.refresh_quietly(wallet.as_ref()).await;
    }

    /// Start the countdown task driving `is_active`
    pub fn spawn_countdown(&self) -> JoinHandle<()> {
        self.gate.check_now();
        self.gate.clone().spawn()
    }

    /// Time left before minting opens
    pub fn countdown_remaining(&self) -> Option<Duration> {
        self.gate.remaining()
    }

    pub fn is_minting(&self) -> bool {
        self.orchestrator.is_busy()
    }

    /// Mint enabled: active, not sold out, not busy
    pub fn is_mint_enabled(&self) -> bool {
        self.gate.check_now();
        self.store.snapshot().mint_enabled()
    }

    /// The mint action callback
    pub async fn mint(&self) -> MintAttempt {
        if self.orchestrator.is_busy() {
            metrics().mint_ignored_busy.inc();
            debug!("Mint already in progress, ignoring request");
            return MintAttempt::Busy;
        }

        self.gate.check_now();
        let snapshot = self.store.snapshot();
        if !snapshot.is_active || snapshot.is_sold_out {
            debug!(
                is_active = snapshot.is_active,
                is_sold_out = snapshot.is_sold_out,
                "Minting not enabled, ignoring request"
            );
            return MintAttempt::NotEligible;
        }

        let Some(wallet) = snapshot.wallet else {
            metrics().mint_precondition_skips.inc();
            debug!("No wallet connected, ignoring request");
            return MintAttempt::PreconditionNotMet;
        };

        self.orchestrator
            .mint(Some(wallet), snapshot.program.clone(), self.treasury)
            .await
    }

    pub fn dismiss_alert(&self) {
        self.store.dismiss_alert();
    }
}
