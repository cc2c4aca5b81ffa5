//! Program state and balance refresh
//!
//! Both refreshes are best-effort: a failure is logged and counted, the
//! store keeps its previous value, and no alert is raised.

use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::errors::MintResult;
use crate::metrics::metrics;
use crate::network::{BalanceSource, ProgramStateSource};
use crate::store::MintStore;
use crate::types::ProgramState;

#[derive(Clone)]
pub struct ProgramStateRefresher {
    source: Arc<dyn ProgramStateSource>,
    balances: Arc<dyn BalanceSource>,
    store: Arc<MintStore>,
}

impl ProgramStateRefresher {
    pub fn new(
        source: Arc<dyn ProgramStateSource>,
        balances: Arc<dyn BalanceSource>,
        store: Arc<MintStore>,
    ) -> Self {
        Self {
            source,
            balances,
            store,
        }
    }

    /// Fetch counters, start date and program handle and swap them into the store.
    ///
    /// No wallet means no-op (`Ok(None)`). On failure the store is untouched.
    /// A result for a wallet that is no longer the connected one is returned
    /// but not stored.
    pub async fn refresh(&self, wallet: Option<&Pubkey>) -> MintResult<Option<ProgramState>> {
        let Some(wallet) = wallet else {
            debug!("No wallet connected, skipping program state refresh");
            return Ok(None);
        };

        match self.source.get_program_state(wallet).await {
            Ok(state) => {
                if !self.store.apply_program_state_for(wallet, &state) {
                    debug!(
                        wallet = %wallet,
                        "Wallet changed during refresh, discarding program state"
                    );
                    return Ok(Some(state));
                }
                metrics()
                    .items_remaining
                    .set(state.counters.items_remaining.min(i64::MAX as u64) as i64);
                debug!(
                    items_available = state.counters.items_available,
                    items_redeemed = state.counters.items_redeemed,
                    items_remaining = state.counters.items_remaining,
                    "Program state refreshed"
                );
                Ok(Some(state))
            }
            Err(err) => {
                metrics().state_refresh_failures.inc();
                warn!(error = %err, "Program state refresh failed");
                Err(err)
            }
        }
    }

    /// Refresh, swallowing the error (already logged)
    pub async fn refresh_quietly(&self, wallet: Option<&Pubkey>) {
        let _ = self.refresh(wallet).await;
    }

    /// Fetch the wallet balance into the store. Failures are logged only.
    pub async fn refresh_balance(&self, wallet: Option<&Pubkey>) -> Option<u64> {
        let wallet = wallet?;
        match self.balances.get_balance(wallet).await {
            Ok(lamports) => {
                if !self.store.set_balance_for(wallet, lamports) {
                    debug!(
                        wallet = %wallet,
                        "Wallet changed during refresh, discarding balance"
                    );
                    return Some(lamports);
                }
                metrics()
                    .balance_lamports
                    .set(lamports.min(i64::MAX as u64) as i64);
                Some(lamports)
            }
            Err(err) => {
                metrics().balance_refresh_failures.inc();
                warn!(wallet = %wallet, error = %err, "Balance refresh failed");
                None
            }
        }
    }
}
