//! Renderable mint state
//!
//! One store per session. Every write builds a new [`MintSnapshot`] and
//! swaps it in atomically, so readers never observe a half-applied update.
//! Readers either poll [`MintStore::snapshot`] or wait on
//! [`MintStore::subscribe`] for a change notification.

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use tokio::sync::watch;

use crate::types::{AlertState, ProgramCounters, ProgramHandle, ProgramState, LAMPORTS_PER_SOL};

/// Complete state read by the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub struct MintSnapshot {
    /// Connected wallet identity
    pub wallet: Option<Pubkey>,

    /// Wallet balance in lamports, once fetched
    pub balance_lamports: Option<u64>,

    pub counters: ProgramCounters,

    /// Placeholder from configuration until the first refresh lands
    pub start_date: DateTime<Utc>,

    /// Program handle used for submissions, once resolved
    pub program: Option<ProgramHandle>,

    /// Countdown elapsed; never reverts once set
    pub is_active: bool,

    pub is_sold_out: bool,

    /// A mint attempt is in flight
    pub is_minting: bool,

    pub alert: AlertState,
}

impl MintSnapshot {
    pub fn new(start_date: DateTime<Utc>) -> Self {
        Self {
            wallet: None,
            balance_lamports: None,
            counters: ProgramCounters::default(),
            start_date,
            program: None,
            is_active: false,
            is_sold_out: false,
            is_minting: false,
            alert: AlertState::default(),
        }
    }

    /// Balance in SOL for display
    pub fn balance_sol(&self) -> f64 {
        self.balance_lamports.unwrap_or(0) as f64 / LAMPORTS_PER_SOL as f64
    }

    /// Mint action enabled: active, not sold out, not busy
    pub fn mint_enabled(&self) -> bool {
        self.is_active && !self.is_sold_out && !self.is_minting
    }
}

/// Single-owner store of the renderable state
#[derive(Debug)]
pub struct MintStore {
    state: ArcSwap<MintSnapshot>,
    revision: watch::Sender<u64>,
}

impl MintStore {
    pub fn new(start_date: DateTime<Utc>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            state: ArcSwap::from_pointee(MintSnapshot::new(start_date)),
            revision,
        }
    }

    /// Latest snapshot (lock-free)
    pub fn snapshot(&self) -> Arc<MintSnapshot> {
        self.state.load_full()
    }

    /// Receiver notified after every write
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Replace the snapshot with `f` applied to a copy of the current one.
    ///
    /// Returns the snapshot that was stored.
    pub fn update<F>(&self, mut f: F) -> Arc<MintSnapshot>
    where
        F: FnMut(&mut MintSnapshot),
    {
        self.update_if(|s| {
            f(s);
            true
        });
        self.snapshot()
    }

    /// Like [`update`](Self::update), but `f` may decline the write by
    /// returning false. A declined write stores nothing and notifies nobody.
    pub fn update_if<F>(&self, mut f: F) -> bool
    where
        F: FnMut(&mut MintSnapshot) -> bool,
    {
        let mut changed = false;
        self.state.rcu(|current| {
            let mut next = (**current).clone();
            changed = f(&mut next);
            if changed {
                Arc::new(next)
            } else {
                Arc::clone(current)
            }
        });
        if changed {
            self.revision.send_modify(|rev| *rev = rev.wrapping_add(1));
        }
        changed
    }

    pub fn set_wallet(&self, wallet: Option<Pubkey>) {
        self.update(|s| {
            s.wallet = wallet;
            if wallet.is_none() {
                s.balance_lamports = None;
                s.program = None;
            }
        });
    }

    /// Store a balance fetched for `wallet`, unless that wallet has since
    /// been disconnected or replaced. Returns whether it was stored.
    pub fn set_balance_for(&self, wallet: &Pubkey, lamports: u64) -> bool {
        self.update_if(|s| {
            if s.wallet != Some(*wallet) {
                return false;
            }
            s.balance_lamports = Some(lamports);
            true
        })
    }

    /// Swap in program state fetched on behalf of `wallet`: counters, handle,
    /// start date and the sold-out flag derived from the new counters.
    /// Dropped if `wallet` is no longer connected.
    pub fn apply_program_state_for(&self, wallet: &Pubkey, state: &ProgramState) -> bool {
        self.update_if(|s| {
            if s.wallet != Some(*wallet) {
                return false;
            }
            apply_state(s, state);
            true
        })
    }

    pub fn force_sold_out(&self) {
        self.update(|s| s.is_sold_out = true);
    }

    /// Mark the countdown complete. Returns true only on the first call.
    pub fn activate(&self) -> bool {
        if self.snapshot().is_active {
            return false;
        }
        self.update_if(|s| !std::mem::replace(&mut s.is_active, true))
    }

    pub fn set_minting(&self, minting: bool) {
        self.update(|s| s.is_minting = minting);
    }

    pub fn set_alert(&self, alert: AlertState) {
        self.update(|s| s.alert = alert.clone());
    }

    pub fn dismiss_alert(&self) {
        self.update(|s| s.alert = s.alert.dismissed());
    }
}

fn apply_state(snapshot: &mut MintSnapshot, state: &ProgramState) {
    snapshot.counters = state.counters;
    snapshot.is_sold_out = state.counters.is_sold_out();
    snapshot.program = Some(state.handle.clone());
    if let Some(start_date) = state.start_date {
        snapshot.start_date = start_date;
    }
}
