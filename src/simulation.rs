//! In-memory mint network
//!
//! Simulates a candy machine, wallet balances and transaction
//! confirmation without touching the chain. Used by simulation mode and
//! by tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use solana_sdk::{commitment_config::CommitmentLevel, pubkey::Pubkey, signature::Signature};
use std::collections::{HashMap, VecDeque};
use tokio::sync::Mutex;

use crate::classifier::{NOT_STARTED_CODE, SOLD_OUT_CODE};
use crate::errors::{MintError, MintResult};
use crate::network::{BalanceSource, MintSubmitter, ProgramStateSource, TransactionStatusSource};
use crate::types::{ProgramCounters, ProgramHandle, ProgramState, TxStatus};

/// Initial parameters of the simulated candy machine
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub items_available: u64,
    pub items_redeemed: u64,
    pub price_lamports: u64,
    pub go_live_date: Option<DateTime<Utc>>,
    /// Status queries answered `Pending` before a transaction confirms
    pub pending_polls: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            items_available: 100,
            items_redeemed: 0,
            price_lamports: 1_000_000_000,
            go_live_date: None,
            pending_polls: 1,
        }
    }
}

#[derive(Debug)]
struct SimulatedTx {
    pending_polls: u32,
    result: TxStatus,
}

#[derive(Debug)]
struct SimState {
    items_redeemed: u64,
    balances: HashMap<Pubkey, u64>,
    transactions: HashMap<Signature, SimulatedTx>,
    scripted_failures: VecDeque<MintError>,
    scripted_rejections: VecDeque<String>,
    submissions: u32,
}

#[derive(Debug)]
pub struct SimulatedNetwork {
    handle: ProgramHandle,
    config: SimulationConfig,
    state: Mutex<SimState>,
}

impl SimulatedNetwork {
    pub fn new(config: SimulationConfig) -> Self {
        let handle = ProgramHandle {
            program_id: Pubkey::new_unique(),
            candy_machine: Pubkey::new_unique(),
            config: Pubkey::new_unique(),
            authority: Pubkey::new_unique(),
            wallet: Pubkey::new_unique(),
            price_lamports: config.price_lamports,
            token_mint: None,
        };
        let state = SimState {
            items_redeemed: config.items_redeemed,
            balances: HashMap::new(),
            transactions: HashMap::new(),
            scripted_failures: VecDeque::new(),
            scripted_rejections: VecDeque::new(),
            submissions: 0,
        };
        Self {
            handle,
            config,
            state: Mutex::new(state),
        }
    }

    pub fn handle(&self) -> &ProgramHandle {
        &self.handle
    }

    /// Treasury recorded on the simulated machine
    pub fn treasury(&self) -> Pubkey {
        self.handle.wallet
    }

    pub async fn fund(&self, address: Pubkey, lamports: u64) {
        let mut state = self.state.lock().await;
        *state.balances.entry(address).or_insert(0) += lamports;
    }

    /// Make the next submission fail with `err`
    pub async fn fail_next_submission(&self, err: MintError) {
        self.state.lock().await.scripted_failures.push_back(err);
    }

    /// Make the next submitted transaction fail on-chain with `reason`
    pub async fn reject_next_transaction(&self, reason: impl Into<String>) {
        self.state
            .lock()
            .await
            .scripted_rejections
            .push_back(reason.into());
    }

    /// Number of submissions that reached the network
    pub async fn submissions(&self) -> u32 {
        self.state.lock().await.submissions
    }

    pub async fn items_redeemed(&self) -> u64 {
        self.state.lock().await.items_redeemed
    }
}

impl Default for SimulatedNetwork {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

#[async_trait]
impl ProgramStateSource for SimulatedNetwork {
    async fn get_program_state(&self, _wallet: &Pubkey) -> MintResult<ProgramState> {
        let state = self.state.lock().await;
        Ok(ProgramState {
            handle: self.handle.clone(),
            start_date: self.config.go_live_date,
            counters: ProgramCounters::from_totals(
                self.config.items_available,
                state.items_redeemed,
            ),
        })
    }
}

#[async_trait]
impl MintSubmitter for SimulatedNetwork {
    async fn submit_mint(
        &self,
        program: &ProgramHandle,
        buyer: &Pubkey,
        treasury: &Pubkey,
    ) -> MintResult<Signature> {
        let mut state = self.state.lock().await;
        state.submissions += 1;

        if let Some(err) = state.scripted_failures.pop_front() {
            return Err(err);
        }
        if program.candy_machine != self.handle.candy_machine {
            return Err(MintError::Configuration(format!(
                "unknown candy machine {}",
                program.candy_machine
            )));
        }
        if state.items_redeemed >= self.config.items_available {
            return Err(MintError::Program {
                code: SOLD_OUT_CODE,
                msg: Some("Candy machine is empty!".to_string()),
            });
        }
        if self.config.go_live_date.is_some_and(|date| Utc::now() < date) {
            return Err(MintError::Program {
                code: NOT_STARTED_CODE,
                msg: Some("Candy machine is not live yet!".to_string()),
            });
        }

        let balance = state.balances.get(buyer).copied().unwrap_or(0);
        if balance < program.price_lamports {
            return Err(MintError::Rpc {
                message: "Transaction simulation failed: Error processing Instruction 4: custom program error: 0x135".to_string(),
            });
        }

        let signature = Signature::new_unique();
        let result = match state.scripted_rejections.pop_front() {
            Some(reason) => TxStatus::Error(reason),
            None => {
                state.balances.insert(*buyer, balance - program.price_lamports);
                *state.balances.entry(*treasury).or_insert(0) += program.price_lamports;
                state.items_redeemed += 1;
                TxStatus::Success
            }
        };
        state.transactions.insert(
            signature,
            SimulatedTx {
                pending_polls: self.config.pending_polls,
                result,
            },
        );
        Ok(signature)
    }
}

#[async_trait]
impl TransactionStatusSource for SimulatedNetwork {
    async fn query_transaction_status(
        &self,
        signature: &Signature,
        _commitment: CommitmentLevel,
    ) -> MintResult<TxStatus> {
        let mut state = self.state.lock().await;
        let Some(tx) = state.transactions.get_mut(signature) else {
            return Ok(TxStatus::Pending);
        };
        if tx.pending_polls > 0 {
            tx.pending_polls -= 1;
            return Ok(TxStatus::Pending);
        }
        Ok(tx.result.clone())
    }
}

#[async_trait]
impl BalanceSource for SimulatedNetwork {
    async fn get_balance(&self, address: &Pubkey) -> MintResult<u64> {
        Ok(self
            .state
            .lock()
            .await
            .balances
            .get(address)
            .copied()
            .unwrap_or(0))
    }
}
