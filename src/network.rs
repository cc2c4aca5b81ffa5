//! Collaborator interfaces consumed by the mint core
//!
//! Everything that touches the chain goes through one of these traits:
//! reading program state, constructing/signing/submitting the mint
//! transaction, querying its status, and reading the wallet balance.
//! Production implementations live in [`crate::rpc`], in-memory ones in
//! [`crate::simulation`].

use async_trait::async_trait;
use solana_sdk::{commitment_config::CommitmentLevel, pubkey::Pubkey, signature::Signature};

use crate::errors::MintResult;
use crate::types::{ProgramHandle, ProgramState, TxStatus};

/// Reads the candy machine's aggregate state
#[async_trait]
pub trait ProgramStateSource: Send + Sync {
    async fn get_program_state(&self, wallet: &Pubkey) -> MintResult<ProgramState>;
}

/// Builds, signs and submits exactly one mint transaction
#[async_trait]
pub trait MintSubmitter: Send + Sync {
    async fn submit_mint(
        &self,
        program: &ProgramHandle,
        buyer: &Pubkey,
        treasury: &Pubkey,
    ) -> MintResult<Signature>;
}

/// Reports the status of a submitted transaction at a commitment level
#[async_trait]
pub trait TransactionStatusSource: Send + Sync {
    async fn query_transaction_status(
        &self,
        signature: &Signature,
        commitment: CommitmentLevel,
    ) -> MintResult<TxStatus>;
}

/// Reads an account balance in lamports
#[async_trait]
pub trait BalanceSource: Send + Sync {
    async fn get_balance(&self, address: &Pubkey) -> MintResult<u64>;
}

/// A backend providing every collaborator at once
pub trait MintNetwork:
    ProgramStateSource + MintSubmitter + TransactionStatusSource + BalanceSource
{
}

impl<T> MintNetwork for T where
    T: ProgramStateSource + MintSubmitter + TransactionStatusSource + BalanceSource
{
}
