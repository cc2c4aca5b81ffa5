//! Solana RPC backend for the mint collaborators

pub mod candy_machine;

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::{CommitmentConfig, CommitmentLevel},
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::errors::{MintError, MintResult};
use crate::network::{BalanceSource, MintSubmitter, ProgramStateSource, TransactionStatusSource};
use crate::types::{ProgramHandle, ProgramState, TxStatus};
use crate::wallet::WalletManager;

use candy_machine::{describe_error, mint_instructions, CandyMachineAccount, MINT_ACCOUNT_LEN};

/// Candy machine client over a single RPC endpoint
pub struct RpcNetwork {
    client: Arc<RpcClient>,
    wallet: WalletManager,
    program_id: Pubkey,
    candy_machine: Pubkey,
}

impl RpcNetwork {
    pub fn new(
        url: String,
        timeout: Duration,
        commitment: CommitmentLevel,
        wallet: WalletManager,
        program_id: Pubkey,
        candy_machine: Pubkey,
    ) -> Self {
        let client = RpcClient::new_with_timeout_and_commitment(
            url,
            timeout,
            CommitmentConfig { commitment },
        );
        Self::with_client(Arc::new(client), wallet, program_id, candy_machine)
    }

    pub fn with_client(
        client: Arc<RpcClient>,
        wallet: WalletManager,
        program_id: Pubkey,
        candy_machine: Pubkey,
    ) -> Self {
        Self {
            client,
            wallet,
            program_id,
            candy_machine,
        }
    }

    pub fn client(&self) -> &Arc<RpcClient> {
        &self.client
    }

    pub fn wallet(&self) -> &WalletManager {
        &self.wallet
    }
}

#[async_trait]
impl ProgramStateSource for RpcNetwork {
    async fn get_program_state(&self, _wallet: &Pubkey) -> MintResult<ProgramState> {
        let data = self.client.get_account_data(&self.candy_machine).await?;
        let account = CandyMachineAccount::decode(&data)?;
        debug!(
            candy_machine = %self.candy_machine,
            items_available = account.items_available,
            items_redeemed = account.items_redeemed,
            "Fetched candy machine state"
        );
        Ok(account.into_program_state(self.program_id, self.candy_machine))
    }
}

#[async_trait]
impl MintSubmitter for RpcNetwork {
    async fn submit_mint(
        &self,
        program: &ProgramHandle,
        buyer: &Pubkey,
        treasury: &Pubkey,
    ) -> MintResult<Signature> {
        if *buyer != self.wallet.pubkey() {
            return Err(MintError::WalletMismatch {
                loaded: self.wallet.pubkey().to_string(),
                requested: buyer.to_string(),
            });
        }

        let mint = Keypair::new();
        let rent = self
            .client
            .get_minimum_balance_for_rent_exemption(MINT_ACCOUNT_LEN)
            .await?;
        let instructions = mint_instructions(program, buyer, treasury, &mint.pubkey(), rent)?;

        let blockhash = self.client.get_latest_blockhash().await?;
        let tx = Transaction::new_signed_with_payer(
            &instructions,
            Some(buyer),
            &[self.wallet.keypair(), &mint],
            blockhash,
        );

        let signature = self
            .client
            .send_transaction(&tx)
            .await
            .map_err(|e| describe_error(MintError::from_client_error(e)))?;
        info!(
            signature = %signature,
            mint = %mint.pubkey(),
            "Mint transaction sent"
        );
        Ok(signature)
    }
}

#[async_trait]
impl TransactionStatusSource for RpcNetwork {
    async fn query_transaction_status(
        &self,
        signature: &Signature,
        commitment: CommitmentLevel,
    ) -> MintResult<TxStatus> {
        let statuses = self.client.get_signature_statuses(&[*signature]).await?;
        let Some(Some(status)) = statuses.value.into_iter().next() else {
            return Ok(TxStatus::Pending);
        };

        if let Some(err) = status.err {
            return Ok(TxStatus::Error(err.to_string()));
        }
        if status.satisfies_commitment(CommitmentConfig { commitment }) {
            Ok(TxStatus::Success)
        } else {
            Ok(TxStatus::Pending)
        }
    }
}

#[async_trait]
impl BalanceSource for RpcNetwork {
    async fn get_balance(&self, address: &Pubkey) -> MintResult<u64> {
        Ok(self.client.get_balance(address).await?)
    }
}
