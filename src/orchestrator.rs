//! Mint lifecycle driver
//!
//! One attempt at a time: acquire the busy flag, check preconditions,
//! submit, poll for confirmation, publish the alert, then refresh the
//! balance and program state. The busy flag is released by a scope guard,
//! so every exit path (including a dropped future or a panic) clears it.

use solana_sdk::{commitment_config::CommitmentLevel, pubkey::Pubkey, signature::Signature};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::classifier::{classify, MINT_FAILED_MESSAGE, MINT_SUCCEEDED_MESSAGE};
use crate::metrics::{metrics, Timer};
use crate::network::MintSubmitter;
use crate::poller::ConfirmationPoller;
use crate::refresher::ProgramStateRefresher;
use crate::store::MintStore;
use crate::structured_logging::AttemptContext;
use crate::types::{AlertState, MintAttempt, ProgramHandle, TransactionOutcome};

/// Per-session mint parameters
#[derive(Debug, Clone, Copy)]
pub struct MintSettings {
    /// Hard deadline for confirmation polling
    pub tx_timeout: Duration,
    pub commitment: CommitmentLevel,
}

impl Default for MintSettings {
    fn default() -> Self {
        Self {
            tx_timeout: Duration::from_millis(30_000),
            commitment: CommitmentLevel::Confirmed,
        }
    }
}

pub struct MintOrchestrator {
    submitter: Arc<dyn MintSubmitter>,
    poller: ConfirmationPoller,
    refresher: ProgramStateRefresher,
    store: Arc<MintStore>,
    settings: MintSettings,
    busy: AtomicBool,
}

impl MintOrchestrator {
    pub fn new(
        submitter: Arc<dyn MintSubmitter>,
        poller: ConfirmationPoller,
        refresher: ProgramStateRefresher,
        store: Arc<MintStore>,
        settings: MintSettings,
    ) -> Self {
        Self {
            submitter,
            poller,
            refresher,
            store,
            settings,
            busy: AtomicBool::new(false),
        }
    }

    /// An attempt is in flight
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn settings(&self) -> MintSettings {
        self.settings
    }

    /// Run one mint attempt. Ignored while another attempt is in flight.
    pub async fn mint(
        &self,
        wallet: Option<Pubkey>,
        program: Option<ProgramHandle>,
        treasury: Pubkey,
    ) -> MintAttempt {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            metrics().mint_ignored_busy.inc();
            debug!("Mint already in progress, ignoring request");
            return MintAttempt::Busy;
        }
        self.store.set_minting(true);

        // Ensure we clear the busy flag on exit
        let _guard = scopeguard::guard((), |_| {
            self.busy.store(false, Ordering::Release);
            self.store.set_minting(false);
        });

        let attempt = match (wallet.as_ref(), program.as_ref()) {
            (Some(wallet), Some(program)) => {
                self.submit_and_confirm(wallet, program, &treasury).await
            }
            _ => {
                metrics().mint_precondition_skips.inc();
                debug!(
                    wallet_present = wallet.is_some(),
                    program_present = program.is_some(),
                    "Mint preconditions not met, skipping submission"
                );
                MintAttempt::PreconditionNotMet
            }
        };

        self.refresher.refresh_balance(wallet.as_ref()).await;
        self.refresher.refresh_quietly(wallet.as_ref()).await;

        attempt
    }

    async fn submit_and_confirm(
        &self,
        wallet: &Pubkey,
        program: &ProgramHandle,
        treasury: &Pubkey,
    ) -> MintAttempt {
        let ctx = AttemptContext::new();
        let started_at = Instant::now();
        metrics().mint_attempts.inc();
        ctx.logger
            .log_attempt(&wallet.to_string(), &program.candy_machine.to_string());

        let timer = Timer::new();
        let signature = match self.submitter.submit_mint(program, wallet, treasury).await {
            Ok(signature) => signature,
            Err(err) => {
                metrics().mint_submission_failures.inc();
                let classification = classify(&err);
                if classification.forces_sold_out() {
                    self.store.force_sold_out();
                }
                ctx.logger
                    .log_submission_failure(&err.to_string(), &classification.message);
                self.store
                    .set_alert(AlertState::error(classification.message.clone()));
                return MintAttempt::SubmissionFailed {
                    message: classification.message,
                };
            }
        };
        timer.observe_duration(&metrics().submit_latency);
        ctx.logger
            .log_submitted(&signature.to_string(), elapsed_ms(started_at));

        let outcome = self
            .poller
            .await_confirmation(&signature, self.settings.tx_timeout, self.settings.commitment)
            .await;

        self.publish_outcome(&ctx, &signature, &outcome, started_at);

        MintAttempt::Completed { signature, outcome }
    }

    fn publish_outcome(
        &self,
        ctx: &AttemptContext,
        signature: &Signature,
        outcome: &TransactionOutcome,
        started_at: Instant,
    ) {
        let alert = match outcome {
            TransactionOutcome::Confirmed => {
                metrics().mint_confirmed.inc();
                AlertState::success(MINT_SUCCEEDED_MESSAGE)
            }
            TransactionOutcome::Rejected(_) => {
                metrics().mint_rejected.inc();
                AlertState::error(MINT_FAILED_MESSAGE)
            }
            TransactionOutcome::TimedOut => {
                metrics().mint_timed_out.inc();
                AlertState::error(MINT_FAILED_MESSAGE)
            }
        };
        ctx.logger
            .log_outcome(&signature.to_string(), outcome.label(), elapsed_ms(started_at));
        self.store.set_alert(alert);
    }
}

fn elapsed_ms(started_at: Instant) -> u64 {
    started_at.elapsed().as_millis() as u64
}
