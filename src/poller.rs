//! Confirmation polling with a hard deadline
//!
//! Polls the transaction status at a fixed interval until the network
//! reports success or an on-chain error, or until the deadline elapses.
//! A signature that is not yet visible counts as pending, and so does a
//! failed status query: the loop keeps going until the deadline. On
//! timeout the in-flight query future is dropped.

use solana_sdk::{commitment_config::CommitmentLevel, signature::Signature};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::metrics::metrics;
use crate::network::TransactionStatusSource;
use crate::types::{TransactionOutcome, TxStatus};

/// Lower bound on the poll interval (one slot)
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(400);

/// Default poll interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

#[derive(Clone)]
pub struct ConfirmationPoller {
    source: Arc<dyn TransactionStatusSource>,
    poll_interval: Duration,
}

impl ConfirmationPoller {
    /// Create a poller; intervals below [`MIN_POLL_INTERVAL`] are raised to it
    pub fn new(source: Arc<dyn TransactionStatusSource>, poll_interval: Duration) -> Self {
        Self {
            source,
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Poll until confirmed, rejected, or `timeout` elapses.
    ///
    /// Never returns `TimedOut` before `timeout` has passed.
    pub async fn await_confirmation(
        &self,
        signature: &Signature,
        timeout: Duration,
        commitment: CommitmentLevel,
    ) -> TransactionOutcome {
        let started_at = Instant::now();

        match tokio::time::timeout(timeout, self.poll(signature, commitment, started_at)).await {
            Ok(outcome) => {
                metrics()
                    .confirmation_latency
                    .observe(started_at.elapsed().as_secs_f64());
                outcome
            }
            Err(_) => {
                warn!(
                    signature = %signature,
                    timeout_ms = timeout.as_millis() as u64,
                    "Confirmation polling timed out"
                );
                TransactionOutcome::TimedOut
            }
        }
    }

    async fn poll(
        &self,
        signature: &Signature,
        commitment: CommitmentLevel,
        started_at: Instant,
    ) -> TransactionOutcome {
        let mut attempts: u32 = 0;
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            attempts += 1;
            metrics().confirmation_polls.inc();

            match self
                .source
                .query_transaction_status(signature, commitment)
                .await
            {
                Ok(TxStatus::Success) => {
                    debug!(
                        signature = %signature,
                        attempts = attempts,
                        latency_ms = started_at.elapsed().as_millis() as u64,
                        "Transaction confirmed"
                    );
                    return TransactionOutcome::Confirmed;
                }
                Ok(TxStatus::Error(reason)) => {
                    warn!(
                        signature = %signature,
                        attempts = attempts,
                        error = %reason,
                        "Transaction failed"
                    );
                    return TransactionOutcome::Rejected(reason);
                }
                Ok(TxStatus::Pending) => {
                    debug!(
                        signature = %signature,
                        attempts = attempts,
                        "Signature not confirmed yet, continuing to poll"
                    );
                }
                Err(err) => {
                    warn!(
                        signature = %signature,
                        error = %err,
                        "Error checking signature status"
                    );
                }
            }
        }
    }
}
