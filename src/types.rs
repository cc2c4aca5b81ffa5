//! Common types used throughout the mint client

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use solana_sdk::{pubkey::Pubkey, signature::Signature};

/// Lamports per SOL, used for balance display
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// In-memory collaborators, no network traffic
    Simulation,
    /// Real transactions against the configured RPC endpoint
    Production,
}

/// Aggregate supply counters of the candy machine.
///
/// Replaced wholesale on every successful refresh; never patched field by field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramCounters {
    pub items_available: u64,
    pub items_redeemed: u64,
    pub items_remaining: u64,
}

impl ProgramCounters {
    /// Build counters from the on-chain totals, deriving the remaining count
    pub fn from_totals(items_available: u64, items_redeemed: u64) -> Self {
        Self {
            items_available,
            items_redeemed,
            items_remaining: items_available.saturating_sub(items_redeemed),
        }
    }

    /// `available == redeemed + remaining`
    pub fn is_consistent(&self) -> bool {
        self.items_redeemed
            .checked_add(self.items_remaining)
            .is_some_and(|total| total == self.items_available)
    }

    pub fn is_sold_out(&self) -> bool {
        self.items_remaining == 0
    }
}

/// Opaque reference to the candy machine instance being minted against.
///
/// The core only passes this through to the submission collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramHandle {
    /// Candy machine program id
    pub program_id: Pubkey,
    /// Candy machine account
    pub candy_machine: Pubkey,
    /// Config account the machine draws items from
    pub config: Pubkey,
    /// Authority of the machine (update authority of minted items)
    pub authority: Pubkey,
    /// Wallet receiving mint proceeds as recorded on-chain
    pub wallet: Pubkey,
    /// Price per item in lamports
    pub price_lamports: u64,
    /// SPL token used for payment, if not SOL
    pub token_mint: Option<Pubkey>,
}

/// Result of a successful program state read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramState {
    pub handle: ProgramHandle,
    /// Authoritative start date; `None` when the machine has no go-live date
    pub start_date: Option<DateTime<Utc>>,
    pub counters: ProgramCounters,
}

/// Alert severity as shown by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

/// User-facing alert. Last write wins, no history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertState {
    pub open: bool,
    pub message: String,
    pub severity: Option<Severity>,
}

impl AlertState {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            open: true,
            message: message.into(),
            severity: Some(Severity::Success),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            open: true,
            message: message.into(),
            severity: Some(Severity::Error),
        }
    }

    /// Same alert, closed
    pub fn dismissed(&self) -> Self {
        Self {
            open: false,
            ..self.clone()
        }
    }
}

/// Status reported by a single transaction status query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxStatus {
    /// Not yet visible or not yet at the requested commitment
    Pending,
    Success,
    Error(String),
}

/// Terminal result of confirmation polling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionOutcome {
    Confirmed,
    Rejected(String),
    TimedOut,
}

impl TransactionOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, TransactionOutcome::Confirmed)
    }

    pub fn label(&self) -> &'static str {
        match self {
            TransactionOutcome::Confirmed => "confirmed",
            TransactionOutcome::Rejected(_) => "rejected",
            TransactionOutcome::TimedOut => "timed_out",
        }
    }
}

/// What a single `mint` invocation ended up doing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MintAttempt {
    /// Another attempt was in flight; nothing happened
    Busy,
    /// Wallet or program handle missing; no network call, no alert
    PreconditionNotMet,
    /// Minting is not enabled right now (countdown pending or sold out)
    NotEligible,
    /// Submission itself failed and was classified
    SubmissionFailed { message: String },
    /// Submission succeeded and polling reached a terminal outcome
    Completed {
        signature: Signature,
        outcome: TransactionOutcome,
    },
}

impl MintAttempt {
    /// Whether the attempt reached the network
    pub fn was_submitted(&self) -> bool {
        matches!(self, MintAttempt::Completed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_counters_from_totals() {
        let counters = ProgramCounters::from_totals(10, 3);
        assert_eq!(counters.items_remaining, 7);
        assert!(counters.is_consistent());
        assert!(!counters.is_sold_out());
    }

    #[test]
    fn test_counters_over_redeemed_saturates() {
        let counters = ProgramCounters::from_totals(5, 8);
        assert_eq!(counters.items_remaining, 0);
        assert!(counters.is_sold_out());
        assert!(!counters.is_consistent());
    }

    #[test]
    fn test_alert_dismiss_keeps_message() {
        let alert = AlertState::error("SOLD OUT!");
        let closed = alert.dismissed();
        assert!(!closed.open);
        assert_eq!(closed.message, "SOLD OUT!");
        assert_eq!(closed.severity, Some(Severity::Error));
    }

    #[test]
    fn test_severity_serialization() {
        let json = serde_json::to_string(&Severity::Warning).unwrap();
        assert_eq!(json, "\"warning\"");
    }

    proptest! {
        #[test]
        fn prop_counters_hold_their_invariants(available in any::<u64>(), redeemed in any::<u64>()) {
            let counters = ProgramCounters::from_totals(available, redeemed);
            prop_assert_eq!(counters.items_available, available);
            prop_assert_eq!(counters.items_redeemed, redeemed);
            prop_assert_eq!(counters.items_remaining, available.saturating_sub(redeemed));
            prop_assert!(counters.items_remaining <= counters.items_available);
            prop_assert_eq!(counters.is_consistent(), redeemed <= available);
            prop_assert_eq!(counters.is_sold_out(), redeemed >= available);
        }

        #[test]
        fn prop_reachable_counters_are_consistent(available in 0u64..1_000_000, fraction in 0.0f64..=1.0) {
            let redeemed = (available as f64 * fraction) as u64;
            let counters = ProgramCounters::from_totals(available, redeemed);
            prop_assert!(counters.is_consistent());
            prop_assert_eq!(counters.items_remaining + counters.items_redeemed, counters.items_available);
            prop_assert_eq!(counters.is_sold_out(), counters.items_remaining == 0);
        }
    }
}
