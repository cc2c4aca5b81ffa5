//! Candy Mint - client-side mint lifecycle for a Solana candy machine
//!
//! The library holds the mint core (eligibility, state refresh, the
//! mint orchestrator, confirmation polling, error classification and the
//! renderable state store) together with the Solana RPC and in-memory
//! backends it runs against.

pub mod classifier;
pub mod config;
pub mod eligibility;
pub mod endpoints;
pub mod errors;
pub mod metrics;
pub mod network;
pub mod orchestrator;
pub mod poller;
pub mod refresher;
pub mod rpc;
pub mod session;
pub mod simulation;
pub mod store;
pub mod structured_logging;
pub mod types;
pub mod wallet;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use errors::{MintError, MintResult};
pub use session::{MintSession, SessionSettings};
pub use solana_sdk::{pubkey::Pubkey, signature::Signature};
pub use store::{MintSnapshot, MintStore};
pub use types::{AlertState, MintAttempt, Severity, TransactionOutcome};
