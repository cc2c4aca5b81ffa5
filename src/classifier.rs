//! Maps submission failures to user-facing alert text
//!
//! The dispatch is ordered and first-match-wins. It is a heuristic over an
//! opaque failure surface: codes it does not know fall through to the
//! generic message instead of erroring.

use crate::errors::MintError;

/// Program error: candy machine is empty
pub const SOLD_OUT_CODE: u32 = 311;
/// Program error: go-live date not reached
pub const NOT_STARTED_CODE: u32 = 312;

/// Raw-text marker for the sold-out program error (311)
pub const SOLD_OUT_MARKER: &str = "0x137";
/// Raw-text marker for the insufficient-funds program error (309)
pub const INSUFFICIENT_FUNDS_MARKER: &str = "0x135";

pub const SOLD_OUT_MESSAGE: &str = "SOLD OUT!";
pub const NOT_STARTED_MESSAGE: &str = "Minting period hasn't started yet.";
pub const INSUFFICIENT_FUNDS_MESSAGE: &str =
    "Insufficient funds to mint. Please fund your wallet.";
pub const GENERIC_FAILURE_MESSAGE: &str = "Minting failed! Please try again!";

pub const MINT_SUCCEEDED_MESSAGE: &str =
    "Congratulations! Mint succeeded! Please check your wallet now";
pub const MINT_FAILED_MESSAGE: &str = "Mint failed! Please try again!";

/// Side effect a classification applies to shared state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideEffect {
    ForceSoldOut,
}

/// Classified failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub message: String,
    pub side_effect: Option<SideEffect>,
}

impl Classification {
    fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            side_effect: None,
        }
    }

    pub fn forces_sold_out(&self) -> bool {
        self.side_effect == Some(SideEffect::ForceSoldOut)
    }
}

/// Classify a submission failure
pub fn classify(failure: &MintError) -> Classification {
    match failure {
        MintError::Program {
            code: SOLD_OUT_CODE,
            ..
        } => Classification {
            message: SOLD_OUT_MESSAGE.to_string(),
            side_effect: Some(SideEffect::ForceSoldOut),
        },
        MintError::Program {
            code: NOT_STARTED_CODE,
            ..
        } => Classification::message(NOT_STARTED_MESSAGE),
        MintError::Program {
            msg: Some(description),
            ..
        } if !description.is_empty() => Classification::message(description.clone()),
        other => classify_description(&description_of(other)),
    }
}

fn description_of(failure: &MintError) -> String {
    match failure {
        MintError::Rpc { message } => message.clone(),
        MintError::Transport(message) => message.clone(),
        other => other.to_string(),
    }
}

/// Substring dispatch for failures without a usable program description.
///
/// The sold-out marker only changes the message here; counters catch up on
/// the next refresh. The not-started marker (0x138) is deliberately inert.
fn classify_description(description: &str) -> Classification {
    if description.contains(INSUFFICIENT_FUNDS_MARKER) {
        Classification::message(INSUFFICIENT_FUNDS_MESSAGE)
    } else if description.contains(SOLD_OUT_MARKER) {
        Classification::message(SOLD_OUT_MESSAGE)
    } else {
        Classification::message(GENERIC_FAILURE_MESSAGE)
    }
}
