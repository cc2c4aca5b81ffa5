use solana_client::client_error::ClientError;
use solana_sdk::{instruction::InstructionError, transaction::TransactionError};
use thiserror::Error;

/// Failure taxonomy for everything crossing a collaborator boundary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MintError {
    /// Structured on-chain program error.
    ///
    /// Display renders the code in hex so the raw text carries the same
    /// marker the RPC node would print for it.
    #[error("custom program error: {code:#x}")]
    Program {
        code: u32,
        /// Human-readable description, when the program's error table provides one
        msg: Option<String>,
    },

    /// Unstructured failure carrying only a description
    #[error("RPC error: {message}")]
    Rpc { message: String },

    /// Network-level failure (connection, timeout)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Account data could not be decoded
    #[error("Account decode error: {0}")]
    Decode(String),

    /// Submission requested for a buyer that is not the loaded wallet
    #[error("Wallet mismatch (loaded: {loaded}, requested: {requested})")]
    WalletMismatch { loaded: String, requested: String },

    /// Configuration or unsupported program setup
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl MintError {
    /// Whether the failure is likely transient
    pub fn is_retryable(&self) -> bool {
        match self {
            MintError::Transport(_) => true,
            MintError::Rpc { .. } => true,

            MintError::Program { .. } => false,
            MintError::Decode(_) => false,
            MintError::WalletMismatch { .. } => false,
            MintError::Configuration(_) => false,
        }
    }

    /// Program error code, if structured
    pub fn program_code(&self) -> Option<u32> {
        match self {
            MintError::Program { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Create from ClientError
    pub fn from_client_error(err: ClientError) -> Self {
        if let Some(TransactionError::InstructionError(_, InstructionError::Custom(code))) =
            err.get_transaction_error()
        {
            return MintError::Program { code, msg: None };
        }

        let message = err.to_string();
        let lower = message.to_lowercase();

        if lower.contains("timeout")
            || lower.contains("timed out")
            || lower.contains("connection refused")
            || lower.contains("error sending request")
        {
            MintError::Transport(message)
        } else {
            MintError::Rpc { message }
        }
    }
}

impl From<ClientError> for MintError {
    fn from(err: ClientError) -> Self {
        MintError::from_client_error(err)
    }
}

pub type MintResult<T> = Result<T, MintError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_error_display_is_hex() {
        let err = MintError::Program {
            code: 311,
            msg: None,
        };
        assert_eq!(err.to_string(), "custom program error: 0x137");
        assert_eq!(err.program_code(), Some(311));
    }

    #[test]
    fn test_error_is_retryable() {
        assert!(MintError::Transport("connection reset".to_string()).is_retryable());
        assert!(MintError::Rpc {
            message: "node is behind".to_string()
        }
        .is_retryable());
        assert!(!MintError::Program {
            code: 312,
            msg: None
        }
        .is_retryable());
        assert!(!MintError::Configuration("bad".to_string()).is_retryable());
    }

    #[test]
    fn test_instruction_error_becomes_program_error() {
        let err: ClientError = TransactionError::InstructionError(4, InstructionError::Custom(311)).into();
        assert_eq!(
            MintError::from_client_error(err),
            MintError::Program {
                code: 311,
                msg: None
            }
        );
    }
}
