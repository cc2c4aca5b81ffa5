//! Structured logging and per-attempt context

use uuid::Uuid;

/// Structured logger for mint attempt events
#[derive(Debug, Clone)]
pub struct MintLogger {
    context_id: String,
}

impl MintLogger {
    pub fn new(context_id: String) -> Self {
        Self { context_id }
    }

    pub fn log_attempt(&self, buyer: &str, candy_machine: &str) {
        tracing::info!(
            context_id = %self.context_id,
            buyer = %buyer,
            candy_machine = %candy_machine,
            "Submitting mint transaction"
        );
    }

    pub fn log_submitted(&self, signature: &str, latency_ms: u64) {
        tracing::info!(
            context_id = %self.context_id,
            signature = %signature,
            latency_ms = %latency_ms,
            "Mint transaction submitted"
        );
    }

    pub fn log_outcome(&self, signature: &str, outcome: &str, latency_ms: u64) {
        tracing::info!(
            context_id = %self.context_id,
            signature = %signature,
            outcome = %outcome,
            latency_ms = %latency_ms,
            "Mint attempt resolved"
        );
    }

    pub fn log_submission_failure(&self, error: &str, alert: &str) {
        tracing::warn!(
            context_id = %self.context_id,
            error = %error,
            alert = %alert,
            "Mint submission failed"
        );
    }
}

/// Execution context for a single mint attempt
#[derive(Debug, Clone)]
pub struct AttemptContext {
    /// Unique attempt id, used as the correlation id in every log line
    pub attempt_id: String,

    /// Unix timestamp (seconds) when the attempt started
    pub timestamp: i64,

    pub logger: MintLogger,
}

impl AttemptContext {
    pub fn new() -> Self {
        let attempt_id = Uuid::new_v4().to_string();
        Self {
            attempt_id: attempt_id.clone(),
            timestamp: chrono::Utc::now().timestamp(),
            logger: MintLogger::new(attempt_id),
        }
    }
}

impl Default for AttemptContext {
    fn default() -> Self {
        Self::new()
    }
}
