//! Metrics collection and export module

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Opts, Registry, TextEncoder,
};
use std::time::Instant;

/// Global metrics registry
pub struct Metrics {
    registry: Registry,

    // Counters
    pub mint_attempts: IntCounter,
    pub mint_confirmed: IntCounter,
    pub mint_rejected: IntCounter,
    pub mint_timed_out: IntCounter,
    pub mint_submission_failures: IntCounter,
    pub mint_ignored_busy: IntCounter,
    pub mint_precondition_skips: IntCounter,
    pub state_refresh_failures: IntCounter,
    pub balance_refresh_failures: IntCounter,
    pub confirmation_polls: IntCounter,

    // Gauges
    pub items_remaining: IntGauge,
    pub balance_lamports: IntGauge,

    // Histograms
    pub submit_latency: Histogram,
    pub confirmation_latency: Histogram,
}

impl Metrics {
    /// Create new metrics instance
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let mint_attempts = IntCounter::with_opts(Opts::new(
            "mint_attempts_total",
            "Mint attempts that reached submission",
        ))?;
        let mint_confirmed = IntCounter::with_opts(Opts::new(
            "mint_confirmed_total",
            "Mint transactions confirmed",
        ))?;
        let mint_rejected = IntCounter::with_opts(Opts::new(
            "mint_rejected_total",
            "Mint transactions rejected on-chain",
        ))?;
        let mint_timed_out = IntCounter::with_opts(Opts::new(
            "mint_timed_out_total",
            "Mint transactions not confirmed before the deadline",
        ))?;
        let mint_submission_failures = IntCounter::with_opts(Opts::new(
            "mint_submission_failures_total",
            "Mint submissions that raised a failure",
        ))?;
        let mint_ignored_busy = IntCounter::with_opts(Opts::new(
            "mint_ignored_busy_total",
            "Mint requests ignored because an attempt was in flight",
        ))?;
        let mint_precondition_skips = IntCounter::with_opts(Opts::new(
            "mint_precondition_skips_total",
            "Mint requests skipped for a missing wallet or program handle",
        ))?;
        let state_refresh_failures = IntCounter::with_opts(Opts::new(
            "state_refresh_failures_total",
            "Program state refreshes that failed",
        ))?;
        let balance_refresh_failures = IntCounter::with_opts(Opts::new(
            "balance_refresh_failures_total",
            "Wallet balance refreshes that failed",
        ))?;
        let confirmation_polls = IntCounter::with_opts(Opts::new(
            "confirmation_polls_total",
            "Transaction status queries issued while awaiting confirmation",
        ))?;

        let items_remaining = IntGauge::with_opts(Opts::new(
            "items_remaining",
            "Items remaining at the last refresh",
        ))?;
        let balance_lamports = IntGauge::with_opts(Opts::new(
            "balance_lamports",
            "Wallet balance at the last refresh",
        ))?;

        let submit_latency = Histogram::with_opts(
            HistogramOpts::new("submit_latency_seconds", "Mint submission latency")
                .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0]),
        )?;
        let confirmation_latency = Histogram::with_opts(
            HistogramOpts::new(
                "confirmation_latency_seconds",
                "Time from submission to terminal confirmation outcome",
            )
            .buckets(vec![0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 30.0, 60.0]),
        )?;

        // Register all metrics
        registry.register(Box::new(mint_attempts.clone()))?;
        registry.register(Box::new(mint_confirmed.clone()))?;
        registry.register(Box::new(mint_rejected.clone()))?;
        registry.register(Box::new(mint_timed_out.clone()))?;
        registry.register(Box::new(mint_submission_failures.clone()))?;
        registry.register(Box::new(mint_ignored_busy.clone()))?;
        registry.register(Box::new(mint_precondition_skips.clone()))?;
        registry.register(Box::new(state_refresh_failures.clone()))?;
        registry.register(Box::new(balance_refresh_failures.clone()))?;
        registry.register(Box::new(confirmation_polls.clone()))?;
        registry.register(Box::new(items_remaining.clone()))?;
        registry.register(Box::new(balance_lamports.clone()))?;
        registry.register(Box::new(submit_latency.clone()))?;
        registry.register(Box::new(confirmation_latency.clone()))?;

        Ok(Self {
            registry,
            mint_attempts,
            mint_confirmed,
            mint_rejected,
            mint_timed_out,
            mint_submission_failures,
            mint_ignored_busy,
            mint_precondition_skips,
            state_refresh_failures,
            balance_refresh_failures,
            confirmation_polls,
            items_remaining,
            balance_lamports,
            submit_latency,
            confirmation_latency,
        })
    }

    /// Get the registry for exporting
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render all metrics in the Prometheus text format
    pub fn render(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Global metrics instance
pub fn metrics() -> &'static Metrics {
    static METRICS: once_cell::sync::Lazy<Metrics> =
        once_cell::sync::Lazy::new(|| Metrics::new().expect("Failed to initialize metrics"));
    &METRICS
}

/// Timer helper for measuring operation duration
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn observe_duration(&self, histogram: &Histogram) {
        histogram.observe(self.elapsed_secs());
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_increment() {
        let m = metrics();
        let before = m.mint_ignored_busy.get();
        m.mint_ignored_busy.inc();
        assert!(m.mint_ignored_busy.get() >= before + 1);
    }

    #[test]
    fn test_render_contains_metric_names() {
        let m = metrics();
        m.confirmation_polls.inc();
        let text = m.render().unwrap();
        assert!(text.contains("confirmation_polls_total"));
        assert!(text.contains("mint_attempts_total"));
    }

    #[test]
    fn test_timer_observes() {
        let m = metrics();
        let timer = Timer::new();
        timer.observe_duration(&m.submit_latency);
        assert!(m.submit_latency.get_sample_count() > 0);
    }
}
