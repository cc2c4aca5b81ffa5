//! Mint eligibility gate
//!
//! `is_active` flips to true once the start date is reached and stays
//! there for the rest of the session. The countdown task resolves
//! immediately when it starts observing after the start date, and
//! retargets when a refresh moves the start date.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::store::{MintSnapshot, MintStore};

/// `now >= start_date`
pub fn is_active_at(now: DateTime<Utc>, start_date: DateTime<Utc>) -> bool {
    now >= start_date
}

/// Time left until `start_date`, or `None` when already due
pub fn time_until(now: DateTime<Utc>, start_date: DateTime<Utc>) -> Option<Duration> {
    (start_date - now).to_std().ok().filter(|d| !d.is_zero())
}

/// Whether the mint action should be offered
pub fn mint_enabled(snapshot: &MintSnapshot) -> bool {
    snapshot.mint_enabled()
}

/// Countdown text: "{hours} hours, {minutes} minutes, {seconds} seconds",
/// with whole days folded into the hours.
pub fn countdown_text(remaining: Duration) -> String {
    let total = remaining.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{} hours, {} minutes, {} seconds", hours, minutes, seconds)
}

/// Drives `is_active` from the start date held in the store
#[derive(Debug, Clone)]
pub struct EligibilityGate {
    store: Arc<MintStore>,
}

impl EligibilityGate {
    pub fn new(store: Arc<MintStore>) -> Self {
        Self { store }
    }

    /// Resolve `is_active` against the wall clock right now.
    ///
    /// Returns the current value of `is_active`.
    pub fn check_now(&self) -> bool {
        let snapshot = self.store.snapshot();
        if snapshot.is_active {
            return true;
        }
        if is_active_at(Utc::now(), snapshot.start_date) {
            self.activate();
            return true;
        }
        false
    }

    /// Time left on the countdown, `None` once active or due
    pub fn remaining(&self) -> Option<Duration> {
        let snapshot = self.store.snapshot();
        if snapshot.is_active {
            return None;
        }
        time_until(Utc::now(), snapshot.start_date)
    }

    fn activate(&self) {
        if self.store.activate() {
            info!("⏰ Minting is now active");
        }
    }

    /// Spawn the countdown on the current runtime
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    /// Wait for the start date, then activate. Returns once active.
    pub async fn run(self) {
        let mut changes = self.store.subscribe();

        loop {
            let snapshot = self.store.snapshot();
            if snapshot.is_active {
                return;
            }

            let Some(remaining) = time_until(Utc::now(), snapshot.start_date) else {
                self.activate();
                return;
            };

            debug!(
                start_date = %snapshot.start_date,
                remaining = %countdown_text(remaining),
                "Countdown pending"
            );

            tokio::select! {
                _ = tokio::time::sleep(remaining) => {
                    self.activate();
                    return;
                }
                changed = changes.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[test]
    fn test_countdown_text_folds_days() {
        let remaining = Duration::from_secs(2 * 86_400 + 3 * 3600 + 4 * 60 + 5);
        assert_eq!(countdown_text(remaining), "51 hours, 4 minutes, 5 seconds");
    }

    #[test]
    fn test_time_until() {
        let now = Utc::now();
        assert!(time_until(now, now - ChronoDuration::seconds(1)).is_none());
        assert!(time_until(now, now).is_none());
        assert_eq!(
            time_until(now, now + ChronoDuration::seconds(30)),
            Some(Duration::from_secs(30))
        );
    }

    #[test]
    fn test_past_start_date_is_active_immediately() {
        let store = Arc::new(MintStore::new(Utc::now() - ChronoDuration::hours(1)));
        let gate = EligibilityGate::new(Arc::clone(&store));
        assert!(gate.check_now());
        assert!(store.snapshot().is_active);
        assert!(gate.remaining().is_none());
    }

    #[test]
    fn test_future_start_date_is_not_active() {
        let store = Arc::new(MintStore::new(Utc::now() + ChronoDuration::hours(1)));
        let gate = EligibilityGate::new(Arc::clone(&store));
        assert!(!gate.check_now());
        assert!(gate.remaining().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_activates_once_and_never_reverts() {
        let store = Arc::new(MintStore::new(Utc::now() + ChronoDuration::seconds(10)));
        let mut changes = store.subscribe();
        let handle = EligibilityGate::new(Arc::clone(&store)).spawn();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(!store.snapshot().is_active);

        handle.await.unwrap();
        assert!(store.snapshot().is_active);

        // exactly one write: the activation
        assert!(changes.has_changed().unwrap());
        changes.borrow_and_update();
        assert!(!store.activate());
        assert!(!changes.has_changed().unwrap());
        assert!(store.snapshot().is_active);
    }

    #[tokio::test]
    async fn test_run_resolves_immediately_when_past_due() {
        let store = Arc::new(MintStore::new(Utc::now() - ChronoDuration::seconds(1)));
        EligibilityGate::new(Arc::clone(&store)).run().await;
        assert!(store.snapshot().is_active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_retargets_on_start_date_change() {
        let store = Arc::new(MintStore::new(Utc::now() + ChronoDuration::hours(1)));
        let handle = EligibilityGate::new(Arc::clone(&store)).spawn();
        tokio::task::yield_now().await;

        store.update(|s| s.start_date = Utc::now() - ChronoDuration::seconds(1));
        handle.await.unwrap();
        assert!(store.snapshot().is_active);
    }
}
