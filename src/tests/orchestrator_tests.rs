use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use std::time::Duration;

use super::test_helpers::*;
use crate::classifier::{
    GENERIC_FAILURE_MESSAGE, INSUFFICIENT_FUNDS_MESSAGE, MINT_FAILED_MESSAGE,
    MINT_SUCCEEDED_MESSAGE, NOT_STARTED_MESSAGE, SOLD_OUT_CODE, SOLD_OUT_MESSAGE,
};
use crate::errors::MintError;
use crate::types::{MintAttempt, Severity, TransactionOutcome, TxStatus};

#[tokio::test]
async fn test_confirmed_mint_publishes_success_and_refreshes() {
    let network = MockNetwork::with_state(program_state(10, 4));
    network.push_status(Ok(TxStatus::Success));
    let (orchestrator, store) = orchestrator(&network);
    let state = program_state(10, 4);

    let attempt = orchestrator
        .mint(Some(TEST_WALLET), Some(state.handle), Pubkey::new_unique())
        .await;

    assert!(matches!(
        attempt,
        MintAttempt::Completed {
            outcome: TransactionOutcome::Confirmed,
            ..
        }
    ));
    let snapshot = store.snapshot();
    assert!(snapshot.alert.open);
    assert_eq!(snapshot.alert.message, MINT_SUCCEEDED_MESSAGE);
    assert_eq!(snapshot.alert.severity, Some(Severity::Success));
    assert_eq!(snapshot.counters.items_remaining, 6);
    assert_eq!(snapshot.balance_lamports, Some(TEST_BALANCE));
    assert!(!snapshot.is_minting);
    assert!(!orchestrator.is_busy());
    assert_eq!(MockNetwork::count(&network.submit_calls), 1);
    assert_eq!(MockNetwork::count(&network.state_calls), 1);
    assert_eq!(MockNetwork::count(&network.balance_calls), 1);
}

#[tokio::test]
async fn test_rejected_transaction_shows_mint_failed() {
    let network = MockNetwork::with_state(program_state(10, 0));
    network.push_status(Ok(TxStatus::Pending));
    network.push_status(Ok(TxStatus::Error("custom program error: 0x1".to_string())));
    let (orchestrator, store) = orchestrator(&network);

    let attempt = orchestrator
        .mint(
            Some(TEST_WALLET),
            Some(test_handle()),
            Pubkey::new_unique(),
        )
        .await;

    assert!(matches!(
        attempt,
        MintAttempt::Completed {
            outcome: TransactionOutcome::Rejected(_),
            ..
        }
    ));
    let snapshot = store.snapshot();
    assert_eq!(snapshot.alert.message, MINT_FAILED_MESSAGE);
    assert_eq!(snapshot.alert.severity, Some(Severity::Error));
    assert!(!orchestrator.is_busy());
}

#[tokio::test(start_paused = true)]
async fn test_confirmation_timeout_shows_mint_failed() {
    let network = MockNetwork::with_state(program_state(10, 0));
    let (orchestrator, store) = orchestrator(&network);

    let started = tokio::time::Instant::now();
    let attempt = orchestrator
        .mint(
            Some(TEST_WALLET),
            Some(test_handle()),
            Pubkey::new_unique(),
        )
        .await;

    assert!(started.elapsed() >= Duration::from_secs(30));
    assert!(matches!(
        attempt,
        MintAttempt::Completed {
            outcome: TransactionOutcome::TimedOut,
            ..
        }
    ));
    assert_eq!(store.snapshot().alert.message, MINT_FAILED_MESSAGE);
    assert!(!orchestrator.is_busy());
    assert!(!store.snapshot().is_minting);
}

#[tokio::test(start_paused = true)]
async fn test_status_query_errors_do_not_end_polling() {
    let network = MockNetwork::with_state(program_state(10, 0));
    network.push_status(Err(MintError::Transport("connection reset".to_string())));
    network.push_status(Err(MintError::Transport("connection reset".to_string())));
    network.push_status(Ok(TxStatus::Success));
    let (orchestrator, store) = orchestrator(&network);

    let attempt = orchestrator
        .mint(
            Some(TEST_WALLET),
            Some(test_handle()),
            Pubkey::new_unique(),
        )
        .await;

    assert!(matches!(
        attempt,
        MintAttempt::Completed {
            outcome: TransactionOutcome::Confirmed,
            ..
        }
    ));
    assert_eq!(MockNetwork::count(&network.status_calls), 3);
    assert_eq!(store.snapshot().alert.message, MINT_SUCCEEDED_MESSAGE);
}

#[tokio::test]
async fn test_second_mint_while_busy_is_ignored() {
    let network = MockNetwork::with_state(program_state(10, 0));
    network.push_status(Ok(TxStatus::Success));
    let gate = network.gate_submissions();
    let (orchestrator, store) = orchestrator(&network);
    let wallet = TEST_WALLET;

    let first = {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move {
            orchestrator
                .mint(Some(wallet), Some(test_handle()), Pubkey::new_unique())
                .await
        })
    };
    wait_for(&network.submit_calls, 1).await;
    assert!(orchestrator.is_busy());
    assert!(store.snapshot().is_minting);

    let second = orchestrator
        .mint(Some(wallet), Some(test_handle()), Pubkey::new_unique())
        .await;
    assert_eq!(second, MintAttempt::Busy);
    assert_eq!(MockNetwork::count(&network.submit_calls), 1);

    gate.notify_one();
    let first = first.await.unwrap();
    assert!(first.was_submitted());
    assert!(!orchestrator.is_busy());
    assert!(!store.snapshot().is_minting);
}

#[tokio::test]
async fn test_dropped_attempt_releases_busy() {
    let network = MockNetwork::with_state(program_state(10, 0));
    let _gate = network.gate_submissions();
    let (orchestrator, store) = orchestrator(&network);

    let task = {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move {
            orchestrator
                .mint(
                    Some(TEST_WALLET),
                    Some(test_handle()),
                    Pubkey::new_unique(),
                )
                .await
        })
    };
    wait_for(&network.submit_calls, 1).await;
    assert!(orchestrator.is_busy());

    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());
    assert!(!orchestrator.is_busy());
    assert!(!store.snapshot().is_minting);
}

#[tokio::test]
async fn test_sold_out_code_forces_flag_before_refresh() {
    let network = MockNetwork::with_state(program_state(10, 3));
    network.fail_submit(MintError::Program {
        code: SOLD_OUT_CODE,
        msg: None,
    });
    let (orchestrator, store) = orchestrator(&network);
    network.observe(Arc::clone(&store));

    let attempt = orchestrator
        .mint(
            Some(TEST_WALLET),
            Some(test_handle()),
            Pubkey::new_unique(),
        )
        .await;

    assert_eq!(
        attempt,
        MintAttempt::SubmissionFailed {
            message: SOLD_OUT_MESSAGE.to_string()
        }
    );
    assert_eq!(network.sold_out_at_refresh(), vec![true]);
    // refreshed counters still report stock, so the flag follows them
    let snapshot = store.snapshot();
    assert!(!snapshot.is_sold_out);
    assert_eq!(snapshot.alert.message, SOLD_OUT_MESSAGE);
    assert!(!orchestrator.is_busy());
}

#[tokio::test]
async fn test_submission_failures_are_classified() {
    let cases = vec![
        (
            MintError::Rpc {
                message: "Transaction simulation failed: custom program error: 0x135".to_string(),
            },
            INSUFFICIENT_FUNDS_MESSAGE,
        ),
        (
            MintError::Program {
                code: 312,
                msg: None,
            },
            NOT_STARTED_MESSAGE,
        ),
        (
            MintError::Program {
                code: 6000,
                msg: Some("Custom rule failed".to_string()),
            },
            "Custom rule failed",
        ),
        (
            MintError::Transport("operation timed out".to_string()),
            GENERIC_FAILURE_MESSAGE,
        ),
    ];

    for (err, expected) in cases {
        let network = MockNetwork::with_state(program_state(10, 0));
        network.fail_submit(err);
        let (orchestrator, store) = orchestrator(&network);

        let attempt = orchestrator
            .mint(
                Some(TEST_WALLET),
                Some(test_handle()),
                Pubkey::new_unique(),
            )
            .await;

        assert_eq!(
            attempt,
            MintAttempt::SubmissionFailed {
                message: expected.to_string()
            }
        );
        let snapshot = store.snapshot();
        assert!(snapshot.alert.open);
        assert_eq!(snapshot.alert.message, expected);
        assert_eq!(snapshot.alert.severity, Some(Severity::Error));
        assert!(!snapshot.is_sold_out);
        assert_eq!(MockNetwork::count(&network.status_calls), 0);
        assert_eq!(MockNetwork::count(&network.state_calls), 1);
        assert!(!orchestrator.is_busy());
    }
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_counters() {
    let network = MockNetwork::with_state(program_state(10, 2));
    network.push_status(Ok(TxStatus::Success));
    let (orchestrator, store) = orchestrator(&network);
    store.apply_program_state_for(&TEST_WALLET, &program_state(10, 2));
    network.fail_state(MintError::Transport("connection reset".to_string()));
    network.fail_balance();

    let attempt = orchestrator
        .mint(
            Some(TEST_WALLET),
            Some(test_handle()),
            Pubkey::new_unique(),
        )
        .await;

    assert!(attempt.was_submitted());
    let snapshot = store.snapshot();
    assert_eq!(snapshot.counters.items_remaining, 8);
    assert_eq!(snapshot.balance_lamports, None);
    assert_eq!(snapshot.alert.message, MINT_SUCCEEDED_MESSAGE);
}

#[tokio::test]
async fn test_missing_wallet_is_a_silent_no_op() {
    let network = MockNetwork::with_state(program_state(10, 0));
    let (orchestrator, store) = orchestrator(&network);

    let attempt = orchestrator
        .mint(None, Some(test_handle()), Pubkey::new_unique())
        .await;

    assert_eq!(attempt, MintAttempt::PreconditionNotMet);
    assert_eq!(MockNetwork::count(&network.submit_calls), 0);
    assert_eq!(MockNetwork::count(&network.state_calls), 0);
    assert_eq!(MockNetwork::count(&network.balance_calls), 0);
    assert!(!store.snapshot().alert.open);
    assert!(!orchestrator.is_busy());
}

#[tokio::test]
async fn test_missing_program_skips_submission_but_refreshes() {
    let network = MockNetwork::with_state(program_state(10, 0));
    let (orchestrator, store) = orchestrator(&network);

    let attempt = orchestrator
        .mint(Some(TEST_WALLET), None, Pubkey::new_unique())
        .await;

    assert_eq!(attempt, MintAttempt::PreconditionNotMet);
    assert_eq!(MockNetwork::count(&network.submit_calls), 0);
    assert_eq!(MockNetwork::count(&network.state_calls), 1);
    assert!(!store.snapshot().alert.open);
    assert!(store.snapshot().program.is_some());
}
