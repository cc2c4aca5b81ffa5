use chrono::{Duration as ChronoDuration, Utc};
use solana_sdk::pubkey::Pubkey;
use std::time::Duration;

use super::test_helpers::*;
use crate::classifier::MINT_SUCCEEDED_MESSAGE;
use crate::session::MintSession;
use crate::types::{MintAttempt, TxStatus};

#[tokio::test]
async fn test_connect_wallet_fetches_balance_and_state_once() {
    let network = MockNetwork::with_state(program_state(20, 5));
    let session = MintSession::new(network.clone(), session_settings(Utc::now()));
    let wallet = Pubkey::new_unique();

    session.connect_wallet(wallet).await;
    session.connect_wallet(wallet).await;

    let snapshot = session.snapshot();
    assert_eq!(snapshot.wallet, Some(wallet));
    assert_eq!(snapshot.balance_lamports, Some(TEST_BALANCE));
    assert_eq!(snapshot.balance_sol(), 2.5);
    assert_eq!(snapshot.counters.items_remaining, 15);
    assert!(snapshot.program.is_some());
    assert_eq!(MockNetwork::count(&network.state_calls), 1);
    assert_eq!(MockNetwork::count(&network.balance_calls), 1);
}

#[tokio::test]
async fn test_past_start_date_is_active_immediately() {
    let network = MockNetwork::with_state(program_state(20, 0));
    let session = MintSession::new(
        network.clone(),
        session_settings(Utc::now() - ChronoDuration::hours(1)),
    );
    session.connect_wallet(Pubkey::new_unique()).await;

    let countdown = session.spawn_countdown();
    assert!(session.snapshot().is_active);
    assert!(session.is_mint_enabled());
    assert_eq!(session.countdown_remaining(), None);
    countdown.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_mint_waits_for_countdown() {
    let network = MockNetwork::with_state(program_state(20, 0));
    network.push_status(Ok(TxStatus::Success));
    let session = MintSession::new(
        network.clone(),
        session_settings(Utc::now() + ChronoDuration::seconds(90)),
    );
    session.connect_wallet(Pubkey::new_unique()).await;
    let countdown = session.spawn_countdown();

    assert!(!session.snapshot().is_active);
    assert!(session.countdown_remaining().is_some());
    assert_eq!(session.mint().await, MintAttempt::NotEligible);
    assert_eq!(MockNetwork::count(&network.submit_calls), 0);
    assert!(!session.snapshot().alert.open);

    tokio::time::sleep(Duration::from_secs(91)).await;
    countdown.await.unwrap();
    assert!(session.snapshot().is_active);

    let attempt = session.mint().await;
    assert!(attempt.was_submitted());
    assert_eq!(session.snapshot().alert.message, MINT_SUCCEEDED_MESSAGE);
}

#[tokio::test]
async fn test_sold_out_after_refresh_is_not_eligible() {
    let network = MockNetwork::with_state(program_state(20, 0));
    let session = MintSession::new(
        network.clone(),
        session_settings(Utc::now() - ChronoDuration::minutes(5)),
    );
    session.connect_wallet(Pubkey::new_unique()).await;
    session.spawn_countdown().await.unwrap();
    assert!(session.is_mint_enabled());

    network.set_state(program_state(20, 20));
    session.refresh().await;

    assert!(session.snapshot().is_sold_out);
    assert!(!session.is_mint_enabled());
    assert_eq!(session.mint().await, MintAttempt::NotEligible);
    assert_eq!(MockNetwork::count(&network.submit_calls), 0);
}

#[tokio::test]
async fn test_mint_while_busy_returns_busy() {
    let network = MockNetwork::with_state(program_state(20, 0));
    network.push_status(Ok(TxStatus::Success));
    let gate = network.gate_submissions();
    let session = MintSession::new(
        network.clone(),
        session_settings(Utc::now() - ChronoDuration::minutes(5)),
    );
    session.connect_wallet(Pubkey::new_unique()).await;
    session.spawn_countdown().await.unwrap();

    let first = {
        let session = session.clone();
        tokio::spawn(async move { session.mint().await })
    };
    wait_for(&network.submit_calls, 1).await;

    assert!(session.is_minting());
    assert!(!session.is_mint_enabled());
    assert_eq!(session.mint().await, MintAttempt::Busy);

    gate.notify_one();
    assert!(first.await.unwrap().was_submitted());
    assert!(!session.is_minting());
    assert!(session.is_mint_enabled());
}

#[tokio::test]
async fn test_dismiss_alert_keeps_message() {
    let network = MockNetwork::with_state(program_state(20, 0));
    network.push_status(Ok(TxStatus::Success));
    let session = MintSession::new(
        network.clone(),
        session_settings(Utc::now() - ChronoDuration::minutes(5)),
    );
    session.connect_wallet(Pubkey::new_unique()).await;
    session.spawn_countdown().await.unwrap();
    session.mint().await;

    let mut changes = session.subscribe();
    session.dismiss_alert();
    assert!(changes.has_changed().unwrap());

    let alert = session.snapshot().alert.clone();
    assert!(!alert.open);
    assert_eq!(alert.message, MINT_SUCCEEDED_MESSAGE);
}

#[tokio::test]
async fn test_disconnect_clears_wallet_but_keeps_counters() {
    let network = MockNetwork::with_state(program_state(20, 5));
    let session = MintSession::new(network.clone(), session_settings(Utc::now()));
    session.connect_wallet(Pubkey::new_unique()).await;

    session.disconnect_wallet();

    let snapshot = session.snapshot();
    assert_eq!(snapshot.wallet, None);
    assert_eq!(snapshot.balance_lamports, None);
    assert!(snapshot.program.is_none());
    assert_eq!(snapshot.counters.items_remaining, 15);
}

#[tokio::test]
async fn test_disconnect_during_mint_is_not_undone_by_cleanup() {
    let network = MockNetwork::with_state(program_state(20, 0));
    network.push_status(Ok(TxStatus::Success));
    let gate = network.gate_submissions();
    let session = MintSession::new(
        network.clone(),
        session_settings(Utc::now() - ChronoDuration::minutes(5)),
    );
    session.connect_wallet(Pubkey::new_unique()).await;
    session.spawn_countdown().await.unwrap();

    let pending = {
        let session = session.clone();
        tokio::spawn(async move { session.mint().await })
    };
    wait_for(&network.submit_calls, 1).await;
    session.disconnect_wallet();
    gate.notify_one();
    assert!(pending.await.unwrap().was_submitted());

    let snapshot = session.snapshot();
    assert_eq!(snapshot.wallet, None);
    assert_eq!(snapshot.balance_lamports, None);
    assert!(snapshot.program.is_none());
    assert_eq!(snapshot.alert.message, MINT_SUCCEEDED_MESSAGE);
}

#[tokio::test]
async fn test_wallet_switch_during_mint_keeps_new_wallet_state() {
    let network = MockNetwork::with_state(program_state(20, 0));
    network.push_status(Ok(TxStatus::Success));
    let gate = network.gate_submissions();
    let session = MintSession::new(
        network.clone(),
        session_settings(Utc::now() - ChronoDuration::minutes(5)),
    );
    session.connect_wallet(Pubkey::new_unique()).await;
    session.spawn_countdown().await.unwrap();

    let pending = {
        let session = session.clone();
        tokio::spawn(async move { session.mint().await })
    };
    wait_for(&network.submit_calls, 1).await;

    let second = Pubkey::new_unique();
    network.set_state(program_state(20, 3));
    session.connect_wallet(second).await;
    let connected = session.snapshot();
    assert_eq!(connected.counters.items_remaining, 17);

    network.set_state(program_state(20, 9));
    gate.notify_one();
    pending.await.unwrap();

    let snapshot = session.snapshot();
    assert_eq!(snapshot.wallet, Some(second));
    assert_eq!(snapshot.counters, connected.counters);
    assert_eq!(snapshot.program, connected.program);
}

#[tokio::test]
async fn test_mint_without_wallet_is_rejected_quietly() {
    let network = MockNetwork::with_state(program_state(20, 0));
    let session = MintSession::new(
        network.clone(),
        session_settings(Utc::now() - ChronoDuration::minutes(5)),
    );
    session.spawn_countdown().await.unwrap();
    assert!(session.snapshot().is_active);

    let mut changes = session.subscribe();
    changes.borrow_and_update();

    assert_eq!(session.mint().await, MintAttempt::PreconditionNotMet);
    assert!(!changes.has_changed().unwrap());
    assert!(!session.is_minting());
    assert!(!session.snapshot().is_minting);
    assert_eq!(MockNetwork::count(&network.submit_calls), 0);
    assert_eq!(MockNetwork::count(&network.state_calls), 0);
    assert_eq!(MockNetwork::count(&network.balance_calls), 0);
}
