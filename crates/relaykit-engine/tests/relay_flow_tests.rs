//! End-to-end relay scenarios over mock transports.
//!
//! Each test scripts both reader links and drives a full session through
//! its public surface: initialize, run, inspect the traffic the emulator
//! and card actually saw.

use relaykit_core::{
    CardIdentity, Error, StatusWord,
    constants::{DEFAULT_ATQA, DEFAULT_SAK},
};
use relaykit_engine::{RelayConfig, RelaySession, RelayState};
use relaykit_hardware::{TransportError, mock::MockTransport};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// A get-data poll as it appears on the emulator link.
const POLL_FRAME: [u8; 7] = [0xFF, 0x00, 0x00, 0x00, 0x02, 0xD4, 0x86];

fn identity() -> CardIdentity {
    CardIdentity::new(DEFAULT_ATQA, vec![0x88, 0x04, 0xE1, 0x5C], DEFAULT_SAK).unwrap()
}

/// Short timeouts and a low failure limit so exhausted scripts end the loop
/// quickly.
fn test_config() -> RelayConfig {
    RelayConfig {
        transmit_timeout: Duration::from_millis(100),
        poll_backoff: Duration::from_millis(5),
        emulator_failure_limit: 3,
        ..RelayConfig::default()
    }
}

#[tokio::test]
async fn relays_one_command_verbatim() {
    let (emulator, emulator_handle) = MockTransport::with_name("emulator");
    let (card, card_handle) = MockTransport::with_name("card");

    emulator_handle.queue_status(StatusWord::SUCCESS); // init ack
    emulator_handle.queue_response(
        &[0xD5, 0x87, 0x00, 0x00, 0xA4, 0x04, 0x00],
        StatusWord::SUCCESS,
    ); // framed terminal command
    emulator_handle.queue_status(StatusWord::SUCCESS); // set-data ack

    card_handle.queue_response(&[0x6A, 0x82], StatusWord::SUCCESS);

    let mut session = RelaySession::with_config(emulator, card, test_config());
    session.initialize(&identity()).await.unwrap();

    // The exhausted emulator script ends the loop via the failure limit.
    let result = session.run(CancellationToken::new()).await;
    assert!(matches!(
        result,
        Err(Error::EmulatorUnavailable { failures: 3 })
    ));

    let stats = session.stats();
    assert_eq!(stats.commands_relayed, 1);
    assert_eq!(stats.card_failures, 0);

    // The card saw the unwrapped APDU, header stripped.
    assert_eq!(card_handle.sent_frames(), vec![vec![0x00, 0xA4, 0x04, 0x00]]);

    // The emulator saw init, a poll, then the body + status word pushed
    // back unchanged.
    let sent = emulator_handle.sent_frames();
    assert_eq!(&sent[0][..4], &[0xFF, 0x00, 0x00, 0x00]);
    assert_eq!(&sent[0][5..7], &[0xD4, 0x8C]);
    assert_eq!(sent[1], POLL_FRAME.to_vec());
    assert_eq!(
        sent[2],
        vec![0xFF, 0x00, 0x00, 0x00, 0x06, 0xD4, 0x8E, 0x6A, 0x82, 0x90, 0x00]
    );

    session.shutdown().await;
}

#[tokio::test]
async fn card_failure_substitutes_technical_problem_status() {
    let (emulator, emulator_handle) = MockTransport::with_name("emulator");
    let (card, card_handle) = MockTransport::with_name("card");

    emulator_handle.queue_status(StatusWord::SUCCESS); // init ack
    emulator_handle.queue_response(
        &[0xD5, 0x87, 0x00, 0x80, 0xA8, 0x00, 0x00],
        StatusWord::SUCCESS,
    );
    emulator_handle.queue_status(StatusWord::SUCCESS); // set-data ack

    card_handle.queue_error(TransportError::timeout(100));

    let mut session = RelaySession::with_config(emulator, card, test_config());
    session.initialize(&identity()).await.unwrap();
    let _ = session.run(CancellationToken::new()).await;

    let stats = session.stats();
    assert_eq!(stats.card_failures, 1);
    assert_eq!(stats.commands_relayed, 1);

    // Exactly the synthetic status word went back, nothing else.
    let sent = emulator_handle.sent_frames();
    assert_eq!(
        sent[2],
        vec![0xFF, 0x00, 0x00, 0x00, 0x04, 0xD4, 0x8E, 0x6F, 0x00]
    );
}

#[tokio::test]
async fn short_poll_frame_repolls_instead_of_failing() {
    let (emulator, emulator_handle) = MockTransport::with_name("emulator");
    let (card, card_handle) = MockTransport::with_name("card");

    emulator_handle.queue_status(StatusWord::SUCCESS); // init ack
    emulator_handle.queue_response(&[0xD5, 0x87], StatusWord::SUCCESS); // 2 bytes: too short
    emulator_handle.queue_response(
        &[0xD5, 0x87, 0x00, 0x00, 0xB2, 0x01, 0x0C],
        StatusWord::SUCCESS,
    );
    emulator_handle.queue_status(StatusWord::SUCCESS); // set-data ack

    card_handle.queue_response(&[0x01, 0x02], StatusWord::SUCCESS);

    let mut session = RelaySession::with_config(emulator, card, test_config());
    session.initialize(&identity()).await.unwrap();
    let _ = session.run(CancellationToken::new()).await;

    let stats = session.stats();
    assert_eq!(stats.short_polls, 1);
    assert_eq!(stats.commands_relayed, 1);

    // The short frame never reached the card.
    assert_eq!(card_handle.sent_count(), 1);
}

#[tokio::test]
async fn unsuccessful_poll_status_counts_as_nothing_pending() {
    let (emulator, emulator_handle) = MockTransport::with_name("emulator");
    let (card, card_handle) = MockTransport::with_name("card");

    emulator_handle.queue_status(StatusWord::SUCCESS); // init ack
    emulator_handle.queue_response(&[0xAA, 0xBB, 0xCC], StatusWord::new(0x63, 0x00));
    emulator_handle.queue_response(
        &[0xD5, 0x87, 0x00, 0x00, 0xCA, 0x00, 0x00],
        StatusWord::SUCCESS,
    );
    emulator_handle.queue_status(StatusWord::SUCCESS);

    card_handle.queue_response(&[0x42], StatusWord::SUCCESS);

    let mut session = RelaySession::with_config(emulator, card, test_config());
    session.initialize(&identity()).await.unwrap();
    let _ = session.run(CancellationToken::new()).await;

    let stats = session.stats();
    assert_eq!(stats.short_polls, 1);
    assert_eq!(stats.commands_relayed, 1);
}

#[tokio::test]
async fn rejected_initialization_aborts_before_relay() {
    let (emulator, emulator_handle) = MockTransport::with_name("emulator");
    let (card, card_handle) = MockTransport::with_name("card");

    emulator_handle.queue_status(StatusWord::new(0x63, 0x00));

    let mut session = RelaySession::with_config(emulator, card, test_config());
    let result = session.initialize(&identity()).await;
    match result {
        Err(Error::InitializationRejected { status }) => {
            assert_eq!(status.to_u16(), 0x6300);
        }
        other => panic!("expected InitializationRejected, got {other:?}"),
    }

    // The loop refuses to start after a failed initialization.
    let result = session.run(CancellationToken::new()).await;
    assert!(matches!(result, Err(Error::Config(_))));
    assert_eq!(card_handle.sent_count(), 0);
}

#[tokio::test]
async fn refused_delivery_does_not_end_the_session() {
    let (emulator, emulator_handle) = MockTransport::with_name("emulator");
    let (card, card_handle) = MockTransport::with_name("card");

    emulator_handle.queue_status(StatusWord::SUCCESS); // init ack
    emulator_handle.queue_response(
        &[0xD5, 0x87, 0x00, 0x00, 0xA4, 0x04, 0x00],
        StatusWord::SUCCESS,
    );
    emulator_handle.queue_status(StatusWord::new(0x63, 0x00)); // emulator refuses delivery
    emulator_handle.queue_response(
        &[0xD5, 0x87, 0x00, 0x00, 0xB0, 0x00, 0x00],
        StatusWord::SUCCESS,
    );
    emulator_handle.queue_status(StatusWord::SUCCESS); // second delivery accepted

    card_handle.queue_response(&[0x90, 0x01], StatusWord::SUCCESS);
    card_handle.queue_response(&[0x90, 0x02], StatusWord::SUCCESS);

    let mut session = RelaySession::with_config(emulator, card, test_config());
    session.initialize(&identity()).await.unwrap();
    let _ = session.run(CancellationToken::new()).await;

    let stats = session.stats();
    assert_eq!(stats.commands_relayed, 2);
    assert_eq!(stats.delivery_failures, 1);
    assert_eq!(card_handle.sent_count(), 2);
}

#[tokio::test]
async fn cancellation_stops_the_loop_cleanly() {
    let (emulator, emulator_handle) = MockTransport::with_name("emulator");
    let (card, card_handle) = MockTransport::with_name("card");

    emulator_handle.queue_status(StatusWord::SUCCESS); // init ack

    let mut session = RelaySession::with_config(emulator, card, test_config());
    session.initialize(&identity()).await.unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = session.run(cancel).await;
    assert!(result.is_ok());
    assert_eq!(session.state(), RelayState::Stopped);

    // Only the init command ever went out.
    assert_eq!(emulator_handle.sent_count(), 1);
    assert_eq!(card_handle.sent_count(), 0);
}

#[tokio::test]
async fn cancellation_interrupts_the_backoff() {
    let (emulator, emulator_handle) = MockTransport::with_name("emulator");
    let (card, _card_handle) = MockTransport::with_name("card");

    emulator_handle.queue_status(StatusWord::SUCCESS); // init ack
    for _ in 0..1000 {
        emulator_handle.queue_response(&[], StatusWord::SUCCESS); // endless empty polls
    }

    let config = RelayConfig {
        poll_backoff: Duration::from_millis(50),
        ..test_config()
    };
    let mut session = RelaySession::with_config(emulator, card, config);
    session.initialize(&identity()).await.unwrap();

    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    let handle = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        canceller.cancel();
    });

    let result = session.run(cancel).await;
    assert!(result.is_ok());
    assert_eq!(session.state(), RelayState::Stopped);
    handle.await.unwrap();
}

#[tokio::test]
async fn emulator_failure_limit_ends_the_session() {
    let (emulator, emulator_handle) = MockTransport::with_name("emulator");
    let (card, _card_handle) = MockTransport::with_name("card");

    emulator_handle.queue_status(StatusWord::SUCCESS); // init ack
    emulator_handle.queue_error(TransportError::disconnected("emulator"));
    emulator_handle.queue_error(TransportError::disconnected("emulator"));
    emulator_handle.queue_error(TransportError::disconnected("emulator"));

    let mut session = RelaySession::with_config(emulator, card, test_config());
    session.initialize(&identity()).await.unwrap();

    let result = session.run(CancellationToken::new()).await;
    assert!(matches!(
        result,
        Err(Error::EmulatorUnavailable { failures: 3 })
    ));
    assert_eq!(session.state(), RelayState::Stopped);
    assert_eq!(session.stats().commands_relayed, 0);
}

#[tokio::test]
async fn shutdown_closes_both_links() {
    let (emulator, emulator_handle) = MockTransport::with_name("emulator");
    let (card, card_handle) = MockTransport::with_name("card");

    let session = RelaySession::with_config(emulator, card, test_config());
    session.shutdown().await;

    assert!(emulator_handle.is_closed());
    assert!(card_handle.is_closed());
}
