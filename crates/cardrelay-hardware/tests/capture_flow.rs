//! End-to-end capture tests: mock readers through the capture manager onto
//! the scan channel.

use cardrelay_core::{Error, ScanEvent, ScanReceiver, StationId, scan_channel};
use cardrelay_hardware::mock::{MockReader, MockReaderHandle};
use cardrelay_hardware::types::{KeyEvent, KeySymbol};
use cardrelay_hardware::{CaptureManager, HardwareError};
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(2);

async fn next_scan(rx: &mut ScanReceiver) -> ScanEvent {
    rx.recv_timeout(WAIT)
        .await
        .expect("channel closed")
        .expect("timed out waiting for scan")
}

fn digit(d: u8) -> KeyEvent {
    KeyEvent::down(KeySymbol::Digit(d))
}

#[tokio::test]
async fn test_single_reader_swipe() {
    let (tx, mut rx) = scan_channel();
    let (reader, handle) = MockReader::new("/dev/input/mock0");

    let mut manager = CaptureManager::new(StationId::new("front-desk"));
    manager.register(reader);
    assert_eq!(manager.reader_count(), 1);
    let capture = manager.start(tx);

    handle.swipe("123").await.unwrap();
    handle.send_event(KeyEvent::down(KeySymbol::ENTER)).await.unwrap();

    let first = next_scan(&mut rx).await;
    let second = next_scan(&mut rx).await;
    assert_eq!(first.card_number, "123");
    assert_eq!(first.device_id.as_str(), "front-desk");
    assert_eq!(second.card_number, "");

    capture.shutdown().await;
}

#[tokio::test]
async fn test_code_split_across_batches() {
    let (tx, mut rx) = scan_channel();
    let (reader, handle) = MockReader::new("/dev/input/mock0");

    let mut manager = CaptureManager::new(StationId::new("kiosk"));
    manager.register(reader);
    let capture = manager.start(tx);

    handle.send_batch(vec![digit(4), digit(0)]).await.unwrap();
    handle.send_batch(vec![digit(9)]).await.unwrap();
    handle
        .send_batch(vec![
            KeyEvent::up(KeySymbol::Digit(9)),
            KeyEvent::down(KeySymbol::ENTER),
        ])
        .await
        .unwrap();

    assert_eq!(next_scan(&mut rx).await.card_number, "409");
    capture.shutdown().await;
}

#[tokio::test]
async fn test_two_readers_never_mix() {
    let (tx, mut rx) = scan_channel();
    let (reader_a, handle_a) = MockReader::new("/dev/input/mock0");
    let (reader_b, handle_b) = MockReader::new("/dev/input/mock1");

    let mut manager = CaptureManager::new(StationId::new("kiosk"));
    manager.register(reader_a);
    manager.register(reader_b);
    let capture = manager.start(tx);

    // Digits trickle in alternately from both readers.
    for (a, b) in [(1, 9), (2, 8), (3, 7)] {
        handle_a.send_event(digit(a)).await.unwrap();
        handle_b.send_event(digit(b)).await.unwrap();
    }
    handle_a.send_event(KeyEvent::down(KeySymbol::ENTER)).await.unwrap();
    handle_b.send_event(KeyEvent::down(KeySymbol::ENTER)).await.unwrap();

    let mut cards = vec![
        next_scan(&mut rx).await.card_number,
        next_scan(&mut rx).await.card_number,
    ];
    cards.sort();
    assert_eq!(cards, vec!["123".to_string(), "987".to_string()]);

    capture.shutdown().await;
}

#[tokio::test]
async fn test_disconnected_reader_discards_partial_code() {
    let (tx, mut rx) = scan_channel();
    let (reader_a, handle_a) = MockReader::new("/dev/input/mock0");
    let (reader_b, handle_b) = MockReader::new("/dev/input/mock1");

    let mut manager = CaptureManager::new(StationId::new("kiosk"));
    manager.register(reader_a);
    manager.register(reader_b);
    let capture = manager.start(tx);

    handle_a.send_batch(vec![digit(5), digit(5)]).await.unwrap();
    drop(handle_a);

    // The surviving reader keeps working.
    handle_b.swipe("42").await.unwrap();
    assert_eq!(next_scan(&mut rx).await.card_number, "42");
    assert!(rx.is_empty());

    capture.shutdown().await;
}

#[tokio::test]
async fn test_capture_finishes_when_all_readers_gone() {
    let (tx, mut rx) = scan_channel();
    let (reader, handle) = MockReader::new("/dev/input/mock0");

    let mut manager = CaptureManager::new(StationId::new("kiosk"));
    manager.register(reader);
    let mut capture = manager.start(tx);

    handle.swipe("7").await.unwrap();
    drop(handle);

    tokio::time::timeout(WAIT, capture.finished())
        .await
        .expect("capture did not finish")
        .unwrap();

    // Scans completed before the reader vanished were still handed off.
    assert_eq!(next_scan(&mut rx).await.card_number, "7");
    assert!(matches!(
        rx.recv_timeout(WAIT).await,
        Err(Error::ChannelClosed)
    ));

    // Calling again is harmless.
    capture.finished().await.unwrap();
    capture.shutdown().await;
}

#[tokio::test]
async fn test_closed_channel_is_fatal_for_capture() {
    let (tx, rx) = scan_channel();
    drop(rx);

    let (reader, handle) = MockReader::new("/dev/input/mock0");
    let mut manager = CaptureManager::new(StationId::new("kiosk"));
    manager.register(reader);
    let mut capture = manager.start(tx);

    handle.swipe("1").await.unwrap();

    let result = tokio::time::timeout(WAIT, capture.finished())
        .await
        .expect("capture did not stop");
    let err = result.unwrap_err();
    assert!(matches!(err, HardwareError::Handoff(Error::ChannelClosed)));
    assert!(err.is_fatal());

    capture.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_drops_readers() {
    let (tx, _rx) = scan_channel();
    let (reader, handle) = MockReader::new("/dev/input/mock0");

    let mut manager = CaptureManager::new(StationId::new("kiosk"));
    manager.register(reader);
    let capture = manager.start(tx);

    capture.shutdown().await;

    // The reader, and with it the receiving end of the handle, is gone.
    assert!(handle.swipe("1").await.is_err());
}

async fn swipe_all(handle: &MockReaderHandle, cards: &[&str]) {
    for card in cards {
        handle.swipe(card).await.unwrap();
    }
}

#[tokio::test]
async fn test_scans_keep_completion_order() {
    let (tx, mut rx) = scan_channel();
    let (reader, handle) = MockReader::new("/dev/input/mock0");

    let mut manager = CaptureManager::new(StationId::new("kiosk"));
    manager.register(reader);
    let capture = manager.start(tx);

    let cards = ["100", "200", "300", "400", "500"];
    swipe_all(&handle, &cards).await;

    for expected in cards {
        assert_eq!(next_scan(&mut rx).await.card_number, expected);
    }

    capture.shutdown().await;
}
