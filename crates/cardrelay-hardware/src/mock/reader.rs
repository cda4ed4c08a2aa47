//! Mock card reader for testing and development.
//!
//! Feeds key events through an internal channel so tests can script swipes
//! without a physical reader.

use crate::{
    HardwareError, Result,
    traits::InputDevice,
    types::{DeviceInfo, KeyEvent, KeySymbol},
};
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Key events a reader emits for one swipe of `card`.
///
/// Each digit is a key-down/key-up pair, followed by Enter down/up.
/// Non-digit characters in `card` are skipped.
///
/// # Examples
///
/// ```
/// use cardrelay_hardware::mock::swipe_events;
///
/// let events = swipe_events("12");
/// assert_eq!(events.len(), 6);
/// ```
pub fn swipe_events(card: &str) -> Vec<KeyEvent> {
    card.chars()
        .filter_map(|c| c.to_digit(10))
        .map(|d| KeySymbol::Digit(d as u8))
        .chain(std::iter::once(KeySymbol::ENTER))
        .flat_map(|symbol| [KeyEvent::down(symbol), KeyEvent::up(symbol)])
        .collect()
}

/// Mock reader driven by a [`MockReaderHandle`].
///
/// # Examples
///
/// ```
/// use cardrelay_hardware::mock::MockReader;
/// use cardrelay_hardware::traits::InputDevice;
///
/// #[tokio::main]
/// async fn main() -> cardrelay_hardware::Result<()> {
///     let (mut reader, handle) = MockReader::new("/dev/input/mock0");
///
///     handle.swipe("4711").await?;
///
///     let events = reader.read_events().await?;
///     assert_eq!(events.len(), 10);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockReader {
    info: DeviceInfo,
    events_rx: mpsc::Receiver<Vec<KeyEvent>>,
}

impl MockReader {
    /// Create a mock reader at `path` with the default name.
    pub fn new(path: impl Into<PathBuf>) -> (Self, MockReaderHandle) {
        Self::with_name("Mock Card Reader", path)
    }

    /// Create a mock reader with a custom name.
    pub fn with_name(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> (Self, MockReaderHandle) {
        let (events_tx, events_rx) = mpsc::channel(64);
        let info = DeviceInfo::new(name, path);

        let handle = MockReaderHandle {
            events_tx,
            path: info.path.clone(),
        };

        (Self { info, events_rx }, handle)
    }
}

impl InputDevice for MockReader {
    async fn read_events(&mut self) -> Result<Vec<KeyEvent>> {
        loop {
            match self.events_rx.recv().await {
                Some(batch) if batch.is_empty() => continue,
                Some(batch) => return Ok(batch),
                None => {
                    return Err(HardwareError::disconnected(
                        self.info.path.display().to_string(),
                    ));
                }
            }
        }
    }

    fn info(&self) -> &DeviceInfo {
        &self.info
    }
}

/// Handle for scripting a [`MockReader`].
///
/// Dropping every handle disconnects the reader.
#[derive(Debug, Clone)]
pub struct MockReaderHandle {
    events_tx: mpsc::Sender<Vec<KeyEvent>>,
    path: PathBuf,
}

impl MockReaderHandle {
    /// Deliver one batch, as if the reader became readable once.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped.
    pub async fn send_batch(&self, events: Vec<KeyEvent>) -> Result<()> {
        self.events_tx
            .send(events)
            .await
            .map_err(|_| HardwareError::disconnected(self.path.display().to_string()))
    }

    /// Deliver a single key event.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped.
    pub async fn send_event(&self, event: KeyEvent) -> Result<()> {
        self.send_batch(vec![event]).await
    }

    /// Deliver a whole swipe of `card` as one batch.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped.
    pub async fn swipe(&self, card: &str) -> Result<()> {
        self.send_batch(swipe_events(card)).await
    }

    /// Device node of the reader this handle drives.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KeyState;

    #[test]
    fn test_swipe_events_shape() {
        let events = swipe_events("123");
        assert_eq!(events.len(), 8);
        assert_eq!(events[0], KeyEvent::down(KeySymbol::Digit(1)));
        assert_eq!(events[1], KeyEvent::up(KeySymbol::Digit(1)));
        assert_eq!(events[6], KeyEvent::down(KeySymbol::ENTER));
        assert_eq!(events[7].state, KeyState::Up);
    }

    #[test]
    fn test_swipe_events_empty_card() {
        let events = swipe_events("");
        assert_eq!(
            events,
            vec![KeyEvent::down(KeySymbol::ENTER), KeyEvent::up(KeySymbol::ENTER)]
        );
    }

    #[tokio::test]
    async fn test_mock_reader_batches() {
        let (mut reader, handle) = MockReader::new("/dev/input/mock0");

        handle.swipe("9").await.unwrap();
        handle.send_event(KeyEvent::down(KeySymbol::Digit(5))).await.unwrap();

        assert_eq!(reader.read_events().await.unwrap().len(), 4);
        assert_eq!(
            reader.read_events().await.unwrap(),
            vec![KeyEvent::down(KeySymbol::Digit(5))]
        );
    }

    #[tokio::test]
    async fn test_mock_reader_skips_empty_batches() {
        let (mut reader, handle) = MockReader::new("/dev/input/mock0");

        handle.send_batch(Vec::new()).await.unwrap();
        handle.send_event(KeyEvent::down(KeySymbol::ENTER)).await.unwrap();

        let events = reader.read_events().await.unwrap();
        assert_eq!(events, vec![KeyEvent::down(KeySymbol::ENTER)]);
    }

    #[tokio::test]
    async fn test_mock_reader_info() {
        let (reader, handle) = MockReader::with_name("Front Reader", "/dev/input/mock3");

        assert_eq!(reader.info().name, "Front Reader");
        assert_eq!(reader.path(), std::path::Path::new("/dev/input/mock3"));
        assert_eq!(handle.path(), reader.path());
    }

    #[tokio::test]
    async fn test_mock_reader_disconnect() {
        let (mut reader, handle) = MockReader::new("/dev/input/mock0");
        drop(handle);

        let result = reader.read_events().await;
        assert!(matches!(result, Err(HardwareError::Disconnected { .. })));
    }

    #[tokio::test]
    async fn test_handle_after_reader_dropped() {
        let (reader, handle) = MockReader::new("/dev/input/mock0");
        drop(reader);

        assert!(handle.swipe("1").await.is_err());
    }
}
