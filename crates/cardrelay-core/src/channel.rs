//! Scan handoff between capture and delivery.
//!
//! An unbounded FIFO: capture never waits on delivery, and the delivery
//! worker observes scans in exactly the order capture completed them.
//!
//! ```text
//! CaptureStateMachine ──push──► [ scan | scan | scan ] ──recv_timeout──► DeliveryWorker
//! ```
//!
//! The receiver waits with a timeout only to stay live. A timeout is
//! `Ok(None)`; a closed channel is [`Error::ChannelClosed`], which callers
//! treat as fatal.

use crate::{Error, Result, ScanEvent};
use std::time::Duration;
use tokio::sync::mpsc;

/// Create a connected sender/receiver pair.
///
/// # Examples
///
/// ```
/// use cardrelay_core::{ScanEvent, StationId, scan_channel};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> cardrelay_core::Result<()> {
///     let (tx, mut rx) = scan_channel();
///     tx.push(ScanEvent::new("123", StationId::new("lobby")))?;
///
///     let scan = rx.recv_timeout(Duration::from_millis(10)).await?;
///     assert_eq!(scan.unwrap().card_number, "123");
///     Ok(())
/// }
/// ```
pub fn scan_channel() -> (ScanSender, ScanReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ScanSender { tx }, ScanReceiver { rx })
}

/// Producer side, owned by capture. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ScanSender {
    tx: mpsc::UnboundedSender<ScanEvent>,
}

impl ScanSender {
    /// Enqueue a completed scan. Never blocks.
    ///
    /// # Errors
    /// Returns `Error::ChannelClosed` if the receiver is gone.
    pub fn push(&self, scan: ScanEvent) -> Result<()> {
        self.tx.send(scan).map_err(|_| Error::ChannelClosed)
    }

    /// Whether the receiver has been dropped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer side, owned by the delivery worker.
#[derive(Debug)]
pub struct ScanReceiver {
    rx: mpsc::UnboundedReceiver<ScanEvent>,
}

impl ScanReceiver {
    /// Wait up to `timeout` for the next scan.
    ///
    /// Returns `Ok(None)` when the timeout expires with nothing queued.
    ///
    /// # Errors
    /// Returns `Error::ChannelClosed` once every sender is dropped and the
    /// queue is drained.
    pub async fn recv_timeout(&mut self, timeout: Duration) -> Result<Option<ScanEvent>> {
        match tokio::time::timeout(timeout, self.rx.recv()).await {
            Ok(Some(scan)) => Ok(Some(scan)),
            Ok(None) => Err(Error::ChannelClosed),
            Err(_) => Ok(None),
        }
    }

    /// Take a scan if one is already queued.
    ///
    /// # Errors
    /// Returns `Error::ChannelClosed` once every sender is dropped and the
    /// queue is drained.
    pub fn try_recv(&mut self) -> Result<Option<ScanEvent>> {
        match self.rx.try_recv() {
            Ok(scan) => Ok(Some(scan)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => Err(Error::ChannelClosed),
        }
    }

    /// Number of scans waiting.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
