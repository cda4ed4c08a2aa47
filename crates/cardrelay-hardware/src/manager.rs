//! Capture manager.
//!
//! Runs one task per card reader and a single capture loop that owns the
//! [`CaptureStateMachine`]. Reader tasks forward whole batches, so every
//! event from one readiness notification is processed before the loop looks
//! at another reader.
//!
//! ```text
//! ┌──────────┐
//! │ Reader A │──batch──►┌─────────────┐            ┌──────────────┐
//! │ Task     │          │             │            │              │
//! └──────────┘          │ Capture     │──push────► │ Scan Channel │──► delivery
//! ┌──────────┐          │ Loop        │            │              │
//! │ Reader B │──batch──►│ (state      │            └──────────────┘
//! │ Task     │          │  machine)   │
//! └──────────┘          └─────────────┘
//! ```
//!
//! A reader that fails is dropped (releasing its grab), its partial code is
//! discarded and capture continues on the others. Failing to hand a scan to
//! the channel ends capture with a fatal error.
//!
//! # Examples
//!
//! ```no_run
//! use cardrelay_core::{StationId, scan_channel};
//! use cardrelay_hardware::manager::CaptureManager;
//! use cardrelay_hardware::mock::MockReader;
//!
//! #[tokio::main]
//! async fn main() -> cardrelay_hardware::Result<()> {
//!     let (scans_tx, _scans_rx) = scan_channel();
//!
//!     let mut manager = CaptureManager::new(StationId::new("lobby"));
//!     let (reader, _handle) = MockReader::new("/dev/input/mock0");
//!     manager.register(reader);
//!
//!     let capture = manager.start(scans_tx);
//!
//!     // ... run until shutdown is requested ...
//!
//!     capture.shutdown().await;
//!     Ok(())
//! }
//! ```

use crate::capture::CaptureStateMachine;
use crate::devices::AnyInputDevice;
use crate::traits::InputDevice;
use crate::types::KeyEvent;
use crate::{HardwareError, Result};
use cardrelay_core::{ScanSender, StationId};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

/// What a reader task reports to the capture loop.
#[derive(Debug)]
enum CaptureInput {
    /// One readiness notification worth of key events.
    Keys {
        device: PathBuf,
        events: Vec<KeyEvent>,
    },

    /// The reader failed and its task has ended.
    Disconnected {
        device: PathBuf,
        error: HardwareError,
    },
}

/// Collects card readers and starts capturing from them.
#[derive(Debug)]
pub struct CaptureManager {
    station: StationId,
    readers: Vec<AnyInputDevice>,
}

impl CaptureManager {
    /// Create a manager whose scans carry `station`.
    pub fn new(station: StationId) -> Self {
        Self {
            station,
            readers: Vec::new(),
        }
    }

    /// Add a reader. Must be called before [`start`](Self::start).
    pub fn register(&mut self, reader: impl Into<AnyInputDevice>) {
        let reader = reader.into();
        debug!(path = %reader.path().display(), name = %reader.info().name, "Registered card reader");
        self.readers.push(reader);
    }

    /// Number of registered readers.
    pub fn reader_count(&self) -> usize {
        self.readers.len()
    }

    /// Spawn the reader tasks and the capture loop.
    ///
    /// Completed scans are pushed to `scans` in completion order.
    pub fn start(self, scans: ScanSender) -> CaptureHandle {
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let mut readers = JoinSet::new();

        let reader_count = self.readers.len();
        for reader in self.readers {
            readers.spawn(reader_task(reader, input_tx.clone()));
        }
        // The loop ends once every reader task has dropped its sender.
        drop(input_tx);

        let machine = CaptureStateMachine::new(self.station);
        let capture = tokio::spawn(capture_loop(input_rx, machine, scans, reader_count));

        info!(readers = reader_count, "Capture started");

        CaptureHandle {
            capture: Some(capture),
            readers,
        }
    }
}

async fn reader_task(mut reader: AnyInputDevice, tx: mpsc::UnboundedSender<CaptureInput>) {
    let device = reader.path().to_path_buf();

    loop {
        match reader.read_events().await {
            Ok(events) => {
                let input = CaptureInput::Keys {
                    device: device.clone(),
                    events,
                };
                if tx.send(input).is_err() {
                    // Capture loop is gone.
                    return;
                }
            }
            Err(error) => {
                let _ = tx.send(CaptureInput::Disconnected { device, error });
                return;
            }
        }
    }
}

async fn capture_loop(
    mut input_rx: mpsc::UnboundedReceiver<CaptureInput>,
    mut machine: CaptureStateMachine,
    scans: ScanSender,
    mut active: usize,
) -> Result<()> {
    while let Some(input) = input_rx.recv().await {
        match input {
            CaptureInput::Keys { device, events } => {
                for scan in machine.handle_batch(&device, &events) {
                    let scan_id = scan.scan_id;
                    scans.push(scan)?;
                    info!(%scan_id, device = %device.display(), "Scan captured");
                }
            }
            CaptureInput::Disconnected { device, error } => {
                active = active.saturating_sub(1);
                let discarded = machine.discard(&device);
                warn!(
                    device = %device.display(),
                    %error,
                    discarded_digits = discarded.map_or(0, |d| d.len()),
                    remaining = active,
                    "Card reader lost"
                );
            }
        }
    }

    info!("All card readers closed, capture finished");
    Ok(())
}

/// Running capture. Dropping the handle leaves the tasks running; call
/// [`shutdown`](Self::shutdown) to stop them.
#[derive(Debug)]
pub struct CaptureHandle {
    capture: Option<JoinHandle<Result<()>>>,
    readers: JoinSet<()>,
}

impl CaptureHandle {
    /// Wait for capture to end on its own.
    ///
    /// Returns `Ok(())` once every reader has gone away. Safe to call again
    /// after it has returned; later calls return `Ok(())` immediately.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::Handoff` if scans could no longer be pushed
    /// to the channel.
    pub async fn finished(&mut self) -> Result<()> {
        let Some(capture) = self.capture.as_mut() else {
            return Ok(());
        };

        let result = capture.await;
        self.capture = None;

        match result {
            Ok(outcome) => outcome,
            Err(e) => Err(HardwareError::other(format!("capture loop failed: {e}"))),
        }
    }

    /// Stop every reader and the capture loop.
    ///
    /// Readers are dropped as their tasks are aborted, which releases their
    /// grabs. Partial codes and anything not yet pushed are discarded.
    pub async fn shutdown(mut self) {
        self.readers.abort_all();

        let mut panicked = 0usize;
        while let Some(result) = self.readers.join_next().await {
            if let Err(e) = result
                && e.is_panic()
            {
                panicked += 1;
            }
        }

        if let Some(capture) = self.capture.take() {
            capture.abort();
            match capture.await {
                Ok(Err(e)) => error!(error = %e, "Capture loop ended with error"),
                Err(e) if e.is_panic() => panicked += 1,
                _ => {}
            }
        }

        if panicked > 0 {
            warn!(panicked, "Capture tasks panicked before shutdown");
        }
        info!("Capture stopped");
    }
}
