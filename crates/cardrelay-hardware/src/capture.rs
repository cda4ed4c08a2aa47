//! Per-reader scan assembly.
//!
//! Every reader gets its own digit buffer, keyed by device node. Digits
//! accumulate on key-down; the first non-digit key-down closes the code and
//! produces a [`ScanEvent`] stamped at that moment. Key-up and autorepeat
//! transitions are ignored.
//!
//! ```text
//! /dev/input/event3: 1 2 3 ⏎      ──►  ScanEvent { card_number: "123", .. }
//! /dev/input/event4:   9 8 ⏎      ──►  ScanEvent { card_number: "98", .. }
//! ```
//!
//! Buffers never mix: interleaved digits from two readers end up in two
//! separate scans.

use crate::types::KeyEvent;
use cardrelay_core::{ScanEvent, StationId};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Accumulates digits per reader and emits completed scans.
///
/// # Examples
///
/// ```
/// use cardrelay_core::StationId;
/// use cardrelay_hardware::capture::CaptureStateMachine;
/// use cardrelay_hardware::types::{KeyEvent, KeySymbol};
/// use std::path::Path;
///
/// let mut capture = CaptureStateMachine::new(StationId::new("lobby"));
/// let reader = Path::new("/dev/input/event3");
///
/// for d in [1, 2, 3] {
///     assert!(capture.handle_event(reader, &KeyEvent::down(KeySymbol::Digit(d))).is_none());
/// }
/// let scan = capture.handle_event(reader, &KeyEvent::down(KeySymbol::ENTER)).unwrap();
///
/// assert_eq!(scan.card_number, "123");
/// assert_eq!(capture.pending(reader), None);
/// ```
#[derive(Debug)]
pub struct CaptureStateMachine {
    station: StationId,
    buffers: HashMap<PathBuf, String>,
}

impl CaptureStateMachine {
    /// Create a state machine stamping scans with `station`.
    pub fn new(station: StationId) -> Self {
        Self {
            station,
            buffers: HashMap::new(),
        }
    }

    /// Station id placed in every emitted scan.
    pub fn station(&self) -> &StationId {
        &self.station
    }

    /// Feed one key event from `device`.
    ///
    /// Returns the completed scan when `event` is a terminator key-down.
    /// A terminator with nothing buffered yields a scan with an empty
    /// `card_number`.
    pub fn handle_event(&mut self, device: &Path, event: &KeyEvent) -> Option<ScanEvent> {
        if !event.is_key_down() {
            return None;
        }

        if let Some(digit) = event.symbol.digit_char() {
            let buffer = self.buffers.entry(device.to_path_buf()).or_default();
            buffer.push(digit);
            trace!(device = %device.display(), len = buffer.len(), "Digit buffered");
            return None;
        }

        let card_number = self
            .buffers
            .get_mut(device)
            .map(std::mem::take)
            .unwrap_or_default();

        let scan = ScanEvent::new(card_number, self.station.clone());
        debug!(
            device = %device.display(),
            scan_id = %scan.scan_id,
            card_number = %scan.card_number,
            "Scan completed"
        );
        Some(scan)
    }

    /// Feed a whole batch from one reader, returning every scan it completes
    /// in order.
    pub fn handle_batch(&mut self, device: &Path, events: &[KeyEvent]) -> Vec<ScanEvent> {
        events
            .iter()
            .filter_map(|event| self.handle_event(device, event))
            .collect()
    }

    /// Digits buffered for `device`, or `None` if nothing is pending.
    pub fn pending(&self, device: &Path) -> Option<&str> {
        self.buffers
            .get(device)
            .map(String::as_str)
            .filter(|digits| !digits.is_empty())
    }

    /// Drop whatever `device` had buffered, e.g. after it disconnects.
    ///
    /// Returns the discarded digits, if any.
    pub fn discard(&mut self, device: &Path) -> Option<String> {
        self.buffers
            .remove(device)
            .filter(|digits| !digits.is_empty())
    }

    /// Number of readers seen so far.
    pub fn tracked_devices(&self) -> usize {
        self.buffers.len()
    }
}
