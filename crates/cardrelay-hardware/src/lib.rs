//! Card reader capture for the cardrelay daemon.
//!
//! USB swipe readers behave like keyboards: one key press per digit, then a
//! terminator. This crate turns those key events into [`ScanEvent`]s and
//! pushes them onto the scan channel.
//!
//! # Layers
//!
//! - [`traits::InputDevice`]: anything that yields batches of key events.
//! - [`mock::MockReader`]: scripted reader for tests and development.
//! - `evdev_reader::EvdevReader`: grabbed Linux input device (feature
//!   `hardware-evdev`, Linux only).
//! - [`capture::CaptureStateMachine`]: per-reader digit buffers.
//! - [`manager::CaptureManager`]: one task per reader feeding a single
//!   capture loop.
//!
//! # Examples
//!
//! ```
//! use cardrelay_core::{StationId, scan_channel};
//! use cardrelay_hardware::manager::CaptureManager;
//! use cardrelay_hardware::mock::MockReader;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (scans_tx, mut scans_rx) = scan_channel();
//!     let (reader, handle) = MockReader::new("/dev/input/mock0");
//!
//!     let mut manager = CaptureManager::new(StationId::new("lobby"));
//!     manager.register(reader);
//!     let capture = manager.start(scans_tx);
//!
//!     handle.swipe("0012345678").await?;
//!
//!     let scan = scans_rx.recv_timeout(Duration::from_secs(1)).await?.unwrap();
//!     assert_eq!(scan.card_number, "0012345678");
//!
//!     capture.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! [`ScanEvent`]: cardrelay_core::ScanEvent

pub mod capture;
pub mod devices;
pub mod error;
#[cfg(all(feature = "hardware-evdev", target_os = "linux"))]
pub mod evdev_reader;
pub mod manager;
pub mod mock;
pub mod traits;
pub mod types;

pub use capture::CaptureStateMachine;
pub use devices::AnyInputDevice;
pub use error::{HardwareError, Result};
#[cfg(all(feature = "hardware-evdev", target_os = "linux"))]
pub use evdev_reader::{EvdevReader, list_input_devices};
pub use manager::{CaptureHandle, CaptureManager};
pub use traits::InputDevice;
pub use types::{DeviceInfo, KeyEvent, KeyState, KeySymbol};
