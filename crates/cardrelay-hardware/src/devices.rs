//! Enum wrapper for card reader dispatch.
//!
//! Native `async fn` in traits is not object-safe, so readers cannot be held
//! as `Box<dyn InputDevice>`. [`AnyInputDevice`] gives the capture manager
//! one concrete type to spawn tasks over, with the evdev variant compiled in
//! only on Linux with the `hardware-evdev` feature.
//!
//! # Examples
//!
//! ```
//! use cardrelay_hardware::devices::AnyInputDevice;
//! use cardrelay_hardware::mock::MockReader;
//! use cardrelay_hardware::traits::InputDevice;
//!
//! let (reader, _handle) = MockReader::new("/dev/input/mock0");
//! let any_reader = AnyInputDevice::Mock(reader);
//! assert_eq!(any_reader.info().name, "Mock Card Reader");
//! ```

use crate::mock::MockReader;
use crate::traits::InputDevice;
use crate::types::{DeviceInfo, KeyEvent};
use crate::Result;

#[cfg(all(feature = "hardware-evdev", target_os = "linux"))]
use crate::evdev_reader::EvdevReader;

/// Any supported card reader.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyInputDevice {
    /// Channel-fed reader for development and testing.
    Mock(MockReader),

    /// Grabbed Linux input device.
    #[cfg(all(feature = "hardware-evdev", target_os = "linux"))]
    Evdev(EvdevReader),
}

impl InputDevice for AnyInputDevice {
    async fn read_events(&mut self) -> Result<Vec<KeyEvent>> {
        match self {
            Self::Mock(device) => device.read_events().await,
            #[cfg(all(feature = "hardware-evdev", target_os = "linux"))]
            Self::Evdev(device) => device.read_events().await,
        }
    }

    fn info(&self) -> &DeviceInfo {
        match self {
            Self::Mock(device) => device.info(),
            #[cfg(all(feature = "hardware-evdev", target_os = "linux"))]
            Self::Evdev(device) => device.info(),
        }
    }
}

impl From<MockReader> for AnyInputDevice {
    fn from(reader: MockReader) -> Self {
        Self::Mock(reader)
    }
}

#[cfg(all(feature = "hardware-evdev", target_os = "linux"))]
impl From<EvdevReader> for AnyInputDevice {
    fn from(reader: EvdevReader) -> Self {
        Self::Evdev(reader)
    }
}
