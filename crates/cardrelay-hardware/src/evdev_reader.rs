//! Linux evdev card readers.
//!
//! USB swipe readers enumerate as keyboards under `/dev/input/event*`. Each
//! allowed reader is opened and grabbed (`EVIOCGRAB`) so its keystrokes reach
//! only this process and never a console or login prompt. The grab belongs
//! to the open file descriptor: dropping an [`EvdevReader`] closes it and the
//! kernel releases the grab, whether the reader is dropped on shutdown, on
//! task abort, or after an error.

use crate::error::{HardwareError, Result};
use crate::traits::InputDevice;
use crate::types::{DeviceInfo, KeyEvent, KeyState, KeySymbol};
use cardrelay_core::DeviceAllowList;
use evdev::{Device, EventStream, InputEventKind, Synchronization};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// `ENODEV`, returned by reads on an unplugged device.
const ENODEV: i32 = 19;

fn describe(path: &Path, device: &Device) -> DeviceInfo {
    let id = device.input_id();
    DeviceInfo::new(device.name().unwrap_or("unknown"), path)
        .with_ids(id.vendor(), id.product())
}

/// Every input device the kernel exposes, in enumeration order.
///
/// Devices that cannot be opened (usually for lack of permission) are
/// silently missing from the result.
pub fn list_input_devices() -> Vec<DeviceInfo> {
    let mut devices: Vec<DeviceInfo> = evdev::enumerate()
        .map(|(path, device)| describe(&path, &device))
        .collect();
    devices.sort_by(|a, b| a.path.cmp(&b.path));
    devices
}

/// Grabbed evdev reader.
pub struct EvdevReader {
    info: DeviceInfo,
    stream: EventStream,
    pending: Vec<KeyEvent>,
}

impl EvdevReader {
    /// Open and grab the device at `path`.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::Io` if the node cannot be opened and
    /// `HardwareError::GrabFailed` if another process already holds it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let device = Device::open(path)?;
        Self::from_device(path.to_path_buf(), device)
    }

    /// Open and grab every device whose name is on `allow`.
    ///
    /// A matching reader that cannot be grabbed is skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::DeviceNotFound` if no allowed reader could be
    /// opened.
    pub fn open_allowed(allow: &DeviceAllowList) -> Result<Vec<Self>> {
        let mut readers = Vec::new();

        for (path, device) in evdev::enumerate() {
            let name = device.name().unwrap_or_default();
            if !allow.is_allowed(name) {
                debug!(path = %path.display(), name, "Ignoring input device");
                continue;
            }

            match Self::from_device(path.clone(), device) {
                Ok(reader) => readers.push(reader),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping card reader"),
            }
        }

        if readers.is_empty() {
            return Err(HardwareError::device_not_found(format!(
                "no allowed card reader among {} configured name(s)",
                allow.len()
            )));
        }

        readers.sort_by(|a, b| a.info.path.cmp(&b.info.path));
        Ok(readers)
    }

    fn from_device(path: PathBuf, mut device: Device) -> Result<Self> {
        let info = describe(&path, &device);

        device
            .grab()
            .map_err(|e| HardwareError::grab_failed(path.display().to_string(), e))?;
        let stream = device.into_event_stream()?;

        info!(
            path = %info.path.display(),
            name = %info.name,
            vendor = ?info.vendor_id,
            product = ?info.product_id,
            "Grabbed card reader"
        );

        Ok(Self {
            info,
            stream,
            pending: Vec::new(),
        })
    }

    fn map_read_error(&self, e: std::io::Error) -> HardwareError {
        if e.raw_os_error() == Some(ENODEV) {
            HardwareError::disconnected(self.info.path.display().to_string())
        } else {
            HardwareError::Io(e)
        }
    }
}

impl InputDevice for EvdevReader {
    /// Returns the key events of one input report, i.e. everything up to the
    /// next `SYN_REPORT`.
    async fn read_events(&mut self) -> Result<Vec<KeyEvent>> {
        loop {
            let event = match self.stream.next_event().await {
                Ok(event) => event,
                Err(e) => return Err(self.map_read_error(e)),
            };

            match event.kind() {
                InputEventKind::Key(key) => {
                    if let Some(state) = KeyState::from_value(event.value()) {
                        self.pending
                            .push(KeyEvent::new(KeySymbol::from_code(key.code()), state));
                    }
                }
                InputEventKind::Synchronization(sync)
                    if sync == Synchronization::SYN_REPORT && !self.pending.is_empty() =>
                {
                    return Ok(std::mem::take(&mut self.pending));
                }
                _ => {}
            }
        }
    }

    fn info(&self) -> &DeviceInfo {
        &self.info
    }
}

impl std::fmt::Debug for EvdevReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvdevReader")
            .field("info", &self.info)
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl Drop for EvdevReader {
    fn drop(&mut self) {
        debug!(path = %self.info.path.display(), "Releasing card reader grab");
    }
}
