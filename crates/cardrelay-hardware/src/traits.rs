//! Card reader trait definition.
//!
//! A reader is anything that yields batches of key events: a grabbed evdev
//! node in production, a channel-fed mock in tests. The capture manager runs
//! one task per reader and never looks past this trait.
//!
//! The trait uses native `async fn` (Edition 2024), so it is not object-safe.
//! Dynamic dispatch goes through the [`AnyInputDevice`](crate::devices::AnyInputDevice)
//! enum instead of `Box<dyn InputDevice>`.

#![allow(async_fn_in_trait)]

use crate::error::Result;
use crate::types::{DeviceInfo, KeyEvent};
use std::path::Path;

/// Keyboard-style card reader.
///
/// # Examples
///
/// ```no_run
/// use cardrelay_hardware::traits::InputDevice;
/// use cardrelay_hardware::error::Result;
///
/// async fn dump<D: InputDevice>(reader: &mut D) -> Result<()> {
///     loop {
///         let events = reader.read_events().await?;
///         println!("{}: {} key events", reader.path().display(), events.len());
///     }
/// }
/// ```
pub trait InputDevice: Send {
    /// Wait for the reader to become ready and return every key event that
    /// was pending at that point.
    ///
    /// Events come back in the order the reader produced them. A batch is
    /// never empty.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::Disconnected` or `HardwareError::Io` when the
    /// reader goes away; the reader is unusable afterwards.
    async fn read_events(&mut self) -> Result<Vec<KeyEvent>>;

    /// Identity of this reader.
    fn info(&self) -> &DeviceInfo;

    /// Device node, used to keep per-reader capture state apart.
    fn path(&self) -> &Path {
        &self.info().path
    }
}
