//! Key event types shared by every reader implementation.
//!
//! USB card readers present themselves as keyboards: a swipe arrives as one
//! key press per digit followed by a terminator key (usually Enter). These
//! types carry just enough of the Linux input event to rebuild the code.

use std::path::{Path, PathBuf};

/// Linux key code for `KEY_1`; `KEY_2`..`KEY_9` follow consecutively.
pub const KEY_1: u16 = 2;

/// Linux key code for `KEY_9`.
pub const KEY_9: u16 = 10;

/// Linux key code for `KEY_0`.
pub const KEY_0: u16 = 11;

/// Linux key code for `KEY_ENTER`.
pub const KEY_ENTER: u16 = 28;

/// What a key means to the capture state machine.
///
/// Only the top-row digit keys are digits. Every other key, keypad digits
/// included, terminates the code being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeySymbol {
    /// Top-row digit key (0-9).
    Digit(u8),

    /// Any other key, by Linux key code.
    Other(u16),
}

impl KeySymbol {
    /// The Enter key, the terminator readers normally send.
    pub const ENTER: KeySymbol = KeySymbol::Other(KEY_ENTER);

    /// Classify a Linux key code.
    ///
    /// # Examples
    ///
    /// ```
    /// use cardrelay_hardware::types::{KeySymbol, KEY_0, KEY_ENTER};
    ///
    /// assert_eq!(KeySymbol::from_code(2), KeySymbol::Digit(1));
    /// assert_eq!(KeySymbol::from_code(KEY_0), KeySymbol::Digit(0));
    /// assert_eq!(KeySymbol::from_code(KEY_ENTER), KeySymbol::ENTER);
    /// ```
    #[must_use]
    pub fn from_code(code: u16) -> Self {
        match code {
            KEY_1..=KEY_9 => Self::Digit((code - KEY_1 + 1) as u8),
            KEY_0 => Self::Digit(0),
            other => Self::Other(other),
        }
    }

    /// Linux key code for this symbol.
    #[must_use]
    pub fn code(&self) -> u16 {
        match *self {
            Self::Digit(0) => KEY_0,
            Self::Digit(d) => KEY_1 + u16::from(d) - 1,
            Self::Other(code) => code,
        }
    }

    /// Digit character, if this is a digit key.
    #[must_use]
    pub fn digit_char(&self) -> Option<char> {
        match *self {
            Self::Digit(d) => char::from_digit(u32::from(d), 10),
            Self::Other(_) => None,
        }
    }

    /// Whether this key ends the code being read.
    #[must_use]
    pub fn is_terminator(&self) -> bool {
        matches!(self, Self::Other(_))
    }
}

/// Key transition reported by the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyState {
    Up,
    Down,
    Repeat,
}

impl KeyState {
    /// Map an `EV_KEY` event value (0 up, 1 down, 2 autorepeat).
    #[must_use]
    pub fn from_value(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Up),
            1 => Some(Self::Down),
            2 => Some(Self::Repeat),
            _ => None,
        }
    }
}

/// One key transition from one reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub symbol: KeySymbol,
    pub state: KeyState,
}

impl KeyEvent {
    pub fn new(symbol: KeySymbol, state: KeyState) -> Self {
        Self { symbol, state }
    }

    /// Key-down for `symbol`.
    pub fn down(symbol: KeySymbol) -> Self {
        Self::new(symbol, KeyState::Down)
    }

    /// Key-up for `symbol`.
    pub fn up(symbol: KeySymbol) -> Self {
        Self::new(symbol, KeyState::Up)
    }

    /// Whether this is the key-down transition.
    #[must_use]
    pub fn is_key_down(&self) -> bool {
        self.state == KeyState::Down
    }
}

/// Identity of an enumerated input device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Name reported by the kernel (e.g., "Sycreader USB Reader").
    pub name: String,

    /// Device node (e.g., `/dev/input/event4`).
    pub path: PathBuf,

    /// USB vendor id, when known.
    pub vendor_id: Option<u16>,

    /// USB product id, when known.
    pub product_id: Option<u16>,
}

impl DeviceInfo {
    /// Create a new DeviceInfo with required fields.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            vendor_id: None,
            product_id: None,
        }
    }

    /// Set the USB vendor and product ids.
    pub fn with_ids(mut self, vendor_id: u16, product_id: u16) -> Self {
        self.vendor_id = Some(vendor_id);
        self.product_id = Some(product_id);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
