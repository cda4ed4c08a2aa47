//! Error types for card reader operations.
//!
//! Covers reader disconnection, discovery, and exclusive-grab failures, plus
//! the fatal case where completed scans can no longer be handed off.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur while capturing from card readers.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Reader is not connected or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// No reader matched during discovery.
    #[error("Device not found: {name}")]
    DeviceNotFound { name: String },

    /// Exclusive capture could not be taken on a reader.
    #[error("Failed to grab {device}: {source}")]
    GrabFailed {
        device: String,
        #[source]
        source: std::io::Error,
    },

    /// Completed scans can no longer be handed to delivery.
    #[error("Scan handoff failed: {0}")]
    Handoff(#[from] cardrelay_core::Error),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with custom message.
    #[error("{0}")]
    Other(String),
}

impl HardwareError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new device-not-found error.
    pub fn device_not_found(name: impl Into<String>) -> Self {
        Self::DeviceNotFound { name: name.into() }
    }

    /// Create a new grab failure.
    pub fn grab_failed(device: impl Into<String>, source: std::io::Error) -> Self {
        Self::GrabFailed {
            device: device.into(),
            source,
        }
    }

    /// Create a generic error with custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Whether this error means scans can no longer be delivered.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Handoff(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnected_error() {
        let error = HardwareError::disconnected("/dev/input/event3");
        assert!(matches!(error, HardwareError::Disconnected { .. }));
        assert_eq!(error.to_string(), "Device disconnected: /dev/input/event3");
        assert!(!error.is_fatal());
    }

    #[test]
    fn test_grab_failed_error() {
        let io = std::io::Error::new(std::io::ErrorKind::ResourceBusy, "busy");
        let error = HardwareError::grab_failed("/dev/input/event5", io);
        assert_eq!(error.to_string(), "Failed to grab /dev/input/event5: busy");
    }

    #[test]
    fn test_handoff_is_fatal() {
        let error = HardwareError::from(cardrelay_core::Error::ChannelClosed);
        assert!(error.is_fatal());
        assert_eq!(error.to_string(), "Scan handoff failed: Scan channel closed");
    }
}
