//! Mock reader implementation for testing and development.
//!
//! Scripted through a handle so tests can drive swipes without a physical
//! card reader.

pub mod reader;

pub use reader::{MockReader, MockReaderHandle, swipe_events};
