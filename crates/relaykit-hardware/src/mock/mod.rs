//! Mock transport implementation for testing and development.
//!
//! This module provides a scripted reader link that can be controlled
//! programmatically without physical hardware.

pub mod transport;

// Re-export commonly used types
pub use transport::{MockTransport, MockTransportHandle};
