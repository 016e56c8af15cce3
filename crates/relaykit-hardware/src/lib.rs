//! Reader transport abstraction for the relaykit APDU relay.
//!
//! This crate defines the boundary between the relay engine and physical
//! smart-card readers. The engine sees a reader as a [`Transport`]: a
//! point-to-point request/response channel carrying opaque bytes with a
//! trailing status word. Concrete links (the PC/SC backend, the scripted
//! mock) live below that boundary.
//!
//! # Design
//!
//! - **Async-first**: `Transport` uses native `async fn` methods (Edition
//!   2024 RPITIT); consumers use generic type parameters, not trait
//!   objects.
//! - **One operation in flight**: reader hardware serializes commands, so
//!   `transmit` takes `&mut self` and the owner holds the transport
//!   exclusively.
//! - **Typed failures**: every operation returns
//!   [`Result`][error::Result] with a [`TransportError`] describing the
//!   fault.
//!
//! # Mock transport
//!
//! [`mock::MockTransport`] is a scripted link for tests and development:
//!
//! ```
//! use relaykit_core::StatusWord;
//! use relaykit_hardware::mock::MockTransport;
//! use relaykit_hardware::Transport;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> relaykit_hardware::error::Result<()> {
//! let (mut link, handle) = MockTransport::new();
//! handle.queue_response(&[0x04, 0x01, 0x02, 0x03], StatusWord::SUCCESS);
//!
//! let uid = link.transmit(&[0xFF, 0xCA, 0x00, 0x00, 0x00]).await?;
//! assert!(uid.is_success());
//! # Ok(())
//! # }
//! ```
//!
//! # PC/SC backend
//!
//! Real readers are reached through the platform PC/SC service. The
//! backend is feature-gated (`pcsc`) so that the workspace builds without
//! the system library present.

pub mod acr122;
pub mod error;
pub mod mock;
pub mod traits;
pub mod types;

#[cfg(feature = "pcsc")]
pub mod pcsc;

// Re-export commonly used types for convenience
pub use error::{Result, TransportError};
pub use traits::{CardResponse, Transport};
pub use types::{LedColor, ReaderInfo};

#[cfg(feature = "pcsc")]
pub use pcsc::{PcscContext, PcscTransport};
