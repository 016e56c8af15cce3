//! Relay engine: session orchestration for the APDU relay.
//!
//! This crate ties the protocol and transport layers into a running
//! session: capturing the genuine card's identity, preparing both readers,
//! configuring the emulation target, and driving the forwarding loop until
//! it is cancelled or the emulator link dies.

pub mod identity;
pub mod prep;
pub mod session;
pub mod state;

pub use identity::read_card_identity;
pub use prep::prep_reader;
pub use session::{RelayConfig, RelaySession, RelayStats};
pub use state::{RelayState, RelayStateMachine, StateTransition};
