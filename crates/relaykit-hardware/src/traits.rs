//! Transport trait definition.
//!
//! This module defines the contract between the relay engine and a physical
//! reader link. Everything above this boundary treats a reader as a
//! request/response channel for opaque bytes; everything below it (PC/SC
//! plumbing, share modes, driver quirks) stays out of the engine.
//!
//! The trait uses native `async fn` methods (Edition 2024 RPITIT), so it is
//! not object-safe; consumers take generic type parameters instead of trait
//! objects.

#![allow(async_fn_in_trait)]

use crate::error::{Result, TransportError};
use relaykit_core::StatusWord;

/// A reader response split into body and trailing status word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardResponse {
    /// Response body, status word excluded.
    pub data: Vec<u8>,

    /// The trailing two-byte status word.
    pub status: StatusWord,
}

impl CardResponse {
    /// Create a response from already-split parts.
    #[must_use]
    pub fn new(data: Vec<u8>, status: StatusWord) -> Self {
        CardResponse { data, status }
    }

    /// Split a raw reader response into body and status word.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::ResponseTooShort` when fewer than two bytes
    /// were received.
    pub fn from_raw(raw: &[u8]) -> Result<Self> {
        let (body, status) = StatusWord::from_trailing(raw)
            .ok_or_else(|| TransportError::response_too_short(raw.len()))?;
        Ok(CardResponse {
            data: body.to_vec(),
            status,
        })
    }

    /// Whether the status word reports success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Re-concatenate body and status word, the form relayed onward.
    #[must_use]
    pub fn into_full_bytes(self) -> Vec<u8> {
        let mut bytes = self.data;
        bytes.extend_from_slice(&self.status.as_bytes());
        bytes
    }
}

/// A point-to-point request/response channel to one physical reader.
///
/// The relay holds exactly one outstanding operation per transport at a
/// time; the underlying reader hardware serializes commands, and
/// interleaving would corrupt framing. The owner is responsible for that
/// exclusivity, which is why `transmit` takes `&mut self`.
///
/// # Examples
///
/// ```no_run
/// use relaykit_hardware::{CardResponse, Transport};
/// use relaykit_hardware::error::Result;
///
/// async fn probe<T: Transport>(link: &mut T) -> Result<CardResponse> {
///     link.transmit(&[0xFF, 0xCA, 0x00, 0x00, 0x00]).await
/// }
/// ```
pub trait Transport: Send {
    /// Send raw bytes to the reader and wait for its response.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The reader is disconnected
    /// - The exchange times out
    /// - The response is too short to carry a status word
    async fn transmit(&mut self, payload: &[u8]) -> Result<CardResponse>;

    /// Name of the reader behind this transport, for log context.
    fn reader_name(&self) -> &str;

    /// Release the underlying reader handle.
    ///
    /// Further `transmit` calls after a close report `Disconnected`.
    async fn close(&mut self) -> Result<()>;
}
