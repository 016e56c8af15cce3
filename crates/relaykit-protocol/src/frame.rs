//! Pass-through frame codec.
//!
//! A [`PassThroughFrame`] is the wire form of a [`ControllerCommand`]
//! tunneled over a reader's direct-transmit channel:
//!
//! ```text
//! FF 00 00 00 <len> <opcode> <parameters>
//! ^^^^^^^^^^^  ^    ^^^^^^^^^^^^^^^^^^^^^
//! envelope     |    payload (len bytes)
//!              single length byte
//! ```
//!
//! The length byte must equal the payload length exactly; a disagreement is
//! a protocol error, and payloads beyond 255 bytes cannot be represented at
//! all.
//!
//! # Round trip
//!
//! ```
//! use relaykit_protocol::{ControllerCommand, Opcode, PassThroughFrame};
//!
//! let cmd = ControllerCommand::new(Opcode::GetData, vec![]);
//! let frame = PassThroughFrame::wrap(&cmd).unwrap();
//! assert_eq!(frame.as_bytes(), &[0xFF, 0x00, 0x00, 0x00, 0x02, 0xD4, 0x86]);
//! assert_eq!(PassThroughFrame::unwrap(frame.as_bytes()).unwrap(), cmd);
//! ```

use crate::command::ControllerCommand;
use bytes::{BufMut, Bytes, BytesMut};
use relaykit_core::{
    Error, Result,
    constants::{
        ENVELOPE_PREFIX_LEN, MAX_PASS_THROUGH_PAYLOAD, MIN_FRAME_LEN, PASS_THROUGH_HEADER,
        RESPONSE_GET_DATA, TARGET_DATA_HEADER_LEN,
    },
};
use std::fmt;

/// A controller command wrapped in the reader's direct-transmit envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassThroughFrame {
    /// Complete frame bytes including the envelope.
    data: Bytes,
}

impl PassThroughFrame {
    /// Wrap a controller command for transmission.
    ///
    /// Deterministic: the length byte is computed from the payload size.
    ///
    /// # Errors
    /// Returns `Error::PayloadTooLarge` when opcode plus parameters exceed
    /// the one-byte length capacity of 255.
    pub fn wrap(cmd: &ControllerCommand) -> Result<Self> {
        let payload_len = cmd.wire_len();
        if payload_len > MAX_PASS_THROUGH_PAYLOAD {
            return Err(Error::PayloadTooLarge {
                length: payload_len,
                max: MAX_PASS_THROUGH_PAYLOAD,
            });
        }

        let mut buf = BytesMut::with_capacity(ENVELOPE_PREFIX_LEN + payload_len);
        buf.put_slice(&PASS_THROUGH_HEADER);
        buf.put_u8(payload_len as u8);
        buf.put_slice(&cmd.opcode);
        buf.put_slice(&cmd.parameters);

        Ok(PassThroughFrame { data: buf.freeze() })
    }

    /// Strip the envelope from a raw frame and recover the command.
    ///
    /// # Errors
    /// - `Error::TruncatedFrame` if `raw` is shorter than envelope + opcode.
    /// - `Error::InvalidEnvelope` if the header bytes differ.
    /// - `Error::LengthMismatch` if the length byte disagrees with the
    ///   payload actually present.
    pub fn unwrap(raw: &[u8]) -> Result<ControllerCommand> {
        if raw.len() < MIN_FRAME_LEN {
            return Err(Error::TruncatedFrame {
                length: raw.len(),
                min: MIN_FRAME_LEN,
            });
        }

        if raw[..PASS_THROUGH_HEADER.len()] != PASS_THROUGH_HEADER {
            return Err(Error::InvalidEnvelope);
        }

        let declared = raw[PASS_THROUGH_HEADER.len()] as usize;
        let payload = &raw[ENVELOPE_PREFIX_LEN..];
        if declared != payload.len() {
            return Err(Error::LengthMismatch {
                declared,
                actual: payload.len(),
            });
        }

        Ok(ControllerCommand::from_parts(
            [payload[0], payload[1]],
            payload[2..].to_vec(),
        ))
    }

    /// Complete frame bytes, envelope included.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Tunneled payload (opcode plus parameters), envelope excluded.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.data[ENVELOPE_PREFIX_LEN..]
    }

    /// Frame size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Display for PassThroughFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex: String = self
            .data
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join(" ");
        write!(f, "Frame[{} bytes: {}]", self.data.len(), hex)
    }
}

/// Strip the controller's own response header from fetched target data.
///
/// The controller frames a get-data reply as `D5 87 <status> <data...>`;
/// the three-byte prefix must be removed before the data can be forwarded
/// to the card. Input without that prefix is returned unchanged.
///
/// Known limitation: an APDU that coincidentally begins with `D5 87` is
/// indistinguishable from a framed reply and loses its first three bytes.
/// The wire format carries no discriminator, so this cannot be detected
/// here.
#[must_use]
pub fn strip_target_data_header(payload: &[u8]) -> &[u8] {
    if payload.len() >= TARGET_DATA_HEADER_LEN && payload[..2] == RESPONSE_GET_DATA {
        &payload[TARGET_DATA_HEADER_LEN..]
    } else {
        payload
    }
}
