//! Logical controller commands, independent of the transport envelope.
//!
//! The relay drives the NFC controller with a small fixed command set. Each
//! command is a two-byte opcode followed by opaque parameter bytes; the
//! pass-through envelope that carries it over a reader link is handled
//! separately by [`crate::frame`].

use relaykit_core::constants::{
    OPCODE_GET_DATA, OPCODE_GET_FIRMWARE, OPCODE_INIT_AS_TARGET, OPCODE_SET_DATA,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Controller opcodes the relay issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Opcode {
    /// Query the controller firmware version.
    GetFirmwareVersion,

    /// Configure the controller as a passive emulation target.
    InitAsTarget,

    /// Fetch data the terminal sent to the emulated target.
    GetData,

    /// Push response data back to the terminal.
    SetData,
}

impl Opcode {
    /// Wire bytes of this opcode.
    #[must_use]
    pub fn bytes(self) -> [u8; 2] {
        match self {
            Opcode::GetFirmwareVersion => OPCODE_GET_FIRMWARE,
            Opcode::InitAsTarget => OPCODE_INIT_AS_TARGET,
            Opcode::GetData => OPCODE_GET_DATA,
            Opcode::SetData => OPCODE_SET_DATA,
        }
    }

    /// Parse an opcode from its wire bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; 2]) -> Option<Self> {
        match bytes {
            OPCODE_GET_FIRMWARE => Some(Opcode::GetFirmwareVersion),
            OPCODE_INIT_AS_TARGET => Some(Opcode::InitAsTarget),
            OPCODE_GET_DATA => Some(Opcode::GetData),
            OPCODE_SET_DATA => Some(Opcode::SetData),
            _ => None,
        }
    }

    /// Human-readable command name, for logs.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Opcode::GetFirmwareVersion => "get firmware version",
            Opcode::InitAsTarget => "init as target",
            Opcode::GetData => "get pending data",
            Opcode::SetData => "set data",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.bytes();
        write!(f, "{:02X}{:02X} ({})", bytes[0], bytes[1], self.name())
    }
}

/// Read-only opcode-to-name table, built once on first use.
static OPCODE_NAMES: LazyLock<HashMap<[u8; 2], &'static str>> = LazyLock::new(|| {
    let mut table = HashMap::new();
    for opcode in [
        Opcode::GetFirmwareVersion,
        Opcode::InitAsTarget,
        Opcode::GetData,
        Opcode::SetData,
    ] {
        table.insert(opcode.bytes(), opcode.name());
    }
    table
});

/// Look up the display name for raw opcode bytes.
///
/// Returns `None` for opcodes outside the relay's command set.
#[must_use]
pub fn opcode_name(bytes: [u8; 2]) -> Option<&'static str> {
    OPCODE_NAMES.get(&bytes).copied()
}

/// A logical request to the controller: opcode plus opaque parameters.
///
/// The opcode is kept as raw bytes so that frames carrying opcodes outside
/// the known set can still be decoded and logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerCommand {
    /// Two-byte command opcode.
    pub opcode: [u8; 2],

    /// Parameter bytes following the opcode.
    pub parameters: Vec<u8>,
}

impl ControllerCommand {
    /// Create a command for a known opcode.
    #[must_use]
    pub fn new(opcode: Opcode, parameters: Vec<u8>) -> Self {
        ControllerCommand {
            opcode: opcode.bytes(),
            parameters,
        }
    }

    /// Create a command from raw wire parts.
    #[must_use]
    pub fn from_parts(opcode: [u8; 2], parameters: Vec<u8>) -> Self {
        ControllerCommand { opcode, parameters }
    }

    /// Opcode plus parameters as a contiguous byte sequence.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(2 + self.parameters.len());
        bytes.extend_from_slice(&self.opcode);
        bytes.extend_from_slice(&self.parameters);
        bytes
    }

    /// Total wire length of opcode plus parameters.
    #[must_use]
    pub fn wire_len(&self) -> usize {
        2 + self.parameters.len()
    }

    /// The known opcode, if this command uses one.
    #[must_use]
    pub fn known_opcode(&self) -> Option<Opcode> {
        Opcode::from_bytes(self.opcode)
    }

    /// Display name of the opcode, or `"unknown"`.
    #[must_use]
    pub fn name(&self) -> &'static str {
        opcode_name(self.opcode).unwrap_or("unknown")
    }
}

impl fmt::Display for ControllerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X}{:02X} ({}) +{}B",
            self.opcode[0],
            self.opcode[1],
            self.name(),
            self.parameters.len()
        )
    }
}
