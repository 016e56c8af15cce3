//! Protocol-level constants for the APDU relay.
//!
//! This module centralizes every wire-format value used throughout the
//! relaykit workspace: the reader's pass-through envelope, the NFC
//! controller's command set, status words, the identity APDUs, and the
//! defaults applied when initializing the emulation target. Nothing else in
//! the workspace spells these bytes inline.
//!
//! # Pass-through framing
//!
//! Commands for the controller are tunneled through the reader using a
//! direct-transmit envelope:
//!
//! ```text
//! FF 00 00 00 <len> <payload>
//!                    ^^^^^^^^^ controller opcode + parameters
//! ```
//!
//! `<len>` is a single byte and must equal the payload length exactly, which
//! caps the payload at 255 bytes.
//!
//! # Controller command set
//!
//! Host-to-controller opcodes start with `D4`; the controller answers with
//! the matching `D5`-prefixed opcode one higher. Only the four commands the
//! relay uses are listed here.

// ============================================================================
// Pass-through envelope
// ============================================================================

/// Direct-transmit envelope header prepended to every tunneled command.
pub const PASS_THROUGH_HEADER: [u8; 4] = [0xFF, 0x00, 0x00, 0x00];

/// Maximum tunneled payload length representable by the one-byte length field.
pub const MAX_PASS_THROUGH_PAYLOAD: usize = 255;

/// Length of the envelope prefix (header plus the length byte).
pub const ENVELOPE_PREFIX_LEN: usize = PASS_THROUGH_HEADER.len() + 1;

/// Minimum decodable frame: envelope prefix plus a two-byte opcode.
pub const MIN_FRAME_LEN: usize = ENVELOPE_PREFIX_LEN + OPCODE_LEN;

// ============================================================================
// Controller opcodes
// ============================================================================

/// Controller opcodes are always two bytes on the wire.
pub const OPCODE_LEN: usize = 2;

/// Query the controller's firmware version. Used as a liveness probe while
/// preparing a reader.
pub const OPCODE_GET_FIRMWARE: [u8; 2] = [0xD4, 0x02];

/// Configure the controller as a passive emulation target.
pub const OPCODE_INIT_AS_TARGET: [u8; 2] = [0xD4, 0x8C];

/// Fetch data the external terminal has sent to the emulated target.
pub const OPCODE_GET_DATA: [u8; 2] = [0xD4, 0x86];

/// Push response data back to the external terminal.
pub const OPCODE_SET_DATA: [u8; 2] = [0xD4, 0x8E];

/// First byte of every controller-to-host response.
pub const CONTROLLER_RESPONSE_PREFIX: u8 = 0xD5;

/// Response opcode the controller uses to frame fetched target data.
///
/// A get-data reply arrives as `D5 87 <status> <data...>`; the three-byte
/// header has to be stripped before the data can be forwarded to the card.
pub const RESPONSE_GET_DATA: [u8; 2] = [0xD5, 0x87];

/// Length of the framed get-data response header (opcode plus status byte).
pub const TARGET_DATA_HEADER_LEN: usize = 3;

// ============================================================================
// Status words
// ============================================================================

/// Success status word appended to card and reader responses.
pub const SW_SUCCESS: [u8; 2] = [0x90, 0x00];

/// Synthetic "technical problem" status word.
///
/// Substituted as the entire response when the genuine card cannot be
/// reached, so the terminal sees a card-level failure instead of a dead
/// target.
pub const SW_TECHNICAL_PROBLEM: [u8; 2] = [0x6F, 0x00];

// ============================================================================
// Card identity APDUs
// ============================================================================

/// PC/SC pseudo-APDU asking the reader for the card's UID.
pub const APDU_GET_UID: [u8; 5] = [0xFF, 0xCA, 0x00, 0x00, 0x00];

/// PC/SC pseudo-APDU asking the reader for the card's ATS / historical
/// bytes. Not every card answers this; failure is non-fatal.
pub const APDU_GET_ATS: [u8; 5] = [0xFF, 0xCA, 0x01, 0x00, 0x00];

/// Minimum UID length in bytes (ISO 14443 single size).
pub const MIN_UID_LEN: usize = 4;

/// Maximum UID length in bytes (ISO 14443 triple size).
pub const MAX_UID_LEN: usize = 10;

/// Leading UID bytes dropped when building the target identity. The first
/// byte of a reader-reported UID is a cascade-tag artifact, not part of the
/// identity the terminal selects against.
pub const UID_CASCADE_PREFIX_LEN: usize = 1;

// ============================================================================
// Emulation target defaults
// ============================================================================

/// ATQA (SENS_RES) assigned when the physical card cannot report one over
/// the identity channel.
pub const DEFAULT_ATQA: [u8; 2] = [0x04, 0x00];

/// SAK (SEL_RES) assigned when the physical card cannot report one over the
/// identity channel.
pub const DEFAULT_SAK: u8 = 0x20;

/// Mode byte for the init-as-target command: passive-only, all baud rates.
pub const DEFAULT_TARGET_MODE: u8 = 0x00;

/// FeliCa parameter block length inside the init-as-target command.
pub const FELICA_PARAMS_LEN: usize = 18;

/// NFCID2 block length inside the init-as-target command.
pub const NFCID2_LEN: usize = 10;

/// System code length inside the init-as-target command.
pub const SYSTEM_CODE_LEN: usize = 2;

/// NFCID3 block length inside the init-as-target command.
pub const NFCID3_LEN: usize = 10;

/// Historical bytes advertised when the captured card reported none.
pub const FALLBACK_HISTORICAL_BYTES: [u8; 17] = [
    0x0D, 0x80, 0x77, 0x00, 0x52, 0x46, 0x49, 0x44, 0x49, 0x4F, 0x54, 0x20, 0x41, 0x43, 0x41,
    0x52, 0x44,
];

// ============================================================================
// Reader escape commands (ACR122-family)
// ============================================================================

/// Disable the reader's automatic polling so the controller can be driven
/// manually through the pass-through channel.
pub const ACR122_DISABLE_AUTO_POLL: [u8; 5] = [0xFF, 0x00, 0x51, 0x3F, 0x00];

/// Query the reader's (not the controller's) firmware string.
pub const ACR122_GET_FIRMWARE: [u8; 5] = [0xFF, 0x00, 0x48, 0x00, 0x00];

/// LED control command prefix; the state byte is inserted at
/// [`ACR122_LED_STATE_INDEX`].
pub const ACR122_LED_COMMAND: [u8; 9] = [0xFF, 0x00, 0x40, 0x00, 0x04, 0x00, 0x00, 0x00, 0x00];

/// Offset of the LED state byte within [`ACR122_LED_COMMAND`].
pub const ACR122_LED_STATE_INDEX: usize = 3;

// ============================================================================
// Timing defaults
// ============================================================================

/// Default bound on a single transport exchange (milliseconds).
pub const DEFAULT_TRANSMIT_TIMEOUT_MS: u64 = 1500;

/// Default delay between empty polls of the emulator (milliseconds). Keeps
/// the loop from busy-spinning against the reader hardware.
pub const DEFAULT_POLL_BACKOFF_MS: u64 = 400;

/// Consecutive hard emulator-transport failures tolerated before the
/// session is declared unrecoverable. Timeouts and empty polls do not
/// count.
pub const DEFAULT_EMULATOR_FAILURE_LIMIT: usize = 5;
