//! Escape commands for ACR122-family readers.
//!
//! These are reader control commands, not card APDUs: they configure the
//! reader itself (polling behavior, LED, firmware query) and travel over the
//! same transmit channel as everything else. Pure byte builders; the
//! sequencing lives with the session setup.

use crate::types::LedColor;
use relaykit_core::constants::{
    ACR122_DISABLE_AUTO_POLL, ACR122_GET_FIRMWARE, ACR122_LED_COMMAND, ACR122_LED_STATE_INDEX,
};

/// Command disabling the reader's automatic target polling.
///
/// Required on the emulator side: with auto-polling active the reader owns
/// the controller and pass-through commands interleave with its own.
#[must_use]
pub fn disable_auto_poll_command() -> Vec<u8> {
    ACR122_DISABLE_AUTO_POLL.to_vec()
}

/// LED control command for the given color.
#[must_use]
pub fn led_command(color: LedColor) -> Vec<u8> {
    let mut cmd = ACR122_LED_COMMAND.to_vec();
    cmd[ACR122_LED_STATE_INDEX] = color.state_byte();
    cmd
}

/// Command querying the reader's own firmware string.
#[must_use]
pub fn reader_firmware_command() -> Vec<u8> {
    ACR122_GET_FIRMWARE.to_vec()
}
