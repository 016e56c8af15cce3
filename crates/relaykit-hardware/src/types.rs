//! Common types shared across transport implementations.

use serde::{Deserialize, Serialize};

/// LED colors for visual feedback on ACR122-family readers.
///
/// The reader carries a bicolor (red/green) LED; orange is both elements
/// lit at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedColor {
    /// LED off.
    Off,

    /// Red LED.
    Red,

    /// Green LED.
    Green,

    /// Red and green together.
    Orange,
}

impl LedColor {
    /// LED state byte for the reader's LED control escape command.
    ///
    /// Bits 0..=1 select the final red/green element states; bits 2..=3
    /// mark both elements for update.
    #[must_use]
    pub fn state_byte(self) -> u8 {
        match self {
            LedColor::Off => 0x0C,
            LedColor::Red => 0x0D,
            LedColor::Green => 0x0E,
            LedColor::Orange => 0x0F,
        }
    }
}

/// Reader metadata collected while preparing a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderInfo {
    /// Reader name as reported by the PC/SC service.
    pub name: String,

    /// Controller firmware version, when the probe could parse one.
    pub firmware_version: Option<String>,
}

impl ReaderInfo {
    /// Create reader info with just a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            firmware_version: None,
        }
    }

    /// Attach the firmware version.
    pub fn with_firmware_version(mut self, firmware_version: impl Into<String>) -> Self {
        self.firmware_version = Some(firmware_version.into());
        self
    }
}
