use crate::{
    Result,
    constants::{
        DEFAULT_TARGET_MODE, FALLBACK_HISTORICAL_BYTES, FELICA_PARAMS_LEN, MAX_UID_LEN,
        MIN_UID_LEN, NFCID2_LEN, NFCID3_LEN, SW_SUCCESS, SW_TECHNICAL_PROBLEM, SYSTEM_CODE_LEN,
    },
    error::Error,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Two-byte status word trailing every card or reader response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusWord([u8; 2]);

impl StatusWord {
    /// Successful completion (`90 00`).
    pub const SUCCESS: StatusWord = StatusWord(SW_SUCCESS);

    /// Synthetic "technical problem" (`6F 00`), reserved for responses the
    /// relay fabricates when the genuine card is unreachable.
    pub const TECHNICAL_PROBLEM: StatusWord = StatusWord(SW_TECHNICAL_PROBLEM);

    #[must_use]
    pub fn new(sw1: u8, sw2: u8) -> Self {
        StatusWord([sw1, sw2])
    }

    /// Split a raw response into its body and trailing status word.
    ///
    /// Returns `None` if the response is shorter than two bytes.
    #[must_use]
    pub fn from_trailing(raw: &[u8]) -> Option<(&[u8], StatusWord)> {
        if raw.len() < 2 {
            return None;
        }
        let (body, sw) = raw.split_at(raw.len() - 2);
        Some((body, StatusWord([sw[0], sw[1]])))
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.0 == SW_SUCCESS
    }

    #[must_use]
    pub fn as_bytes(&self) -> [u8; 2] {
        self.0
    }

    #[must_use]
    pub fn to_u16(&self) -> u16 {
        u16::from_be_bytes(self.0)
    }
}

impl fmt::Display for StatusWord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:02X}{:02X}", self.0[0], self.0[1])
    }
}

impl From<[u8; 2]> for StatusWord {
    fn from(bytes: [u8; 2]) -> Self {
        StatusWord(bytes)
    }
}

/// Anti-collision identity captured from a physical card.
///
/// Produced once per relay session and consumed by the init-as-target
/// command builder; not modified afterwards. An empty `historical_bytes`
/// means the card did not report any, in which case the builder substitutes
/// the documented fallback block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardIdentity {
    /// ATQA / SENS_RES as reported or defaulted.
    pub atqa: [u8; 2],

    /// Card UID (4 to 10 bytes).
    pub uid: Vec<u8>,

    /// SAK / SEL_RES as reported or defaulted.
    pub sak: u8,

    /// ATS historical bytes; empty when the card reported none.
    pub historical_bytes: Vec<u8>,

    /// When this identity was captured.
    pub captured_at: DateTime<Utc>,
}

impl CardIdentity {
    /// Create an identity with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidIdentity` if the UID length is outside the
    /// 4..=10 byte range.
    pub fn new(atqa: [u8; 2], uid: Vec<u8>, sak: u8) -> Result<Self> {
        let len = uid.len();
        if !(MIN_UID_LEN..=MAX_UID_LEN).contains(&len) {
            return Err(Error::InvalidIdentity(format!(
                "UID must be {MIN_UID_LEN}-{MAX_UID_LEN} bytes, got {len}"
            )));
        }

        Ok(CardIdentity {
            atqa,
            uid,
            sak,
            historical_bytes: Vec::new(),
            captured_at: Utc::now(),
        })
    }

    /// Attach the historical bytes reported by the card.
    #[must_use]
    pub fn with_historical_bytes(mut self, historical_bytes: Vec<u8>) -> Self {
        self.historical_bytes = historical_bytes;
        self
    }

    /// UID as an uppercase hex string, for logs.
    #[must_use]
    pub fn uid_hex(&self) -> String {
        self.uid.iter().map(|b| format!("{b:02X}")).collect()
    }

    /// Whether the card reported ATS historical bytes.
    #[must_use]
    pub fn has_historical_bytes(&self) -> bool {
        !self.historical_bytes.is_empty()
    }
}

impl fmt::Display for CardIdentity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "uid={} atqa={:02X}{:02X} sak={:02X}",
            self.uid_hex(),
            self.atqa[0],
            self.atqa[1],
            self.sak
        )
    }
}

/// Fixed protocol fields of the init-as-target command that are not taken
/// from the captured card.
///
/// The defaults emulate a plain ISO 14443-A card: FeliCa and NFCID blocks
/// zero-filled, no general bytes, and the documented fallback historical
/// bytes for cards that reported none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmulationDefaults {
    /// Target mode byte.
    pub mode: u8,

    /// FeliCa parameter block, zero-filled when not emulating FeliCa.
    pub felica_params: [u8; FELICA_PARAMS_LEN],

    /// NFCID2 block.
    pub nfcid2: [u8; NFCID2_LEN],

    /// FeliCa system code.
    pub system_code: [u8; SYSTEM_CODE_LEN],

    /// NFCID3 block.
    pub nfcid3: [u8; NFCID3_LEN],

    /// General bytes advertised during target activation.
    pub general_bytes: Vec<u8>,

    /// Historical bytes advertised when the identity carries none.
    pub fallback_historical: Vec<u8>,
}

impl Default for EmulationDefaults {
    fn default() -> Self {
        EmulationDefaults {
            mode: DEFAULT_TARGET_MODE,
            felica_params: [0; FELICA_PARAMS_LEN],
            nfcid2: [0; NFCID2_LEN],
            system_code: [0; SYSTEM_CODE_LEN],
            nfcid3: [0; NFCID3_LEN],
            general_bytes: Vec::new(),
            fallback_historical: FALLBACK_HISTORICAL_BYTES.to_vec(),
        }
    }
}
