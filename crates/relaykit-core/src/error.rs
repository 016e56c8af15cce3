use crate::types::StatusWord;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Framing errors
    #[error("payload of {length} bytes exceeds the {max}-byte pass-through capacity")]
    PayloadTooLarge { length: usize, max: usize },

    #[error("frame of {length} bytes is shorter than the {min}-byte minimum")]
    TruncatedFrame { length: usize, min: usize },

    #[error("frame length byte declares {declared} bytes but {actual} are present")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("frame does not start with the pass-through envelope header")]
    InvalidEnvelope,

    // Identity errors
    #[error("invalid card identity: {0}")]
    InvalidIdentity(String),

    // Session errors
    #[error("target initialization rejected with status word {status}")]
    InitializationRejected { status: StatusWord },

    #[error("emulator transport unusable after {failures} consecutive failures")]
    EmulatorUnavailable { failures: usize },

    #[error("invalid relay state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // Transport errors, mirrored as text at this layer
    #[error("transport error: {0}")]
    Transport(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
