//! Error taxonomy for the audio engine
//!
//! Every variant is recoverable from the caller's point of view: the playback
//! boundary converts them into a `false` result plus a diagnostics entry.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AudioError {
    /// The host exposes no usable audio API (or no clip codec support)
    #[error("audio not supported: {0}")]
    NotSupported(String),

    /// This unlock attempt could not bring the graph to an audible state
    #[error("audio unlock did not complete (attempt {attempt} of {max_attempts})")]
    UnlockTimeout { attempt: u32, max_attempts: u32 },

    /// The unlock attempt budget is spent until an explicit reset
    #[error("audio unlock gave up after {attempts} attempts")]
    UnlockExhausted { attempts: u32 },

    /// None of the requested notes resolve to a frequency
    #[error("invalid chord input: {0}")]
    InvalidChordInput(String),

    /// The environment refused to start playback
    #[error("playback rejected: {0}")]
    PlaybackRejected(String),

    /// A bounded wait ran out
    #[error("timeout: {operation} took longer than {bound_ms}ms")]
    Timeout { operation: String, bound_ms: u64 },

    /// The rendered clip could not be encoded
    #[error("clip encoding failed: {0}")]
    Encoding(String),

    /// Opaque platform failure
    #[error("host error: {0}")]
    Host(String),
}

impl AudioError {
    pub fn timeout(operation: impl Into<String>, bound: Duration) -> Self {
        AudioError::Timeout {
            operation: operation.into(),
            bound_ms: bound.as_millis() as u64,
        }
    }

    /// Short machine-readable tag used in diagnostics data
    pub fn kind(&self) -> &'static str {
        match self {
            AudioError::NotSupported(_) => "NotSupported",
            AudioError::UnlockTimeout { .. } => "UnlockTimeout",
            AudioError::UnlockExhausted { .. } => "UnlockExhausted",
            AudioError::InvalidChordInput(_) => "InvalidChordInput",
            AudioError::PlaybackRejected(_) => "PlaybackRejected",
            AudioError::Timeout { .. } => "Timeout",
            AudioError::Encoding(_) => "Encoding",
            AudioError::Host(_) => "Host",
        }
    }
}

pub type AudioResult<T> = std::result::Result<T, AudioError>;
