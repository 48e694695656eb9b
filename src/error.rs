//! Error types for the studio core.
//!
//! Decode and encode failures belong to the render pipeline; playback
//! failures belong to the orchestrator. A failed background channel is not
//! an error at all, see [`crate::playback::BackgroundStatus`].

use crate::history::RenderId;
use crate::media::MediaUrl;
use thiserror::Error;

/// Errors produced while turning an engine payload into samples.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The engine response carried no audio data.
    #[error("engine returned no audio")]
    EmptyPayload,

    /// The transport text was not valid base64.
    #[error("payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The byte length is not a multiple of the 16-bit sample size.
    #[error("payload length {len} is not aligned to 16-bit samples")]
    Misaligned { len: usize },

    /// The declared stream format cannot describe any audio.
    #[error("invalid stream format: {0}")]
    InvalidFormat(String),

    /// Fewer samples than one frame remained after de-interleaving.
    #[error("payload holds {samples} samples, less than one {channels}-channel frame")]
    NoCompleteFrame { samples: usize, channels: u16 },
}

/// Errors produced while building a WAV container.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Per-channel sample sequences differ in length.
    #[error("channel {channel} has {actual} samples, expected {expected}")]
    InvariantViolation {
        channel: usize,
        expected: usize,
        actual: usize,
    },

    /// The PCM payload does not fit the header's 32-bit size fields.
    #[error("{bytes} bytes of PCM do not fit a WAV container")]
    TooLarge { bytes: usize },

    /// The container could not be read back.
    #[error("container error: {0}")]
    Container(#[from] hound::Error),
}

/// Top-level error for the render and playback API.
#[derive(Debug, Error)]
pub enum StudioError {
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("encode failed: {0}")]
    Encode(#[from] EncodeError),

    /// The host refused to start the voice channel. Retry by playing again.
    #[error("playback was blocked: {0}")]
    PlaybackBlocked(String),

    /// The handle was revoked before playback was requested.
    #[error("media handle {0} has been released")]
    HandleRevoked(MediaUrl),

    #[error("no render with id {0}")]
    UnknownRender(RenderId),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience result alias for studio operations.
pub type Result<T> = std::result::Result<T, StudioError>;
