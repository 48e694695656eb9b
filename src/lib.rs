//! vocalize - Audio core of a text-to-speech studio.
//!
//! Turns the speech engine's base64 PCM payloads into playable WAV tracks,
//! keeps a history of renders, and plays a voice track over an optional
//! looping background bed.

pub mod audio;
pub mod config;
pub mod error;
pub mod history;
pub mod media;
pub mod playback;
pub mod render;
pub mod studio;

// Re-export commonly used types
pub use audio::{
    decode_base64, decode_pcm16, encode_wav, AudioContainer, AudioDecoder, AudioEngine,
    ContainerHeader, DecodedAudioBuffer, EnginePayload, Pcm16Decoder, RodioChannel,
};
pub use config::StudioConfig;
pub use error::{DecodeError, EncodeError, Result, StudioError};
pub use history::{RenderHistory, RenderId, RenderSettings, RenderedTrack};
pub use media::{MediaStore, MediaUrl};
pub use playback::{
    BackgroundCatalog, BackgroundStatus, BackgroundTrack, MediaSource, PlaybackChannel,
    PlaybackOrchestrator, SessionReport, SessionToken,
};
pub use render::Renderer;
pub use studio::Studio;
