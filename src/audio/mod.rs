//! Audio codec and native output.
//!
//! This module bridges the speech engine's transport format and playable
//! audio:
//! - Decoding base64 16-bit PCM into per-channel float samples
//! - Encoding decoded samples into a WAV container
//! - A rodio-backed output implementing the playback channel boundary

pub mod buffer;
pub mod decode;
pub mod engine;
pub mod export;

pub use buffer::DecodedAudioBuffer;
pub use decode::{decode_base64, decode_pcm16, AudioDecoder, EnginePayload, Pcm16Decoder};
pub use engine::{AudioEngine, RodioChannel};
pub use export::{encode_wav, AudioContainer, ContainerHeader, WAV_HEADER_LEN};
