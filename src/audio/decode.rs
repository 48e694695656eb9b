//! Engine payload decoding.
//!
//! The speech engine answers with base64 text wrapping raw 16-bit
//! little-endian PCM. The stream format (rate and channel count) is declared
//! alongside the payload, never inside it.

use super::buffer::DecodedAudioBuffer;
use crate::error::DecodeError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// Sample rate the speech engine renders at unless told otherwise.
pub const ENGINE_SAMPLE_RATE: u32 = 24000;

/// Channel count the speech engine renders unless told otherwise.
pub const ENGINE_CHANNELS: u16 = 1;

/// Normalization divisor for signed 16-bit samples.
pub const PCM16_SCALE: f32 = 32768.0;

/// The part of an engine response the codec consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnginePayload {
    /// Base64-encoded PCM bytes. Empty or missing means the engine failed.
    #[serde(default)]
    pub base64_payload: String,

    /// Declared sample rate; the renderer's default applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,

    /// Declared channel count; the renderer's default applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_count: Option<u16>,
}

impl EnginePayload {
    /// Creates a payload without a declared format.
    pub fn new(base64_payload: impl Into<String>) -> Self {
        Self {
            base64_payload: base64_payload.into(),
            sample_rate: None,
            channel_count: None,
        }
    }

    /// Wraps raw PCM bytes in a payload with an explicit format.
    pub fn from_pcm(bytes: &[u8], sample_rate: u32, channel_count: u16) -> Self {
        Self {
            base64_payload: STANDARD.encode(bytes),
            sample_rate: Some(sample_rate),
            channel_count: Some(channel_count),
        }
    }

    /// Decodes using the engine's 24 kHz mono format where none is declared.
    ///
    /// # Errors
    ///
    /// See [`EnginePayload::decode_with_defaults`].
    pub fn decode_with(&self, decoder: &dyn AudioDecoder) -> Result<DecodedAudioBuffer, DecodeError> {
        self.decode_with_defaults(decoder, ENGINE_SAMPLE_RATE, ENGINE_CHANNELS)
    }

    /// Decodes the transport text and hands the bytes to `decoder`.
    ///
    /// # Arguments
    ///
    /// * `decoder` - The decoding capability
    /// * `sample_rate` - Rate to assume if the payload declares none
    /// * `channel_count` - Channel count to assume if the payload declares none
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::EmptyPayload`] if there is no audio, or any
    /// error from base64 decoding or from the decoder itself.
    pub fn decode_with_defaults(
        &self,
        decoder: &dyn AudioDecoder,
        sample_rate: u32,
        channel_count: u16,
    ) -> Result<DecodedAudioBuffer, DecodeError> {
        let bytes = decode_base64(&self.base64_payload)?;
        decoder.decode(
            &bytes,
            self.sample_rate.unwrap_or(sample_rate),
            self.channel_count.unwrap_or(channel_count),
        )
    }
}

/// The host's audio decoding capability.
///
/// Injected into the render pipeline so tests can substitute a synthetic
/// decoder for the PCM one.
pub trait AudioDecoder {
    /// Decodes raw bytes in the declared stream format.
    fn decode(
        &self,
        bytes: &[u8],
        sample_rate: u32,
        channel_count: u16,
    ) -> Result<DecodedAudioBuffer, DecodeError>;
}

/// Decoder for raw signed 16-bit little-endian PCM.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pcm16Decoder;

impl AudioDecoder for Pcm16Decoder {
    fn decode(
        &self,
        bytes: &[u8],
        sample_rate: u32,
        channel_count: u16,
    ) -> Result<DecodedAudioBuffer, DecodeError> {
        decode_pcm16(bytes, sample_rate, channel_count)
    }
}

/// Decodes base64 transport text into raw bytes.
///
/// Surrounding whitespace is ignored; blank text counts as no audio.
pub fn decode_base64(text: &str) -> Result<Vec<u8>, DecodeError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(DecodeError::EmptyPayload);
    }
    let bytes = STANDARD.decode(text)?;
    if bytes.is_empty() {
        return Err(DecodeError::EmptyPayload);
    }
    Ok(bytes)
}

/// Decodes interleaved 16-bit little-endian PCM into per-channel samples.
///
/// Each sample is divided by 32768, so values land in [-1.0, 1.0).
/// Samples that do not complete a frame at the end are dropped.
///
/// # Arguments
///
/// * `bytes` - Raw PCM bytes, length a multiple of 2
/// * `sample_rate` - Declared sample rate in Hz
/// * `channel_count` - Declared number of interleaved channels
///
/// # Errors
///
/// - `EmptyPayload` if `bytes` is empty
/// - `Misaligned` if the length is odd
/// - `InvalidFormat` if the rate or channel count is zero
/// - `NoCompleteFrame` if not even one frame is present
pub fn decode_pcm16(
    bytes: &[u8],
    sample_rate: u32,
    channel_count: u16,
) -> Result<DecodedAudioBuffer, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::EmptyPayload);
    }
    if bytes.len() % 2 != 0 {
        return Err(DecodeError::Misaligned { len: bytes.len() });
    }
    if sample_rate == 0 {
        return Err(DecodeError::InvalidFormat("sample rate is zero".into()));
    }
    if channel_count == 0 {
        return Err(DecodeError::InvalidFormat("channel count is zero".into()));
    }

    let total = bytes.len() / 2;
    if total < channel_count as usize {
        return Err(DecodeError::NoCompleteFrame {
            samples: total,
            channels: channel_count,
        });
    }

    let samples: Vec<f32> = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / PCM16_SCALE)
        .collect();

    let dropped = total % channel_count as usize;
    if dropped > 0 {
        tracing::debug!(
            dropped,
            channel_count,
            "Dropping trailing samples that do not complete a frame"
        );
    }

    Ok(DecodedAudioBuffer::from_interleaved(
        &samples,
        sample_rate,
        channel_count,
    ))
}
