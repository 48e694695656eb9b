//! WAV container encoding.
//!
//! Turns a decoded buffer into a self-describing 16-bit PCM WAV file held in
//! memory. The same bytes are handed to playback and written out on
//! download.

use super::buffer::DecodedAudioBuffer;
use super::decode::PCM16_SCALE;
use crate::error::EncodeError;
use hound::WavReader;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

/// Header length of the containers this module writes.
pub const WAV_HEADER_LEN: usize = 44;

/// `fmt ` format tag for linear PCM.
pub const FORMAT_PCM: u16 = 1;

/// RIFF size minus the data payload: `"WAVE"`, the fmt chunk and the data
/// chunk header.
const RIFF_FIXED_LEN: u32 = (WAV_HEADER_LEN - 8) as u32;

/// Container bit depth.
pub const BITS_PER_SAMPLE: u16 = 16;

const BYTES_PER_SAMPLE: usize = (BITS_PER_SAMPLE / 8) as usize;

/// Header fields read back from a WAV container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    /// RIFF chunk size (`file length - 8`).
    pub riff_size: u32,
    pub format_tag: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    /// Size of the `data` chunk payload in bytes.
    pub data_size: u32,
    /// Offset of the first PCM byte.
    pub data_offset: usize,
}

impl ContainerHeader {
    /// Walks the RIFF chunks of `bytes` and extracts the format and data
    /// chunk fields.
    ///
    /// Returns `None` if the bytes are not a RIFF/WAVE file or either chunk
    /// is missing.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
            return None;
        }
        let riff_size = read_u32(bytes, 4)?;

        let mut fmt = None;
        let mut pos = 12;
        while pos + 8 <= bytes.len() {
            let id = &bytes[pos..pos + 4];
            let size = read_u32(bytes, pos + 4)? as usize;
            let body = pos + 8;

            if id == b"fmt " {
                fmt = Some((
                    read_u16(bytes, body)?,
                    read_u16(bytes, body + 2)?,
                    read_u32(bytes, body + 4)?,
                    read_u32(bytes, body + 8)?,
                    read_u16(bytes, body + 12)?,
                    read_u16(bytes, body + 14)?,
                ));
            } else if id == b"data" {
                let (format_tag, channels, sample_rate, byte_rate, block_align, bits_per_sample) =
                    fmt?;
                return Some(Self {
                    riff_size,
                    format_tag,
                    channels,
                    sample_rate,
                    byte_rate,
                    block_align,
                    bits_per_sample,
                    data_size: size as u32,
                    data_offset: body,
                });
            }

            // Chunks are word aligned
            pos = body + size + (size & 1);
        }
        None
    }

    /// Checks the header against the bytes that follow it.
    pub fn matches_payload(&self, total_len: usize) -> bool {
        let bytes_per_sample = (self.bits_per_sample / 8) as u32;
        self.block_align > 0
            && self.data_offset + self.data_size as usize == total_len
            && total_len.checked_sub(8) == Some(self.riff_size as usize)
            && self.block_align as u32 == self.channels as u32 * bytes_per_sample
            && self.sample_rate.checked_mul(self.block_align as u32) == Some(self.byte_rate)
            && self.data_size % self.block_align as u32 == 0
    }
}

fn read_u16(bytes: &[u8], at: usize) -> Option<u16> {
    let raw = bytes.get(at..at + 2)?;
    Some(u16::from_le_bytes([raw[0], raw[1]]))
}

fn read_u32(bytes: &[u8], at: usize) -> Option<u32> {
    let raw = bytes.get(at..at + 4)?;
    Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

/// An encoded WAV file.
///
/// Cloning is cheap; the bytes are shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioContainer {
    bytes: Arc<[u8]>,
}

impl AudioContainer {
    /// Wraps existing container bytes, validating the header.
    ///
    /// Returns `None` if the header does not describe the payload exactly.
    pub fn from_bytes(bytes: Vec<u8>) -> Option<Self> {
        let header = ContainerHeader::parse(&bytes)?;
        if !header.matches_payload(bytes.len()) {
            return None;
        }
        Some(Self {
            bytes: bytes.into(),
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Shared handle to the bytes, for playback sources.
    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Parsed header. Always present for containers built by this module.
    pub fn header(&self) -> Option<ContainerHeader> {
        ContainerHeader::parse(&self.bytes)
    }

    /// Raw little-endian PCM following the header.
    pub fn pcm_payload(&self) -> &[u8] {
        match self.header() {
            Some(header) => &self.bytes[header.data_offset..],
            None => &[],
        }
    }

    /// Reads the container back into a decoded buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes cannot be parsed as 16-bit PCM WAV.
    pub fn to_buffer(&self) -> Result<DecodedAudioBuffer, EncodeError> {
        let reader = WavReader::new(Cursor::new(&self.bytes[..]))?;
        let spec = reader.spec();
        let samples = reader
            .into_samples::<i16>()
            .map(|s| s.map(|v| v as f32 / PCM16_SCALE))
            .collect::<Result<Vec<f32>, hound::Error>>()?;
        Ok(DecodedAudioBuffer::from_interleaved(
            &samples,
            spec.sample_rate,
            spec.channels,
        ))
    }

    /// Writes the container to disk (the download path).
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), std::io::Error> {
        fs::write(path, &self.bytes)
    }
}

/// Converts a float sample to signed 16-bit.
///
/// Clamps to [-1.0, 1.0] first; +1.0 saturates at `i16::MAX`.
#[inline]
pub fn quantize(sample: f32) -> i16 {
    let scaled = (sample.clamp(-1.0, 1.0) * PCM16_SCALE).round();
    scaled.clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

/// Encodes a buffer as a 16-bit PCM WAV container.
///
/// Samples are clamped, quantized and re-interleaved in frame order behind
/// the canonical 44-byte header (format tag 1) for every channel count.
///
/// # Errors
///
/// Returns [`EncodeError::TooLarge`] if the payload does not fit the
/// header's 32-bit size fields.
pub fn encode_wav(buffer: &DecodedAudioBuffer) -> Result<AudioContainer, EncodeError> {
    debug_assert!(buffer.is_consistent(), "channel lengths diverged");

    let channels = buffer.channel_count();
    let sample_rate = buffer.sample_rate();
    let data_len = buffer.sample_count() * channels as usize * BYTES_PER_SAMPLE;
    let data_size = u32::try_from(data_len)
        .ok()
        .filter(|size| size.checked_add(RIFF_FIXED_LEN).is_some())
        .ok_or(EncodeError::TooLarge { bytes: data_len })?;

    let block_align = channels as u32 * BYTES_PER_SAMPLE as u32;
    let byte_rate = sample_rate
        .checked_mul(block_align)
        .ok_or(EncodeError::TooLarge { bytes: data_len })?;

    let mut bytes = Vec::with_capacity(WAV_HEADER_LEN + data_len);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(RIFF_FIXED_LEN + data_size).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");
    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&FORMAT_PCM.to_le_bytes());
    bytes.extend_from_slice(&channels.to_le_bytes());
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&byte_rate.to_le_bytes());
    bytes.extend_from_slice(&(block_align as u16).to_le_bytes());
    bytes.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_size.to_le_bytes());
    debug_assert_eq!(bytes.len(), WAV_HEADER_LEN);

    for sample in buffer.interleaved() {
        bytes.extend_from_slice(&quantize(sample).to_le_bytes());
    }

    tracing::debug!(
        frames = buffer.sample_count(),
        channels,
        sample_rate,
        bytes = bytes.len(),
        "Encoded WAV container"
    );

    Ok(AudioContainer {
        bytes: bytes.into(),
    })
}
