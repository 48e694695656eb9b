//! In-memory decoded audio.
//!
//! A [`DecodedAudioBuffer`] holds one sample sequence per channel. All
//! channels always have the same length; the constructors reject anything
//! else, so the encoder can treat a mismatch as a bug.

use crate::error::EncodeError;

/// Decoded linear samples, one `Vec<f32>` per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudioBuffer {
    /// Per-channel samples in [-1.0, 1.0].
    channels: Vec<Vec<f32>>,
    /// Sample rate in Hz.
    sample_rate: u32,
}

impl DecodedAudioBuffer {
    /// Builds a buffer from per-channel sample sequences.
    ///
    /// # Arguments
    ///
    /// * `channels` - One sample vector per channel (at least one)
    /// * `sample_rate` - Sample rate in Hz
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::InvariantViolation`] if the channels differ in
    /// length.
    ///
    /// # Panics
    ///
    /// Panics if `channels` is empty or holds more than `u16::MAX` channels,
    /// or if `sample_rate` is zero.
    pub fn from_channels(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self, EncodeError> {
        assert!(!channels.is_empty(), "a buffer needs at least one channel");
        assert!(
            channels.len() <= u16::MAX as usize,
            "a buffer holds at most {} channels",
            u16::MAX
        );
        assert!(sample_rate > 0, "sample rate must be positive");

        let expected = channels[0].len();
        if let Some((channel, samples)) = channels
            .iter()
            .enumerate()
            .find(|(_, c)| c.len() != expected)
        {
            return Err(EncodeError::InvariantViolation {
                channel,
                expected,
                actual: samples.len(),
            });
        }

        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Builds a buffer by de-interleaving frame-ordered samples.
    ///
    /// Trailing samples that do not complete a frame are dropped.
    pub fn from_interleaved(samples: &[f32], sample_rate: u32, channel_count: u16) -> Self {
        assert!(channel_count > 0, "channel count must be positive");
        assert!(sample_rate > 0, "sample rate must be positive");

        let stride = channel_count as usize;
        let frames = samples.len() / stride;
        let mut channels: Vec<Vec<f32>> =
            (0..stride).map(|_| Vec::with_capacity(frames)).collect();

        for frame in samples.chunks_exact(stride) {
            for (channel, &sample) in channels.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }

        Self {
            channels,
            sample_rate,
        }
    }

    /// A single-channel buffer.
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        assert!(sample_rate > 0, "sample rate must be positive");
        Self {
            channels: vec![samples],
            sample_rate,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> u16 {
        self.channels.len() as u16
    }

    /// Number of samples per channel (frames).
    pub fn sample_count(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Samples of one channel, or `None` if out of range.
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Duration in seconds (`sample_count / sample_rate`).
    pub fn duration_seconds(&self) -> f64 {
        self.sample_count() as f64 / self.sample_rate as f64
    }

    /// Returns true if every channel has the same length.
    pub fn is_consistent(&self) -> bool {
        let expected = self.sample_count();
        self.channels.iter().all(|c| c.len() == expected)
    }

    /// Iterates samples in frame order (ch0, ch1, ..., ch0, ch1, ...).
    pub fn interleaved(&self) -> impl Iterator<Item = f32> + '_ {
        (0..self.sample_count())
            .flat_map(move |frame| self.channels.iter().map(move |c| c[frame]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_channels_rejects_mismatch() {
        let err = DecodedAudioBuffer::from_channels(vec![vec![0.0; 4], vec![0.0; 3]], 24000)
            .unwrap_err();
        match err {
            EncodeError::InvariantViolation {
                channel,
                expected,
                actual,
            } => {
                assert_eq!(channel, 1);
                assert_eq!(expected, 4);
                assert_eq!(actual, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_from_interleaved_drops_partial_frame() {
        // 5 samples, 2 channels: the last sample has no partner
        let buffer = DecodedAudioBuffer::from_interleaved(&[0.1, 0.2, 0.3, 0.4, 0.5], 16000, 2);
        assert_eq!(buffer.sample_count(), 2);
        assert_eq!(buffer.channel(0).unwrap(), &[0.1, 0.3]);
        assert_eq!(buffer.channel(1).unwrap(), &[0.2, 0.4]);
    }

    #[test]
    #[should_panic(expected = "at most 65535 channels")]
    fn test_from_channels_rejects_too_many_channels() {
        let channels = vec![Vec::new(); u16::MAX as usize + 1];
        let _ = DecodedAudioBuffer::from_channels(channels, 24000);
    }

    #[test]
    fn test_from_interleaved_preallocates_every_channel() {
        let samples = vec![0.0; 3 * 100];
        let buffer = DecodedAudioBuffer::from_interleaved(&samples, 8000, 3);
        assert!(buffer.channels.iter().all(|c| c.capacity() >= 100));
    }

    #[test]
    fn test_interleaved_reverses_deinterleave() {
        let samples = [0.1, -0.1, 0.2, -0.2, 0.3, -0.3];
        let buffer = DecodedAudioBuffer::from_interleaved(&samples, 44100, 2);
        let back: Vec<f32> = buffer.interleaved().collect();
        assert_eq!(back, samples);
    }

    #[test]
    fn test_duration() {
        let buffer = DecodedAudioBuffer::mono(vec![0.0; 12000], 24000);
        assert!((buffer.duration_seconds() - 0.5).abs() < 1e-9);
        assert_eq!(buffer.channel_count(), 1);
        assert!(buffer.is_consistent());
    }
}
