//! Render pipeline.
//!
//! payload -> samples -> WAV container -> registered handle. Nothing is
//! registered unless every step succeeds.

use crate::audio::decode::{ENGINE_CHANNELS, ENGINE_SAMPLE_RATE};
use crate::audio::{encode_wav, AudioDecoder, EnginePayload, Pcm16Decoder};
use crate::error::StudioError;
use crate::history::{RenderSettings, RenderedTrack};
use crate::media::MediaStore;

/// Turns engine payloads into playable tracks.
#[derive(Debug)]
pub struct Renderer<D = Pcm16Decoder> {
    decoder: D,
    /// Assumed when a payload declares no sample rate.
    sample_rate: u32,
    /// Assumed when a payload declares no channel count.
    channel_count: u16,
}

impl Default for Renderer<Pcm16Decoder> {
    fn default() -> Self {
        Self::new(Pcm16Decoder)
    }
}

impl<D: AudioDecoder> Renderer<D> {
    /// Creates a renderer using the given decoding capability and the
    /// engine's 24 kHz mono default format.
    pub fn new(decoder: D) -> Self {
        Self {
            decoder,
            sample_rate: ENGINE_SAMPLE_RATE,
            channel_count: ENGINE_CHANNELS,
        }
    }

    /// Overrides the format assumed for payloads that declare none.
    pub fn with_stream_format(mut self, sample_rate: u32, channel_count: u16) -> Self {
        self.sample_rate = sample_rate;
        self.channel_count = channel_count;
        self
    }

    /// Renders one engine payload.
    ///
    /// # Arguments
    ///
    /// * `payload` - The engine's audio payload and declared format
    /// * `settings` - The request the payload was rendered from
    /// * `store` - Registry the new handle is added to
    ///
    /// # Errors
    ///
    /// Returns `Decode` or `Encode` errors. On error nothing is registered.
    pub fn render(
        &self,
        payload: &EnginePayload,
        settings: RenderSettings,
        store: &mut MediaStore,
    ) -> Result<RenderedTrack, StudioError> {
        let buffer =
            payload.decode_with_defaults(&self.decoder, self.sample_rate, self.channel_count)?;
        let container = encode_wav(&buffer)?;
        let url = store.register(&container);

        tracing::info!(
            %url,
            seconds = buffer.duration_seconds(),
            sample_rate = buffer.sample_rate(),
            channels = buffer.channel_count(),
            "Rendered voice track"
        );

        Ok(RenderedTrack::new(
            settings,
            container,
            url,
            buffer.duration_seconds(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::DecodedAudioBuffer;
    use crate::error::DecodeError;

    #[test]
    fn test_render_registers_handle() {
        let renderer = Renderer::new(Pcm16Decoder);
        let mut store = MediaStore::new();
        let payload = EnginePayload::from_pcm(&[0u8; 48], 24000, 1);

        let track = renderer
            .render(&payload, RenderSettings::default(), &mut store)
            .unwrap();

        assert_eq!(track.container.len(), 44 + 48);
        assert!((track.duration_seconds - 24.0 / 24000.0).abs() < 1e-12);
        assert_eq!(&*store.resolve(&track.url).unwrap(), track.container.bytes());
    }

    #[test]
    fn test_failed_render_registers_nothing() {
        let renderer = Renderer::<Pcm16Decoder>::default();
        let mut store = MediaStore::new();

        let err = renderer
            .render(&EnginePayload::new(""), RenderSettings::default(), &mut store)
            .unwrap_err();
        assert!(matches!(err, StudioError::Decode(DecodeError::EmptyPayload)));

        let odd = EnginePayload::from_pcm(&[0u8; 5], 24000, 1);
        assert!(renderer
            .render(&odd, RenderSettings::default(), &mut store)
            .is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_undeclared_format_uses_renderer_default() {
        let renderer = Renderer::<Pcm16Decoder>::default().with_stream_format(16000, 2);
        let mut store = MediaStore::new();
        let mut payload = EnginePayload::from_pcm(&[0u8; 8], 0, 0);
        payload.sample_rate = None;
        payload.channel_count = None;

        let track = renderer
            .render(&payload, RenderSettings::default(), &mut store)
            .unwrap();
        let header = track.container.header().unwrap();
        assert_eq!(header.sample_rate, 16000);
        assert_eq!(header.channels, 2);
    }

    struct Stereoizer;

    impl AudioDecoder for Stereoizer {
        fn decode(
            &self,
            bytes: &[u8],
            sample_rate: u32,
            _channel_count: u16,
        ) -> Result<DecodedAudioBuffer, DecodeError> {
            let mono: Vec<f32> = bytes.iter().map(|&b| b as f32 / 255.0).collect();
            DecodedAudioBuffer::from_channels(vec![mono.clone(), mono], sample_rate)
                .map_err(|e| DecodeError::InvalidFormat(e.to_string()))
        }
    }

    #[test]
    fn test_render_with_injected_decoder() {
        let renderer = Renderer::new(Stereoizer);
        let mut store = MediaStore::new();
        let payload = EnginePayload::from_pcm(&[0, 255, 128], 16000, 1);

        let track = renderer
            .render(&payload, RenderSettings::default(), &mut store)
            .unwrap();
        let header = track.container.header().unwrap();
        assert_eq!(header.channels, 2);
        assert_eq!(header.sample_rate, 16000);
        assert_eq!(header.data_size, 3 * 2 * 2);
    }
}
