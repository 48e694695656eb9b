//! Caller-facing studio API.
//!
//! Ties the render pipeline, the handle registry, the history and the
//! playback orchestrator together. A failed render leaves history and
//! playback untouched; a blocked playback leaves the rendered entry in
//! history so it can be played again.

use crate::audio::{AudioDecoder, EnginePayload, Pcm16Decoder};
use crate::config::StudioConfig;
use crate::error::{Result, StudioError};
use crate::history::{RenderHistory, RenderId, RenderSettings, RenderedTrack};
use crate::media::MediaStore;
use crate::playback::{
    ChannelState, MediaSource, PlaybackChannel, PlaybackOrchestrator, SessionReport,
    SessionToken,
};
use crate::render::Renderer;

/// The studio core: render, keep, and play voice tracks.
pub struct Studio<V, B, D = Pcm16Decoder> {
    renderer: Renderer<D>,
    store: MediaStore,
    history: RenderHistory,
    orchestrator: PlaybackOrchestrator<V, B>,
    default_mixing_level: f32,
}

impl<V, B, D> Studio<V, B, D>
where
    V: PlaybackChannel,
    B: PlaybackChannel,
    D: AudioDecoder,
{
    /// Creates a studio with the given channels and decoding capability.
    pub fn new(config: &StudioConfig, voice: V, background: B, decoder: D) -> Self {
        Self {
            renderer: Renderer::new(decoder)
                .with_stream_format(config.sample_rate, config.channel_count),
            store: MediaStore::new(),
            history: RenderHistory::new(),
            orchestrator: PlaybackOrchestrator::new(
                voice,
                background,
                config.background_tracks.clone(),
            ),
            default_mixing_level: config.default_mixing_level,
        }
    }

    /// Renders a payload and adds it to history without playing it.
    ///
    /// # Errors
    ///
    /// Returns decode or encode errors; history is unchanged on error.
    pub fn render(&mut self, payload: &EnginePayload, settings: RenderSettings) -> Result<RenderId> {
        let track = self.renderer.render(payload, settings, &mut self.store)?;
        Ok(self.history.push(track))
    }

    /// Renders a payload, adds it to history and plays it with the
    /// background selection stored in `settings`.
    ///
    /// # Errors
    ///
    /// - Decode or encode errors: nothing was added to history
    /// - `PlaybackBlocked`: the render is in history (see
    ///   [`RenderHistory::latest`]) and can be replayed
    pub fn render_and_play(
        &mut self,
        payload: &EnginePayload,
        settings: RenderSettings,
    ) -> Result<(RenderId, SessionReport)> {
        let id = self.render(payload, settings)?;
        let report = self.replay(id)?;
        Ok((id, report))
    }

    /// Plays a rendered track with an explicit background selection.
    ///
    /// # Arguments
    ///
    /// * `id` - History entry to play
    /// * `background_id` - Catalog id, `None` or `"none"` for voice only
    /// * `mixing_level` - Background volume; the configured default if `None`
    ///
    /// # Errors
    ///
    /// Returns `UnknownRender` if the entry is gone, `HandleRevoked` if its
    /// handle was released, or `PlaybackBlocked` if the host refused.
    pub fn play(
        &mut self,
        id: RenderId,
        background_id: Option<&str>,
        mixing_level: Option<f32>,
    ) -> Result<SessionReport> {
        let track = self.history.get(id).ok_or(StudioError::UnknownRender(id))?;
        let bytes = self
            .store
            .resolve(&track.url)
            .ok_or_else(|| StudioError::HandleRevoked(track.url.clone()))?;
        let source = MediaSource::Memory {
            url: track.url.clone(),
            bytes,
        };
        let level = mixing_level.unwrap_or(self.default_mixing_level);
        self.orchestrator.play(source, background_id, level)
    }

    /// Plays a history entry with the background it was rendered with.
    pub fn replay(&mut self, id: RenderId) -> Result<SessionReport> {
        let settings = self
            .history
            .get(id)
            .map(|t| t.settings.clone())
            .ok_or(StudioError::UnknownRender(id))?;
        self.play(
            id,
            settings.background_track_id.as_deref(),
            settings.background_volume,
        )
    }

    /// Deletes a history entry and releases its handle.
    pub fn delete(&mut self, id: RenderId) -> Result<RenderedTrack> {
        self.history
            .remove(id, &mut self.store)
            .ok_or(StudioError::UnknownRender(id))
    }

    /// Deletes every history entry, releasing all handles.
    pub fn clear_history(&mut self) -> usize {
        self.history.clear(&mut self.store)
    }

    /// Stops the current session.
    pub fn stop(&mut self) {
        self.orchestrator.stop();
    }

    /// Polls for the voice channel's natural end. See
    /// [`PlaybackOrchestrator::poll`].
    pub fn poll(&mut self) -> bool {
        self.orchestrator.poll()
    }

    /// Forwards a pushed end-of-voice notification.
    pub fn notify_voice_ended(&mut self, token: SessionToken) -> bool {
        self.orchestrator.notify_voice_ended(token)
    }

    /// Returns true while the voice channel is playing.
    ///
    /// A voice the host refused to start stays loaded but is not playing.
    pub fn is_playing(&self) -> bool {
        self.orchestrator.voice_state() == ChannelState::Playing
    }

    pub fn history(&self) -> &RenderHistory {
        &self.history
    }

    pub fn store(&self) -> &MediaStore {
        &self.store
    }

    pub fn orchestrator(&self) -> &PlaybackOrchestrator<V, B> {
        &self.orchestrator
    }

    pub fn orchestrator_mut(&mut self) -> &mut PlaybackOrchestrator<V, B> {
        &mut self.orchestrator
    }
}
