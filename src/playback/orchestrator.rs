//! Dual-channel playback orchestration.
//!
//! Drives a voice channel and a looping background channel as one session:
//! the background starts with the voice and is stopped, rewound and unloaded
//! when the voice reaches its natural end. Only one session is live at a
//! time; starting a new one supersedes the previous one on both channels.

use super::catalog::BackgroundCatalog;
use super::channel::{ChannelState, MediaSource, PlaybackChannel, TrackedChannel};
use crate::error::StudioError;

/// Background level used when the caller does not supply one.
pub const DEFAULT_MIXING_LEVEL: f32 = 0.3;

/// Identifies one playback session.
///
/// Every `play()` mints a new token. End signals carrying an older token are
/// ignored, so a superseded session can never stop the current background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionToken {
    generation: u64,
}

impl SessionToken {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What happened to the background channel when a session started.
#[derive(Debug, Clone, PartialEq)]
pub enum BackgroundStatus {
    /// No background selected, or the selection has no source.
    None,
    /// Looping at the given level.
    Playing { track_id: String, level: f32 },
    /// The host refused to start it; the voice plays alone.
    Degraded { track_id: String, reason: String },
}

/// Outcome of a successfully started session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub token: SessionToken,
    pub background: BackgroundStatus,
}

/// Clamps a mixing level into [0, 1]. Non-finite values fall back to the
/// default.
pub fn sanitize_level(level: f32) -> f32 {
    if level.is_finite() {
        level.clamp(0.0, 1.0)
    } else {
        DEFAULT_MIXING_LEVEL
    }
}

/// Owns the voice and background channels.
pub struct PlaybackOrchestrator<V, B> {
    voice: TrackedChannel<V>,
    background: TrackedChannel<B>,
    catalog: BackgroundCatalog,
    /// Generation of the most recent session.
    generation: u64,
    /// Generation whose voice end will stop the background. Taken on fire.
    armed_end: Option<u64>,
}

impl<V: PlaybackChannel, B: PlaybackChannel> PlaybackOrchestrator<V, B> {
    pub fn new(voice: V, background: B, catalog: BackgroundCatalog) -> Self {
        Self {
            voice: TrackedChannel::new("voice", voice),
            background: TrackedChannel::new("background", background),
            catalog,
            generation: 0,
            armed_end: None,
        }
    }

    /// Starts a session: voice plus an optional looping background.
    ///
    /// The voice is loaded first, then the background (volume and loop are
    /// applied before its `play()`), then the voice is started. The two
    /// `play()` requests are independent: a refused background degrades to
    /// voice only, and a refused voice does not stop the background.
    ///
    /// # Arguments
    ///
    /// * `voice` - The rendered container to play
    /// * `background_id` - Catalog id, `None` or `"none"` for no background
    /// * `mixing_level` - Background volume, clamped to [0, 1]
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::PlaybackBlocked`] if the host refuses the
    /// voice channel. Playing again retries.
    pub fn play(
        &mut self,
        voice: MediaSource,
        background_id: Option<&str>,
        mixing_level: f32,
    ) -> Result<SessionReport, StudioError> {
        self.generation += 1;
        let token = SessionToken {
            generation: self.generation,
        };
        // Drop the previous session's end trigger before anything else
        self.armed_end = None;

        self.voice.load(voice);

        let background = match self.catalog.resolve(background_id).cloned() {
            Some(track) => {
                let level = sanitize_level(mixing_level);
                self.background
                    .load(MediaSource::File(track.source.clone().into()));
                self.background.channel_mut().set_volume(level);
                self.background.channel_mut().set_loop(true);
                self.armed_end = Some(token.generation);

                match self.background.play() {
                    Ok(()) => BackgroundStatus::Playing {
                        track_id: track.id,
                        level,
                    },
                    Err(e) => {
                        tracing::warn!(track = %track.id, error = %e, "Background playback deferred");
                        BackgroundStatus::Degraded {
                            track_id: track.id,
                            reason: e.to_string(),
                        }
                    }
                }
            }
            None => {
                self.background.clear();
                BackgroundStatus::None
            }
        };

        if let Err(e) = self.voice.play() {
            tracing::error!(error = %e, "Voice playback failed");
            return Err(StudioError::PlaybackBlocked(e.to_string()));
        }

        tracing::info!(
            session = token.generation,
            background = ?background,
            "Playback session started"
        );
        Ok(SessionReport { token, background })
    }

    /// Handles the voice channel reaching its natural end.
    ///
    /// Stops, rewinds and unloads the background at most once per session.
    /// Signals from superseded sessions and repeated signals are ignored.
    ///
    /// # Returns
    ///
    /// true if this call stopped the background
    pub fn notify_voice_ended(&mut self, token: SessionToken) -> bool {
        if token.generation != self.generation {
            tracing::warn!(
                stale = token.generation,
                current = self.generation,
                "Ignoring end signal from a superseded session"
            );
            return false;
        }

        if matches!(
            self.voice.state(),
            ChannelState::Playing | ChannelState::Loading
        ) {
            self.voice.mark_ended();
        }

        match self.armed_end.take() {
            Some(generation) if generation == token.generation => {
                self.background.clear();
                tracing::debug!(session = generation, "Voice ended, background stopped");
                true
            }
            _ => false,
        }
    }

    /// Checks the voice channel for a natural end.
    ///
    /// For hosts that cannot push an end notification. Should be called
    /// regularly while a session is playing.
    ///
    /// # Returns
    ///
    /// true if the voice ended since the last poll
    pub fn poll(&mut self) -> bool {
        if self.voice.state() == ChannelState::Playing && self.voice.channel().has_ended() {
            self.notify_voice_ended(self.current_token());
            return true;
        }
        false
    }

    /// Stops the session: voice paused, background unloaded.
    pub fn stop(&mut self) {
        self.armed_end = None;
        self.voice.stop();
        self.background.clear();
    }

    /// Token of the most recent session.
    pub fn current_token(&self) -> SessionToken {
        SessionToken {
            generation: self.generation,
        }
    }

    pub fn voice_state(&self) -> ChannelState {
        self.voice.state()
    }

    pub fn background_state(&self) -> ChannelState {
        self.background.state()
    }

    pub fn catalog(&self) -> &BackgroundCatalog {
        &self.catalog
    }

    pub fn voice_channel(&self) -> &V {
        self.voice.channel()
    }

    pub fn background_channel(&self) -> &B {
        self.background.channel()
    }

    pub fn voice_channel_mut(&mut self) -> &mut V {
        self.voice.channel_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaUrl;
    use crate::playback::test_support::{Call, RecordingChannel};
    use std::sync::Arc;
    use std::time::Duration;

    type TestOrchestrator = PlaybackOrchestrator<RecordingChannel, RecordingChannel>;

    fn orchestrator() -> TestOrchestrator {
        PlaybackOrchestrator::new(
            RecordingChannel::default(),
            RecordingChannel::default(),
            BackgroundCatalog::default(),
        )
    }

    fn voice(tag: &str) -> MediaSource {
        let url: MediaUrl = serde_json::from_str(&format!("\"blob:vocalize/{}\"", tag)).unwrap();
        MediaSource::Memory {
            url,
            bytes: Arc::from(vec![0u8; 4]),
        }
    }

    #[test]
    fn test_session_with_background() {
        let mut orch = orchestrator();
        let report = orch.play(voice("a"), Some("lofi"), 0.4).unwrap();

        assert_eq!(
            report.background,
            BackgroundStatus::Playing {
                track_id: "lofi".into(),
                level: 0.4
            }
        );
        assert_eq!(orch.voice_state(), ChannelState::Playing);
        assert_eq!(orch.background_state(), ChannelState::Playing);

        let bg = orch.background_channel();
        assert!(bg.playing);
        assert!(bg.looping);
        assert_eq!(bg.volume, 0.4);
        assert_eq!(
            bg.source.as_deref(),
            Some("assets/backgrounds/ambient_loop.ogg")
        );

        // Volume and loop are applied before play
        let play_at = bg.position(&Call::Play).unwrap();
        assert!(bg.position(&Call::SetVolume(0.4)).unwrap() < play_at);
        assert!(bg.position(&Call::SetLoop(true)).unwrap() < play_at);
    }

    #[test]
    fn test_no_background_never_plays_background() {
        let mut orch = orchestrator();
        let report = orch.play(voice("a"), Some("none"), 0.3).unwrap();

        assert_eq!(report.background, BackgroundStatus::None);
        assert_eq!(orch.background_channel().play_count(), 0);
        assert_eq!(orch.background_channel().clear_count(), 1);
        assert_eq!(orch.background_state(), ChannelState::Empty);

        orch.play(voice("b"), None, 0.3).unwrap();
        assert_eq!(orch.background_channel().play_count(), 0);
    }

    #[test]
    fn test_end_triggers_stop_exactly_once() {
        let mut orch = orchestrator();
        let report = orch.play(voice("a"), Some("zen"), 0.3).unwrap();

        assert!(orch.notify_voice_ended(report.token));
        // Duplicate delivery
        assert!(!orch.notify_voice_ended(report.token));

        let bg = orch.background_channel();
        assert_eq!(bg.pause_count(), 1);
        assert_eq!(bg.clear_count(), 1);
        assert_eq!(bg.count(&Call::SetCurrentTime(Duration::ZERO)), 1);
        assert!(bg.source.is_none());
        assert_eq!(orch.background_state(), ChannelState::Empty);
        assert_eq!(orch.voice_state(), ChannelState::Ended);
    }

    #[test]
    fn test_stale_end_signal_ignored() {
        let mut orch = orchestrator();
        let first = orch.play(voice("a"), Some("zen"), 0.3).unwrap();
        let second = orch.play(voice("b"), Some("tech"), 0.3).unwrap();

        // The first session's voice finishing late must not stop the second background
        assert!(!orch.notify_voice_ended(first.token));
        assert_eq!(orch.background_state(), ChannelState::Playing);
        assert!(orch.background_channel().playing);

        assert!(orch.notify_voice_ended(second.token));
        assert_eq!(orch.background_state(), ChannelState::Empty);
    }

    #[test]
    fn test_new_session_preempts_voice() {
        let mut orch = orchestrator();
        orch.play(voice("a"), None, 0.3).unwrap();
        orch.play(voice("b"), None, 0.3).unwrap();

        let v = orch.voice_channel();
        // A pause precedes the second source assignment
        let second_load = v
            .position(&Call::SetSource(Some("blob:vocalize/b".into())))
            .unwrap();
        assert_eq!(v.calls[second_load - 1], Call::Pause);
        assert_eq!(v.source.as_deref(), Some("blob:vocalize/b"));
        assert_eq!(v.play_count(), 2);
    }

    #[test]
    fn test_first_session_loads_then_plays_voice() {
        let mut orch = orchestrator();
        orch.play(voice("a"), Some("epic"), 0.3).unwrap();
        // Nothing was loaded before, so no pause is needed
        let v = orch.voice_channel();
        assert_eq!(
            v.calls,
            vec![Call::SetSource(Some("blob:vocalize/a".into())), Call::Play]
        );
    }

    #[test]
    fn test_background_rejection_degrades() {
        let mut orch = PlaybackOrchestrator::new(
            RecordingChannel::default(),
            RecordingChannel::rejecting(),
            BackgroundCatalog::default(),
        );
        let report = orch.play(voice("a"), Some("corp"), 0.5).unwrap();

        assert!(matches!(
            report.background,
            BackgroundStatus::Degraded { ref track_id, .. } if track_id == "corp"
        ));
        assert_eq!(orch.voice_state(), ChannelState::Playing);
        assert!(orch.voice_channel().playing);
    }

    #[test]
    fn test_voice_rejection_is_blocked_and_retryable() {
        let mut orch = PlaybackOrchestrator::new(
            RecordingChannel::rejecting(),
            RecordingChannel::default(),
            BackgroundCatalog::default(),
        );
        let err = orch.play(voice("a"), Some("lofi"), 0.3).unwrap_err();
        assert!(matches!(err, StudioError::PlaybackBlocked(_)));

        // The background is not rolled back
        assert!(orch.background_channel().playing);
        assert_eq!(orch.voice_state(), ChannelState::Loading);

        // User retries after the host allows playback
        orch.voice_channel_mut().reject_play = false;
        let report = orch.play(voice("a"), Some("lofi"), 0.3).unwrap();
        assert_eq!(orch.voice_state(), ChannelState::Playing);
        assert!(orch.notify_voice_ended(report.token));
    }

    #[test]
    fn test_poll_detects_end_once() {
        let mut orch = orchestrator();
        orch.play(voice("a"), Some("lofi"), 0.3).unwrap();
        assert!(!orch.poll());

        orch.voice_channel_mut().ended = true;
        assert!(orch.poll());
        assert_eq!(orch.background_state(), ChannelState::Empty);

        // Voice is now Ended; further polls do nothing
        assert!(!orch.poll());
        assert_eq!(orch.background_channel().clear_count(), 1);
    }

    #[test]
    fn test_stop_disarms_end_trigger() {
        let mut orch = orchestrator();
        let report = orch.play(voice("a"), Some("lofi"), 0.3).unwrap();
        orch.stop();

        assert_eq!(orch.voice_state(), ChannelState::Stopped);
        assert_eq!(orch.background_state(), ChannelState::Empty);
        assert!(!orch.notify_voice_ended(report.token));
        assert_eq!(orch.background_channel().clear_count(), 1);
    }

    #[test]
    fn test_mixing_level_sanitized() {
        assert_eq!(sanitize_level(1.5), 1.0);
        assert_eq!(sanitize_level(-0.2), 0.0);
        assert_eq!(sanitize_level(0.0), 0.0);
        assert_eq!(sanitize_level(f32::NAN), DEFAULT_MIXING_LEVEL);

        let mut orch = orchestrator();
        orch.play(voice("a"), Some("lofi"), 3.0).unwrap();
        assert_eq!(orch.background_channel().volume, 1.0);
    }
}
