//! In-memory playback channel that records every call.

use super::channel::{ChannelError, MediaSource, PlaybackChannel};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    /// Display form of the source, `None` when cleared.
    SetSource(Option<String>),
    Play,
    Pause,
    SetCurrentTime(Duration),
    SetVolume(f32),
    SetLoop(bool),
}

#[derive(Debug, Default)]
pub struct RecordingChannel {
    pub calls: Vec<Call>,
    pub source: Option<String>,
    pub playing: bool,
    pub volume: f32,
    pub looping: bool,
    /// Makes every `play()` fail.
    pub reject_play: bool,
    /// Simulates the source running out.
    pub ended: bool,
}

impl RecordingChannel {
    pub fn rejecting() -> Self {
        Self {
            reject_play: true,
            ..Self::default()
        }
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }

    pub fn play_count(&self) -> usize {
        self.count(&Call::Play)
    }

    pub fn pause_count(&self) -> usize {
        self.count(&Call::Pause)
    }

    pub fn clear_count(&self) -> usize {
        self.count(&Call::SetSource(None))
    }

    /// Index of the first call matching `call`.
    pub fn position(&self, call: &Call) -> Option<usize> {
        self.calls.iter().position(|c| c == call)
    }
}

impl PlaybackChannel for RecordingChannel {
    fn set_source(&mut self, source: Option<MediaSource>) {
        let source = source.map(|s| s.to_string());
        self.calls.push(Call::SetSource(source.clone()));
        self.source = source;
        self.playing = false;
        self.ended = false;
    }

    fn play(&mut self) -> Result<(), ChannelError> {
        self.calls.push(Call::Play);
        if self.reject_play {
            return Err(ChannelError::Output("autoplay blocked".into()));
        }
        if self.source.is_none() {
            return Err(ChannelError::NoSource);
        }
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.calls.push(Call::Pause);
        self.playing = false;
    }

    fn set_current_time(&mut self, position: Duration) {
        self.calls.push(Call::SetCurrentTime(position));
    }

    fn set_volume(&mut self, volume: f32) {
        self.calls.push(Call::SetVolume(volume));
        self.volume = volume;
    }

    fn set_loop(&mut self, looping: bool) {
        self.calls.push(Call::SetLoop(looping));
        self.looping = looping;
    }

    fn has_ended(&self) -> bool {
        self.ended
    }
}
