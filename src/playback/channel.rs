//! Playback channel boundary and per-channel state.
//!
//! A [`PlaybackChannel`] is the host capability: one monophonic output lane.
//! [`TrackedChannel`] wraps it with the state machine the orchestrator
//! relies on, so a channel is never left in a state that fails on next use.

use crate::media::MediaUrl;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Something a channel can load.
#[derive(Clone)]
pub enum MediaSource {
    /// A rendered container resolved from its handle.
    Memory { url: MediaUrl, bytes: Arc<[u8]> },
    /// A file on disk (background tracks).
    File(PathBuf),
}

impl fmt::Debug for MediaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaSource::Memory { url, bytes } => f
                .debug_struct("Memory")
                .field("url", url)
                .field("len", &bytes.len())
                .finish(),
            MediaSource::File(path) => f.debug_tuple("File").field(path).finish(),
        }
    }
}

impl fmt::Display for MediaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaSource::Memory { url, .. } => write!(f, "{}", url),
            MediaSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Failures reported by a host channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// `play()` was called with nothing loaded.
    #[error("no source loaded")]
    NoSource,

    /// The source could not be decoded by the host.
    #[error("unsupported source: {0}")]
    Unsupported(String),

    /// The host refused or failed to start output.
    #[error("output unavailable: {0}")]
    Output(String),
}

/// Host playback primitive for one channel.
pub trait PlaybackChannel {
    /// Replaces the loaded source. `None` clears it. Replacing abandons
    /// whatever was playing before.
    fn set_source(&mut self, source: Option<MediaSource>);

    /// Starts or resumes playback of the loaded source.
    fn play(&mut self) -> Result<(), ChannelError>;

    fn pause(&mut self);

    fn set_current_time(&mut self, position: Duration);

    /// Output volume as a fraction of full scale.
    fn set_volume(&mut self, volume: f32);

    fn set_loop(&mut self, looping: bool);

    /// Returns true once the loaded source has played to its natural end.
    fn has_ended(&self) -> bool;
}

/// Lifecycle of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Nothing loaded.
    Empty,
    /// Source assigned, play not yet confirmed.
    Loading,
    Playing,
    /// Reached its natural end.
    Ended,
    /// Paused by request with the source still loaded.
    Stopped,
}

/// A host channel plus its tracked state.
#[derive(Debug)]
pub struct TrackedChannel<C> {
    channel: C,
    state: ChannelState,
    name: &'static str,
}

impl<C: PlaybackChannel> TrackedChannel<C> {
    pub fn new(name: &'static str, channel: C) -> Self {
        Self {
            channel,
            state: ChannelState::Empty,
            name,
        }
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// Assigns a new source, pausing anything in flight first.
    pub fn load(&mut self, source: MediaSource) {
        if matches!(self.state, ChannelState::Playing | ChannelState::Loading) {
            self.channel.pause();
        }
        tracing::debug!(channel = self.name, %source, "Loading source");
        self.channel.set_source(Some(source));
        self.state = ChannelState::Loading;
    }

    /// Requests playback. On failure the state is left untouched so the
    /// same source can be retried.
    pub fn play(&mut self) -> Result<(), ChannelError> {
        self.channel.play()?;
        self.state = ChannelState::Playing;
        Ok(())
    }

    /// Pauses, rewinds and unloads. The channel ends up `Empty`.
    pub fn clear(&mut self) {
        self.channel.pause();
        self.channel.set_current_time(Duration::ZERO);
        self.channel.set_source(None);
        if self.state != ChannelState::Empty {
            tracing::debug!(channel = self.name, "Cleared");
        }
        self.state = ChannelState::Empty;
    }

    /// Pauses but keeps the source loaded.
    pub fn stop(&mut self) {
        if matches!(self.state, ChannelState::Playing | ChannelState::Loading) {
            self.channel.pause();
            self.state = ChannelState::Stopped;
        }
    }

    pub fn mark_ended(&mut self) {
        self.state = ChannelState::Ended;
    }
}
