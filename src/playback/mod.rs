//! Voice and background playback.
//!
//! The orchestrator owns exactly one voice channel and one background
//! channel. Channels are reached through the [`PlaybackChannel`] trait so the
//! native rodio output and test doubles are interchangeable.

pub mod catalog;
pub mod channel;
pub mod orchestrator;

#[cfg(test)]
pub(crate) mod test_support;

pub use catalog::{BackgroundCatalog, BackgroundTrack, NONE_TRACK_ID};
pub use channel::{ChannelError, ChannelState, MediaSource, PlaybackChannel, TrackedChannel};
pub use orchestrator::{
    sanitize_level, BackgroundStatus, PlaybackOrchestrator, SessionReport, SessionToken,
    DEFAULT_MIXING_LEVEL,
};
