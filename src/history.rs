//! Render history.
//!
//! Keeps every successful render, newest first. The history owns the media
//! handles of its entries: removing or clearing entries revokes them, which
//! is the only way a handle is ever released.

use crate::audio::AudioContainer;
use crate::media::{MediaStore, MediaUrl};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Unique identifier for a rendered track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RenderId(Uuid);

impl RenderId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RenderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The request a track was rendered from.
///
/// Only the background fields affect playback; the rest is kept so a
/// history entry can be shown and re-requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub text: String,
    pub voice: String,
    pub emotion: String,
    /// 0.0 (barely noticeable) to 1.0 (extreme).
    pub emotion_intensity: f32,
    pub speed: f32,
    pub pitch: String,
    /// `None` when no background was selected.
    pub background_track_id: Option<String>,
    pub background_volume: Option<f32>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            text: String::new(),
            voice: "Nova".into(),
            emotion: "Neutral".into(),
            emotion_intensity: 0.7,
            speed: 1.0,
            pitch: "Medium".into(),
            background_track_id: None,
            background_volume: None,
        }
    }
}

impl RenderSettings {
    /// Sets the background selection. The `none` sentinel is stored as
    /// absent.
    pub fn with_background(mut self, id: impl Into<String>, volume: f32) -> Self {
        let id = id.into();
        self.background_track_id = (id != crate::playback::NONE_TRACK_ID).then_some(id);
        self.background_volume = Some(volume);
        self
    }
}

/// A rendered, playable voice track.
#[derive(Debug, Clone)]
pub struct RenderedTrack {
    pub id: RenderId,
    pub settings: RenderSettings,
    pub container: AudioContainer,
    /// Handle registered for this track's container.
    pub url: MediaUrl,
    pub duration_seconds: f64,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
}

impl RenderedTrack {
    pub fn new(
        settings: RenderSettings,
        container: AudioContainer,
        url: MediaUrl,
        duration_seconds: f64,
    ) -> Self {
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self {
            id: RenderId::new(),
            settings,
            container,
            url,
            duration_seconds,
            timestamp_ms,
        }
    }
}

/// Rendered tracks, most recent first.
#[derive(Debug, Default)]
pub struct RenderHistory {
    entries: Vec<RenderedTrack>,
}

impl RenderHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a track at the front.
    pub fn push(&mut self, track: RenderedTrack) -> RenderId {
        let id = track.id;
        self.entries.insert(0, track);
        id
    }

    pub fn get(&self, id: RenderId) -> Option<&RenderedTrack> {
        self.entries.iter().find(|t| t.id == id)
    }

    /// The most recent render.
    pub fn latest(&self) -> Option<&RenderedTrack> {
        self.entries.first()
    }

    /// Removes an entry and revokes its handle.
    ///
    /// # Returns
    ///
    /// The removed track, or None if not found
    pub fn remove(&mut self, id: RenderId, store: &mut MediaStore) -> Option<RenderedTrack> {
        let pos = self.entries.iter().position(|t| t.id == id)?;
        let track = self.entries.remove(pos);
        store.revoke(&track.url);
        Some(track)
    }

    /// Removes every entry, revoking all handles.
    ///
    /// # Returns
    ///
    /// The number of entries removed
    pub fn clear(&mut self, store: &mut MediaStore) -> usize {
        let count = self.entries.len();
        for track in self.entries.drain(..) {
            store.revoke(&track.url);
        }
        count
    }

    pub fn iter(&self) -> impl Iterator<Item = &RenderedTrack> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
