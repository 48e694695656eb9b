//! Background track catalog.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Sentinel id meaning "no background".
pub const NONE_TRACK_ID: &str = "none";

/// One looping background track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundTrack {
    pub id: String,
    pub name: String,
    /// Location of the audio file. Empty for the `none` sentinel.
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub category: String,
}

impl BackgroundTrack {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        source: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            source: source.into(),
            category: category.into(),
        }
    }

    /// Returns true if this track can actually be played.
    pub fn is_playable(&self) -> bool {
        self.id != NONE_TRACK_ID && !self.source.trim().is_empty()
    }
}

/// Fixed set of selectable background tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackgroundCatalog {
    tracks: Vec<BackgroundTrack>,
}

impl BackgroundCatalog {
    pub fn new(tracks: Vec<BackgroundTrack>) -> Self {
        Self { tracks }
    }

    pub fn get(&self, id: &str) -> Option<&BackgroundTrack> {
        self.tracks.iter().find(|t| t.id == id)
    }

    /// Resolves a selection to a playable track.
    ///
    /// `None`, the `none` sentinel, unknown ids and tracks without a
    /// source all resolve to no background.
    pub fn resolve(&self, id: Option<&str>) -> Option<&BackgroundTrack> {
        let id = id?;
        match self.get(id) {
            Some(track) if track.is_playable() => Some(track),
            Some(_) => None,
            None => {
                tracing::warn!(id, "Unknown background track, playing voice only");
                None
            }
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.tracks.iter().map(|t| t.id.as_str())
    }

    pub fn tracks(&self) -> &[BackgroundTrack] {
        &self.tracks
    }

    /// Checks that the `none` sentinel exists and ids are unique.
    pub fn validate(&self) -> Result<(), String> {
        if self.get(NONE_TRACK_ID).is_none() {
            return Err(format!("catalog has no '{}' entry", NONE_TRACK_ID));
        }
        let mut seen = HashSet::new();
        for id in self.ids() {
            if !seen.insert(id) {
                return Err(format!("duplicate background track id '{}'", id));
            }
        }
        Ok(())
    }
}

impl Default for BackgroundCatalog {
    fn default() -> Self {
        Self::new(vec![
            BackgroundTrack::new(NONE_TRACK_ID, "No Background", "", "None"),
            BackgroundTrack::new(
                "lofi",
                "Midnight Lofi",
                "assets/backgrounds/ambient_loop.ogg",
                "Relaxing",
            ),
            BackgroundTrack::new(
                "corp",
                "Corporate Minimal",
                "assets/backgrounds/low_hum_loop.ogg",
                "Business",
            ),
            BackgroundTrack::new(
                "zen",
                "Zen Garden",
                "assets/backgrounds/crashing_waves.ogg",
                "Atmospheric",
            ),
            BackgroundTrack::new(
                "epic",
                "Dark Cinema",
                "assets/backgrounds/creepy_low_hum.ogg",
                "Cinematic",
            ),
            BackgroundTrack::new(
                "tech",
                "Cyberpunk Pulse",
                "assets/backgrounds/scifi_hum.ogg",
                "Electronic",
            ),
        ])
    }
}
