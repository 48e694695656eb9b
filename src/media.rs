//! Dereferenceable handles for rendered containers.
//!
//! Every rendered container is registered under a `blob:` URL that a
//! playback channel can load. Handles are never collected implicitly: the
//! owner must call [`MediaStore::revoke`] when the artifact is discarded.

use crate::audio::AudioContainer;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// URL scheme prefix for registered containers.
const URL_PREFIX: &str = "blob:vocalize/";

/// Handle to a registered container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaUrl(String);

impl MediaUrl {
    fn generate() -> Self {
        Self(format!("{}{}", URL_PREFIX, Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Registry of live container handles.
#[derive(Debug, Default)]
pub struct MediaStore {
    entries: HashMap<MediaUrl, Arc<[u8]>>,
}

impl MediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a container and returns a fresh handle for it.
    pub fn register(&mut self, container: &AudioContainer) -> MediaUrl {
        let url = MediaUrl::generate();
        self.entries.insert(url.clone(), container.shared_bytes());
        tracing::debug!(%url, bytes = container.len(), "Registered media handle");
        url
    }

    /// Looks up the bytes behind a handle. `None` once revoked.
    pub fn resolve(&self, url: &MediaUrl) -> Option<Arc<[u8]>> {
        self.entries.get(url).cloned()
    }

    /// Releases a handle.
    ///
    /// # Returns
    ///
    /// true if the handle was live
    pub fn revoke(&mut self, url: &MediaUrl) -> bool {
        let released = self.entries.remove(url).is_some();
        if released {
            tracing::debug!(%url, "Revoked media handle");
        }
        released
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
