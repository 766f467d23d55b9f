//! Idle Art Cache
//!
//! Local mirror of the gateway's idle-art set plus the rotation cursor.
//!
//! # Cursor Rules
//!
//! - `None` exactly when the set is empty
//! - set goes from empty to non-empty: cursor starts at `0`
//! - set shrinks below the cursor: cursor wraps to `0`
//! - otherwise a refresh leaves the cursor alone, even if the image at that
//!   index is now a different one. Identity is not tracked.
//!
//! All mutation goes through [`IdleArtCache::refresh`] (or its atomic swap,
//! [`IdleArtCache::replace`]) and [`IdleArtCache::next`].

use serde::{Deserialize, Serialize};

use crate::gateway::{ContentGateway, ImageRef};

/// Result of refreshing the cache from the gateway
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Contents replaced with the gateway's list
    Refreshed {
        /// Number of images now cached
        count: usize,
    },
    /// The fetch failed; previous contents and cursor kept
    KeptStale,
}

impl RefreshOutcome {
    /// Whether the cache now reflects the gateway
    #[must_use]
    pub fn is_fresh(self) -> bool {
        matches!(self, Self::Refreshed { .. })
    }
}

/// One tile of the idle-art gallery
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryEntry {
    /// Identifier used for deletion
    pub filename: String,
    /// Resolved image URL
    pub url: String,
}

/// Idle-art set and rotation cursor
#[derive(Clone, Debug, Default)]
pub struct IdleArtCache {
    items: Vec<ImageRef>,
    cursor: Option<usize>,
}

impl IdleArtCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache holding `items`
    #[must_use]
    pub fn with_items(items: Vec<ImageRef>) -> Self {
        let mut cache = Self::new();
        cache.replace(items);
        cache
    }

    /// Fetch the full list from the gateway and swap it in
    ///
    /// Failures are logged and swallowed; the cached set and cursor stay.
    pub async fn refresh<G>(&mut self, gateway: &G) -> RefreshOutcome
    where
        G: ContentGateway + ?Sized,
    {
        match gateway.idle_art_list().await {
            Ok(items) => {
                let count = items.len();
                self.replace(items);
                tracing::debug!(count, cursor = ?self.cursor, "Idle art refreshed");
                RefreshOutcome::Refreshed { count }
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    cached = self.items.len(),
                    "Idle art refresh failed, keeping cached set"
                );
                RefreshOutcome::KeptStale
            }
        }
    }

    /// Replace the whole set at once and fix up the cursor
    pub fn replace(&mut self, items: Vec<ImageRef>) {
        self.cursor = match (self.cursor, items.len()) {
            (_, 0) => None,
            (None, _) => Some(0),
            (Some(cursor), len) if cursor >= len => Some(0),
            (Some(cursor), _) => Some(cursor),
        };
        self.items = items;
    }

    /// Image at the cursor, advancing the cursor by one
    ///
    /// Returns `None` for an empty set.
    pub fn next(&mut self) -> Option<ImageRef> {
        let cursor = self.cursor?;
        let item = self.items.get(cursor)?.clone();
        self.cursor = Some((cursor + 1) % self.items.len());
        Some(item)
    }

    /// Image at the cursor, without advancing
    #[must_use]
    pub fn peek(&self) -> Option<&ImageRef> {
        self.cursor.and_then(|c| self.items.get(c))
    }

    /// Current cursor
    #[must_use]
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Number of cached images
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no idle art is cached
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Cached images in gateway order
    #[must_use]
    pub fn items(&self) -> &[ImageRef] {
        &self.items
    }

    /// Gallery tiles in gateway order
    #[must_use]
    pub fn gallery(&self) -> Vec<GalleryEntry> {
        self.items
            .iter()
            .map(|item| GalleryEntry {
                filename: item.filename().to_string(),
                url: item.url.clone(),
            })
            .collect()
    }
}
