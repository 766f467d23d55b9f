//! Display Reconciler
//!
//! Decides, once per tick, what the preview should show.
//!
//! ```text
//!            /latest ok + known type
//!   ┌────────────────────────────────────┐
//!   │                                    ▼
//! ┌─┴────┐  nothing active / failure  ┌────────┐
//! │ Idle │◀───────────────────────────│ Staged │
//! └──────┘                            └────────┘
//! ```
//!
//! A tick queries the gateway first and only then looks at idle art; the
//! two are never raced. A failed query counts as "nothing active" for that
//! tick. Only the idle path touches the rotation cursor.

use serde::{Deserialize, Serialize};

use crate::gateway::ContentGateway;
use crate::idle_art::IdleArtCache;
use crate::messages::{RenderContent, RenderInstruction, RenderSource};

/// Which render source the last tick used
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReconcilerState {
    /// No tick has run yet
    Unknown,
    /// Showing content the gateway reports as active
    Staged,
    /// Showing idle art or the placeholder
    Idle,
}

/// Display reconciler
#[derive(Debug)]
pub struct DisplayReconciler {
    state: ReconcilerState,
    seq: u64,
}

impl DisplayReconciler {
    /// Create a reconciler that has not ticked yet
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: ReconcilerState::Unknown,
            seq: 0,
        }
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> ReconcilerState {
        self.state
    }

    /// Number of ticks run so far
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.seq
    }

    /// Run one tick
    pub async fn tick<G>(&mut self, gateway: &G, cache: &mut IdleArtCache) -> RenderInstruction
    where
        G: ContentGateway + ?Sized,
    {
        self.seq += 1;

        let staged = match gateway.latest().await {
            Ok(staged) => staged,
            Err(e) => {
                tracing::warn!(error = %e, seq = self.seq, "Latest query failed, treating as idle");
                None
            }
        };

        let (source, content) = match staged {
            Some(content) => {
                tracing::debug!(seq = self.seq, kind = ?content.kind(), "Staged content active");
                (RenderSource::Staged, RenderContent::from(content))
            }
            None => match cache.next() {
                Some(art) => (RenderSource::Idle, RenderContent::IdleArt { url: art.url }),
                None => (RenderSource::Idle, RenderContent::NoIdleArt),
            },
        };

        let state = match source {
            RenderSource::Staged => ReconcilerState::Staged,
            RenderSource::Idle => ReconcilerState::Idle,
        };
        if state != self.state {
            tracing::info!(from = ?self.state, to = ?state, seq = self.seq, "Display state changed");
            self.state = state;
        }

        tracing::debug!(seq = self.seq, content = ?content, cursor = ?cache.cursor(), "Tick");
        RenderInstruction::new(self.seq, source, content)
    }
}

impl Default for DisplayReconciler {
    fn default() -> Self {
        Self::new()
    }
}
