//! Controller Messages
//!
//! Messages sent from the controller to a surface (terminal, web page,
//! test harness). Surfaces render what they are told and keep no state of
//! their own about what the frame shows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::gateway::{MetArt, StagedContent};
use crate::idle_art::GalleryEntry;

/// Messages from controller to surface
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ControllerMessage {
    /// Paint this into the preview
    Render(RenderInstruction),

    /// Update the status line
    Status(StatusLine),

    /// Re-render the idle-art gallery
    Gallery {
        /// Tiles in gateway order
        entries: Vec<GalleryEntry>,
    },

    /// An input succeeded and should be emptied
    ClearInput {
        /// Which input
        field: InputField,
    },

    /// The gateway generated an image from a prompt
    GeneratedImage {
        /// Resolved image URL
        url: String,
    },

    /// The gateway picked a museum piece
    MetArt(MetArt),

    /// The poll loop has stopped
    Stopped,
}

/// Input widgets the controller may ask a surface to clear
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputField {
    /// Text message box
    Text,
    /// Image-to-stage picker
    Image,
    /// Idle-art upload picker
    IdleArt,
    /// AI prompt box
    Prompt,
}

/// Where a render instruction came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderSource {
    /// The gateway reported active content
    Staged,
    /// Nothing active, showing idle art (or the placeholder)
    Idle,
}

/// What to paint
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderContent {
    /// A staged text message
    Text {
        /// Message body, unescaped
        message: String,
    },
    /// A staged image
    Image {
        /// Resolved image URL
        url: String,
    },
    /// A staged weather card
    Weather {
        /// Forecast text, if any
        summary: Option<String>,
        /// Weather image URL, if any
        url: Option<String>,
    },
    /// The next idle-art image
    IdleArt {
        /// Resolved image URL
        url: String,
    },
    /// Nothing staged and no idle art to show
    NoIdleArt,
}

impl From<StagedContent> for RenderContent {
    fn from(content: StagedContent) -> Self {
        match content {
            StagedContent::Text { message } => Self::Text { message },
            StagedContent::Image { image } => Self::Image { url: image.url },
            StagedContent::Weather { summary, image } => Self::Weather {
                summary,
                url: image.map(|i| i.url),
            },
        }
    }
}

/// One reconciler decision
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderInstruction {
    /// Tick number, strictly increasing
    pub seq: u64,
    /// When the decision was made
    pub issued_at: DateTime<Utc>,
    /// Staged content or idle rotation
    pub source: RenderSource,
    /// What to paint
    pub content: RenderContent,
    /// Replay the entrance animation. Always set: it signals that a refresh
    /// happened, not that the content changed.
    pub replay_entrance: bool,
}

impl RenderInstruction {
    /// Create an instruction stamped now
    #[must_use]
    pub fn new(seq: u64, source: RenderSource, content: RenderContent) -> Self {
        Self {
            seq,
            issued_at: Utc::now(),
            source,
            content,
            replay_entrance: true,
        }
    }
}

/// Status line severity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotifyLevel {
    /// Informational
    Info,
    /// Something worked
    Success,
    /// Worked partially, or was rejected locally
    Warning,
    /// A gateway call failed
    Error,
}

/// Text shown in the status line
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusLine {
    /// Severity
    pub level: NotifyLevel,
    /// Message
    pub text: String,
}

impl StatusLine {
    /// Build a status line
    pub fn new(level: NotifyLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }

    /// Informational status
    pub fn info(text: impl Into<String>) -> Self {
        Self::new(NotifyLevel::Info, text)
    }

    /// Success status
    pub fn success(text: impl Into<String>) -> Self {
        Self::new(NotifyLevel::Success, text)
    }

    /// Warning status
    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(NotifyLevel::Warning, text)
    }

    /// Error status
    pub fn error(text: impl Into<String>) -> Self {
        Self::new(NotifyLevel::Error, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::ImageRef;
    use url::Url;

    #[test]
    fn test_render_content_from_staged() {
        let base = Url::parse("http://frame.test").unwrap();
        let image = ImageRef::resolve(&base, "/uploads/a.png").unwrap();

        assert_eq!(
            RenderContent::from(StagedContent::Image { image }),
            RenderContent::Image {
                url: "http://frame.test/uploads/a.png".to_string()
            }
        );
        assert_eq!(
            RenderContent::from(StagedContent::Text {
                message: "<b>hi</b>".to_string()
            }),
            RenderContent::Text {
                message: "<b>hi</b>".to_string()
            }
        );
    }

    #[test]
    fn test_instruction_always_replays_entrance() {
        let instruction = RenderInstruction::new(1, RenderSource::Idle, RenderContent::NoIdleArt);
        assert!(instruction.replay_entrance);
        assert_eq!(instruction.seq, 1);
    }

    #[test]
    fn test_message_serializes() {
        let msg = ControllerMessage::Status(StatusLine::success("Text uploaded"));
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("Text uploaded"));
    }
}
