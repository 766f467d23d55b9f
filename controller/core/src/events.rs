//! Control Events
//!
//! Events sent from a surface to the controller. A surface reports what the
//! operator asked for; the controller decides what that means for the
//! gateway, the idle-art cache and the preview.

use crate::gateway::TextOptions;
use crate::media::{AspectRatio, UploadFile};

/// Operator actions that mutate gateway state
#[derive(Clone, Debug)]
pub enum Action {
    /// Stage a text message
    StageText {
        /// Raw text from the input (trimmed before sending)
        text: String,
        /// Alignment, layout, temporary flag
        options: TextOptions,
    },

    /// Stage a photo
    StageImage {
        /// Selected file, `None` if nothing was chosen
        file: Option<UploadFile>,
        /// Show once, then fall back to idle art
        temp_msg: bool,
        /// Center-crop to this ratio before upload (overrides the configured default)
        crop: Option<AspectRatio>,
    },

    /// Add an image to the idle-art set
    UploadIdleArt {
        /// Selected file, `None` if nothing was chosen
        file: Option<UploadFile>,
    },

    /// Promote staged content to the frame
    Display,

    /// Clear the frame
    Clear,

    /// Delete one idle-art image
    DeleteIdleArt {
        /// Gallery filename
        filename: String,
        /// Whether the operator confirmed
        confirmed: bool,
    },

    /// Ask the frame to refresh itself
    RequestUpdate,

    /// Stage a weather card
    SendWeather,

    /// Generate and stage an image from a prompt
    GenerateAiImage {
        /// Prompt text
        prompt: String,
    },

    /// Stage a random museum piece
    RandomMetArt,
}

impl Action {
    /// Short name for logs
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::StageText { .. } => "stage_text",
            Self::StageImage { .. } => "stage_image",
            Self::UploadIdleArt { .. } => "upload_idle_art",
            Self::Display => "display",
            Self::Clear => "clear",
            Self::DeleteIdleArt { .. } => "delete_idle_art",
            Self::RequestUpdate => "request_update",
            Self::SendWeather => "send_weather",
            Self::GenerateAiImage { .. } => "generate_ai_image",
            Self::RandomMetArt => "random_met_art",
        }
    }
}

/// Events from surface to controller
#[derive(Clone, Debug)]
pub enum ControlEvent {
    /// Run an operator action
    Action(Action),
    /// Run a reconciler tick now
    PollNow,
    /// Refetch idle art and re-render the gallery
    RefreshIdleArt,
    /// Stop the poll loop
    Shutdown,
}

impl From<Action> for ControlEvent {
    fn from(action: Action) -> Self {
        Self::Action(action)
    }
}
