//! Content Gateway Traits
//!
//! Trait and wire types for the remote content gateway. The controller only
//! ever talks to the gateway through [`ContentGateway`], so the HTTP client
//! and the in-process implementation are interchangeable.
//!
//! # Design Philosophy
//!
//! The gateway owns all durable state (staged content, the idle-art set).
//! Implementations hand back transient copies; nothing here caches.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::GatewayError;
use crate::media::UploadFile;

/// An image as the gateway refers to it, plus the URL to fetch it from
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageRef {
    /// Reference exactly as returned by the gateway (usually a relative path)
    pub path: String,
    /// `path` resolved against the gateway's base URL
    pub url: String,
}

impl ImageRef {
    /// Resolve a gateway path under the base URL
    ///
    /// Root-relative paths keep the base's path prefix, so `/static/a.png`
    /// against `https://host/api/` is `https://host/api/static/a.png`.
    /// Absolute and scheme-relative URLs pass through unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidUrl`] if the path cannot be joined.
    pub fn resolve(base: &Url, path: &str) -> Result<Self, GatewayError> {
        let relative = if path.starts_with("//") {
            path
        } else {
            path.strip_prefix('/').unwrap_or(path)
        };
        let url = base.join(relative).map_err(|source| GatewayError::InvalidUrl {
            input: path.to_string(),
            source,
        })?;
        Ok(Self {
            path: path.to_string(),
            url: url.to_string(),
        })
    }

    /// Last path segment, which the gateway uses as the idle-art identifier
    #[must_use]
    pub fn filename(&self) -> &str {
        let path = self.path.split(['?', '#']).next().unwrap_or_default();
        path.rsplit('/').next().unwrap_or(path)
    }
}

/// Kind of staged content
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// Plain text message
    Text,
    /// Uploaded or generated image
    Image,
    /// Weather card
    Weather,
}

/// What the gateway reports as currently active
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StagedContent {
    /// A text message
    Text {
        /// Message body
        message: String,
    },
    /// An image
    Image {
        /// Image to show
        image: ImageRef,
    },
    /// A weather card
    Weather {
        /// Human-readable forecast, if the gateway sent one
        summary: Option<String>,
        /// Rendered weather image, if the gateway sent one
        image: Option<ImageRef>,
    },
}

impl StagedContent {
    /// The kind of this content
    #[must_use]
    pub fn kind(&self) -> ContentKind {
        match self {
            Self::Text { .. } => ContentKind::Text,
            Self::Image { .. } => ContentKind::Image,
            Self::Weather { .. } => ContentKind::Weather,
        }
    }
}

/// Raw `/latest` body
///
/// Every field is optional because "nothing active" arrives as `{}`, `null`
/// or an empty body depending on the gateway build.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct LatestPayload {
    /// `text`, `image` or `weather`
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Text body (text, sometimes weather)
    pub message: Option<String>,
    /// Image path (image, sometimes weather)
    pub image_url: Option<String>,
    /// Weather summary
    pub summary: Option<String>,
}

impl LatestPayload {
    /// Convert into typed content
    ///
    /// Returns `Ok(None)` for a missing or unrecognized `type`, and for an
    /// image record without an image.
    ///
    /// # Errors
    ///
    /// Returns an error if an image path cannot be resolved.
    pub fn into_staged(self, base: &Url) -> Result<Option<StagedContent>, GatewayError> {
        let Some(kind) = self.kind else {
            return Ok(None);
        };

        let staged = match kind.as_str() {
            "text" => Some(StagedContent::Text {
                message: self.message.unwrap_or_default(),
            }),
            "image" => match self.image_url {
                Some(path) => Some(StagedContent::Image {
                    image: ImageRef::resolve(base, &path)?,
                }),
                None => None,
            },
            "weather" => {
                let image = self
                    .image_url
                    .map(|path| ImageRef::resolve(base, &path))
                    .transpose()?;
                Some(StagedContent::Weather {
                    summary: self.summary.or(self.message),
                    image,
                })
            }
            other => {
                tracing::debug!(kind = other, "Ignoring unrecognized staged content type");
                None
            }
        };

        Ok(staged)
    }
}

/// Horizontal alignment for staged text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// Flush left
    Left,
    /// Centered (gateway default)
    #[default]
    Center,
    /// Flush right
    Right,
}

impl Alignment {
    /// Form value sent to the gateway
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Alignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "center" | "centre" => Ok(Self::Center),
            "right" => Ok(Self::Right),
            other => Err(format!("unknown alignment '{other}' (expected left, center or right)")),
        }
    }
}

/// Optional fields for staging text
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextOptions {
    /// Text alignment
    pub alignment: Option<Alignment>,
    /// Layout name understood by the gateway
    pub layout: Option<String>,
    /// Show once, then fall back to idle art
    pub temp_msg: bool,
}

impl TextOptions {
    /// Set alignment
    #[must_use]
    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = Some(alignment);
        self
    }

    /// Set layout
    #[must_use]
    pub fn with_layout(mut self, layout: impl Into<String>) -> Self {
        self.layout = Some(layout.into());
        self
    }

    /// Mark as a temporary message
    #[must_use]
    pub fn temporary(mut self) -> Self {
        self.temp_msg = true;
        self
    }
}

/// A piece of museum art picked by the gateway
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetArt {
    /// Artwork image
    pub image: ImageRef,
    /// Title of the work
    pub title: String,
    /// Artist name
    pub artist: String,
}

/// Content gateway trait
///
/// One method per gateway endpoint. Every call is a single round trip;
/// retries and follow-ups are the caller's business.
#[async_trait]
pub trait ContentGateway: Send + Sync {
    /// Gateway name for logs (e.g. "http", "in-memory")
    fn name(&self) -> &str;

    /// Base URL that relative image paths resolve under
    fn base_url(&self) -> &Url;

    /// `GET /latest`: currently active content, `None` if nothing is active
    async fn latest(&self) -> Result<Option<StagedContent>, GatewayError>;

    /// `GET /idle_art_list`: the idle-art set in gateway order
    async fn idle_art_list(&self) -> Result<Vec<ImageRef>, GatewayError>;

    /// `POST /send_text`: stage a text message
    async fn send_text(&self, text: &str, options: &TextOptions) -> Result<(), GatewayError>;

    /// `POST /send_image`: stage an image
    async fn send_image(&self, file: &UploadFile, temp_msg: bool) -> Result<(), GatewayError>;

    /// `POST /upload_idle_art`: add an image to the idle-art set
    async fn upload_idle_art(&self, file: &UploadFile) -> Result<(), GatewayError>;

    /// `DELETE /idle_art?filename=`: remove an image from the idle-art set
    async fn delete_idle_art(&self, filename: &str) -> Result<(), GatewayError>;

    /// `POST /display`: promote staged content to the physical display
    async fn display(&self) -> Result<(), GatewayError>;

    /// `POST /clear_display`: drop the active content
    async fn clear_display(&self) -> Result<(), GatewayError>;

    /// `POST /request_update`: ask the frame to refresh itself
    async fn request_update(&self) -> Result<(), GatewayError>;

    /// `POST /send_weather`: stage a weather card
    async fn send_weather(&self) -> Result<(), GatewayError>;

    /// `POST /generate_ai_image`: generate and stage an image from a prompt
    async fn generate_ai_image(&self, prompt: &str) -> Result<ImageRef, GatewayError>;

    /// `GET /random_met_art`: pick and stage a random museum piece
    async fn random_met_art(&self) -> Result<MetArt, GatewayError>;
}
