//! In-Memory Gateway
//!
//! A [`ContentGateway`] that keeps the gateway's state in process. Used by
//! tests and by `inkframe watch --offline`.
//!
//! It follows the remote gateway's observable behavior: staging replaces the
//! staged record, `display` promotes it (and fails with 404 when nothing is
//! staged), `clear_display` drops the active record, and idle art is unique
//! by filename in upload order.
//!
//! # Usage
//!
//! ```ignore
//! let gateway = InMemoryGateway::new();
//! gateway.seed_idle_art(["sunset.png", "harbor.png"]);
//!
//! // Simulate an outage of one endpoint
//! gateway.fail_endpoint("/idle_art_list");
//! ```

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use url::Url;

use super::traits::{ContentGateway, ImageRef, MetArt, StagedContent, TextOptions};
use crate::error::GatewayError;
use crate::media::UploadFile;

/// Base origin used for resolved image URLs
pub const IN_MEMORY_BASE_URL: &str = "http://inkframe.local/";

/// Path prefix for idle art
const IDLE_ART_PREFIX: &str = "/static/idle_art/";

#[derive(Default)]
struct GatewayState {
    /// Staged but not yet displayed
    staged: Option<StagedContent>,
    /// What `/latest` reports
    active: Option<StagedContent>,
    /// Idle-art paths in upload order
    idle_art: Vec<String>,
    /// Endpoints that currently fail with 503
    failing: HashSet<String>,
    /// Every endpoint fails with a transport-like error
    offline: bool,
    /// Counter for generated image names
    generated: u64,
}

/// In-process gateway
#[derive(Clone)]
pub struct InMemoryGateway {
    base_url: Url,
    state: Arc<Mutex<GatewayState>>,
    latest_calls: Arc<AtomicU64>,
    update_requests: Arc<AtomicU64>,
}

impl InMemoryGateway {
    /// Create an empty gateway
    ///
    /// # Panics
    ///
    /// Never: the base URL is a valid constant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_url: Url::parse(IN_MEMORY_BASE_URL).expect("constant base URL is valid"),
            state: Arc::new(Mutex::new(GatewayState::default())),
            latest_calls: Arc::new(AtomicU64::new(0)),
            update_requests: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Add idle art by filename
    pub fn seed_idle_art<I, S>(&self, filenames: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut state = self.state.lock();
        for name in filenames {
            let path = format!("{IDLE_ART_PREFIX}{}", name.as_ref());
            if !state.idle_art.contains(&path) {
                state.idle_art.push(path);
            }
        }
    }

    /// Make an endpoint answer 503 until [`Self::recover_endpoint`]
    pub fn fail_endpoint(&self, endpoint: &str) {
        self.state.lock().failing.insert(endpoint.to_string());
    }

    /// Undo [`Self::fail_endpoint`]
    pub fn recover_endpoint(&self, endpoint: &str) {
        self.state.lock().failing.remove(endpoint);
    }

    /// Make every endpoint fail
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().offline = offline;
    }

    /// Currently active content
    #[must_use]
    pub fn active(&self) -> Option<StagedContent> {
        self.state.lock().active.clone()
    }

    /// Currently staged content
    #[must_use]
    pub fn staged(&self) -> Option<StagedContent> {
        self.state.lock().staged.clone()
    }

    /// Idle-art filenames in gateway order
    #[must_use]
    pub fn idle_art_filenames(&self) -> Vec<String> {
        self.state
            .lock()
            .idle_art
            .iter()
            .map(|p| p.trim_start_matches(IDLE_ART_PREFIX).to_string())
            .collect()
    }

    /// Number of `/latest` queries served (including failed ones)
    #[must_use]
    pub fn latest_calls(&self) -> u64 {
        self.latest_calls.load(Ordering::SeqCst)
    }

    /// Number of successful `/request_update` calls
    #[must_use]
    pub fn update_requests(&self) -> u64 {
        self.update_requests.load(Ordering::SeqCst)
    }

    /// Fail if the endpoint is marked failing or the gateway is offline
    fn check(&self, endpoint: &'static str) -> Result<(), GatewayError> {
        let state = self.state.lock();
        if state.offline || state.failing.contains(endpoint) {
            return Err(GatewayError::Status {
                endpoint,
                status: 503,
            });
        }
        Ok(())
    }

    fn image(&self, path: &str) -> Result<ImageRef, GatewayError> {
        ImageRef::resolve(&self.base_url, path)
    }

    fn require_file(endpoint: &'static str, file: &UploadFile) -> Result<(), GatewayError> {
        if file.is_empty() || file.file_name.is_empty() {
            return Err(GatewayError::Status {
                endpoint,
                status: 400,
            });
        }
        Ok(())
    }
}

impl Default for InMemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentGateway for InMemoryGateway {
    fn name(&self) -> &'static str {
        "in-memory"
    }

    fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn latest(&self) -> Result<Option<StagedContent>, GatewayError> {
        self.latest_calls.fetch_add(1, Ordering::SeqCst);
        self.check("/latest")?;
        Ok(self.state.lock().active.clone())
    }

    async fn idle_art_list(&self) -> Result<Vec<ImageRef>, GatewayError> {
        self.check("/idle_art_list")?;
        let paths = self.state.lock().idle_art.clone();
        paths.iter().map(|p| self.image(p)).collect()
    }

    async fn send_text(&self, text: &str, _options: &TextOptions) -> Result<(), GatewayError> {
        self.check("/send_text")?;
        if text.trim().is_empty() {
            return Err(GatewayError::Status {
                endpoint: "/send_text",
                status: 400,
            });
        }
        self.state.lock().staged = Some(StagedContent::Text {
            message: text.to_string(),
        });
        Ok(())
    }

    async fn send_image(&self, file: &UploadFile, _temp_msg: bool) -> Result<(), GatewayError> {
        self.check("/send_image")?;
        Self::require_file("/send_image", file)?;
        let image = self.image(&format!("/uploads/{}", file.file_name))?;
        self.state.lock().staged = Some(StagedContent::Image { image });
        Ok(())
    }

    async fn upload_idle_art(&self, file: &UploadFile) -> Result<(), GatewayError> {
        self.check("/upload_idle_art")?;
        Self::require_file("/upload_idle_art", file)?;
        self.seed_idle_art([file.file_name.as_str()]);
        Ok(())
    }

    async fn delete_idle_art(&self, filename: &str) -> Result<(), GatewayError> {
        self.check("/idle_art")?;
        let path = format!("{IDLE_ART_PREFIX}{filename}");
        let mut state = self.state.lock();
        let before = state.idle_art.len();
        state.idle_art.retain(|p| p != &path);
        if state.idle_art.len() == before {
            return Err(GatewayError::Status {
                endpoint: "/idle_art",
                status: 404,
            });
        }
        Ok(())
    }

    async fn display(&self) -> Result<(), GatewayError> {
        self.check("/display")?;
        let mut state = self.state.lock();
        match state.staged.take() {
            Some(content) => {
                state.active = Some(content);
                Ok(())
            }
            None => Err(GatewayError::Status {
                endpoint: "/display",
                status: 404,
            }),
        }
    }

    async fn clear_display(&self) -> Result<(), GatewayError> {
        self.check("/clear_display")?;
        self.state.lock().active = None;
        Ok(())
    }

    async fn request_update(&self) -> Result<(), GatewayError> {
        self.check("/request_update")?;
        self.update_requests.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn send_weather(&self) -> Result<(), GatewayError> {
        self.check("/send_weather")?;
        self.state.lock().staged = Some(StagedContent::Weather {
            summary: Some("Clear skies, 18°C".to_string()),
            image: None,
        });
        Ok(())
    }

    async fn generate_ai_image(&self, prompt: &str) -> Result<ImageRef, GatewayError> {
        self.check("/generate_ai_image")?;
        if prompt.trim().is_empty() {
            return Err(GatewayError::Status {
                endpoint: "/generate_ai_image",
                status: 400,
            });
        }
        let mut state = self.state.lock();
        state.generated += 1;
        let image = self.image(&format!("/generated/ai-{}.png", state.generated))?;
        state.staged = Some(StagedContent::Image {
            image: image.clone(),
        });
        Ok(image)
    }

    async fn random_met_art(&self) -> Result<MetArt, GatewayError> {
        self.check("/random_met_art")?;
        let art = MetArt {
            image: self.image("/met/wheat-field-with-cypresses.jpg")?,
            title: "Wheat Field with Cypresses".to_string(),
            artist: "Vincent van Gogh".to_string(),
        };
        self.state.lock().staged = Some(StagedContent::Image {
            image: art.image.clone(),
        });
        Ok(art)
    }
}
