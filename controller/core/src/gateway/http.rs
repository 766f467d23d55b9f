//! HTTP Gateway Implementation
//!
//! [`ContentGateway`] over the gateway's REST API.
//!
//! # Gateway API
//!
//! - `/latest`, `/idle_art_list`, `/random_met_art` - reads (GET)
//! - `/send_text`, `/send_image`, `/upload_idle_art` - multipart staging (POST)
//! - `/display`, `/clear_display`, `/request_update`, `/send_weather` - bare POSTs
//! - `/generate_ai_image` - JSON POST
//! - `/idle_art?filename=` - DELETE
//!
//! No authentication. No client-side timeout unless one is configured.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use url::Url;

use super::traits::{ContentGateway, ImageRef, LatestPayload, MetArt, StagedContent, TextOptions};
use crate::error::GatewayError;
use crate::media::UploadFile;

/// `/idle_art_list` body
#[derive(Debug, Deserialize)]
struct IdleArtList {
    #[serde(default)]
    images: Vec<String>,
}

/// `/generate_ai_image` body
#[derive(Debug, Deserialize)]
struct GeneratedImage {
    image_url: Option<String>,
}

/// `/random_met_art` body
#[derive(Debug, Deserialize)]
struct MetArtPayload {
    #[serde(default)]
    status: Option<String>,
    image_url: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    artist: Option<String>,
}

/// HTTP gateway client
#[derive(Clone)]
pub struct HttpGateway {
    /// Base URL with a trailing slash, e.g. `https://frame.example.com/api/`
    base_url: Url,
    /// HTTP client
    http_client: reqwest::Client,
}

impl HttpGateway {
    /// Create a client with the transport's default timeouts
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` does not parse.
    pub fn new(base_url: &str) -> Result<Self, GatewayError> {
        Self::with_timeout(base_url, None)
    }

    /// Create a client with an optional per-request timeout
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` does not parse or the client cannot be built.
    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> Result<Self, GatewayError> {
        let mut base_url = Url::parse(base_url).map_err(|source| GatewayError::InvalidUrl {
            input: base_url.to_string(),
            source,
        })?;
        // Endpoints are joined relative to the base, so a path prefix must end in '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build().map_err(|source| GatewayError::Transport {
            endpoint: "client",
            source,
        })?;

        Ok(Self {
            base_url,
            http_client,
        })
    }

    /// Build an endpoint URL under the base path
    fn endpoint_url(&self, endpoint: &'static str) -> Result<Url, GatewayError> {
        self.base_url
            .join(endpoint.trim_start_matches('/'))
            .map_err(|source| GatewayError::InvalidUrl {
                input: endpoint.to_string(),
                source,
            })
    }

    /// Send a request and require a success status
    async fn execute(
        &self,
        endpoint: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, GatewayError> {
        let response = request
            .send()
            .await
            .map_err(|source| GatewayError::Transport { endpoint, source })?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(endpoint, status = status.as_u16(), "Gateway returned error status");
            return Err(GatewayError::Status {
                endpoint,
                status: status.as_u16(),
            });
        }

        Ok(response)
    }

    /// POST with no body, success status only
    async fn post_empty(&self, endpoint: &'static str) -> Result<(), GatewayError> {
        let url = self.endpoint_url(endpoint)?;
        self.execute(endpoint, self.http_client.post(url)).await?;
        Ok(())
    }

    /// POST a multipart form, success status only
    async fn post_form(&self, endpoint: &'static str, form: Form) -> Result<(), GatewayError> {
        let url = self.endpoint_url(endpoint)?;
        self.execute(endpoint, self.http_client.post(url).multipart(form))
            .await?;
        Ok(())
    }

    /// Read a JSON body
    async fn json<T: serde::de::DeserializeOwned>(
        endpoint: &'static str,
        response: reqwest::Response,
    ) -> Result<T, GatewayError> {
        let body = response
            .text()
            .await
            .map_err(|source| GatewayError::Transport { endpoint, source })?;
        serde_json::from_str(&body).map_err(|e| GatewayError::Decode {
            endpoint,
            reason: e.to_string(),
        })
    }

    /// Multipart `file` part for an upload
    fn file_part(file: &UploadFile) -> Result<Part, GatewayError> {
        Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.mime)
            .map_err(|source| GatewayError::Transport {
                endpoint: "multipart",
                source,
            })
    }
}

#[async_trait]
impl ContentGateway for HttpGateway {
    fn name(&self) -> &'static str {
        "http"
    }

    fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn latest(&self) -> Result<Option<StagedContent>, GatewayError> {
        const ENDPOINT: &str = "/latest";
        let url = self.endpoint_url(ENDPOINT)?;
        let response = self.execute(ENDPOINT, self.http_client.get(url)).await?;

        let body = response
            .text()
            .await
            .map_err(|source| GatewayError::Transport {
                endpoint: ENDPOINT,
                source,
            })?;
        if body.trim().is_empty() {
            return Ok(None);
        }

        let payload: Option<LatestPayload> =
            serde_json::from_str(&body).map_err(|e| GatewayError::Decode {
                endpoint: ENDPOINT,
                reason: e.to_string(),
            })?;

        match payload {
            Some(payload) => payload.into_staged(&self.base_url),
            None => Ok(None),
        }
    }

    async fn idle_art_list(&self) -> Result<Vec<ImageRef>, GatewayError> {
        const ENDPOINT: &str = "/idle_art_list";
        let url = self.endpoint_url(ENDPOINT)?;
        let response = self.execute(ENDPOINT, self.http_client.get(url)).await?;
        let list: IdleArtList = Self::json(ENDPOINT, response).await?;

        list.images
            .iter()
            .map(|path| ImageRef::resolve(&self.base_url, path))
            .collect()
    }

    async fn send_text(&self, text: &str, options: &TextOptions) -> Result<(), GatewayError> {
        let mut form = Form::new().text("text", text.to_string());
        if let Some(alignment) = options.alignment {
            form = form.text("alignment", alignment.as_str());
        }
        if let Some(ref layout) = options.layout {
            form = form.text("layout", layout.clone());
        }
        if options.temp_msg {
            form = form.text("temp_msg", "true");
        }
        self.post_form("/send_text", form).await
    }

    async fn send_image(&self, file: &UploadFile, temp_msg: bool) -> Result<(), GatewayError> {
        let mut form = Form::new().part("file", Self::file_part(file)?);
        if temp_msg {
            form = form.text("temp_msg", "true");
        }
        self.post_form("/send_image", form).await
    }

    async fn upload_idle_art(&self, file: &UploadFile) -> Result<(), GatewayError> {
        let form = Form::new().part("file", Self::file_part(file)?);
        self.post_form("/upload_idle_art", form).await
    }

    async fn delete_idle_art(&self, filename: &str) -> Result<(), GatewayError> {
        const ENDPOINT: &str = "/idle_art";
        let mut url = self.endpoint_url(ENDPOINT)?;
        url.query_pairs_mut().append_pair("filename", filename);
        self.execute(ENDPOINT, self.http_client.delete(url)).await?;
        Ok(())
    }

    async fn display(&self) -> Result<(), GatewayError> {
        self.post_empty("/display").await
    }

    async fn clear_display(&self) -> Result<(), GatewayError> {
        self.post_empty("/clear_display").await
    }

    async fn request_update(&self) -> Result<(), GatewayError> {
        self.post_empty("/request_update").await
    }

    async fn send_weather(&self) -> Result<(), GatewayError> {
        self.post_empty("/send_weather").await
    }

    async fn generate_ai_image(&self, prompt: &str) -> Result<ImageRef, GatewayError> {
        const ENDPOINT: &str = "/generate_ai_image";
        let url = self.endpoint_url(ENDPOINT)?;
        let request = self
            .http_client
            .post(url)
            .json(&serde_json::json!({ "prompt": prompt }));
        let response = self.execute(ENDPOINT, request).await?;
        let generated: GeneratedImage = Self::json(ENDPOINT, response).await?;

        let path = generated.image_url.ok_or_else(|| GatewayError::Decode {
            endpoint: ENDPOINT,
            reason: "missing image_url".to_string(),
        })?;
        ImageRef::resolve(&self.base_url, &path)
    }

    async fn random_met_art(&self) -> Result<MetArt, GatewayError> {
        const ENDPOINT: &str = "/random_met_art";
        let url = self.endpoint_url(ENDPOINT)?;
        let response = self.execute(ENDPOINT, self.http_client.get(url)).await?;
        let payload: MetArtPayload = Self::json(ENDPOINT, response).await?;

        if let Some(ref status) = payload.status {
            if !matches!(status.as_str(), "ok" | "success") {
                return Err(GatewayError::Decode {
                    endpoint: ENDPOINT,
                    reason: format!("status '{status}'"),
                });
            }
        }

        let path = payload.image_url.ok_or_else(|| GatewayError::Decode {
            endpoint: ENDPOINT,
            reason: "missing image_url".to_string(),
        })?;

        Ok(MetArt {
            image: ImageRef::resolve(&self.base_url, &path)?,
            title: payload.title.unwrap_or_else(|| "Untitled".to_string()),
            artist: payload.artist.unwrap_or_else(|| "Unknown artist".to_string()),
        })
    }
}
