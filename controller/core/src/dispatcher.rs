//! Action Dispatcher
//!
//! Runs operator actions against the gateway. Each action is one round trip
//! followed by a fixed follow-up:
//!
//! | Action            | Follow-up on success                  |
//! |-------------------|---------------------------------------|
//! | stage text/image  | clear the input                       |
//! | upload idle art   | clear the input, refresh idle art     |
//! | display, clear    | re-poll immediately                   |
//! | delete idle art   | refresh idle art                      |
//!
//! Preconditions are checked before anything is sent. Failures never
//! propagate past [`ActionDispatcher::dispatch`]: they become status lines.
//! There is no retry; the operator tries again.

use crate::error::{ActionError, PreconditionFailure};
use crate::events::Action;
use crate::gateway::{ContentGateway, TextOptions};
use crate::media::{crop_to_aspect, AspectRatio, UploadFile};
use crate::messages::{ControllerMessage, InputField, StatusLine};

/// What the controller must do after an action succeeds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FollowUp {
    /// Nothing
    None,
    /// Run a reconciler tick now
    Repoll,
    /// Refetch idle art, then re-render the gallery
    RefreshIdleArt,
}

/// Result of a dispatched action, successful or not
#[derive(Clone, Debug)]
pub struct ActionReport {
    /// Status line to show; `None` leaves the status line alone
    pub status: Option<StatusLine>,
    /// Follow-up work for the controller
    pub follow_up: FollowUp,
    /// Input to clear
    pub clear_input: Option<InputField>,
    /// Extra message for the surface (generated image, museum art)
    pub message: Option<ControllerMessage>,
    succeeded: bool,
}

impl ActionReport {
    fn success(status: StatusLine) -> Self {
        Self {
            status: Some(status),
            follow_up: FollowUp::None,
            clear_input: None,
            message: None,
            succeeded: true,
        }
    }

    fn failure(status: Option<StatusLine>) -> Self {
        Self {
            status,
            follow_up: FollowUp::None,
            clear_input: None,
            message: None,
            succeeded: false,
        }
    }

    fn then(mut self, follow_up: FollowUp) -> Self {
        self.follow_up = follow_up;
        self
    }

    fn clearing(mut self, field: InputField) -> Self {
        self.clear_input = Some(field);
        self
    }

    fn with_message(mut self, message: ControllerMessage) -> Self {
        self.message = Some(message);
        self
    }

    /// Whether the action went through
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.succeeded
    }
}

/// Action dispatcher
#[derive(Clone, Debug, Default)]
pub struct ActionDispatcher {
    /// Crop applied to staged photos when the action does not name one
    default_crop: Option<AspectRatio>,
}

impl ActionDispatcher {
    /// Create a dispatcher
    #[must_use]
    pub fn new(default_crop: Option<AspectRatio>) -> Self {
        Self { default_crop }
    }

    /// Run an action and turn the result into a report
    pub async fn dispatch<G>(&self, gateway: &G, action: Action) -> ActionReport
    where
        G: ContentGateway + ?Sized,
    {
        let name = action.name();
        tracing::debug!(action = name, "Dispatching action");

        match action {
            Action::StageText { text, options } => {
                let result = self.stage_text(gateway, &text, &options).await;
                Self::report(name, result, "Failed to upload", |()| {
                    ActionReport::success(StatusLine::success("Text uploaded"))
                        .clearing(InputField::Text)
                })
            }
            Action::StageImage {
                file,
                temp_msg,
                crop,
            } => {
                let result = self
                    .stage_image(gateway, file.as_ref(), temp_msg, crop)
                    .await;
                Self::report(name, result, "Failed to upload", |()| {
                    ActionReport::success(StatusLine::success("Image uploaded"))
                        .clearing(InputField::Image)
                })
            }
            Action::UploadIdleArt { file } => {
                let result = self.upload_idle_art(gateway, file.as_ref()).await;
                Self::report(name, result, "Failed to upload", |()| {
                    ActionReport::success(StatusLine::success("Idle art uploaded"))
                        .clearing(InputField::IdleArt)
                        .then(FollowUp::RefreshIdleArt)
                })
            }
            Action::Display => {
                let result = self.display(gateway).await;
                Self::report(name, result, "No message to display", |()| {
                    ActionReport::success(StatusLine::success("Message now displayed"))
                        .then(FollowUp::Repoll)
                })
            }
            Action::Clear => match self.clear(gateway).await {
                Ok(()) => ActionReport::success(StatusLine::success("Display cleared"))
                    .then(FollowUp::Repoll),
                Err(e) => {
                    tracing::warn!(action = name, error = %e, "Clear failed");
                    ActionReport::failure(None)
                }
            },
            Action::DeleteIdleArt {
                filename,
                confirmed,
            } => {
                let result = self.confirm_and_delete(gateway, &filename, confirmed).await;
                Self::report(name, result, "Failed to delete", |()| {
                    ActionReport::success(StatusLine::success(format!("{filename} deleted")))
                        .then(FollowUp::RefreshIdleArt)
                })
            }
            Action::RequestUpdate => {
                let result = self.request_update(gateway).await;
                Self::report(name, result, "Failed to request update", |()| {
                    ActionReport::success(StatusLine::info(
                        "Update requested. The frame will refresh shortly",
                    ))
                })
            }
            Action::SendWeather => {
                let result = self.send_weather(gateway).await;
                Self::report(name, result, "Failed to send weather", |()| {
                    ActionReport::success(StatusLine::success("Weather staged"))
                })
            }
            Action::GenerateAiImage { prompt } => {
                let result = self.generate_ai_image(gateway, &prompt).await;
                Self::report(name, result, "Failed to generate image", |url| {
                    ActionReport::success(StatusLine::success("AI image generated"))
                        .clearing(InputField::Prompt)
                        .with_message(ControllerMessage::GeneratedImage { url })
                })
            }
            Action::RandomMetArt => {
                let result = gateway.random_met_art().await.map_err(ActionError::from);
                Self::report(name, result, "Failed to fetch museum art", |art| {
                    ActionReport::success(StatusLine::success(format!(
                        "Staged \"{}\" by {}",
                        art.title, art.artist
                    )))
                    .with_message(ControllerMessage::MetArt(art))
                })
            }
        }
    }

    /// Stage trimmed, non-empty text
    ///
    /// # Errors
    ///
    /// [`PreconditionFailure::EmptyText`] before any request, or the gateway error.
    pub async fn stage_text<G>(
        &self,
        gateway: &G,
        text: &str,
        options: &TextOptions,
    ) -> Result<(), ActionError>
    where
        G: ContentGateway + ?Sized,
    {
        let text = text.trim();
        if text.is_empty() {
            return Err(PreconditionFailure::EmptyText.into());
        }
        gateway.send_text(text, options).await?;
        Ok(())
    }

    /// Stage a photo, center-cropped if a ratio applies
    ///
    /// # Errors
    ///
    /// [`PreconditionFailure::NoFileSelected`] before any request, a crop
    /// failure, or the gateway error.
    pub async fn stage_image<G>(
        &self,
        gateway: &G,
        file: Option<&UploadFile>,
        temp_msg: bool,
        crop: Option<AspectRatio>,
    ) -> Result<(), ActionError>
    where
        G: ContentGateway + ?Sized,
    {
        let file = Self::selected(file)?;
        match crop.or(self.default_crop) {
            Some(aspect) => {
                let cropped = crop_to_aspect(file, aspect)?;
                gateway.send_image(&cropped, temp_msg).await?;
            }
            None => gateway.send_image(file, temp_msg).await?,
        }
        Ok(())
    }

    /// Upload a new idle-art image
    ///
    /// # Errors
    ///
    /// [`PreconditionFailure::NoFileSelected`] before any request, or the gateway error.
    pub async fn upload_idle_art<G>(
        &self,
        gateway: &G,
        file: Option<&UploadFile>,
    ) -> Result<(), ActionError>
    where
        G: ContentGateway + ?Sized,
    {
        let file = Self::selected(file)?;
        gateway.upload_idle_art(file).await?;
        Ok(())
    }

    /// Promote staged content
    ///
    /// # Errors
    ///
    /// The gateway error, including "nothing staged".
    pub async fn display<G>(&self, gateway: &G) -> Result<(), ActionError>
    where
        G: ContentGateway + ?Sized,
    {
        gateway.display().await?;
        Ok(())
    }

    /// Clear the frame
    ///
    /// # Errors
    ///
    /// The gateway error.
    pub async fn clear<G>(&self, gateway: &G) -> Result<(), ActionError>
    where
        G: ContentGateway + ?Sized,
    {
        gateway.clear_display().await?;
        Ok(())
    }

    /// Delete an idle-art image once the operator has confirmed
    ///
    /// The surface binds this to its delete control; the confirmation
    /// dialog itself is the surface's job.
    ///
    /// # Errors
    ///
    /// [`PreconditionFailure::NoFilename`] or [`PreconditionFailure::NotConfirmed`]
    /// before any request, or the gateway error.
    pub async fn confirm_and_delete<G>(
        &self,
        gateway: &G,
        filename: &str,
        confirmed: bool,
    ) -> Result<(), ActionError>
    where
        G: ContentGateway + ?Sized,
    {
        let filename = filename.trim();
        if filename.is_empty() {
            return Err(PreconditionFailure::NoFilename.into());
        }
        if !confirmed {
            return Err(PreconditionFailure::NotConfirmed.into());
        }
        gateway.delete_idle_art(filename).await?;
        Ok(())
    }

    /// Ask the frame to refresh
    ///
    /// # Errors
    ///
    /// The gateway error.
    pub async fn request_update<G>(&self, gateway: &G) -> Result<(), ActionError>
    where
        G: ContentGateway + ?Sized,
    {
        gateway.request_update().await?;
        Ok(())
    }

    /// Stage a weather card
    ///
    /// # Errors
    ///
    /// The gateway error.
    pub async fn send_weather<G>(&self, gateway: &G) -> Result<(), ActionError>
    where
        G: ContentGateway + ?Sized,
    {
        gateway.send_weather().await?;
        Ok(())
    }

    /// Generate an image from a non-empty prompt; returns its URL
    ///
    /// # Errors
    ///
    /// [`PreconditionFailure::EmptyPrompt`] before any request, or the gateway error.
    pub async fn generate_ai_image<G>(&self, gateway: &G, prompt: &str) -> Result<String, ActionError>
    where
        G: ContentGateway + ?Sized,
    {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(PreconditionFailure::EmptyPrompt.into());
        }
        let image = gateway.generate_ai_image(prompt).await?;
        Ok(image.url)
    }

    fn selected(file: Option<&UploadFile>) -> Result<&UploadFile, PreconditionFailure> {
        match file {
            Some(file) if !file.is_empty() => Ok(file),
            _ => Err(PreconditionFailure::NoFileSelected),
        }
    }

    /// Map an action result to a report
    ///
    /// Precondition failures show their own wording as a warning; gateway
    /// failures show `failure_text` as an error.
    fn report<T>(
        name: &'static str,
        result: Result<T, ActionError>,
        failure_text: &str,
        on_success: impl FnOnce(T) -> ActionReport,
    ) -> ActionReport {
        match result {
            Ok(value) => {
                tracing::info!(action = name, "Action succeeded");
                on_success(value)
            }
            Err(ActionError::Precondition(reason)) => {
                tracing::debug!(action = name, reason = %reason, "Action rejected locally");
                ActionReport::failure(Some(StatusLine::warning(reason.to_string())))
            }
            Err(ActionError::Gateway(e)) => {
                tracing::warn!(action = name, error = %e, "Action failed");
                ActionReport::failure(Some(StatusLine::error(failure_text)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{InMemoryGateway, StagedContent};
    use crate::messages::NotifyLevel;

    fn png() -> UploadFile {
        use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba};
        let img = ImageBuffer::from_pixel(80, 20, Rgba([0u8, 0, 0, 255]));
        let mut out = std::io::Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        UploadFile::new("banner.png", out.into_inner())
    }

    #[tokio::test]
    async fn test_empty_text_never_reaches_gateway() {
        let gateway = InMemoryGateway::new();
        gateway.set_offline(true);
        let dispatcher = ActionDispatcher::default();

        let err = dispatcher
            .stage_text(&gateway, "   \n ", &TextOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ActionError::Precondition(PreconditionFailure::EmptyText)
        ));
    }

    #[tokio::test]
    async fn test_stage_text_trims_and_clears_input() {
        let gateway = InMemoryGateway::new();
        let dispatcher = ActionDispatcher::default();

        let report = dispatcher
            .dispatch(
                &gateway,
                Action::StageText {
                    text: "  Happy Birthday \n".to_string(),
                    options: TextOptions::default(),
                },
            )
            .await;

        assert_eq!(report.clear_input, Some(InputField::Text));
        assert_eq!(report.status, Some(StatusLine::success("Text uploaded")));
        assert!(report.succeeded());
        assert_eq!(
            gateway.staged(),
            Some(StagedContent::Text {
                message: "Happy Birthday".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_failed_upload_keeps_input() {
        let gateway = InMemoryGateway::new();
        gateway.fail_endpoint("/send_text");
        let dispatcher = ActionDispatcher::default();

        let report = dispatcher
            .dispatch(
                &gateway,
                Action::StageText {
                    text: "hello".to_string(),
                    options: TextOptions::default(),
                },
            )
            .await;

        assert_eq!(report.clear_input, None);
        assert_eq!(report.status, Some(StatusLine::error("Failed to upload")));
        assert!(!report.succeeded());
    }

    #[tokio::test]
    async fn test_missing_file_is_precondition() {
        let gateway = InMemoryGateway::new();
        let dispatcher = ActionDispatcher::default();

        let report = dispatcher
            .dispatch(&gateway, Action::UploadIdleArt { file: None })
            .await;
        let status = report.status.unwrap();
        assert_eq!(status.level, NotifyLevel::Warning);
        assert_eq!(status.text, "Choose an image");
        assert_eq!(report.follow_up, FollowUp::None);
    }

    #[tokio::test]
    async fn test_upload_idle_art_refreshes() {
        let gateway = InMemoryGateway::new();
        let dispatcher = ActionDispatcher::default();

        let report = dispatcher
            .dispatch(
                &gateway,
                Action::UploadIdleArt {
                    file: Some(UploadFile::new("new.png", vec![1, 2, 3])),
                },
            )
            .await;
        assert_eq!(report.follow_up, FollowUp::RefreshIdleArt);
        assert_eq!(report.clear_input, Some(InputField::IdleArt));
    }

    #[tokio::test]
    async fn test_display_nothing_staged() {
        let gateway = InMemoryGateway::new();
        let dispatcher = ActionDispatcher::default();

        let report = dispatcher.dispatch(&gateway, Action::Display).await;
        assert_eq!(report.status, Some(StatusLine::error("No message to display")));
        assert_eq!(report.follow_up, FollowUp::None);
    }

    #[tokio::test]
    async fn test_display_and_clear_repoll() {
        let gateway = InMemoryGateway::new();
        let dispatcher = ActionDispatcher::default();
        dispatcher
            .stage_text(&gateway, "hi", &TextOptions::default())
            .await
            .unwrap();

        let report = dispatcher.dispatch(&gateway, Action::Display).await;
        assert_eq!(report.follow_up, FollowUp::Repoll);

        let report = dispatcher.dispatch(&gateway, Action::Clear).await;
        assert_eq!(report.follow_up, FollowUp::Repoll);
    }

    #[tokio::test]
    async fn test_clear_failure_is_silent() {
        let gateway = InMemoryGateway::new();
        gateway.fail_endpoint("/clear_display");
        let dispatcher = ActionDispatcher::default();

        let report = dispatcher.dispatch(&gateway, Action::Clear).await;
        assert!(report.status.is_none());
        assert_eq!(report.follow_up, FollowUp::None);
        assert!(!report.succeeded());
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let gateway = InMemoryGateway::new();
        gateway.seed_idle_art(["keep.png"]);
        let dispatcher = ActionDispatcher::default();

        let err = dispatcher
            .confirm_and_delete(&gateway, "keep.png", false)
            .await
            .unwrap_err();
        assert!(err.is_precondition());
        assert_eq!(gateway.idle_art_filenames(), vec!["keep.png".to_string()]);

        dispatcher
            .confirm_and_delete(&gateway, "keep.png", true)
            .await
            .unwrap();
        assert!(gateway.idle_art_filenames().is_empty());
    }

    #[tokio::test]
    async fn test_delete_report() {
        let gateway = InMemoryGateway::new();
        gateway.seed_idle_art(["old.png"]);
        let dispatcher = ActionDispatcher::default();

        let report = dispatcher
            .dispatch(
                &gateway,
                Action::DeleteIdleArt {
                    filename: "old.png".to_string(),
                    confirmed: true,
                },
            )
            .await;
        assert_eq!(report.status, Some(StatusLine::success("old.png deleted")));
        assert_eq!(report.follow_up, FollowUp::RefreshIdleArt);

        let report = dispatcher
            .dispatch(
                &gateway,
                Action::DeleteIdleArt {
                    filename: "old.png".to_string(),
                    confirmed: true,
                },
            )
            .await;
        assert_eq!(report.status, Some(StatusLine::error("Failed to delete")));
    }

    #[tokio::test]
    async fn test_request_update_pending_status() {
        let gateway = InMemoryGateway::new();
        let dispatcher = ActionDispatcher::default();

        let report = dispatcher.dispatch(&gateway, Action::RequestUpdate).await;
        assert_eq!(report.status.unwrap().level, NotifyLevel::Info);
        assert_eq!(gateway.update_requests(), 1);
    }

    #[tokio::test]
    async fn test_stage_image_applies_default_crop() {
        let gateway = InMemoryGateway::new();
        let dispatcher = ActionDispatcher::new(AspectRatio::new(1, 1));

        dispatcher
            .stage_image(&gateway, Some(&png()), false, None)
            .await
            .unwrap();
        assert!(matches!(gateway.staged(), Some(StagedContent::Image { .. })));
    }

    #[tokio::test]
    async fn test_generate_ai_image() {
        let gateway = InMemoryGateway::new();
        let dispatcher = ActionDispatcher::default();

        let report = dispatcher
            .dispatch(
                &gateway,
                Action::GenerateAiImage {
                    prompt: "a lighthouse at dusk".to_string(),
                },
            )
            .await;
        assert!(matches!(
            report.message,
            Some(ControllerMessage::GeneratedImage { .. })
        ));

        let report = dispatcher
            .dispatch(
                &gateway,
                Action::GenerateAiImage {
                    prompt: " ".to_string(),
                },
            )
            .await;
        assert_eq!(report.status.unwrap().level, NotifyLevel::Warning);
    }

    #[tokio::test]
    async fn test_random_met_art() {
        let gateway = InMemoryGateway::new();
        let dispatcher = ActionDispatcher::default();

        let report = dispatcher.dispatch(&gateway, Action::RandomMetArt).await;
        assert_eq!(
            report.status.unwrap().text,
            "Staged \"Wheat Field with Cypresses\" by Vincent van Gogh"
        );
        assert!(matches!(report.message, Some(ControllerMessage::MetArt(_))));
    }
}
