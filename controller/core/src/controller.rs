//! Controller - Display Orchestration
//!
//! The controller owns everything that has client-side state:
//! - the gateway handle
//! - the idle-art cache and its rotation cursor
//! - the display reconciler
//! - the action dispatcher
//!
//! It talks to a surface through two channels' worth of types:
//! - [`ControlEvent`]: what the operator asked for (in)
//! - [`ControllerMessage`]: what to render (out)
//!
//! A single owner means no locking: ticks and actions run one at a time, in
//! the order they are handled.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::dispatcher::{ActionDispatcher, ActionReport, FollowUp};
use crate::events::{Action, ControlEvent};
use crate::gateway::ContentGateway;
use crate::idle_art::{IdleArtCache, RefreshOutcome};
use crate::media::AspectRatio;
use crate::messages::{ControllerMessage, RenderInstruction, StatusLine};
use crate::reconciler::{DisplayReconciler, ReconcilerState};

/// Default reconciler tick interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Controller configuration
#[derive(Clone, Debug)]
pub struct ControllerConfig {
    /// Time between reconciler ticks
    pub poll_interval: Duration,
    /// Crop applied to staged photos by default
    pub crop_aspect: Option<AspectRatio>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            crop_aspect: None,
        }
    }
}

/// The controller - headless display orchestration
pub struct Controller<G: ContentGateway> {
    /// Configuration
    config: ControllerConfig,
    /// Remote gateway
    gateway: Arc<G>,
    /// Idle-art set and cursor
    cache: IdleArtCache,
    /// Staged-vs-idle decision
    reconciler: DisplayReconciler,
    /// Operator actions
    dispatcher: ActionDispatcher,
    /// Channel to the surface
    tx: mpsc::Sender<ControllerMessage>,
}

impl<G: ContentGateway + 'static> Controller<G> {
    /// Create a controller over `gateway`
    pub fn new(gateway: G, config: ControllerConfig, tx: mpsc::Sender<ControllerMessage>) -> Self {
        Self::with_shared_gateway(Arc::new(gateway), config, tx)
    }

    /// Create a controller over a gateway shared with someone else
    pub fn with_shared_gateway(
        gateway: Arc<G>,
        config: ControllerConfig,
        tx: mpsc::Sender<ControllerMessage>,
    ) -> Self {
        let dispatcher = ActionDispatcher::new(config.crop_aspect);
        Self {
            config,
            gateway,
            cache: IdleArtCache::new(),
            reconciler: DisplayReconciler::new(),
            dispatcher,
            tx,
        }
    }

    /// Configuration
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Gateway handle
    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    /// Idle-art cache
    pub fn cache(&self) -> &IdleArtCache {
        &self.cache
    }

    /// Reconciler state after the last tick
    pub fn display_state(&self) -> ReconcilerState {
        self.reconciler.state()
    }

    /// Load idle art, show the gallery, and run the first tick
    pub async fn start(&mut self) {
        tracing::info!(
            gateway = self.gateway.name(),
            base_url = %self.gateway.base_url(),
            poll_interval_secs = self.config.poll_interval.as_secs(),
            "Starting controller"
        );
        self.refresh_idle_art().await;
        self.tick().await;
    }

    /// Run one reconciler tick and send the result to the surface
    pub async fn tick(&mut self) -> RenderInstruction {
        let instruction = self
            .reconciler
            .tick(self.gateway.as_ref(), &mut self.cache)
            .await;
        self.send(ControllerMessage::Render(instruction.clone()))
            .await;
        instruction
    }

    /// Refetch idle art, then re-render the gallery
    ///
    /// The gallery message goes out only after the refresh has finished, so
    /// the surface never sees a half-updated set. If the fetch fails the
    /// cached gallery is shown again with a warning.
    pub async fn refresh_idle_art(&mut self) -> RefreshOutcome {
        let outcome = self.cache.refresh(self.gateway.as_ref()).await;
        if !outcome.is_fresh() {
            self.send(ControllerMessage::Status(StatusLine::warning(
                "Could not load idle art, showing cached gallery",
            )))
            .await;
        }
        self.send(ControllerMessage::Gallery {
            entries: self.cache.gallery(),
        })
        .await;
        outcome
    }

    /// Run an operator action and its follow-up
    pub async fn perform(&mut self, action: Action) -> ActionReport {
        let report = self.dispatcher.dispatch(self.gateway.as_ref(), action).await;

        if let Some(ref status) = report.status {
            self.send(ControllerMessage::Status(status.clone())).await;
        }
        if let Some(field) = report.clear_input {
            self.send(ControllerMessage::ClearInput { field }).await;
        }
        if let Some(ref message) = report.message {
            self.send(message.clone()).await;
        }

        match report.follow_up {
            FollowUp::None => {}
            FollowUp::Repoll => {
                self.tick().await;
            }
            FollowUp::RefreshIdleArt => {
                self.refresh_idle_art().await;
            }
        }

        report
    }

    /// Handle an event from the surface
    ///
    /// Returns `false` once the surface asked to shut down.
    pub async fn handle_event(&mut self, event: ControlEvent) -> bool {
        match event {
            ControlEvent::Action(action) => {
                self.perform(action).await;
            }
            ControlEvent::PollNow => {
                self.tick().await;
            }
            ControlEvent::RefreshIdleArt => {
                self.refresh_idle_art().await;
            }
            ControlEvent::Shutdown => {
                tracing::info!("Shutdown requested");
                return false;
            }
        }
        true
    }

    /// Send a message to the surface
    pub(crate) async fn send(&self, msg: ControllerMessage) {
        if let Err(e) = self.tx.send(msg).await {
            tracing::warn!("Failed to send message to surface: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{InMemoryGateway, TextOptions};
    use crate::messages::{RenderContent, RenderSource};

    fn drain(rx: &mut mpsc::Receiver<ControllerMessage>) -> Vec<ControllerMessage> {
        let mut messages = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            messages.push(msg);
        }
        messages
    }

    fn renders(messages: &[ControllerMessage]) -> Vec<&RenderInstruction> {
        messages
            .iter()
            .filter_map(|m| match m {
                ControllerMessage::Render(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_start_sends_gallery_then_render() {
        let gateway = InMemoryGateway::new();
        gateway.seed_idle_art(["a.png", "b.png"]);
        let (tx, mut rx) = mpsc::channel(100);
        let mut controller = Controller::new(gateway, ControllerConfig::default(), tx);

        controller.start().await;

        let messages = drain(&mut rx);
        assert!(matches!(
            messages[0],
            ControllerMessage::Gallery { ref entries } if entries.len() == 2
        ));
        assert!(matches!(messages[1], ControllerMessage::Render(_)));
        assert_eq!(controller.display_state(), ReconcilerState::Idle);
    }

    #[tokio::test]
    async fn test_display_triggers_immediate_render() {
        let gateway = InMemoryGateway::new();
        let (tx, mut rx) = mpsc::channel(100);
        let mut controller = Controller::new(gateway, ControllerConfig::default(), tx);

        controller
            .perform(Action::StageText {
                text: "Happy Birthday".to_string(),
                options: TextOptions::default(),
            })
            .await;
        controller.perform(Action::Display).await;

        let messages = drain(&mut rx);
        let renders = renders(&messages);
        assert_eq!(renders.len(), 1);
        assert_eq!(renders[0].source, RenderSource::Staged);
        assert_eq!(
            renders[0].content,
            RenderContent::Text {
                message: "Happy Birthday".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_failed_display_does_not_repoll() {
        let gateway = InMemoryGateway::new();
        let (tx, mut rx) = mpsc::channel(100);
        let mut controller = Controller::new(gateway, ControllerConfig::default(), tx);

        controller.perform(Action::Display).await;

        let messages = drain(&mut rx);
        assert!(renders(&messages).is_empty());
        assert!(matches!(
            messages[0],
            ControllerMessage::Status(ref s) if s.text == "No message to display"
        ));
        assert_eq!(controller.gateway().latest_calls(), 0);
    }

    #[tokio::test]
    async fn test_delete_refreshes_gallery_after_gateway_change() {
        let gateway = InMemoryGateway::new();
        gateway.seed_idle_art(["a.png", "b.png", "c.png"]);
        let (tx, mut rx) = mpsc::channel(100);
        let mut controller = Controller::new(gateway, ControllerConfig::default(), tx);
        controller.start().await;
        drain(&mut rx);

        controller
            .perform(Action::DeleteIdleArt {
                filename: "b.png".to_string(),
                confirmed: true,
            })
            .await;

        let messages = drain(&mut rx);
        let gallery = messages
            .iter()
            .find_map(|m| match m {
                ControllerMessage::Gallery { entries } => Some(entries.clone()),
                _ => None,
            })
            .unwrap();
        let names: Vec<_> = gallery.iter().map(|e| e.filename.as_str()).collect();
        assert_eq!(names, vec!["a.png", "c.png"]);
        assert_eq!(controller.cache().len(), 2);
    }

    #[tokio::test]
    async fn test_stale_refresh_warns_and_keeps_gallery() {
        let gateway = InMemoryGateway::new();
        gateway.seed_idle_art(["a.png"]);
        let (tx, mut rx) = mpsc::channel(100);
        let mut controller = Controller::new(gateway, ControllerConfig::default(), tx);
        controller.start().await;
        drain(&mut rx);

        controller.gateway().fail_endpoint("/idle_art_list");
        let outcome = controller.refresh_idle_art().await;
        assert_eq!(outcome, RefreshOutcome::KeptStale);

        let messages = drain(&mut rx);
        assert!(matches!(messages[0], ControllerMessage::Status(_)));
        assert!(matches!(
            messages[1],
            ControllerMessage::Gallery { ref entries } if entries.len() == 1
        ));
    }

    #[tokio::test]
    async fn test_shutdown_event() {
        let (tx, _rx) = mpsc::channel(100);
        let mut controller = Controller::new(InMemoryGateway::new(), ControllerConfig::default(), tx);

        assert!(controller.handle_event(ControlEvent::PollNow).await);
        assert!(!controller.handle_event(ControlEvent::Shutdown).await);
    }
}
