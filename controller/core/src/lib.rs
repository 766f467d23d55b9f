//! Inkframe Core - Display Orchestration for an E-Ink Message Frame
//!
//! This crate keeps a local preview of an e-ink frame in step with a remote
//! content gateway. The gateway owns what is staged and what is active; the
//! frame device polls it on its own. The controller stages content, promotes
//! it, and shows what the frame should be showing right now, falling back to
//! a rotating idle-art set when nothing is active.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          Surfaces                                │
//! │   ┌──────────────┐   ┌──────────────┐   ┌─────────────────────┐  │
//! │   │ CLI (watch)  │   │  one-shot    │   │  Headless / tests   │  │
//! │   └──────┬───────┘   └──────┬───────┘   └──────────┬──────────┘  │
//! │          └──────────────────┴──────────────────────┘             │
//! │                             │                                    │
//! │                    ControlEvent (up)                             │
//! │                 ControllerMessage (down)                         │
//! └─────────────────────────────┼────────────────────────────────────┘
//!                               │
//! ┌─────────────────────────────┼────────────────────────────────────┐
//! │                       INKFRAME CORE                              │
//! │  ┌──────────────────────────┴─────────────────────────────────┐  │
//! │  │                  Controller (poll loop)                    │  │
//! │  │  ┌────────────┐  ┌────────────┐  ┌────────────┐            │  │
//! │  │  │ Reconciler │  │ Idle Art   │  │ Dispatcher │            │  │
//! │  │  │  (ticks)   │  │  Cache     │  │ (actions)  │            │  │
//! │  │  └─────┬──────┘  └─────┬──────┘  └─────┬──────┘            │  │
//! │  └────────┼───────────────┼───────────────┼───────────────────┘  │
//! │           └───────────────┴───────┬───────┘                      │
//! │                          ContentGateway                          │
//! │                    (HttpGateway / InMemoryGateway)               │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`Controller`]: owns the cache, reconciler and dispatcher
//! - [`ContentGateway`]: the remote gateway's operations
//! - [`IdleArtCache`]: idle-art set plus rotation cursor
//! - [`DisplayReconciler`]: picks staged content or idle art each tick
//! - [`ActionDispatcher`]: runs operator actions and reports the outcome
//!
//! # Quick Start
//!
//! ```ignore
//! use inkframe_core::{poller, Controller, ControllerConfig, HttpGateway};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let (tx, mut rx) = mpsc::channel(100);
//!     let gateway = HttpGateway::new("https://frame.example.com")?;
//!     let handle = poller::spawn(Controller::new(gateway, ControllerConfig::default(), tx));
//!
//!     while let Some(msg) = rx.recv().await {
//!         // Render msg
//!     }
//!     handle.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`config`]: TOML file, environment and CLI configuration
//! - [`controller`]: the controller and its settings
//! - [`dispatcher`]: operator actions
//! - [`error`]: gateway and action errors
//! - [`events`]: events from surfaces
//! - [`gateway`]: gateway trait, HTTP client, in-memory double
//! - [`idle_art`]: idle-art cache
//! - [`media`]: upload files and cropping
//! - [`messages`]: messages to surfaces
//! - [`poller`]: the poll-loop task
//! - [`reconciler`]: per-tick display decision

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod gateway;
pub mod idle_art;
pub mod media;
pub mod messages;
pub mod poller;
pub mod reconciler;

// Re-exports for convenience
pub use controller::{Controller, ControllerConfig, DEFAULT_POLL_INTERVAL};
pub use dispatcher::{ActionDispatcher, ActionReport, FollowUp};
pub use error::{ActionError, GatewayError, PreconditionFailure};
pub use events::{Action, ControlEvent};
pub use gateway::{
    Alignment, ContentGateway, ContentKind, HttpGateway, ImageRef, InMemoryGateway, MetArt,
    StagedContent, TextOptions,
};
pub use idle_art::{GalleryEntry, IdleArtCache, RefreshOutcome};
pub use media::{crop_to_aspect, AspectRatio, UploadFile};
pub use messages::{
    ControllerMessage, InputField, NotifyLevel, RenderContent, RenderInstruction, RenderSource,
    StatusLine,
};
pub use poller::PollerHandle;
pub use reconciler::{DisplayReconciler, ReconcilerState};

// Config exports
pub use config::{
    default_config_path, load_config_from_path, ConfigError, ConfigOverrides,
    ConfigSource, ControllerConfigFile, ControllerToml,
};
