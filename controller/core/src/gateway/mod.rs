//! Content Gateway Integration
//!
//! Access to the remote gateway that owns staged content and the idle-art
//! set, through a common trait.
//!
//! # Available Gateways
//!
//! - **HTTP**: the real gateway's REST API (default)
//! - **In-memory**: same observable behavior, in process
//!
//! # Usage
//!
//! ```ignore
//! use inkframe_core::gateway::{ContentGateway, HttpGateway};
//!
//! let gateway = HttpGateway::new("https://frame.example.com")?;
//! let latest = gateway.latest().await?;
//! ```

mod http;
mod memory;
mod traits;

pub use http::HttpGateway;
pub use memory::{InMemoryGateway, IN_MEMORY_BASE_URL};
pub use traits::{
    Alignment, ContentGateway, ContentKind, ImageRef, LatestPayload, MetArt, StagedContent,
    TextOptions,
};
