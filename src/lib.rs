//! Nano Banana API
//!
//! An HTTP service that turns one uploaded photo (plus optional props)
//! and a text prompt into N AI-generated image variations, stored on
//! disk and retrieved by polling.

pub mod api;
pub mod blob;
pub mod config;
pub mod error;
pub mod generation;
pub mod middleware;
pub mod model;
pub mod store;

pub use error::{AppError, Result};

use std::sync::Arc;

use blob::FileStore;
use generation::Orchestrator;
use store::Store;

/// Application state shared across all handlers
pub struct AppState {
    pub settings: config::Settings,
    pub store: Arc<dyn Store>,
    pub files: Arc<FileStore>,
    pub orchestrator: Arc<Orchestrator>,
}
