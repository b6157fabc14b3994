//! Shared test fixtures: a scripted model client, an app wired against a
//! temp blob directory, and a multipart body builder

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use tempfile::TempDir;

use nano_banana_api::{
    api::routes::create_router,
    blob::FileStore,
    config::Settings,
    error::{AppError, Result},
    generation::Orchestrator,
    model::{ImageModel, ModelRequest},
    store::{MemStore, Store},
    AppState,
};

/// One scripted outcome for a model call
pub enum Scripted {
    /// The response carries an inline image with these bytes
    Image(Vec<u8>),
    /// The response carries no image part
    NoImage,
    /// The call fails outright
    Fail(&'static str),
}

/// Model double that replays a script and records every prompt it saw
pub struct ScriptedModel {
    script: Mutex<VecDeque<Scripted>>,
    prompts: Mutex<Vec<String>>,
    image_mimes: Mutex<Vec<Vec<String>>>,
}

impl ScriptedModel {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            prompts: Mutex::new(Vec::new()),
            image_mimes: Mutex::new(Vec::new()),
        }
    }

    /// Prompts in call order; doubles as the call count
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    /// Mime types of the input images, per call, in the order sent
    pub fn image_mimes(&self) -> Vec<Vec<String>> {
        self.image_mimes.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl ImageModel for ScriptedModel {
    async fn generate(&self, request: ModelRequest) -> Result<Option<Vec<u8>>> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        self.image_mimes.lock().unwrap().push(
            request
                .images
                .iter()
                .map(|img| img.mime_type.clone())
                .collect(),
        );

        // An exhausted script keeps succeeding
        match self.script.lock().unwrap().pop_front() {
            None => Ok(Some(b"fallback-image".to_vec())),
            Some(Scripted::Image(bytes)) => Ok(Some(bytes)),
            Some(Scripted::NoImage) => Ok(None),
            Some(Scripted::Fail(msg)) => Err(AppError::Model(msg.to_string())),
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub model: Arc<ScriptedModel>,
    pub dir: TempDir,
}

/// App with a temp blob dir, zero inter-variation delay and the rate
/// limiter disabled
pub fn test_app(script: Vec<Scripted>) -> TestApp {
    let dir = tempfile::tempdir().unwrap();

    let mut settings = Settings::default();
    settings.storage.upload_dir = dir.path().to_string_lossy().to_string();
    settings.rate_limit.enabled = false;

    let store: Arc<dyn Store> = Arc::new(MemStore::new());
    let files = Arc::new(FileStore::new(dir.path()));
    let model = Arc::new(ScriptedModel::new(script));
    let orchestrator = Arc::new(Orchestrator::new(
        store.clone(),
        model.clone(),
        files.clone(),
        Duration::ZERO,
    ));

    let state = Arc::new(AppState {
        settings,
        store,
        files,
        orchestrator,
    });

    TestApp {
        router: create_router(state.clone()),
        state,
        model,
        dir,
    }
}

pub const BOUNDARY: &str = "nano-banana-test-boundary";

/// Hand-rolled multipart/form-data body builder
#[derive(Default)]
pub struct MultipartBuilder {
    body: Vec<u8>,
}

impl MultipartBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, name, filename, content_type
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        self.body
    }

    pub fn content_type() -> String {
        format!("multipart/form-data; boundary={}", BOUNDARY)
    }
}

/// A submission with a main photo and a valid prompt; callers add or
/// override the rest
pub fn valid_submission() -> MultipartBuilder {
    MultipartBuilder::new()
        .file("mainPhoto", "photo.jpg", "image/jpeg", b"\xFF\xD8\xFFjpeg-bytes")
        .text("prompt", "a portrait in golden hour light")
}
