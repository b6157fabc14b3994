//! Generation orchestrator: input validation and the background
//! variation loop

pub mod tasks;

pub use tasks::TaskRegistry;

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::blob::FileStore;
use crate::error::{AppError, Result};
use crate::model::{enhance_prompt, mime_type_for, ImageModel, ImagePart, ModelRequest};
use crate::store::{AspectRatio, GenerationRecord, Store};

pub const DEFAULT_NUM_VARIATIONS: u32 = 5;
pub const MIN_VARIATIONS: u32 = 1;
pub const MAX_VARIATIONS: u32 = 10;
pub const MIN_PROMPT_CHARS: usize = 10;

/// One file pulled out of the multipart body
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl UploadedFile {
    fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("image/"))
    }
}

/// Raw submission as read off the wire, before validation
#[derive(Debug, Default)]
pub struct SubmitForm {
    pub main_photo: Option<UploadedFile>,
    pub prop1: Option<UploadedFile>,
    pub prop2: Option<UploadedFile>,
    pub prompt: Option<String>,
    pub num_variations: Option<String>,
    pub aspect_ratio: Option<String>,
}

/// A submission that passed validation
#[derive(Debug)]
pub struct ValidSubmission {
    pub main_photo: UploadedFile,
    pub prop1: Option<UploadedFile>,
    pub prop2: Option<UploadedFile>,
    pub prompt: String,
    pub num_variations: u32,
    pub aspect_ratio: AspectRatio,
}

impl SubmitForm {
    /// Validate the submission; rejection happens before any record or
    /// file is created, so a 400 leaves no state behind
    pub fn validate(self) -> Result<ValidSubmission> {
        let main_photo = self
            .main_photo
            .ok_or_else(|| AppError::InvalidRequest("Main photo is required".to_string()))?;

        for file in [Some(&main_photo), self.prop1.as_ref(), self.prop2.as_ref()]
            .into_iter()
            .flatten()
        {
            if !file.is_image() {
                return Err(AppError::InvalidRequest(
                    "Only image files are allowed".to_string(),
                ));
            }
        }

        let prompt = self.prompt.unwrap_or_default().trim().to_string();
        if prompt.chars().count() < MIN_PROMPT_CHARS {
            return Err(AppError::InvalidRequest(
                "Prompt must be at least 10 characters".to_string(),
            ));
        }

        let num_variations = match self
            .num_variations
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            None => DEFAULT_NUM_VARIATIONS,
            Some(raw) => {
                let n: u32 = raw.parse().map_err(|_| {
                    AppError::InvalidRequest(
                        "numVariations must be a number between 1 and 10".to_string(),
                    )
                })?;
                if !(MIN_VARIATIONS..=MAX_VARIATIONS).contains(&n) {
                    return Err(AppError::InvalidRequest(
                        "numVariations must be between 1 and 10".to_string(),
                    ));
                }
                n
            }
        };

        let aspect_ratio = match self
            .aspect_ratio
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            None => AspectRatio::default(),
            Some(raw) => AspectRatio::parse(raw).ok_or_else(|| {
                AppError::InvalidRequest(
                    "aspectRatio must be one of 1:1, 16:9, 9:16, 4:3".to_string(),
                )
            })?,
        };

        Ok(ValidSubmission {
            main_photo,
            prop1: self.prop1,
            prop2: self.prop2,
            prompt,
            num_variations,
            aspect_ratio,
        })
    }
}

/// Drives the variation loop for accepted requests
///
/// Holds the injected store, model client and blob store; each accepted
/// request runs as one detached task tracked in the registry.
pub struct Orchestrator {
    store: Arc<dyn Store>,
    model: Arc<dyn ImageModel>,
    files: Arc<FileStore>,
    tasks: Arc<TaskRegistry>,
    variation_delay: Duration,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn Store>,
        model: Arc<dyn ImageModel>,
        files: Arc<FileStore>,
        variation_delay: Duration,
    ) -> Self {
        Self {
            store,
            model,
            files,
            tasks: Arc::new(TaskRegistry::new()),
            variation_delay,
        }
    }

    /// Start generation for a freshly created record, detached from the
    /// HTTP response lifecycle; a total failure is logged here and never
    /// surfaced to the client
    pub fn spawn(&self, record: GenerationRecord) {
        let store = self.store.clone();
        let model = self.model.clone();
        let files = self.files.clone();
        let delay = self.variation_delay;
        let id = record.id;

        let handle = tokio::spawn(async move {
            if let Err(err) = Self::run(store, model, files, delay, record).await {
                error!(id = %id, error = %err, "Image generation failed");
            }
        });
        self.tasks.insert(id, handle);
    }

    pub fn is_running(&self, id: Uuid) -> bool {
        self.tasks.is_running(id)
    }

    /// Wait for the generation task of this id to finish
    pub async fn wait(&self, id: Uuid) {
        self.tasks.join(id).await;
    }

    async fn run(
        store: Arc<dyn Store>,
        model: Arc<dyn ImageModel>,
        files: Arc<FileStore>,
        delay: Duration,
        record: GenerationRecord,
    ) -> Result<()> {
        info!(id = %record.id, variations = record.num_variations, "Starting image generation");

        match Self::drive(model.as_ref(), files.as_ref(), delay, &record).await {
            Ok(generated) if !generated.is_empty() => {
                info!(
                    id = %record.id,
                    succeeded = generated.len(),
                    "Generation completed"
                );
                store.update_results(record.id, generated);
                Ok(())
            }
            Ok(_) => {
                // Zero successes: the empty write keeps the record reading
                // as "processing", indistinguishable from still running
                store.update_results(record.id, Vec::new());
                Err(AppError::Model(
                    "No images were generated successfully".to_string(),
                ))
            }
            Err(err) => {
                store.update_results(record.id, Vec::new());
                Err(err)
            }
        }
    }

    /// The variation loop as an explicit sequential fold: each iteration
    /// yields a `Result`, one failure never aborts the loop, and the
    /// final reduction keeps the successes in call order
    async fn drive(
        model: &dyn ImageModel,
        files: &FileStore,
        delay: Duration,
        record: &GenerationRecord,
    ) -> Result<Vec<String>> {
        let images = Self::load_inputs(files, record).await?;
        let prompt = enhance_prompt(&record.prompt, record.aspect_ratio);

        let mut outcomes: Vec<Result<String>> = Vec::with_capacity(record.num_variations as usize);

        for i in 0..record.num_variations {
            let variation = i + 1;
            info!(
                id = %record.id,
                variation,
                total = record.num_variations,
                "Generating variation"
            );

            let outcome =
                Self::generate_one(model, files, &images, &prompt, record.id, variation).await;
            if let Err(err) = &outcome {
                warn!(id = %record.id, variation, error = %err, "Variation failed");
            }
            outcomes.push(outcome);

            // Pause between calls, not after the last
            if variation < record.num_variations {
                sleep(delay).await;
            }
        }

        Ok(outcomes.into_iter().filter_map(|o| o.ok()).collect())
    }

    async fn generate_one(
        model: &dyn ImageModel,
        files: &FileStore,
        images: &[ImagePart],
        prompt: &str,
        id: Uuid,
        variation: u32,
    ) -> Result<String> {
        let request = ModelRequest {
            images: images.to_vec(),
            prompt: prompt.to_string(),
        };

        match model.generate(request).await? {
            Some(bytes) => files.save_generated(id, variation, &bytes).await,
            None => Err(AppError::Model(format!(
                "Variation {} produced no image",
                variation
            ))),
        }
    }

    /// Read the stored source images: main photo first, then present
    /// props in order; mime types come from filename extensions
    async fn load_inputs(files: &FileStore, record: &GenerationRecord) -> Result<Vec<ImagePart>> {
        let mut parts = Vec::new();

        let refs = [
            Some(&record.main_photo),
            record.prop1.as_ref(),
            record.prop2.as_ref(),
        ];
        for filename in refs.into_iter().flatten() {
            let data = files.read(filename).await?.ok_or_else(|| {
                AppError::Internal(format!("Source image missing: {}", filename))
            })?;
            parts.push(ImagePart {
                data,
                mime_type: mime_type_for(filename).to_string(),
            });
        }

        Ok(parts)
    }
}
