//! Request handlers, thin adapters over the store, blob store and
//! orchestrator

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::blob::UploadKind;
use crate::error::{AppError, Result};
use crate::generation::{SubmitForm, UploadedFile};
use crate::model::mime_type_for;
use crate::store::{AspectRatio, GenerationStatus, NewGeneration};
use crate::AppState;

/// Per-file upload limit
const MAX_FILE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    service: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateAccepted {
    id: Uuid,
    status: GenerationStatus,
    message: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationStatusResponse {
    id: Uuid,
    status: GenerationStatus,
    prompt: String,
    num_variations: u32,
    aspect_ratio: AspectRatio,
    generated_images: Vec<String>,
    created_at: DateTime<Utc>,
}

/// GET /api/health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "Nano Banana API",
    })
}

/// POST /api/generate
///
/// Validates synchronously, persists the uploads and the record, then
/// detaches the generation loop and answers immediately.
pub async fn generate(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<GenerateAccepted>> {
    let form = read_form(&mut multipart).await?;
    let submission = form.validate()?;

    let main_photo = state
        .files
        .save_upload(
            UploadKind::Main,
            &submission.main_photo.original_name,
            &submission.main_photo.data,
        )
        .await?;
    let prop1 = save_optional(&state, UploadKind::Prop1, submission.prop1.as_ref()).await?;
    let prop2 = save_optional(&state, UploadKind::Prop2, submission.prop2.as_ref()).await?;

    let record = state.store.create_generation(NewGeneration {
        main_photo,
        prop1,
        prop2,
        prompt: submission.prompt,
        num_variations: submission.num_variations,
        aspect_ratio: submission.aspect_ratio,
    });

    info!(
        id = %record.id,
        variations = record.num_variations,
        aspect_ratio = record.aspect_ratio.as_str(),
        "Generation request accepted"
    );

    let id = record.id;
    state.orchestrator.spawn(record);

    Ok(Json(GenerateAccepted {
        id,
        status: GenerationStatus::Processing,
        message: "Image generation started",
    }))
}

/// GET /api/generation/:id
pub async fn generation_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<GenerationStatusResponse>> {
    let id = Uuid::parse_str(&id)
        .map_err(|_| AppError::NotFound("Generation not found".to_string()))?;

    let record = state
        .store
        .get_generation(id)
        .ok_or_else(|| AppError::NotFound("Generation not found".to_string()))?;

    debug!(
        id = %id,
        status = record.status().as_str(),
        task_running = state.orchestrator.is_running(id),
        "Status poll"
    );

    Ok(Json(GenerationStatusResponse {
        id: record.id,
        status: record.status(),
        prompt: record.prompt,
        num_variations: record.num_variations,
        aspect_ratio: record.aspect_ratio,
        generated_images: record.generated_images,
        created_at: record.created_at,
    }))
}

/// GET /api/images/:filename
pub async fn serve_image(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response> {
    let bytes = state
        .files
        .read(&filename)
        .await?
        .ok_or_else(|| AppError::NotFound("Image not found".to_string()))?;

    Ok((
        [
            (CONTENT_TYPE, mime_type_for(&filename)),
            (CACHE_CONTROL, "public, max-age=31536000"),
        ],
        bytes,
    )
        .into_response())
}

/// GET /api/download/:filename
pub async fn download_image(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response> {
    let bytes = state
        .files
        .read(&filename)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    let attachment = format!(
        "attachment; filename=\"nano-banana-{}.png\"",
        Utc::now().timestamp_millis()
    );

    Ok((
        [
            (CONTENT_TYPE, mime_type_for(&filename).to_string()),
            (CONTENT_DISPOSITION, attachment),
        ],
        bytes,
    )
        .into_response())
}

async fn save_optional(
    state: &AppState,
    kind: UploadKind,
    file: Option<&UploadedFile>,
) -> Result<Option<String>> {
    match file {
        Some(file) => {
            let filename = state
                .files
                .save_upload(kind, &file.original_name, &file.data)
                .await?;
            Ok(Some(filename))
        }
        None => Ok(None),
    }
}

/// Pull the known multipart fields into a [`SubmitForm`]
async fn read_form(multipart: &mut Multipart) -> Result<SubmitForm> {
    let mut form = SubmitForm::default();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            "mainPhoto" | "prop1" | "prop2" => {
                let original_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await?;
                if data.len() > MAX_FILE_BYTES {
                    return Err(AppError::InvalidRequest(format!(
                        "{} exceeds the 10MB upload limit",
                        name
                    )));
                }
                let file = UploadedFile {
                    original_name,
                    content_type,
                    data: data.to_vec(),
                };
                match name.as_str() {
                    "mainPhoto" => form.main_photo = Some(file),
                    "prop1" => form.prop1 = Some(file),
                    _ => form.prop2 = Some(file),
                }
            }
            "prompt" => form.prompt = Some(field.text().await?),
            "numVariations" => form.num_variations = Some(field.text().await?),
            "aspectRatio" => form.aspect_ratio = Some(field.text().await?),
            _ => {
                // Unknown fields are drained and ignored
                let _ = field.bytes().await;
            }
        }
    }

    Ok(form)
}
