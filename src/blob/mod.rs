//! Flat on-disk blob store for uploaded originals and generated outputs
//!
//! One directory, no subdirectories, no manifest. The record store's
//! `generated_images` list is the only index of which files belong to
//! which request.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Which upload slot a file was submitted under; becomes the filename prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Main,
    Prop1,
    Prop2,
}

impl UploadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Prop1 => "prop1",
            Self::Prop2 => "prop2",
        }
    }
}

/// Handle to the upload directory
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Ensure the blob directory exists
    pub async fn ensure_dir(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).await?;
            debug!(path = ?self.root, "Created blob directory");
        }
        Ok(())
    }

    /// Save an uploaded source image as `<kind>_<unix_ms>_<origname>`
    pub async fn save_upload(
        &self,
        kind: UploadKind,
        original_name: &str,
        data: &[u8],
    ) -> Result<String> {
        self.ensure_dir().await?;

        let safe_name = Path::new(original_name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload");
        let filename = format!(
            "{}_{}_{}",
            kind.as_str(),
            Utc::now().timestamp_millis(),
            safe_name
        );

        let path = self.root.join(&filename);
        fs::write(&path, data).await?;
        debug!(path = ?path, size = data.len(), "Saved uploaded image");

        Ok(filename)
    }

    /// Save a generated output as `generated_<genId>_<variation>_<unix_ms>.png`
    pub async fn save_generated(
        &self,
        generation_id: Uuid,
        variation: u32,
        data: &[u8],
    ) -> Result<String> {
        self.ensure_dir().await?;

        let filename = format!(
            "generated_{}_{}_{}.png",
            generation_id,
            variation,
            Utc::now().timestamp_millis()
        );

        let path = self.root.join(&filename);
        fs::write(&path, data).await?;
        debug!(path = ?path, size = data.len(), "Saved generated image");

        Ok(filename)
    }

    /// Read a blob; `None` when the file does not exist
    pub async fn read(&self, filename: &str) -> Result<Option<Vec<u8>>> {
        let path = self.resolve(filename)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Resolve a client-supplied filename against the blob directory,
    /// rejecting anything that could escape it
    pub fn resolve(&self, filename: &str) -> Result<PathBuf> {
        Ok(self.root.join(sanitized(filename)?))
    }
}

fn sanitized(filename: &str) -> Result<&str> {
    if filename.is_empty()
        || filename.contains('/')
        || filename.contains('\\')
        || filename.contains("..")
    {
        return Err(AppError::InvalidRequest("Invalid filename".to_string()));
    }
    Ok(filename)
}
