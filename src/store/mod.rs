//! In-memory record store for generation requests and users

pub mod memory;

pub use memory::MemStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Supported output aspect ratios
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "16:9")]
    Widescreen,
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "4:3")]
    Classic,
}

impl AspectRatio {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "1:1" => Some(Self::Square),
            "16:9" => Some(Self::Widescreen),
            "9:16" => Some(Self::Portrait),
            "4:3" => Some(Self::Classic),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Widescreen => "16:9",
            Self::Portrait => "9:16",
            Self::Classic => "4:3",
        }
    }

    pub fn is_square(&self) -> bool {
        matches!(self, Self::Square)
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        Self::Square
    }
}

/// Derived status of a generation request
///
/// Computed from the record on every read, never stored. A request whose
/// variations all failed keeps an empty result list and therefore reads as
/// `processing` forever; there is deliberately no `failed` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Processing,
    Completed,
}

impl GenerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
        }
    }
}

/// Fields supplied when creating a generation record
#[derive(Debug, Clone)]
pub struct NewGeneration {
    /// Blob filename of the required source photo
    pub main_photo: String,
    pub prop1: Option<String>,
    pub prop2: Option<String>,
    pub prompt: String,
    pub num_variations: u32,
    pub aspect_ratio: AspectRatio,
}

/// A persisted generation request
#[derive(Debug, Clone)]
pub struct GenerationRecord {
    pub id: Uuid,
    pub main_photo: String,
    pub prop1: Option<String>,
    pub prop2: Option<String>,
    pub prompt: String,
    pub num_variations: u32,
    pub aspect_ratio: AspectRatio,
    /// Blob filenames of produced variations, in call order
    pub generated_images: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl GenerationRecord {
    pub fn status(&self) -> GenerationStatus {
        if self.generated_images.is_empty() {
            GenerationStatus::Processing
        } else {
            GenerationStatus::Completed
        }
    }
}

/// Fields supplied when creating a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
}

/// A registered user
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password: String,
}

/// Keyed, single-process storage for generation records and users
///
/// Exactly one background task ever writes results for a given id, so
/// `update_results` is last-writer-wins with no version check.
pub trait Store: Send + Sync {
    fn create_generation(&self, new: NewGeneration) -> GenerationRecord;

    fn get_generation(&self, id: Uuid) -> Option<GenerationRecord>;

    /// Replace the result list wholesale; `None` when the id is unknown
    fn update_results(&self, id: Uuid, generated_images: Vec<String>) -> Option<GenerationRecord>;

    fn create_user(&self, new: NewUser) -> User;

    fn get_user(&self, id: Uuid) -> Option<User>;

    fn get_user_by_username(&self, username: &str) -> Option<User>;
}
