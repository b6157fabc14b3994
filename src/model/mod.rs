//! Model client adapter for the external generative-image capability

pub mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;

use crate::error::Result;
use crate::store::AspectRatio;

/// One inline image input: raw bytes plus their mime type
#[derive(Debug, Clone)]
pub struct ImagePart {
    pub data: Vec<u8>,
    pub mime_type: String,
}

/// Input for a single model call: source images in order (main photo
/// first, then props), plus one text instruction
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub images: Vec<ImagePart>,
    pub prompt: String,
}

/// A generative image model reached over the network
///
/// Each call produces at most one image: `Ok(Some(bytes))` carries the
/// first inline image part of the response, `Ok(None)` means the response
/// contained no image (a silent failure for that variation), and `Err`
/// is a transport or API error for the caller to handle.
#[async_trait]
pub trait ImageModel: Send + Sync {
    async fn generate(&self, request: ModelRequest) -> Result<Option<Vec<u8>>>;
}

/// Infer a mime type from a filename extension; never sniffs content
pub fn mime_type_for(filename: &str) -> &'static str {
    let ext = filename.rsplit('.').next().unwrap_or("");
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "image/jpeg",
    }
}

/// Enhance the user prompt for one variation call
///
/// A non-square aspect ratio is named explicitly, and the fixed diversity
/// clause is always appended; since the inputs are otherwise identical
/// across the loop, that clause is the only source of variation-to-
/// variation diversity.
pub fn enhance_prompt(prompt: &str, aspect_ratio: AspectRatio) -> String {
    let mut enhanced = prompt.to_string();
    if !aspect_ratio.is_square() {
        enhanced.push_str(&format!(" in {} aspect ratio", aspect_ratio.as_str()));
    }
    enhanced.push_str(". Create a unique variation with creative lighting and composition.");
    enhanced
}
