//! Provider abstraction over the remote generative capabilities.

use async_trait::async_trait;
use serde_json::Value;

use cstudio_models::{AspectRatio, InlineMedia, Resolution};

use crate::error::GenAiResult;

/// Text generation request.
#[derive(Debug, Clone)]
pub struct TextRequest {
    pub prompt: String,
    /// Optional media part sent ahead of the prompt (multimodal analysis)
    pub media: Option<InlineMedia>,
    /// Strict JSON response schema; switches the response to JSON
    pub response_schema: Option<Value>,
}

impl TextRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            media: None,
            response_schema: None,
        }
    }

    pub fn with_media(mut self, media: InlineMedia) -> Self {
        self.media = Some(media);
        self
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }
}

/// Image generation / editing request.
#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub prompt: String,
    /// Product photo to edit; `None` for pure text-to-image
    pub reference: Option<InlineMedia>,
}

/// Video generation request.
#[derive(Debug, Clone)]
pub struct VideoRequest {
    pub prompt: String,
    /// Seed image
    pub image: InlineMedia,
    pub aspect_ratio: AspectRatio,
    pub resolution: Resolution,
}

/// Error reported by a finished long-running operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationStatus {
    pub code: i32,
    pub message: String,
}

/// Handle of an asynchronous video generation job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoOperation {
    /// Operation resource name used for polling
    pub name: String,
    pub done: bool,
    pub error: Option<OperationStatus>,
    /// Locator of the generated video, present once done and successful
    pub video_uri: Option<String>,
}

impl VideoOperation {
    /// A freshly submitted, unfinished operation.
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            done: false,
            error: None,
            video_uri: None,
        }
    }
}

/// Remote generative capabilities used by the studio flows.
#[async_trait]
pub trait GenerativeProvider: Send + Sync {
    /// Generate text. Returns an empty string when the model produced none.
    async fn generate_text(&self, request: TextRequest) -> GenAiResult<String>;

    /// Generate one image, returned as the first inline image of the response.
    async fn generate_image(&self, request: ImageRequest) -> GenAiResult<InlineMedia>;

    /// Submit a video generation job.
    async fn start_video(&self, request: VideoRequest) -> GenAiResult<VideoOperation>;

    /// Fetch the current state of a video job.
    async fn poll_video(&self, operation: &VideoOperation) -> GenAiResult<VideoOperation>;

    /// Attach the access credential to a generated video locator.
    fn authorize_video_uri(&self, uri: &str) -> String;

    /// Whether the provider has credentials to make calls.
    fn is_configured(&self) -> bool {
        true
    }
}
