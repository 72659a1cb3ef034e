//! Shared data models for the Creative Studio backend.
//!
//! This crate provides Serde-serializable types for:
//! - Scene suggestions and industry presets
//! - Generated image slots and their state machine
//! - Video generation state and output settings
//! - Inline media payloads (base64 / data URIs)
//! - Script analysis results

pub mod analysis;
pub mod generation;
pub mod image;
pub mod industry;
pub mod media;
pub mod scene;
pub mod video;

// Re-export common types
pub use analysis::{extract_video_prompt, ScriptAnalysis, VIDEO_PROMPT_MARKER};
pub use generation::GenerationMode;
pub use image::{GeneratedImage, ImageBatch, ImageSlotView, SlotId, SlotState, SlotStatus, SlotTransitionError};
pub use industry::Industry;
pub use media::{InlineMedia, MediaError, MediaKind, MediaResult};
pub use scene::{SceneSuggestion, SCENE_COUNT};
pub use video::{AspectRatio, Resolution, VideoState};
