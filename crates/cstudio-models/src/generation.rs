//! Image generation mode and prompt composition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Whether images are derived from an uploaded product photo or from text only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
pub enum GenerationMode {
    /// Reference image plus scene description
    #[default]
    #[serde(rename = "img2img")]
    ImageToImage,
    /// Product description plus scene description, no reference image
    #[serde(rename = "txt2img")]
    TextToImage,
}

impl GenerationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationMode::ImageToImage => "img2img",
            GenerationMode::TextToImage => "txt2img",
        }
    }

    /// Whether this mode sends the reference image with each request.
    pub fn uses_reference(&self) -> bool {
        matches!(self, GenerationMode::ImageToImage)
    }

    /// Prompt for one batch slot.
    ///
    /// Text-to-image has no photo to anchor the product, so the product
    /// description is spelled out ahead of the scene.
    pub fn scene_prompt(&self, product_description: &str, scene_description: &str) -> String {
        match self {
            GenerationMode::ImageToImage => scene_description.to_string(),
            GenerationMode::TextToImage => format!(
                "Product: {}. Scene: {}",
                product_description, scene_description
            ),
        }
    }

    /// Prompt for a single-image edit.
    pub fn edit_prompt(&self, product_description: &str, instruction: &str) -> String {
        match self {
            GenerationMode::ImageToImage => instruction.to_string(),
            GenerationMode::TextToImage => {
                format!("Product: {}. {}", product_description, instruction)
            }
        }
    }
}

impl std::fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
