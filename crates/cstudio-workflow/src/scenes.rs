//! Scene ideation.

use tracing::instrument;

use cstudio_genai::{GenerativeProvider, TextRequest};
use cstudio_models::{GenerationMode, Industry, SceneSuggestion, SCENE_COUNT};

use crate::error::{WorkflowError, WorkflowResult};
use crate::logging::FlowLogger;
use crate::metrics::record_generation;
use crate::prompts::{scene_response_schema, scene_suggestion_prompt};

/// Input of the scene-suggestion flow.
#[derive(Debug, Clone, Default)]
pub struct SceneRequest {
    pub industry: Industry,
    /// Label used when `industry` is [`Industry::Custom`]
    pub custom_industry: Option<String>,
    pub product_description: String,
    pub mode: GenerationMode,
    /// Whether a product photo has been uploaded
    pub has_reference: bool,
}

impl SceneRequest {
    /// Check the request and resolve the industry label for the prompt.
    pub fn validate(&self) -> WorkflowResult<String> {
        match self.mode {
            GenerationMode::ImageToImage if !self.has_reference => {
                return Err(WorkflowError::validation(
                    "Image-to-image mode requires a product image",
                ));
            }
            GenerationMode::TextToImage if self.product_description.trim().is_empty() => {
                return Err(WorkflowError::validation(
                    "Text-to-image mode requires a product description",
                ));
            }
            _ => {}
        }

        self.industry
            .resolve_label(self.custom_industry.as_deref())
            .ok_or_else(|| WorkflowError::validation("Custom industry requires a label"))
    }
}

/// Ask the text model for [`SCENE_COUNT`] scene ideas.
///
/// Returns an empty list when the model produced no text.
#[instrument(skip(provider, request), fields(industry = %request.industry, mode = %request.mode))]
pub async fn suggest_scenes(
    provider: &dyn GenerativeProvider,
    request: &SceneRequest,
) -> WorkflowResult<Vec<SceneSuggestion>> {
    let industry = request.validate()?;
    let logger = FlowLogger::new("scenes");
    logger.log_start(&industry);

    let prompt = scene_suggestion_prompt(&industry, &request.product_description);
    let started = std::time::Instant::now();
    let result = provider
        .generate_text(TextRequest::new(prompt).with_schema(scene_response_schema()))
        .await;
    record_generation("scenes", result.is_ok(), started.elapsed().as_secs_f64());

    let text = match result {
        Ok(text) => text,
        Err(e) => {
            logger.log_error(&e.to_string());
            return Err(e.into());
        }
    };

    let scenes = parse_scenes(&text)?;
    if !scenes.is_empty() && scenes.len() < SCENE_COUNT {
        logger.log_warning(&format!(
            "Model returned {} scenes, expected {}",
            scenes.len(),
            SCENE_COUNT
        ));
    }
    logger.log_completion(&format!("{} scenes", scenes.len()));
    Ok(scenes)
}

/// Parse the model's scene list, tolerating a markdown code fence.
pub(crate) fn parse_scenes(text: &str) -> WorkflowResult<Vec<SceneSuggestion>> {
    let text = strip_code_fence(text);
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let mut scenes: Vec<SceneSuggestion> = serde_json::from_str(text).map_err(|e| {
        WorkflowError::invalid_response(format!("Failed to parse scenes JSON: {}", e))
    })?;
    scenes.truncate(SCENE_COUNT);
    Ok(scenes)
}

pub(crate) fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim()
}
