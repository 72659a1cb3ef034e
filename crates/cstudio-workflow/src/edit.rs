//! Single-image edits.

use tracing::instrument;

use cstudio_genai::{GenerativeProvider, ImageRequest};
use cstudio_models::{GenerationMode, InlineMedia, MediaKind};

use crate::error::{WorkflowError, WorkflowResult};
use crate::logging::FlowLogger;
use crate::metrics::record_generation;
use crate::prompts::image_prompt;

/// Input of one edit.
#[derive(Debug, Clone)]
pub struct EditRequest {
    pub mode: GenerationMode,
    pub product_description: String,
    /// Uploaded product photo, required in image-to-image mode
    pub reference: Option<InlineMedia>,
    pub instruction: String,
}

impl EditRequest {
    fn to_image_request(&self) -> WorkflowResult<ImageRequest> {
        let instruction = self.instruction.trim();
        if instruction.is_empty() {
            return Err(WorkflowError::validation("Edit instruction is empty"));
        }

        let reference = if self.mode.uses_reference() {
            let reference = self.reference.clone().ok_or_else(|| {
                WorkflowError::validation("Image-to-image mode requires a product image")
            })?;
            reference.ensure_kind(MediaKind::Image)?;
            Some(reference)
        } else {
            None
        };

        Ok(ImageRequest {
            prompt: image_prompt(&self.mode.edit_prompt(&self.product_description, instruction)),
            reference,
        })
    }
}

/// Render an edited image and return it as a data URI.
///
/// The caller swaps the result into its slot; on error the slot stays as it was.
#[instrument(skip_all, fields(mode = %request.mode))]
pub async fn render_edit(
    provider: &dyn GenerativeProvider,
    request: &EditRequest,
) -> WorkflowResult<String> {
    let image_request = request.to_image_request()?;
    let logger = FlowLogger::new("edit");
    logger.log_start(request.instruction.trim());

    let started = std::time::Instant::now();
    let result = provider.generate_image(image_request).await;
    record_generation("edit", result.is_ok(), started.elapsed().as_secs_f64());

    match result {
        Ok(media) => {
            logger.log_completion("image edited");
            Ok(media.to_data_uri())
        }
        Err(e) => {
            logger.log_error(&e.to_string());
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedProvider;

    fn request(instruction: &str) -> EditRequest {
        EditRequest {
            mode: GenerationMode::ImageToImage,
            product_description: "香水".to_string(),
            reference: Some(InlineMedia::new("image/jpeg", "cmVm")),
            instruction: instruction.to_string(),
        }
    }

    #[tokio::test]
    async fn test_edit_returns_data_uri() {
        let provider = ScriptedProvider::new().with_image("image/png", "ZWRpdA==");
        let uri = render_edit(&provider, &request("加一点雾气")).await.unwrap();
        assert_eq!(uri, "data:image/png;base64,ZWRpdA==");

        let sent = provider.image_requests();
        assert!(sent[0].prompt.starts_with("加一点雾气"));
        assert!(sent[0].reference.is_some());
    }

    #[tokio::test]
    async fn test_txt2img_edit_names_product() {
        let provider = ScriptedProvider::new().with_image("image/png", "AAAA");
        let edit = EditRequest {
            mode: GenerationMode::TextToImage,
            reference: None,
            ..request("换成夜景")
        };
        render_edit(&provider, &edit).await.unwrap();

        let sent = provider.image_requests();
        assert!(sent[0].prompt.starts_with("Product: 香水. 换成夜景"));
        assert!(sent[0].reference.is_none());
    }

    #[tokio::test]
    async fn test_blank_instruction_rejected() {
        let provider = ScriptedProvider::new();
        let err = render_edit(&provider, &request("   ")).await.unwrap_err();
        assert!(err.is_validation());
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_provider_failure_surfaces() {
        let provider = ScriptedProvider::new();
        let err = render_edit(&provider, &request("更亮")).await.unwrap_err();
        assert!(err.is_remote());
    }
}
