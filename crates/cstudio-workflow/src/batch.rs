//! Sequential batch image generation.
//!
//! One request is in flight at a time and slot order follows scene order.
//! A failed slot is recorded and the loop moves on; nothing is retried.

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use cstudio_genai::{GenerativeProvider, ImageRequest};
use cstudio_models::{GenerationMode, ImageBatch, InlineMedia, MediaKind, SceneSuggestion, SlotId};

use crate::error::{WorkflowError, WorkflowResult};
use crate::logging::FlowLogger;
use crate::metrics::{record_batch_slot, record_generation};
use crate::observer::BatchObserver;
use crate::prompts::image_prompt;

/// Failure reason of slots abandoned by cancellation.
pub const CANCELLED_REASON: &str = "cancelled";

/// Everything needed to run one batch.
#[derive(Debug, Clone)]
pub struct BatchPlan {
    mode: GenerationMode,
    product_description: String,
    reference: Option<InlineMedia>,
    scene_descriptions: Vec<String>,
}

impl BatchPlan {
    pub fn new(
        mode: GenerationMode,
        product_description: impl Into<String>,
        reference: Option<InlineMedia>,
        scenes: &[SceneSuggestion],
    ) -> WorkflowResult<Self> {
        let product_description = product_description.into();

        if scenes.is_empty() {
            return Err(WorkflowError::validation("No scenes to generate"));
        }

        let reference = match mode {
            GenerationMode::ImageToImage => {
                let reference = reference.ok_or_else(|| {
                    WorkflowError::validation("Image-to-image mode requires a product image")
                })?;
                reference.ensure_kind(MediaKind::Image)?;
                Some(reference)
            }
            GenerationMode::TextToImage => {
                if product_description.trim().is_empty() {
                    return Err(WorkflowError::validation(
                        "Text-to-image mode requires a product description",
                    ));
                }
                None
            }
        };

        Ok(Self {
            mode,
            product_description,
            reference,
            scene_descriptions: scenes.iter().map(|s| s.description.clone()).collect(),
        })
    }

    pub fn mode(&self) -> GenerationMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.scene_descriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scene_descriptions.is_empty()
    }

    /// Fresh batch of pending slots, one per scene.
    pub fn initial_batch(&self) -> ImageBatch {
        ImageBatch::pending(self.scene_descriptions.iter().cloned())
    }

    /// Full prompt sent to the image model for slot `index`.
    pub fn prompt_for(&self, index: usize) -> Option<String> {
        self.scene_descriptions.get(index).map(|scene| {
            image_prompt(&self.mode.scene_prompt(&self.product_description, scene))
        })
    }

    fn request_for(&self, index: usize) -> Option<ImageRequest> {
        self.prompt_for(index).map(|prompt| ImageRequest {
            prompt,
            reference: self.reference.clone(),
        })
    }
}

/// Generate every slot of `plan` in order.
///
/// `observer` sees the pending batch before any call and a fresh snapshot
/// after every slot resolves. Returns the final batch, in which no slot is
/// pending.
#[instrument(skip_all, fields(mode = %plan.mode(), slots = plan.len()))]
pub async fn run_batch(
    provider: &dyn GenerativeProvider,
    plan: &BatchPlan,
    cancel: &CancellationToken,
    observer: &dyn BatchObserver,
) -> ImageBatch {
    let logger = FlowLogger::new("batch");
    logger.log_start(&format!("{} slots", plan.len()));

    let mut batch = plan.initial_batch();
    observer.batch_updated(&batch).await;

    for index in 0..plan.len() {
        if cancel.is_cancelled() {
            let abandoned = batch.fail_pending(CANCELLED_REASON);
            for _ in 0..abandoned {
                record_batch_slot(CANCELLED_REASON);
            }
            logger.log_warning(&format!("Cancelled with {} slots pending", abandoned));
            observer.batch_updated(&batch).await;
            break;
        }

        let Some(request) = plan.request_for(index) else {
            break;
        };
        let id = SlotId::for_index(index);

        let started = std::time::Instant::now();
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(CANCELLED_REASON.to_string()),
            result = provider.generate_image(request) => {
                record_generation("image", result.is_ok(), started.elapsed().as_secs_f64());
                result
                    .map(|media| media.to_data_uri())
                    .map_err(|e| e.to_string())
            }
        };

        match &outcome {
            Ok(_) => {
                info!(slot = %id, "Slot generated");
                record_batch_slot("succeeded");
            }
            Err(reason) => {
                warn!(slot = %id, reason = %reason, "Slot failed");
                record_batch_slot(if reason == CANCELLED_REASON {
                    CANCELLED_REASON
                } else {
                    "failed"
                });
            }
        }

        if let Err(e) = batch.resolve(&id, outcome) {
            logger.log_error(&e.to_string());
        }
        observer.batch_updated(&batch).await;
    }

    logger.log_completion(&format!(
        "{} succeeded, {} failed",
        batch.succeeded_count(),
        batch.failed_count()
    ));
    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use cstudio_genai::GenAiError;
    use cstudio_models::SlotStatus;

    use crate::testing::{BatchRecorder, ScriptedProvider};

    fn scenes(n: usize) -> Vec<SceneSuggestion> {
        (0..n)
            .map(|i| SceneSuggestion::new(format!("t{i}"), format!("scene {i}")))
            .collect()
    }

    fn reference() -> InlineMedia {
        InlineMedia::new("image/png", "cmVm")
    }

    #[test]
    fn test_plan_rejects_empty_scenes() {
        let err = BatchPlan::new(GenerationMode::ImageToImage, "", Some(reference()), &[])
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_plan_img2img_requires_image_reference() {
        assert!(BatchPlan::new(GenerationMode::ImageToImage, "", None, &scenes(1)).is_err());

        let video = InlineMedia::new("video/mp4", "AAAA");
        let err = BatchPlan::new(GenerationMode::ImageToImage, "", Some(video), &scenes(1))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Media(_)));
    }

    #[test]
    fn test_plan_txt2img_prompt_composition() {
        let plan = BatchPlan::new(
            GenerationMode::TextToImage,
            "lipstick",
            Some(reference()),
            &scenes(2),
        )
        .unwrap();

        let prompt = plan.prompt_for(1).unwrap();
        assert!(prompt.starts_with("Product: lipstick. Scene: scene 1"));
        assert!(prompt.ends_with("4k。"));
        assert!(plan.request_for(0).unwrap().reference.is_none());
    }

    #[tokio::test]
    async fn test_batch_tolerates_mid_failure() {
        let provider = ScriptedProvider::new()
            .with_image("image/png", "AAA0")
            .with_image_error(GenAiError::Api {
                status: 500,
                body: "overloaded".to_string(),
            })
            .with_image("image/png", "AAA2");
        let plan =
            BatchPlan::new(GenerationMode::ImageToImage, "", Some(reference()), &scenes(3)).unwrap();
        let recorder = BatchRecorder::default();

        let batch = run_batch(&provider, &plan, &CancellationToken::new(), &recorder).await;

        assert_eq!(batch.len(), 3);
        assert!(batch.is_complete());
        assert_eq!(batch.slots()[0].url(), "data:image/png;base64,AAA0");
        assert_eq!(batch.slots()[1].status(), SlotStatus::Failed);
        assert_eq!(batch.slots()[1].url(), "");
        assert_eq!(batch.slots()[2].url(), "data:image/png;base64,AAA2");

        // slot prompt is the scene description, not the composed prompt
        assert_eq!(batch.slots()[2].prompt, "scene 2");

        let snapshots = recorder.snapshots();
        assert_eq!(snapshots.len(), 4);
        assert_eq!(snapshots[0].pending_count(), 3);
        assert_eq!(snapshots[1].pending_count(), 2);

        let requests = provider.image_requests();
        assert_eq!(requests.len(), 3);
        assert!(requests[0].prompt.starts_with("scene 0"));
        assert!(requests.iter().all(|r| r.reference.is_some()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_is_sequential() {
        let provider = ScriptedProvider::new()
            .with_image_delay(Duration::from_millis(200))
            .with_image("image/png", "AAAA")
            .with_image("image/png", "AAAA")
            .with_image("image/png", "AAAA")
            .with_image("image/png", "AAAA");
        let plan =
            BatchPlan::new(GenerationMode::ImageToImage, "", Some(reference()), &scenes(4)).unwrap();

        let batch = run_batch(
            &provider,
            &plan,
            &CancellationToken::new(),
            &BatchRecorder::default(),
        )
        .await;

        assert_eq!(batch.succeeded_count(), 4);
        assert_eq!(provider.max_concurrent_images(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_fails_remaining_slots() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .with_image_delay(Duration::from_secs(10))
                .with_image("image/png", "AAAA"),
        );
        let plan =
            BatchPlan::new(GenerationMode::ImageToImage, "", Some(reference()), &scenes(3)).unwrap();
        let cancel = CancellationToken::new();

        let task = {
            let provider = provider.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                run_batch(provider.as_ref(), &plan, &cancel, &BatchRecorder::default()).await
            })
        };

        tokio::time::sleep(Duration::from_secs(15)).await;
        cancel.cancel();
        let batch = task.await.unwrap();

        assert_eq!(batch.len(), 3);
        assert_eq!(batch.succeeded_count(), 1);
        assert_eq!(batch.failed_count(), 2);
        assert_eq!(batch.slots()[2].failure_reason(), Some(CANCELLED_REASON));
        assert_eq!(provider.image_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_cancel_before_start() {
        let provider = ScriptedProvider::new();
        let plan =
            BatchPlan::new(GenerationMode::ImageToImage, "", Some(reference()), &scenes(2)).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let batch = run_batch(&provider, &plan, &cancel, &BatchRecorder::default()).await;

        assert_eq!(batch.failed_count(), 2);
        assert!(provider.calls().is_empty());
    }
}
