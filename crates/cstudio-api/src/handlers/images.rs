//! Image suite handlers.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use cstudio_models::{
    GenerationMode, ImageBatch, ImageSlotView, Industry, InlineMedia, MediaKind, SceneSuggestion,
    SlotId,
};
use cstudio_workflow::{
    render_edit, run_batch, suggest_scenes, BatchObserver, BatchPlan, EditRequest, SceneRequest,
    WorkflowError,
};

use crate::error::{ApiError, ApiResult};
use crate::session::{ImageSuiteView, Session};
use crate::state::AppState;

/// Partial update of the image suite inputs.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceUpdate {
    pub mode: Option<GenerationMode>,
    pub industry: Option<Industry>,
    pub custom_industry: Option<String>,
    pub product_description: Option<String>,
    /// Product photo as a data URI
    pub reference_image: Option<String>,
}

/// Set mode, industry, description or product photo.
///
/// A new photo or a mode change invalidates the current scenes and images.
pub async fn update_source(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(update): Json<SourceUpdate>,
) -> ApiResult<Json<ImageSuiteView>> {
    let session = state.sessions.get(session_id).await?;

    let reference = update
        .reference_image
        .as_deref()
        .map(|uri| {
            let media = InlineMedia::from_data_uri(uri)?;
            media.ensure_kind(MediaKind::Image)?;
            Ok::<_, ApiError>(media)
        })
        .transpose()?;

    let mut suite = session.image.write().await;
    if suite.batch_running {
        return Err(ApiError::conflict("Batch generation is running"));
    }

    let mut invalidate = false;
    if let Some(mode) = update.mode {
        invalidate |= mode != suite.mode;
        suite.mode = mode;
    }
    if let Some(media) = reference {
        suite.reference = Some(media);
        invalidate = true;
    }
    if let Some(industry) = update.industry {
        suite.industry = industry;
    }
    if let Some(label) = update.custom_industry {
        suite.custom_industry = Some(label).filter(|l| !l.trim().is_empty());
    }
    if let Some(description) = update.product_description {
        suite.product_description = description;
    }
    if invalidate {
        suite.clear_results();
    }

    Ok(Json(suite.view()))
}

#[derive(Debug, Serialize)]
pub struct ScenesResponse {
    pub scenes: Vec<SceneSuggestion>,
}

/// Ask the text model for scene ideas and store them.
///
/// Scenes are only stored if the source did not change and no batch
/// started while the model was answering.
pub async fn suggest(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<ScenesResponse>> {
    let session = state.sessions.get(session_id).await?;

    let (request, generation) = {
        let suite = session.image.read().await;
        if suite.batch_running {
            return Err(ApiError::conflict("Batch generation is running"));
        }
        let request = SceneRequest {
            industry: suite.industry,
            custom_industry: suite.custom_industry.clone(),
            product_description: suite.product_description.clone(),
            mode: suite.mode,
            has_reference: suite.reference.is_some(),
        };
        (request, suite.source_generation)
    };

    let scenes = suggest_scenes(state.provider.as_ref(), &request)
        .instrument(info_span!("scenes", session_id = %session_id))
        .await?;

    let mut suite = session.image.write().await;
    if suite.batch_running {
        return Err(ApiError::conflict("Batch generation started while suggesting scenes"));
    }
    if suite.source_generation != generation {
        info!(session_id = %session_id, "Discarding scenes for a replaced source");
        return Err(ApiError::conflict("Source changed while suggesting scenes"));
    }
    suite.scenes = scenes.clone();
    Ok(Json(ScenesResponse { scenes }))
}

/// Publishes batch progress into the session.
struct SessionBatchObserver {
    session: Arc<Session>,
}

#[async_trait]
impl BatchObserver for SessionBatchObserver {
    async fn batch_updated(&self, batch: &ImageBatch) {
        self.session.image.write().await.batch = batch.clone();
    }
}

/// Start generating one image per scene in the background.
pub async fn start_batch(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<ImageSuiteView>)> {
    let session = state.sessions.get(session_id).await?;

    let (plan, view) = {
        let mut suite = session.image.write().await;
        if suite.batch_running {
            return Err(ApiError::conflict("Batch generation is already running"));
        }
        if suite.scenes.is_empty() {
            return Err(WorkflowError::validation("Suggest scenes before generating images").into());
        }

        let plan = BatchPlan::new(
            suite.mode,
            suite.product_description.clone(),
            suite.reference.clone(),
            &suite.scenes,
        )?;
        suite.batch = plan.initial_batch();
        suite.batch_running = true;
        (plan, suite.view())
    };

    let provider = Arc::clone(&state.provider);
    let cancel = session.cancel.child_token();
    let observer = SessionBatchObserver {
        session: Arc::clone(&session),
    };
    info!(session_id = %session_id, slots = plan.len(), "Batch generation started");

    tokio::spawn(
        async move {
            let batch = run_batch(provider.as_ref(), &plan, &cancel, &observer).await;
            let mut suite = observer.session.image.write().await;
            suite.batch = batch;
            suite.batch_running = false;
        }
        .instrument(info_span!("batch", session_id = %session_id)),
    );

    Ok((StatusCode::ACCEPTED, Json(view)))
}

/// Scenes, slots and batch status.
pub async fn get_images(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<ImageSuiteView>> {
    let session = state.sessions.get(session_id).await?;
    let view = session.image.read().await.view();
    Ok(Json(view))
}

#[derive(Debug, Deserialize)]
pub struct EditBody {
    pub instruction: String,
}

/// Re-render one slot from a free-text instruction.
pub async fn edit_image(
    State(state): State<AppState>,
    Path((session_id, slot_id)): Path<(Uuid, String)>,
    Json(body): Json<EditBody>,
) -> ApiResult<Json<ImageSlotView>> {
    let session = state.sessions.get(session_id).await?;
    let slot_id = SlotId::new(slot_id);

    let request = {
        let suite = session.image.read().await;
        if suite.batch_running {
            return Err(ApiError::conflict("Batch generation is running"));
        }
        let slot = suite
            .batch
            .get(&slot_id)
            .ok_or_else(|| ApiError::not_found(format!("Image {} not found", slot_id)))?;
        if slot.is_loading() {
            return Err(ApiError::conflict(format!("Image {} is still generating", slot_id)));
        }
        EditRequest {
            mode: suite.mode,
            product_description: suite.product_description.clone(),
            reference: suite.reference.clone(),
            instruction: body.instruction.clone(),
        }
    };

    let url = render_edit(state.provider.as_ref(), &request)
        .instrument(info_span!("edit", session_id = %session_id, slot_id = %slot_id))
        .await?;

    let mut suite = session.image.write().await;
    let slot = suite
        .batch
        .apply_edit(&slot_id, url, body.instruction.trim())?;
    Ok(Json(slot.view()))
}
