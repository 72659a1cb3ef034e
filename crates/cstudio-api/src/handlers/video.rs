//! Video suite handlers.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use cstudio_models::{AspectRatio, InlineMedia, MediaKind, Resolution, VideoState};
use cstudio_workflow::video::failure_label;
use cstudio_workflow::{
    analyze, generate_video, AnalysisSource, VideoJob, VideoObserver, VideoProgress, WorkflowError,
};

use crate::error::{ApiError, ApiResult};
use crate::session::{Session, VideoSuiteView};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProductImageBody {
    /// Product photo as a data URI
    pub image: String,
}

/// Set the seed image for video generation.
pub async fn set_product_image(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(body): Json<ProductImageBody>,
) -> ApiResult<Json<VideoSuiteView>> {
    let session = state.sessions.get(session_id).await?;

    let image = InlineMedia::from_data_uri(&body.image)?;
    image.ensure_kind(MediaKind::Image)?;

    let mut suite = session.video.write().await;
    suite.product_image = Some(image);
    Ok(Json(suite.view()))
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeBody {
    pub script: Option<String>,
    /// Sample video as a data URI
    pub video: Option<String>,
}

/// Analyze a script or sample video and adopt the extracted prompt.
pub async fn analyze_source(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(body): Json<AnalyzeBody>,
) -> ApiResult<Json<VideoSuiteView>> {
    let session = state.sessions.get(session_id).await?;

    let video = body
        .video
        .as_deref()
        .filter(|uri| !uri.trim().is_empty())
        .map(InlineMedia::from_data_uri)
        .transpose()?;
    let source = AnalysisSource::select(body.script.as_deref(), video)?;

    if matches!(source, AnalysisSource::Video(_)) {
        let mut suite = session.video.write().await;
        suite.analysis = None;
        suite.prompt.clear();
    }

    let analysis = analyze(state.provider.as_ref(), source)
        .instrument(info_span!("analysis", session_id = %session_id))
        .await?;

    let mut suite = session.video.write().await;
    if let Some(prompt) = &analysis.video_prompt {
        suite.prompt = prompt.clone();
    }
    suite.analysis = Some(analysis);
    Ok(Json(suite.view()))
}

#[derive(Debug, Deserialize)]
pub struct PromptBody {
    pub prompt: String,
}

/// Replace the video prompt with the user's edit.
pub async fn set_prompt(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(body): Json<PromptBody>,
) -> ApiResult<Json<VideoSuiteView>> {
    let session = state.sessions.get(session_id).await?;
    let mut suite = session.video.write().await;
    suite.prompt = body.prompt;
    Ok(Json(suite.view()))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerateVideoBody {
    pub aspect_ratio: AspectRatio,
    pub resolution: Resolution,
}

/// Publishes video progress labels into the session.
struct SessionVideoObserver {
    session: Arc<Session>,
}

#[async_trait]
impl VideoObserver for SessionVideoObserver {
    async fn video_progress(&self, progress: VideoProgress) {
        self.session.video.write().await.state.progress(progress.label());
    }
}

/// Start video generation in the background.
pub async fn start_generation(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(body): Json<GenerateVideoBody>,
) -> ApiResult<(StatusCode, Json<VideoSuiteView>)> {
    let session = state.sessions.get(session_id).await?;

    let (job, view) = {
        let mut suite = session.video.write().await;
        if suite.state.is_generating {
            return Err(ApiError::conflict("Video generation is already running"));
        }
        let image = suite
            .product_image
            .clone()
            .ok_or_else(|| WorkflowError::validation("Upload a product image first"))?;

        let job = VideoJob {
            image,
            prompt: suite.prompt.clone(),
            aspect_ratio: body.aspect_ratio,
            resolution: body.resolution,
        };
        job.validate()?;

        suite.state = VideoState::begin(VideoProgress::Preparing.label());
        (job, suite.view())
    };

    let provider = Arc::clone(&state.provider);
    let policy = state.poll_policy;
    let cancel = session.cancel.child_token();
    let observer = SessionVideoObserver {
        session: Arc::clone(&session),
    };
    info!(session_id = %session_id, aspect_ratio = %job.aspect_ratio, "Video generation started");

    tokio::spawn(
        async move {
            let result = generate_video(provider.as_ref(), &job, &policy, &cancel, &observer).await;
            let mut suite = observer.session.video.write().await;
            match result {
                Ok(url) => suite.state.succeed(url, VideoProgress::Completed.label()),
                Err(e) => {
                    error!("Video generation failed: {}", e);
                    suite.state.fail(e.to_string(), failure_label(&e));
                }
            }
        }
        .instrument(info_span!("video", session_id = %session_id)),
    );

    Ok((StatusCode::ACCEPTED, Json(view)))
}

/// Video state plus the current prompt.
pub async fn get_video(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<VideoSuiteView>> {
    let session = state.sessions.get(session_id).await?;
    let view = session.video.read().await.view();
    Ok(Json(view))
}
