//! Video generation: submit one job and poll it until it finishes.
//!
//! Polling waits an interval before every status check and stops at
//! the first finished operation. The run is bounded by an attempt count
//! and an overall deadline, and aborts as soon as the cancellation token
//! fires.

use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use cstudio_genai::{GenerativeProvider, VideoOperation, VideoRequest};
use cstudio_models::{AspectRatio, InlineMedia, MediaKind, Resolution};

use crate::error::{WorkflowError, WorkflowResult};
use crate::logging::FlowLogger;
use crate::metrics::{record_generation, record_video_poll};
use crate::observer::VideoObserver;

/// Bounds of the status-polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay before each status check
    pub interval: Duration,
    pub max_attempts: u32,
    /// Overall deadline measured from submission
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 120,
            timeout: Duration::from_secs(15 * 60),
        }
    }
}

impl PollPolicy {
    /// Load from `VIDEO_POLL_INTERVAL_SECS`, `VIDEO_POLL_MAX_ATTEMPTS` and
    /// `VIDEO_POLL_TIMEOUT_SECS`, falling back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            interval: std::env::var("VIDEO_POLL_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.interval),
            max_attempts: std::env::var("VIDEO_POLL_MAX_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_attempts),
            timeout: std::env::var("VIDEO_POLL_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }
}

/// One video generation job.
#[derive(Debug, Clone)]
pub struct VideoJob {
    /// Seed image (the product photo)
    pub image: InlineMedia,
    pub prompt: String,
    pub aspect_ratio: AspectRatio,
    pub resolution: Resolution,
}

impl VideoJob {
    pub fn new(image: InlineMedia, prompt: impl Into<String>) -> Self {
        Self {
            image,
            prompt: prompt.into(),
            aspect_ratio: AspectRatio::default(),
            resolution: Resolution::default(),
        }
    }

    pub fn validate(&self) -> WorkflowResult<()> {
        self.image.ensure_kind(MediaKind::Image)?;
        if self.prompt.trim().is_empty() {
            return Err(WorkflowError::validation("Video prompt is empty"));
        }
        Ok(())
    }

    fn to_request(&self) -> VideoRequest {
        VideoRequest {
            prompt: self.prompt.trim().to_string(),
            image: self.image.clone(),
            aspect_ratio: self.aspect_ratio,
            resolution: self.resolution,
        }
    }
}

/// Progress events of a video run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum VideoProgress {
    Preparing,
    Submitting,
    Rendering { attempt: u32 },
    Completed,
}

impl VideoProgress {
    /// Label shown next to the spinner.
    pub fn label(&self) -> &'static str {
        match self {
            VideoProgress::Preparing => "检查 API Key 权限...",
            VideoProgress::Submitting => "提交视频生成任务...",
            VideoProgress::Rendering { .. } => "Veo 正在渲染视频 (约需 1-2 分钟)...",
            VideoProgress::Completed => "生成完成！",
        }
    }
}

/// Label of a failed run.
pub fn failure_label(error: &WorkflowError) -> String {
    format!("生成失败: {}", error)
}

/// Run `job` to completion and return the authorized video URL.
#[instrument(skip_all, fields(aspect_ratio = %job.aspect_ratio, resolution = %job.resolution))]
pub async fn generate_video(
    provider: &dyn GenerativeProvider,
    job: &VideoJob,
    policy: &PollPolicy,
    cancel: &CancellationToken,
    observer: &dyn VideoObserver,
) -> WorkflowResult<String> {
    job.validate()?;
    let logger = FlowLogger::new("video");
    logger.log_start(&format!(
        "interval={}s max_attempts={} timeout={}s",
        policy.interval.as_secs(),
        policy.max_attempts,
        policy.timeout.as_secs()
    ));

    let started = Instant::now();
    let result = run(provider, job, policy, cancel, observer, started).await;
    record_generation(
        "video",
        result.is_ok(),
        started.elapsed().as_secs_f64(),
    );

    match &result {
        Ok(_) => logger.log_completion("video ready"),
        Err(WorkflowError::Cancelled) => logger.log_warning("cancelled"),
        Err(e) => logger.log_error(&e.to_string()),
    }
    result
}

async fn run(
    provider: &dyn GenerativeProvider,
    job: &VideoJob,
    policy: &PollPolicy,
    cancel: &CancellationToken,
    observer: &dyn VideoObserver,
    started: Instant,
) -> WorkflowResult<String> {
    observer.video_progress(VideoProgress::Preparing).await;
    if !provider.is_configured() {
        return Err(WorkflowError::validation("Generative API key is not configured"));
    }

    observer.video_progress(VideoProgress::Submitting).await;
    let mut operation = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(WorkflowError::Cancelled),
        op = provider.start_video(job.to_request()) => op?,
    };
    debug!(operation = %operation.name, "Video job submitted");

    let deadline = started + policy.timeout;
    let timed_out = |attempts: u32| WorkflowError::PollTimeout {
        attempts,
        elapsed_secs: started.elapsed().as_secs(),
    };

    let mut attempts: u32 = 0;
    while !operation.done {
        if attempts >= policy.max_attempts || Instant::now() >= deadline {
            return Err(timed_out(attempts));
        }

        // Never sleep or wait on a poll past the overall deadline
        let wake = (Instant::now() + policy.interval).min(deadline);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(WorkflowError::Cancelled),
            _ = tokio::time::sleep_until(wake) => {}
        }
        if Instant::now() >= deadline {
            return Err(timed_out(attempts));
        }

        attempts += 1;
        observer
            .video_progress(VideoProgress::Rendering { attempt: attempts })
            .await;

        operation = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(WorkflowError::Cancelled),
            op = tokio::time::timeout_at(deadline, provider.poll_video(&operation)) => match op {
                Ok(op) => op?,
                Err(_) => return Err(timed_out(attempts)),
            },
        };
        record_video_poll();
        debug!(operation = %operation.name, attempt = attempts, done = operation.done, "Video job polled");
    }

    let uri = finished_uri(operation)?;
    observer.video_progress(VideoProgress::Completed).await;
    Ok(provider.authorize_video_uri(&uri))
}

fn finished_uri(operation: VideoOperation) -> WorkflowResult<String> {
    if let Some(status) = operation.error {
        return Err(WorkflowError::OperationFailed(format!(
            "{} (code {})",
            status.message, status.code
        )));
    }
    operation
        .video_uri
        .filter(|uri| !uri.is_empty())
        .ok_or(WorkflowError::MissingVideoUri)
}
