//! Scripted in-memory provider for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use cstudio_genai::{
    GenAiError, GenAiResult, GenerativeProvider, ImageRequest, TextRequest, VideoOperation,
    VideoRequest,
};
use cstudio_models::{ImageBatch, InlineMedia};

use crate::observer::{BatchObserver, VideoObserver};
use crate::video::VideoProgress;

/// A call received by [`ScriptedProvider`].
#[derive(Debug, Clone)]
pub enum RecordedCall {
    Text(TextRequest),
    Image(ImageRequest),
    StartVideo(VideoRequest),
    PollVideo { name: String, at: Instant },
}

/// Provider that replays queued responses and records every call.
///
/// When a queue runs dry: text returns an empty string, images fail with
/// [`GenAiError::NoImageData`], video jobs start as `operations/test` and
/// polls report a finished job with a fixed URI.
#[derive(Default)]
pub struct ScriptedProvider {
    texts: Mutex<VecDeque<GenAiResult<String>>>,
    images: Mutex<VecDeque<GenAiResult<InlineMedia>>>,
    starts: Mutex<VecDeque<GenAiResult<VideoOperation>>>,
    polls: Mutex<VecDeque<GenAiResult<VideoOperation>>>,
    calls: Mutex<Vec<RecordedCall>>,
    image_delay: Option<Duration>,
    text_delay: Option<Duration>,
    poll_delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

pub const TEST_VIDEO_URI: &str = "https://files.test/v1/files/video:download?alt=media";

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        push(&self.texts, Ok(text.into()));
        self
    }

    pub fn with_text_error(self, error: GenAiError) -> Self {
        push(&self.texts, Err(error));
        self
    }

    pub fn with_image(self, mime_type: &str, data: &str) -> Self {
        push(&self.images, Ok(InlineMedia::new(mime_type, data)));
        self
    }

    pub fn with_image_error(self, error: GenAiError) -> Self {
        push(&self.images, Err(error));
        self
    }

    pub fn with_start(self, result: GenAiResult<VideoOperation>) -> Self {
        push(&self.starts, result);
        self
    }

    pub fn with_poll(self, result: GenAiResult<VideoOperation>) -> Self {
        push(&self.polls, result);
        self
    }

    /// Make every image request take `delay` before answering.
    pub fn with_image_delay(mut self, delay: Duration) -> Self {
        self.image_delay = Some(delay);
        self
    }

    /// Make every text request take `delay` before answering.
    pub fn with_text_delay(mut self, delay: Duration) -> Self {
        self.text_delay = Some(delay);
        self
    }

    /// Make every status poll take `delay` before answering.
    pub fn with_poll_delay(mut self, delay: Duration) -> Self {
        self.poll_delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn image_requests(&self) -> Vec<ImageRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                RecordedCall::Image(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    pub fn text_requests(&self) -> Vec<TextRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                RecordedCall::Text(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    /// Instants at which polls were received.
    pub fn poll_times(&self) -> Vec<Instant> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                RecordedCall::PollVideo { at, .. } => Some(at),
                _ => None,
            })
            .collect()
    }

    /// Highest number of image requests observed in flight at once.
    pub fn max_concurrent_images(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, call: RecordedCall) {
        self.calls.lock().unwrap().push(call);
    }
}

fn push<T>(queue: &Mutex<VecDeque<T>>, item: T) {
    queue.lock().unwrap().push_back(item);
}

fn pop<T>(queue: &Mutex<VecDeque<T>>) -> Option<T> {
    queue.lock().unwrap().pop_front()
}

/// Finished operation carrying [`TEST_VIDEO_URI`].
pub fn finished_operation(name: &str) -> VideoOperation {
    VideoOperation {
        name: name.to_string(),
        done: true,
        error: None,
        video_uri: Some(TEST_VIDEO_URI.to_string()),
    }
}

#[async_trait]
impl GenerativeProvider for ScriptedProvider {
    async fn generate_text(&self, request: TextRequest) -> GenAiResult<String> {
        self.record(RecordedCall::Text(request));
        if let Some(delay) = self.text_delay {
            tokio::time::sleep(delay).await;
        }
        pop(&self.texts).unwrap_or_else(|| Ok(String::new()))
    }

    async fn generate_image(&self, request: ImageRequest) -> GenAiResult<InlineMedia> {
        self.record(RecordedCall::Image(request));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.image_delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        pop(&self.images).unwrap_or(Err(GenAiError::NoImageData))
    }

    async fn start_video(&self, request: VideoRequest) -> GenAiResult<VideoOperation> {
        self.record(RecordedCall::StartVideo(request));
        pop(&self.starts).unwrap_or_else(|| Ok(VideoOperation::pending("operations/test")))
    }

    async fn poll_video(&self, operation: &VideoOperation) -> GenAiResult<VideoOperation> {
        self.record(RecordedCall::PollVideo {
            name: operation.name.clone(),
            at: Instant::now(),
        });
        if let Some(delay) = self.poll_delay {
            tokio::time::sleep(delay).await;
        }
        pop(&self.polls).unwrap_or_else(|| Ok(finished_operation(&operation.name)))
    }

    fn authorize_video_uri(&self, uri: &str) -> String {
        format!("{}&key=test-key", uri)
    }
}

/// Observer that keeps every batch snapshot.
#[derive(Default)]
pub struct BatchRecorder {
    snapshots: Mutex<Vec<ImageBatch>>,
}

impl BatchRecorder {
    pub fn snapshots(&self) -> Vec<ImageBatch> {
        self.snapshots.lock().unwrap().clone()
    }
}

#[async_trait]
impl BatchObserver for BatchRecorder {
    async fn batch_updated(&self, batch: &ImageBatch) {
        self.snapshots.lock().unwrap().push(batch.clone());
    }
}

/// Observer that keeps every video progress event.
#[derive(Default)]
pub struct VideoRecorder {
    events: Mutex<Vec<VideoProgress>>,
}

impl VideoRecorder {
    pub fn events(&self) -> Vec<VideoProgress> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl VideoObserver for VideoRecorder {
    async fn video_progress(&self, progress: VideoProgress) {
        self.events.lock().unwrap().push(progress);
    }
}
