//! Progress observers for the long-running flows.

use async_trait::async_trait;

use cstudio_models::ImageBatch;

use crate::video::VideoProgress;

/// Receives the batch snapshot after initialization and after every slot.
#[async_trait]
pub trait BatchObserver: Send + Sync {
    async fn batch_updated(&self, batch: &ImageBatch);
}

/// Receives progress of a video generation run.
#[async_trait]
pub trait VideoObserver: Send + Sync {
    async fn video_progress(&self, progress: VideoProgress);
}
