//! In-memory studio sessions.
//!
//! A session holds the state of the two studio suites for one browser tab.
//! Nothing is persisted; sessions disappear when deleted or when idle for
//! longer than the configured TTL.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use cstudio_models::{
    GenerationMode, ImageBatch, ImageSlotView, Industry, InlineMedia, SceneSuggestion,
    ScriptAnalysis, VideoState,
};

use crate::error::{ApiError, ApiResult};

/// Image suite state.
#[derive(Debug, Clone, Default)]
pub struct ImageSuite {
    pub mode: GenerationMode,
    pub industry: Industry,
    pub custom_industry: Option<String>,
    pub product_description: String,
    pub reference: Option<InlineMedia>,
    pub scenes: Vec<SceneSuggestion>,
    pub batch: ImageBatch,
    pub batch_running: bool,
    /// Bumped whenever scenes and images are invalidated
    pub source_generation: u64,
}

impl ImageSuite {
    /// Drop scenes and generated images.
    pub fn clear_results(&mut self) {
        self.scenes.clear();
        self.batch = ImageBatch::default();
        self.source_generation += 1;
    }

    pub fn can_generate_batch(&self) -> bool {
        !self.scenes.is_empty() && !self.batch_running
    }

    pub fn view(&self) -> ImageSuiteView {
        ImageSuiteView {
            mode: self.mode,
            industry: self.industry,
            custom_industry: self.custom_industry.clone(),
            product_description: self.product_description.clone(),
            has_reference: self.reference.is_some(),
            scenes: self.scenes.clone(),
            images: self.batch.views(),
            batch_running: self.batch_running,
            can_generate_batch: self.can_generate_batch(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSuiteView {
    pub mode: GenerationMode,
    pub industry: Industry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_industry: Option<String>,
    pub product_description: String,
    pub has_reference: bool,
    pub scenes: Vec<SceneSuggestion>,
    pub images: Vec<ImageSlotView>,
    pub batch_running: bool,
    pub can_generate_batch: bool,
}

/// Video suite state.
#[derive(Debug, Clone, Default)]
pub struct VideoSuite {
    pub product_image: Option<InlineMedia>,
    pub analysis: Option<ScriptAnalysis>,
    pub prompt: String,
    pub state: VideoState,
}

impl VideoSuite {
    pub fn view(&self) -> VideoSuiteView {
        VideoSuiteView {
            has_product_image: self.product_image.is_some(),
            analysis: self.analysis.clone(),
            prompt: self.prompt.clone(),
            state: self.state.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSuiteView {
    pub has_product_image: bool,
    pub analysis: Option<ScriptAnalysis>,
    pub prompt: String,
    #[serde(flatten)]
    pub state: VideoState,
}

/// One studio session.
#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Parent of every background task started for this session
    pub cancel: CancellationToken,
    pub image: RwLock<ImageSuite>,
    pub video: RwLock<VideoSuite>,
    last_seen: RwLock<Instant>,
}

impl Session {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            cancel: CancellationToken::new(),
            image: RwLock::new(ImageSuite::default()),
            video: RwLock::new(VideoSuite::default()),
            last_seen: RwLock::new(Instant::now()),
        }
    }

    pub async fn touch(&self) {
        *self.last_seen.write().await = Instant::now();
    }

    pub async fn idle_for(&self) -> Duration {
        self.last_seen.read().await.elapsed()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            created_at: self.created_at,
            images: self.image.read().await.view(),
            video: self.video.read().await.view(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub images: ImageSuiteView,
    pub video: VideoSuiteView,
}

/// Registry of live sessions.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<Session>>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn create(&self) -> Arc<Session> {
        let session = Arc::new(Session::new());
        self.sessions
            .write()
            .await
            .insert(session.id, Arc::clone(&session));
        info!(session_id = %session.id, "Session created");
        session
    }

    /// Look up a session and mark it as active.
    pub async fn get(&self, id: Uuid) -> ApiResult<Arc<Session>> {
        let session = self
            .sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::not_found(format!("Session {} not found", id)))?;
        session.touch().await;
        Ok(session)
    }

    /// Remove a session and cancel its background work.
    pub async fn remove(&self, id: Uuid) -> ApiResult<()> {
        let session = self
            .sessions
            .write()
            .await
            .remove(&id)
            .ok_or_else(|| ApiError::not_found(format!("Session {} not found", id)))?;
        session.cancel.cancel();
        info!(session_id = %id, "Session removed");
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Drop sessions idle longer than the TTL. Returns how many were dropped.
    pub async fn sweep_expired(&self) -> usize {
        let candidates: Vec<Arc<Session>> = self.sessions.read().await.values().cloned().collect();

        let mut expired = Vec::new();
        for session in candidates {
            if session.idle_for().await >= self.ttl {
                expired.push(session.id);
            }
        }
        if expired.is_empty() {
            return 0;
        }

        let mut sessions = self.sessions.write().await;
        let mut removed = 0;
        for id in expired {
            if let Some(session) = sessions.remove(&id) {
                session.cancel.cancel();
                removed += 1;
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_get_remove() {
        let store = SessionStore::new(Duration::from_secs(60));
        let session = store.create().await;

        assert_eq!(store.get(session.id).await.unwrap().id, session.id);
        assert_eq!(store.len().await, 1);

        store.remove(session.id).await.unwrap();
        assert!(session.cancel.is_cancelled());
        assert!(matches!(
            store.get(session.id).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_sweep_cancels_idle_sessions() {
        let store = SessionStore::new(Duration::ZERO);
        let session = store.create().await;
        let child = session.cancel.child_token();

        assert_eq!(store.sweep_expired().await, 1);
        assert!(store.is_empty().await);
        assert!(child.is_cancelled());
    }

    #[tokio::test]
    async fn test_sweep_keeps_active_sessions() {
        let store = SessionStore::new(Duration::from_secs(3600));
        store.create().await;
        assert_eq!(store.sweep_expired().await, 0);
        assert_eq!(store.len().await, 1);
    }

    #[test]
    fn test_clear_results_bumps_generation() {
        let mut suite = ImageSuite::default();
        suite.scenes.push(SceneSuggestion::new("t", "d"));
        let before = suite.source_generation;

        suite.clear_results();
        assert!(suite.scenes.is_empty());
        assert_eq!(suite.source_generation, before + 1);
    }

    #[test]
    fn test_batch_gate() {
        let mut suite = ImageSuite::default();
        assert!(!suite.can_generate_batch());

        suite.scenes.push(SceneSuggestion::new("t", "d"));
        assert!(suite.can_generate_batch());

        suite.batch_running = true;
        assert!(!suite.can_generate_batch());
    }
}
