//! Application state.

use std::sync::Arc;

use cstudio_genai::{GeminiClient, GenerativeProvider};
use cstudio_workflow::PollPolicy;

use crate::config::ApiConfig;
use crate::session::SessionStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub provider: Arc<dyn GenerativeProvider>,
    pub sessions: SessionStore,
    pub poll_policy: PollPolicy,
}

impl AppState {
    pub fn new(
        config: ApiConfig,
        provider: Arc<dyn GenerativeProvider>,
        poll_policy: PollPolicy,
    ) -> Self {
        let sessions = SessionStore::new(config.session_ttl);
        Self {
            config,
            provider,
            sessions,
            poll_policy,
        }
    }

    /// Create application state from environment variables.
    pub fn from_env(config: ApiConfig) -> anyhow::Result<Self> {
        let provider = GeminiClient::from_env()?;
        Ok(Self::new(config, Arc::new(provider), PollPolicy::from_env()))
    }
}
