//! Gemini client configuration.

use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Configuration for the Gemini client.
#[derive(Clone)]
pub struct GenAiConfig {
    /// API key, sent as the `key` query parameter
    pub api_key: String,
    /// API root, without trailing slash
    pub base_url: String,
    /// Model for scene ideation and script analysis
    pub text_model: String,
    /// Model for image generation and editing
    pub image_model: String,
    /// Model for video generation
    pub video_model: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for GenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            text_model: "gemini-2.5-flash".to_string(),
            image_model: "gemini-2.5-flash-image".to_string(),
            video_model: "veo-3.1-fast-generate-preview".to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

impl std::fmt::Debug for GenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenAiConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("text_model", &self.text_model)
            .field("image_model", &self.image_model)
            .field("video_model", &self.video_model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GenAiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: std::env::var("GEMINI_API_KEY")
                .or_else(|_| std::env::var("API_KEY"))
                .unwrap_or_default(),
            base_url: std::env::var("GEMINI_BASE_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            text_model: std::env::var("GEMINI_TEXT_MODEL").unwrap_or(defaults.text_model),
            image_model: std::env::var("GEMINI_IMAGE_MODEL").unwrap_or(defaults.image_model),
            video_model: std::env::var("GEMINI_VIDEO_MODEL").unwrap_or(defaults.video_model),
            timeout: Duration::from_secs(
                std::env::var("GEMINI_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
        }
    }

    /// Same config pointed at another API root (used by tests and proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = GenAiConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.text_model, "gemini-2.5-flash");
        assert_eq!(config.timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = GenAiConfig::default().with_api_key("super-secret");
        assert!(!format!("{:?}", config).contains("super-secret"));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let config = GenAiConfig::default().with_base_url("http://localhost:9000/");
        assert_eq!(config.base_url, "http://localhost:9000");
    }
}
