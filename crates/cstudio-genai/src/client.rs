//! Gemini REST client.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use cstudio_models::InlineMedia;

use crate::config::GenAiConfig;
use crate::error::{GenAiError, GenAiResult};
use crate::provider::{
    GenerativeProvider, ImageRequest, OperationStatus, TextRequest, VideoOperation, VideoRequest,
};
use crate::types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Operation, Part,
    PredictLongRunningRequest, VideoImage, VideoInstance, VideoParameters,
};

/// Gemini API client.
pub struct GeminiClient {
    http: Client,
    config: GenAiConfig,
}

impl GeminiClient {
    /// Create a new Gemini client.
    pub fn new(config: GenAiConfig) -> GenAiResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(GenAiError::config("GEMINI_API_KEY not set"));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(GenAiError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> GenAiResult<Self> {
        Self::new(GenAiConfig::from_env())
    }

    pub fn config(&self) -> &GenAiConfig {
        &self.config
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.config.base_url, model, method)
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> GenAiResult<T> {
        let response = request
            .query(&[("key", self.config.api_key.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!(status, "Gemini API request failed");
            return Err(GenAiError::Api { status, body });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            GenAiError::invalid_response(format!("Failed to parse Gemini response: {}", e))
        })
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, url: &str, body: &B) -> GenAiResult<T> {
        self.send(self.http.post(url).json(body)).await
    }

    async fn generate_content(
        &self,
        model: &str,
        parts: Vec<Part>,
        generation_config: Option<GenerationConfig>,
    ) -> GenAiResult<GenerateContentResponse> {
        let url = self.model_url(model, "generateContent");
        debug!(model, parts = parts.len(), "Calling generateContent");

        let request = GenerateContentRequest {
            contents: vec![Content { role: None, parts }],
            generation_config,
        };

        let response: GenerateContentResponse = self.post(&url, &request).await?;
        if let Some(reason) = response.block_reason() {
            return Err(GenAiError::Blocked(reason.to_string()));
        }
        Ok(response)
    }
}

fn into_video_operation(op: Operation) -> VideoOperation {
    let video_uri = op.video_uri();
    VideoOperation {
        name: op.name,
        done: op.done,
        error: op.error.map(|s| OperationStatus {
            code: s.code,
            message: s.message,
        }),
        video_uri,
    }
}

#[async_trait]
impl GenerativeProvider for GeminiClient {
    async fn generate_text(&self, request: TextRequest) -> GenAiResult<String> {
        let mut parts = Vec::with_capacity(2);
        if let Some(media) = &request.media {
            parts.push(Part::media(media));
        }
        parts.push(Part::text(request.prompt));

        let generation_config = request.response_schema.map(|schema| GenerationConfig {
            response_mime_type: "application/json".to_string(),
            response_schema: Some(schema),
        });

        let response = self
            .generate_content(&self.config.text_model, parts, generation_config)
            .await?;
        Ok(response.text())
    }

    async fn generate_image(&self, request: ImageRequest) -> GenAiResult<InlineMedia> {
        let mut parts = Vec::with_capacity(2);
        if let Some(reference) = &request.reference {
            parts.push(Part::media(reference));
        }
        parts.push(Part::text(request.prompt));

        let response = self
            .generate_content(&self.config.image_model, parts, None)
            .await?;
        response.first_inline_data().ok_or(GenAiError::NoImageData)
    }

    async fn start_video(&self, request: VideoRequest) -> GenAiResult<VideoOperation> {
        let url = self.model_url(&self.config.video_model, "predictLongRunning");
        debug!(
            model = %self.config.video_model,
            aspect_ratio = %request.aspect_ratio,
            "Submitting video generation"
        );

        let body = PredictLongRunningRequest {
            instances: vec![VideoInstance {
                prompt: request.prompt,
                image: VideoImage {
                    bytes_base64_encoded: request.image.data,
                    mime_type: request.image.mime_type,
                },
            }],
            parameters: VideoParameters {
                aspect_ratio: request.aspect_ratio.as_str().to_string(),
                resolution: request.resolution.as_str().to_string(),
                sample_count: 1,
            },
        };

        let op: Operation = self.post(&url, &body).await?;
        Ok(into_video_operation(op))
    }

    async fn poll_video(&self, operation: &VideoOperation) -> GenAiResult<VideoOperation> {
        let url = format!("{}/{}", self.config.base_url, operation.name);
        let op: Operation = self.send(self.http.get(&url)).await?;
        Ok(into_video_operation(op))
    }

    fn authorize_video_uri(&self, uri: &str) -> String {
        match Url::parse(uri) {
            Ok(mut url) => {
                url.query_pairs_mut().append_pair("key", &self.config.api_key);
                url.into()
            }
            Err(_) => {
                let separator = if uri.contains('?') { '&' } else { '?' };
                format!("{}{}key={}", uri, separator, self.config.api_key)
            }
        }
    }

    fn is_configured(&self) -> bool {
        !self.config.api_key.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GeminiClient {
        GeminiClient::new(GenAiConfig::default().with_api_key("test-key")).unwrap()
    }

    #[test]
    fn test_missing_key_rejected() {
        assert!(matches!(
            GeminiClient::new(GenAiConfig::default()),
            Err(GenAiError::Config(_))
        ));
    }

    #[test]
    fn test_model_url() {
        assert_eq!(
            client().model_url("gemini-2.5-flash", "generateContent"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_authorize_appends_key() {
        let client = client();
        assert_eq!(
            client.authorize_video_uri("https://files.example/v1/files/abc:download?alt=media"),
            "https://files.example/v1/files/abc:download?alt=media&key=test-key"
        );
        assert_eq!(
            client.authorize_video_uri("https://files.example/abc"),
            "https://files.example/abc?key=test-key"
        );
    }
}
