//! Script and reference-video analysis.

use tracing::instrument;

use cstudio_genai::{GenerativeProvider, TextRequest};
use cstudio_models::{InlineMedia, MediaKind, ScriptAnalysis};

use crate::error::{WorkflowError, WorkflowResult};
use crate::logging::FlowLogger;
use crate::metrics::record_generation;
use crate::prompts::{
    script_analysis_prompt, video_analysis_prompt, SCRIPT_ANALYSIS_EMPTY,
    SCRIPT_ANALYSIS_UNAVAILABLE, VIDEO_ANALYSIS_EMPTY, VIDEO_ANALYSIS_UNAVAILABLE,
};

/// What to analyze.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisSource {
    Script(String),
    Video(InlineMedia),
}

impl AnalysisSource {
    /// Pick the source from the user's inputs. A video takes precedence.
    pub fn select(script: Option<&str>, video: Option<InlineMedia>) -> WorkflowResult<Self> {
        if let Some(video) = video {
            video.ensure_kind(MediaKind::Video)?;
            return Ok(AnalysisSource::Video(video));
        }

        match script.map(str::trim) {
            Some(script) if !script.is_empty() => Ok(AnalysisSource::Script(script.to_string())),
            _ => Err(WorkflowError::validation(
                "Provide a script or a reference video to analyze",
            )),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AnalysisSource::Script(_) => "script",
            AnalysisSource::Video(_) => "video",
        }
    }
}

/// Critique the source and extract a video prompt from the answer.
#[instrument(skip_all, fields(source = source.kind()))]
pub async fn analyze(
    provider: &dyn GenerativeProvider,
    source: AnalysisSource,
) -> WorkflowResult<ScriptAnalysis> {
    let logger = FlowLogger::new("analysis");
    logger.log_start(source.kind());

    let (request, fallback, unavailable) = match source {
        AnalysisSource::Script(script) => (
            TextRequest::new(script_analysis_prompt(&script)),
            SCRIPT_ANALYSIS_EMPTY,
            SCRIPT_ANALYSIS_UNAVAILABLE,
        ),
        AnalysisSource::Video(video) => (
            TextRequest::new(video_analysis_prompt()).with_media(video),
            VIDEO_ANALYSIS_EMPTY,
            VIDEO_ANALYSIS_UNAVAILABLE,
        ),
    };

    let started = std::time::Instant::now();
    let result = provider.generate_text(request).await;
    record_generation("analysis", result.is_ok(), started.elapsed().as_secs_f64());

    let text = result.map_err(|source| {
        logger.log_error(&source.to_string());
        WorkflowError::AnalysisFailed {
            label: unavailable,
            source,
        }
    })?;

    let text = if text.trim().is_empty() {
        logger.log_warning("Model returned no analysis");
        fallback.to_string()
    } else {
        text
    };

    let analysis = ScriptAnalysis::from_text(text);
    logger.log_completion(if analysis.video_prompt.is_some() {
        "video prompt extracted"
    } else {
        "no video prompt"
    });
    Ok(analysis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedProvider;
    use cstudio_genai::GenAiError;
    use cstudio_models::VIDEO_PROMPT_MARKER;

    #[test]
    fn test_select_prefers_video() {
        let video = InlineMedia::new("video/mp4", "AAAA");
        let source = AnalysisSource::select(Some("脚本"), Some(video.clone())).unwrap();
        assert_eq!(source, AnalysisSource::Video(video));
    }

    #[test]
    fn test_select_requires_input() {
        assert!(AnalysisSource::select(Some("  "), None).unwrap_err().is_validation());
        assert!(AnalysisSource::select(None, None).is_err());
    }

    #[test]
    fn test_select_rejects_non_video() {
        let image = InlineMedia::new("image/png", "AAAA");
        let err = AnalysisSource::select(None, Some(image)).unwrap_err();
        assert!(matches!(err, WorkflowError::Media(_)));
    }

    #[tokio::test]
    async fn test_script_analysis_extracts_prompt() {
        let answer = format!("【优化建议】\n1. 开头更快\n\n{VIDEO_PROMPT_MARKER}\n  A bottle on a marble table  ");
        let provider = ScriptedProvider::new().with_text(answer.clone());

        let analysis = analyze(&provider, AnalysisSource::Script("开箱".to_string()))
            .await
            .unwrap();

        assert_eq!(analysis.text, answer);
        assert_eq!(
            analysis.video_prompt.as_deref(),
            Some("A bottle on a marble table")
        );
        let sent = provider.text_requests();
        assert!(sent[0].media.is_none());
        assert!(sent[0].prompt.contains("开箱"));
    }

    #[tokio::test]
    async fn test_video_analysis_is_multimodal() {
        let provider = ScriptedProvider::new().with_text("拆解");
        let video = InlineMedia::new("video/mp4", "AAAA");

        let analysis = analyze(&provider, AnalysisSource::Video(video)).await.unwrap();

        assert_eq!(analysis.video_prompt, None);
        assert!(provider.text_requests()[0].media.is_some());
    }

    #[tokio::test]
    async fn test_request_failure_carries_fallback_label() {
        let provider = ScriptedProvider::new().with_text_error(GenAiError::Api {
            status: 500,
            body: "backend".to_string(),
        });
        let err = analyze(&provider, AnalysisSource::Script("x".to_string()))
            .await
            .unwrap_err();
        assert!(err.is_remote());
        assert!(err.to_string().starts_with(SCRIPT_ANALYSIS_UNAVAILABLE));

        let provider = ScriptedProvider::new().with_text_error(GenAiError::NoImageData);
        let video = InlineMedia::new("video/mp4", "AAAA");
        let err = analyze(&provider, AnalysisSource::Video(video)).await.unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::AnalysisFailed { label, .. } if label == VIDEO_ANALYSIS_UNAVAILABLE
        ));
    }

    #[tokio::test]
    async fn test_empty_answer_falls_back() {
        let provider = ScriptedProvider::new().with_text("");
        let analysis = analyze(&provider, AnalysisSource::Script("x".to_string()))
            .await
            .unwrap();
        assert_eq!(analysis.text, SCRIPT_ANALYSIS_EMPTY);

        let provider = ScriptedProvider::new().with_text(" ");
        let video = InlineMedia::new("video/mp4", "AAAA");
        let analysis = analyze(&provider, AnalysisSource::Video(video)).await.unwrap();
        assert_eq!(analysis.text, VIDEO_ANALYSIS_EMPTY);
        assert_eq!(analysis.video_prompt, None);
    }
}
