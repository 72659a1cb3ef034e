//! Script / reference-video analysis results.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Section heading the analysis prompt asks the model to put before the
/// video-generation prompt.
pub const VIDEO_PROMPT_MARKER: &str = "【Veo生成提示词】";

/// Free-text analysis plus the video prompt found in it, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScriptAnalysis {
    pub text: String,
    pub video_prompt: Option<String>,
}

impl ScriptAnalysis {
    /// Wrap raw model output, extracting the video prompt section.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let video_prompt = extract_video_prompt(&text);
        Self { text, video_prompt }
    }
}

/// Everything after the first [`VIDEO_PROMPT_MARKER`], trimmed.
///
/// Best-effort: a missing marker or an empty section yields `None` and the
/// user has to write the prompt by hand.
pub fn extract_video_prompt(text: &str) -> Option<String> {
    let (_, rest) = text.split_once(VIDEO_PROMPT_MARKER)?;
    let prompt = rest.trim();
    if prompt.is_empty() {
        None
    } else {
        Some(prompt.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_trimmed_section() {
        let text = "【优化建议】\n1. 开头更快\n\n【Veo生成提示词】\n  Cinematic close-up of the Product on marble, slow dolly in.  \n";
        assert_eq!(
            extract_video_prompt(text).as_deref(),
            Some("Cinematic close-up of the Product on marble, slow dolly in.")
        );
    }

    #[test]
    fn test_keeps_multiline_content_after_marker() {
        let text = "【Veo生成提示词】 line one\nline two";
        assert_eq!(extract_video_prompt(text).as_deref(), Some("line one\nline two"));
    }

    #[test]
    fn test_missing_marker_is_soft_failure() {
        assert_eq!(extract_video_prompt("no sections here"), None);
        let analysis = ScriptAnalysis::from_text("just advice");
        assert_eq!(analysis.text, "just advice");
        assert!(analysis.video_prompt.is_none());
    }

    #[test]
    fn test_empty_section_is_none() {
        assert_eq!(extract_video_prompt("建议...\n【Veo生成提示词】\n   \n"), None);
    }

    #[test]
    fn test_first_marker_wins() {
        let text = "【Veo生成提示词】 A 【Veo生成提示词】 B";
        assert_eq!(
            extract_video_prompt(text).as_deref(),
            Some("A 【Veo生成提示词】 B")
        );
    }
}
