//! Video generation state and output settings.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output aspect ratio supported by the video model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
pub enum AspectRatio {
    /// Landscape (16:9)
    #[serde(rename = "16:9")]
    Landscape,
    /// Portrait (9:16) for TikTok/Reels
    #[default]
    #[serde(rename = "9:16")]
    Portrait,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "16:9" => Ok(AspectRatio::Landscape),
            "9:16" => Ok(AspectRatio::Portrait),
            other => Err(format!("Unsupported aspect ratio: {}, expected 16:9 or 9:16", other)),
        }
    }
}

/// Output resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
pub enum Resolution {
    #[default]
    #[serde(rename = "720p")]
    Hd,
    #[serde(rename = "1080p")]
    FullHd,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Hd => "720p",
            Resolution::FullHd => "1080p",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress of the single video generation attempt of a session.
///
/// Overwritten wholesale by [`VideoState::begin`] on each new attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoState {
    pub is_generating: bool,
    /// Free-text progress label shown next to the spinner
    pub progress_status: String,
    pub video_url: Option<String>,
    pub error: Option<String>,
}

impl VideoState {
    /// Fresh state for a new attempt.
    pub fn begin(label: impl Into<String>) -> Self {
        Self {
            is_generating: true,
            progress_status: label.into(),
            video_url: None,
            error: None,
        }
    }

    /// Update the progress label of a running attempt.
    pub fn progress(&mut self, label: impl Into<String>) {
        if self.is_generating {
            self.progress_status = label.into();
        }
    }

    pub fn succeed(&mut self, url: impl Into<String>, label: impl Into<String>) {
        self.is_generating = false;
        self.progress_status = label.into();
        self.video_url = Some(url.into());
        self.error = None;
    }

    pub fn fail(&mut self, error: impl Into<String>, label: impl Into<String>) {
        self.is_generating = false;
        self.progress_status = label.into();
        self.video_url = None;
        self.error = Some(error.into());
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_generating && (self.video_url.is_some() || self.error.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_ratio_parse() {
        assert_eq!("16:9".parse::<AspectRatio>().unwrap(), AspectRatio::Landscape);
        assert_eq!("9:16".parse::<AspectRatio>().unwrap(), AspectRatio::Portrait);
        assert!("1:1".parse::<AspectRatio>().is_err());
        assert_eq!(AspectRatio::default(), AspectRatio::Portrait);
    }

    #[test]
    fn test_resolution_serde() {
        assert_eq!(serde_json::to_string(&Resolution::Hd).unwrap(), "\"720p\"");
    }

    #[test]
    fn test_video_state_lifecycle() {
        let mut state = VideoState::begin("submitting");
        assert!(state.is_generating);
        assert!(!state.is_terminal());

        state.progress("rendering");
        assert_eq!(state.progress_status, "rendering");

        state.succeed("https://example.com/v.mp4?key=k", "done");
        assert!(state.is_terminal());
        assert!(state.error.is_none());

        // Progress after completion is ignored
        state.progress("late");
        assert_eq!(state.progress_status, "done");

        let state = VideoState::begin("again");
        assert!(state.video_url.is_none());
    }

    #[test]
    fn test_video_state_failure() {
        let mut state = VideoState::begin("submitting");
        state.fail("quota exceeded", "failed");
        assert!(!state.is_generating);
        assert_eq!(state.error.as_deref(), Some("quota exceeded"));
        assert!(state.video_url.is_none());
    }

    #[test]
    fn test_video_state_camel_case() {
        let json = serde_json::to_value(VideoState::default()).unwrap();
        assert!(json.get("isGenerating").is_some());
        assert!(json.get("progressStatus").is_some());
        assert!(json.get("videoUrl").is_some());
    }
}
