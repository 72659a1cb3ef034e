//! Scene suggestions produced by the text model.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Number of scenes requested per suggestion round.
pub const SCENE_COUNT: usize = 9;

/// A suggested visual concept for one marketing image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SceneSuggestion {
    /// Short scene name shown on the card
    pub title: String,
    /// Detailed visual prompt (lighting, mood, background)
    pub description: String,
}

impl SceneSuggestion {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_deserialize() {
        let json = r#"[{"title":"Vanity","description":"Soft window light on a marble vanity"}]"#;
        let scenes: Vec<SceneSuggestion> = serde_json::from_str(json).unwrap();
        assert_eq!(scenes.len(), 1);
        assert_eq!(scenes[0].title, "Vanity");
    }

    #[test]
    fn test_scene_missing_field_rejected() {
        let json = r#"[{"title":"Vanity"}]"#;
        assert!(serde_json::from_str::<Vec<SceneSuggestion>>(json).is_err());
    }
}
