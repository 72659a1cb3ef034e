//! Industry presets used to steer scene ideation.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Product industry selected by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Industry {
    /// Beauty and skincare
    #[default]
    Beauty,
    /// Apparel, shoes and bags
    Fashion,
    /// Home goods
    Home,
    /// Consumer electronics
    Electronics,
    /// Food and beverages
    Food,
    /// Baby products and toys
    Toys,
    /// Free-form label supplied by the user
    Custom,
}

impl Industry {
    pub const ALL: &'static [Industry] = &[
        Industry::Beauty,
        Industry::Fashion,
        Industry::Home,
        Industry::Electronics,
        Industry::Food,
        Industry::Toys,
        Industry::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Industry::Beauty => "beauty",
            Industry::Fashion => "fashion",
            Industry::Home => "home",
            Industry::Electronics => "electronics",
            Industry::Food => "food",
            Industry::Toys => "toys",
            Industry::Custom => "custom",
        }
    }

    /// Label sent to the text model for preset industries.
    ///
    /// `None` for [`Industry::Custom`], whose label comes from the user.
    pub fn preset_label(&self) -> Option<&'static str> {
        match self {
            Industry::Beauty => Some("美妆护肤"),
            Industry::Fashion => Some("服装鞋包"),
            Industry::Home => Some("家居百货"),
            Industry::Electronics => Some("3C数码"),
            Industry::Food => Some("食品饮料"),
            Industry::Toys => Some("母婴玩具"),
            Industry::Custom => None,
        }
    }

    /// Resolve the label for the prompt, using `custom` for the custom industry.
    ///
    /// Returns `None` when a custom industry has no usable label.
    pub fn resolve_label(&self, custom: Option<&str>) -> Option<String> {
        match self.preset_label() {
            Some(label) => Some(label.to_string()),
            None => custom
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }
}

impl fmt::Display for Industry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Industry {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Industry::ALL
            .iter()
            .copied()
            .find(|i| i.as_str() == s.to_lowercase())
            .ok_or_else(|| format!("Unknown industry: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_labels() {
        assert_eq!(Industry::Beauty.resolve_label(None).unwrap(), "美妆护肤");
        assert_eq!(
            Industry::Electronics.resolve_label(Some("ignored")).unwrap(),
            "3C数码"
        );
    }

    #[test]
    fn test_custom_label() {
        assert_eq!(
            Industry::Custom.resolve_label(Some("  宠物用品 ")).unwrap(),
            "宠物用品"
        );
        assert!(Industry::Custom.resolve_label(Some("   ")).is_none());
        assert!(Industry::Custom.resolve_label(None).is_none());
    }

    #[test]
    fn test_industry_parse() {
        assert_eq!("FOOD".parse::<Industry>().unwrap(), Industry::Food);
        assert!("cars".parse::<Industry>().is_err());
    }
}
