//! Fill records

use super::Color;

/// Fill entry of the style catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Fill {
    /// No fill
    #[default]
    None,

    /// Pattern fill; a solid fill is the `Solid` pattern
    Pattern {
        pattern: PatternType,
        foreground: Option<Color>,
        background: Option<Color>,
    },
}

impl Fill {
    /// 12.5% gray pattern, required at fill index 1
    pub fn gray125() -> Self {
        Fill::Pattern {
            pattern: PatternType::Gray125,
            foreground: None,
            background: None,
        }
    }

    /// Solid fill with the same color in front and behind
    pub fn solid(color: Color) -> Self {
        Fill::Pattern {
            pattern: PatternType::Solid,
            foreground: Some(color),
            background: Some(color),
        }
    }

    /// Solid fill over the system foreground, as produced by region fills
    pub fn solid_over_auto(color: Color) -> Self {
        Fill::Pattern {
            pattern: PatternType::Solid,
            foreground: Some(color),
            background: Some(Color::SYSTEM_FOREGROUND),
        }
    }

    /// Pattern type of this fill
    pub fn pattern(&self) -> PatternType {
        match self {
            Fill::None => PatternType::None,
            Fill::Pattern { pattern, .. } => *pattern,
        }
    }

    /// Check if this is a "no fill"
    pub fn is_none(&self) -> bool {
        matches!(self, Fill::None)
    }
}

/// Pattern fill types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PatternType {
    #[default]
    None,
    Solid,
    MediumGray,
    DarkGray,
    LightGray,
    Gray125,
    Gray0625,
}

impl PatternType {
    /// Name used by the `patternType` attribute
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternType::None => "none",
            PatternType::Solid => "solid",
            PatternType::MediumGray => "mediumGray",
            PatternType::DarkGray => "darkGray",
            PatternType::LightGray => "lightGray",
            PatternType::Gray125 => "gray125",
            PatternType::Gray0625 => "gray0625",
        }
    }

    /// Parse a `patternType` attribute; unknown names map to `None`
    pub fn from_name(name: &str) -> Self {
        match name {
            "solid" => PatternType::Solid,
            "mediumGray" => PatternType::MediumGray,
            "darkGray" => PatternType::DarkGray,
            "lightGray" => PatternType::LightGray,
            "gray125" => PatternType::Gray125,
            "gray0625" => PatternType::Gray0625,
            _ => PatternType::None,
        }
    }
}
