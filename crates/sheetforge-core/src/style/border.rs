//! Border records

use super::Color;

/// Border entry of the style catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Border {
    pub left: Option<BorderEdge>,
    pub right: Option<BorderEdge>,
    pub top: Option<BorderEdge>,
    pub bottom: Option<BorderEdge>,
}

impl Border {
    /// Create a border with no edges
    pub fn new() -> Self {
        Self::default()
    }

    /// Same line on all four sides
    pub fn all(style: BorderLineStyle, color: Color) -> Self {
        let edge = BorderEdge::new(style, color);
        Self {
            left: edge,
            right: edge,
            top: edge,
            bottom: edge,
        }
    }

    /// Lines on the top and bottom sides only
    pub fn top_bottom(style: BorderLineStyle, color: Color) -> Self {
        let edge = BorderEdge::new(style, color);
        Self {
            top: edge,
            bottom: edge,
            ..Self::default()
        }
    }

    /// Check if no side carries a line
    pub fn is_empty(&self) -> bool {
        self.left.is_none() && self.right.is_none() && self.top.is_none() && self.bottom.is_none()
    }
}

/// A single border side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BorderEdge {
    pub style: BorderLineStyle,
    pub color: Color,
}

impl BorderEdge {
    /// Create an edge; `BorderLineStyle::None` yields no edge at all
    pub fn new(style: BorderLineStyle, color: Color) -> Option<Self> {
        (style != BorderLineStyle::None).then_some(Self { style, color })
    }
}

/// Border line styles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BorderLineStyle {
    #[default]
    None,
    Thin,
    Medium,
    Thick,
    Dashed,
    Dotted,
    Double,
    Hair,
    MediumDashed,
    DashDot,
    MediumDashDot,
    DashDotDot,
    MediumDashDotDot,
    SlantDashDot,
}

impl BorderLineStyle {
    /// Name used by the `style` attribute of a border side
    pub fn as_str(&self) -> &'static str {
        match self {
            BorderLineStyle::None => "none",
            BorderLineStyle::Thin => "thin",
            BorderLineStyle::Medium => "medium",
            BorderLineStyle::Thick => "thick",
            BorderLineStyle::Dashed => "dashed",
            BorderLineStyle::Dotted => "dotted",
            BorderLineStyle::Double => "double",
            BorderLineStyle::Hair => "hair",
            BorderLineStyle::MediumDashed => "mediumDashed",
            BorderLineStyle::DashDot => "dashDot",
            BorderLineStyle::MediumDashDot => "mediumDashDot",
            BorderLineStyle::DashDotDot => "dashDotDot",
            BorderLineStyle::MediumDashDotDot => "mediumDashDotDot",
            BorderLineStyle::SlantDashDot => "slantDashDot",
        }
    }

    /// Parse a `style` attribute; unknown names map to `None`
    pub fn from_name(name: &str) -> Self {
        match name {
            "thin" => BorderLineStyle::Thin,
            "medium" => BorderLineStyle::Medium,
            "thick" => BorderLineStyle::Thick,
            "dashed" => BorderLineStyle::Dashed,
            "dotted" => BorderLineStyle::Dotted,
            "double" => BorderLineStyle::Double,
            "hair" => BorderLineStyle::Hair,
            "mediumDashed" => BorderLineStyle::MediumDashed,
            "dashDot" => BorderLineStyle::DashDot,
            "mediumDashDot" => BorderLineStyle::MediumDashDot,
            "dashDotDot" => BorderLineStyle::DashDotDot,
            "mediumDashDotDot" => BorderLineStyle::MediumDashDotDot,
            "slantDashDot" => BorderLineStyle::SlantDashDot,
            _ => BorderLineStyle::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_line_has_no_edge() {
        let border = Border::all(BorderLineStyle::None, Color::SYSTEM_FOREGROUND);
        assert!(border.is_empty());
    }

    #[test]
    fn test_top_bottom() {
        let border = Border::top_bottom(BorderLineStyle::Thin, Color::Auto);
        assert!(border.left.is_none());
        assert!(border.right.is_none());
        assert_eq!(border.top.map(|e| e.style), Some(BorderLineStyle::Thin));
        assert_eq!(border.bottom.map(|e| e.style), Some(BorderLineStyle::Thin));
    }

    #[test]
    fn test_line_style_names() {
        for style in [
            BorderLineStyle::Thin,
            BorderLineStyle::MediumDashDotDot,
            BorderLineStyle::SlantDashDot,
        ] {
            assert_eq!(BorderLineStyle::from_name(style.as_str()), style);
        }
        assert_eq!(BorderLineStyle::from_name("bogus"), BorderLineStyle::None);
    }
}
