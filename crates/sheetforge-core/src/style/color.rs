//! Color representation

use std::fmt;

/// A color as stored in a style record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Color {
    /// No explicit color; the application picks one
    #[default]
    Auto,

    /// RGB color, written with an opaque alpha
    Rgb { r: u8, g: u8, b: u8 },

    /// ARGB color, as read back from a document
    Argb { a: u8, r: u8, g: u8, b: u8 },

    /// Legacy palette index (64 is the system foreground)
    Indexed(u8),
}

impl Color {
    /// Black
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    /// White
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    /// Light blue, used by the header fill preset
    pub const LIGHT_BLUE: Color = Color::rgb(0xAD, 0xD8, 0xE6);
    /// Dodger blue, used by the emphasized header fill preset
    pub const DODGER_BLUE: Color = Color::rgb(0x1E, 0x90, 0xFF);
    /// Palette slot the application maps to its foreground color
    pub const SYSTEM_FOREGROUND: Color = Color::Indexed(64);

    /// Create an RGB color
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color::Rgb { r, g, b }
    }

    /// Parse a hex string, with or without a leading `#` ("1E90FF", "#FF1E90FF")
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();

        match hex.len() {
            6 => Some(Color::Rgb {
                r: byte(0)?,
                g: byte(2)?,
                b: byte(4)?,
            }),
            8 => Some(Color::Argb {
                a: byte(0)?,
                r: byte(2)?,
                g: byte(4)?,
                b: byte(6)?,
            }),
            _ => None,
        }
    }

    /// Eight-character ARGB hex, or `None` for colors without an RGB value
    pub fn to_argb_hex(&self) -> Option<String> {
        match self {
            Color::Rgb { r, g, b } => Some(format!("FF{:02X}{:02X}{:02X}", r, g, b)),
            Color::Argb { a, r, g, b } => Some(format!("{:02X}{:02X}{:02X}{:02X}", a, r, g, b)),
            Color::Auto | Color::Indexed(_) => None,
        }
    }

    /// Check if color is automatic
    pub fn is_auto(&self) -> bool {
        matches!(self, Color::Auto)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Auto => write!(f, "auto"),
            Color::Rgb { r, g, b } => write!(f, "#{:02X}{:02X}{:02X}", r, g, b),
            Color::Argb { a, r, g, b } => write!(f, "#{:02X}{:02X}{:02X}{:02X}", a, r, g, b),
            Color::Indexed(i) => write!(f, "indexed({})", i),
        }
    }
}
