//! Color parsing and WCAG contrast math.
//!
//! Relative luminance and contrast ratio follow WCAG 2.x:
//! <https://www.w3.org/TR/WCAG21/#dfn-relative-luminance>

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::ColorError;

/// A CSS color as read from a computed style
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Color {
    Hex { r: u8, g: u8, b: u8 },

    /// Alpha is kept for display only; it never enters the ratio
    Rgba { r: u8, g: u8, b: u8, a: f32 },
}

impl Color {
    /// The RGB triple, alpha discarded
    pub fn rgb(&self) -> (u8, u8, u8) {
        match *self {
            Color::Hex { r, g, b } => (r, g, b),
            Color::Rgba { r, g, b, .. } => (r, g, b),
        }
    }

    /// Parse a `#rrggbb` / `#rgb` hex color
    fn parse_hex(value: &str) -> Option<Self> {
        let hex = value.strip_prefix('#')?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }

        let (r, g, b) = match hex.len() {
            6 => (
                u8::from_str_radix(&hex[0..2], 16).ok()?,
                u8::from_str_radix(&hex[2..4], 16).ok()?,
                u8::from_str_radix(&hex[4..6], 16).ok()?,
            ),
            3 => (
                u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?,
                u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?,
                u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?,
            ),
            _ => return None,
        };

        Some(Color::Hex { r, g, b })
    }

    /// Parse `rgb(r, g, b)` / `rgba(r, g, b, a)` by splitting the arguments
    /// on commas and taking the first three integer components
    fn parse_rgba(value: &str) -> Option<Self> {
        static FUNCTION: OnceLock<Regex> = OnceLock::new();
        let re = FUNCTION.get_or_init(|| {
            Regex::new(r"^rgba?\((?P<args>[^)]*)\)$").expect("valid color regex")
        });

        let args = re.captures(value)?.name("args")?.as_str();
        let parts: Vec<&str> = args.split(',').map(str::trim).collect();
        if parts.len() < 3 {
            return None;
        }

        let r = parts[0].parse::<u8>().ok()?;
        let g = parts[1].parse::<u8>().ok()?;
        let b = parts[2].parse::<u8>().ok()?;
        let a = parts
            .get(3)
            .and_then(|a| a.parse::<f32>().ok())
            .unwrap_or(1.0);

        Some(Color::Rgba { r, g, b, a })
    }
}

impl FromStr for Color {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_ascii_lowercase();
        let parsed = if value.starts_with('#') {
            Self::parse_hex(&value)
        } else if value.starts_with("rgb") {
            Self::parse_rgba(&value)
        } else {
            None
        };

        parsed.ok_or_else(|| ColorError::Unparsable(s.to_string()))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Color::Hex { r, g, b } => write!(f, "#{:02x}{:02x}{:02x}", r, g, b),
            Color::Rgba { r, g, b, a } => write!(f, "rgba({}, {}, {}, {})", r, g, b, a),
        }
    }
}

/// sRGB channel to linear light
fn linearize(channel: u8) -> f64 {
    let c = f64::from(channel) / 255.0;
    if c <= 0.03928 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Relative luminance of an RGB triple, in `[0, 1]`
pub fn to_luminance((r, g, b): (u8, u8, u8)) -> f64 {
    0.2126 * linearize(r) + 0.7152 * linearize(g) + 0.0722 * linearize(b)
}

/// WCAG contrast ratio between two colors, in `[1, 21]`
pub fn contrast_ratio(c1: &Color, c2: &Color) -> f64 {
    let l1 = to_luminance(c1.rgb());
    let l2 = to_luminance(c2.rgb());
    (l1.max(l2) + 0.05) / (l1.min(l2) + 0.05)
}

/// Contrast ratio between two CSS color strings
pub fn contrast_ratio_str(c1: &str, c2: &str) -> Result<f64, ColorError> {
    let c1: Color = c1.parse()?;
    let c2: Color = c2.parse()?;
    Ok(contrast_ratio(&c1, &c2))
}
