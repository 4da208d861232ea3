//! Theme colors, built-in defaults overridable from the `[theme]` config table

use ratatui::style::Color;

use crate::config::ThemeConfig;

/// Theme colors for the UI
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub accent: Color,      // Active borders, key hints
    pub danger: Color,      // Errors, destructive actions
    pub success: Color,     // "Copied!" feedback, generated labels
    pub warning: Color,     // Status messages
    pub text: Color,        // Primary text
    pub text_dim: Color,    // Hints, empty placeholders
    pub bg_selected: Color, // Selection background
    pub inactive: Color,    // Inactive borders
}

impl Default for Theme {
    fn default() -> Self {
        // Catppuccin-inspired
        Self {
            accent: Color::Rgb(250, 179, 135),
            danger: Color::Rgb(243, 139, 168),
            success: Color::Rgb(166, 218, 149),
            warning: Color::Rgb(249, 226, 175),
            text: Color::Rgb(205, 214, 244),
            text_dim: Color::Rgb(147, 153, 178),
            bg_selected: Color::Rgb(69, 71, 90),
            inactive: Color::Rgb(88, 91, 112),
        }
    }
}

impl Theme {
    /// Apply configured overrides on top of the defaults.
    /// Unparseable colors are logged and ignored.
    pub fn from_config(config: &ThemeConfig) -> Self {
        let base = Self::default();

        let pick = |name: &str, value: &Option<String>, fallback: Color| -> Color {
            match value.as_deref() {
                Some(hex) => Self::parse_hex_color(hex).unwrap_or_else(|| {
                    tracing::warn!("Ignoring invalid theme color {} = {:?}", name, hex);
                    fallback
                }),
                None => fallback,
            }
        };

        Self {
            accent: pick("accent", &config.accent, base.accent),
            danger: pick("danger", &config.danger, base.danger),
            success: pick("success", &config.success, base.success),
            warning: pick("warning", &config.warning, base.warning),
            text: pick("text", &config.text, base.text),
            text_dim: pick("text_dim", &config.text_dim, base.text_dim),
            bg_selected: pick("selected", &config.selected, base.bg_selected),
            inactive: pick("inactive", &config.inactive, base.inactive),
        }
    }

    /// Parse a hex color string (#RRGGBB or #RGB)
    fn parse_hex_color(s: &str) -> Option<Color> {
        let s = s.trim().trim_start_matches('#');
        if !s.is_ascii() {
            return None;
        }

        if s.len() == 6 {
            let r = u8::from_str_radix(&s[0..2], 16).ok()?;
            let g = u8::from_str_radix(&s[2..4], 16).ok()?;
            let b = u8::from_str_radix(&s[4..6], 16).ok()?;
            Some(Color::Rgb(r, g, b))
        } else if s.len() == 3 {
            let r = u8::from_str_radix(&s[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&s[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&s[2..3], 16).ok()? * 17;
            Some(Color::Rgb(r, g, b))
        } else {
            None
        }
    }
}
