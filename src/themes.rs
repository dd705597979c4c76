//! Theme Catalog - Named Presets
//!
//! The first preset is the default theme for fallback decks and for
//! generated decks that arrive without a theme.

use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::model::Theme;
use crate::validation::string_at;

pub const DEFAULT_PRIMARY_COLOR: &str = "#1a5276";
pub const DEFAULT_SECONDARY_COLOR: &str = "#2ecc71";
pub const DEFAULT_ACCENT_COLOR: &str = "#e74c3c";
pub const DEFAULT_FONT_FAMILY: &str = "Inter, sans-serif";
pub const CUSTOM_THEME_NAME: &str = "Custom Theme";

fn preset(name: &str, primary: &str, secondary: &str, accent: &str, font: &str) -> Theme {
    Theme {
        name: name.to_string(),
        primary_color: primary.to_string(),
        secondary_color: secondary.to_string(),
        font_family: font.to_string(),
        accent_color: Some(accent.to_string()),
    }
}

/// The five built-in presets, in catalog order.
pub fn presets() -> Vec<Theme> {
    vec![
        preset("Corporate Blue", "#2c3e50", "#3498db", "#e74c3c", "Inter, sans-serif"),
        preset("Minimal Light", "#ffffff", "#f8f9fa", "#6c5ce7", "Inter, sans-serif"),
        preset("Dark Elegance", "#1a1a2e", "#16213e", "#e94560", "Poppins, sans-serif"),
        preset("Nature Green", "#2d6a4f", "#40916c", "#d8f3dc", "Montserrat, sans-serif"),
        preset("Vibrant Orange", "#ff9a00", "#ff7b00", "#ffffff", "Roboto, sans-serif"),
    ]
}

/// First preset ("Corporate Blue").
pub fn default_theme() -> Theme {
    presets().remove(0)
}

/// Normalize an untrusted theme object. Missing, empty or non-string fields
/// take the documented defaults; nothing is rejected.
pub fn normalize(candidate: &Value) -> Theme {
    let field = |key: &str, default: &str| {
        string_at(candidate, key)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| default.to_string())
    };
    Theme {
        name: field("name", CUSTOM_THEME_NAME),
        primary_color: field("primaryColor", DEFAULT_PRIMARY_COLOR),
        secondary_color: field("secondaryColor", DEFAULT_SECONDARY_COLOR),
        font_family: field("fontFamily", DEFAULT_FONT_FAMILY),
        accent_color: Some(field("accentColor", DEFAULT_ACCENT_COLOR)),
    }
}

/// Theme catalog - presets plus any themes loaded from disk
#[derive(Debug, Clone)]
pub struct ThemeCatalog {
    themes: Vec<Theme>,
}

impl ThemeCatalog {
    pub fn new() -> Self {
        Self { themes: presets() }
    }

    /// Presets plus every `*.json` theme in `dir`. Unreadable or invalid
    /// files are skipped.
    pub fn load_from_dir(dir: &Path) -> Result<Self, std::io::Error> {
        let mut catalog = Self::new();
        if dir.exists() {
            let mut paths: Vec<_> = fs::read_dir(dir)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.extension().map_or(false, |e| e == "json"))
                .collect();
            paths.sort();

            for path in paths {
                let Ok(content) = fs::read_to_string(&path) else {
                    tracing::warn!(path = %path.display(), "Skipping unreadable theme file");
                    continue;
                };
                match serde_json::from_str::<Value>(&content) {
                    Ok(value) if value.is_object() => catalog.register(normalize(&value)),
                    _ => tracing::warn!(path = %path.display(), "Skipping invalid theme file"),
                }
            }
        }
        Ok(catalog)
    }

    pub fn get(&self, name: &str) -> Option<&Theme> {
        self.themes.iter().find(|t| t.name == name)
    }

    pub fn list(&self) -> &[Theme] {
        &self.themes
    }

    pub fn first(&self) -> &Theme {
        &self.themes[0]
    }

    /// Adds a theme, replacing any existing theme of the same name.
    pub fn register(&mut self, theme: Theme) {
        match self.themes.iter_mut().find(|t| t.name == theme.name) {
            Some(existing) => *existing = theme,
            None => self.themes.push(theme),
        }
    }
}

impl Default for ThemeCatalog {
    fn default() -> Self {
        Self::new()
    }
}
