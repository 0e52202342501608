//! Markup conventions of the dump
//!
//! Loaded once at startup and handed to the scanner, page reader and
//! coordinate extractor. Nothing reads these values from global state.

use serde::{Deserialize, Serialize};

/// Markup conventions for one dump language
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkupConfig {
    /// Line-anchored record opening marker
    pub page_open: String,
    /// Record closing marker, used to trim the final record
    pub page_close: String,
    /// Coordinate template name, matched case-insensitively
    pub coord_tag: String,
    /// Positional tokens that label axes rather than carry data
    pub structural_tokens: Vec<String>,
    /// Comma-separated `display` parts that mark the title coordinate
    pub title_display_parts: Vec<String>,
    /// Whole `display` values that mark the title coordinate
    pub title_display_values: Vec<String>,
    /// Separator used to join every template body found on a record
    pub raw_text_separator: String,
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            page_open: "<page>".to_string(),
            page_close: "</page>".to_string(),
            coord_tag: "coord".to_string(),
            structural_tokens: vec!["LAT".to_string(), "LONG".to_string()],
            title_display_parts: vec!["title".to_string(), "t".to_string()],
            title_display_values: vec!["it".to_string(), "ti".to_string()],
            raw_text_separator: "||".to_string(),
        }
    }
}

impl MarkupConfig {
    /// Whether a `display=` value places the coordinate next to the article title
    pub fn is_title_display(&self, display: &str) -> bool {
        let display = display.trim().to_ascii_lowercase();
        if self.title_display_values.iter().any(|v| v.eq_ignore_ascii_case(&display)) {
            return true;
        }
        display
            .split(',')
            .map(str::trim)
            .any(|part| self.title_display_parts.iter().any(|p| p.eq_ignore_ascii_case(part)))
    }

    /// Whether a positional token is the template name or an axis label
    pub fn is_structural(&self, token: &str) -> bool {
        token.eq_ignore_ascii_case(self.coord_tag.trim())
            || self.structural_tokens.iter().any(|s| s.eq_ignore_ascii_case(token))
    }
}
