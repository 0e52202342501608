//! Canonical coordinate selection and record building

use super::convert::convert;
use super::template::{tokenize, TemplateMatcher, Token};
use crate::config::MarkupConfig;
use crate::error::Result;
use crate::types::{is_coordinate_attribute, CoordinateRecord, RecordNum};
use std::collections::BTreeMap;
use tracing::debug;

/// Coordinates found on one record
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// Every template body, joined with the configured separator
    pub raw_coord_text: String,
    /// Record built from the canonical template
    pub record: CoordinateRecord,
}

/// Extracts structured coordinates from record bodies
#[derive(Debug, Clone)]
pub struct CoordinateExtractor {
    markup: MarkupConfig,
    matcher: TemplateMatcher,
}

impl CoordinateExtractor {
    /// Create an extractor for the given markup conventions
    pub fn new(markup: &MarkupConfig) -> Result<Self> {
        Ok(Self {
            matcher: TemplateMatcher::new(&markup.coord_tag)?,
            markup: markup.clone(),
        })
    }

    /// Quick check on raw record bytes before paying for a page parse
    pub fn contains_marker(&self, raw: &[u8]) -> bool {
        self.matcher.is_match(&String::from_utf8_lossy(raw))
    }

    /// Bodies of every coordinate template in `text`
    pub fn template_bodies<'a>(&self, text: &'a str) -> Vec<&'a str> {
        self.matcher.bodies(text)
    }

    /// Pick the template displayed next to the title, else the first one
    pub fn select_canonical<'a>(&self, bodies: &[&'a str]) -> Option<&'a str> {
        bodies
            .iter()
            .copied()
            .find(|body| self.is_title_template(body))
            .or_else(|| bodies.first().copied())
    }

    fn is_title_template(&self, body: &str) -> bool {
        tokenize(body).iter().any(|token| match token {
            Token::Keyword { key, value } => {
                key.eq_ignore_ascii_case("display") && self.markup.is_title_display(value)
            }
            Token::Positional(_) => false,
        })
    }

    /// Positional tokens that carry numeric or compass data
    pub fn positional<'a>(&self, tokens: &[Token<'a>]) -> Vec<&'a str> {
        tokens
            .iter()
            .filter_map(|token| match token {
                Token::Positional(value) if !self.markup.is_structural(value) => Some(*value),
                _ => None,
            })
            .collect()
    }

    /// Build a coordinate record from one template body.
    ///
    /// A conversion failure only clears the position; the record is kept.
    pub fn parse_template(&self, record_num: RecordNum, body: &str) -> CoordinateRecord {
        let tokens = tokenize(body);

        let position = match convert(&self.positional(&tokens)) {
            Ok(position) => position,
            Err(e) => {
                debug!("Record {}: coordinate '{}' not converted: {}", record_num, body, e);
                None
            }
        };

        let mut attributes = BTreeMap::new();
        for token in &tokens {
            if let Token::Keyword { key, value } = token {
                let key = key.to_ascii_lowercase();
                if is_coordinate_attribute(&key) {
                    attributes.entry(key).or_insert_with(|| value.to_string());
                }
            }
        }

        CoordinateRecord {
            record_num,
            raw_text: body.to_string(),
            position,
            on_title: self.is_title_template(body),
            attributes,
        }
    }

    /// Extract coordinates from a record body; `None` when it has no template
    pub fn extract(&self, record_num: RecordNum, text: &str) -> Option<Extraction> {
        let bodies = self.template_bodies(text);
        let canonical = self.select_canonical(&bodies)?;
        Some(Extraction {
            raw_coord_text: bodies.join(self.markup.raw_text_separator.as_str()),
            record: self.parse_template(record_num, canonical),
        })
    }
}
