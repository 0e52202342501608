//! Template discovery and tokenization

use crate::error::{Error, Result};
use regex::Regex;

/// Finds coordinate templates in record text
#[derive(Debug, Clone)]
pub struct TemplateMatcher {
    /// `{{` + tag + `|`, case-insensitive
    opening: Regex,
}

impl TemplateMatcher {
    /// Compile a matcher for templates named `tag`
    pub fn new(tag: &str) -> Result<Self> {
        let pattern = format!(r"(?i)\{{\{{\s*{}\s*\|", regex::escape(tag.trim()));
        let opening = Regex::new(&pattern)
            .map_err(|e| Error::Config(format!("invalid coordinate tag '{}': {}", tag, e)))?;
        Ok(Self { opening })
    }

    /// Whether the text contains at least one template opening
    pub fn is_match(&self, text: &str) -> bool {
        self.opening.is_match(text)
    }

    /// Bodies of every template in `text`, in order of appearance.
    ///
    /// A body starts after `{{` and ends at the next `}}`. Templates without a
    /// closing marker are skipped.
    pub fn bodies<'a>(&self, text: &'a str) -> Vec<&'a str> {
        self.opening
            .find_iter(text)
            .filter_map(|m| {
                let start = m.start() + 2;
                let len = text[start..].find("}}")?;
                Some(&text[start..start + len])
            })
            .collect()
    }
}

/// One `|`-separated template argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// `key=value` or `key:value`
    Keyword { key: &'a str, value: &'a str },
    /// Bare argument
    Positional(&'a str),
}

/// Split a template body into trimmed, non-empty tokens.
///
/// Whichever of `=` and `:` appears first separates key from value.
pub fn tokenize(body: &str) -> Vec<Token<'_>> {
    body.split('|')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| match t.find(['=', ':']) {
            Some(idx) if !t[..idx].trim().is_empty() => Token::Keyword {
                key: t[..idx].trim(),
                value: t[idx + 1..].trim(),
            },
            _ => Token::Positional(t),
        })
        .collect()
}
