//! Coordinate extraction from `{{Coord}}` templates
//!
//! The pipeline for one record body:
//!
//! 1. [`TemplateMatcher`] finds every coordinate template and cuts its body at
//!    the next `}}` (non-recursive: a nested `{{...}}` inside the body ends it
//!    early, which is kept as-is so results stay comparable across runs).
//! 2. [`CoordinateExtractor`] picks the canonical template, preferring one
//!    displayed next to the article title.
//! 3. [`tokenize`] splits the body into keyword and positional tokens.
//! 4. [`convert`] turns the positional tokens into decimal degrees.

mod convert;
mod extractor;
mod template;

pub use convert::convert;
pub use extractor::{CoordinateExtractor, Extraction};
pub use template::{tokenize, TemplateMatcher, Token};
