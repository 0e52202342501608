//! Minimal `<page>` parsing

use crate::error::{Error, Result};
use crate::types::RecordNum;
use quick_xml::events::Event;
use quick_xml::reader::Reader;

/// Title and body of one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub title: String,
    /// Wikitext of the page revision
    pub body: String,
}

/// Element whose text is being collected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Body,
}

impl Page {
    /// Parse the title and revision text out of one record's XML.
    ///
    /// Anything else in the record is ignored. A record missing either
    /// element, or whose XML does not parse, is a `MalformedPage`.
    pub fn parse(xml: &str, record_num: RecordNum) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut title: Option<String> = None;
        let mut body: Option<String> = None;
        let mut in_revision = false;
        let mut current: Option<Field> = None;
        let mut text_buf = String::new();

        loop {
            let event = reader
                .read_event()
                .map_err(|e| Error::malformed(record_num, format!("invalid XML: {}", e)))?;

            match event {
                Event::Start(ref e) => match e.name().as_ref() {
                    b"revision" => in_revision = true,
                    b"title" if title.is_none() && !in_revision => {
                        current = Some(Field::Title);
                        text_buf.clear();
                    }
                    b"text" if in_revision && body.is_none() => {
                        current = Some(Field::Body);
                        text_buf.clear();
                    }
                    _ => {}
                },
                Event::Empty(ref e) => {
                    // `<text ... />` is an empty revision
                    if e.name().as_ref() == b"text" && in_revision && body.is_none() {
                        body = Some(String::new());
                    }
                }
                Event::Text(ref e) => {
                    if current.is_some() {
                        let text = e.unescape().map_err(|err| {
                            Error::malformed(record_num, format!("bad entity: {}", err))
                        })?;
                        text_buf.push_str(&text);
                    }
                }
                Event::CData(ref e) => {
                    if current.is_some() {
                        text_buf.push_str(&String::from_utf8_lossy(&e.to_vec()));
                    }
                }
                Event::End(ref e) => match (e.name().as_ref(), current) {
                    (b"title", Some(Field::Title)) => {
                        title = Some(std::mem::take(&mut text_buf));
                        current = None;
                    }
                    (b"text", Some(Field::Body)) => {
                        body = Some(std::mem::take(&mut text_buf));
                        current = None;
                    }
                    (b"revision", _) => in_revision = false,
                    (b"page", _) => break,
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }

        let title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::malformed(record_num, "missing <title>"))?;
        let body = body.ok_or_else(|| Error::malformed(record_num, "missing <revision><text>"))?;

        Ok(Self { title, body })
    }
}
