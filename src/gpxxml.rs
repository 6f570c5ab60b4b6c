//! Minimal typed view of a GPX document.
//!
//! The markup is read once with quick-xml into a tree of [`Element`]s; ingestion
//! then walks that tree instead of searching the raw text. Names are stored by
//! local name, so `<gpx:rtept>` and `<rtept>` look the same.

use crate::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::borrow::Cow;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    fn from_start(start: &BytesStart) -> Result<Self> {
        let name = utf8(start.local_name().as_ref())?.to_string();

        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| {
                Error::MalformedDocument(format!("bad attribute in '{name}' element: {e}"))
            })?;
            let key = utf8(attr.key.local_name().as_ref())?.to_string();
            let value = unescape(utf8(&attr.value)?)?.into_owned();
            attributes.push((key, value));
        }

        Ok(Self {
            name,
            attributes,
            ..Default::default()
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First direct child with the given name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Direct children with the given name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Character content of this element, excluding its children, with surrounding
    /// whitespace removed.
    pub fn text(&self) -> &str {
        self.text.trim()
    }

    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(Element::text)
    }
}

/// Parses `input` into its root element. Returns `None` when the input holds no
/// element at all (empty or whitespace-only text).
pub fn parse_document(input: &[u8]) -> Result<Option<Element>> {
    let mut reader = Reader::from_reader(input);
    let mut buf = Vec::new();

    let mut open: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = match reader.read_event_into(&mut buf) {
            Err(source) => {
                return Err(Error::Xml {
                    position: reader.buffer_position() as u64,
                    source,
                });
            }
            Ok(Event::Eof) => break,
            Ok(event) => event.into_owned(),
        };

        match event {
            Event::Start(ref e) => {
                open.push(Element::from_start(e)?);
            }

            Event::Empty(ref e) => {
                let element = Element::from_start(e)?;
                attach(&mut open, &mut root, element);
            }

            Event::End(_) => {
                // quick-xml has already checked that the end tag matches.
                if let Some(element) = open.pop() {
                    attach(&mut open, &mut root, element);
                }
            }

            Event::Text(ref e) => {
                if let Some(current) = open.last_mut() {
                    current.text.push_str(utf8(e)?);
                }
            }

            Event::CData(ref e) => {
                if let Some(current) = open.last_mut() {
                    current.text.push_str(utf8(e)?);
                }
            }

            Event::GeneralRef(ref e) => {
                if let Some(current) = open.last_mut() {
                    let reference = format!("&{};", utf8(e)?);
                    current.text.push_str(&unescape(&reference)?);
                }
            }

            _ => {}
        }

        buf.clear();
    }

    if let Some(unclosed) = open.last() {
        return Err(Error::MalformedDocument(format!(
            "unclosed '{}' element",
            unclosed.name
        )));
    }

    Ok(root)
}

fn attach(open: &mut [Element], root: &mut Option<Element>, element: Element) {
    match open.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes)
        .map_err(|e| Error::MalformedDocument(format!("invalid UTF-8: {e}")))
}

fn unescape(raw: &str) -> Result<Cow<'_, str>> {
    quick_xml::escape::unescape(raw)
        .map_err(|e| Error::MalformedDocument(format!("bad escape sequence: {e}")))
}
