//! Forward-only markup writers.
//!
//! The renderer emits output exclusively through [`MarkupWriter`]. Two
//! implementations are provided:
//!
//! - [`XmlMarkupWriter`]: streams XAML text through `quick-xml`
//! - [`TreeWriter`]: builds an in-memory [`Element`] tree, convenient for
//!   inspecting output without parsing text back

use std::io::Write;

use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};

use crate::error::WriteError;

/// Streaming writer of nested markup.
///
/// Attributes must be written right after [`open_element`](Self::open_element),
/// before any content of that element.
pub trait MarkupWriter {
    /// Open a child element of the current element.
    fn open_element(&mut self, name: &str) -> Result<(), WriteError>;

    /// Add an attribute to the element opened last.
    fn attribute(&mut self, name: &str, value: &str) -> Result<(), WriteError>;

    /// Write escaped text content.
    fn text(&mut self, content: &str) -> Result<(), WriteError>;

    /// Write content that must reach the consumer verbatim (emitted as CDATA).
    fn raw_content(&mut self, content: &str) -> Result<(), WriteError>;

    /// Close the element opened last.
    fn close_element(&mut self) -> Result<(), WriteError>;

    /// Write a comment.
    fn comment(&mut self, text: &str) -> Result<(), WriteError>;

    /// Number of currently open elements.
    fn depth(&self) -> usize;
}

/// [`MarkupWriter`] producing XML text.
pub struct XmlMarkupWriter<W: Write> {
    writer: Writer<W>,
    /// Names of open elements, innermost last.
    open: Vec<String>,
    /// Start tag still accepting attributes.
    pending: Option<BytesStart<'static>>,
    finished: bool,
}

impl<W: Write> XmlMarkupWriter<W> {
    /// Create a writer producing compact output.
    pub fn new(inner: W) -> Self {
        Self::from_writer(Writer::new(inner))
    }

    /// Create a writer indenting nested elements by `indent` spaces.
    pub fn with_indent(inner: W, indent: usize) -> Self {
        Self::from_writer(Writer::new_with_indent(inner, b' ', indent))
    }

    fn from_writer(writer: Writer<W>) -> Self {
        Self {
            writer,
            open: Vec::new(),
            pending: None,
            finished: false,
        }
    }

    fn emit(&mut self, event: Event<'_>) -> Result<(), WriteError> {
        self.writer
            .write_event(event)
            .map_err(|e| WriteError::Xml(e.to_string()))
    }

    fn check_open(&self) -> Result<(), WriteError> {
        if self.finished {
            Err(WriteError::Finished)
        } else {
            Ok(())
        }
    }

    /// Write the pending start tag, if any; its element now has content.
    fn flush_pending(&mut self) -> Result<(), WriteError> {
        if let Some(start) = self.pending.take() {
            self.emit(Event::Start(start))?;
        }
        Ok(())
    }

    /// Close every element still open.
    ///
    /// Calling `finish` more than once is a no-op.
    pub fn finish(&mut self) -> Result<(), WriteError> {
        if self.finished {
            return Ok(());
        }
        while !self.open.is_empty() {
            self.close_element()?;
        }
        self.finished = true;
        Ok(())
    }

    /// Finish and return the underlying sink.
    pub fn into_inner(mut self) -> Result<W, WriteError> {
        self.finish()?;
        Ok(self.writer.into_inner())
    }
}

impl XmlMarkupWriter<Vec<u8>> {
    /// Finish and return the output as a string.
    pub fn into_string(self) -> Result<String, WriteError> {
        let bytes = self.into_inner()?;
        String::from_utf8(bytes).map_err(|e| WriteError::Xml(e.to_string()))
    }
}

impl<W: Write> MarkupWriter for XmlMarkupWriter<W> {
    fn open_element(&mut self, name: &str) -> Result<(), WriteError> {
        self.check_open()?;
        self.flush_pending()?;
        self.pending = Some(BytesStart::new(name.to_owned()));
        self.open.push(name.to_owned());
        Ok(())
    }

    fn attribute(&mut self, name: &str, value: &str) -> Result<(), WriteError> {
        self.check_open()?;
        match self.pending.as_mut() {
            Some(start) => {
                start.push_attribute((name, value));
                Ok(())
            }
            None => Err(WriteError::MisplacedAttribute(name.to_owned())),
        }
    }

    fn text(&mut self, content: &str) -> Result<(), WriteError> {
        self.check_open()?;
        self.flush_pending()?;
        self.emit(Event::Text(BytesText::new(content)))
    }

    fn raw_content(&mut self, content: &str) -> Result<(), WriteError> {
        self.check_open()?;
        self.flush_pending()?;
        for section in cdata_sections(content) {
            self.emit(Event::CData(BytesCData::new(section)))?;
        }
        Ok(())
    }

    fn close_element(&mut self) -> Result<(), WriteError> {
        self.check_open()?;
        let name = self.open.pop().ok_or(WriteError::NoOpenElement)?;
        match self.pending.take() {
            Some(start) => self.emit(Event::Empty(start)),
            None => self.emit(Event::End(BytesEnd::new(name))),
        }
    }

    fn comment(&mut self, text: &str) -> Result<(), WriteError> {
        self.check_open()?;
        self.flush_pending()?;
        let text = sanitize_comment(text);
        self.emit(Event::Comment(BytesText::from_escaped(text)))
    }

    fn depth(&self) -> usize {
        self.open.len()
    }
}

/// Split `content` so that no section contains the `]]>` terminator.
fn cdata_sections(content: &str) -> Vec<String> {
    let parts: Vec<&str> = content.split("]]>").collect();
    let last = parts.len() - 1;
    parts
        .iter()
        .enumerate()
        .map(|(i, part)| {
            let mut section = String::with_capacity(part.len() + 3);
            if i > 0 {
                section.push('>');
            }
            section.push_str(part);
            if i < last {
                section.push_str("]]");
            }
            section
        })
        .collect()
}

/// Comments may not contain `--` or end with `-`.
fn sanitize_comment(text: &str) -> String {
    let mut result = text.replace("--", "- -");
    while result.contains("--") {
        result = result.replace("--", "- -");
    }
    if result.ends_with('-') {
        result.push(' ');
    }
    result
}

/// Element of a [`TreeWriter`] tree.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Content>,
}

/// Child of an [`Element`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Content {
    Element(Element),
    Text(String),
    Raw(String),
    Comment(String),
}

impl Element {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Self::default()
        }
    }

    /// Value of attribute `name`.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Child elements, skipping text and comments.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|c| match c {
            Content::Element(e) => Some(e),
            _ => None,
        })
    }

    /// First child element named `name`.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    /// All descendant elements named `name`, in document order.
    pub fn find_all(&self, name: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        collect_named(self.elements(), name, &mut found);
        found
    }

    /// Concatenated text and raw content of direct children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| match c {
                Content::Text(t) | Content::Raw(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }
}

fn collect_named<'a>(
    elements: impl Iterator<Item = &'a Element>,
    name: &str,
    found: &mut Vec<&'a Element>,
) {
    for element in elements {
        if element.name == name {
            found.push(element);
        }
        collect_named(element.elements(), name, found);
    }
}

/// [`MarkupWriter`] building an in-memory element tree.
#[derive(Debug, Default)]
pub struct TreeWriter {
    stack: Vec<Element>,
    roots: Vec<Content>,
}

impl TreeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, content: Content) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(content),
            None => self.roots.push(content),
        }
    }

    /// Top-level content written so far (closed elements only).
    pub fn roots(&self) -> &[Content] {
        &self.roots
    }

    /// Close every open element and return the top-level content.
    pub fn into_roots(mut self) -> Vec<Content> {
        while let Some(element) = self.stack.pop() {
            self.push(Content::Element(element));
        }
        self.roots
    }

    /// Close every open element and return the top-level elements.
    pub fn into_elements(self) -> Vec<Element> {
        self.into_roots()
            .into_iter()
            .filter_map(|c| match c {
                Content::Element(e) => Some(e),
                _ => None,
            })
            .collect()
    }
}

impl MarkupWriter for TreeWriter {
    fn open_element(&mut self, name: &str) -> Result<(), WriteError> {
        self.stack.push(Element::new(name));
        Ok(())
    }

    fn attribute(&mut self, name: &str, value: &str) -> Result<(), WriteError> {
        let element = self
            .stack
            .last_mut()
            .ok_or_else(|| WriteError::MisplacedAttribute(name.to_owned()))?;
        if !element.children.is_empty() {
            return Err(WriteError::MisplacedAttribute(name.to_owned()));
        }
        element.attributes.push((name.to_owned(), value.to_owned()));
        Ok(())
    }

    fn text(&mut self, content: &str) -> Result<(), WriteError> {
        self.push(Content::Text(content.to_owned()));
        Ok(())
    }

    fn raw_content(&mut self, content: &str) -> Result<(), WriteError> {
        self.push(Content::Raw(content.to_owned()));
        Ok(())
    }

    fn close_element(&mut self) -> Result<(), WriteError> {
        let element = self.stack.pop().ok_or(WriteError::NoOpenElement)?;
        self.push(Content::Element(element));
        Ok(())
    }

    fn comment(&mut self, text: &str) -> Result<(), WriteError> {
        self.push(Content::Comment(text.to_owned()));
        Ok(())
    }

    fn depth(&self) -> usize {
        self.stack.len()
    }
}
