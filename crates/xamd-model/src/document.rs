//! Document root, footnotes and metadata.

use std::collections::BTreeMap;

use crate::node::{MultimediaItem, Node};

/// Footnote declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Footnote {
    pub key: String,
    pub content: Vec<Node>,
}

/// Footnote table in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Footnotes(Vec<Footnote>);

impl Footnotes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a footnote. A later declaration with the same key replaces the
    /// earlier one in place.
    pub fn insert(&mut self, key: impl Into<String>, content: Vec<Node>) {
        let key = key.into();
        if let Some(existing) = self.0.iter_mut().find(|f| f.key == key) {
            existing.content = content;
        } else {
            self.0.push(Footnote { key, content });
        }
    }

    pub fn get(&self, key: &str) -> Option<&Footnote> {
        self.0.iter().find(|f| f.key == key)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Footnote> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a Footnotes {
    type Item = &'a Footnote;
    type IntoIter = std::slice::Iter<'a, Footnote>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Document metadata (front matter).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Metadata {
    /// Render without the outer document wrapper.
    pub body_only: bool,
    /// Free-form values addressed by meta references.
    pub values: BTreeMap<String, Vec<String>>,
}

impl Metadata {
    /// Values joined with `", "`, or `None` when the key is absent.
    pub fn joined(&self, key: &str) -> Option<String> {
        self.values.get(key).map(|v| v.join(", "))
    }
}

/// Parsed markdown document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Document {
    pub nodes: Vec<Node>,
    pub footnotes: Footnotes,
    /// Link and multimedia reference targets by label.
    pub references: BTreeMap<String, MultimediaItem>,
    /// Detail sub-document addressed by details references.
    pub detail: Option<Box<Document>>,
    pub metadata: Metadata,
}

impl Document {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self {
            nodes,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_footnote(mut self, key: impl Into<String>, content: Vec<Node>) -> Self {
        self.footnotes.insert(key, content);
        self
    }

    #[must_use]
    pub fn with_reference(mut self, label: impl Into<String>, item: MultimediaItem) -> Self {
        self.references.insert(label.into(), item);
        self
    }

    #[must_use]
    pub fn with_detail(mut self, detail: Document) -> Self {
        self.detail = Some(Box::new(detail));
        self
    }

    #[must_use]
    pub fn with_meta<I, S>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metadata
            .values
            .insert(key.into(), values.into_iter().map(Into::into).collect());
        self
    }
}
