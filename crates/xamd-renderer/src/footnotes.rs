//! Footnote numbering and per-document render scope.

use std::collections::BTreeSet;

use xamd_model::{Document, Node};

/// Numbers footnotes in the order they are first referenced.
#[derive(Debug, Default)]
pub struct FootnoteTracker {
    order: Vec<String>,
}

impl FootnoteTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a reference to `key` and return its 1-based number.
    pub fn reference(&mut self, key: &str) -> usize {
        if let Some(number) = self.number(key) {
            return number;
        }
        self.order.push(key.to_owned());
        self.order.len()
    }

    /// Number of `key`, if it was referenced.
    pub fn number(&self, key: &str) -> Option<usize> {
        self.order.iter().position(|k| k == key).map(|i| i + 1)
    }

    /// Referenced keys in numbering order.
    pub fn keys(&self) -> &[String] {
        &self.order
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// State of one document being rendered.
///
/// Nested documents (detail documents, script results) get their own scope,
/// so footnote numbers never leak between them.
pub(crate) struct Scope<'d> {
    pub doc: &'d Document,
    pub footnotes: FootnoteTracker,
    /// Footnotes currently being expanded in place, innermost last.
    expanding: Vec<String>,
}

impl<'d> Scope<'d> {
    pub fn new(doc: &'d Document) -> Self {
        Self {
            doc,
            footnotes: FootnoteTracker::new(),
            expanding: Vec::new(),
        }
    }

    /// Start expanding footnote `key` in place. Returns `false` when `key`
    /// is already being expanded further up.
    pub fn begin_expand(&mut self, key: &str) -> bool {
        if self.expanding.iter().any(|k| k == key) {
            return false;
        }
        self.expanding.push(key.to_owned());
        true
    }

    pub fn end_expand(&mut self) {
        self.expanding.pop();
    }

    /// Number every footnote referenced from the contents of footnotes
    /// referenced so far, transitively.
    ///
    /// Run before the footnote section is written so that its row count is
    /// known up front.
    pub fn number_nested_footnotes(&mut self) {
        let doc = self.doc;
        let mut index = 0;
        while index < self.footnotes.keys().len() {
            let key = self.footnotes.keys()[index].clone();
            if let Some(footnote) = doc.footnotes.get(&key) {
                let mut expanded = BTreeSet::from([key]);
                for node in &footnote.content {
                    collect_references(doc, node, &mut expanded, &mut self.footnotes);
                }
            }
            index += 1;
        }
    }
}

/// Number footnotes referenced under `node`, looking through the contents of
/// auto-expanded ones. `expanded` guards against expansion cycles.
fn collect_references(
    doc: &Document,
    node: &Node,
    expanded: &mut BTreeSet<String>,
    tracker: &mut FootnoteTracker,
) {
    node.walk(&mut |n| {
        let Node::FootnoteReference { key, auto_expand } = n else {
            return;
        };
        let Some(footnote) = doc.footnotes.get(key) else {
            return;
        };
        if *auto_expand && expanded.insert(key.clone()) {
            for inner in &footnote.content {
                collect_references(doc, inner, expanded, tracker);
            }
            return;
        }
        tracker.reference(key);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_numbers_follow_first_reference() {
        let mut tracker = FootnoteTracker::new();
        assert_eq!(tracker.reference("b"), 1);
        assert_eq!(tracker.reference("a"), 2);
        assert_eq!(tracker.reference("b"), 1);
        assert_eq!(tracker.number("a"), Some(2));
        assert_eq!(tracker.number("c"), None);
        assert_eq!(tracker.keys(), ["b", "a"]);
    }

    #[test]
    fn test_expand_guard() {
        let doc = Document::default();
        let mut scope = Scope::new(&doc);
        assert!(scope.begin_expand("a"));
        assert!(!scope.begin_expand("a"));
        assert!(scope.begin_expand("b"));
        scope.end_expand();
        scope.end_expand();
        assert!(scope.begin_expand("a"));
    }

    #[test]
    fn test_nested_footnotes_numbered_after_outer() {
        let doc = Document::default()
            .with_footnote("a", vec![Node::paragraph(vec![Node::footnote_ref("b")])])
            .with_footnote("b", vec![Node::paragraph(vec![Node::footnote_ref("a")])])
            .with_footnote("c", vec![Node::paragraph(vec![Node::text("unused")])]);
        let mut scope = Scope::new(&doc);
        scope.footnotes.reference("a");
        scope.number_nested_footnotes();
        assert_eq!(scope.footnotes.keys(), ["a", "b"]);
    }

    #[test]
    fn test_self_expanding_footnote_terminates() {
        let doc = Document::default().with_footnote(
            "a",
            vec![Node::paragraph(vec![Node::FootnoteReference {
                key: "a".to_owned(),
                auto_expand: true,
            }])],
        );
        let mut scope = Scope::new(&doc);
        scope.footnotes.reference("a");
        scope.number_nested_footnotes();
        assert_eq!(scope.footnotes.keys(), ["a"]);
    }
}
