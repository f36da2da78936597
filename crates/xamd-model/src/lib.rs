//! Document tree consumed by the XAML markdown renderer.
//!
//! The tree is produced by an external markdown parser and treated as
//! immutable by the renderer. It is organised as:
//!
//! - [`Document`]: top-level nodes plus the footnote table, the reference
//!   table, metadata and an optional nested detail document
//! - [`Node`]: closed set of span (inline) and block node kinds
//! - [`Table`]: grid of optional [`Cell`]s where `None` continues the column
//!   span of the nearest cell to its left
//!
//! Enable the `serde` feature to (de)serialize the whole tree.
//!
//! # Example
//!
//! ```
//! use xamd_model::{Document, Node};
//!
//! let doc = Document::new(vec![Node::paragraph(vec![
//!     Node::text("Hello "),
//!     Node::strong(vec![Node::text("world")]),
//! ])]);
//! assert_eq!(doc.nodes.len(), 1);
//! assert!(doc.nodes[0].children().all(Node::is_inline_span));
//! ```

mod document;
mod node;
mod table;

pub use document::{Document, Footnote, Footnotes, Metadata};
pub use node::{
    Alignment, BlockAlignment, CodeBlock, DefinitionGroup, Emoji, ListItem, Multimedia,
    MultimediaItem, Node, NumberedItem, TaskItem,
};
pub use table::{Cell, Row, Table};
