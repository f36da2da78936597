//! Renders markdown document trees to MAUI and Xamarin.Forms XAML.
//!
//! This crate provides a [`Renderer`] that walks an [`xamd_model::Document`]
//! once and emits XAML through a [`MarkupWriter`].
//!
//! # Architecture
//!
//! The traversal is shared; vocabulary differences are delegated to the
//! [`Dialect`] trait:
//! - [`MauiDialect`]: .NET MAUI, spacing and styles via static resources
//! - [`XamarinFormsDialect`]: Xamarin.Forms, explicit numeric spacing
//!
//! Both are configured by a [`Profile`]. Consecutive inline spans are
//! collected by a [`RunAccumulator`] and written as one formatted label.
//! Code blocks, multimedia, emoji and inline scripts are delegated to the
//! handlers registered in [`Extensions`], with built-in fallbacks.
//!
//! # Example
//!
//! ```
//! use xamd_model::{Document, Node};
//! use xamd_renderer::{Renderer, TreeWriter, XamarinFormsDialect};
//!
//! let doc = Document::new(vec![
//!     Node::header(1, vec![Node::text("Hello")]),
//!     Node::paragraph(vec![Node::strong(vec![Node::text("Bold")]), Node::text(" text")]),
//! ]);
//! let mut out = TreeWriter::new();
//! Renderer::new(XamarinFormsDialect::new(), &mut out)
//!     .render(&doc, false)
//!     .unwrap();
//!
//! let root = out.into_elements().remove(0);
//! assert_eq!(root.name, "StackLayout");
//! assert_eq!(root.find_all("Span").len(), 2);
//! ```

mod blocks;
mod dialect;
mod error;
mod extension;
mod footnotes;
mod html;
mod margins;
mod maui;
mod profile;
mod renderer;
mod runs;
mod script;
mod state;
mod table;
mod writer;
mod xamarin;

pub use dialect::{
    Dialect, DialectKind, PanelKind, Spacing, UnknownDialect, label_alignment, layout_alignment,
};
pub use error::{HandlerError, RenderError, ScriptError, WriteError};
pub use extension::{
    CodeBlockHandler, EmojiSource, Extensions, HandlerContext, HandlerOutcome, ImageContent,
    ImageSource, MultimediaHandler, content_type, write_image,
};
pub use footnotes::FootnoteTracker;
pub use html::{entity_char, escape_html, plain_text};
pub use margins::{VerticalMargins, margins};
pub use maui::{MauiDialect, small_margins};
pub use profile::{Profile, Thickness, ThicknessParseError};
pub use renderer::Renderer;
pub use runs::{Run, RunAccumulator, RunStyle, to_subscript, to_superscript};
pub use script::{ScriptEvaluator, ScriptValue, png_data_uri};
pub use state::{Cancellation, RenderState};
pub use table::{CellPlacement, column_spans};
pub use writer::{Content, Element, MarkupWriter, TreeWriter, XmlMarkupWriter};
pub use xamarin::XamarinFormsDialect;
