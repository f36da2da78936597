//! Dialect trait for vocabulary-specific emission.
//!
//! Both XAML dialects share one traversal; they differ in element spelling,
//! in how spacing is expressed (theme resources vs. explicit numbers) and in
//! a few styling attributes. Everything dialect-specific goes through this
//! trait.

use std::fmt;
use std::str::FromStr;

use xamd_model::Alignment;

use crate::error::WriteError;
use crate::profile::Profile;
use crate::writer::MarkupWriter;

/// Supported output dialects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DialectKind {
    #[default]
    Maui,
    XamarinForms,
}

impl DialectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Maui => "maui",
            Self::XamarinForms => "xamarin-forms",
        }
    }

    /// Default profile of this dialect.
    pub fn default_profile(self) -> Profile {
        match self {
            Self::Maui => Profile::maui(),
            Self::XamarinForms => Profile::xamarin_forms(),
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a [`DialectKind`].
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown dialect `{0}` (expected `maui` or `xamarin-forms`)")]
pub struct UnknownDialect(String);

impl FromStr for DialectKind {
    type Err = UnknownDialect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "maui" => Ok(Self::Maui),
            "xamarin-forms" | "xamarin" | "xamarinforms" => Ok(Self::XamarinForms),
            _ => Err(UnknownDialect(s.to_owned())),
        }
    }
}

/// Spacing roles, resolved to a margin or padding value by the dialect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Spacing {
    /// Block container; `top`/`bottom` come from margin inference.
    Paragraph { top: bool, bottom: bool },
    /// No spacing at all.
    None,
    /// List marker cell.
    ListMarker { top: bool, bottom: bool },
    /// Outer container of a quote, insert or delete block.
    QuoteOuter,
    /// Bordered panel inside [`Spacing::QuoteOuter`].
    QuotePanel,
    /// Definition term; only the first term of a group has a top margin.
    DefinitionTerm { first: bool },
    /// Definition description; the last one is followed by a separator.
    DefinitionDescription { last: bool },
    /// Footnote number cell.
    FootnoteNumber,
}

impl Spacing {
    /// Default block spacing.
    pub const PARAGRAPH: Self = Self::Paragraph {
        top: true,
        bottom: true,
    };
}

/// Bordered block kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelKind {
    Quote,
    Insert,
    Delete,
}

/// `HorizontalTextAlignment` value for a label.
pub fn label_alignment(alignment: Alignment) -> &'static str {
    match alignment {
        Alignment::Left => "Start",
        Alignment::Center => "Center",
        Alignment::Right => "End",
    }
}

/// `HorizontalOptions` value for a container.
pub fn layout_alignment(alignment: Alignment) -> &'static str {
    match alignment {
        Alignment::Left => "Start",
        Alignment::Center => "Center",
        Alignment::Right => "End",
    }
}

/// Vocabulary-specific emission.
///
/// Methods that take `out` write into the element opened last, or open new
/// elements that the caller closes.
pub trait Dialect {
    fn kind(&self) -> DialectKind;

    fn profile(&self) -> &Profile;

    /// Open the document root element, namespaces included.
    fn open_root(&self, out: &mut dyn MarkupWriter) -> Result<(), WriteError>;

    /// Open a vertical stack container.
    fn open_vertical_stack(&self, out: &mut dyn MarkupWriter) -> Result<(), WriteError>;

    /// Margin or padding value for a spacing role.
    fn spacing(&self, spacing: Spacing) -> String;

    /// Size and colour attributes of a header label.
    fn header_attributes(&self, level: u8, out: &mut dyn MarkupWriter) -> Result<(), WriteError>;

    /// Open the wrappers placed around a table's padded container.
    ///
    /// The caller closes everything opened here after the table.
    fn open_table(&self, _out: &mut dyn MarkupWriter) -> Result<(), WriteError> {
        Ok(())
    }

    /// Attributes of the `Frame` around a table cell in row `row`.
    fn table_cell_frame(&self, row: usize, out: &mut dyn MarkupWriter) -> Result<(), WriteError>;

    /// Attributes of the `ContentView` holding a table cell's content.
    fn table_cell_content(&self, out: &mut dyn MarkupWriter) -> Result<(), WriteError>;

    /// Border colour of a bordered block.
    fn panel_border(&self, kind: PanelKind) -> &str {
        let profile = self.profile();
        match kind {
            PanelKind::Quote => &profile.block_quote_border_color,
            PanelKind::Insert => &profile.inserted_border_color,
            PanelKind::Delete => &profile.deleted_border_color,
        }
    }
}
