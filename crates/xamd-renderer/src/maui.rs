//! .NET MAUI dialect.
//!
//! Spacing and cell styles reference static resources of the consuming
//! app (`SmallTopBottomMargins`, `TableCellEven`, `Header1`, ...).

use crate::dialect::{Dialect, DialectKind, Spacing};
use crate::error::WriteError;
use crate::profile::Profile;
use crate::writer::MarkupWriter;

const MAUI_NAMESPACE: &str = "http://schemas.microsoft.com/dotnet/2021/maui";
const XAML_NAMESPACE: &str = "http://schemas.microsoft.com/winfx/2009/xaml";

/// Highest header style index defined by the app resources.
const MAX_HEADER_STYLE: u8 = 9;

/// .NET MAUI vocabulary.
#[derive(Clone, Debug)]
pub struct MauiDialect {
    profile: Profile,
}

impl MauiDialect {
    pub fn new() -> Self {
        Self::with_profile(Profile::maui())
    }

    pub fn with_profile(profile: Profile) -> Self {
        Self { profile }
    }
}

impl Default for MauiDialect {
    fn default() -> Self {
        Self::new()
    }
}

/// Static resource name for a combination of small margins.
///
/// No side gives `NoMargins`, all sides give `SmallMargins`, anything else
/// lists the sides in left, right, top, bottom order.
pub fn small_margins(left: bool, right: bool, top: bool, bottom: bool) -> String {
    let mut name = String::from("{StaticResource ");
    if !(left || right || top || bottom) {
        name.push_str("No");
    } else {
        name.push_str("Small");
        if !(left && right && top && bottom) {
            for (present, side) in [(left, "Left"), (right, "Right"), (top, "Top"), (bottom, "Bottom")] {
                if present {
                    name.push_str(side);
                }
            }
        }
    }
    name.push_str("Margins}");
    name
}

impl Dialect for MauiDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Maui
    }

    fn profile(&self) -> &Profile {
        &self.profile
    }

    fn open_root(&self, out: &mut dyn MarkupWriter) -> Result<(), WriteError> {
        out.open_element("VerticalStackLayout")?;
        out.attribute("xmlns", MAUI_NAMESPACE)?;
        out.attribute("xmlns:x", XAML_NAMESPACE)?;
        out.attribute("Spacing", "0")
    }

    fn open_vertical_stack(&self, out: &mut dyn MarkupWriter) -> Result<(), WriteError> {
        out.open_element("VerticalStackLayout")
    }

    fn spacing(&self, spacing: Spacing) -> String {
        match spacing {
            Spacing::Paragraph { top, bottom } => small_margins(false, false, top, bottom),
            Spacing::None => small_margins(false, false, false, false),
            Spacing::ListMarker { top, bottom } => small_margins(false, true, top, bottom),
            Spacing::QuoteOuter => small_margins(true, false, true, true),
            Spacing::QuotePanel => small_margins(true, true, false, false),
            Spacing::DefinitionTerm { first } => small_margins(true, true, first, false),
            Spacing::DefinitionDescription { last } => small_margins(true, false, false, last),
            Spacing::FootnoteNumber => small_margins(true, true, true, true),
        }
    }

    fn header_attributes(&self, level: u8, out: &mut dyn MarkupWriter) -> Result<(), WriteError> {
        let level = level.min(MAX_HEADER_STYLE);
        out.attribute("Style", &format!("{{StaticResource Header{level}}}"))
    }

    fn open_table(&self, out: &mut dyn MarkupWriter) -> Result<(), WriteError> {
        out.open_element("ScrollView")?;
        out.attribute("Orientation", "Horizontal")
    }

    fn table_cell_frame(&self, row: usize, out: &mut dyn MarkupWriter) -> Result<(), WriteError> {
        let style = if row % 2 == 0 {
            "{StaticResource TableCellEven}"
        } else {
            "{StaticResource TableCellOdd}"
        };
        out.attribute("Style", style)
    }

    fn table_cell_content(&self, out: &mut dyn MarkupWriter) -> Result<(), WriteError> {
        out.attribute("Style", "{StaticResource TableCell}")
    }
}
