//! Xamarin.Forms dialect.
//!
//! Spacing is written as explicit `left,top,right,bottom` values computed
//! from the [`Profile`].

use crate::dialect::{Dialect, DialectKind, Spacing};
use crate::error::WriteError;
use crate::profile::{Profile, Thickness};
use crate::writer::MarkupWriter;

const FORMS_NAMESPACE: &str = "http://xamarin.com/schemas/2014/forms";
const XAML_NAMESPACE: &str = "http://schemas.microsoft.com/winfx/2009/xaml";

/// Xamarin.Forms vocabulary.
#[derive(Clone, Debug)]
pub struct XamarinFormsDialect {
    profile: Profile,
}

impl XamarinFormsDialect {
    pub fn new() -> Self {
        Self::with_profile(Profile::xamarin_forms())
    }

    pub fn with_profile(profile: Profile) -> Self {
        Self { profile }
    }
}

impl Default for XamarinFormsDialect {
    fn default() -> Self {
        Self::new()
    }
}

fn when(present: bool, value: u32) -> u32 {
    if present { value } else { 0 }
}

impl Dialect for XamarinFormsDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::XamarinForms
    }

    fn profile(&self) -> &Profile {
        &self.profile
    }

    fn open_root(&self, out: &mut dyn MarkupWriter) -> Result<(), WriteError> {
        out.open_element("StackLayout")?;
        out.attribute("xmlns", FORMS_NAMESPACE)?;
        out.attribute("xmlns:x", XAML_NAMESPACE)?;
        out.attribute("Spacing", "0")
    }

    fn open_vertical_stack(&self, out: &mut dyn MarkupWriter) -> Result<(), WriteError> {
        out.open_element("StackLayout")?;
        out.attribute("Orientation", "Vertical")
    }

    fn spacing(&self, spacing: Spacing) -> String {
        let p = &self.profile;
        let m = p.paragraph_margins;
        let thickness = match spacing {
            Spacing::Paragraph { top, bottom } => {
                Thickness::new(m.left, when(top, m.top), m.right, when(bottom, m.bottom))
            }
            Spacing::None => Thickness::default(),
            Spacing::ListMarker { top, bottom } => Thickness::new(
                0,
                when(top, m.top),
                p.list_content_margin,
                when(bottom, m.bottom),
            ),
            Spacing::QuoteOuter => Thickness::new(p.block_quote_margin, m.top, 0, m.bottom),
            Spacing::QuotePanel => {
                Thickness::new(p.block_quote_padding, 0, p.block_quote_padding, 0)
            }
            Spacing::DefinitionTerm { first } => {
                Thickness::new(m.left, when(first, m.top), m.right, 0)
            }
            Spacing::DefinitionDescription { last } => {
                Thickness::new(p.definition_margin, 0, 0, when(last, p.definition_separator))
            }
            Spacing::FootnoteNumber => Thickness::new(0, m.top, p.footnote_separator, m.bottom),
        };
        thickness.to_string()
    }

    fn header_attributes(&self, level: u8, out: &mut dyn MarkupWriter) -> Result<(), WriteError> {
        let Some(index) = usize::from(level).checked_sub(1) else {
            return Ok(());
        };
        if let Some(size) = self.profile.header_font_size.get(index) {
            out.attribute("FontSize", &size.to_string())?;
        }
        if let Some(color) = self.profile.header_color.get(index) {
            out.attribute("TextColor", color)?;
        }
        Ok(())
    }

    fn table_cell_frame(&self, row: usize, out: &mut dyn MarkupWriter) -> Result<(), WriteError> {
        out.attribute("Padding", "0,0,0,0")?;
        out.attribute("BorderColor", &self.profile.table_cell_border_color)?;
        if let Some(color) = self.profile.row_background(row) {
            out.attribute("BackgroundColor", color)?;
        }
        Ok(())
    }

    fn table_cell_content(&self, out: &mut dyn MarkupWriter) -> Result<(), WriteError> {
        out.attribute("Padding", &self.profile.table_cell_padding.to_string())
    }
}
