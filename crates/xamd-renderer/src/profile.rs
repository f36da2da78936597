//! Spacing, colour and size values consulted while emitting a dialect.

use std::fmt;
use std::str::FromStr;

/// Four-sided spacing in device-independent units, written `left,top,right,bottom`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Thickness {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Thickness {
    pub const fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }
}

impl fmt::Display for Thickness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.left, self.top, self.right, self.bottom)
    }
}

/// Error parsing a [`Thickness`].
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid thickness `{0}`: expected four comma-separated non-negative integers")]
pub struct ThicknessParseError(String);

impl FromStr for Thickness {
    type Err = ThicknessParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| ThicknessParseError(s.to_owned()))?;
        match parts.as_slice() {
            &[left, top, right, bottom] => Ok(Self::new(left, top, right, bottom)),
            _ => Err(ThicknessParseError(s.to_owned())),
        }
    }
}

/// Per-dialect profile.
///
/// Colours are written verbatim as XAML attribute values, so they may be
/// colour names, hex values or markup extensions.
#[derive(Clone, Debug, PartialEq)]
pub struct Profile {
    /// Header font sizes by level, level 1 first.
    pub header_font_size: Vec<u32>,
    /// Header text colours by level, level 1 first.
    pub header_color: Vec<String>,
    pub paragraph_margins: Thickness,

    pub table_cell_padding: Thickness,
    pub table_cell_border_color: String,
    pub table_cell_border_thickness: f64,
    /// Row background colours, cycled by row index; empty entries are skipped.
    pub table_row_background_colors: Vec<String>,

    pub block_quote_margin: u32,
    pub block_quote_padding: u32,
    pub block_quote_border_color: String,
    pub inserted_border_color: String,
    pub deleted_border_color: String,

    /// Gap between a list marker and the item content.
    pub list_content_margin: u32,
    pub definition_separator: u32,
    pub definition_margin: u32,

    pub superscript_scale: f64,
    pub superscript_offset: i32,
    pub footnote_separator: u32,

    /// Pixel size used for graphs that carry no size of their own.
    pub default_graph_width: u32,
    pub default_graph_height: u32,

    pub code_font_family: String,
    pub hyperlink_color: String,
    /// Binding invoked with the link target when a hyperlink is tapped.
    pub hyperlink_command: String,
    pub rule_color: String,
    pub error_color: String,
}

fn app_theme(resource: &str) -> String {
    format!(
        "{{AppThemeBinding Light={{StaticResource {resource}Light}}, Dark={{StaticResource {resource}Dark}}}}"
    )
}

impl Profile {
    /// Defaults shared by both dialects.
    fn base() -> Self {
        Self {
            header_font_size: vec![28, 24, 22, 20, 18, 16, 15, 14, 13, 12],
            header_color: vec!["Navy".to_owned(); 10],
            paragraph_margins: Thickness::new(0, 5, 0, 5),
            table_cell_padding: Thickness::new(5, 2, 5, 2),
            table_cell_border_color: "Gray".to_owned(),
            table_cell_border_thickness: 0.5,
            table_row_background_colors: Vec::new(),
            block_quote_margin: 20,
            block_quote_padding: 10,
            block_quote_border_color: "Black".to_owned(),
            inserted_border_color: "Blue".to_owned(),
            deleted_border_color: "Red".to_owned(),
            list_content_margin: 5,
            definition_separator: 10,
            definition_margin: 20,
            superscript_scale: 0.75,
            superscript_offset: -5,
            footnote_separator: 2,
            default_graph_width: 480,
            default_graph_height: 360,
            code_font_family: "Courier New".to_owned(),
            hyperlink_color: "{Binding HyperlinkColor}".to_owned(),
            hyperlink_command: "{Binding HyperlinkClicked}".to_owned(),
            rule_color: "Gray".to_owned(),
            error_color: "Red".to_owned(),
        }
    }

    /// Defaults for .NET MAUI, referencing the app's theme resources.
    pub fn maui() -> Self {
        Self {
            block_quote_border_color: app_theme("PrimaryForeground"),
            inserted_border_color: app_theme("InsertedBorder"),
            deleted_border_color: app_theme("DeletedBorder"),
            code_font_family: "SpaceGroteskRegular".to_owned(),
            hyperlink_color: app_theme("AccentForeground"),
            rule_color: app_theme("NormalEditPlaceholder"),
            ..Self::base()
        }
    }

    /// Defaults for Xamarin.Forms.
    pub fn xamarin_forms() -> Self {
        Self::base()
    }

    /// Background colour of table row `row`, if any.
    pub fn row_background(&self, row: usize) -> Option<&str> {
        if self.table_row_background_colors.is_empty() {
            return None;
        }
        let color = &self.table_row_background_colors[row % self.table_row_background_colors.len()];
        (!color.is_empty()).then_some(color.as_str())
    }
}
