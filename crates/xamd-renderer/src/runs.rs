//! Styled text runs and the run accumulator.
//!
//! Consecutive inline spans are collected as [`Run`]s and written as one
//! text-run host: a word-wrapping `Label` whose `FormattedString` holds one
//! `Span` per run.

use xamd_model::Alignment;

use crate::dialect::label_alignment;
use crate::error::WriteError;
use crate::profile::Profile;
use crate::state::RenderState;
use crate::writer::MarkupWriter;

/// Style of one run, derived from the [`RenderState`] it was appended under.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunStyle {
    pub bold: bool,
    pub italic: bool,
    pub strike_through: bool,
    pub underline: bool,
    pub code: bool,
    pub hyperlink: Option<String>,
    /// Inline error message, coloured with the profile's error colour.
    pub error: bool,
}

/// Styled piece of text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub style: RunStyle,
}

impl Run {
    /// Run of `text` styled by `state`. Superscript and subscript are
    /// applied to the text itself.
    pub fn new(text: &str, state: &RenderState) -> Self {
        let text = if state.superscript {
            to_superscript(text)
        } else if state.subscript {
            to_subscript(text)
        } else {
            text.to_owned()
        };
        Self {
            text,
            style: RunStyle {
                bold: state.bold,
                italic: state.italic,
                strike_through: state.strike_through,
                underline: state.underline,
                code: state.code,
                hyperlink: state.hyperlink.clone(),
                error: false,
            },
        }
    }

    fn font_attributes(&self) -> Option<&'static str> {
        match (self.style.bold, self.style.italic) {
            (true, true) => Some("Italic, Bold"),
            (true, false) => Some("Bold"),
            (false, true) => Some("Italic"),
            (false, false) => None,
        }
    }

    fn text_decorations(&self) -> Option<&'static str> {
        match (self.style.strike_through, self.style.underline) {
            (true, true) => Some("Strikethrough, Underline"),
            (true, false) => Some("Strikethrough"),
            (false, true) => Some("Underline"),
            (false, false) => None,
        }
    }

    fn write(&self, profile: &Profile, out: &mut dyn MarkupWriter) -> Result<(), WriteError> {
        out.open_element("Span")?;
        out.attribute("Text", &self.text)?;
        if let Some(value) = self.font_attributes() {
            out.attribute("FontAttributes", value)?;
        }
        if let Some(value) = self.text_decorations() {
            out.attribute("TextDecorations", value)?;
        }
        if self.style.code {
            out.attribute("FontFamily", &profile.code_font_family)?;
        }
        if self.style.error {
            out.attribute("TextColor", &profile.error_color)?;
        } else if let Some(url) = &self.style.hyperlink {
            out.attribute("TextColor", &profile.hyperlink_color)?;
            out.open_element("Span.GestureRecognizers")?;
            out.open_element("TapGestureRecognizer")?;
            out.attribute("Command", &profile.hyperlink_command)?;
            out.attribute("CommandParameter", url)?;
            out.close_element()?;
            out.close_element()?;
        }
        out.close_element()
    }
}

#[derive(Debug)]
enum Item {
    Run(Run),
    Comment(String),
}

/// Collects runs until the enclosing block flushes them as one host.
#[derive(Debug, Default)]
pub struct RunAccumulator {
    /// Alignment captured when the first run was appended.
    alignment: Option<Alignment>,
    items: Vec<Item>,
}

impl RunAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a run. The first run fixes the host alignment.
    pub fn append(&mut self, run: Run, alignment: Alignment) {
        self.alignment.get_or_insert(alignment);
        self.items.push(Item::Run(run));
    }

    /// Append a comment to be written in order with the runs.
    pub fn append_comment(&mut self, text: &str) {
        self.items.push(Item::Comment(text.to_owned()));
    }

    /// Whether no run is waiting to be written.
    pub fn is_empty(&self) -> bool {
        !self.items.iter().any(|i| matches!(i, Item::Run(_)))
    }

    /// Drop pending items without writing them.
    pub fn clear(&mut self) {
        self.alignment = None;
        self.items.clear();
    }

    /// Write pending runs as one host label and reset.
    ///
    /// Pending comments without any run are written on their own.
    pub fn flush(&mut self, profile: &Profile, out: &mut dyn MarkupWriter) -> Result<(), WriteError> {
        let has_runs = !self.is_empty();
        let alignment = self.alignment.take().unwrap_or_default();
        let items = std::mem::take(&mut self.items);
        if items.is_empty() {
            return Ok(());
        }

        if has_runs {
            out.open_element("Label")?;
            out.attribute("LineBreakMode", "WordWrap")?;
            out.attribute("HorizontalTextAlignment", label_alignment(alignment))?;
            out.open_element("Label.FormattedText")?;
            out.open_element("FormattedString")?;
        }
        for item in &items {
            match item {
                Item::Run(run) => run.write(profile, out)?,
                Item::Comment(text) => out.comment(text)?,
            }
        }
        if has_runs {
            out.close_element()?;
            out.close_element()?;
            out.close_element()?;
        }
        Ok(())
    }
}

/// Replace characters by their Unicode superscript forms where one exists.
pub fn to_superscript(text: &str) -> String {
    text.chars().map(superscript_char).collect()
}

/// Replace characters by their Unicode subscript forms where one exists.
pub fn to_subscript(text: &str) -> String {
    text.chars().map(subscript_char).collect()
}

fn superscript_char(c: char) -> char {
    match c {
        '0' => '⁰',
        '1' => '¹',
        '2' => '²',
        '3' => '³',
        '4' => '⁴',
        '5' => '⁵',
        '6' => '⁶',
        '7' => '⁷',
        '8' => '⁸',
        '9' => '⁹',
        '+' => '⁺',
        '-' => '⁻',
        '=' => '⁼',
        '(' => '⁽',
        ')' => '⁾',
        'a' => 'ᵃ',
        'b' => 'ᵇ',
        'c' => 'ᶜ',
        'd' => 'ᵈ',
        'e' => 'ᵉ',
        'f' => 'ᶠ',
        'g' => 'ᵍ',
        'h' => 'ʰ',
        'i' => 'ⁱ',
        'j' => 'ʲ',
        'k' => 'ᵏ',
        'l' => 'ˡ',
        'm' => 'ᵐ',
        'n' => 'ⁿ',
        'o' => 'ᵒ',
        'p' => 'ᵖ',
        'r' => 'ʳ',
        's' => 'ˢ',
        't' => 'ᵗ',
        'u' => 'ᵘ',
        'v' => 'ᵛ',
        'w' => 'ʷ',
        'x' => 'ˣ',
        'y' => 'ʸ',
        'z' => 'ᶻ',
        other => other,
    }
}

fn subscript_char(c: char) -> char {
    match c {
        '0' => '₀',
        '1' => '₁',
        '2' => '₂',
        '3' => '₃',
        '4' => '₄',
        '5' => '₅',
        '6' => '₆',
        '7' => '₇',
        '8' => '₈',
        '9' => '₉',
        '+' => '₊',
        '-' => '₋',
        '=' => '₌',
        '(' => '₍',
        ')' => '₎',
        'a' => 'ₐ',
        'e' => 'ₑ',
        'h' => 'ₕ',
        'i' => 'ᵢ',
        'j' => 'ⱼ',
        'k' => 'ₖ',
        'l' => 'ₗ',
        'm' => 'ₘ',
        'n' => 'ₙ',
        'o' => 'ₒ',
        'p' => 'ₚ',
        'r' => 'ᵣ',
        's' => 'ₛ',
        't' => 'ₜ',
        'u' => 'ᵤ',
        'v' => 'ᵥ',
        'x' => 'ₓ',
        other => other,
    }
}
