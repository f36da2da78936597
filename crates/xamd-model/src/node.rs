//! Document tree nodes.
//!
//! [`Node`] is a closed enum covering both span (inline) and block kinds.
//! Container variants own their children directly; list items, definition
//! groups and table cells are small structs so that the variants stay
//! self-describing.

use crate::table::Table;

/// Horizontal text alignment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

/// Alignment requested by an alignment wrapper block (`->text<-` and friends).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BlockAlignment {
    Left,
    Center,
    Right,
    /// Margin-aligned text; rendered left-aligned.
    Margin,
}

impl BlockAlignment {
    /// Text alignment applied to the wrapped content.
    #[must_use]
    pub fn text_alignment(self) -> Alignment {
        match self {
            Self::Left | Self::Margin => Alignment::Left,
            Self::Center => Alignment::Center,
            Self::Right => Alignment::Right,
        }
    }
}

/// Emoji reference such as `:smile:`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Emoji {
    /// Short name without delimiters (e.g. `smile`).
    pub short_name: String,
    /// Unicode representation.
    pub unicode: String,
    /// Size level (number of delimiters used, 1-3).
    #[cfg_attr(feature = "serde", serde(default = "default_emoji_level"))]
    pub level: u8,
}

#[cfg(feature = "serde")]
fn default_emoji_level() -> u8 {
    1
}

impl Emoji {
    /// Create a level-1 emoji reference.
    pub fn new(short_name: impl Into<String>, unicode: impl Into<String>) -> Self {
        Self {
            short_name: short_name.into(),
            unicode: unicode.into(),
            level: 1,
        }
    }
}

/// One item of a multimedia element or the target of a reference.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MultimediaItem {
    /// Target URL.
    pub url: String,
    /// Optional title.
    pub title: Option<String>,
    /// Requested width in pixels.
    pub width: Option<u32>,
    /// Requested height in pixels.
    pub height: Option<u32>,
    /// Content type (e.g. `image/png`), used to select a multimedia handler.
    pub content_type: Option<String>,
}

impl MultimediaItem {
    /// Create an item pointing at `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Set the content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set the requested pixel size.
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}

/// Inline multimedia element (`![alt](url)`).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Multimedia {
    /// Items; handlers usually render the first one they support.
    pub items: Vec<MultimediaItem>,
    /// Alternative content (the alt text).
    pub children: Vec<Node>,
    /// Whether the element is the only content of its paragraph.
    #[cfg_attr(feature = "serde", serde(default))]
    pub alone_in_paragraph: bool,
}

/// Item of a bullet list.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ListItem {
    pub child: Node,
}

/// Item of a numbered list.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NumberedItem {
    /// Explicit ordinal written in the source, if any.
    #[cfg_attr(feature = "serde", serde(default))]
    pub number: Option<u32>,
    pub child: Node,
}

/// Item of a task list.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TaskItem {
    pub checked: bool,
    pub child: Node,
}

/// One group of a definition list: terms followed by their descriptions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DefinitionGroup {
    pub terms: Vec<Node>,
    pub descriptions: Vec<Node>,
}

/// Fenced or indented code block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CodeBlock {
    /// Source rows, without line terminators.
    pub rows: Vec<String>,
    /// Declared language, if any.
    #[cfg_attr(feature = "serde", serde(default))]
    pub language: Option<String>,
    /// Indentation of the block in the source.
    #[cfg_attr(feature = "serde", serde(default))]
    pub indent: usize,
}

impl CodeBlock {
    /// Create a code block from rows.
    pub fn new<I, S>(language: Option<&str>, rows: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows: rows.into_iter().map(Into::into).collect(),
            language: language.map(str::to_owned),
            indent: 0,
        }
    }
}

/// Document tree node.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(tag = "type", content = "value", rename_all = "snake_case")
)]
pub enum Node {
    // Span elements
    Text(String),
    Strong(Vec<Node>),
    Emphasize(Vec<Node>),
    /// Struck-through text (`~~text~~`).
    Delete(Vec<Node>),
    /// Inserted text, rendered underlined (`__text__`).
    Insert(Vec<Node>),
    Underline(Vec<Node>),
    Superscript(Vec<Node>),
    Subscript(Vec<Node>),
    InlineCode(String),
    Link {
        url: String,
        children: Vec<Node>,
    },
    /// Link whose target is looked up in the document's reference table.
    LinkReference {
        label: String,
        children: Vec<Node>,
    },
    AutoLinkMail(String),
    AutoLinkUrl(String),
    HashTag(String),
    Emoji(Emoji),
    /// Named HTML entity without delimiters (e.g. `copy`).
    HtmlEntity(String),
    HtmlEntityUnicode(u32),
    LineBreak,
    FootnoteReference {
        key: String,
        /// Render the footnote content in place instead of a number.
        auto_expand: bool,
    },
    MetaReference(String),
    /// Reference to the document's detail sub-document.
    DetailsReference,
    Multimedia(Multimedia),
    MultimediaReference {
        label: String,
        children: Vec<Node>,
        alone_in_paragraph: bool,
    },
    InlineScript {
        expression: String,
        alone_in_paragraph: bool,
    },
    InlineHtml(String),
    Abbreviation {
        title: String,
        children: Vec<Node>,
    },

    // Block elements
    Paragraph(Vec<Node>),
    Header {
        level: u8,
        children: Vec<Node>,
    },
    BulletList(Vec<ListItem>),
    NumberedList(Vec<NumberedItem>),
    TaskList(Vec<TaskItem>),
    DefinitionList(Vec<DefinitionGroup>),
    Table(Table),
    BlockQuote(Vec<Node>),
    InsertBlocks(Vec<Node>),
    DeleteBlocks(Vec<Node>),
    CodeBlock(CodeBlock),
    HorizontalRule,
    SectionSeparator,
    Aligned {
        alignment: BlockAlignment,
        children: Vec<Node>,
    },
    SingleChild(Box<Node>),
    NestedBlock(Vec<Node>),
    /// Inline span placed by the parser outside any paragraph.
    Standalone(Box<Node>),
    HtmlBlock(Vec<Node>),
    CommentBlock(Vec<String>),
    InvisibleBreak,
}

impl Node {
    /// Plain text span.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Bold span.
    pub fn strong(children: Vec<Node>) -> Self {
        Self::Strong(children)
    }

    /// Italic span.
    pub fn emphasize(children: Vec<Node>) -> Self {
        Self::Emphasize(children)
    }

    /// Hyperlink span.
    pub fn link(url: impl Into<String>, children: Vec<Node>) -> Self {
        Self::Link {
            url: url.into(),
            children,
        }
    }

    /// Footnote reference rendered as a superscript number.
    pub fn footnote_ref(key: impl Into<String>) -> Self {
        Self::FootnoteReference {
            key: key.into(),
            auto_expand: false,
        }
    }

    /// Inline script evaluated by the configured expression evaluator.
    pub fn script(expression: impl Into<String>, alone_in_paragraph: bool) -> Self {
        Self::InlineScript {
            expression: expression.into(),
            alone_in_paragraph,
        }
    }

    /// Paragraph block.
    pub fn paragraph(children: Vec<Node>) -> Self {
        Self::Paragraph(children)
    }

    /// Header block.
    pub fn header(level: u8, children: Vec<Node>) -> Self {
        Self::Header { level, children }
    }

    /// Whether this node flows inline inside a paragraph.
    ///
    /// Single-child wrappers inherit the answer from their child; nested
    /// blocks are inline only when every child is.
    pub fn is_inline_span(&self) -> bool {
        match self {
            Self::Text(_)
            | Self::Strong(_)
            | Self::Emphasize(_)
            | Self::Delete(_)
            | Self::Insert(_)
            | Self::Underline(_)
            | Self::Superscript(_)
            | Self::Subscript(_)
            | Self::InlineCode(_)
            | Self::Link { .. }
            | Self::LinkReference { .. }
            | Self::AutoLinkMail(_)
            | Self::AutoLinkUrl(_)
            | Self::HashTag(_)
            | Self::Emoji(_)
            | Self::HtmlEntity(_)
            | Self::HtmlEntityUnicode(_)
            | Self::LineBreak
            | Self::FootnoteReference { .. }
            | Self::MetaReference(_)
            | Self::DetailsReference
            | Self::Multimedia(_)
            | Self::MultimediaReference { .. }
            | Self::InlineScript { .. }
            | Self::InlineHtml(_)
            | Self::Abbreviation { .. } => true,
            Self::SingleChild(child) => child.is_inline_span(),
            Self::NestedBlock(children) => {
                !children.is_empty() && children.iter().all(Self::is_inline_span)
            }
            _ => false,
        }
    }

    /// Whether this node is an inline span standing on its own, outside a
    /// paragraph.
    pub fn outside_paragraph(&self) -> bool {
        match self {
            Self::Standalone(_) => true,
            Self::SingleChild(child) => child.outside_paragraph(),
            _ => false,
        }
    }

    /// Direct children in document order.
    ///
    /// List items, definition terms/descriptions and table cells are
    /// flattened into the sequence.
    pub fn children(&self) -> impl Iterator<Item = &Node> {
        let children: Vec<&Node> = match self {
            Self::Strong(c)
            | Self::Emphasize(c)
            | Self::Delete(c)
            | Self::Insert(c)
            | Self::Underline(c)
            | Self::Superscript(c)
            | Self::Subscript(c)
            | Self::Paragraph(c)
            | Self::BlockQuote(c)
            | Self::InsertBlocks(c)
            | Self::DeleteBlocks(c)
            | Self::NestedBlock(c)
            | Self::HtmlBlock(c)
            | Self::Link { children: c, .. }
            | Self::LinkReference { children: c, .. }
            | Self::MultimediaReference { children: c, .. }
            | Self::Abbreviation { children: c, .. }
            | Self::Header { children: c, .. }
            | Self::Aligned { children: c, .. } => c.iter().collect(),
            Self::Multimedia(m) => m.children.iter().collect(),
            Self::SingleChild(child) | Self::Standalone(child) => vec![child.as_ref()],
            Self::BulletList(items) => items.iter().map(|i| &i.child).collect(),
            Self::NumberedList(items) => items.iter().map(|i| &i.child).collect(),
            Self::TaskList(items) => items.iter().map(|i| &i.child).collect(),
            Self::DefinitionList(groups) => groups
                .iter()
                .flat_map(|g| g.terms.iter().chain(&g.descriptions))
                .collect(),
            Self::Table(table) => table
                .headers
                .iter()
                .chain(&table.rows)
                .flatten()
                .flatten()
                .map(|cell| &cell.content)
                .collect(),
            _ => Vec::new(),
        };
        children.into_iter()
    }

    /// Visit this node and all descendants in pre-order.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Node)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }
}
