//! HTML sub-pass for labels rendered with `TextType=Html`.
//!
//! Header and HTML-block labels carry their inline content as HTML markup in
//! a CDATA section. The markup is the same for both dialects.

use std::fmt::Write as _;

use tracing::debug;
use xamd_model::{BlockAlignment, MultimediaItem, Node, Table};

use crate::error::RenderError;
use crate::extension::Extensions;
use crate::footnotes::Scope;
use crate::profile::Profile;
use crate::script::ScriptValue;
use crate::state::Cancellation;
use crate::table::column_spans;

/// Escape HTML special characters.
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

/// Character of a named HTML entity (`amp`, `copy`, ...).
pub fn entity_char(name: &str) -> Option<char> {
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "copy" => '©',
        "reg" => '®',
        "trade" => '™',
        "hellip" => '…',
        "mdash" => '—',
        "ndash" => '–',
        "lsquo" => '‘',
        "rsquo" => '’',
        "ldquo" => '“',
        "rdquo" => '”',
        "laquo" => '«',
        "raquo" => '»',
        "bull" => '•',
        "middot" => '·',
        "deg" => '°',
        "plusmn" => '±',
        "times" => '×',
        "divide" => '÷',
        "micro" => 'µ',
        "para" => '¶',
        "sect" => '§',
        "euro" => '€',
        "pound" => '£',
        "yen" => '¥',
        "cent" => '¢',
        "frac12" => '½',
        "frac14" => '¼',
        "frac34" => '¾',
        "larr" => '←',
        "rarr" => '→',
        "uarr" => '↑',
        "darr" => '↓',
        "harr" => '↔',
        "le" => '≤',
        "ge" => '≥',
        "ne" => '≠',
        "infin" => '∞',
        "alpha" => 'α',
        "beta" => 'β',
        "gamma" => 'γ',
        "delta" => 'δ',
        "pi" => 'π',
        "sigma" => 'σ',
        "omega" => 'ω',
        _ => return None,
    };
    Some(c)
}

/// Plain text of span nodes, used for alt text and titles.
pub fn plain_text(nodes: &[Node]) -> String {
    let mut text = String::new();
    for node in nodes {
        node.walk(&mut |n| match n {
            Node::Text(t) | Node::InlineCode(t) | Node::HashTag(t) | Node::AutoLinkUrl(t) => {
                text.push_str(t);
            }
            Node::AutoLinkMail(email) => text.push_str(email),
            Node::Emoji(emoji) => text.push_str(&emoji.unicode),
            Node::LineBreak => text.push(' '),
            _ => {}
        });
    }
    text
}

/// Render `nodes` as HTML markup.
///
/// Footnote references are numbered through `scope`, so numbers agree with
/// the ones used by the surrounding XAML.
///
/// # Errors
///
/// Returns [`RenderError::Cancelled`] when `cancellation` fires mid-pass.
pub(crate) fn render_html(
    nodes: &[Node],
    scope: &mut Scope<'_>,
    extensions: &Extensions,
    profile: &Profile,
    cancellation: &Cancellation,
) -> Result<String, RenderError> {
    let mut pass = HtmlPass {
        scope,
        extensions,
        profile,
        cancellation,
        cancelled: false,
        out: String::new(),
    };
    pass.nodes(nodes);
    if pass.cancelled {
        return Err(RenderError::Cancelled);
    }
    Ok(pass.out)
}

struct HtmlPass<'a, 'd> {
    scope: &'a mut Scope<'d>,
    extensions: &'a Extensions,
    profile: &'a Profile,
    cancellation: &'a Cancellation,
    /// Set once the token fires; remaining nodes are skipped.
    cancelled: bool,
    out: String,
}

impl HtmlPass<'_, '_> {
    fn nodes(&mut self, nodes: &[Node]) {
        for node in nodes {
            if self.cancelled {
                return;
            }
            self.node(node);
        }
    }

    fn wrap(&mut self, tag: &str, children: &[Node]) {
        write!(self.out, "<{tag}>").unwrap();
        self.nodes(children);
        write!(self.out, "</{tag}>").unwrap();
    }

    fn text(&mut self, text: &str) {
        self.out.push_str(&escape_html(text));
    }

    fn node(&mut self, node: &Node) {
        if self.cancelled || self.cancellation.is_cancelled() {
            debug!("html pass cancelled");
            self.cancelled = true;
            return;
        }
        let doc = self.scope.doc;
        match node {
            Node::Text(text) | Node::HashTag(text) => self.text(text),
            Node::Strong(c) => self.wrap("strong", c),
            Node::Emphasize(c) => self.wrap("em", c),
            Node::Delete(c) => self.wrap("del", c),
            Node::Insert(c) => self.wrap("ins", c),
            Node::Underline(c) => self.wrap("u", c),
            Node::Superscript(c) => self.wrap("sup", c),
            Node::Subscript(c) => self.wrap("sub", c),
            Node::InlineCode(code) => {
                write!(self.out, "<code>{}</code>", escape_html(code)).unwrap();
            }
            Node::Link { url, children } => self.link(url, children),
            Node::LinkReference { label, children } => match doc.references.get(label) {
                Some(target) => self.link(&target.url, children),
                None => self.nodes(children),
            },
            Node::AutoLinkMail(email) => {
                let email = escape_html(email);
                write!(self.out, r#"<a href="mailto:{email}">{email}</a>"#).unwrap();
            }
            Node::AutoLinkUrl(url) => {
                let url = escape_html(url);
                write!(self.out, r#"<a href="{url}">{url}</a>"#).unwrap();
            }
            Node::Emoji(emoji) => self.text(&emoji.unicode),
            Node::HtmlEntity(name) => match entity_char(name) {
                Some(c) => self.text(c.encode_utf8(&mut [0; 4])),
                None => write!(self.out, "&amp;{};", escape_html(name)).unwrap(),
            },
            Node::HtmlEntityUnicode(code) => {
                if let Some(c) = char::from_u32(*code) {
                    self.text(c.encode_utf8(&mut [0; 4]));
                }
            }
            Node::LineBreak => self.out.push_str("<br/>"),
            Node::FootnoteReference { key, auto_expand } => {
                self.footnote_reference(key, *auto_expand);
            }
            Node::MetaReference(key) => {
                if let Some(value) = doc.metadata.joined(key) {
                    self.text(&value);
                }
            }
            Node::DetailsReference => {
                if let Some(value) = doc.metadata.joined("Details") {
                    self.text(&value);
                }
            }
            Node::Multimedia(multimedia) => match multimedia.items.first() {
                Some(item) => self.image(item, &plain_text(&multimedia.children)),
                None => self.nodes(&multimedia.children),
            },
            Node::MultimediaReference {
                label, children, ..
            } => match doc.references.get(label) {
                Some(item) => self.image(item, &plain_text(children)),
                None => self.nodes(children),
            },
            Node::InlineScript { expression, .. } => self.script(expression),
            Node::InlineHtml(html) => self.out.push_str(html),
            Node::Abbreviation { title, children } => {
                write!(self.out, r#"<abbr title="{}">"#, escape_html(title)).unwrap();
                self.nodes(children);
                self.out.push_str("</abbr>");
            }
            Node::Paragraph(c) => self.wrap("p", c),
            Node::Header { level, children } => {
                let tag = format!("h{}", (*level).clamp(1, 6));
                self.wrap(&tag, children);
            }
            Node::BulletList(items) => {
                self.out.push_str("<ul>");
                for item in items {
                    self.wrap("li", std::slice::from_ref(&item.child));
                }
                self.out.push_str("</ul>");
            }
            Node::NumberedList(items) => {
                self.out.push_str("<ol>");
                for item in items {
                    match item.number {
                        Some(number) => write!(self.out, r#"<li value="{number}">"#).unwrap(),
                        None => self.out.push_str("<li>"),
                    }
                    self.node(&item.child);
                    self.out.push_str("</li>");
                }
                self.out.push_str("</ol>");
            }
            Node::TaskList(items) => {
                self.out.push_str("<ul>");
                for item in items {
                    self.out
                        .push_str(if item.checked { "<li>☑ " } else { "<li>☐ " });
                    self.node(&item.child);
                    self.out.push_str("</li>");
                }
                self.out.push_str("</ul>");
            }
            Node::DefinitionList(groups) => {
                self.out.push_str("<dl>");
                for group in groups {
                    for term in &group.terms {
                        self.wrap("dt", std::slice::from_ref(term));
                    }
                    for description in &group.descriptions {
                        self.wrap("dd", std::slice::from_ref(description));
                    }
                }
                self.out.push_str("</dl>");
            }
            Node::Table(table) => self.table(table),
            Node::BlockQuote(c) => self.wrap("blockquote", c),
            Node::InsertBlocks(c) => self.wrap("ins", c),
            Node::DeleteBlocks(c) => self.wrap("del", c),
            Node::CodeBlock(block) => {
                let code = escape_html(&block.rows.join("\n"));
                write!(self.out, "<pre><code>{code}</code></pre>").unwrap();
            }
            Node::HorizontalRule | Node::SectionSeparator => self.out.push_str("<hr/>"),
            Node::Aligned {
                alignment,
                children,
            } => {
                let align = match alignment {
                    BlockAlignment::Left | BlockAlignment::Margin => "left",
                    BlockAlignment::Center => "center",
                    BlockAlignment::Right => "right",
                };
                write!(self.out, r#"<div style="text-align:{align}">"#).unwrap();
                self.nodes(children);
                self.out.push_str("</div>");
            }
            Node::SingleChild(child) | Node::Standalone(child) => self.node(child),
            Node::NestedBlock(c) | Node::HtmlBlock(c) => self.nodes(c),
            Node::CommentBlock(lines) => {
                write!(self.out, "<!-- {} -->", lines.join(" ").replace("--", "- -")).unwrap();
            }
            Node::InvisibleBreak => {}
        }
    }

    fn link(&mut self, url: &str, children: &[Node]) {
        write!(self.out, r#"<a href="{}">"#, escape_html(url)).unwrap();
        self.nodes(children);
        self.out.push_str("</a>");
    }

    fn image(&mut self, item: &MultimediaItem, alt: &str) {
        write!(
            self.out,
            r#"<img src="{}" alt="{}""#,
            escape_html(&item.url),
            escape_html(alt)
        )
        .unwrap();
        if let Some(title) = &item.title {
            write!(self.out, r#" title="{}""#, escape_html(title)).unwrap();
        }
        if let Some(width) = item.width {
            write!(self.out, r#" width="{width}""#).unwrap();
        }
        if let Some(height) = item.height {
            write!(self.out, r#" height="{height}""#).unwrap();
        }
        self.out.push_str("/>");
    }

    fn footnote_reference(&mut self, key: &str, auto_expand: bool) {
        let doc = self.scope.doc;
        let Some(footnote) = doc.footnotes.get(key) else {
            debug!(key, "unknown footnote");
            return;
        };
        if auto_expand && self.scope.begin_expand(key) {
            for node in &footnote.content {
                match node {
                    Node::Paragraph(children) => self.nodes(children),
                    other => self.node(other),
                }
            }
            self.scope.end_expand();
            return;
        }
        let number = self.scope.footnotes.reference(key);
        write!(self.out, r##"<sup><a href="#fn-{number}">{number}</a></sup>"##).unwrap();
    }

    fn script(&mut self, expression: &str) {
        let Some(evaluator) = self.extensions.evaluator() else {
            write!(self.out, "<code>{}</code>", escape_html(expression)).unwrap();
            return;
        };
        match evaluator.evaluate(expression) {
            Ok(ScriptValue::Document(nested)) => {
                let mut scope = Scope::new(&nested);
                let mut pass = HtmlPass {
                    scope: &mut scope,
                    extensions: self.extensions,
                    profile: self.profile,
                    cancellation: self.cancellation,
                    cancelled: false,
                    out: String::new(),
                };
                pass.nodes(&nested.nodes);
                self.cancelled = pass.cancelled;
                self.out.push_str(&pass.out);
            }
            Ok(value) => {
                if let Some(text) = value.as_text() {
                    self.text(&text);
                } else if let Some(source) = value.image_source(self.profile) {
                    let item = MultimediaItem {
                        url: source.url,
                        title: None,
                        width: source.width,
                        height: source.height,
                        content_type: None,
                    };
                    self.image(&item, "");
                } else {
                    debug!(expression, "script value has no HTML form");
                }
            }
            Err(error) => {
                let message = error.unnest().lines().join(" ");
                write!(
                    self.out,
                    r#"<span style="color:red">{}</span>"#,
                    escape_html(&message)
                )
                .unwrap();
            }
        }
    }

    fn table(&mut self, table: &Table) {
        match &table.id {
            Some(id) => write!(self.out, r#"<table id="{}">"#, escape_html(id)).unwrap(),
            None => self.out.push_str("<table>"),
        }
        if let Some(caption) = &table.caption {
            write!(self.out, "<caption>{}</caption>", escape_html(caption)).unwrap();
        }
        let header_count = table.headers.len();
        for (index, row) in table.all_rows().enumerate() {
            let tag = if index < header_count { "th" } else { "td" };
            self.out.push_str("<tr>");
            for placement in column_spans(row, table.columns) {
                if placement.span > 1 {
                    write!(self.out, r#"<{tag} colspan="{}">"#, placement.span).unwrap();
                } else {
                    write!(self.out, "<{tag}>").unwrap();
                }
                if let Some(cell) = placement.cell {
                    self.node(&cell.content);
                }
                write!(self.out, "</{tag}>").unwrap();
            }
            self.out.push_str("</tr>");
        }
        self.out.push_str("</table>");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScriptError;
    use crate::script::ScriptEvaluator;
    use pretty_assertions::assert_eq;
    use xamd_model::Document;

    fn html_with(doc: &Document, nodes: &[Node], extensions: &Extensions) -> String {
        let mut scope = Scope::new(doc);
        render_html(nodes, &mut scope, extensions, &Profile::maui(), &Cancellation::new()).unwrap()
    }

    fn html(doc: &Document, nodes: &[Node]) -> String {
        html_with(doc, nodes, &Extensions::new())
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a href=\"x\">'&'</a>"), "&lt;a href=&quot;x&quot;&gt;&#x27;&amp;&#x27;&lt;/a&gt;");
    }

    #[test]
    fn test_inline_formatting() {
        let doc = Document::default();
        let nodes = vec![
            Node::text("a < b "),
            Node::strong(vec![Node::emphasize(vec![Node::text("c")])]),
            Node::LineBreak,
            Node::link("https://x.org/?a=1&b=2", vec![Node::text("x")]),
        ];
        assert_eq!(
            html(&doc, &nodes),
            r#"a &lt; b <strong><em>c</em></strong><br/><a href="https://x.org/?a=1&amp;b=2">x</a>"#
        );
    }

    #[test]
    fn test_entities() {
        let doc = Document::default();
        let nodes = vec![
            Node::HtmlEntity("copy".to_owned()),
            Node::HtmlEntity("lt".to_owned()),
            Node::HtmlEntityUnicode(0x263A),
            Node::HtmlEntity("bogus".to_owned()),
        ];
        assert_eq!(html(&doc, &nodes), "©&lt;☺&amp;bogus;");
    }

    #[test]
    fn test_footnote_numbers_shared_with_scope() {
        let doc = Document::default()
            .with_footnote("a", vec![Node::paragraph(vec![Node::text("A")])])
            .with_footnote("b", vec![Node::paragraph(vec![Node::text("B")])]);
        let mut scope = Scope::new(&doc);
        scope.footnotes.reference("b");
        let out = render_html(
            &[Node::footnote_ref("a")],
            &mut scope,
            &Extensions::new(),
            &Profile::maui(),
            &Cancellation::new(),
        )
        .unwrap();
        assert_eq!(out, r##"<sup><a href="#fn-2">2</a></sup>"##);
        assert_eq!(scope.footnotes.keys(), ["b", "a"]);
    }

    #[test]
    fn test_auto_expanded_footnote() {
        let doc = Document::default().with_footnote("n", vec![Node::paragraph(vec![Node::text("note")])]);
        let node = Node::FootnoteReference {
            key: "n".to_owned(),
            auto_expand: true,
        };
        assert_eq!(html(&doc, &[node]), "note");
    }

    #[test]
    fn test_script_without_evaluator_is_code() {
        let doc = Document::default();
        assert_eq!(html(&doc, &[Node::script("1 < 2", false)]), "<code>1 &lt; 2</code>");
    }

    struct Fixed(ScriptValue);

    impl ScriptEvaluator for Fixed {
        fn evaluate(&self, _expression: &str) -> Result<ScriptValue, ScriptError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_script_graph_becomes_img() {
        let doc = Document::default();
        let graph = ScriptValue::Graph {
            png: vec![0x89, 0x50],
            width: None,
            height: None,
        };
        let extensions = Extensions::new().with_evaluator(Fixed(graph));
        assert_eq!(
            html_with(&doc, &[Node::script("plot()", false)], &extensions),
            r#"<img src="data:image/png;base64,iVA=" alt="" width="480" height="360"/>"#
        );
    }

    #[test]
    fn test_script_bitmap_becomes_img() {
        let doc = Document::default();
        let bitmap = ScriptValue::Bitmap {
            png: vec![1, 2, 3],
            width: 8,
            height: 4,
        };
        let extensions = Extensions::new().with_evaluator(Fixed(bitmap));
        assert_eq!(
            html_with(&doc, &[Node::script("pixels()", false)], &extensions),
            r#"<img src="data:image/png;base64,AQID" alt="" width="8" height="4"/>"#
        );
    }

    #[test]
    fn test_table_caption_and_id() {
        let doc = Document::default();
        let mut table = Table::new(1);
        table.rows = vec![vec![Some(xamd_model::Cell::new(Node::text("x")))]];
        table.caption = Some("Q&A".to_owned());
        table.id = Some("t1".to_owned());
        assert_eq!(
            html(&doc, &[Node::Table(table)]),
            r#"<table id="t1"><caption>Q&amp;A</caption><tr><td>x</td></tr></table>"#
        );
    }

    #[test]
    fn test_cancelled_pass_is_an_error() {
        let doc = Document::default();
        let token = Cancellation::new();
        token.cancel();
        let mut scope = Scope::new(&doc);
        let result = render_html(
            &[Node::text("a"), Node::text("b")],
            &mut scope,
            &Extensions::new(),
            &Profile::maui(),
            &token,
        );
        assert!(matches!(result, Err(RenderError::Cancelled)));
    }

    #[test]
    fn test_plain_text() {
        let nodes = vec![
            Node::text("a "),
            Node::strong(vec![Node::text("b")]),
            Node::InlineCode("c".to_owned()),
        ];
        assert_eq!(plain_text(&nodes), "a bc");
    }
}
