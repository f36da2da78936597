//! Document traversal shared by every dialect.

use std::sync::Arc;

use tracing::{debug, warn};
use xamd_model::{Alignment, Document, Emoji, MultimediaItem, Node};

use crate::dialect::{Dialect, PanelKind, Spacing, label_alignment, layout_alignment};
use crate::error::{HandlerError, RenderError, ScriptError};
use crate::extension::{Extensions, HandlerContext, HandlerOutcome, content_type, write_image};
use crate::footnotes::Scope;
use crate::html::entity_char;
use crate::margins::margins;
use crate::runs::{Run, RunAccumulator};
use crate::script::ScriptValue;
use crate::state::{Cancellation, RenderState};
use crate::writer::MarkupWriter;

/// Renders a [`Document`] through a [`Dialect`] into a [`MarkupWriter`].
///
/// A renderer performs one pass: [`render`](Self::render) consumes it. The
/// writer stays with the caller, so it can be finished or inspected even
/// after a failed or cancelled pass.
///
/// # Example
///
/// ```
/// use xamd_model::{Document, Node};
/// use xamd_renderer::{MauiDialect, Renderer, XmlMarkupWriter};
///
/// let doc = Document::new(vec![Node::paragraph(vec![Node::text("Hello")])]);
/// let mut writer = XmlMarkupWriter::new(Vec::new());
/// Renderer::new(MauiDialect::new(), &mut writer)
///     .render(&doc, false)
///     .unwrap();
/// let xaml = writer.into_string().unwrap();
/// assert!(xaml.contains(r#"<Span Text="Hello"/>"#));
/// ```
pub struct Renderer<'w, D: Dialect, W: MarkupWriter> {
    pub(crate) dialect: D,
    pub(crate) out: &'w mut W,
    pub(crate) extensions: Arc<Extensions>,
    pub(crate) cancellation: Cancellation,
    /// Runs waiting for the enclosing block to flush them.
    runs: RunAccumulator,
}

impl<'w, D: Dialect, W: MarkupWriter> Renderer<'w, D, W> {
    /// Create a renderer with the default extensions.
    pub fn new(dialect: D, out: &'w mut W) -> Self {
        Self {
            dialect,
            out,
            extensions: Arc::new(Extensions::with_defaults()),
            cancellation: Cancellation::new(),
            runs: RunAccumulator::new(),
        }
    }

    /// Replace the registered extensions.
    #[must_use]
    pub fn with_extensions(mut self, extensions: Extensions) -> Self {
        self.extensions = Arc::new(extensions);
        self
    }

    /// Observe `cancellation` before every node.
    #[must_use]
    pub fn with_cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Render `document`.
    ///
    /// With `inclusion` set (or the document's `body_only` flag), the outer
    /// root element is omitted so the output can be embedded in another
    /// document. On error every element opened by this pass is closed again
    /// before returning.
    pub fn render(mut self, document: &Document, inclusion: bool) -> Result<(), RenderError> {
        let depth = self.out.depth();
        let result = self.document(document, inclusion);
        if let Err(error) = &result {
            debug!(%error, "render aborted, closing open elements");
            self.runs.clear();
            self.unwind(depth);
        }
        result
    }

    pub(crate) fn document(&mut self, doc: &Document, inclusion: bool) -> Result<(), RenderError> {
        let wrapped = !inclusion && !doc.metadata.body_only;
        if wrapped {
            self.dialect.open_root(&mut *self.out)?;
        }
        let mut scope = Scope::new(doc);
        let state = RenderState::default();
        for node in &doc.nodes {
            self.node(node, &state, &mut scope)?;
        }
        self.flush_runs()?;
        self.footnote_section(&mut scope)?;
        if wrapped {
            self.out.close_element()?;
        }
        Ok(())
    }

    pub(crate) fn node(
        &mut self,
        node: &Node,
        state: &RenderState,
        scope: &mut Scope<'_>,
    ) -> Result<(), RenderError> {
        if self.cancellation.is_cancelled() {
            debug!("render cancelled");
            return Err(RenderError::Cancelled);
        }
        if node.is_inline_span() {
            self.span(node, state, scope)
        } else {
            self.flush_runs()?;
            self.block(node, state, scope)
        }
    }

    pub(crate) fn nodes(
        &mut self,
        nodes: &[Node],
        state: &RenderState,
        scope: &mut Scope<'_>,
    ) -> Result<(), RenderError> {
        for node in nodes {
            self.node(node, state, scope)?;
        }
        Ok(())
    }

    fn block(
        &mut self,
        node: &Node,
        state: &RenderState,
        scope: &mut Scope<'_>,
    ) -> Result<(), RenderError> {
        match node {
            Node::Paragraph(children) => {
                let m = margins(node);
                self.open_content_view(
                    Spacing::Paragraph {
                        top: m.top,
                        bottom: m.bottom,
                    },
                    state.alignment,
                )?;
                self.nodes(children, state, scope)?;
                self.flush_runs()?;
                self.close()
            }
            Node::Header { level, children } => self.header(*level, children, state, scope),
            Node::BulletList(items) => {
                let items = items.iter().map(|i| ("•".to_owned(), &i.child)).collect();
                self.list(items, state, scope)
            }
            Node::NumberedList(items) => {
                let mut expected: u32 = 0;
                let items = items
                    .iter()
                    .map(|item| {
                        expected = item.number.unwrap_or(expected.saturating_add(1));
                        (format!("{expected}."), &item.child)
                    })
                    .collect();
                self.list(items, state, scope)
            }
            Node::TaskList(items) => {
                let items = items
                    .iter()
                    .map(|i| (String::from(if i.checked { "✓" } else { "" }), &i.child))
                    .collect();
                self.list(items, state, scope)
            }
            Node::DefinitionList(groups) => self.definition_list(groups, state, scope),
            Node::Table(table) => self.table(table, scope),
            Node::BlockQuote(children) => self.panel(PanelKind::Quote, children, state, scope),
            Node::InsertBlocks(children) => self.panel(PanelKind::Insert, children, state, scope),
            Node::DeleteBlocks(children) => self.panel(PanelKind::Delete, children, state, scope),
            Node::CodeBlock(block) => self.code_block(block, state),
            Node::HorizontalRule | Node::SectionSeparator => self.rule(),
            Node::Aligned {
                alignment,
                children,
            } => {
                let inner = state.with(|s| s.alignment = alignment.text_alignment());
                self.dialect.open_vertical_stack(&mut *self.out)?;
                self.nodes(children, &inner, scope)?;
                self.flush_runs()?;
                self.close()
            }
            Node::SingleChild(child) => self.node(child, state, scope),
            Node::NestedBlock(children) => {
                self.nodes(children, state, scope)?;
                self.flush_runs()
            }
            Node::Standalone(child) => self.standalone(child, state, scope),
            Node::HtmlBlock(children) => self.html_block(children, state, scope),
            Node::CommentBlock(_) | Node::InvisibleBreak => Ok(()),
            span => self.span(span, state, scope),
        }
    }

    fn span(
        &mut self,
        node: &Node,
        state: &RenderState,
        scope: &mut Scope<'_>,
    ) -> Result<(), RenderError> {
        let doc = scope.doc;
        match node {
            Node::Text(text) | Node::HashTag(text) => self.run(text, state),
            Node::Strong(c) => self.nodes(c, &state.with(|s| s.bold = true), scope)?,
            Node::Emphasize(c) => self.nodes(c, &state.with(|s| s.italic = true), scope)?,
            Node::Delete(c) => self.nodes(c, &state.with(|s| s.strike_through = true), scope)?,
            Node::Insert(c) | Node::Underline(c) => {
                self.nodes(c, &state.with(|s| s.underline = true), scope)?;
            }
            Node::Superscript(c) => self.nodes(c, &state.with(|s| s.superscript = true), scope)?,
            Node::Subscript(c) => self.nodes(c, &state.with(|s| s.subscript = true), scope)?,
            Node::InlineCode(code) => self.run(code, &state.with(|s| s.code = true)),
            Node::Link { url, children } => {
                let linked = state.with(|s| s.hyperlink = Some(url.clone()));
                self.nodes(children, &linked, scope)?;
            }
            Node::LinkReference { label, children } => match doc.references.get(label) {
                Some(target) => {
                    let linked = state.with(|s| s.hyperlink = Some(target.url.clone()));
                    self.nodes(children, &linked, scope)?;
                }
                None => {
                    debug!(label, "unresolved link reference");
                    self.nodes(children, state, scope)?;
                }
            },
            Node::AutoLinkMail(email) => {
                let linked = state.with(|s| s.hyperlink = Some(format!("mailto:{email}")));
                self.run(email, &linked);
            }
            Node::AutoLinkUrl(url) => {
                let linked = state.with(|s| s.hyperlink = Some(url.clone()));
                self.run(url, &linked);
            }
            Node::Emoji(emoji) => self.run(&emoji.unicode, state),
            Node::HtmlEntity(name) => match entity_char(name) {
                Some(c) => self.run(c.encode_utf8(&mut [0; 4]), state),
                None => {
                    debug!(name, "unknown HTML entity");
                    self.run(&format!("&{name};"), state);
                }
            },
            Node::HtmlEntityUnicode(code) => match char::from_u32(*code) {
                Some(c) => self.run(c.encode_utf8(&mut [0; 4]), state),
                None => debug!(code, "invalid code point"),
            },
            Node::LineBreak => self.run("\n", state),
            Node::FootnoteReference { key, auto_expand } => {
                self.footnote_reference(key, *auto_expand, state, scope)?;
            }
            Node::MetaReference(key) => match doc.metadata.joined(key) {
                Some(value) => self.run(&value, state),
                None => debug!(key, "unresolved meta reference"),
            },
            Node::DetailsReference => {
                if let Some(detail) = doc.detail.as_deref() {
                    self.flush_runs()?;
                    self.document(detail, true)?;
                } else if let Some(value) = doc.metadata.joined("Details") {
                    self.run(&value, state);
                } else {
                    debug!("no detail document");
                }
            }
            Node::Multimedia(multimedia) => {
                self.multimedia(&multimedia.items, &multimedia.children, state, scope)?;
            }
            Node::MultimediaReference {
                label, children, ..
            } => match doc.references.get(label) {
                Some(item) => self.multimedia(std::slice::from_ref(item), children, state, scope)?,
                None => {
                    debug!(label, "unresolved multimedia reference");
                    self.nodes(children, state, scope)?;
                }
            },
            Node::InlineScript {
                expression,
                alone_in_paragraph,
            } => self.script(expression, *alone_in_paragraph, state)?,
            Node::InlineHtml(html) => self.runs.append_comment(html),
            Node::Abbreviation { children, .. } | Node::NestedBlock(children) => {
                self.nodes(children, state, scope)?;
            }
            Node::SingleChild(child) => self.node(child, state, scope)?,
            block => {
                self.flush_runs()?;
                self.block(block, state, scope)?;
            }
        }
        Ok(())
    }

    fn footnote_reference(
        &mut self,
        key: &str,
        auto_expand: bool,
        state: &RenderState,
        scope: &mut Scope<'_>,
    ) -> Result<(), RenderError> {
        let doc = scope.doc;
        let Some(footnote) = doc.footnotes.get(key) else {
            debug!(key, "unknown footnote");
            return Ok(());
        };
        if auto_expand && scope.begin_expand(key) {
            let mut result = Ok(());
            for node in &footnote.content {
                result = match node {
                    Node::Paragraph(children) => self.nodes(children, state, scope),
                    other => self.node(other, state, scope),
                };
                if result.is_err() {
                    break;
                }
            }
            scope.end_expand();
            return result;
        }
        let number = scope.footnotes.reference(key);
        self.run(&number.to_string(), &state.with(|s| s.superscript = true));
        Ok(())
    }

    fn standalone(
        &mut self,
        child: &Node,
        state: &RenderState,
        scope: &mut Scope<'_>,
    ) -> Result<(), RenderError> {
        self.open_content_view(Spacing::PARAGRAPH, state.alignment)?;
        match child {
            Node::Emoji(emoji) => self.emoji_block(emoji, state)?,
            Node::InlineScript { expression, .. } => self.script(expression, false, state)?,
            other => self.node(other, state, scope)?,
        }
        self.flush_runs()?;
        self.close()
    }

    fn emoji_block(&mut self, emoji: &Emoji, state: &RenderState) -> Result<(), RenderError> {
        let extensions = Arc::clone(&self.extensions);
        match extensions.emoji_source() {
            Some(source) if source.supports(emoji) => match source.image_source(emoji) {
                Ok(image) => return Ok(write_image(&mut *self.out, &image)?),
                Err(error) => {
                    warn!(emoji = %emoji.short_name, %error, "emoji image unavailable");
                    self.run(&emoji.unicode, state);
                }
            },
            Some(_) => self.run(&emoji.unicode, state),
            None => {
                let delimiter = ":".repeat(usize::from(emoji.level.max(1)));
                self.run(&format!("{delimiter}{}{delimiter}", emoji.short_name), state);
            }
        }
        self.flush_runs()
    }

    /// Offer `items` to the registered multimedia handlers; render `alt`
    /// when none of them renders an item.
    fn multimedia(
        &mut self,
        items: &[MultimediaItem],
        alt: &[Node],
        state: &RenderState,
        scope: &mut Scope<'_>,
    ) -> Result<(), RenderError> {
        let extensions = Arc::clone(&self.extensions);
        for item in items {
            let Some(kind) = content_type(item) else {
                continue;
            };
            let Some(handler) = extensions.multimedia_handler(&kind) else {
                continue;
            };
            self.flush_runs()?;
            let depth = self.out.depth();
            let mut ctx = HandlerContext {
                out: &mut *self.out,
                alignment: state.alignment,
                dialect: self.dialect.kind(),
                profile: self.dialect.profile(),
            };
            match handler.render(item, &mut ctx) {
                Ok(HandlerOutcome::Rendered) => return self.close_to(depth),
                Ok(HandlerOutcome::Declined) => self.unwind(depth),
                Err(HandlerError::Write(error)) => return Err(error.into()),
                Err(error) => {
                    warn!(url = %item.url, content_type = %kind, %error, "multimedia handler failed");
                    self.unwind(depth);
                }
            }
        }
        self.nodes(alt, state, scope)
    }

    fn script(
        &mut self,
        expression: &str,
        alone: bool,
        state: &RenderState,
    ) -> Result<(), RenderError> {
        let extensions = Arc::clone(&self.extensions);
        let Some(evaluator) = extensions.evaluator() else {
            debug!(expression, "no script evaluator, rendering expression as code");
            self.run(expression, &state.with(|s| s.code = true));
            return Ok(());
        };
        match evaluator.evaluate(expression) {
            Ok(value) => self.script_value(value, alone, state),
            Err(error) => {
                warn!(expression, %error, "inline script failed");
                self.script_error(&error.unnest(), alone, state)
            }
        }
    }

    fn script_value(
        &mut self,
        value: ScriptValue,
        alone: bool,
        state: &RenderState,
    ) -> Result<(), RenderError> {
        if let Some(text) = value.as_text() {
            if alone {
                self.flush_runs()?;
                self.open_content_view(Spacing::PARAGRAPH, state.alignment)?;
                self.out.open_element("Label")?;
                self.out.attribute("LineBreakMode", "WordWrap")?;
                self.out
                    .attribute("HorizontalTextAlignment", label_alignment(state.alignment))?;
                self.out.attribute("Text", &text)?;
                self.out.close_element()?;
                self.close()?;
            } else {
                self.run(&text, state);
            }
            return Ok(());
        }
        if let Some(source) = value.image_source(self.dialect.profile()) {
            self.flush_runs()?;
            return Ok(write_image(&mut *self.out, &source)?);
        }
        if let ScriptValue::Document(nested) = value {
            self.flush_runs()?;
            return self.document(&nested, true);
        }
        Ok(())
    }

    fn script_error(
        &mut self,
        error: &ScriptError,
        alone: bool,
        state: &RenderState,
    ) -> Result<(), RenderError> {
        if !alone && !error.is_aggregate() {
            let mut run = Run::new(&error.message, state);
            run.style.error = true;
            self.runs.append(run, state.alignment);
            return Ok(());
        }
        self.flush_runs()?;
        for line in error.lines() {
            self.error_block(line, state.alignment)?;
        }
        Ok(())
    }

    /// Error label wrapped in its own block container.
    pub(crate) fn error_block(&mut self, message: &str, alignment: Alignment) -> Result<(), RenderError> {
        self.open_content_view(Spacing::PARAGRAPH, alignment)?;
        self.error_label(message, alignment)?;
        self.close()
    }

    fn error_label(&mut self, message: &str, alignment: Alignment) -> Result<(), RenderError> {
        self.out.open_element("Label")?;
        self.out.attribute("LineBreakMode", "WordWrap")?;
        self.out
            .attribute("HorizontalTextAlignment", label_alignment(alignment))?;
        self.out
            .attribute("TextColor", &self.dialect.profile().error_color)?;
        self.out.attribute("Text", message)?;
        Ok(self.out.close_element()?)
    }

    pub(crate) fn run(&mut self, text: &str, state: &RenderState) {
        if !text.is_empty() {
            self.runs.append(Run::new(text, state), state.alignment);
        }
    }

    pub(crate) fn flush_runs(&mut self) -> Result<(), RenderError> {
        Ok(self.runs.flush(self.dialect.profile(), &mut *self.out)?)
    }

    /// Open a `ContentView` padded for `spacing`.
    pub(crate) fn open_content_view(
        &mut self,
        spacing: Spacing,
        alignment: Alignment,
    ) -> Result<(), RenderError> {
        let padding = self.dialect.spacing(spacing);
        self.out.open_element("ContentView")?;
        self.out.attribute("Padding", &padding)?;
        if alignment != Alignment::Left {
            self.out
                .attribute("HorizontalOptions", layout_alignment(alignment))?;
        }
        Ok(())
    }

    pub(crate) fn close(&mut self) -> Result<(), RenderError> {
        Ok(self.out.close_element()?)
    }

    /// Close elements until the writer is back at `depth`.
    pub(crate) fn close_to(&mut self, depth: usize) -> Result<(), RenderError> {
        while self.out.depth() > depth {
            self.out.close_element()?;
        }
        Ok(())
    }

    /// Like [`close_to`](Self::close_to), ignoring write failures.
    pub(crate) fn unwind(&mut self, depth: usize) {
        while self.out.depth() > depth {
            if self.out.close_element().is_err() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WriteError;
    use crate::extension::{CodeBlockHandler, EmojiSource, ImageSource, MultimediaHandler};
    use crate::maui::MauiDialect;
    use crate::script::ScriptEvaluator;
    use crate::writer::{Element, TreeWriter, XmlMarkupWriter};
    use crate::xamarin::XamarinFormsDialect;
    use pretty_assertions::assert_eq;
    use xamd_model::{CodeBlock, Multimedia, NumberedItem};

    struct Fixed(Result<ScriptValue, ScriptError>);

    impl ScriptEvaluator for Fixed {
        fn evaluate(&self, _expression: &str) -> Result<ScriptValue, ScriptError> {
            self.0.clone()
        }
    }

    struct CancelOnEvaluate(Cancellation);

    impl ScriptEvaluator for CancelOnEvaluate {
        fn evaluate(&self, _expression: &str) -> Result<ScriptValue, ScriptError> {
            self.0.cancel();
            Ok(ScriptValue::Text("x".to_owned()))
        }
    }

    struct Failing;

    impl CodeBlockHandler for Failing {
        fn render(
            &self,
            _block: &CodeBlock,
            ctx: &mut HandlerContext<'_>,
        ) -> Result<HandlerOutcome, HandlerError> {
            ctx.out.open_element("Grid")?;
            Err(HandlerError::Failed("diagram service unavailable".to_owned()))
        }
    }

    struct Broken;

    impl MultimediaHandler for Broken {
        fn render(
            &self,
            _item: &MultimediaItem,
            _ctx: &mut HandlerContext<'_>,
        ) -> Result<HandlerOutcome, HandlerError> {
            Err(HandlerError::Failed("codec missing".to_owned()))
        }
    }

    struct Twemoji;

    impl EmojiSource for Twemoji {
        fn supports(&self, emoji: &Emoji) -> bool {
            emoji.short_name == "smile"
        }

        fn image_source(&self, emoji: &Emoji) -> Result<ImageSource, HandlerError> {
            Ok(ImageSource {
                url: format!("emoji/{}.png", emoji.short_name),
                width: Some(16),
                height: Some(16),
            })
        }
    }

    fn render_with(doc: &Document, extensions: Extensions) -> Element {
        let mut out = TreeWriter::new();
        Renderer::new(MauiDialect::new(), &mut out)
            .with_extensions(extensions)
            .render(doc, false)
            .unwrap();
        out.into_elements().remove(0)
    }

    fn render(doc: &Document) -> Element {
        render_with(doc, Extensions::with_defaults())
    }

    fn xaml(doc: &Document) -> String {
        let mut writer = XmlMarkupWriter::new(Vec::new());
        Renderer::new(MauiDialect::new(), &mut writer)
            .render(doc, false)
            .unwrap();
        writer.into_string().unwrap()
    }

    fn span_texts(root: &Element) -> Vec<String> {
        root.find_all("Span")
            .iter()
            .filter_map(|s| s.attr("Text"))
            .map(str::to_owned)
            .collect()
    }

    #[test]
    fn test_root_element() {
        let root = render(&Document::default());
        assert_eq!(root.name, "VerticalStackLayout");
        assert_eq!(
            root.attr("xmlns"),
            Some("http://schemas.microsoft.com/dotnet/2021/maui")
        );
        assert_eq!(root.attr("Spacing"), Some("0"));
    }

    #[test]
    fn test_body_only_and_inclusion_skip_root() {
        let mut doc = Document::new(vec![Node::paragraph(vec![Node::text("a")])]);
        let mut out = TreeWriter::new();
        Renderer::new(MauiDialect::new(), &mut out)
            .render(&doc, true)
            .unwrap();
        assert_eq!(out.into_elements()[0].name, "ContentView");

        doc.metadata.body_only = true;
        let mut out = TreeWriter::new();
        Renderer::new(MauiDialect::new(), &mut out)
            .render(&doc, false)
            .unwrap();
        assert_eq!(out.into_elements()[0].name, "ContentView");
    }

    #[test]
    fn test_render_is_deterministic() {
        let doc = Document::new(vec![
            Node::header(1, vec![Node::text("Title")]),
            Node::paragraph(vec![
                Node::text("a"),
                Node::footnote_ref("n"),
                Node::link("https://example.com", vec![Node::text("link")]),
            ]),
            Node::CodeBlock(CodeBlock::new(None, ["x = 1"])),
        ])
        .with_footnote("n", vec![Node::paragraph(vec![Node::text("note")])]);
        assert_eq!(xaml(&doc), xaml(&doc));
    }

    #[test]
    fn test_inline_spans_share_one_host() {
        let doc = Document::new(vec![Node::paragraph(vec![
            Node::text("Hello "),
            Node::strong(vec![Node::text("world")]),
        ])]);
        let root = render(&doc);

        assert_eq!(root.find_all("Label").len(), 1);
        let spans = root.find_all("Span");
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].attr("Text"), Some("Hello "));
        assert_eq!(spans[0].attr("FontAttributes"), None);
        assert_eq!(spans[1].attr("Text"), Some("world"));
        assert_eq!(spans[1].attr("FontAttributes"), Some("Bold"));
    }

    #[test]
    fn test_formatting_does_not_leak_past_failed_script() {
        let doc = Document::new(vec![Node::paragraph(vec![
            Node::strong(vec![Node::text("a"), Node::script("boom()", false)]),
            Node::text("after"),
        ])]);
        let extensions =
            Extensions::new().with_evaluator(Fixed(Err(ScriptError::new("no such function"))));
        let root = render_with(&doc, extensions);

        let spans = root.find_all("Span");
        let after = spans.iter().find(|s| s.attr("Text") == Some("after")).unwrap();
        assert_eq!(after.attr("FontAttributes"), None);
        let bold = spans.iter().find(|s| s.attr("Text") == Some("a")).unwrap();
        assert_eq!(bold.attr("FontAttributes"), Some("Bold"));

        let error = spans
            .iter()
            .find(|s| s.attr("Text") == Some("no such function"))
            .unwrap();
        assert_eq!(error.attr("TextColor"), Some("Red"));
        assert_eq!(error.attr("FontAttributes"), Some("Bold"));
    }

    #[test]
    fn test_inline_script_error_stays_in_host() {
        let doc = Document::new(vec![Node::paragraph(vec![
            Node::text("a "),
            Node::script("boom()", false),
            Node::text(" b"),
        ])]);
        let extensions = Extensions::new().with_evaluator(Fixed(Err(ScriptError::new("boom"))));
        let root = render_with(&doc, extensions);

        let paragraph = root.child("ContentView").unwrap();
        let children: Vec<_> = paragraph.elements().map(|e| e.name.as_str()).collect();
        assert_eq!(children, ["Label"]);
        let spans = paragraph.find_all("Span");
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[1].attr("Text"), Some("boom"));
        assert_eq!(spans[1].attr("TextColor"), Some("Red"));
        assert_eq!(spans[2].attr("TextColor"), None);
    }

    #[test]
    fn test_alone_script_error_gets_own_label() {
        let doc = Document::new(vec![Node::paragraph(vec![Node::script("boom()", true)])]);
        let extensions = Extensions::new().with_evaluator(Fixed(Err(ScriptError::new("boom"))));
        let root = render_with(&doc, extensions);

        assert!(root.find_all("Span").is_empty());
        let label = &root.find_all("Label")[0];
        assert_eq!(label.attr("Text"), Some("boom"));
        assert_eq!(label.attr("TextColor"), Some("Red"));
    }

    #[test]
    fn test_hyperlink_span() {
        let doc = Document::new(vec![Node::paragraph(vec![Node::AutoLinkMail(
            "me@example.com".to_owned(),
        )])]);
        let root = render(&doc);
        let taps = root.find_all("TapGestureRecognizer");
        assert_eq!(taps[0].attr("CommandParameter"), Some("mailto:me@example.com"));
        assert_eq!(span_texts(&root), ["me@example.com"]);
    }

    #[test]
    fn test_numbered_list() {
        let item = |number: Option<u32>, text: &str| NumberedItem {
            number,
            child: Node::text(text),
        };
        let doc = Document::new(vec![Node::NumberedList(vec![
            item(None, "one"),
            item(None, "two"),
            item(Some(7), "seven"),
        ])]);
        let root = render(&doc);

        let grid = &root.find_all("Grid")[0];
        assert_eq!(grid.find_all("RowDefinition").len(), 3);
        assert_eq!(grid.find_all("ColumnDefinition").len(), 2);

        let markers: Vec<_> = grid
            .find_all("ContentView")
            .into_iter()
            .filter(|c| c.attr("Grid.Column") == Some("0"))
            .map(|c| c.child("Label").and_then(|l| l.attr("Text")).unwrap_or_default())
            .collect();
        assert_eq!(markers, ["1.", "2.", "7."]);
        assert_eq!(span_texts(&root), ["one", "two", "seven"]);
    }

    #[test]
    fn test_numbered_list_ordinal_saturates() {
        let doc = Document::new(vec![Node::NumberedList(vec![
            NumberedItem {
                number: Some(u32::MAX),
                child: Node::text("last"),
            },
            NumberedItem {
                number: None,
                child: Node::text("after"),
            },
        ])]);
        let root = render(&doc);

        let markers: Vec<_> = root
            .find_all("ContentView")
            .into_iter()
            .filter(|c| c.attr("Grid.Column") == Some("0"))
            .map(|c| c.child("Label").and_then(|l| l.attr("Text")).unwrap_or_default())
            .collect();
        let expected = format!("{}.", u32::MAX);
        assert_eq!(markers, [expected.as_str(), expected.as_str()]);
    }

    #[test]
    fn test_task_list_marks_checked_items_only() {
        let doc = Document::new(vec![Node::TaskList(vec![
            xamd_model::TaskItem {
                checked: true,
                child: Node::text("done"),
            },
            xamd_model::TaskItem {
                checked: false,
                child: Node::text("todo"),
            },
        ])]);
        let root = render(&doc);
        let marks: Vec<_> = root
            .find_all("Label")
            .into_iter()
            .filter_map(|l| l.attr("Text"))
            .collect();
        assert_eq!(marks, ["✓"]);
    }

    #[test]
    fn test_code_block_fallback_lines() {
        let doc = Document::new(vec![Node::CodeBlock(CodeBlock::new(
            Some("rust"),
            ["fn main() {", "}"],
        ))]);
        let root = render(&doc);
        let lines: Vec<_> = root
            .find_all("Label")
            .into_iter()
            .filter(|l| l.attr("LineBreakMode") == Some("NoWrap"))
            .map(|l| l.attr("Text").unwrap_or_default())
            .collect();
        assert_eq!(lines, ["fn main() {", "}"]);
    }

    #[test]
    fn test_failing_code_handler_falls_back() {
        let doc = Document::new(vec![Node::CodeBlock(CodeBlock::new(
            Some("plantuml"),
            ["a -> b"],
        ))]);
        let root = render_with(&doc, Extensions::new().with_code_handler("plantuml", Failing));

        let labels = root.find_all("Label");
        assert_eq!(labels[0].attr("TextColor"), Some("Red"));
        assert_eq!(labels[0].attr("Text"), Some("diagram service unavailable"));
        assert_eq!(labels[1].attr("Text"), Some("a -> b"));
        assert_eq!(labels[1].attr("LineBreakMode"), Some("NoWrap"));
    }

    #[test]
    fn test_footnotes_numbered_by_first_reference() {
        let doc = Document::new(vec![Node::paragraph(vec![
            Node::footnote_ref("b"),
            Node::footnote_ref("a"),
            Node::footnote_ref("b"),
        ])])
        .with_footnote("a", vec![Node::paragraph(vec![Node::text("A")])])
        .with_footnote("b", vec![Node::paragraph(vec![Node::text("B")])]);
        let root = render(&doc);

        assert_eq!(span_texts(&root), ["¹", "²", "¹", "B", "A"]);
    }

    #[test]
    fn test_only_referenced_footnotes_listed() {
        let doc = Document::new(vec![Node::paragraph(vec![
            Node::text("see"),
            Node::footnote_ref("used"),
        ])])
        .with_footnote("unused", vec![Node::paragraph(vec![Node::text("never")])])
        .with_footnote("used", vec![Node::paragraph(vec![Node::text("shown")])]);
        let root = render(&doc);

        assert_eq!(root.find_all("BoxView").len(), 1);
        let grid = &root.find_all("Grid")[0];
        assert_eq!(grid.find_all("RowDefinition").len(), 1);
        let number = &grid.find_all("Label")[0];
        assert_eq!(number.attr("Text"), Some("1"));
        assert!(!span_texts(&root).contains(&"never".to_owned()));
    }

    #[test]
    fn test_auto_expanded_footnote_is_inlined() {
        let doc = Document::new(vec![Node::paragraph(vec![
            Node::text("x "),
            Node::FootnoteReference {
                key: "n".to_owned(),
                auto_expand: true,
            },
        ])])
        .with_footnote("n", vec![Node::paragraph(vec![Node::text("inline")])]);
        let root = render(&doc);

        assert_eq!(span_texts(&root), ["x ", "inline"]);
        assert!(root.find_all("BoxView").is_empty());
    }

    #[test]
    fn test_details_reference_renders_detail_document() {
        let detail = Document::new(vec![
            Node::paragraph(vec![Node::text("more"), Node::footnote_ref("d")]),
        ])
        .with_footnote("d", vec![Node::paragraph(vec![Node::text("detail note")])]);
        let doc = Document::new(vec![
            Node::paragraph(vec![Node::text("intro"), Node::footnote_ref("n")]),
            Node::paragraph(vec![Node::DetailsReference]),
        ])
        .with_footnote("n", vec![Node::paragraph(vec![Node::text("outer note")])])
        .with_detail(detail);
        let root = render(&doc);

        let stacks = root.find_all("VerticalStackLayout");
        assert!(stacks.iter().all(|s| s.attr("xmlns").is_none()));
        assert_eq!(
            span_texts(&root),
            ["intro", "¹", "more", "¹", "detail note", "outer note"]
        );
        // One footnote section per document scope, each numbered from 1.
        assert_eq!(root.find_all("BoxView").len(), 2);
        let numbers: Vec<_> = root
            .find_all("Grid")
            .iter()
            .map(|g| g.find_all("Label")[0].attr("Text").unwrap_or_default())
            .collect();
        assert_eq!(numbers, ["1", "1"]);
    }

    #[test]
    fn test_details_reference_falls_back_to_meta() {
        let doc = Document::new(vec![Node::paragraph(vec![
            Node::text("see "),
            Node::DetailsReference,
        ])])
        .with_meta("Details", ["the appendix"]);
        let root = render(&doc);
        assert_eq!(span_texts(&root), ["see ", "the appendix"]);

        let bare = Document::new(vec![Node::paragraph(vec![Node::DetailsReference])]);
        assert!(render(&bare).find_all("Span").is_empty());
    }

    #[test]
    fn test_header_content_is_html() {
        let doc = Document::new(vec![Node::header(
            2,
            vec![Node::text("A & "), Node::strong(vec![Node::text("B")])],
        )]);
        let out = xaml(&doc);
        assert!(out.contains(r#"Style="{StaticResource Header2}""#));
        assert!(out.contains(r#"TextType="Html""#));
        assert!(out.contains("<![CDATA[A &amp; <strong>B</strong>]]>"));
    }

    #[test]
    fn test_xamarin_header_and_root() {
        let doc = Document::new(vec![Node::header(1, vec![Node::text("T")])]);
        let mut out = TreeWriter::new();
        Renderer::new(XamarinFormsDialect::new(), &mut out)
            .render(&doc, false)
            .unwrap();
        let root = out.into_elements().remove(0);

        assert_eq!(root.name, "StackLayout");
        assert_eq!(root.attr("xmlns"), Some("http://xamarin.com/schemas/2014/forms"));
        let label = &root.find_all("Label")[0];
        assert_eq!(label.attr("FontSize"), Some("28"));
        assert_eq!(label.attr("TextColor"), Some("Navy"));
        assert_eq!(label.attr("Style"), None);
        let view = &root.find_all("ContentView")[0];
        assert_eq!(view.attr("Padding"), Some("0,5,0,5"));
    }

    #[test]
    fn test_script_values() {
        let doc = Document::new(vec![Node::paragraph(vec![Node::script("plot()", true)])]);
        let graph = ScriptValue::Graph {
            png: vec![0x89, 0x50],
            width: None,
            height: None,
        };
        let root = render_with(&doc, Extensions::new().with_evaluator(Fixed(Ok(graph))));
        let image = &root.find_all("Image")[0];
        assert_eq!(image.attr("Source"), Some("data:image/png;base64,iVA="));
        assert_eq!(image.attr("WidthRequest"), Some("480"));
        assert_eq!(image.attr("HeightRequest"), Some("360"));

        let doc = Document::new(vec![Node::paragraph(vec![
            Node::text("n = "),
            Node::script("n", false),
        ])]);
        let root = render_with(
            &doc,
            Extensions::new().with_evaluator(Fixed(Ok(ScriptValue::Number(42.0)))),
        );
        assert_eq!(span_texts(&root), ["n = ", "42"]);
    }

    #[test]
    fn test_aggregate_script_error_renders_each_line() {
        let doc = Document::new(vec![Node::paragraph(vec![Node::script("x", false)])]);
        let error = ScriptError::aggregate(
            "2 errors",
            vec![ScriptError::new("first"), ScriptError::new("second")],
        );
        let root = render_with(&doc, Extensions::new().with_evaluator(Fixed(Err(error))));
        let lines: Vec<_> = root
            .find_all("Label")
            .into_iter()
            .filter(|l| l.attr("TextColor") == Some("Red"))
            .map(|l| l.attr("Text").unwrap_or_default())
            .collect();
        assert_eq!(lines, ["first", "second"]);
    }

    #[test]
    fn test_script_document_rendered_in_place() {
        let nested = Document::new(vec![Node::paragraph(vec![Node::text("inner")])]);
        let doc = Document::new(vec![Node::paragraph(vec![Node::script("doc()", true)])]);
        let root = render_with(
            &doc,
            Extensions::new().with_evaluator(Fixed(Ok(ScriptValue::Document(Box::new(nested))))),
        );
        assert_eq!(root.find_all("VerticalStackLayout").len(), 0);
        assert_eq!(span_texts(&root), ["inner"]);
    }

    #[test]
    fn test_script_without_evaluator_renders_code() {
        let doc = Document::new(vec![Node::paragraph(vec![Node::script("1+1", false)])]);
        let root = render_with(&doc, Extensions::new());
        let span = &root.find_all("Span")[0];
        assert_eq!(span.attr("Text"), Some("1+1"));
        assert_eq!(span.attr("FontFamily"), Some("SpaceGroteskRegular"));
    }

    #[test]
    fn test_multimedia_handler_and_fallback() {
        let image = Multimedia {
            items: vec![MultimediaItem::new("cat.png")],
            children: vec![Node::text("a cat")],
            alone_in_paragraph: true,
        };
        let doc = Document::new(vec![Node::paragraph(vec![Node::Multimedia(image)])]);

        let root = render(&doc);
        assert_eq!(root.find_all("Image")[0].attr("Source"), Some("cat.png"));

        let root = render_with(&doc, Extensions::new().with_multimedia_handler("image", Broken));
        assert!(root.find_all("Image").is_empty());
        assert_eq!(span_texts(&root), ["a cat"]);
    }

    #[test]
    fn test_standalone_emoji() {
        let doc = Document::new(vec![
            Node::Standalone(Box::new(Node::Emoji(Emoji::new("smile", "😄")))),
            Node::Standalone(Box::new(Node::Emoji(Emoji::new("wave", "👋")))),
        ]);
        let root = render_with(&doc, Extensions::new().with_emoji_source(Twemoji));
        assert_eq!(root.find_all("Image")[0].attr("Source"), Some("emoji/smile.png"));
        assert_eq!(span_texts(&root), ["👋"]);

        let root = render_with(&doc, Extensions::new());
        assert_eq!(span_texts(&root), [":smile:", ":wave:"]);
    }

    #[test]
    fn test_references_and_entities() {
        let doc = Document::new(vec![Node::paragraph(vec![
            Node::LinkReference {
                label: "home".to_owned(),
                children: vec![Node::text("home")],
            },
            Node::HtmlEntity("copy".to_owned()),
            Node::MetaReference("author".to_owned()),
        ])])
        .with_reference("home", MultimediaItem::new("https://example.com"))
        .with_meta("author", ["Ann", "Bo"]);
        let root = render(&doc);

        assert_eq!(span_texts(&root), ["home", "©", "Ann, Bo"]);
        let taps = root.find_all("TapGestureRecognizer");
        assert_eq!(taps[0].attr("CommandParameter"), Some("https://example.com"));
    }

    #[test]
    fn test_cancellation_closes_open_elements() {
        let token = Cancellation::new();
        let doc = Document::new(vec![
            Node::BlockQuote(vec![Node::paragraph(vec![Node::script("x", false)])]),
            Node::paragraph(vec![Node::text("never")]),
        ]);
        let mut out = TreeWriter::new();
        let result = Renderer::new(MauiDialect::new(), &mut out)
            .with_extensions(Extensions::new().with_evaluator(CancelOnEvaluate(token.clone())))
            .with_cancellation(token)
            .render(&doc, false);

        assert!(matches!(result, Err(RenderError::Cancelled)));
        assert_eq!(out.depth(), 0);
        let root = out.into_elements().remove(0);
        assert!(!span_texts(&root).contains(&"never".to_owned()));
    }

    #[test]
    fn test_cancellation_inside_header_html() {
        let token = Cancellation::new();
        let doc = Document::new(vec![Node::header(
            1,
            vec![Node::script("x", false), Node::text("after")],
        )]);
        let mut out = TreeWriter::new();
        let result = Renderer::new(MauiDialect::new(), &mut out)
            .with_extensions(Extensions::new().with_evaluator(CancelOnEvaluate(token.clone())))
            .with_cancellation(token)
            .render(&doc, false);

        assert!(matches!(result, Err(RenderError::Cancelled)));
        assert_eq!(out.depth(), 0);
        let root = out.into_elements().remove(0);
        assert!(root.find_all("Label").is_empty());
    }

    #[test]
    fn test_writer_errors_propagate() {
        struct Refusing;

        impl MarkupWriter for Refusing {
            fn open_element(&mut self, _name: &str) -> Result<(), WriteError> {
                Err(WriteError::Finished)
            }
            fn attribute(&mut self, _name: &str, _value: &str) -> Result<(), WriteError> {
                Ok(())
            }
            fn text(&mut self, _content: &str) -> Result<(), WriteError> {
                Ok(())
            }
            fn raw_content(&mut self, _content: &str) -> Result<(), WriteError> {
                Ok(())
            }
            fn close_element(&mut self) -> Result<(), WriteError> {
                Ok(())
            }
            fn comment(&mut self, _text: &str) -> Result<(), WriteError> {
                Ok(())
            }
            fn depth(&self) -> usize {
                0
            }
        }

        let mut out = Refusing;
        let result = Renderer::new(MauiDialect::new(), &mut out).render(&Document::default(), false);
        assert!(matches!(result, Err(RenderError::Write(WriteError::Finished))));
    }
}
