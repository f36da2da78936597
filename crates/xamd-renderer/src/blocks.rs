//! Block elements: lists, definitions, panels, code, headers and footnotes.

use std::sync::Arc;

use tracing::{debug, warn};
use xamd_model::{CodeBlock, DefinitionGroup, Node};

use crate::dialect::{Dialect, PanelKind, Spacing, label_alignment};
use crate::error::{HandlerError, RenderError};
use crate::extension::{HandlerContext, HandlerOutcome};
use crate::footnotes::Scope;
use crate::html::render_html;
use crate::margins::margins;
use crate::renderer::Renderer;
use crate::state::RenderState;
use crate::writer::MarkupWriter;

impl<D: Dialect, W: MarkupWriter> Renderer<'_, D, W> {
    /// Open a grid with auto-sized rows.
    ///
    /// Row and column definitions are written up front, so callers count
    /// their rows before rendering any cell.
    pub(crate) fn open_grid(
        &mut self,
        spacing: &str,
        columns: &[&str],
        rows: usize,
    ) -> Result<(), RenderError> {
        self.out.open_element("Grid")?;
        self.out.attribute("RowSpacing", spacing)?;
        self.out.attribute("ColumnSpacing", spacing)?;
        self.out.open_element("Grid.ColumnDefinitions")?;
        for width in columns {
            self.out.open_element("ColumnDefinition")?;
            self.out.attribute("Width", width)?;
            self.out.close_element()?;
        }
        self.out.close_element()?;
        self.out.open_element("Grid.RowDefinitions")?;
        for _ in 0..rows {
            self.out.open_element("RowDefinition")?;
            self.out.attribute("Height", "Auto")?;
            self.out.close_element()?;
        }
        Ok(self.out.close_element()?)
    }

    /// Two-column list grid: marker text and item content per row.
    pub(crate) fn list(
        &mut self,
        items: Vec<(String, &Node)>,
        state: &RenderState,
        scope: &mut Scope<'_>,
    ) -> Result<(), RenderError> {
        self.open_content_view(Spacing::PARAGRAPH, state.alignment)?;
        self.open_grid("0", &["Auto", "*"], items.len())?;
        for (index, (marker, child)) in items.into_iter().enumerate() {
            let row = index.to_string();
            let m = margins(child);
            let padding = self.dialect.spacing(Spacing::ListMarker {
                top: m.top,
                bottom: m.bottom,
            });

            self.out.open_element("ContentView")?;
            self.out.attribute("Padding", &padding)?;
            self.out.attribute("Grid.Column", "0")?;
            self.out.attribute("Grid.Row", &row)?;
            self.out.open_element("Label")?;
            if !marker.is_empty() {
                self.out.attribute("Text", &marker)?;
            }
            self.out.close_element()?;
            self.out.close_element()?;

            self.dialect.open_vertical_stack(&mut *self.out)?;
            self.out.attribute("Grid.Column", "1")?;
            self.out.attribute("Grid.Row", &row)?;
            self.node(child, state, scope)?;
            self.flush_runs()?;
            self.close()?;
        }
        self.close()?;
        self.close()
    }

    pub(crate) fn definition_list(
        &mut self,
        groups: &[DefinitionGroup],
        state: &RenderState,
        scope: &mut Scope<'_>,
    ) -> Result<(), RenderError> {
        let term_state = state.with(|s| s.bold = true);
        for group in groups {
            for (index, term) in group.terms.iter().enumerate() {
                self.open_content_view(Spacing::DefinitionTerm { first: index == 0 }, state.alignment)?;
                self.node(term, &term_state, scope)?;
                self.flush_runs()?;
                self.close()?;
            }

            let last = group.descriptions.len().saturating_sub(1);
            for (index, description) in group.descriptions.iter().enumerate() {
                self.open_content_view(
                    Spacing::DefinitionDescription {
                        last: index == last,
                    },
                    state.alignment,
                )?;
                if description.is_inline_span() {
                    self.node(description, state, scope)?;
                    self.flush_runs()?;
                } else {
                    self.dialect.open_vertical_stack(&mut *self.out)?;
                    self.node(description, state, scope)?;
                    self.flush_runs()?;
                    self.close()?;
                }
                self.close()?;
            }
        }
        Ok(())
    }

    /// Bordered quote, insert or delete block.
    pub(crate) fn panel(
        &mut self,
        kind: PanelKind,
        children: &[Node],
        state: &RenderState,
        scope: &mut Scope<'_>,
    ) -> Result<(), RenderError> {
        let padding = self.dialect.spacing(Spacing::QuotePanel);
        self.open_content_view(Spacing::QuoteOuter, state.alignment)?;
        self.out.open_element("Frame")?;
        self.out.attribute("Padding", &padding)?;
        self.out
            .attribute("BorderColor", self.dialect.panel_border(kind))?;
        self.dialect.open_vertical_stack(&mut *self.out)?;
        self.nodes(children, state, scope)?;
        self.flush_runs()?;
        self.close()?;
        self.close()?;
        self.close()
    }

    pub(crate) fn code_block(
        &mut self,
        block: &CodeBlock,
        state: &RenderState,
    ) -> Result<(), RenderError> {
        let extensions = Arc::clone(&self.extensions);
        if let Some(language) = block.language.as_deref()
            && let Some(handler) = extensions.code_handler(language)
        {
            let depth = self.out.depth();
            let mut ctx = HandlerContext {
                out: &mut *self.out,
                alignment: state.alignment,
                dialect: self.dialect.kind(),
                profile: self.dialect.profile(),
            };
            match handler.render(block, &mut ctx) {
                Ok(HandlerOutcome::Rendered) => return self.close_to(depth),
                Ok(HandlerOutcome::Declined) => {
                    debug!(language, "code block handler declined");
                    self.unwind(depth);
                }
                Err(HandlerError::Write(error)) => return Err(error.into()),
                Err(error) => {
                    warn!(language, %error, "code block handler failed");
                    self.unwind(depth);
                    for message in error.messages() {
                        self.error_block(&message, state.alignment)?;
                    }
                }
            }
        }

        self.open_content_view(Spacing::PARAGRAPH, state.alignment)?;
        self.dialect.open_vertical_stack(&mut *self.out)?;
        for row in &block.rows {
            self.out.open_element("Label")?;
            self.out.attribute("LineBreakMode", "NoWrap")?;
            self.out
                .attribute("HorizontalTextAlignment", label_alignment(state.alignment))?;
            self.out
                .attribute("FontFamily", &self.dialect.profile().code_font_family)?;
            self.out.attribute("Text", row)?;
            self.out.close_element()?;
        }
        self.close()?;
        self.close()
    }

    pub(crate) fn header(
        &mut self,
        level: u8,
        children: &[Node],
        state: &RenderState,
        scope: &mut Scope<'_>,
    ) -> Result<(), RenderError> {
        let html = render_html(
            children,
            scope,
            &self.extensions,
            self.dialect.profile(),
            &self.cancellation,
        )?;
        self.open_content_view(Spacing::PARAGRAPH, state.alignment)?;
        self.out.open_element("Label")?;
        self.out.attribute("LineBreakMode", "WordWrap")?;
        self.dialect.header_attributes(level, &mut *self.out)?;
        self.html_label(&html, state)?;
        self.close()
    }

    pub(crate) fn html_block(
        &mut self,
        children: &[Node],
        state: &RenderState,
        scope: &mut Scope<'_>,
    ) -> Result<(), RenderError> {
        let html = render_html(
            children,
            scope,
            &self.extensions,
            self.dialect.profile(),
            &self.cancellation,
        )?;
        self.open_content_view(Spacing::PARAGRAPH, state.alignment)?;
        self.out.open_element("Label")?;
        self.out.attribute("LineBreakMode", "WordWrap")?;
        self.html_label(&html, state)?;
        self.close()
    }

    /// Finish an open label with HTML content.
    fn html_label(&mut self, html: &str, state: &RenderState) -> Result<(), RenderError> {
        self.out
            .attribute("HorizontalTextAlignment", label_alignment(state.alignment))?;
        self.out.attribute("TextType", "Html")?;
        self.out.raw_content(html)?;
        self.close()
    }

    pub(crate) fn rule(&mut self) -> Result<(), RenderError> {
        let margin = self.dialect.spacing(Spacing::PARAGRAPH);
        self.out.open_element("BoxView")?;
        self.out.attribute("HeightRequest", "1")?;
        self.out
            .attribute("BackgroundColor", &self.dialect.profile().rule_color)?;
        self.out.attribute("HorizontalOptions", "FillAndExpand")?;
        self.out.attribute("Margin", &margin)?;
        self.close()
    }

    /// Separator and numbered grid of every footnote referenced in `scope`.
    pub(crate) fn footnote_section(&mut self, scope: &mut Scope<'_>) -> Result<(), RenderError> {
        if scope.footnotes.is_empty() {
            return Ok(());
        }
        scope.number_nested_footnotes();
        let doc = scope.doc;
        let keys = scope.footnotes.keys().to_vec();
        let margin = self.dialect.spacing(Spacing::FootnoteNumber);
        let profile = self.dialect.profile();
        let scale = profile.superscript_scale.to_string();
        let offset = profile.superscript_offset.to_string();
        let state = RenderState::default();

        self.rule()?;
        self.open_grid("0", &["Auto", "*"], keys.len())?;
        for (index, key) in keys.iter().enumerate() {
            let row = index.to_string();
            self.out.open_element("ContentView")?;
            self.out.attribute("Margin", &margin)?;
            self.out.attribute("Grid.Column", "0")?;
            self.out.attribute("Grid.Row", &row)?;
            self.out.attribute("Scale", &scale)?;
            self.out.attribute("TranslationY", &offset)?;
            self.out.open_element("Label")?;
            self.out.attribute("Text", &(index + 1).to_string())?;
            self.out.close_element()?;
            self.out.close_element()?;

            self.out.open_element("ContentView")?;
            self.out.attribute("Grid.Column", "1")?;
            self.out.attribute("Grid.Row", &row)?;
            self.dialect.open_vertical_stack(&mut *self.out)?;
            if let Some(footnote) = doc.footnotes.get(key) {
                self.nodes(&footnote.content, &state, scope)?;
            }
            self.flush_runs()?;
            self.close()?;
            self.close()?;
        }
        self.close()
    }
}
