//! Table layout and rendering.

use tracing::debug;
use xamd_model::{Alignment, Cell, Row, Table};

use crate::dialect::{Dialect, Spacing, layout_alignment};
use crate::error::RenderError;
use crate::footnotes::Scope;
use crate::renderer::Renderer;
use crate::state::RenderState;
use crate::writer::MarkupWriter;

/// Grid position of one table cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellPlacement<'a> {
    pub column: usize,
    /// Number of columns covered, at least 1.
    pub span: usize,
    /// `None` for a cell missing at the end of a short row.
    pub cell: Option<&'a Cell>,
}

/// Place the cells of `row` on a grid of `columns` columns.
///
/// A `None` entry extends the span of the nearest cell to its left. A `None`
/// with no cell to its left is dropped. Cells missing at the end of a short
/// row are placed as empty cells; entries past `columns` are ignored.
pub fn column_spans(row: &Row, columns: usize) -> Vec<CellPlacement<'_>> {
    let mut placements = Vec::with_capacity(columns);
    let mut column = 0;
    while column < columns {
        match row.get(column) {
            Some(Some(cell)) => {
                let end = columns.min(row.len());
                let continued = row[column + 1..end]
                    .iter()
                    .take_while(|c| c.is_none())
                    .count();
                placements.push(CellPlacement {
                    column,
                    span: continued + 1,
                    cell: Some(cell),
                });
                column += continued + 1;
            }
            Some(None) => {
                debug!(column, "span continuation without a cell to its left");
                column += 1;
            }
            None => {
                placements.push(CellPlacement {
                    column,
                    span: 1,
                    cell: None,
                });
                column += 1;
            }
        }
    }
    placements
}

impl<D: Dialect, W: MarkupWriter> Renderer<'_, D, W> {
    pub(crate) fn table(&mut self, table: &Table, scope: &mut Scope<'_>) -> Result<(), RenderError> {
        let depth = self.out.depth();
        self.dialect.open_table(&mut *self.out)?;
        let padding = self.dialect.spacing(Spacing::PARAGRAPH);
        self.out.open_element("ContentView")?;
        self.out.attribute("Padding", &padding)?;
        if let Some(id) = &table.id {
            self.out.attribute("AutomationId", id)?;
        }
        if let Some(caption) = &table.caption {
            self.dialect.open_vertical_stack(&mut *self.out)?;
            self.out.open_element("Label")?;
            self.out.attribute("LineBreakMode", "WordWrap")?;
            self.out.attribute("FontAttributes", "Italic")?;
            self.out.attribute("Text", caption)?;
            self.out.close_element()?;
        }

        let columns = vec!["Auto"; table.columns];
        self.open_grid("-2", &columns, table.headers.len() + table.rows.len())?;
        for (index, row) in table.all_rows().enumerate() {
            let row_state = RenderState {
                bold: index < table.headers.len(),
                ..RenderState::default()
            };
            for placement in column_spans(row, table.columns) {
                self.table_cell(table, index, placement, &row_state, scope)?;
            }
        }
        self.close_to(depth)
    }

    fn table_cell(
        &mut self,
        table: &Table,
        row: usize,
        placement: CellPlacement<'_>,
        row_state: &RenderState,
        scope: &mut Scope<'_>,
    ) -> Result<(), RenderError> {
        let alignment = placement
            .cell
            .and_then(|cell| cell.alignment)
            .unwrap_or_else(|| table.column_alignment(placement.column));
        let state = row_state.with(|s| s.alignment = alignment);

        self.out.open_element("Frame")?;
        self.dialect.table_cell_frame(row, &mut *self.out)?;
        self.out
            .attribute("Grid.Column", &placement.column.to_string())?;
        self.out.attribute("Grid.Row", &row.to_string())?;
        if placement.span > 1 {
            self.out
                .attribute("Grid.ColumnSpan", &placement.span.to_string())?;
        }

        self.out.open_element("ContentView")?;
        self.dialect.table_cell_content(&mut *self.out)?;
        if alignment != Alignment::Left {
            self.out
                .attribute("HorizontalOptions", layout_alignment(alignment))?;
        }
        match placement.cell {
            Some(cell) if cell.content.is_inline_span() => {
                self.node(&cell.content, &state, scope)?;
                self.flush_runs()?;
            }
            Some(cell) => {
                self.dialect.open_vertical_stack(&mut *self.out)?;
                self.node(&cell.content, &state, scope)?;
                self.flush_runs()?;
                self.close()?;
            }
            None => {}
        }
        self.close()?;
        self.close()
    }
}
