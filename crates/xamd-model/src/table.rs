//! Table grid.

use crate::node::{Alignment, Node};

/// Table cell.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cell {
    pub content: Node,
    /// Per-cell alignment overriding the column alignment.
    #[cfg_attr(feature = "serde", serde(default))]
    pub alignment: Option<Alignment>,
}

impl Cell {
    pub fn new(content: Node) -> Self {
        Self {
            content,
            alignment: None,
        }
    }

    #[must_use]
    pub fn aligned(mut self, alignment: Alignment) -> Self {
        self.alignment = Some(alignment);
        self
    }
}

/// One table row. `None` extends the column span of the nearest cell to
/// its left.
pub type Row = Vec<Option<Cell>>;

/// Table block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Table {
    /// Number of columns.
    pub columns: usize,
    /// Default alignment per column; missing entries mean left.
    pub column_alignments: Vec<Alignment>,
    pub headers: Vec<Row>,
    pub rows: Vec<Row>,
    pub caption: Option<String>,
    pub id: Option<String>,
}

impl Table {
    /// Create an empty table with `columns` columns.
    pub fn new(columns: usize) -> Self {
        Self {
            columns,
            ..Self::default()
        }
    }

    /// Alignment of column `index`.
    pub fn column_alignment(&self, index: usize) -> Alignment {
        self.column_alignments
            .get(index)
            .copied()
            .unwrap_or_default()
    }

    /// Header rows followed by body rows.
    pub fn all_rows(&self) -> impl Iterator<Item = &Row> {
        self.headers.iter().chain(&self.rows)
    }
}
