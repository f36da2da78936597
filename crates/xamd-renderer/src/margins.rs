//! Vertical margin inference.

use xamd_model::Node;

/// Whether a block gets the default top and bottom paragraph margins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VerticalMargins {
    pub top: bool,
    pub bottom: bool,
}

impl VerticalMargins {
    pub const NONE: Self = Self {
        top: false,
        bottom: false,
    };
    pub const BOTH: Self = Self {
        top: true,
        bottom: true,
    };
}

/// Infer the vertical margins of `node`.
///
/// Inline spans inside a paragraph get none. A nested block takes the top
/// margin of its first child and the bottom margin of its last child; a
/// single-child wrapper takes its child's. Everything else gets both.
pub fn margins(node: &Node) -> VerticalMargins {
    if node.is_inline_span() && !node.outside_paragraph() {
        return VerticalMargins::NONE;
    }
    match node {
        Node::NestedBlock(children) => match (children.first(), children.last()) {
            (Some(first), Some(last)) => VerticalMargins {
                top: margins(first).top,
                bottom: margins(last).bottom,
            },
            _ => VerticalMargins::NONE,
        },
        Node::SingleChild(child) => margins(child),
        _ => VerticalMargins::BOTH,
    }
}
