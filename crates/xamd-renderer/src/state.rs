//! Formatting state threaded through the traversal.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use xamd_model::Alignment;

/// Formatting context of the node being rendered.
///
/// Passed by reference into every recursive call; a callee derives a
/// modified copy with [`with`](Self::with) and never mutates its caller's
/// value, so formatting cannot leak into siblings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderState {
    pub alignment: Alignment,
    pub bold: bool,
    pub italic: bool,
    pub strike_through: bool,
    pub underline: bool,
    pub superscript: bool,
    pub subscript: bool,
    pub code: bool,
    /// Active hyperlink target.
    pub hyperlink: Option<String>,
}

impl RenderState {
    /// Copy of this state with `change` applied.
    #[must_use]
    pub fn with(&self, change: impl FnOnce(&mut Self)) -> Self {
        let mut state = self.clone();
        change(&mut state);
        state
    }
}

/// Cooperative cancellation token.
///
/// Clones share the same flag; cancelling any clone cancels the render pass
/// holding another.
#[derive(Clone, Debug, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
