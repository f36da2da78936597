//! Error types for rendering.

/// Error from a [`MarkupWriter`](crate::MarkupWriter).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum WriteError {
    /// Underlying XML serialization failed.
    #[error("XML write error: {0}")]
    Xml(String),

    /// Attribute written after the element already received content.
    #[error("attribute `{0}` written after element content")]
    MisplacedAttribute(String),

    /// Content written with no element open where one is required.
    #[error("no element is open")]
    NoOpenElement,

    /// Writer was used after [`finish`](crate::XmlMarkupWriter::finish).
    #[error("writer already finished")]
    Finished,
}

/// Error that aborts a render pass.
///
/// Per-node failures (script errors, handler errors) never surface here;
/// they are rendered in place.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RenderError {
    /// Output writer failed.
    #[error("output error: {0}")]
    Write(#[from] WriteError),

    /// Rendering was cancelled through a [`Cancellation`](crate::Cancellation) token.
    #[error("rendering cancelled")]
    Cancelled,
}

/// Error returned by a code-block, multimedia or emoji handler.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum HandlerError {
    /// Output writer failed; aborts the render pass.
    #[error("output error: {0}")]
    Write(#[from] WriteError),

    /// Handler failed; rendered as one error line.
    #[error("{0}")]
    Failed(String),

    /// Several independent failures; rendered as one line each.
    #[error("{} errors", .0.len())]
    Aggregate(Vec<String>),
}

impl HandlerError {
    /// Messages to render, one per line.
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Aggregate(messages) => messages.clone(),
            other => vec![other.to_string()],
        }
    }
}

/// Error produced while evaluating an inline script.
///
/// An error carrying inner errors is an aggregate; wrappers holding exactly
/// one inner error are removed by [`unnest`](Self::unnest).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ScriptError {
    pub message: String,
    pub inner: Vec<ScriptError>,
}

impl ScriptError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            inner: Vec::new(),
        }
    }

    /// Aggregate of several errors.
    pub fn aggregate(message: impl Into<String>, inner: Vec<ScriptError>) -> Self {
        Self {
            message: message.into(),
            inner,
        }
    }

    /// Strip wrappers that hold exactly one inner error.
    #[must_use]
    pub fn unnest(mut self) -> Self {
        while self.inner.len() == 1 {
            self = self.inner.remove(0);
        }
        self
    }

    pub fn is_aggregate(&self) -> bool {
        !self.inner.is_empty()
    }

    /// Lines to render: one per inner error for aggregates, otherwise the
    /// message itself.
    pub fn lines(&self) -> Vec<&str> {
        if self.is_aggregate() {
            self.inner.iter().map(|e| e.message.as_str()).collect()
        } else {
            vec![self.message.as_str()]
        }
    }
}
