//! CLI error types.

use xamd_config::ConfigError;
use xamd_renderer::{RenderError, WriteError};

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("invalid document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Render(#[from] RenderError),

    #[error("{0}")]
    Write(#[from] WriteError),
}
