//! Inline script evaluation results.

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use xamd_model::Document;

use crate::error::ScriptError;
use crate::extension::ImageSource;
use crate::profile::Profile;

/// Typed value produced by evaluating an inline script.
#[derive(Clone, Debug, PartialEq)]
pub enum ScriptValue {
    /// Renders nothing.
    Null,
    Text(String),
    Number(f64),
    Boolean(bool),
    /// Image referenced by URL.
    Image(ImageSource),
    /// Encoded PNG bitmap.
    Bitmap { png: Vec<u8>, width: u32, height: u32 },
    /// Plotted graph as PNG; missing dimensions fall back to the profile's
    /// default graph size.
    Graph {
        png: Vec<u8>,
        width: Option<u32>,
        height: Option<u32>,
    },
    /// Document rendered in place by the same renderer.
    Document(Box<Document>),
}

impl ScriptValue {
    /// Text of scalar values.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text.clone()),
            Self::Number(n) => Some(n.to_string()),
            Self::Boolean(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Image to embed for image-like values.
    pub fn image_source(&self, profile: &Profile) -> Option<ImageSource> {
        match self {
            Self::Image(source) => Some(source.clone()),
            Self::Bitmap { png, width, height } => Some(ImageSource {
                url: png_data_uri(png),
                width: Some(*width),
                height: Some(*height),
            }),
            Self::Graph { png, width, height } => Some(ImageSource {
                url: png_data_uri(png),
                width: Some(width.unwrap_or(profile.default_graph_width)),
                height: Some(height.unwrap_or(profile.default_graph_height)),
            }),
            _ => None,
        }
    }
}

/// External expression evaluator invoked for inline scripts.
pub trait ScriptEvaluator {
    fn evaluate(&self, expression: &str) -> Result<ScriptValue, ScriptError>;
}

/// `data:` URI embedding PNG bytes.
pub fn png_data_uri(png: &[u8]) -> String {
    let encoded = BASE64_STANDARD.encode(png);
    format!("data:image/png;base64,{encoded}")
}
