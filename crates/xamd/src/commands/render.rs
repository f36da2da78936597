//! `xamd render` command implementation.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::Args;
use tracing::info;
use xamd_config::{CliSettings, Config};
use xamd_model::Document;
use xamd_renderer::{DialectKind, MauiDialect, Renderer, XamarinFormsDialect, XmlMarkupWriter};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// JSON document tree to render (`-` reads standard input).
    input: PathBuf,

    /// Output dialect: `maui` or `xamarin-forms` (overrides config).
    #[arg(short, long)]
    dialect: Option<DialectKind>,

    /// Path to configuration file (default: auto-discover xamd.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write XAML to this file instead of standard output.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Render without the outer document wrapper.
    #[arg(long)]
    body_only: bool,

    /// Spaces per nesting level, 0 for compact output (overrides config).
    #[arg(long)]
    indent: Option<usize>,

    /// Enable verbose output (log configuration and render fallbacks).
    #[arg(short, long)]
    pub verbose: bool,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration, reading the document or writing
    /// the output fails.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let cli_settings = CliSettings {
            dialect: self.dialect,
            body_only: self.body_only.then_some(true),
            indent: self.indent,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        if let Some(path) = &config.config_path {
            info!(path = %path.display(), "Loaded configuration");
        }

        let document = read_document(&self.input)?;

        match &self.output {
            Some(path) => {
                let file = BufWriter::new(File::create(path)?);
                render_document(&document, &config, file)?.flush()?;
                Output::new().success(&format!(
                    "Rendered {} to {}",
                    config.dialect_resolved,
                    path.display()
                ));
            }
            None => {
                let mut stdout = render_document(&document, &config, io::stdout().lock())?;
                writeln!(stdout)?;
                stdout.flush()?;
            }
        }
        Ok(())
    }
}

/// Read a JSON document from `path`, or from standard input for `-`.
fn read_document(path: &Path) -> Result<Document, CliError> {
    let json = if path == Path::new("-") {
        io::read_to_string(io::stdin())?
    } else {
        std::fs::read_to_string(path)?
    };
    Ok(serde_json::from_str(&json)?)
}

/// Render `document` into `sink` as configured and return the sink.
fn render_document<W: Write>(
    document: &Document,
    config: &Config,
    sink: W,
) -> Result<W, CliError> {
    let profile = config.profile()?;
    let mut writer = if config.output.indent == 0 {
        XmlMarkupWriter::new(sink)
    } else {
        XmlMarkupWriter::with_indent(sink, config.output.indent)
    };

    let body_only = config.output.body_only;
    info!(dialect = %config.dialect_resolved, "Rendering document");
    match config.dialect_resolved {
        DialectKind::Maui => {
            Renderer::new(MauiDialect::with_profile(profile), &mut writer)
                .render(document, body_only)?;
        }
        DialectKind::XamarinForms => {
            Renderer::new(XamarinFormsDialect::with_profile(profile), &mut writer)
                .render(document, body_only)?;
        }
    }
    Ok(writer.into_inner()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use xamd_model::Node;

    fn render(document: &Document, config: &Config) -> String {
        let bytes = render_document(document, config, Vec::new()).unwrap();
        String::from_utf8(bytes).unwrap()
    }

    fn compact() -> Config {
        let mut config = Config::default();
        config.output.indent = 0;
        config
    }

    #[test]
    fn test_render_maui_by_default() {
        let doc = Document::new(vec![Node::paragraph(vec![Node::text("Hi")])]);
        let xaml = render(&doc, &compact());
        assert!(xaml.starts_with("<VerticalStackLayout"));
        assert!(xaml.contains(r#"<Span Text="Hi"/>"#));
        assert!(!xaml.contains('\n'));
    }

    #[test]
    fn test_render_xamarin_body_only() {
        let doc = Document::new(vec![Node::paragraph(vec![Node::text("Hi")])]);
        let mut config = compact();
        config.dialect_resolved = DialectKind::XamarinForms;
        config.output.body_only = true;

        let xaml = render(&doc, &config);

        assert!(xaml.starts_with("<ContentView"));
        assert!(!xaml.contains("<StackLayout"));
    }

    #[test]
    fn test_render_indented() {
        let doc = Document::new(vec![Node::paragraph(vec![Node::text("Hi")])]);
        let xaml = render(&doc, &Config::default());
        assert!(xaml.contains("\n  <"));
    }

    #[test]
    fn test_read_document_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("doc.json");
        let doc = Document::new(vec![Node::paragraph(vec![Node::text("Hi")])]);
        std::fs::write(&path, serde_json::to_string(&doc).unwrap()).unwrap();

        assert_eq!(read_document(&path).unwrap(), doc);
    }

    #[test]
    fn test_read_document_invalid_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("doc.json");
        std::fs::write(&path, "{\"nodes\": 3}").unwrap();

        let err = read_document(&path).unwrap_err();
        assert!(matches!(err, CliError::Json(_)));
        assert!(err.to_string().starts_with("invalid document"));
    }
}
