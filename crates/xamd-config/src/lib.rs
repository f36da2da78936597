//! Configuration management for xamd.
//!
//! Parses `xamd.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! ```toml
//! dialect = "xamarin-forms"
//!
//! [output]
//! indent = 4
//! body_only = false
//!
//! [profile]
//! header_font_size = [32, 26, 22]
//! paragraph_margins = "0,8,0,8"
//! ```
//!
//! Every `[profile]` key is optional and overrides the default profile of
//! the selected dialect. CLI settings can be applied during load via
//! [`CliSettings`].

use serde::Deserialize;
use std::path::{Path, PathBuf};
use xamd_renderer::{DialectKind, Profile, Thickness};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override output dialect.
    pub dialect: Option<DialectKind>,
    /// Override the body-only flag.
    pub body_only: Option<bool>,
    /// Override output indentation.
    pub indent: Option<usize>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "xamd.toml";

/// Largest accepted `output.indent`.
const MAX_INDENT: usize = 16;

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output dialect name as written in TOML.
    dialect: Option<String>,
    /// Output configuration.
    pub output: OutputConfig,
    /// Overrides applied on top of the dialect's default profile.
    pub profile: ProfileOverrides,

    /// Resolved dialect (set after loading).
    #[serde(skip)]
    pub dialect_resolved: DialectKind,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Output configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Spaces per nesting level; 0 writes compact markup.
    pub indent: usize,
    /// Render without the outer document wrapper.
    pub body_only: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            indent: 2,
            body_only: false,
        }
    }
}

/// Profile values read from the `[profile]` section.
///
/// Thickness values are strings of the form `"left,top,right,bottom"`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProfileOverrides {
    pub header_font_size: Option<Vec<u32>>,
    pub header_color: Option<Vec<String>>,
    pub paragraph_margins: Option<String>,
    pub table_cell_padding: Option<String>,
    pub table_cell_border_color: Option<String>,
    pub table_cell_border_thickness: Option<f64>,
    pub table_row_background_colors: Option<Vec<String>>,
    pub block_quote_margin: Option<u32>,
    pub block_quote_padding: Option<u32>,
    pub block_quote_border_color: Option<String>,
    pub inserted_border_color: Option<String>,
    pub deleted_border_color: Option<String>,
    pub list_content_margin: Option<u32>,
    pub definition_separator: Option<u32>,
    pub definition_margin: Option<u32>,
    pub superscript_scale: Option<f64>,
    pub superscript_offset: Option<i32>,
    pub footnote_separator: Option<u32>,
    pub default_graph_width: Option<u32>,
    pub default_graph_height: Option<u32>,
    pub code_font_family: Option<String>,
    pub hyperlink_color: Option<String>,
    pub hyperlink_command: Option<String>,
    pub rule_color: Option<String>,
    pub error_color: Option<String>,
}

macro_rules! override_fields {
    ($source:expr, $target:expr, $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = &$source.$field {
                $target.$field.clone_from(value);
            }
        )+
    };
}

impl ProfileOverrides {
    /// Apply every set value to `profile`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if a thickness string is malformed.
    pub fn apply(&self, profile: &mut Profile) -> Result<(), ConfigError> {
        override_fields!(
            self,
            profile,
            header_font_size,
            header_color,
            table_cell_border_color,
            table_cell_border_thickness,
            table_row_background_colors,
            block_quote_margin,
            block_quote_padding,
            block_quote_border_color,
            inserted_border_color,
            deleted_border_color,
            list_content_margin,
            definition_separator,
            definition_margin,
            superscript_scale,
            superscript_offset,
            footnote_separator,
            default_graph_width,
            default_graph_height,
            code_font_family,
            hyperlink_color,
            hyperlink_command,
            rule_color,
            error_color,
        );
        if let Some(margins) = &self.paragraph_margins {
            profile.paragraph_margins = parse_thickness(margins, "profile.paragraph_margins")?;
        }
        if let Some(padding) = &self.table_cell_padding {
            profile.table_cell_padding = parse_thickness(padding, "profile.table_cell_padding")?;
        }
        Ok(())
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

fn parse_thickness(value: &str, field: &str) -> Result<Thickness, ConfigError> {
    value
        .parse()
        .map_err(|err| ConfigError::Validation(format!("{field}: {err}")))
}

fn require_non_empty<T>(value: Option<&Vec<T>>, field: &str) -> Result<(), ConfigError> {
    if value.is_some_and(Vec::is_empty) {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

fn require_positive(value: Option<u32>, field: &str) -> Result<(), ConfigError> {
    if value == Some(0) {
        return Err(ConfigError::Validation(format!(
            "{field} must be greater than 0"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `xamd.toml` in current directory and parents.
    /// Without any file the defaults are used.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, or if reading,
    /// parsing or validation fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = std::env::current_dir()
            .ok()
            .and_then(|cwd| Self::discover_config(&cwd))
        {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Resolved profile: the dialect default with `[profile]` overrides applied.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if a thickness string is malformed.
    pub fn profile(&self) -> Result<Profile, ConfigError> {
        let mut profile = self.dialect_resolved.default_profile();
        self.profile.apply(&mut profile)?;
        Ok(profile)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(dialect) = settings.dialect {
            self.dialect_resolved = dialect;
        }
        if let Some(body_only) = settings.body_only {
            self.output.body_only = body_only;
        }
        if let Some(indent) = settings.indent {
            self.output.indent = indent;
        }
    }

    /// Search for config file in `start` and its parents.
    fn discover_config(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.resolve_dialect()?;
        config.config_path = Some(path.to_path_buf());
        config.validate()?;

        Ok(config)
    }

    fn resolve_dialect(&mut self) -> Result<(), ConfigError> {
        if let Some(name) = &self.dialect {
            self.dialect_resolved = name
                .parse()
                .map_err(|err| ConfigError::Validation(format!("dialect: {err}")))?;
        }
        Ok(())
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output.indent > MAX_INDENT {
            return Err(ConfigError::Validation(format!(
                "output.indent cannot exceed {MAX_INDENT}"
            )));
        }
        self.validate_profile()
    }

    fn validate_profile(&self) -> Result<(), ConfigError> {
        let profile = &self.profile;
        require_non_empty(profile.header_font_size.as_ref(), "profile.header_font_size")?;
        require_non_empty(profile.header_color.as_ref(), "profile.header_color")?;
        require_positive(profile.default_graph_width, "profile.default_graph_width")?;
        require_positive(profile.default_graph_height, "profile.default_graph_height")?;

        if let Some(scale) = profile.superscript_scale
            && scale <= 0.0
        {
            return Err(ConfigError::Validation(
                "profile.superscript_scale must be greater than 0".to_owned(),
            ));
        }
        if let Some(thickness) = profile.table_cell_border_thickness
            && thickness < 0.0
        {
            return Err(ConfigError::Validation(
                "profile.table_cell_border_thickness cannot be negative".to_owned(),
            ));
        }

        // Parses the thickness strings.
        self.profile()?;
        Ok(())
    }
}
