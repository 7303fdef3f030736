use std::str::FromStr;

use serde::Deserialize;

use crate::dialect::Dialect;
use crate::error::{IdentifyError, Result};
use crate::params::ParamTypes;
use crate::parser::ParseOptions;

/// Settings for a single `identify` call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IdentifyOptions {
    /// Reject statements that no classifier recognizes.
    #[serde(default = "default_strict")]
    pub strict: bool,

    #[serde(default = "default_dialect", rename = "dialect")]
    pub dialect_name: String,

    #[serde(default)]
    pub identify_tables: bool,

    /// Overrides the dialect's parameter syntax when set.
    #[serde(default, rename = "parameters")]
    pub param_types: Option<ParamTypes>,
}

fn default_strict() -> bool {
    true
}

fn default_dialect() -> String {
    Dialect::Generic.name().to_string()
}

impl Default for IdentifyOptions {
    fn default() -> Self {
        Self {
            strict: true,
            dialect_name: default_dialect(),
            identify_tables: false,
            param_types: None,
        }
    }
}

impl IdentifyOptions {
    pub fn dialect(&self) -> Result<Dialect> {
        Dialect::from_str(&self.dialect_name)
    }

    /// Resolve into the settings the parser runs with.
    pub fn parse_options(&self) -> Result<ParseOptions> {
        let dialect = self.dialect()?;
        Ok(ParseOptions {
            dialect,
            strict: self.strict,
            identify_tables: self.identify_tables,
            param_types: self
                .param_types
                .clone()
                .unwrap_or_else(|| dialect.default_param_types()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
}

impl FromStr for OutputFormat {
    type Err = IdentifyError;

    fn from_str(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            other => Err(IdentifyError::Config(format!(
                "Unknown output format \"{}\". Allowed values: [human json]",
                other
            ))),
        }
    }
}

/// Settings for a file-based run: identification plus file selection and
/// terminal output.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub identify: IdentifyOptions,

    /// Glob patterns to exclude.
    pub exclude: Vec<String>,

    pub format: OutputFormat,
    pub verbose: bool,
    pub quiet: bool,
    pub no_progressbar: bool,
    pub no_color: bool,
    pub force_color: bool,
}

impl RunOptions {
    /// Whether color output is enabled.
    pub fn color(&self) -> bool {
        if self.force_color {
            return true;
        }
        if self.no_color {
            return false;
        }
        std::env::var_os("NO_COLOR").is_none()
    }

    pub fn show_progress(&self, file_count: usize) -> bool {
        !self.quiet && !self.no_progressbar && file_count > 1
    }

    /// SQL file extensions to process.
    pub fn sql_extensions(&self) -> &[&str] {
        &["sql", "ddl", "dml"]
    }
}
