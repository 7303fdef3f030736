use thiserror::Error;

/// User-facing errors.
#[derive(Error, Debug)]
pub enum IdentifyError {
    #[error("Unknown dialect \"{name}\". Allowed values: {allowed}")]
    InvalidDialect { name: String, allowed: String },

    #[error("Invalid statement parser \"{0}\"")]
    UnrecognizedStatementStart(String),

    #[error(
        "Expected any of these tokens {expected} instead of type=\"{kind}\" value=\"{value}\" (currentStep={step})."
    )]
    StepValidation {
        expected: String,
        kind: &'static str,
        value: String,
        step: usize,
    },

    #[error("Expected any of these tokens {required} before \"{value}\" (currentStep={step}).")]
    MissingPredecessor {
        required: &'static str,
        value: String,
        step: usize,
    },

    /// A classifier was fed a token after it had already terminated.
    #[error("This statement has already got to the end.")]
    DoubleTermination,

    #[error("invalid custom parameter pattern {pattern:?}: {source}")]
    InvalidParameterPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("sqlident config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, IdentifyError>;
