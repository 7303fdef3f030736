pub mod api;
pub mod classifier;
pub mod config;
pub mod dialect;
pub mod error;
pub mod lexer;
pub mod options;
pub mod params;
pub mod parser;
pub mod report;
pub mod statement;
pub mod token;

// Re-export the main public API
pub use api::{get_matching_paths, identify, run, IdentifyResult};
pub use config::load_config;
pub use dialect::Dialect;
pub use error::{IdentifyError, Result};
pub use options::{IdentifyOptions, RunOptions};
pub use params::ParamTypes;
pub use statement::{ExecutionType, StatementType};
