use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{IdentifyError, Result};
use crate::options::RunOptions;
use crate::params::ParamTypes;

const CONFIG_FILE_NAME: &str = "sqlident.toml";

const KNOWN_KEYS: &[&str] = &["dialect", "strict", "identify_tables", "exclude", "parameters"];

/// Load run options from a TOML file.
///
/// An explicit `config_path` must exist. Otherwise the nearest
/// `sqlident.toml` above the inputs is used, then the user config directory.
/// No file at all yields the defaults.
pub fn load_config(files: &[PathBuf], config_path: Option<&Path>) -> Result<RunOptions> {
    let mut options = RunOptions::default();

    let config_file = match config_path {
        Some(path) if path.exists() => Some(path.to_path_buf()),
        Some(path) => {
            return Err(IdentifyError::Config(format!(
                "Config file not found: {}",
                path.display()
            )))
        }
        None => find_config_file(files).or_else(user_config_file),
    };

    if let Some(path) = config_file {
        debug!(path = %path.display(), "loading config");
        let table = load_config_from_path(&path)?;
        apply_config(&mut options, &table)?;
    }

    Ok(options)
}

fn find_config_file(files: &[PathBuf]) -> Option<PathBuf> {
    get_common_parents(files)
        .into_iter()
        .map(|parent| parent.join(CONFIG_FILE_NAME))
        .find(|config| config.is_file())
}

fn user_config_file() -> Option<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("sqlident").join("config.toml"))
        .filter(|config| config.is_file())
}

/// Parent directories of the inputs, most specific first.
fn get_common_parents(files: &[PathBuf]) -> Vec<PathBuf> {
    let mut parents: Vec<PathBuf> = Vec::new();

    for file in files {
        let start = if file.is_dir() {
            file.clone()
        } else {
            match file.parent() {
                Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
                _ => PathBuf::from("."),
            }
        };
        let start = start.canonicalize().unwrap_or(start);

        let mut current = Some(start.as_path());
        while let Some(dir) = current {
            if !parents.iter().any(|p| p == dir) {
                parents.push(dir.to_path_buf());
            }
            current = dir.parent();
        }
    }

    parents
}

fn load_config_from_path(path: &Path) -> Result<toml::Table> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

fn apply_config(options: &mut RunOptions, config: &toml::Table) -> Result<()> {
    if let Some(key) = config.keys().find(|k| !KNOWN_KEYS.contains(&k.as_str())) {
        return Err(IdentifyError::Config(format!("Unknown config option: {}", key)));
    }

    if let Some(value) = config.get("dialect") {
        let name = value
            .as_str()
            .ok_or_else(|| invalid_value("dialect", "a string"))?;
        options.identify.dialect_name = name.to_string();
        options.identify.dialect()?;
    }

    if let Some(value) = config.get("strict") {
        options.identify.strict = value
            .as_bool()
            .ok_or_else(|| invalid_value("strict", "a boolean"))?;
    }

    if let Some(value) = config.get("identify_tables") {
        options.identify.identify_tables = value
            .as_bool()
            .ok_or_else(|| invalid_value("identify_tables", "a boolean"))?;
    }

    if let Some(value) = config.get("exclude") {
        let patterns = value
            .as_array()
            .ok_or_else(|| invalid_value("exclude", "an array of strings"))?;
        options.exclude = patterns
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect();
    }

    if let Some(value) = config.get("parameters") {
        let types: ParamTypes = value
            .clone()
            .try_into()
            .map_err(|e| IdentifyError::Config(format!("Invalid [parameters] table: {}", e)))?;
        options.identify.param_types = Some(types);
    }

    Ok(())
}

fn invalid_value(key: &str, expected: &str) -> IdentifyError {
    IdentifyError::Config(format!("Config option {} must be {}", key, expected))
}
