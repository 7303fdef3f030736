use std::collections::HashSet;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, warn};

use crate::dialect::Dialect;
use crate::error::Result;
use crate::options::{IdentifyOptions, RunOptions};
use crate::parser::parse;
use crate::report::{FileResult, FileStatus, Report};
use crate::statement::{ExecutionType, StatementType};
use crate::token::Pos;

/// One identified statement as exposed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyResult {
    pub start: Pos,
    pub end: Pos,
    /// Source characters `start..=end`.
    pub text: String,
    #[serde(rename = "type")]
    pub statement_type: StatementType,
    pub execution_type: ExecutionType,
    pub parameters: Vec<String>,
    pub tables: Vec<String>,
}

/// Split `query` into statements and classify each one.
/// This is the core API function.
pub fn identify(query: &str, options: &IdentifyOptions) -> Result<Vec<IdentifyResult>> {
    let parse_options = options.parse_options()?;
    let result = parse(query, &parse_options)?;

    // default PostgreSQL parameters ($1, $2, ...) are reported in order
    let sort_parameters = parse_options.dialect == Dialect::Psql && options.param_types.is_none();
    let chars = CharOffsets::new(query);

    Ok(result
        .statements
        .into_iter()
        .map(|statement| {
            let mut parameters = statement.parameters;
            if sort_parameters {
                parameters.sort();
            }
            IdentifyResult {
                start: statement.start,
                end: statement.end,
                text: chars.slice(statement.start, statement.end).to_string(),
                statement_type: statement.statement_type,
                execution_type: statement.execution_type,
                parameters,
                tables: statement.tables,
            }
        })
        .collect())
}

/// Maps character offsets to byte offsets.
struct CharOffsets<'a> {
    source: &'a str,
    /// Byte offset of each character; empty for ASCII input.
    offsets: Vec<usize>,
}

impl<'a> CharOffsets<'a> {
    fn new(source: &'a str) -> Self {
        let offsets = if source.is_ascii() {
            Vec::new()
        } else {
            source.char_indices().map(|(i, _)| i).collect()
        };
        Self { source, offsets }
    }

    fn byte(&self, pos: Pos) -> usize {
        if self.offsets.is_empty() {
            pos.min(self.source.len())
        } else {
            self.offsets.get(pos).copied().unwrap_or(self.source.len())
        }
    }

    /// Characters `start..=end`, clipped to the source.
    fn slice(&self, start: Pos, end: Pos) -> &'a str {
        let from = self.byte(start);
        let to = self.byte(end.saturating_add(1)).max(from);
        &self.source[from..to]
    }
}

/// Identify statements in every SQL file under `paths`.
pub fn run(paths: &[PathBuf], options: &RunOptions) -> Report {
    let matching_paths = get_matching_paths(paths, options);
    debug!(files = matching_paths.len(), "identifying files");
    let mut report = Report::new();

    let progress = if options.show_progress(matching_paths.len()) {
        let bar = ProgressBar::new(matching_paths.len() as u64);
        if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} {wide_msg}") {
            bar.set_style(style);
        }
        bar
    } else {
        ProgressBar::hidden()
    };

    for path in &matching_paths {
        progress.set_message(path.display().to_string());
        report.add(identify_file(path, &options.identify));
        progress.inc(1);
    }
    progress.finish_and_clear();

    report
}

/// Identify a single file.
pub fn identify_file(path: &Path, options: &IdentifyOptions) -> FileResult {
    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            warn!(path = %path.display(), "read failed: {}", e);
            return FileResult::error(path, format!("Read error: {}", e));
        }
    };

    match identify(&source, options) {
        Ok(statements) => FileResult {
            path: path.to_path_buf(),
            status: FileStatus::Identified,
            statements,
            error: None,
        },
        Err(e) => FileResult::error(path, e.to_string()),
    }
}

/// Get all SQL file paths that match the given inputs.
pub fn get_matching_paths(paths: &[PathBuf], options: &RunOptions) -> Vec<PathBuf> {
    let extensions = options.sql_extensions();
    let mut result = HashSet::new();

    for path in paths {
        if path.is_file() {
            if is_sql_file(path, extensions) {
                result.insert(path.clone());
            }
        } else if path.is_dir() {
            collect_sql_files(path, extensions, &options.exclude, &mut result);
        }
    }

    let mut sorted: Vec<PathBuf> = result.into_iter().collect();
    sorted.sort();
    sorted
}

fn is_sql_file(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| extensions.contains(&ext.as_str()))
}

fn collect_sql_files(
    dir: &Path,
    extensions: &[&str],
    exclude: &[String],
    result: &mut HashSet<PathBuf>,
) {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            warn!(path = %dir.display(), "cannot read directory: {}", e);
            return;
        }
    };

    let patterns: Vec<glob::Pattern> = exclude
        .iter()
        .filter_map(|p| glob::Pattern::new(p).ok())
        .collect();

    for entry in entries.flatten() {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();

        if name.starts_with('.') {
            continue;
        }
        if patterns
            .iter()
            .any(|p| p.matches(&name) || p.matches_path(&path))
        {
            continue;
        }

        if path.is_dir() {
            collect_sql_files(&path, extensions, exclude, result);
        } else if is_sql_file(&path, extensions) {
            result.insert(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identify_simple_select() {
        let results = identify("SELECT * FROM Persons", &IdentifyOptions::default()).unwrap();
        assert_eq!(
            results,
            vec![IdentifyResult {
                start: 0,
                end: 20,
                text: "SELECT * FROM Persons".to_string(),
                statement_type: StatementType::Select,
                execution_type: ExecutionType::Listing,
                parameters: vec![],
                tables: vec![],
            }]
        );
    }

    #[test]
    fn test_identify_text_uses_char_offsets() {
        let source = "SELECT 'ü'; DELETE FROM t;";
        let results = identify(source, &IdentifyOptions::default()).unwrap();
        assert_eq!(results[0].text, "SELECT 'ü';");
        assert_eq!((results[1].start, results[1].end), (12, 25));
        assert_eq!(results[1].text, "DELETE FROM t;");
    }

    #[test]
    fn test_psql_parameters_sorted_by_default() {
        let options = IdentifyOptions {
            dialect_name: "psql".to_string(),
            ..IdentifyOptions::default()
        };
        let results = identify("SELECT $2, $1, $2", &options).unwrap();
        assert_eq!(results[0].parameters, vec!["$1", "$2"]);
    }

    #[test]
    fn test_invalid_dialect() {
        let options = IdentifyOptions {
            dialect_name: "teradata".to_string(),
            ..IdentifyOptions::default()
        };
        assert!(identify("SELECT 1", &options).is_err());
    }

    #[test]
    fn test_result_json_keys() {
        let results = identify("SELECT 1", &IdentifyOptions::default()).unwrap();
        let json = serde_json::to_value(&results[0]).unwrap();
        assert_eq!(json["type"], "SELECT");
        assert_eq!(json["executionType"], "LISTING");
        assert_eq!(json["text"], "SELECT 1");
        assert!(json["parameters"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_is_sql_file() {
        let extensions = &["sql", "ddl", "dml"];
        assert!(is_sql_file(Path::new("test.sql"), extensions));
        assert!(is_sql_file(Path::new("schema.DDL"), extensions));
        assert!(!is_sql_file(Path::new("test.py"), extensions));
        assert!(!is_sql_file(Path::new("sql"), extensions));
    }

    #[test]
    fn test_char_offsets_clip() {
        let chars = CharOffsets::new("añb");
        assert_eq!(chars.slice(1, 1), "ñ");
        assert_eq!(chars.slice(1, 10), "ñb");
        assert_eq!(CharOffsets::new("abc").slice(2, 7), "c");
    }
}
