use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::api::IdentifyResult;

/// Outcome of identifying a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Identified,
    /// Reading or identifying the file failed.
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub path: PathBuf,
    pub status: FileStatus,
    pub statements: Vec<IdentifyResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileResult {
    pub fn error(path: &Path, message: String) -> Self {
        Self {
            path: path.to_path_buf(),
            status: FileStatus::Error,
            statements: Vec::new(),
            error: Some(message),
        }
    }
}

/// Aggregated results of a run.
#[derive(Debug, Default)]
pub struct Report {
    pub results: Vec<FileResult>,
}

impl Report {
    pub fn new() -> Self {
        Self {
            results: Vec::new(),
        }
    }

    pub fn add(&mut self, result: FileResult) {
        self.results.push(result);
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn identified(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == FileStatus::Identified)
            .count()
    }

    pub fn statements(&self) -> usize {
        self.results.iter().map(|r| r.statements.len()).sum()
    }

    pub fn errors(&self) -> usize {
        self.total() - self.identified()
    }

    pub fn has_errors(&self) -> bool {
        self.errors() > 0
    }

    pub fn summary(&self) -> String {
        let mut parts = vec![
            format!("{} file(s) processed", self.total()),
            format!("{} statement(s) identified", self.statements()),
        ];
        if self.errors() > 0 {
            parts.push(format!("{} error(s)", self.errors()));
        }
        parts.join(", ")
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.results)
    }
}

/// Statements as a pretty JSON array.
pub fn render_json(results: &[IdentifyResult]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(results)
}

/// One line per statement: `start-end TYPE (EXECUTION) params tables`.
pub fn render_human(results: &[IdentifyResult]) -> String {
    let mut out = String::new();
    for result in results {
        let _ = write!(
            out,
            "{}-{} {} ({})",
            result.start, result.end, result.statement_type, result.execution_type
        );
        if !result.parameters.is_empty() {
            let _ = write!(out, " params=[{}]", result.parameters.join(", "));
        }
        if !result.tables.is_empty() {
            let _ = write!(out, " tables=[{}]", result.tables.join(", "));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::{ExecutionType, StatementType};

    fn select(start: usize, end: usize) -> IdentifyResult {
        IdentifyResult {
            start,
            end,
            text: "SELECT * FROM t WHERE a = ?".to_string(),
            statement_type: StatementType::Select,
            execution_type: ExecutionType::Listing,
            parameters: vec!["?".to_string()],
            tables: vec!["t".to_string()],
        }
    }

    #[test]
    fn test_report_summary() {
        let mut report = Report::new();
        report.add(FileResult {
            path: PathBuf::from("a.sql"),
            status: FileStatus::Identified,
            statements: vec![select(0, 26), select(28, 54)],
            error: None,
        });
        report.add(FileResult::error(Path::new("b.sql"), "Invalid statement parser \"X\"".into()));

        assert_eq!(report.total(), 2);
        assert_eq!(report.identified(), 1);
        assert_eq!(report.statements(), 2);
        assert_eq!(report.errors(), 1);
        assert!(report.has_errors());
        assert_eq!(
            report.summary(),
            "2 file(s) processed, 2 statement(s) identified, 1 error(s)"
        );
    }

    #[test]
    fn test_render_human() {
        let out = render_human(&[select(0, 26)]);
        assert_eq!(out, "0-26 SELECT (LISTING) params=[?] tables=[t]\n");
    }

    #[test]
    fn test_report_json_skips_missing_error() {
        let mut report = Report::new();
        report.add(FileResult {
            path: PathBuf::from("a.sql"),
            status: FileStatus::Identified,
            statements: vec![select(0, 26)],
            error: None,
        });
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json[0]["status"], "identified");
        assert_eq!(json[0]["statements"][0]["type"], "SELECT");
        assert!(json[0].get("error").is_none());
    }
}
