//! Data directory checks - static analysis of mock collections and schemas.
//!
//! Checks a flat data directory for:
//! - collection files that are not JSON arrays of records
//! - records without a string `_id`, or with duplicated ids
//! - schema files that don't parse or compile
//! - records that no longer satisfy their resource's schema
//! - collections without a schema (writes to them are always rejected)
//!
//! Codes: E001 syntax, E002 not an array, E003 record not an object,
//! E004 missing `_id`, E005 duplicate `_id`, E006 invalid schema,
//! W001 orphan schema, W002 stored record violates schema, W003 no schema.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::loader::load_json;
use crate::types::{record_id, COLLECTION_EXT, ID_FIELD, SCHEMA_EXT};
use crate::validator::validate_against_schema;

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single diagnostic message from a check.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    /// JSON path to the issue (e.g., "/3/_id")
    pub path: String,
    pub message: String,
}

/// Result of checking a single file.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub file: PathBuf,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Status of a checked file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Ok,
    Error,
    Warning,
}

/// Result of checking a data directory.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub path: PathBuf,
    pub files_checked: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub results: Vec<FileResult>,
}

impl CheckResult {
    /// Returns true if no file has errors.
    pub fn is_ok(&self) -> bool {
        self.errors == 0
    }
}

/// Check every collection and schema in `dir`.
///
/// If `strict` is true, files with warnings count as failed.
pub fn check(dir: &Path, strict: bool) -> CheckResult {
    let files = collect_data_files(dir);
    let mut results = Vec::with_capacity(files.len());

    for file in &files {
        let diagnostics = if has_extension(file, SCHEMA_EXT) {
            check_schema_file(file)
        } else {
            check_collection_file(file)
        };
        results.push(FileResult {
            file: file.strip_prefix(dir).unwrap_or(file).to_path_buf(),
            status: status_of(&diagnostics),
            diagnostics,
        });
    }

    let count = |severity: Severity| {
        results
            .iter()
            .flat_map(|r| &r.diagnostics)
            .filter(|d| d.severity == severity)
            .count()
    };
    let errors = count(Severity::Error);
    let warnings = count(Severity::Warning);

    let failed = results
        .iter()
        .filter(|r| {
            if strict {
                r.status != FileStatus::Ok
            } else {
                r.status == FileStatus::Error
            }
        })
        .count();

    CheckResult {
        path: dir.to_path_buf(),
        files_checked: files.len(),
        passed: files.len() - failed,
        failed,
        errors,
        warnings,
        results,
    }
}

/// Check a `<resource>.json` collection file.
pub fn check_collection_file(file: &Path) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let doc = match load_json(file) {
        Ok(doc) => doc,
        Err(e) => {
            diagnostics.push(error("E001", "/", format!("syntax error: {}", e)));
            return diagnostics;
        }
    };

    let Value::Array(records) = doc else {
        diagnostics.push(error("E002", "/", "collection is not a JSON array"));
        return diagnostics;
    };

    let mut seen = HashSet::new();
    for (i, record) in records.iter().enumerate() {
        let path = format!("/{}", i);
        if !record.is_object() {
            diagnostics.push(error("E003", &path, "record is not a JSON object"));
            continue;
        }
        match record_id(record) {
            None => diagnostics.push(error(
                "E004",
                &path,
                format!("record has no string {} field", ID_FIELD),
            )),
            Some(id) if !seen.insert(id) => diagnostics.push(error(
                "E005",
                &format!("{}/{}", path, ID_FIELD),
                format!("duplicate id \"{}\"", id),
            )),
            Some(_) => {}
        }
    }

    if !file.with_extension(SCHEMA_EXT).is_file() {
        diagnostics.push(warning(
            "W003",
            "/",
            "no schema for this collection: create and update requests will be rejected",
        ));
    }

    diagnostics
}

/// Check a `<resource>.schema` file and the records it governs.
pub fn check_schema_file(file: &Path) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let schema = match load_json(file) {
        Ok(schema) => schema,
        Err(e) => {
            diagnostics.push(error("E001", "/", format!("syntax error: {}", e)));
            return diagnostics;
        }
    };

    if let Err(e) = jsonschema::validator_for(&schema) {
        diagnostics.push(error("E006", "/", format!("invalid schema: {}", e)));
        return diagnostics;
    }

    let collection = file.with_extension(COLLECTION_EXT);
    if !collection.is_file() {
        diagnostics.push(warning("W001", "/", "schema has no matching collection"));
        return diagnostics;
    }

    // Unreadable collections are reported against the collection file itself.
    if let Ok(Value::Array(records)) = load_json(&collection) {
        for (i, record) in records.iter().enumerate() {
            let result = validate_against_schema(&schema, record);
            for violation in result.errors.unwrap_or_default() {
                diagnostics.push(warning(
                    "W002",
                    &format!("/{}", i),
                    format!("stored record violates schema: {}", violation),
                ));
            }
        }
    }

    diagnostics
}

fn error(code: &str, path: &str, message: impl Into<String>) -> Diagnostic {
    Diagnostic {
        severity: Severity::Error,
        code: code.to_string(),
        path: path.to_string(),
        message: message.into(),
    }
}

fn warning(code: &str, path: &str, message: impl Into<String>) -> Diagnostic {
    Diagnostic {
        severity: Severity::Warning,
        code: code.to_string(),
        path: path.to_string(),
        message: message.into(),
    }
}

fn status_of(diagnostics: &[Diagnostic]) -> FileStatus {
    if diagnostics.iter().any(|d| d.severity == Severity::Error) {
        FileStatus::Error
    } else if diagnostics.is_empty() {
        FileStatus::Ok
    } else {
        FileStatus::Warning
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().is_some_and(|e| e == ext)
}

/// Collect collection and schema files directly inside `dir`, sorted by name.
fn collect_data_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && (has_extension(path, COLLECTION_EXT) || has_extension(path, SCHEMA_EXT))
        })
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const BOOK_SCHEMA: &str = r#"{
        "type": "object",
        "required": ["title"],
        "properties": { "title": { "type": "string" } }
    }"#;

    fn data_dir(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            std::fs::write(dir.path().join(name), content).unwrap();
        }
        dir
    }

    fn codes(diagnostics: &[Diagnostic]) -> Vec<&str> {
        diagnostics.iter().map(|d| d.code.as_str()).collect()
    }

    #[test]
    fn check_valid_directory() {
        let dir = data_dir(&[
            ("books.json", r#"[{"_id": "1", "title": "Dune"}]"#),
            ("books.schema", BOOK_SCHEMA),
        ]);
        let result = check(dir.path(), true);

        assert!(result.is_ok());
        assert_eq!(result.files_checked, 2);
        assert_eq!(result.passed, 2);
        assert_eq!(result.warnings, 0);
    }

    #[test]
    fn check_invalid_json_syntax() {
        let dir = data_dir(&[("books.json", "[{"), ("books.schema", BOOK_SCHEMA)]);
        let diagnostics = check_collection_file(&dir.path().join("books.json"));
        assert_eq!(codes(&diagnostics), vec!["E001"]);
    }

    #[test]
    fn check_collection_not_array() {
        let dir = data_dir(&[("books.json", "{}"), ("books.schema", BOOK_SCHEMA)]);
        let diagnostics = check_collection_file(&dir.path().join("books.json"));
        assert_eq!(codes(&diagnostics), vec!["E002"]);
    }

    #[test]
    fn check_missing_and_duplicate_ids() {
        let dir = data_dir(&[
            (
                "books.json",
                r#"[{"_id": "1"}, {"title": "no id"}, {"_id": "1"}, 5]"#,
            ),
            ("books.schema", "{}"),
        ]);
        let diagnostics = check_collection_file(&dir.path().join("books.json"));

        assert_eq!(codes(&diagnostics), vec!["E004", "E005", "E003"]);
        assert_eq!(diagnostics[1].path, "/2/_id");
    }

    #[test]
    fn check_collection_without_schema_warns() {
        let dir = data_dir(&[("notes.json", "[]")]);
        let result = check(dir.path(), false);

        assert!(result.is_ok());
        assert_eq!(result.results[0].status, FileStatus::Warning);
        assert_eq!(codes(&result.results[0].diagnostics), vec!["W003"]);
    }

    #[test]
    fn check_invalid_schema() {
        let dir = data_dir(&[("books.json", "[]"), ("books.schema", r#"{"type": 12}"#)]);
        let diagnostics = check_schema_file(&dir.path().join("books.schema"));
        assert_eq!(codes(&diagnostics), vec!["E006"]);
    }

    #[test]
    fn check_orphan_schema() {
        let dir = data_dir(&[("books.schema", BOOK_SCHEMA)]);
        let diagnostics = check_schema_file(&dir.path().join("books.schema"));
        assert_eq!(codes(&diagnostics), vec!["W001"]);
    }

    #[test]
    fn check_stored_records_against_schema() {
        let dir = data_dir(&[
            ("books.json", r#"[{"_id": "1", "title": "Dune"}, {"_id": "2", "title": 9}]"#),
            ("books.schema", BOOK_SCHEMA),
        ]);
        let diagnostics = check_schema_file(&dir.path().join("books.schema"));

        assert_eq!(codes(&diagnostics), vec!["W002"]);
        assert_eq!(diagnostics[0].path, "/1");
    }

    #[test]
    fn check_strict_mode() {
        let dir = data_dir(&[("notes.json", "[]")]);

        assert_eq!(check(dir.path(), false).failed, 0);
        assert_eq!(check(dir.path(), true).failed, 1);
    }

    #[test]
    fn check_ignores_other_files() {
        let dir = data_dir(&[("README.md", "# data"), ("books.json", "[]"), ("books.schema", "{}")]);
        let result = check(dir.path(), false);
        assert_eq!(result.files_checked, 2);
        assert_eq!(result.results[0].file, PathBuf::from("books.json"));
    }
}
