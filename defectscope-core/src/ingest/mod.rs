//! Ingestion layer for parsing Jira CSV exports
//!
//! This module turns a raw export file into normalized [`Issue`] records.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────┐     ┌──────────────────┐     ┌──────────────────┐
//! │  export.csv    │ ──► │   CsvImporter    │ ──► │   Vec<Issue>     │
//! │ (raw, locale-  │     │ reassemble rows  │     │ (typed, UTC,     │
//! │  specific)     │     │ map headers      │     │  state derived)  │
//! └────────────────┘     │ normalize fields │     └──────────────────┘
//!                        └──────────────────┘
//! ```
//!
//! ## Design principles
//!
//! 1. **Normalize once**: header names, date formats, status labels, and
//!    team aliases are resolved here; downstream code never sees raw cells
//! 2. **Resilience**: individual malformed rows produce warnings and are
//!    skipped, unless strict mode upgrades them to errors
//! 3. **Linear**: row reassembly and parsing are single-pass over the file
//!
//! ## Usage
//!
//! ```rust,ignore
//! use defectscope_core::ingest::CsvImporter;
//!
//! let importer = CsvImporter::new(&config.ingest)?;
//! let result = importer.import_file(Path::new("export.csv"))?;
//! println!("{} issues, {} warnings", result.issues.len(), result.warnings.len());
//! ```

pub mod dates;

use crate::config::IngestConfig;
use crate::error::{Error, Result};
use crate::types::{Issue, IssueState, IssueType};
use regex::Regex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Result of importing one export file.
#[derive(Debug, Default)]
pub struct ImportResult {
    /// Normalized issues, in file order
    pub issues: Vec<Issue>,
    /// Logical data rows seen (after reassembly, excluding the header)
    pub rows_read: usize,
    /// Physical continuation lines merged into a previous row
    pub rows_merged: usize,
    /// Rows dropped for missing key or unusable creation date
    pub rows_skipped: usize,
    /// Non-fatal problems encountered while parsing
    pub warnings: Vec<String>,
    /// SHA-256 of the raw file content, for skip-if-unchanged checks
    pub content_hash: String,
}

/// Parses Jira CSV exports into normalized issues.
pub struct CsvImporter {
    config: IngestConfig,
    key_pattern: Regex,
}

impl CsvImporter {
    /// Create an importer from the ingest configuration.
    pub fn new(config: &IngestConfig) -> Result<Self> {
        let key_pattern = Regex::new(&config.issue_key_pattern).map_err(|e| {
            Error::Config(format!(
                "invalid ingest.issue_key_pattern {:?}: {}",
                config.issue_key_pattern, e
            ))
        })?;

        Ok(Self {
            config: config.clone(),
            key_pattern,
        })
    }

    /// Import a single export file.
    ///
    /// Boundary checks (extension, size) fail fast; row-level problems are
    /// reported through [`ImportResult::warnings`].
    pub fn import_file(&self, path: &Path) -> Result<ImportResult> {
        if path.extension().and_then(|e| e.to_str()) != Some("csv") {
            return Err(Error::Import {
                path: path.display().to_string(),
                message: "not a .csv file".to_string(),
            });
        }

        let size = std::fs::metadata(path)?.len();
        if size > self.config.max_file_bytes {
            return Err(Error::Import {
                path: path.display().to_string(),
                message: format!(
                    "file is {} bytes, limit is {} (raise ingest.max_file_bytes to override)",
                    size, self.config.max_file_bytes
                ),
            });
        }

        // Exports are not reliably UTF-8; replace what we cannot decode.
        let bytes = std::fs::read(path)?;
        let text = String::from_utf8_lossy(&bytes);

        let start = Instant::now();
        let result = self.import_text(&text, &path.display().to_string())?;
        let elapsed = start.elapsed();

        let elapsed_ms = elapsed.as_millis().max(1) as u64;
        tracing::info!(
            path = %path.display(),
            bytes = size,
            rows = result.rows_read,
            issues = result.issues.len(),
            warnings = result.warnings.len(),
            elapsed_ms,
            rows_per_sec = result.rows_read as u64 * 1000 / elapsed_ms,
            "CSV import complete"
        );

        Ok(result)
    }

    /// Import CSV text. `source` labels warnings and errors.
    pub fn import_text(&self, text: &str, source: &str) -> Result<ImportResult> {
        // Jira exports often lead with a UTF-8 BOM; it would otherwise
        // end up glued to the first header name.
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let content_hash = content_hash(text);
        let (rows, rows_merged) = self.reassemble_rows(text);

        if rows.len() < 2 {
            return Err(Error::Import {
                path: source.to_string(),
                message: "no data rows found".to_string(),
            });
        }

        let joined_rows = rows.join("\n");
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(joined_rows.as_bytes());

        // Resolve each column to a canonical field once, up front.
        let columns: Vec<Option<String>> = reader
            .headers()?
            .iter()
            .map(|name| self.config.headers.get(name.trim()).cloned())
            .collect();

        let mut result = ImportResult {
            content_hash,
            rows_merged,
            ..Default::default()
        };

        for (row_idx, record) in reader.records().enumerate() {
            result.rows_read += 1;
            let row = row_idx + 1;

            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    self.row_problem(source, &mut result, row, format!("unreadable row: {}", e))?;
                    continue;
                }
            };

            let mut fields: HashMap<&str, String> = HashMap::new();
            for (idx, canonical) in columns.iter().enumerate() {
                let Some(canonical) = canonical else { continue };
                let value = decode_cell(record.get(idx).unwrap_or(""));
                // Alternate columns for the same field (e.g. the two SLA
                // headers) only fill in when the first one was blank.
                if !value.is_empty() || !fields.contains_key(canonical.as_str()) {
                    fields.insert(canonical.as_str(), value);
                }
            }

            match self.record_to_issue(&fields, &mut result.warnings, row) {
                Some(issue) => result.issues.push(issue),
                None => {
                    result.rows_skipped += 1;
                    if self.config.strict {
                        let message = result
                            .warnings
                            .last()
                            .cloned()
                            .unwrap_or_else(|| format!("row {}: unusable row", row));
                        return Err(Error::Import {
                            path: source.to_string(),
                            message,
                        });
                    }
                }
            }
        }

        Ok(result)
    }

    fn row_problem(
        &self,
        source: &str,
        result: &mut ImportResult,
        row: usize,
        message: String,
    ) -> Result<()> {
        let message = format!("row {}: {}", row, message);
        if self.config.strict {
            return Err(Error::Import {
                path: source.to_string(),
                message,
            });
        }
        tracing::warn!(source, "{}", message);
        result.warnings.push(message);
        result.rows_skipped += 1;
        Ok(())
    }

    /// Merge physical lines into logical rows.
    ///
    /// The first line is the header. Every later line either starts a new
    /// row (matches the issue-key pattern) or is a continuation of the
    /// previous one and is appended with a space. Single pass.
    fn reassemble_rows(&self, text: &str) -> (Vec<String>, usize) {
        let mut rows: Vec<String> = Vec::new();
        let mut current = String::new();
        let mut merged = 0;

        for (idx, line) in text.lines().enumerate() {
            if idx == 0 {
                rows.push(line.trim().to_string());
            } else if self.key_pattern.is_match(line) {
                if !current.is_empty() {
                    rows.push(std::mem::take(&mut current));
                }
                current = line.trim_end().to_string();
            } else if !current.is_empty() && !line.trim().is_empty() {
                current.push(' ');
                current.push_str(line.trim());
                merged += 1;
            }
        }

        if !current.is_empty() {
            rows.push(current);
        }

        (rows, merged)
    }

    /// Normalize one record's canonical fields into an [`Issue`].
    ///
    /// Returns `None` (with a warning pushed) when the row has no key or
    /// no usable creation date.
    fn record_to_issue(
        &self,
        fields: &HashMap<&str, String>,
        warnings: &mut Vec<String>,
        row: usize,
    ) -> Option<Issue> {
        let id = fields.get("id").map(|s| s.trim()).unwrap_or("");
        if id.is_empty() {
            warnings.push(format!("row {}: missing issue key", row));
            return None;
        }

        let created_raw = fields.get("created").map(String::as_str).unwrap_or("");
        let Some(created) = dates::parse_flexible(created_raw) else {
            warnings.push(format!(
                "row {}: unparseable created date {:?}",
                row, created_raw
            ));
            return None;
        };

        let status = fields
            .get("status")
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        let state = self.classify_status(&status);

        let mut resolved = fields
            .get("resolved")
            .and_then(|raw| dates::parse_flexible(raw));

        // `resolved` is set iff the issue is closed. An open issue with a
        // resolution date is a data inconsistency worth noting, as is a
        // closed issue without one.
        if state.is_closed() {
            if resolved.is_none() {
                warnings.push(format!(
                    "row {}: {} issue {} has no resolution date",
                    row, state, id
                ));
            }
        } else if resolved.take().is_some() {
            warnings.push(format!(
                "row {}: ignoring resolution date on open issue {}",
                row, id
            ));
        }

        let sla_date = fields
            .get("sla_date")
            .and_then(|raw| dates::parse_flexible(raw));

        let reports = fields
            .get("reports")
            .map(|raw| parse_reports(raw))
            .unwrap_or(0);

        Some(Issue {
            id: id.to_string(),
            issue_type: self.classify_type(fields.get("type").map(String::as_str).unwrap_or("")),
            team: self.normalize_team(fields.get("team").map(String::as_str).unwrap_or("")),
            status,
            state,
            priority: non_empty(fields.get("priority")),
            created,
            resolved,
            sla_date,
            reports,
            summary: fields.get("summary").cloned().unwrap_or_default(),
            description: fields.get("description").cloned().unwrap_or_default(),
            assignee: non_empty(fields.get("assignee")),
            reporter: non_empty(fields.get("reporter")),
        })
    }

    fn classify_status(&self, status: &str) -> IssueState {
        if self.config.resolved_statuses.iter().any(|s| s == status) {
            IssueState::Resolved
        } else if self.config.rejected_statuses.iter().any(|s| s == status) {
            IssueState::Rejected
        } else {
            IssueState::Unresolved
        }
    }

    fn classify_type(&self, label: &str) -> IssueType {
        let label = label.trim();
        if self.config.request_types.iter().any(|t| t == label) {
            IssueType::Request
        } else {
            IssueType::Defect
        }
    }

    fn normalize_team(&self, raw: &str) -> Option<String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        Some(
            self.config
                .team_aliases
                .get(raw)
                .cloned()
                .unwrap_or_else(|| raw.to_string()),
        )
    }

    /// Discover export files under a directory, sorted by path.
    pub fn discover_exports(dir: &Path) -> Result<Vec<PathBuf>> {
        let pattern = dir.join("*.csv");
        let entries = glob::glob(&pattern.to_string_lossy()).map_err(|e| Error::Import {
            path: dir.display().to_string(),
            message: format!("invalid glob pattern: {}", e),
        })?;

        let mut files: Vec<PathBuf> = entries.flatten().collect();
        files.sort();

        tracing::info!(dir = %dir.display(), count = files.len(), "Discovered export files");
        Ok(files)
    }
}

/// SHA-256 of raw export text, hex encoded.
///
/// Stored alongside snapshots so re-importing an identical file can be
/// skipped.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Unquote side effects: exports encode embedded newlines as the literal
/// two-character sequence `\n` inside quoted cells.
fn decode_cell(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.contains("\\n") {
        trimmed.replace("\\n", "\n")
    } else {
        trimmed.to_string()
    }
}

fn parse_reports(raw: &str) -> u32 {
    let raw = raw.trim();
    if raw.is_empty() {
        return 0;
    }
    raw.parse::<u32>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().map(|f| f.max(0.0) as u32))
        .unwrap_or(0)
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
}
