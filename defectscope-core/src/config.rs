//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/defectscope/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/defectscope/` (~/.config/defectscope/)
//! - Data: `$XDG_DATA_HOME/defectscope/` (~/.local/share/defectscope/)
//! - State/Logs: `$XDG_STATE_HOME/defectscope/` (~/.local/state/defectscope/)
//!
//! Everything locale-specific about the Jira export — header names, status
//! labels, team aliases — lives here rather than in parsing code, so a
//! differently-localized export only needs a config change.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// CSV import configuration
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Weekly report configuration
    #[serde(default)]
    pub report: ReportConfig,

    /// Analytics tuning
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// CSV import configuration.
///
/// The header map translates export column names to canonical field names:
/// `id`, `type`, `team`, `assignee`, `reporter`, `status`, `priority`,
/// `summary`, `description`, `created`, `resolved`, `sla_date`, `reports`.
/// Columns that map to nothing are ignored.
#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    /// Reject files larger than this many bytes
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,

    /// Turn per-row warnings (missing key, bad date) into hard errors
    #[serde(default)]
    pub strict: bool,

    /// Regex a physical line must match to start a new logical row.
    /// Non-matching lines are merged into the previous row.
    #[serde(default = "default_issue_key_pattern")]
    pub issue_key_pattern: String,

    /// Export column name → canonical field name
    #[serde(default = "default_headers")]
    pub headers: HashMap<String, String>,

    /// Status labels that map to the resolved state
    #[serde(default = "default_resolved_statuses")]
    pub resolved_statuses: Vec<String>,

    /// Status labels that map to the rejected state
    #[serde(default = "default_rejected_statuses")]
    pub rejected_statuses: Vec<String>,

    /// Type labels that classify a row as a request; everything else is a defect
    #[serde(default = "default_request_types")]
    pub request_types: Vec<String>,

    /// Team name normalization, e.g. "Ядро" → "Core"
    #[serde(default = "default_team_aliases")]
    pub team_aliases: HashMap<String, String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: default_max_file_bytes(),
            strict: false,
            issue_key_pattern: default_issue_key_pattern(),
            headers: default_headers(),
            resolved_statuses: default_resolved_statuses(),
            rejected_statuses: default_rejected_statuses(),
            request_types: default_request_types(),
            team_aliases: default_team_aliases(),
        }
    }
}

fn default_max_file_bytes() -> u64 {
    1_048_576
}

fn default_issue_key_pattern() -> String {
    r"^[A-Za-z][A-Za-z0-9]*-[0-9]+,".to_string()
}

fn default_headers() -> HashMap<String, String> {
    [
        ("Issue key", "id"),
        ("Issue Type", "type"),
        ("Status", "status"),
        ("Priority", "priority"),
        ("Summary", "summary"),
        ("Description", "description"),
        ("Created", "created"),
        ("Resolved", "resolved"),
        ("Assignee", "assignee"),
        ("Reporter", "reporter"),
        ("Custom field (Команда устраняющая проблему)", "team"),
        ("Custom field (SLA дата наступления просрочки)", "sla_date"),
        ("Дата наступления SLA", "sla_date"),
        ("Custom field (Количество обращений)", "reports"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn default_resolved_statuses() -> Vec<String> {
    vec!["Закрыт".to_string()]
}

fn default_rejected_statuses() -> Vec<String> {
    vec!["Отклонен".to_string()]
}

fn default_request_types() -> Vec<String> {
    vec!["Запрос".to_string(), "Request".to_string()]
}

fn default_team_aliases() -> HashMap<String, String> {
    [("Ядро", "Core")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Weekly report configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ReportConfig {
    /// Teams included in the weekly report. The roster is the report
    /// scope: teams in the data but not listed here are skipped, and
    /// listed teams with no issues still get an all-zero row.
    #[serde(default = "default_roster")]
    pub roster: Vec<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            roster: default_roster(),
        }
    }
}

fn default_roster() -> Vec<String> {
    ["Core", "Mobile", "Web", "Platform"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Analytics tuning
#[derive(Debug, Deserialize, Clone)]
pub struct AnalyticsConfig {
    /// Size of the dashboard top-reported ranking
    #[serde(default = "default_top_reported_limit")]
    pub top_reported_limit: usize,

    /// Size of per-team top-5 style rankings
    #[serde(default = "default_team_top_limit")]
    pub team_top_limit: usize,

    /// Size of the word-frequency ranking
    #[serde(default = "default_top_words_limit")]
    pub top_words_limit: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            top_reported_limit: default_top_reported_limit(),
            team_top_limit: default_team_top_limit(),
            top_words_limit: default_top_words_limit(),
        }
    }
}

fn default_top_reported_limit() -> usize {
    20
}

fn default_team_top_limit() -> usize {
    5
}

fn default_top_words_limit() -> usize {
    15
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/defectscope/config.toml`
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("defectscope").join("config.toml")
    }

    /// Returns the data directory path (for the snapshot database)
    ///
    /// `$XDG_DATA_HOME/defectscope/`
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("defectscope")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/defectscope/`
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("defectscope")
    }

    /// Returns the snapshot database file path
    ///
    /// `$XDG_DATA_HOME/defectscope/snapshots.db`
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("snapshots.db")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/defectscope/defectscope.log`
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("defectscope.log")
    }

    /// Ensure XDG base directory environment variables are set.
    ///
    /// This is mainly for CLI binaries that want explicit, stable path
    /// behavior before resolving data and log locations.
    pub fn ensure_xdg_env() {
        let home = home_dir();

        if std::env::var("XDG_DATA_HOME").is_err() {
            std::env::set_var("XDG_DATA_HOME", home.join(".local/share"));
        }

        if std::env::var("XDG_STATE_HOME").is_err() {
            std::env::set_var("XDG_STATE_HOME", home.join(".local/state"));
        }

        if std::env::var("XDG_CONFIG_HOME").is_err() {
            std::env::set_var("XDG_CONFIG_HOME", home.join(".config"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.ingest.max_file_bytes, 1_048_576);
        assert!(!config.ingest.strict);
        assert_eq!(config.analytics.top_reported_limit, 20);
        assert_eq!(config.report.roster.len(), 4);
        assert_eq!(
            config.ingest.headers.get("Issue key").map(String::as_str),
            Some("id")
        );
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[ingest]
max_file_bytes = 2097152
strict = true

[ingest.headers]
"Clé de ticket" = "id"
"Statut" = "status"

[report]
roster = ["Alpha", "Beta"]

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.ingest.max_file_bytes, 2_097_152);
        assert!(config.ingest.strict);
        assert_eq!(
            config.ingest.headers.get("Clé de ticket").map(String::as_str),
            Some("id")
        );
        assert_eq!(config.report.roster, vec!["Alpha", "Beta"]);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_status_map_defaults() {
        let config = IngestConfig::default();
        assert!(config.resolved_statuses.iter().any(|s| s == "Закрыт"));
        assert!(config.rejected_statuses.iter().any(|s| s == "Отклонен"));
        assert_eq!(
            config.team_aliases.get("Ядро").map(String::as_str),
            Some("Core")
        );
    }
}
