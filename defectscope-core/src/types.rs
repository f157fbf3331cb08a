//! Core domain types for defectscope
//!
//! These types form the canonical data model that normalizes rows from a
//! Jira CSV export into one explicit issue record.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Issue** | One imported defect/request record |
//! | **State** | Derived tri-value classification: unresolved, resolved, rejected |
//! | **Backlog** | Running count of unresolved issues at a point in time |
//! | **SLA overdue** | An issue whose resolution (or the current time, if open) has passed its `sla_date` |
//! | **Roster** | The fixed list of team names included in the weekly report |
//!
//! ### Status vs State
//!
//! `status` is the raw, locale-specific label from the export ("Закрыт",
//! "В работе", ...). `state` is derived from it through the configurable
//! status map and is the only classification the analytics layer looks at.
//! The raw label is kept for per-status breakdowns and debugging.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

// ============================================
// Issue classification
// ============================================

/// Kind of imported record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    Defect,
    Request,
}

impl IssueType {
    /// Returns the identifier used in persisted snapshots
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueType::Defect => "defect",
            IssueType::Request => "request",
        }
    }
}

impl std::fmt::Display for IssueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for IssueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "defect" => Ok(IssueType::Defect),
            "request" => Ok(IssueType::Request),
            _ => Err(format!("unknown issue type: {}", s)),
        }
    }
}

/// Derived lifecycle state of an issue.
///
/// A pure function of the raw `status` label via the configured status map
/// (defaults: "Закрыт" → resolved, "Отклонен" → rejected, anything else →
/// unresolved).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueState {
    Unresolved,
    Resolved,
    Rejected,
}

impl IssueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueState::Unresolved => "unresolved",
            IssueState::Resolved => "resolved",
            IssueState::Rejected => "rejected",
        }
    }

    /// Resolved and rejected issues are closed; only closed issues carry a
    /// resolution timestamp.
    pub fn is_closed(&self) -> bool {
        matches!(self, IssueState::Resolved | IssueState::Rejected)
    }
}

impl std::fmt::Display for IssueState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for IssueState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unresolved" => Ok(IssueState::Unresolved),
            "resolved" => Ok(IssueState::Resolved),
            "rejected" => Ok(IssueState::Rejected),
            _ => Err(format!("unknown issue state: {}", s)),
        }
    }
}

// ============================================
// Issue
// ============================================

/// One imported defect/request record.
///
/// Header-to-field normalization happens once at parse time; everything
/// downstream works with these named fields only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Issue key, e.g. "ADIR-1203" (unique within a dataset)
    pub id: String,
    /// Defect or request
    pub issue_type: IssueType,
    /// Owning team, `None` when the export left it blank
    pub team: Option<String>,
    /// Raw status label from the export
    pub status: String,
    /// Lifecycle state derived from `status`
    pub state: IssueState,
    /// Priority label (P1/P2/P3 in practice), `None` when blank
    pub priority: Option<String>,
    /// Creation timestamp (required)
    pub created: DateTime<Utc>,
    /// Resolution timestamp; set iff `state` is resolved or rejected
    pub resolved: Option<DateTime<Utc>>,
    /// Target resolution deadline
    pub sla_date: Option<DateTime<Utc>>,
    /// Count of related complaint tickets
    pub reports: u32,
    /// One-line summary
    pub summary: String,
    /// Long description
    pub description: String,
    /// Current assignee
    pub assignee: Option<String>,
    /// Original reporter
    pub reporter: Option<String>,
}

impl Issue {
    /// Time from creation to resolution, in fractional days.
    ///
    /// `None` for issues without a resolution timestamp; callers exclude
    /// those from averages rather than treating them as zero.
    pub fn resolution_days(&self) -> Option<f64> {
        let resolved = self.resolved?;
        Some(millis_between(self.created, resolved) / MILLIS_PER_DAY)
    }

    /// How long the issue has been (or was) open, in fractional days.
    pub fn days_open(&self, now: DateTime<Utc>) -> f64 {
        millis_between(self.created, now) / MILLIS_PER_DAY
    }

    /// Canonical SLA-overdue predicate, applied everywhere.
    ///
    /// - unresolved: overdue iff `now` has passed the SLA date
    /// - resolved: overdue iff the resolution came after the SLA date
    /// - rejected: not applicable, never overdue
    /// - no SLA date: never overdue
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        let Some(sla) = self.sla_date else {
            return false;
        };
        match self.state {
            IssueState::Unresolved => now > sla,
            IssueState::Resolved => self.resolved.map(|r| r > sla).unwrap_or(false),
            IssueState::Rejected => false,
        }
    }

    /// How far past the SLA date the issue ran, in fractional days.
    ///
    /// Measured against the resolution time for resolved issues and
    /// against `now` for open ones. `None` when the issue is not overdue.
    pub fn overdue_days(&self, now: DateTime<Utc>) -> Option<f64> {
        if !self.is_overdue(now) {
            return None;
        }
        let sla = self.sla_date?;
        let reference = self.resolved.unwrap_or(now);
        Some(millis_between(sla, reference) / MILLIS_PER_DAY)
    }
}

fn millis_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    end.signed_duration_since(start).num_milliseconds() as f64
}

// ============================================
// Month keys
// ============================================

/// Calendar month bucket, ordered chronologically.
///
/// Serializes as "YYYY-MM", which keeps string-keyed snapshots sorted the
/// same way as the typed ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    /// 1-12
    pub month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// Month bucket a timestamp falls into.
    pub fn from_datetime(ts: DateTime<Utc>) -> Self {
        Self {
            year: ts.year(),
            month: ts.month(),
        }
    }
}

impl std::fmt::Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl std::str::FromStr for MonthKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| format!("invalid month key: {}", s))?;
        let year: i32 = year
            .parse()
            .map_err(|_| format!("invalid month key: {}", s))?;
        let month: u32 = month
            .parse()
            .map_err(|_| format!("invalid month key: {}", s))?;
        if !(1..=12).contains(&month) {
            return Err(format!("invalid month key: {}", s));
        }
        Ok(Self { year, month })
    }
}

impl Serialize for MonthKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================
// Date ranges
// ============================================

/// Inclusive timestamp range used by period filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// The trailing `days` window ending at `now`.
    pub fn last_days(days: i64, now: DateTime<Utc>) -> Self {
        Self {
            start: now - Duration::days(days),
            end: now,
        }
    }

    /// The calendar month containing `now`.
    pub fn current_month(now: DateTime<Utc>) -> Self {
        let start = month_start(now.year(), now.month());
        let end = next_month_start(now.year(), now.month()) - Duration::milliseconds(1);
        Self { start, end }
    }

    /// The calendar month before the one containing `now`.
    pub fn last_month(now: DateTime<Utc>) -> Self {
        let (year, month) = if now.month() == 1 {
            (now.year() - 1, 12)
        } else {
            (now.year(), now.month() - 1)
        };
        let start = month_start(year, month);
        let end = next_month_start(year, month) - Duration::milliseconds(1);
        Self { start, end }
    }

    /// Everything the dashboard considers history (from 2021 onward).
    pub fn all_time(now: DateTime<Utc>) -> Self {
        Self {
            start: month_start(2021, 1),
            end: now,
        }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts <= self.end
    }
}

fn month_start(year: i32, month: u32) -> DateTime<Utc> {
    let date = NaiveDate::from_ymd_opt(year, month, 1)
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(1970, 1, 1).unwrap());
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap())
}

fn next_month_start(year: i32, month: u32) -> DateTime<Utc> {
    if month == 12 {
        month_start(year + 1, 1)
    } else {
        month_start(year, month + 1)
    }
}
