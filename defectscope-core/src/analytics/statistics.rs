//! Dashboard statistics aggregation
//!
//! Derives the [`StatisticsSnapshot`] from an [`IssueIndex`]: scalar
//! counts, average resolution time, the monthly trend/backlog breakdown,
//! and the top-reported ranking. Snapshots are one-shot computations over
//! the current dataset; any data change produces a whole new snapshot.
//!
//! ## Monthly backlog semantics
//!
//! An issue's creation lands in its creation month; its resolution (or
//! rejection) lands in its *resolution* month, which may differ. The
//! running `unresolved` total obeys
//! `unresolved[M] = unresolved[M-1] + created[M] - resolved[M] - rejected[M]`
//! and stays signed: inconsistent data can drive it negative, and that is
//! surfaced rather than clamped. Per-team backlog is a point-in-time
//! count per month (created in-or-before the month, resolved strictly
//! after it), not a delta.

use crate::index::IssueIndex;
use crate::types::{DateRange, Issue, IssueState, MonthKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One month of the trend breakdown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBreakdown {
    /// Issues created this month
    pub created: u32,
    /// Issues resolved this month (by resolution date)
    pub resolved: u32,
    /// Issues rejected this month (by resolution date)
    pub rejected: u32,
    /// Running unresolved total at the end of this month; signed
    pub unresolved: i64,
    /// Point-in-time backlog per team at the end of this month
    pub team_backlog: BTreeMap<String, i64>,
}

/// One row of a top-reported ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedIssue {
    pub id: String,
    pub summary: String,
    pub team: Option<String>,
    pub reports: u32,
}

impl RankedIssue {
    fn from_issue(issue: &Issue) -> Self {
        Self {
            id: issue.id.clone(),
            summary: issue.summary.clone(),
            team: issue.team.clone(),
            reports: issue.reports,
        }
    }
}

/// Aggregate view over one dataset snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    pub total: usize,
    pub resolved: usize,
    pub unresolved: usize,
    pub rejected: usize,
    /// Mean days from creation to resolution, resolved issues only; 0 when none
    pub avg_resolution_days: f64,
    /// Sum of report counts over unresolved issues
    pub unresolved_reports: u64,
    /// Earliest creation timestamp in the dataset
    pub date_start: Option<DateTime<Utc>>,
    /// Latest creation or resolution timestamp in the dataset
    pub date_end: Option<DateTime<Utc>>,
    /// Monthly trend, chronologically keyed
    pub status_by_month: BTreeMap<MonthKey, MonthlyBreakdown>,
    /// Top unresolved issues by report count
    pub top_reported: Vec<RankedIssue>,
}

impl StatisticsSnapshot {
    /// Compute the snapshot for an index.
    pub fn compute(index: &IssueIndex, top_limit: usize) -> Self {
        let mut date_start: Option<DateTime<Utc>> = None;
        let mut date_end: Option<DateTime<Utc>> = None;
        let mut unresolved_reports: u64 = 0;

        for issue in index.all() {
            date_start = Some(date_start.map_or(issue.created, |d| d.min(issue.created)));
            let last_seen = issue.resolved.unwrap_or(issue.created).max(issue.created);
            date_end = Some(date_end.map_or(last_seen, |d| d.max(last_seen)));
            if issue.state == IssueState::Unresolved {
                unresolved_reports += issue.reports as u64;
            }
        }

        Self {
            total: index.len(),
            resolved: index.state_count(IssueState::Resolved),
            unresolved: index.state_count(IssueState::Unresolved),
            rejected: index.state_count(IssueState::Rejected),
            avg_resolution_days: average_resolution_days(index.in_state(IssueState::Resolved)),
            unresolved_reports,
            date_start,
            date_end,
            status_by_month: status_by_month(index),
            top_reported: top_reported(index.all(), top_limit),
        }
    }
}

/// Mean days from creation to resolution.
///
/// Issues without a resolution timestamp are excluded, not treated as
/// zero; an empty input yields `0.0`, never NaN.
pub fn average_resolution_days<'a, I>(issues: I) -> f64
where
    I: IntoIterator<Item = &'a Issue>,
{
    let mut sum = 0.0;
    let mut count = 0usize;
    for issue in issues {
        if let Some(days) = issue.resolution_days() {
            sum += days;
            count += 1;
        }
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Top unresolved issues ranked descending by report count.
///
/// The sort is stable: issues with equal report counts keep their input
/// order, so the ranking is deterministic.
pub fn top_reported<'a, I>(issues: I, limit: usize) -> Vec<RankedIssue>
where
    I: IntoIterator<Item = &'a Issue>,
{
    let mut ranked: Vec<&Issue> = issues
        .into_iter()
        .filter(|issue| issue.state == IssueState::Unresolved)
        .collect();
    ranked.sort_by(|a, b| b.reports.cmp(&a.reports));
    ranked
        .into_iter()
        .take(limit)
        .map(RankedIssue::from_issue)
        .collect()
}

/// Top unresolved issues created within a date window.
pub fn top_reported_between(index: &IssueIndex, range: &DateRange, limit: usize) -> Vec<RankedIssue> {
    top_reported(index.created_in(range).into_iter(), limit)
}

/// The issue with the earliest creation date.
pub fn oldest(index: &IssueIndex) -> Option<&Issue> {
    index.all().iter().min_by_key(|issue| issue.created)
}

/// The issue with the latest creation date.
pub fn newest(index: &IssueIndex) -> Option<&Issue> {
    index.all().iter().max_by_key(|issue| issue.created)
}

/// Build the monthly trend breakdown for an index.
pub fn status_by_month(index: &IssueIndex) -> BTreeMap<MonthKey, MonthlyBreakdown> {
    let mut months: BTreeMap<MonthKey, MonthlyBreakdown> = BTreeMap::new();

    for issue in index.all() {
        months
            .entry(MonthKey::from_datetime(issue.created))
            .or_default()
            .created += 1;

        if let Some(resolved) = issue.resolved {
            let entry = months.entry(MonthKey::from_datetime(resolved)).or_default();
            if issue.state == IssueState::Rejected {
                entry.rejected += 1;
            } else {
                entry.resolved += 1;
            }
        }
    }

    // Running unresolved total, in chronological month order.
    let mut running: i64 = 0;
    for breakdown in months.values_mut() {
        running += breakdown.created as i64 - breakdown.resolved as i64 - breakdown.rejected as i64;
        breakdown.unresolved = running;
    }

    // Per-team point-in-time backlog. One +1/-1 difference pass per team
    // instead of re-filtering the issue list for every (team, month) pair.
    let keys: Vec<MonthKey> = months.keys().copied().collect();
    let positions: HashMap<MonthKey, usize> =
        keys.iter().enumerate().map(|(i, k)| (*k, i)).collect();

    for team in index.teams() {
        let mut diff = vec![0i64; keys.len()];
        for issue in index.team(team) {
            diff[positions[&MonthKey::from_datetime(issue.created)]] += 1;
            if let Some(resolved) = issue.resolved {
                diff[positions[&MonthKey::from_datetime(resolved)]] -= 1;
            }
        }

        let mut backlog = 0i64;
        for (pos, key) in keys.iter().enumerate() {
            backlog += diff[pos];
            if let Some(entry) = months.get_mut(key) {
                entry.team_backlog.insert(team.to_string(), backlog);
            }
        }
    }

    months
}

/// Snapshots for the standard dashboard trend windows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrendStatistics {
    pub last_30_days: StatisticsSnapshot,
    pub last_90_days: StatisticsSnapshot,
    pub last_180_days: StatisticsSnapshot,
    pub all_time: StatisticsSnapshot,
}

impl TrendStatistics {
    /// Compute all windows. Each window re-indexes the issues created
    /// within it; derived views are always rebuilt wholesale.
    pub fn compute(index: &IssueIndex, now: DateTime<Utc>, top_limit: usize) -> Self {
        let window = |days: i64| {
            let range = DateRange::last_days(days, now);
            let issues: Vec<Issue> = index.created_in(&range).into_iter().cloned().collect();
            StatisticsSnapshot::compute(&IssueIndex::build(issues), top_limit)
        };

        Self {
            last_30_days: window(30),
            last_90_days: window(90),
            last_180_days: window(180),
            all_time: StatisticsSnapshot::compute(index, top_limit),
        }
    }
}
