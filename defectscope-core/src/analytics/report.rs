//! Weekly roster report
//!
//! Produces the fixed per-team report consumed by the weekly/MVP view.
//! The roster is the report scope: teams in the data but not on the
//! roster are skipped, and roster teams with no issues still get an
//! all-zero row. Everything is computed in a single forward pass over
//! the issue list, with running incremental averages.

use crate::types::{Issue, IssueState};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Activity counters over the trailing 30 days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Last30Days {
    pub closed: usize,
    pub new: usize,
    pub rejected: usize,
}

/// One report row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamReportRow {
    pub team: String,
    /// Open (unresolved) issues
    pub new: usize,
    pub resolved: usize,
    pub rejected: usize,
    /// Report tickets across all of the team's issues
    pub reports_total: u64,
    /// Report tickets on still-open issues
    pub reports_unresolved: u64,
    /// Share of closed issues that met their SLA, in percent
    pub sla_percentage: f64,
    /// Mean days from creation to resolution
    pub avg_close_days: f64,
    pub last_30_days: Last30Days,
}

/// Build the weekly report, one row per roster team, in roster order.
pub fn weekly_report(issues: &[Issue], roster: &[String], now: DateTime<Utc>) -> Vec<TeamReportRow> {
    let mut rows: Vec<TeamReportRow> = roster
        .iter()
        .map(|team| TeamReportRow {
            team: team.clone(),
            ..Default::default()
        })
        .collect();
    let positions: HashMap<&str, usize> = roster
        .iter()
        .enumerate()
        .map(|(pos, team)| (team.as_str(), pos))
        .collect();

    // Per-row running state for the incremental averages and SLA counts.
    let mut closed_counts = vec![0usize; rows.len()];
    let mut on_time_counts = vec![0usize; rows.len()];
    let last_30 = now - Duration::days(30);

    for issue in issues {
        // Issues outside the roster are out of report scope.
        let Some(&pos) = issue.team.as_deref().and_then(|team| positions.get(team)) else {
            continue;
        };
        let row = &mut rows[pos];

        match issue.state {
            IssueState::Unresolved => {
                row.new += 1;
                row.reports_unresolved += issue.reports as u64;
            }
            IssueState::Resolved => row.resolved += 1,
            IssueState::Rejected => row.rejected += 1,
        }
        row.reports_total += issue.reports as u64;

        if issue.state.is_closed() {
            if !issue.is_overdue(now) {
                on_time_counts[pos] += 1;
            }
            if let Some(days) = issue.resolution_days() {
                closed_counts[pos] += 1;
                let n = closed_counts[pos] as f64;
                row.avg_close_days = (row.avg_close_days * (n - 1.0) + days) / n;
            }
        }

        if issue.created >= last_30 {
            row.last_30_days.new += 1;
        }
        if let Some(resolved) = issue.resolved {
            if resolved >= last_30 {
                match issue.state {
                    IssueState::Resolved => row.last_30_days.closed += 1,
                    IssueState::Rejected => row.last_30_days.rejected += 1,
                    IssueState::Unresolved => {}
                }
            }
        }
    }

    for (pos, row) in rows.iter_mut().enumerate() {
        let denominator = row.new + row.resolved + row.rejected;
        row.sla_percentage = if denominator == 0 {
            0.0
        } else {
            (on_time_counts[pos] as f64 / denominator as f64 * 100.0).clamp(0.0, 100.0)
        };
    }

    rows
}
