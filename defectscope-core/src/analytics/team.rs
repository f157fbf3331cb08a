//! Per-team deep-dive analytics
//!
//! Computes the full [`TeamInsights`] block for one team: state counts,
//! resolution-time statistics, aging histogram, priority distribution,
//! ranking lists, assignee rollups, summary-text word frequencies, SLA
//! insights, and heuristic urgency scoring.
//!
//! `now` is injected rather than read from the clock so results are
//! reproducible; every ratio guards its denominator and yields `0`
//! instead of NaN on empty input.

use crate::index::IssueIndex;
use crate::types::{Issue, IssueState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Priority bucket used when an issue carries no priority label.
const UNSPECIFIED_PRIORITY: &str = "UNSPECIFIED";

/// Rollup bucket for issues without an assignee.
const UNKNOWN_ASSIGNEE: &str = "UNKNOWN";

/// Issues open longer than this are reported as long-lived.
const LONG_LIVED_DAYS: f64 = 365.0;

/// Noise words excluded from the summary-text frequency analysis.
const STOP_WORDS: &[&str] = &[
    "и", "в", "на", "a", "the", "of", "to", "и.", "and", "т.", "др.", "—", "не", "что", "это",
    "как", "по",
];

/// Substrings counted as failure signatures in summaries.
const ERROR_SIGNATURES: &[&str] = &["npe", "exception", "outofbounds", "subaccount"];

/// Counts per derived state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCounts {
    pub resolved: usize,
    pub unresolved: usize,
    pub rejected: usize,
}

/// Open-issue age histogram, in days since creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgingHistogram {
    pub days_0_7: usize,
    pub days_8_14: usize,
    pub days_15_30: usize,
    pub over_30: usize,
}

/// One row of the longest-resolution ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedDuration {
    pub id: String,
    pub summary: String,
    pub days_to_resolve: f64,
    pub reports: u32,
}

/// One row of an open-age ranking (problematic / oldest-overdue lists).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAge {
    pub id: String,
    pub summary: String,
    pub days_open: f64,
    pub reports: u32,
}

/// One row of a report-count ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportedIssue {
    pub id: String,
    pub summary: String,
    pub reports: u32,
    pub state: IssueState,
}

impl ReportedIssue {
    fn from_issue(issue: &Issue) -> Self {
        Self {
            id: issue.id.clone(),
            summary: issue.summary.clone(),
            reports: issue.reports,
            state: issue.state,
        }
    }
}

/// Per-assignee rollup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssigneeStats {
    pub assignee: String,
    pub resolved: usize,
    pub unresolved: usize,
    pub rejected: usize,
    pub avg_resolution_days: f64,
    pub total_reports: u64,
}

/// One entry of the word-frequency ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCount {
    pub word: String,
    pub count: usize,
}

/// SLA-focused insight block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlaInsights {
    /// Issues currently past their SLA date
    pub overdue_total: usize,
    /// Share of the team's issues that are overdue, 0..=1
    pub overdue_ratio: f64,
    /// Priority distribution among overdue issues
    pub priority_distribution: BTreeMap<String, usize>,
    /// Oldest overdue issues by days open
    pub oldest_overdue: Vec<OpenAge>,
    /// Mean days past SLA among overdue issues
    pub avg_overdue_days: f64,
}

/// One row of the urgency ranking.
///
/// `score = (priority_weight + reports) × aging_factor` with
/// `aging_factor = 1 + log10(1 + days_open) / 2`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrgencyScore {
    pub id: String,
    pub summary: String,
    pub priority: Option<String>,
    pub reports: u32,
    pub days_open: f64,
    pub score: f64,
}

/// Unresolved issues open for more than a year.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LongLived {
    pub count: usize,
    pub examples: Vec<OpenAge>,
}

/// Full analytics block for one team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamInsights {
    pub team: String,
    pub total_issues: usize,
    pub by_state: StateCounts,
    pub avg_resolution_days: f64,
    pub median_resolution_days: f64,
    pub open_aging: AgingHistogram,
    pub by_priority: BTreeMap<String, usize>,
    pub longest_resolved: Vec<ResolvedDuration>,
    pub assignees: Vec<AssigneeStats>,
    pub problematic: Vec<OpenAge>,
    pub total_reports: u64,
    pub avg_reports: f64,
    pub top_reported: Vec<ReportedIssue>,
    pub top_words: Vec<WordCount>,
    pub topics: BTreeMap<String, Vec<ReportedIssue>>,
    pub sla: SlaInsights,
    pub most_urgent: Vec<UrgencyScore>,
    pub error_signatures: BTreeMap<String, usize>,
    pub long_lived: LongLived,
}

/// Result of a team query: either the full block or an explicit marker
/// that the team has no issues.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TeamAnalyticsResult {
    Empty { team: String, message: String },
    Insights(Box<TeamInsights>),
}

/// Team analytics over one index snapshot.
pub struct TeamAnalytics<'a> {
    index: &'a IssueIndex,
    now: DateTime<Utc>,
    top_limit: usize,
    top_words_limit: usize,
}

impl<'a> TeamAnalytics<'a> {
    pub fn new(index: &'a IssueIndex, now: DateTime<Utc>) -> Self {
        Self {
            index,
            now,
            top_limit: 5,
            top_words_limit: 15,
        }
    }

    /// Override the ranking sizes (top-5 lists, top-15 words by default).
    pub fn with_limits(mut self, top_limit: usize, top_words_limit: usize) -> Self {
        self.top_limit = top_limit;
        self.top_words_limit = top_words_limit;
        self
    }

    /// Compute the analytics block for `team`.
    pub fn insights(&self, team: &str) -> TeamAnalyticsResult {
        let issues = self.index.team(team);
        if issues.is_empty() {
            return TeamAnalyticsResult::Empty {
                team: team.to_string(),
                message: "No issues for this team".to_string(),
            };
        }

        let resolved: Vec<&Issue> = issues
            .iter()
            .copied()
            .filter(|i| i.state == IssueState::Resolved)
            .collect();
        let unresolved: Vec<&Issue> = issues
            .iter()
            .copied()
            .filter(|i| i.state == IssueState::Unresolved)
            .collect();
        let rejected_count = issues
            .iter()
            .filter(|i| i.state == IssueState::Rejected)
            .count();

        let (avg_resolution_days, median_resolution_days) = resolution_time_stats(&resolved);
        let (total_reports, avg_reports, top_reported) =
            self.reports_analysis(&issues);
        let (top_words, topics) = self.text_analysis(&issues);

        TeamAnalyticsResult::Insights(Box::new(TeamInsights {
            team: team.to_string(),
            total_issues: issues.len(),
            by_state: StateCounts {
                resolved: resolved.len(),
                unresolved: unresolved.len(),
                rejected: rejected_count,
            },
            avg_resolution_days,
            median_resolution_days,
            open_aging: self.open_aging(&unresolved),
            by_priority: priority_distribution(issues.iter().copied()),
            longest_resolved: self.longest_resolved(&resolved),
            assignees: assignee_stats(&issues),
            problematic: self.oldest_open(&unresolved),
            total_reports,
            avg_reports,
            top_reported,
            top_words,
            topics,
            sla: self.sla_insights(&issues),
            most_urgent: self.most_urgent(&issues),
            error_signatures: error_signatures(&issues),
            long_lived: self.long_lived(&unresolved),
        }))
    }

    fn open_aging(&self, unresolved: &[&Issue]) -> AgingHistogram {
        let mut aging = AgingHistogram::default();
        for issue in unresolved {
            let days = issue.days_open(self.now);
            if days <= 7.0 {
                aging.days_0_7 += 1;
            } else if days <= 14.0 {
                aging.days_8_14 += 1;
            } else if days <= 30.0 {
                aging.days_15_30 += 1;
            } else {
                aging.over_30 += 1;
            }
        }
        aging
    }

    fn longest_resolved(&self, resolved: &[&Issue]) -> Vec<ResolvedDuration> {
        let mut ranked: Vec<ResolvedDuration> = resolved
            .iter()
            .filter_map(|issue| {
                issue.resolution_days().map(|days| ResolvedDuration {
                    id: issue.id.clone(),
                    summary: issue.summary.clone(),
                    days_to_resolve: days,
                    reports: issue.reports,
                })
            })
            .collect();
        ranked.sort_by(|a, b| b.days_to_resolve.total_cmp(&a.days_to_resolve));
        ranked.truncate(self.top_limit);
        ranked
    }

    fn oldest_open(&self, unresolved: &[&Issue]) -> Vec<OpenAge> {
        let mut ranked: Vec<OpenAge> = unresolved.iter().map(|i| self.open_age(i)).collect();
        ranked.sort_by(|a, b| b.days_open.total_cmp(&a.days_open));
        ranked.truncate(self.top_limit);
        ranked
    }

    fn open_age(&self, issue: &Issue) -> OpenAge {
        OpenAge {
            id: issue.id.clone(),
            summary: issue.summary.clone(),
            days_open: issue.days_open(self.now),
            reports: issue.reports,
        }
    }

    fn reports_analysis(&self, issues: &[&Issue]) -> (u64, f64, Vec<ReportedIssue>) {
        let total: u64 = issues.iter().map(|i| i.reports as u64).sum();
        let average = if issues.is_empty() {
            0.0
        } else {
            total as f64 / issues.len() as f64
        };

        let mut ranked: Vec<&Issue> = issues.to_vec();
        ranked.sort_by(|a, b| b.reports.cmp(&a.reports));
        let top = ranked
            .into_iter()
            .take(self.top_limit)
            .map(ReportedIssue::from_issue)
            .collect();

        (total, average, top)
    }

    fn text_analysis(
        &self,
        issues: &[&Issue],
    ) -> (Vec<WordCount>, BTreeMap<String, Vec<ReportedIssue>>) {
        let stop_words: HashSet<&str> = STOP_WORDS.iter().copied().collect();
        let mut counts: HashMap<String, usize> = HashMap::new();

        for issue in issues {
            for word in issue
                .summary
                .to_lowercase()
                .split(|c: char| !c.is_alphanumeric())
            {
                if word.chars().count() >= 2 && !stop_words.contains(word) {
                    *counts.entry(word.to_string()).or_insert(0) += 1;
                }
            }
        }

        let mut ranked: Vec<WordCount> = counts
            .into_iter()
            .map(|(word, count)| WordCount { word, count })
            .collect();
        // Count descending, then alphabetical, so the ranking is stable.
        ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word)));
        ranked.truncate(self.top_words_limit);

        let mut topics = BTreeMap::new();
        for WordCount { word, .. } in ranked.iter().take(3) {
            let matching: Vec<ReportedIssue> = issues
                .iter()
                .filter(|issue| issue.summary.to_lowercase().contains(word.as_str()))
                .map(|issue| ReportedIssue::from_issue(issue))
                .collect();
            topics.insert(word.clone(), matching);
        }

        (ranked, topics)
    }

    fn sla_insights(&self, issues: &[&Issue]) -> SlaInsights {
        let overdue: Vec<&Issue> = issues
            .iter()
            .copied()
            .filter(|i| i.is_overdue(self.now))
            .collect();

        let overdue_ratio = if issues.is_empty() {
            0.0
        } else {
            overdue.len() as f64 / issues.len() as f64
        };

        let mut oldest_overdue: Vec<OpenAge> = overdue.iter().map(|i| self.open_age(i)).collect();
        oldest_overdue.sort_by(|a, b| b.days_open.total_cmp(&a.days_open));
        oldest_overdue.truncate(self.top_limit);

        let overdue_days: Vec<f64> = overdue
            .iter()
            .filter_map(|i| i.overdue_days(self.now))
            .collect();
        let avg_overdue_days = if overdue_days.is_empty() {
            0.0
        } else {
            overdue_days.iter().sum::<f64>() / overdue_days.len() as f64
        };

        SlaInsights {
            overdue_total: overdue.len(),
            overdue_ratio,
            priority_distribution: priority_distribution(overdue.iter().copied()),
            oldest_overdue,
            avg_overdue_days,
        }
    }

    fn most_urgent(&self, issues: &[&Issue]) -> Vec<UrgencyScore> {
        let mut scored: Vec<UrgencyScore> = issues
            .iter()
            .map(|issue| {
                let days_open = issue.days_open(self.now);
                let aging_factor = 1.0 + (1.0 + days_open.max(0.0)).log10() / 2.0;
                let weight = priority_weight(issue.priority.as_deref());
                UrgencyScore {
                    id: issue.id.clone(),
                    summary: issue.summary.clone(),
                    priority: issue.priority.clone(),
                    reports: issue.reports,
                    days_open,
                    score: (weight + issue.reports as f64) * aging_factor,
                }
            })
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(self.top_limit);
        scored
    }

    fn long_lived(&self, unresolved: &[&Issue]) -> LongLived {
        let mut aged: Vec<OpenAge> = unresolved
            .iter()
            .map(|i| self.open_age(i))
            .filter(|age| age.days_open > LONG_LIVED_DAYS)
            .collect();
        let count = aged.len();
        aged.sort_by(|a, b| b.days_open.total_cmp(&a.days_open));
        aged.truncate(self.top_limit);
        LongLived {
            count,
            examples: aged,
        }
    }
}

/// Mean and median resolution time over resolved issues, in days.
fn resolution_time_stats(resolved: &[&Issue]) -> (f64, f64) {
    let mut durations: Vec<f64> = resolved.iter().filter_map(|i| i.resolution_days()).collect();
    if durations.is_empty() {
        return (0.0, 0.0);
    }

    let average = durations.iter().sum::<f64>() / durations.len() as f64;

    durations.sort_by(f64::total_cmp);
    let mid = durations.len() / 2;
    let median = if durations.len() % 2 == 0 {
        (durations[mid - 1] + durations[mid]) / 2.0
    } else {
        durations[mid]
    };

    (average, median)
}

fn priority_distribution<'a, I>(issues: I) -> BTreeMap<String, usize>
where
    I: IntoIterator<Item = &'a Issue>,
{
    let mut distribution = BTreeMap::new();
    for issue in issues {
        let priority = issue
            .priority
            .clone()
            .unwrap_or_else(|| UNSPECIFIED_PRIORITY.to_string());
        *distribution.entry(priority).or_insert(0) += 1;
    }
    distribution
}

fn priority_weight(priority: Option<&str>) -> f64 {
    match priority {
        Some("P1") => 3.0,
        Some("P2") => 2.0,
        Some("P3") => 1.0,
        _ => 1.0,
    }
}

fn assignee_stats(issues: &[&Issue]) -> Vec<AssigneeStats> {
    let mut buckets: BTreeMap<String, Vec<&Issue>> = BTreeMap::new();
    for issue in issues.iter().copied() {
        let assignee = issue
            .assignee
            .clone()
            .unwrap_or_else(|| UNKNOWN_ASSIGNEE.to_string());
        buckets.entry(assignee).or_default().push(issue);
    }

    buckets
        .into_iter()
        .map(|(assignee, group)| {
            let resolved: Vec<&Issue> = group
                .iter()
                .copied()
                .filter(|i| i.state == IssueState::Resolved)
                .collect();
            let (avg_resolution_days, _) = resolution_time_stats(&resolved);
            AssigneeStats {
                assignee,
                resolved: resolved.len(),
                unresolved: group
                    .iter()
                    .filter(|i| i.state == IssueState::Unresolved)
                    .count(),
                rejected: group
                    .iter()
                    .filter(|i| i.state == IssueState::Rejected)
                    .count(),
                avg_resolution_days,
                total_reports: group.iter().map(|i| i.reports as u64).sum(),
            }
        })
        .collect()
}

fn error_signatures(issues: &[&Issue]) -> BTreeMap<String, usize> {
    let mut stats: BTreeMap<String, usize> = ERROR_SIGNATURES
        .iter()
        .map(|sig| (sig.to_string(), 0))
        .collect();
    for issue in issues {
        let summary = issue.summary.to_lowercase();
        for sig in ERROR_SIGNATURES {
            if summary.contains(sig) {
                *stats.entry(sig.to_string()).or_insert(0) += 1;
            }
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IssueType;
    use chrono::Duration;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().expect("test timestamp")
    }

    fn now() -> DateTime<Utc> {
        ts("2024-06-30T00:00:00Z")
    }

    struct IssueSpec {
        id: &'static str,
        state: IssueState,
        days_ago: i64,
        resolved_days_ago: Option<i64>,
        sla_days_ago: Option<i64>,
        priority: Option<&'static str>,
        reports: u32,
        assignee: Option<&'static str>,
        summary: &'static str,
    }

    impl Default for IssueSpec {
        fn default() -> Self {
            Self {
                id: "T-0",
                state: IssueState::Unresolved,
                days_ago: 10,
                resolved_days_ago: None,
                sla_days_ago: None,
                priority: None,
                reports: 0,
                assignee: None,
                summary: "issue summary",
            }
        }
    }

    fn make(spec: IssueSpec) -> Issue {
        Issue {
            id: spec.id.to_string(),
            issue_type: IssueType::Defect,
            team: Some("Core".to_string()),
            status: String::new(),
            state: spec.state,
            priority: spec.priority.map(String::from),
            created: now() - Duration::days(spec.days_ago),
            resolved: spec.resolved_days_ago.map(|d| now() - Duration::days(d)),
            sla_date: spec.sla_days_ago.map(|d| now() - Duration::days(d)),
            reports: spec.reports,
            summary: spec.summary.to_string(),
            description: String::new(),
            assignee: spec.assignee.map(String::from),
            reporter: None,
        }
    }

    fn analytics_for(issues: Vec<Issue>) -> TeamInsights {
        let index = IssueIndex::build(issues);
        match TeamAnalytics::new(&index, now()).insights("Core") {
            TeamAnalyticsResult::Insights(insights) => *insights,
            TeamAnalyticsResult::Empty { .. } => panic!("expected insights"),
        }
    }

    #[test]
    fn test_unknown_team_yields_empty_marker() {
        let index = IssueIndex::build(vec![make(IssueSpec::default())]);
        let result = TeamAnalytics::new(&index, now()).insights("Unknown");
        match result {
            TeamAnalyticsResult::Empty { team, message } => {
                assert_eq!(team, "Unknown");
                assert!(!message.is_empty());
            }
            TeamAnalyticsResult::Insights(_) => panic!("expected empty marker"),
        }
    }

    #[test]
    fn test_median_even_and_odd() {
        // Durations 2, 4, 10 days → median 4; with a 6-day issue → (4+6)/2.
        let mut issues = vec![
            make(IssueSpec {
                id: "T-1",
                state: IssueState::Resolved,
                days_ago: 20,
                resolved_days_ago: Some(18),
                ..Default::default()
            }),
            make(IssueSpec {
                id: "T-2",
                state: IssueState::Resolved,
                days_ago: 24,
                resolved_days_ago: Some(20),
                ..Default::default()
            }),
            make(IssueSpec {
                id: "T-3",
                state: IssueState::Resolved,
                days_ago: 30,
                resolved_days_ago: Some(20),
                ..Default::default()
            }),
        ];
        let odd = analytics_for(issues.clone());
        assert_eq!(odd.median_resolution_days, 4.0);
        assert!((odd.avg_resolution_days - 16.0 / 3.0).abs() < 1e-9);

        issues.push(make(IssueSpec {
            id: "T-4",
            state: IssueState::Resolved,
            days_ago: 16,
            resolved_days_ago: Some(10),
            ..Default::default()
        }));
        let even = analytics_for(issues);
        assert_eq!(even.median_resolution_days, 5.0);
    }

    #[test]
    fn test_aging_histogram_buckets() {
        let issues = vec![
            make(IssueSpec { id: "T-1", days_ago: 3, ..Default::default() }),
            make(IssueSpec { id: "T-2", days_ago: 10, ..Default::default() }),
            make(IssueSpec { id: "T-3", days_ago: 20, ..Default::default() }),
            make(IssueSpec { id: "T-4", days_ago: 90, ..Default::default() }),
            make(IssueSpec { id: "T-5", days_ago: 7, ..Default::default() }),
        ];
        let insights = analytics_for(issues);
        assert_eq!(insights.open_aging.days_0_7, 2);
        assert_eq!(insights.open_aging.days_8_14, 1);
        assert_eq!(insights.open_aging.days_15_30, 1);
        assert_eq!(insights.open_aging.over_30, 1);
    }

    #[test]
    fn test_sla_insights_ratio_and_average() {
        let issues = vec![
            // Overdue open issue: SLA passed 4 days ago.
            make(IssueSpec {
                id: "T-1",
                days_ago: 30,
                sla_days_ago: Some(4),
                priority: Some("P1"),
                ..Default::default()
            }),
            // On track: SLA 10 days out.
            make(IssueSpec {
                id: "T-2",
                days_ago: 5,
                sla_days_ago: Some(-10),
                ..Default::default()
            }),
            // Resolved 2 days past its SLA.
            make(IssueSpec {
                id: "T-3",
                state: IssueState::Resolved,
                days_ago: 20,
                resolved_days_ago: Some(8),
                sla_days_ago: Some(10),
                ..Default::default()
            }),
            // Rejected: overdue not applicable.
            make(IssueSpec {
                id: "T-4",
                state: IssueState::Rejected,
                days_ago: 40,
                resolved_days_ago: Some(1),
                sla_days_ago: Some(30),
                ..Default::default()
            }),
        ];
        let insights = analytics_for(issues);

        assert_eq!(insights.sla.overdue_total, 2);
        assert!((insights.sla.overdue_ratio - 0.5).abs() < 1e-9);
        assert_eq!(insights.sla.priority_distribution["P1"], 1);
        assert_eq!(insights.sla.priority_distribution[UNSPECIFIED_PRIORITY], 1);
        assert_eq!(insights.sla.oldest_overdue[0].id, "T-1");
        assert!((insights.sla.avg_overdue_days - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_urgency_prefers_reported_and_old() {
        let issues = vec![
            make(IssueSpec {
                id: "T-1",
                days_ago: 100,
                priority: Some("P1"),
                reports: 10,
                ..Default::default()
            }),
            make(IssueSpec {
                id: "T-2",
                days_ago: 1,
                priority: Some("P3"),
                reports: 0,
                ..Default::default()
            }),
        ];
        let insights = analytics_for(issues);
        assert_eq!(insights.most_urgent[0].id, "T-1");

        // Spot-check the formula on the first entry.
        let expected = (3.0 + 10.0) * (1.0 + (101.0f64).log10() / 2.0);
        assert!((insights.most_urgent[0].score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_text_analysis_skips_stop_and_short_words() {
        let issues = vec![
            make(IssueSpec {
                id: "T-1",
                summary: "Ошибка в портфеле и portfolio timeout",
                ..Default::default()
            }),
            make(IssueSpec {
                id: "T-2",
                summary: "Portfolio timeout на сервере",
                ..Default::default()
            }),
        ];
        let insights = analytics_for(issues);
        let words: HashMap<&str, usize> = insights
            .top_words
            .iter()
            .map(|w| (w.word.as_str(), w.count))
            .collect();

        assert_eq!(words.get("portfolio"), Some(&2));
        assert_eq!(words.get("timeout"), Some(&2));
        assert_eq!(words.get("и"), None); // stop word
        assert_eq!(words.get("в"), None); // short + stop word

        // Topic analysis maps top words back to their issues.
        assert_eq!(insights.topics["portfolio"].len(), 2);
    }

    #[test]
    fn test_error_signatures_counted() {
        let issues = vec![
            make(IssueSpec {
                id: "T-1",
                summary: "NPE in subaccount sync",
                ..Default::default()
            }),
            make(IssueSpec {
                id: "T-2",
                summary: "ArrayIndexOutOfBounds exception on load",
                ..Default::default()
            }),
        ];
        let insights = analytics_for(issues);
        assert_eq!(insights.error_signatures["npe"], 1);
        assert_eq!(insights.error_signatures["subaccount"], 1);
        assert_eq!(insights.error_signatures["exception"], 1);
        assert_eq!(insights.error_signatures["outofbounds"], 1);
    }

    #[test]
    fn test_long_lived_threshold() {
        let issues = vec![
            make(IssueSpec { id: "T-1", days_ago: 400, ..Default::default() }),
            make(IssueSpec { id: "T-2", days_ago: 500, ..Default::default() }),
            make(IssueSpec { id: "T-3", days_ago: 100, ..Default::default() }),
        ];
        let insights = analytics_for(issues);
        assert_eq!(insights.long_lived.count, 2);
        assert_eq!(insights.long_lived.examples[0].id, "T-2");
    }

    #[test]
    fn test_assignee_rollups() {
        let issues = vec![
            make(IssueSpec {
                id: "T-1",
                state: IssueState::Resolved,
                days_ago: 12,
                resolved_days_ago: Some(10),
                assignee: Some("U_1"),
                reports: 3,
                ..Default::default()
            }),
            make(IssueSpec {
                id: "T-2",
                assignee: Some("U_1"),
                reports: 2,
                ..Default::default()
            }),
            make(IssueSpec { id: "T-3", ..Default::default() }),
        ];
        let insights = analytics_for(issues);

        let u1 = insights
            .assignees
            .iter()
            .find(|a| a.assignee == "U_1")
            .expect("U_1 rollup");
        assert_eq!(u1.resolved, 1);
        assert_eq!(u1.unresolved, 1);
        assert_eq!(u1.avg_resolution_days, 2.0);
        assert_eq!(u1.total_reports, 5);

        assert!(insights
            .assignees
            .iter()
            .any(|a| a.assignee == UNKNOWN_ASSIGNEE));
    }
}
