//! Chart-ready dataset transforms
//!
//! Converts issue collections into the label/series shapes chart
//! consumers want: linear (date × group), pie (group totals), and the
//! backlog series (per-month created/resolved/running backlog). Pure
//! transforms; renderers only format what comes out.

use crate::types::{Issue, MonthKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bucket used for issues with no value in the grouping field.
const UNKNOWN_GROUP: &str = "Unknown";

/// Which date drives the X axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateField {
    Created,
    Resolved,
}

/// Which field groups issues into series or slices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupField {
    Team,
    Status,
    State,
    Priority,
    Assignee,
}

impl GroupField {
    fn value(&self, issue: &Issue) -> String {
        let value = match self {
            GroupField::Team => issue.team.clone(),
            GroupField::Status => Some(issue.status.clone()).filter(|s| !s.is_empty()),
            GroupField::State => Some(issue.state.to_string()),
            GroupField::Priority => issue.priority.clone(),
            GroupField::Assignee => issue.assignee.clone(),
        };
        value.unwrap_or_else(|| UNKNOWN_GROUP.to_string())
    }
}

/// How grouped issues collapse into one number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    Count,
    ReportSum,
}

impl Aggregation {
    fn apply(&self, issues: &[&Issue]) -> f64 {
        match self {
            Aggregation::Count => issues.len() as f64,
            Aggregation::ReportSum => issues.iter().map(|i| i.reports as f64).sum(),
        }
    }
}

/// One line of a linear dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Series {
    pub label: String,
    pub data: Vec<f64>,
}

/// Dataset for line charts: sorted day labels, one series per group.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinearDataset {
    pub labels: Vec<String>,
    pub series: Vec<Series>,
}

/// Build a linear dataset from issues.
///
/// Issues missing the chosen date field are left out; groups missing a
/// value land in the "Unknown" series.
pub fn linear_dataset(
    issues: &[Issue],
    date_field: DateField,
    group_by: GroupField,
    aggregation: Aggregation,
) -> LinearDataset {
    // date label → group label → issues
    let mut grouped: BTreeMap<String, BTreeMap<String, Vec<&Issue>>> = BTreeMap::new();

    for issue in issues {
        let date = match date_field {
            DateField::Created => Some(issue.created),
            DateField::Resolved => issue.resolved,
        };
        let Some(date) = date else { continue };

        grouped
            .entry(date.format("%Y-%m-%d").to_string())
            .or_default()
            .entry(group_by.value(issue))
            .or_default()
            .push(issue);
    }

    let labels: Vec<String> = grouped.keys().cloned().collect();

    let mut series: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for (pos, groups) in grouped.values().enumerate() {
        for (group, bucket) in groups {
            let data = series
                .entry(group.clone())
                .or_insert_with(|| vec![0.0; labels.len()]);
            data[pos] = aggregation.apply(bucket);
        }
    }

    LinearDataset {
        labels,
        series: series
            .into_iter()
            .map(|(label, data)| Series { label, data })
            .collect(),
    }
}

/// Dataset for pie charts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PieDataset {
    pub labels: Vec<String>,
    pub data: Vec<f64>,
}

/// Build a pie dataset from issues, one slice per group value.
pub fn pie_dataset(issues: &[Issue], group_by: GroupField, aggregation: Aggregation) -> PieDataset {
    let mut grouped: BTreeMap<String, Vec<&Issue>> = BTreeMap::new();
    for issue in issues {
        grouped.entry(group_by.value(issue)).or_default().push(issue);
    }

    let mut dataset = PieDataset::default();
    for (label, bucket) in grouped {
        dataset.data.push(aggregation.apply(&bucket));
        dataset.labels.push(label);
    }
    dataset
}

/// Per-month created/resolved counts and the signed running backlog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BacklogSeries {
    pub months: Vec<MonthKey>,
    pub created: Vec<u32>,
    pub resolved: Vec<u32>,
    pub backlog: Vec<i64>,
}

/// Build the backlog chart series.
///
/// Resolutions bucket by resolution month; the running backlog stays
/// signed, matching the monthly statistics breakdown.
pub fn backlog_series(issues: &[Issue]) -> BacklogSeries {
    let mut created: BTreeMap<MonthKey, u32> = BTreeMap::new();
    let mut resolved: BTreeMap<MonthKey, u32> = BTreeMap::new();

    for issue in issues {
        *created.entry(MonthKey::from_datetime(issue.created)).or_insert(0) += 1;
        if let Some(ts) = issue.resolved {
            *resolved.entry(MonthKey::from_datetime(ts)).or_insert(0) += 1;
        }
    }

    let months: Vec<MonthKey> = created
        .keys()
        .chain(resolved.keys())
        .copied()
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut series = BacklogSeries::default();
    let mut running = 0i64;
    for month in months {
        let c = created.get(&month).copied().unwrap_or(0);
        let r = resolved.get(&month).copied().unwrap_or(0);
        running += c as i64 - r as i64;
        series.months.push(month);
        series.created.push(c);
        series.resolved.push(r);
        series.backlog.push(running);
    }
    series
}
