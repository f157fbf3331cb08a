//! Analytics for defectscope
//!
//! Derived views over an [`crate::index::IssueIndex`]:
//! - Dashboard statistics (counts, monthly trend/backlog, top-reported)
//! - Per-team deep-dive analytics
//! - The fixed-roster weekly report
//! - Chart-ready dataset transforms
//!
//! All computations are one-shot and synchronous: a data change produces
//! a whole new snapshot, never an incremental update.

pub mod dataset;
pub mod report;
pub mod statistics;
pub mod team;

pub use dataset::{
    backlog_series, linear_dataset, pie_dataset, Aggregation, BacklogSeries, DateField,
    GroupField, LinearDataset, PieDataset, Series,
};
pub use report::{weekly_report, Last30Days, TeamReportRow};
pub use statistics::{
    average_resolution_days, newest, oldest, status_by_month, top_reported, top_reported_between,
    MonthlyBreakdown, RankedIssue, StatisticsSnapshot, TrendStatistics,
};
pub use team::{
    AgingHistogram, AssigneeStats, LongLived, OpenAge, ReportedIssue, ResolvedDuration,
    SlaInsights, StateCounts, TeamAnalytics, TeamAnalyticsResult, TeamInsights, UrgencyScore,
    WordCount,
};
