//! Plain-text rendering for command output.

use defectscope_core::analytics::{PieDataset, TeamInsights, TeamReportRow};
use defectscope_core::{IssueIndex, IssueState, StatisticsSnapshot, TrendStatistics};

pub fn days(value: f64) -> String {
    format!("{:.1}d", value)
}

pub fn print_dashboard(snapshot: &StatisticsSnapshot, trends: &TrendStatistics) {
    println!("Dashboard");
    println!("=========");
    println!("Total issues:     {}", snapshot.total);
    println!("Unresolved:       {}", snapshot.unresolved);
    println!("Resolved:         {}", snapshot.resolved);
    println!("Rejected:         {}", snapshot.rejected);
    println!(
        "Avg resolution:   {}",
        days(snapshot.avg_resolution_days)
    );
    println!("Open reports:     {}", snapshot.unresolved_reports);

    if let (Some(start), Some(end)) = (snapshot.date_start, snapshot.date_end) {
        println!(
            "Data range:       {} .. {}",
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        );
    }

    println!(
        "Created last 30/90/180 days: {} / {} / {}",
        trends.last_30_days.total, trends.last_90_days.total, trends.last_180_days.total
    );

    if !snapshot.status_by_month.is_empty() {
        println!();
        println!("Monthly trend");
        println!("{:<9} {:>8} {:>9} {:>9} {:>9}", "Month", "Created", "Resolved", "Rejected", "Backlog");
        for (month, breakdown) in &snapshot.status_by_month {
            println!(
                "{:<9} {:>8} {:>9} {:>9} {:>9}",
                month.to_string(),
                breakdown.created,
                breakdown.resolved,
                breakdown.rejected,
                breakdown.unresolved
            );
        }
    }

    if !snapshot.top_reported.is_empty() {
        println!();
        println!("Top reported (unresolved)");
        for ranked in snapshot.top_reported.iter().take(10) {
            println!(
                "  {:>4}  {:<12} {}  [{}]",
                ranked.reports,
                ranked.id,
                truncate(&ranked.summary, 60),
                ranked.team.as_deref().unwrap_or("-")
            );
        }
    }
}

pub fn print_team(insights: &TeamInsights) {
    println!("Team: {}", insights.team);
    println!("======");
    println!(
        "Issues: {} (resolved {}, unresolved {}, rejected {})",
        insights.total_issues,
        insights.by_state.resolved,
        insights.by_state.unresolved,
        insights.by_state.rejected
    );
    println!(
        "Resolution time: avg {}, median {}",
        days(insights.avg_resolution_days),
        days(insights.median_resolution_days)
    );
    println!(
        "Open age: 0-7d {}, 8-14d {}, 15-30d {}, 30d+ {}",
        insights.open_aging.days_0_7,
        insights.open_aging.days_8_14,
        insights.open_aging.days_15_30,
        insights.open_aging.over_30
    );

    if !insights.by_priority.is_empty() {
        let parts: Vec<String> = insights
            .by_priority
            .iter()
            .map(|(priority, count)| format!("{} {}", priority, count))
            .collect();
        println!("Priorities: {}", parts.join(", "));
    }

    println!(
        "Reports: {} total, {:.1} per issue",
        insights.total_reports, insights.avg_reports
    );
    println!(
        "SLA: {} overdue ({:.0}%), avg overdue {}",
        insights.sla.overdue_total,
        insights.sla.overdue_ratio * 100.0,
        days(insights.sla.avg_overdue_days)
    );

    if !insights.problematic.is_empty() {
        println!();
        println!("Oldest unresolved");
        for age in &insights.problematic {
            println!(
                "  {:<12} open {:>7}  {}",
                age.id,
                days(age.days_open),
                truncate(&age.summary, 60)
            );
        }
    }

    if !insights.most_urgent.is_empty() {
        println!();
        println!("Most urgent");
        for urgent in &insights.most_urgent {
            println!(
                "  {:<12} score {:>6.1}  {}",
                urgent.id,
                urgent.score,
                truncate(&urgent.summary, 60)
            );
        }
    }

    if !insights.top_words.is_empty() {
        let words: Vec<String> = insights
            .top_words
            .iter()
            .take(10)
            .map(|w| format!("{} ({})", w.word, w.count))
            .collect();
        println!();
        println!("Frequent words: {}", words.join(", "));
    }

    if insights.long_lived.count > 0 {
        println!(
            "Long-lived (>1y): {} issue(s), oldest {}",
            insights.long_lived.count,
            days(insights.long_lived.examples[0].days_open)
        );
    }
}

pub fn print_report(rows: &[TeamReportRow]) {
    println!("Weekly report");
    println!("=============");
    println!(
        "{:<16} {:>5} {:>9} {:>9} {:>8} {:>7} {:>10} {:>22}",
        "Team", "Open", "Resolved", "Rejected", "Reports", "SLA %", "Avg close", "Last 30d (new/cl/rej)"
    );
    for row in rows {
        println!(
            "{:<16} {:>5} {:>9} {:>9} {:>8} {:>7.1} {:>10} {:>14}/{}/{}",
            row.team,
            row.new,
            row.resolved,
            row.rejected,
            row.reports_total,
            row.sla_percentage,
            days(row.avg_close_days),
            row.last_30_days.new,
            row.last_30_days.closed,
            row.last_30_days.rejected
        );
    }
}

pub fn print_open_by_team(dataset: &PieDataset) {
    if dataset.labels.is_empty() {
        return;
    }
    println!();
    println!("Open issues by team");
    for (label, value) in dataset.labels.iter().zip(&dataset.data) {
        println!("  {:<20} {:>4}", label, value);
    }
}

pub fn print_teams(index: &IssueIndex) {
    println!("Teams");
    println!("=====");
    for team in index.teams() {
        let issues = index.team(team);
        let open = issues
            .iter()
            .filter(|i| i.state == IssueState::Unresolved)
            .count();
        println!("{:<20} {:>4} issues ({} open)", team, issues.len(), open);
    }
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        text.to_string()
    } else {
        let cut: String = text.chars().take(limit).collect();
        format!("{}…", cut)
    }
}
