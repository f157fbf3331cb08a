//! defectscope - Jira defect analytics dashboard for the terminal
//!
//! Imports Jira CSV exports and derives dashboard statistics, per-team
//! analytics, and the weekly roster report.

mod app;
mod render;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use defectscope_core::analytics::{
    pie_dataset, weekly_report, Aggregation, GroupField, TeamAnalytics, TeamAnalyticsResult,
};
use defectscope_core::ingest::content_hash;
use defectscope_core::store::keys;
use defectscope_core::{Config, CsvImporter, Issue, SnapshotStore, TrendStatistics};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

use crate::app::App;

#[derive(Parser)]
#[command(name = "defectscope")]
#[command(about = "Jira defect analytics dashboard")]
#[command(version)]
struct Cli {
    /// Path to a config file (defaults to the XDG location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for the snapshot database (defaults to the XDG location)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import one or more CSV exports
    Import {
        /// Export files to import
        paths: Vec<PathBuf>,

        /// Import every *.csv under a directory
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Reimport even when the content is unchanged
        #[arg(long)]
        force: bool,
    },
    /// Show the dashboard overview
    Dashboard,
    /// Show the full analytics block for one team
    Team {
        /// Team name as it appears in the data
        name: String,
    },
    /// Show the weekly roster report
    Report,
    /// List teams present in the data
    Teams,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    Config::ensure_xdg_env();

    let config = match &cli.config {
        Some(path) => Config::load_from(path).context("failed to load configuration")?,
        None => Config::load().context("failed to load configuration")?,
    };

    let _log_guard = defectscope_core::logging::init(&config.logging)
        .context("failed to initialize logging")?;

    let db_path = match &cli.data_dir {
        Some(dir) => dir.join("snapshots.db"),
        None => Config::database_path(),
    };
    tracing::info!(path = %db_path.display(), "Opening snapshot store");

    let snapshots = SnapshotStore::open(&db_path).context("failed to open snapshot store")?;
    snapshots.migrate().context("failed to migrate snapshot store")?;

    let app = App::new(snapshots, &config);

    match cli.command {
        Command::Import { paths, dir, force } => import(&app, &config, paths, dir, force),
        Command::Dashboard => dashboard(&app, &config),
        Command::Team { name } => team(&app, &config, &name),
        Command::Report => report(&app, &config),
        Command::Teams => teams(&app),
    }
}

fn import(
    app: &App,
    config: &Config,
    mut paths: Vec<PathBuf>,
    dir: Option<PathBuf>,
    force: bool,
) -> Result<()> {
    if let Some(dir) = dir {
        paths.extend(CsvImporter::discover_exports(&dir)?);
    }
    if paths.is_empty() {
        bail!("no export files given; pass file paths or --dir");
    }

    let importer = CsvImporter::new(&config.ingest)?;

    let progress = ProgressBar::new(paths.len() as u64).with_style(
        ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}").expect("progress template"),
    );

    let mut issues: Vec<Issue> = Vec::new();
    let mut warnings = 0usize;
    let mut skipped = 0usize;
    let mut file_hashes = String::new();

    for path in &paths {
        progress.set_message(path.display().to_string());
        let result = importer
            .import_file(path)
            .with_context(|| format!("failed to import {}", path.display()))?;

        for warning in &result.warnings {
            eprintln!("warning: {}: {}", path.display(), warning);
        }
        warnings += result.warnings.len();
        skipped += result.rows_skipped;
        file_hashes.push_str(&result.content_hash);
        issues.extend(result.issues);
        progress.inc(1);
    }
    progress.finish_and_clear();

    let combined_hash = content_hash(&file_hashes);
    let previous: Option<String> = app.snapshots.get_json(keys::IMPORT_HASH)?;
    if !force && previous.as_deref() == Some(combined_hash.as_str()) {
        println!(
            "Data is up to date ({} issues already imported); use --force to reimport.",
            issues.len()
        );
        return Ok(());
    }

    app.publish_issues(&issues, "importer")?;
    app.persist()?;
    app.snapshots.put_json(keys::IMPORT_HASH, &combined_hash)?;
    app.snapshots
        .put_json(keys::DATA_UPDATED, &Utc::now().to_rfc3339())?;

    println!("Import complete:");
    println!("  Files:    {}", paths.len());
    println!("  Issues:   {}", issues.len());
    println!("  Skipped:  {}", skipped);
    println!("  Warnings: {}", warnings);
    Ok(())
}

/// Load persisted issues and run them through the pipeline. Returns
/// `None` (after telling the user what to do) when nothing is imported.
fn load_pipeline(app: &App) -> Result<Option<Vec<Issue>>> {
    let Some(issues) = app.load_persisted()? else {
        println!("No data imported.");
        println!("Run 'defectscope import <export.csv>' first.");
        return Ok(None);
    };
    if issues.is_empty() {
        println!("The imported dataset is empty.");
        return Ok(None);
    }
    app.publish_issues(&issues, "loader")?;
    Ok(Some(issues))
}

fn dashboard(app: &App, config: &Config) -> Result<()> {
    if load_pipeline(app)?.is_none() {
        return Ok(());
    }

    let snapshot = app
        .statistics()?
        .context("statistics were not derived")?;
    let index = app.index()?.context("index was not derived")?;
    let trends = TrendStatistics::compute(&index, Utc::now(), config.analytics.top_reported_limit);

    render::print_dashboard(&snapshot, &trends);

    let open: Vec<Issue> = index
        .in_state(defectscope_core::IssueState::Unresolved)
        .into_iter()
        .cloned()
        .collect();
    render::print_open_by_team(&pie_dataset(&open, GroupField::Team, Aggregation::Count));
    Ok(())
}

fn team(app: &App, config: &Config, name: &str) -> Result<()> {
    if load_pipeline(app)?.is_none() {
        return Ok(());
    }
    let index = app.index()?.context("index was not derived")?;

    let analytics = TeamAnalytics::new(&index, Utc::now()).with_limits(
        config.analytics.team_top_limit,
        config.analytics.top_words_limit,
    );
    match analytics.insights(name) {
        TeamAnalyticsResult::Insights(insights) => render::print_team(&insights),
        TeamAnalyticsResult::Empty { team, message } => {
            println!("{}: {}", team, message);
            let known = index.teams().join(", ");
            if !known.is_empty() {
                println!("Known teams: {}", known);
            }
        }
    }
    Ok(())
}

fn report(app: &App, config: &Config) -> Result<()> {
    let Some(issues) = load_pipeline(app)? else {
        return Ok(());
    };
    let rows = weekly_report(&issues, &config.report.roster, Utc::now());
    render::print_report(&rows);
    Ok(())
}

fn teams(app: &App) -> Result<()> {
    if load_pipeline(app)?.is_none() {
        return Ok(());
    }
    let index = app.index()?.context("index was not derived")?;
    render::print_teams(&index);
    Ok(())
}
