//! Integration tests for the defectscope import and aggregation pipeline
//!
//! These tests use the fixture export in `tests/fixtures/` to verify the
//! end-to-end flow: CSV → issues → index → statistics → state store →
//! snapshot store.

use defectscope_core::analytics::{weekly_report, TeamAnalytics, TeamAnalyticsResult};
use defectscope_core::config::IngestConfig;
use defectscope_core::store::keys;
use defectscope_core::{
    CsvImporter, Issue, IssueIndex, IssueState, SnapshotStore, StateKey, StateStore,
    StatisticsSnapshot,
};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::rc::Rc;
use tempfile::TempDir;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn import_fixture() -> Vec<Issue> {
    let importer = CsvImporter::new(&IngestConfig::default()).expect("importer");
    importer
        .import_file(&fixture_path("export-minimal.csv"))
        .expect("fixture import should succeed")
        .issues
}

fn now() -> DateTime<Utc> {
    "2024-06-30T00:00:00Z".parse().unwrap()
}

// ============================================
// Import
// ============================================

#[test]
fn test_import_fixture_end_to_end() {
    let importer = CsvImporter::new(&IngestConfig::default()).expect("importer");
    let result = importer
        .import_file(&fixture_path("export-minimal.csv"))
        .expect("fixture import should succeed");

    assert_eq!(result.rows_read, 4);
    assert_eq!(result.issues.len(), 4);
    assert_eq!(result.rows_merged, 1); // the split quoted summary
    assert_eq!(result.content_hash.len(), 64);

    let resolved = &result.issues[0];
    assert_eq!(resolved.id, "ADIR-1001");
    assert_eq!(resolved.state, IssueState::Resolved);
    assert_eq!(resolved.team.as_deref(), Some("Core")); // "Ядро" aliased
    assert_eq!(resolved.reports, 67);
    assert!(resolved.is_overdue(now())); // resolved after the SLA date
    assert!(resolved.description.contains('\n')); // literal \n decoded

    let open = &result.issues[1];
    assert_eq!(open.state, IssueState::Unresolved);
    assert_eq!(open.resolved, None);
    assert_eq!(open.team.as_deref(), Some("Mobile"));

    let rejected = &result.issues[2];
    assert_eq!(rejected.state, IssueState::Rejected);
    assert!(rejected.summary.contains("особенность"));
    assert_eq!(
        rejected.created.format("%Y-%m-%d").to_string(),
        "2024-01-15"
    );

    let teamless = &result.issues[3];
    assert_eq!(teamless.team, None);
    assert_eq!(teamless.reports, 3);
}

#[test]
fn test_reimport_is_deterministic() {
    let first = import_fixture();
    let second = import_fixture();
    assert_eq!(first, second);
}

// ============================================
// Reactive pipeline
// ============================================

#[test]
fn test_pipeline_through_state_store() {
    let issues = import_fixture();
    let store = Rc::new(StateStore::new());

    // issues → index
    let indexer = Rc::clone(&store);
    store.subscribe(StateKey::Issues, move |value| {
        let issues: Vec<Issue> = serde_json::from_value(value.clone())?;
        let index = IssueIndex::build(issues);
        indexer.set(StateKey::Index, serde_json::to_value(&index)?, "indexer");
        Ok(())
    });

    // index → statistics
    let aggregator = Rc::clone(&store);
    store.subscribe(StateKey::Index, move |value| {
        let index: IssueIndex = serde_json::from_value(value.clone())?;
        let snapshot = StatisticsSnapshot::compute(&index, 20);
        aggregator.set(
            StateKey::Statistics,
            serde_json::to_value(&snapshot)?,
            "aggregator",
        );
        Ok(())
    });

    store.set(
        StateKey::Issues,
        serde_json::to_value(&issues).unwrap(),
        "test",
    );
    store.flush();

    let snapshot: StatisticsSnapshot =
        serde_json::from_value(store.get(StateKey::Statistics).expect("statistics published"))
            .expect("statistics deserialize");

    assert_eq!(snapshot.total, 4);
    assert_eq!(snapshot.resolved, 1);
    assert_eq!(snapshot.unresolved, 2);
    assert_eq!(snapshot.rejected, 1);
    assert_eq!(snapshot.unresolved_reports, 15);
    assert_eq!(snapshot.top_reported[0].id, "ADIR-1002");

    // Re-publishing identical issues is a no-op: statistics unchanged.
    store.set(
        StateKey::Issues,
        serde_json::to_value(&issues).unwrap(),
        "test",
    );
    store.flush();
    assert_eq!(store.pending(), 0);
}

// ============================================
// Derived views
// ============================================

#[test]
fn test_team_analytics_from_fixture() {
    let index = IssueIndex::build(import_fixture());
    let analytics = TeamAnalytics::new(&index, now());

    match analytics.insights("Core") {
        TeamAnalyticsResult::Insights(core) => {
            assert_eq!(core.total_issues, 1);
            assert_eq!(core.by_state.resolved, 1);
            assert_eq!(core.total_reports, 67);
            assert_eq!(core.sla.overdue_total, 1);
        }
        TeamAnalyticsResult::Empty { .. } => panic!("Core has issues"),
    }

    match analytics.insights("Nonexistent") {
        TeamAnalyticsResult::Empty { team, message } => {
            assert_eq!(team, "Nonexistent");
            assert!(!message.is_empty());
        }
        TeamAnalyticsResult::Insights(_) => panic!("unknown team should be empty"),
    }
}

#[test]
fn test_weekly_report_from_fixture() {
    let issues = import_fixture();
    let roster = vec!["Core".to_string(), "Mobile".to_string(), "Ghost".to_string()];
    let rows = weekly_report(&issues, &roster, now());

    assert_eq!(rows.len(), 3);

    let core = &rows[0];
    assert_eq!(core.team, "Core");
    assert_eq!(core.resolved, 1);
    // ADIR-1001 missed its SLA, so nothing was closed on time.
    assert_eq!(core.sla_percentage, 0.0);

    let mobile = &rows[1];
    assert_eq!(mobile.new, 1);
    assert_eq!(mobile.reports_unresolved, 12);

    let ghost = &rows[2];
    assert_eq!(ghost.new + ghost.resolved + ghost.rejected, 0);
    assert_eq!(ghost.sla_percentage, 0.0);
}

// ============================================
// Persistence
// ============================================

#[test]
fn test_snapshot_store_roundtrip_across_reopen() {
    let temp = TempDir::new().expect("temp dir");
    let path = temp.path().join("snapshots.db");

    let issues = import_fixture();
    let snapshot = StatisticsSnapshot::compute(&IssueIndex::build(issues.clone()), 20);

    {
        let store = SnapshotStore::open(&path).expect("open");
        store.migrate().expect("migrate");
        store.put_json(keys::ISSUES, &issues).expect("put issues");
        store
            .put_json(keys::STATISTICS, &snapshot)
            .expect("put statistics");
        store
            .put_json(keys::IMPORT_HASH, &"abc123".to_string())
            .expect("put hash");
    }

    let store = SnapshotStore::open(&path).expect("reopen");
    store.migrate().expect("migrate");

    let loaded: Vec<Issue> = store
        .get_json(keys::ISSUES)
        .expect("get issues")
        .expect("issues present");
    assert_eq!(loaded, issues);

    let stats: StatisticsSnapshot = store
        .get_json(keys::STATISTICS)
        .expect("get statistics")
        .expect("statistics present");
    assert_eq!(stats.total, snapshot.total);
    assert_eq!(stats.status_by_month.len(), snapshot.status_by_month.len());

    let hash: String = store
        .get_json(keys::IMPORT_HASH)
        .expect("get hash")
        .expect("hash present");
    assert_eq!(hash, "abc123");
}
