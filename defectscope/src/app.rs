//! Application wiring: the reactive pipeline behind every command.
//!
//! Producers publish the issue collection into the state store; the
//! subscriptions registered here rebuild the index and statistics
//! snapshots whenever the issues actually change. Commands pump the
//! store and read the derived values back out.

use anyhow::{Context, Result};
use defectscope_core::store::keys;
use defectscope_core::{
    Config, Issue, IssueIndex, SnapshotStore, StateKey, StateStore, StatisticsSnapshot,
};
use std::rc::Rc;

pub struct App {
    pub state: Rc<StateStore>,
    pub snapshots: SnapshotStore,
}

impl App {
    /// Wire the pipeline: issues → index → statistics.
    pub fn new(snapshots: SnapshotStore, config: &Config) -> Self {
        let state = Rc::new(StateStore::new());

        let indexer = Rc::clone(&state);
        state.subscribe(StateKey::Issues, move |value| {
            let issues: Vec<Issue> = serde_json::from_value(value.clone())?;
            let index = IssueIndex::build(issues);
            indexer.set(StateKey::Index, serde_json::to_value(&index)?, "indexer");
            Ok(())
        });

        let top_limit = config.analytics.top_reported_limit;
        let aggregator = Rc::clone(&state);
        state.subscribe(StateKey::Index, move |value| {
            let index: IssueIndex = serde_json::from_value(value.clone())?;
            let snapshot = StatisticsSnapshot::compute(&index, top_limit);
            aggregator.set(
                StateKey::Statistics,
                serde_json::to_value(&snapshot)?,
                "aggregator",
            );
            Ok(())
        });

        Self { state, snapshots }
    }

    /// Publish an issue collection and run the pipeline to quiescence.
    pub fn publish_issues(&self, issues: &[Issue], origin: &str) -> Result<()> {
        self.state.set_state(
            vec![
                (StateKey::Issues, serde_json::to_value(issues)?),
                (StateKey::DataStatus, serde_json::json!("loaded")),
            ],
            origin,
        );
        self.state.flush();
        Ok(())
    }

    /// Load the persisted issue collection, if any.
    pub fn load_persisted(&self) -> Result<Option<Vec<Issue>>> {
        self.snapshots
            .get_json(keys::ISSUES)
            .context("failed to read persisted issues")
    }

    /// Persist the derived state for the next run.
    pub fn persist(&self) -> Result<()> {
        for (state_key, snapshot_key) in [
            (StateKey::Issues, keys::ISSUES),
            (StateKey::Index, keys::INDEX),
            (StateKey::Statistics, keys::STATISTICS),
        ] {
            if let Some(value) = self.state.get(state_key) {
                self.snapshots
                    .put_json(snapshot_key, &value)
                    .with_context(|| format!("failed to persist {}", snapshot_key))?;
            }
        }
        Ok(())
    }

    /// The statistics snapshot derived from the last publish.
    pub fn statistics(&self) -> Result<Option<StatisticsSnapshot>> {
        let Some(value) = self.state.get(StateKey::Statistics) else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_value(value)?))
    }

    /// The index derived from the last publish.
    pub fn index(&self) -> Result<Option<IssueIndex>> {
        let Some(value) = self.state.get(StateKey::Index) else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_value(value)?))
    }
}
