//! Issue index construction
//!
//! An [`IssueIndex`] is a read-only lookup view over one dataset snapshot:
//! by id, by type, by team, and by state. It is rebuilt wholesale whenever
//! the issue collection changes and never mutated incrementally; consumers
//! treat it as immutable.
//!
//! Construction is deterministic: the same input list yields the same
//! index, and the per-type/per-team lists mirror input order (no sorting
//! happens at this stage). No issue is dropped — an issue without a team
//! is simply absent from the team lookup.

use crate::types::{DateRange, Issue, IssueState, IssueType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Partition of issue positions by derived state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatePartition {
    resolved: Vec<usize>,
    unresolved: Vec<usize>,
    rejected: Vec<usize>,
}

impl StatePartition {
    fn bucket_mut(&mut self, state: IssueState) -> &mut Vec<usize> {
        match state {
            IssueState::Resolved => &mut self.resolved,
            IssueState::Unresolved => &mut self.unresolved,
            IssueState::Rejected => &mut self.rejected,
        }
    }

    fn bucket(&self, state: IssueState) -> &[usize] {
        match state {
            IssueState::Resolved => &self.resolved,
            IssueState::Unresolved => &self.unresolved,
            IssueState::Rejected => &self.rejected,
        }
    }
}

/// Read-only lookup structures over one issue collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueIndex {
    issues: Vec<Issue>,
    by_id: HashMap<String, usize>,
    by_type: HashMap<IssueType, Vec<usize>>,
    by_team: HashMap<String, Vec<usize>>,
    by_state: StatePartition,
}

impl IssueIndex {
    /// Build the index for a dataset snapshot.
    ///
    /// Duplicate ids keep the last occurrence in `by_id` (with a warning);
    /// both occurrences stay in the positional lists.
    pub fn build(issues: Vec<Issue>) -> Self {
        let mut index = IssueIndex {
            by_id: HashMap::with_capacity(issues.len()),
            ..Default::default()
        };

        for (pos, issue) in issues.iter().enumerate() {
            if let Some(previous) = index.by_id.insert(issue.id.clone(), pos) {
                tracing::warn!(
                    id = %issue.id,
                    first_row = previous,
                    "Duplicate issue id, keeping the later occurrence"
                );
            }
            index.by_type.entry(issue.issue_type).or_default().push(pos);
            if let Some(team) = &issue.team {
                index.by_team.entry(team.clone()).or_default().push(pos);
            }
            index.by_state.bucket_mut(issue.state).push(pos);
        }

        index.issues = issues;

        tracing::debug!(
            issues = index.issues.len(),
            teams = index.by_team.len(),
            "Issue index built"
        );

        index
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// All issues in input order.
    pub fn all(&self) -> &[Issue] {
        &self.issues
    }

    /// Look up one issue by key.
    pub fn get(&self, id: &str) -> Option<&Issue> {
        self.by_id.get(id).map(|&pos| &self.issues[pos])
    }

    /// Issues of one type, in input order.
    pub fn of_type(&self, issue_type: IssueType) -> Vec<&Issue> {
        self.resolve(self.by_type.get(&issue_type).map(Vec::as_slice))
    }

    /// Issues belonging to one team, in input order.
    pub fn team(&self, team: &str) -> Vec<&Issue> {
        self.resolve(self.by_team.get(team).map(Vec::as_slice))
    }

    /// Issues in one derived state, in input order.
    pub fn in_state(&self, state: IssueState) -> Vec<&Issue> {
        self.resolve(Some(self.by_state.bucket(state)))
    }

    /// Count of issues in one derived state.
    pub fn state_count(&self, state: IssueState) -> usize {
        self.by_state.bucket(state).len()
    }

    /// All team names present in the dataset, sorted.
    pub fn teams(&self) -> Vec<&str> {
        let mut teams: Vec<&str> = self.by_team.keys().map(String::as_str).collect();
        teams.sort_unstable();
        teams
    }

    /// Issues created within the given range, in input order.
    pub fn created_in(&self, range: &DateRange) -> Vec<&Issue> {
        self.issues
            .iter()
            .filter(|issue| range.contains(issue.created))
            .collect()
    }

    /// Issues resolved within the given range, in input order.
    pub fn resolved_in(&self, range: &DateRange) -> Vec<&Issue> {
        self.issues
            .iter()
            .filter(|issue| issue.resolved.map(|r| range.contains(r)).unwrap_or(false))
            .collect()
    }

    fn resolve(&self, positions: Option<&[usize]>) -> Vec<&Issue> {
        positions
            .unwrap_or(&[])
            .iter()
            .map(|&pos| &self.issues[pos])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IssueState;
    use chrono::{DateTime, Utc};

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().expect("test timestamp")
    }

    fn issue(id: &str, team: Option<&str>, state: IssueState, created: &str) -> Issue {
        Issue {
            id: id.to_string(),
            issue_type: IssueType::Defect,
            team: team.map(String::from),
            status: String::new(),
            state,
            priority: None,
            created: ts(created),
            resolved: state.is_closed().then(|| ts("2024-06-01T00:00:00Z")),
            sla_date: None,
            reports: 0,
            summary: String::new(),
            description: String::new(),
            assignee: None,
            reporter: None,
        }
    }

    fn sample() -> Vec<Issue> {
        vec![
            issue("A-1", Some("Core"), IssueState::Resolved, "2024-01-01T00:00:00Z"),
            issue("A-2", Some("Mobile"), IssueState::Unresolved, "2024-02-01T00:00:00Z"),
            issue("A-3", Some("Core"), IssueState::Rejected, "2024-03-01T00:00:00Z"),
            issue("A-4", None, IssueState::Unresolved, "2024-04-01T00:00:00Z"),
        ]
    }

    #[test]
    fn test_build_preserves_order_and_counts() {
        let index = IssueIndex::build(sample());

        assert_eq!(index.len(), 4);
        assert_eq!(index.of_type(IssueType::Defect).len(), 4);
        assert_eq!(index.of_type(IssueType::Request).len(), 0);

        let core: Vec<&str> = index.team("Core").iter().map(|i| i.id.as_str()).collect();
        assert_eq!(core, vec!["A-1", "A-3"]);

        assert_eq!(index.state_count(IssueState::Unresolved), 2);
        assert_eq!(index.state_count(IssueState::Resolved), 1);
        assert_eq!(index.state_count(IssueState::Rejected), 1);
    }

    #[test]
    fn test_type_lists_conserve_all_issues() {
        let index = IssueIndex::build(sample());
        let total: usize = [IssueType::Defect, IssueType::Request]
            .iter()
            .map(|&t| index.of_type(t).len())
            .sum();
        assert_eq!(total, index.len());
    }

    #[test]
    fn test_build_is_deterministic() {
        let a = IssueIndex::build(sample());
        let b = IssueIndex::build(sample());
        assert_eq!(
            serde_json::to_value(&a).unwrap()["issues"],
            serde_json::to_value(&b).unwrap()["issues"]
        );
        assert_eq!(a.teams(), b.teams());
        assert_eq!(a.get("A-2").map(|i| &i.id), b.get("A-2").map(|i| &i.id));
    }

    #[test]
    fn test_teamless_issue_absent_from_team_lookup() {
        let index = IssueIndex::build(sample());
        assert_eq!(index.teams(), vec!["Core", "Mobile"]);
        assert!(index.get("A-4").is_some());
        let listed: usize = index.teams().iter().map(|t| index.team(t).len()).sum();
        assert_eq!(listed, 3);
    }

    #[test]
    fn test_duplicate_id_keeps_last() {
        let mut issues = sample();
        issues.push(issue("A-1", Some("Web"), IssueState::Unresolved, "2024-05-01T00:00:00Z"));
        let index = IssueIndex::build(issues);
        assert_eq!(index.get("A-1").unwrap().team.as_deref(), Some("Web"));
        assert_eq!(index.len(), 5);
    }

    #[test]
    fn test_created_in_range() {
        let index = IssueIndex::build(sample());
        let range = DateRange::new(ts("2024-01-15T00:00:00Z"), ts("2024-03-15T00:00:00Z"));
        let ids: Vec<&str> = index.created_in(&range).iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["A-2", "A-3"]);
    }
}
