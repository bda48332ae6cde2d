//! Session-scoped log of simulation results.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::simulation::SimulationResult;

/// Number of entries shown in the history table.
pub const DEFAULT_VIEW_LEN: usize = 5;

/// Append-only, insertion-ordered log of the runs made in one session.
///
/// The log itself is unbounded. Reads for display go through
/// [`HistoryStore::recent_view`], which caps what is returned without
/// dropping anything from the log.
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    entries: Vec<SimulationResult>,
}

impl HistoryStore {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a result as the most recent entry.
    pub fn append(&mut self, result: SimulationResult) {
        self.entries.push(result);
        debug!(len = self.entries.len(), "history entry appended");
    }

    /// Returns the last `k` entries, oldest first.
    #[must_use]
    pub fn recent_view(&self, k: usize) -> &[SimulationResult] {
        let start = self.entries.len().saturating_sub(k);
        &self.entries[start..]
    }

    /// Returns the default display window of [`DEFAULT_VIEW_LEN`] entries.
    #[must_use]
    pub fn recent(&self) -> &[SimulationResult] {
        self.recent_view(DEFAULT_VIEW_LEN)
    }

    /// The most recent entry, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&SimulationResult> {
        self.entries.last()
    }

    /// Copies the full log.
    #[must_use]
    pub fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot(self.entries.clone())
    }

    /// Number of entries in the log.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been appended yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Immutable copy of a session's full history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistorySnapshot(Vec<SimulationResult>);

impl HistorySnapshot {
    /// Entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[SimulationResult] {
        &self.0
    }

    /// Iterates entries, oldest first.
    pub fn iter(&self) -> std::slice::Iter<'_, SimulationResult> {
        self.0.iter()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no run was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consumes the snapshot, returning its entries.
    #[must_use]
    pub fn into_vec(self) -> Vec<SimulationResult> {
        self.0
    }
}

impl From<Vec<SimulationResult>> for HistorySnapshot {
    fn from(entries: Vec<SimulationResult>) -> Self {
        Self(entries)
    }
}

impl<'a> IntoIterator for &'a HistorySnapshot {
    type Item = &'a SimulationResult;
    type IntoIter = std::slice::Iter<'a, SimulationResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::EnvironmentalInput;
    use crate::simulation::simulate;

    fn run(temperature: i32) -> SimulationResult {
        simulate(&EnvironmentalInput::new(temperature, 40, true))
    }

    #[test]
    fn test_empty_store() {
        let store = HistoryStore::new();
        assert!(store.is_empty());
        assert!(store.recent().is_empty());
        assert!(store.latest().is_none());
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_recent_view_returns_fewer_when_short() {
        let mut store = HistoryStore::new();
        store.append(run(20));
        store.append(run(25));

        let view = store.recent_view(5);
        assert_eq!(view.len(), 2);
        assert_eq!(view[0].temperature, 20);
        assert_eq!(view[1].temperature, 25);
    }

    #[test]
    fn test_recent_view_keeps_last_entries_in_order() {
        let mut store = HistoryStore::new();
        for t in 20..=40 {
            store.append(run(t));
        }

        let temps: Vec<i32> = store.recent().iter().map(|r| r.temperature).collect();
        assert_eq!(temps, vec![36, 37, 38, 39, 40]);

        // The log itself is not truncated
        assert_eq!(store.len(), 21);
        assert_eq!(store.snapshot().entries()[0].temperature, 20);
    }

    #[test]
    fn test_recent_view_zero() {
        let mut store = HistoryStore::new();
        store.append(run(30));
        assert!(store.recent_view(0).is_empty());
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut store = HistoryStore::new();
        store.append(run(30));
        let snapshot = store.snapshot();

        store.append(run(35));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.len(), 2);
    }
}
