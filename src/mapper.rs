//! Bounded bidirectional map between devtools action indices and
//! time-travel snapshot indices.
//!
//! Mirrors `TimeTravel`'s `HistoryBuffer` (same bounded-ring-with-eviction
//! shape) so the debug bridge can translate a Redux-DevTools
//! `JUMP_TO_ACTION { actionId }` into a snapshot index without keeping
//! every action around forever. The bridge calls `shift_left` whenever
//! the history buffer it mirrors evicts its own oldest entry, so the two
//! stay in step regardless of how their capacities compare.

use std::collections::HashMap;

/// Maps devtools action ids to history snapshot indices and back. When
/// full, the oldest mapping is evicted first (matching the history
/// buffer it mirrors, so the two stay in step).
pub struct ActionSnapshotMapper {
    capacity: usize,
    action_to_snapshot: HashMap<u64, usize>,
    snapshot_to_action: HashMap<usize, u64>,
    order: std::collections::VecDeque<u64>,
}

impl ActionSnapshotMapper {
    pub fn new(capacity: usize) -> Self {
        ActionSnapshotMapper {
            capacity: capacity.max(1),
            action_to_snapshot: HashMap::new(),
            snapshot_to_action: HashMap::new(),
            order: std::collections::VecDeque::new(),
        }
    }

    pub fn insert(&mut self, action_id: u64, snapshot_index: usize) {
        if self.order.len() == self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.action_to_snapshot.remove(&evicted);
                self.snapshot_to_action.retain(|_, a| *a != evicted);
            }
        }
        self.action_to_snapshot.insert(action_id, snapshot_index);
        self.snapshot_to_action.insert(snapshot_index, action_id);
        self.order.push_back(action_id);
    }

    pub fn snapshot_for_action(&self, action_id: u64) -> Option<usize> {
        self.action_to_snapshot.get(&action_id).copied()
    }

    pub fn action_for_snapshot(&self, snapshot_index: usize) -> Option<u64> {
        self.snapshot_to_action.get(&snapshot_index).copied()
    }

    /// Shift every snapshot index down by one, e.g. after the history
    /// buffer it mirrors evicts its oldest entry. Entries landing below
    /// zero are dropped.
    pub fn shift_left(&mut self) {
        let mut next_snapshot_to_action = HashMap::new();
        for (&snapshot, &action) in self.snapshot_to_action.iter() {
            if snapshot == 0 {
                self.action_to_snapshot.remove(&action);
                continue;
            }
            next_snapshot_to_action.insert(snapshot - 1, action);
            self.action_to_snapshot.insert(action, snapshot - 1);
        }
        self.snapshot_to_action = next_snapshot_to_action;
    }

    pub fn clear(&mut self) {
        self.action_to_snapshot.clear();
        self.snapshot_to_action.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_lookup_both_directions() {
        let mut mapper = ActionSnapshotMapper::new(10);
        mapper.insert(1, 0);
        mapper.insert(2, 1);
        assert_eq!(mapper.snapshot_for_action(2), Some(1));
        assert_eq!(mapper.action_for_snapshot(1), Some(2));
    }

    #[test]
    fn test_eviction_drops_oldest_mapping() {
        let mut mapper = ActionSnapshotMapper::new(2);
        mapper.insert(1, 0);
        mapper.insert(2, 1);
        mapper.insert(3, 2);
        assert_eq!(mapper.snapshot_for_action(1), None);
        assert_eq!(mapper.snapshot_for_action(3), Some(2));
        assert_eq!(mapper.len(), 2);
    }

    #[test]
    fn test_shift_left_drops_zero_and_decrements_rest() {
        let mut mapper = ActionSnapshotMapper::new(10);
        mapper.insert(1, 0);
        mapper.insert(2, 1);
        mapper.insert(3, 2);
        mapper.shift_left();
        assert_eq!(mapper.snapshot_for_action(1), None);
        assert_eq!(mapper.snapshot_for_action(2), Some(0));
        assert_eq!(mapper.snapshot_for_action(3), Some(1));
    }
}
