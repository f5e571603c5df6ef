//! Bounded, linear undo/redo history of node-collection snapshots.
//!
//! Each entry is a full deep copy of the node collection. Recording a new
//! entry truncates the redo tail; the oldest entry is evicted once the
//! capacity is exceeded. Restores hand out fresh copies, so live state never
//! aliases an entry.

use board_core::Node;
use std::time::SystemTime;

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub nodes: Vec<Node>,
    pub timestamp: SystemTime,
}

pub struct History {
    entries: Vec<HistoryEntry>,
    index: usize,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Vec::with_capacity(capacity),
            index: 0,
            capacity,
        }
    }

    /// Drop everything and start over from `nodes`.
    pub fn reset(&mut self, nodes: &[Node]) {
        self.entries.clear();
        self.index = 0;
        self.record(nodes);
    }

    /// Append a snapshot of `nodes` after the current entry.
    pub fn record(&mut self, nodes: &[Node]) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.index + 1);
        }
        self.entries.push(HistoryEntry {
            nodes: nodes.to_vec(),
            timestamp: SystemTime::now(),
        });
        if self.entries.len() > self.capacity {
            self.entries.remove(0);
        }
        self.index = self.entries.len() - 1;
    }

    /// Step back one entry and return a copy of its nodes.
    pub fn undo(&mut self) -> Option<Vec<Node>> {
        if self.index == 0 || self.entries.is_empty() {
            return None;
        }
        self.index -= 1;
        Some(self.entries[self.index].nodes.clone())
    }

    /// Step forward one entry and return a copy of its nodes.
    pub fn redo(&mut self) -> Option<Vec<Node>> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        Some(self.entries[self.index].nodes.clone())
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.entries.get(self.index)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use board_core::{Geometry, NodeDraft, NodeId};

    fn nodes(n: usize) -> Vec<Node> {
        (0..n)
            .map(|i| {
                NodeDraft::text(format!("n{i}"), Geometry::new(i as f64, 0.0, 10.0, 10.0))
                    .into_node(NodeId::intern(&format!("h{i}")), i as i64)
            })
            .collect()
    }

    #[test]
    fn undo_at_start_is_noop() {
        let mut h = History::new(50);
        h.reset(&[]);
        assert!(h.undo().is_none());
        assert!(h.redo().is_none());
        assert_eq!(h.index(), 0);
    }

    #[test]
    fn undo_redo_walk_entries() {
        let mut h = History::new(50);
        h.reset(&nodes(0));
        h.record(&nodes(1));
        h.record(&nodes(2));
        assert_eq!(h.undo().unwrap().len(), 1);
        assert_eq!(h.undo().unwrap().len(), 0);
        assert!(h.undo().is_none());
        assert_eq!(h.redo().unwrap().len(), 1);
        assert!(h.can_redo());
    }

    #[test]
    fn record_truncates_redo_tail() {
        let mut h = History::new(50);
        h.reset(&nodes(0));
        h.record(&nodes(1));
        h.record(&nodes(2));
        h.undo();
        h.undo();
        h.record(&nodes(3));
        assert_eq!(h.len(), 2);
        assert!(!h.can_redo());
        assert_eq!(h.current().unwrap().nodes.len(), 3);
    }

    #[test]
    fn capacity_evicts_oldest() {
        let mut h = History::new(3);
        h.reset(&nodes(0));
        for i in 1..=5 {
            h.record(&nodes(i));
        }
        assert_eq!(h.len(), 3);
        assert_eq!(h.index(), 2);
        assert_eq!(h.undo().unwrap().len(), 4);
        assert_eq!(h.undo().unwrap().len(), 3);
        assert!(h.undo().is_none());
    }

    #[test]
    fn restored_nodes_do_not_alias_entries() {
        let mut h = History::new(50);
        h.reset(&nodes(1));
        h.record(&nodes(2));
        let mut restored = h.undo().unwrap();
        restored[0].geometry.x = 999.0;
        assert_eq!(h.current().unwrap().nodes[0].geometry.x, 0.0);
    }
}
