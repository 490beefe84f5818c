//! Per-run bookkeeping: identity sets, the trigger frontier and collected records

use crate::dom::NodeId;
use crate::explore::scanner::ControlRecord;
use std::collections::{HashSet, VecDeque};

/// Identity-keyed sets of nodes already serialized and triggers already acted on.
/// Grows monotonically for the lifetime of one run.
#[derive(Debug, Default)]
pub struct DedupRegistry {
    visited: HashSet<NodeId>,
    activated: HashSet<NodeId>,
}

impl DedupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the node was not serialized before
    pub fn mark_visited(&mut self, node: NodeId) -> bool {
        self.visited.insert(node)
    }

    /// Returns true if the trigger was not activated before
    pub fn mark_activated(&mut self, node: NodeId) -> bool {
        self.activated.insert(node)
    }

    pub fn is_visited(&self, node: NodeId) -> bool {
        self.visited.contains(&node)
    }

    pub fn is_activated(&self, node: NodeId) -> bool {
        self.activated.contains(&node)
    }

    pub fn activated_count(&self) -> usize {
        self.activated.len()
    }
}

/// FIFO of triggers awaiting activation, in discovery order.
/// A trigger is queued at most once at a time.
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<NodeId>,
    queued: HashSet<NodeId>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a trigger unless it is already waiting
    pub fn push(&mut self, node: NodeId) -> bool {
        if !self.queued.insert(node) {
            return false;
        }
        self.queue.push_back(node);
        true
    }

    pub fn pop(&mut self) -> Option<NodeId> {
        let node = self.queue.pop_front()?;
        self.queued.remove(&node);
        Some(node)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.queued.contains(&node)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// State owned by a single run. Created fresh per invocation and dropped when
/// the run completes; only the records outlive it.
#[derive(Debug, Default)]
pub struct RunContext {
    pub registry: DedupRegistry,
    pub frontier: Frontier,
    pub records: Vec<ControlRecord>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a trigger unless it was already acted on or is already waiting
    pub fn enqueue(&mut self, node: NodeId) -> bool {
        if self.registry.is_activated(node) {
            return false;
        }
        self.frontier.push(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::DomTree;

    fn nodes(count: usize) -> Vec<NodeId> {
        let mut tree = DomTree::new("about:blank").unwrap();
        (0..count).map(|_| tree.create_element("button")).collect()
    }

    #[test]
    fn test_mark_is_idempotent() {
        let ids = nodes(2);
        let mut registry = DedupRegistry::new();

        assert!(registry.mark_visited(ids[0]));
        assert!(!registry.mark_visited(ids[0]));
        assert!(registry.mark_visited(ids[1]));
        assert!(!registry.is_activated(ids[0]));

        assert!(registry.mark_activated(ids[0]));
        assert!(!registry.mark_activated(ids[0]));
        assert_eq!(registry.activated_count(), 1);
    }

    #[test]
    fn test_frontier_is_fifo_without_duplicates() {
        let ids = nodes(3);
        let mut frontier = Frontier::new();

        assert!(frontier.push(ids[2]));
        assert!(frontier.push(ids[0]));
        assert!(!frontier.push(ids[2]));
        assert_eq!(frontier.len(), 2);

        assert_eq!(frontier.pop(), Some(ids[2]));
        assert!(!frontier.contains(ids[2]));
        assert!(frontier.push(ids[2]));
        assert_eq!(frontier.pop(), Some(ids[0]));
        assert_eq!(frontier.pop(), Some(ids[2]));
        assert!(frontier.is_empty());
    }

    #[test]
    fn test_enqueue_skips_activated() {
        let ids = nodes(1);
        let mut ctx = RunContext::new();
        ctx.registry.mark_activated(ids[0]);

        assert!(!ctx.enqueue(ids[0]));
        assert!(ctx.frontier.is_empty());
    }
}
