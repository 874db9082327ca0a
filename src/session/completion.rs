//! Completion point aggregation

use std::collections::BTreeSet;

use crate::sim::EntityId;

/// Counts completion points reaching Done; reports the level as complete
/// exactly once.
#[derive(Debug, Clone, Default)]
pub struct CompletionTracker {
    total: usize,
    done: BTreeSet<EntityId>,
    completed: bool,
}

impl CompletionTracker {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            done: BTreeSet::new(),
            completed: false,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn done_count(&self) -> usize {
        self.done.len()
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// Record a Done notification. Returns true when this notification
    /// completes the level; duplicates never count twice.
    pub fn mark_done(&mut self, point: EntityId) -> bool {
        if self.completed || !self.done.insert(point) {
            return false;
        }
        self.check()
    }

    /// A level without completion points completes as soon as it starts
    pub fn check(&mut self) -> bool {
        if !self.completed && self.done.len() >= self.total {
            self.completed = true;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_done_counts_once() {
        let mut tracker = CompletionTracker::new(2);
        assert!(!tracker.mark_done(10));
        assert!(!tracker.mark_done(10));
        assert_eq!(tracker.done_count(), 1);
        assert!(tracker.mark_done(11));
        assert!(!tracker.mark_done(12));
        assert!(tracker.is_complete());
    }

    #[test]
    fn test_zero_points_completes_once() {
        let mut tracker = CompletionTracker::new(0);
        assert!(tracker.check());
        assert!(!tracker.check());
    }
}
