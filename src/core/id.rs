//! Node identifiers.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier of a node within one scene.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    /// Get the raw ID value.
    #[inline]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Sequential ID source owned by a scene. No process-wide counter.
#[derive(Debug, Default)]
pub struct IdGenerator {
    counter: AtomicU64,
}

impl IdGenerator {
    /// Create a new generator starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate the next ID.
    pub fn next_id(&self) -> NodeId {
        NodeId(self.counter.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_ids() {
        let gen = IdGenerator::new();
        assert_eq!(gen.next_id().value(), 0);
        assert_eq!(gen.next_id().value(), 1);
    }

    #[test]
    fn test_generators_are_independent() {
        let a = IdGenerator::new();
        let b = IdGenerator::new();
        assert_eq!(a.next_id(), b.next_id());
    }
}
