//! Node entry tracking and coverage

use std::collections::HashSet;

use crate::ast::NodeId;

/// Nodes entered during one call activation
#[derive(Debug, Clone, Default)]
pub struct Scope {
    entered: HashSet<NodeId>,
    active: Vec<NodeId>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node as entered; it stays active until left
    pub fn enter_node(&mut self, id: NodeId) {
        self.entered.insert(id);
        self.active.push(id);
    }

    /// Leave the innermost active node. Leaving anything else is ignored.
    pub fn leave_node(&mut self, id: NodeId) {
        if self.active.last() == Some(&id) {
            self.active.pop();
        }
    }

    pub fn has_entered(&self, id: NodeId) -> bool {
        self.entered.contains(&id)
    }

    /// Nodes currently being interpreted, outermost first
    pub fn active(&self) -> &[NodeId] {
        &self.active
    }

    pub fn entered_count(&self) -> usize {
        self.entered.len()
    }
}

/// Write-once coverage marks for the nodes visited during a run
#[derive(Debug, Clone, Default)]
pub struct Coverage {
    covered: HashSet<NodeId>,
}

impl Coverage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a node covered; returns true the first time
    pub fn mark(&mut self, id: NodeId) -> bool {
        self.covered.insert(id)
    }

    pub fn is_covered(&self, id: NodeId) -> bool {
        self.covered.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.covered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.covered.is_empty()
    }

    /// Covered node ids in ascending order
    pub fn covered_nodes(&self) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self.covered.iter().copied().collect();
        nodes.sort();
        nodes
    }
}
