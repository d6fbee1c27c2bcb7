//! Interpretation modes and their capability traits
//!
//! Whole-transaction interpretation and per-node navigation are separate
//! capabilities. Code that knows which one it holds talks to the trait
//! directly; code that selects a mode at runtime goes through `Callback`, the
//! one place where a call into the wrong mode is rejected with
//! `InvalidInvocation`.

use std::fmt;

use super::errors::InterpreterError;
use crate::ast::{NodeId, NodeRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunMode {
    /// Control is passed per transaction
    FullInterpretation,
    /// Control is passed per node while an external walker navigates the tree
    PerNode,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::FullInterpretation => write!(f, "full-interpretation"),
            RunMode::PerNode => write!(f, "per-node"),
        }
    }
}

/// Interpreter that receives control once per run of transactions
pub trait TransactionRunner {
    /// Interpret every transaction of the run in order
    fn run(&mut self) -> Result<(), InterpreterError>;

    /// Write the results of the run
    fn finish(&mut self) -> Result<(), InterpreterError>;
}

/// Interpreter that receives control for every node an external walker visits
pub trait NodeVisitor {
    fn visit_node_before_processing(&mut self, node: NodeRef<'_>) -> Result<(), InterpreterError>;

    fn visit_node_after_processing(&mut self, node: NodeRef<'_>) -> Result<(), InterpreterError>;

    /// Statement the walker should move to next, if the visitor wants to steer
    fn next_target_statement(&mut self) -> Result<Option<NodeId>, InterpreterError>;

    fn finish(&mut self) -> Result<(), InterpreterError>;
}

/// Interpreter handle whose mode is only known at runtime
pub enum Callback<'c> {
    Full(&'c mut dyn TransactionRunner),
    PerNode(&'c mut dyn NodeVisitor),
}

impl<'c> Callback<'c> {
    pub fn mode(&self) -> RunMode {
        match self {
            Callback::Full(_) => RunMode::FullInterpretation,
            Callback::PerNode(_) => RunMode::PerNode,
        }
    }

    fn invalid(&self, callback: &'static str) -> InterpreterError {
        InterpreterError::InvalidInvocation {
            callback,
            mode: self.mode(),
        }
    }

    pub fn run(&mut self) -> Result<(), InterpreterError> {
        match self {
            Callback::Full(runner) => runner.run(),
            Callback::PerNode(_) => Err(self.invalid("run")),
        }
    }

    pub fn visit_node_before_processing(
        &mut self,
        node: NodeRef<'_>,
    ) -> Result<(), InterpreterError> {
        match self {
            Callback::PerNode(visitor) => visitor.visit_node_before_processing(node),
            Callback::Full(_) => Err(self.invalid("visit_node_before_processing")),
        }
    }

    pub fn visit_node_after_processing(
        &mut self,
        node: NodeRef<'_>,
    ) -> Result<(), InterpreterError> {
        match self {
            Callback::PerNode(visitor) => visitor.visit_node_after_processing(node),
            Callback::Full(_) => Err(self.invalid("visit_node_after_processing")),
        }
    }

    pub fn next_target_statement(&mut self) -> Result<Option<NodeId>, InterpreterError> {
        match self {
            Callback::PerNode(visitor) => visitor.next_target_statement(),
            Callback::Full(_) => Err(self.invalid("next_target_statement")),
        }
    }

    pub fn finish(&mut self) -> Result<(), InterpreterError> {
        match self {
            Callback::Full(runner) => runner.finish(),
            Callback::PerNode(visitor) => visitor.finish(),
        }
    }
}
