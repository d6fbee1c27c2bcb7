//! Reference interpreter
//!
//! The interpreter is organized into submodules:
//!
//! - `values`: results of expression evaluation
//! - `variables`: storage and local variable environments
//! - `scope`: per-frame node entry tracking and run-wide coverage
//! - `stack`: call frames
//! - `evaluator`: expression evaluation and the arithmetic error policy
//! - `mode`: run modes and the callback surface shared with per-node analyses
//! - `transaction`: transaction and program inputs
//! - `full`: transaction-driven interpretation

pub mod errors;
pub mod evaluator;
pub mod full;
pub mod mode;
pub mod scope;
pub mod stack;
pub mod transaction;
pub mod values;
pub mod variables;

pub use errors::{EvaluationError, InterpreterError};
pub use evaluator::{ErrorHandler, ErrorPolicy, EvaluationResults, ExpressionEvaluator};
pub use full::FullInterpreter;
pub use mode::{Callback, NodeVisitor, RunMode, TransactionRunner};
pub use scope::{Coverage, Scope};
pub use stack::{CallStack, StackFrame};
pub use transaction::{Program, Transaction};
pub use values::{IntegerValue, Value};
pub use variables::{Environment, LayeredEnvironment, Variable, VariableEnvironment, VariableValues};
