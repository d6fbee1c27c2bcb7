pub mod ast;
pub mod config;
pub mod interpreter;
pub mod trace;

pub use crate::ast::{AstBuilder, NodeId, NodeKind, NodeRef, SourceUnit};
pub use crate::config::{ConfigError, InterpreterConfig};
pub use crate::interpreter::{
    Callback, ErrorPolicy, FullInterpreter, InterpreterError, Program, RunMode, Transaction,
    TransactionRunner, Value,
};
pub use crate::trace::{EmittedEvent, TraceSink};
