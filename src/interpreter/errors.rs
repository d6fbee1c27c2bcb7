//! Error types for interpretation
//!
//! Every error here is fatal to the run that raised it. A trace produced by a
//! failing run is discarded, so none of these are recovered locally.

use thiserror::Error;

use super::mode::RunMode;
use crate::ast::{BinaryOperator, IntegerType, NodeId, NodeKind, UnaryOperator};

/// Failures reported by the expression evaluator
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvaluationError {
    /// Identifier does not resolve in the supplied environment
    #[error("Undeclared identifier: {0}")]
    UndeclaredIdentifier(String),

    /// Variable exists but has no value yet
    #[error("Variable {0} read before initialization")]
    UninitializedVariable(String),

    /// Expression kind the evaluator does not implement
    #[error("Unsupported expression {kind} at {id}")]
    UnsupportedExpression { kind: &'static str, id: NodeId },

    /// Operator the evaluator does not implement
    #[error("Unsupported operator {operator}")]
    UnsupportedOperator { operator: BinaryOperator },

    /// Binary operands of incompatible types
    #[error("Type mismatch for {operator}: {left} and {right}")]
    TypeMismatch {
        operator: BinaryOperator,
        left: String,
        right: String,
    },

    /// Operand kind not accepted by a unary operator
    #[error("Invalid operand for {operator}: {operand}")]
    InvalidUnaryOperand {
        operator: UnaryOperator,
        operand: String,
    },

    /// Operand kind not accepted by a binary operator
    #[error("Invalid operand for {operator}: {operand}")]
    InvalidBinaryOperand {
        operator: BinaryOperator,
        operand: String,
    },

    /// Condition did not evaluate to a boolean
    #[error("Condition evaluated to non-boolean {0}")]
    NonBooleanCondition(String),

    /// Checked arithmetic left the range of the result type
    #[error("Arithmetic overflow in {operator} for {ty}")]
    Overflow { operator: String, ty: IntegerType },

    #[error("Division by zero in {operator}")]
    DivisionByZero { operator: BinaryOperator },

    /// Result exceeds the range the evaluator can represent for a wide type
    #[error("Result of {operator} for {ty} is not representable")]
    Unrepresentable { operator: String, ty: IntegerType },

    /// Integer literal or argument outside its declared type
    #[error("Value {value} out of range for {ty}")]
    OutOfRange { value: i128, ty: IntegerType },

    /// Batched evaluation was given no environment
    #[error("Evaluation produced no value")]
    EmptyResult,
}

/// Error variants that can occur while interpreting transactions
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InterpreterError {
    /// Node kind without an interpretation rule
    #[error("No interpretation rule for {kind} at {id}")]
    UnsupportedNode { kind: NodeKind, id: NodeId },

    /// Callback invoked on an interpreter running in a different mode
    #[error("Invalid call to {callback} in {mode} mode")]
    InvalidInvocation {
        callback: &'static str,
        mode: RunMode,
    },

    /// Storage variable without a usable initializer value
    #[error("Cannot initialize storage variable {variable}: {reason}")]
    EnvironmentInitialization { variable: String, reason: String },

    /// Failure surfaced unchanged from the expression evaluator
    #[error("Evaluation failed: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("No transactions to interpret")]
    NoTransactions,

    /// Transactions of one run must all target the same contract
    #[error("Transaction targets contract {found}, but the run is for {expected}")]
    MultipleContracts { expected: String, found: String },

    #[error("Contract not found: {0}")]
    UnknownContract(String),

    #[error("Function not found: {contract}.{function}")]
    UnknownFunction { contract: String, function: String },

    /// Transaction arguments do not match the function signature
    #[error("Argument mismatch for {function}: {reason}")]
    ArgumentMismatch { function: String, reason: String },

    /// Emitted event arguments do not match the event definition
    #[error("Event {event} declares {expected} arguments, but {found} were emitted")]
    EventArityMismatch {
        event: String,
        expected: usize,
        found: usize,
    },

    /// Emit statement whose call target does not name an event
    #[error("Emit statement at {0} does not name an event")]
    InvalidEmitTarget(NodeId),

    /// Call stack accessed while empty
    #[error("Call stack underflow during {op_name}")]
    CallStackUnderflow { op_name: String },

    /// Trace requested after the run that produced it failed
    #[error("Trace discarded after failed run")]
    TraceDiscarded,

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for InterpreterError {
    fn from(err: std::io::Error) -> Self {
        InterpreterError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for InterpreterError {
    fn from(err: serde_json::Error) -> Self {
        InterpreterError::Serialization(err.to_string())
    }
}
