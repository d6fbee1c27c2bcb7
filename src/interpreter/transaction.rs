//! Transactions and program files

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::errors::InterpreterError;
use super::values::Value;
use crate::ast::SourceUnit;

/// One simulated call into a contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub contract: String,
    pub function: String,
    /// Already evaluated arguments, in parameter order
    #[serde(default)]
    pub arguments: Vec<Value>,
}

impl Transaction {
    pub fn new(contract: &str, function: &str, arguments: Vec<Value>) -> Self {
        Self {
            contract: contract.to_string(),
            function: function.to_string(),
            arguments,
        }
    }
}

/// A contract AST together with the transactions to run against it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub ast: SourceUnit,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl Program {
    pub fn from_json_str(source: &str) -> Result<Self, InterpreterError> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn load(path: &Path) -> Result<Self, InterpreterError> {
        let source = fs::read_to_string(path).map_err(|err| {
            InterpreterError::Io(format!("Failed to read {}: {}", path.display(), err))
        })?;
        Self::from_json_str(&source)
    }
}
