//! Call stack of function activations

use std::fmt;

use super::errors::InterpreterError;
use super::scope::Scope;
use super::values::Value;
use super::variables::VariableEnvironment;
use crate::ast::{ContractDefinition, FunctionDefinition};

/// One function activation
#[derive(Debug)]
pub struct StackFrame<'a> {
    contract: &'a ContractDefinition,
    function: &'a FunctionDefinition,
    arguments: Vec<Value>,
    scope: Scope,
    locals: VariableEnvironment,
}

impl<'a> StackFrame<'a> {
    pub fn new(
        contract: &'a ContractDefinition,
        function: &'a FunctionDefinition,
        arguments: Vec<Value>,
        locals: VariableEnvironment,
    ) -> Self {
        Self {
            contract,
            function,
            arguments,
            scope: Scope::new(),
            locals,
        }
    }

    pub fn contract(&self) -> &'a ContractDefinition {
        self.contract
    }

    pub fn function(&self) -> &'a FunctionDefinition {
        self.function
    }

    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn scope_mut(&mut self) -> &mut Scope {
        &mut self.scope
    }

    pub fn locals(&self) -> &VariableEnvironment {
        &self.locals
    }
}

/// Stack of active calls; the last frame is the current one
#[derive(Debug, Default)]
pub struct CallStack<'a> {
    frames: Vec<StackFrame<'a>>,
}

impl<'a> CallStack<'a> {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    pub fn push(&mut self, frame: StackFrame<'a>) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self, op_name: &str) -> Result<StackFrame<'a>, InterpreterError> {
        self.frames
            .pop()
            .ok_or_else(|| InterpreterError::CallStackUnderflow {
                op_name: op_name.to_string(),
            })
    }

    pub fn current(&self, op_name: &str) -> Result<&StackFrame<'a>, InterpreterError> {
        self.frames
            .last()
            .ok_or_else(|| InterpreterError::CallStackUnderflow {
                op_name: op_name.to_string(),
            })
    }

    pub fn current_mut(&mut self, op_name: &str) -> Result<&mut StackFrame<'a>, InterpreterError> {
        self.frames
            .last_mut()
            .ok_or_else(|| InterpreterError::CallStackUnderflow {
                op_name: op_name.to_string(),
            })
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Format the call stack as a string for display
    pub fn format_call_stack(&self) -> String {
        if self.frames.is_empty() {
            return "Call Stack: []".to_string();
        }

        let mut result = "Call Stack: [\n".to_string();
        for (i, frame) in self.frames.iter().enumerate() {
            let arguments: Vec<String> = frame.arguments.iter().map(|a| a.to_string()).collect();
            result.push_str(&format!(
                "  {}. {}.{}({})\n",
                i,
                frame.contract.name,
                frame.function.name,
                arguments.join(", ")
            ));
        }
        result.push(']');
        result
    }
}

impl fmt::Display for CallStack<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_call_stack())
    }
}
