//! Transaction-driven interpreter
//!
//! `FullInterpreter` executes a contract's AST directly. It seeds contract
//! storage once per run, then interprets every transaction in order by pushing
//! a frame for the called function and dispatching on the function's nodes
//! depth-first. Emitted events are collected into a `TraceSink` that becomes
//! the reference trace for the run.
//!
//! A run either completes and produces a full trace, or stops at the first
//! error and produces none.

use log::{debug, info, trace, warn};
use std::io::Write;

use super::errors::InterpreterError;
use super::evaluator::{ErrorHandler, ExpressionEvaluator};
use super::mode::TransactionRunner;
use super::scope::Coverage;
use super::stack::{CallStack, StackFrame};
use super::transaction::Transaction;
use super::values::Value;
use super::variables::{LayeredEnvironment, Variable, VariableEnvironment, VariableValues};
use crate::ast::{
    ContractDefinition, EmitStatement, Expression, FunctionDefinition, NodeRef, SourceUnit,
    Statement,
};
use crate::config::InterpreterConfig;
use crate::trace::{EmittedEvent, TraceSink};

/// Interpreter for whole runs of transactions against one contract
#[derive(Debug)]
pub struct FullInterpreter<'a> {
    ast: &'a SourceUnit,
    transactions: &'a [Transaction],
    config: InterpreterConfig,
    evaluator: ExpressionEvaluator,
    call_stack: CallStack<'a>,
    /// Contract storage; seeded once `storage_contract` is set
    storage: VariableEnvironment,
    storage_contract: Option<&'a ContractDefinition>,
    coverage: Coverage,
    trace: TraceSink,
    failed: bool,
}

impl<'a> FullInterpreter<'a> {
    pub fn new(
        ast: &'a SourceUnit,
        transactions: &'a [Transaction],
        config: InterpreterConfig,
    ) -> Self {
        let handler = ErrorHandler::new(config.error_policy, config.random_seed);
        Self {
            ast,
            transactions,
            config,
            evaluator: ExpressionEvaluator::new(handler),
            call_stack: CallStack::new(),
            storage: VariableEnvironment::global(),
            storage_contract: None,
            coverage: Coverage::new(),
            trace: TraceSink::new(),
            failed: false,
        }
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    /// Nodes visited so far, across all transactions
    pub fn coverage(&self) -> &Coverage {
        &self.coverage
    }

    pub fn trace(&self) -> &TraceSink {
        &self.trace
    }

    /// Contract storage, empty until the first transaction targets a contract
    pub fn global_environment(&self) -> &VariableEnvironment {
        &self.storage
    }

    pub fn call_stack_depth(&self) -> usize {
        self.call_stack.depth()
    }

    pub fn has_failed(&self) -> bool {
        self.failed
    }

    /// Interpret every transaction in order
    ///
    /// On failure the trace collected so far is discarded and the first error
    /// is returned.
    pub fn run(&mut self) -> Result<(), InterpreterError> {
        self.trace = TraceSink::new();
        self.failed = false;

        match self.run_transactions() {
            Ok(()) => {
                info!(
                    "Interpreted {} transactions, {} events emitted",
                    self.transactions.len(),
                    self.trace.len()
                );
                Ok(())
            }
            Err(err) => {
                warn!("Run aborted: {}", err);
                self.trace.discard();
                self.failed = true;
                Err(err)
            }
        }
    }

    fn run_transactions(&mut self) -> Result<(), InterpreterError> {
        let transactions = self.transactions;
        let first = transactions.first().ok_or(InterpreterError::NoTransactions)?;

        if let Some(other) = transactions.iter().find(|tx| tx.contract != first.contract) {
            return Err(InterpreterError::MultipleContracts {
                expected: first.contract.clone(),
                found: other.contract.clone(),
            });
        }

        let contract = self.resolve_contract(&first.contract)?;
        self.initialize_global_environment(contract)?;

        for (index, transaction) in transactions.iter().enumerate() {
            match self.interpret_transaction(transaction)? {
                Some(value) => debug!(
                    "Transaction {} {}.{} returned {}",
                    index, transaction.contract, transaction.function, value
                ),
                None => debug!(
                    "Transaction {} {}.{} returned nothing",
                    index, transaction.contract, transaction.function
                ),
            }
        }
        Ok(())
    }

    fn resolve_contract(&self, name: &str) -> Result<&'a ContractDefinition, InterpreterError> {
        let ast: &'a SourceUnit = self.ast;
        ast.contract(name)
            .ok_or_else(|| InterpreterError::UnknownContract(name.to_string()))
    }

    /// Seed contract storage from the declared initializer values
    pub fn initialize_global_environment(
        &mut self,
        contract: &'a ContractDefinition,
    ) -> Result<(), InterpreterError> {
        let mut storage = VariableEnvironment::global();

        for declaration in &contract.variables {
            let value = declaration.initializer_value.as_ref().ok_or_else(|| {
                InterpreterError::EnvironmentInitialization {
                    variable: declaration.name.clone(),
                    reason: "no initializer value".to_string(),
                }
            })?;

            if !value.matches_type(&declaration.type_name) {
                return Err(InterpreterError::EnvironmentInitialization {
                    variable: declaration.name.clone(),
                    reason: format!(
                        "initializer {} of type {} does not fit {}",
                        value,
                        value.type_label(),
                        declaration.type_name
                    ),
                });
            }

            let mut values = VariableValues::new(Variable::from_declaration(declaration), 0);
            values.add_value(value.clone());
            storage.add_variable_values(values);
            trace!("storage {} = {}", declaration.name, value);
        }

        debug!("Initialized storage of {}\n{}", contract.name, storage);
        self.storage = storage;
        self.storage_contract = Some(contract);
        Ok(())
    }

    /// Interpret one transaction and return the called function's result
    ///
    /// The frame pushed for the call is popped again whether or not
    /// interpretation succeeds. Events are only added to the trace when the
    /// transaction completes.
    pub fn interpret_transaction(
        &mut self,
        transaction: &Transaction,
    ) -> Result<Option<Value>, InterpreterError> {
        let contract = self.resolve_contract(&transaction.contract)?;
        let function = contract.function(&transaction.function).ok_or_else(|| {
            InterpreterError::UnknownFunction {
                contract: contract.name.clone(),
                function: transaction.function.clone(),
            }
        })?;
        check_arguments(function, &transaction.arguments)?;

        match self.storage_contract {
            None => self.initialize_global_environment(contract)?,
            Some(current) if current.name != contract.name => {
                return Err(InterpreterError::MultipleContracts {
                    expected: current.name.clone(),
                    found: contract.name.clone(),
                })
            }
            Some(_) => {}
        }

        let depth = self.call_stack.depth() + 1;
        let mut locals = VariableEnvironment::local();
        for (parameter, argument) in function.parameters.iter().zip(&transaction.arguments) {
            let mut values = VariableValues::new(Variable::from_parameter(parameter), depth);
            values.add_value(argument.clone());
            locals.add_variable_values(values);
        }

        self.call_stack.push(StackFrame::new(
            contract,
            function,
            transaction.arguments.clone(),
            locals,
        ));
        debug!("{}", self.call_stack);
        self.trace.begin_transaction();

        let result = self.do_interpret(NodeRef::Function(function));
        self.call_stack.pop("interpret_transaction")?;

        match result {
            Ok(value) => {
                self.trace.commit_transaction();
                Ok(value)
            }
            Err(err) => {
                let dropped = self.trace.rollback_transaction();
                debug!(
                    "{}.{} failed, dropping {} events",
                    contract.name, function.name, dropped
                );
                Err(err)
            }
        }
    }

    /// Interpret `node` in the current frame
    pub fn do_interpret(&mut self, node: NodeRef<'a>) -> Result<Option<Value>, InterpreterError> {
        let id = node.id();
        self.coverage.mark(id);
        self.call_stack
            .current_mut("do_interpret")?
            .scope_mut()
            .enter_node(id);
        trace!("enter {} {}", node.kind(), id);

        let result = match node {
            NodeRef::Function(function) => {
                self.coverage.mark(function.body.id);
                self.interpret_child_nodes(NodeRef::Block(&function.body))?
            }
            NodeRef::Block(block) | NodeRef::Statement(Statement::Block(block)) => {
                self.interpret_child_nodes(NodeRef::Block(block))?
            }
            NodeRef::Statement(Statement::EmitStatement(emit)) => {
                self.interpret_emit_statement(emit)?;
                None
            }
            NodeRef::Statement(Statement::Return(ret)) => match &ret.expression {
                Some(expression) => Some(self.evaluate(expression)?),
                None => Some(Value::unit()),
            },
            NodeRef::Statement(_) => {
                return Err(InterpreterError::UnsupportedNode {
                    kind: node.kind(),
                    id,
                })
            }
        };

        self.call_stack
            .current_mut("do_interpret")?
            .scope_mut()
            .leave_node(id);
        Ok(result)
    }

    /// Interpret the children of `node` in order, stopping at the first one
    /// that produces a value
    pub fn interpret_child_nodes(
        &mut self,
        node: NodeRef<'a>,
    ) -> Result<Option<Value>, InterpreterError> {
        for child in node.children() {
            if let Some(value) = self.do_interpret(child)? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    /// Evaluate the event arguments and record the event
    pub fn interpret_emit_statement(
        &mut self,
        emit: &EmitStatement,
    ) -> Result<(), InterpreterError> {
        let name = emit
            .name()
            .ok_or(InterpreterError::InvalidEmitTarget(emit.id))?;
        let arguments = &emit.event_call.arguments;

        if let Some(definition) = self.current_contract()?.event(name) {
            if definition.parameters.len() != arguments.len() {
                return Err(InterpreterError::EventArityMismatch {
                    event: name.to_string(),
                    expected: definition.parameters.len(),
                    found: arguments.len(),
                });
            }
        }

        debug!("emit {}", name);
        let mut event = EmittedEvent::new(name);
        for (i, argument) in arguments.iter().enumerate() {
            debug!("  arg {} {}", i, argument);
            event.push_arg(self.evaluate(argument)?);
        }
        self.trace.record(event);
        Ok(())
    }

    fn current_contract(&self) -> Result<&'a ContractDefinition, InterpreterError> {
        Ok(self.call_stack.current("current_contract")?.contract())
    }

    /// Evaluate against the current frame's locals layered over storage
    fn evaluate(&mut self, expression: &Expression) -> Result<Value, InterpreterError> {
        let frame = self.call_stack.current("evaluate")?;
        let environment = LayeredEnvironment::new(frame.locals(), &self.storage);
        let value = self
            .evaluator
            .evaluate_for_all(&[&environment], expression)?
            .first()?;
        Ok(value)
    }

    /// Write the trace of a successful run to `writer`
    pub fn finish_to_writer<W: Write>(&self, writer: W) -> Result<(), InterpreterError> {
        if self.failed {
            return Err(InterpreterError::TraceDiscarded);
        }
        self.trace.write_to(writer)
    }
}

fn check_arguments(
    function: &FunctionDefinition,
    arguments: &[Value],
) -> Result<(), InterpreterError> {
    if function.parameters.len() != arguments.len() {
        return Err(InterpreterError::ArgumentMismatch {
            function: function.name.clone(),
            reason: format!(
                "expected {} arguments, got {}",
                function.parameters.len(),
                arguments.len()
            ),
        });
    }

    for (parameter, argument) in function.parameters.iter().zip(arguments) {
        if !argument.matches_type(&parameter.type_name) {
            return Err(InterpreterError::ArgumentMismatch {
                function: function.name.clone(),
                reason: format!(
                    "{} of type {} does not fit parameter {} {}",
                    argument,
                    argument.type_label(),
                    parameter.type_name,
                    parameter.name
                ),
            });
        }
    }
    Ok(())
}

impl TransactionRunner for FullInterpreter<'_> {
    fn run(&mut self) -> Result<(), InterpreterError> {
        FullInterpreter::run(self)
    }

    /// Write the trace to the configured output path
    fn finish(&mut self) -> Result<(), InterpreterError> {
        if self.failed {
            return Err(InterpreterError::TraceDiscarded);
        }
        info!(
            "Writing {} events to {}",
            self.trace.len(),
            self.config.trace_output.display()
        );
        self.trace.write_to_path(&self.config.trace_output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AstBuilder, BinaryOperator, IntegerType, NodeKind};
    use crate::interpreter::EvaluationError;

    fn counter_contract(ast: &mut AstBuilder) -> SourceUnit {
        let variable = ast.storage_variable("count", "uint256", Some(Value::uint(5)));
        let value = ast.parameter("value", "uint256");
        let event = ast.event("Changed", vec![value]);
        let count = ast.identifier("count");
        let emit = ast.emit("Changed", vec![count]);
        let f = ast.function("f", vec![], vec![emit]);
        let contract = ast.contract("Counter", vec![variable], vec![event], vec![f]);
        AstBuilder::source_unit(vec![contract])
    }

    #[test]
    fn test_storage_is_seeded_from_initializers() {
        let mut ast = AstBuilder::new();
        let unit = counter_contract(&mut ast);
        let mut interpreter = FullInterpreter::new(&unit, &[], InterpreterConfig::default());

        interpreter
            .initialize_global_environment(&unit.contracts[0])
            .unwrap();
        let count = interpreter.global_environment().get_by_name("count").unwrap();
        assert_eq!(count.current(), Some(&Value::uint(5)));
        assert_eq!(count.scope_depth(), 0);
    }

    #[test]
    fn test_missing_initializer() {
        let mut ast = AstBuilder::new();
        let variable = ast.storage_variable("count", "uint256", None);
        let contract = ast.contract("C", vec![variable], vec![], vec![]);
        let unit = AstBuilder::source_unit(vec![contract]);
        let mut interpreter = FullInterpreter::new(&unit, &[], InterpreterConfig::default());

        assert!(matches!(
            interpreter.initialize_global_environment(&unit.contracts[0]),
            Err(InterpreterError::EnvironmentInitialization { variable, .. }) if variable == "count"
        ));
    }

    #[test]
    fn test_mistyped_initializer() {
        let mut ast = AstBuilder::new();
        let variable = ast.storage_variable("flag", "bool", Some(Value::uint(1)));
        let contract = ast.contract("C", vec![variable], vec![], vec![]);
        let unit = AstBuilder::source_unit(vec![contract]);
        let mut interpreter = FullInterpreter::new(&unit, &[], InterpreterConfig::default());

        assert!(matches!(
            interpreter.initialize_global_environment(&unit.contracts[0]),
            Err(InterpreterError::EnvironmentInitialization { .. })
        ));
    }

    #[test]
    fn test_emit_reads_storage() {
        let mut ast = AstBuilder::new();
        let unit = counter_contract(&mut ast);
        let transactions = vec![Transaction::new("Counter", "f", vec![])];
        let mut interpreter =
            FullInterpreter::new(&unit, &transactions, InterpreterConfig::default());

        interpreter.run().unwrap();
        assert_eq!(
            interpreter.trace().events(),
            &[EmittedEvent::new("Changed").with_arg(Value::uint(5))]
        );
        assert_eq!(interpreter.call_stack_depth(), 0);
    }

    #[test]
    fn test_return_stops_traversal() {
        let mut ast = AstBuilder::new();
        let first = ast.emit("A", vec![]);
        let literal = ast.literal(Value::uint(7));
        let ret = ast.ret(Some(literal));
        let skipped = ast.emit("C", vec![]);
        let skipped_id = skipped.id();
        let f = ast.function("f", vec![], vec![first, ret, skipped]);
        let contract = ast.contract("C", vec![], vec![], vec![f]);
        let unit = AstBuilder::source_unit(vec![contract]);
        let transactions = vec![Transaction::new("C", "f", vec![])];
        let mut interpreter =
            FullInterpreter::new(&unit, &transactions, InterpreterConfig::default());

        let value = interpreter.interpret_transaction(&transactions[0]).unwrap();
        assert_eq!(value, Some(Value::uint(7)));
        assert!(!interpreter.coverage().is_covered(skipped_id));
        assert_eq!(interpreter.trace().len(), 1);
    }

    #[test]
    fn test_bare_return_yields_unit() {
        let mut ast = AstBuilder::new();
        let ret = ast.ret(None);
        let f = ast.function("f", vec![], vec![ret]);
        let contract = ast.contract("C", vec![], vec![], vec![f]);
        let unit = AstBuilder::source_unit(vec![contract]);
        let transactions = vec![Transaction::new("C", "f", vec![])];
        let mut interpreter =
            FullInterpreter::new(&unit, &transactions, InterpreterConfig::default());

        assert_eq!(
            interpreter.interpret_transaction(&transactions[0]).unwrap(),
            Some(Value::unit())
        );
    }

    #[test]
    fn test_nested_block_and_coverage() {
        let mut ast = AstBuilder::new();
        let emit = ast.emit("Inner", vec![]);
        let emit_id = emit.id();
        let nested = ast.nested_block(vec![emit]);
        let nested_id = nested.id();
        let f = ast.function("f", vec![], vec![nested]);
        let (function_id, body_id) = (f.id, f.body.id);
        let contract = ast.contract("C", vec![], vec![], vec![f]);
        let unit = AstBuilder::source_unit(vec![contract]);
        let transactions = vec![Transaction::new("C", "f", vec![])];
        let mut interpreter =
            FullInterpreter::new(&unit, &transactions, InterpreterConfig::default());

        interpreter.run().unwrap();
        for id in [function_id, body_id, nested_id, emit_id] {
            assert!(interpreter.coverage().is_covered(id), "{} not covered", id);
        }
        assert_eq!(interpreter.trace().events()[0].event, "Inner");
    }

    #[test]
    fn test_unsupported_statement() {
        let mut ast = AstBuilder::new();
        let condition = ast.literal(Value::Bool(true));
        let then = ast.emit("Then", vec![]);
        let branch = ast.if_statement(condition, then, None);
        let branch_id = branch.id();
        let f = ast.function("f", vec![], vec![branch]);
        let contract = ast.contract("C", vec![], vec![], vec![f]);
        let unit = AstBuilder::source_unit(vec![contract]);
        let transactions = vec![Transaction::new("C", "f", vec![])];
        let mut interpreter =
            FullInterpreter::new(&unit, &transactions, InterpreterConfig::default());

        assert_eq!(
            interpreter.run(),
            Err(InterpreterError::UnsupportedNode {
                kind: NodeKind::IfStatement,
                id: branch_id,
            })
        );
        assert!(interpreter.has_failed());
        assert_eq!(interpreter.call_stack_depth(), 0);
        assert_eq!(
            interpreter.finish_to_writer(Vec::new()),
            Err(InterpreterError::TraceDiscarded)
        );
    }

    #[test]
    fn test_argument_checks() {
        let mut ast = AstBuilder::new();
        let a = ast.parameter("a", "uint8");
        let f = ast.function("f", vec![a], vec![]);
        let contract = ast.contract("C", vec![], vec![], vec![f]);
        let unit = AstBuilder::source_unit(vec![contract]);
        let mut interpreter = FullInterpreter::new(&unit, &[], InterpreterConfig::default());

        assert!(matches!(
            interpreter.interpret_transaction(&Transaction::new("C", "f", vec![])),
            Err(InterpreterError::ArgumentMismatch { .. })
        ));
        assert!(matches!(
            interpreter.interpret_transaction(&Transaction::new("C", "f", vec![Value::uint(1)])),
            Err(InterpreterError::ArgumentMismatch { .. })
        ));
        assert!(matches!(
            interpreter.interpret_transaction(&Transaction::new("C", "g", vec![])),
            Err(InterpreterError::UnknownFunction { .. })
        ));
        assert!(matches!(
            interpreter.interpret_transaction(&Transaction::new("D", "f", vec![])),
            Err(InterpreterError::UnknownContract(_))
        ));
    }

    #[test]
    fn test_event_arity_is_checked() {
        let mut ast = AstBuilder::new();
        let a = ast.parameter("a", "uint256");
        let event = ast.event("Pair", vec![a]);
        let one = ast.literal(Value::uint(1));
        let two = ast.literal(Value::uint(2));
        let emit = ast.emit("Pair", vec![one, two]);
        let f = ast.function("f", vec![], vec![emit]);
        let contract = ast.contract("C", vec![], vec![event], vec![f]);
        let unit = AstBuilder::source_unit(vec![contract]);
        let transactions = vec![Transaction::new("C", "f", vec![])];
        let mut interpreter =
            FullInterpreter::new(&unit, &transactions, InterpreterConfig::default());

        assert_eq!(
            interpreter.run(),
            Err(InterpreterError::EventArityMismatch {
                event: "Pair".to_string(),
                expected: 1,
                found: 2,
            })
        );
    }

    #[test]
    fn test_evaluation_failure_propagates() {
        let mut ast = AstBuilder::new();
        let max = ast.literal(Value::integer(255, IntegerType::UINT8).unwrap());
        let one = ast.literal(Value::integer(1, IntegerType::UINT8).unwrap());
        let sum = ast.binary(BinaryOperator::Add, max, one);
        let emit = ast.emit("Sum", vec![sum]);
        let f = ast.function("f", vec![], vec![emit]);
        let contract = ast.contract("C", vec![], vec![], vec![f]);
        let unit = AstBuilder::source_unit(vec![contract]);
        let transactions = vec![Transaction::new("C", "f", vec![])];
        let mut interpreter =
            FullInterpreter::new(&unit, &transactions, InterpreterConfig::default());

        assert!(matches!(
            interpreter.run(),
            Err(InterpreterError::Evaluation(EvaluationError::Overflow { .. }))
        ));
        assert!(interpreter.trace().is_empty());
    }

    #[test]
    fn test_do_interpret_requires_a_frame() {
        let mut ast = AstBuilder::new();
        let f = ast.function("f", vec![], vec![]);
        let unit = AstBuilder::source_unit(vec![]);
        let mut interpreter = FullInterpreter::new(&unit, &[], InterpreterConfig::default());

        assert!(matches!(
            interpreter.do_interpret(NodeRef::Function(&f)),
            Err(InterpreterError::CallStackUnderflow { .. })
        ));
        assert!(interpreter.coverage().is_covered(f.id));
    }
}
