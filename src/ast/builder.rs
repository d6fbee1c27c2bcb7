//! Programmatic construction of syntax trees
//!
//! Generators and tests build contracts through `AstBuilder`, which hands out
//! unique node ids in creation order.

use super::{
    BinaryOperator, Block, ContractDefinition, EmitStatement, EventDefinition, Expression,
    FunctionCall, FunctionDefinition, NodeId, Parameter, Return, SourceUnit, Statement, TypeName,
    UnaryOperator, VariableDeclaration,
};
use crate::interpreter::Value;

#[derive(Debug)]
pub struct AstBuilder {
    next: u32,
}

impl Default for AstBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AstBuilder {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Allocate a fresh node id
    pub fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }

    pub fn literal(&mut self, value: Value) -> Expression {
        Expression::Literal {
            id: self.next_id(),
            value,
        }
    }

    /// Identifier resolved by name
    pub fn identifier(&mut self, name: &str) -> Expression {
        Expression::Identifier {
            id: self.next_id(),
            name: name.to_string(),
            referenced_declaration: None,
        }
    }

    /// Identifier bound to a specific declaration
    pub fn reference(&mut self, name: &str, declaration: NodeId) -> Expression {
        Expression::Identifier {
            id: self.next_id(),
            name: name.to_string(),
            referenced_declaration: Some(declaration),
        }
    }

    pub fn binary(
        &mut self,
        operator: BinaryOperator,
        left: Expression,
        right: Expression,
    ) -> Expression {
        Expression::BinaryOperation {
            id: self.next_id(),
            operator,
            left_expression: Box::new(left),
            right_expression: Box::new(right),
        }
    }

    pub fn unary(&mut self, operator: UnaryOperator, operand: Expression) -> Expression {
        Expression::UnaryOperation {
            id: self.next_id(),
            operator,
            sub_expression: Box::new(operand),
        }
    }

    pub fn conditional(
        &mut self,
        condition: Expression,
        if_true: Expression,
        if_false: Expression,
    ) -> Expression {
        Expression::Conditional {
            id: self.next_id(),
            condition: Box::new(condition),
            true_expression: Box::new(if_true),
            false_expression: Box::new(if_false),
        }
    }

    pub fn call(&mut self, callee: &str, arguments: Vec<Expression>) -> Expression {
        Expression::FunctionCall(self.function_call(callee, arguments))
    }

    fn function_call(&mut self, callee: &str, arguments: Vec<Expression>) -> FunctionCall {
        let callee = self.identifier(callee);
        FunctionCall {
            id: self.next_id(),
            expression: Box::new(callee),
            arguments,
        }
    }

    pub fn emit(&mut self, event: &str, arguments: Vec<Expression>) -> Statement {
        let event_call = self.function_call(event, arguments);
        Statement::EmitStatement(EmitStatement {
            id: self.next_id(),
            event_call,
        })
    }

    pub fn ret(&mut self, expression: Option<Expression>) -> Statement {
        Statement::Return(Return {
            id: self.next_id(),
            expression,
        })
    }

    pub fn expression_statement(&mut self, expression: Expression) -> Statement {
        Statement::ExpressionStatement {
            id: self.next_id(),
            expression,
        }
    }

    pub fn if_statement(
        &mut self,
        condition: Expression,
        true_body: Statement,
        false_body: Option<Statement>,
    ) -> Statement {
        Statement::IfStatement {
            id: self.next_id(),
            condition,
            true_body: Box::new(true_body),
            false_body: false_body.map(Box::new),
        }
    }

    pub fn block(&mut self, statements: Vec<Statement>) -> Block {
        Block {
            id: self.next_id(),
            statements,
        }
    }

    pub fn nested_block(&mut self, statements: Vec<Statement>) -> Statement {
        Statement::Block(self.block(statements))
    }

    pub fn parameter(&mut self, name: &str, type_name: &str) -> Parameter {
        Parameter {
            id: self.next_id(),
            name: name.to_string(),
            type_name: TypeName::from(type_name),
        }
    }

    pub fn storage_variable(
        &mut self,
        name: &str,
        type_name: &str,
        initializer: Option<Value>,
    ) -> VariableDeclaration {
        VariableDeclaration {
            id: self.next_id(),
            name: name.to_string(),
            type_name: TypeName::from(type_name),
            initializer_value: initializer,
        }
    }

    pub fn event(&mut self, name: &str, parameters: Vec<Parameter>) -> EventDefinition {
        EventDefinition {
            id: self.next_id(),
            name: name.to_string(),
            parameters,
        }
    }

    pub fn function(
        &mut self,
        name: &str,
        parameters: Vec<Parameter>,
        statements: Vec<Statement>,
    ) -> FunctionDefinition {
        let body = self.block(statements);
        FunctionDefinition {
            id: self.next_id(),
            name: name.to_string(),
            parameters,
            body,
        }
    }

    pub fn contract(
        &mut self,
        name: &str,
        variables: Vec<VariableDeclaration>,
        events: Vec<EventDefinition>,
        functions: Vec<FunctionDefinition>,
    ) -> ContractDefinition {
        ContractDefinition {
            id: self.next_id(),
            name: name.to_string(),
            variables,
            events,
            functions,
        }
    }

    pub fn source_unit(contracts: Vec<ContractDefinition>) -> SourceUnit {
        SourceUnit { contracts }
    }
}
