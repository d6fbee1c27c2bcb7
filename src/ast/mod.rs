//! Contract syntax tree consumed by the interpreter
//!
//! The tree is produced by the parsing collaborator and only ever borrowed by
//! the interpreter. Its JSON shape follows the solc compact AST: every node has a
//! numeric `id`, statements and expressions are tagged with `nodeType`, and
//! field names are camelCase.

mod builder;
mod expression;

pub use builder::AstBuilder;
pub use expression::{BinaryOperator, Expression, FunctionCall, UnaryOperator};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::interpreter::Value;

/// Identity of a node inside one source unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Fixed-width integer type such as `uint256` or `int8`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IntegerType {
    pub signed: bool,
    pub bits: u16,
}

impl IntegerType {
    pub const UINT8: IntegerType = IntegerType { signed: false, bits: 8 };
    pub const UINT256: IntegerType = IntegerType { signed: false, bits: 256 };
    pub const INT256: IntegerType = IntegerType { signed: true, bits: 256 };

    pub fn new(signed: bool, bits: u16) -> Result<Self, String> {
        if bits == 0 || bits > 256 || bits % 8 != 0 {
            return Err(format!("invalid integer width {}", bits));
        }
        Ok(Self { signed, bits })
    }

    /// Whether the whole range of this type fits into an `i128`.
    ///
    /// Wider types are evaluated against the `i128` range and report results
    /// beyond it as unrepresentable instead of wrapping them.
    pub fn is_representable(&self) -> bool {
        if self.signed {
            self.bits <= 128
        } else {
            self.bits <= 120
        }
    }

    /// Smallest value of the type
    pub fn min(&self) -> i128 {
        match (self.signed, self.bits) {
            (false, _) => 0,
            (true, bits) if bits >= 128 => i128::MIN,
            (true, bits) => -(1i128 << (bits - 1)),
        }
    }

    /// Largest value of the type, clamped to `i128::MAX`
    pub fn max(&self) -> i128 {
        match (self.signed, self.bits) {
            (true, bits) if bits >= 128 => i128::MAX,
            (true, bits) => (1i128 << (bits - 1)) - 1,
            (false, bits) if bits >= 127 => i128::MAX,
            (false, bits) => (1i128 << bits) - 1,
        }
    }

    pub fn contains(&self, value: i128) -> bool {
        value >= self.min() && value <= self.max()
    }
}

impl fmt::Display for IntegerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = if self.signed { "int" } else { "uint" };
        write!(f, "{}{}", prefix, self.bits)
    }
}

impl FromStr for IntegerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (signed, width) = if let Some(rest) = s.strip_prefix("uint") {
            (false, rest)
        } else if let Some(rest) = s.strip_prefix("int") {
            (true, rest)
        } else {
            return Err(format!("not an integer type: {}", s));
        };

        let bits = if width.is_empty() {
            256
        } else {
            width
                .parse::<u16>()
                .map_err(|_| format!("not an integer type: {}", s))?
        };
        IntegerType::new(signed, bits)
    }
}

impl TryFrom<String> for IntegerType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<IntegerType> for String {
    fn from(ty: IntegerType) -> Self {
        ty.to_string()
    }
}

/// Declared type of a variable, parameter or event argument
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TypeName {
    Integer(IntegerType),
    Bool,
    /// Any type the interpreter has no value representation for
    Other(String),
}

impl From<&str> for TypeName {
    fn from(s: &str) -> Self {
        if s == "bool" {
            return TypeName::Bool;
        }
        match s.parse::<IntegerType>() {
            Ok(ty) => TypeName::Integer(ty),
            Err(_) => TypeName::Other(s.to_string()),
        }
    }
}

impl From<String> for TypeName {
    fn from(s: String) -> Self {
        TypeName::from(s.as_str())
    }
}

impl From<TypeName> for String {
    fn from(ty: TypeName) -> Self {
        ty.to_string()
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeName::Integer(ty) => write!(f, "{}", ty),
            TypeName::Bool => write!(f, "bool"),
            TypeName::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Root of a parsed program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceUnit {
    pub contracts: Vec<ContractDefinition>,
}

impl SourceUnit {
    pub fn contract(&self, name: &str) -> Option<&ContractDefinition> {
        self.contracts.iter().find(|contract| contract.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractDefinition {
    pub id: NodeId,
    pub name: String,
    /// Storage variables in declaration order
    #[serde(default)]
    pub variables: Vec<VariableDeclaration>,
    #[serde(default)]
    pub events: Vec<EventDefinition>,
    #[serde(default)]
    pub functions: Vec<FunctionDefinition>,
}

impl ContractDefinition {
    pub fn function(&self, name: &str) -> Option<&FunctionDefinition> {
        self.functions.iter().find(|function| function.name == name)
    }

    pub fn event(&self, name: &str) -> Option<&EventDefinition> {
        self.events.iter().find(|event| event.name == name)
    }
}

/// Storage variable declaration
///
/// The generator attaches the evaluated initializer to every declaration it
/// emits, so storage can be seeded without evaluating initializer expressions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableDeclaration {
    pub id: NodeId,
    pub name: String,
    pub type_name: TypeName,
    #[serde(default)]
    pub initializer_value: Option<Value>,
}

/// Function or event parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub id: NodeId,
    pub name: String,
    pub type_name: TypeName,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDefinition {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDefinition {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: NodeId,
    #[serde(default)]
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmitStatement {
    pub id: NodeId,
    pub event_call: FunctionCall,
}

impl EmitStatement {
    /// Name of the emitted event, if the call target names one
    pub fn name(&self) -> Option<&str> {
        self.event_call.callee_name()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Return {
    pub id: NodeId,
    #[serde(default)]
    pub expression: Option<Expression>,
}

/// Statement kinds produced by the parser
///
/// Only a subset is interpretable; the rest exist so that the interpreter can
/// name exactly what it refused to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "nodeType")]
pub enum Statement {
    Block(Block),
    EmitStatement(EmitStatement),
    Return(Return),
    #[serde(rename_all = "camelCase")]
    ExpressionStatement { id: NodeId, expression: Expression },
    #[serde(rename_all = "camelCase")]
    VariableDeclarationStatement {
        id: NodeId,
        declarations: Vec<Parameter>,
        #[serde(default)]
        initial_value: Option<Expression>,
    },
    #[serde(rename_all = "camelCase")]
    IfStatement {
        id: NodeId,
        condition: Expression,
        true_body: Box<Statement>,
        #[serde(default)]
        false_body: Option<Box<Statement>>,
    },
    #[serde(rename_all = "camelCase")]
    WhileStatement {
        id: NodeId,
        condition: Expression,
        body: Box<Statement>,
    },
    #[serde(rename_all = "camelCase")]
    DoWhileStatement {
        id: NodeId,
        condition: Expression,
        body: Box<Statement>,
    },
    #[serde(rename_all = "camelCase")]
    ForStatement {
        id: NodeId,
        #[serde(default)]
        initialization_expression: Option<Box<Statement>>,
        #[serde(default)]
        condition: Option<Expression>,
        #[serde(default)]
        loop_expression: Option<Box<Statement>>,
        body: Box<Statement>,
    },
    Break { id: NodeId },
    Continue { id: NodeId },
    PlaceholderStatement { id: NodeId },
    #[serde(rename_all = "camelCase")]
    RevertStatement { id: NodeId, error_call: FunctionCall },
}

impl Statement {
    pub fn id(&self) -> NodeId {
        match self {
            Statement::Block(block) => block.id,
            Statement::EmitStatement(emit) => emit.id,
            Statement::Return(ret) => ret.id,
            Statement::ExpressionStatement { id, .. }
            | Statement::VariableDeclarationStatement { id, .. }
            | Statement::IfStatement { id, .. }
            | Statement::WhileStatement { id, .. }
            | Statement::DoWhileStatement { id, .. }
            | Statement::ForStatement { id, .. }
            | Statement::Break { id }
            | Statement::Continue { id }
            | Statement::PlaceholderStatement { id }
            | Statement::RevertStatement { id, .. } => *id,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Statement::Block(_) => NodeKind::Block,
            Statement::EmitStatement(_) => NodeKind::EmitStatement,
            Statement::Return(_) => NodeKind::Return,
            Statement::ExpressionStatement { .. } => NodeKind::ExpressionStatement,
            Statement::VariableDeclarationStatement { .. } => {
                NodeKind::VariableDeclarationStatement
            }
            Statement::IfStatement { .. } => NodeKind::IfStatement,
            Statement::WhileStatement { .. } => NodeKind::WhileStatement,
            Statement::DoWhileStatement { .. } => NodeKind::DoWhileStatement,
            Statement::ForStatement { .. } => NodeKind::ForStatement,
            Statement::Break { .. } => NodeKind::Break,
            Statement::Continue { .. } => NodeKind::Continue,
            Statement::PlaceholderStatement { .. } => NodeKind::PlaceholderStatement,
            Statement::RevertStatement { .. } => NodeKind::RevertStatement,
        }
    }
}

/// Closed set of node kinds the interpreter can be positioned at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    FunctionDefinition,
    Block,
    EmitStatement,
    Return,
    ExpressionStatement,
    VariableDeclarationStatement,
    IfStatement,
    WhileStatement,
    DoWhileStatement,
    ForStatement,
    Break,
    Continue,
    PlaceholderStatement,
    RevertStatement,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Borrowed position in the tree
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Function(&'a FunctionDefinition),
    Block(&'a Block),
    Statement(&'a Statement),
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> NodeId {
        match self {
            NodeRef::Function(function) => function.id,
            NodeRef::Block(block) => block.id,
            NodeRef::Statement(statement) => statement.id(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            NodeRef::Function(_) => NodeKind::FunctionDefinition,
            NodeRef::Block(_) => NodeKind::Block,
            NodeRef::Statement(statement) => statement.kind(),
        }
    }

    /// Direct children in declaration order
    pub fn children(&self) -> Vec<NodeRef<'a>> {
        match *self {
            NodeRef::Function(function) => vec![NodeRef::Block(&function.body)],
            NodeRef::Block(block) => block.statements.iter().map(NodeRef::from).collect(),
            NodeRef::Statement(statement) => match statement {
                Statement::Block(block) => block.statements.iter().map(NodeRef::from).collect(),
                Statement::IfStatement {
                    true_body,
                    false_body,
                    ..
                } => {
                    let mut children = vec![NodeRef::from(true_body.as_ref())];
                    if let Some(false_body) = false_body {
                        children.push(NodeRef::from(false_body.as_ref()));
                    }
                    children
                }
                Statement::WhileStatement { body, .. }
                | Statement::DoWhileStatement { body, .. } => vec![NodeRef::from(body.as_ref())],
                Statement::ForStatement {
                    initialization_expression,
                    loop_expression,
                    body,
                    ..
                } => initialization_expression
                    .iter()
                    .chain(loop_expression.iter())
                    .map(|statement| NodeRef::from(statement.as_ref()))
                    .chain(std::iter::once(NodeRef::from(body.as_ref())))
                    .collect(),
                _ => Vec::new(),
            },
        }
    }
}

impl<'a> From<&'a Statement> for NodeRef<'a> {
    fn from(statement: &'a Statement) -> Self {
        match statement {
            Statement::Block(block) => NodeRef::Block(block),
            other => NodeRef::Statement(other),
        }
    }
}
