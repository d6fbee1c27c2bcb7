//! Expression nodes and their source rendering

use serde::{Deserialize, Serialize};
use std::fmt;

use super::NodeId;
use crate::interpreter::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "%")]
    Mod,
    #[serde(rename = "**")]
    Exp,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "&&")]
    And,
    #[serde(rename = "||")]
    Or,
    #[serde(rename = "&")]
    BitAnd,
    #[serde(rename = "|")]
    BitOr,
    #[serde(rename = "^")]
    BitXor,
    #[serde(rename = "<<")]
    Shl,
    #[serde(rename = ">>")]
    Shr,
}

impl BinaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Mod => "%",
            BinaryOperator::Exp => "**",
            BinaryOperator::Eq => "==",
            BinaryOperator::Ne => "!=",
            BinaryOperator::Lt => "<",
            BinaryOperator::Le => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::Ge => ">=",
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
            BinaryOperator::BitAnd => "&",
            BinaryOperator::BitOr => "|",
            BinaryOperator::BitXor => "^",
            BinaryOperator::Shl => "<<",
            BinaryOperator::Shr => ">>",
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOperator {
    #[serde(rename = "-")]
    Neg,
    #[serde(rename = "!")]
    Not,
    #[serde(rename = "~")]
    BitNot,
}

impl UnaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOperator::Neg => "-",
            UnaryOperator::Not => "!",
            UnaryOperator::BitNot => "~",
        }
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Call expression, also used as the payload of `emit` and `revert`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionCall {
    pub id: NodeId,
    pub expression: Box<Expression>,
    #[serde(default)]
    pub arguments: Vec<Expression>,
}

impl FunctionCall {
    /// Name of the called entity: `Foo(..)` and `Lib.Foo(..)` both give `Foo`
    pub fn callee_name(&self) -> Option<&str> {
        match self.expression.as_ref() {
            Expression::Identifier { name, .. } => Some(name),
            Expression::MemberAccess { member_name, .. } => Some(member_name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "nodeType")]
pub enum Expression {
    #[serde(rename_all = "camelCase")]
    Literal { id: NodeId, value: Value },
    #[serde(rename_all = "camelCase")]
    Identifier {
        id: NodeId,
        name: String,
        #[serde(default)]
        referenced_declaration: Option<NodeId>,
    },
    #[serde(rename_all = "camelCase")]
    BinaryOperation {
        id: NodeId,
        operator: BinaryOperator,
        left_expression: Box<Expression>,
        right_expression: Box<Expression>,
    },
    #[serde(rename_all = "camelCase")]
    UnaryOperation {
        id: NodeId,
        operator: UnaryOperator,
        sub_expression: Box<Expression>,
    },
    #[serde(rename_all = "camelCase")]
    Conditional {
        id: NodeId,
        condition: Box<Expression>,
        true_expression: Box<Expression>,
        false_expression: Box<Expression>,
    },
    #[serde(rename_all = "camelCase")]
    TupleExpression { id: NodeId, components: Vec<Expression> },
    FunctionCall(FunctionCall),
    #[serde(rename_all = "camelCase")]
    MemberAccess {
        id: NodeId,
        expression: Box<Expression>,
        member_name: String,
    },
    #[serde(rename_all = "camelCase")]
    IndexAccess {
        id: NodeId,
        base_expression: Box<Expression>,
        index_expression: Box<Expression>,
    },
    #[serde(rename_all = "camelCase")]
    Assignment {
        id: NodeId,
        operator: String,
        left_hand_side: Box<Expression>,
        right_hand_side: Box<Expression>,
    },
}

impl Expression {
    pub fn id(&self) -> NodeId {
        match self {
            Expression::FunctionCall(call) => call.id,
            Expression::Literal { id, .. }
            | Expression::Identifier { id, .. }
            | Expression::BinaryOperation { id, .. }
            | Expression::UnaryOperation { id, .. }
            | Expression::Conditional { id, .. }
            | Expression::TupleExpression { id, .. }
            | Expression::MemberAccess { id, .. }
            | Expression::IndexAccess { id, .. }
            | Expression::Assignment { id, .. } => *id,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Expression::Literal { .. } => "Literal",
            Expression::Identifier { .. } => "Identifier",
            Expression::BinaryOperation { .. } => "BinaryOperation",
            Expression::UnaryOperation { .. } => "UnaryOperation",
            Expression::Conditional { .. } => "Conditional",
            Expression::TupleExpression { .. } => "TupleExpression",
            Expression::FunctionCall(_) => "FunctionCall",
            Expression::MemberAccess { .. } => "MemberAccess",
            Expression::IndexAccess { .. } => "IndexAccess",
            Expression::Assignment { .. } => "Assignment",
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expression]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

/// Renders the expression as source code
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal { value, .. } => write!(f, "{}", value),
            Expression::Identifier { name, .. } => write!(f, "{}", name),
            Expression::BinaryOperation {
                operator,
                left_expression,
                right_expression,
                ..
            } => write!(f, "({} {} {})", left_expression, operator, right_expression),
            Expression::UnaryOperation {
                operator,
                sub_expression,
                ..
            } => write!(f, "{}{}", operator, sub_expression),
            Expression::Conditional {
                condition,
                true_expression,
                false_expression,
                ..
            } => write!(f, "({} ? {} : {})", condition, true_expression, false_expression),
            Expression::TupleExpression { components, .. } => {
                write!(f, "(")?;
                write_list(f, components)?;
                write!(f, ")")
            }
            Expression::FunctionCall(call) => {
                write!(f, "{}(", call.expression)?;
                write_list(f, &call.arguments)?;
                write!(f, ")")
            }
            Expression::MemberAccess {
                expression,
                member_name,
                ..
            } => write!(f, "{}.{}", expression, member_name),
            Expression::IndexAccess {
                base_expression,
                index_expression,
                ..
            } => write!(f, "{}[{}]", base_expression, index_expression),
            Expression::Assignment {
                operator,
                left_hand_side,
                right_hand_side,
                ..
            } => write!(f, "{} {} {}", left_hand_side, operator, right_hand_side),
        }
    }
}
