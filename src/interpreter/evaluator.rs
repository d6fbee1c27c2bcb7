//! Expression evaluation
//!
//! Integer arithmetic is checked, as in Solidity 0.8 and later: a result outside
//! the range of its type is an overflow. What happens on overflow or division by
//! zero is decided by the `ErrorHandler` policy. Under `Substitute`, the faulting
//! result is replaced by a value drawn from a generator seeded with the
//! configured seed, so repeated runs stay identical.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::EvaluationError;
use super::values::{IntegerValue, Value};
use super::variables::Environment;
use crate::ast::{BinaryOperator, Expression, IntegerType, UnaryOperator};

/// How arithmetic faults are resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Report the fault as an evaluation error
    #[default]
    Fail,
    /// Replace the faulting result with a seeded random value of the result type
    Substitute,
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorPolicy::Fail => write!(f, "fail"),
            ErrorPolicy::Substitute => write!(f, "substitute"),
        }
    }
}

impl FromStr for ErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fail" => Ok(ErrorPolicy::Fail),
            "substitute" => Ok(ErrorPolicy::Substitute),
            other => Err(format!("unknown error policy: {}", other)),
        }
    }
}

/// Resolves arithmetic faults according to a policy
#[derive(Debug, Clone)]
pub struct ErrorHandler {
    policy: ErrorPolicy,
    rng: StdRng,
}

impl ErrorHandler {
    pub fn new(policy: ErrorPolicy, seed: u64) -> Self {
        Self {
            policy,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    fn overflow(&mut self, operator: &str, ty: IntegerType) -> Result<Value, EvaluationError> {
        match self.policy {
            ErrorPolicy::Fail => Err(EvaluationError::Overflow {
                operator: operator.to_string(),
                ty,
            }),
            ErrorPolicy::Substitute => self.substitute(operator, ty),
        }
    }

    fn division_by_zero(
        &mut self,
        operator: BinaryOperator,
        ty: IntegerType,
    ) -> Result<Value, EvaluationError> {
        match self.policy {
            ErrorPolicy::Fail => Err(EvaluationError::DivisionByZero { operator }),
            ErrorPolicy::Substitute => self.substitute(operator.symbol(), ty),
        }
    }

    fn substitute(&mut self, operator: &str, ty: IntegerType) -> Result<Value, EvaluationError> {
        let value = self.rng.gen_range(ty.min()..=ty.max());
        log::debug!("substituting {} for faulting {} on {}", value, operator, ty);
        Value::integer(value, ty)
    }
}

/// Values produced by one batched evaluation, one per environment
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EvaluationResults {
    pub values: Vec<Value>,
}

impl EvaluationResults {
    pub fn first(self) -> Result<Value, EvaluationError> {
        self.values
            .into_iter()
            .next()
            .ok_or(EvaluationError::EmptyResult)
    }
}

/// Evaluates expressions against variable environments
#[derive(Debug, Clone)]
pub struct ExpressionEvaluator {
    handler: ErrorHandler,
}

impl ExpressionEvaluator {
    pub fn new(handler: ErrorHandler) -> Self {
        Self { handler }
    }

    pub fn error_policy(&self) -> ErrorPolicy {
        self.handler.policy()
    }

    /// Evaluate `expression` once against every environment, in order
    pub fn evaluate_for_all(
        &mut self,
        environments: &[&dyn Environment],
        expression: &Expression,
    ) -> Result<EvaluationResults, EvaluationError> {
        let mut results = EvaluationResults::default();
        for environment in environments {
            results.values.push(self.evaluate(*environment, expression)?);
        }
        Ok(results)
    }

    /// Evaluate `expression` against a single environment
    pub fn evaluate(
        &mut self,
        environment: &dyn Environment,
        expression: &Expression,
    ) -> Result<Value, EvaluationError> {
        match expression {
            Expression::Literal { value, .. } => Ok(value.clone()),

            Expression::Identifier {
                name,
                referenced_declaration,
                ..
            } => {
                let values = environment
                    .lookup(name, *referenced_declaration)
                    .ok_or_else(|| EvaluationError::UndeclaredIdentifier(name.clone()))?;
                values
                    .current()
                    .cloned()
                    .ok_or_else(|| EvaluationError::UninitializedVariable(name.clone()))
            }

            Expression::BinaryOperation {
                operator,
                left_expression,
                right_expression,
                ..
            } => match operator {
                BinaryOperator::And | BinaryOperator::Or => {
                    let left = self.evaluate_condition(environment, left_expression)?;
                    // Short-circuit: the right operand is only evaluated when needed
                    if (*operator == BinaryOperator::And) != left {
                        return Ok(Value::Bool(left));
                    }
                    let right = self.evaluate_condition(environment, right_expression)?;
                    Ok(Value::Bool(right))
                }
                _ => {
                    let left = self.evaluate(environment, left_expression)?;
                    let right = self.evaluate(environment, right_expression)?;
                    self.binary(*operator, &left, &right)
                }
            },

            Expression::UnaryOperation {
                operator,
                sub_expression,
                ..
            } => {
                let operand = self.evaluate(environment, sub_expression)?;
                self.unary(*operator, &operand)
            }

            Expression::Conditional {
                condition,
                true_expression,
                false_expression,
                ..
            } => {
                if self.evaluate_condition(environment, condition)? {
                    self.evaluate(environment, true_expression)
                } else {
                    self.evaluate(environment, false_expression)
                }
            }

            Expression::TupleExpression { components, .. } => {
                if components.len() == 1 {
                    return self.evaluate(environment, &components[0]);
                }
                let mut values = Vec::with_capacity(components.len());
                for component in components {
                    values.push(self.evaluate(environment, component)?);
                }
                Ok(Value::Tuple(values))
            }

            Expression::FunctionCall(_)
            | Expression::MemberAccess { .. }
            | Expression::IndexAccess { .. }
            | Expression::Assignment { .. } => Err(EvaluationError::UnsupportedExpression {
                kind: expression.kind_name(),
                id: expression.id(),
            }),
        }
    }

    fn evaluate_condition(
        &mut self,
        environment: &dyn Environment,
        expression: &Expression,
    ) -> Result<bool, EvaluationError> {
        let value = self.evaluate(environment, expression)?;
        value
            .as_bool()
            .ok_or_else(|| EvaluationError::NonBooleanCondition(value.to_string()))
    }

    fn binary(
        &mut self,
        operator: BinaryOperator,
        left: &Value,
        right: &Value,
    ) -> Result<Value, EvaluationError> {
        match (left, right) {
            (Value::Integer(a), Value::Integer(b)) => self.integer_binary(operator, a, b),
            (Value::Bool(a), Value::Bool(b)) => match operator {
                BinaryOperator::Eq => Ok(Value::Bool(a == b)),
                BinaryOperator::Ne => Ok(Value::Bool(a != b)),
                _ => Err(EvaluationError::InvalidBinaryOperand {
                    operator,
                    operand: "bool".to_string(),
                }),
            },
            _ => Err(EvaluationError::TypeMismatch {
                operator,
                left: left.type_label(),
                right: right.type_label(),
            }),
        }
    }

    fn integer_binary(
        &mut self,
        operator: BinaryOperator,
        left: &IntegerValue,
        right: &IntegerValue,
    ) -> Result<Value, EvaluationError> {
        let ty = left.ty();
        let (a, b) = (left.value(), right.value());

        // The exponent may have any unsigned type; everything else needs equal types
        let types_agree = match operator {
            BinaryOperator::Exp => !right.ty().signed,
            _ => right.ty() == ty,
        };
        if !types_agree {
            return Err(EvaluationError::TypeMismatch {
                operator,
                left: ty.to_string(),
                right: right.ty().to_string(),
            });
        }

        let raw = match operator {
            BinaryOperator::Eq => return Ok(Value::Bool(a == b)),
            BinaryOperator::Ne => return Ok(Value::Bool(a != b)),
            BinaryOperator::Lt => return Ok(Value::Bool(a < b)),
            BinaryOperator::Le => return Ok(Value::Bool(a <= b)),
            BinaryOperator::Gt => return Ok(Value::Bool(a > b)),
            BinaryOperator::Ge => return Ok(Value::Bool(a >= b)),
            BinaryOperator::Add => a.checked_add(b),
            BinaryOperator::Sub => a.checked_sub(b),
            BinaryOperator::Mul => a.checked_mul(b),
            BinaryOperator::Div | BinaryOperator::Mod if b == 0 => {
                return self.handler.division_by_zero(operator, ty);
            }
            BinaryOperator::Div => a.checked_div(b),
            BinaryOperator::Mod => a.checked_rem(b),
            BinaryOperator::Exp => match a {
                _ if b == 0 => Some(1),
                0 | 1 => Some(a),
                -1 => Some(if b % 2 == 0 { 1 } else { -1 }),
                _ => u32::try_from(b).ok().and_then(|e| a.checked_pow(e)),
            },
            BinaryOperator::BitAnd => Some(a & b),
            BinaryOperator::BitOr => Some(a | b),
            BinaryOperator::BitXor => Some(a ^ b),
            BinaryOperator::Shl | BinaryOperator::Shr => {
                return Err(EvaluationError::UnsupportedOperator { operator });
            }
            BinaryOperator::And | BinaryOperator::Or => {
                return Err(EvaluationError::InvalidBinaryOperand {
                    operator,
                    operand: ty.to_string(),
                });
            }
        };

        self.checked_result(operator.symbol(), raw, ty)
    }

    fn unary(&mut self, operator: UnaryOperator, operand: &Value) -> Result<Value, EvaluationError> {
        match (operator, operand) {
            (UnaryOperator::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
            (UnaryOperator::Neg, Value::Integer(integer)) if integer.ty().signed => {
                self.checked_result("-", integer.value().checked_neg(), integer.ty())
            }
            (UnaryOperator::BitNot, Value::Integer(integer)) => {
                let ty = integer.ty();
                if ty.signed {
                    self.checked_result("~", Some(!integer.value()), ty)
                } else if ty.is_representable() {
                    self.checked_result("~", Some(ty.max() - integer.value()), ty)
                } else {
                    Err(EvaluationError::Unrepresentable {
                        operator: "~".to_string(),
                        ty,
                    })
                }
            }
            _ => Err(EvaluationError::InvalidUnaryOperand {
                operator,
                operand: operand.type_label(),
            }),
        }
    }

    fn checked_result(
        &mut self,
        operator: &str,
        raw: Option<i128>,
        ty: IntegerType,
    ) -> Result<Value, EvaluationError> {
        match raw {
            Some(value) if ty.contains(value) => Value::integer(value, ty),
            // Results beyond i128 on a wide type are a limit of this evaluator,
            // not an overflow of the program
            None if !ty.is_representable() => Err(EvaluationError::Unrepresentable {
                operator: operator.to_string(),
                ty,
            }),
            _ => self.handler.overflow(operator, ty),
        }
    }
}
