//! Evaluator for the filter DSL AST.

use std::collections::HashSet;

use super::ast::{Node, OperatorKind};
use super::profile::{Profile, Value, compare};
use crate::error::EvalTypeError;

/// Runtime subject a filter is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationContext<'a> {
    /// Free text searched by the substring profile.
    SingleString(&'a str),
    /// Tags matched exactly by the set-membership profile.
    StringSet(&'a HashSet<String>),
    /// Normalized year for the numeric profile.
    Number(i64),
}

impl EvaluationContext<'_> {
    pub fn kind_name(&self) -> &'static str {
        match self {
            EvaluationContext::SingleString(_) => "string",
            EvaluationContext::StringSet(_) => "set",
            EvaluationContext::Number(_) => "number",
        }
    }
}

/// Walks one tree against one context.
///
/// `and` / `or` short-circuit: the right operand is not visited once the left
/// one decides the result. `predicate_calls` makes that observable.
pub struct Evaluator<'p, 'c> {
    profile: &'p Profile,
    ctx: EvaluationContext<'c>,
    predicate_calls: usize,
}

impl<'p, 'c> Evaluator<'p, 'c> {
    pub fn new(profile: &'p Profile, ctx: EvaluationContext<'c>) -> Self {
        Evaluator {
            profile,
            ctx,
            predicate_calls: 0,
        }
    }

    /// Number of `has` / `lacks` checks performed so far.
    pub fn predicate_calls(&self) -> usize {
        self.predicate_calls
    }

    /// Evaluate `node` to a boolean verdict.
    pub fn evaluate(&mut self, node: &Node) -> Result<bool, EvalTypeError> {
        if !self.profile.accepts(&self.ctx) {
            return Err(self.profile.mismatch(&self.ctx));
        }
        self.boolean(node, "filter")
    }

    fn boolean(&mut self, node: &Node, operator: &'static str) -> Result<bool, EvalTypeError> {
        match self.value(node)? {
            Value::Bool(b) => Ok(b),
            other => Err(EvalTypeError::NotBoolean {
                operator,
                found: other.kind_name(),
            }),
        }
    }

    fn integer(&mut self, node: &Node, operator: OperatorKind) -> Result<i64, EvalTypeError> {
        match self.value(node)? {
            Value::Int(n) => Ok(n),
            other => Err(EvalTypeError::NotNumeric {
                operator,
                found: other.kind_name(),
            }),
        }
    }

    fn value<'n>(&mut self, node: &'n Node) -> Result<Value<'n>, EvalTypeError> {
        match node {
            Node::Literal { text } => self.profile.literal_value(text, &self.ctx),

            Node::Unary { op, operand } => match op {
                OperatorKind::Not => Ok(Value::Bool(!self.boolean(operand, "not")?)),
                OperatorKind::Has | OperatorKind::Lacks => {
                    // Only containment profiles produce text literals.
                    let Value::Text(needle) = self.value(operand)? else {
                        return Err(self.profile.mismatch(&self.ctx));
                    };
                    self.predicate_calls += 1;
                    let verdict = self.profile.predicate(*op, needle, &self.ctx)?;
                    tracing::trace!(op = %op, needle, verdict, "predicate");
                    Ok(Value::Bool(verdict))
                }
                other => Err(EvalTypeError::NotBoolean {
                    operator: other.symbol(),
                    found: "operator",
                }),
            },

            Node::Binary { op, left, right } => match op {
                OperatorKind::And => {
                    if !self.boolean(left, "and")? {
                        return Ok(Value::Bool(false));
                    }
                    Ok(Value::Bool(self.boolean(right, "and")?))
                }
                OperatorKind::Or => {
                    if self.boolean(left, "or")? {
                        return Ok(Value::Bool(true));
                    }
                    Ok(Value::Bool(self.boolean(right, "or")?))
                }
                op => {
                    let lhs = self.integer(left, *op)?;
                    let rhs = self.integer(right, *op)?;
                    compare(*op, lhs, rhs)
                        .map(Value::Bool)
                        .ok_or(EvalTypeError::NotNumeric {
                            operator: *op,
                            found: "operator",
                        })
                }
            },
        }
    }
}

/// Evaluate `node` under `profile` against `ctx`.
pub fn evaluate_node(
    node: &Node,
    ctx: &EvaluationContext<'_>,
    profile: &Profile,
) -> Result<bool, EvalTypeError> {
    Evaluator::new(profile, *ctx).evaluate(node)
}
