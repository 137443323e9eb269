//! Compiled filters and the parse / evaluate / run entry points.

use super::ast::Node;
use super::eval::{EvaluationContext, Evaluator};
use super::lexer::tokenize;
use super::parser::parse_tokens;
use super::profile::ProfileId;
use crate::error::{EngineError, EvalTypeError, Result};

/// A parsed program, ready to be evaluated many times.
///
/// Immutable once built, so it can be shared across threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    source: String,
    profile: ProfileId,
    root: Node,
}

impl Filter {
    /// Tokenize and parse `source` under `profile`.
    pub fn compile(source: &str, profile: ProfileId) -> Result<Self> {
        let rules = profile.profile();
        let tokens = tokenize(source, rules)?;
        let token_count = tokens.len();
        let root = parse_tokens(tokens, rules)?;

        tracing::debug!(
            source,
            %profile,
            tokens = token_count,
            nodes = root.size(),
            tree = %root,
            "compiled filter"
        );

        Ok(Filter {
            source: source.to_string(),
            profile,
            root,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn profile(&self) -> ProfileId {
        self.profile
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Evaluate against one record's context.
    pub fn evaluate(&self, ctx: &EvaluationContext<'_>) -> std::result::Result<bool, EvalTypeError> {
        self.evaluator(*ctx).evaluate(&self.root)
    }

    /// An evaluator bound to this filter's profile, for callers that want
    /// to inspect predicate counts.
    pub fn evaluator<'c>(&self, ctx: EvaluationContext<'c>) -> Evaluator<'static, 'c> {
        Evaluator::new(self.profile.profile(), ctx)
    }
}

/// Compile `program` under `profile`.
pub fn parse(program: &str, profile: ProfileId) -> Result<Filter> {
    Filter::compile(program, profile)
}

/// Evaluate a compiled filter against `ctx`.
pub fn evaluate(
    filter: &Filter,
    ctx: &EvaluationContext<'_>,
) -> std::result::Result<bool, EvalTypeError> {
    filter.evaluate(ctx)
}

/// Compile and evaluate in one step, for one-shot filters.
pub fn run(program: &str, ctx: &EvaluationContext<'_>, profile: ProfileId) -> Result<bool> {
    let filter = parse(program, profile)?;
    filter.evaluate(ctx).map_err(EngineError::from)
}
