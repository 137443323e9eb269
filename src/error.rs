//! Error types for the filter engine.
//!
//! Each stage has its own error kind: lexical, syntactic and semantic
//! failures never overlap. `EngineError` wraps them for the combined calls.

use thiserror::Error;

use crate::dsl::{OperatorKind, ProfileId};

/// Lexical failure: no token alternative matched at `offset`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognized input at offset {offset}: '{fragment}'")]
pub struct TokenizeError {
    pub offset: usize,
    pub fragment: String,
}

/// Syntactic failure: the token sequence does not fit the grammar.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("unexpected '{found}' at offset {offset}")]
    UnexpectedToken { found: String, offset: usize },

    #[error("missing ')' for '(' at offset {offset}")]
    UnmatchedParen { offset: usize },

    #[error("operator '{op}' is not available in the {profile} profile")]
    UnsupportedOperator { op: OperatorKind, profile: ProfileId },

    #[error("operator '{op}' expects a literal operand")]
    ExpectedLiteral { op: OperatorKind },

    #[error("unexpected '{found}' at offset {offset} after a complete expression")]
    TrailingInput { found: String, offset: usize },

    #[error("expression nested deeper than {} levels at offset {offset}", crate::dsl::MAX_DEPTH)]
    TooDeep { offset: usize },
}

/// Semantic failure: an operator received a value of the wrong runtime kind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalTypeError {
    #[error("'{operator}' expects a boolean operand, found {found}")]
    NotBoolean {
        operator: &'static str,
        found: &'static str,
    },

    #[error("'{operator}' expects an integer operand, found {found}")]
    NotNumeric {
        operator: OperatorKind,
        found: &'static str,
    },

    #[error("'{text}' is not an integer")]
    NotAnInteger { text: String },

    #[error("{profile} filter cannot be evaluated against a {context} context")]
    ContextMismatch {
        profile: ProfileId,
        context: &'static str,
    },
}

/// Any failure of the combined `parse` / `run` calls.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("tokenize error: {0}")]
    Tokenize(#[from] TokenizeError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("evaluation error: {0}")]
    Eval(#[from] EvalTypeError),
}

/// Result type alias for the engine's combined calls.
pub type Result<T> = std::result::Result<T, EngineError>;
