//! Filter DSL for catalog records.
//!
//! Syntax:
//!   has x, lacks x          - containment (substring and set profiles)
//!   "multi word"            - quoted literal
//!   year >= 1980, x == y    - integer comparison (numeric profile)
//!   a and b, a or b         - same precedence, left to right
//!   not a                   - negation, binds tighter than has/lacks
//!   (a)                     - grouping
//!
//! A program is compiled once into a [`Filter`] and evaluated against any
//! number of [`EvaluationContext`]s.

mod ast;
pub mod cache;
mod eval;
mod filter;
mod lexer;
mod parser;
mod profile;


pub use ast::*;
pub use cache::FilterCache;
pub use eval::{EvaluationContext, Evaluator, evaluate_node};
pub use filter::{Filter, evaluate, parse, run};
pub use lexer::{Token, TokenKind, tokenize};
pub use parser::{MAX_DEPTH, parse_tokens};
pub use profile::{Profile, ProfileId, Value, YEAR_IDENT, binding_power, normalize_year};
