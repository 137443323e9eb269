//! sift - query filters for catalog records.
//!
//! A short query such as `has Konami and not has Capcom` or
//! `year >= 1980 and year < 1990` is compiled once into a [`Filter`] and then
//! evaluated against many records. See [`dsl`] for the query language.

pub mod catalog;
pub mod config;
pub mod dsl;
pub mod error;

pub use dsl::{EvaluationContext, Filter, FilterCache, ProfileId, evaluate, normalize_year, parse, run};
pub use error::{EngineError, EvalTypeError, ParseError, TokenizeError};
