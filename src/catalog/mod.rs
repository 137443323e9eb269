//! Catalog records and the mapping from record fields to filter contexts.
//!
//! Records are JSON objects, one per line. Each clause of a filter reads one
//! field and turns it into the context its profile expects.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::io::BufRead;

use crate::config::{CompiledFilter, MatchMode};
use crate::dsl::{EvaluationContext, ProfileId, normalize_year};
use crate::error::EvalTypeError;

/// A catalog line and its parsed fields.
#[derive(Debug, Clone)]
pub struct Record {
    /// 1-based line number in the input.
    pub line: usize,
    pub raw: String,
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn parse(line: usize, raw: String) -> Result<Self> {
        let fields = match serde_json::from_str::<Value>(&raw)
            .with_context(|| format!("Catalog: Invalid JSON on line {}", line))?
        {
            Value::Object(fields) => fields,
            other => anyhow::bail!(
                "Catalog: Line {} is not a JSON object (found {})",
                line,
                json_kind(&other)
            ),
        };
        Ok(Record { line, raw, fields })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Read the non-blank lines of a JSON-lines catalog, keeping line numbers.
pub fn read_lines<R: BufRead>(reader: R) -> Result<Vec<(usize, String)>> {
    let mut lines = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Catalog: Failed to read line {}", i + 1))?;
        if !line.trim().is_empty() {
            lines.push((i + 1, line));
        }
    }
    Ok(lines)
}

/// Owned context built from one field; borrow it with [`FieldContext::as_context`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldContext {
    Text(String),
    Set(HashSet<String>),
    Year(i64),
}

impl FieldContext {
    pub fn from_field(value: Option<&Value>, profile: ProfileId) -> Self {
        match profile {
            ProfileId::Substring => FieldContext::Text(match value {
                None | Some(Value::Null) => String::new(),
                Some(Value::Array(items)) => items
                    .iter()
                    .map(scalar_text)
                    .collect::<Vec<_>>()
                    .join(" "),
                Some(other) => scalar_text(other),
            }),
            ProfileId::SetMembership => FieldContext::Set(match value {
                None | Some(Value::Null) => HashSet::new(),
                Some(Value::Array(items)) => items.iter().map(scalar_text).collect(),
                Some(other) => HashSet::from([scalar_text(other)]),
            }),
            ProfileId::NumericYear => FieldContext::Year(match value {
                Some(Value::String(s)) => normalize_year(s),
                Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
                _ => 0,
            }),
        }
    }

    pub fn as_context(&self) -> EvaluationContext<'_> {
        match self {
            FieldContext::Text(text) => EvaluationContext::SingleString(text),
            FieldContext::Set(set) => EvaluationContext::StringSet(set),
            FieldContext::Year(year) => EvaluationContext::Number(*year),
        }
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Whether `record` passes `filter`. Clauses short-circuit in order.
pub fn record_matches(filter: &CompiledFilter, record: &Record) -> Result<bool, EvalTypeError> {
    let verdicts = filter.clauses.iter().map(|clause| {
        let ctx = FieldContext::from_field(
            record.fields.get(&clause.field),
            clause.filter.profile(),
        );
        clause.filter.evaluate(&ctx.as_context())
    });

    match filter.mode {
        MatchMode::All => {
            for verdict in verdicts {
                if !verdict? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        MatchMode::Any => {
            if filter.clauses.is_empty() {
                return Ok(true);
            }
            for verdict in verdicts {
                if verdict? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
    }
}
