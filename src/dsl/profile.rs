//! Profiles: which operators a filter may use and what its literals mean.
//!
//! The tokenizer, parser and evaluator are shared; a `Profile` supplies the
//! operator set, whether comparison tokens exist, how literal text becomes a
//! runtime value, and the containment predicate behind `has` / `lacks`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ast::OperatorKind;
use super::eval::EvaluationContext;
use crate::error::EvalTypeError;

/// Identifier the numeric profile resolves to the context integer.
pub const YEAR_IDENT: &str = "year";

/// Binding powers of the Pratt parser. Data, not algorithm.
pub const fn binding_power(op: OperatorKind) -> u8 {
    match op {
        OperatorKind::LParen | OperatorKind::RParen => 0,
        OperatorKind::And | OperatorKind::Or => 10,
        OperatorKind::Eq
        | OperatorKind::Ne
        | OperatorKind::Gt
        | OperatorKind::Lt
        | OperatorKind::Ge
        | OperatorKind::Le => 50,
        OperatorKind::Has | OperatorKind::Lacks => 50,
        OperatorKind::Not => 60,
    }
}

/// Selects one of the built-in profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileId {
    /// Context is a single string; `has x` is substring containment.
    Substring,
    /// Context is a set of strings; `has x` is exact membership.
    SetMembership,
    /// Context is an integer; literals are integers or `year`.
    NumericYear,
}

impl ProfileId {
    pub fn profile(self) -> &'static Profile {
        match self {
            ProfileId::Substring => &SUBSTRING,
            ProfileId::SetMembership => &SET_MEMBERSHIP,
            ProfileId::NumericYear => &NUMERIC_YEAR,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ProfileId::Substring => "substring",
            ProfileId::SetMembership => "set_membership",
            ProfileId::NumericYear => "numeric_year",
        }
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ProfileId {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().replace('-', "_").as_str() {
            "substring" => Ok(ProfileId::Substring),
            "set_membership" | "set" => Ok(ProfileId::SetMembership),
            "numeric_year" | "year" => Ok(ProfileId::NumericYear),
            _ => Err(format!("invalid profile: {value}")),
        }
    }
}

/// Runtime value produced while walking the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value<'a> {
    Bool(bool),
    Text(&'a str),
    Int(i64),
}

impl Value<'_> {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "boolean",
            Value::Text(_) => "string",
            Value::Int(_) => "integer",
        }
    }
}

/// Operator set and literal/predicate semantics of one filter flavour.
#[derive(Debug)]
pub struct Profile {
    pub id: ProfileId,
    pub operators: &'static [OperatorKind],
    /// Whether the tokenizer recognizes `==`, `!=`, `>=`, `<=`, `>`, `<`.
    pub comparisons: bool,
}

const CONTAINMENT_OPERATORS: &[OperatorKind] = &[
    OperatorKind::Has,
    OperatorKind::Lacks,
    OperatorKind::Not,
    OperatorKind::And,
    OperatorKind::Or,
    OperatorKind::LParen,
    OperatorKind::RParen,
];

const NUMERIC_OPERATORS: &[OperatorKind] = &[
    OperatorKind::Not,
    OperatorKind::And,
    OperatorKind::Or,
    OperatorKind::Eq,
    OperatorKind::Ne,
    OperatorKind::Gt,
    OperatorKind::Lt,
    OperatorKind::Ge,
    OperatorKind::Le,
    OperatorKind::LParen,
    OperatorKind::RParen,
];

pub static SUBSTRING: Profile = Profile {
    id: ProfileId::Substring,
    operators: CONTAINMENT_OPERATORS,
    comparisons: false,
};

pub static SET_MEMBERSHIP: Profile = Profile {
    id: ProfileId::SetMembership,
    operators: CONTAINMENT_OPERATORS,
    comparisons: false,
};

pub static NUMERIC_YEAR: Profile = Profile {
    id: ProfileId::NumericYear,
    operators: NUMERIC_OPERATORS,
    comparisons: true,
};

impl Profile {
    pub fn supports(&self, op: OperatorKind) -> bool {
        self.operators.contains(&op)
    }

    /// Binding power of `op` under this profile. Every profile shares the
    /// same table; see [`binding_power`].
    pub fn binding_power(&self, op: OperatorKind) -> u8 {
        binding_power(op)
    }

    /// Whether `ctx` has the shape this profile evaluates against.
    pub fn accepts(&self, ctx: &EvaluationContext<'_>) -> bool {
        matches!(
            (self.id, ctx),
            (ProfileId::Substring, EvaluationContext::SingleString(_))
                | (ProfileId::SetMembership, EvaluationContext::StringSet(_))
                | (ProfileId::NumericYear, EvaluationContext::Number(_))
        )
    }

    /// Runtime value of a literal's text.
    pub fn literal_value<'a>(
        &self,
        text: &'a str,
        ctx: &EvaluationContext<'_>,
    ) -> Result<Value<'a>, EvalTypeError> {
        match self.id {
            ProfileId::Substring | ProfileId::SetMembership => Ok(Value::Text(text)),
            ProfileId::NumericYear => {
                if text == YEAR_IDENT {
                    return match ctx {
                        EvaluationContext::Number(n) => Ok(Value::Int(*n)),
                        other => Err(self.mismatch(other)),
                    };
                }
                text.parse::<i64>()
                    .map(Value::Int)
                    .map_err(|_| EvalTypeError::NotAnInteger {
                        text: text.to_string(),
                    })
            }
        }
    }

    /// Containment predicate behind `has` and `lacks`.
    pub fn predicate(
        &self,
        op: OperatorKind,
        needle: &str,
        ctx: &EvaluationContext<'_>,
    ) -> Result<bool, EvalTypeError> {
        match (self.id, op, ctx) {
            (ProfileId::Substring, OperatorKind::Has, EvaluationContext::SingleString(s)) => {
                Ok(s.contains(needle))
            }
            (ProfileId::Substring, OperatorKind::Lacks, EvaluationContext::SingleString(s)) => {
                Ok(s.find(needle).is_none())
            }
            (ProfileId::SetMembership, OperatorKind::Has, EvaluationContext::StringSet(set)) => {
                Ok(set.contains(needle))
            }
            (ProfileId::SetMembership, OperatorKind::Lacks, EvaluationContext::StringSet(set)) => {
                Ok(!set.iter().any(|member| member == needle))
            }
            (_, OperatorKind::Has | OperatorKind::Lacks, other) => Err(self.mismatch(other)),
            (_, op, _) => Err(EvalTypeError::NotNumeric {
                operator: op,
                found: "string",
            }),
        }
    }

    pub(crate) fn mismatch(&self, ctx: &EvaluationContext<'_>) -> EvalTypeError {
        EvalTypeError::ContextMismatch {
            profile: self.id,
            context: ctx.kind_name(),
        }
    }
}

/// Integer comparison for the six comparison operators.
pub fn compare(op: OperatorKind, left: i64, right: i64) -> Option<bool> {
    match op {
        OperatorKind::Eq => Some(left == right),
        OperatorKind::Ne => Some(left != right),
        OperatorKind::Gt => Some(left > right),
        OperatorKind::Lt => Some(left < right),
        OperatorKind::Ge => Some(left >= right),
        OperatorKind::Le => Some(left <= right),
        _ => None,
    }
}

/// Normalize a catalog year string before building a numeric context.
///
/// `"1992"` and `"1992?"` become 1992; anything else (`"198?"`, `"????"`,
/// `"None"`, empty) becomes 0.
pub fn normalize_year(raw: &str) -> i64 {
    let digits = raw.strip_suffix('?').unwrap_or(raw);
    if digits.len() == 4 && digits.bytes().all(|b| b.is_ascii_digit()) {
        digits.parse().unwrap_or(0)
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_binding_power_table() {
        assert_eq!(binding_power(OperatorKind::LParen), 0);
        assert_eq!(binding_power(OperatorKind::RParen), 0);
        assert_eq!(binding_power(OperatorKind::And), 10);
        assert_eq!(binding_power(OperatorKind::Or), 10);
        assert_eq!(binding_power(OperatorKind::Ge), 50);
        assert_eq!(binding_power(OperatorKind::Has), 50);
        assert_eq!(binding_power(OperatorKind::Lacks), 50);
        assert_eq!(binding_power(OperatorKind::Not), 60);
    }

    #[test]
    fn test_profiles_share_binding_powers() {
        for profile in [&SUBSTRING, &SET_MEMBERSHIP, &NUMERIC_YEAR] {
            assert_eq!(profile.binding_power(OperatorKind::Not), 60);
            assert_eq!(profile.binding_power(OperatorKind::Or), 10);
            assert_eq!(profile.binding_power(OperatorKind::Eq), 50);
        }
    }

    #[test]
    fn test_operator_sets() {
        assert!(SUBSTRING.supports(OperatorKind::Has));
        assert!(!SUBSTRING.supports(OperatorKind::Ge));
        assert!(NUMERIC_YEAR.supports(OperatorKind::Le));
        assert!(!NUMERIC_YEAR.supports(OperatorKind::Lacks));
        assert!(!SET_MEMBERSHIP.comparisons);
    }

    #[test]
    fn test_profile_id_from_str() {
        assert_eq!("substring".parse::<ProfileId>(), Ok(ProfileId::Substring));
        assert_eq!("set-membership".parse::<ProfileId>(), Ok(ProfileId::SetMembership));
        assert_eq!("NUMERIC_YEAR".parse::<ProfileId>(), Ok(ProfileId::NumericYear));
        assert!("regex".parse::<ProfileId>().is_err());
        assert_eq!(ProfileId::SetMembership.to_string(), "set_membership");
    }

    #[test]
    fn test_numeric_literals() {
        let ctx = EvaluationContext::Number(1985);
        assert_eq!(NUMERIC_YEAR.literal_value("year", &ctx), Ok(Value::Int(1985)));
        assert_eq!(NUMERIC_YEAR.literal_value("-12", &ctx), Ok(Value::Int(-12)));
        assert_eq!(
            NUMERIC_YEAR.literal_value("Konami", &ctx),
            Err(EvalTypeError::NotAnInteger {
                text: "Konami".into()
            })
        );
        assert_eq!(SUBSTRING.literal_value("year", &ctx), Ok(Value::Text("year")));
    }

    #[test]
    fn test_has_and_lacks_are_complements() {
        let set: HashSet<String> = ["Konami".to_string()].into();
        let ctx = EvaluationContext::StringSet(&set);
        for needle in ["Konami", "Kona", "Capcom", ""] {
            let has = SET_MEMBERSHIP.predicate(OperatorKind::Has, needle, &ctx).unwrap();
            let lacks = SET_MEMBERSHIP.predicate(OperatorKind::Lacks, needle, &ctx).unwrap();
            assert_ne!(has, lacks, "needle: {needle}");
        }

        let ctx = EvaluationContext::SingleString("Konami (Japan)");
        for needle in ["Konami", "Japan", "Capcom", ""] {
            let has = SUBSTRING.predicate(OperatorKind::Has, needle, &ctx).unwrap();
            let lacks = SUBSTRING.predicate(OperatorKind::Lacks, needle, &ctx).unwrap();
            assert_ne!(has, lacks, "needle: {needle}");
        }
    }

    #[test]
    fn test_predicate_rejects_wrong_context() {
        let ctx = EvaluationContext::Number(3);
        assert_eq!(
            SUBSTRING.predicate(OperatorKind::Has, "x", &ctx),
            Err(EvalTypeError::ContextMismatch {
                profile: ProfileId::Substring,
                context: "number",
            })
        );
    }

    #[test]
    fn test_normalize_year() {
        assert_eq!(normalize_year("1992"), 1992);
        assert_eq!(normalize_year("1992?"), 1992);
        assert_eq!(normalize_year("198?"), 0);
        assert_eq!(normalize_year("????"), 0);
        assert_eq!(normalize_year("None"), 0);
        assert_eq!(normalize_year(""), 0);
        assert_eq!(normalize_year("19922"), 0);
        assert_eq!(normalize_year("1992??"), 0);
    }

    #[test]
    fn test_compare() {
        assert_eq!(compare(OperatorKind::Ge, 1990, 1990), Some(true));
        assert_eq!(compare(OperatorKind::Lt, 1990, 1980), Some(false));
        assert_eq!(compare(OperatorKind::And, 1, 1), None);
    }
}
