//! Pratt parser for the filter DSL.
//!
//! Every token kind has a binding power and up to two behaviours:
//!
//! nud        = LITERAL | ("not" | "has" | "lacks") expr(bp) | "(" expr(0) ")"
//! led(left)  = ("and" | "or" | "==" | "!=" | ">" | "<" | ">=" | "<=") expr(bp)
//! expr(rbp)  = nud, then led while the next binding power exceeds rbp
//!
//! `not` binds at 60, `has` / `lacks` and comparisons at 50, `and` / `or` at 10.
//!
//! Nesting is capped at [`MAX_DEPTH`], both for the parser's own recursion
//! and for the depth of the tree it builds, so evaluating or dropping a
//! parsed tree stays within the stack.

use super::ast::{Node, OperatorKind};
use super::lexer::{Token, TokenKind};
use super::profile::Profile;
use crate::error::ParseError;

/// Deepest nesting a program may reach.
pub const MAX_DEPTH: usize = 256;

/// A parsed subtree and its depth.
type Parsed = (Node, usize);

/// Parser state. Owns the token stream and its cursor.
struct Parser<'p> {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    profile: &'p Profile,
}

impl<'p> Parser<'p> {
    fn new(tokens: Vec<Token>, profile: &'p Profile) -> Self {
        Parser {
            tokens,
            pos: 0,
            depth: 0,
            profile,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Result<Token, ParseError> {
        let tok = self.tokens.get(self.pos).cloned().ok_or(ParseError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(tok)
    }

    /// Binding power of the next token; literals and `End` never continue.
    fn peek_binding_power(&self) -> u8 {
        match self.peek().map(|t| t.kind) {
            Some(TokenKind::Operator(op)) => self.profile.binding_power(op),
            Some(TokenKind::Literal) | Some(TokenKind::End) | None => 0,
        }
    }

    /// Parse an expression whose operators bind tighter than `rbp`.
    fn parse_expr(&mut self, rbp: u8) -> Result<Parsed, ParseError> {
        if self.depth >= MAX_DEPTH {
            let offset = self.peek().map_or(0, |t| t.offset);
            return Err(ParseError::TooDeep { offset });
        }
        self.depth += 1;
        let parsed = self.parse_expr_at(rbp);
        self.depth -= 1;
        parsed
    }

    fn parse_expr_at(&mut self, rbp: u8) -> Result<Parsed, ParseError> {
        let tok = self.advance()?;
        let mut left = self.nud(tok)?;

        while self.peek_binding_power() > rbp {
            let tok = self.advance()?;
            left = self.led(tok, left)?;
        }

        Ok(left)
    }

    /// Depth of a node one level above `below`.
    fn deeper(below: usize, offset: usize) -> Result<usize, ParseError> {
        if below >= MAX_DEPTH {
            Err(ParseError::TooDeep { offset })
        } else {
            Ok(below + 1)
        }
    }

    fn check_supported(&self, op: OperatorKind) -> Result<(), ParseError> {
        if self.profile.supports(op) {
            Ok(())
        } else {
            Err(ParseError::UnsupportedOperator {
                op,
                profile: self.profile.id,
            })
        }
    }

    /// Prefix behaviour of `tok`.
    fn nud(&mut self, tok: Token) -> Result<Parsed, ParseError> {
        match tok.kind {
            TokenKind::Literal => Ok((Node::Literal { text: tok.text }, 1)),
            TokenKind::End => Err(ParseError::UnexpectedEnd),
            TokenKind::Operator(op) => {
                self.check_supported(op)?;
                let bp = self.profile.binding_power(op);
                match op {
                    OperatorKind::Not => {
                        let (operand, depth) = self.parse_expr(bp)?;
                        Ok((Node::unary(op, operand), Self::deeper(depth, tok.offset)?))
                    }
                    OperatorKind::Has | OperatorKind::Lacks => {
                        let (operand, depth) = self.parse_expr(bp)?;
                        if !operand.is_literal() {
                            return Err(ParseError::ExpectedLiteral { op });
                        }
                        Ok((Node::unary(op, operand), Self::deeper(depth, tok.offset)?))
                    }
                    OperatorKind::LParen => {
                        let inner = self.parse_expr(bp)?;
                        match self.peek().map(|t| t.kind) {
                            Some(TokenKind::Operator(OperatorKind::RParen)) => {
                                self.pos += 1;
                                Ok(inner)
                            }
                            _ => Err(ParseError::UnmatchedParen { offset: tok.offset }),
                        }
                    }
                    OperatorKind::And
                    | OperatorKind::Or
                    | OperatorKind::Eq
                    | OperatorKind::Ne
                    | OperatorKind::Gt
                    | OperatorKind::Lt
                    | OperatorKind::Ge
                    | OperatorKind::Le
                    | OperatorKind::RParen => Err(ParseError::UnexpectedToken {
                        found: tok.text,
                        offset: tok.offset,
                    }),
                }
            }
        }
    }

    /// Infix behaviour of `tok` given the already parsed `left`.
    fn led(&mut self, tok: Token, left: Parsed) -> Result<Parsed, ParseError> {
        let TokenKind::Operator(op) = tok.kind else {
            return Err(ParseError::UnexpectedToken {
                found: tok.text,
                offset: tok.offset,
            });
        };
        self.check_supported(op)?;
        let (left, left_depth) = left;
        let bp = self.profile.binding_power(op);

        match op {
            OperatorKind::And | OperatorKind::Or => {
                let (right, right_depth) = self.parse_expr(bp)?;
                let depth = Self::deeper(left_depth.max(right_depth), tok.offset)?;
                Ok((Node::binary(op, left, right), depth))
            }
            OperatorKind::Eq
            | OperatorKind::Ne
            | OperatorKind::Gt
            | OperatorKind::Lt
            | OperatorKind::Ge
            | OperatorKind::Le => {
                if !left.is_literal() {
                    return Err(ParseError::ExpectedLiteral { op });
                }
                let (right, right_depth) = self.parse_expr(bp)?;
                if !right.is_literal() {
                    return Err(ParseError::ExpectedLiteral { op });
                }
                let depth = Self::deeper(left_depth.max(right_depth), tok.offset)?;
                Ok((Node::binary(op, left, right), depth))
            }
            OperatorKind::Not
            | OperatorKind::Has
            | OperatorKind::Lacks
            | OperatorKind::LParen
            | OperatorKind::RParen => Err(ParseError::UnexpectedToken {
                found: tok.text,
                offset: tok.offset,
            }),
        }
    }
}

/// Parse a token stream (ending in `End`) into an AST.
///
/// Tokens left over after a complete expression are an error, and so is
/// nesting beyond [`MAX_DEPTH`].
pub fn parse_tokens(tokens: Vec<Token>, profile: &Profile) -> Result<Node, ParseError> {
    let mut parser = Parser::new(tokens, profile);
    let (ast, _) = parser.parse_expr(0)?;

    match parser.peek() {
        Some(tok) if tok.kind != TokenKind::End => Err(ParseError::TrailingInput {
            found: tok.text.clone(),
            offset: tok.offset,
        }),
        _ => Ok(ast),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::lexer::tokenize;
    use crate::dsl::profile::{NUMERIC_YEAR, SET_MEMBERSHIP, SUBSTRING};

    fn parse(input: &str, profile: &Profile) -> Result<Node, ParseError> {
        parse_tokens(tokenize(input, profile).unwrap(), profile)
    }

    fn has(text: &str) -> Node {
        Node::unary(OperatorKind::Has, Node::literal(text))
    }

    #[test]
    fn test_simple_has() {
        assert_eq!(parse("has Konami", &SUBSTRING), Ok(has("Konami")));
    }

    #[test]
    fn test_parentheses_are_transparent() {
        assert_eq!(parse("(has Konami)", &SUBSTRING), Ok(has("Konami")));
        assert_eq!(parse("((has Konami))", &SUBSTRING), Ok(has("Konami")));
        assert_eq!(parse("has (Konami)", &SUBSTRING), Ok(has("Konami")));
    }

    #[test]
    fn test_and_is_left_associative() {
        let flat = parse("has A and has B and has C", &SET_MEMBERSHIP).unwrap();
        let grouped = parse("(has A and has B) and has C", &SET_MEMBERSHIP).unwrap();
        let right = parse("has A and (has B and has C)", &SET_MEMBERSHIP).unwrap();
        assert_eq!(flat, grouped);
        assert_ne!(flat, right);
        assert_eq!(
            flat,
            Node::binary(
                OperatorKind::And,
                Node::binary(OperatorKind::And, has("A"), has("B")),
                has("C"),
            )
        );
    }

    #[test]
    fn test_and_or_share_precedence() {
        let ast = parse("has A or has B and has C", &SUBSTRING).unwrap();
        assert_eq!(ast.to_string(), "(((has A) or (has B)) and (has C))");
    }

    #[test]
    fn test_not_binds_tightest() {
        let ast = parse("not has X and has Y", &SUBSTRING).unwrap();
        assert_eq!(
            ast,
            Node::binary(
                OperatorKind::And,
                Node::unary(OperatorKind::Not, has("X")),
                has("Y"),
            )
        );
        assert_eq!(
            parse("not has X", &SUBSTRING),
            parse("not (has X)", &SUBSTRING)
        );
    }

    #[test]
    fn test_prefix_operators_nest() {
        let ast = parse("not not has X", &SUBSTRING).unwrap();
        assert_eq!(
            ast,
            Node::unary(OperatorKind::Not, Node::unary(OperatorKind::Not, has("X")))
        );
    }

    #[test]
    fn test_comparison_grouping() {
        let ast = parse("year >= 1980 and year < 1990", &NUMERIC_YEAR).unwrap();
        assert_eq!(
            ast.to_string(),
            "((year >= 1980) and (year < 1990))"
        );
        // `not` grabs `year` before `==` gets a chance
        assert_eq!(
            parse("not year == 1990", &NUMERIC_YEAR),
            Err(ParseError::ExpectedLiteral {
                op: OperatorKind::Eq
            })
        );
        let ast = parse("not (year == 1990)", &NUMERIC_YEAR).unwrap();
        assert_eq!(ast.to_string(), "(not (year == 1990))");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse("", &SUBSTRING), Err(ParseError::UnexpectedEnd));
    }

    #[test]
    fn test_missing_operand() {
        assert_eq!(parse("has", &SUBSTRING), Err(ParseError::UnexpectedEnd));
        assert_eq!(parse("year >=", &NUMERIC_YEAR), Err(ParseError::UnexpectedEnd));
        assert_eq!(
            parse("has A and", &SUBSTRING),
            Err(ParseError::UnexpectedEnd)
        );
    }

    #[test]
    fn test_unmatched_paren() {
        assert_eq!(
            parse("has A and (has B", &SUBSTRING),
            Err(ParseError::UnmatchedParen { offset: 10 })
        );
    }

    #[test]
    fn test_stray_close_paren() {
        assert_eq!(
            parse("has A)", &SUBSTRING),
            Err(ParseError::TrailingInput {
                found: ")".into(),
                offset: 5
            })
        );
        assert!(matches!(
            parse(")", &SUBSTRING),
            Err(ParseError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn test_trailing_tokens_rejected() {
        assert_eq!(
            parse("has Konami Capcom", &SUBSTRING),
            Err(ParseError::TrailingInput {
                found: "Capcom".into(),
                offset: 11
            })
        );
    }

    #[test]
    fn test_has_requires_literal() {
        assert_eq!(
            parse("has not A", &SUBSTRING),
            Err(ParseError::ExpectedLiteral {
                op: OperatorKind::Has
            })
        );
        assert_eq!(
            parse("lacks (has A)", &SUBSTRING),
            Err(ParseError::ExpectedLiteral {
                op: OperatorKind::Lacks
            })
        );
    }

    #[test]
    fn test_comparison_requires_literals() {
        assert_eq!(
            parse("year == 1992 == 1", &NUMERIC_YEAR),
            Err(ParseError::ExpectedLiteral {
                op: OperatorKind::Eq
            })
        );
        assert_eq!(
            parse("year == (year > 1)", &NUMERIC_YEAR),
            Err(ParseError::ExpectedLiteral {
                op: OperatorKind::Eq
            })
        );
    }

    #[test]
    fn test_operator_outside_profile() {
        assert_eq!(
            parse("has Konami", &NUMERIC_YEAR),
            Err(ParseError::UnsupportedOperator {
                op: OperatorKind::Has,
                profile: crate::dsl::ProfileId::NumericYear,
            })
        );
    }

    #[test]
    fn test_infix_in_prefix_position() {
        assert_eq!(
            parse("and has A", &SUBSTRING),
            Err(ParseError::UnexpectedToken {
                found: "and".into(),
                offset: 0
            })
        );
    }

    #[test]
    fn test_deep_prefix_nesting_is_rejected() {
        let program = format!("{}has X", "not ".repeat(10_000));
        assert!(matches!(
            parse(&program, &SUBSTRING),
            Err(ParseError::TooDeep { .. })
        ));
    }

    #[test]
    fn test_deep_parentheses_are_rejected() {
        let program = format!("{}has X{}", "(".repeat(30_000), ")".repeat(30_000));
        assert!(matches!(
            parse(&program, &SUBSTRING),
            Err(ParseError::TooDeep { .. })
        ));
    }

    #[test]
    fn test_long_chain_is_rejected() {
        let program = vec!["has X"; MAX_DEPTH + 1].join(" or ");
        assert!(matches!(
            parse(&program, &SET_MEMBERSHIP),
            Err(ParseError::TooDeep { .. })
        ));
    }

    #[test]
    fn test_nesting_within_limit() {
        let program = format!("{}has X", "not ".repeat(200));
        let ast = parse(&program, &SUBSTRING).unwrap();
        assert_eq!(ast.depth(), 202);

        let program = format!("{}has X{}", "(".repeat(200), ")".repeat(200));
        assert_eq!(parse(&program, &SUBSTRING), Ok(has("X")));

        let program = vec!["has X"; 100].join(" and ");
        assert_eq!(parse(&program, &SUBSTRING).unwrap().depth(), 101);
    }
}
