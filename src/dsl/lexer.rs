//! Lexer/tokenizer for the filter DSL.

use winnow::ascii::multispace0;
use winnow::combinator::{alt, delimited, opt};
use winnow::prelude::*;
use winnow::token::take_while;

use super::ast::OperatorKind;
use super::profile::Profile;
use crate::error::TokenizeError;

/// Token kinds produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Literal,
    Operator(OperatorKind),
    End,
}

/// A token and the byte offset it starts at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub offset: usize,
}

impl Token {
    fn new(kind: TokenKind, text: &str) -> Self {
        Token {
            kind,
            text: text.to_string(),
            offset: 0,
        }
    }

    fn operator(op: OperatorKind) -> Self {
        Token::new(TokenKind::Operator(op), op.symbol())
    }
}

// Error type shared by the token parsers
type PResult<T> = Result<T, winnow::error::ErrMode<winnow::error::ContextError>>;

/// Characters allowed in a bare literal.
fn is_bare_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '.' | '_' | '-' | '&')
}

/// Characters allowed between quotes.
fn is_quoted_char(c: char) -> bool {
    is_bare_char(c) || matches!(c, ' ' | '/')
}

/// Lex a bare word; reserved words only match when they are the whole word.
fn lex_word(input: &mut &str) -> PResult<Token> {
    let word = take_while(1.., is_bare_char).parse_next(input)?;
    let token = match word {
        "and" => Token::operator(OperatorKind::And),
        "or" => Token::operator(OperatorKind::Or),
        "not" => Token::operator(OperatorKind::Not),
        "has" => Token::operator(OperatorKind::Has),
        "lacks" => Token::operator(OperatorKind::Lacks),
        literal => Token::new(TokenKind::Literal, literal),
    };
    Ok(token)
}

/// Lex a quoted literal, stripping the quotes.
fn lex_quoted(input: &mut &str) -> PResult<Token> {
    delimited('"', take_while(1.., is_quoted_char), '"')
        .map(|text: &str| Token::new(TokenKind::Literal, text))
        .parse_next(input)
}

fn lex_paren(input: &mut &str) -> PResult<Token> {
    alt((
        "(".value(Token::operator(OperatorKind::LParen)),
        ")".value(Token::operator(OperatorKind::RParen)),
    ))
    .parse_next(input)
}

/// Lex a comparison operator, two-character forms first.
fn lex_comparison(input: &mut &str) -> PResult<Token> {
    alt((
        "==".value(Token::operator(OperatorKind::Eq)),
        "!=".value(Token::operator(OperatorKind::Ne)),
        ">=".value(Token::operator(OperatorKind::Ge)),
        "<=".value(Token::operator(OperatorKind::Le)),
        ">".value(Token::operator(OperatorKind::Gt)),
        "<".value(Token::operator(OperatorKind::Lt)),
    ))
    .parse_next(input)
}

/// Lex a single token, or `None` at end of input.
fn lex_token(input: &mut &str, comparisons: bool) -> PResult<Option<Token>> {
    multispace0.parse_next(input)?;

    if input.is_empty() {
        return Ok(None);
    }

    if comparisons {
        if let Some(tok) = opt(lex_comparison).parse_next(input)? {
            return Ok(Some(tok));
        }
    }

    alt((lex_paren, lex_quoted, lex_word))
        .map(Some)
        .parse_next(input)
}

/// Tokenize the entire input. The last token is always `End`.
pub fn tokenize(input: &str, profile: &Profile) -> Result<Vec<Token>, TokenizeError> {
    let mut remaining = input;
    let mut tokens = Vec::new();

    loop {
        let before = remaining;
        match lex_token(&mut remaining, profile.comparisons) {
            Ok(Some(mut tok)) => {
                tok.offset = input.len() - skip_blanks(before).len();
                tokens.push(tok);
            }
            Ok(None) => break,
            Err(_) => {
                let rest = skip_blanks(before);
                let offset = input.len() - rest.len();
                let fragment = rest.split_whitespace().next().unwrap_or(rest);
                return Err(TokenizeError {
                    offset,
                    fragment: fragment.to_string(),
                });
            }
        }
    }

    tokens.push(Token {
        kind: TokenKind::End,
        text: String::new(),
        offset: input.len(),
    });
    Ok(tokens)
}

/// The whitespace `multispace0` skips ahead of a token.
fn skip_blanks(input: &str) -> &str {
    input.trim_start_matches([' ', '\t', '\r', '\n'])
}
