//! AST types for the filter DSL.

use std::fmt;

/// Operator token kinds shared by the lexer, parser and evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    And,    // and
    Or,     // or
    Not,    // not
    Has,    // has
    Lacks,  // lacks
    Eq,     // ==
    Ne,     // !=
    Gt,     // >
    Lt,     // <
    Ge,     // >=
    Le,     // <=
    LParen, // (
    RParen, // )
}

impl OperatorKind {
    /// The six integer comparison operators.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            OperatorKind::Eq
                | OperatorKind::Ne
                | OperatorKind::Gt
                | OperatorKind::Lt
                | OperatorKind::Ge
                | OperatorKind::Le
        )
    }

    pub fn symbol(self) -> &'static str {
        match self {
            OperatorKind::And => "and",
            OperatorKind::Or => "or",
            OperatorKind::Not => "not",
            OperatorKind::Has => "has",
            OperatorKind::Lacks => "lacks",
            OperatorKind::Eq => "==",
            OperatorKind::Ne => "!=",
            OperatorKind::Gt => ">",
            OperatorKind::Lt => "<",
            OperatorKind::Ge => ">=",
            OperatorKind::Le => "<=",
            OperatorKind::LParen => "(",
            OperatorKind::RParen => ")",
        }
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Parsed filter expression. Parentheses never appear as nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Bare or quoted literal: `Konami`, `"Data East"`, `1980`, `year`
    Literal { text: String },

    /// Prefix operator: `not x`, `has x`, `lacks x`
    Unary { op: OperatorKind, operand: Box<Node> },

    /// Infix operator: `x and y`, `x or y`, `x >= y`
    Binary {
        op: OperatorKind,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    pub fn literal(text: impl Into<String>) -> Self {
        Node::Literal { text: text.into() }
    }

    pub fn unary(op: OperatorKind, operand: Node) -> Self {
        Node::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: OperatorKind, left: Node, right: Node) -> Self {
        Node::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Node::Literal { .. })
    }

    /// Number of nodes in the tree.
    pub fn size(&self) -> usize {
        match self {
            Node::Literal { .. } => 1,
            Node::Unary { operand, .. } => 1 + operand.size(),
            Node::Binary { left, right, .. } => 1 + left.size() + right.size(),
        }
    }

    /// Longest root-to-leaf path, counting the root.
    pub fn depth(&self) -> usize {
        match self {
            Node::Literal { .. } => 1,
            Node::Unary { operand, .. } => 1 + operand.depth(),
            Node::Binary { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

/// Words the lexer turns into operators.
const RESERVED_WORDS: &[&str] = &["and", "or", "not", "has", "lacks"];

/// Whether `text` has to be quoted to lex back as a single literal.
fn needs_quotes(text: &str) -> bool {
    text.contains([' ', '/']) || RESERVED_WORDS.contains(&text)
}

/// Fully parenthesized rendering; parses back to an equal tree.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Literal { text } if needs_quotes(text) => write!(f, "\"{}\"", text),
            Node::Literal { text } => f.write_str(text),
            Node::Unary { op, operand } => write!(f, "({} {})", op, operand),
            Node::Binary { op, left, right } => write!(f, "({} {} {})", left, op, right),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_quotes_multi_word_literals() {
        let node = Node::binary(
            OperatorKind::Or,
            Node::unary(OperatorKind::Has, Node::literal("Data East")),
            Node::unary(
                OperatorKind::Not,
                Node::unary(OperatorKind::Has, Node::literal("Capcom")),
            ),
        );
        assert_eq!(
            node.to_string(),
            "((has \"Data East\") or (not (has Capcom)))"
        );
    }

    #[test]
    fn test_display_quotes_reserved_words() {
        let node = Node::binary(
            OperatorKind::And,
            Node::unary(OperatorKind::Has, Node::literal("and")),
            Node::unary(OperatorKind::Lacks, Node::literal("hasbro")),
        );
        assert_eq!(node.to_string(), "((has \"and\") and (lacks hasbro))");
    }

    #[test]
    fn test_size_and_depth() {
        let node = Node::binary(
            OperatorKind::And,
            Node::unary(OperatorKind::Has, Node::literal("A")),
            Node::literal("B"),
        );
        assert_eq!(node.size(), 4);
        assert_eq!(node.depth(), 3);
        assert!(!node.is_literal());
    }

    #[test]
    fn test_comparison_kinds() {
        assert!(OperatorKind::Ge.is_comparison());
        assert!(!OperatorKind::Has.is_comparison());
        assert_eq!(OperatorKind::Ne.to_string(), "!=");
    }
}
