//! Rule text to [`RuleTree`].
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! union        := intersection (':' intersection)*
//! intersection := unary unary*
//! unary        := '#' unary | primary
//! primary      := signed-integer | '(' union ')'
//! ```
//!
//! Juxtaposition is intersection, so `-1 -2 : 3` reads `(-1 -2) : 3`.

use super::{NodeId, RuleTree};
use crate::error::{Result, ShapeError};

/// Deepest allowed stack of open brackets and `#` operators.
pub const MAX_NESTING: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Surface(i32),
    Union,
    Complement,
    Open,
    Close,
}

fn syntax(offset: usize, message: impl Into<String>) -> ShapeError {
    ShapeError::RuleSyntax {
        offset,
        message: message.into(),
    }
}

fn tokenize(text: &str) -> Result<Vec<(usize, Token)>> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        match c {
            b' ' | b'\t' | b'\n' | b'\r' => i += 1,
            b':' => {
                tokens.push((i, Token::Union));
                i += 1;
            }
            b'#' => {
                tokens.push((i, Token::Complement));
                i += 1;
            }
            b'(' => {
                tokens.push((i, Token::Open));
                i += 1;
            }
            b')' => {
                tokens.push((i, Token::Close));
                i += 1;
            }
            b'-' | b'+' | b'0'..=b'9' => {
                let start = i;
                i += 1;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                let word = &text[start..i];
                let value: i32 = word
                    .parse()
                    .map_err(|_| syntax(start, format!("bad surface number `{word}`")))?;
                if value == 0 {
                    return Err(syntax(start, "surface number 0 is not allowed"));
                }
                tokens.push((start, Token::Surface(value)));
            }
            _ => {
                let ch = text[i..].chars().next().unwrap_or('?');
                return Err(syntax(i, format!("unexpected character `{ch}`")));
            }
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [(usize, Token)],
    pos: usize,
    end: usize,
    depth: usize,
    tree: RuleTree,
}

impl Parser<'_> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).map(|(_, t)| *t)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |(o, _)| *o)
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth == MAX_NESTING {
            return Err(syntax(
                self.offset(),
                format!("nesting deeper than {MAX_NESTING} levels"),
            ));
        }
        self.depth += 1;
        Ok(())
    }

    fn union(&mut self) -> Result<NodeId> {
        let mut node = self.intersection()?;
        while self.peek() == Some(Token::Union) {
            self.pos += 1;
            let rhs = self.intersection()?;
            node = self.tree.union(node, rhs);
        }
        Ok(node)
    }

    fn intersection(&mut self) -> Result<NodeId> {
        let mut node = self.unary()?;
        while matches!(
            self.peek(),
            Some(Token::Surface(_) | Token::Complement | Token::Open)
        ) {
            let rhs = self.unary()?;
            node = self.tree.intersection(node, rhs);
        }
        Ok(node)
    }

    fn unary(&mut self) -> Result<NodeId> {
        if self.peek() == Some(Token::Complement) {
            self.enter()?;
            self.pos += 1;
            let inner = self.unary()?;
            self.depth -= 1;
            return Ok(self.tree.complement(inner));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<NodeId> {
        let offset = self.offset();
        match self.peek() {
            Some(Token::Surface(n)) => {
                self.pos += 1;
                Ok(self.tree.leaf(n))
            }
            Some(Token::Open) => {
                self.enter()?;
                self.pos += 1;
                if self.peek() == Some(Token::Close) {
                    return Err(syntax(offset, "empty group"));
                }
                let node = self.union()?;
                if self.peek() != Some(Token::Close) {
                    return Err(syntax(offset, "unbalanced `(`"));
                }
                self.pos += 1;
                self.depth -= 1;
                Ok(node)
            }
            Some(Token::Close) => Err(syntax(offset, "unbalanced `)`")),
            Some(Token::Union) => Err(syntax(offset, "`:` is missing its left operand")),
            Some(Token::Complement) => Err(syntax(offset, "misplaced `#`")),
            None => Err(syntax(offset, "rule ends where an operand was expected")),
        }
    }
}

impl RuleTree {
    /// Build a tree from rule text such as `-1 2 (#(-3) : 4)`.
    ///
    /// Surface numbers are signed (`-3` is the negative side of surface 3);
    /// whitespace means intersection, `:` union, and `#` complements the
    /// following group or surface. The tree is not yet bound to surfaces;
    /// see [`RuleTree::populate`].
    pub fn parse(text: &str) -> Result<RuleTree> {
        let tokens = tokenize(text)?;
        if tokens.is_empty() {
            return Err(ShapeError::EmptyRuleTree);
        }
        let mut parser = Parser {
            tokens: &tokens,
            pos: 0,
            end: text.len(),
            depth: 0,
            tree: RuleTree::new(),
        };
        let root = parser.union()?;
        if parser.pos != tokens.len() {
            let offset = parser.offset();
            return Err(match parser.peek() {
                Some(Token::Close) => syntax(offset, "unbalanced `)`"),
                _ => syntax(offset, "rule does not reduce to a single expression"),
            });
        }
        parser.tree.set_root(root);
        Ok(parser.tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleKind;
    use std::collections::BTreeMap;

    fn truth_table(tree: &RuleTree, keys: &[i32]) -> Vec<bool> {
        (0..1u32 << keys.len())
            .map(|mask| {
                let states: BTreeMap<i32, bool> = keys
                    .iter()
                    .enumerate()
                    .map(|(i, k)| (*k, mask & (1 << i) != 0))
                    .collect();
                tree.is_valid_with(&states).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_single_leaf() {
        let t = RuleTree::parse("-4").unwrap();
        let root = t.root().unwrap();
        assert!(matches!(
            t.node(root).unwrap().kind,
            RuleKind::Surface { key: 4, .. }
        ));
    }

    #[test]
    fn test_bracketed_intersection_is_equivalent() {
        let plain = RuleTree::parse("-1 2").unwrap();
        let bracketed = RuleTree::parse("((-1) (2))").unwrap();
        assert_eq!(truth_table(&plain, &[1, 2]), truth_table(&bracketed, &[1, 2]));
    }

    #[test]
    fn test_union_binds_loosest() {
        let t = RuleTree::parse("-1 -2 : 3").unwrap();
        let explicit = RuleTree::parse("(-1 -2) : 3").unwrap();
        let other = RuleTree::parse("-1 (-2 : 3)").unwrap();
        let keys = [1, 2, 3];
        assert_eq!(truth_table(&t, &keys), truth_table(&explicit, &keys));
        assert_ne!(truth_table(&t, &keys), truth_table(&other, &keys));
    }

    #[test]
    fn test_complement_of_group_and_token() {
        let group = RuleTree::parse("#(-1 -2)").unwrap();
        let demorgan = RuleTree::parse("1 : 2").unwrap();
        assert_eq!(truth_table(&group, &[1, 2]), truth_table(&demorgan, &[1, 2]));

        let token = RuleTree::parse("#-1").unwrap();
        let flipped = RuleTree::parse("1").unwrap();
        assert_eq!(truth_table(&token, &[1]), truth_table(&flipped, &[1]));
    }

    #[test]
    fn test_display_round_trip() {
        for text in ["-1 -2 (3 : -4)", "#(-1 : 2) 3", "-1 : -2 -3"] {
            let t = RuleTree::parse(text).unwrap();
            let again = RuleTree::parse(&t.to_string()).unwrap();
            let keys = t.surface_keys();
            assert_eq!(truth_table(&t, &keys), truth_table(&again, &keys), "{text}");
        }
    }

    #[test]
    fn test_syntax_errors() {
        for bad in ["(-1 -2", "-1 -2)", "()", "-1 :", ": 2", "#", "-1 x 2", "1 0", "99999999999"] {
            assert!(
                matches!(RuleTree::parse(bad), Err(ShapeError::RuleSyntax { .. })),
                "{bad} should fail"
            );
        }
        assert!(matches!(RuleTree::parse("  "), Err(ShapeError::EmptyRuleTree)));
    }

    #[test]
    fn test_deep_nesting_is_a_syntax_error() {
        let n = 100_000;
        let brackets = format!("{}-1{}", "(".repeat(n), ")".repeat(n));
        let complements = format!("{}-1", "#".repeat(n));
        for text in [&brackets, &complements] {
            match RuleTree::parse(text) {
                Err(ShapeError::RuleSyntax { offset, .. }) => assert_eq!(offset, MAX_NESTING),
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn test_nesting_up_to_the_limit() {
        let n = MAX_NESTING;
        let brackets = format!("{}-1{}", "(".repeat(n), ")".repeat(n));
        assert!(RuleTree::parse(&brackets).is_ok());
        let mixed = format!("{}-1{}", "#(".repeat(n / 2), ")".repeat(n / 2));
        let t = RuleTree::parse(&mixed).unwrap();
        let flipped = RuleTree::parse("-1").unwrap();
        assert_eq!(truth_table(&t, &[1]), truth_table(&flipped, &[1]));
    }

    #[test]
    fn test_error_offset() {
        match RuleTree::parse("-1 -2)") {
            Err(ShapeError::RuleSyntax { offset, .. }) => assert_eq!(offset, 5),
            other => panic!("unexpected {other:?}"),
        }
    }
}
