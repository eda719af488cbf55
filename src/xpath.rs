//
// Copyright (c) The yangson Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! The XPath subset used by `when`/`must` expressions and leafref paths.
//!
//! Only the navigation primitives needed to evaluate constraints over
//! instance data are implemented: location paths over the child and
//! parent axes, string comparisons, and the boolean connectives.

use crate::data::InstanceNode;
use crate::error::{Error, Result};
use crate::path::Parser;

/// Maps a namespace prefix to the name of the module it designates.
pub(crate) type PrefixResolver<'r> = &'r dyn Fn(&str) -> Option<String>;

/// A parsed constraint expression.
#[derive(Clone, Debug)]
pub(crate) enum Expr {
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Compare(Box<Expr>, CompOp, Box<Expr>),
    Path(LocationPath),
    Literal(String),
    True,
    False,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum CompOp {
    Eq,
    Ne,
}

/// A location path over the child and parent axes. Step prefixes are
/// resolved to module names at parse time.
#[derive(Clone, Debug)]
pub struct LocationPath {
    pub(crate) absolute: bool,
    pub(crate) steps: Vec<Step>,
}

#[derive(Clone, Debug)]
pub(crate) enum Step {
    Parent,
    Child { ns: Option<String>, name: String },
}

/// Result of evaluating a subexpression.
enum EvalValue<'a> {
    Nodes(Vec<InstanceNode<'a>>),
    Literal(String),
    Boolean(bool),
}

impl EvalValue<'_> {
    fn truth(&self) -> bool {
        match self {
            EvalValue::Nodes(nodes) => !nodes.is_empty(),
            EvalValue::Literal(text) => !text.is_empty(),
            EvalValue::Boolean(b) => *b,
        }
    }

    fn strings(&self) -> Vec<String> {
        match self {
            EvalValue::Nodes(nodes) => nodes
                .iter()
                .map(|node| {
                    node.canonical_value()
                        .unwrap_or_else(|| node.value().string_value())
                })
                .collect(),
            EvalValue::Literal(text) => vec![text.clone()],
            EvalValue::Boolean(b) => vec![b.to_string()],
        }
    }
}

impl Expr {
    /// Evaluate the expression with `node` as the context node and reduce
    /// the result to its truth value.
    pub(crate) fn evaluate(&self, node: &InstanceNode<'_>) -> bool {
        self.eval(node).truth()
    }

    fn eval<'a>(&self, node: &InstanceNode<'a>) -> EvalValue<'a> {
        match self {
            Expr::Or(left, right) => EvalValue::Boolean(
                left.eval(node).truth() || right.eval(node).truth(),
            ),
            Expr::And(left, right) => EvalValue::Boolean(
                left.eval(node).truth() && right.eval(node).truth(),
            ),
            Expr::Not(inner) => {
                EvalValue::Boolean(!inner.eval(node).truth())
            }
            Expr::Compare(left, op, right) => {
                let left = left.eval(node);
                let right = right.eval(node);
                let result = if matches!(left, EvalValue::Boolean(_))
                    || matches!(right, EvalValue::Boolean(_))
                {
                    (left.truth() == right.truth()) == (*op == CompOp::Eq)
                } else {
                    // XPath set semantics: true if some pair satisfies the
                    // comparison; empty node-sets satisfy nothing.
                    let lhs = left.strings();
                    let rhs = right.strings();
                    match op {
                        CompOp::Eq => {
                            lhs.iter().any(|a| rhs.contains(a))
                        }
                        CompOp::Ne => lhs
                            .iter()
                            .any(|a| rhs.iter().any(|b| a != b)),
                    }
                };
                EvalValue::Boolean(result)
            }
            Expr::Path(path) => EvalValue::Nodes(path.eval_nodes(node)),
            Expr::Literal(text) => EvalValue::Literal(text.clone()),
            Expr::True => EvalValue::Boolean(true),
            Expr::False => EvalValue::Boolean(false),
        }
    }
}

impl LocationPath {
    /// The set of instance nodes the path designates from `node`.
    pub(crate) fn eval_nodes<'a>(
        &self,
        node: &InstanceNode<'a>,
    ) -> Vec<InstanceNode<'a>> {
        let mut nodes = if self.absolute {
            vec![node.top()]
        } else {
            vec![node.clone()]
        };
        for step in &self.steps {
            let mut next = Vec::new();
            for node in &nodes {
                match step {
                    Step::Parent => next.extend(node.xpath_parent()),
                    Step::Child { ns, name } => next.extend(
                        node.xpath_children(ns.as_deref(), name),
                    ),
                }
            }
            nodes = next;
        }
        nodes
    }
}

/// Parse a `when`/`must` expression, resolving prefixes to module names.
pub(crate) fn parse_expr(
    text: &str,
    resolver: PrefixResolver<'_>,
) -> Result<Expr> {
    let mut parser = Parser::new(text);
    let expr = or_expr(&mut parser, resolver)?;
    parser.skip_ws();
    if !parser.at_end() {
        return Err(Error::unexpected_input(
            parser.offset(),
            "end of expression",
        ));
    }
    Ok(expr)
}

/// Parse a leafref path, resolving prefixes to module names.
pub(crate) fn parse_path(
    text: &str,
    resolver: PrefixResolver<'_>,
) -> Result<LocationPath> {
    let mut parser = Parser::new(text);
    parser.skip_ws();
    let path = location_path(&mut parser, resolver)?;
    parser.skip_ws();
    if !parser.at_end() {
        return Err(Error::unexpected_input(parser.offset(), "end of path"));
    }
    Ok(path)
}

fn or_expr(
    parser: &mut Parser<'_>,
    resolver: PrefixResolver<'_>,
) -> Result<Expr> {
    let mut left = and_expr(parser, resolver)?;
    loop {
        parser.skip_ws();
        if parser.accept_word("or") {
            let right = and_expr(parser, resolver)?;
            left = Expr::Or(Box::new(left), Box::new(right));
        } else {
            return Ok(left);
        }
    }
}

fn and_expr(
    parser: &mut Parser<'_>,
    resolver: PrefixResolver<'_>,
) -> Result<Expr> {
    let mut left = cmp_expr(parser, resolver)?;
    loop {
        parser.skip_ws();
        if parser.accept_word("and") {
            let right = cmp_expr(parser, resolver)?;
            left = Expr::And(Box::new(left), Box::new(right));
        } else {
            return Ok(left);
        }
    }
}

fn cmp_expr(
    parser: &mut Parser<'_>,
    resolver: PrefixResolver<'_>,
) -> Result<Expr> {
    let left = primary(parser, resolver)?;
    parser.skip_ws();
    let op = if parser.accept("!=") {
        CompOp::Ne
    } else if parser.accept("=") {
        CompOp::Eq
    } else {
        return Ok(left);
    };
    let right = primary(parser, resolver)?;
    Ok(Expr::Compare(Box::new(left), op, Box::new(right)))
}

fn primary(
    parser: &mut Parser<'_>,
    resolver: PrefixResolver<'_>,
) -> Result<Expr> {
    parser.skip_ws();
    match parser.peek()? {
        '\'' | '"' => {
            let quote = parser.one_of("'\"")?;
            Ok(Expr::Literal(parser.up_to(quote)?.to_string()))
        }
        '(' => {
            parser.advance();
            let expr = or_expr(parser, resolver)?;
            parser.skip_ws();
            parser.char(')')?;
            Ok(expr)
        }
        '/' | '.' => {
            Ok(Expr::Path(location_path(parser, resolver)?))
        }
        _ => {
            // Distinguish the function forms from a location path.
            let saved = parser.save();
            for (word, kind) in [
                ("not", 0u8),
                ("true", 1),
                ("false", 2),
                ("current", 3),
            ] {
                if parser.accept_word(word) {
                    parser.skip_ws();
                    if parser.accept("(") {
                        parser.skip_ws();
                        let expr = match kind {
                            0 => {
                                let inner = or_expr(parser, resolver)?;
                                parser.skip_ws();
                                Expr::Not(Box::new(inner))
                            }
                            1 => Expr::True,
                            2 => Expr::False,
                            _ => Expr::Path(LocationPath {
                                absolute: false,
                                steps: Vec::new(),
                            }),
                        };
                        parser.char(')')?;
                        return Ok(expr);
                    }
                    parser.restore(saved);
                    break;
                }
            }
            Ok(Expr::Path(location_path(parser, resolver)?))
        }
    }
}

fn location_path(
    parser: &mut Parser<'_>,
    resolver: PrefixResolver<'_>,
) -> Result<LocationPath> {
    let absolute = parser.accept("/");
    let mut steps = Vec::new();
    loop {
        parser.skip_ws();
        if parser.accept("..") {
            steps.push(Step::Parent);
        } else if parser.accept(".") {
            // Self step, a no-op.
        } else {
            let (prefix, name) = parser.prefixed_name()?;
            let ns = match prefix {
                Some(prefix) => Some(resolver(prefix).ok_or_else(|| {
                    Error::BadYangLibrary(format!(
                        "unknown prefix '{}' in xpath expression",
                        prefix
                    ))
                })?),
                None => None,
            };
            steps.push(Step::Child {
                ns,
                name: name.to_string(),
            });
        }
        if !parser.accept("/") {
            return Ok(LocationPath { absolute, steps });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(prefix: &str) -> Option<String> {
        (prefix == "ex").then(|| "example".to_string())
    }

    #[test]
    fn parse_comparison() {
        let expr = parse_expr("../ex:kind = 'fast' or disabled", &resolve)
            .unwrap();
        let Expr::Or(left, right) = expr else {
            panic!("expected 'or' at the top")
        };
        assert!(matches!(*left, Expr::Compare(_, CompOp::Eq, _)));
        assert!(matches!(*right, Expr::Path(_)));
    }

    #[test]
    fn parse_function_forms() {
        assert!(matches!(
            parse_expr("not(kind != 'a')", &resolve).unwrap(),
            Expr::Not(_)
        ));
        assert!(matches!(
            parse_expr("true()", &resolve).unwrap(),
            Expr::True
        ));
    }

    #[test]
    fn parse_leafref_path() {
        let path = parse_path("../../ex:server/name", &resolve).unwrap();
        assert!(!path.absolute);
        assert_eq!(path.steps.len(), 4);
        assert!(matches!(path.steps[0], Step::Parent));
        let Step::Child { ns: Some(ns), name } = &path.steps[2] else {
            panic!("expected child step")
        };
        assert_eq!(ns, "example");
        assert_eq!(name, "server");
    }

    #[test]
    fn reject_unknown_prefix() {
        assert!(parse_path("../bad:leaf", &resolve).is_err());
    }
}
