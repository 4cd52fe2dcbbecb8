//! # Watch Expression Evaluation
//!
//! A small expression language over the debuggee's integer variables:
//! integer literals, identifiers, `true`/`false`, arithmetic (`+ - * / %`),
//! comparisons (`== != < <= > >=`), logical operators (`&& || !`), unary
//! minus and parentheses. Evaluation is checked: overflow, division by zero
//! and unknown identifiers surface as [`EvalError`]s that the store renders
//! in place of a value.

use std::fmt;

use indexmap::IndexMap;
use thiserror::Error;

/// A runtime value produced by evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Bool(bool),
}

impl Value {
    /// Short type label shown next to the rendered value.
    pub fn type_name(self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Bool(_) => "bool",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// Errors surfaced while parsing or evaluating an expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("empty expression")]
    Empty,
    #[error("unexpected character '{ch}' at {position}")]
    UnexpectedChar { ch: char, position: usize },
    #[error("integer literal out of range at {position}")]
    LiteralOutOfRange { position: usize },
    #[error("unexpected '{found}' at {position}")]
    UnexpectedToken { found: String, position: usize },
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("arithmetic overflow")]
    Overflow,
    #[error("'{op}' expects {expected} operands")]
    TypeMismatch { op: &'static str, expected: &'static str },
    #[error("expression nested too deeply")]
    TooDeep,
}

/// Variable lookup for evaluation.
pub trait Scope {
    fn lookup(&self, name: &str) -> Option<Value>;
}

impl Scope for IndexMap<String, i64> {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.get(name).copied().map(Value::Int)
    }
}

/// Parse and evaluate `expression` against `scope`.
pub fn evaluate(expression: &str, scope: &dyn Scope) -> Result<Value, EvalError> {
    let tokens = lex(expression)?;
    if tokens.is_empty() {
        return Err(EvalError::Empty);
    }
    let mut parser = Parser {
        tokens,
        index: 0,
        depth: 0,
    };
    let ast = parser.parse_or()?;
    if let Some(extra) = parser.peek() {
        return Err(EvalError::UnexpectedToken {
            found: extra.kind.to_string(),
            position: extra.position,
        });
    }
    eval(&ast, scope)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    Int(i64),
    Ident(String),
    Op(&'static str),
    LParen,
    RParen,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Int(n) => write!(f, "{n}"),
            TokenKind::Ident(name) => f.write_str(name),
            TokenKind::Op(op) => f.write_str(op),
            TokenKind::LParen => f.write_str("("),
            TokenKind::RParen => f.write_str(")"),
        }
    }
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    /// Byte offset of the token in the source text
    position: usize,
}

const TWO_CHAR_OPS: [&str; 6] = ["==", "!=", "<=", ">=", "&&", "||"];
const ONE_CHAR_OPS: [&str; 8] = ["+", "-", "*", "/", "%", "<", ">", "!"];

fn lex(input: &str) -> Result<Vec<Token>, EvalError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(position, ch)) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        if ch.is_ascii_digit() {
            let mut end = position;
            while let Some(&(i, c)) = chars.peek() {
                if !c.is_ascii_digit() {
                    break;
                }
                end = i + c.len_utf8();
                chars.next();
            }
            let literal = input[position..end]
                .parse::<i64>()
                .map_err(|_| EvalError::LiteralOutOfRange { position })?;
            tokens.push(Token {
                kind: TokenKind::Int(literal),
                position,
            });
            continue;
        }

        if ch.is_alphabetic() || ch == '_' {
            let mut end = position;
            while let Some(&(i, c)) = chars.peek() {
                if !(c.is_alphanumeric() || c == '_') {
                    break;
                }
                end = i + c.len_utf8();
                chars.next();
            }
            tokens.push(Token {
                kind: TokenKind::Ident(input[position..end].to_string()),
                position,
            });
            continue;
        }

        let rest = &input[position..];
        if let Some(op) = TWO_CHAR_OPS.iter().find(|op| rest.starts_with(**op)) {
            chars.next();
            chars.next();
            tokens.push(Token {
                kind: TokenKind::Op(*op),
                position,
            });
            continue;
        }

        let kind = match ch {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            _ => match ONE_CHAR_OPS.iter().find(|op| rest.starts_with(**op)) {
                Some(op) => TokenKind::Op(*op),
                None => return Err(EvalError::UnexpectedChar { ch, position }),
            },
        };
        chars.next();
        tokens.push(Token { kind, position });
    }

    Ok(tokens)
}

#[derive(Debug)]
enum Expr {
    Int(i64),
    Ident(String),
    Unary(&'static str, Box<Expr>),
    Binary(&'static str, Box<Expr>, Box<Expr>),
}

/// Deepest syntax tree the parser will build. Parsing and evaluation both
/// recurse once per level.
const MAX_DEPTH: usize = 128;

struct Parser {
    tokens: Vec<Token>,
    index: usize,
    /// Depth of the tree under construction at the current position
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.index).cloned();
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    /// Consume the next token when it is one of `ops`.
    fn take_op(&mut self, ops: &[&'static str]) -> Option<&'static str> {
        match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Op(op)) if ops.contains(op) => {
                let op = *op;
                self.index += 1;
                Some(op)
            }
            _ => None,
        }
    }

    fn descend(&mut self) -> Result<(), EvalError> {
        if self.depth >= MAX_DEPTH {
            return Err(EvalError::TooDeep);
        }
        self.depth += 1;
        Ok(())
    }

    fn binary_level(
        &mut self,
        ops: &[&'static str],
        next: fn(&mut Self) -> Result<Expr, EvalError>,
    ) -> Result<Expr, EvalError> {
        let mut lhs = next(self)?;
        // Each operator in a chain nests the left side one level deeper.
        let mut levels = 0;
        while let Some(op) = self.take_op(ops) {
            self.descend()?;
            levels += 1;
            let rhs = next(self)?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        self.depth -= levels;
        Ok(lhs)
    }

    fn parse_or(&mut self) -> Result<Expr, EvalError> {
        self.binary_level(&["||"], Self::parse_and)
    }

    fn parse_and(&mut self) -> Result<Expr, EvalError> {
        self.binary_level(&["&&"], Self::parse_equality)
    }

    fn parse_equality(&mut self) -> Result<Expr, EvalError> {
        self.binary_level(&["==", "!="], Self::parse_comparison)
    }

    fn parse_comparison(&mut self) -> Result<Expr, EvalError> {
        self.binary_level(&["<", "<=", ">", ">="], Self::parse_additive)
    }

    fn parse_additive(&mut self) -> Result<Expr, EvalError> {
        self.binary_level(&["+", "-"], Self::parse_multiplicative)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, EvalError> {
        self.binary_level(&["*", "/", "%"], Self::parse_unary)
    }

    fn parse_unary(&mut self) -> Result<Expr, EvalError> {
        if let Some(op) = self.take_op(&["-", "!"]) {
            self.descend()?;
            let operand = self.parse_unary()?;
            self.depth -= 1;
            return Ok(Expr::Unary(op, Box::new(operand)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, EvalError> {
        let token = self.next().ok_or(EvalError::UnexpectedEnd)?;
        match token.kind {
            TokenKind::Int(n) => Ok(Expr::Int(n)),
            TokenKind::Ident(name) => Ok(Expr::Ident(name)),
            TokenKind::LParen => {
                self.descend()?;
                let inner = self.parse_or()?;
                self.depth -= 1;
                match self.next() {
                    Some(Token {
                        kind: TokenKind::RParen, ..
                    }) => Ok(inner),
                    Some(other) => Err(EvalError::UnexpectedToken {
                        found: other.kind.to_string(),
                        position: other.position,
                    }),
                    None => Err(EvalError::UnexpectedEnd),
                }
            }
            other => Err(EvalError::UnexpectedToken {
                found: other.to_string(),
                position: token.position,
            }),
        }
    }
}

fn eval(expr: &Expr, scope: &dyn Scope) -> Result<Value, EvalError> {
    match expr {
        Expr::Int(n) => Ok(Value::Int(*n)),
        Expr::Ident(name) => match name.as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => scope
                .lookup(name)
                .ok_or_else(|| EvalError::UnknownIdentifier(name.clone())),
        },
        Expr::Unary(op, operand) => {
            let op = *op;
            match (op, eval(operand, scope)?) {
                ("-", Value::Int(n)) => n.checked_neg().map(Value::Int).ok_or(EvalError::Overflow),
                ("!", Value::Bool(b)) => Ok(Value::Bool(!b)),
                ("-", _) => Err(EvalError::TypeMismatch { op, expected: "int" }),
                _ => Err(EvalError::TypeMismatch { op, expected: "bool" }),
            }
        }
        Expr::Binary(op, lhs, rhs) => {
            let op = *op;
            // Short-circuit the logical operators before touching the right side.
            if matches!(op, "&&" | "||") {
                let Value::Bool(left) = eval(lhs, scope)? else {
                    return Err(EvalError::TypeMismatch { op, expected: "bool" });
                };
                if (op == "&&" && !left) || (op == "||" && left) {
                    return Ok(Value::Bool(left));
                }
                return match eval(rhs, scope)? {
                    Value::Bool(right) => Ok(Value::Bool(right)),
                    Value::Int(_) => Err(EvalError::TypeMismatch { op, expected: "bool" }),
                };
            }
            binary(op, eval(lhs, scope)?, eval(rhs, scope)?)
        }
    }
}

fn binary(op: &'static str, lhs: Value, rhs: Value) -> Result<Value, EvalError> {
    match (op, lhs, rhs) {
        ("==", l, r) => Ok(Value::Bool(l == r)),
        ("!=", l, r) => Ok(Value::Bool(l != r)),
        (_, Value::Int(l), Value::Int(r)) => match op {
            "+" => l.checked_add(r).map(Value::Int).ok_or(EvalError::Overflow),
            "-" => l.checked_sub(r).map(Value::Int).ok_or(EvalError::Overflow),
            "*" => l.checked_mul(r).map(Value::Int).ok_or(EvalError::Overflow),
            "/" | "%" if r == 0 => Err(EvalError::DivisionByZero),
            "/" => l.checked_div(r).map(Value::Int).ok_or(EvalError::Overflow),
            "%" => l.checked_rem(r).map(Value::Int).ok_or(EvalError::Overflow),
            "<" => Ok(Value::Bool(l < r)),
            "<=" => Ok(Value::Bool(l <= r)),
            ">" => Ok(Value::Bool(l > r)),
            ">=" => Ok(Value::Bool(l >= r)),
            _ => Err(EvalError::TypeMismatch { op, expected: "bool" }),
        },
        _ => Err(EvalError::TypeMismatch { op, expected: "int" }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> IndexMap<String, i64> {
        IndexMap::from([("x".to_string(), 4), ("y".to_string(), -2), ("big".to_string(), i64::MAX)])
    }

    fn eval_ok(src: &str) -> Value {
        evaluate(src, &scope()).unwrap()
    }

    #[test]
    fn arithmetic_respects_precedence() {
        assert_eq!(eval_ok("x + 1"), Value::Int(5));
        assert_eq!(eval_ok("1 + x * 3"), Value::Int(13));
        assert_eq!(eval_ok("(1 + x) * 3"), Value::Int(15));
        assert_eq!(eval_ok("-y - -1"), Value::Int(3));
        assert_eq!(eval_ok("x % 3 + 10 / x"), Value::Int(3));
    }

    #[test]
    fn comparisons_and_logic() {
        assert_eq!(eval_ok("x > y && y < 0"), Value::Bool(true));
        assert_eq!(eval_ok("x == 4 || missing"), Value::Bool(true));
        assert_eq!(eval_ok("!(x != 4)"), Value::Bool(true));
        assert_eq!(eval_ok("true == false"), Value::Bool(false));
    }

    #[test]
    fn errors_are_reported() {
        let s = scope();
        assert_eq!(evaluate("   ", &s), Err(EvalError::Empty));
        assert_eq!(evaluate("z + 1", &s), Err(EvalError::UnknownIdentifier("z".into())));
        assert_eq!(evaluate("x / (y + 2)", &s), Err(EvalError::DivisionByZero));
        assert_eq!(evaluate("big + 1", &s), Err(EvalError::Overflow));
        assert_eq!(evaluate("x +", &s), Err(EvalError::UnexpectedEnd));
        assert_eq!(
            evaluate("x $ 1", &s),
            Err(EvalError::UnexpectedChar { ch: '$', position: 2 })
        );
        assert_eq!(
            evaluate("(x 1", &s),
            Err(EvalError::UnexpectedToken {
                found: "1".into(),
                position: 3
            })
        );
        assert_eq!(
            evaluate("x + true", &s),
            Err(EvalError::TypeMismatch { op: "+", expected: "int" })
        );
    }

    #[test]
    fn deep_nesting_is_an_error_not_a_crash() {
        let s = scope();
        assert_eq!(evaluate(&format!("{}1", "-".repeat(100_000)), &s), Err(EvalError::TooDeep));
        assert_eq!(evaluate(&"(".repeat(100_000), &s), Err(EvalError::TooDeep));
        assert_eq!(evaluate(&format!("{}1", "!".repeat(100_000)), &s), Err(EvalError::TooDeep));
        let chain = vec!["x"; 100_000].join(" + ");
        assert_eq!(evaluate(&chain, &s), Err(EvalError::TooDeep));

        let nested = format!("{}x{}", "(".repeat(50), ")".repeat(50));
        assert_eq!(evaluate(&nested, &s), Ok(Value::Int(4)));
        assert_eq!(evaluate(&format!("{}x", "- ".repeat(100)), &s), Ok(Value::Int(4)));
    }

    #[test]
    fn value_labels() {
        assert_eq!(Value::Int(3).type_name(), "int");
        assert_eq!(Value::Bool(false).to_string(), "false");
    }
}
