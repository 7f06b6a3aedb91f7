//! SQL-like query predicates
//!
//! Grammar:
//! ```text
//! query     := "" | condition ("AND" condition)*
//! condition := path op literal
//! path      := identifier ("." identifier)*
//! op        := "=" | "!=" | "<>" | "<" | "<=" | ">" | ">=" | "LIKE"
//! literal   := 'quoted text' | number | true | false
//! ```
//!
//! Keywords are case-insensitive. Quotes inside text literals are doubled (`''`).
//! A condition on a missing or incomparable property never matches.

use std::cmp::Ordering;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::document::TypedDocument;
use crate::errors::{StoreError, StoreResult};

const INVALID_QUERY: &str = "InvalidQuery";

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    Like,
}

impl Operator {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "=" => Some(Operator::Eq),
            "!=" | "<>" => Some(Operator::Neq),
            "<" => Some(Operator::Lt),
            "<=" => Some(Operator::Lte),
            ">" => Some(Operator::Gt),
            ">=" => Some(Operator::Gte),
            t if t.eq_ignore_ascii_case("like") => Some(Operator::Like),
            _ => None,
        }
    }
}

/// A single `path op literal` comparison
#[derive(Debug, Clone)]
pub struct Condition {
    pub path: String,
    pub operator: Operator,
    pub literal: Value,
    /// Compiled LIKE pattern, set only for `Operator::Like`
    like: Option<Regex>,
}

impl Condition {
    /// Check if a document matches this condition
    pub fn matches(&self, doc: &TypedDocument) -> bool {
        let Some(field) = doc.lookup(&self.path) else {
            return false;
        };

        match self.operator {
            Operator::Like => match (field.as_str(), &self.like) {
                (Some(text), Some(re)) => re.is_match(text),
                _ => false,
            },
            op => match compare(&field, &self.literal) {
                Some(ordering) => match op {
                    Operator::Eq => ordering == Ordering::Equal,
                    Operator::Neq => ordering != Ordering::Equal,
                    Operator::Lt => ordering == Ordering::Less,
                    Operator::Lte => ordering != Ordering::Greater,
                    Operator::Gt => ordering == Ordering::Greater,
                    Operator::Gte => ordering != Ordering::Less,
                    Operator::Like => false,
                },
                None => false,
            },
        }
    }
}

/// A conjunction of conditions; empty matches everything
#[derive(Debug, Clone, Default)]
pub struct Predicate {
    pub conditions: Vec<Condition>,
}

impl Predicate {
    /// Parses a query expression.
    ///
    /// Fails with a collaborator error of class `InvalidQuery`.
    pub fn parse(query: &str) -> StoreResult<Self> {
        let mut conditions = Vec::new();
        let mut rest = query.trim();

        while !rest.is_empty() {
            if !conditions.is_empty() {
                let Some(m) = conjunction_pattern().and_then(|re| re.find(rest)) else {
                    return Err(invalid_query(query, rest));
                };
                rest = &rest[m.end()..];
            }

            let Some(caps) = condition_pattern().and_then(|re| re.captures(rest)) else {
                return Err(invalid_query(query, rest));
            };
            let operator = Operator::parse(&caps[2]).ok_or_else(|| invalid_query(query, rest))?;
            let literal = parse_literal(&caps[3]).ok_or_else(|| invalid_query(query, rest))?;
            let like = match operator {
                Operator::Like => Some(
                    literal
                        .as_str()
                        .and_then(like_regex)
                        .ok_or_else(|| invalid_query(query, rest))?,
                ),
                _ => None,
            };
            conditions.push(Condition {
                path: caps[1].to_string(),
                operator,
                literal,
                like,
            });
            rest = rest[caps[0].len()..].trim_start();
        }

        Ok(Self { conditions })
    }

    /// Check if a document matches all conditions
    pub fn matches(&self, doc: &TypedDocument) -> bool {
        self.conditions.iter().all(|c| c.matches(doc))
    }

    /// Whether the predicate matches everything
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

fn condition_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(
                r"^([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*)\s*(<=|>=|<>|!=|=|<|>|(?i:like)\b)\s*('(?:[^']|'')*'|[+-]?\d+(?:\.\d+)?(?:[eE][+-]?\d+)?|(?i:true|false)\b)",
            )
            .ok()
        })
        .as_ref()
}

fn conjunction_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^(?i:and)\s+").ok())
        .as_ref()
}

fn parse_literal(token: &str) -> Option<Value> {
    if let Some(inner) = token.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')) {
        return Some(Value::String(inner.replace("''", "'")));
    }
    if token.eq_ignore_ascii_case("true") {
        return Some(Value::Bool(true));
    }
    if token.eq_ignore_ascii_case("false") {
        return Some(Value::Bool(false));
    }
    if let Ok(n) = token.parse::<i64>() {
        return Some(Value::from(n));
    }
    token.parse::<f64>().ok().and_then(serde_json::Number::from_f64).map(Value::Number)
}

/// Orders two JSON scalars of the same kind; `None` when incomparable
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => {
            if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
                return Some(a.cmp(&b));
            }
            a.as_f64()?.partial_cmp(&b.as_f64()?)
        }
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Translates a LIKE pattern (`%` any run, `_` one char) into an anchored regex
fn like_regex(pattern: &str) -> Option<Regex> {
    let mut expr = String::from("^");
    for c in pattern.chars() {
        match c {
            '%' => expr.push_str(".*"),
            '_' => expr.push('.'),
            other => expr.push_str(&regex::escape(&other.to_string())),
        }
    }
    expr.push('$');
    Regex::new(&expr).ok()
}

fn invalid_query(query: &str, at: &str) -> StoreError {
    StoreError::collaborator(
        INVALID_QUERY,
        format!("Cannot parse query '{}' near '{}'", query, at),
    )
}
