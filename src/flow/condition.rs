//! @acp:module "Flow Condition Parser"
//! @acp:summary "Parse and evaluate branch predicates against recorded answers"
//! @acp:domain flow
//! @acp:layer logic
//!
//! Grammar:
//!
//! ```text
//! predicate  := conjunction ( "||" conjunction )*
//! conjunction:= comparison ( "&&" comparison )*
//! comparison := key [ "." field ] operator literal
//! field      := "index" | "label" | "deduction"
//! operator   := "==" | "!=" | ">" | ">=" | "<" | "<="
//! literal    := "\"" text "\"" | integer
//! ```
//!
//! A bare key compares the selected option's label against a string and its
//! index against an integer. `&&` binds tighter than `||`.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Result, ThriveError};

/// One answer resolved against the flow: index plus the option it points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAnswer {
    pub index: usize,
    /// `None` when the index is out of range for the node
    pub label: Option<String>,
    pub deduction: u32,
}

/// Answers keyed by question key, in the form conditions evaluate against
#[derive(Debug, Default, Clone)]
pub struct AnswerSet {
    answers: HashMap<String, ResolvedAnswer>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, answer: ResolvedAnswer) {
        self.answers.insert(key.into(), answer);
    }

    pub fn get(&self, key: &str) -> Option<&ResolvedAnswer> {
        self.answers.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.answers.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn iter_deductions(&self) -> impl Iterator<Item = u32> + '_ {
        self.answers.values().map(|a| a.deduction)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Operator {
    fn is_ordering(self) -> bool {
        !matches!(self, Operator::Eq | Operator::Ne)
    }

    fn compare<T: PartialOrd>(self, actual: &T, expected: &T) -> bool {
        match self {
            Operator::Eq => actual == expected,
            Operator::Ne => actual != expected,
            Operator::Gt => actual > expected,
            Operator::Gte => actual >= expected,
            Operator::Lt => actual < expected,
            Operator::Lte => actual <= expected,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Selected,
    Index,
    Label,
    Deduction,
}

#[derive(Debug, Clone, PartialEq)]
enum Literal {
    Text(String),
    Number(i64),
}

#[derive(Debug, Clone)]
struct Comparison {
    key: String,
    field: Field,
    operator: Operator,
    value: Literal,
}

/// Compiled branch predicate (disjunction of conjunctions)
#[derive(Debug, Clone)]
pub struct Predicate {
    source: String,
    any_of: Vec<Vec<Comparison>>,
}

fn comparison_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"^\s*([A-Za-z_][A-Za-z0-9_-]*)(?:\.(index|label|deduction))?\s*(==|!=|>=|<=|>|<)\s*("(?:[^"\\]|\\.)*"|-?\d+)\s*"#,
        )
        .expect("comparison pattern is valid")
    })
}

fn connector_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(&&|\|\|)").expect("connector pattern is valid"))
}

impl Predicate {
    /// Parse a predicate expression
    pub fn parse(expr: &str) -> Result<Self> {
        let mut any_of: Vec<Vec<Comparison>> = vec![Vec::new()];
        let mut rest = expr;

        loop {
            let caps = comparison_regex().captures(rest).ok_or_else(|| {
                ThriveError::Condition(format!(
                    "Invalid condition '{}': expected 'key operator value' near '{}'",
                    expr,
                    rest.trim()
                ))
            })?;

            let comparison = build_comparison(expr, &caps)?;
            if let Some(current) = any_of.last_mut() {
                current.push(comparison);
            }

            rest = &rest[caps.get(0).map(|m| m.end()).unwrap_or(rest.len())..];
            if rest.is_empty() {
                break;
            }

            let connector = connector_regex().captures(rest).ok_or_else(|| {
                ThriveError::Condition(format!(
                    "Invalid condition '{}': unexpected '{}'",
                    expr,
                    rest.trim()
                ))
            })?;
            if &connector[1] == "||" {
                any_of.push(Vec::new());
            }
            rest = &rest[2..];
        }

        Ok(Self {
            source: expr.to_string(),
            any_of,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Answer keys referenced by this predicate
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.any_of
            .iter()
            .flatten()
            .map(|c| c.key.as_str())
    }

    /// Evaluate against an answer set.
    ///
    /// Fails when any referenced key has no recorded answer, or when a label
    /// comparison hits an answer whose index no longer matches an option.
    /// Operands are checked up front, so the outcome does not depend on
    /// their order.
    pub fn evaluate(&self, answers: &AnswerSet) -> Result<bool> {
        for comparison in self.any_of.iter().flatten() {
            check_operand(comparison, answers)?;
        }

        for conjunction in &self.any_of {
            let mut all = true;
            for comparison in conjunction {
                if !evaluate_comparison(comparison, answers)? {
                    all = false;
                    break;
                }
            }
            if all {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Parse and evaluate a condition expression in one step
///
/// Supports expressions like:
/// - `balanceHistory == "I've had a fall or multiple concerning stumbles"`
/// - `medicationCount.index >= 2`
/// - `vision.deduction > 0 && mobilityAids != 0`
pub fn evaluate_condition(expr: &str, answers: &AnswerSet) -> Result<bool> {
    Predicate::parse(expr)?.evaluate(answers)
}

fn build_comparison(expr: &str, caps: &regex::Captures<'_>) -> Result<Comparison> {
    let key = caps[1].to_string();
    let field = match caps.get(2).map(|m| m.as_str()) {
        None => Field::Selected,
        Some("index") => Field::Index,
        Some("label") => Field::Label,
        Some("deduction") => Field::Deduction,
        Some(other) => {
            return Err(ThriveError::Condition(format!(
                "Unknown field '{}' in condition",
                other
            )))
        }
    };
    let operator = match &caps[3] {
        "==" => Operator::Eq,
        "!=" => Operator::Ne,
        ">" => Operator::Gt,
        ">=" => Operator::Gte,
        "<" => Operator::Lt,
        "<=" => Operator::Lte,
        op => {
            return Err(ThriveError::Condition(format!(
                "Unknown operator '{}' in condition",
                op
            )))
        }
    };

    let raw = &caps[4];
    let value = if let Some(quoted) = raw.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        Literal::Text(unescape(quoted))
    } else {
        Literal::Number(raw.parse::<i64>().map_err(|_| {
            ThriveError::Condition(format!("Invalid numeric value '{}' in condition", raw))
        })?)
    };

    match (&field, &value) {
        (Field::Label, Literal::Number(_)) => {
            return Err(ThriveError::Condition(format!(
                "Invalid condition '{}': '{}.label' compares against text",
                expr, key
            )))
        }
        (Field::Index | Field::Deduction, Literal::Text(_)) => {
            return Err(ThriveError::Condition(format!(
                "Invalid condition '{}': '{}' compares against a number",
                expr, key
            )))
        }
        _ => {}
    }
    if matches!(value, Literal::Text(_)) && operator.is_ordering() {
        return Err(ThriveError::Condition(format!(
            "Invalid condition '{}': text only supports == and !=",
            expr
        )));
    }

    Ok(Comparison {
        key,
        field,
        operator,
        value,
    })
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn check_operand(comparison: &Comparison, answers: &AnswerSet) -> Result<()> {
    let answer = answers.get(&comparison.key).ok_or_else(|| {
        ThriveError::Condition(format!("No answer recorded for '{}'", comparison.key))
    })?;
    if matches!(comparison.value, Literal::Text(_)) && answer.label.is_none() {
        return Err(ThriveError::Condition(format!(
            "Answer for '{}' does not match any option",
            comparison.key
        )));
    }
    Ok(())
}

fn evaluate_comparison(comparison: &Comparison, answers: &AnswerSet) -> Result<bool> {
    let answer = answers.get(&comparison.key).ok_or_else(|| {
        ThriveError::Condition(format!("No answer recorded for '{}'", comparison.key))
    })?;

    match &comparison.value {
        Literal::Number(expected) => {
            let actual = match comparison.field {
                Field::Deduction => answer.deduction as i64,
                _ => answer.index as i64,
            };
            Ok(comparison.operator.compare(&actual, expected))
        }
        Literal::Text(expected) => {
            let label = answer.label.as_deref().ok_or_else(|| {
                ThriveError::Condition(format!(
                    "Answer for '{}' does not match any option",
                    comparison.key
                ))
            })?;
            Ok(comparison.operator.compare(&label, &expected.as_str()))
        }
    }
}
