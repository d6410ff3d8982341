//! Typed predicate grammar for workflow step conditions.
//!
//! Conditions are short strings of the form `subject.field op value`:
//!
//! - `problem.priority == "High"` (also `case.`, `project.`)
//! - `problem.status == "Open"` (any subject)
//! - `problem.impact == "Critical"`
//! - `case.risk_level == "High"`
//! - `case.estimated_cost > 50000`
//! - `case.estimated_cost < 50000`
//!
//! Parse failures are surfaced; templates containing an unparsable condition
//! are rejected at save time rather than silently passing at execution.

use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use thiserror::Error;

/// Condition parse errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConditionError {
    /// The string does not match `subject.field op value`.
    #[error("malformed condition: '{0}'")]
    Malformed(String),

    /// The subject is not problem/case/project.
    #[error("unknown subject '{0}'")]
    UnknownSubject(String),

    /// The field is not recognized for the subject.
    #[error("unsupported field '{field}' for subject '{subject}'")]
    UnsupportedField {
        /// Subject name as written.
        subject: String,
        /// Field name as written.
        field: String,
    },

    /// The operator is not valid for the field.
    #[error("unsupported operator '{op}' for field '{field}'")]
    UnsupportedOperator {
        /// Operator as written.
        op: String,
        /// Field name as written.
        field: String,
    },

    /// A numeric literal could not be parsed.
    #[error("malformed numeric literal '{0}'")]
    BadNumber(String),

    /// A string literal was not quoted.
    #[error("expected quoted string literal, got '{0}'")]
    BadString(String),
}

/// Entity a predicate tests against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    /// The problem slot of the event context.
    Problem,
    /// The business case slot.
    Case,
    /// The project slot.
    Project,
}

impl Subject {
    /// The context key the subject reads from.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Problem => "problem",
            Self::Case => "case",
            Self::Project => "project",
        }
    }

    fn parse(s: &str) -> Result<Self, ConditionError> {
        match s {
            "problem" => Ok(Self::Problem),
            "case" => Ok(Self::Case),
            "project" => Ok(Self::Project),
            other => Err(ConditionError::UnknownSubject(other.to_string())),
        }
    }
}

/// A parsed step condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `<subject>.priority == "<literal>"`
    PriorityEq {
        /// Entity tested.
        subject: Subject,
        /// Expected literal.
        value: String,
    },
    /// `<subject>.status == "<literal>"`
    StatusEq {
        /// Entity tested.
        subject: Subject,
        /// Expected literal.
        value: String,
    },
    /// `problem.impact == "<literal>"`
    ImpactEq {
        /// Expected literal.
        value: String,
    },
    /// `case.risk_level == "<literal>"`
    RiskLevelEq {
        /// Expected literal.
        value: String,
    },
    /// `case.estimated_cost > N`
    CostAbove(Decimal),
    /// `case.estimated_cost < N`
    CostBelow(Decimal),
}

impl Predicate {
    /// Parses a condition string.
    ///
    /// # Errors
    ///
    /// Returns a `ConditionError` describing the first problem found.
    pub fn parse(condition: &str) -> Result<Self, ConditionError> {
        let condition = condition.trim();

        let (lhs, op, rhs) = split_expression(condition)
            .ok_or_else(|| ConditionError::Malformed(condition.to_string()))?;

        let (subject_raw, field) = lhs
            .split_once('.')
            .ok_or_else(|| ConditionError::Malformed(condition.to_string()))?;
        let subject = Subject::parse(subject_raw)?;

        match (field, op) {
            ("priority", "==") => Ok(Self::PriorityEq {
                subject,
                value: unquote(rhs)?,
            }),
            ("status", "==") => Ok(Self::StatusEq {
                subject,
                value: unquote(rhs)?,
            }),
            ("impact", "==") if subject == Subject::Problem => Ok(Self::ImpactEq {
                value: unquote(rhs)?,
            }),
            ("risk_level", "==") if subject == Subject::Case => Ok(Self::RiskLevelEq {
                value: unquote(rhs)?,
            }),
            ("estimated_cost", ">") if subject == Subject::Case => {
                Ok(Self::CostAbove(parse_number(rhs)?))
            }
            ("estimated_cost", "<") if subject == Subject::Case => {
                Ok(Self::CostBelow(parse_number(rhs)?))
            }
            ("priority" | "status" | "impact" | "risk_level" | "estimated_cost", op) => {
                Err(ConditionError::UnsupportedOperator {
                    op: op.to_string(),
                    field: field.to_string(),
                })
            }
            _ => Err(ConditionError::UnsupportedField {
                subject: subject_raw.to_string(),
                field: field.to_string(),
            }),
        }
    }

    /// Evaluates the predicate against an event context.
    ///
    /// A missing slot or field evaluates to false; a missing cost is
    /// treated as zero.
    #[must_use]
    pub fn evaluate(&self, context: &Value) -> bool {
        match self {
            Self::PriorityEq { subject, value } => {
                slot_str(context, subject.key(), "priority") == Some(value.as_str())
            }
            Self::StatusEq { subject, value } => {
                slot_str(context, subject.key(), "status") == Some(value.as_str())
            }
            Self::ImpactEq { value } => {
                slot_str(context, "problem", "impact") == Some(value.as_str())
            }
            Self::RiskLevelEq { value } => {
                slot_str(context, "case", "risk_level") == Some(value.as_str())
            }
            Self::CostAbove(threshold) => estimated_cost(context) > *threshold,
            Self::CostBelow(threshold) => estimated_cost(context) < *threshold,
        }
    }
}

fn split_expression(condition: &str) -> Option<(&str, &str, &str)> {
    // Longest operator first so "==" is not split as "=" "=".
    for op in ["==", ">", "<"] {
        if let Some((lhs, rhs)) = condition.split_once(op) {
            return Some((lhs.trim(), op, rhs.trim()));
        }
    }
    None
}

fn unquote(raw: &str) -> Result<String, ConditionError> {
    let raw = raw.trim();
    let inner = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| raw.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')));
    match inner {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(ConditionError::BadString(raw.to_string())),
    }
}

fn parse_number(raw: &str) -> Result<Decimal, ConditionError> {
    Decimal::from_str(raw.trim()).map_err(|_| ConditionError::BadNumber(raw.trim().to_string()))
}

fn slot_str<'a>(context: &'a Value, slot: &str, field: &str) -> Option<&'a str> {
    context.get(slot)?.get(field)?.as_str()
}

fn estimated_cost(context: &Value) -> Decimal {
    context
        .get("case")
        .and_then(|case| case.get("estimated_cost"))
        .and_then(json_decimal)
        .unwrap_or_default()
}

fn json_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        Value::String(s) => Decimal::from_str(s).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[rstest]
    #[case("problem.priority == \"High\"")]
    #[case("case.priority == \"Medium\"")]
    #[case("project.status == \"Open\"")]
    #[case("problem.impact == \"Critical\"")]
    #[case("case.risk_level == 'High'")]
    #[case("case.estimated_cost > 50000")]
    #[case("case.estimated_cost < 10000.50")]
    fn test_parse_accepts_grammar(#[case] condition: &str) {
        assert!(Predicate::parse(condition).is_ok(), "{condition}");
    }

    #[rstest]
    #[case("milestone.priority == \"High\"")] // unknown subject
    #[case("problem.severity == \"High\"")] // unknown field
    #[case("project.impact == \"High\"")] // impact is problem-only
    #[case("problem.estimated_cost > 5")] // cost is case-only
    #[case("case.estimated_cost == 5")] // wrong operator
    #[case("case.estimated_cost > lots")] // bad number
    #[case("problem.priority == High")] // unquoted literal
    #[case("nonsense")]
    fn test_parse_rejects_garbage(#[case] condition: &str) {
        assert!(Predicate::parse(condition).is_err(), "{condition}");
    }

    #[test]
    fn test_bad_number_is_distinct_error() {
        assert!(matches!(
            Predicate::parse("case.estimated_cost > 12x"),
            Err(ConditionError::BadNumber(_))
        ));
    }

    #[test]
    fn test_priority_evaluation() {
        let pred = Predicate::parse("problem.priority == \"High\"").unwrap();
        assert!(pred.evaluate(&json!({"problem": {"priority": "High"}})));
        assert!(!pred.evaluate(&json!({"problem": {"priority": "Low"}})));
        // Missing slot evaluates false, not true.
        assert!(!pred.evaluate(&json!({})));
    }

    #[test]
    fn test_cost_evaluation() {
        let above = Predicate::parse("case.estimated_cost > 50000").unwrap();
        assert!(above.evaluate(&json!({"case": {"estimated_cost": 60000}})));
        assert!(!above.evaluate(&json!({"case": {"estimated_cost": 50000}})));
        // Missing cost is treated as zero.
        assert!(!above.evaluate(&json!({"case": {}})));

        let below = Predicate::parse("case.estimated_cost < 1000").unwrap();
        assert!(below.evaluate(&json!({})));
        assert_eq!(
            Predicate::parse("case.estimated_cost > 50000").unwrap(),
            Predicate::CostAbove(dec!(50000))
        );
    }

    #[test]
    fn test_cost_accepts_string_numbers() {
        // Decimal-valued context fields serialize as strings.
        let above = Predicate::parse("case.estimated_cost > 50000").unwrap();
        assert!(above.evaluate(&json!({"case": {"estimated_cost": "100000.00"}})));
    }
}
