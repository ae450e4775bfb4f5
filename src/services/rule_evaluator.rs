//! Custom status rules.
//!
//! A rule set is an ordered list of `EvaluatorRule`s. Each rule holds a
//! computed status and a conjunction of comparisons; the first rule whose
//! comparisons all hold supplies the status. Operators that cannot be
//! applied (unknown operators, mismatched literal kinds, unparsable
//! numbers) make the comparison false rather than failing the cycle.

use crate::domain::models::{
    Comparison, ComparisonOp, ComparisonValue, EvaluatorRule, ResultField, TestStatus,
};

/// Read access to the fields a rule can compare against.
pub trait EvaluationSubject {
    /// Canonical status before any override.
    fn target_status(&self) -> TestStatus;

    /// Every value recorded under `key`.
    fn property_values(&self, key: &str) -> Vec<&str>;

    fn test_name(&self) -> &str;

    /// Failure and error messages from the result's test tree.
    fn failure_messages(&self) -> Vec<&str>;
}

/// One value read out of a subject.
#[derive(Debug, Clone, Copy, PartialEq)]
enum FieldValue<'a> {
    Status(TestStatus),
    Text(&'a str),
}

/// Status of the first matching rule, or `None` when no rule matches.
pub fn evaluate<S: EvaluationSubject + ?Sized>(
    rules: &[EvaluatorRule],
    subject: &S,
) -> Option<TestStatus> {
    rules
        .iter()
        .find(|rule| rule_matches(rule, subject))
        .map(|rule| rule.computed_status)
}

fn rule_matches<S: EvaluationSubject + ?Sized>(rule: &EvaluatorRule, subject: &S) -> bool {
    !rule.comparisons.is_empty()
        && rule
            .comparisons
            .iter()
            .all(|comparison| comparison_holds(comparison, subject))
}

fn comparison_holds<S: EvaluationSubject + ?Sized>(comparison: &Comparison, subject: &S) -> bool {
    field_values(&comparison.field, subject)
        .into_iter()
        .any(|value| compare(comparison.op, value, &comparison.value))
}

fn field_values<'a, S: EvaluationSubject + ?Sized>(
    field: &ResultField,
    subject: &'a S,
) -> Vec<FieldValue<'a>> {
    match field {
        ResultField::TargetStatus => vec![FieldValue::Status(subject.target_status())],
        ResultField::Property(key) => subject
            .property_values(key)
            .into_iter()
            .map(FieldValue::Text)
            .collect(),
        ResultField::TestName => vec![FieldValue::Text(subject.test_name())],
        ResultField::FailureMessage => subject
            .failure_messages()
            .into_iter()
            .map(FieldValue::Text)
            .collect(),
    }
}

fn compare(op: ComparisonOp, value: FieldValue<'_>, literal: &ComparisonValue) -> bool {
    match (value, literal) {
        (FieldValue::Status(actual), ComparisonValue::Status(expected)) => match op {
            ComparisonOp::Eq => actual == *expected,
            ComparisonOp::Ne => actual != *expected,
            _ => false,
        },
        (FieldValue::Text(actual), ComparisonValue::Text(expected)) => match op {
            ComparisonOp::Eq => actual == expected.as_str(),
            ComparisonOp::Ne => actual != expected.as_str(),
            ComparisonOp::StartsWith => actual.starts_with(expected.as_str()),
            ComparisonOp::Contains => actual.contains(expected.as_str()),
            _ => false,
        },
        (FieldValue::Text(actual), ComparisonValue::Number(expected)) => {
            let Ok(actual) = actual.trim().parse::<f64>() else {
                return false;
            };
            match op {
                ComparisonOp::Eq => (actual - expected).abs() < f64::EPSILON,
                ComparisonOp::Ne => (actual - expected).abs() >= f64::EPSILON,
                ComparisonOp::Lt => actual < *expected,
                ComparisonOp::Le => actual <= *expected,
                ComparisonOp::Gt => actual > *expected,
                ComparisonOp::Ge => actual >= *expected,
                _ => false,
            }
        }
        _ => false,
    }
}
