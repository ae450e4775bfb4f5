//! Column header extraction and compilation.

use std::collections::BTreeSet;

use crate::domain::models::{ActionResult, AssembledInvocation, ColumnHeaderRule, Test};

const LIST_SEPARATOR: &str = "||";
const MIXED_VALUES: &str = "*";

/// Header values an invocation contributes for one rule.
///
/// Reads the configured invocation property, or the labels starting with
/// the configured prefix (prefix stripped). Property rules contribute
/// nothing at the invocation level.
pub fn invocation_headers(
    invocation: Option<&AssembledInvocation>,
    rule: Option<&ColumnHeaderRule>,
) -> Vec<String> {
    let (Some(invocation), Some(rule)) = (invocation, rule) else {
        return Vec::new();
    };
    let invocation = &invocation.invocation;

    if !rule.configuration_value.is_empty() {
        return invocation
            .properties
            .iter()
            .filter(|p| p.key == rule.configuration_value)
            .map(|p| p.value.clone())
            .collect();
    }
    if !rule.label.is_empty() {
        return invocation
            .invocation_attributes
            .labels
            .iter()
            .filter_map(|label| label.strip_prefix(rule.label.as_str()))
            .map(ToString::to_string)
            .collect();
    }
    Vec::new()
}

/// Header values a single result contributes for one rule: the suite's
/// matching properties followed by those of its nested suites and cases,
/// in document order.
pub fn result_headers(result: Option<&ActionResult>, rule: Option<&ColumnHeaderRule>) -> Vec<String> {
    let (Some(result), Some(rule)) = (result, rule) else {
        return Vec::new();
    };
    if rule.property.is_empty() {
        return Vec::new();
    }
    let Some(suite) = result.test_suite() else {
        return Vec::new();
    };

    let mut values: Vec<String> = suite
        .properties
        .iter()
        .filter(|p| p.key == rule.property)
        .map(|p| p.value.clone())
        .collect();

    let mut stack: Vec<&Test> = suite.tests.iter().rev().collect();
    while let Some(test) = stack.pop() {
        values.extend(
            test.properties()
                .iter()
                .filter(|p| p.key == rule.property)
                .map(|p| p.value.clone()),
        );
        if let Test::TestSuite(nested) = test {
            stack.extend(nested.tests.iter().rev());
        }
    }
    values
}

/// Collapse collected values into one string per rule.
///
/// `values` is indexed like `rules`; a missing entry counts as no values.
pub fn compile_headers(rules: &[ColumnHeaderRule], values: &[Vec<String>]) -> Vec<String> {
    rules
        .iter()
        .enumerate()
        .map(|(i, rule)| {
            let distinct: BTreeSet<&str> = values
                .get(i)
                .map(|v| v.iter().map(String::as_str).collect())
                .unwrap_or_default();

            if rule.list_all_values {
                return distinct.into_iter().collect::<Vec<_>>().join(LIST_SEPARATOR);
            }
            let mut iter = distinct.into_iter();
            match (iter.next(), iter.next()) {
                (None, _) => String::new(),
                (Some(only), None) => only.to_string(),
                (Some(_), Some(_)) => MIXED_VALUES.to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::invocation::TestAction;
    use crate::domain::models::{Action, Invocation, Property, TestCase, TestSuite};

    fn rule_config(key: &str) -> ColumnHeaderRule {
        ColumnHeaderRule {
            configuration_value: key.to_string(),
            ..ColumnHeaderRule::default()
        }
    }

    fn rule_label(prefix: &str, list_all: bool) -> ColumnHeaderRule {
        ColumnHeaderRule {
            label: prefix.to_string(),
            list_all_values: list_all,
            ..ColumnHeaderRule::default()
        }
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_invocation_headers() {
        assert!(invocation_headers(None, Some(&rule_config("os"))).is_empty());

        let mut inv = Invocation {
            properties: vec![Property::new("field", "green"), Property::new("os", "linux")],
            ..Invocation::default()
        };
        inv.invocation_attributes.labels = strings(&["os=linux", "env=prod", "test=fast", "test=hermetic"]);
        let assembled = AssembledInvocation::new(inv);

        assert_eq!(
            invocation_headers(Some(&assembled), Some(&rule_config("os"))),
            strings(&["linux"])
        );
        assert!(invocation_headers(Some(&assembled), Some(&rule_config("rainbows"))).is_empty());
        assert_eq!(
            invocation_headers(Some(&assembled), Some(&rule_label("test=", false))),
            strings(&["fast", "hermetic"])
        );
    }

    #[test]
    fn test_result_headers() {
        let rule = ColumnHeaderRule {
            property: "test-property".to_string(),
            ..ColumnHeaderRule::default()
        };
        assert!(result_headers(None, Some(&rule)).is_empty());

        let bare = ActionResult {
            action: Some(Action::default()),
            ..ActionResult::default()
        };
        assert!(result_headers(Some(&bare), Some(&rule)).is_empty());

        let with_suite = ActionResult {
            action: Some(Action {
                test_action: Some(TestAction {
                    test_suite: Some(TestSuite {
                        properties: vec![Property::new("test-property", "fast")],
                        tests: vec![Test::TestCase(TestCase {
                            properties: vec![Property::new("test-property", "hermetic")],
                            ..TestCase::default()
                        })],
                        ..TestSuite::default()
                    }),
                }),
                ..Action::default()
            }),
            ..ActionResult::default()
        };
        assert_eq!(
            result_headers(Some(&with_suite), Some(&rule)),
            strings(&["fast", "hermetic"])
        );
    }

    #[test]
    fn test_compile_headers() {
        assert!(compile_headers(&[], &[]).is_empty());

        assert_eq!(
            compile_headers(&[rule_label("rapid=", false)], &[Vec::new()]),
            strings(&[""])
        );
        assert_eq!(
            compile_headers(&[rule_config("os")], &[strings(&["linux"])]),
            strings(&["linux"])
        );
        assert_eq!(
            compile_headers(&[rule_config("os")], &[strings(&["linux", "linux"])]),
            strings(&["linux"])
        );
        assert_eq!(
            compile_headers(
                &[rule_label("os=", false), rule_config("test-duration")],
                &[strings(&["linux", "ubuntu"]), strings(&["30m"])],
            ),
            strings(&["*", "30m"])
        );

        let list_all = vec![
            ColumnHeaderRule {
                property: "type".to_string(),
                list_all_values: true,
                ..ColumnHeaderRule::default()
            },
            rule_label("test=", true),
        ];
        assert_eq!(
            compile_headers(
                &list_all,
                &[strings(&["grass", "flying"]), strings(&["fast", "unit", "hermetic"])],
            ),
            strings(&["flying||grass", "fast||hermetic||unit"])
        );
    }
}
