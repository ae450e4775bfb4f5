//! Test-method selection.
//!
//! Flattens a test-suite tree into its leaves and narrows the leaves by
//! required properties and by name regexes. A suite without nested tests
//! stands in for itself so that "ran, no cases" still produces a method.

use std::collections::{BTreeMap, HashSet};

use regex::Regex;
use tracing::warn;

use crate::domain::models::{KeyValue, Test, TestGroupConfig, TestSuite};

/// Leaves of a suite tree, depth-first in document order.
pub fn flatten(suite: Option<&TestSuite>) -> Vec<Test> {
    let Some(root) = suite else {
        return Vec::new();
    };
    if root.tests.is_empty() {
        return vec![Test::TestSuite(root.clone())];
    }

    let mut leaves = Vec::new();
    let mut stack: Vec<&Test> = root.tests.iter().rev().collect();
    while let Some(test) = stack.pop() {
        match test {
            Test::TestSuite(nested) if !nested.tests.is_empty() => {
                stack.extend(nested.tests.iter().rev());
            }
            leaf => leaves.push(leaf.clone()),
        }
    }
    leaves
}

/// Keep cases whose name matches `include` and does not match `exclude`.
pub fn match_results(
    cases: Vec<Test>,
    include: Option<&Regex>,
    exclude: Option<&Regex>,
) -> Vec<Test> {
    if include.is_none() && exclude.is_none() {
        return cases;
    }
    cases
        .into_iter()
        .filter(|case| {
            let name = case.name();
            include.is_none_or(|re| re.is_match(name)) && !exclude.is_some_and(|re| re.is_match(name))
        })
        .collect()
}

/// Keep cases carrying every required key/value pair.
pub fn filter_properties(cases: Vec<Test>, required: &[KeyValue]) -> Vec<Test> {
    if required.is_empty() {
        return cases;
    }
    cases
        .into_iter()
        .filter(|case| has_all_properties(case, required))
        .collect()
}

fn has_all_properties(case: &Test, required: &[KeyValue]) -> bool {
    let properties = case.properties();
    required.iter().all(|kv| {
        properties
            .iter()
            .any(|p| p.key == kv.key && p.value == kv.value)
    })
}

/// Apply the property and name filters. The flag reports whether any
/// filter was configured, whether or not it removed anything.
pub fn filter_results(
    cases: Vec<Test>,
    required: &[KeyValue],
    include: Option<&Regex>,
    exclude: Option<&Regex>,
) -> (Vec<Test>, bool) {
    let filtered = !required.is_empty() || include.is_some() || exclude.is_some();
    let cases = filter_properties(cases, required);
    (match_results(cases, include, exclude), filtered)
}

/// Compile the group's method regexes. A pattern that fails to compile
/// disables that filter.
pub fn method_regexes(group: Option<&TestGroupConfig>) -> (Option<Regex>, Option<Regex>) {
    let Some(group) = group else {
        return (None, None);
    };
    (
        compile_pattern(&group.name, "test_method_match_regex", &group.test_method_match_regex),
        compile_pattern(&group.name, "test_method_unmatch_regex", &group.test_method_unmatch_regex),
    )
}

fn compile_pattern(group: &str, field: &str, pattern: &str) -> Option<Regex> {
    if pattern.is_empty() {
        return None;
    }
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(err) => {
            warn!(group = %group, field, pattern, error = %err, "Invalid test method regex, filter disabled");
            None
        }
    }
}

/// Copy a case's properties into `map`, restricted to `keys` when given.
pub fn fill_properties(
    map: &mut BTreeMap<String, String>,
    case: Option<&Test>,
    keys: Option<&HashSet<String>>,
) {
    let Some(case) = case else {
        return;
    };
    for property in case.properties() {
        if keys.is_none_or(|keys| keys.contains(&property.key)) {
            map.insert(property.key.clone(), property.value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Property, TestCase};

    fn case(name: &str) -> Test {
        Test::TestCase(TestCase::named(name))
    }

    fn case_with(name: &str, properties: &[(&str, &str)]) -> Test {
        Test::TestCase(TestCase {
            properties: properties.iter().map(|(k, v)| Property::new(*k, *v)).collect(),
            ..TestCase::named(name)
        })
    }

    fn suite(name: &str, tests: Vec<Test>) -> TestSuite {
        TestSuite {
            suite_name: name.to_string(),
            tests,
            ..TestSuite::default()
        }
    }

    fn names(cases: &[Test]) -> Vec<&str> {
        cases.iter().map(Test::name).collect()
    }

    #[test]
    fn test_flatten_missing_suite() {
        assert!(flatten(None).is_empty());
    }

    #[test]
    fn test_flatten_empty_suite_yields_itself() {
        let root = suite("Empty", vec![]);
        let leaves = flatten(Some(&root));
        assert_eq!(leaves, vec![Test::TestSuite(root)]);
    }

    #[test]
    fn test_flatten_depth_first_document_order() {
        let root = suite(
            "root",
            vec![
                case("a"),
                Test::TestSuite(suite(
                    "inner",
                    vec![
                        case("b"),
                        Test::TestSuite(suite("deep", vec![case("c")])),
                        Test::TestSuite(suite("no-cases", vec![])),
                    ],
                )),
                case("d"),
            ],
        );

        assert_eq!(names(&flatten(Some(&root))), vec!["a", "b", "c", "no-cases", "d"]);
    }

    #[test]
    fn test_match_results() {
        let cases = vec![case("TestFast"), case("TestSlow"), case("BenchFast")];
        let include = Regex::new("^Test").expect("valid regex");
        let exclude = Regex::new("Slow").expect("valid regex");

        assert_eq!(names(&match_results(cases.clone(), None, None)).len(), 3);
        assert_eq!(
            names(&match_results(cases.clone(), Some(&include), None)),
            vec!["TestFast", "TestSlow"]
        );
        assert_eq!(
            names(&match_results(cases.clone(), None, Some(&exclude))),
            vec!["TestFast", "BenchFast"]
        );
        assert_eq!(
            names(&match_results(cases, Some(&include), Some(&exclude))),
            vec!["TestFast"]
        );
    }

    #[test]
    fn test_match_results_uses_suite_name_for_pseudo_case() {
        let cases = vec![Test::TestSuite(suite("EmptySuite", vec![]))];
        let include = Regex::new("Empty").expect("valid regex");
        assert_eq!(match_results(cases, Some(&include), None).len(), 1);
    }

    #[test]
    fn test_filter_properties() {
        let cases = vec![
            case_with("wrong-key", &[("random", "gold")]),
            case_with("correct-key", &[("goal", "gold")]),
            case_with("wrong-value", &[("goal", "silver")]),
            case_with(
                "multiple-key-value-pairs",
                &[("silver", "medal"), ("goal", "gold"), ("critical", "information")],
            ),
            case("no-properties"),
        ];
        let required = vec![KeyValue::new("goal", "gold")];

        assert_eq!(
            names(&filter_properties(cases.clone(), &required)),
            vec!["correct-key", "multiple-key-value-pairs"]
        );
        assert_eq!(filter_properties(cases, &[]).len(), 5);
    }

    #[test]
    fn test_filter_results_flag() {
        let cases = vec![case("every"), case("thing")];

        let (kept, filtered) = filter_results(cases.clone(), &[], None, None);
        assert_eq!(kept.len(), 2);
        assert!(!filtered);

        let nothing = Regex::new("sandwiches").expect("valid regex");
        let (kept, filtered) = filter_results(cases.clone(), &[], Some(&nothing), None);
        assert!(kept.is_empty());
        assert!(filtered);

        let (kept, filtered) =
            filter_results(cases.clone(), &[KeyValue::new("medal", "gold")], None, None);
        assert!(kept.is_empty());
        assert!(filtered);

        let (kept, filtered) = filter_results(Vec::new(), &[KeyValue::default()], None, None);
        assert!(kept.is_empty());
        assert!(filtered);

        let everything = Regex::new(".*").expect("valid regex");
        let (kept, filtered) = filter_results(cases, &[], Some(&everything), None);
        assert_eq!(kept.len(), 2);
        assert!(filtered);
    }

    #[test]
    fn test_method_regexes() {
        assert!(matches!(method_regexes(None), (None, None)));
        assert!(matches!(method_regexes(Some(&TestGroupConfig::default())), (None, None)));

        let group = TestGroupConfig {
            test_method_match_regex: "yes".to_string(),
            test_method_unmatch_regex: "no".to_string(),
            ..TestGroupConfig::default()
        };
        let (include, exclude) = method_regexes(Some(&group));
        assert_eq!(include.map(|re| re.as_str().to_string()), Some("yes".to_string()));
        assert_eq!(exclude.map(|re| re.as_str().to_string()), Some("no".to_string()));

        let invalid = TestGroupConfig {
            test_method_match_regex: "(unclosed".to_string(),
            test_method_unmatch_regex: "[z-a]".to_string(),
            ..TestGroupConfig::default()
        };
        assert!(matches!(method_regexes(Some(&invalid)), (None, None)));
    }

    #[test]
    fn test_fill_properties() {
        let mut empty = BTreeMap::new();
        fill_properties(&mut empty, None, None);
        assert!(empty.is_empty());

        let result = case_with("c", &[("squidward", "green")]);
        let mut all = BTreeMap::from([
            ("spongebob".to_string(), "yellow".to_string()),
            ("patrick".to_string(), "pink".to_string()),
        ]);
        fill_properties(&mut all, Some(&result), None);
        assert_eq!(all.len(), 3);
        assert_eq!(all.get("squidward").map(String::as_str), Some("green"));

        let keyed = case_with("c", &[("squidward", "blue"), ("plankton", "green")]);
        let keys = HashSet::from(["squidward".to_string()]);
        let mut restricted = BTreeMap::new();
        fill_properties(&mut restricted, Some(&keyed), Some(&keys));
        assert_eq!(
            restricted,
            BTreeMap::from([("squidward".to_string(), "blue".to_string())])
        );
    }
}
