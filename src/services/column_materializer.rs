//! Turns one invocation group into one dashboard column.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::domain::models::{
    format_hint, timestamp_millis, ActionResult, AssembledInvocation, Cell, Column,
    ColumnHeaderRule, InvocationGroup, Property, TestGroupConfig,
};
use crate::services::{
    cell_annotations, column_headers, grouper, status_policy, test_case_selector,
};

/// Separator between a target cell key and a test method name.
pub const METHOD_SEPARATOR: &str = "@TESTGRID@";

/// Materialize a column from a group, or `None` for an absent or empty
/// group.
pub fn materialize(
    group_config: Option<&TestGroupConfig>,
    group: Option<&InvocationGroup>,
) -> Option<Column> {
    let group = group?;
    let first = group.invocations.first()?;

    let build = match grouper::identify_build(group_config, first) {
        label if label.is_empty() => group.group_id.clone(),
        label => label,
    };

    let starts: Vec<DateTime<Utc>> = group
        .invocations
        .iter()
        .filter_map(AssembledInvocation::start_time)
        .collect();
    let earliest = starts.iter().min().copied();
    let latest = starts.iter().max().copied();

    let mut builder = CellBuilder::new(group_config);
    for (index, invocation) in group.invocations.iter().enumerate() {
        builder.add_invocation(index, invocation);
    }

    Some(Column {
        name: group.group_id.clone(),
        build,
        started: timestamp_millis(earliest),
        hint: latest.map(format_hint).unwrap_or_default(),
        extra: builder.compile_headers(),
        cells: builder.cells,
    })
}

/// Cell key of a target within the `index`-th invocation of a group.
pub fn target_cell_key(target_id: &str, index: usize) -> String {
    if index == 0 {
        target_id.to_string()
    } else {
        format!("{target_id} [{index}]")
    }
}

/// Cell key of a test method under a target cell.
pub fn method_cell_key(target_key: &str, method: &str) -> String {
    format!("{target_key}{METHOD_SEPARATOR}{method}")
}

struct CellBuilder<'a> {
    config: Option<&'a TestGroupConfig>,
    include: Option<Regex>,
    exclude: Option<Regex>,
    header_values: Vec<Vec<String>>,
    cells: BTreeMap<String, Cell>,
}

impl<'a> CellBuilder<'a> {
    fn new(config: Option<&'a TestGroupConfig>) -> Self {
        let (include, exclude) = match config {
            Some(cfg) if cfg.enable_test_methods => test_case_selector::method_regexes(Some(cfg)),
            _ => (None, None),
        };
        let header_count = config.map_or(0, |cfg| cfg.column_headers.len());
        Self {
            config,
            include,
            exclude,
            header_values: vec![Vec::new(); header_count],
            cells: BTreeMap::new(),
        }
    }

    fn header_rules(&self) -> &'a [ColumnHeaderRule] {
        self.config.map_or(&[][..], |cfg| cfg.column_headers.as_slice())
    }

    fn add_invocation(&mut self, index: usize, invocation: &AssembledInvocation) {
        let rules = self.header_rules();
        for (values, rule) in self.header_values.iter_mut().zip(rules) {
            values.extend(column_headers::invocation_headers(Some(invocation), Some(rule)));
        }

        for (target_id, results) in &invocation.target_results {
            let key = target_cell_key(target_id, index);
            for result in results {
                if !status_policy::include_status(self.config, result) {
                    continue;
                }
                for (values, rule) in self.header_values.iter_mut().zip(rules) {
                    values.extend(column_headers::result_headers(Some(result), Some(rule)));
                }
                self.add_result(&key, target_id, invocation, result);
            }
        }
    }

    fn add_result(
        &mut self,
        key: &str,
        target_id: &str,
        invocation: &AssembledInvocation,
        result: &ActionResult,
    ) {
        let cell_id = invocation.invocation_id();
        let annotations = self.config.map_or(&[][..], |cfg| cfg.test_annotations.as_slice());
        let tags = &result.target.target_attributes.tags;
        let base_properties = annotation_properties(invocation, result);

        if !self.cells.contains_key(key) {
            let status = status_policy::resolve_status(self.config, result);
            let mut cell = Cell::new(target_id, cell_id, status);
            (cell.message, cell.icon) =
                cell_annotations::cell_message_icon(annotations, &base_properties, tags);
            self.cells.insert(key.to_string(), cell);
        }

        let Some(config) = self.config.filter(|cfg| cfg.enable_test_methods) else {
            return;
        };

        let (cases, _) = test_case_selector::filter_results(
            test_case_selector::flatten(result.test_suite()),
            &config.test_method_properties,
            self.include.as_ref(),
            self.exclude.as_ref(),
        );
        let limit = match config.max_test_methods_per_test {
            0 => usize::MAX,
            cap => cap,
        };

        for case in cases.iter().take(limit) {
            let method_key = method_cell_key(key, case.name());
            if self.cells.contains_key(&method_key) {
                continue;
            }

            let mut cell = Cell::new(target_id, cell_id, status_policy::test_case_status(case));
            test_case_selector::fill_properties(&mut cell.properties, Some(case), None);

            let mut properties = base_properties.clone();
            push_properties(&mut properties, case.properties());
            (cell.message, cell.icon) =
                cell_annotations::cell_message_icon(annotations, &properties, tags);
            self.cells.insert(method_key, cell);
        }
    }

    fn compile_headers(&self) -> Vec<String> {
        column_headers::compile_headers(self.header_rules(), &self.header_values)
    }
}

/// Properties visible to annotation rules for a result's cells.
fn annotation_properties(
    invocation: &AssembledInvocation,
    result: &ActionResult,
) -> HashMap<String, Vec<String>> {
    let mut properties = HashMap::new();
    push_properties(&mut properties, &invocation.invocation.properties);
    push_properties(&mut properties, &result.target.properties);
    if let Some(configured) = &result.configured_target {
        push_properties(&mut properties, &configured.properties);
    }
    if let Some(suite) = result.test_suite() {
        push_properties(&mut properties, &suite.properties);
    }
    properties
}

fn push_properties(map: &mut HashMap<String, Vec<String>>, properties: &[Property]) {
    for property in properties {
        map.entry(property.key.clone())
            .or_default()
            .push(property.value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::invocation::{
        ConfiguredTargetId, InvocationId, StatusAttributes, TestAction, TestFailure,
    };
    use crate::domain::models::{
        Action, AnnotationRule, Comparison, ComparisonOp, ComparisonValue,
        ConfiguredTarget, EvaluatorRule, Invocation, KeyValue, ResultField, ResultStatus, Test,
        TestCase, TestCaseResult, TestStatus, TestSuite,
    };

    fn invocation(id: &str, start_secs: i64, properties: &[(&str, &str)]) -> AssembledInvocation {
        let mut inv = Invocation {
            name: format!("invocations/{id}"),
            id: InvocationId {
                invocation_id: id.to_string(),
            },
            properties: properties.iter().map(|(k, v)| Property::new(*k, *v)).collect(),
            ..Invocation::default()
        };
        inv.timing.start_time = DateTime::from_timestamp(start_secs, 0);
        AssembledInvocation::new(inv)
    }

    fn result(target_id: &str, status: ResultStatus) -> ActionResult {
        ActionResult {
            configured_target: Some(ConfiguredTarget {
                id: ConfiguredTargetId {
                    target_id: target_id.to_string(),
                    ..ConfiguredTargetId::default()
                },
                status_attributes: StatusAttributes {
                    status,
                    ..StatusAttributes::default()
                },
                ..ConfiguredTarget::default()
            }),
            ..ActionResult::default()
        }
    }

    fn with_suite(mut result: ActionResult, suite: TestSuite) -> ActionResult {
        result.action = Some(Action {
            test_action: Some(TestAction {
                test_suite: Some(suite),
            }),
            ..Action::default()
        });
        result
    }

    fn add(inv: &mut AssembledInvocation, target_id: &str, results: Vec<ActionResult>) {
        inv.target_results.insert(target_id.to_string(), results);
    }

    fn group(id: &str, invocations: Vec<AssembledInvocation>) -> InvocationGroup {
        InvocationGroup {
            group_id: id.to_string(),
            invocations,
        }
    }

    #[test]
    fn test_materialize_absent_or_empty() {
        assert!(materialize(None, None).is_none());
        assert!(materialize(None, Some(&InvocationGroup::default())).is_none());
    }

    #[test]
    fn test_materialize_basic_group() {
        let mut inv = invocation("uuid-123", 1234, &[]);
        add(&mut inv, "tgt-id-1", vec![result("tgt-id-1", ResultStatus::Passed)]);
        add(&mut inv, "tgt-id-2", vec![result("tgt-id-2", ResultStatus::Failed)]);

        let column = materialize(None, Some(&group("uuid-123", vec![inv]))).expect("column");
        assert_eq!(column.name, "uuid-123");
        assert_eq!(column.build, "uuid-123");
        assert!((column.started - 1_234_000.0).abs() < f64::EPSILON);
        assert_eq!(column.hint, "1970-01-01T00:20:34Z");
        assert_eq!(
            column.cells,
            BTreeMap::from([
                ("tgt-id-1".to_string(), Cell::new("tgt-id-1", "uuid-123", TestStatus::Pass)),
                ("tgt-id-2".to_string(), Cell::new("tgt-id-2", "uuid-123", TestStatus::Fail)),
            ])
        );
    }

    #[test]
    fn test_materialize_repeated_targets_are_disambiguated() {
        let config = TestGroupConfig {
            build_override_configuration_value: "pi-key-chu".to_string(),
            ..TestGroupConfig::default()
        };
        let mut first = invocation("uuid-123", 1234, &[("pi-key-chu", "snorlax")]);
        add(&mut first, "tgt-id-1", vec![result("tgt-id-1", ResultStatus::Passed)]);
        add(&mut first, "tgt-id-2", vec![result("tgt-id-2", ResultStatus::Failed)]);
        let mut second = invocation("uuid-124", 1334, &[("pi-key-chu", "snorlax")]);
        add(&mut second, "tgt-id-1", vec![result("tgt-id-1", ResultStatus::Passed)]);
        add(&mut second, "tgt-id-2", vec![result("tgt-id-2", ResultStatus::Failed)]);

        let column = materialize(Some(&config), Some(&group("snorlax", vec![first, second])))
            .expect("column");
        assert_eq!(column.build, "snorlax");
        assert!((column.started - 1_234_000.0).abs() < f64::EPSILON);
        assert_eq!(column.hint, "1970-01-01T00:22:14Z");

        let keys: Vec<_> = column.cells.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["tgt-id-1", "tgt-id-1 [1]", "tgt-id-2", "tgt-id-2 [1]"]);
        assert_eq!(column.cells["tgt-id-1 [1]"].cell_id, "uuid-124");
        assert_eq!(column.cells["tgt-id-1 [1]"].id, "tgt-id-1");
        assert_eq!(column.cells["tgt-id-2 [1]"].result, TestStatus::Fail);
    }

    #[test]
    fn test_materialize_test_methods() {
        let config = TestGroupConfig {
            build_override_configuration_value: "pi-key-chu".to_string(),
            max_test_methods_per_test: 10,
            enable_test_methods: true,
            ..TestGroupConfig::default()
        };
        let suite = TestSuite {
            suite_name: "TestDetectJSError".to_string(),
            tests: vec![
                Test::TestCase(TestCase {
                    result: TestCaseResult::Skipped,
                    ..TestCase::named("DISABLED_case")
                }),
                Test::TestCase(TestCase {
                    failures: vec![TestFailure {
                        failure_message: "foo".to_string(),
                    }],
                    properties: vec![Property::new("owner", "web")],
                    ..TestCase::named("Not_working_case")
                }),
            ],
            ..TestSuite::default()
        };
        let mut inv = invocation("uuid-123", 1234, &[("pi-key-chu", "snorlax")]);
        add(
            &mut inv,
            "tgt-id-1",
            vec![with_suite(result("tgt-id-1", ResultStatus::Passed), suite)],
        );

        let column = materialize(Some(&config), Some(&group("snorlax", vec![inv]))).expect("column");
        assert_eq!(column.cells.len(), 3);
        assert_eq!(column.cells["tgt-id-1"].result, TestStatus::Pass);

        let disabled = &column.cells["tgt-id-1@TESTGRID@DISABLED_case"];
        assert_eq!(disabled.result, TestStatus::PassWithSkips);
        assert_eq!(disabled.id, "tgt-id-1");
        assert_eq!(disabled.cell_id, "uuid-123");

        let failing = &column.cells["tgt-id-1@TESTGRID@Not_working_case"];
        assert_eq!(failing.result, TestStatus::Fail);
        assert_eq!(failing.properties.get("owner").map(String::as_str), Some("web"));
    }

    #[test]
    fn test_materialize_repeated_target_methods_carry_index() {
        let config = TestGroupConfig {
            build_override_configuration_value: "pi-key-chu".to_string(),
            enable_test_methods: true,
            max_test_methods_per_test: 10,
            ..TestGroupConfig::default()
        };
        let suite = |name: &str| TestSuite {
            tests: vec![Test::TestCase(TestCase::named(name))],
            ..TestSuite::default()
        };
        let mut first = invocation("uuid-123", 1234, &[("pi-key-chu", "snorlax")]);
        add(
            &mut first,
            "//pkg:t",
            vec![with_suite(result("//pkg:t", ResultStatus::Passed), suite("case"))],
        );
        let mut second = invocation("uuid-124", 1334, &[("pi-key-chu", "snorlax")]);
        add(
            &mut second,
            "//pkg:t",
            vec![with_suite(result("//pkg:t", ResultStatus::Failed), suite("case"))],
        );

        let column = materialize(Some(&config), Some(&group("snorlax", vec![first, second])))
            .expect("column");
        let keys: Vec<_> = column.cells.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["//pkg:t", "//pkg:t [1]", "//pkg:t [1]@TESTGRID@case", "//pkg:t@TESTGRID@case"]
        );
        let repeated = &column.cells["//pkg:t [1]@TESTGRID@case"];
        assert_eq!(repeated.id, "//pkg:t");
        assert_eq!(repeated.cell_id, "uuid-124");
        assert_eq!(column.cells["//pkg:t@TESTGRID@case"].cell_id, "uuid-123");
    }

    #[test]
    fn test_materialize_method_cap_and_filters() {
        let config = TestGroupConfig {
            enable_test_methods: true,
            max_test_methods_per_test: 1,
            test_method_unmatch_regex: "^skip".to_string(),
            test_method_properties: vec![KeyValue::new("size", "small")],
            ..TestGroupConfig::default()
        };
        let small = |name: &str| {
            Test::TestCase(TestCase {
                properties: vec![Property::new("size", "small")],
                ..TestCase::named(name)
            })
        };
        let suite = TestSuite {
            tests: vec![
                Test::TestCase(TestCase::named("large")),
                small("skip_me"),
                small("first"),
                small("second"),
            ],
            ..TestSuite::default()
        };
        let mut inv = invocation("inv", 10, &[]);
        add(&mut inv, "//t", vec![with_suite(result("//t", ResultStatus::Passed), suite)]);

        let column = materialize(Some(&config), Some(&group("inv", vec![inv]))).expect("column");
        let keys: Vec<_> = column.cells.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["//t", "//t@TESTGRID@first"]);
    }

    #[test]
    fn test_materialize_ignored_statuses_and_custom_rules() {
        let config = TestGroupConfig {
            ignore_pending: true,
            custom_evaluator_rules: vec![EvaluatorRule {
                computed_status: TestStatus::CategorizedAbort,
                comparisons: vec![Comparison {
                    field: ResultField::TargetStatus,
                    op: ComparisonOp::Eq,
                    value: ComparisonValue::Status(TestStatus::TimedOut),
                }],
            }],
            ..TestGroupConfig::default()
        };
        let mut inv = invocation("uuid-123", 1234, &[]);
        add(&mut inv, "tgt-id-1", vec![result("tgt-id-1", ResultStatus::Passed)]);
        add(&mut inv, "tgt-id-2", vec![result("tgt-id-2", ResultStatus::Testing)]);
        add(&mut inv, "tgt-id-3", vec![result("tgt-id-3", ResultStatus::TimedOut)]);

        let column = materialize(Some(&config), Some(&group("uuid-123", vec![inv]))).expect("column");
        assert_eq!(column.cells.len(), 2);
        assert_eq!(column.cells["tgt-id-1"].result, TestStatus::Pass);
        assert!(!column.cells.contains_key("tgt-id-2"));
        assert_eq!(column.cells["tgt-id-3"].result, TestStatus::CategorizedAbort);
    }

    #[test]
    fn test_materialize_first_included_result_wins() {
        let mut inv = invocation("inv", 10, &[]);
        add(
            &mut inv,
            "//t",
            vec![
                result("//t", ResultStatus::StatusUnspecified),
                result("//t", ResultStatus::Failed),
                result("//t", ResultStatus::Passed),
            ],
        );
        let column = materialize(None, Some(&group("inv", vec![inv]))).expect("column");
        assert_eq!(column.cells.len(), 1);
        assert_eq!(column.cells["//t"].result, TestStatus::Fail);
    }

    #[test]
    fn test_materialize_headers_and_annotations() {
        let config = TestGroupConfig {
            column_headers: vec![
                ColumnHeaderRule {
                    label: "os=".to_string(),
                    ..ColumnHeaderRule::default()
                },
                ColumnHeaderRule {
                    property: "shard".to_string(),
                    list_all_values: true,
                    ..ColumnHeaderRule::default()
                },
            ],
            test_annotations: vec![
                AnnotationRule {
                    short_text: "F".to_string(),
                    property_name: "flaky".to_string(),
                },
                AnnotationRule {
                    short_text: "B".to_string(),
                    property_name: "bug".to_string(),
                },
            ],
            ..TestGroupConfig::default()
        };

        let mut first = invocation("a", 10, &[("bug", "b/123")]);
        first.invocation.invocation_attributes.labels = vec!["os=linux".to_string()];
        let mut tagged = with_suite(
            result("//t", ResultStatus::Passed),
            TestSuite {
                properties: vec![Property::new("shard", "2")],
                ..TestSuite::default()
            },
        );
        tagged.target.target_attributes.tags = vec!["flaky".to_string()];
        add(&mut first, "//t", vec![tagged]);

        let mut second = invocation("b", 20, &[]);
        second.invocation.invocation_attributes.labels = vec!["os=mac".to_string()];
        add(
            &mut second,
            "//t",
            vec![with_suite(
                result("//t", ResultStatus::Passed),
                TestSuite {
                    properties: vec![Property::new("shard", "1")],
                    ..TestSuite::default()
                },
            )],
        );

        let column = materialize(Some(&config), Some(&group("g", vec![first, second]))).expect("column");
        assert_eq!(column.extra, vec!["*".to_string(), "1||2".to_string()]);

        let annotated = &column.cells["//t"];
        assert_eq!(annotated.message, "flaky");
        assert_eq!(annotated.icon, "F");
        assert!(column.cells["//t [1]"].message.is_empty());
    }

    #[test]
    fn test_cell_keys() {
        assert_eq!(target_cell_key("//t", 0), "//t");
        assert_eq!(target_cell_key("//t", 2), "//t [2]");
        assert_eq!(method_cell_key("//t [2]", "Case"), "//t [2]@TESTGRID@Case");
    }
}
