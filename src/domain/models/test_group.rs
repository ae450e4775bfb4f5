//! Per-group settings that drive grouping, filtering and materialization.
//!
//! A `TestGroupConfig` is immutable once loaded and is passed by reference
//! into every pure function of the pipeline.

use serde::{Deserialize, Serialize};

use super::column::TestStatus;

/// How invocations are clustered into columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryGrouping {
    /// One column per invocation.
    #[default]
    Invocation,
    /// One column per build label (see `build_override_configuration_value`).
    Build,
}

/// Grouping applied when the primary key cannot be resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackGrouping {
    #[default]
    None,
    Build,
}

/// Required key/value pair on a test case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Where a column header value is read from. Exactly one source is
/// expected to be set; the first non-empty one in declaration order wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnHeaderRule {
    /// Invocation property key.
    pub configuration_value: String,
    /// Invocation label prefix, for example `os=`.
    pub label: String,
    /// Test suite / test case property key.
    pub property: String,
    /// Emit every distinct value instead of collapsing to one.
    pub list_all_values: bool,
}

/// Short text shown on a cell when a named property or tag is present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationRule {
    pub short_text: String,
    pub property_name: String,
}

/// Which field of a result a comparison reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultField {
    TargetStatus,
    Property(String),
    TestName,
    FailureMessage,
}

/// Comparison operator. Unrecognised operators decode as `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOp {
    Eq,
    Ne,
    StartsWith,
    Contains,
    Lt,
    Le,
    Gt,
    Ge,
    #[serde(other)]
    Unknown,
}

/// Literal a field is compared against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonValue {
    Status(TestStatus),
    Text(String),
    Number(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub field: ResultField,
    pub op: ComparisonOp,
    pub value: ComparisonValue,
}

/// Overrides the computed status when every comparison holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatorRule {
    pub computed_status: TestStatus,
    #[serde(default)]
    pub comparisons: Vec<Comparison>,
}

/// Settings for one dashboard tab's worth of results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestGroupConfig {
    pub name: String,
    /// Retention window; the first query reaches back twice this far.
    pub days_of_results: u32,
    pub primary_grouping: PrimaryGrouping,
    pub fallback_grouping: FallbackGrouping,
    /// Invocation property holding the build label.
    pub build_override_configuration_value: String,
    /// strftime pattern applied to the invocation start time.
    pub build_override_strftime: String,
    pub ignore_built: bool,
    pub ignore_pending: bool,
    pub ignore_skip: bool,
    pub custom_evaluator_rules: Vec<EvaluatorRule>,
    pub column_headers: Vec<ColumnHeaderRule>,
    pub test_annotations: Vec<AnnotationRule>,
    pub enable_test_methods: bool,
    /// Cap on method cells per result; 0 disables the cap.
    pub max_test_methods_per_test: usize,
    pub test_method_match_regex: String,
    pub test_method_unmatch_regex: String,
    pub test_method_properties: Vec<KeyValue>,
}
