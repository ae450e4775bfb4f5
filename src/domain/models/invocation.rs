//! ResultStore record types and the assembled forms built from them.
//!
//! The raw records mirror the ResultStore v2 REST representation
//! (camelCase fields, RFC 3339 timestamps, upper-snake enum names) so that
//! an export response deserializes directly into an [`InvocationBundle`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Build/test status reported by ResultStore for invocations, targets,
/// configured targets and actions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultStatus {
    #[default]
    StatusUnspecified,
    Building,
    Built,
    FailedToBuild,
    Testing,
    Passed,
    Failed,
    TimedOut,
    Cancelled,
    ToolFailed,
    Incomplete,
    Flaky,
    Skipped,
    /// Also absorbs values newer than this enumeration.
    #[serde(other)]
    Unknown,
}

/// Status wrapper shared by every record kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusAttributes {
    pub status: ResultStatus,
    pub description: String,
}

/// A key/value pair attached to a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Property {
    pub key: String,
    pub value: String,
}

impl Property {
    /// Convenience constructor.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Timing of an invocation or action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Timing {
    pub start_time: Option<DateTime<Utc>>,
    /// Duration as ResultStore prints it (for example `"12.5s"`).
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvocationId {
    pub invocation_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvocationAttributes {
    pub labels: Vec<String>,
    pub project_id: String,
}

/// One recorded run of a build/test session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Invocation {
    pub name: String,
    pub id: InvocationId,
    pub status_attributes: StatusAttributes,
    pub timing: Timing,
    pub invocation_attributes: InvocationAttributes,
    pub properties: Vec<Property>,
}

impl Invocation {
    /// The invocation identifier.
    pub fn invocation_id(&self) -> &str {
        &self.id.invocation_id
    }

    /// Start time, if ResultStore recorded one.
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.timing.start_time
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TargetId {
    pub invocation_id: String,
    pub target_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TargetAttributes {
    pub tags: Vec<String>,
}

/// One buildable/testable unit within an invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Target {
    pub name: String,
    pub id: TargetId,
    pub status_attributes: StatusAttributes,
    pub target_attributes: TargetAttributes,
    pub properties: Vec<Property>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfiguredTargetId {
    pub invocation_id: String,
    pub target_id: String,
    pub configuration_id: String,
}

/// A target instantiated under one build configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfiguredTarget {
    pub name: String,
    pub id: ConfiguredTargetId,
    pub status_attributes: StatusAttributes,
    pub properties: Vec<Property>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActionId {
    pub invocation_id: String,
    pub target_id: String,
    pub configuration_id: String,
    pub action_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestAction {
    pub test_suite: Option<TestSuite>,
}

/// One executed step (build or test) against a configured target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Action {
    pub name: String,
    pub id: ActionId,
    pub status_attributes: StatusAttributes,
    pub timing: Timing,
    pub test_action: Option<TestAction>,
    pub properties: Vec<Property>,
}

impl Action {
    /// The test suite recorded by a test action, if any.
    pub fn test_suite(&self) -> Option<&TestSuite> {
        self.test_action.as_ref()?.test_suite.as_ref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestFailure {
    pub failure_message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestError {
    pub error_message: String,
}

/// Outcome of a single test case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestCaseResult {
    Completed,
    Interrupted,
    Cancelled,
    Filtered,
    Skipped,
    Suppressed,
    #[default]
    #[serde(other)]
    ResultUnspecified,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestCase {
    pub case_name: String,
    pub class_name: String,
    pub result: TestCaseResult,
    pub failures: Vec<TestFailure>,
    pub errors: Vec<TestError>,
    pub properties: Vec<Property>,
}

impl TestCase {
    /// Named case with no result details.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            case_name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestSuite {
    pub suite_name: String,
    pub tests: Vec<Test>,
    pub failures: Vec<TestFailure>,
    pub errors: Vec<TestError>,
    pub properties: Vec<Property>,
}

/// A node in a test-suite tree: either a leaf case or a nested suite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Test {
    TestCase(TestCase),
    TestSuite(TestSuite),
}

impl Test {
    /// Case name, or suite name for a suite node.
    pub fn name(&self) -> &str {
        match self {
            Self::TestCase(case) => &case.case_name,
            Self::TestSuite(suite) => &suite.suite_name,
        }
    }

    /// Properties attached directly to this node.
    pub fn properties(&self) -> &[Property] {
        match self {
            Self::TestCase(case) => &case.properties,
            Self::TestSuite(suite) => &suite.properties,
        }
    }
}

/// Everything one export call returns for a single invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvocationBundle {
    pub invocation: Invocation,
    pub targets: Vec<Target>,
    pub configured_targets: Vec<ConfiguredTarget>,
    pub actions: Vec<Action>,
}

/// One (target, configured target, action) triple for a target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionResult {
    pub target: Target,
    pub configured_target: Option<ConfiguredTarget>,
    pub action: Option<Action>,
}

impl ActionResult {
    /// Status used for filtering and mapping: the configured target's,
    /// falling back to the target's own when no configured target exists.
    ///
    /// Exports without configured targets would otherwise read as
    /// STATUS_UNSPECIFIED and be dropped; the fallback keeps them.
    pub fn status(&self) -> ResultStatus {
        self.configured_target.as_ref().map_or(
            self.target.status_attributes.status,
            |configured| configured.status_attributes.status,
        )
    }

    /// The test suite recorded by this result's action.
    pub fn test_suite(&self) -> Option<&TestSuite> {
        self.action.as_ref()?.test_suite()
    }
}

/// An invocation joined with its per-target action results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssembledInvocation {
    pub invocation: Invocation,
    /// Target id to results, ordered by target id.
    pub target_results: BTreeMap<String, Vec<ActionResult>>,
}

impl AssembledInvocation {
    /// Wrap an invocation with no target results.
    pub fn new(invocation: Invocation) -> Self {
        Self {
            invocation,
            target_results: BTreeMap::new(),
        }
    }

    pub fn invocation_id(&self) -> &str {
        self.invocation.invocation_id()
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.invocation.start_time()
    }
}

/// Invocations sharing one group key; becomes one column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationGroup {
    pub group_id: String,
    pub invocations: Vec<AssembledInvocation>,
}
