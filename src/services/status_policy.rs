//! Status mapping and inclusion policy for action results.

use crate::domain::models::{
    ActionResult, ResultStatus, Test, TestCase, TestCaseResult, TestGroupConfig, TestStatus,
    TestSuite,
};
use crate::domain::models::invocation::{TestError, TestFailure};
use crate::services::rule_evaluator::{self, EvaluationSubject};

/// Name prefix marking a test case as intentionally disabled.
pub const DISABLED_PREFIX: &str = "DISABLED_";

/// Whether a result contributes a cell at all.
pub fn include_status(group: Option<&TestGroupConfig>, result: &ActionResult) -> bool {
    let (ignore_built, ignore_pending, ignore_skip) = group.map_or((false, false, false), |g| {
        (g.ignore_built, g.ignore_pending, g.ignore_skip)
    });

    match result.status() {
        ResultStatus::StatusUnspecified => false,
        ResultStatus::Built => !ignore_built,
        ResultStatus::Building | ResultStatus::Testing => !ignore_pending,
        ResultStatus::Skipped => !ignore_skip,
        _ => true,
    }
}

/// Fixed translation from ResultStore status to dashboard status.
pub const fn map_status(status: ResultStatus) -> TestStatus {
    match status {
        ResultStatus::StatusUnspecified => TestStatus::NoResult,
        ResultStatus::Building | ResultStatus::Testing => TestStatus::Running,
        ResultStatus::Built => TestStatus::BuildPassed,
        ResultStatus::FailedToBuild => TestStatus::BuildFail,
        ResultStatus::Passed => TestStatus::Pass,
        ResultStatus::Failed => TestStatus::Fail,
        ResultStatus::TimedOut => TestStatus::TimedOut,
        ResultStatus::Cancelled => TestStatus::Cancel,
        ResultStatus::ToolFailed => TestStatus::ToolFail,
        ResultStatus::Incomplete | ResultStatus::Unknown => TestStatus::Unknown,
        ResultStatus::Flaky => TestStatus::Flaky,
        ResultStatus::Skipped => TestStatus::PassWithSkips,
    }
}

/// Canonical status of a result; custom rules override the fixed table.
pub fn resolve_status(group: Option<&TestGroupConfig>, result: &ActionResult) -> TestStatus {
    let view = ResultView::new(result);
    group
        .and_then(|g| rule_evaluator::evaluate(&g.custom_evaluator_rules, &view))
        .unwrap_or(view.status)
}

/// Status of one expanded test method.
pub fn test_case_status(test: &Test) -> TestStatus {
    match test {
        Test::TestCase(case) => case_status(case),
        Test::TestSuite(suite) => suite_status(suite),
    }
}

fn case_status(case: &TestCase) -> TestStatus {
    if !case.failures.is_empty() || !case.errors.is_empty() {
        return TestStatus::Fail;
    }
    match case.result {
        TestCaseResult::Skipped if case.case_name.starts_with(DISABLED_PREFIX) => {
            TestStatus::PassWithSkips
        }
        TestCaseResult::Skipped | TestCaseResult::Filtered | TestCaseResult::Suppressed => {
            TestStatus::NoResult
        }
        TestCaseResult::Cancelled | TestCaseResult::Interrupted => TestStatus::Cancel,
        TestCaseResult::Completed | TestCaseResult::ResultUnspecified => TestStatus::Pass,
    }
}

// An empty suite stands in for "ran, no cases".
fn suite_status(suite: &TestSuite) -> TestStatus {
    if suite.failures.is_empty() && suite.errors.is_empty() {
        TestStatus::Pass
    } else {
        TestStatus::Fail
    }
}

/// Adapter exposing an action result to the rule evaluator.
struct ResultView<'a> {
    result: &'a ActionResult,
    status: TestStatus,
}

impl<'a> ResultView<'a> {
    fn new(result: &'a ActionResult) -> Self {
        Self {
            result,
            status: map_status(result.status()),
        }
    }
}

impl EvaluationSubject for ResultView<'_> {
    fn target_status(&self) -> TestStatus {
        self.status
    }

    fn property_values(&self, key: &str) -> Vec<&str> {
        let result = self.result;
        let configured = result
            .configured_target
            .iter()
            .flat_map(|c| c.properties.iter());
        let action = result.action.iter().flat_map(|a| a.properties.iter());
        let suite = result.test_suite().into_iter().flat_map(|s| s.properties.iter());

        result
            .target
            .properties
            .iter()
            .chain(configured)
            .chain(action)
            .chain(suite)
            .filter(|p| p.key == key)
            .map(|p| p.value.as_str())
            .collect()
    }

    fn test_name(&self) -> &str {
        &self.result.target.name
    }

    fn failure_messages(&self) -> Vec<&str> {
        let mut messages = Vec::new();
        let Some(root) = self.result.test_suite() else {
            return messages;
        };

        let mut stack = vec![root];
        while let Some(suite) = stack.pop() {
            collect_messages(&suite.failures, &suite.errors, &mut messages);
            for test in &suite.tests {
                match test {
                    Test::TestCase(case) => {
                        collect_messages(&case.failures, &case.errors, &mut messages);
                    }
                    Test::TestSuite(nested) => stack.push(nested),
                }
            }
        }
        messages
    }
}

fn collect_messages<'a>(
    failures: &'a [TestFailure],
    errors: &'a [TestError],
    out: &mut Vec<&'a str>,
) {
    out.extend(failures.iter().map(|f| f.failure_message.as_str()));
    out.extend(errors.iter().map(|e| e.error_message.as_str()));
}
