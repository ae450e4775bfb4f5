//! Common test utilities for integration tests
//!
//! Provides shared fixtures for invocation bundles and test groups used
//! across multiple integration test files.
#![allow(dead_code)]

use chrono::DateTime;
use resultstore_updater::domain::models::invocation::{
    ActionId, InvocationId, StatusAttributes, TargetId, TestAction, TestFailure,
};
use resultstore_updater::domain::models::{
    Action, Invocation, InvocationBundle, Property, ResultStatus, Target, Test, TestCase,
    TestCaseResult, TestGroupConfig, TestSuite,
};

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Test group with the given name and everything else defaulted
pub fn group(name: &str) -> TestGroupConfig {
    TestGroupConfig {
        name: name.to_string(),
        days_of_results: 1,
        ..TestGroupConfig::default()
    }
}

/// Invocation started `start_secs` after the epoch, with no targets
pub fn invocation(id: &str, start_secs: i64) -> InvocationBundle {
    let mut invocation = Invocation {
        name: format!("invocations/{id}"),
        id: InvocationId {
            invocation_id: id.to_string(),
        },
        ..Invocation::default()
    };
    invocation.timing.start_time = DateTime::from_timestamp(start_secs, 0);
    InvocationBundle {
        invocation,
        ..InvocationBundle::default()
    }
}

/// Add an invocation property
pub fn with_property(mut bundle: InvocationBundle, key: &str, value: &str) -> InvocationBundle {
    bundle.invocation.properties.push(Property::new(key, value));
    bundle
}

/// Add a target with the given overall status
pub fn with_target(mut bundle: InvocationBundle, target: &str, status: ResultStatus) -> InvocationBundle {
    let invocation_id = bundle.invocation.invocation_id().to_string();
    bundle.targets.push(Target {
        name: format!("{}/targets/{target}", bundle.invocation.name),
        id: TargetId {
            invocation_id,
            target_id: target.to_string(),
        },
        status_attributes: StatusAttributes {
            status,
            ..StatusAttributes::default()
        },
        ..Target::default()
    });
    bundle
}

/// Add a test action for `target` whose suite holds the given cases
pub fn with_test_action(
    mut bundle: InvocationBundle,
    target: &str,
    status: ResultStatus,
    cases: Vec<TestCase>,
) -> InvocationBundle {
    let invocation_id = bundle.invocation.invocation_id().to_string();
    bundle.actions.push(Action {
        id: ActionId {
            invocation_id,
            target_id: target.to_string(),
            configuration_id: "default".to_string(),
            action_id: "test".to_string(),
        },
        status_attributes: StatusAttributes {
            status,
            ..StatusAttributes::default()
        },
        test_action: Some(TestAction {
            test_suite: Some(TestSuite {
                suite_name: target.to_string(),
                tests: cases.into_iter().map(Test::TestCase).collect(),
                ..TestSuite::default()
            }),
        }),
        ..Action::default()
    });
    bundle
}

/// Completed test case, failing when `failure` is set
pub fn case(name: &str, failure: Option<&str>) -> TestCase {
    TestCase {
        case_name: name.to_string(),
        result: TestCaseResult::Completed,
        failures: failure
            .map(|message| {
                vec![TestFailure {
                    failure_message: message.to_string(),
                }]
            })
            .unwrap_or_default(),
        ..TestCase::default()
    }
}
