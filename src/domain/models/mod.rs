pub mod column;
pub mod config;
pub mod invocation;
pub mod test_group;

pub use column::{format_hint, parse_hint, timestamp_millis, Cell, Column, TestStatus};
pub use config::{Config, LoggingConfig, ResultStoreConfig, SyncConfig};
pub use invocation::{
    Action, ActionResult, AssembledInvocation, ConfiguredTarget, Invocation, InvocationBundle,
    InvocationGroup, Property, ResultStatus, Target, Test, TestCase, TestCaseResult, TestSuite,
};
pub use test_group::{
    AnnotationRule, ColumnHeaderRule, Comparison, ComparisonOp, ComparisonValue, EvaluatorRule,
    FallbackGrouping, KeyValue, PrimaryGrouping, ResultField, TestGroupConfig,
};
