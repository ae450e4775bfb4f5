//! Pure sync logic: status policy, test case selection, grouping,
//! column materialization and resume points.

pub mod cell_annotations;
pub mod column_headers;
pub mod column_materializer;
pub mod grouper;
pub mod invocation_assembler;
pub mod resume_point;
pub mod rule_evaluator;
pub mod status_policy;
pub mod test_case_selector;

pub use column_materializer::materialize;
pub use grouper::{extract_group_id, group_invocations, identify_build};
pub use invocation_assembler::assemble;
pub use resume_point::{query_after, update_stop, QUERY_PROW};
pub use rule_evaluator::EvaluationSubject;
