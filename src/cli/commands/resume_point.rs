use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Column, Config, TestGroupConfig};
use crate::infrastructure::state::ColumnFile;
use crate::services::{query_after, update_stop};

/// Where the next sync of a group would start
#[derive(Debug, Clone, Serialize)]
pub struct ResumePointOutput {
    /// Test group name
    pub group: String,
    /// Earliest invocation start the next cycle searches from
    pub resume_point: DateTime<Utc>,
    /// Columns already in the group's state file
    pub prior_columns: usize,
    /// Search filter the next cycle would send
    pub query: String,
}

impl CommandOutput for ResumePointOutput {
    fn to_human(&self) -> String {
        format!(
            "Test group {} resumes from {} ({} prior column(s))\nQuery: {}",
            self.group,
            self.resume_point.to_rfc3339(),
            self.prior_columns,
            self.query
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Handle the resume-point command
pub fn execute(config: &Config, group: &str, state: Option<PathBuf>, json: bool) -> Result<()> {
    let group = super::find_group(config, group)?;
    let old_columns = match &state {
        Some(path) => ColumnFile::load(path)?,
        None => Vec::new(),
    };
    let result = compute(config, group, &old_columns, Utc::now());
    output(&result, json);
    Ok(())
}

/// Resume point of `group` given its prior columns, as of `now`.
pub fn compute(
    config: &Config,
    group: &TestGroupConfig,
    old_columns: &[Column],
    now: DateTime<Utc>,
) -> ResumePointOutput {
    let options = super::reader_options(config);
    let resume_point = update_stop(Some(group), now, old_columns, None, options.reprocess);
    ResumePointOutput {
        group: group.name.clone(),
        resume_point,
        prior_columns: old_columns.len(),
        query: query_after(&options.query, resume_point),
    }
}
