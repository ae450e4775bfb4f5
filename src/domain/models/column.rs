//! Dashboard columns and cells.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Canonical per-cell status rendered by the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    #[default]
    NoResult,
    Pass,
    PassWithErrors,
    PassWithSkips,
    Running,
    CategorizedAbort,
    Unknown,
    Cancel,
    Blocked,
    TimedOut,
    CategorizedFail,
    BuildFail,
    Fail,
    Flaky,
    ToolFail,
    BuildPassed,
}

/// One target or test method's result within a column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Target identifier the cell belongs to.
    pub id: String,
    /// Invocation the result came from.
    pub cell_id: String,
    pub result: TestStatus,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub icon: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

impl Cell {
    /// Cell with a status and no annotation.
    pub fn new(id: impl Into<String>, cell_id: impl Into<String>, result: TestStatus) -> Self {
        Self {
            id: id.into(),
            cell_id: cell_id.into(),
            result,
            ..Self::default()
        }
    }
}

/// One time-series entry of the dashboard, built from one invocation group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub build: String,
    /// Earliest invocation start in milliseconds since the epoch.
    pub started: f64,
    /// Latest invocation start, see [`format_hint`].
    #[serde(default)]
    pub hint: String,
    /// Compiled header values, one per configured header rule.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<String>,
    #[serde(default)]
    pub cells: BTreeMap<String, Cell>,
}

impl Column {
    /// Start time as a timestamp, truncated to whole seconds.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        #[allow(clippy::cast_possible_truncation)]
        let secs = (self.started / 1000.0).trunc() as i64;
        DateTime::from_timestamp(secs, 0)
    }
}

/// Milliseconds since the epoch, keeping the sub-millisecond fraction.
pub fn timestamp_millis(time: Option<DateTime<Utc>>) -> f64 {
    time.map_or(0.0, |t| {
        #[allow(clippy::cast_precision_loss)]
        let secs = t.timestamp() as f64;
        secs * 1000.0 + f64::from(t.timestamp_subsec_nanos()) / 1_000_000.0
    })
}

/// Serialize a resumption hint: RFC 3339 in UTC at whole-second precision.
pub fn format_hint(time: DateTime<Utc>) -> String {
    truncate_to_second(time).to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a hint written by [`format_hint`] (any RFC 3339 offset accepted).
pub fn parse_hint(hint: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(hint).map(|t| t.with_timezone(&Utc))
}

/// Drop the sub-second part of a timestamp.
pub fn truncate_to_second(time: DateTime<Utc>) -> DateTime<Utc> {
    time.with_nanosecond(0).unwrap_or(time)
}
