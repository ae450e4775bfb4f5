//! Resume point computation and search query construction.
//!
//! Each cycle searches from a lower bound derived from the group's
//! retention window, an optional forced reprocess window, and the newest
//! start time recorded by the previous cycle's columns.

use chrono::{DateTime, Duration, SecondsFormat, TimeZone, Utc};
use tracing::warn;

use crate::domain::models::{column::truncate_to_second, parse_hint, Column, TestGroupConfig};

/// Base query selecting invocations uploaded by the CI system.
pub const QUERY_PROW: &str = r#"invocation_attributes.labels:"prow""#;

/// Append a start-time lower bound to `base`. An empty base stays empty.
pub fn query_after(base: &str, when: DateTime<Utc>) -> String {
    if base.is_empty() {
        return String::new();
    }
    format!(
        r#"{base} timing.start_time>="{}""#,
        when.to_rfc3339_opts(SecondsFormat::Secs, true)
    )
}

/// The zero time, `0001-01-01T00:00:00Z`.
pub fn zero_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(1, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Latest of `times`, if any.
pub fn most_recent<I>(times: I) -> Option<DateTime<Utc>>
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    times.into_iter().max()
}

/// Newest start time recorded by prior columns, from either the column
/// start or its hint. Hints that fail to parse are skipped.
pub fn stop_from_columns(columns: &[Column]) -> Option<DateTime<Utc>> {
    let times = columns.iter().flat_map(|column| {
        let hint = if column.hint.is_empty() {
            None
        } else {
            match parse_hint(&column.hint) {
                Ok(t) => Some(truncate_to_second(t)),
                Err(err) => {
                    warn!(column = %column.name, hint = %column.hint, error = %err, "Ignoring unparsable column hint");
                    None
                }
            }
        };
        column.started_at().into_iter().chain(hint)
    });
    most_recent(times)
}

/// Lower bound for the next search.
///
/// Starts at twice the retention window (at least one day) before `now`,
/// reaching further back when `reprocess` asks for it. Newer prior columns
/// then move the bound forward; without them a later `default_stop` does.
pub fn update_stop(
    group: Option<&TestGroupConfig>,
    now: DateTime<Utc>,
    old_columns: &[Column],
    default_stop: Option<DateTime<Utc>>,
    reprocess: Duration,
) -> DateTime<Utc> {
    let days = group.map_or(0, |g| g.days_of_results).max(1);
    let retention = Duration::days(2 * i64::from(days));

    let mut stop = now.checked_sub_signed(retention).unwrap_or(now);
    if let Some(reprocess_stop) = now.checked_sub_signed(reprocess) {
        if reprocess_stop < stop {
            stop = reprocess_stop;
        }
    }

    match (stop_from_columns(old_columns), default_stop) {
        (Some(hint), _) if hint > stop => stop = hint,
        (_, Some(default)) if default > stop => stop = default,
        _ => {}
    }

    truncate_to_second(stop)
}
