//! Invocation grouping and build labels.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::domain::models::{AssembledInvocation, InvocationGroup, PrimaryGrouping, TestGroupConfig};

/// Key an invocation is grouped under.
///
/// With build grouping the build label is used when one resolves, the
/// invocation id otherwise. Every other configuration groups per invocation.
pub fn extract_group_id(
    group: Option<&TestGroupConfig>,
    invocation: Option<&AssembledInvocation>,
) -> String {
    let Some(invocation) = invocation else {
        return String::new();
    };

    match group.map(|g| g.primary_grouping) {
        Some(PrimaryGrouping::Build) => {
            let build = identify_build(group, invocation);
            if build.is_empty() {
                invocation.invocation_id().to_string()
            } else {
                build
            }
        }
        _ => invocation.invocation_id().to_string(),
    }
}

/// Partition invocations by group key.
///
/// Groups come out in the order their key is first seen; invocations keep
/// their input order within a group.
pub fn group_invocations(
    group: Option<&TestGroupConfig>,
    invocations: Vec<AssembledInvocation>,
) -> Vec<InvocationGroup> {
    let mut groups: Vec<InvocationGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for invocation in invocations {
        let group_id = extract_group_id(group, Some(&invocation));
        match index.get(&group_id) {
            Some(&pos) => groups[pos].invocations.push(invocation),
            None => {
                index.insert(group_id.clone(), groups.len());
                groups.push(InvocationGroup {
                    group_id,
                    invocations: vec![invocation],
                });
            }
        }
    }
    groups
}

/// Human build label for an invocation, or empty when none is configured.
///
/// The configured property wins over the strftime pattern. The pattern is
/// applied to the start time in UTC; a pattern chrono rejects yields empty.
pub fn identify_build(group: Option<&TestGroupConfig>, invocation: &AssembledInvocation) -> String {
    let Some(group) = group else {
        return String::new();
    };

    if !group.build_override_configuration_value.is_empty() {
        if let Some(property) = invocation
            .invocation
            .properties
            .iter()
            .find(|p| p.key == group.build_override_configuration_value)
        {
            return property.value.clone();
        }
    }

    if group.build_override_strftime.is_empty() {
        return String::new();
    }
    let Some(started) = invocation.start_time() else {
        return String::new();
    };

    let mut label = String::new();
    if write!(label, "{}", started.format(&group.build_override_strftime)).is_err() {
        return String::new();
    }
    label
}
