//! Joins the flat record lists of an export into per-target results.

use std::collections::{BTreeMap, HashMap};

use tracing::warn;

use crate::domain::models::{
    Action, ActionResult, AssembledInvocation, ConfiguredTarget, InvocationBundle,
};

/// Build an [`AssembledInvocation`] from one exported bundle.
///
/// Every target yields one result per action recorded against it, or a
/// single action-less result when it has none. A target without a
/// configured target is kept with that slot empty. If a target id appears
/// twice only the first record is used.
pub fn assemble(bundle: Option<&InvocationBundle>) -> Option<AssembledInvocation> {
    let bundle = bundle?;
    let invocation_id = bundle.invocation.invocation_id();

    let mut configured: HashMap<&str, &ConfiguredTarget> = HashMap::new();
    for ct in &bundle.configured_targets {
        configured.entry(ct.id.target_id.as_str()).or_insert(ct);
    }

    let mut actions: HashMap<&str, Vec<&Action>> = HashMap::new();
    for action in &bundle.actions {
        actions
            .entry(action.id.target_id.as_str())
            .or_default()
            .push(action);
    }

    let mut target_results: BTreeMap<String, Vec<ActionResult>> = BTreeMap::new();
    for target in &bundle.targets {
        let target_id = target.id.target_id.as_str();
        if target_results.contains_key(target_id) {
            warn!(invocation_id = %invocation_id, target_id = %target_id, "Duplicate target record ignored");
            continue;
        }

        let configured_target = configured.get(target_id).map(|ct| (*ct).clone());
        let results = match actions.get(target_id) {
            Some(target_actions) => target_actions
                .iter()
                .map(|action| ActionResult {
                    target: target.clone(),
                    configured_target: configured_target.clone(),
                    action: Some((*action).clone()),
                })
                .collect(),
            None => vec![ActionResult {
                target: target.clone(),
                configured_target,
                action: None,
            }],
        };
        target_results.insert(target_id.to_string(), results);
    }

    Some(AssembledInvocation {
        invocation: bundle.invocation.clone(),
        target_results,
    })
}
