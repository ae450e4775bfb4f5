//! Cell message and icon selection.

use std::collections::HashMap;

use crate::domain::models::AnnotationRule;

/// Pick a `(message, icon)` pair for a cell.
///
/// Rules are tried in order and the first hit wins. Within one rule a
/// property named after the rule beats a tag of the same name.
pub fn cell_message_icon(
    rules: &[AnnotationRule],
    properties: &HashMap<String, Vec<String>>,
    tags: &[String],
) -> (String, String) {
    for rule in rules {
        if let Some(first) = properties
            .get(&rule.property_name)
            .and_then(|values| values.first())
        {
            return (first.clone(), rule.short_text.clone());
        }
        if let Some(tag) = tags.iter().find(|tag| **tag == rule.property_name) {
            return (tag.clone(), rule.short_text.clone());
        }
    }
    (String::new(), String::new())
}
