//! Notification message templating.
//!
//! Templates use double-brace placeholders (`{{entity_code}}`). A missing
//! variable renders as the empty string; rendering never fails.

use serde_json::Value;
use std::collections::HashMap;

/// A rendered subject/body pair ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    /// Email subject or in-app title.
    pub subject: String,
    /// Message body.
    pub body: String,
}

/// Renders one template string, substituting `{{name}}` placeholders.
///
/// Unknown placeholders render empty; unmatched braces pass through as
/// literal text.
#[must_use]
pub fn render(template: &str, variables: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let name = after[..end].trim();
                if let Some(value) = variables.get(name) {
                    out.push_str(value);
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Renders a subject and body, falling back to defaults when the stored
/// template is absent.
#[must_use]
pub fn render_or_default(
    subject_template: Option<&str>,
    body_template: Option<&str>,
    default_subject: &str,
    default_body: &str,
    variables: &HashMap<String, String>,
) -> RenderedMessage {
    RenderedMessage {
        subject: render(subject_template.unwrap_or(default_subject), variables),
        body: render(body_template.unwrap_or(default_body), variables),
    }
}

/// Flattens an event context into template variables.
///
/// Top-level scalars and the scalar fields of entity slots are exposed;
/// slot fields are prefixed (`problem.title` becomes `problem_title`), and
/// `code`/`title`/`name` of the primary entity are also exposed unprefixed
/// as `entity_code` and `entity_title`.
#[must_use]
pub fn context_variables(context: &Value) -> HashMap<String, String> {
    let mut vars = HashMap::new();
    let Some(map) = context.as_object() else {
        return vars;
    };

    for (key, value) in map {
        match value {
            Value::Object(slot) => {
                for (field, field_value) in slot {
                    if let Some(s) = scalar_string(field_value) {
                        vars.insert(format!("{key}_{field}"), s);
                    }
                }
            }
            other => {
                if let Some(s) = scalar_string(other) {
                    vars.insert(key.clone(), s);
                }
            }
        }
    }

    for slot in ["problem", "case", "project", "milestone"] {
        let Some(entity) = map.get(slot).and_then(Value::as_object) else {
            continue;
        };
        if let Some(code) = entity.get("code").and_then(Value::as_str) {
            vars.entry("entity_code".to_string())
                .or_insert_with(|| code.to_string());
        }
        let title = entity
            .get("title")
            .or_else(|| entity.get("name"))
            .and_then(Value::as_str);
        if let Some(title) = title {
            vars.entry("entity_title".to_string())
                .or_insert_with(|| title.to_string());
        }
    }

    vars
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_render_substitutes_placeholders() {
        let rendered = render(
            "Problem {{entity_code}} assigned to {{assignee}}",
            &vars(&[("entity_code", "P0042"), ("assignee", "Dana")]),
        );
        assert_eq!(rendered, "Problem P0042 assigned to Dana");
    }

    #[test]
    fn test_missing_variable_renders_empty() {
        let rendered = render("Hello {{nobody}}!", &vars(&[]));
        assert_eq!(rendered, "Hello !");
    }

    #[test]
    fn test_unmatched_braces_pass_through() {
        let rendered = render("literal {{open and {single}", &vars(&[]));
        assert_eq!(rendered, "literal {{open and {single}");
    }

    #[test]
    fn test_placeholder_names_are_trimmed() {
        let rendered = render("{{ entity_code }}", &vars(&[("entity_code", "BC0007")]));
        assert_eq!(rendered, "BC0007");
    }

    #[test]
    fn test_render_or_default_uses_fallbacks() {
        let msg = render_or_default(
            None,
            Some("Status is now {{status}}"),
            "Update on {{entity_code}}",
            "unused",
            &vars(&[("entity_code", "PRJ0003"), ("status", "On Hold")]),
        );
        assert_eq!(msg.subject, "Update on PRJ0003");
        assert_eq!(msg.body, "Status is now On Hold");
    }

    #[test]
    fn test_context_variables_flatten_slots() {
        let context = json!({
            "user_id": 7,
            "problem": {"code": "P0042", "title": "Checkout latency", "priority": "High"}
        });
        let vars = context_variables(&context);
        assert_eq!(vars.get("user_id").map(String::as_str), Some("7"));
        assert_eq!(vars.get("problem_priority").map(String::as_str), Some("High"));
        assert_eq!(vars.get("entity_code").map(String::as_str), Some("P0042"));
        assert_eq!(
            vars.get("entity_title").map(String::as_str),
            Some("Checkout latency")
        );
    }
}
