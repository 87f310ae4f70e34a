use crate::registry::NameRegistry;
use crate::report::{emit, CheckKind, CheckResult};
use crate::rules::fields::{enforce_key_types, DEPENDENCY_KEY_TYPES};
use crate::rules::formats::FormatRules;
use crate::validators::entity_name;
use serde_json::Value;

const REQUIRED_KEYS: &[&str] = &["author", "releases", "issues", "description", "load_order"];

/// Validates one dependency object and registers its name. Dependencies have
/// a stricter contract than packages: every descriptive key is mandatory.
pub fn check_dependency(
    include: &str,
    data: &Value,
    rules: &FormatRules,
    registry: &mut NameRegistry,
) -> (Option<String>, Vec<CheckResult>) {
    let Some(object) = data.as_object() else {
        let check_id = format!("dependency ({include})");
        let violations = vec![(
            CheckKind::Structure,
            "A dependency must be a JSON object".to_string(),
        )];
        return (None, emit(&check_id, CheckKind::Structure, violations));
    };

    let Some(name) = entity_name(data) else {
        let check_id = format!("dependency ({include})");
        let violations = vec![(
            CheckKind::Structure,
            "A dependency must define a \"name\"".to_string(),
        )];
        return (None, emit(&check_id, CheckKind::Structure, violations));
    };

    let check_id = format!("dependency {name} ({include})");
    let mut violations = Vec::new();

    if let Some(previous_include) = registry.dependency_names.get(&name) {
        violations.push((
            CheckKind::Uniqueness,
            format!(
                "Dependency names must be unique: {name}, \
                 previously occurred in {previous_include}"
            ),
        ));
    } else if let Some(previous_include) = registry.package_names.get(&name) {
        violations.push((
            CheckKind::Uniqueness,
            format!(
                "Dependency and package names must be unique: {name}, \
                 previously occurred in {previous_include}"
            ),
        ));
    } else {
        registry.dependency_names.insert(&name, include.to_string());
    }

    for (key, value) in object {
        let field_violations = enforce_key_types(key, value, DEPENDENCY_KEY_TYPES);
        if !field_violations.is_empty() {
            violations.extend(field_violations);
            continue;
        }

        match key.as_str() {
            "issues" => {
                if let Some(url) = value.as_str() {
                    if !rules.http_url.is_match(url) {
                        violations.push((
                            CheckKind::Format,
                            "\"issues\" must start with \"http://\" or \"https://\"".to_string(),
                        ));
                    }
                }
            }
            "name" => {
                if let Some(name) = value.as_str() {
                    if rules.invalid_name_chars.is_match(name) {
                        violations.push((
                            CheckKind::Format,
                            "Dependency names must be valid folder names on all operating systems"
                                .to_string(),
                        ));
                    }
                    if name.starts_with('.') {
                        violations.push((
                            CheckKind::Format,
                            "Dependency names may not start with a dot".to_string(),
                        ));
                    }
                }
            }
            "load_order" => {
                if let Some(load_order) = value.as_str() {
                    if !rules.load_order.is_match(load_order) {
                        violations.push((
                            CheckKind::Format,
                            "\"load_order\" must be a two digit string".to_string(),
                        ));
                    }
                }
            }
            _ => {}
        }
    }

    for key in REQUIRED_KEYS {
        if !object.contains_key(*key) {
            violations.push((
                CheckKind::Structure,
                format!("\"{key}\" is required for dependencies"),
            ));
        }
    }

    let checks = emit(&check_id, CheckKind::Structure, violations);
    (Some(name), checks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn failures(checks: &[CheckResult]) -> Vec<&CheckResult> {
        checks.iter().filter(|c| !c.is_pass()).collect()
    }

    fn valid_dependency() -> Value {
        json!({
            "name": "bz2",
            "description": "Python bz2 module",
            "issues": "https://github.com/owner/bz2/issues",
            "load_order": "02",
            "author": "jane",
            "releases": [{
                "base": "https://github.com/owner/bz2",
                "tags": true,
                "sublime_text": "*",
                "platforms": ["*"]
            }]
        })
    }

    #[test]
    fn test_valid_dependency_passes_and_registers() {
        let rules = FormatRules::new();
        let mut registry = NameRegistry::new();
        let (name, checks) =
            check_dependency("repository/dependencies.json", &valid_dependency(), &rules, &mut registry);
        assert_eq!(name.as_deref(), Some("bz2"));
        assert_eq!(checks.len(), 1);
        assert!(checks[0].is_pass());
        assert!(registry.dependency_names.contains("BZ2"));
    }

    #[test]
    fn test_duplicate_dependency_name_cites_first_occurrence() {
        let rules = FormatRules::new();
        let mut registry = NameRegistry::new();
        check_dependency("repository/dependencies.json", &valid_dependency(), &rules, &mut registry);
        let (_, checks) = check_dependency("other/dependencies.json", &valid_dependency(), &rules, &mut registry);
        let failures = failures(&checks);
        assert_eq!(failures[0].kind, CheckKind::Uniqueness);
        assert!(failures[0]
            .message
            .contains("Dependency names must be unique: bz2, previously occurred in repository/dependencies.json"));
    }

    #[test]
    fn test_dependency_name_collides_with_package() {
        let rules = FormatRules::new();
        let mut registry = NameRegistry::new();
        registry.package_names.insert("bz2", "repository/b.json".to_string());
        let (_, checks) = check_dependency("d.json", &valid_dependency(), &rules, &mut registry);
        let failures = failures(&checks);
        assert_eq!(failures[0].kind, CheckKind::Uniqueness);
        assert!(failures[0].message.contains("repository/b.json"));
    }

    #[test]
    fn test_all_descriptive_keys_required() {
        let rules = FormatRules::new();
        let mut registry = NameRegistry::new();
        let (_, checks) =
            check_dependency("d.json", &json!({"name": "bz2"}), &rules, &mut registry);
        let messages: Vec<&str> = failures(&checks).iter().map(|c| c.message.as_str()).collect();
        for key in REQUIRED_KEYS {
            assert!(
                messages
                    .iter()
                    .any(|m| m.contains(&format!("\"{key}\" is required"))),
                "expected missing-key failure for {key}"
            );
        }
    }

    #[test]
    fn test_load_order_two_digits() {
        let rules = FormatRules::new();
        let mut registry = NameRegistry::new();
        let mut dependency = valid_dependency();
        dependency["load_order"] = json!("2");
        let (_, checks) = check_dependency("d.json", &dependency, &rules, &mut registry);
        assert!(failures(&checks)[0].message.contains("two digit string"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let rules = FormatRules::new();
        let mut registry = NameRegistry::new();
        let mut dependency = valid_dependency();
        dependency["labels"] = json!(["python"]);
        let (_, checks) = check_dependency("d.json", &dependency, &rules, &mut registry);
        assert!(failures(&checks)[0].message.contains("Unknown key \"labels\""));
    }
}
