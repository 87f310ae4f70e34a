use crate::registry::{NameRegistry, PreviousName};
use crate::report::{emit, CheckKind, CheckResult};
use crate::rules::fields::{enforce_key_types, PACKAGE_KEY_TYPES};
use crate::rules::formats::FormatRules;
use crate::validators::entity_name;
use serde_json::Value;
use std::collections::BTreeSet;

/// Packages shipped with the editor itself. A community package must not
/// shadow any of these.
const DEFAULT_PACKAGES: &[&str] = &[
    "ActionScript",
    "AppleScript",
    "ASP",
    "Batch File",
    "Binary",
    "C#",
    "C++",
    "Clojure",
    "Color Scheme - Default",
    "CSS",
    "D",
    "Default",
    "Diff",
    "Erlang",
    "Git Formats",
    "Go",
    "Graphviz",
    "Groovy",
    "Haskell",
    "HTML",
    "Java",
    "JavaScript",
    "Language - English",
    "LaTeX",
    "Lisp",
    "Lua",
    "Makefile",
    "Markdown",
    "Matlab",
    "Objective-C",
    "OCaml",
    "Pascal",
    "Perl",
    "PHP",
    "Python",
    "R",
    "Rails",
    "Regular Expressions",
    "RestructuredText",
    "Ruby",
    "Rust",
    "Scala",
    "ShellScript",
    "SQL",
    "TCL",
    "Text",
    "Textile",
    "Theme - Default",
    "Vintage",
    "XML",
    "YAML",
];

const URL_KEYS: &[&str] = &["homepage", "readme", "issues", "donate", "buy"];

/// Validates one package object and registers its name and previous names.
/// Returns the derived name (when one could be derived) along with the
/// check results for this package.
pub fn check_package(
    include: &str,
    data: &Value,
    rules: &FormatRules,
    registry: &mut NameRegistry,
) -> (Option<String>, Vec<CheckResult>) {
    let Some(object) = data.as_object() else {
        let check_id = format!("package ({include})");
        let violations = vec![(
            CheckKind::Structure,
            "A package must be a JSON object".to_string(),
        )];
        return (None, emit(&check_id, CheckKind::Structure, violations));
    };

    let Some(name) = entity_name(data) else {
        let check_id = format!("package ({include})");
        let violations = vec![(
            CheckKind::Structure,
            "A package must define either \"name\" or \"details\"".to_string(),
        )];
        return (None, emit(&check_id, CheckKind::Structure, violations));
    };

    let check_id = format!("package {name} ({include})");
    let mut violations = Vec::new();

    register_name(&name, include, registry, &mut violations);

    for (key, value) in object {
        let field_violations = enforce_key_types(key, value, PACKAGE_KEY_TYPES);
        if !field_violations.is_empty() {
            violations.extend(field_violations);
            continue;
        }

        match key.as_str() {
            "details" => {
                if let Some(url) = value.as_str() {
                    if !rules.details_url_ok(url) {
                        violations.push((
                            CheckKind::Format,
                            "The details url is badly formatted or invalid".to_string(),
                        ));
                    }
                }
            }
            "labels" => check_labels(value, &mut violations),
            "previous_names" => {
                register_previous_names(value, include, &name, registry, &mut violations);
            }
            key if URL_KEYS.contains(&key) => {
                // "donate": null is allowed to remove the default donate url
                // derived from "details".
                if let Some(url) = value.as_str() {
                    if !rules.http_url.is_match(url) {
                        violations.push((
                            CheckKind::Format,
                            format!("\"{key}\" must start with \"http://\" or \"https://\""),
                        ));
                    }
                }
            }
            _ => {}
        }
    }

    // Names become folder names on every supported platform.
    if rules.invalid_name_chars.is_match(&name) {
        violations.push((
            CheckKind::Format,
            "Package names must be valid folder names on all operating systems".to_string(),
        ));
    }
    if name.starts_with('.') {
        violations.push((
            CheckKind::Format,
            "Package names may not start with a dot".to_string(),
        ));
    }
    if DEFAULT_PACKAGES.contains(&name.as_str()) {
        violations.push((
            CheckKind::Uniqueness,
            format!("Package name conflicts with a default package: {name}"),
        ));
    }

    if !object.contains_key("details") {
        for key in ["name", "homepage", "author", "releases"] {
            if !object.contains_key(key) {
                violations.push((
                    CheckKind::Structure,
                    format!("\"{key}\" is required if no \"details\" URL provided"),
                ));
            }
        }
    }

    let checks = emit(&check_id, CheckKind::Structure, violations);
    (Some(name), checks)
}

fn register_name(
    name: &str,
    include: &str,
    registry: &mut NameRegistry,
    violations: &mut Vec<(CheckKind, String)>,
) {
    // A case-insensitive previous-name hit is only a hard failure when the
    // casing matches the recorded previous name exactly.
    let previous_clash = registry
        .previous_package_names
        .get(name)
        .filter(|previous| previous.exact == name)
        .cloned();

    if let Some(previous_include) = registry.package_names.get(name) {
        violations.push((
            CheckKind::Uniqueness,
            format!("Package names must be unique: {name}, previously occurred in {previous_include}"),
        ));
    } else if let Some(previous) = previous_clash {
        violations.push((
            CheckKind::Uniqueness,
            format!(
                "Package names can not occur as a name and as a previous_name: {name}, \
                 previously occurred as previous_name in {}: {}",
                previous.include, previous.owner
            ),
        ));
    } else if let Some(previous_include) = registry.dependency_names.get(name) {
        violations.push((
            CheckKind::Uniqueness,
            format!(
                "Dependency and package names must be unique: {name}, \
                 previously occurred in {previous_include}"
            ),
        ));
    } else {
        registry.package_names.insert(name, include.to_string());
    }
}

fn register_previous_names(
    value: &Value,
    include: &str,
    owner: &str,
    registry: &mut NameRegistry,
    violations: &mut Vec<(CheckKind, String)>,
) {
    let Some(entries) = value.as_array() else {
        return;
    };
    for entry in entries {
        let Some(previous_name) = entry.as_str() else {
            violations.push((
                CheckKind::Structure,
                "elements of \"previous_names\" must be of type string".to_string(),
            ));
            continue;
        };
        if let Some(existing) = registry.previous_package_names.get(previous_name) {
            violations.push((
                CheckKind::Uniqueness,
                format!(
                    "Previous package names must be unique: {previous_name}, \
                     previously occurred in {}: {}",
                    existing.include, existing.owner
                ),
            ));
        } else if let Some(existing_include) = registry.package_names.get(previous_name) {
            violations.push((
                CheckKind::Uniqueness,
                format!(
                    "Package names can not occur as a name and as a previous_name: \
                     {previous_name}, previously occurred as name in {existing_include}"
                ),
            ));
        } else {
            registry.previous_package_names.insert(
                previous_name,
                PreviousName {
                    exact: previous_name.to_string(),
                    include: include.to_string(),
                    owner: owner.to_string(),
                },
            );
        }
    }
}

fn check_labels(value: &Value, violations: &mut Vec<(CheckKind, String)>) {
    let Some(labels) = value.as_array() else {
        return;
    };
    let mut seen = BTreeSet::new();
    for label in labels {
        let Some(label) = label.as_str() else {
            violations.push((
                CheckKind::Structure,
                "elements of \"labels\" must be of type string".to_string(),
            ));
            continue;
        };
        if label.contains(',') {
            violations.push((
                CheckKind::Format,
                "Multiple labels should not be in the same string".to_string(),
            ));
        }
        if !seen.insert(label) {
            violations.push((
                CheckKind::Format,
                "Specifying the same label multiple times is redundant".to_string(),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn failures(checks: &[CheckResult]) -> Vec<&CheckResult> {
        checks.iter().filter(|c| !c.is_pass()).collect()
    }

    fn valid_package() -> Value {
        json!({
            "name": "Alignment",
            "details": "https://github.com/owner/alignment",
            "releases": [{"tags": true, "sublime_text": "*"}]
        })
    }

    #[test]
    fn test_valid_package_passes_and_registers() {
        let rules = FormatRules::new();
        let mut registry = NameRegistry::new();
        let (name, checks) = check_package("repository/a.json", &valid_package(), &rules, &mut registry);

        assert_eq!(name.as_deref(), Some("Alignment"));
        assert_eq!(checks.len(), 1);
        assert!(checks[0].is_pass());
        assert_eq!(
            registry.package_names.get("alignment").map(String::as_str),
            Some("repository/a.json")
        );
    }

    #[test]
    fn test_duplicate_name_cites_both_provenances() {
        let rules = FormatRules::new();
        let mut registry = NameRegistry::new();
        check_package("repository/a.json", &valid_package(), &rules, &mut registry);
        let (_, checks) = check_package("other/a.json", &valid_package(), &rules, &mut registry);

        let failures = failures(&checks);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].kind, CheckKind::Uniqueness);
        assert!(failures[0].message.contains("repository/a.json"));
        assert!(failures[0].check_id.contains("other/a.json"));
    }

    #[test]
    fn test_duplicate_is_case_insensitive() {
        let rules = FormatRules::new();
        let mut registry = NameRegistry::new();
        check_package("a.json", &valid_package(), &rules, &mut registry);
        let duplicate = json!({
            "name": "ALIGNMENT",
            "details": "https://github.com/other/alignment"
        });
        let (_, checks) = check_package("a.json", &duplicate, &rules, &mut registry);
        assert_eq!(failures(&checks)[0].kind, CheckKind::Uniqueness);
    }

    #[test]
    fn test_name_collides_with_dependency() {
        let rules = FormatRules::new();
        let mut registry = NameRegistry::new();
        registry
            .dependency_names
            .insert("Alignment", "repository/dependencies.json".to_string());
        let (_, checks) = check_package("a.json", &valid_package(), &rules, &mut registry);
        let failures = failures(&checks);
        assert!(failures[0]
            .message
            .contains("Dependency and package names must be unique"));
    }

    #[test]
    fn test_previous_name_clash_requires_matching_case() {
        let rules = FormatRules::new();
        let mut registry = NameRegistry::new();
        registry.previous_package_names.insert(
            "Alignment",
            PreviousName {
                exact: "Alignment".to_string(),
                include: "repository/o.json".to_string(),
                owner: "Other".to_string(),
            },
        );
        let (_, checks) = check_package("a.json", &valid_package(), &rules, &mut registry);
        assert_eq!(failures(&checks)[0].kind, CheckKind::Uniqueness);

        // Different casing of the recorded previous name is tolerated.
        let mut registry = NameRegistry::new();
        registry.previous_package_names.insert(
            "alignment",
            PreviousName {
                exact: "alignment".to_string(),
                include: "repository/o.json".to_string(),
                owner: "Other".to_string(),
            },
        );
        let (_, checks) = check_package("a.json", &valid_package(), &rules, &mut registry);
        assert!(checks[0].is_pass());
    }

    #[test]
    fn test_previous_names_register_and_collide() {
        let rules = FormatRules::new();
        let mut registry = NameRegistry::new();
        let package = json!({
            "name": "New Name",
            "details": "https://github.com/owner/new-name",
            "previous_names": ["Old Name"]
        });
        let (_, checks) = check_package("n.json", &package, &rules, &mut registry);
        assert!(checks[0].is_pass());
        assert!(registry.previous_package_names.contains("old name"));

        // A later package reusing the previous name of another package.
        let other = json!({
            "name": "Third",
            "details": "https://github.com/owner/third",
            "previous_names": ["Old Name"]
        });
        let (_, checks) = check_package("t.json", &other, &rules, &mut registry);
        let failures = failures(&checks);
        assert!(failures[0]
            .message
            .contains("Previous package names must be unique"));
        assert!(failures[0].message.contains("n.json"));
        assert!(failures[0].message.contains("New Name"));
    }

    #[test]
    fn test_previous_name_reusing_existing_package_name() {
        let rules = FormatRules::new();
        let mut registry = NameRegistry::new();
        check_package("a.json", &valid_package(), &rules, &mut registry);
        let package = json!({
            "name": "Other",
            "details": "https://github.com/owner/other",
            "previous_names": ["Alignment"]
        });
        let (_, checks) = check_package("o.json", &package, &rules, &mut registry);
        assert!(failures(&checks)[0]
            .message
            .contains("can not occur as a name and as a previous_name"));
    }

    #[test]
    fn test_invalid_folder_name_characters() {
        let rules = FormatRules::new();
        let mut registry = NameRegistry::new();
        let package = json!({
            "name": "Bad:Name",
            "homepage": "https://example.com",
            "author": "jane",
            "releases": []
        });
        let (_, checks) = check_package("b.json", &package, &rules, &mut registry);
        assert!(failures(&checks)
            .iter()
            .any(|c| c.message.contains("valid folder names")));

        let package = json!({
            "name": ".hidden",
            "homepage": "https://example.com",
            "author": "jane",
            "releases": []
        });
        let (_, checks) = check_package("h.json", &package, &rules, &mut registry);
        assert!(failures(&checks)
            .iter()
            .any(|c| c.message.contains("may not start with a dot")));
    }

    #[test]
    fn test_default_package_shadowing() {
        let rules = FormatRules::new();
        let mut registry = NameRegistry::new();
        let package = json!({
            "name": "Markdown",
            "homepage": "https://example.com",
            "author": "jane",
            "releases": []
        });
        let (_, checks) = check_package("m.json", &package, &rules, &mut registry);
        assert!(failures(&checks)
            .iter()
            .any(|c| c.message.contains("default package")));
    }

    #[test]
    fn test_required_keys_without_details() {
        let rules = FormatRules::new();
        let mut registry = NameRegistry::new();
        let package = json!({"name": "Widget"});
        let (_, checks) = check_package("w.json", &package, &rules, &mut registry);
        let messages: Vec<&str> = failures(&checks).iter().map(|c| c.message.as_str()).collect();
        for key in ["homepage", "author", "releases"] {
            assert!(
                messages.iter().any(|m| m.contains(&format!("\"{key}\""))),
                "expected missing-key failure for {key}"
            );
        }
    }

    #[test]
    fn test_bad_details_url() {
        let rules = FormatRules::new();
        let mut registry = NameRegistry::new();
        let package = json!({"details": "https://github.com/owner/widget.git"});
        let (name, checks) = check_package("w.json", &package, &rules, &mut registry);
        assert_eq!(name.as_deref(), Some("widget.git"));
        assert!(failures(&checks)
            .iter()
            .any(|c| c.message.contains("details url")));
    }

    #[test]
    fn test_labels_rules() {
        let rules = FormatRules::new();
        let mut registry = NameRegistry::new();
        let package = json!({
            "details": "https://github.com/owner/widget",
            "labels": ["color scheme", "color scheme", "a,b"]
        });
        let (_, checks) = check_package("w.json", &package, &rules, &mut registry);
        let messages: Vec<&str> = failures(&checks).iter().map(|c| c.message.as_str()).collect();
        assert!(messages.iter().any(|m| m.contains("same label multiple times")));
        assert!(messages
            .iter()
            .any(|m| m.contains("should not be in the same string")));
    }

    #[test]
    fn test_donate_null_allowed() {
        let rules = FormatRules::new();
        let mut registry = NameRegistry::new();
        let package = json!({
            "details": "https://github.com/owner/widget",
            "donate": null
        });
        let (_, checks) = check_package("w.json", &package, &rules, &mut registry);
        assert!(checks[0].is_pass());
    }

    #[test]
    fn test_url_keys_require_http() {
        let rules = FormatRules::new();
        let mut registry = NameRegistry::new();
        let package = json!({
            "details": "https://github.com/owner/widget",
            "homepage": "ftp://example.com"
        });
        let (_, checks) = check_package("w.json", &package, &rules, &mut registry);
        assert!(failures(&checks)
            .iter()
            .any(|c| c.kind == CheckKind::Format && c.message.contains("homepage")));
    }
}
