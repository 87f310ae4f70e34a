use crate::report::{emit, CheckKind, CheckResult};
use crate::rules::formats::FormatRules;
use serde_json::Value;

const REPOSITORY_KEYS: &[&str] = &[
    "$schema",
    "schema_version",
    "packages",
    "dependencies",
    "includes",
];

const CHANNEL_KEYS: &[&str] = &["$schema", "repositories", "schema_version"];

const SCHEMA_VERSION: &str = "3.0.0";

/// Top-level key set of a repository or include document.
pub fn check_repository_keys(path: &str, data: &Value) -> Vec<CheckResult> {
    let check_id = format!("repository_keys ({path})");
    let mut violations = Vec::new();

    let Some(object) = data.as_object() else {
        violations.push((
            CheckKind::Structure,
            "Document must be a JSON object".to_string(),
        ));
        return emit(&check_id, CheckKind::Structure, violations);
    };

    if object.len() < 2 || object.len() > REPOSITORY_KEYS.len() {
        violations.push((CheckKind::Structure, "Unexpected number of keys".to_string()));
    }

    for key in object.keys() {
        if !REPOSITORY_KEYS.contains(&key.as_str()) {
            violations.push((CheckKind::Structure, format!("Unexpected key \"{key}\"")));
        }
    }

    match object.get("schema_version") {
        None => violations.push((
            CheckKind::SchemaVersion,
            "No schema_version found".to_string(),
        )),
        Some(version) => {
            if version.as_str() != Some(SCHEMA_VERSION) {
                violations.push((
                    CheckKind::SchemaVersion,
                    format!("schema_version must be \"{SCHEMA_VERSION}\""),
                ));
            }
        }
    }

    let list_keys: Vec<&str> = ["packages", "dependencies", "includes"]
        .into_iter()
        .filter(|k| object.contains_key(*k))
        .collect();
    if list_keys.is_empty() {
        violations.push((CheckKind::Structure, "Must contain something".to_string()));
    }
    for key in &list_keys {
        if !object[*key].is_array() {
            violations.push((CheckKind::Structure, format!("\"{key}\" must be a list")));
        }
    }

    if let Some(includes) = object.get("includes").and_then(Value::as_array) {
        for include in includes {
            if !include.is_string() {
                violations.push((
                    CheckKind::Structure,
                    "\"includes\" entries must be strings".to_string(),
                ));
            }
        }
    }

    emit(&check_id, CheckKind::Structure, violations)
}

/// Top-level key set of the channel document.
pub fn check_channel_keys(path: &str, data: &Value) -> Vec<CheckResult> {
    let check_id = format!("channel_keys ({path})");
    let mut violations = Vec::new();

    let Some(object) = data.as_object() else {
        violations.push((
            CheckKind::Structure,
            "Document must be a JSON object".to_string(),
        ));
        return emit(&check_id, CheckKind::Structure, violations);
    };

    if object.len() < 2 || object.len() > CHANNEL_KEYS.len() {
        violations.push((CheckKind::Structure, "Unexpected number of keys".to_string()));
    }

    for key in object.keys() {
        if !CHANNEL_KEYS.contains(&key.as_str()) {
            violations.push((CheckKind::Structure, format!("Unexpected key \"{key}\"")));
        }
    }

    match object.get("schema_version") {
        None => violations.push((
            CheckKind::SchemaVersion,
            "No schema_version found".to_string(),
        )),
        Some(version) => {
            if version.as_str() != Some(SCHEMA_VERSION) {
                violations.push((
                    CheckKind::SchemaVersion,
                    format!("schema_version must be \"{SCHEMA_VERSION}\""),
                ));
            }
        }
    }

    match object.get("repositories") {
        None => violations.push((
            CheckKind::Structure,
            "\"repositories\" is required".to_string(),
        )),
        Some(repositories) => match repositories.as_array() {
            None => violations.push((
                CheckKind::Structure,
                "\"repositories\" must be a list".to_string(),
            )),
            Some(entries) => {
                for entry in entries {
                    if !entry.is_string() {
                        violations.push((
                            CheckKind::Structure,
                            "\"repositories\" entries must be strings".to_string(),
                        ));
                    }
                }
            }
        },
    }

    emit(&check_id, CheckKind::Structure, violations)
}

/// Repository entries of the channel: each one is either relative (leading
/// dot) or HTTPS, and the list is already in case-insensitive alphabetical
/// order.
pub fn check_channel_repositories(
    path: &str,
    data: &Value,
    rules: &FormatRules,
) -> Vec<CheckResult> {
    let check_id = format!("channel_repositories ({path})");
    let mut violations = Vec::new();

    let repositories: Vec<&str> = data
        .get("repositories")
        .and_then(Value::as_array)
        .map(|entries| entries.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    for repository in &repositories {
        if !rules.channel_repository.is_match(repository) {
            violations.push((
                CheckKind::Format,
                format!(
                    "Repositories must be relative urls or use the HTTPS protocol: {repository}"
                ),
            ));
        }
    }

    let mut sorted = repositories.clone();
    sorted.sort_by_key(|entry| entry.to_lowercase());
    if repositories != sorted {
        violations.push((
            CheckKind::Ordering,
            "Repositories must be sorted alphabetically".to_string(),
        ));
    }

    emit(&check_id, CheckKind::Ordering, violations)
}

/// Raw-text formatting invariant: every line is indented with tabs only.
pub fn check_indentation(path: &str, contents: &str, rules: &FormatRules) -> Vec<CheckResult> {
    let check_id = format!("indentation ({path})");
    let mut violations = Vec::new();

    for (index, line) in contents.lines().enumerate() {
        if !rules.indentation.is_match(line) {
            violations.push((
                CheckKind::Format,
                format!("Indent must be tabs in line {}", index + 1),
            ));
        }
    }

    emit(&check_id, CheckKind::Format, violations)
}
