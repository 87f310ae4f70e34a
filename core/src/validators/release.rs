use crate::report::{emit, CheckKind, CheckResult};
use crate::rules::fields::{
    enforce_key_types, DEPENDENCY_RELEASE_KEY_TYPES, PACKAGE_RELEASE_KEY_TYPES,
};
use crate::rules::formats::FormatRules;
use serde_json::Value;
use std::collections::BTreeSet;

/// Validates one release of a package or dependency. `main_index` selects
/// between the rules for the canonical index (releases must be built from
/// `tags`/`branch` so no pull request is needed per release) and the rules
/// for externally hosted repositories (explicit `url`/`version` allowed, and
/// mandatory when no `tags`/`branch` is given).
pub fn check_release(
    label: &str,
    data: &Value,
    dependency: bool,
    main_index: bool,
    rules: &FormatRules,
) -> Vec<CheckResult> {
    let check_id = format!("release {label}");

    let Some(object) = data.as_object() else {
        let violations = vec![(
            CheckKind::Structure,
            "A release must be a JSON object".to_string(),
        )];
        return emit(&check_id, CheckKind::Structure, violations);
    };

    let mut violations = Vec::new();
    let has = |key: &str| object.contains_key(key);

    if main_index {
        if dependency {
            // The sha256 branch is a narrow exception for legacy mirrors that
            // cannot be served over HTTPS; the hash pins the payload instead.
            let url_ok = match object.get("url") {
                None => true,
                Some(url) => url
                    .as_str()
                    .is_some_and(|u| u.starts_with("http://")),
            };
            let allowed = (has("base") && (has("tags") || has("branch")))
                || (has("sha256") && url_ok);
            if !allowed {
                violations.push((
                    CheckKind::Structure,
                    "A release must have a \"base\" and a \"tags\" or \"branch\" key \
                     if it is in the main repository. For custom releases, a custom \
                     repository.json file must be hosted elsewhere. The only exception \
                     to this rule is for packages that can not be served over HTTPS."
                        .to_string(),
                ));
            }
        } else {
            if !has("tags") && !has("branch") {
                violations.push((
                    CheckKind::Structure,
                    "A release must have a \"tags\" key or \"branch\" key if it is in \
                     the main repository. For custom releases, a custom repository.json \
                     file must be hosted elsewhere."
                        .to_string(),
                ));
            }
            for key in ["url", "version", "date"] {
                if has(key) {
                    violations.push((
                        CheckKind::Structure,
                        format!(
                            "The \"{key}\" key should not be used in the main repository \
                             since a pull request would be necessary for every release"
                        ),
                    ));
                }
            }
        }
    } else if !has("tags") && !has("branch") {
        let required: &[&str] = if dependency {
            &["url", "version"]
        } else {
            &["url", "version", "date"]
        };
        for key in required {
            if !has(key) {
                violations.push((
                    CheckKind::Structure,
                    format!(
                        "A release must provide \"{key}\" if it does not specify \
                         \"tags\" or \"branch\""
                    ),
                ));
            }
        }
    } else {
        for key in ["url", "version", "date"] {
            if has(key) {
                violations.push((
                    CheckKind::Structure,
                    format!(
                        "The key \"{key}\" is redundant when \"tags\" or \"branch\" \
                         is specified"
                    ),
                ));
            }
        }
    }

    if !has("sublime_text") {
        violations.push((
            CheckKind::Structure,
            "A sublime text version selector is required".to_string(),
        ));
    }
    if dependency && !has("platforms") {
        violations.push((
            CheckKind::Structure,
            "A platforms selector is required for dependencies".to_string(),
        ));
    }
    if has("tags") && has("branch") {
        violations.push((
            CheckKind::Structure,
            "A release must have only one of the \"tags\" or \"branch\" keys".to_string(),
        ));
    }

    check_release_key_values(object, dependency, rules, &mut violations);

    emit(&check_id, CheckKind::Structure, violations)
}

fn check_release_key_values(
    object: &serde_json::Map<String, Value>,
    dependency: bool,
    rules: &FormatRules,
    violations: &mut Vec<(CheckKind, String)>,
) {
    let key_types = if dependency {
        DEPENDENCY_RELEASE_KEY_TYPES
    } else {
        PACKAGE_RELEASE_KEY_TYPES
    };

    for (key, value) in object {
        let field_violations = enforce_key_types(key, value, key_types);
        if !field_violations.is_empty() {
            violations.extend(field_violations);
            continue;
        }

        match key.as_str() {
            "url" => {
                let Some(url) = value.as_str() else { continue };
                if dependency {
                    if object.contains_key("sha256") {
                        // Hash-pinned legacy mirror, plain HTTP required.
                        if !rules.http_only_url.is_match(url) {
                            violations.push((
                                CheckKind::Format,
                                "A hash-pinned \"url\" must start with \"http://\"".to_string(),
                            ));
                        }
                    } else if !rules.https_url.is_match(url) {
                        violations.push((
                            CheckKind::Format,
                            "\"url\" must start with \"https://\"".to_string(),
                        ));
                    }
                } else if !rules.http_url.is_match(url) {
                    violations.push((
                        CheckKind::Format,
                        "\"url\" must start with \"http://\" or \"https://\"".to_string(),
                    ));
                }
            }
            "base" => {
                if let Some(base) = value.as_str() {
                    if !rules.release_base.is_match(base) {
                        violations.push((
                            CheckKind::Format,
                            "The base url is badly formatted or invalid".to_string(),
                        ));
                    }
                }
            }
            "sublime_text" => {
                if let Some(selector) = value.as_str() {
                    if !rules.sublime_text.is_match(selector) {
                        violations.push((
                            CheckKind::Format,
                            "sublime_text must be `*`, of the form `<relation><version>` \
                             where <relation> is one of {<, <=, >, >=} and <version> is \
                             a 4 digit number, or of the form `<version> - <version>`"
                                .to_string(),
                        ));
                    }
                }
            }
            "platforms" => check_platforms(value, rules, violations),
            "date" => {
                if let Some(date) = value.as_str() {
                    if !rules.date.is_match(date) {
                        violations.push((
                            CheckKind::Format,
                            "\"date\" must be of the form \"YYYY-MM-DD HH:MM:SS\"".to_string(),
                        ));
                    }
                }
            }
            "tags" => match value {
                Value::Bool(flag) => {
                    if !flag {
                        violations.push((
                            CheckKind::Format,
                            "\"tags\" must be `true` or a string of length>0".to_string(),
                        ));
                    }
                }
                Value::String(prefix) => {
                    if prefix.is_empty() {
                        violations.push((
                            CheckKind::Format,
                            "\"tags\" must be `true` or a string of length>0".to_string(),
                        ));
                    } else if prefix == "true" {
                        violations.push((
                            CheckKind::Format,
                            "\"tags\" should be the boolean `true`, not the string \"true\""
                                .to_string(),
                        ));
                    }
                }
                _ => {}
            },
            "branch" => {
                if value.as_str() == Some("") {
                    violations.push((
                        CheckKind::Format,
                        "\"branch\" must be non-empty".to_string(),
                    ));
                }
            }
            "sha256" => {
                if let Some(hash) = value.as_str() {
                    if !rules.sha256.is_match(hash) {
                        violations.push((
                            CheckKind::Format,
                            "\"sha256\" must be 64 hex characters".to_string(),
                        ));
                    }
                }
            }
            _ => {}
        }
    }
}

fn check_platforms(
    value: &Value,
    rules: &FormatRules,
    violations: &mut Vec<(CheckKind, String)>,
) {
    let platforms: Vec<&str> = match value {
        Value::String(platform) => vec![platform.as_str()],
        Value::Array(entries) => entries.iter().filter_map(Value::as_str).collect(),
        _ => return,
    };

    for platform in &platforms {
        if !rules.platform.is_match(platform) {
            violations.push((
                CheckKind::Format,
                format!("Invalid platform \"{platform}\""),
            ));
        }
    }

    let unique: BTreeSet<&str> = platforms.iter().copied().collect();
    if unique.len() != platforms.len() {
        violations.push((
            CheckKind::Format,
            "Specifying the same platform multiple times is redundant".to_string(),
        ));
    }

    // Only these literal combinations are treated as redundant.
    for os in ["osx", "windows", "linux"] {
        let all_archs = ["x32", "x64", "arm64"]
            .iter()
            .all(|arch| unique.contains(format!("{os}-{arch}").as_str()));
        if all_archs {
            violations.push((
                CheckKind::Format,
                "Specifying all of x32, x64 and arm64 architectures is redundant".to_string(),
            ));
        }
    }

    let all_os: BTreeSet<&str> = ["osx", "windows", "linux"].into_iter().collect();
    if unique == all_os {
        violations.push((
            CheckKind::Format,
            "\"osx, windows, linux\" are similar to (and should be replaced by) \"*\""
                .to_string(),
        ));
    }
}
