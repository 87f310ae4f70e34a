use crate::report::{emit, CheckKind, CheckResult};
use crate::rules::formats::FormatRules;

/// File-scoped checks for the package names declared in one shard file: the
/// filename designates a letter (or the `0-9` digit bucket), every name must
/// fall into that bucket, and the list must already be in case-insensitive
/// alphabetical order.
pub fn check_package_name_set(
    include: &str,
    names: &[String],
    rules: &FormatRules,
) -> Vec<CheckResult> {
    let check_id = format!("package_names ({include})");
    let mut violations = Vec::new();

    let Some(captures) = rules.shard_include.captures(include) else {
        violations.push((
            CheckKind::Ordering,
            "Include filename does not match".to_string(),
        ));
        return emit(&check_id, CheckKind::Ordering, violations);
    };
    let letter = &captures[1];

    for name in names {
        let Some(first) = name.chars().next() else {
            continue;
        };
        let in_shard = if letter == "0-9" {
            first.is_ascii_digit()
        } else {
            first.to_lowercase().to_string() == letter
        };
        if !in_shard {
            violations.push((
                CheckKind::Ordering,
                format!("Package inserted in wrong file: {name}"),
            ));
        }
    }

    check_sorted(names, "Packages must be sorted alphabetically (by name)", &mut violations);

    emit(&check_id, CheckKind::Ordering, violations)
}

/// File-scoped ordering check for the dependency names declared in one
/// include file.
pub fn check_dependency_name_set(
    include: &str,
    names: &[String],
    rules: &FormatRules,
) -> Vec<CheckResult> {
    let check_id = format!("dependency_names ({include})");
    let mut violations = Vec::new();

    if !rules.shard_include.is_match(include) {
        violations.push((
            CheckKind::Ordering,
            "Include filename does not match".to_string(),
        ));
        return emit(&check_id, CheckKind::Ordering, violations);
    }

    check_sorted(names, "Dependencies must be sorted alphabetically", &mut violations);

    emit(&check_id, CheckKind::Ordering, violations)
}

fn check_sorted(names: &[String], message: &str, violations: &mut Vec<(CheckKind, String)>) {
    let mut sorted = names.to_vec();
    sorted.sort_by_key(|name| name.to_lowercase());
    if names != sorted.as_slice() {
        violations.push((CheckKind::Ordering, message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_case_insensitive_sort_order() {
        let rules = FormatRules::new();
        let checks =
            check_package_name_set("repository/a.json", &names(&["apple", "Avocado"]), &rules);
        assert!(checks[0].is_pass());

        let checks =
            check_package_name_set("repository/a.json", &names(&["Avocado", "apple"]), &rules);
        assert!(!checks[0].is_pass());
        assert_eq!(checks[0].kind, CheckKind::Ordering);
    }

    #[test]
    fn test_shard_letter() {
        let rules = FormatRules::new();
        let checks = check_package_name_set("repository/a.json", &names(&["Zoo"]), &rules);
        assert!(checks
            .iter()
            .any(|c| !c.is_pass() && c.message.contains("wrong file")));

        let checks = check_package_name_set("repository/z.json", &names(&["Zoo"]), &rules);
        assert!(checks[0].is_pass());
    }

    #[test]
    fn test_digit_bucket() {
        let rules = FormatRules::new();
        let checks = check_package_name_set("repository/0-9.json", &names(&["2html"]), &rules);
        assert!(checks[0].is_pass());

        let checks = check_package_name_set("repository/0-9.json", &names(&["html"]), &rules);
        assert!(!checks[0].is_pass());
    }

    #[test]
    fn test_unrecognized_filename() {
        let rules = FormatRules::new();
        let checks = check_package_name_set("repository/misc.json", &names(&["apple"]), &rules);
        assert!(!checks[0].is_pass());
        assert!(checks[0].message.contains("does not match"));
    }

    #[test]
    fn test_dependency_order() {
        let rules = FormatRules::new();
        let checks = check_dependency_name_set(
            "repository/dependencies.json",
            &names(&["bz2", "ssl-linux"]),
            &rules,
        );
        assert!(checks[0].is_pass());

        let checks = check_dependency_name_set(
            "repository/dependencies.json",
            &names(&["ssl-linux", "bz2"]),
            &rules,
        );
        assert!(!checks[0].is_pass());
    }
}
