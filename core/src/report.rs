use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Category of the rule a check enforces. Failing checks carry the category
/// of the violated rule so callers can tell a malformed value apart from a
/// name collision or an unreachable document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Fetch,
    Decode,
    Parse,
    SchemaVersion,
    Structure,
    Format,
    Uniqueness,
    Ordering,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub check_id: String,
    pub kind: CheckKind,
    pub result: String, // PASS|FAIL
    pub message: String,
}

impl CheckResult {
    pub fn is_pass(&self) -> bool {
        self.result == "PASS"
    }
}

pub fn pass(check_id: &str, kind: CheckKind) -> CheckResult {
    CheckResult {
        check_id: check_id.to_string(),
        kind,
        result: "PASS".to_string(),
        message: "ok".to_string(),
    }
}

pub fn fail(check_id: &str, kind: CheckKind, message: String) -> CheckResult {
    CheckResult {
        check_id: check_id.to_string(),
        kind,
        result: "FAIL".to_string(),
        message,
    }
}

/// Turns the violations collected for one named check into check results:
/// one failing result per violated rule, or a single passing result when
/// nothing was violated.
pub fn emit(
    check_id: &str,
    default_kind: CheckKind,
    violations: Vec<(CheckKind, String)>,
) -> Vec<CheckResult> {
    if violations.is_empty() {
        vec![pass(check_id, default_kind)]
    } else {
        violations
            .into_iter()
            .map(|(kind, message)| fail(check_id, kind, message))
            .collect()
    }
}

/// The outcome of one whole validation run: the ordered check sequence plus
/// the per-schema-version counters for documents that were soft-skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub overall: String, // PASS|FAIL
    pub checks: Vec<CheckResult>,
    pub skipped_repositories: BTreeMap<String, u64>,
}

impl RunReport {
    pub fn from_checks(checks: Vec<CheckResult>, skipped: BTreeMap<String, u64>) -> Self {
        let overall = if checks.iter().any(|c| !c.is_pass()) {
            "FAIL"
        } else {
            "PASS"
        };
        RunReport {
            overall: overall.to_string(),
            checks,
            skipped_repositories: skipped,
        }
    }

    pub fn is_pass(&self) -> bool {
        self.overall == "PASS"
    }

    pub fn failures(&self) -> Vec<&CheckResult> {
        self.checks.iter().filter(|c| !c.is_pass()).collect()
    }
}
