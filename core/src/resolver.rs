use crate::registry::NameRegistry;
use crate::report::{fail, CheckKind, CheckResult, RunReport};
use crate::rules::formats::FormatRules;
use crate::source::{join_include, ContentSource};
use crate::validators::dependency::check_dependency;
use crate::validators::document::{
    check_channel_keys, check_channel_repositories, check_indentation, check_repository_keys,
};
use crate::validators::names::{check_dependency_name_set, check_package_name_set};
use crate::validators::package::check_package;
use crate::validators::release::check_release;
use crate::validators::entity_name;
use serde_json::Value;
use std::collections::BTreeMap;

/// Repositories known to serve content that never validated; skipped without
/// emitting checks so they do not drown the report.
pub const BAD_REPOSITORIES: &[&str] = &[
    "https://packages.monokai.pro/packages.json",
    "https://raw.githubusercontent.com/blake-regalia/linked-data.syntaxes/master/channels/sublime/package-control.json",
];

const SCHEMA_VERSION: &str = "3.0.0";
const LEGACY_SCHEMA_VERSIONS: &[f64] = &[1.0, 1.1, 1.2, 2.0];

/// Walks the include graph of one validation run: fetches each document,
/// triages its schema version, runs the entity validators against the shared
/// name registry and recurses into includes depth-first in document order.
/// One resolver instance is one registry scope; independent runs build
/// independent resolvers.
pub struct Resolver<'a> {
    source: &'a dyn ContentSource,
    rules: FormatRules,
    registry: NameRegistry,
    main_index: bool,
    skipped_repositories: BTreeMap<String, u64>,
}

enum Document {
    Ready { text: String, data: Value },
    Skipped,
    Broken(CheckResult),
}

impl<'a> Resolver<'a> {
    pub fn new(source: &'a dyn ContentSource, main_index: bool) -> Self {
        Resolver {
            source,
            rules: FormatRules::new(),
            registry: NameRegistry::new(),
            main_index,
            skipped_repositories: BTreeMap::new(),
        }
    }

    pub fn skipped_repositories(&self) -> &BTreeMap<String, u64> {
        &self.skipped_repositories
    }

    /// Resolves one document tree, returning the ordered check sequence.
    /// Deterministic against static content; re-invoking repeats the I/O.
    pub fn resolve(&mut self, path: &str) -> Vec<CheckResult> {
        let mut checks = Vec::new();
        self.resolve_into(path, true, &mut checks);
        checks
    }

    fn resolve_into(&mut self, path: &str, root: bool, checks: &mut Vec<CheckResult>) {
        let (text, data) = match self.load(path) {
            Document::Ready { text, data } => (text, data),
            Document::Skipped => return,
            Document::Broken(check) => {
                checks.push(check);
                return;
            }
        };

        checks.extend(check_indentation(path, &text, &self.rules));
        checks.extend(check_repository_keys(path, &data));

        if let Some(packages) = data.get("packages").and_then(Value::as_array) {
            if self.main_index && !root {
                let names: Vec<String> = packages.iter().filter_map(entity_name).collect();
                checks.extend(check_package_name_set(path, &names, &self.rules));
            }
            for package in packages {
                let (name, package_checks) =
                    check_package(path, package, &self.rules, &mut self.registry);
                checks.extend(package_checks);
                let Some(name) = name else { continue };
                if let Some(releases) = package.get("releases").and_then(Value::as_array) {
                    let label = format!("{name} ({path})");
                    for release in releases {
                        checks.extend(check_release(
                            &label,
                            release,
                            false,
                            self.main_index,
                            &self.rules,
                        ));
                    }
                }
            }
        }

        if let Some(dependencies) = data.get("dependencies").and_then(Value::as_array) {
            if self.main_index && !root {
                let names: Vec<String> = dependencies.iter().filter_map(entity_name).collect();
                checks.extend(check_dependency_name_set(path, &names, &self.rules));
            }
            for dependency in dependencies {
                let (name, dependency_checks) =
                    check_dependency(path, dependency, &self.rules, &mut self.registry);
                checks.extend(dependency_checks);
                let Some(name) = name else { continue };
                if let Some(releases) = dependency.get("releases").and_then(Value::as_array) {
                    let label = format!("{name} ({path})");
                    for release in releases {
                        checks.extend(check_release(
                            &label,
                            release,
                            true,
                            self.main_index,
                            &self.rules,
                        ));
                    }
                }
            }
        }

        if let Some(includes) = data.get("includes").and_then(Value::as_array) {
            for include in includes.iter().filter_map(Value::as_str) {
                let child = join_include(path, include);
                self.resolve_into(&child, false, checks);
            }
        }
    }

    /// Fetch, decode and parse one document. Failures make the document's
    /// subtree unreachable, so the caller stops resolving that branch.
    fn load_document(&self, path: &str, check_id: &str) -> Result<(String, Value), CheckResult> {
        let bytes = self.source.fetch(path).map_err(|e| {
            fail(
                check_id,
                CheckKind::Fetch,
                format!("Fetching {path} failed: {e}"),
            )
        })?;

        let text = String::from_utf8(bytes).map_err(|e| {
            fail(
                check_id,
                CheckKind::Decode,
                format!("{path} is not valid UTF-8: {e}"),
            )
        })?;
        if text.is_empty() {
            return Err(fail(
                check_id,
                CheckKind::Decode,
                format!("{path} is empty"),
            ));
        }

        let data: Value = serde_json::from_str(&text).map_err(|e| {
            fail(
                check_id,
                CheckKind::Parse,
                format!("Could not parse {path}: {e}"),
            )
        })?;

        Ok((text, data))
    }

    /// `load_document` plus schema triage: legacy versions and known-bad
    /// repositories are skipped rather than validated.
    fn load(&mut self, path: &str) -> Document {
        let check_id = format!("include ({path})");

        let (text, data) = match self.load_document(path, &check_id) {
            Ok(document) => document,
            Err(check) => return Document::Broken(check),
        };

        let version = match data.get("schema_version") {
            Some(Value::String(version)) => version.clone(),
            Some(Value::Number(version)) => version.to_string(),
            Some(_) | None => {
                return Document::Broken(fail(
                    &check_id,
                    CheckKind::SchemaVersion,
                    format!("No schema_version found in {path}"),
                ));
            }
        };

        if version != SCHEMA_VERSION {
            let recognized = version
                .parse::<f64>()
                .is_ok_and(|v| LEGACY_SCHEMA_VERSIONS.contains(&v));
            if !recognized {
                return Document::Broken(fail(
                    &check_id,
                    CheckKind::SchemaVersion,
                    format!("Unrecognized schema version {version} in {path}"),
                ));
            }
        }

        if BAD_REPOSITORIES.contains(&path) {
            return Document::Skipped;
        }

        if version != SCHEMA_VERSION {
            // Not yet migrated; counted, not failed, and not recursed into.
            *self.skipped_repositories.entry(version).or_insert(0) += 1;
            return Document::Skipped;
        }

        Document::Ready { text, data }
    }
}

/// Validates a repository document and, recursively, everything it includes.
/// Runs in main-index mode: releases must be tag- or branch-based and shard
/// files must be named, partitioned and sorted canonically.
pub fn validate_repository(path: &str, source: &dyn ContentSource) -> RunReport {
    let mut resolver = Resolver::new(source, true);
    let checks = resolver.resolve(path);
    RunReport::from_checks(checks, resolver.skipped_repositories)
}

/// Validates the channel document and, when `test_repositories` is set, every
/// remote repository it lists. Remote repositories are resolved in
/// non-main-index mode with a registry of their own, independent from any
/// repository run.
pub fn validate_channel(
    path: &str,
    source: &dyn ContentSource,
    test_repositories: bool,
) -> RunReport {
    let mut resolver = Resolver::new(source, false);
    let mut checks = Vec::new();

    // The channel document gets no schema triage: a channel on a legacy
    // schema version is a failure, not a skip.
    let check_id = format!("channel ({path})");
    let (text, data) = match resolver.load_document(path, &check_id) {
        Ok(document) => document,
        Err(check) => {
            checks.push(check);
            return RunReport::from_checks(checks, resolver.skipped_repositories);
        }
    };

    checks.extend(check_indentation(path, &text, &resolver.rules));
    checks.extend(check_channel_keys(path, &data));
    checks.extend(check_channel_repositories(path, &data, &resolver.rules));

    if test_repositories {
        let repositories: Vec<String> = data
            .get("repositories")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        for repository in repositories {
            if repository.starts_with('.') {
                continue;
            }
            if !repository.to_lowercase().starts_with("http") {
                checks.push(fail(
                    &format!("repository ({repository})"),
                    CheckKind::Format,
                    format!("Unexpected repository url: {repository}"),
                ));
                continue;
            }
            resolver.resolve_into(&repository, true, &mut checks);
        }
    }

    RunReport::from_checks(checks, resolver.skipped_repositories)
}
