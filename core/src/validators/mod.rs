pub mod dependency;
pub mod document;
pub mod names;
pub mod package;
pub mod release;

use serde_json::Value;

/// Name of a package or dependency: the explicit `name` key or, when that is
/// absent or empty, the last path segment of the `details` URL. Entities must
/// define one of the two.
pub fn entity_name(data: &Value) -> Option<String> {
    if let Some(name) = data.get("name").and_then(Value::as_str) {
        if !name.is_empty() {
            return Some(name.to_string());
        }
    }
    let details = data.get("details")?.as_str()?;
    details
        .trim_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}
