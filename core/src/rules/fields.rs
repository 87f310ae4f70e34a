use crate::report::CheckKind;
use serde_json::Value;

/// JSON types a key is allowed to hold. Numbers and objects are never valid
/// for any key in the index format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonType {
    Str,
    Bool,
    List,
    Null,
}

impl JsonType {
    fn matches(self, value: &Value) -> bool {
        match self {
            JsonType::Str => value.is_string(),
            JsonType::Bool => value.is_boolean(),
            JsonType::List => value.is_array(),
            JsonType::Null => value.is_null(),
        }
    }

    fn name(self) -> &'static str {
        match self {
            JsonType::Str => "string",
            JsonType::Bool => "boolean",
            JsonType::List => "list",
            JsonType::Null => "null",
        }
    }
}

/// Allowed keys and their types for one entity kind.
pub type KeyTypeMap = &'static [(&'static str, &'static [JsonType])];

pub const PACKAGE_KEY_TYPES: KeyTypeMap = &[
    ("name", &[JsonType::Str]),
    ("details", &[JsonType::Str]),
    ("description", &[JsonType::Str]),
    ("releases", &[JsonType::List]),
    ("homepage", &[JsonType::Str]),
    ("author", &[JsonType::Str, JsonType::List]),
    ("readme", &[JsonType::Str]),
    ("issues", &[JsonType::Str]),
    ("donate", &[JsonType::Str, JsonType::Null]),
    ("buy", &[JsonType::Str]),
    ("previous_names", &[JsonType::List]),
    ("labels", &[JsonType::List]),
];

pub const DEPENDENCY_KEY_TYPES: KeyTypeMap = &[
    ("name", &[JsonType::Str]),
    ("description", &[JsonType::Str]),
    ("releases", &[JsonType::List]),
    ("issues", &[JsonType::Str]),
    ("load_order", &[JsonType::Str]),
    ("author", &[JsonType::Str]),
];

pub const PACKAGE_RELEASE_KEY_TYPES: KeyTypeMap = &[
    ("base", &[JsonType::Str]),
    ("tags", &[JsonType::Bool, JsonType::Str]),
    ("branch", &[JsonType::Str]),
    ("sublime_text", &[JsonType::Str]),
    ("platforms", &[JsonType::List, JsonType::Str]),
    ("dependencies", &[JsonType::List, JsonType::Str]),
    ("version", &[JsonType::Str]),
    ("date", &[JsonType::Str]),
    ("url", &[JsonType::Str]),
];

pub const DEPENDENCY_RELEASE_KEY_TYPES: KeyTypeMap = &[
    ("base", &[JsonType::Str]),
    ("tags", &[JsonType::Bool, JsonType::Str]),
    ("branch", &[JsonType::Str]),
    ("sublime_text", &[JsonType::Str]),
    ("platforms", &[JsonType::List, JsonType::Str]),
    ("version", &[JsonType::Str]),
    ("sha256", &[JsonType::Str]),
    ("url", &[JsonType::Str]),
];

fn allowed_names(types: &[JsonType]) -> String {
    types
        .iter()
        .map(|t| t.name())
        .collect::<Vec<_>>()
        .join(" or ")
}

/// Generic key enforcement: the key must be declared in the map and the
/// value must match one of the declared types. When a key allows a list
/// alongside scalar types, each element of a list value is re-checked
/// against the scalar member types individually.
pub fn enforce_key_types(
    key: &str,
    value: &Value,
    map: KeyTypeMap,
) -> Vec<(CheckKind, String)> {
    let mut violations = Vec::new();

    let Some((_, allowed)) = map.iter().find(|(k, _)| *k == key) else {
        violations.push((CheckKind::Structure, format!("Unknown key \"{key}\"")));
        return violations;
    };

    if !allowed.iter().any(|t| t.matches(value)) {
        violations.push((
            CheckKind::Structure,
            format!("\"{key}\" must be of type {}", allowed_names(allowed)),
        ));
        return violations;
    }

    if let Value::Array(elements) = value {
        let scalars: Vec<JsonType> = allowed
            .iter()
            .copied()
            .filter(|t| *t != JsonType::List)
            .collect();
        if !scalars.is_empty() {
            for element in elements {
                if !scalars.iter().any(|t| t.matches(element)) {
                    violations.push((
                        CheckKind::Structure,
                        format!(
                            "elements of \"{key}\" must be of type {}",
                            allowed_names(&scalars)
                        ),
                    ));
                }
            }
        }
    }

    violations
}
