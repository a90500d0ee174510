//! Applying partial changes to an artifact's field object.

use serde_json::{Map, Value};

/// Produce the field object that results from applying `changes` to `existing`.
///
/// With `merge`, changes are layered onto the existing fields: arrays present
/// on both sides become an order-preserving union, objects present on both
/// sides are merged one level deep, and anything else is replaced.
///
/// Without `merge`, `changes` replaces the fields wholesale, except that the
/// `identity` keys always keep their existing values and the `retained` keys
/// keep theirs when `changes` does not mention them.
pub fn apply_changes(
    existing: &Map<String, Value>,
    changes: &Map<String, Value>,
    merge: bool,
    identity: &[&str],
    retained: &[&str],
) -> Map<String, Value> {
    let mut out = if merge {
        let mut out = existing.clone();
        for (key, change) in changes {
            if identity.contains(&key.as_str()) {
                continue;
            }
            let merged = match (existing.get(key), change) {
                (Some(Value::Array(old)), Value::Array(new)) => Value::Array(union(old, new)),
                (Some(Value::Object(old)), Value::Object(new)) => {
                    let mut map = old.clone();
                    for (k, v) in new {
                        map.insert(k.clone(), v.clone());
                    }
                    Value::Object(map)
                }
                _ => change.clone(),
            };
            out.insert(key.clone(), merged);
        }
        out
    } else {
        let mut out: Map<String, Value> = changes
            .iter()
            .filter(|(k, _)| !identity.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for key in retained {
            if !out.contains_key(*key) {
                if let Some(v) = existing.get(*key) {
                    out.insert(key.to_string(), v.clone());
                }
            }
        }
        out
    };

    for key in identity {
        match existing.get(*key) {
            Some(v) => {
                out.insert(key.to_string(), v.clone());
            }
            None => {
                out.remove(*key);
            }
        }
    }
    out
}

fn union(old: &[Value], new: &[Value]) -> Vec<Value> {
    let mut out: Vec<Value> = Vec::with_capacity(old.len() + new.len());
    for v in old.iter().chain(new) {
        if !out.contains(v) {
            out.push(v.clone());
        }
    }
    out
}

/// Top-level keys whose values differ between `before` and `after`, sorted.
/// A key present on only one side counts as changed.
pub fn changed_keys(before: &Map<String, Value>, after: &Map<String, Value>) -> Vec<String> {
    let mut keys: Vec<String> = before
        .keys()
        .chain(after.keys())
        .filter(|k| before.get(*k) != after.get(*k))
        .cloned()
        .collect();
    keys.sort();
    keys.dedup();
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const IDENTITY: &[&str] = &["id", "pluginId", "name"];

    fn obj(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn merge_unions_arrays_without_duplicates() {
        let existing = obj(json!({"id": "a", "name": "a", "tools": ["Read"]}));
        let changes = obj(json!({"tools": ["Read", "Write"]}));
        let out = apply_changes(&existing, &changes, true, IDENTITY, &[]);
        assert_eq!(out["tools"], json!(["Read", "Write"]));
    }

    #[test]
    fn merge_with_empty_changes_is_identity() {
        let existing = obj(json!({"id": "a", "name": "a", "description": "d", "tools": ["Read"]}));
        let out = apply_changes(&existing, &Map::new(), true, IDENTITY, &[]);
        assert_eq!(out, existing);
    }

    #[test]
    fn merge_nested_maps_one_level() {
        let existing = obj(json!({"env": {"A": "1", "B": "2"}}));
        let changes = obj(json!({"env": {"B": "3", "C": "4"}}));
        let out = apply_changes(&existing, &changes, true, IDENTITY, &[]);
        assert_eq!(out["env"], json!({"A": "1", "B": "3", "C": "4"}));
    }

    #[test]
    fn merge_ignores_identity_changes() {
        let existing = obj(json!({"id": "a", "pluginId": "p", "name": "a"}));
        let changes = obj(json!({"id": "b", "name": "b", "pluginId": "q", "model": "opus"}));
        let out = apply_changes(&existing, &changes, true, IDENTITY, &[]);
        assert_eq!(out["id"], "a");
        assert_eq!(out["name"], "a");
        assert_eq!(out["pluginId"], "p");
        assert_eq!(out["model"], "opus");
    }

    #[test]
    fn replace_keeps_identity_and_retained() {
        let existing = obj(json!({
            "id": "core/x", "pluginId": "", "name": "x", "category": "core",
            "description": "d", "tools": ["Read"]
        }));
        let changes = obj(json!({"name": "y", "description": "new"}));
        let out = apply_changes(&existing, &changes, false, IDENTITY, &["category"]);
        assert_eq!(
            out,
            obj(json!({
                "id": "core/x", "pluginId": "", "name": "x", "category": "core",
                "description": "new"
            }))
        );
    }

    #[test]
    fn replace_can_override_retained() {
        let existing = obj(json!({"name": "x", "category": "core"}));
        let changes = obj(json!({"category": "util"}));
        let out = apply_changes(&existing, &changes, false, IDENTITY, &["category"]);
        assert_eq!(out["category"], "util");
    }

    #[test]
    fn changed_keys_compares_shallowly() {
        let before = obj(json!({"a": 1, "b": [1, 2], "c": "same"}));
        let after = obj(json!({"a": 2, "b": [1, 2], "c": "same", "d": true}));
        assert_eq!(changed_keys(&before, &after), vec!["a", "d"]);
        assert!(changed_keys(&before, &before).is_empty());
    }
}
