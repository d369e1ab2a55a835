//! The three pure operations of the settings model (spec §4.1):
//! `resolve`, `diff`, and `merge`. All operate on `serde_json::Value` trees
//! rather than the typed `Settings` struct, since overrides are sparse and
//! user-supplied.

use serde_json::{Map, Value};

/// Recursive merge: for each key in `patch`, if both sides hold a non-null,
/// non-array object, recurse; otherwise the patch value replaces the base
/// value outright. Arrays always replace wholesale — never merged
/// element-wise.
#[must_use]
pub fn merge(base: &Value, patch: &Value) -> Value {
    match (base, patch) {
        (Value::Object(base_map), Value::Object(patch_map)) => {
            let mut out = base_map.clone();
            for (key, patch_value) in patch_map {
                let merged = match out.get(key) {
                    Some(base_value) => merge(base_value, patch_value),
                    None => patch_value.clone(),
                };
                out.insert(key.clone(), merged);
            }
            Value::Object(out)
        }
        (_, patch_value) => patch_value.clone(),
    }
}

/// `resolve(defaults, overrides) -> effective`: the effective settings a
/// Site runs with are simply the overrides merged onto the defaults.
#[must_use]
pub fn resolve(defaults: &Value, overrides: &Value) -> Value {
    merge(defaults, overrides)
}

/// `diff(defaults, effective) -> sparseTree`: walks both trees in parallel;
/// any leaf where `effective != default` emits a path. Returns the sparse
/// override tree plus its leaf count (the "override count").
#[must_use]
pub fn diff(defaults: &Value, effective: &Value) -> (Value, usize) {
    let mut count = 0;
    let sparse = diff_inner(defaults, effective, &mut count);
    (sparse.unwrap_or_else(|| Value::Object(Map::new())), count)
}

fn diff_inner(default_value: &Value, effective_value: &Value, count: &mut usize) -> Option<Value> {
    match (default_value, effective_value) {
        (Value::Object(default_map), Value::Object(effective_map)) => {
            let mut out = Map::new();
            for (key, effective_child) in effective_map {
                let default_child = default_map.get(key).unwrap_or(&Value::Null);
                if let Some(child_diff) = diff_inner(default_child, effective_child, count) {
                    out.insert(key.clone(), child_diff);
                }
            }
            if out.is_empty() {
                None
            } else {
                Some(Value::Object(out))
            }
        }
        (a, b) if a == b => None,
        (_, leaf) => {
            *count += 1;
            Some(leaf.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_replaces_leaves_and_recurses_objects() {
        let base = json!({"css": {"purge": true, "minifyPreset": "safe"}, "js": {"minify": true}});
        let patch = json!({"css": {"purge": false}});
        let merged = merge(&base, &patch);
        assert_eq!(
            merged,
            json!({"css": {"purge": false, "minifyPreset": "safe"}, "js": {"minify": true}})
        );
    }

    #[test]
    fn merge_replaces_arrays_wholesale() {
        let base = json!({"images": {"breakpoints": [320, 640, 960]}});
        let patch = json!({"images": {"breakpoints": [480]}});
        let merged = merge(&base, &patch);
        assert_eq!(merged, json!({"images": {"breakpoints": [480]}}));
    }

    #[test]
    fn diff_reports_only_changed_leaves() {
        let defaults = json!({"css": {"purge": true, "critical": true}, "js": {"minify": true}});
        let effective = json!({"css": {"purge": false, "critical": true}, "js": {"minify": true}});
        let (sparse, count) = diff(&defaults, &effective);
        assert_eq!(sparse, json!({"css": {"purge": false}}));
        assert_eq!(count, 1);
    }

    #[test]
    fn resolve_is_merge_of_defaults_and_overrides() {
        let defaults = json!({"css": {"purge": true}});
        let overrides = json!({"css": {"purge": false}});
        assert_eq!(resolve(&defaults, &overrides), merge(&defaults, &overrides));
    }

    #[test]
    fn merge_then_diff_round_trips_the_patch() {
        let defaults = json!({"css": {"purge": true, "critical": true}});
        let patch = json!({"css": {"purge": false}});
        let effective = resolve(&defaults, &patch);
        let (sparse, _) = diff(&defaults, &effective);
        assert_eq!(sparse, patch);
    }
}
