//! Safer-settings fallback (spec §4.1): a curated patch merged onto current
//! settings after any iteration that errored or whose build failed.

use serde_json::{json, Value};

/// The fixed patch: disable CSS purge, force `purgeAggressiveness = safe`,
/// keep jQuery, and turn off the three aggressive HTML minifier flags.
#[must_use]
pub fn patch() -> Value {
    json!({
        "css": {
            "purge": false,
            "purgeAggressiveness": "safe"
        },
        "js": {
            "removeJquery": false
        },
        "html": {
            "minify": {
                "removeAttributeQuotes": false,
                "removeOptionalTags": false,
                "removeEmptyElements": false
            }
        }
    })
}

/// Apply the fallback on top of `current` (spec: "merged onto current
/// settings").
#[must_use]
pub fn apply(current: &Value) -> Value {
    super::merge::merge(current, &patch())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_disables_purge_and_aggressive_minify_flags() {
        let current = json!({
            "css": {"purge": true, "purgeAggressiveness": "aggressive"},
            "js": {"removeJquery": true},
            "html": {"minify": {"removeAttributeQuotes": true, "removeOptionalTags": true, "removeEmptyElements": true, "collapseWhitespace": true}}
        });
        let safer = apply(&current);
        assert_eq!(safer["css"]["purge"], json!(false));
        assert_eq!(safer["css"]["purgeAggressiveness"], json!("safe"));
        assert_eq!(safer["js"]["removeJquery"], json!(false));
        assert_eq!(safer["html"]["minify"]["removeAttributeQuotes"], json!(false));
        assert_eq!(safer["html"]["minify"]["removeOptionalTags"], json!(false));
        assert_eq!(safer["html"]["minify"]["removeEmptyElements"], json!(false));
        // Untouched leaf survives the merge.
        assert_eq!(safer["html"]["minify"]["collapseWhitespace"], json!(true));
    }
}
