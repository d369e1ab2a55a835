//! Schema validation for settings overrides (spec §4.1).
//!
//! Out-of-range integers and unknown enum values are rejected outright.
//! Unknown keys are accepted and preserved (forward-compat) but collected
//! as warnings rather than errors — this lets an older build tolerate
//! settings written by a newer one.

use std::collections::HashMap;

use serde_json::Value;

use super::errors::{SettingsError, ValidationIssue};

enum Schema {
    Object(HashMap<&'static str, Schema>),
    Bool,
    IntRange(i64, i64),
    Enum(&'static [&'static str]),
    StringArray,
    OptionalString,
    PlainString,
}

fn obj(fields: &[(&'static str, Schema)]) -> Schema {
    Schema::Object(fields.iter().map(|(k, v)| (*k, clone_schema(v))).collect())
}

// `Schema` isn't `Clone` (it owns a `HashMap` of itself); building the tree
// declaratively needs to duplicate leaf nodes, so we hand-roll the clone.
fn clone_schema(s: &Schema) -> Schema {
    match s {
        Schema::Object(m) => Schema::Object(m.iter().map(|(k, v)| (*k, clone_schema(v))).collect()),
        Schema::Bool => Schema::Bool,
        Schema::IntRange(lo, hi) => Schema::IntRange(*lo, *hi),
        Schema::Enum(variants) => Schema::Enum(variants),
        Schema::StringArray => Schema::StringArray,
        Schema::OptionalString => Schema::OptionalString,
        Schema::PlainString => Schema::PlainString,
    }
}

fn css_schema() -> Schema {
    obj(&[
        ("purge", Schema::Bool),
        ("purgeAggressiveness", Schema::Enum(&["safe", "aggressive"])),
        ("minifyPreset", Schema::Enum(&["lite", "safe", "advanced"])),
        ("critical", Schema::Bool),
        ("fontDisplay", Schema::Enum(&["auto", "block", "swap", "fallback", "optional"])),
        ("combineStylesheets", Schema::Bool),
    ])
}

fn js_schema() -> Schema {
    obj(&[
        ("minify", Schema::Bool),
        ("terserPasses", Schema::IntRange(1, 5)),
        ("dropConsole", Schema::Bool),
        ("dropDebugger", Schema::Bool),
        ("customRemovePatterns", Schema::StringArray),
        ("defaultLoadingStrategy", Schema::Enum(&["defer", "async", "blocking"])),
        ("removeJquery", Schema::Bool),
        ("moveToBodyEnd", Schema::Bool),
    ])
}

fn images_schema() -> Schema {
    obj(&[
        ("qualityJpeg", Schema::IntRange(0, 100)),
        ("qualityWebp", Schema::IntRange(0, 100)),
        ("qualityAvif", Schema::IntRange(0, 100)),
        ("maxWidth", Schema::IntRange(1, 10_000)),
        ("breakpoints", Schema::StringArray),
        ("effort", Schema::IntRange(0, 9)),
        ("stripMetadata", Schema::Bool),
        ("convertToWebp", Schema::Bool),
        ("convertToAvif", Schema::Bool),
        ("keepOriginal", Schema::Bool),
        ("optimizeSvg", Schema::Bool),
        ("lazyLoad", Schema::Bool),
        ("lcpMode", Schema::Enum(&["auto", "manual"])),
        ("lcpSelector", Schema::OptionalString),
    ])
}

fn fonts_schema() -> Schema {
    obj(&[
        ("selfHostGoogleFonts", Schema::Bool),
        ("preloadTopN", Schema::IntRange(0, 10)),
    ])
}

fn html_minify_schema() -> Schema {
    obj(&[
        ("removeAttributeQuotes", Schema::Bool),
        ("removeOptionalTags", Schema::Bool),
        ("removeEmptyElements", Schema::Bool),
        ("collapseWhitespace", Schema::Bool),
    ])
}

fn bloat_schema() -> Schema {
    obj(&[
        ("removeGeneratorMeta", Schema::Bool),
        ("removeRsd", Schema::Bool),
        ("removeWlwmanifest", Schema::Bool),
        ("removeShortlink", Schema::Bool),
        ("removeEmojiPrefetch", Schema::Bool),
        ("removePingback", Schema::Bool),
    ])
}

fn facades_schema() -> Schema {
    obj(&[
        ("videoFacadesEnabled", Schema::Bool),
        ("posterQuality", Schema::Enum(&["thumbnail_low", "thumbnail_high", "maxres"])),
        ("privacyEnhancedHosts", Schema::Bool),
        ("googleMapsFacade", Schema::Bool),
    ])
}

fn html_schema() -> Schema {
    obj(&[
        ("bloat", bloat_schema()),
        ("facades", facades_schema()),
        ("moveHeadScriptsToBodyEnd", Schema::Bool),
        ("deferScriptExceptions", Schema::StringArray),
        ("criticalCss", Schema::Bool),
        ("svgSpriteDedup", Schema::Bool),
        ("resourceHints", Schema::Bool),
        ("clsFixes", Schema::Bool),
        ("minify", html_minify_schema()),
    ])
}

fn build_schema() -> Schema {
    obj(&[
        ("maxConcurrentPages", Schema::IntRange(1, 100)),
        ("pageSelection", Schema::Enum(&["sitemap", "url_list", "pattern"])),
        ("scope", Schema::Enum(&["all", "custom"])),
        ("customUrls", Schema::StringArray),
        ("crawlWaitMs", Schema::IntRange(0, 60_000)),
        ("pipelineTimeoutSecs", Schema::IntRange(1, 7_200)),
        ("maxPages", Schema::IntRange(1, 10_000)),
        ("pageLoadTimeoutSecs", Schema::IntRange(1, 300)),
        ("networkIdleTimeoutSecs", Schema::IntRange(0, 120)),
        ("excludeGlobs", Schema::StringArray),
    ])
}

fn verify_schema() -> Schema {
    obj(&[
        ("pagespeedEnabled", Schema::Bool),
        ("hardPassPagespeedThreshold", Schema::IntRange(0, 100)),
        ("softPassPagespeedThreshold", Schema::IntRange(0, 100)),
        ("softPassAvgPerformanceThreshold", Schema::IntRange(0, 100)),
    ])
}

fn agent_schema() -> Schema {
    obj(&[
        ("maxIterations", Schema::IntRange(1, 100)),
        ("sslReadinessPollSecs", Schema::IntRange(0, 3_600)),
    ])
}

fn root_schema() -> Schema {
    obj(&[
        ("css", css_schema()),
        ("js", js_schema()),
        ("images", images_schema()),
        ("fonts", fonts_schema()),
        ("html", html_schema()),
        ("build", build_schema()),
        ("verify", verify_schema()),
        ("agent", agent_schema()),
    ])
}

fn check_node(path: &str, schema: &Schema, value: &Value, issues: &mut Vec<ValidationIssue>, warnings: &mut Vec<String>) {
    match (schema, value) {
        (Schema::Object(fields), Value::Object(map)) => {
            for (key, child_value) in map {
                let child_path = if path.is_empty() { key.clone() } else { format!("{path}.{key}") };
                match fields.get(key.as_str()) {
                    Some(child_schema) => check_node(&child_path, child_schema, child_value, issues, warnings),
                    None => warnings.push(format!("unknown key: {child_path}")),
                }
            }
        }
        (Schema::Object(_), other) => issues.push(ValidationIssue {
            path: path.to_string(),
            reason: format!("expected object, got {}", value_kind(other)),
        }),
        (Schema::Bool, Value::Bool(_)) => {}
        (Schema::Bool, other) => issues.push(ValidationIssue {
            path: path.to_string(),
            reason: format!("expected bool, got {}", value_kind(other)),
        }),
        (Schema::IntRange(lo, hi), Value::Number(n)) => match n.as_i64() {
            Some(i) if i >= *lo && i <= *hi => {}
            Some(i) => issues.push(ValidationIssue {
                path: path.to_string(),
                reason: format!("{i} out of range [{lo}, {hi}]"),
            }),
            None => issues.push(ValidationIssue {
                path: path.to_string(),
                reason: "expected integer".to_string(),
            }),
        },
        (Schema::IntRange(..), other) => issues.push(ValidationIssue {
            path: path.to_string(),
            reason: format!("expected integer, got {}", value_kind(other)),
        }),
        (Schema::Enum(variants), Value::String(s)) => {
            if !variants.contains(&s.as_str()) {
                issues.push(ValidationIssue {
                    path: path.to_string(),
                    reason: format!("unknown enum value '{s}', expected one of {variants:?}"),
                });
            }
        }
        (Schema::Enum(..), other) => issues.push(ValidationIssue {
            path: path.to_string(),
            reason: format!("expected string, got {}", value_kind(other)),
        }),
        (Schema::StringArray, Value::Array(_)) => {}
        (Schema::StringArray, other) => issues.push(ValidationIssue {
            path: path.to_string(),
            reason: format!("expected array, got {}", value_kind(other)),
        }),
        (Schema::OptionalString, Value::Null) => {}
        (Schema::OptionalString | Schema::PlainString, Value::String(_)) => {}
        (Schema::OptionalString, other) => issues.push(ValidationIssue {
            path: path.to_string(),
            reason: format!("expected string or null, got {}", value_kind(other)),
        }),
        (Schema::PlainString, other) => issues.push(ValidationIssue {
            path: path.to_string(),
            reason: format!("expected string, got {}", value_kind(other)),
        }),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Validate a (possibly sparse) overrides tree against the settings schema.
/// Returns forward-compat warnings on success; on the first pass over the
/// whole tree that finds any rejected leaf, returns every issue found (no
/// partial save, spec §4.1).
pub fn validate(overrides: &Value) -> Result<Vec<String>, SettingsError> {
    let mut issues = Vec::new();
    let mut warnings = Vec::new();
    check_node("", &root_schema(), overrides, &mut issues, &mut warnings);
    if issues.is_empty() {
        Ok(warnings)
    } else {
        Err(SettingsError::Invalid(issues))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_valid_sparse_override() {
        let overrides = json!({"css": {"purge": false}, "js": {"terserPasses": 3}});
        assert!(validate(&overrides).unwrap().is_empty());
    }

    #[test]
    fn rejects_out_of_range_integer() {
        let overrides = json!({"js": {"terserPasses": 9}});
        let err = validate(&overrides).unwrap_err();
        match err {
            SettingsError::Invalid(issues) => {
                assert_eq!(issues.len(), 1);
                assert_eq!(issues[0].path, "js.terserPasses");
            }
        }
    }

    #[test]
    fn rejects_unknown_enum_value() {
        let overrides = json!({"css": {"purgeAggressiveness": "extreme"}});
        assert!(validate(&overrides).is_err());
    }

    #[test]
    fn surfaces_unknown_keys_as_warnings_not_errors() {
        let overrides = json!({"css": {"notARealKey": true}});
        let warnings = validate(&overrides).unwrap();
        assert_eq!(warnings, vec!["unknown key: css.notARealKey".to_string()]);
    }
}
