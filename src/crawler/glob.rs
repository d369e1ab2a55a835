//! Minimal glob matching (`*` wildcard only) shared by pattern-mode seeding
//! and exclude-glob filtering, grounded in the settings layer's own
//! glob-to-regex compilation.

use anyhow::{Context, Result};
use regex::Regex;

/// Compile a glob pattern (`*` wildcard) into an anchored regex.
pub fn compile(pattern: &str) -> Result<Regex> {
    let regex_pattern = pattern.replace('*', ".*");
    Regex::new(&format!("^{regex_pattern}$")).context("invalid glob pattern")
}

/// True if `value` matches any of `patterns`. Malformed patterns are
/// skipped rather than failing the whole crawl.
#[must_use]
pub fn matches_any(value: &str, patterns: &[String]) -> bool {
    patterns
        .iter()
        .filter_map(|p| compile(p).ok())
        .any(|re| re.is_match(value))
}
