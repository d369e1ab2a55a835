//! Error types for settings validation (spec §4.1 failure modes).

/// One schema violation: the dotted path into the settings tree and why the
/// leaf there was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Schema validation failed; no partial save (spec §4.1). Carries every
    /// violation found, not just the first.
    #[error("settings failed validation: {} issue(s)", .0.len())]
    Invalid(Vec<ValidationIssue>),
}
