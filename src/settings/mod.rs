//! Settings model & diff engine (spec §4.1, component C1).
//!
//! Three pure operations — `resolve`, `diff`, `merge` — plus schema
//! validation on intake and the curated safer-settings fallback. Every
//! other component reads its configuration from the `Value` this module
//! resolves; none of them merge or validate settings themselves.

pub mod defaults;
pub mod errors;
pub mod merge;
pub mod safer;
pub mod schema;
pub mod types;

pub use errors::{SettingsError, ValidationIssue};
pub use merge::{diff, merge as merge_values, resolve};
pub use types::Settings;
