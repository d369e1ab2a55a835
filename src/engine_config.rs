//! Process-wide configuration (SPEC_FULL §2 `[AMBIENT]`): ports, work-dir
//! root, concurrency caps, timeouts, and the control-plane secrets — all
//! independent of the per-site `Settings` tree in `settings::types`.
//!
//! Loaded from environment variables with typed defaults, matching the
//! teacher's `CHROMIUM_PATH`-style direct `std::env::var` reads
//! (`browser::setup::find_browser_executable`) rather than a config crate.

use std::path::PathBuf;

/// `PAGEFORGE_*` environment variables, resolved once at startup.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Address the control-plane HTTP server binds to.
    pub bind_addr: String,
    /// Root directory under which per-run work directories are created.
    pub work_dir_root: PathBuf,
    /// Root directory `LocalEdgePublisher` copies published builds into.
    pub publish_root: PathBuf,
    /// Base URL the HTTP layer's `ServeDir` mounts `publish_root` under.
    pub publish_base_url: String,
    /// Global cap on concurrently-running builds, across all sites.
    pub max_concurrent_builds: usize,
    /// Header secret the auth middleware compares incoming requests against.
    /// `None` disables auth — only ever appropriate for local development.
    pub master_key: Option<String>,
    /// Optional PageSpeed Insights API key (spec §4.6); anonymous quota is
    /// used when absent.
    pub pagespeed_api_key: Option<String>,
    /// Capacity of each build's broadcast event channel (spec §6, C8).
    pub event_bus_capacity: usize,
}

impl EngineConfig {
    /// Resolve from the process environment, falling back to defaults that
    /// make the `serve` subcommand usable with no configuration at all.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            bind_addr: env_or("PAGEFORGE_BIND_ADDR", "127.0.0.1:8080"),
            work_dir_root: PathBuf::from(env_or("PAGEFORGE_WORK_DIR", "./pageforge-work")),
            publish_root: PathBuf::from(env_or("PAGEFORGE_PUBLISH_ROOT", "./pageforge-publish")),
            publish_base_url: env_or("PAGEFORGE_PUBLISH_BASE_URL", "http://127.0.0.1:8080/published"),
            max_concurrent_builds: env_parsed("PAGEFORGE_MAX_CONCURRENT_BUILDS", crate::queue::DEFAULT_MAX_CONCURRENT_BUILDS),
            master_key: std::env::var("PAGEFORGE_MASTER_KEY").ok().filter(|v| !v.is_empty()),
            pagespeed_api_key: std::env::var("PAGEFORGE_PAGESPEED_API_KEY").ok().filter(|v| !v.is_empty()),
            event_bus_capacity: env_parsed("PAGEFORGE_EVENT_BUS_CAPACITY", 1024),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable_with_no_environment() {
        // SAFETY: test-only; no other test in this process reads these vars.
        for key in [
            "PAGEFORGE_BIND_ADDR",
            "PAGEFORGE_WORK_DIR",
            "PAGEFORGE_MASTER_KEY",
            "PAGEFORGE_MAX_CONCURRENT_BUILDS",
        ] {
            unsafe { std::env::remove_var(key) };
        }
        let config = EngineConfig::from_env();
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert!(config.master_key.is_none());
        assert_eq!(config.max_concurrent_builds, crate::queue::DEFAULT_MAX_CONCURRENT_BUILDS);
    }

    #[test]
    fn blank_master_key_is_treated_as_absent() {
        unsafe { std::env::set_var("PAGEFORGE_MASTER_KEY", "") };
        let config = EngineConfig::from_env();
        assert!(config.master_key.is_none());
        unsafe { std::env::remove_var("PAGEFORGE_MASTER_KEY") };
    }
}
