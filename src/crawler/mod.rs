//! Crawler (C2): drives the headless browser to collect pages, assets, and
//! interactive inventory into a `SiteInventory` (spec §4.2).
//!
//! `circuit_breaker`, `domain_limiter`, `rate_limiter`, and `retry_queue`
//! are the teacher's generic lock-free crawl infrastructure, reused as-is;
//! `seed`, `probe`, `extract`, `download`, and `orchestrator` are new,
//! built against the `BrowsingDriver` capability interface in `crate::browser`.

pub mod circuit_breaker;
pub mod domain_limiter;
pub mod download;
pub mod errors;
pub mod extract;
pub mod glob;
pub mod orchestrator;
pub mod probe;
pub mod rate_limiter;
pub mod retry_queue;
pub mod seed;

pub use circuit_breaker::{CircuitBreaker, CircuitState, DomainHealth, extract_domain};
pub use domain_limiter::DomainLimiter;
pub use errors::CrawlError;
pub use orchestrator::Crawler;
pub use rate_limiter::{CrawlRateLimiter, RateLimitDecision};
pub use retry_queue::{QueuedUrl, RetryQueue};
