//! Page data extraction functions.
//!
//! This module provides functions for extracting various types of data from web pages
//! including metadata, timing information, security details, and links.

// Sub-modules
//
// Superseded by `crate::crawler` (asset discovery, interactive probing, CSS
// coverage now live in `crawler::probe`/`crawler::extract`). Kept as
// reference until the final trimming pass; `link_rewriter`/`page_data` were
// already removed from the teacher's markdown/indexing stack.
pub mod extractors;
pub mod js_scripts;
pub mod schema;

// Re-exports for public API
pub use extractors::capture_screenshot;
