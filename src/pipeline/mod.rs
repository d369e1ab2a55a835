//! Pipeline orchestrator (C5, spec §4.5): drives the six-phase build —
//! css, js, images, html, write, headers — over one crawled site.

pub mod headers;
pub mod orchestrator;
pub mod output_writer;
pub mod stats;

pub use headers::{HeaderRule, build_headers_manifest, render_headers_manifest};
pub use orchestrator::optimize;
pub use stats::{CategoryStats, PageSize, PipelineStats};
