//! Leaf error type for asset transforms (spec §4.3, §7).
//!
//! Every transform step catches its own decode/encode/parse failures and
//! falls back to pass-through rather than aborting the asset or the page;
//! `TransformError` exists for the call site to log before falling back,
//! not to propagate up and stop a build.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("image decode/encode failed for {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("css parse/minify failed for {path}: {source}")]
    Css {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("js parse/minify failed for {path}: {source}")]
    Js {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("font transform failed for {url}: {source}")]
    Font {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
