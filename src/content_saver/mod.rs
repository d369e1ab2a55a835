//! Mirrored-path file writing used by the pipeline's `write` phase and the
//! agent's checkpoint store: content-addressed or URL-mirrored paths,
//! optional gzip, and etag cache metadata.

pub mod cache_check;
mod compression;
mod html_saver;
mod json_saver;

pub use cache_check::{
    check_etag_from_events, extract_etag_from_headers, get_mirror_path_sync, read_cached_etag,
};
pub use compression::{CacheMetadata, save_compressed_file};
pub use html_saver::save_html_content;
pub use json_saver::save_json_data;
