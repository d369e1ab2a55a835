//! `Asset` (spec §3): a non-HTML file referenced by a page.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MimeClass {
    Image,
    Css,
    Js,
    Font,
    Other,
}

impl MimeClass {
    /// Classify by file extension, case-insensitively. Unknown extensions
    /// fall back to `Other` so transforms always have a defined pass-through.
    #[must_use]
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" | "png" | "webp" | "avif" | "gif" | "svg" | "ico" | "bmp" => {
                Self::Image
            }
            "css" => Self::Css,
            "js" | "mjs" => Self::Js,
            "woff" | "woff2" | "ttf" | "otf" | "eot" => Self::Font,
            _ => Self::Other,
        }
    }
}

/// A rename recorded after a successful transform: the asset's new
/// content-addressed path and the hash that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetRename {
    pub new_relative_path: String,
    pub new_hash: String,
}

/// A per-variant sibling produced by the image transformer
/// (`foo.webp`, `foo-640w.webp`, `foo.avif`, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetVariant {
    pub relative_path: String,
    pub width: Option<u32>,
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub source_url: String,
    pub local_relative_path: String,
    pub mime_class: MimeClass,
    pub original_bytes: u64,
    pub content_hash: String,
    pub rename: Option<AssetRename>,
    pub variants: Vec<AssetVariant>,
}

impl Asset {
    #[must_use]
    pub fn new(source_url: String, local_relative_path: String, original_bytes: u64, content_hash: String) -> Self {
        let ext = PathBuf::from(&local_relative_path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_string();
        Self {
            source_url,
            local_relative_path,
            mime_class: MimeClass::from_extension(&ext),
            original_bytes,
            content_hash,
            rename: None,
            variants: Vec::new(),
        }
    }

    /// Download failed upstream (spec §4.2 failure semantics): the asset is
    /// recorded but treated as pass-through — references to it are left as-is.
    #[must_use]
    pub fn is_pass_through(&self) -> bool {
        self.original_bytes == 0
    }
}
