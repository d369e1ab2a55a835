//! Content-addressed renaming shared by the CSS and JS transformers
//! (spec §4.3.2/4.3.3: `<name>-<8hexhash>.<ext>`).
//!
//! Grounded on `content_saver::compression`'s `xxhash_rust::xxh3::xxh3_64`
//! usage — same hash, reused here for asset identity instead of
//! compressed-blob identity.

use std::path::{Path, PathBuf};

use crate::models::AssetRename;

/// Hash `contents` and build the renamed sibling path:
/// `dir/<stem>-<8hexhash>.<ext>` alongside `original_path`.
#[must_use]
pub fn content_addressed_rename(original_path: &Path, contents: &[u8]) -> (PathBuf, AssetRename) {
    let hash = format!("{:016x}", xxhash_rust::xxh3::xxh3_64(contents));
    let short_hash = &hash[..8];

    let stem = original_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("asset");
    let ext = original_path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("bin");

    let new_name = format!("{stem}-{short_hash}.{ext}");
    let new_path = original_path
        .parent()
        .map(|dir| dir.join(&new_name))
        .unwrap_or_else(|| PathBuf::from(&new_name));

    let new_relative_path = new_path.to_string_lossy().replace('\\', "/");

    (
        new_path,
        AssetRename {
            new_relative_path,
            new_hash: short_hash.to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_content_produces_same_hash() {
        let (path_a, rename_a) =
            content_addressed_rename(Path::new("styles/app.css"), b"body{color:red}");
        let (path_b, rename_b) =
            content_addressed_rename(Path::new("styles/app.css"), b"body{color:red}");
        assert_eq!(path_a, path_b);
        assert_eq!(rename_a.new_hash, rename_b.new_hash);
    }

    #[test]
    fn different_content_produces_different_hash() {
        let (_, rename_a) =
            content_addressed_rename(Path::new("app.css"), b"body{color:red}");
        let (_, rename_b) =
            content_addressed_rename(Path::new("app.css"), b"body{color:blue}");
        assert_ne!(rename_a.new_hash, rename_b.new_hash);
    }

    #[test]
    fn renamed_path_keeps_extension_and_hash_suffix() {
        let (path, rename) =
            content_addressed_rename(Path::new("assets/main.js"), b"console.log(1)");
        assert!(path.to_string_lossy().ends_with(".js"));
        assert!(rename.new_relative_path.contains(&rename.new_hash));
    }
}
