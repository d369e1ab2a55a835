//! JavaScript transformer (spec §4.3.3): custom-pattern removal, minify,
//! content-hashed rename.
//!
//! Grounded verbatim on `tola-rs-tola-ssg/src/asset/minify.rs::minify_js`
//! (`oxc::parser::Parser` → `oxc::minifier::Minifier` → `oxc::codegen::Codegen`).
//! `terser_passes`/`drop_console`/`drop_debugger` map onto oxc's
//! `CompressOptions`; `custom_remove_patterns` has no oxc equivalent (it's a
//! whole-file drop decision, not a minifier pass) so it's applied before
//! parsing.

use std::path::Path;

use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;
use regex::Regex;

use crate::models::AssetRename;
use crate::settings::types::JsSettings;
use crate::transform::errors::TransformError;
use crate::transform::rename::content_addressed_rename;

/// Sentinel rename emitted when a standalone script is dropped entirely
/// because it matched a `custom_remove_patterns` entry.
pub const REMOVED_SENTINEL: &str = "<removed>";

#[derive(Debug, Clone)]
pub enum JsTransformResult {
    Transformed { new_path: std::path::PathBuf, new_size: u64, rename: AssetRename },
    Removed,
    Unchanged,
}

/// Transform the standalone script at `path`. `custom_remove_patterns` is
/// checked against the asset's URL/relative path (not its contents) — each
/// entry is tried first as a regex, falling back to a literal substring
/// match if it fails to compile.
pub fn transform_js(
    path: &Path,
    relative_url: &str,
    settings: &JsSettings,
) -> Result<JsTransformResult, TransformError> {
    if matches_any_remove_pattern(relative_url, &settings.custom_remove_patterns) {
        let _ = std::fs::remove_file(path);
        return Ok(JsTransformResult::Removed);
    }

    if !settings.minify {
        return Ok(JsTransformResult::Unchanged);
    }

    let source = std::fs::read_to_string(path).map_err(|source| TransformError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let stripped = if settings.remove_jquery && looks_like_jquery(&source) {
        return Ok(JsTransformResult::Removed);
    } else {
        source
    };

    let minified = minify(&stripped, settings).map_err(|source| TransformError::Js {
        path: path.to_path_buf(),
        source,
    })?;

    let (new_path, rename) = content_addressed_rename(path, minified.as_bytes());
    std::fs::write(&new_path, &minified).map_err(|source| TransformError::Io {
        path: new_path.clone(),
        source,
    })?;
    if new_path != path {
        let _ = std::fs::remove_file(path);
    }

    Ok(JsTransformResult::Transformed {
        new_size: minified.len() as u64,
        new_path,
        rename,
    })
}

fn matches_any_remove_pattern(relative_url: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| match Regex::new(pattern) {
        Ok(re) => re.is_match(relative_url),
        Err(_) => relative_url.contains(pattern.as_str()),
    })
}

/// Heuristic jQuery-library detection for `remove_jquery`: looks for the
/// library's own banner comment rather than parsing, since minified builds
/// carry it verbatim even when everything else is mangled.
fn looks_like_jquery(source: &str) -> bool {
    let head = &source[..source.len().min(2048)];
    head.contains("jQuery JavaScript Library") || head.contains("jquery.com")
}

fn minify(source: &str, settings: &JsSettings) -> anyhow::Result<String> {
    let allocator = Allocator::default();
    let source_type = SourceType::mjs();
    let parsed = Parser::new(&allocator, source, source_type).parse();
    if !parsed.errors.is_empty() {
        anyhow::bail!("js parse errors: {:?}", parsed.errors);
    }
    let mut program = parsed.program;

    let mut compress = CompressOptions::smallest();
    compress.drop_console = settings.drop_console;
    compress.drop_debugger = settings.drop_debugger;

    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(compress),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);

    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;

    // terser_passes has no direct oxc equivalent (single-pass compressor);
    // re-running compress+mangle over its own output approximates repeated
    // passes for the configured count.
    if settings.terser_passes > 1 {
        let mut result = code;
        for _ in 1..settings.terser_passes {
            result = minify_once_more(&result, settings)?;
        }
        return Ok(result);
    }

    Ok(code)
}

fn minify_once_more(source: &str, settings: &JsSettings) -> anyhow::Result<String> {
    let allocator = Allocator::default();
    let source_type = SourceType::mjs();
    let parsed = Parser::new(&allocator, source, source_type).parse();
    if !parsed.errors.is_empty() {
        return Ok(source.to_string());
    }
    let mut program = parsed.program;
    let mut compress = CompressOptions::smallest();
    compress.drop_console = settings.drop_console;
    compress.drop_debugger = settings.drop_debugger;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(compress),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    Ok(Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> JsSettings {
        JsSettings {
            minify: true,
            terser_passes: 1,
            drop_console: true,
            drop_debugger: true,
            custom_remove_patterns: vec!["analytics".to_string()],
            default_loading_strategy: crate::settings::types::LoadingStrategy::Defer,
            remove_jquery: false,
            move_to_body_end: false,
        }
    }

    #[test]
    fn literal_pattern_matches_relative_url() {
        let s = settings();
        assert!(matches_any_remove_pattern("/assets/analytics-v2.js", &s.custom_remove_patterns));
        assert!(!matches_any_remove_pattern("/assets/app.js", &s.custom_remove_patterns));
    }

    #[test]
    fn regex_pattern_matches() {
        let patterns = vec![r"^/vendor/.*\.min\.js$".to_string()];
        assert!(matches_any_remove_pattern("/vendor/jquery.min.js", &patterns));
        assert!(!matches_any_remove_pattern("/app/main.js", &patterns));
    }

    #[test]
    fn minify_produces_smaller_output() {
        let s = settings();
        let source = "function add(a, b) {\n  return a + b;\n}\n\nconsole.log(add(1, 2));\n";
        let out = minify(source, &s).unwrap();
        assert!(out.len() <= source.len());
    }

    #[test]
    fn jquery_banner_detected() {
        let src = "/*! jQuery JavaScript Library v3.6.0 */\n(function(){})();";
        assert!(looks_like_jquery(src));
        assert!(!looks_like_jquery("console.log('hi')"));
    }
}
