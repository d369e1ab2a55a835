//! Asset transformers (spec §4.3): image recompression/variants, CSS
//! purge/minify, JS minify/removal, and font self-hosting. Each submodule
//! is a standalone pure-ish function over one asset; `pipeline` drives them
//! per the configured [`crate::settings::Settings`].

pub mod css;
pub mod errors;
pub mod fonts;
pub mod image;
pub mod js;
pub mod rename;

pub use errors::TransformError;
pub use rename::content_addressed_rename;
