//! Rewrites `export default connect(mapState, actions)(Component)` modules so
//! the component reads state and dispatches actions through hooks.
//!
//! The rewrite is a text splice over the original file: everything outside the
//! wrapper call, the two side declarations, the factory's import and the
//! component declaration is left byte-for-byte as it was.

use std::path::Path;

pub mod batch;
pub mod config;
pub mod cursor;
pub mod error;
pub mod extract;
pub mod imports;
pub mod matcher;
pub mod rename;
pub mod resolve;
pub mod rewrite;
pub mod source;

pub use config::Config;
pub use error::{Error, Result};
pub use source::SourceKind;

// -----------------------------------------------------------------------------
// Entry point
// -----------------------------------------------------------------------------

/// Rewrites the module `text` read from `name`; the syntax is picked from the
/// file extension.
pub fn transform_source(name: &str, text: &str, config: &Config) -> Result<String> {
    let kind = SourceKind::from_path(Path::new(name));
    rewrite::rewrite(name, kind, text.to_string(), config)
}
