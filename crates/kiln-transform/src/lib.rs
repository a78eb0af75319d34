//! Script and style transformation for kiln
//!
//! - [`Transformer`] lowers JSX and ES2015+ syntax to ES5
//! - [`Concat`] joins transformed files into one bundle with a source map
//! - [`StyleCompiler`] compiles Sass and adds vendor prefixes

use std::path::Path;

pub mod concat;
pub mod error;
pub mod script;
pub mod sourcemap;
pub mod style;

pub use concat::{Bundle, Concat};
pub use error::{Result, TransformError};
pub use parcel_sourcemap::{Mapping, OriginalLocation};
pub use style::{CompiledStyle, StyleCompiler, StyleOptions};

/// Script transformer
pub struct Transformer {
    options: TransformOptions,
}

/// Transform options
#[derive(Debug, Clone)]
pub struct TransformOptions {
    /// JSX pragma (default: React.createElement)
    pub pragma: String,

    /// JSX fragment pragma (default: React.Fragment)
    pub pragma_frag: String,

    /// Print transpiled files without optional whitespace
    pub compact: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            pragma: "React.createElement".to_string(),
            pragma_frag: "React.Fragment".to_string(),
            compact: false,
        }
    }
}

/// Transform result
#[derive(Debug)]
pub struct TransformResult {
    /// Transformed code
    pub code: String,

    /// Mappings from `code` back to the input, source index 0
    pub mappings: Vec<Mapping>,
}

impl Transformer {
    pub fn new(options: TransformOptions) -> Self {
        Self { options }
    }

    /// Transform one script file
    ///
    /// Plain `.js` files may carry JSX too, so every script extension goes
    /// through the same lowering.
    pub fn transform(&self, source: &str, filename: &Path) -> Result<TransformResult> {
        let ext = filename.extension().and_then(|e| e.to_str()).unwrap_or("");
        let display = filename.to_string_lossy();

        match ext {
            "js" | "jsx" | "mjs" | "cjs" => script::transpile(source, &display, &self.options),
            _ => Err(TransformError::UnsupportedExtension(ext.to_string())),
        }
    }
}
