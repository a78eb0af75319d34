//! Sass compilation followed by vendor prefixing
//!
//! grass compiles the Sass, then lightningcss parses the result, adds the
//! prefixes the browser targets need and prints it with a source map.

use crate::error::{Result, TransformError};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct StyleOptions {
    /// Extra directories searched by `@import` / `@use`
    pub include_paths: Vec<PathBuf>,

    /// Browserslist queries, e.g. `last 2 versions`
    pub browsers: Vec<String>,

    pub source_maps: bool,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            include_paths: Vec::new(),
            browsers: vec!["last 2 versions".to_string()],
            source_maps: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompiledStyle {
    pub css: String,
    /// Source map JSON, when enabled
    pub map: Option<String>,
}

pub struct StyleCompiler {
    options: StyleOptions,
    targets: Targets,
}

impl StyleCompiler {
    pub fn new(options: StyleOptions) -> Result<Self> {
        let browsers = if options.browsers.is_empty() {
            None
        } else {
            Browsers::from_browserslist(options.browsers.iter())
                .map_err(|e| TransformError::css("browserslist", e.to_string()))?
        };

        Ok(Self {
            options,
            targets: Targets {
                browsers,
                ..Targets::default()
            },
        })
    }

    /// Compile a `.scss` file; `name` is how the file appears in errors and maps
    pub fn compile_file(&self, path: &Path, name: &str) -> Result<CompiledStyle> {
        tracing::debug!("Compiling {}", name);

        let mut sass_options = grass::Options::default();
        if let Some(parent) = path.parent() {
            sass_options = sass_options.load_path(parent);
        }
        for include in &self.options.include_paths {
            sass_options = sass_options.load_path(include);
        }

        let css = grass::from_path(path, &sass_options)
            .map_err(|e| TransformError::sass(name, e.to_string()))?;

        // grass emits no map, so the map runs from the compiled CSS to the output
        let compiled_name = Path::new(name).with_extension("css");
        self.prefix(&css, &compiled_name.to_string_lossy())
    }

    /// Add vendor prefixes to plain CSS; the map source is `name` with `css` as its content
    pub fn prefix(&self, css: &str, name: &str) -> Result<CompiledStyle> {
        let mut stylesheet = StyleSheet::parse(
            css,
            ParserOptions {
                filename: name.to_string(),
                ..ParserOptions::default()
            },
        )
        .map_err(|e| TransformError::css(name, e.to_string()))?;

        stylesheet
            .minify(MinifyOptions {
                targets: self.targets,
                ..MinifyOptions::default()
            })
            .map_err(|e| TransformError::css(name, e.to_string()))?;

        let mut source_map = if self.options.source_maps {
            let mut map = parcel_sourcemap::SourceMap::new("/");
            map.add_source(name);
            map.set_source_content(0, css)
                .map_err(|e| TransformError::css(name, format!("{:?}", e)))?;
            Some(map)
        } else {
            None
        };

        let printed = stylesheet
            .to_css(PrinterOptions {
                minify: false,
                source_map: source_map.as_mut(),
                targets: self.targets,
                ..PrinterOptions::default()
            })
            .map_err(|e| TransformError::css(name, e.to_string()))?;

        let map = match source_map.as_mut() {
            Some(map) => Some(
                map.to_json(Some("/"))
                    .map_err(|e| TransformError::css(name, format!("{:?}", e)))?,
            ),
            None => None,
        };

        Ok(CompiledStyle {
            css: printed.code,
            map,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_compile_with_partial() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("_colors.scss"), "$brand: #336699;\n").unwrap();
        let main = temp_dir.path().join("main.scss");
        fs::write(&main, "@import 'colors';\n.nav { a { color: $brand; } }\n").unwrap();

        let compiler = StyleCompiler::new(StyleOptions::default()).unwrap();
        let compiled = compiler.compile_file(&main, "main.scss").unwrap();

        assert!(compiled.css.contains(".nav a"));
        assert!(compiled.css.contains("color:"));
        let map: serde_json::Value = serde_json::from_str(&compiled.map.unwrap()).unwrap();
        assert_eq!(map["sources"], serde_json::json!(["main.css"]));
        assert_eq!(map["sourceRoot"], "/");
        assert!(map["sourcesContent"][0].as_str().unwrap().contains(".nav a"));
    }

    #[test]
    fn test_include_paths() {
        let temp_dir = TempDir::new().unwrap();
        let vendor = temp_dir.path().join("vendor");
        fs::create_dir(&vendor).unwrap();
        fs::write(vendor.join("_grid.scss"), ".row { display: block; }\n").unwrap();
        let main = temp_dir.path().join("main.scss");
        fs::write(&main, "@import 'grid';\n").unwrap();

        let compiler = StyleCompiler::new(StyleOptions {
            include_paths: vec![vendor],
            ..StyleOptions::default()
        })
        .unwrap();

        let compiled = compiler.compile_file(&main, "main.scss").unwrap();
        assert!(compiled.css.contains(".row"));
    }

    #[test]
    fn test_vendor_prefixes() {
        let compiler = StyleCompiler::new(StyleOptions::default()).unwrap();
        let compiled = compiler
            .prefix(".a { user-select: none; }", "a.css")
            .unwrap();
        assert!(compiled.css.contains("-webkit-user-select") || compiled.css.contains("-ms-user-select"));
        assert!(compiled.css.contains("user-select: none"));
    }

    #[test]
    fn test_sass_error_names_file() {
        let temp_dir = TempDir::new().unwrap();
        let broken = temp_dir.path().join("broken.scss");
        fs::write(&broken, ".a { color: $undefined; }\n").unwrap();

        let compiler = StyleCompiler::new(StyleOptions::default()).unwrap();
        let err = compiler.compile_file(&broken, "broken.scss").unwrap_err();

        assert!(matches!(err, TransformError::Sass { .. }));
        assert!(err.to_string().starts_with("broken.scss: "));
    }

    #[test]
    fn test_source_maps_disabled() {
        let compiler = StyleCompiler::new(StyleOptions {
            source_maps: false,
            browsers: Vec::new(),
            ..StyleOptions::default()
        })
        .unwrap();
        let compiled = compiler.prefix(".b { color: red; }", "b.css").unwrap();
        assert!(compiled.map.is_none());
    }
}
