//! Configuration for kiln
//!
//! Parses kiln.toml. Every section is optional; missing values fall back to
//! the layout of a classic `assets/` front-end project.

use crate::error::ConfigError;
use kiln_lint::{OutputFormat, RuleConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "kiln.toml";

/// Top-level kiln configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub lint: LintSettings,
    pub vendor: Vec<VendorEntry>,
    pub components: ComponentSettings,
    pub scripts: ScriptSettings,
    pub styles: StyleSettings,
    pub watch: WatchSettings,
    pub server: ServerSettings,
    pub notify: NotifySettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lint: LintSettings::default(),
            vendor: default_vendor(),
            components: ComponentSettings::default(),
            scripts: ScriptSettings::default(),
            styles: StyleSettings::default(),
            watch: WatchSettings::default(),
            server: ServerSettings::default(),
            notify: NotifySettings::default(),
        }
    }
}

/// `[lint]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LintSettings {
    /// Files to lint, in report order
    pub files: Vec<String>,
    pub format: OutputFormat,
    pub rules: RuleConfig,
}

impl Default for LintSettings {
    fn default() -> Self {
        Self {
            files: default_sources(),
            format: OutputFormat::default(),
            rules: RuleConfig::default(),
        }
    }
}

/// One `[[vendor]]` entry: a file copied into the source tree when newer
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VendorEntry {
    /// Task name
    pub name: String,
    pub src: String,
    pub dest_dir: String,
}

fn default_vendor() -> Vec<VendorEntry> {
    vec![
        VendorEntry {
            name: "copy-react".to_string(),
            src: "node_modules/react/dist/react.js".to_string(),
            dest_dir: "assets/js/src/components".to_string(),
        },
        VendorEntry {
            name: "copy-react-dom".to_string(),
            src: "node_modules/react-dom/dist/react-dom.js".to_string(),
            dest_dir: "assets/js/src/components".to_string(),
        },
    ]
}

/// `[components]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ComponentSettings {
    /// Where vendor copies are published
    pub dest: String,
}

impl Default for ComponentSettings {
    fn default() -> Self {
        Self {
            dest: "assets/js".to_string(),
        }
    }
}

/// `[scripts]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScriptSettings {
    /// Files placed ahead of `source` in the bundle
    pub components: Vec<String>,
    pub source: Vec<String>,
    /// Files under these directories go through the JSX transform
    pub transpile_only: Vec<String>,
    pub output: String,
    pub compact: bool,
    pub source_maps: bool,
    pub pragma: String,
    pub pragma_frag: String,
}

impl Default for ScriptSettings {
    fn default() -> Self {
        Self {
            components: Vec::new(),
            source: default_sources(),
            transpile_only: vec!["assets/js/src/components".to_string()],
            output: "assets/js/app.js".to_string(),
            compact: false,
            source_maps: true,
            pragma: "React.createElement".to_string(),
            pragma_frag: "React.Fragment".to_string(),
        }
    }
}

fn default_sources() -> Vec<String> {
    vec![
        "assets/js/src/Utility.js".to_string(),
        "assets/js/src/components/ComponentForm.jsx".to_string(),
        "assets/js/src/components/Component.jsx".to_string(),
    ]
}

/// `[styles]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StyleSettings {
    pub src: String,
    pub dest: String,
    pub include_paths: Vec<String>,
    /// Browserslist queries for vendor prefixes
    pub browsers: Vec<String>,
    /// Written files matching this pattern are pushed to the browser
    pub reload_filter: String,
    pub source_maps: bool,
}

impl Default for StyleSettings {
    fn default() -> Self {
        Self {
            src: "assets/sass".to_string(),
            dest: "assets/css".to_string(),
            include_paths: Vec::new(),
            browsers: vec!["last 2 versions".to_string()],
            reload_filter: "**/*.css".to_string(),
            source_maps: true,
        }
    }
}

/// `[watch]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WatchSettings {
    /// Changes here re-run `concat`
    pub scripts: Vec<String>,
    /// Changes here re-run `sass`
    pub styles: Vec<String>,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            scripts: vec![
                "assets/js/src/**/*.js".to_string(),
                "assets/js/src/**/*.jsx".to_string(),
            ],
            styles: vec!["assets/sass/**/*.scss".to_string()],
        }
    }
}

/// `[server]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub base_dir: String,
    pub host: String,
    pub port: u16,
    /// Browser console notices from the live reload client
    pub notify: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            base_dir: ".".to_string(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            notify: false,
        }
    }
}

/// `[notify]`: how recoverable task errors are announced
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotifySettings {
    pub title: String,
    /// `{error}` is replaced with the error message
    pub message: String,
}

impl Default for NotifySettings {
    fn default() -> Self {
        Self {
            title: "Error".to_string(),
            message: "{error}".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse configuration from a string
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load `explicit` if given (it must exist), else `<root>/kiln.toml` if
    /// present, else defaults
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path: PathBuf = root.join(CONFIG_FILE);
                if path.exists() {
                    tracing::debug!("Loading {}", path.display());
                    Self::from_file(&path)
                } else {
                    tracing::debug!("No {} found, using defaults", CONFIG_FILE);
                    Ok(Self::default())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_lint::RuleLevel;

    #[test]
    fn test_parse_empty_config() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.vendor.len(), 2);
        assert_eq!(config.vendor[0].name, "copy-react");
        assert_eq!(config.scripts.output, "assets/js/app.js");
        assert_eq!(config.server.port, 3000);
        assert!(!config.server.notify);
        assert_eq!(config.styles.browsers, vec!["last 2 versions"]);
        assert_eq!(config.notify.message, "{error}");
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[lint]
format = "json"

[lint.rules]
no-console = "warn"
no-debugger = "off"

[[vendor]]
name = "copy-lodash"
src = "node_modules/lodash/lodash.js"
dest_dir = "assets/js/vendor"

[scripts]
compact = true
components = ["assets/js/vendor/lodash.js"]

[server]
port = 8080
"#;
        let config = Config::parse(toml).unwrap();

        assert_eq!(config.lint.format, OutputFormat::Json);
        assert_eq!(config.lint.rules.no_console, RuleLevel::Warn);
        assert_eq!(config.lint.rules.no_debugger, RuleLevel::Off);
        assert_eq!(config.lint.rules.no_dupe_keys, RuleLevel::Error);
        assert_eq!(config.lint.files.len(), 3);

        assert_eq!(config.vendor.len(), 1);
        assert_eq!(config.vendor[0].dest_dir, "assets/js/vendor");

        assert!(config.scripts.compact);
        assert_eq!(config.scripts.components.len(), 1);
        assert_eq!(config.scripts.pragma, "React.createElement");

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_invalid_config() {
        assert!(Config::parse("[server]\nport = \"high\"\n").is_err());
    }

    #[test]
    fn test_load_falls_back_to_defaults() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = Config::load(temp_dir.path(), None).unwrap();
        assert_eq!(config.components.dest, "assets/js");

        let missing = temp_dir.path().join("custom.toml");
        let err = Config::load(temp_dir.path(), Some(&missing)).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
