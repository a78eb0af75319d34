//! Ordered file sets built from glob patterns

use crate::error::TaskError;
use glob::{MatchOptions, Pattern};
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// An ordered list of patterns relative to the project root
///
/// Expansion keeps declaration order across patterns and sorts the matches
/// of each glob. A path matched twice is kept at its first position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
    patterns: Vec<String>,
}

impl FileSet {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Matching files, relative to `root`
    pub fn expand(&self, root: &Path) -> Result<Vec<PathBuf>, TaskError> {
        let mut seen = HashSet::new();
        let mut files = Vec::new();

        for pattern in &self.patterns {
            let matches = if is_glob(pattern) {
                expand_glob(root, pattern)?
            } else if root.join(pattern).is_file() {
                vec![normalize(Path::new(pattern))]
            } else {
                tracing::warn!("File not found, skipping: {}", pattern);
                Vec::new()
            };

            if matches.is_empty() && is_glob(pattern) {
                tracing::debug!("No files match {}", pattern);
            }

            for path in matches {
                if seen.insert(path.clone()) {
                    files.push(path);
                }
            }
        }

        Ok(files)
    }

    /// Compile the patterns for matching root-relative paths
    pub fn matcher(&self) -> Result<Matcher, TaskError> {
        let patterns = self
            .patterns
            .iter()
            .map(|p| Pattern::new(p).map_err(|e| TaskError::pattern(p, e)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Matcher { patterns })
    }

    /// Directories that can contain a match: the literal part of each pattern
    pub fn roots(&self) -> Vec<PathBuf> {
        let mut roots: Vec<PathBuf> = Vec::new();
        for pattern in &self.patterns {
            let root = static_prefix(pattern);
            if !roots.contains(&root) {
                roots.push(root);
            }
        }

        // a directory inside another root is already covered
        let all = roots.clone();
        roots.retain(|r| !all.iter().any(|other| other != r && r.starts_with(other)));
        roots
    }
}

/// Compiled form of a [`FileSet`]
#[derive(Debug, Clone)]
pub struct Matcher {
    patterns: Vec<Pattern>,
}

impl Matcher {
    pub fn matches(&self, relative: &Path) -> bool {
        self.patterns
            .iter()
            .any(|p| p.matches_path_with(relative, MATCH_OPTIONS))
    }
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

fn expand_glob(root: &Path, pattern: &str) -> Result<Vec<PathBuf>, TaskError> {
    let full = format!(
        "{}/{}",
        Pattern::escape(&root.to_string_lossy()),
        pattern.trim_start_matches("./")
    );
    let entries = glob::glob_with(&full, MATCH_OPTIONS).map_err(|e| TaskError::pattern(pattern, e))?;

    let mut matches = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => {
                if let Ok(relative) = path.strip_prefix(root) {
                    matches.push(normalize(relative));
                }
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("Skipping unreadable path: {}", e),
        }
    }
    matches.sort();
    Ok(matches)
}

/// Drop `.` components so the same file always has the same key
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// The directory part of a pattern before any glob syntax
fn static_prefix(pattern: &str) -> PathBuf {
    let mut prefix = PathBuf::new();
    let components: Vec<&str> = pattern.split('/').collect();
    for (i, part) in components.iter().enumerate() {
        if is_glob(part) || i == components.len() - 1 {
            break;
        }
        if part.is_empty() || *part == "." {
            continue;
        }
        prefix.push(part);
    }
    prefix
}

/// Path as written in reports and source maps: forward slashes
pub fn display_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
