//! JavaScript/JSX parser using tree-sitter

use crate::error::{LintError, Result};
use std::path::Path;
use tree_sitter::{Parser, Tree};

/// Parser for `.js` / `.jsx` sources, JSX always enabled
pub struct JsParser {
    parser: Parser,
}

impl JsParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_javascript::LANGUAGE.into())?;
        Ok(Self { parser })
    }

    pub fn parse(&mut self, path: &Path, source: &str) -> Result<ParsedFile> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| LintError::parser(path, "no syntax tree produced"))?;
        let has_errors = tree.root_node().has_error();

        Ok(ParsedFile {
            source: source.to_string(),
            tree,
            has_errors,
        })
    }
}

/// Parsed file with AST
pub struct ParsedFile {
    pub source: String,
    pub tree: Tree,
    pub has_errors: bool,
}

impl ParsedFile {
    /// Get the root node
    pub fn root_node(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }

    /// Get source text for a node
    pub fn node_text(&self, node: &tree_sitter::Node<'_>) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    /// Walk the AST with a visitor function
    /// Returns true to continue into children, false to skip them
    pub fn walk<F>(&self, mut visitor: F)
    where
        F: FnMut(&tree_sitter::Node<'_>) -> bool,
    {
        Self::walk_recursive(&self.root_node(), &mut visitor);
    }

    fn walk_recursive<F>(node: &tree_sitter::Node<'_>, visitor: &mut F)
    where
        F: FnMut(&tree_sitter::Node<'_>) -> bool,
    {
        if !visitor(node) {
            return;
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            Self::walk_recursive(&child, visitor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_jsx_without_errors() {
        let mut parser = JsParser::new().unwrap();
        let file = parser
            .parse(Path::new("a.jsx"), "const el = <div className=\"x\">{name}</div>;")
            .unwrap();
        assert!(!file.has_errors);
    }

    #[test]
    fn test_parse_reports_errors() {
        let mut parser = JsParser::new().unwrap();
        let file = parser.parse(Path::new("a.js"), "const = ;").unwrap();
        assert!(file.has_errors);
    }

    #[test]
    fn test_walk_visits_nodes() {
        let mut parser = JsParser::new().unwrap();
        let file = parser.parse(Path::new("a.js"), "debugger;").unwrap();
        let mut kinds = Vec::new();
        file.walk(|node| {
            kinds.push(node.kind().to_string());
            true
        });
        assert!(kinds.iter().any(|k| k == "debugger_statement"));
    }
}
