//! Lint rules
//!
//! Rule names follow ESLint so existing `.eslintrc` habits carry over.

use crate::diagnostic::{Diagnostic, DiagnosticSeverity, Range};
use crate::parser::ParsedFile;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Severity a rule is configured with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleLevel {
    #[default]
    Off,
    Warn,
    Error,
}

impl RuleLevel {
    fn severity(self) -> Option<DiagnosticSeverity> {
        match self {
            RuleLevel::Off => None,
            RuleLevel::Warn => Some(DiagnosticSeverity::Warning),
            RuleLevel::Error => Some(DiagnosticSeverity::Error),
        }
    }
}

/// Per-rule configuration, `[lint.rules]` in kiln.toml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RuleConfig {
    pub no_debugger: RuleLevel,
    pub no_dupe_keys: RuleLevel,
    pub no_console: RuleLevel,
    pub no_var: RuleLevel,
    pub prefer_const: RuleLevel,
    pub eqeqeq: RuleLevel,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            no_debugger: RuleLevel::Error,
            no_dupe_keys: RuleLevel::Error,
            no_console: RuleLevel::Off,
            no_var: RuleLevel::Off,
            prefer_const: RuleLevel::Off,
            eqeqeq: RuleLevel::Off,
        }
    }
}

pub const PARSE_ERROR: &str = "parse-error";

/// Run all enabled rules over a parsed file
pub fn check(file: &ParsedFile, config: &RuleConfig) -> Vec<Diagnostic> {
    let mut diagnostics = check_parse_errors(file);

    if let Some(severity) = config.no_debugger.severity() {
        diagnostics.extend(check_debugger(file, severity));
    }
    if let Some(severity) = config.no_dupe_keys.severity() {
        diagnostics.extend(check_dupe_keys(file, severity));
    }
    if let Some(severity) = config.no_console.severity() {
        diagnostics.extend(check_console(file, severity));
    }
    if let Some(severity) = config.no_var.severity() {
        diagnostics.extend(check_var(file, severity));
    }
    if let Some(severity) = config.prefer_const.severity() {
        diagnostics.extend(check_prefer_const(file, severity));
    }
    if let Some(severity) = config.eqeqeq.severity() {
        diagnostics.extend(check_eqeqeq(file, severity));
    }

    diagnostics.sort_by(|a, b| a.range.start.cmp(&b.range.start));
    diagnostics
}

fn check_parse_errors(file: &ParsedFile) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    if !file.has_errors {
        return diagnostics;
    }

    file.walk(|node| {
        if node.is_missing() {
            diagnostics.push(Diagnostic::error(
                Range::from_node(node),
                PARSE_ERROR,
                format!("Parsing error: missing '{}'", node.kind()),
            ));
            return false;
        }
        if node.is_error() {
            let text = file.node_text(node);
            let token = text.split_whitespace().next().unwrap_or("");
            let message = if token.is_empty() {
                "Parsing error: Unexpected end of input".to_string()
            } else {
                format!("Parsing error: Unexpected token {}", token)
            };
            diagnostics.push(Diagnostic::error(Range::from_node(node), PARSE_ERROR, message));
            return false;
        }
        true
    });

    diagnostics
}

fn check_debugger(file: &ParsedFile, severity: DiagnosticSeverity) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    file.walk(|node| {
        if node.kind() == "debugger_statement" {
            diagnostics.push(Diagnostic::new(
                Range::from_node(node),
                severity,
                "no-debugger",
                "Unexpected 'debugger' statement",
            ));
        }
        true
    });

    diagnostics
}

/// Key text of an object member, quotes stripped; `None` for computed keys and spreads
fn object_key(file: &ParsedFile, member: &tree_sitter::Node<'_>) -> Option<(String, Range)> {
    let key = match member.kind() {
        "pair" => member.child_by_field_name("key")?,
        "method_definition" => member.child_by_field_name("name")?,
        "shorthand_property_identifier" => *member,
        _ => return None,
    };

    let text = match key.kind() {
        "property_identifier" | "shorthand_property_identifier" | "number" => {
            file.node_text(&key).to_string()
        }
        "string" => file
            .node_text(&key)
            .trim_matches(|c| c == '"' || c == '\'')
            .to_string(),
        _ => return None,
    };

    // Getter/setter pairs share a key legitimately
    if member.kind() == "method_definition" {
        let mut cursor = member.walk();
        let is_accessor = member
            .children(&mut cursor)
            .any(|c| c.kind() == "get" || c.kind() == "set");
        if is_accessor {
            return None;
        }
    }

    Some((text, Range::from_node(&key)))
}

fn check_dupe_keys(file: &ParsedFile, severity: DiagnosticSeverity) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    file.walk(|node| {
        if node.kind() == "object" {
            let mut seen = HashSet::new();
            let mut cursor = node.walk();
            for member in node.named_children(&mut cursor) {
                if let Some((key, range)) = object_key(file, &member) {
                    if !seen.insert(key.clone()) {
                        diagnostics.push(Diagnostic::new(
                            range,
                            severity,
                            "no-dupe-keys",
                            format!("Duplicate key '{}'", key),
                        ));
                    }
                }
            }
        }
        true
    });

    diagnostics
}

fn check_console(file: &ParsedFile, severity: DiagnosticSeverity) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    file.walk(|node| {
        if node.kind() == "call_expression" {
            if let Some(func) = node.child_by_field_name("function") {
                if func.kind() == "member_expression" {
                    let is_console = func
                        .child_by_field_name("object")
                        .map(|obj| obj.kind() == "identifier" && file.node_text(&obj) == "console")
                        .unwrap_or(false);
                    if is_console {
                        diagnostics.push(Diagnostic::new(
                            Range::from_node(node),
                            severity,
                            "no-console",
                            "Unexpected console statement",
                        ));
                    }
                }
            }
        }
        true
    });

    diagnostics
}

fn check_var(file: &ParsedFile, severity: DiagnosticSeverity) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    file.walk(|node| {
        if node.kind() == "variable_declaration" {
            diagnostics.push(Diagnostic::new(
                Range::from_node(node),
                severity,
                "no-var",
                "Unexpected var, use let or const instead",
            ));
        }
        true
    });

    diagnostics
}

/// Nodes that open a scope for `let` bindings
const BLOCK_SCOPES: &[&str] = &[
    "program",
    "statement_block",
    "for_statement",
    "for_in_statement",
    "switch_body",
    "class_static_block",
];

fn enclosing_scopes<'t>(node: &tree_sitter::Node<'t>) -> impl Iterator<Item = tree_sitter::Node<'t>> {
    std::iter::successors(node.parent(), |n| n.parent()).filter(|n| BLOCK_SCOPES.contains(&n.kind()))
}

fn check_prefer_const(file: &ParsedFile, severity: DiagnosticSeverity) -> Vec<Diagnostic> {
    // (scope node id, name, binding range), in source order
    let mut declared: Vec<(usize, String, Range)> = Vec::new();

    file.walk(|node| {
        if node.kind() != "lexical_declaration" || !file.node_text(node).starts_with("let") {
            return true;
        }
        let Some(scope) = enclosing_scopes(node).next() else {
            return true;
        };
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            // `let x;` is assigned later or never; neither is a const candidate
            if child.kind() != "variable_declarator" || child.child_by_field_name("value").is_none() {
                continue;
            }
            if let Some(name) = child.child_by_field_name("name").filter(|n| n.kind() == "identifier") {
                declared.push((scope.id(), file.node_text(&name).to_string(), Range::from_node(&name)));
            }
        }
        true
    });

    // a write resolves to the innermost scope declaring that name
    let mut reassigned: HashSet<(usize, String)> = HashSet::new();
    file.walk(|node| {
        let target = match node.kind() {
            "assignment_expression" | "augmented_assignment_expression" => node.child_by_field_name("left"),
            "update_expression" => node.child_by_field_name("argument"),
            _ => None,
        };
        if let Some(target) = target.filter(|t| t.kind() == "identifier") {
            let name = file.node_text(&target);
            let binding = enclosing_scopes(node)
                .find(|scope| declared.iter().any(|(id, n, _)| *id == scope.id() && n == name));
            if let Some(scope) = binding {
                reassigned.insert((scope.id(), name.to_string()));
            }
        }
        true
    });

    declared
        .into_iter()
        .filter(|(scope, name, _)| !reassigned.contains(&(*scope, name.clone())))
        .map(|(_, name, range)| {
            Diagnostic::new(
                range,
                severity,
                "prefer-const",
                format!("'{}' is never reassigned. Use 'const' instead", name),
            )
        })
        .collect()
}

fn check_eqeqeq(file: &ParsedFile, severity: DiagnosticSeverity) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    file.walk(|node| {
        if node.kind() == "binary_expression" {
            if let Some(op) = node.child_by_field_name("operator") {
                let expected = match op.kind() {
                    "==" => Some("==="),
                    "!=" => Some("!=="),
                    _ => None,
                };
                if let Some(expected) = expected {
                    diagnostics.push(Diagnostic::new(
                        Range::from_node(&op),
                        severity,
                        "eqeqeq",
                        format!("Expected '{}' and instead saw '{}'", expected, op.kind()),
                    ));
                }
            }
        }
        true
    });

    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::JsParser;
    use std::path::Path;

    fn run(source: &str, config: &RuleConfig) -> Vec<Diagnostic> {
        let mut parser = JsParser::new().unwrap();
        let file = parser.parse(Path::new("test.jsx"), source).unwrap();
        check(&file, config)
    }

    fn all_errors() -> RuleConfig {
        RuleConfig {
            no_debugger: RuleLevel::Error,
            no_dupe_keys: RuleLevel::Error,
            no_console: RuleLevel::Error,
            no_var: RuleLevel::Error,
            prefer_const: RuleLevel::Error,
            eqeqeq: RuleLevel::Error,
        }
    }

    fn rules_of(diagnostics: &[Diagnostic]) -> Vec<&str> {
        diagnostics.iter().map(|d| d.rule.as_str()).collect()
    }

    #[test]
    fn test_clean_source_has_no_findings() {
        let source = "const greet = (name) => <p>Hello {name}</p>;\n";
        assert!(run(source, &all_errors()).is_empty());
    }

    #[test]
    fn test_debugger() {
        let diagnostics = run("function f() {\n  debugger;\n}\n", &RuleConfig::default());
        assert_eq!(rules_of(&diagnostics), vec!["no-debugger"]);
        assert_eq!(diagnostics[0].range.start.line, 1);
        assert_eq!(diagnostics[0].severity, DiagnosticSeverity::Error);
    }

    #[test]
    fn test_dupe_keys() {
        let diagnostics = run("const o = { a: 1, 'a': 2, b: 3 };", &RuleConfig::default());
        assert_eq!(rules_of(&diagnostics), vec!["no-dupe-keys"]);
        assert!(diagnostics[0].message.contains("'a'"));
    }

    #[test]
    fn test_accessor_pair_is_not_duplicate() {
        let source = "const o = { get x() { return 1; }, set x(v) {} };";
        assert!(run(source, &RuleConfig::default()).is_empty());
    }

    #[test]
    fn test_console_off_by_default() {
        assert!(run("console.log('hi');", &RuleConfig::default()).is_empty());

        let mut config = RuleConfig::default();
        config.no_console = RuleLevel::Warn;
        let diagnostics = run("console.log('hi');", &config);
        assert_eq!(rules_of(&diagnostics), vec!["no-console"]);
        assert_eq!(diagnostics[0].severity, DiagnosticSeverity::Warning);
    }

    #[test]
    fn test_var_and_prefer_const() {
        let source = "var a = 1;\nlet b = 2;\nlet c = 3;\nc += 1;\n";
        let diagnostics = run(source, &all_errors());
        assert_eq!(rules_of(&diagnostics), vec!["no-var", "prefer-const"]);
        assert!(diagnostics[1].message.contains("'b'"));
    }

    #[test]
    fn test_prefer_const_tracks_scopes() {
        let config = RuleConfig {
            prefer_const: RuleLevel::Error,
            ..RuleConfig::default()
        };
        let source = "function a() {\n  let x = 1;\n  return x;\n}\nfunction b() {\n  let x = 2;\n  x = 3;\n  return x;\n}\n";
        let diagnostics = run(source, &config);
        assert_eq!(rules_of(&diagnostics), vec!["prefer-const"]);
        assert_eq!(diagnostics[0].range.start.line, 1);

        let shadowed = "let y = 1;\nif (ok) {\n  let y = 2;\n  y++;\n}\n";
        let diagnostics = run(shadowed, &config);
        assert_eq!(rules_of(&diagnostics), vec!["prefer-const"]);
        assert_eq!(diagnostics[0].range.start.line, 0);
    }

    #[test]
    fn test_prefer_const_skips_uninitialized() {
        let config = RuleConfig {
            prefer_const: RuleLevel::Error,
            ..RuleConfig::default()
        };
        assert!(run("let pending;\nfor (let i = 0; i < 3; i++) {}\n", &config).is_empty());
    }

    #[test]
    fn test_eqeqeq() {
        let diagnostics = run("if (a == b && c != d && e === f) {}", &all_errors());
        assert_eq!(rules_of(&diagnostics), vec!["eqeqeq", "eqeqeq"]);
        assert!(diagnostics[0].message.contains("'==='"));
    }

    #[test]
    fn test_parse_error_always_reported() {
        let config = RuleConfig {
            no_debugger: RuleLevel::Off,
            no_dupe_keys: RuleLevel::Off,
            ..RuleConfig::default()
        };
        let diagnostics = run("const x = <div>;\n", &config);
        assert!(!diagnostics.is_empty());
        assert!(diagnostics.iter().all(|d| d.rule == PARSE_ERROR));
        assert!(diagnostics[0].message.starts_with("Parsing error"));
    }
}
