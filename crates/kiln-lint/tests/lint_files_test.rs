/// Integration tests for linting files on disk

use kiln_lint::{Linter, OutputFormat, Reporter, RuleConfig, RuleLevel};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

#[test]
fn test_lint_component_tree() {
    let temp_dir = TempDir::new().unwrap();
    let utility = temp_dir.path().join("Utility.js");
    let component = temp_dir.path().join("Component.jsx");

    fs::write(
        &utility,
        r#"
const Utility = {
  format: function (value) {
    return String(value);
  }
};
"#,
    )
    .unwrap();

    fs::write(
        &component,
        r#"
const Component = React.createClass({
  render: function () {
    debugger;
    return <div className="component">{this.props.children}</div>;
  }
});
"#,
    )
    .unwrap();

    let mut linter = Linter::new(RuleConfig::default()).unwrap();
    let results = vec![
        linter.lint_file(&utility, Path::new("Utility.js")).unwrap(),
        linter.lint_file(&component, Path::new("Component.jsx")).unwrap(),
    ];

    assert!(!results[0].has_errors());
    assert!(results[1].has_errors());

    let report = Reporter::new(OutputFormat::Stylish).generate(&results);
    assert!(report.contains("Component.jsx:4:5: error [no-debugger]"));
}

#[test]
fn test_warnings_do_not_count_as_errors() {
    let mut linter = Linter::new(RuleConfig {
        no_var: RuleLevel::Warn,
        ..RuleConfig::default()
    })
    .unwrap();

    let result = linter
        .lint_source(Path::new("legacy.js"), "var legacy = true;\n")
        .unwrap();

    assert!(!result.has_errors());
    assert_eq!(result.warning_count(), 1);
}

#[test]
fn test_missing_file_is_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let mut linter = Linter::new(RuleConfig::default()).unwrap();
    let missing = temp_dir.path().join("nope.js");

    let err = linter.lint_file(&missing, Path::new("nope.js")).unwrap_err();
    assert!(err.to_string().contains("nope.js"));
}
