/// Integration tests for building a script bundle from mixed sources

use kiln_transform::{Concat, TransformOptions, Transformer};
use std::path::Path;

#[test]
fn test_plain_and_jsx_bundle() {
    let a = "var a = 1;\n";
    let b = "const B = () => <div className=\"b\">hi</div>;\n";

    let transformer = Transformer::new(TransformOptions::default());
    let transformed = transformer.transform(b, Path::new("b.jsx")).unwrap();

    let mut concat = Concat::new("app.js", "\n");
    concat.add_original("assets/js/src/a.js", a).unwrap();
    concat
        .add(
            "assets/js/src/components/b.jsx",
            b,
            &transformed.code,
            &transformed.mappings,
        )
        .unwrap();
    let mut bundle = concat.finish();

    assert!(bundle.code.starts_with("var a = 1;\n\n"));
    assert!(bundle.code.contains("React.createElement(\"div\""));
    assert!(bundle.code.contains("className: \"b\""));
    assert!(!bundle.code.contains("<div"));

    // `var B` sits on the third generated line and maps back to b.jsx line 0
    let found = bundle.map.find_closest_mapping(2, 0).unwrap();
    let original = found.original.as_ref().unwrap();
    assert_eq!(original.source, 1);
    assert_eq!(original.original_line, 0);

    let map: serde_json::Value = serde_json::from_str(&bundle.map_json().unwrap()).unwrap();
    assert_eq!(
        map["sources"],
        serde_json::json!(["assets/js/src/a.js", "assets/js/src/components/b.jsx"])
    );
    assert_eq!(map["sourcesContent"][1], b);
    assert_eq!(map["sourceRoot"], "/");
    assert_eq!(map["file"], "app.js");
}

#[test]
fn test_class_component_lowered_to_es5() {
    let source = r#"const list = (items, ...rest) => items.map((item) => `<${item}>`).concat(rest);

class Greeting extends React.Component {
  render() {
    const { name } = this.props;
    return <div className={`greeting ${name}`}>{list([name])}</div>;
  }
}
"#;

    let transformer = Transformer::new(TransformOptions::default());
    let result = transformer
        .transform(source, Path::new("assets/js/src/components/Greeting.jsx"))
        .unwrap();

    for es2015 in ["=>", "`", "class Greeting", "const ", "let ", "..."] {
        assert!(!result.code.contains(es2015), "{:?} left in:\n{}", es2015, result.code);
    }
    assert!(result.code.contains("function Greeting("));
    assert!(result.code.contains("React.createElement(\"div\""));
    assert!(!result.mappings.is_empty());
}

#[test]
fn test_bundle_is_deterministic() {
    let build = || {
        let transformer = Transformer::new(TransformOptions::default());
        let mut concat = Concat::new("app.js", "\n");
        for (name, source) in [("x.jsx", "<X a={1}/>;"), ("y.js", "y();")] {
            let result = transformer.transform(source, Path::new(name)).unwrap();
            concat.add(name, source, &result.code, &result.mappings).unwrap();
        }
        let mut bundle = concat.finish();
        let json = bundle.map_json().unwrap();
        (bundle.code, json)
    };

    assert_eq!(build(), build());
}

#[test]
fn test_syntax_error_reports_file() {
    let transformer = Transformer::new(TransformOptions::default());
    let err = transformer
        .transform("const = ;", Path::new("broken.js"))
        .unwrap_err();
    assert!(err.to_string().starts_with("broken.js: SyntaxError:"));
}
