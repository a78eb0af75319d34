//! Concatenation of script files into one output with a combined source map

use crate::error::{Result, TransformError};
use crate::sourcemap::{advance, identity_mappings};
use parcel_sourcemap::{Mapping, OriginalLocation, SourceMap};

/// Joins files in the order they are added
pub struct Concat {
    file_name: String,
    separator: String,
    code: String,
    map: SourceMap,
    line: u32,
    column: u32,
    files: usize,
}

impl Concat {
    /// `file_name` is the output name recorded in the map, e.g. `app.js`
    pub fn new(file_name: &str, separator: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            separator: separator.to_string(),
            code: String::new(),
            map: SourceMap::new("/"),
            line: 0,
            column: 0,
            files: 0,
        }
    }

    /// Append a file that passes through unchanged
    pub fn add_original(&mut self, source_name: &str, content: &str) -> Result<()> {
        let mappings = identity_mappings(content);
        self.add(source_name, content, content, &mappings)
    }

    /// Append generated `code` for `original`, with mappings local to `code`
    pub fn add(
        &mut self,
        source_name: &str,
        original: &str,
        code: &str,
        mappings: &[Mapping],
    ) -> Result<()> {
        if self.files > 0 {
            let separator = std::mem::take(&mut self.separator);
            self.push(&separator);
            self.separator = separator;
        }

        let source = self.map.add_source(source_name);
        self.map
            .set_source_content(source as usize, original)
            .map_err(|e| TransformError::source_map(source_name, format!("{:?}", e)))?;

        for m in mappings {
            let Some(position) = m.original.as_ref() else {
                continue;
            };
            let generated_column = if m.generated_line == 0 {
                m.generated_column + self.column
            } else {
                m.generated_column
            };
            self.map.add_mapping(
                m.generated_line + self.line,
                generated_column,
                Some(OriginalLocation::new(
                    position.original_line,
                    position.original_column,
                    source,
                    None,
                )),
            );
        }

        self.push(code);
        self.files += 1;
        Ok(())
    }

    fn push(&mut self, text: &str) {
        advance(&mut self.line, &mut self.column, text);
        self.code.push_str(text);
    }

    pub fn finish(self) -> Bundle {
        Bundle {
            code: self.code,
            map: self.map,
            file_name: self.file_name,
        }
    }
}

/// Concatenated code and its source map
pub struct Bundle {
    pub code: String,
    pub map: SourceMap,
    file_name: String,
}

impl Bundle {
    /// Map JSON with `sourceRoot: "/"` and the output `file` name
    pub fn map_json(&mut self) -> Result<String> {
        let json = self
            .map
            .to_json(Some("/"))
            .map_err(|e| TransformError::source_map(&self.file_name, format!("{:?}", e)))?;

        let mut fields: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&json)
            .map_err(|e| TransformError::source_map(&self.file_name, e.to_string()))?;
        fields.insert("file".to_string(), self.file_name.clone().into());

        serde_json::to_string(&fields)
            .map_err(|e| TransformError::source_map(&self.file_name, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_map(bundle: &mut Bundle) -> serde_json::Value {
        serde_json::from_str(&bundle.map_json().unwrap()).unwrap()
    }

    #[test]
    fn test_files_joined_with_separator() {
        let mut concat = Concat::new("app.js", "\n");
        concat.add_original("a.js", "var a = 1;").unwrap();
        concat.add_original("b.js", "var b = 2;\nvar c = 3;").unwrap();
        let mut bundle = concat.finish();

        assert_eq!(bundle.code, "var a = 1;\nvar b = 2;\nvar c = 3;");
        let map = parse_map(&mut bundle);
        assert_eq!(map["sources"], serde_json::json!(["a.js", "b.js"]));
        assert_eq!(map["file"], "app.js");
        assert_eq!(map["sourceRoot"], "/");
        // line 0 -> a.js:0, line 1 -> b.js:0, line 2 -> b.js:1
        assert_eq!(map["mappings"], "AAAA;ACAA;AACA");
    }

    #[test]
    fn test_generated_mappings_are_offset() {
        let mut concat = Concat::new("app.js", "\n");
        concat.add_original("a.js", "x;\ny;").unwrap();
        concat
            .add(
                "b.jsx",
                "<b/>",
                "React.createElement(\"b\", null)",
                &[Mapping {
                    generated_line: 0,
                    generated_column: 0,
                    original: Some(OriginalLocation::new(0, 0, 0, None)),
                }],
            )
            .unwrap();
        let mut bundle = concat.finish();

        assert!(bundle.code.ends_with("y;\nReact.createElement(\"b\", null)"));

        let found = bundle.map.find_closest_mapping(2, 0).unwrap();
        let original = found.original.as_ref().unwrap();
        assert_eq!(original.source, 1);
        assert_eq!(original.original_line, 0);

        let map = parse_map(&mut bundle);
        assert_eq!(map["sourcesContent"][1], "<b/>");
    }

    #[test]
    fn test_mappings_without_original_skipped() {
        let mut concat = Concat::new("app.js", "\n");
        concat
            .add(
                "a.js",
                "a",
                "a",
                &[Mapping {
                    generated_line: 0,
                    generated_column: 0,
                    original: None,
                }],
            )
            .unwrap();
        let mut bundle = concat.finish();
        assert_eq!(parse_map(&mut bundle)["mappings"], "");
    }
}
