use crate::context::BuildContext;
use crate::error::TaskError;
use crate::fileset::{display_path, FileSet};
use crate::tasks::write_file;
use kiln_transform::{Concat, TransformOptions, Transformer};
use std::fs;
use std::path::Path;

/// Bundle `components ++ source` into one script with a source map
///
/// Nothing is written until every input has been read and transformed, so a
/// syntax error leaves the previous bundle in place.
pub fn run(ctx: &BuildContext) -> Result<(), TaskError> {
    let settings = &ctx.config.scripts;
    let files = FileSet::new(settings.components.iter().chain(&settings.source)).expand(&ctx.root)?;

    let transformer = Transformer::new(TransformOptions {
        pragma: settings.pragma.clone(),
        pragma_frag: settings.pragma_frag.clone(),
        compact: settings.compact,
    });

    let output = ctx.path(&settings.output);
    let file_name = output
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "app.js".to_string());

    let mut concat = Concat::new(&file_name, "\n");
    for relative in &files {
        let path = ctx.path(relative);
        let source = fs::read_to_string(&path).map_err(|e| TaskError::io(&path, e))?;
        let name = display_path(relative);

        if should_transpile(relative, &settings.transpile_only) {
            let result = transformer.transform(&source, Path::new(&name))?;
            tracing::debug!("Transpiled {}", name);
            concat.add(&name, &source, &result.code, &result.mappings)?;
        } else {
            concat.add_original(&name, &source)?;
        }
    }

    let mut bundle = concat.finish();

    if settings.source_maps {
        let map_path = output.with_file_name(format!("{}.map", file_name));
        let map = bundle.map_json()?;
        bundle
            .code
            .push_str(&format!("\n//# sourceMappingURL={}.map\n", file_name));
        write_file(&map_path, &map)?;
    }
    write_file(&output, &bundle.code)?;

    tracing::info!("Wrote {} ({} file(s))", settings.output, files.len());
    ctx.live_reload().full_reload(format!("{} rebuilt", file_name));
    Ok(())
}

fn should_transpile(relative: &Path, transpile_only: &[String]) -> bool {
    transpile_only
        .iter()
        .any(|dir| relative.starts_with(Path::new(dir.trim_start_matches("./"))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_transpile() {
        let only = vec!["assets/js/src/components".to_string()];
        assert!(should_transpile(Path::new("assets/js/src/components/Form.jsx"), &only));
        assert!(!should_transpile(Path::new("assets/js/src/Utility.js"), &only));
        assert!(!should_transpile(Path::new("assets/js/src/components-old/A.js"), &only));
    }
}
