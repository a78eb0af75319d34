use crate::context::BuildContext;
use crate::error::TaskError;
use crate::fileset::{display_path, FileSet};
use crate::tasks::write_file;
use glob::Pattern;
use kiln_transform::{StyleCompiler, StyleOptions};
use std::path::{Path, PathBuf};

/// Compile every non-partial `.scss` file under the style source directory
///
/// Stops at the first failing file. Stylesheets written before the failure
/// are still pushed to the browser.
pub fn run(ctx: &BuildContext) -> Result<(), TaskError> {
    let settings = &ctx.config.styles;
    let src_dir = settings.src.trim_start_matches("./").trim_end_matches('/');
    let files = FileSet::new([format!("{}/**/*.scss", src_dir)]).expand(&ctx.root)?;

    let compiler = StyleCompiler::new(StyleOptions {
        include_paths: settings.include_paths.iter().map(|p| ctx.path(p)).collect(),
        browsers: settings.browsers.clone(),
        source_maps: settings.source_maps,
    })?;
    let reload_filter =
        Pattern::new(&settings.reload_filter).map_err(|e| TaskError::pattern(&settings.reload_filter, e))?;

    let mut written = Vec::new();
    let result = files
        .iter()
        .filter(|relative| !is_partial(relative))
        .try_for_each(|relative| {
            let outputs = compile_one(ctx, &compiler, relative, Path::new(src_dir))?;
            written.extend(outputs);
            Ok::<(), TaskError>(())
        });

    let reload: Vec<String> = written
        .iter()
        .filter(|path| reload_filter.matches_path(path))
        .map(|path| display_path(path))
        .collect();
    if !reload.is_empty() {
        tracing::info!("Compiled {} stylesheet(s)", reload.len());
    }
    ctx.live_reload().css_update(reload);

    result
}

/// Compile one file; returns the written paths relative to the root
fn compile_one(
    ctx: &BuildContext,
    compiler: &StyleCompiler,
    relative: &Path,
    src_dir: &Path,
) -> Result<Vec<PathBuf>, TaskError> {
    let settings = &ctx.config.styles;
    let name = display_path(relative);
    let compiled = compiler.compile_file(&ctx.path(relative), &name)?;

    let inner = relative.strip_prefix(src_dir).unwrap_or(relative);
    let css_rel = Path::new(&settings.dest).join(inner).with_extension("css");
    let css_name = css_rel
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let mut outputs = Vec::with_capacity(2);
    let mut css = compiled.css;
    if let Some(map) = compiled.map {
        let map_rel = css_rel.with_file_name(format!("{}.map", css_name));
        write_file(&ctx.path(&map_rel), &map)?;
        if !css.ends_with('\n') {
            css.push('\n');
        }
        css.push_str(&format!("/*# sourceMappingURL={}.map */\n", css_name));
        outputs.push(map_rel);
    }

    write_file(&ctx.path(&css_rel), &css)?;
    tracing::debug!("Compiled {} -> {}", name, display_path(&css_rel));
    outputs.push(css_rel);
    Ok(outputs)
}

fn is_partial(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('_'))
}
