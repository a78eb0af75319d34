//! Lowering of JSX and ES2015+ syntax to ES5 with swc
//!
//! The pass order is resolver, react (classic runtime), es2015, helper
//! injection, hygiene, fixer. Helpers are inlined into each file so the
//! output runs without a module loader.

use crate::error::{Result, TransformError};
use crate::{TransformOptions, TransformResult};
use parcel_sourcemap::{Mapping, OriginalLocation};
use swc_core::common::comments::{Comments, SingleThreadedComments};
use swc_core::common::sync::Lrc;
use swc_core::common::{FileName, Globals, Mark, SourceFile, SourceMap, Spanned, GLOBALS};
use swc_core::ecma::ast::{EsVersion, Module};
use swc_core::ecma::codegen::text_writer::JsWriter;
use swc_core::ecma::codegen::{Config as CodegenConfig, Emitter};
use swc_core::ecma::parser::error::Error as ParseError;
use swc_core::ecma::parser::{parse_file_as_module, EsSyntax, Syntax};
use swc_core::ecma::transforms::base::fixer::fixer;
use swc_core::ecma::transforms::base::helpers::{inject_helpers, Helpers, HELPERS};
use swc_core::ecma::transforms::base::hygiene::hygiene;
use swc_core::ecma::transforms::base::resolver;
use swc_core::ecma::transforms::compat::es2015::{es2015, Config as Es2015Config};
use swc_core::ecma::transforms::react::{react, Options as ReactOptions, Runtime};
use swc_core::ecma::visit::FoldWith;

/// Transpile one script; `file` names it in errors
pub fn transpile(source: &str, file: &str, options: &TransformOptions) -> Result<TransformResult> {
    let cm: Lrc<SourceMap> = Default::default();
    let fm = cm.new_source_file(FileName::Custom(file.to_string()).into(), source.to_string());
    let comments = SingleThreadedComments::default();

    let module = parse(&cm, &fm, &comments, file)?;

    GLOBALS.set(&Globals::new(), || {
        let module = HELPERS.set(&Helpers::new(false), || lower(module, &cm, options));
        emit(&cm, &fm, &comments, &module, file, options.compact)
    })
}

fn parse(
    cm: &SourceMap,
    fm: &SourceFile,
    comments: &SingleThreadedComments,
    file: &str,
) -> Result<Module> {
    let syntax = Syntax::Es(EsSyntax {
        jsx: true,
        ..Default::default()
    });

    let mut recovered = Vec::new();
    let module = parse_file_as_module(
        fm,
        syntax,
        EsVersion::latest(),
        Some(comments as &dyn Comments),
        &mut recovered,
    )
    .map_err(|e| syntax_error(cm, file, &e))?;

    // recoverable errors still mean the input is not valid JavaScript
    match recovered.first() {
        Some(e) => Err(syntax_error(cm, file, e)),
        None => Ok(module),
    }
}

fn syntax_error(cm: &SourceMap, file: &str, error: &ParseError) -> TransformError {
    let loc = cm.lookup_char_pos(error.span().lo);
    TransformError::syntax(file, loc.line, loc.col.0 + 1, error.kind().msg())
}

fn lower(module: Module, cm: &Lrc<SourceMap>, options: &TransformOptions) -> Module {
    let unresolved_mark = Mark::new();
    let top_level_mark = Mark::new();

    let react_options = ReactOptions {
        runtime: Some(Runtime::Classic),
        pragma: Some(options.pragma.clone().into()),
        pragma_frag: Some(options.pragma_frag.clone().into()),
        // spread attributes become Object.assign instead of an _extends helper
        use_builtins: Some(true),
        ..Default::default()
    };

    module
        .fold_with(&mut resolver(unresolved_mark, top_level_mark, false))
        .fold_with(&mut react(
            cm.clone(),
            None::<SingleThreadedComments>,
            react_options,
            top_level_mark,
            unresolved_mark,
        ))
        .fold_with(&mut es2015(
            unresolved_mark,
            None::<SingleThreadedComments>,
            Es2015Config::default(),
        ))
        .fold_with(&mut inject_helpers(unresolved_mark))
        .fold_with(&mut hygiene())
        .fold_with(&mut fixer(None))
}

fn emit(
    cm: &Lrc<SourceMap>,
    fm: &SourceFile,
    comments: &SingleThreadedComments,
    module: &Module,
    file: &str,
    compact: bool,
) -> Result<TransformResult> {
    let mut code = Vec::new();
    let mut positions = Vec::new();
    {
        let mut emitter = Emitter {
            cfg: CodegenConfig::default().with_minify(compact),
            cm: cm.clone(),
            comments: Some(comments as &dyn Comments),
            wr: JsWriter::new(cm.clone(), "\n", &mut code, Some(&mut positions)),
        };
        emitter
            .emit_module(module)
            .map_err(|e| TransformError::emit(file, e.to_string()))?;
    }

    let code = String::from_utf8(code).map_err(|e| TransformError::emit(file, e.to_string()))?;

    // helpers and synthesized nodes carry positions outside the input file
    let mappings = positions
        .iter()
        .filter(|(pos, _)| !pos.is_dummy() && *pos >= fm.start_pos && *pos <= fm.end_pos)
        .map(|(pos, generated)| {
            let loc = cm.lookup_char_pos(*pos);
            Mapping {
                generated_line: generated.line as u32,
                generated_column: generated.col as u32,
                original: Some(OriginalLocation::new(
                    (loc.line - 1) as u32,
                    loc.col.0 as u32,
                    0,
                    None,
                )),
            }
        })
        .collect();

    Ok(TransformResult { code, mappings })
}
