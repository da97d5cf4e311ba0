// src/tasks/js.rs

//! `swc` parsing shared by `jshint` and `uglify`.

use std::path::Path;

use swc_common::{FileName, SourceMap, Span, Spanned as _, sync::Lrc};
use swc_ecma_ast::{EsVersion, Program};
use swc_ecma_codegen::{Config as CodegenConfig, Emitter, text_writer::JsWriter};
use swc_ecma_parser::{EsSyntax, Syntax, parse_file_as_program};

/// Syntax error with a 1-based location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxIssue {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// A parsed script plus the source map needed to locate spans.
pub struct ParsedScript {
    pub cm: Lrc<SourceMap>,
    pub program: Program,
    /// Errors the parser recovered from.
    pub recovered: Vec<SyntaxIssue>,
}

impl ParsedScript {
    /// 1-based (line, column) of a span start.
    pub fn locate(&self, span: Span) -> (usize, usize) {
        locate(&self.cm, span)
    }
}

fn locate(cm: &SourceMap, span: Span) -> (usize, usize) {
    let loc = cm.lookup_char_pos(span.lo);
    (loc.line, loc.col.0 + 1)
}

/// Parse a script or module. `Err` carries the fatal syntax error.
pub fn parse(path: &Path, source: &str) -> Result<ParsedScript, SyntaxIssue> {
    let cm: Lrc<SourceMap> = Lrc::default();
    let fm = cm.new_source_file(
        Lrc::new(FileName::Real(path.to_path_buf())),
        source.to_owned(),
    );

    let mut errors = Vec::new();
    let parsed = parse_file_as_program(
        &fm,
        Syntax::Es(EsSyntax::default()),
        EsVersion::EsNext,
        None,
        &mut errors,
    );

    let to_issue = |err: swc_ecma_parser::error::Error| {
        let (line, column) = locate(&cm, err.span());
        SyntaxIssue {
            line,
            column,
            message: err.kind().msg().into_owned(),
        }
    };

    match parsed {
        Ok(program) => {
            let recovered = errors.into_iter().map(to_issue).collect();
            Ok(ParsedScript {
                cm: Lrc::clone(&cm),
                program,
                recovered,
            })
        }
        Err(err) => Err(to_issue(err)),
    }
}

/// Print `program` with minified codegen and no comments.
pub fn emit_minified(parsed: &ParsedScript) -> std::io::Result<String> {
    let mut buf = Vec::new();
    {
        let writer = JsWriter::new(Lrc::clone(&parsed.cm), "\n", &mut buf, None);
        let mut emitter = Emitter {
            cfg: CodegenConfig::default().with_minify(true),
            cm: Lrc::clone(&parsed.cm),
            comments: None,
            wr: writer,
        };
        emitter.emit_program(&parsed.program)?;
    }
    String::from_utf8(buf).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}
