use anyhow::{Result, anyhow};
use std::sync::Arc;
use swc_common::{BytePos, FileName, Globals, Loc, SourceFile, SourceMap, Span};
use swc_ecma_ast::Module;
use swc_ecma_parser::{EsSyntax, Parser, StringInput, Syntax, TsSyntax};

pub struct ParsedJSX {
    pub module: Module,
    pub source_map: Arc<SourceMap>,
    pub source_file: Arc<SourceFile>,
    source: String,
}

impl ParsedJSX {
    /// Byte offset of `pos` into the parsed source text.
    pub fn offset(&self, pos: BytePos) -> usize {
        (pos.0 - self.source_file.start_pos.0) as usize
    }

    pub fn range(&self, span: Span) -> std::ops::Range<usize> {
        self.offset(span.lo)..self.offset(span.hi)
    }

    pub fn lookup(&self, pos: BytePos) -> Loc {
        self.source_map.lookup_char_pos(pos)
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Parse JSX/TSX source code string into an AST.
///
/// `.ts` files are parsed without JSX so that angle-bracket casts keep
/// working, `.js`/`.jsx` as JavaScript with JSX, everything else as TSX.
pub fn parse_jsx_source(
    code: String,
    file_path: &str,
    source_map: Arc<SourceMap>,
) -> Result<ParsedJSX> {
    use swc_common::GLOBALS;

    // Wrap in GLOBALS.set() for thread safety
    GLOBALS.set(&Globals::new(), || {
        let source = code.clone();
        let source_file = source_map.new_source_file(FileName::Real(file_path.into()).into(), code);

        let syntax = if file_path.ends_with(".ts") || file_path.ends_with(".mts") {
            Syntax::Typescript(TsSyntax::default())
        } else if file_path.ends_with(".js") || file_path.ends_with(".jsx") {
            Syntax::Es(EsSyntax {
                jsx: true,
                ..Default::default()
            })
        } else {
            Syntax::Typescript(TsSyntax {
                tsx: true,
                ..Default::default()
            })
        };

        let mut parser = Parser::new(syntax, StringInput::from(&*source_file), None);
        let module = parser
            .parse_module()
            .map_err(|e| anyhow!("Failed to parse {}: {:?}", file_path, e))?;

        Ok(ParsedJSX {
            module,
            source_map,
            source_file,
            source,
        })
    })
}

/// Parse with a private source map.
pub fn parse_jsx(code: &str, file_path: &str) -> Result<ParsedJSX> {
    parse_jsx_source(code.to_string(), file_path, Arc::new(SourceMap::default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tsx_and_offsets() {
        let code = "export const A = () => <p>Hi</p>;\n";
        let parsed = parse_jsx(code, "a.tsx").unwrap();
        assert_eq!(parsed.module.body.len(), 1);
        assert_eq!(parsed.source(), code);
        assert_eq!(parsed.offset(parsed.source_file.start_pos), 0);
    }

    #[test]
    fn test_parse_plain_ts_with_generic_cast() {
        let code = "const n = <number>value;\n";
        assert!(parse_jsx(code, "cast.ts").is_ok());
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = parse_jsx("const = ;", "broken.tsx").err().unwrap();
        assert!(err.to_string().contains("broken.tsx"));
    }
}
