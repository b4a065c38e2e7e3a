//! One revision of a source file: its text, its parsed module, and the
//! offset bookkeeping needed to splice the text.

use std::fmt;
use std::ops::Range;
use std::path::Path;

use swc_core::{
    common::{sync::Lrc, BytePos, FileName, SourceFile, SourceMap, Span, Spanned},
    ecma::{
        ast::{EsVersion, Module},
        parser::{parse_file_as_module, EsSyntax, Syntax, TsSyntax},
    },
};

use crate::error::{Error, Result};

// -----------------------------------------------------------------------------
// Syntax selection
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceKind {
    /// ECMAScript with JSX (`.js`, `.jsx`, `.mjs`, anything unknown).
    #[default]
    Jsx,
    TypeScript,
    Tsx,
}

impl SourceKind {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("ts") | Some("mts") | Some("cts") => SourceKind::TypeScript,
            Some("tsx") => SourceKind::Tsx,
            _ => SourceKind::Jsx,
        }
    }

    pub fn is_typescript(self) -> bool {
        !matches!(self, SourceKind::Jsx)
    }

    fn syntax(self) -> Syntax {
        match self {
            SourceKind::Jsx => Syntax::Es(EsSyntax {
                jsx: true,
                ..Default::default()
            }),
            SourceKind::TypeScript => Syntax::Typescript(TsSyntax::default()),
            SourceKind::Tsx => Syntax::Typescript(TsSyntax {
                tsx: true,
                ..Default::default()
            }),
        }
    }
}

// -----------------------------------------------------------------------------
// Edits
// -----------------------------------------------------------------------------

/// Replace `range` (byte offsets into one text revision) with `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub range: Range<usize>,
    pub text: String,
}

impl Edit {
    pub fn replace(range: Range<usize>, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }

    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::replace(at..at, text)
    }

    pub fn delete(range: Range<usize>) -> Self {
        Self::replace(range, String::new())
    }
}

/// Applies `edits` to `text`. The edits must be pairwise disjoint; an insertion
/// sharing its offset with the start of a replacement lands before it.
pub fn splice(text: &str, mut edits: Vec<Edit>) -> Result<String> {
    edits.sort_by_key(|e| (e.range.start, e.range.end));
    for pair in edits.windows(2) {
        if pair[1].range.start < pair[0].range.end {
            return Err(Error::OverlappingEdits {
                first: pair[0].range.clone(),
                second: pair[1].range.clone(),
            });
        }
    }
    let mut out = text.to_string();
    // Outside-in: later offsets first, so earlier ones stay valid.
    for edit in edits.iter().rev() {
        out.replace_range(edit.range.clone(), &edit.text);
    }
    Ok(out)
}

// -----------------------------------------------------------------------------
// Parsed revision
// -----------------------------------------------------------------------------

pub struct Source {
    name: String,
    kind: SourceKind,
    text: String,
    cm: Lrc<SourceMap>,
    file: Lrc<SourceFile>,
    pub module: Module,
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("len", &self.text.len())
            .finish_non_exhaustive()
    }
}

impl Source {
    pub fn parse(name: impl Into<String>, kind: SourceKind, text: String) -> Result<Self> {
        let name = name.into();
        let cm: Lrc<SourceMap> = Default::default();
        let file = cm.new_source_file(FileName::Custom(name.clone()).into(), text.clone());

        let mut recovered = vec![];
        let parsed = parse_file_as_module(
            &file,
            kind.syntax(),
            EsVersion::latest(),
            None,
            &mut recovered,
        );
        let first_error = match parsed {
            Ok(module) if recovered.is_empty() => {
                return Ok(Self {
                    name,
                    kind,
                    text,
                    cm,
                    file,
                    module,
                })
            }
            Ok(_) => recovered.remove(0),
            Err(e) => e,
        };
        let (line, column) = line_col(&cm, first_error.span().lo);
        Err(Error::Parse {
            line,
            column,
            message: first_error.kind().msg().to_string(),
        })
    }

    /// Parses `text` as the next revision of the same file.
    pub fn reparse(&self, text: String) -> Result<Self> {
        Self::parse(self.name.clone(), self.kind, text)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    /// Line terminator of the file: `\r\n` when its first line ends that way.
    pub fn newline(&self) -> &'static str {
        match self.text.find('\n') {
            Some(nl) if self.text[..nl].ends_with('\r') => "\r\n",
            _ => "\n",
        }
    }

    pub fn offset(&self, pos: BytePos) -> usize {
        (pos.0 - self.file.start_pos.0) as usize
    }

    pub fn range(&self, span: Span) -> Range<usize> {
        self.offset(span.lo)..self.offset(span.hi)
    }

    /// Verbatim text covered by `span`.
    pub fn snippet(&self, span: Span) -> &str {
        &self.text[self.range(span)]
    }

    /// 1-based line, 0-based column of `pos`.
    pub fn location(&self, pos: BytePos) -> (usize, usize) {
        line_col(&self.cm, pos)
    }

    /// Leading whitespace of the line containing byte `offset`.
    pub fn line_indent(&self, offset: usize) -> &str {
        let start = line_start(&self.text, offset);
        let line = &self.text[start..];
        let end = line
            .find(|c: char| c != ' ' && c != '\t')
            .unwrap_or(line.len());
        &line[..end]
    }

    /// Indentation that lines up with `offset`: the text before it on its line
    /// when that is all whitespace, otherwise as many spaces as its column.
    pub fn indent_at(&self, offset: usize) -> String {
        let prefix = &self.text[line_start(&self.text, offset)..offset];
        if prefix.chars().all(|c| c == ' ' || c == '\t') {
            prefix.to_string()
        } else {
            " ".repeat(prefix.chars().count())
        }
    }

    /// Byte range removing the statement at `span` as a whole: a trailing `;`
    /// left outside the span, the remainder of the line when it is blank, and
    /// a blank line that would otherwise be doubled.
    pub fn statement_removal(&self, span: Span) -> Range<usize> {
        let text = self.text.as_str();
        let Range { mut start, mut end } = self.range(span);

        let rest = &text[end..];
        let trimmed = rest.trim_start_matches([' ', '\t']);
        if trimmed.starts_with(';') {
            end += rest.len() - trimmed.len() + 1;
        }

        let begin_of_line = line_start(text, start);
        let starts_line = text[begin_of_line..start]
            .chars()
            .all(|c| c == ' ' || c == '\t');
        let rest = &text[end..];
        let ends_line = match rest.find('\n') {
            Some(nl) if rest[..nl].trim().is_empty() => {
                end += nl + 1;
                true
            }
            None if rest.trim().is_empty() => {
                end = text.len();
                true
            }
            _ => false,
        };
        if !(starts_line && ends_line) {
            return start..end;
        }
        start = begin_of_line;

        let preceded_by_blank = start == 0 || text[..start].ends_with("\n\n") || {
            let before = &text[..start.saturating_sub(1)];
            before[line_start(before, before.len())..].trim().is_empty()
        };
        if preceded_by_blank {
            let rest = &text[end..];
            if let Some(nl) = rest.find('\n') {
                if rest[..nl].trim().is_empty() {
                    end += nl + 1;
                }
            }
        }
        start..end
    }
}

fn line_start(text: &str, offset: usize) -> usize {
    text[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

fn line_col(cm: &SourceMap, pos: BytePos) -> (usize, usize) {
    let loc = cm.lookup_char_pos(pos);
    (loc.line, loc.col.0)
}
