//! Line reader: turns text or a stream into indented logical lines
//!
//! Blank lines and full-line comments (`#` or `;` as the first non-blank
//! character) are dropped. Each surviving line carries its indentation
//! measured in columns, with a tab counting as one indent unit.

use crate::error::IniError;
use std::io::{self, BufRead};

/// A pull-style source of text lines
pub trait LineSource {
    /// Returns the next line without its terminator, or `None` at end of input
    fn read_line(&mut self) -> Result<Option<String>, IniError>;
}

impl<T: LineSource + ?Sized> LineSource for &mut T {
    fn read_line(&mut self) -> Result<Option<String>, IniError> {
        (**self).read_line()
    }
}

impl<T: LineSource + ?Sized> LineSource for Box<T> {
    fn read_line(&mut self) -> Result<Option<String>, IniError> {
        (**self).read_line()
    }
}

/// Lines of an in-memory string
pub struct StrSource<'a> {
    lines: std::str::Lines<'a>,
}

impl<'a> StrSource<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { lines: text.lines() }
    }
}

impl LineSource for StrSource<'_> {
    fn read_line(&mut self) -> Result<Option<String>, IniError> {
        Ok(self.lines.next().map(str::to_string))
    }
}

/// Lines of a buffered reader
pub struct ReaderSource<R: BufRead> {
    reader: R,
    buffer: String,
}

impl<R: BufRead> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: String::new(),
        }
    }
}

impl<R: BufRead> LineSource for ReaderSource<R> {
    fn read_line(&mut self) -> Result<Option<String>, IniError> {
        self.buffer.clear();
        let read = self.reader.read_line(&mut self.buffer).map_err(|e| match e.kind() {
            io::ErrorKind::Unsupported => IniError::InputCapability {
                message: e.to_string(),
            },
            _ => IniError::Io(e),
        })?;
        if read == 0 {
            return Ok(None);
        }

        let line = self.buffer.trim_end_matches('\n').trim_end_matches('\r');
        Ok(Some(line.to_string()))
    }
}

/// A non-blank, non-comment line of input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    /// Line content without indentation or trailing whitespace
    pub text: String,
    /// Indentation in columns
    pub depth: usize,
    /// 1-based source line number
    pub line: usize,
}

/// Lazily yields [`RawLine`]s from a [`LineSource`]
pub struct LineReader<S: LineSource> {
    source: S,
    indent_size: usize,
    inline_comments: bool,
    line_number: usize,
}

impl<S: LineSource> LineReader<S> {
    pub fn new(source: S, indent_size: usize, inline_comments: bool) -> Self {
        Self {
            source,
            indent_size,
            inline_comments,
            line_number: 0,
        }
    }

    /// Returns the next logical line, skipping blanks and comments
    pub fn next_line(&mut self) -> Result<Option<RawLine>, IniError> {
        while let Some(line) = self.source.read_line()? {
            self.line_number += 1;

            let body = line.trim_start();
            if body.is_empty() || body.starts_with('#') || body.starts_with(';') {
                continue;
            }

            let body = if self.inline_comments {
                strip_inline_comment(body)
            } else {
                body
            };
            let text = body.trim_end();
            if text.is_empty() {
                continue;
            }

            let indent = &line[..line.len() - line.trim_start().len()];
            return Ok(Some(RawLine {
                text: text.to_string(),
                depth: measure_indent(indent, self.indent_size),
                line: self.line_number,
            }));
        }
        Ok(None)
    }
}

impl<S: LineSource> Iterator for LineReader<S> {
    type Item = Result<RawLine, IniError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_line().transpose()
    }
}

/// Column width of leading whitespace
pub fn measure_indent(indent: &str, indent_size: usize) -> usize {
    indent
        .chars()
        .map(|c| if c == '\t' { indent_size } else { 1 })
        .sum()
}

/// Cuts a line at the first `#` or `;` that is outside quotes
///
/// A backslash escapes the following character, so `\"` does not open or
/// close a quoted run.
pub fn strip_inline_comment(line: &str) -> &str {
    let mut escape = false;
    let mut open_quote: Option<char> = None;

    for (i, c) in line.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        match c {
            '\\' => escape = true,
            '"' | '\'' => match open_quote {
                Some(q) if q == c => open_quote = None,
                None => open_quote = Some(c),
                Some(_) => {}
            },
            '#' | ';' if open_quote.is_none() => return &line[..i],
            _ => {}
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(text: &str, inline_comments: bool) -> Vec<RawLine> {
        LineReader::new(StrSource::new(text), 4, inline_comments)
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_skips_blank_lines_and_comments() {
        let lines = collect("\n# comment\n   ; another\n[section]\n\n  key = value\n", false);
        assert_eq!(
            lines,
            vec![
                RawLine {
                    text: "[section]".to_string(),
                    depth: 0,
                    line: 4
                },
                RawLine {
                    text: "key = value".to_string(),
                    depth: 2,
                    line: 6
                },
            ]
        );
    }

    #[test]
    fn test_tabs_count_as_indent_unit() {
        let lines = collect("\tkey = value\n \t x", false);
        assert_eq!(lines[0].depth, 4);
        assert_eq!(lines[1].depth, 6);
    }

    #[test]
    fn test_inline_comments_kept_by_default() {
        let lines = collect("a = value # not a comment", false);
        assert_eq!(lines[0].text, "a = value # not a comment");
    }

    #[test]
    fn test_inline_comments_stripped_when_enabled() {
        let lines = collect(
            "a = value # gone\nb = \"keep # this\" ; gone\n[HEADER] # nothing",
            true,
        );
        assert_eq!(lines[0].text, "a = value");
        assert_eq!(lines[1].text, "b = \"keep # this\"");
        assert_eq!(lines[2].text, "[HEADER]");
    }

    #[test]
    fn test_escaped_quote_does_not_close() {
        assert_eq!(
            strip_inline_comment(r#"e = "escaped \" quote # inside" # outside"#),
            r#"e = "escaped \" quote # inside" "#
        );
    }

    #[test]
    fn test_reader_source_strips_line_endings() {
        let mut source = ReaderSource::new("a = 1\r\nb = 2\nc = 3".as_bytes());
        assert_eq!(source.read_line().unwrap(), Some("a = 1".to_string()));
        assert_eq!(source.read_line().unwrap(), Some("b = 2".to_string()));
        assert_eq!(source.read_line().unwrap(), Some("c = 3".to_string()));
        assert_eq!(source.read_line().unwrap(), None);
    }

    struct Unreadable;

    impl io::Read for Unreadable {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Unsupported, "write-only handle"))
        }
    }

    #[test]
    fn test_unsupported_reader_is_capability_error() {
        let mut source = ReaderSource::new(io::BufReader::new(Unreadable));
        assert!(matches!(
            source.read_line(),
            Err(IniError::InputCapability { .. })
        ));
    }
}
