//! Parse-time `{path}` interpolation
//!
//! A placeholder names an absolute, colon-delimited path from the tree root,
//! e.g. `{section:sub:key}`. It is replaced by the rendered value of that
//! entry as it stands when the referencing line is read.
//!
//! Escaping applies to closing braces only. A run of `n` backslashes directly
//! before `}`:
//! - odd `n`: the brace is literal and one backslash is dropped;
//! - even `n`: `n / 2` backslashes are kept and the brace closes the
//!   placeholder. With no placeholder open the brace is literal.
//!
//! A `{` that never meets a closing brace is literal text.

use crate::error::IniError;
use crate::parser::ParserConfig;
use crate::value::{Node, Section};

/// Resolves placeholder paths to replacement text
pub trait ReferenceResolver {
    /// Returns the text for `path`, or a reason it cannot be resolved
    fn resolve(&self, path: &[&str]) -> Result<String, String>;
}

/// Resolves paths against a configuration tree
pub struct TreeResolver<'a> {
    root: &'a Section,
    config: &'a ParserConfig,
}

impl<'a> TreeResolver<'a> {
    pub fn new(root: &'a Section, config: &'a ParserConfig) -> Self {
        Self { root, config }
    }
}

impl ReferenceResolver for TreeResolver<'_> {
    fn resolve(&self, path: &[&str]) -> Result<String, String> {
        let mut section = self.root;
        for (i, segment) in path.iter().enumerate() {
            let last = i + 1 == path.len();
            match section.get(segment) {
                None => return Err(format!("'{}' not found", segment)),
                Some(Node::Section(inner)) if !last => section = inner,
                Some(Node::Section(_)) => return Err(format!("'{}' is a section", segment)),
                Some(Node::Entry(entry)) if last => return Ok(entry.value.render(self.config)),
                Some(Node::Entry(_)) => return Err(format!("'{}' is not a section", segment)),
            }
        }
        Err("empty path".to_string())
    }
}

/// Substitutes every placeholder in `text`
pub fn interpolate(
    text: &str,
    resolver: &dyn ReferenceResolver,
    line: usize,
) -> Result<String, IniError> {
    if !text.contains(['{', '}']) {
        return Ok(text.to_string());
    }

    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '\\' => {
                let run = backslash_run(&chars, i);
                i += run;
                if chars.get(i) == Some(&'}') {
                    let kept = if run % 2 == 1 { run - 1 } else { run / 2 };
                    push_backslashes(&mut out, kept);
                    out.push('}');
                    i += 1;
                } else {
                    push_backslashes(&mut out, run);
                }
            }
            '{' => match scan_placeholder(&chars, i + 1) {
                Some((path, next)) => {
                    let segments: Vec<&str> = path.split(':').map(str::trim).collect();
                    let value =
                        resolver
                            .resolve(&segments)
                            .map_err(|reason| IniError::Reference {
                                path: path.clone(),
                                line,
                                reason,
                            })?;
                    out.push_str(&value);
                    i = next;
                }
                None => {
                    out.push('{');
                    i += 1;
                }
            },
            c => {
                out.push(c);
                i += 1;
            }
        }
    }

    Ok(out)
}

/// Escapes text so that interpolation reproduces it unchanged
///
/// Every `}` is given a backslash run that reads back as the run it had. An
/// even run `k` is written as the odd run `k + 1`. An odd run `k` needs the
/// even run `2 * k`, which would close a placeholder, so it is only used
/// while no `{` has been seen; after one the run is kept and loses a
/// backslash on reading.
pub fn escape(text: &str) -> String {
    if !text.contains('}') {
        return text.to_string();
    }

    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 4);
    let mut opened = false;
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '\\' => {
                let run = backslash_run(&chars, i);
                i += run;
                if chars.get(i) == Some(&'}') {
                    let encoded = match (run % 2, opened) {
                        (0, _) => run + 1,
                        (_, false) => run * 2,
                        (_, true) => run,
                    };
                    push_backslashes(&mut out, encoded);
                    out.push('}');
                    i += 1;
                } else {
                    push_backslashes(&mut out, run);
                }
            }
            '}' => {
                out.push_str("\\}");
                i += 1;
            }
            c => {
                opened |= c == '{';
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

fn backslash_run(chars: &[char], start: usize) -> usize {
    chars[start..].iter().take_while(|&&c| c == '\\').count()
}

fn push_backslashes(out: &mut String, count: usize) {
    out.extend(std::iter::repeat_n('\\', count));
}

/// Reads a placeholder body starting after `{`
///
/// Returns the path and the index after the closing brace, or `None` if the
/// placeholder never closes.
fn scan_placeholder(chars: &[char], start: usize) -> Option<(String, usize)> {
    let mut path = String::new();
    let mut i = start;

    while i < chars.len() {
        match chars[i] {
            '\\' => {
                let run = backslash_run(chars, i);
                i += run;
                if chars.get(i) == Some(&'}') {
                    if run % 2 == 1 {
                        push_backslashes(&mut path, run - 1);
                        path.push('}');
                        i += 1;
                    } else {
                        push_backslashes(&mut path, run / 2);
                        return Some((path, i + 1));
                    }
                } else {
                    push_backslashes(&mut path, run);
                }
            }
            '}' => return Some((path, i + 1)),
            c => {
                path.push(c);
                i += 1;
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Section;

    fn tree() -> Section {
        Section::new()
            .with_value("base", "X")
            .with_value("a", "something")
            .with_section("section", Section::new().with_value("c", "example"))
            .with_value("nums", vec![2, 3, 4])
    }

    fn run(text: &str) -> Result<String, IniError> {
        let root = tree();
        let config = ParserConfig::default();
        interpolate(text, &TreeResolver::new(&root, &config), 1)
    }

    #[test]
    fn test_simple_substitution() {
        assert_eq!(run("{base}Y").unwrap(), "XY");
        assert_eq!(run("{a} else").unwrap(), "something else");
        assert_eq!(run("{section:c} proven").unwrap(), "example proven");
        assert_eq!(run("{ section : c }").unwrap(), "example");
    }

    #[test]
    fn test_multiple_placeholders() {
        assert_eq!(run("{base}-{a}-{base}").unwrap(), "X-something-X");
    }

    #[test]
    fn test_typed_value_rendered() {
        assert_eq!(run("[{nums}]").unwrap(), "[2, 3, 4]");
    }

    #[test]
    fn test_escaped_brace_is_literal() {
        assert_eq!(run(r"{base\}").unwrap(), "{base}");
        assert_eq!(run(r"\{header:a:okay\} else").unwrap(), r"\{header:a:okay} else");
    }

    #[test]
    fn test_escape_runs() {
        // three backslashes: literal brace, two remain
        assert_eq!(run(r"{base\\\}").unwrap(), r"{base\\}");
        // an even run outside a placeholder is halved
        assert_eq!(run(r"a\\}").unwrap(), r"a\}");
        assert_eq!(run(r"a\\\\}b").unwrap(), r"a\\}b");
    }

    #[test]
    fn test_even_run_closes_placeholder() {
        let err = run(r"{base\\}").unwrap_err();
        match err {
            IniError::Reference { path, .. } => assert_eq!(path, r"base\"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_unclosed_brace_is_literal() {
        assert_eq!(run("{not closed").unwrap(), "{not closed");
    }

    #[test]
    fn test_unresolvable_reference() {
        for text in ["{missing}", "{section:missing}", "{section}", "{a:b}", "{}"] {
            assert!(
                matches!(run(text), Err(IniError::Reference { line: 1, .. })),
                "{text}"
            );
        }
    }

    #[test]
    fn test_escape_round_trips() {
        for text in [
            "{literal}",
            r"a\\}b",
            r"a\}b",
            r"x\\\}",
            "plain",
            "}{}",
            "{base}",
            r"{even\\}",
        ] {
            let escaped = escape(text);
            assert_eq!(run(&escaped).unwrap(), text, "{text}");
        }
    }
}
