//! Line classification and type annotation parsing
//!
//! A logical line is a section header (`[name]`), an assignment
//! (`(type) key = value` or `key : value`), or plain text that the parser
//! treats as a continuation or a valueless key depending on indentation.

use crate::error::ParseError;
use std::fmt;

/// A parsed `name` or `name<element>` annotation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    pub name: String,
    pub element: Option<Box<TypeDescriptor>>,
}

impl TypeDescriptor {
    /// Creates a descriptor without an element type
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            element: None,
        }
    }

    /// Creates a generic descriptor
    pub fn generic(name: impl Into<String>, element: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            element: Some(Box::new(element)),
        }
    }

    /// Parses annotation text such as `list<int>`
    ///
    /// `line` is only used for error reporting.
    pub fn parse(text: &str, line: usize) -> Result<Self, ParseError> {
        let malformed = |message: &str| ParseError::MalformedAnnotation {
            text: text.to_string(),
            message: message.to_string(),
            line,
        };

        let mut cursor = DescriptorCursor {
            chars: text.trim().chars().collect(),
            pos: 0,
        };
        let descriptor = cursor.descriptor().map_err(|m| malformed(&m))?;
        cursor.skip_whitespace();
        if cursor.pos != cursor.chars.len() {
            return Err(malformed("unexpected trailing characters"));
        }
        Ok(descriptor)
    }

    /// Nesting depth, 1 for a plain name
    pub fn depth(&self) -> usize {
        1 + self.element.as_ref().map_or(0, |e| e.depth())
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.element {
            Some(element) => write!(f, "{}<{}>", self.name, element),
            None => write!(f, "{}", self.name),
        }
    }
}

struct DescriptorCursor {
    chars: Vec<char>,
    pos: usize,
}

impl DescriptorCursor {
    fn skip_whitespace(&mut self) {
        while self.chars.get(self.pos).is_some_and(|c| c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn descriptor(&mut self) -> Result<TypeDescriptor, String> {
        self.skip_whitespace();
        let start = self.pos;
        while self
            .chars
            .get(self.pos)
            .is_some_and(|&c| c.is_alphanumeric() || c == '_' || c == '.')
        {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(match self.chars.get(self.pos) {
                Some(c) => format!("expected a type name, found '{}'", c),
                None => "expected a type name".to_string(),
            });
        }
        let name: String = self.chars[start..self.pos].iter().collect();

        self.skip_whitespace();
        if self.chars.get(self.pos) != Some(&'<') {
            return Ok(TypeDescriptor::new(name));
        }
        self.pos += 1;
        let element = self.descriptor()?;
        self.skip_whitespace();
        if self.chars.get(self.pos) != Some(&'>') {
            return Err(format!("unclosed '<' after '{}'", name));
        }
        self.pos += 1;
        Ok(TypeDescriptor::generic(name, element))
    }
}

/// Classification of one logical line
#[derive(Debug, Clone, PartialEq)]
pub enum LineKind {
    /// `[name]`
    Header(String),
    /// `(type) key = value`
    Assignment {
        descriptor: Option<TypeDescriptor>,
        key: String,
        value: String,
    },
    /// Text with neither brackets nor a delimiter
    Plain(String),
}

/// Returns true for characters that separate a key from its value
pub fn is_assignment_delimiter(c: char) -> bool {
    c == '=' || c == ':'
}

/// Classifies a trimmed logical line
pub fn classify(text: &str, line: usize) -> Result<LineKind, ParseError> {
    if text.starts_with('[') && text.ends_with(']') {
        let name = text[1..text.len() - 1].trim();
        if name.is_empty() {
            return Err(ParseError::MalformedHeader {
                text: text.to_string(),
                line,
            });
        }
        return Ok(LineKind::Header(name.to_string()));
    }

    let (annotation, rest) = split_annotation(text, line)?;

    let Some(split) = rest.find(is_assignment_delimiter) else {
        return Ok(LineKind::Plain(text.to_string()));
    };

    let key = rest[..split].trim();
    if key.is_empty() {
        return Err(ParseError::EmptyKey { line });
    }
    let value = rest[split + 1..].trim();

    let descriptor = annotation
        .map(|a| TypeDescriptor::parse(a, line))
        .transpose()?;

    Ok(LineKind::Assignment {
        descriptor,
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Returns true if plain text opens with a well-formed `(annotation)`
pub fn starts_with_annotation(text: &str) -> bool {
    text.strip_prefix('(')
        .and_then(|inner| inner.find(')').map(|close| &inner[..close]))
        .is_some_and(|annotation| TypeDescriptor::parse(annotation, 0).is_ok())
}

/// Separates a leading `(annotation)` from the rest of the line
///
/// A line that opens a parenthesis without closing it is only malformed when
/// it is an assignment; otherwise it is returned untouched as plain text.
fn split_annotation(text: &str, line: usize) -> Result<(Option<&str>, &str), ParseError> {
    let Some(inner) = text.strip_prefix('(') else {
        return Ok((None, text));
    };

    match inner.find(')') {
        Some(close) => {
            let annotation = &inner[..close];
            if annotation.contains('(') {
                return Err(ParseError::MalformedAnnotation {
                    text: annotation.to_string(),
                    message: "nested '(' in annotation".to_string(),
                    line,
                });
            }
            Ok((Some(annotation), &inner[close + 1..]))
        }
        None if text.contains(is_assignment_delimiter) => Err(ParseError::MalformedAnnotation {
            text: text.to_string(),
            message: "missing ')'".to_string(),
            line,
        }),
        None => Ok((None, text)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_plain() {
        let d = TypeDescriptor::parse("int", 1).unwrap();
        assert_eq!(d, TypeDescriptor::new("int"));
        assert_eq!(d.depth(), 1);
    }

    #[test]
    fn test_descriptor_nested() {
        let d = TypeDescriptor::parse(" list < set<int> > ", 1).unwrap();
        assert_eq!(
            d,
            TypeDescriptor::generic(
                "list",
                TypeDescriptor::generic("set", TypeDescriptor::new("int"))
            )
        );
        assert_eq!(d.to_string(), "list<set<int>>");
        assert_eq!(d.depth(), 3);
    }

    #[test]
    fn test_descriptor_dotted_name() {
        let d = TypeDescriptor::parse("some.external.Type", 4).unwrap();
        assert_eq!(d.name, "some.external.Type");
    }

    #[test]
    fn test_descriptor_unbalanced() {
        for text in ["list<int", "list<int>>", "<int>", "", "list<>"] {
            let err = TypeDescriptor::parse(text, 3).unwrap_err();
            assert!(
                matches!(err, ParseError::MalformedAnnotation { line: 3, .. }),
                "{text:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_classify_header() {
        assert_eq!(
            classify("[ Simple Values ]", 1).unwrap(),
            LineKind::Header("Simple Values".to_string())
        );
        assert!(matches!(
            classify("[]", 1),
            Err(ParseError::MalformedHeader { .. })
        ));
    }

    #[test]
    fn test_classify_assignments() {
        assert_eq!(
            classify("spaces in keys = allowed", 1).unwrap(),
            LineKind::Assignment {
                descriptor: None,
                key: "spaces in keys".to_string(),
                value: "allowed".to_string(),
            }
        );
        assert_eq!(
            classify("you can also use : to delimit keys from values", 1).unwrap(),
            LineKind::Assignment {
                descriptor: None,
                key: "you can also use".to_string(),
                value: "to delimit keys from values".to_string(),
            }
        );
        assert_eq!(
            classify("(list<int>) a = 1,2,3", 1).unwrap(),
            LineKind::Assignment {
                descriptor: Some(TypeDescriptor::generic("list", TypeDescriptor::new("int"))),
                key: "a".to_string(),
                value: "1,2,3".to_string(),
            }
        );
    }

    #[test]
    fn test_classify_value_keeps_later_delimiters() {
        match classify("url = http://host:80/a=b", 1).unwrap() {
            LineKind::Assignment { key, value, .. } => {
                assert_eq!(key, "url");
                assert_eq!(value, "http://host:80/a=b");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_classify_empty_value() {
        match classify("empty string value here =", 1).unwrap() {
            LineKind::Assignment { value, .. } => assert!(value.is_empty()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_classify_plain_and_errors() {
        assert_eq!(
            classify("key_without_value", 1).unwrap(),
            LineKind::Plain("key_without_value".to_string())
        );
        assert_eq!(
            classify("(just a note", 1).unwrap(),
            LineKind::Plain("(just a note".to_string())
        );
        assert!(matches!(
            classify("(int a = 1", 2),
            Err(ParseError::MalformedAnnotation { line: 2, .. })
        ));
        assert_eq!(
            classify("(int) a", 2).unwrap(),
            LineKind::Plain("(int) a".to_string())
        );
        assert!(starts_with_annotation("(int) a"));
        assert!(!starts_with_annotation("(just a note"));
        assert!(!starts_with_annotation("(two words) here"));
        assert!(matches!(
            classify("= value", 5),
            Err(ParseError::EmptyKey { line: 5 })
        ));
    }
}
