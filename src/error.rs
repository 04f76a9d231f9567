//! Error types and source-line context for nested INI parsing
//!
//! Every failure raised while a document is being parsed carries the 1-based
//! line number of the offending logical line, so that callers can point the
//! user at the exact place in the source text.

use std::fmt;
use thiserror::Error;

/// Context information for rendering an error against its source text
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// The original source text
    pub source: String,
    /// The 1-based line the error refers to
    pub line: usize,
    /// Suggested fixes for the error
    pub suggestions: Vec<String>,
    /// Additional help text
    pub help: Option<String>,
}

impl ErrorContext {
    /// Creates a new error context for a line
    pub fn for_line(source: impl Into<String>, line: usize) -> Self {
        Self {
            source: source.into(),
            line,
            suggestions: Vec::new(),
            help: None,
        }
    }

    /// Adds a suggestion for fixing the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Adds help text for the error
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Extracts lines around the error line with context
    pub fn extract_lines_around(&self, context_lines: usize) -> String {
        let lines: Vec<&str> = self.source.lines().collect();
        if lines.is_empty() || self.line == 0 || self.line > lines.len() {
            return String::new();
        }

        let error_index = self.line - 1;
        let context_start = error_index.saturating_sub(context_lines);
        let context_end = (error_index + context_lines + 1).min(lines.len());
        let width = context_end.to_string().len();

        let mut result = String::new();
        for (i, line) in lines[context_start..context_end].iter().enumerate() {
            let line_num = context_start + i + 1;
            result.push_str(&format!("{:width$} | {}\n", line_num, line, width = width));

            if line_num == self.line {
                let indent = line.len() - line.trim_start().len();
                let carets = "^".repeat(line.trim().chars().count().max(1));
                result.push_str(&format!(
                    "{}{}  <-- Error here\n",
                    " ".repeat(width + 3 + indent),
                    carets
                ));
            }
        }

        result
    }

    /// Formats the error context for display
    pub fn format_error(&self, error_message: &str) -> String {
        let mut output = format!("Error at line {}: {}\n\n", self.line, error_message);
        output.push_str(&self.extract_lines_around(2));

        if !self.suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        if let Some(help) = &self.help {
            output.push_str(&format!("\nHelp: {}\n", help));
        }

        output
    }
}

/// Main error type for configuration operations
#[derive(Debug, Error)]
pub enum IniError {
    /// Malformed document structure
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// A value could not be constructed as its annotated type
    #[error("Cast error: {0}")]
    Cast(#[from] CastError),

    /// An annotation names a type that the registry does not permit
    #[error("Unknown type '{name}' at line {line}")]
    UnknownType { name: String, line: usize },

    /// An interpolation placeholder names a path absent from the tree
    #[error("Unresolved reference '{{{path}}}' at line {line}: {reason}")]
    Reference {
        path: String,
        line: usize,
        reason: String,
    },

    /// The input source cannot supply lines
    #[error("Input cannot be read line by line: {message}")]
    InputCapability { message: String },

    /// Serde bridge error
    #[error("Serde error: {0}")]
    Serde(#[from] SerdeError),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IniError {
    /// Returns the source line the error refers to, if it has one
    pub fn line(&self) -> Option<usize> {
        match self {
            IniError::Parse(e) => Some(e.line()),
            IniError::Cast(e) => Some(e.line),
            IniError::UnknownType { line, .. } | IniError::Reference { line, .. } => Some(*line),
            IniError::InputCapability { .. } | IniError::Serde(_) | IniError::Io(_) => None,
        }
    }

    /// Renders the error against the source text it was produced from
    pub fn render(&self, source: &str) -> String {
        let message = self.to_string();
        let Some(line) = self.line() else {
            return message;
        };

        let context = ErrorContext::for_line(source, line);
        let context = match self {
            IniError::Parse(ParseError::MalformedAnnotation { .. }) => context
                .with_suggestion("Write annotations as '(name) key' or '(name<element>) key'"),
            IniError::Parse(ParseError::InconsistentDedent { .. }) => context.with_help(
                "A dedented line must align with an enclosing section header or its body",
            ),
            IniError::UnknownType { .. } => context.with_help(
                "Only built-in types are allowed in safe mode; register an external constructor and parse unsafely to use others",
            ),
            IniError::Reference { .. } => context.with_suggestion(
                "Escape a literal closing brace with a backslash: '\\}'",
            ),
            _ => context,
        };
        context.format_error(&message)
    }
}

/// Structural errors in the document text
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// A bracketed line that does not name a section
    #[error("Malformed section header '{text}' at line {line}")]
    MalformedHeader { text: String, line: usize },

    /// Unbalanced or otherwise invalid type annotation
    #[error("Malformed type annotation '{text}' at line {line}: {message}")]
    MalformedAnnotation {
        text: String,
        message: String,
        line: usize,
    },

    /// Assignment without a key
    #[error("Empty key at line {line}")]
    EmptyKey { line: usize },

    /// Annotated key that is not followed by '=' or ':'
    #[error("Annotated key '{key}' has no '=' or ':' at line {line}")]
    MissingDelimiter { key: String, line: usize },

    /// Dedent to a depth that matches no open scope
    #[error("Inconsistent dedent to column {depth} at line {line}")]
    InconsistentDedent { depth: usize, line: usize },

    /// An open scope no longer resolves to a section
    #[error("Scope '{path}' is no longer a section at line {line}")]
    ScopeLost { path: String, line: usize },
}

impl ParseError {
    /// Returns the line the error was raised on
    pub fn line(&self) -> usize {
        match self {
            ParseError::MalformedHeader { line, .. }
            | ParseError::MalformedAnnotation { line, .. }
            | ParseError::EmptyKey { line }
            | ParseError::MissingDelimiter { line, .. }
            | ParseError::InconsistentDedent { line, .. }
            | ParseError::ScopeLost { line, .. } => *line,
        }
    }
}

/// A value that could not be constructed as its annotated type
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Cannot cast '{value}' to '{type_name}' for key '{key}' at line {line}: {message}")]
pub struct CastError {
    pub key: String,
    pub type_name: String,
    pub value: String,
    pub message: String,
    pub line: usize,
}

/// Serde integration errors
#[derive(Debug, Error)]
pub enum SerdeError {
    /// Custom serde error message
    #[error("{0}")]
    Custom(String),

    /// Type mismatch during deserialization
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },
}

impl serde::de::Error for IniError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        IniError::Serde(SerdeError::Custom(msg.to_string()))
    }
}

impl serde::de::Error for SerdeError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        SerdeError::Custom(msg.to_string())
    }
}
