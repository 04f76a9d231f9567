//! Nested INI parser: scope stack, merge policy and the configuration handle
//!
//! Parsing is a single pass over logical lines. Open sections are kept on an
//! explicit stack keyed by indentation column:
//!
//! - a header at column `D` closes every open section at column `D` or deeper,
//!   then opens its own section inside whatever remains on top;
//! - a key at column `D` closes every open section deeper than `D`, so a key
//!   aligned with the header above it belongs to that header;
//! - plain text indented deeper than the pending key continues its value.
//!
//! Every parse call merges into the existing tree. The first failure aborts the
//! call and leaves the lines already applied in place.

use crate::error::{CastError, IniError, ParseError};
use crate::interpolate::{TreeResolver, interpolate};
use crate::reader::{LineReader, LineSource, ReaderSource, StrSource};
use crate::syntax::{self, LineKind, TypeDescriptor};
use crate::types::{self, CastFailure, Constructor, TypeRegistry};
use crate::value::{Displaced, Entry, Node, Section, Value};
use crate::writer;
use serde::de::DeserializeOwned;
use smallvec::{SmallVec, smallvec};
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, trace};

/// Configuration options for the parser and writer
#[derive(Debug, Clone, PartialEq)]
pub struct ParserConfig {
    /// Columns per tab when measuring indentation, and per nesting level when writing
    pub indent_size: usize,
    /// Separator between sequence items
    pub delimiter: String,
    /// Text placed between continuation lines of one value
    pub join: String,
    /// Value given to a key that appears without a delimiter
    pub default_value: Value,
    /// Restrict casting to built-in types
    pub safe: bool,
    /// Separator between key and value inside mapping items
    pub map_separator: String,
    /// Strip `#`/`;` comments that follow content on the same line
    pub inline_comments: bool,
    /// Reject dedents that do not line up with an open section
    pub strict_indentation: bool,
    /// Remove one pair of matching quotes around untyped values and sequence items
    pub strip_quotes: bool,
}

impl ParserConfig {
    /// Creates a new parser configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the indent unit; zero is treated as one
    pub fn with_indent_size(mut self, indent_size: usize) -> Self {
        self.indent_size = indent_size.max(1);
        self
    }

    /// Sets the sequence delimiter
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Sets the continuation join string
    pub fn with_join(mut self, join: impl Into<String>) -> Self {
        self.join = join.into();
        self
    }

    /// Sets the value of valueless keys
    pub fn with_default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = value.into();
        self
    }

    /// Sets whether external types are refused
    pub fn with_safe(mut self, safe: bool) -> Self {
        self.safe = safe;
        self
    }

    /// Sets the mapping key/value separator
    pub fn with_map_separator(mut self, separator: impl Into<String>) -> Self {
        self.map_separator = separator.into();
        self
    }

    /// Sets whether inline comments are stripped
    pub fn with_inline_comments(mut self, enabled: bool) -> Self {
        self.inline_comments = enabled;
        self
    }

    /// Sets whether dedents are checked against open sections
    pub fn with_strict_indentation(mut self, strict: bool) -> Self {
        self.strict_indentation = strict;
        self
    }

    /// Sets whether surrounding quotes are stripped
    pub fn with_strip_quotes(mut self, strip: bool) -> Self {
        self.strip_quotes = strip;
        self
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            indent_size: 4,
            delimiter: ",".to_string(),
            join: "\n".to_string(),
            default_value: Value::Boolean(true),
            safe: true,
            map_separator: ":".to_string(),
            inline_comments: false,
            strict_indentation: false,
            strip_quotes: true,
        }
    }
}

/// An open section on the scope stack
#[derive(Debug, Clone)]
struct Frame {
    depth: usize,
    /// `None` only for the root
    name: Option<String>,
    /// Column of the first line placed inside this section
    body_depth: Option<usize>,
}

struct ScopeStack {
    frames: SmallVec<[Frame; 8]>,
    last_depth: usize,
    strict: bool,
}

impl ScopeStack {
    fn new(strict: bool) -> Self {
        Self {
            frames: smallvec![Frame {
                depth: 0,
                name: None,
                body_depth: None,
            }],
            last_depth: 0,
            strict,
        }
    }

    fn check_dedent(&self, depth: usize, line: usize) -> Result<(), ParseError> {
        if !self.strict || depth >= self.last_depth {
            return Ok(());
        }
        let aligned = self
            .frames
            .iter()
            .any(|f| f.depth == depth || f.body_depth == Some(depth));
        if aligned {
            Ok(())
        } else {
            Err(ParseError::InconsistentDedent { depth, line })
        }
    }

    /// Pops sections that a line at `depth` closes
    ///
    /// Headers close sections at their own column, keys only deeper ones.
    fn close(&mut self, depth: usize, inclusive: bool) {
        while self.frames.len() > 1 {
            let Some(top) = self.frames.last() else {
                break;
            };
            let closes = if inclusive {
                top.depth >= depth
            } else {
                top.depth > depth
            };
            if !closes {
                break;
            }
            if let Some(frame) = self.frames.pop() {
                trace!(section = ?frame.name, depth = frame.depth, "closed section");
            }
        }
    }

    /// Records a line at `depth` as placed inside the top section
    fn enter(&mut self, depth: usize) {
        if let Some(top) = self.frames.last_mut() {
            top.body_depth.get_or_insert(depth);
        }
        self.last_depth = depth;
    }

    fn push(&mut self, name: String, depth: usize) {
        trace!(section = %name, depth, "opened section");
        self.frames.push(Frame {
            depth,
            name: Some(name),
            body_depth: None,
        });
    }

    fn path(&self) -> Vec<String> {
        self.frames.iter().filter_map(|f| f.name.clone()).collect()
    }
}

/// A key whose value may still grow through continuation lines
struct PendingEntry {
    key: String,
    descriptor: Option<TypeDescriptor>,
    raw: String,
    depth: usize,
    line: usize,
    scope: Vec<String>,
}

impl PendingEntry {
    fn extend(&mut self, text: &str, join: &str) {
        if !self.raw.is_empty() {
            self.raw.push_str(join);
        }
        self.raw.push_str(text);
    }
}

/// A parsed configuration: the tree plus the options and types used to build it
///
/// # Examples
///
/// ```rust
/// use nested_ini::{Config, Value};
///
/// let config: Config = "[server]\n    (int) port = 8080\n    host = localhost"
///     .parse()
///     .unwrap();
///
/// assert_eq!(config.get_value("server:port"), Some(&Value::Integer(8080)));
/// assert_eq!(config.get_value_or("server:timeout", 30), Value::Integer(30));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Config {
    root: Section,
    config: ParserConfig,
    registry: TypeRegistry,
}

impl Config {
    /// Creates an empty configuration with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty configuration with the given options
    pub fn with_config(config: ParserConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Creates a configuration seeded with an existing tree
    pub fn from_section(section: Section, config: ParserConfig) -> Self {
        Self {
            root: section,
            config,
            registry: TypeRegistry::new(),
        }
    }

    /// Returns the parser options
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Returns the type registry
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Returns the type registry for registering external constructors
    pub fn registry_mut(&mut self) -> &mut TypeRegistry {
        &mut self.registry
    }

    /// Registers an external constructor, usable when parsing unsafely
    pub fn register_type(
        &mut self,
        name: impl Into<String>,
        constructor: impl Constructor + 'static,
    ) -> &mut Self {
        self.registry.register(name, constructor);
        self
    }

    /// Parses text into this configuration
    pub fn parse_str(&mut self, text: &str) -> Result<(), IniError> {
        self.parse_with(StrSource::new(text), None)
    }

    /// Parses a buffered reader into this configuration
    pub fn parse_reader<R: BufRead>(&mut self, reader: R) -> Result<(), IniError> {
        self.parse_with(ReaderSource::new(reader), None)
    }

    /// Parses any line source into this configuration
    pub fn parse_source<S: LineSource>(&mut self, source: S) -> Result<(), IniError> {
        self.parse_with(source, None)
    }

    /// Reads and parses a file, optionally overriding safe mode for this call
    pub fn read(&mut self, path: impl AsRef<Path>, safe: Option<bool>) -> Result<(), IniError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "reading configuration file");
        let file = File::open(path)?;
        self.parse_with(ReaderSource::new(BufReader::new(file)), safe)
    }

    /// Parses a line source, optionally overriding safe mode for this call
    pub fn parse_with<S: LineSource>(
        &mut self,
        source: S,
        safe: Option<bool>,
    ) -> Result<(), IniError> {
        let safe = safe.unwrap_or(self.config.safe);
        let mut reader =
            LineReader::new(source, self.config.indent_size, self.config.inline_comments);
        let mut scopes = ScopeStack::new(self.config.strict_indentation);
        let mut pending: Option<PendingEntry> = None;
        let mut lines = 0usize;
        let mut entries = 0usize;

        while let Some(raw) = reader.next_line()? {
            lines += 1;
            let kind = match syntax::classify(&raw.text, raw.line) {
                Ok(kind) => kind,
                Err(err) => {
                    // the pending entry was complete before this line
                    if let Some(entry) = pending.take() {
                        self.commit(entry, safe)?;
                    }
                    return Err(err.into());
                }
            };
            trace!(line = raw.line, depth = raw.depth, ?kind, "classified line");

            if let LineKind::Plain(text) = &kind {
                if let Some(entry) = pending.as_mut().filter(|p| raw.depth > p.depth) {
                    let text = self.interpolate(text, raw.line)?;
                    entry.extend(&text, &self.config.join);
                    continue;
                }
            }

            if let Some(entry) = pending.take() {
                self.commit(entry, safe)?;
                entries += 1;
            }

            scopes.check_dedent(raw.depth, raw.line)?;
            match kind {
                LineKind::Header(name) => {
                    scopes.close(raw.depth, true);
                    scopes.enter(raw.depth);
                    let parent = scope_section(&mut self.root, &scopes.path(), raw.line)?;
                    let (_, displaced) = parent.open_section(&name);
                    if displaced == Displaced::Entry {
                        debug!(section = %name, line = raw.line, "section replaced entry");
                    }
                    scopes.push(name, raw.depth);
                }
                LineKind::Assignment {
                    descriptor,
                    key,
                    value,
                } => {
                    scopes.close(raw.depth, false);
                    scopes.enter(raw.depth);
                    pending = Some(PendingEntry {
                        raw: self.interpolate(&value, raw.line)?,
                        key,
                        descriptor,
                        depth: raw.depth,
                        line: raw.line,
                        scope: scopes.path(),
                    });
                }
                LineKind::Plain(text) => {
                    if syntax::starts_with_annotation(&text) {
                        return Err(ParseError::MissingDelimiter {
                            key: text,
                            line: raw.line,
                        }
                        .into());
                    }
                    scopes.close(raw.depth, false);
                    scopes.enter(raw.depth);
                    let value = self.config.default_value.clone();
                    let entry = Entry {
                        raw: value.render(&self.config),
                        value,
                        descriptor: None,
                        line: Some(raw.line),
                    };
                    self.insert(&scopes.path(), text, entry, raw.line)?;
                    entries += 1;
                }
            }
        }

        if let Some(entry) = pending.take() {
            self.commit(entry, safe)?;
            entries += 1;
        }

        debug!(lines, entries, safe, "parsed configuration");
        Ok(())
    }

    fn interpolate(&self, text: &str, line: usize) -> Result<String, IniError> {
        interpolate(text, &TreeResolver::new(&self.root, &self.config), line)
    }

    fn commit(&mut self, pending: PendingEntry, safe: bool) -> Result<(), IniError> {
        let value = self.cast(&pending, safe)?;
        let entry = Entry {
            value,
            raw: pending.raw,
            descriptor: pending.descriptor,
            line: Some(pending.line),
        };
        self.insert(&pending.scope, pending.key, entry, pending.line)
    }

    fn cast(&self, pending: &PendingEntry, safe: bool) -> Result<Value, IniError> {
        let Some(descriptor) = &pending.descriptor else {
            return Ok(Value::String(
                types::unquote(&pending.raw, &self.config).to_string(),
            ));
        };

        self.registry
            .cast(descriptor, &pending.raw, &self.config, safe)
            .map_err(|failure| match failure {
                CastFailure::Invalid(message) => IniError::Cast(CastError {
                    key: pending.key.clone(),
                    type_name: descriptor.to_string(),
                    value: pending.raw.clone(),
                    message,
                    line: pending.line,
                }),
                CastFailure::UnknownType(name) => IniError::UnknownType {
                    name,
                    line: pending.line,
                },
            })
    }

    fn insert(
        &mut self,
        scope: &[String],
        key: String,
        entry: Entry,
        line: usize,
    ) -> Result<(), IniError> {
        let section = scope_section(&mut self.root, scope, line)?;
        if section.set_entry(key.clone(), entry) == Displaced::Section {
            debug!(key = %key, line, "entry replaced section");
        }
        Ok(())
    }

    /// Serializes the tree as configuration text
    pub fn write(&self) -> String {
        writer::write_section(&self.root, &self.config)
    }

    /// Writes the tree to a byte sink
    pub fn write_to<W: Write>(&self, mut out: W) -> Result<(), IniError> {
        out.write_all(self.write().as_bytes())?;
        out.flush()?;
        Ok(())
    }

    /// Writes the tree to a file, replacing its contents
    pub fn write_to_path(&self, path: impl AsRef<Path>) -> Result<(), IniError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "writing configuration file");
        self.write_to(io::BufWriter::new(File::create(path)?))
    }

    /// Looks up a colon-delimited path from the root
    pub fn get(&self, path: &str) -> Option<&Node> {
        let segments: Vec<&str> = path.split(':').collect();
        self.root.lookup(&segments)
    }

    /// Looks up the typed value of an entry
    pub fn get_value(&self, path: &str) -> Option<&Value> {
        self.get(path).and_then(Node::value)
    }

    /// Looks up an entry's value, falling back when any segment is absent
    ///
    /// A path naming a section also yields the fallback.
    pub fn get_value_or(&self, path: &str, fallback: impl Into<Value>) -> Value {
        match self.get_value(path) {
            Some(value) => value.clone(),
            None => fallback.into(),
        }
    }

    /// Returns a sub-section by path
    pub fn section(&self, path: &str) -> Option<&Section> {
        self.get(path).and_then(Node::as_section)
    }

    /// Returns true if the path names an entry or section
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Number of top-level keys
    pub fn len(&self) -> usize {
        self.root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Node> {
        self.root.iter()
    }

    pub fn keys(&self) -> indexmap::map::Keys<'_, String, Node> {
        self.root.keys()
    }

    pub fn values(&self) -> indexmap::map::Values<'_, String, Node> {
        self.root.values()
    }

    /// The root section
    pub fn root(&self) -> &Section {
        &self.root
    }

    /// The root section, for direct edits
    pub fn root_mut(&mut self) -> &mut Section {
        &mut self.root
    }

    /// A detached copy of the tree
    pub fn copy(&self) -> Section {
        self.root.clone()
    }

    /// Consumes the configuration and returns its tree
    pub fn into_section(self) -> Section {
        self.root
    }

    /// Merges a tree into this one with the same precedence as parsing
    pub fn update(&mut self, other: Section) {
        self.root.merge(other);
    }

    /// Deserializes the tree into a user type
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, IniError> {
        crate::deserializer::from_section(&self.root)
    }
}

fn scope_section<'a>(
    root: &'a mut Section,
    path: &[String],
    line: usize,
) -> Result<&'a mut Section, ParseError> {
    root.lookup_section_mut(path)
        .ok_or_else(|| ParseError::ScopeLost {
            path: path.join(":"),
            line,
        })
}

impl FromStr for Config {
    type Err = IniError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut config = Config::new();
        config.parse_str(s)?;
        Ok(config)
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.write())
    }
}

impl<'a> IntoIterator for &'a Config {
    type Item = (&'a String, &'a Node);
    type IntoIter = indexmap::map::Iter<'a, String, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.root.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Config {
        text.parse().unwrap()
    }

    fn keys(section: &Section) -> Vec<&str> {
        section.keys().map(String::as_str).collect()
    }

    #[test]
    fn test_untyped_and_typed_values() {
        let config = parse("y = 100000\n(int) x = 100000");
        assert_eq!(config.get_value("y"), Some(&Value::from("100000")));
        assert_eq!(config.get_value("x"), Some(&Value::Integer(100000)));
    }

    #[test]
    fn test_entry_records_source_details() {
        let config = parse("\n\n(list<int>) a = 1,2,3");
        let entry = config.get("a").and_then(Node::as_entry).unwrap();
        assert_eq!(entry.raw, "1,2,3");
        assert_eq!(entry.line, Some(3));
        assert_eq!(entry.descriptor.as_ref().map(|d| d.to_string()).as_deref(), Some("list<int>"));
    }

    #[test]
    fn test_keys_align_with_header_belong_to_it() {
        let config = parse("[a]\nk = 1\n[b]\n    k = 2");
        assert_eq!(config.get_value("a:k"), Some(&Value::from("1")));
        assert_eq!(config.get_value("b:k"), Some(&Value::from("2")));
        assert!(!config.contains("k"));
    }

    #[test]
    fn test_dedent_closes_deeper_sections() {
        let text = "[1]\n    [2]\n        [3]\n            deep = x\n    key = value";
        let config = parse(text);
        assert_eq!(config.get_value("1:2:key"), Some(&Value::from("value")));
        assert_eq!(config.get_value("1:2:3:deep"), Some(&Value::from("x")));
        assert!(!config.contains("1:2:3:key"));
    }

    #[test]
    fn test_sibling_header_closes_previous() {
        let config = parse("[a]\n    [b]\n    [c]\n        k = v");
        let a = config.section("a").unwrap();
        assert_eq!(keys(a), vec!["b", "c"]);
        assert_eq!(config.get_value("a:c:k"), Some(&Value::from("v")));
    }

    #[test]
    fn test_continuation_lines_join() {
        let config = parse("a = first\n    second\n    third\nb = next");
        assert_eq!(config.get_value("a"), Some(&Value::from("first\nsecond\nthird")));
        assert_eq!(config.get_value("b"), Some(&Value::from("next")));
    }

    #[test]
    fn test_empty_value_filled_by_continuation() {
        let config = parse("(list) c =\n    one,\n    two");
        assert_eq!(config.get_value("c"), Some(&Value::from(vec!["one", "two"])));
    }

    #[test]
    fn test_custom_join() {
        let mut config = Config::with_config(ParserConfig::new().with_join(" "));
        config.parse_str("a = one\n  two").unwrap();
        assert_eq!(config.get_value("a"), Some(&Value::from("one two")));
    }

    #[test]
    fn test_valueless_key_gets_default() {
        let config = parse("flag\n[s]\n    other");
        assert_eq!(config.get_value("flag"), Some(&Value::Boolean(true)));
        assert_eq!(config.get_value("s:other"), Some(&Value::Boolean(true)));

        let mut custom = Config::with_config(ParserConfig::new().with_default_value("on"));
        custom.parse_str("flag").unwrap();
        assert_eq!(custom.get_value("flag"), Some(&Value::from("on")));
    }

    #[test]
    fn test_annotated_key_without_delimiter() {
        let err = "(int) port".parse::<Config>().unwrap_err();
        assert!(matches!(
            err,
            IniError::Parse(ParseError::MissingDelimiter { line: 1, .. })
        ));
    }

    #[test]
    fn test_quotes_stripped_from_untyped_values() {
        let config = parse("a = \"  padded  \"\nb = 'single'\nc = \"mismatch'");
        assert_eq!(config.get_value("a"), Some(&Value::from("  padded  ")));
        assert_eq!(config.get_value("b"), Some(&Value::from("single")));
        assert_eq!(config.get_value("c"), Some(&Value::from("\"mismatch'")));

        let mut raw = Config::with_config(ParserConfig::new().with_strip_quotes(false));
        raw.parse_str("a = 'kept'").unwrap();
        assert_eq!(raw.get_value("a"), Some(&Value::from("'kept'")));
    }

    #[test]
    fn test_interpolation_uses_tree_so_far() {
        let config = parse("base = X\nderived = {base}Y\n[s]\n    n = {derived}!");
        assert_eq!(config.get_value("derived"), Some(&Value::from("XY")));
        assert_eq!(config.get_value("s:n"), Some(&Value::from("XY!")));
    }

    #[test]
    fn test_forward_reference_fails() {
        let err = "a = {b}\nb = 1".parse::<Config>().unwrap_err();
        assert!(matches!(err, IniError::Reference { line: 1, .. }));
    }

    #[test]
    fn test_failure_keeps_applied_lines() {
        let mut config = Config::new();
        let err = config
            .parse_str("a = 1\n[s]\n    b = 2\n(int) bad = nope\nc = 3")
            .unwrap_err();

        assert!(matches!(err, IniError::Cast(CastError { line: 4, .. })));
        assert!(config.contains("a"));
        assert!(config.contains("s:b"));
        assert!(!config.contains("c"));
    }

    #[test]
    fn test_repeated_parse_merges() {
        let mut config = parse("[s]\n    a = 1");
        config.parse_str("[s]\n    b = 2\n    a = 3").unwrap();
        let s = config.section("s").unwrap();
        assert_eq!(keys(s), vec!["a", "b"]);
        assert_eq!(config.get_value("s:a"), Some(&Value::from("3")));
    }

    #[test]
    fn test_header_replaces_entry() {
        let config = parse("key = 1\nother = 2\n[key]\n    inner = x");
        assert_eq!(keys(config.root()), vec!["other", "key"]);
        assert_eq!(config.get_value("key:inner"), Some(&Value::from("x")));
    }

    #[test]
    fn test_entry_replaces_section() {
        let seed = Section::new()
            .with_section("key", Section::new().with_value("inner", "x"))
            .with_value("other", 2);
        let mut config = Config::from_section(seed, ParserConfig::default());
        config.parse_str("key = flat").unwrap();
        assert_eq!(keys(config.root()), vec!["other", "key"]);
        assert_eq!(config.get_value("key"), Some(&Value::from("flat")));
        assert!(!config.contains("key:inner"));
    }

    #[test]
    fn test_strict_indentation() {
        let text = "[a]\n    [b]\n        k = 1\n      j = 2";
        assert!(text.parse::<Config>().is_ok());

        let mut strict = Config::with_config(ParserConfig::new().with_strict_indentation(true));
        let err = strict.parse_str(text).unwrap_err();
        assert!(matches!(
            err,
            IniError::Parse(ParseError::InconsistentDedent { depth: 6, line: 4 })
        ));

        let mut aligned = Config::with_config(ParserConfig::new().with_strict_indentation(true));
        aligned
            .parse_str("[a]\n    [b]\n        k = 1\n    j = 2\nz = 3")
            .unwrap();
        assert!(aligned.contains("a:b:j"));
    }

    #[test]
    fn test_safe_override_per_call() {
        let mut config = Config::new();
        config.register_type("demo.Upper", |raw: &str| -> Result<Value, String> {
            Ok(Value::String(raw.to_uppercase()))
        });

        let err = config.parse_str("(demo.Upper) v = x").unwrap_err();
        assert!(matches!(err, IniError::UnknownType { ref name, line: 1 } if name == "demo.Upper"));

        config
            .parse_with(StrSource::new("(demo.Upper) v = x"), Some(false))
            .unwrap();
        assert_eq!(config.get_value("v"), Some(&Value::from("X")));
        assert!(config.config().safe);
    }

    #[test]
    fn test_get_value_or_fallback() {
        let config = parse("[a]\n    [b]\n        present = yes");
        assert_eq!(config.get_value_or("a:b:missing", "fallback"), Value::from("fallback"));
        assert_eq!(config.get_value_or("x:b:missing", "fallback"), Value::from("fallback"));
        assert_eq!(config.get_value_or("a:b:present", "fallback"), Value::from("yes"));
    }

    #[test]
    fn test_update_and_copy() {
        let mut config = parse("a = 1\n[s]\n    x = 1");
        let snapshot = config.copy();
        config.update(Section::new().with_value("s", "flat").with_value("b", 2));

        assert_eq!(config.get_value("s"), Some(&Value::from("flat")));
        assert_eq!(config.get_value("b"), Some(&Value::Integer(2)));
        assert!(snapshot.lookup(&["s", "x"]).is_some());
    }

    #[test]
    fn test_seeded_config_is_interpolation_source() {
        let seed = Section::new().with_value("home", "/srv");
        let mut config = Config::from_section(seed, ParserConfig::default());
        config.parse_str("logs = {home}/logs").unwrap();
        assert_eq!(config.get_value("logs"), Some(&Value::from("/srv/logs")));
    }

    #[test]
    fn test_parse_reader_crlf() {
        let mut config = Config::new();
        config
            .parse_reader("[s]\r\n    (int) a = 1\r\n".as_bytes())
            .unwrap();
        assert_eq!(config.get_value("s:a"), Some(&Value::Integer(1)));
    }
}
