//! The configuration tree: typed values, entries and ordered sections
//!
//! A [`Section`] owns an insertion-ordered map from key to [`Node`]. A node is
//! either a leaf [`Entry`] or a nested [`Section`]; within one section a key
//! names exactly one of the two.

use crate::parser::ParserConfig;
use crate::syntax::TypeDescriptor;
use indexmap::{IndexMap, IndexSet};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// An object produced by an externally registered constructor
///
/// Implementors are opaque to the parser; the writer serializes them as
/// `(type_name) key = to_config_string()`.
pub trait ConfigObject: fmt::Debug + Send + Sync {
    /// The annotation name that reconstructs this object
    fn type_name(&self) -> &str;

    /// Text that the registered constructor accepts to rebuild this object
    fn to_config_string(&self) -> String;
}

/// A typed configuration value
#[derive(Debug, Clone)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    /// Encoded text from a `bytes` or `bytearray` annotation
    Bytes(Vec<u8>),
    /// Ordered sequence
    List(Vec<Value>),
    /// Sequence without duplicates, first occurrence order
    Set(Vec<Value>),
    /// Ordered mapping
    Map(IndexMap<String, Value>),
    /// Object built by an external constructor
    Object(Arc<dyn ConfigObject>),
}

impl Value {
    /// Returns true if the value is a string
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// Returns a reference to the string if this is a String variant
    pub fn as_str(&self) -> Option<&str> {
        if let Value::String(s) = self {
            Some(s.as_str())
        } else {
            None
        }
    }

    /// Returns the integer value if this is an Integer variant
    pub fn as_integer(&self) -> Option<i64> {
        if let Value::Integer(i) = self {
            Some(*i)
        } else {
            None
        }
    }

    /// Returns the float value if this is a Float variant
    pub fn as_float(&self) -> Option<f64> {
        if let Value::Float(f) = self {
            Some(*f)
        } else {
            None
        }
    }

    /// Returns the boolean value if this is a Boolean variant
    pub fn as_bool(&self) -> Option<bool> {
        if let Value::Boolean(b) = self {
            Some(*b)
        } else {
            None
        }
    }

    /// Returns the bytes if this is a Bytes variant
    pub fn as_bytes(&self) -> Option<&[u8]> {
        if let Value::Bytes(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }

    /// Returns the items of a List or Set
    pub fn as_slice(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) | Value::Set(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the mapping if this is a Map variant
    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        if let Value::Map(map) = self {
            Some(map)
        } else {
            None
        }
    }

    /// Returns the external object if this is an Object variant
    pub fn as_object(&self) -> Option<&Arc<dyn ConfigObject>> {
        if let Value::Object(object) = self {
            Some(object)
        } else {
            None
        }
    }

    /// Short name of the value kind, used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Boolean(_) => "boolean",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
        }
    }

    /// Renders the value as configuration text
    ///
    /// Sequences are joined with the configured delimiter and mappings use
    /// the configured key/value separator, so the result casts back to an
    /// equal value under the same annotation.
    pub fn render(&self, config: &ParserConfig) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Bytes(bytes) => decode_bytes(bytes).0,
            Value::List(items) | Value::Set(items) => items
                .iter()
                .map(|item| item.render(config))
                .collect::<Vec<_>>()
                .join(&format!("{} ", config.delimiter)),
            Value::Map(map) => map
                .iter()
                .map(|(k, v)| format!("{}{} {}", k, config.map_separator, v.render(config)))
                .collect::<Vec<_>>()
                .join(&format!("{} ", config.delimiter)),
            Value::Object(object) => object.to_config_string(),
        }
    }
}

/// Decodes bytes for display, as UTF-8 when valid and Latin-1 otherwise
///
/// Returns the text together with the encoding name that re-encodes it.
pub(crate) fn decode_bytes(bytes: &[u8]) -> (String, &'static str) {
    match std::str::from_utf8(bytes) {
        Ok(text) => (text.to_string(), "utf-8"),
        Err(_) => (bytes.iter().map(|&b| char::from(b)).collect(), "latin-1"),
    }
}

/// Floats compare by bit pattern, so equality is reflexive and agrees with
/// [`Hash`]. Sets and mappings compare without regard to order.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => {
                a.iter().collect::<IndexSet<_>>() == b.iter().collect::<IndexSet<_>>()
            }
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => {
                a.type_name() == b.type_name() && a.to_config_string() == b.to_config_string()
            }
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::String(s) => s.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Boolean(b) => b.hash(state),
            Value::Bytes(bytes) => bytes.hash(state),
            Value::List(items) => items.hash(state),
            Value::Set(items) => unordered_hash(items.iter().collect::<IndexSet<_>>()).hash(state),
            Value::Map(map) => unordered_hash(map.iter()).hash(state),
            Value::Object(object) => {
                object.type_name().hash(state);
                object.to_config_string().hash(state);
            }
        }
    }
}

/// Combines element hashes so that order does not matter
fn unordered_hash<T: Hash>(items: impl IntoIterator<Item = T>) -> u64 {
    items
        .into_iter()
        .map(|item| {
            let mut hasher = DefaultHasher::new();
            item.hash(&mut hasher);
            hasher.finish()
        })
        .fold(0, u64::wrapping_add)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render(&ParserConfig::default()))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

/// A leaf setting
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// Cast result
    pub value: Value,
    /// Text after interpolation, before casting
    pub raw: String,
    /// Annotation the value was cast with; `None` means untyped
    pub descriptor: Option<TypeDescriptor>,
    /// Source line of the key, when the entry came from parsed text
    pub line: Option<usize>,
}

impl Entry {
    /// Creates an entry for a value that did not come from parsed text
    pub fn new(value: impl Into<Value>) -> Self {
        let value = value.into();
        Self {
            raw: value.to_string(),
            value,
            descriptor: None,
            line: None,
        }
    }
}

/// A child of a section
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Entry(Entry),
    Section(Section),
}

impl Node {
    /// Returns the entry if this node is a leaf
    pub fn as_entry(&self) -> Option<&Entry> {
        if let Node::Entry(entry) = self {
            Some(entry)
        } else {
            None
        }
    }

    /// Returns the section if this node is a section
    pub fn as_section(&self) -> Option<&Section> {
        if let Node::Section(section) = self {
            Some(section)
        } else {
            None
        }
    }

    /// Returns the typed value if this node is a leaf
    pub fn value(&self) -> Option<&Value> {
        self.as_entry().map(|entry| &entry.value)
    }

    /// Returns true if the node is a section
    pub fn is_section(&self) -> bool {
        matches!(self, Node::Section(_))
    }
}

impl From<Section> for Node {
    fn from(section: Section) -> Self {
        Node::Section(section)
    }
}

impl From<Entry> for Node {
    fn from(entry: Entry) -> Self {
        Node::Entry(entry)
    }
}

/// What an insertion displaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Displaced {
    Nothing,
    Entry,
    Section,
}

/// A named, ordered container of entries and sub-sections
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Section {
    children: IndexMap<String, Node>,
}

impl Section {
    /// Creates an empty section
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion of a plain value
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_entry(key.into(), Entry::new(value));
        self
    }

    /// Builder-style insertion of a sub-section
    pub fn with_section(mut self, key: impl Into<String>, section: Section) -> Self {
        self.merge_node(key.into(), Node::Section(section));
        self
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.children.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.children.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.children.get_mut(key)
    }

    /// Position of a direct child in insertion order
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.children.get_index_of(key)
    }

    /// Returns a direct sub-section
    pub fn section(&self, key: &str) -> Option<&Section> {
        self.children.get(key).and_then(Node::as_section)
    }

    /// Returns a direct sub-section mutably
    pub fn section_mut(&mut self, key: &str) -> Option<&mut Section> {
        match self.children.get_mut(key) {
            Some(Node::Section(section)) => Some(section),
            _ => None,
        }
    }

    /// Returns the typed value of a direct entry
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.children.get(key).and_then(Node::value)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Node> {
        self.children.iter()
    }

    pub fn keys(&self) -> indexmap::map::Keys<'_, String, Node> {
        self.children.keys()
    }

    pub fn values(&self) -> indexmap::map::Values<'_, String, Node> {
        self.children.values()
    }

    /// Removes a direct child, closing the gap in insertion order
    pub fn remove(&mut self, key: &str) -> Option<Node> {
        self.children.shift_remove(key)
    }

    /// Walks a path of keys from this section
    pub fn lookup<S: AsRef<str>>(&self, path: &[S]) -> Option<&Node> {
        let (last, parents) = path.split_last()?;
        let mut section = self;
        for key in parents {
            section = section.section(key.as_ref())?;
        }
        section.get(last.as_ref())
    }

    /// Walks a path of section names from this section
    pub fn lookup_section_mut<S: AsRef<str>>(&mut self, path: &[S]) -> Option<&mut Section> {
        let mut section = self;
        for key in path {
            section = section.section_mut(key.as_ref())?;
        }
        Some(section)
    }

    /// Assigns an entry
    ///
    /// An existing entry is overwritten in place. An existing section of the
    /// same name is deleted together with its subtree and the entry is
    /// appended in its stead.
    pub fn set_entry(&mut self, key: String, entry: Entry) -> Displaced {
        match self.children.get_mut(&key) {
            Some(Node::Entry(existing)) => {
                *existing = entry;
                Displaced::Entry
            }
            Some(Node::Section(_)) => {
                self.children.shift_remove(&key);
                self.children.insert(key, Node::Entry(entry));
                Displaced::Section
            }
            None => {
                self.children.insert(key, Node::Entry(entry));
                Displaced::Nothing
            }
        }
    }

    /// Opens a sub-section for extension, creating it if needed
    ///
    /// An entry of the same name is deleted and replaced by an empty section.
    pub fn open_section(&mut self, key: &str) -> (&mut Section, Displaced) {
        let displaced = match self.children.get(key) {
            Some(Node::Section(_)) => Displaced::Nothing,
            Some(Node::Entry(_)) => {
                self.children.shift_remove(key);
                Displaced::Entry
            }
            None => Displaced::Nothing,
        };

        let node = self
            .children
            .entry(key.to_string())
            .or_insert_with(|| Node::Section(Section::new()));
        match node {
            Node::Section(section) => (section, displaced),
            Node::Entry(_) => unreachable!("entries under this key were removed above"),
        }
    }

    /// Merges another section into this one with the parse-time precedence
    pub fn merge(&mut self, other: Section) {
        for (key, node) in other.children {
            self.merge_node(key, node);
        }
    }

    fn merge_node(&mut self, key: String, node: Node) {
        match node {
            Node::Entry(entry) => {
                self.set_entry(key, entry);
            }
            Node::Section(section) => {
                let (target, _) = self.open_section(&key);
                target.merge(section);
            }
        }
    }
}

impl FromIterator<(String, Node)> for Section {
    fn from_iter<I: IntoIterator<Item = (String, Node)>>(iter: I) -> Self {
        let mut section = Section::new();
        for (key, node) in iter {
            section.merge_node(key, node);
        }
        section
    }
}

impl<'a> IntoIterator for &'a Section {
    type Item = (&'a String, &'a Node);
    type IntoIter = indexmap::map::Iter<'a, String, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.children.iter()
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::String(s) => serializer.serialize_str(s),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Bytes(bytes) => serializer.serialize_bytes(bytes),
            Value::List(items) | Value::Set(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
            Value::Object(object) => serializer.serialize_str(&object.to_config_string()),
        }
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Node::Entry(entry) => entry.value.serialize(serializer),
            Node::Section(section) => section.serialize(serializer),
        }
    }
}

impl Serialize for Section {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.children.len()))?;
        for (key, node) in &self.children {
            map.serialize_entry(key, node)?;
        }
        map.end()
    }
}
