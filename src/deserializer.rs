//! Serde deserializer over the configuration tree
//!
//! Sections deserialize as maps, so they fill structs and `HashMap`s alike.
//! Typed entries map onto the matching Rust types. Untyped entries are strings,
//! but numeric and boolean targets accept strings that parse as such, so a
//! struct field of type `u16` can be filled from `port = 8080` without an
//! annotation.

use crate::error::{IniError, SerdeError};
use crate::parser::{Config, ParserConfig};
use crate::types::parse_bool;
use crate::value::{Node, Section, Value};
use serde::de::value::{SeqDeserializer, StrDeserializer};
use serde::de::{self, DeserializeOwned, DeserializeSeed, Visitor};

/// What a deserializer reads from
#[derive(Clone, Copy)]
enum Target<'a> {
    Section(&'a Section),
    Value(&'a Value),
}

impl<'a> From<&'a Node> for Target<'a> {
    fn from(node: &'a Node) -> Self {
        match node {
            Node::Section(section) => Target::Section(section),
            Node::Entry(entry) => Target::Value(&entry.value),
        }
    }
}

/// Deserializer for a section, entry or value of the tree
pub struct NodeDeserializer<'a> {
    target: Target<'a>,
}

impl<'a> NodeDeserializer<'a> {
    /// Creates a deserializer for a section
    pub fn from_section(section: &'a Section) -> Self {
        Self {
            target: Target::Section(section),
        }
    }

    /// Creates a deserializer for a node
    pub fn from_node(node: &'a Node) -> Self {
        Self {
            target: node.into(),
        }
    }

    /// Creates a deserializer for a single value
    pub fn from_value(value: &'a Value) -> Self {
        Self {
            target: Target::Value(value),
        }
    }

    fn kind(&self) -> &'static str {
        match self.target {
            Target::Section(_) => "section",
            Target::Value(value) => value.kind(),
        }
    }

    fn mismatch(&self, expected: &str) -> IniError {
        IniError::Serde(SerdeError::TypeMismatch {
            expected: expected.to_string(),
            found: self.kind().to_string(),
        })
    }

    fn integer(&self) -> Result<i64, IniError> {
        match self.target {
            Target::Value(Value::Integer(i)) => Ok(*i),
            Target::Value(Value::String(s)) => {
                s.trim().parse().map_err(|_| self.mismatch("integer"))
            }
            _ => Err(self.mismatch("integer")),
        }
    }

    fn float(&self) -> Result<f64, IniError> {
        match self.target {
            Target::Value(Value::Float(f)) => Ok(*f),
            Target::Value(Value::Integer(i)) => Ok(*i as f64),
            Target::Value(Value::String(s)) => s.trim().parse().map_err(|_| self.mismatch("float")),
            _ => Err(self.mismatch("float")),
        }
    }
}

impl<'de> de::Deserializer<'de> for NodeDeserializer<'_> {
    type Error = IniError;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.target {
            Target::Section(section) => visitor.visit_map(EntriesAccess::new(
                section.iter().map(|(k, node)| (k.as_str(), Target::from(node))),
            )),
            Target::Value(value) => match value {
                Value::String(s) => visitor.visit_str(s),
                Value::Integer(i) => visitor.visit_i64(*i),
                Value::Float(f) => visitor.visit_f64(*f),
                Value::Boolean(b) => visitor.visit_bool(*b),
                Value::Bytes(bytes) => {
                    visitor.visit_seq(SeqDeserializer::<_, IniError>::new(bytes.iter().copied()))
                }
                Value::List(items) | Value::Set(items) => visitor.visit_seq(ItemsAccess {
                    items: items.iter(),
                }),
                Value::Map(map) => visitor.visit_map(EntriesAccess::new(
                    map.iter().map(|(k, v)| (k.as_str(), Target::Value(v))),
                )),
                Value::Object(object) => visitor.visit_string(object.to_config_string()),
            },
        }
    }

    fn deserialize_bool<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.target {
            Target::Value(Value::Boolean(b)) => visitor.visit_bool(*b),
            Target::Value(Value::String(s)) => match parse_bool(s.trim()) {
                Ok(b) => visitor.visit_bool(b),
                Err(_) => Err(self.mismatch("boolean")),
            },
            _ => Err(self.mismatch("boolean")),
        }
    }

    fn deserialize_i8<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_i64(visitor)
    }

    fn deserialize_i16<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_i64(visitor)
    }

    fn deserialize_i32<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_i64(visitor)
    }

    fn deserialize_i64<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_i64(self.integer()?)
    }

    fn deserialize_u8<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_u64(visitor)
    }

    fn deserialize_u16<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_u64(visitor)
    }

    fn deserialize_u32<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_u64(visitor)
    }

    fn deserialize_u64<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        let i = self.integer()?;
        match u64::try_from(i) {
            Ok(u) => visitor.visit_u64(u),
            Err(_) => Err(self.mismatch("unsigned integer")),
        }
    }

    fn deserialize_f32<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_f64(visitor)
    }

    fn deserialize_f64<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_f64(self.float()?)
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_string(visitor)
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.target {
            Target::Value(Value::String(s)) => visitor.visit_str(s),
            Target::Value(Value::Bytes(bytes)) => match std::str::from_utf8(bytes) {
                Ok(s) => visitor.visit_str(s),
                Err(_) => Err(self.mismatch("string")),
            },
            Target::Value(
                value @ (Value::Integer(_)
                | Value::Float(_)
                | Value::Boolean(_)
                | Value::Object(_)),
            ) => visitor.visit_string(value.to_string()),
            _ => Err(self.mismatch("string")),
        }
    }

    fn deserialize_bytes<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self.target {
            Target::Value(Value::Bytes(bytes)) => visitor.visit_bytes(bytes),
            Target::Value(Value::String(s)) => visitor.visit_bytes(s.as_bytes()),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        // the tree has no null; absent keys are handled by the derive
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        let single = match self.target {
            Target::Value(Value::String(s)) => {
                return visitor.visit_enum(StrDeserializer::<IniError>::new(s));
            }
            Target::Section(section) if section.len() == 1 => section
                .iter()
                .next()
                .map(|(k, node)| (k.as_str(), Target::from(node))),
            Target::Value(Value::Map(map)) if map.len() == 1 => map
                .iter()
                .next()
                .map(|(k, v)| (k.as_str(), Target::Value(v))),
            _ => None,
        };

        match single {
            Some((variant, target)) => visitor.visit_enum(VariantAccess { variant, target }),
            None => Err(self.mismatch("enum variant name or single-key section")),
        }
    }

    serde::forward_to_deserialize_any! {
        i128 u128 char unit unit_struct seq tuple
        tuple_struct map struct identifier ignored_any
    }
}

/// Sequence access over list and set items
struct ItemsAccess<'a> {
    items: std::slice::Iter<'a, Value>,
}

impl<'de> de::SeqAccess<'de> for ItemsAccess<'_> {
    type Error = IniError;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>, Self::Error>
    where
        T: DeserializeSeed<'de>,
    {
        match self.items.next() {
            Some(value) => seed.deserialize(NodeDeserializer::from_value(value)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.items.len())
    }
}

/// Map access over section children or mapping entries
struct EntriesAccess<'a, I>
where
    I: Iterator<Item = (&'a str, Target<'a>)>,
{
    entries: I,
    current: Option<Target<'a>>,
}

impl<'a, I> EntriesAccess<'a, I>
where
    I: Iterator<Item = (&'a str, Target<'a>)>,
{
    fn new(entries: I) -> Self {
        Self {
            entries,
            current: None,
        }
    }
}

impl<'de, 'a, I> de::MapAccess<'de> for EntriesAccess<'a, I>
where
    I: Iterator<Item = (&'a str, Target<'a>)>,
{
    type Error = IniError;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>, Self::Error>
    where
        K: DeserializeSeed<'de>,
    {
        match self.entries.next() {
            Some((key, target)) => {
                self.current = Some(target);
                seed.deserialize(StrDeserializer::<IniError>::new(key)).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value, Self::Error>
    where
        V: DeserializeSeed<'de>,
    {
        match self.current.take() {
            Some(target) => seed.deserialize(NodeDeserializer { target }),
            None => Err(IniError::Serde(SerdeError::Custom(
                "No value available for map entry".to_string(),
            ))),
        }
    }
}

/// Enum access for a single-key section or mapping
struct VariantAccess<'a> {
    variant: &'a str,
    target: Target<'a>,
}

impl<'de, 'a> de::EnumAccess<'de> for VariantAccess<'a> {
    type Error = IniError;
    type Variant = NodeDeserializer<'a>;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant), Self::Error>
    where
        V: DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(StrDeserializer::<IniError>::new(self.variant))?;
        Ok((variant, NodeDeserializer { target: self.target }))
    }
}

impl<'de> de::VariantAccess<'de> for NodeDeserializer<'_> {
    type Error = IniError;

    /// A unit variant may be written as a valueless key or an empty section
    fn unit_variant(self) -> Result<(), Self::Error> {
        match self.target {
            Target::Value(Value::Boolean(true)) => Ok(()),
            Target::Section(section) if section.is_empty() => Ok(()),
            _ => Err(self.mismatch("unit variant name")),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value, Self::Error>
    where
        T: DeserializeSeed<'de>,
    {
        seed.deserialize(self)
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        de::Deserializer::deserialize_seq(self, visitor)
    }

    fn struct_variant<V>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        de::Deserializer::deserialize_map(self, visitor)
    }
}

/// Deserializes a section into a Rust type
pub fn from_section<T>(section: &Section) -> Result<T, IniError>
where
    T: DeserializeOwned,
{
    T::deserialize(NodeDeserializer::from_section(section))
}

/// Deserializes a single value into a Rust type
pub fn from_value<T>(value: &Value) -> Result<T, IniError>
where
    T: DeserializeOwned,
{
    T::deserialize(NodeDeserializer::from_value(value))
}

/// Parses configuration text and deserializes it into a Rust type
pub fn from_str<T>(s: &str) -> Result<T, IniError>
where
    T: DeserializeOwned,
{
    from_str_with_config(s, ParserConfig::default())
}

/// Parses configuration text with custom options and deserializes it
pub fn from_str_with_config<T>(s: &str, config: ParserConfig) -> Result<T, IniError>
where
    T: DeserializeOwned,
{
    let mut parsed = Config::with_config(config);
    parsed.parse_str(s)?;
    parsed.deserialize()
}
