//! Type registry and value casting
//!
//! Built-in casts:
//!
//! | annotation            | result                                             |
//! |-----------------------|----------------------------------------------------|
//! | `str`, `string`       | the text itself                                    |
//! | `int`, `integer`      | `i64`; `value, radix` parses in the given radix    |
//! | `float`               | `f64`                                              |
//! | `bool`, `boolean`     | `true yes on 1` / `false no off 0`, any case       |
//! | `list`, `tuple`       | delimiter-split tokens, each cast to the element   |
//! | `set`, `frozenset`    | as `list`, duplicates dropped                      |
//! | `bytes`, `bytearray`  | `text, encoding`; encoding defaults to UTF-8       |
//! | `dict`, `map`         | `key: value` tokens, values cast to the element    |
//! | `range`               | `stop`, `start, stop` or `start, stop, step`       |
//!
//! Any other annotation names an external constructor. Those are only
//! consulted when parsing is not in safe mode, and only if the host program
//! registered one under that exact name.

use crate::parser::ParserConfig;
use crate::syntax::TypeDescriptor;
use crate::value::Value;
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Largest sequence a `range` annotation may produce
pub const MAX_RANGE_LEN: i64 = 1_000_000;

/// Names handled by the built-in casts
pub const BUILTIN_TYPES: &[&str] = &[
    "str", "string", "int", "integer", "float", "bool", "boolean", "bytes", "bytearray", "list",
    "tuple", "set", "frozenset", "dict", "map", "range",
];

/// Builds a value of an external type from its configuration text
pub trait Constructor: Send + Sync {
    fn construct(&self, raw: &str) -> Result<Value, String>;
}

impl<F> Constructor for F
where
    F: Fn(&str) -> Result<Value, String> + Send + Sync,
{
    fn construct(&self, raw: &str) -> Result<Value, String> {
        self(raw)
    }
}

/// Why a cast failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CastFailure {
    /// The text is not valid for the type
    Invalid(String),
    /// The type name is not permitted or not known
    UnknownType(String),
}

/// Registry of external constructors, keyed by annotation name
#[derive(Clone, Default)]
pub struct TypeRegistry {
    external: HashMap<String, Arc<dyn Constructor>>,
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.external.keys().collect();
        names.sort();
        f.debug_struct("TypeRegistry")
            .field("external", &names)
            .finish()
    }
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an external constructor
    ///
    /// Built-in names always resolve to the built-in cast, so registering one
    /// has no effect on casting.
    pub fn register(&mut self, name: impl Into<String>, constructor: impl Constructor + 'static) {
        self.external.insert(name.into(), Arc::new(constructor));
    }

    /// Returns true if an external constructor is registered under `name`
    pub fn is_registered(&self, name: &str) -> bool {
        self.external.contains_key(name)
    }

    /// Returns true if `name` is handled by a built-in cast
    pub fn is_builtin(name: &str) -> bool {
        BUILTIN_TYPES.contains(&name)
    }

    /// Casts resolved text to the annotated type
    pub fn cast(
        &self,
        descriptor: &TypeDescriptor,
        raw: &str,
        config: &ParserConfig,
        safe: bool,
    ) -> Result<Value, CastFailure> {
        let element = descriptor.element.as_deref();
        let scalar = || -> Result<(), CastFailure> {
            match element {
                Some(_) => Err(CastFailure::Invalid(format!(
                    "type '{}' takes no element type",
                    descriptor.name
                ))),
                None => Ok(()),
            }
        };

        match descriptor.name.as_str() {
            "str" | "string" => {
                scalar()?;
                Ok(Value::String(unquote(raw.trim(), config).to_string()))
            }
            "int" | "integer" => {
                scalar()?;
                cast_int(&tokens(raw, config))
            }
            "float" => {
                scalar()?;
                let token = single_token(&tokens(raw, config))?;
                token
                    .parse::<f64>()
                    .map(Value::Float)
                    .map_err(|e| CastFailure::Invalid(e.to_string()))
            }
            "bool" | "boolean" => {
                scalar()?;
                parse_bool(single_token(&tokens(raw, config))?).map(Value::Boolean)
            }
            "bytes" | "bytearray" => {
                scalar()?;
                cast_bytes(raw, config)
            }
            "list" | "tuple" => self.cast_elements(raw, element, config, safe).map(Value::List),
            "set" | "frozenset" => {
                let items = self.cast_elements(raw, element, config, safe)?;
                let unique: IndexSet<Value> = items.into_iter().collect();
                Ok(Value::Set(unique.into_iter().collect()))
            }
            "dict" | "map" => self.cast_map(raw, element, config, safe),
            "range" => {
                scalar()?;
                cast_range(&tokens(raw, config))
            }
            name if safe => Err(CastFailure::UnknownType(name.to_string())),
            name => match self.external.get(name) {
                Some(constructor) => constructor
                    .construct(raw.trim())
                    .map_err(CastFailure::Invalid),
                None => Err(CastFailure::UnknownType(name.to_string())),
            },
        }
    }

    fn cast_elements(
        &self,
        raw: &str,
        element: Option<&TypeDescriptor>,
        config: &ParserConfig,
        safe: bool,
    ) -> Result<Vec<Value>, CastFailure> {
        tokens(raw, config)
            .into_iter()
            .map(|token| match element {
                Some(element) => self.cast(element, token, config, safe),
                None => Ok(Value::String(token.to_string())),
            })
            .collect()
    }

    fn cast_map(
        &self,
        raw: &str,
        element: Option<&TypeDescriptor>,
        config: &ParserConfig,
        safe: bool,
    ) -> Result<Value, CastFailure> {
        let mut map = IndexMap::new();
        for token in tokens(raw, config) {
            let Some((key, value)) = token.split_once(config.map_separator.as_str()) else {
                return Err(CastFailure::Invalid(format!(
                    "'{}' has no '{}' separating key and value",
                    token, config.map_separator
                )));
            };
            let key = unquote(key.trim(), config).to_string();
            let value = value.trim();
            let value = match element {
                Some(element) => self.cast(element, value, config, safe)?,
                None => Value::String(unquote(value, config).to_string()),
            };
            map.insert(key, value);
        }
        Ok(Value::Map(map))
    }
}

/// Splits text on the configured delimiter into trimmed, unquoted tokens
///
/// Blank text yields no tokens.
pub fn tokens<'a>(raw: &'a str, config: &ParserConfig) -> Vec<&'a str> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    raw.split(config.delimiter.as_str())
        .map(|token| unquote(token.trim(), config))
        .collect()
}

/// Removes one pair of matching surrounding quotes
pub fn unquote<'a>(text: &'a str, config: &ParserConfig) -> &'a str {
    if !config.strip_quotes || text.len() < 2 {
        return text;
    }
    let first = text.as_bytes()[0];
    let last = text.as_bytes()[text.len() - 1];
    if (first == b'"' || first == b'\'') && first == last {
        &text[1..text.len() - 1]
    } else {
        text
    }
}

fn single_token<'a>(tokens: &[&'a str]) -> Result<&'a str, CastFailure> {
    match tokens {
        [token] => Ok(token),
        [] => Err(CastFailure::Invalid("empty value".to_string())),
        _ => Err(CastFailure::Invalid(format!(
            "expected one value, found {}",
            tokens.len()
        ))),
    }
}

fn parse_i64(token: &str) -> Result<i64, CastFailure> {
    token
        .parse::<i64>()
        .map_err(|e| CastFailure::Invalid(format!("'{}': {}", token, e)))
}

fn cast_int(tokens: &[&str]) -> Result<Value, CastFailure> {
    match tokens {
        [value, radix] => {
            let radix = radix
                .parse::<u32>()
                .ok()
                .filter(|r| (2..=36).contains(r))
                .ok_or_else(|| CastFailure::Invalid(format!("invalid radix '{}'", radix)))?;
            i64::from_str_radix(value, radix)
                .map(Value::Integer)
                .map_err(|e| CastFailure::Invalid(format!("'{}': {}", value, e)))
        }
        _ => parse_i64(single_token(tokens)?).map(Value::Integer),
    }
}

/// Parses the accepted boolean spellings
pub fn parse_bool(token: &str) -> Result<bool, CastFailure> {
    match token.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(CastFailure::Invalid(format!(
            "'{}' is not a boolean",
            token
        ))),
    }
}

/// Encodes `text, encoding`, splitting on the last delimiter so the text
/// itself may contain delimiters
fn cast_bytes(raw: &str, config: &ParserConfig) -> Result<Value, CastFailure> {
    let (text, encoding) = match raw.rsplit_once(config.delimiter.as_str()) {
        Some((text, encoding)) => (text, encoding.trim()),
        None => (raw, "utf-8"),
    };
    let text = unquote(text.trim(), config);

    match encoding.to_ascii_lowercase().replace('_', "-").as_str() {
        "utf-8" | "utf8" => Ok(Value::Bytes(text.as_bytes().to_vec())),
        "ascii" | "us-ascii" if text.is_ascii() => Ok(Value::Bytes(text.as_bytes().to_vec())),
        "ascii" | "us-ascii" => Err(CastFailure::Invalid(format!(
            "'{}' is not ASCII",
            text
        ))),
        "latin-1" | "latin1" | "iso-8859-1" => text
            .chars()
            .map(|c| {
                u8::try_from(c).map_err(|_| {
                    CastFailure::Invalid(format!("'{}' cannot be encoded as latin-1", c))
                })
            })
            .collect::<Result<Vec<u8>, _>>()
            .map(Value::Bytes),
        _ => Err(CastFailure::Invalid(format!(
            "unknown encoding '{}'",
            encoding
        ))),
    }
}

fn cast_range(tokens: &[&str]) -> Result<Value, CastFailure> {
    let numbers = tokens
        .iter()
        .map(|t| parse_i64(t))
        .collect::<Result<Vec<_>, _>>()?;
    let (start, stop, step) = match numbers.as_slice() {
        [stop] => (0, *stop, 1),
        [start, stop] => (*start, *stop, 1),
        [start, stop, step] => (*start, *stop, *step),
        _ => {
            return Err(CastFailure::Invalid(format!(
                "range takes 1 to 3 values, found {}",
                numbers.len()
            )));
        }
    };
    if step == 0 {
        return Err(CastFailure::Invalid("range step must not be zero".to_string()));
    }

    let span = if step > 0 {
        stop.saturating_sub(start)
    } else {
        start.saturating_sub(stop)
    };
    let len = if span <= 0 {
        0
    } else {
        (span - 1) / step.saturating_abs() + 1
    };
    if len > MAX_RANGE_LEN {
        return Err(CastFailure::Invalid(format!(
            "range of {} values exceeds the limit of {}",
            len, MAX_RANGE_LEN
        )));
    }

    Ok(Value::List(
        (0..len).map(|i| Value::Integer(start + i * step)).collect(),
    ))
}
