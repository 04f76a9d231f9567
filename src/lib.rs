//! # Nested INI
//!
//! An extended INI configuration engine: indentation-scoped sections, typed
//! values, parse-time references and a writer that round-trips the tree.
//!
//! ## Overview
//!
//! Documents are read line by line into an ordered tree of sections and
//! entries. Indentation decides nesting, a `(type)` annotation decides how a
//! value is cast, and `{section:key}` placeholders pull in values defined
//! earlier in the same tree.
//!
//! ## Key Features
//!
//! - **Nested Sections**: `[header]` lines nest by indentation
//! - **Typed Values**: `(int)`, `(float)`, `(bool)`, `(list<int>)`, `(set)`, `(dict<float>)`,
//!   `(range)`, `(bytes)`
//! - **Interpolation**: `{absolute:path}` placeholders resolved while parsing
//! - **Multiline Values**: continuation lines indented deeper than their key
//! - **Safe by Default**: external types only through explicitly registered constructors
//! - **Serde Integration**: deserialize a parsed tree into your own structs
//! - **Round-Trip Writer**: output parses back into the same tree
//!
//! ## Basic Usage
//!
//! ```rust
//! use nested_ini::{Config, Value};
//!
//! let text = r#"
//! name = demo
//!
//! [server]
//!     host = 0.0.0.0
//!     (int) port = 8080
//!     (list<int>) workers = 1, 2, 4
//!     url = http://{server:host}
//! "#;
//!
//! let config: Config = text.parse()?;
//! assert_eq!(config.get_value("server:port"), Some(&Value::Integer(8080)));
//! assert_eq!(config.get_value("server:url"), Some(&Value::from("http://0.0.0.0")));
//! assert_eq!(config.get_value_or("server:timeout", 30), Value::Integer(30));
//! # Ok::<(), nested_ini::IniError>(())
//! ```
//!
//! ## Serde
//!
//! ```rust
//! use serde::Deserialize;
//! use nested_ini::from_str;
//!
//! #[derive(Debug, Deserialize)]
//! struct Server {
//!     host: String,
//!     port: u16,
//! }
//!
//! #[derive(Debug, Deserialize)]
//! struct App {
//!     server: Server,
//! }
//!
//! let app: App = from_str("[server]\n    host = localhost\n    (int) port = 9000")?;
//! assert_eq!(app.server.port, 9000);
//! # Ok::<(), nested_ini::IniError>(())
//! ```
//!
//! ## External Types
//!
//! Annotations that are not built in name constructors registered by the host
//! program. They are refused unless the parse runs with `safe` disabled.
//!
//! ```rust
//! use nested_ini::{Config, IniError, Value};
//! use nested_ini::reader::StrSource;
//!
//! let mut config = Config::new();
//! config.register_type("app.Upper", |raw: &str| -> Result<Value, String> {
//!     Ok(Value::String(raw.to_uppercase()))
//! });
//!
//! let err = config.parse_str("(app.Upper) name = demo").unwrap_err();
//! assert!(matches!(err, IniError::UnknownType { .. }));
//!
//! config.parse_with(StrSource::new("(app.Upper) name = demo"), Some(false))?;
//! assert_eq!(config.get_value("name"), Some(&Value::from("DEMO")));
//! # Ok::<(), IniError>(())
//! ```
//!
//! ## Error Handling
//!
//! Every parse error carries its source line, and can be rendered against the
//! input:
//!
//! ```rust
//! use nested_ini::{Config, IniError};
//!
//! let text = "[server]\n    (int) port = eighty";
//! match text.parse::<Config>() {
//!     Err(err @ IniError::Cast(_)) => {
//!         assert_eq!(err.line(), Some(2));
//!         println!("{}", err.render(text));
//!     }
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```

pub mod deserializer;
pub mod error;
pub mod interpolate;
pub mod parser;
pub mod reader;
pub mod syntax;
pub mod types;
pub mod value;
pub mod writer;

#[cfg(test)]
mod error_tests;

// Re-export main types and functions
pub use deserializer::{NodeDeserializer, from_section, from_str, from_str_with_config};
pub use error::{CastError, ErrorContext, IniError, ParseError, SerdeError};
pub use parser::{Config, ParserConfig};
pub use value::{ConfigObject, Entry, Node, Section, Value};

// Re-export the extension points
pub use interpolate::ReferenceResolver;
pub use reader::LineSource;
pub use syntax::TypeDescriptor;
pub use types::{Constructor, TypeRegistry};
