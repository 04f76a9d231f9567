//! External constructors and safe mode

use nested_ini::reader::StrSource;
use nested_ini::{Config, ConfigObject, IniError, ParserConfig, Value};
use std::fs;
use std::sync::Arc;
use tempfile::NamedTempFile;

#[derive(Debug)]
struct Token(String);

impl ConfigObject for Token {
    fn type_name(&self) -> &str {
        "demo.Token"
    }

    fn to_config_string(&self) -> String {
        self.0.clone()
    }
}

fn token(raw: &str) -> Result<Value, String> {
    if raw.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(Value::Object(Arc::new(Token(raw.to_string()))))
    } else {
        Err(format!("'{raw}' is not a hex token"))
    }
}

fn with_token_type(options: ParserConfig) -> Config {
    let mut config = Config::with_config(options);
    config.register_type("demo.Token", token);
    config
}

const DOCUMENT: &str = "[auth]\n    (demo.Token) guid = 4f2a\n    user = admin";

#[test]
fn test_external_type_refused_in_safe_mode() {
    let mut config = with_token_type(ParserConfig::default());
    let err = config.parse_str(DOCUMENT).unwrap_err();
    match err {
        IniError::UnknownType { name, line } => {
            assert_eq!(name, "demo.Token");
            assert_eq!(line, 2);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(config.get("auth:guid").is_none());
}

#[test]
fn test_external_type_with_safe_disabled() {
    let mut config = with_token_type(ParserConfig::new().with_safe(false));
    config.parse_str(DOCUMENT).unwrap();

    let guid = config.get_value("auth:guid").and_then(Value::as_object).unwrap();
    assert_eq!(guid.type_name(), "demo.Token");
    assert_eq!(guid.to_config_string(), "4f2a");
}

#[test]
fn test_per_call_override() {
    let mut config = with_token_type(ParserConfig::default());
    config.parse_with(StrSource::new(DOCUMENT), Some(false)).unwrap();
    assert!(config.get_value("auth:guid").is_some());

    // the override does not stick
    let err = config.parse_str("(demo.Token) other = 1").unwrap_err();
    assert!(matches!(err, IniError::UnknownType { .. }));
}

#[test]
fn test_unregistered_type_fails_unsafely_too() {
    let mut config = Config::with_config(ParserConfig::new().with_safe(false));
    let err = config.parse_str("(demo.Missing) x = 1").unwrap_err();
    assert!(matches!(err, IniError::UnknownType { ref name, .. } if name == "demo.Missing"));
}

#[test]
fn test_constructor_failure_is_cast_error() {
    let mut config = with_token_type(ParserConfig::new().with_safe(false));
    let err = config.parse_str("(demo.Token) guid = not-hex").unwrap_err();
    match err {
        IniError::Cast(cast) => {
            assert_eq!(cast.type_name, "demo.Token");
            assert!(cast.message.contains("not a hex token"));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_external_elements_in_containers() {
    let mut config = with_token_type(ParserConfig::new().with_safe(false));
    config.parse_str("(list<demo.Token>) keys = aa, bb").unwrap();

    let keys = config.get_value("keys").and_then(Value::as_slice).unwrap();
    assert_eq!(keys.len(), 2);
    assert_eq!(keys[1].to_string(), "bb");
}

#[test]
fn test_object_round_trips_through_file() {
    let mut config = with_token_type(ParserConfig::new().with_safe(false));
    config.parse_str(DOCUMENT).unwrap();
    assert_eq!(
        config.write(),
        "[auth]\n(demo.Token) guid = 4f2a\nuser = admin\n"
    );

    let file = NamedTempFile::new().unwrap();
    config.write_to_path(file.path()).unwrap();
    assert!(fs::read_to_string(file.path()).unwrap().contains("(demo.Token)"));

    let mut safe = with_token_type(ParserConfig::default());
    assert!(safe.read(file.path(), None).is_err());

    let mut unsafe_read = with_token_type(ParserConfig::default());
    unsafe_read.read(file.path(), Some(false)).unwrap();
    assert_eq!(
        unsafe_read.get_value("auth:guid"),
        config.get_value("auth:guid")
    );
}

#[test]
fn test_registry_queries() {
    let config = with_token_type(ParserConfig::default());
    assert!(config.registry().is_registered("demo.Token"));
    assert!(!config.registry().is_registered("int"));
}
