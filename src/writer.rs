//! Serializes a configuration tree back to text
//!
//! Output re-parses into the same tree. A section's entries are written at
//! the column of its header and nested headers move one indent unit to the
//! right, so below the root children keep their insertion order. Root
//! entries share column 0 with the top-level headers and are written first.

use crate::interpolate::escape;
use crate::parser::ParserConfig;
use crate::value::{Entry, Node, Section, Value, decode_bytes};

/// Renders a whole tree
pub fn write_section(root: &Section, config: &ParserConfig) -> String {
    let mut out = String::new();
    write_body(&mut out, root, 0, 0, config);
    out
}

fn write_body(
    out: &mut String,
    section: &Section,
    entry_column: usize,
    header_column: usize,
    config: &ParserConfig,
) {
    // a root entry after a header would be read back into that header
    let in_order = header_column > entry_column;
    if !in_order {
        for (key, node) in section {
            if let Node::Entry(entry) = node {
                write_entry(out, key, entry, entry_column, config);
            }
        }
    }

    let mut first_header = true;
    for (key, node) in section {
        match node {
            Node::Entry(entry) if in_order => write_entry(out, key, entry, entry_column, config),
            Node::Entry(_) => {}
            Node::Section(child) => {
                // top-level sections are separated by a blank line
                if header_column == 0 && !first_header {
                    out.push('\n');
                }
                first_header = false;
                out.push_str(&" ".repeat(header_column));
                out.push('[');
                out.push_str(key);
                out.push_str("]\n");
                write_body(
                    out,
                    child,
                    header_column,
                    header_column + config.indent_size,
                    config,
                );
            }
        }
    }
}

fn write_entry(out: &mut String, key: &str, entry: &Entry, column: usize, config: &ParserConfig) {
    let indent = " ".repeat(column);
    let annotation = annotation(entry);
    let text = escape(&value_text(&entry.value, config));

    out.push_str(&indent);
    if let Some(annotation) = annotation {
        out.push('(');
        out.push_str(&annotation);
        out.push_str(") ");
    }
    out.push_str(key);
    out.push_str(" =");

    let mut lines = text.split(config.join.as_str());
    if let Some(first) = lines.next().filter(|l| !l.is_empty()) {
        out.push(' ');
        out.push_str(first);
    }
    out.push('\n');

    let continuation = " ".repeat(column + config.indent_size);
    for line in lines {
        out.push_str(&continuation);
        out.push_str(line);
        out.push('\n');
    }
}

/// The annotation an entry is written with
///
/// A `range` is written as the list it produced, since its bounds are gone.
fn annotation(entry: &Entry) -> Option<String> {
    match &entry.descriptor {
        Some(descriptor) if descriptor.name != "range" => Some(descriptor.to_string()),
        _ => infer_annotation(&entry.value),
    }
}

/// Picks an annotation that casts the rendered value back to an equal value
///
/// Strings need none. Containers carry an element type only when every
/// element is the same scalar kind.
pub fn infer_annotation(value: &Value) -> Option<String> {
    match value {
        Value::String(_) => None,
        Value::Integer(_) | Value::Float(_) | Value::Boolean(_) => {
            scalar_name(value).map(str::to_string)
        }
        Value::List(items) => Some(generic("list", items.iter())),
        Value::Set(items) => Some(generic("set", items.iter())),
        Value::Map(map) => Some(generic("dict", map.values())),
        Value::Bytes(_) => Some("bytes".to_string()),
        Value::Object(object) => Some(object.type_name().to_string()),
    }
}

fn scalar_name(value: &Value) -> Option<&str> {
    match value {
        Value::String(_) => Some("str"),
        Value::Integer(_) => Some("int"),
        Value::Float(_) => Some("float"),
        Value::Boolean(_) => Some("bool"),
        Value::Object(object) => Some(object.type_name()),
        Value::Bytes(_) | Value::List(_) | Value::Set(_) | Value::Map(_) => None,
    }
}

fn generic<'a>(name: &str, mut items: impl Iterator<Item = &'a Value>) -> String {
    let Some(first) = items.next().and_then(scalar_name) else {
        return name.to_string();
    };
    if items.all(|item| scalar_name(item) == Some(first)) {
        format!("{}<{}>", name, first)
    } else {
        name.to_string()
    }
}

fn value_text(value: &Value, config: &ParserConfig) -> String {
    let separator = format!("{} ", config.delimiter);
    match value {
        Value::String(s) => quote(s, config),
        Value::Bytes(bytes) => {
            let (text, encoding) = decode_bytes(bytes);
            format!("{}{}{}", quote(&text, config), separator, encoding)
        }
        Value::List(items) | Value::Set(items) => items
            .iter()
            .map(|item| element_text(item, config))
            .collect::<Vec<_>>()
            .join(&separator),
        Value::Map(map) => map
            .iter()
            .map(|(k, v)| format!("{}{} {}", k, config.map_separator, element_text(v, config)))
            .collect::<Vec<_>>()
            .join(&separator),
        other => other.render(config),
    }
}

/// An empty element is quoted, since blank text casts to no elements at all
fn element_text(value: &Value, config: &ParserConfig) -> String {
    match value {
        Value::String(s) if s.is_empty() && config.strip_quotes => "\"\"".to_string(),
        other => value_text(other, config),
    }
}

/// Wraps a string in quotes when reading it back would otherwise change it
fn quote(s: &str, config: &ParserConfig) -> String {
    if !config.strip_quotes {
        return s.to_string();
    }
    let padded = s.trim() != s;
    let bytes = s.as_bytes();
    let quoted = bytes.len() >= 2
        && (bytes[0] == b'"' || bytes[0] == b'\'')
        && bytes[0] == bytes[bytes.len() - 1];
    if padded || quoted {
        format!("\"{}\"", s)
    } else {
        s.to_string()
    }
}
