//! Tests for error reporting through the full parse pipeline
//!
//! Each error kind is checked for the line it reports and, where it has one,
//! the rendered source snippet.

#[cfg(test)]
mod tests {
    use crate::error::{CastError, ErrorContext, IniError, ParseError};
    use crate::parser::{Config, ParserConfig};

    fn parse_err(text: &str) -> IniError {
        match text.parse::<Config>() {
            Ok(config) => panic!("expected an error, parsed {:?}", config.root()),
            Err(err) => err,
        }
    }

    #[test]
    fn test_line_numbers_skip_blank_and_comment_lines() {
        let text = "# heading\n\n; note\na = 1\n\n(int) b = x";
        let err = parse_err(text);
        assert_eq!(err.line(), Some(6));
    }

    #[test]
    fn test_malformed_header() {
        let err = parse_err("a = 1\n[ ]");
        assert_eq!(
            err.to_string(),
            "Parse error: Malformed section header '[ ]' at line 2"
        );
    }

    #[test]
    fn test_malformed_annotation_variants() {
        for text in ["(list<int) a = 1", "(int a = 1", "((int)) a = 1", "(list<>) a = 1"] {
            let err = parse_err(text);
            assert!(
                matches!(err, IniError::Parse(ParseError::MalformedAnnotation { line: 1, .. })),
                "{text:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_malformed_annotation_is_fatal_for_the_call() {
        let mut config = Config::new();
        let result = config.parse_str("a = 1\n(list<int) b = 2\nc = 3");
        assert!(result.is_err());
        assert!(config.contains("a"));
        assert!(!config.contains("b"));
        assert!(!config.contains("c"));
    }

    #[test]
    fn test_cast_error_details() {
        let err = parse_err("[s]\n    (float) ratio = fast");
        match err {
            IniError::Cast(CastError {
                key,
                type_name,
                value,
                line,
                ..
            }) => {
                assert_eq!(key, "ratio");
                assert_eq!(type_name, "float");
                assert_eq!(value, "fast");
                assert_eq!(line, 2);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_multiline_cast_error_reports_key_line() {
        let err = parse_err("(list<int>) a = 1,\n    2,\n    three");
        assert_eq!(err.line(), Some(1));
    }

    #[test]
    fn test_reference_error_message() {
        let err = parse_err("a = 1\nb = {missing:key}");
        assert_eq!(
            err.to_string(),
            "Unresolved reference '{missing:key}' at line 2: 'missing' not found"
        );
    }

    #[test]
    fn test_unknown_type_in_safe_mode() {
        let err = parse_err("(some.external.Type) v = x");
        assert!(matches!(err, IniError::UnknownType { ref name, line: 1 } if name == "some.external.Type"));
    }

    #[test]
    fn test_inconsistent_dedent_rendering() {
        let text = "[a]\n    [b]\n        k = 1\n  j = 2";
        let mut config = Config::with_config(ParserConfig::new().with_strict_indentation(true));
        let err = config.parse_str(text).unwrap_err();

        let rendered = err.render(text);
        assert!(rendered.starts_with("Error at line 4: Parse error: Inconsistent dedent to column 2"));
        assert!(rendered.contains("4 |   j = 2"));
        assert!(rendered.contains("<-- Error here"));
        assert!(rendered.contains("Help: A dedented line must align"));
    }

    #[test]
    fn test_render_without_line_is_plain_message() {
        let err = IniError::InputCapability {
            message: "no lines".to_string(),
        };
        assert_eq!(err.render("a = 1"), err.to_string());
    }

    #[test]
    fn test_context_suggestions_are_numbered() {
        let context = ErrorContext::for_line("a = 1", 1)
            .with_suggestion("first")
            .with_suggestion("second");
        let formatted = context.format_error("boom");
        assert!(formatted.contains("Suggestions:\n  1. first\n  2. second\n"));
    }

    #[test]
    fn test_io_error_from_missing_file() {
        let mut config = Config::new();
        let err = config
            .read("/definitely/not/here/config.ini", None)
            .unwrap_err();
        assert!(matches!(err, IniError::Io(_)));
        assert_eq!(err.line(), None);
    }
}
