//! Parser utility functions.

use esmshim_ast::node::*;
use esmshim_ast::syntax_kind::SyntaxKind;
use esmshim_core::text::TextRange;
use esmshim_diagnostics::{messages, ParseResult};
use esmshim_scanner::Scanner;

/// Classify an opaque expression span: a lone identifier, a lone string or
/// number literal, or a raw span copied verbatim.
pub fn classify_expression(text: &str, range: TextRange) -> Expression {
    let mut scanner = Scanner::new(text);
    scanner.set_pos(range.pos);

    let first = text.as_bytes().get(range.pos).copied();
    match first {
        Some(b'\'' | b'"') => {
            if let Ok(lit) = scanner.parse_string() {
                if scanner.pos() == range.end {
                    return Expression::Literal(Literal {
                        data: NodeData::new(SyntaxKind::Literal, range.pos, range.end),
                        value: LiteralValue::String(lit.value),
                    });
                }
            }
        }
        Some(b) if b.is_ascii_digit() || b == b'.' => {
            if let Ok(lit) = scanner.parse_number() {
                if scanner.pos() == range.end {
                    return Expression::Literal(lit);
                }
            }
        }
        Some(_) if scanner.at_identifier_start() => {
            if let Ok(id) = scanner.parse_identifier() {
                if scanner.pos() == range.end {
                    return Expression::Identifier(id);
                }
            }
        }
        _ => {}
    }

    Expression::Literal(Literal {
        data: NodeData::new(SyntaxKind::Literal, range.pos, range.end),
        value: LiteralValue::Raw(range.slice(text).to_string()),
    })
}

// ============================================================================
// Destructuring patterns
// ============================================================================

/// Collect the names bound by a binding target at the cursor: an identifier,
/// or an object or array pattern (recursively).
pub fn collect_binding_names(
    scanner: &mut Scanner<'_>,
    names: &mut Vec<Identifier>,
) -> ParseResult<()> {
    if scanner.match_str("{") {
        collect_object_pattern(scanner, names)
    } else if scanner.match_str("[") {
        collect_array_pattern(scanner, names)
    } else {
        names.push(scanner.parse_identifier()?);
        Ok(())
    }
}

fn collect_object_pattern(
    scanner: &mut Scanner<'_>,
    names: &mut Vec<Identifier>,
) -> ParseResult<()> {
    loop {
        scanner.skip_space()?;
        if scanner.match_str("}") {
            return Ok(());
        }
        if scanner.match_str("...") {
            scanner.skip_space()?;
            collect_binding_names(scanner, names)?;
        } else {
            let shorthand = parse_property_key(scanner)?;
            scanner.skip_space()?;
            if scanner.match_str(":") {
                scanner.skip_space()?;
                collect_binding_names(scanner, names)?;
            } else {
                match shorthand {
                    Some(id) => names.push(id),
                    None => return Err(scanner.error_here(&messages::_0_EXPECTED, &[":"])),
                }
            }
            skip_default_value(scanner)?;
        }
        scanner.skip_space()?;
        if scanner.match_str(",") {
            continue;
        }
        return scanner.expect_str("}");
    }
}

fn collect_array_pattern(
    scanner: &mut Scanner<'_>,
    names: &mut Vec<Identifier>,
) -> ParseResult<()> {
    loop {
        scanner.skip_space()?;
        if scanner.match_str("]") {
            return Ok(());
        }
        // Elision
        if scanner.match_str(",") {
            continue;
        }
        if scanner.match_str("...") {
            scanner.skip_space()?;
        }
        collect_binding_names(scanner, names)?;
        skip_default_value(scanner)?;
        scanner.skip_space()?;
        if scanner.match_str(",") {
            continue;
        }
        return scanner.expect_str("]");
    }
}

/// Read an object pattern key. Returns the identifier when the key could
/// also be a shorthand binding.
fn parse_property_key(scanner: &mut Scanner<'_>) -> ParseResult<Option<Identifier>> {
    match scanner.current() {
        Some('\'' | '"') => {
            scanner.parse_string()?;
            Ok(None)
        }
        Some('[') => {
            scanner.skip_block(b'[', b']')?;
            Ok(None)
        }
        Some(ch) if ch.is_ascii_digit() => {
            scanner.parse_number()?;
            Ok(None)
        }
        _ => Ok(Some(scanner.parse_identifier()?)),
    }
}

fn skip_default_value(scanner: &mut Scanner<'_>) -> ParseResult<()> {
    scanner.skip_space()?;
    if scanner.peek_str("=") && !scanner.peek_str("==") {
        scanner.match_str("=");
        scanner.skip_space()?;
        scanner.skip_expression()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names_of(pattern: &str) -> Vec<String> {
        let mut scanner = Scanner::new(pattern);
        let mut names = Vec::new();
        collect_binding_names(&mut scanner, &mut names).unwrap();
        names.into_iter().map(|id| id.name).collect()
    }

    fn classify(text: &str) -> Expression {
        classify_expression(text, TextRange::new(0, text.len()))
    }

    #[test]
    fn test_object_pattern_names() {
        assert_eq!(names_of("{ a, b: c, d = 1 }"), vec!["a", "c", "d"]);
        assert_eq!(
            names_of("{ 'x-y': e, [key]: f, 0: g, ...rest }"),
            vec!["e", "f", "g", "rest"]
        );
    }

    #[test]
    fn test_nested_patterns() {
        assert_eq!(
            names_of("{ a: { b, c: [d, , e = f(1, 2)] }, g }"),
            vec!["b", "d", "e", "g"]
        );
        assert_eq!(names_of("[x, , y, ...z]"), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_pattern_requires_colon_after_computed_key() {
        let mut scanner = Scanner::new("{ [k] }");
        let mut names = Vec::new();
        let err = collect_binding_names(&mut scanner, &mut names).unwrap_err();
        assert_eq!(err.to_string(), "':' expected.");
    }

    #[test]
    fn test_classify_expression() {
        assert!(matches!(classify("foo"), Expression::Identifier(id) if id.name == "foo"));
        assert!(matches!(
            classify("'default'"),
            Expression::Literal(Literal { value: LiteralValue::String(s), .. }) if s == "default"
        ));
        assert!(matches!(
            classify("42"),
            Expression::Literal(Literal { value: LiteralValue::Number(n), .. }) if n == 42.0
        ));
        assert!(matches!(
            classify("foo.bar"),
            Expression::Literal(Literal { value: LiteralValue::Raw(s), .. }) if s == "foo.bar"
        ));
        assert!(matches!(
            classify("'a' + 'b'"),
            Expression::Literal(Literal { value: LiteralValue::Raw(_), .. })
        ));
    }
}
