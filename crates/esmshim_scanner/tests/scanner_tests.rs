//! Scanner integration tests.
//!
//! Verifies the matching, reading and span-skipping primitives the parser is
//! built on.

use esmshim_ast::node::LiteralValue;
use esmshim_ast::syntax_kind::SyntaxKind;
use esmshim_scanner::Scanner;

/// Helper: skip one expression from the start of `source` and return its text.
fn expression_text(source: &str) -> &str {
    let mut scanner = Scanner::new(source);
    let range = scanner.skip_expression().unwrap();
    scanner.text_of(range)
}

/// Helper: skip one opaque statement from the start of `source` and return its text.
fn statement_text(source: &str) -> &str {
    let mut scanner = Scanner::new(source);
    let range = scanner.skip_statement().unwrap();
    scanner.text_of(range)
}

/// Helper: collect every word `next_word` yields.
fn words(source: &str) -> Vec<&str> {
    let mut scanner = Scanner::new(source);
    let mut words = Vec::new();
    while let Some(word) = scanner.next_word().unwrap() {
        words.push(word);
    }
    words
}

// ============================================================================
// Trivia
// ============================================================================

#[test]
fn test_skip_space_over_comments() {
    let mut scanner = Scanner::new("  // line\n  /* block\n */\t import");
    scanner.skip_space().unwrap();
    assert!(scanner.peek_keyword("import"));
}

#[test]
fn test_skip_trivia_reports_line_breaks() {
    let mut scanner = Scanner::new("  /* a\nb */ x");
    assert!(scanner.skip_trivia().unwrap());

    let mut scanner = Scanner::new("  /* ab */ x");
    assert!(!scanner.skip_trivia().unwrap());
}

#[test]
fn test_unicode_whitespace() {
    let mut scanner = Scanner::new("\u{FEFF}\u{00A0}\u{2028}export");
    assert!(scanner.skip_trivia().unwrap());
    assert!(scanner.peek_keyword("export"));
}

#[test]
fn test_unterminated_block_comment() {
    let mut scanner = Scanner::new("a /* never closed");
    scanner.set_pos(2);
    let err = scanner.skip_space().unwrap_err();
    assert_eq!(err.code, 1010);
    assert_eq!(err.range().pos, 2);
}

// ============================================================================
// Matching
// ============================================================================

#[test]
fn test_keyword_requires_word_boundary() {
    let mut scanner = Scanner::new("constant = 1");
    assert!(!scanner.match_keyword("const"));
    assert_eq!(scanner.pos(), 0);

    let mut scanner = Scanner::new("const{a} = b");
    assert!(scanner.match_keyword_kind(SyntaxKind::ConstKeyword));
    assert_eq!(scanner.pos(), 5);
}

#[test]
fn test_expect_reports_missing_literal() {
    let mut scanner = Scanner::new("x 'm'");
    let err = scanner.expect_keyword("from").unwrap_err();
    assert_eq!(err.to_string(), "'from' expected.");
    assert_eq!(scanner.pos(), 0);
}

#[test]
fn test_look_ahead_restores_position() {
    let mut scanner = Scanner::new("async function f() {}");
    let is_async_function = scanner.look_ahead(|s| {
        s.match_keyword("async") && s.skip_space().is_ok() && s.match_keyword("function")
    });
    assert!(is_async_function);
    assert_eq!(scanner.pos(), 0);
}

// ============================================================================
// Reading
// ============================================================================

#[test]
fn test_parse_identifier() {
    let mut scanner = Scanner::new("$_foo9 = 1");
    let id = scanner.parse_identifier().unwrap();
    assert_eq!(id.name, "$_foo9");
    assert_eq!(id.data.range.pos, 0);
    assert_eq!(id.data.range.end, 6);

    let mut scanner = Scanner::new("9lives");
    assert_eq!(scanner.parse_identifier().unwrap_err().code, 1003);
}

#[test]
fn test_parse_string_keeps_escapes_raw() {
    let mut scanner = Scanner::new(r#"'it\'s' "a\"b""#);
    assert_eq!(scanner.parse_string().unwrap().value, r"it\'s");
    scanner.skip_space().unwrap();
    let lit = scanner.parse_string().unwrap();
    assert_eq!(lit.value, r#"a\"b"#);
    assert!(scanner.is_eof());
}

#[test]
fn test_parse_string_errors() {
    let mut scanner = Scanner::new("'./mod.js\nfoo");
    assert_eq!(scanner.parse_string().unwrap_err().code, 1002);

    let mut scanner = Scanner::new("'open");
    assert_eq!(scanner.parse_string().unwrap_err().code, 1002);

    let mut scanner = Scanner::new("mod");
    assert_eq!(scanner.parse_string().unwrap_err().code, 1141);
}

#[test]
fn test_parse_number() {
    let mut scanner = Scanner::new("3.14;");
    let lit = scanner.parse_number().unwrap();
    assert_eq!(lit.value, LiteralValue::Number(3.14));
    assert_eq!(scanner.pos(), 4);

    let mut scanner = Scanner::new(".5");
    assert_eq!(scanner.parse_number().unwrap().value, LiteralValue::Number(0.5));

    let mut scanner = Scanner::new("x");
    assert_eq!(scanner.parse_number().unwrap_err().code, 1124);
    assert_eq!(scanner.pos(), 0);
}

// ============================================================================
// Span skipping
// ============================================================================

#[test]
fn test_skip_block_ignores_delimiters_in_literals() {
    let source = "{ a = \"}\"; b = `${ {c: '}'} }`; /* } */ d = /}/; // }\n }rest";
    let mut scanner = Scanner::new(source);
    let range = scanner.skip_block(b'{', b'}').unwrap();
    assert_eq!(&source[range.end..], "rest");
}

#[test]
fn test_skip_block_division_is_not_regex() {
    let source = "{ x = a / b; y = (c) / 2 }";
    let mut scanner = Scanner::new(source);
    let range = scanner.skip_block(b'{', b'}').unwrap();
    assert_eq!(range.end, source.len());
}

#[test]
fn test_skip_block_regex_after_keyword() {
    for source in [
        "{ return /}/.test(s); }rest",
        "{ if (typeof /[}]/ === 'object') throw /}/; }rest",
        "{ case 1: x = a in /}/; }rest",
    ] {
        let mut scanner = Scanner::new(source);
        let range = scanner.skip_block(b'{', b'}').unwrap();
        assert_eq!(&source[range.end..], "rest", "source: {:?}", source);
    }
}

#[test]
fn test_skip_block_keyword_like_names_divide() {
    let source = "{ x = returned / 2; y = obj.return / 3 }rest";
    let mut scanner = Scanner::new(source);
    let range = scanner.skip_block(b'{', b'}').unwrap();
    assert_eq!(&source[range.end..], "rest");
}

#[test]
fn test_skip_block_unmatched() {
    let mut scanner = Scanner::new("{ if (a) { b(); }");
    let err = scanner.skip_block(b'{', b'}').unwrap_err();
    assert_eq!(err.to_string(), "'}' expected.");
    assert_eq!(err.range().pos, 0);
}

#[test]
fn test_skip_parens() {
    let mut scanner = Scanner::new("(a, { b = ')' }) {}");
    let range = scanner.skip_parens().unwrap();
    assert_eq!(scanner.text_of(range), "(a, { b = ')' })");
}

#[test]
fn test_skip_expression_stops_at_top_level_comma() {
    assert_eq!(expression_text("1 + f(a, b), c = 2"), "1 + f(a, b)");
    assert_eq!(expression_text("[1, 2];"), "[1, 2]");
    assert_eq!(expression_text("{ a: 1, b: 2 }\n"), "{ a: 1, b: 2 }");
}

#[test]
fn test_skip_expression_automatic_semicolon() {
    assert_eq!(expression_text("foo\nbar"), "foo");
    assert_eq!(expression_text("a +\n  b\nc"), "a +\n  b");
    assert_eq!(expression_text("fetch(x)\n  .then(y)\nz()"), "fetch(x)\n  .then(y)");
    assert_eq!(expression_text("() => {\n  work();\n}\nexport"), "() => {\n  work();\n}");
}

#[test]
fn test_skip_expression_excludes_trailing_comment() {
    let mut scanner = Scanner::new("42 // answer\n;");
    let range = scanner.skip_expression().unwrap();
    assert_eq!(scanner.text_of(range), "42");
    assert_eq!(scanner.pos(), 2);
}

#[test]
fn test_skip_statement_forms() {
    assert_eq!(statement_text("console.log(1);\nexport const a = 1;"), "console.log(1);");
    assert_eq!(statement_text("if (a) { b(); } else {}"), "if (a) { b(); }");
    assert_eq!(statement_text("x = { a: 1 };\ny()"), "x = { a: 1 };");
    assert_eq!(statement_text("run()\nexport default 1"), "run()");
    assert_eq!(statement_text("} trailing"), "}");
}

#[test]
fn test_skip_statement_for_header() {
    let source = "for (let i = 0; i < 3; i++) { total += i; }\nnext();";
    assert_eq!(
        statement_text(source),
        "for (let i = 0; i < 3; i++) { total += i; }"
    );
}

#[test]
fn test_skip_statement_unterminated_template() {
    let mut scanner = Scanner::new("log(`oops");
    assert_eq!(scanner.skip_statement().unwrap_err().code, 1160);
}

#[test]
fn test_next_word_skips_strings_and_comments() {
    assert_eq!(
        words("const s = 'await'; // await\nawait load(1)"),
        vec!["const", "s", "await", "load"]
    );
    assert_eq!(words("x = /await/g.test(y)"), vec!["x", "test", "y"]);
}

#[test]
fn test_skip_past() {
    let mut scanner = Scanner::new("a, b) {}");
    assert!(scanner.skip_past(b')'));
    assert_eq!(scanner.remaining(), " {}");
    assert!(!scanner.skip_past(b')'));
    assert!(scanner.is_eof());
}
