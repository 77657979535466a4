//! Emission helpers shared by the AST and fallback paths.

use esmshim_scanner::Scanner;

/// Quote a raw (undecoded) string literal value for emission.
///
/// Single quotes are used unless the value contains one; then double quotes
/// unless the value contains those too, in which case bare single quotes are
/// escaped.
pub fn quote_string(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{}'", value);
    }
    if !value.contains('"') {
        return format!("\"{}\"", value);
    }

    let mut quoted = String::with_capacity(value.len() + 4);
    quoted.push('\'');
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                quoted.push(ch);
                if let Some(escaped) = chars.next() {
                    quoted.push(escaped);
                }
            }
            '\'' => quoted.push_str("\\'"),
            _ => quoted.push(ch),
        }
    }
    quoted.push('\'');
    quoted
}

/// Whether a top-level statement's text uses `await` outside any async
/// function: the word `await` appears before any `async` word.
///
/// Text that cannot be scanned is treated as not awaiting.
pub fn contains_top_level_await(text: &str) -> bool {
    let mut scanner = Scanner::new(text);
    while let Ok(Some(word)) = scanner.next_word() {
        match word {
            "await" => return true,
            "async" => return false,
            _ => {}
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_string() {
        assert_eq!(quote_string("./dep.js"), "'./dep.js'");
        assert_eq!(quote_string("it's"), "\"it's\"");
        assert_eq!(quote_string(r#"it's "x""#), r#"'it\'s "x"'"#);
        assert_eq!(quote_string(r#"a\'b "c""#), r#"'a\'b "c"'"#);
    }

    #[test]
    fn test_top_level_await() {
        assert!(contains_top_level_await("const data = await load();"));
        assert!(contains_top_level_await("for await (const x of stream) { use(x); }"));
        assert!(!contains_top_level_await("run(async () => { await tick(); });"));
        assert!(!contains_top_level_await("log('await'); // await"));
        assert!(!contains_top_level_await("const awaiting = 1;"));
    }
}
