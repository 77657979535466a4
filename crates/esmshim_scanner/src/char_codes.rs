//! Character code constants and classification used by the scanner.
//!
//! Identifiers are ASCII-only: `[A-Za-z_$][A-Za-z0-9_$]*`.

pub const LINE_FEED: u8 = b'\n';
pub const CARRIAGE_RETURN: u8 = b'\r';
pub const LINE_SEPARATOR: char = '\u{2028}';
pub const PARAGRAPH_SEPARATOR: char = '\u{2029}';

pub const SINGLE_QUOTE: u8 = b'\'';
pub const DOUBLE_QUOTE: u8 = b'"';
pub const BACKTICK: u8 = b'`';
pub const BACKSLASH: u8 = b'\\';
pub const DOLLAR_SIGN: u8 = b'$';
pub const SLASH: u8 = b'/';
pub const ASTERISK: u8 = b'*';
pub const DOT: u8 = b'.';
pub const SEMICOLON: u8 = b';';
pub const COMMA: u8 = b',';

pub const OPEN_PAREN: u8 = b'(';
pub const CLOSE_PAREN: u8 = b')';
pub const OPEN_BRACE: u8 = b'{';
pub const CLOSE_BRACE: u8 = b'}';
pub const OPEN_BRACKET: u8 = b'[';
pub const CLOSE_BRACKET: u8 = b']';

/// Check if a character is a line terminator.
#[inline]
pub fn is_line_break(ch: char) -> bool {
    ch == '\n' || ch == '\r' || ch == LINE_SEPARATOR || ch == PARAGRAPH_SEPARATOR
}

/// Check if a character is whitespace (not line break).
#[inline]
pub fn is_white_space_single_line(ch: char) -> bool {
    matches!(
        ch,
        ' ' | '\t'
            | '\u{000B}' // vertical tab
            | '\u{000C}' // form feed
            | '\u{00A0}' // no-break space
            | '\u{1680}' // ogham space mark
            | '\u{2000}'..='\u{200A}' // various spaces
            | '\u{202F}' // narrow no-break space
            | '\u{205F}' // medium mathematical space
            | '\u{3000}' // ideographic space
            | '\u{FEFF}' // BOM / zero-width no-break space
    )
}

#[inline]
pub fn is_digit(b: u8) -> bool {
    b.is_ascii_digit()
}

#[inline]
pub fn is_identifier_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == DOLLAR_SIGN
}

#[inline]
pub fn is_identifier_part(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == DOLLAR_SIGN
}

/// Whether a `/` following `prev` starts a regular expression literal rather
/// than a division.
#[inline]
pub fn regex_allowed_after(prev: Option<u8>) -> bool {
    match prev {
        None => true,
        Some(b) => matches!(
            b,
            b'(' | b',' | b'=' | b':' | b'[' | b'!' | b'&' | b'|' | b'?' | b'{' | b'}' | b';'
                | b'+' | b'-' | b'*' | b'%' | b'<' | b'>' | b'~' | b'^'
        ),
    }
}

/// Keywords after which a `/` starts a regular expression literal.
#[inline]
pub fn regex_allowed_after_word(word: &[u8]) -> bool {
    matches!(
        word,
        b"return"
            | b"typeof"
            | b"case"
            | b"throw"
            | b"in"
            | b"of"
            | b"void"
            | b"delete"
            | b"yield"
            | b"await"
            | b"instanceof"
            | b"new"
            | b"else"
            | b"do"
    )
}

/// Whether an expression ending in `prev` must continue on the next line.
#[inline]
pub fn expects_continuation(prev: u8) -> bool {
    matches!(
        prev,
        b'=' | b'+' | b'-' | b'*' | b'/' | b'%' | b'&' | b'|' | b'^' | b'!' | b'~' | b'?' | b':'
            | b'.' | b',' | b'<' | b'>' | b'(' | b'[' | b'{'
    )
}

/// Whether a line starting with `next` continues the previous expression.
#[inline]
pub fn continues_expression(next: u8) -> bool {
    matches!(
        next,
        b'.' | b'(' | b'[' | b'?' | b'+' | b'-' | b'*' | b'/' | b'%' | b'&' | b'|' | b'^' | b'='
            | b'<' | b'>' | b',' | b'`'
    )
}
