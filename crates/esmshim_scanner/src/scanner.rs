//! The module-level scanner.
//!
//! A cursor over immutable source text. The parser drives it directly:
//! there is no token stream, only matching primitives that either consume
//! input and succeed, or leave the position untouched. Everything the module
//! grammar does not model is stepped over as an opaque span.

use crate::char_codes::*;
use esmshim_ast::node::{Identifier, Literal, LiteralValue, NodeData, StringLiteral};
use esmshim_ast::syntax_kind::SyntaxKind;
use esmshim_core::text::TextRange;
use esmshim_diagnostics::{messages, DiagnosticMessage, ParseResult, SyntaxError};
use memchr::{memchr, memchr2, memmem};

/// Where an opaque span ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    /// An initializer or default-export value: stops before a top-level `,`
    /// or `;`.
    Expression,
    /// A whole unrecognized statement: consumes a top-level `;`, or ends
    /// after a top-level `{...}` block.
    Statement,
}

/// The scanner walks module source text one primitive at a time.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    /// The source text being scanned.
    text: &'a str,
    /// Current byte offset. Always `<= text.len()`.
    pos: usize,
}

impl<'a> Scanner<'a> {
    /// Create a new scanner positioned at the start of `text`.
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    /// The full source text.
    #[inline]
    pub fn text(&self) -> &'a str {
        self.text
    }

    /// The current position.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Move the cursor, clamped to the end of the text.
    #[inline]
    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos.min(self.text.len());
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.text.len()
    }

    /// The character at the current position.
    #[inline]
    pub fn current(&self) -> Option<char> {
        self.char_at(0)
    }

    /// The character starting `offset` bytes after the current position.
    pub fn char_at(&self, offset: usize) -> Option<char> {
        self.text
            .get(self.pos + offset..)
            .and_then(|rest| rest.chars().next())
    }

    #[inline]
    fn bytes(&self) -> &'a [u8] {
        self.text.as_bytes()
    }

    #[inline]
    fn byte_at(&self, offset: usize) -> Option<u8> {
        self.text.as_bytes().get(self.pos + offset).copied()
    }

    #[inline]
    fn current_byte(&self) -> Option<u8> {
        self.byte_at(0)
    }

    /// The unconsumed remainder of the text.
    pub fn remaining(&self) -> &'a str {
        self.text.get(self.pos..).unwrap_or("")
    }

    /// The source text covered by `range`.
    pub fn text_of(&self, range: TextRange) -> &'a str {
        range.slice(self.text)
    }

    /// Look ahead: save position, call f, restore position and return result.
    pub fn look_ahead<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let save_pos = self.pos;
        let result = f(self);
        self.pos = save_pos;
        result
    }

    /// Build an error located at the current position.
    pub fn error_here(&self, message: &DiagnosticMessage, args: &[&str]) -> SyntaxError {
        let len = self.current().map_or(0, char::len_utf8);
        SyntaxError::new(message, args, self.pos, len)
    }

    // ========================================================================
    // Trivia
    // ========================================================================

    /// Skip a shebang line at the very beginning of the file (e.g., `#!/usr/bin/env node`).
    pub fn skip_shebang(&mut self) {
        if self.pos == 0 && self.text.starts_with("#!") {
            let bytes = self.bytes();
            self.pos = memchr2(LINE_FEED, CARRIAGE_RETURN, bytes).unwrap_or(bytes.len());
        }
    }

    /// Skip whitespace, line terminators and comments.
    pub fn skip_space(&mut self) -> ParseResult<()> {
        self.skip_trivia().map(|_| ())
    }

    /// Skip whitespace, line terminators and comments, returning whether a
    /// line break was crossed (including one inside a block comment).
    pub fn skip_trivia(&mut self) -> ParseResult<bool> {
        let bytes = self.bytes();
        let mut crossed_line = false;
        loop {
            let Some(b) = self.current_byte() else {
                return Ok(crossed_line);
            };
            match b {
                b' ' | b'\t' | 0x0B | 0x0C => self.pos += 1,
                LINE_FEED | CARRIAGE_RETURN => {
                    crossed_line = true;
                    self.pos += 1;
                }
                SLASH if self.byte_at(1) == Some(SLASH) => {
                    let rest = &bytes[self.pos..];
                    self.pos += memchr2(LINE_FEED, CARRIAGE_RETURN, rest).unwrap_or(rest.len());
                }
                SLASH if self.byte_at(1) == Some(ASTERISK) => {
                    let start = self.pos;
                    let body = &bytes[start + 2..];
                    let Some(offset) = memmem::find(body, b"*/") else {
                        return Err(SyntaxError::new(
                            &messages::ASTERISK_SLASH_EXPECTED,
                            &[],
                            start,
                            2,
                        ));
                    };
                    if memchr2(LINE_FEED, CARRIAGE_RETURN, &body[..offset]).is_some() {
                        crossed_line = true;
                    }
                    self.pos = start + 2 + offset + 2;
                }
                0x80..=0xFF => match self.current() {
                    Some(ch) if is_line_break(ch) => {
                        crossed_line = true;
                        self.pos += ch.len_utf8();
                    }
                    Some(ch) if is_white_space_single_line(ch) => self.pos += ch.len_utf8(),
                    _ => return Ok(crossed_line),
                },
                _ => return Ok(crossed_line),
            }
        }
    }

    // ========================================================================
    // Matching
    // ========================================================================

    /// Whether the text at the cursor starts with `lit`.
    #[inline]
    pub fn peek_str(&self, lit: &str) -> bool {
        self.text.as_bytes()[self.pos..].starts_with(lit.as_bytes())
    }

    /// Consume `lit` if the text at the cursor starts with it.
    pub fn match_str(&mut self, lit: &str) -> bool {
        if self.peek_str(lit) {
            self.pos += lit.len();
            true
        } else {
            false
        }
    }

    /// Whether `kw` starts at the cursor as a whole word.
    pub fn peek_keyword(&self, kw: &str) -> bool {
        self.peek_str(kw) && !self.byte_at(kw.len()).is_some_and(is_identifier_part)
    }

    /// Consume `kw` only if it is followed by a non-identifier character.
    pub fn match_keyword(&mut self, kw: &str) -> bool {
        if self.peek_keyword(kw) {
            self.pos += kw.len();
            true
        } else {
            false
        }
    }

    /// Consume the keyword spelled by `kind`.
    pub fn match_keyword_kind(&mut self, kind: SyntaxKind) -> bool {
        kind.keyword_text().is_some_and(|kw| self.match_keyword(kw))
    }

    /// Consume `lit` or fail with `'<lit>' expected.`.
    pub fn expect_str(&mut self, lit: &str) -> ParseResult<()> {
        if self.match_str(lit) {
            Ok(())
        } else {
            Err(self.error_here(&messages::_0_EXPECTED, &[lit]))
        }
    }

    /// Consume the keyword `kw` or fail with `'<kw>' expected.`.
    pub fn expect_keyword(&mut self, kw: &str) -> ParseResult<()> {
        if self.match_keyword(kw) {
            Ok(())
        } else {
            Err(self.error_here(&messages::_0_EXPECTED, &[kw]))
        }
    }

    /// Whether an identifier starts at the cursor.
    pub fn at_identifier_start(&self) -> bool {
        self.current_byte().is_some_and(is_identifier_start)
    }

    /// Advance just past the next occurrence of `b`, or to the end of input.
    /// Returns whether `b` was found.
    pub fn skip_past(&mut self, b: u8) -> bool {
        let rest = &self.text.as_bytes()[self.pos..];
        match memchr(b, rest) {
            Some(offset) => {
                self.pos += offset + 1;
                true
            }
            None => {
                self.pos = self.text.len();
                false
            }
        }
    }

    // ========================================================================
    // Reading
    // ========================================================================

    /// Read an identifier: `[A-Za-z_$][A-Za-z0-9_$]*`.
    pub fn parse_identifier(&mut self) -> ParseResult<Identifier> {
        let start = self.pos;
        if !self.at_identifier_start() {
            return Err(self.error_here(&messages::IDENTIFIER_EXPECTED, &[]));
        }
        self.pos += 1;
        self.skip_identifier_parts();
        Ok(Identifier::new(&self.text[start..self.pos], start, self.pos))
    }

    #[inline]
    fn skip_identifier_parts(&mut self) {
        while self.current_byte().is_some_and(is_identifier_part) {
            self.pos += 1;
        }
    }

    /// Read a `'` or `"` delimited string. The value is the raw text between
    /// the quotes; escapes are kept as written.
    pub fn parse_string(&mut self) -> ParseResult<StringLiteral> {
        let start = self.pos;
        let quote = match self.current_byte() {
            Some(q @ (SINGLE_QUOTE | DOUBLE_QUOTE)) => q,
            _ => return Err(self.error_here(&messages::STRING_LITERAL_EXPECTED, &[])),
        };
        self.skip_quoted(quote)?;
        Ok(StringLiteral {
            data: NodeData::new(SyntaxKind::StringLiteral, start, self.pos),
            value: self.text[start + 1..self.pos - 1].to_string(),
        })
    }

    /// Read a decimal number: optional integer digits, optional `.` and
    /// fraction digits.
    pub fn parse_number(&mut self) -> ParseResult<Literal> {
        let start = self.pos;
        while self.current_byte().is_some_and(is_digit) {
            self.pos += 1;
        }
        if self.current_byte() == Some(DOT) {
            self.pos += 1;
            while self.current_byte().is_some_and(is_digit) {
                self.pos += 1;
            }
        }
        let raw = &self.text[start..self.pos];
        if !raw.bytes().any(is_digit) {
            self.pos = start;
            return Err(self.error_here(&messages::DIGIT_EXPECTED, &[]));
        }
        let value: f64 = raw
            .parse()
            .map_err(|_| SyntaxError::new(&messages::DIGIT_EXPECTED, &[], start, raw.len()))?;
        Ok(Literal {
            data: NodeData::new(SyntaxKind::Literal, start, self.pos),
            value: LiteralValue::Number(value),
        })
    }

    // ========================================================================
    // Literal skipping
    // ========================================================================

    fn skip_quoted(&mut self, quote: u8) -> ParseResult<()> {
        let bytes = self.bytes();
        let start = self.pos;
        self.pos += 1;
        loop {
            match bytes.get(self.pos).copied() {
                None | Some(LINE_FEED) | Some(CARRIAGE_RETURN) => {
                    let end = self.pos.min(bytes.len());
                    self.pos = end;
                    return Err(SyntaxError::new(
                        &messages::UNTERMINATED_STRING_LITERAL,
                        &[],
                        start,
                        end - start,
                    ));
                }
                Some(BACKSLASH) => {
                    // A line continuation may be a CRLF pair.
                    let skip = if bytes.get(self.pos + 1) == Some(&CARRIAGE_RETURN)
                        && bytes.get(self.pos + 2) == Some(&LINE_FEED)
                    {
                        3
                    } else {
                        2
                    };
                    self.pos += skip;
                }
                Some(b) if b == quote => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    fn skip_template(&mut self) -> ParseResult<()> {
        let bytes = self.bytes();
        let start = self.pos;
        self.pos += 1;
        loop {
            match bytes.get(self.pos).copied() {
                None => {
                    self.pos = bytes.len();
                    return Err(SyntaxError::new(
                        &messages::UNTERMINATED_TEMPLATE_LITERAL,
                        &[],
                        start,
                        bytes.len() - start,
                    ));
                }
                Some(BACKSLASH) => self.pos += 2,
                Some(BACKTICK) => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(DOLLAR_SIGN) if bytes.get(self.pos + 1) == Some(&OPEN_BRACE) => {
                    self.pos += 1;
                    self.skip_block(OPEN_BRACE, CLOSE_BRACE)?;
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    /// Skip a regular expression literal. If no closing `/` is found on the
    /// same line, the slash was a division and only it is consumed.
    fn skip_regex(&mut self) {
        let bytes = self.bytes();
        let start = self.pos;
        self.pos += 1;
        let mut in_class = false;
        while let Some(b) = bytes.get(self.pos).copied() {
            match b {
                LINE_FEED | CARRIAGE_RETURN => break,
                BACKSLASH => self.pos += 2,
                OPEN_BRACKET => {
                    in_class = true;
                    self.pos += 1;
                }
                CLOSE_BRACKET => {
                    in_class = false;
                    self.pos += 1;
                }
                SLASH if !in_class => {
                    self.pos += 1;
                    self.skip_identifier_parts();
                    return;
                }
                _ => self.pos += 1,
            }
        }
        self.pos = start + 1;
    }

    /// Whether a `/` at the cursor starts a regex, judged by the preceding
    /// token: a punctuator, or a keyword such as `return` or `typeof`.
    fn regex_allowed_here(&self) -> bool {
        let before = &self.text.as_bytes()[..self.pos];
        let Some(last) = before.iter().rposition(|b| !b.is_ascii_whitespace()) else {
            return true;
        };
        if !is_identifier_part(before[last]) {
            return regex_allowed_after(Some(before[last]));
        }
        let start = before[..last]
            .iter()
            .rposition(|&b| !is_identifier_part(b))
            .map_or(0, |i| i + 1);
        // `obj.return / 2` is a property access
        let is_member = start > 0 && before[start - 1] == DOT;
        !is_member && regex_allowed_after_word(&before[start..=last])
    }

    /// Step over a string, template or regex literal starting with `b`.
    /// Returns false if `b` starts none of them.
    fn skip_literal(&mut self, b: u8) -> ParseResult<bool> {
        match b {
            SINGLE_QUOTE | DOUBLE_QUOTE => self.skip_quoted(b)?,
            BACKTICK => self.skip_template()?,
            SLASH if self.regex_allowed_here() => self.skip_regex(),
            _ => return Ok(false),
        }
        Ok(true)
    }

    // ========================================================================
    // Span skipping
    // ========================================================================

    /// Skip from the opening delimiter at the cursor to its match, returning
    /// the covered range (both delimiters included).
    pub fn skip_block(&mut self, open: u8, close: u8) -> ParseResult<TextRange> {
        let start = self.pos;
        if self.current_byte() != Some(open) {
            return Err(self.error_here(&messages::_0_EXPECTED, &[delimiter_text(open)]));
        }
        self.pos += 1;
        let mut depth = 1usize;
        loop {
            self.skip_trivia()?;
            let Some(b) = self.current_byte() else {
                return Err(SyntaxError::new(
                    &messages::_0_EXPECTED,
                    &[delimiter_text(close)],
                    start,
                    1,
                ));
            };
            if self.skip_literal(b)? {
                continue;
            }
            self.pos += 1;
            if b == open {
                depth += 1;
            } else if b == close {
                depth -= 1;
                if depth == 0 {
                    return Ok(TextRange::new(start, self.pos));
                }
            }
        }
    }

    /// Skip a parenthesized list.
    pub fn skip_parens(&mut self) -> ParseResult<TextRange> {
        self.skip_block(OPEN_PAREN, CLOSE_PAREN)
    }

    /// Skip an expression, stopping before a top-level `;` or `,`, before an
    /// unmatched closer, at end of input, or at a line break where automatic
    /// semicolon insertion ends the statement. The returned range excludes
    /// trailing trivia and the cursor is left at its end.
    pub fn skip_expression(&mut self) -> ParseResult<TextRange> {
        self.skip_to_boundary(Boundary::Expression)
    }

    /// Skip an unrecognized statement: through the next top-level `;`, or
    /// through the `}` closing a top-level block. Always consumes at least one
    /// character when not at end of input.
    pub fn skip_statement(&mut self) -> ParseResult<TextRange> {
        self.skip_to_boundary(Boundary::Statement)
    }

    fn skip_to_boundary(&mut self, mode: Boundary) -> ParseResult<TextRange> {
        let bytes = self.bytes();
        let start = self.pos;
        let mut last_end = start;
        let mut depth = 0usize;
        loop {
            let crossed_line = self.skip_trivia()?;
            let Some(b) = self.current_byte() else {
                break;
            };
            if depth == 0 {
                if crossed_line
                    && last_end > start
                    && !expects_continuation(bytes[last_end - 1])
                    && !continues_expression(b)
                {
                    break;
                }
                match b {
                    SEMICOLON => {
                        if mode == Boundary::Statement {
                            self.pos += 1;
                            last_end = self.pos;
                        }
                        break;
                    }
                    COMMA if mode == Boundary::Expression => break,
                    CLOSE_PAREN | CLOSE_BRACE | CLOSE_BRACKET => {
                        // A stray closer is a statement of its own.
                        if mode == Boundary::Statement && last_end == start {
                            self.pos += 1;
                            last_end = self.pos;
                        }
                        break;
                    }
                    _ => {}
                }
            }
            if self.skip_literal(b)? {
                last_end = self.pos;
                continue;
            }
            match b {
                OPEN_PAREN | OPEN_BRACE | OPEN_BRACKET => {
                    depth += 1;
                    self.pos += 1;
                }
                CLOSE_PAREN | CLOSE_BRACE | CLOSE_BRACKET => {
                    depth -= 1;
                    self.pos += 1;
                    if depth == 0 && b == CLOSE_BRACE && mode == Boundary::Statement {
                        self.skip_trailing_semicolon();
                        last_end = self.pos;
                        break;
                    }
                }
                _ if is_identifier_part(b) => self.skip_identifier_parts(),
                _ => self.pos += self.current().map_or(1, char::len_utf8),
            }
            last_end = self.pos;
        }
        self.pos = last_end;
        Ok(TextRange::new(start, last_end))
    }

    /// Skip a class heritage clause up to the next top-level `{`, leaving the
    /// cursor on it. The returned range excludes trailing trivia.
    pub fn skip_to_block(&mut self) -> ParseResult<TextRange> {
        let start = self.pos;
        let mut last_end = start;
        let mut depth = 0usize;
        loop {
            self.skip_trivia()?;
            let Some(b) = self.current_byte() else {
                return Err(self.error_here(&messages::_0_EXPECTED, &["{"]));
            };
            if depth == 0 && b == OPEN_BRACE {
                return Ok(TextRange::new(start, last_end));
            }
            if self.skip_literal(b)? {
                last_end = self.pos;
                continue;
            }
            match b {
                OPEN_PAREN | OPEN_BRACKET | OPEN_BRACE => depth += 1,
                CLOSE_PAREN | CLOSE_BRACKET | CLOSE_BRACE => depth = depth.saturating_sub(1),
                _ => {}
            }
            self.pos += self.current().map_or(1, char::len_utf8);
            last_end = self.pos;
        }
    }

    /// Consume a `;` that follows on the same line.
    fn skip_trailing_semicolon(&mut self) {
        let save_pos = self.pos;
        while matches!(self.current_byte(), Some(b' ' | b'\t')) {
            self.pos += 1;
        }
        if self.current_byte() == Some(SEMICOLON) {
            self.pos += 1;
        } else {
            self.pos = save_pos;
        }
    }

    /// The next identifier-like word, stepping over strings, templates,
    /// regular expressions and comments.
    pub fn next_word(&mut self) -> ParseResult<Option<&'a str>> {
        loop {
            self.skip_trivia()?;
            let Some(b) = self.current_byte() else {
                return Ok(None);
            };
            if self.skip_literal(b)? {
                continue;
            }
            if is_identifier_start(b) {
                let start = self.pos;
                self.skip_identifier_parts();
                return Ok(Some(&self.text[start..self.pos]));
            }
            if is_digit(b) {
                self.skip_identifier_parts();
                continue;
            }
            self.pos += self.current().map_or(1, char::len_utf8);
        }
    }
}

fn delimiter_text(b: u8) -> &'static str {
    match b {
        OPEN_PAREN => "(",
        CLOSE_PAREN => ")",
        OPEN_BRACE => "{",
        CLOSE_BRACE => "}",
        OPEN_BRACKET => "[",
        CLOSE_BRACKET => "]",
        _ => "?",
    }
}
