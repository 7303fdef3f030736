use memchr::{memchr, memmem};

use crate::dialect::{closing_quote, Dialect};
use crate::params::ParamMatcher;
use crate::token::{Pos, Token, TokenType};

/// Scan position: byte offset into the source plus the matching character
/// offset reported on tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pub offset: usize,
    pub pos: Pos,
}

/// Single-pass tokenizer. Every input character belongs to exactly one token.
pub struct Lexer<'a> {
    source: &'a str,
    dialect: Dialect,
    params: &'a ParamMatcher,
    cursor: Cursor,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, dialect: Dialect, params: &'a ParamMatcher) -> Self {
        Self {
            source,
            dialect,
            params,
            cursor: Cursor::default(),
        }
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Scan the token at the cursor and advance past it.
    pub fn next_token(&mut self) -> Option<Token> {
        let (token, next) = self.scan_at(self.cursor)?;
        self.cursor = next;
        Some(token)
    }

    /// The next non-whitespace token after the cursor, without consuming it.
    pub fn peek_significant(&self) -> Option<Token> {
        let mut cursor = self.cursor;
        loop {
            let (token, next) = self.scan_at(cursor)?;
            if !token.is(TokenType::Whitespace) {
                return Some(token);
            }
            cursor = next;
        }
    }

    /// Lex the whole source.
    pub fn tokenize(self) -> Vec<Token> {
        self.collect()
    }

    fn scan_at(&self, cursor: Cursor) -> Option<(Token, Cursor)> {
        let remaining = &self.source[cursor.offset..];
        if remaining.is_empty() {
            return None;
        }
        let prev = self.source[..cursor.offset].chars().next_back();
        let (token_type, len) = self.classify(remaining, prev);

        let text = &remaining[..len];
        let chars = text.chars().count();
        let token = Token::new(token_type, text, cursor.pos, cursor.pos + chars - 1);
        let next = Cursor {
            offset: cursor.offset + len,
            pos: cursor.pos + chars,
        };
        Some((token, next))
    }

    /// Pick the token kind at the start of `remaining` and its byte length.
    /// First match wins.
    fn classify(&self, remaining: &str, prev: Option<char>) -> (TokenType, usize) {
        let bytes = remaining.as_bytes();
        let first = bytes[0];

        if is_whitespace(first) {
            return (TokenType::Whitespace, scan_whitespace(bytes));
        }
        if bytes.starts_with(b"--") {
            return (TokenType::CommentInline, scan_line_comment(bytes));
        }
        if bytes.starts_with(b"/*") {
            return (TokenType::CommentBlock, scan_block_comment(bytes));
        }
        if self.dialect.is_string_opener(first) {
            return (TokenType::String, scan_delimited(bytes, first, true));
        }
        if let Some(len) = scan_dollar_string(bytes) {
            return (TokenType::String, len);
        }
        if let Some(found) = self.scan_parameter(remaining, prev) {
            return found;
        }
        if self.dialect.is_quote_opener(first) {
            let len = scan_delimited(bytes, closing_quote(first), false);
            return (TokenType::Keyword, len);
        }
        if is_letter(first) {
            let len = scan_word(bytes);
            let upper = remaining[..len].to_ascii_uppercase();
            let token_type = if self.dialect.is_keyword(&upper) {
                TokenType::Keyword
            } else {
                TokenType::Unknown
            };
            return (token_type, len);
        }
        if first == b';' {
            return (TokenType::Semicolon, 1);
        }

        let len = remaining.chars().next().map_or(1, char::len_utf8);
        (TokenType::Unknown, len)
    }

    /// Parameter kinds are tried in order: positional, numbered, named,
    /// quoted, custom. A sigil that matches none degrades to `unknown`.
    fn scan_parameter(&self, remaining: &str, prev: Option<char>) -> Option<(TokenType, usize)> {
        let mut chars = remaining.chars();
        let sigil = chars.next()?;
        let next = chars.next();
        if !self.params.starts_parameter(sigil, next, prev, remaining) {
            return None;
        }

        let sigil_len = sigil.len_utf8();
        let after = &remaining.as_bytes()[sigil_len..];
        let opens_quote = next.is_some_and(|c| c.is_ascii() && self.dialect.is_quote_opener(c as u8));

        if self.params.is_numbered(sigil) && next.is_some_and(|c| c.is_ascii_digit()) {
            let run = scan_alphanumeric(after);
            if after[..run].iter().all(u8::is_ascii_digit) {
                return Some((TokenType::Parameter, sigil_len + run));
            }
        }

        if self.params.is_named(sigil) && !opens_quote {
            let run = scan_alphanumeric(after);
            return Some((TokenType::Parameter, sigil_len + run));
        }

        if self.params.is_quoted(sigil) && opens_quote {
            let close = closing_quote(after[0]);
            let body = &after[1..];
            let run = body
                .iter()
                .take_while(|&&b| b != close && (is_alphanumeric(b) || b == b' '))
                .count();
            let closed = usize::from(body.get(run) == Some(&close));
            return Some((TokenType::Parameter, sigil_len + 1 + run + closed));
        }

        if let Some(len) = self.params.match_custom(remaining) {
            return Some((TokenType::Parameter, len));
        }

        if !self.params.positional() && sigil != '?' {
            return Some((TokenType::Unknown, sigil_len));
        }
        Some((TokenType::Parameter, sigil_len))
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.next_token()
    }
}

#[inline]
fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

#[inline]
fn is_letter(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

#[inline]
fn is_alphanumeric(b: u8) -> bool {
    is_letter(b) || b.is_ascii_digit()
}

fn scan_whitespace(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|&&b| is_whitespace(b)).count()
}

/// Letters and underscores only; a digit ends the word.
fn scan_word(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|&&b| is_letter(b)).count()
}

fn scan_alphanumeric(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|&&b| is_alphanumeric(b)).count()
}

/// Line comment, including the terminating newline when present.
fn scan_line_comment(bytes: &[u8]) -> usize {
    match memchr(b'\n', bytes) {
        Some(offset) => offset + 1,
        None => bytes.len(),
    }
}

/// Block comment from `/*` through `*/`, or to end of input.
fn scan_block_comment(bytes: &[u8]) -> usize {
    match memmem::find(&bytes[2..], b"*/") {
        Some(offset) => offset + 4,
        None => bytes.len(),
    }
}

/// String literal or quoted identifier. `bytes[0]` is the opener. With
/// `doubled_escape`, a doubled closer is a literal quote, not the end.
fn scan_delimited(bytes: &[u8], close: u8, doubled_escape: bool) -> usize {
    let mut i = 1;
    while let Some(offset) = memchr(close, &bytes[i..]) {
        let pos = i + offset;
        if doubled_escape && bytes.get(pos + 1) == Some(&close) {
            i = pos + 2;
            continue;
        }
        return pos + 1;
    }
    bytes.len()
}

/// Dollar-quoted string (`$tag$...$tag$`). Returns `None` when `bytes` does
/// not start with an opening tag.
fn scan_dollar_string(bytes: &[u8]) -> Option<usize> {
    if bytes.first() != Some(&b'$') {
        return None;
    }
    let tag_end = 1 + scan_alphanumeric(&bytes[1..]);
    if bytes.get(tag_end) != Some(&b'$') {
        return None;
    }
    let tag = &bytes[..=tag_end];
    let body = &bytes[tag.len()..];
    match memmem::find(body, tag) {
        Some(offset) => Some(tag.len() + offset + tag.len()),
        None => Some(bytes.len()),
    }
}
