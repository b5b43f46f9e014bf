//! Tokenizer for path expressions
//!
//! Covers the Go expression tokens a path can contain: identifiers, number,
//! rune and string literals, and the unary and binary operators. Literal
//! text is decoded here; numbers are converted by the constant folder.

use std::iter::Peekable;
use std::str::CharIndices;

use crate::error::PathError;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    /// Integer literal text with `_` separators removed
    Int(String),
    /// Decimal float literal text with `_` separators removed
    Float(String),
    /// Imaginary literal (rejected by the folder)
    Imag(String),
    Rune(char),
    String(String),

    Dot,
    Comma,
    LBracket,
    RBracket,
    LParen,
    RParen,

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Amp,
    Pipe,
    Caret,
    AndNot,
    Shl,
    Shr,
    AndAnd,
    OrOr,
    Bang,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset of the first character
    pub offset: usize,
}

pub struct Lexer<'src> {
    source: &'src str,
    chars: Peekable<CharIndices<'src>>,
    start: usize,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            start: 0,
        }
    }

    /// Tokenize the whole input; the last token is always `Eof`
    pub fn tokenize(mut self) -> Result<Vec<Token>, PathError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn advance(&mut self) -> Option<char> {
        self.chars.next().map(|(_, c)| c)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn peek_second(&self) -> Option<char> {
        let mut ahead = self.chars.clone();
        ahead.next();
        ahead.next().map(|(_, c)| c)
    }

    fn offset(&mut self) -> usize {
        self.chars
            .peek()
            .map_or(self.source.len(), |(i, _)| *i)
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn make(&self, kind: TokenKind) -> Token {
        Token {
            kind,
            offset: self.start,
        }
    }

    fn error(&self, message: impl Into<String>) -> PathError {
        PathError::parse(self.start, message)
    }

    fn next_token(&mut self) -> Result<Token, PathError> {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance();
        }
        self.start = self.offset();

        let Some(c) = self.advance() else {
            return Ok(self.make(TokenKind::Eof));
        };

        let kind = match c {
            '.' if self.peek().is_some_and(|d| d.is_ascii_digit()) => return self.number('.'),
            '.' => TokenKind::Dot,
            ',' => TokenKind::Comma,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '^' => TokenKind::Caret,
            '&' => {
                if self.match_char('&') {
                    TokenKind::AndAnd
                } else if self.match_char('^') {
                    TokenKind::AndNot
                } else {
                    TokenKind::Amp
                }
            }
            '|' => {
                if self.match_char('|') {
                    TokenKind::OrOr
                } else {
                    TokenKind::Pipe
                }
            }
            '!' => {
                if self.match_char('=') {
                    TokenKind::NotEq
                } else {
                    TokenKind::Bang
                }
            }
            '=' => {
                if self.match_char('=') {
                    TokenKind::EqEq
                } else {
                    return Err(self.error("unexpected '='"));
                }
            }
            '<' => {
                if self.match_char('<') {
                    TokenKind::Shl
                } else if self.match_char('=') {
                    TokenKind::LtEq
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.match_char('>') {
                    TokenKind::Shr
                } else if self.match_char('=') {
                    TokenKind::GtEq
                } else {
                    TokenKind::Gt
                }
            }
            '"' => TokenKind::String(self.interpreted_string()?),
            '`' => TokenKind::String(self.raw_string()?),
            '\'' => TokenKind::Rune(self.rune()?),
            c if c.is_ascii_digit() => return self.number(c),
            c if c == '_' || c.is_alphabetic() => {
                let mut ident = String::from(c);
                while let Some(next) = self.peek() {
                    if next == '_' || next.is_alphanumeric() {
                        ident.push(next);
                        self.advance();
                    } else {
                        break;
                    }
                }
                TokenKind::Ident(ident)
            }
            other => return Err(self.error(format!("unexpected character {:?}", other))),
        };
        Ok(self.make(kind))
    }

    fn digits(&mut self, text: &mut String, accept: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if c == '_' {
                self.advance();
            } else if accept(c) {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
    }

    fn number(&mut self, first: char) -> Result<Token, PathError> {
        let mut text = String::from(first);

        if first == '0' {
            if let Some(prefix @ ('x' | 'X' | 'b' | 'B' | 'o' | 'O')) = self.peek() {
                self.advance();
                text.push(prefix.to_ascii_lowercase());
                let radix = match prefix.to_ascii_lowercase() {
                    'x' => 16,
                    'b' => 2,
                    _ => 8,
                };
                self.digits(&mut text, |c| c.is_digit(radix) || c.is_ascii_hexdigit());
                if text.len() == 2 {
                    return Err(self.error(format!("{} has no digits", text)));
                }
                if matches!(self.peek(), Some('.' | 'p' | 'P')) && radix == 16 {
                    return Err(self.error("hexadecimal floating-point literals are not supported"));
                }
                return self.finish_number(TokenKind::Int(text));
            }
        }

        let mut is_float = first == '.';
        if first != '.' {
            self.digits(&mut text, |c| c.is_ascii_digit());
            if self.peek() == Some('.') {
                self.advance();
                text.push('.');
                is_float = true;
            }
        }
        if is_float {
            self.digits(&mut text, |c| c.is_ascii_digit());
        }
        if let Some(e @ ('e' | 'E')) = self.peek() {
            let signed = matches!(self.peek_second(), Some('+' | '-'));
            self.advance();
            text.push(e);
            if signed {
                if let Some(sign) = self.advance() {
                    text.push(sign);
                }
            }
            let before = text.len();
            self.digits(&mut text, |c| c.is_ascii_digit());
            if text.len() == before {
                return Err(self.error("exponent has no digits"));
            }
            is_float = true;
        }

        if is_float {
            self.finish_number(TokenKind::Float(text))
        } else {
            self.finish_number(TokenKind::Int(text))
        }
    }

    fn finish_number(&mut self, kind: TokenKind) -> Result<Token, PathError> {
        if self.match_char('i') {
            let text = match kind {
                TokenKind::Int(t) | TokenKind::Float(t) => t,
                _ => String::new(),
            };
            return Ok(self.make(TokenKind::Imag(text)));
        }
        if self.peek().is_some_and(|c| c == '_' || c.is_alphanumeric()) {
            return Err(self.error("invalid character in number literal"));
        }
        Ok(self.make(kind))
    }

    fn interpreted_string(&mut self) -> Result<String, PathError> {
        let mut bytes = Vec::new();
        loop {
            match self.advance() {
                None | Some('\n') => return Err(self.error("string literal not terminated")),
                Some('"') => break,
                Some('\\') => {
                    self.escape('"', &mut bytes)?;
                }
                Some(c) => {
                    let mut buf = [0; 4];
                    bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                }
            }
        }
        String::from_utf8(bytes).map_err(|_| self.error("string literal is not valid UTF-8"))
    }

    fn raw_string(&mut self) -> Result<String, PathError> {
        let mut text = String::new();
        loop {
            match self.advance() {
                None => return Err(self.error("raw string literal not terminated")),
                Some('`') => return Ok(text),
                Some('\r') => {}
                Some(c) => text.push(c),
            }
        }
    }

    fn rune(&mut self) -> Result<char, PathError> {
        let value = match self.advance() {
            None | Some('\n') | Some('\'') => return Err(self.error("empty rune literal")),
            Some('\\') => {
                let mut bytes = Vec::new();
                let rune = self.escape('\'', &mut bytes)?;
                match rune {
                    Some(c) => c,
                    // \x and octal escapes in runes denote a code point directly
                    None => bytes.first().map(|b| char::from(*b)).unwrap_or('\0'),
                }
            }
            Some(c) => c,
        };
        if !self.match_char('\'') {
            return Err(self.error("rune literal not terminated"));
        }
        Ok(value)
    }

    /// Decode one escape sequence after a backslash.
    ///
    /// Character escapes are appended as UTF-8 and returned; byte escapes
    /// (`\x`, octal) append a raw byte and return `None`.
    fn escape(&mut self, quote: char, out: &mut Vec<u8>) -> Result<Option<char>, PathError> {
        let c = self
            .advance()
            .ok_or_else(|| self.error("escape sequence not terminated"))?;
        let simple = match c {
            'a' => Some('\u{7}'),
            'b' => Some('\u{8}'),
            'f' => Some('\u{c}'),
            'n' => Some('\n'),
            'r' => Some('\r'),
            't' => Some('\t'),
            'v' => Some('\u{b}'),
            '\\' => Some('\\'),
            q if q == quote => Some(q),
            _ => None,
        };
        if let Some(ch) = simple {
            let mut buf = [0; 4];
            out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            return Ok(Some(ch));
        }

        match c {
            'x' => {
                let value = self.fixed_digits(2, 16)?;
                out.push(value as u8);
                Ok(None)
            }
            '0'..='7' => {
                let rest = self.fixed_digits(2, 8)?;
                let value = (c as u32 - '0' as u32) * 64 + rest;
                let byte =
                    u8::try_from(value).map_err(|_| self.error("octal escape value > 255"))?;
                out.push(byte);
                Ok(None)
            }
            'u' | 'U' => {
                let width = if c == 'u' { 4 } else { 8 };
                let value = self.fixed_digits(width, 16)?;
                let ch = char::from_u32(value)
                    .ok_or_else(|| self.error("escape sequence is invalid Unicode code point"))?;
                let mut buf = [0; 4];
                out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                Ok(Some(ch))
            }
            other => Err(self.error(format!("unknown escape sequence \\{}", other))),
        }
    }

    fn fixed_digits(&mut self, count: usize, radix: u32) -> Result<u32, PathError> {
        let mut value = 0u32;
        for _ in 0..count {
            let digit = self
                .advance()
                .and_then(|c| c.to_digit(radix))
                .ok_or_else(|| self.error("invalid character in escape sequence"))?;
            value = value * radix + digit;
        }
        Ok(value)
    }
}
