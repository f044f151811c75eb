//! Tokenizer for description files.

use std::sync::Arc;

use crate::ast::Pos;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Ident(String),
    Int(i128),
    Str(String),
    LParen,
    RParen,
    LBrack,
    RBrack,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Equals,
    Newline,
    Eof,
    /// Unrecognized input; the message says what.
    Illegal(String),
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: Pos,
    /// Byte offset of the token start.
    pub off: usize,
}

pub struct Scanner<'a> {
    src: &'a [u8],
    file: Arc<str>,
    off: usize,
    line: usize,
    col: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a [u8], file: &str) -> Self {
        Self {
            src,
            file: Arc::from(file),
            off: 0,
            line: 1,
            col: 1,
        }
    }

    fn pos(&self) -> Pos {
        Pos {
            file: self.file.clone(),
            line: self.line,
            col: self.col,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.off).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.off += 1;
        if c == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn skip_blanks_and_comments(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                b' ' | b'\t' | b'\r' => {
                    self.bump();
                }
                b'#' => {
                    while !matches!(self.peek(), None | Some(b'\n')) {
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    /// Raw text up to the end of the current line, with any trailing comment
    /// and surrounding whitespace removed. The newline itself is left in place.
    pub fn rest_of_line(&mut self) -> String {
        let start = self.off;
        while !matches!(self.peek(), None | Some(b'\n') | Some(b'#')) {
            self.bump();
        }
        let text = String::from_utf8_lossy(&self.src[start..self.off])
            .trim()
            .to_string();
        self.skip_blanks_and_comments();
        text
    }

    /// Move back to the start of an already scanned token.
    pub fn rewind(&mut self, tok: &Token) {
        self.off = tok.off;
        self.line = tok.pos.line;
        self.col = tok.pos.col;
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_blanks_and_comments();
        let pos = self.pos();
        let off = self.off;
        let Some(c) = self.peek() else {
            return Token {
                kind: TokenKind::Eof,
                pos,
                off,
            };
        };

        let kind = match c {
            b'\n' => {
                self.bump();
                TokenKind::Newline
            }
            b'(' | b')' | b'[' | b']' | b'{' | b'}' | b',' | b':' | b'=' => {
                self.bump();
                match c {
                    b'(' => TokenKind::LParen,
                    b')' => TokenKind::RParen,
                    b'[' => TokenKind::LBrack,
                    b']' => TokenKind::RBrack,
                    b'{' => TokenKind::LBrace,
                    b'}' => TokenKind::RBrace,
                    b',' => TokenKind::Comma,
                    b':' => TokenKind::Colon,
                    _ => TokenKind::Equals,
                }
            }
            b'"' | b'`' => self.scan_string(c),
            b'-' | b'0'..=b'9' => self.scan_int(),
            c if c.is_ascii_alphabetic() || c == b'_' => self.scan_ident(),
            other => {
                self.bump();
                TokenKind::Illegal(format!("unexpected character {:?}", other as char))
            }
        };
        Token { kind, pos, off }
    }

    fn scan_ident(&mut self) -> TokenKind {
        let start = self.off;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == b'_' || c == b'$')
        {
            self.bump();
        }
        TokenKind::Ident(String::from_utf8_lossy(&self.src[start..self.off]).into_owned())
    }

    fn scan_int(&mut self) -> TokenKind {
        let start = self.off;
        if self.peek() == Some(b'-') {
            self.bump();
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric()) {
            self.bump();
        }
        let text = String::from_utf8_lossy(&self.src[start..self.off]).into_owned();
        match parse_int(&text) {
            Some(v) => TokenKind::Int(v),
            None => TokenKind::Illegal(format!("bad integer literal {:?}", text)),
        }
    }

    fn scan_string(&mut self, quote: u8) -> TokenKind {
        self.bump();
        let start = self.off;
        loop {
            match self.peek() {
                Some(c) if c == quote => {
                    let text = String::from_utf8_lossy(&self.src[start..self.off]).into_owned();
                    self.bump();
                    return TokenKind::Str(text);
                }
                None | Some(b'\n') => return TokenKind::Illegal("unterminated string".to_string()),
                Some(_) => {
                    self.bump();
                }
            }
        }
    }
}

/// Parse a decimal, hex (`0x`) or octal (leading `0`) literal with optional sign.
pub fn parse_int(text: &str) -> Option<i128> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let value = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16).ok()?
    } else if digits.len() > 1 && digits.starts_with('0') {
        u64::from_str_radix(&digits[1..], 8).ok()?
    } else {
        digits.parse::<u64>().ok()?
    };
    let value = value as i128;
    Some(if negative { -value } else { value })
}
