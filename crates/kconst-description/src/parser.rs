//! Recursive-descent parser for description files.
//!
//! Statements are newline separated. Newlines are insignificant inside
//! parentheses and type argument brackets, and separate fields inside struct
//! and union bodies. A syntax error skips to the next line so one run reports
//! as many problems as possible.

use std::fmt;

use crate::ast::{Description, Field, Node, Pos, Type, Value};
use crate::scanner::{Scanner, Token, TokenKind};

/// A positioned parse diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub pos: Pos,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.pos, self.message)
    }
}

/// Parsing failed; every diagnostic encountered is kept.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub diagnostics: Vec<Diagnostic>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.diagnostics.as_slice() {
            [] => write!(f, "parse failed"),
            [only] => write!(f, "{}", only),
            [first, rest @ ..] => write!(f, "{} (and {} more errors)", first, rest.len()),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse a description file.
pub fn parse(data: &[u8], file: &str) -> Result<Description, ParseError> {
    let mut parser = Parser::new(data, file);
    let nodes = parser.parse_file();
    if parser.diagnostics.is_empty() {
        Ok(Description { nodes })
    } else {
        Err(ParseError {
            diagnostics: parser.diagnostics,
        })
    }
}

struct Parser<'a> {
    scanner: Scanner<'a>,
    tok: Token,
    diagnostics: Vec<Diagnostic>,
}

type PResult<T> = Result<T, Diagnostic>;

impl<'a> Parser<'a> {
    fn new(data: &'a [u8], file: &str) -> Self {
        let mut scanner = Scanner::new(data, file);
        let tok = scanner.next_token();
        Self {
            scanner,
            tok,
            diagnostics: Vec::new(),
        }
    }

    fn advance(&mut self) -> Token {
        let next = self.scanner.next_token();
        std::mem::replace(&mut self.tok, next)
    }

    fn error<T>(&self, message: impl Into<String>) -> PResult<T> {
        let message = match &self.tok.kind {
            TokenKind::Illegal(what) => what.clone(),
            _ => message.into(),
        };
        Err(Diagnostic {
            pos: self.tok.pos.clone(),
            message,
        })
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> PResult<Token> {
        if self.tok.kind == kind {
            Ok(self.advance())
        } else {
            self.error(format!("expected {}, found {}", what, describe(&self.tok.kind)))
        }
    }

    fn expect_ident(&mut self, what: &str) -> PResult<(String, Pos)> {
        match &self.tok.kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                let tok = self.advance();
                Ok((name, tok.pos))
            }
            other => self.error(format!("expected {}, found {}", what, describe(other))),
        }
    }

    fn skip_newlines(&mut self) {
        while self.tok.kind == TokenKind::Newline {
            self.advance();
        }
    }

    fn end_of_statement(&mut self) -> PResult<()> {
        match self.tok.kind {
            TokenKind::Newline => {
                self.advance();
                Ok(())
            }
            TokenKind::Eof => Ok(()),
            ref other => self.error(format!("expected end of line, found {}", describe(other))),
        }
    }

    fn recover(&mut self) {
        while !matches!(self.tok.kind, TokenKind::Newline | TokenKind::Eof) {
            self.advance();
        }
    }

    fn parse_file(&mut self) -> Vec<Node> {
        let mut nodes = Vec::new();
        loop {
            self.skip_newlines();
            if self.tok.kind == TokenKind::Eof {
                return nodes;
            }
            match self.parse_statement() {
                Ok(node) => nodes.push(node),
                Err(diag) => {
                    self.diagnostics.push(diag);
                    self.recover();
                }
            }
        }
    }

    fn parse_statement(&mut self) -> PResult<Node> {
        let (keyword, pos) = self.expect_ident("declaration")?;
        match keyword.as_str() {
            "include" | "incdir" => self.parse_path_directive(keyword, pos),
            "define" => self.parse_define(pos),
            "resource" => self.parse_resource(pos),
            "type" => self.parse_typedef(pos),
            _ => self.parse_named(keyword, pos),
        }
    }

    fn parse_path_directive(&mut self, keyword: String, pos: Pos) -> PResult<Node> {
        // Paths are not tokens; take the raw remainder of the line.
        let raw = self.raw_line_from_current();
        let path = raw
            .strip_prefix('<')
            .and_then(|s| s.strip_suffix('>'))
            .map(str::trim)
            .unwrap_or("");
        if path.is_empty() {
            return Err(Diagnostic {
                pos,
                message: format!("{} expects a path in angle brackets, got {:?}", keyword, raw),
            });
        }
        let path = path.to_string();
        self.end_of_statement()?;
        Ok(if keyword == "include" {
            Node::Include { pos, file: path }
        } else {
            Node::Incdir { pos, dir: path }
        })
    }

    fn parse_define(&mut self, pos: Pos) -> PResult<Node> {
        let raw = self.raw_line_from_current();
        let mut parts = raw.splitn(2, char::is_whitespace);
        let name = parts.next().unwrap_or("").to_string();
        if !kconst_types::const_file::is_identifier(&name) {
            return Err(Diagnostic {
                pos,
                message: format!("define expects a macro name, got {:?}", raw),
            });
        }
        let value = parts
            .next()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        self.end_of_statement()?;
        Ok(Node::Define { pos, name, value })
    }

    /// Text of the current line starting at the current token. Leaves the
    /// parser positioned on the line terminator.
    fn raw_line_from_current(&mut self) -> String {
        if matches!(self.tok.kind, TokenKind::Newline | TokenKind::Eof) {
            return String::new();
        }
        self.scanner.rewind(&self.tok);
        let raw = self.scanner.rest_of_line();
        self.tok = self.scanner.next_token();
        raw
    }

    fn parse_resource(&mut self, pos: Pos) -> PResult<Node> {
        let (name, _) = self.expect_ident("resource name")?;
        self.expect(TokenKind::LBrack, "'['")?;
        let base = self.parse_type()?;
        self.expect(TokenKind::RBrack, "']'")?;
        let mut values = Vec::new();
        if self.tok.kind == TokenKind::Colon {
            self.advance();
            values = self.parse_value_list()?;
        }
        self.end_of_statement()?;
        Ok(Node::Resource {
            pos,
            name,
            base,
            values,
        })
    }

    fn parse_typedef(&mut self, pos: Pos) -> PResult<Node> {
        let (name, _) = self.expect_ident("type name")?;
        let ty = self.parse_type()?;
        self.end_of_statement()?;
        Ok(Node::TypeDef { pos, name, ty })
    }

    fn parse_named(&mut self, name: String, pos: Pos) -> PResult<Node> {
        match self.tok.kind {
            TokenKind::Equals => {
                self.advance();
                let values = self.parse_value_list()?;
                self.end_of_statement()?;
                Ok(Node::Flags { pos, name, values })
            }
            TokenKind::LParen => self.parse_call(name, pos),
            TokenKind::LBrace => self.parse_struct(name, pos, false),
            TokenKind::LBrack => self.parse_struct(name, pos, true),
            ref other => self.error(format!(
                "expected '=', '(', '{{' or '[' after {}, found {}",
                name,
                describe(other)
            )),
        }
    }

    fn parse_call(&mut self, name: String, pos: Pos) -> PResult<Node> {
        self.expect(TokenKind::LParen, "'('")?;
        let mut args = Vec::new();
        self.skip_newlines();
        while self.tok.kind != TokenKind::RParen {
            args.push(self.parse_field()?);
            self.skip_newlines();
            if self.tok.kind == TokenKind::Comma {
                self.advance();
                self.skip_newlines();
            } else if self.tok.kind != TokenKind::RParen {
                return self.error(format!("expected ',' or ')', found {}", describe(&self.tok.kind)));
            }
        }
        self.advance();
        let ret = match self.tok.kind {
            TokenKind::Newline | TokenKind::Eof => None,
            _ => Some(self.parse_type()?),
        };
        self.end_of_statement()?;
        Ok(Node::Call {
            pos,
            name,
            args,
            ret,
        })
    }

    fn parse_struct(&mut self, name: String, pos: Pos, is_union: bool) -> PResult<Node> {
        let close = if is_union {
            TokenKind::RBrack
        } else {
            TokenKind::RBrace
        };
        self.advance();
        let mut fields = Vec::new();
        loop {
            while matches!(self.tok.kind, TokenKind::Newline | TokenKind::Comma) {
                self.advance();
            }
            if self.tok.kind == close {
                self.advance();
                break;
            }
            if self.tok.kind == TokenKind::Eof {
                return self.error(format!("unterminated body of {}", name));
            }
            fields.push(self.parse_field()?);
        }
        let mut attrs = Vec::new();
        if self.tok.kind == TokenKind::LBrack {
            self.advance();
            attrs = self.parse_type_args()?;
        }
        self.end_of_statement()?;
        Ok(Node::Struct {
            pos,
            name,
            is_union,
            fields,
            attrs,
        })
    }

    fn parse_field(&mut self) -> PResult<Field> {
        let (name, pos) = self.expect_ident("field name")?;
        let ty = self.parse_type()?;
        Ok(Field { pos, name, ty })
    }

    fn parse_value(&mut self) -> PResult<Value> {
        let value = match &self.tok.kind {
            TokenKind::Ident(s) => Value::Ident(s.clone()),
            TokenKind::Int(v) => Value::Int(*v),
            TokenKind::Str(s) => Value::Str(s.clone()),
            other => return self.error(format!("expected value, found {}", describe(other))),
        };
        self.advance();
        Ok(value)
    }

    fn parse_value_list(&mut self) -> PResult<Vec<Value>> {
        let mut values = vec![self.parse_value()?];
        while self.tok.kind == TokenKind::Comma {
            self.advance();
            values.push(self.parse_value()?);
        }
        Ok(values)
    }

    fn parse_type(&mut self) -> PResult<Type> {
        let pos = self.tok.pos.clone();
        let value = self.parse_value()?;
        let mut range_end = None;
        if self.tok.kind == TokenKind::Colon {
            self.advance();
            range_end = Some(self.parse_value()?);
        }
        let mut args = Vec::new();
        if self.tok.kind == TokenKind::LBrack {
            self.advance();
            args = self.parse_type_args()?;
        }
        Ok(Type {
            pos,
            value,
            range_end,
            args,
        })
    }

    /// Comma separated types up to and including the closing `]`.
    fn parse_type_args(&mut self) -> PResult<Vec<Type>> {
        let mut args = Vec::new();
        self.skip_newlines();
        while self.tok.kind != TokenKind::RBrack {
            args.push(self.parse_type()?);
            self.skip_newlines();
            if self.tok.kind == TokenKind::Comma {
                self.advance();
                self.skip_newlines();
            } else if self.tok.kind != TokenKind::RBrack {
                return self.error(format!("expected ',' or ']', found {}", describe(&self.tok.kind)));
            }
        }
        self.advance();
        Ok(args)
    }
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Ident(s) => format!("identifier {}", s),
        TokenKind::Int(v) => format!("integer {}", v),
        TokenKind::Str(s) => format!("string {:?}", s),
        TokenKind::LParen => "'('".to_string(),
        TokenKind::RParen => "')'".to_string(),
        TokenKind::LBrack => "'['".to_string(),
        TokenKind::RBrack => "']'".to_string(),
        TokenKind::LBrace => "'{'".to_string(),
        TokenKind::RBrace => "'}'".to_string(),
        TokenKind::Comma => "','".to_string(),
        TokenKind::Colon => "':'".to_string(),
        TokenKind::Equals => "'='".to_string(),
        TokenKind::Newline => "end of line".to_string(),
        TokenKind::Eof => "end of file".to_string(),
        TokenKind::Illegal(what) => what.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_statements() {
        let src = b"include <linux/fs.h>\nincdir <drivers/net> # nic headers\ndefine X 1 + 2\n\
                    resource fd[int32]: -1\nread(fd fd,\n\tbuf buffer[out]) const[0]\n\
                    flags_set = A, 2, \"str\"\ns {\n\tf int8\n}\nu [\n\tf int8\n] [varlen]\n";
        let desc = parse(src, "fs.txt").unwrap();
        assert_eq!(desc.nodes.len(), 8);

        match &desc.nodes[0] {
            Node::Include { file, .. } => assert_eq!(file, "linux/fs.h"),
            other => panic!("unexpected node {:?}", other),
        }
        match &desc.nodes[1] {
            Node::Incdir { dir, .. } => assert_eq!(dir, "drivers/net"),
            other => panic!("unexpected node {:?}", other),
        }
        match &desc.nodes[2] {
            Node::Define { name, value, .. } => {
                assert_eq!(name, "X");
                assert_eq!(value.as_deref(), Some("1 + 2"));
            }
            other => panic!("unexpected node {:?}", other),
        }
        match &desc.nodes[4] {
            Node::Call { name, args, ret, .. } => {
                assert_eq!(name, "read");
                assert_eq!(args.len(), 2);
                assert!(ret.is_some());
            }
            other => panic!("unexpected node {:?}", other),
        }
        match &desc.nodes[5] {
            Node::Flags { values, .. } => assert_eq!(
                values,
                &vec![
                    Value::Ident("A".into()),
                    Value::Int(2),
                    Value::Str("str".into())
                ]
            ),
            other => panic!("unexpected node {:?}", other),
        }
        match &desc.nodes[7] {
            Node::Struct {
                is_union, attrs, ..
            } => {
                assert!(*is_union);
                assert_eq!(attrs.len(), 1);
            }
            other => panic!("unexpected node {:?}", other),
        }
        assert_eq!(desc.nodes[4].pos().line, 5);
    }

    #[test]
    fn test_errors_are_positioned_and_collected() {
        let src = b"include linux/fs.h\nfoo(a int32]\nbar = \nok = A\n";
        let err = parse(src, "bad.txt").unwrap_err();
        assert_eq!(err.diagnostics.len(), 3);
        assert_eq!(err.diagnostics[0].pos.line, 1);
        assert_eq!(err.diagnostics[1].pos.line, 2);
        assert_eq!(err.diagnostics[2].pos.line, 3);
        assert!(err.to_string().starts_with("bad.txt:1:1: include expects a path"));
    }

    #[test]
    fn test_illegal_character_reported() {
        let err = parse(b"x = A; B\n", "t.txt").unwrap_err();
        assert_eq!(err.diagnostics.len(), 1);
        assert!(err.diagnostics[0].message.contains("unexpected character"));
    }
}
