// ABOUTME: Lexer turning one arrow-function body's source text into a token stream

use crate::error::HplError;
use nom::branch::alt;
use nom::character::complete::{alpha1, alphanumeric1, digit1};
use nom::combinator::recognize;
use nom::multi::many0_count;
use nom::sequence::pair;
use nom::IResult;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),
    True,
    False,
    Null,
    This,
    If,
    Else,
    For,
    While,
    Return,
    Break,
    Continue,
    Try,
    Catch,
    Import,
    As,
    Echo,
    Plus,
    PlusPlus,
    Minus,
    Star,
    Slash,
    Percent,
    Eq,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    AndAnd,
    OrOr,
    Bang,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Semicolon,
    Colon,
    Arrow,
    Indent,
    Dedent,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Int(n) => write!(f, "integer '{n}'"),
            TokenKind::Float(n) => write!(f, "float '{n}'"),
            TokenKind::Str(s) => write!(f, "string \"{s}\""),
            TokenKind::Ident(name) => write!(f, "identifier '{name}'"),
            TokenKind::True => write!(f, "'true'"),
            TokenKind::False => write!(f, "'false'"),
            TokenKind::Null => write!(f, "'null'"),
            TokenKind::This => write!(f, "'this'"),
            TokenKind::If => write!(f, "'if'"),
            TokenKind::Else => write!(f, "'else'"),
            TokenKind::For => write!(f, "'for'"),
            TokenKind::While => write!(f, "'while'"),
            TokenKind::Return => write!(f, "'return'"),
            TokenKind::Break => write!(f, "'break'"),
            TokenKind::Continue => write!(f, "'continue'"),
            TokenKind::Try => write!(f, "'try'"),
            TokenKind::Catch => write!(f, "'catch'"),
            TokenKind::Import => write!(f, "'import'"),
            TokenKind::As => write!(f, "'as'"),
            TokenKind::Echo => write!(f, "'echo'"),
            TokenKind::Plus => write!(f, "'+'"),
            TokenKind::PlusPlus => write!(f, "'++'"),
            TokenKind::Minus => write!(f, "'-'"),
            TokenKind::Star => write!(f, "'*'"),
            TokenKind::Slash => write!(f, "'/'"),
            TokenKind::Percent => write!(f, "'%'"),
            TokenKind::Eq => write!(f, "'='"),
            TokenKind::EqEq => write!(f, "'=='"),
            TokenKind::NotEq => write!(f, "'!='"),
            TokenKind::Lt => write!(f, "'<'"),
            TokenKind::LtEq => write!(f, "'<='"),
            TokenKind::Gt => write!(f, "'>'"),
            TokenKind::GtEq => write!(f, "'>='"),
            TokenKind::AndAnd => write!(f, "'&&'"),
            TokenKind::OrOr => write!(f, "'||'"),
            TokenKind::Bang => write!(f, "'!'"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::LBrace => write!(f, "'{{'"),
            TokenKind::RBrace => write!(f, "'}}'"),
            TokenKind::LBracket => write!(f, "'['"),
            TokenKind::RBracket => write!(f, "']'"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::Dot => write!(f, "'.'"),
            TokenKind::Semicolon => write!(f, "';'"),
            TokenKind::Colon => write!(f, "':'"),
            TokenKind::Arrow => write!(f, "'=>'"),
            TokenKind::Indent => write!(f, "indent"),
            TokenKind::Dedent => write!(f, "dedent"),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}

/// Tracks one level of source indentation, so INDENT/DEDENT tokens can be
/// synthesized for the colon-and-indent block form alongside the
/// brace-delimited one (§4.1: "both block syntaxes are accepted, and may be
/// mixed within the same function body").
pub struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: usize,
    column: usize,
    indent_stack: Vec<usize>,
    at_line_start: bool,
    pending: Vec<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Lexer {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
            indent_stack: vec![0],
            at_line_start: true,
            pending: Vec::new(),
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, HplError> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let is_eof = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn peek_byte(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn advance_byte(&mut self) -> Option<u8> {
        let b = self.peek_byte()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(b)
    }

    fn next_token(&mut self) -> Result<Token, HplError> {
        if let Some(tok) = self.pending.pop() {
            return Ok(tok);
        }

        if self.at_line_start {
            if let Some(tok) = self.handle_line_start()? {
                return Ok(tok);
            }
        }

        self.skip_inline_whitespace_and_comments();

        let line = self.line;
        let column = self.column;

        let Some(b) = self.peek_byte() else {
            if self.indent_stack.len() > 1 {
                self.indent_stack.pop();
                return Ok(Token {
                    kind: TokenKind::Dedent,
                    line,
                    column,
                });
            }
            return Ok(Token {
                kind: TokenKind::Eof,
                line,
                column,
            });
        };

        if b == b'\n' {
            self.advance_byte();
            self.at_line_start = true;
            return self.next_token();
        }

        if b.is_ascii_digit() {
            return self.lex_number(line, column);
        }

        if b.is_ascii_alphabetic() || b == b'_' {
            return self.lex_ident_or_keyword(line, column);
        }

        if b == b'"' {
            return self.lex_string(line, column);
        }

        self.lex_operator(line, column)
    }

    /// At the start of a line, measure leading whitespace and emit
    /// INDENT/DEDENT tokens to bring the indent stack in line, skipping
    /// blank and comment-only lines entirely (they carry no structure).
    fn handle_line_start(&mut self) -> Result<Option<Token>, HplError> {
        let line_start_pos = self.pos;
        let mut width = 0usize;
        while let Some(b) = self.peek_byte() {
            match b {
                b' ' => {
                    width += 1;
                    self.advance_byte();
                }
                b'\t' => {
                    width += 4;
                    self.advance_byte();
                }
                _ => break,
            }
        }

        match self.peek_byte() {
            None => {
                self.at_line_start = false;
                return Ok(None);
            }
            Some(b'\n') | Some(b'#') => {
                // Blank or comment-only line: consume to newline and retry.
                while let Some(b) = self.peek_byte() {
                    if b == b'\n' {
                        break;
                    }
                    self.advance_byte();
                }
                return Ok(None);
            }
            _ => {}
        }

        self.at_line_start = false;
        let current = *self.indent_stack.last().unwrap();
        let line = self.line;

        if width > current {
            self.indent_stack.push(width);
            tracing::debug!(line, width, "INDENT");
            return Ok(Some(Token {
                kind: TokenKind::Indent,
                line,
                column: 1,
            }));
        }

        if width < current {
            let mut dedents = Vec::new();
            while *self.indent_stack.last().unwrap() > width {
                self.indent_stack.pop();
                dedents.push(Token {
                    kind: TokenKind::Dedent,
                    line,
                    column: 1,
                });
            }
            if *self.indent_stack.last().unwrap() != width {
                return Err(HplError::lexical(
                    "inconsistent indentation",
                    line,
                    1,
                ));
            }
            tracing::debug!(line, width, count = dedents.len(), "DEDENT");
            let first = dedents.remove(0);
            dedents.reverse();
            self.pending = dedents;
            return Ok(Some(first));
        }

        // width == current: rewind so the token at this position lexes
        // normally on the next call.
        self.pos = line_start_pos + width;
        Ok(None)
    }

    fn skip_inline_whitespace_and_comments(&mut self) {
        loop {
            match self.peek_byte() {
                Some(b' ') | Some(b'\t') | Some(b'\r') => {
                    self.advance_byte();
                }
                Some(b'#') => {
                    while let Some(b) = self.peek_byte() {
                        if b == b'\n' {
                            break;
                        }
                        self.advance_byte();
                    }
                }
                _ => break,
            }
        }
    }

    fn lex_number(&mut self, line: usize, column: usize) -> Result<Token, HplError> {
        let start = self.pos;
        while matches!(self.peek_byte(), Some(b) if b.is_ascii_digit()) {
            self.advance_byte();
        }
        let mut is_float = false;
        if self.peek_byte() == Some(b'.') {
            if let Some(next) = self.bytes.get(self.pos + 1) {
                if next.is_ascii_digit() {
                    is_float = true;
                    self.advance_byte();
                    while matches!(self.peek_byte(), Some(b) if b.is_ascii_digit()) {
                        self.advance_byte();
                    }
                }
            }
        }
        let text = &self.src[start..self.pos];
        if is_float {
            let value: f64 = text
                .parse()
                .map_err(|_| HplError::lexical(format!("invalid float literal '{text}'"), line, column))?;
            Ok(Token {
                kind: TokenKind::Float(value),
                line,
                column,
            })
        } else {
            let value: i64 = text
                .parse()
                .map_err(|_| HplError::lexical(format!("invalid integer literal '{text}'"), line, column))?;
            Ok(Token {
                kind: TokenKind::Int(value),
                line,
                column,
            })
        }
    }

    fn lex_ident_or_keyword(&mut self, line: usize, column: usize) -> Result<Token, HplError> {
        let start = self.pos;
        while matches!(self.peek_byte(), Some(b) if b.is_ascii_alphanumeric() || b == b'_') {
            self.advance_byte();
        }
        let text = &self.src[start..self.pos];
        let kind = match text {
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            "this" => TokenKind::This,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "for" => TokenKind::For,
            "while" => TokenKind::While,
            "return" => TokenKind::Return,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "try" => TokenKind::Try,
            "catch" => TokenKind::Catch,
            "import" => TokenKind::Import,
            "as" => TokenKind::As,
            "echo" => TokenKind::Echo,
            other => TokenKind::Ident(other.to_string()),
        };
        Ok(Token { kind, line, column })
    }

    fn lex_string(&mut self, line: usize, column: usize) -> Result<Token, HplError> {
        self.advance_byte(); // opening quote
        let mut out = String::new();
        loop {
            match self.peek_byte() {
                None => return Err(HplError::lexical("unterminated string literal", line, column)),
                Some(b'"') => {
                    self.advance_byte();
                    break;
                }
                Some(b'\\') => {
                    self.advance_byte();
                    match self.advance_byte() {
                        Some(b'n') => out.push('\n'),
                        Some(b't') => out.push('\t'),
                        Some(b'"') => out.push('"'),
                        Some(b'\\') => out.push('\\'),
                        Some(other) => out.push(other as char),
                        None => {
                            return Err(HplError::lexical(
                                "unterminated escape in string literal",
                                line,
                                column,
                            ))
                        }
                    }
                }
                Some(_) => {
                    let ch_start = self.pos;
                    self.advance_byte();
                    while !self.src.is_char_boundary(self.pos) {
                        self.pos += 1;
                    }
                    out.push_str(&self.src[ch_start..self.pos]);
                }
            }
        }
        Ok(Token {
            kind: TokenKind::Str(out),
            line,
            column,
        })
    }

    fn lex_operator(&mut self, line: usize, column: usize) -> Result<Token, HplError> {
        let b = self.advance_byte().unwrap();
        let kind = match b {
            b'+' => {
                if self.peek_byte() == Some(b'+') {
                    self.advance_byte();
                    TokenKind::PlusPlus
                } else {
                    TokenKind::Plus
                }
            }
            b'-' => TokenKind::Minus,
            b'*' => TokenKind::Star,
            b'/' => TokenKind::Slash,
            b'%' => TokenKind::Percent,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'{' => TokenKind::LBrace,
            b'}' => TokenKind::RBrace,
            b'[' => TokenKind::LBracket,
            b']' => TokenKind::RBracket,
            b',' => TokenKind::Comma,
            b'.' => TokenKind::Dot,
            b';' => TokenKind::Semicolon,
            b':' => TokenKind::Colon,
            b'=' => {
                if self.peek_byte() == Some(b'=') {
                    self.advance_byte();
                    TokenKind::EqEq
                } else if self.peek_byte() == Some(b'>') {
                    self.advance_byte();
                    TokenKind::Arrow
                } else {
                    TokenKind::Eq
                }
            }
            b'!' => {
                if self.peek_byte() == Some(b'=') {
                    self.advance_byte();
                    TokenKind::NotEq
                } else {
                    TokenKind::Bang
                }
            }
            b'<' => {
                if self.peek_byte() == Some(b'=') {
                    self.advance_byte();
                    TokenKind::LtEq
                } else {
                    TokenKind::Lt
                }
            }
            b'>' => {
                if self.peek_byte() == Some(b'=') {
                    self.advance_byte();
                    TokenKind::GtEq
                } else {
                    TokenKind::Gt
                }
            }
            b'&' if self.peek_byte() == Some(b'&') => {
                self.advance_byte();
                TokenKind::AndAnd
            }
            b'|' if self.peek_byte() == Some(b'|') => {
                self.advance_byte();
                TokenKind::OrOr
            }
            other => {
                return Err(HplError::lexical(
                    format!("unexpected character '{}'", other as char),
                    line,
                    column,
                ))
            }
        };
        Ok(Token { kind, line, column })
    }
}

/// Recognizes a bare identifier (`[A-Za-z_][A-Za-z0-9_]*`) as a `nom`
/// combinator, kept available for callers that only need isolated
/// identifier recognition (the document loader's `call` directive parsing)
/// rather than full tokenization.
pub fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, nom::bytes::complete::tag("_"))),
        many0_count(alt((alphanumeric1, nom::bytes::complete::tag("_")))),
    ))(input)
}

#[allow(dead_code)]
fn unsigned_integer(input: &str) -> IResult<&str, &str> {
    recognize(pair(digit1, many0_count(alphanumeric1)))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_integer_and_float_literals() {
        assert_eq!(kinds("42"), vec![TokenKind::Int(42), TokenKind::Eof]);
        assert_eq!(kinds("3.14"), vec![TokenKind::Float(3.14), TokenKind::Eof]);
    }

    #[test]
    fn lexes_string_with_escapes() {
        assert_eq!(
            kinds(r#""a\nb""#),
            vec![TokenKind::Str("a\nb".to_string()), TokenKind::Eof]
        );
    }

    #[test]
    fn lexes_keywords_and_identifiers_distinctly() {
        assert_eq!(
            kinds("if foo"),
            vec![
                TokenKind::If,
                TokenKind::Ident("foo".to_string()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn lexes_two_char_operators() {
        assert_eq!(
            kinds("a == b && c != d"),
            vec![
                TokenKind::Ident("a".to_string()),
                TokenKind::EqEq,
                TokenKind::Ident("b".to_string()),
                TokenKind::AndAnd,
                TokenKind::Ident("c".to_string()),
                TokenKind::NotEq,
                TokenKind::Ident("d".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn emits_indent_and_dedent_for_colon_blocks() {
        let src = "if true:\n    x = 1\ny = 2";
        let toks = kinds(src);
        assert!(toks.contains(&TokenKind::Indent));
        assert!(toks.contains(&TokenKind::Dedent));
    }

    #[test]
    fn comment_lines_do_not_affect_indentation() {
        let src = "x = 1\n# a comment at column 0\ny = 2";
        let toks = kinds(src);
        assert!(!toks.contains(&TokenKind::Indent));
        assert!(!toks.contains(&TokenKind::Dedent));
    }

    #[test]
    fn inconsistent_dedent_is_a_lexical_error() {
        let src = "if true:\n    x = 1\n  y = 2";
        let err = Lexer::new(src).tokenize().unwrap_err();
        assert!(matches!(err, HplError::Lexical { .. }));
    }
}
