//! Lexer for grammar text.
//!
//! Produces span-based tokens without storing text; text is sliced from
//! the source when a token is consumed. Runs of unrecognizable input are
//! coalesced into single `Garbage` tokens so the parser can report one
//! error per run.

use logos::Logos;
use std::ops::Range;

/// Token classes. Strings and regexps keep their delimiters; escape
/// processing happens in the parser.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"#[^\n]*")]
pub enum TokenKind {
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Symbol,

    #[regex(r#""([^"\\]|\\[^\n])*""#)]
    Str,

    #[regex(r"/([^/\\\n]|\\[^\n])*/")]
    Regexp,

    #[regex(r"[0-9]+")]
    Number,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("|")]
    Pipe,
    #[token("*")]
    Star,
    #[token("+")]
    Plus,
    #[token("?")]
    Question,
    #[token("=")]
    Equals,
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,

    /// Coalesced run of unrecognizable input.
    Garbage,
}

/// Token: kind plus byte span into the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: (usize, usize),
}

impl Token {
    fn new(kind: TokenKind, span: Range<usize>) -> Self {
        Self {
            kind,
            span: (span.start, span.end),
        }
    }
}

/// Tokenize the whole source.
pub fn lex(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(source);
    let mut garbage_start: Option<usize> = None;

    loop {
        match lexer.next() {
            Some(Ok(kind)) => {
                if let Some(start) = garbage_start.take() {
                    tokens.push(Token::new(TokenKind::Garbage, start..lexer.span().start));
                }
                tokens.push(Token::new(kind, lexer.span()));
            }
            Some(Err(())) => {
                if garbage_start.is_none() {
                    garbage_start = Some(lexer.span().start);
                }
            }
            None => {
                if let Some(start) = garbage_start.take() {
                    tokens.push(Token::new(TokenKind::Garbage, start..source.len()));
                }
                break;
            }
        }
    }

    tokens
}

/// Slice the source text of a token. O(1).
pub fn token_text<'s>(source: &'s str, token: &Token) -> &'s str {
    &source[token.span.0..token.span.1]
}

/// 1-based line and column (in characters) of a byte offset.
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;
    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}
