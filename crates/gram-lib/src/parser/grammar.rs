//! Recursive-descent parser building the grammar graph.
//!
//! ```text
//! program     := (statement ';')+
//! statement   := SYMBOL '=' expr
//! expr        := cat ('|' cat)*
//! cat         := atom*            postfix '?' '*' '+' bind to the left atom
//! atom        := SYMBOL | STRING | '(' expr ')' | REGEXP
//!              | 'dedup' '(' expr ')'
//!              | 'dict' '(' (SYMBOL|STRING)* ')'
//!              | 'min_length' '(' INT ',' expr ')'
//!              | 'max_length' '(' INT ',' expr ')'
//! ```
//!
//! `dedup`, `dict`, `min_length` and `max_length` are only keywords when
//! followed by `(`; otherwise they are ordinary symbol references. The
//! symbols `empty` and `none` are predefined; `main` is the start symbol.

use indexmap::IndexMap;

use super::lexer::{lex, token_text, Token, TokenKind};
use super::regexp;
use super::{ParseError, Parsed};
use crate::graph::{Graph, NodeRef};

/// Parse grammar text into a graph, returning its optimized `main` node.
pub fn parse(source: &str) -> Result<Parsed, ParseError> {
    let graph = Graph::new();
    let mut parser = Parser::new(source, &graph);
    while !parser.at_end() {
        parser.statement()?;
    }

    // A `main` that was only ever referenced has an Undef placeholder
    // here; that still counts as not defined.
    let main = match parser.symbols.get("main") {
        Some((node, _)) if graph.is_defined(node) => node.clone(),
        _ => {
            return Err(ParseError::new("main is not defined", source, source.len()));
        }
    };

    for (name, (node, first_use)) in &parser.symbols {
        if !graph.is_defined(node) {
            return Err(ParseError::new(
                format!("undefined symbol '{name}'"),
                source,
                *first_use,
            ));
        }
    }

    drop(parser);

    crate::graph::optimize(&graph);
    let mut main = main;
    crate::graph::optimize_ref(&mut main);
    Ok(Parsed { graph, main })
}

struct Parser<'s, 'g> {
    source: &'s str,
    tokens: Vec<Token>,
    pos: usize,
    graph: &'g Graph,
    /// Symbol table in first-appearance order, with each symbol's first
    /// source offset for diagnostics.
    symbols: IndexMap<String, (NodeRef, usize)>,
}

impl<'s, 'g> Parser<'s, 'g> {
    fn new(source: &'s str, graph: &'g Graph) -> Self {
        let mut symbols = IndexMap::new();
        symbols.insert("empty".to_string(), (graph.new_empty(), 0));
        symbols.insert("none".to_string(), (graph.new_none(), 0));
        Self {
            source,
            tokens: lex(source),
            pos: 0,
            graph,
            symbols,
        }
    }

    // ────────────────────────────────────────────────────────────────────
    // Token plumbing
    // ────────────────────────────────────────────────────────────────────

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<TokenKind> {
        self.tokens.get(self.pos).map(|t| t.kind)
    }

    fn advance(&mut self) -> Token {
        let t = self.tokens[self.pos];
        self.pos += 1;
        t
    }

    /// Byte offset of the current position, for diagnostics.
    fn here(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|t| t.span.0)
            .unwrap_or(self.source.len())
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.source, self.here())
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> Result<Token, ParseError> {
        if self.peek() == Some(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(message))
        }
    }

    // ────────────────────────────────────────────────────────────────────
    // Productions
    // ────────────────────────────────────────────────────────────────────

    fn statement(&mut self) -> Result<(), ParseError> {
        if self.peek() != Some(TokenKind::Symbol) {
            return Err(self.error("symbol expected"));
        }
        let name_tok = self.advance();
        let name = token_text(self.source, &name_tok).to_string();
        let symbol = self.symbol_node(&name, name_tok.span.0);
        if self.graph.is_defined(&symbol) {
            return Err(ParseError::new(
                format!("duplicate definition for symbol '{name}'"),
                self.source,
                name_tok.span.0,
            ));
        }

        self.expect(TokenKind::Equals, "equals sign expected")?;
        let expr = self.expression()?;
        self.expect(TokenKind::Semi, "semicolon expected")?;

        self.graph.define(&symbol, expr);
        Ok(())
    }

    /// Get-or-create the placeholder for a symbol name.
    fn symbol_node(&mut self, name: &str, offset: usize) -> NodeRef {
        if let Some((node, _)) = self.symbols.get(name) {
            return node.clone();
        }
        let node = self.graph.new_undefined();
        self.symbols
            .insert(name.to_string(), (node.clone(), offset));
        node
    }

    fn expression(&mut self) -> Result<NodeRef, ParseError> {
        let mut branches = vec![self.concatenation()?];
        while self.peek() == Some(TokenKind::Pipe) {
            self.advance();
            branches.push(self.concatenation()?);
        }
        Ok(self.graph.new_disjunct(branches))
    }

    fn concatenation(&mut self) -> Result<NodeRef, ParseError> {
        let mut parts = Vec::new();
        loop {
            match self.peek() {
                Some(
                    TokenKind::Symbol | TokenKind::Str | TokenKind::Regexp | TokenKind::LParen,
                ) => {
                    let mut atom = self.atom()?;
                    loop {
                        match self.peek() {
                            Some(TokenKind::Star) => {
                                self.advance();
                                atom = star(self.graph, atom);
                            }
                            Some(TokenKind::Plus) => {
                                self.advance();
                                atom = plus(self.graph, atom);
                            }
                            Some(TokenKind::Question) => {
                                self.advance();
                                atom = optional(self.graph, atom);
                            }
                            _ => break,
                        }
                    }
                    parts.push(atom);
                }
                Some(TokenKind::Garbage) => {
                    return Err(self.error("unrecognized input"));
                }
                _ => break,
            }
        }
        Ok(self.graph.new_concat(parts))
    }

    fn atom(&mut self) -> Result<NodeRef, ParseError> {
        match self.peek() {
            Some(TokenKind::LParen) => {
                self.advance();
                let e = self.expression()?;
                self.expect(TokenKind::RParen, "unbalanced braces")?;
                Ok(e)
            }
            Some(TokenKind::Str) => {
                let tok = self.advance();
                let bytes = self.unescape(&tok)?;
                Ok(self.graph.new_string(bytes))
            }
            Some(TokenKind::Regexp) => {
                let tok = self.advance();
                regexp::parse_regexp(self.graph, self.source, &tok)
            }
            Some(TokenKind::Symbol) => {
                let tok = self.advance();
                let name = token_text(self.source, &tok);
                if self.peek() == Some(TokenKind::LParen) {
                    match name {
                        "dedup" => return self.dedup_atom(),
                        "dict" => return self.dict_atom(),
                        "min_length" => return self.len_limit_atom(true),
                        "max_length" => return self.len_limit_atom(false),
                        _ => {}
                    }
                }
                let name = name.to_string();
                Ok(self.symbol_node(&name, tok.span.0))
            }
            _ => Err(self.error("expression expected")),
        }
    }

    fn dedup_atom(&mut self) -> Result<NodeRef, ParseError> {
        self.expect(TokenKind::LParen, "opening brace expected")?;
        let e = self.expression()?;
        self.expect(TokenKind::RParen, "closing brace expected")?;
        Ok(self.graph.new_dedup(e))
    }

    fn dict_atom(&mut self) -> Result<NodeRef, ParseError> {
        self.expect(TokenKind::LParen, "opening brace expected")?;
        let mut entries = Vec::new();
        loop {
            match self.peek() {
                Some(TokenKind::Symbol) => {
                    let tok = self.advance();
                    entries.push(token_text(self.source, &tok).as_bytes().to_vec());
                }
                Some(TokenKind::Str) => {
                    let tok = self.advance();
                    entries.push(self.unescape(&tok)?);
                }
                _ => break,
            }
        }
        self.expect(TokenKind::RParen, "closing brace expected")?;
        Ok(self.graph.new_dict(entries))
    }

    fn len_limit_atom(&mut self, is_min: bool) -> Result<NodeRef, ParseError> {
        self.expect(TokenKind::LParen, "opening brace expected")?;
        let n = self.number()?;
        self.expect(TokenKind::Comma, "comma expected")?;
        let e = self.expression()?;
        self.expect(TokenKind::RParen, "closing brace expected")?;
        Ok(if is_min {
            self.graph.new_len_limit(n, u32::MAX, e)
        } else {
            self.graph.new_len_limit(0, n, e)
        })
    }

    fn number(&mut self) -> Result<u32, ParseError> {
        let tok = self.expect(TokenKind::Number, "number expected")?;
        token_text(self.source, &tok)
            .parse()
            .map_err(|_| ParseError::new("number out of range", self.source, tok.span.0))
    }

    /// Decode a string literal token (including its quotes) into bytes.
    fn unescape(&self, tok: &Token) -> Result<Vec<u8>, ParseError> {
        let raw = token_text(self.source, tok);
        let inner = &raw[1..raw.len() - 1];
        let mut out = Vec::with_capacity(inner.len());
        let mut chars = inner.char_indices();
        while let Some((i, ch)) = chars.next() {
            if ch != '\\' {
                let mut buf = [0u8; 4];
                out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                continue;
            }
            match chars.next() {
                Some((_, '"')) => out.push(b'"'),
                Some((_, '\\')) => out.push(b'\\'),
                Some((_, 'n')) => out.push(b'\n'),
                _ => {
                    return Err(ParseError::new(
                        "unknown escape",
                        self.source,
                        tok.span.0 + 1 + i,
                    ));
                }
            }
        }
        Ok(out)
    }
}

// ────────────────────────────────────────────────────────────────────────
// Quantifier constructions (shared with the regexp sublanguage)
// ────────────────────────────────────────────────────────────────────────

/// `x*` as the recursive definition `r = empty | x r`.
pub(super) fn star(graph: &Graph, inner: NodeRef) -> NodeRef {
    let r = graph.new_undefined();
    let body = graph.new_disjunct_pair(
        graph.new_empty(),
        graph.new_concat_pair(inner, r.clone()),
    );
    graph.define(&r, body);
    r
}

/// `x+` as the recursive definition `r = x | x r`.
pub(super) fn plus(graph: &Graph, inner: NodeRef) -> NodeRef {
    let r = graph.new_undefined();
    let body = graph.new_disjunct_pair(
        inner.clone(),
        graph.new_concat_pair(inner, r.clone()),
    );
    graph.define(&r, body);
    r
}

/// `x?` as `empty | x`.
pub(super) fn optional(graph: &Graph, inner: NodeRef) -> NodeRef {
    graph.new_disjunct_pair(graph.new_empty(), inner)
}
