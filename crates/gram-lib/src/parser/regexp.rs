//! The `/…/` regexp sublanguage.
//!
//! Supports concatenation, alternation `|`, groups `()`, character
//! classes `[...]` with ranges and escaped members, `\d`, `\n`, escaped
//! metacharacters, and the postfix quantifiers `*` `+` `?`. Everything
//! compiles to ordinary graph nodes: a class is a dictionary of
//! single-character strings, quantifiers reuse the recursive
//! constructions of the outer language.

use std::collections::BTreeSet;

use super::grammar::{optional, plus, star};
use super::lexer::Token;
use super::ParseError;
use crate::graph::{Graph, NodeRef};

/// Compile a regexp token (delimiters included) into a graph node.
pub fn parse_regexp(graph: &Graph, source: &str, tok: &Token) -> Result<NodeRef, ParseError> {
    let inner = &source[tok.span.0 + 1..tok.span.1 - 1];
    let mut p = RegexpParser {
        graph,
        source,
        text: inner,
        pos: 0,
        base: tok.span.0 + 1,
    };
    let node = p.alternation()?;
    if p.pos < p.text.len() {
        // Only an unmatched ')' can stop the descent early.
        return Err(p.error("unbalanced braces in regexp"));
    }
    Ok(node)
}

struct RegexpParser<'a> {
    graph: &'a Graph,
    source: &'a str,
    text: &'a str,
    pos: usize,
    base: usize,
}

impl RegexpParser<'_> {
    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.source, self.base + self.pos)
    }

    fn alternation(&mut self) -> Result<NodeRef, ParseError> {
        let mut branches = vec![self.sequence()?];
        while self.peek() == Some('|') {
            self.advance();
            branches.push(self.sequence()?);
        }
        Ok(self.graph.new_disjunct(branches))
    }

    fn sequence(&mut self) -> Result<NodeRef, ParseError> {
        let mut parts = Vec::new();
        loop {
            match self.peek() {
                None | Some('|') | Some(')') => break,
                Some('*') | Some('+') | Some('?') => {
                    return Err(self.error("quantifier without operand in regexp"));
                }
                _ => {
                    let mut atom = self.atom()?;
                    loop {
                        match self.peek() {
                            Some('*') => {
                                self.advance();
                                atom = star(self.graph, atom);
                            }
                            Some('+') => {
                                self.advance();
                                atom = plus(self.graph, atom);
                            }
                            Some('?') => {
                                self.advance();
                                atom = optional(self.graph, atom);
                            }
                            _ => break,
                        }
                    }
                    parts.push(atom);
                }
            }
        }
        Ok(self.graph.new_concat(parts))
    }

    fn atom(&mut self) -> Result<NodeRef, ParseError> {
        match self.peek() {
            Some('(') => {
                self.advance();
                let node = self.alternation()?;
                if self.advance() != Some(')') {
                    return Err(self.error("unbalanced braces in regexp"));
                }
                Ok(node)
            }
            Some('[') => self.class(),
            Some('\\') => {
                self.advance();
                match self.advance() {
                    Some('d') => Ok(self.digit_class()),
                    Some(ch) => {
                        let byte = escaped_literal(ch)
                            .ok_or_else(|| self.error("unknown escape in regexp"))?;
                        Ok(self.graph.new_string(vec![byte]))
                    }
                    None => Err(self.error("dangling escape in regexp")),
                }
            }
            Some(ch) => {
                self.advance();
                let mut buf = [0u8; 4];
                Ok(self
                    .graph
                    .new_string(ch.encode_utf8(&mut buf).as_bytes().to_vec()))
            }
            None => Err(self.error("expression expected in regexp")),
        }
    }

    /// `[...]`: ranges `a-z`, escaped members, `\d`, `\n`.
    fn class(&mut self) -> Result<NodeRef, ParseError> {
        self.advance(); // '['
        let mut set: BTreeSet<u8> = BTreeSet::new();
        loop {
            let ch = match self.peek() {
                None => return Err(self.error("unterminated character class")),
                Some(']') => {
                    self.advance();
                    break;
                }
                Some(ch) => ch,
            };
            self.advance();
            let low = if ch == '\\' {
                match self.advance() {
                    Some('d') => {
                        set.extend(b'0'..=b'9');
                        continue;
                    }
                    Some(esc) => escaped_literal(esc)
                        .ok_or_else(|| self.error("unknown escape in character class"))?,
                    None => return Err(self.error("unterminated character class")),
                }
            } else {
                if !ch.is_ascii() {
                    return Err(self.error("non-ascii character in character class"));
                }
                ch as u8
            };

            // A '-' not followed by ']' makes a range.
            if self.peek() == Some('-') && self.text[self.pos + 1..].chars().next() != Some(']') {
                self.advance(); // '-'
                let hi_ch = self
                    .advance()
                    .ok_or_else(|| self.error("unterminated character class"))?;
                let high = if hi_ch == '\\' {
                    match self.advance() {
                        Some(esc) => escaped_literal(esc)
                            .ok_or_else(|| self.error("unknown escape in character class"))?,
                        None => return Err(self.error("unterminated character class")),
                    }
                } else {
                    if !hi_ch.is_ascii() {
                        return Err(self.error("non-ascii character in character class"));
                    }
                    hi_ch as u8
                };
                if high < low {
                    return Err(self.error("inverted range in character class"));
                }
                set.extend(low..=high);
            } else {
                set.insert(low);
            }
        }
        let entries = set.into_iter().map(|b| vec![b]).collect();
        Ok(self.graph.new_dict(entries))
    }

    fn digit_class(&self) -> NodeRef {
        self.graph
            .new_dict((b'0'..=b'9').map(|b| vec![b]).collect())
    }
}

/// Escapes that denote a literal byte. Alphanumerics other than `n` are
/// reserved (so typos fail loudly); punctuation escapes to itself.
fn escaped_literal(ch: char) -> Option<u8> {
    match ch {
        'n' => Some(b'\n'),
        ch if ch.is_ascii() && !ch.is_ascii_alphanumeric() => Some(ch as u8),
        _ => None,
    }
}
