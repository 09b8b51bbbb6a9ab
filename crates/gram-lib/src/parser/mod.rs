//! Grammar text → [`Graph`].
//!
//! The lexer produces span-based tokens (text is sliced from the source
//! only when needed); the parser is a straightforward recursive descent
//! that builds graph nodes directly, with a small regexp sublanguage for
//! `/…/` atoms. There is no recovery: the first problem aborts with a
//! [`ParseError`] carrying a 1-based line and column.

mod grammar;
mod lexer;
mod regexp;

#[cfg(test)]
mod grammar_tests;
#[cfg(test)]
mod lexer_tests;
#[cfg(test)]
mod regexp_tests;

pub use grammar::parse;
pub use lexer::{lex, line_col, token_text, Token, TokenKind};

use crate::graph::Graph;

/// Parse failure with its source position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} on line {line}, column {column}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>, source: &str, offset: usize) -> Self {
        let (line, column) = line_col(source, offset);
        Self {
            message: message.into(),
            line,
            column,
        }
    }
}

/// Result of a successful parse: the graph and its `main` node.
#[derive(Debug)]
pub struct Parsed {
    pub graph: Graph,
    pub main: crate::graph::NodeRef,
}
