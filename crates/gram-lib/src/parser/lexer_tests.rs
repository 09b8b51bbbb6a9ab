use super::lexer::{lex, line_col, token_text, TokenKind};

fn kinds(source: &str) -> Vec<TokenKind> {
    lex(source).into_iter().map(|t| t.kind).collect()
}

#[test]
fn basic_tokens() {
    use TokenKind::*;
    assert_eq!(
        kinds(r#"word = "str" | (x)* y+ z? ;"#),
        vec![
            Symbol, Equals, Str, Pipe, LParen, Symbol, RParen, Star, Symbol, Plus, Symbol,
            Question, Semi
        ]
    );
}

#[test]
fn numbers_and_commas() {
    use TokenKind::*;
    assert_eq!(
        kinds("min_length(3, x)"),
        vec![Symbol, LParen, Number, Comma, Symbol, RParen]
    );
}

#[test]
fn comments_and_whitespace_are_skipped() {
    use TokenKind::*;
    assert_eq!(
        kinds("a = b; # trailing comment\n# full line\nc = d;"),
        vec![Symbol, Equals, Symbol, Semi, Symbol, Equals, Symbol, Semi]
    );
}

#[test]
fn string_token_keeps_quotes() {
    let source = r#"x = "a\"b";"#;
    let tokens = lex(source);
    let s = tokens.iter().find(|t| t.kind == TokenKind::Str).unwrap();
    assert_eq!(token_text(source, s), r#""a\"b""#);
}

#[test]
fn regexp_token() {
    let source = r"d = /[0-9a-f]+/;";
    let tokens = lex(source);
    let r = tokens.iter().find(|t| t.kind == TokenKind::Regexp).unwrap();
    assert_eq!(token_text(source, r), "/[0-9a-f]+/");
}

#[test]
fn escaped_slash_stays_inside_regexp() {
    let source = r"d = /a\/b/;";
    let tokens = lex(source);
    let r = tokens.iter().find(|t| t.kind == TokenKind::Regexp).unwrap();
    assert_eq!(token_text(source, r), r"/a\/b/");
}

#[test]
fn garbage_runs_coalesce() {
    use TokenKind::*;
    assert_eq!(kinds("a @@@ b"), vec![Symbol, Garbage, Symbol]);
}

#[test]
fn line_col_is_one_based() {
    let source = "ab\ncde\nf";
    assert_eq!(line_col(source, 0), (1, 1));
    assert_eq!(line_col(source, 1), (1, 2));
    assert_eq!(line_col(source, 3), (2, 1));
    assert_eq!(line_col(source, 5), (2, 3));
    assert_eq!(line_col(source, 7), (3, 1));
    assert_eq!(line_col(source, source.len()), (3, 2));
}
