use indoc::indoc;

use super::parse;
use crate::graph::NodeKind;

fn parse_err(source: &str) -> String {
    parse(source).err().expect("expected a parse error").to_string()
}

#[test]
fn literal_alternation_collapses_to_a_dict() {
    let parsed = parse(r#"main = "a" | "b" | "c";"#).unwrap();
    assert_eq!(parsed.main.kind(), NodeKind::Dict);
    let mut entries = parsed.main.borrow().dict.clone();
    entries.sort();
    assert_eq!(entries, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
}

#[test]
fn symbols_alias_their_definitions() {
    let parsed = parse(indoc! {r#"
        w = "foo";
        main = w;
    "#})
    .unwrap();
    assert_eq!(parsed.main.kind(), NodeKind::Dict);
    assert_eq!(parsed.main.borrow().dict, vec![b"foo".to_vec()]);
}

#[test]
fn keywords_without_parens_are_symbols() {
    let parsed = parse(indoc! {r#"
        dict = "a";
        main = dict;
    "#})
    .unwrap();
    assert_eq!(parsed.main.kind(), NodeKind::Dict);
}

#[test]
fn star_builds_a_recursive_definition() {
    let parsed = parse(r#"main = "ab"*;"#).unwrap();
    // r = empty | "ab" r: a disjunction that reaches itself.
    assert_eq!(parsed.main.kind(), NodeKind::Disjunct);
    let referenced: Vec<_> = parsed.main.borrow().refs.clone();
    assert!(!referenced.is_empty());
}

#[test]
fn dict_atom_collects_symbols_and_strings() {
    let parsed = parse(r#"main = dict(foo "with space" bar);"#).unwrap();
    assert_eq!(parsed.main.kind(), NodeKind::Dict);
    let mut entries = parsed.main.borrow().dict.clone();
    entries.sort();
    assert_eq!(
        entries,
        vec![b"bar".to_vec(), b"foo".to_vec(), b"with space".to_vec()]
    );
}

#[test]
fn min_length_wraps_in_a_limit() {
    let parsed = parse(r#"main = min_length(2, "ab");"#).unwrap();
    assert_eq!(
        parsed.main.kind(),
        NodeKind::LenLimit {
            min: 2,
            max: u32::MAX
        }
    );
}

#[test]
fn max_length_wraps_in_a_limit() {
    let parsed = parse(r#"main = max_length(7, "ab");"#).unwrap();
    assert_eq!(parsed.main.kind(), NodeKind::LenLimit { min: 0, max: 7 });
}

#[test]
fn string_escapes_decode() {
    let parsed = parse(r#"main = "a\"b\\c\n";"#).unwrap();
    assert_eq!(parsed.main.borrow().dict, vec![b"a\"b\\c\n".to_vec()]);
}

#[test]
fn predefined_empty_and_none() {
    let parsed = parse(r#"main = "x" | empty;"#).unwrap();
    // ε stays a separate branch.
    assert_eq!(parsed.main.kind(), NodeKind::Disjunct);

    let parsed = parse(r#"main = "x" | none;"#).unwrap();
    // ∅ branches vanish.
    assert_eq!(parsed.main.kind(), NodeKind::Dict);
}

// ────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────

#[test]
fn missing_semicolon() {
    assert_eq!(
        parse_err(r#"main = "a""#),
        "semicolon expected on line 1, column 11"
    );
}

#[test]
fn duplicate_definition() {
    let err = parse_err(indoc! {r#"
        main = "a";
        main = "b";
    "#});
    assert_eq!(err, "duplicate definition for symbol 'main' on line 2, column 1");
}

#[test]
fn undefined_symbol() {
    assert_eq!(
        parse_err("main = foo;"),
        "undefined symbol 'foo' on line 1, column 8"
    );
}

#[test]
fn missing_main() {
    let err = parse_err(r#"a = "x";"#);
    assert!(err.starts_with("main is not defined"), "{err}");
}

#[test]
fn referenced_but_undefined_main() {
    let err = parse_err("foo = main;");
    assert!(err.starts_with("main is not defined"), "{err}");
}

#[test]
fn unbalanced_braces() {
    assert_eq!(
        parse_err(r#"main = ("a";"#),
        "unbalanced braces on line 1, column 12"
    );
}

#[test]
fn unknown_escape() {
    assert_eq!(
        parse_err(r#"main = "\q";"#),
        "unknown escape on line 1, column 9"
    );
}

#[test]
fn unrecognized_input() {
    let err = parse_err("main = @;");
    assert!(err.contains("on line 1, column 8"), "{err}");
}

#[test]
fn redefining_a_builtin_is_a_duplicate() {
    let err = parse_err(r#"empty = "x"; main = "y";"#);
    assert!(
        err.starts_with("duplicate definition for symbol 'empty'"),
        "{err}"
    );
}
