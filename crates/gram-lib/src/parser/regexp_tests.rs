use super::parse;
use crate::graph::NodeKind;

fn entries(source: &str) -> Vec<Vec<u8>> {
    let parsed = parse(source).unwrap();
    assert_eq!(parsed.main.kind(), NodeKind::Dict, "not a dict: {source}");
    let mut entries = parsed.main.borrow().dict.clone();
    entries.sort();
    entries
}

#[test]
fn digit_class() {
    let got = entries("main = /[0-9]/;");
    let want: Vec<Vec<u8>> = (b'0'..=b'9').map(|b| vec![b]).collect();
    assert_eq!(got, want);
}

#[test]
fn digit_escape_matches_class() {
    assert_eq!(entries(r"main = /\d/;"), entries("main = /[0-9]/;"));
}

#[test]
fn literal_runs_merge() {
    assert_eq!(entries("main = /abc/;"), vec![b"abc".to_vec()]);
}

#[test]
fn alternation() {
    assert_eq!(
        entries("main = /a|bc/;"),
        vec![b"a".to_vec(), b"bc".to_vec()]
    );
}

#[test]
fn class_with_ranges_and_members() {
    assert_eq!(
        entries("main = /[a-cx]/;"),
        vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec(), b"x".to_vec()]
    );
}

#[test]
fn trailing_hyphen_is_literal() {
    assert_eq!(
        entries("main = /[ab-]/;"),
        vec![b"-".to_vec(), b"a".to_vec(), b"b".to_vec()]
    );
}

#[test]
fn escaped_members_in_class() {
    assert_eq!(
        entries(r"main = /[\]\\]/;"),
        vec![b"\\".to_vec(), b"]".to_vec()]
    );
}

#[test]
fn escaped_metacharacters() {
    assert_eq!(entries(r"main = /\*\+\?/;"), vec![b"*+?".to_vec()]);
    assert_eq!(entries(r"main = /\n/;"), vec![b"\n".to_vec()]);
    assert_eq!(entries(r"main = /a\/b/;"), vec![b"a/b".to_vec()]);
}

#[test]
fn groups_and_optional() {
    let parsed = parse("main = /(ab)?/;").unwrap();
    assert_eq!(parsed.main.kind(), NodeKind::Disjunct);
    let refs = parsed.main.borrow().refs.clone();
    assert_eq!(refs.len(), 2);
    assert_eq!(refs[0].kind(), NodeKind::Empty);
    assert_eq!(refs[1].borrow().dict, vec![b"ab".to_vec()]);
}

#[test]
fn quantified_class_recursion() {
    let parsed = parse("main = /[ab]+/;").unwrap();
    // r = [ab] | [ab] r
    assert_eq!(parsed.main.kind(), NodeKind::Disjunct);
}

#[test]
fn unterminated_class() {
    let err = parse("main = /[a-/;").unwrap_err().to_string();
    assert!(err.contains("character class"), "{err}");
}

#[test]
fn unbalanced_group() {
    let err = parse("main = /a)/;").unwrap_err().to_string();
    assert!(err.contains("unbalanced braces in regexp"), "{err}");
}

#[test]
fn dangling_quantifier() {
    let err = parse("main = /*a/;").unwrap_err().to_string();
    assert!(err.contains("quantifier without operand"), "{err}");
}

#[test]
fn unknown_escape() {
    let err = parse(r"main = /\q/;").unwrap_err().to_string();
    assert!(err.contains("unknown escape in regexp"), "{err}");
}
