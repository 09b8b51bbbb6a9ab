use std::collections::BTreeSet;

use num_bigint::BigUint;

use super::{inline_language, ExpGraph, ExpKind, ExpandError};

fn set(entries: &[&[u8]]) -> BTreeSet<Vec<u8>> {
    entries.iter().map(|e| e.to_vec()).collect()
}

#[test]
fn dict_invariants() {
    let g = ExpGraph::new();
    let d = g.new_dict(set(&[b"foo", b"bar", b"baz"]));
    assert_eq!(d.kind(), ExpKind::Dict);
    assert_eq!(d.count(), BigUint::from(3u32));
    assert_eq!(d.len(), Some(3));
    // Entries are sorted.
    let entries: Vec<Vec<u8>> = d.borrow().dict.iter().map(|s| s.to_vec()).collect();
    assert_eq!(entries, vec![b"bar".to_vec(), b"baz".to_vec(), b"foo".to_vec()]);
}

#[test]
fn concat_multiplies_counts_and_sums_lengths() {
    let g = ExpGraph::new();
    let a = g.new_dict(set(&[b"x", b"y"]));
    let b = g.new_dict(set(&[b"00", b"01", b"10"]));
    let c = g.new_concat(vec![a, b]);
    assert_eq!(c.kind(), ExpKind::Concat);
    assert_eq!(c.count(), BigUint::from(6u32));
    assert_eq!(c.len(), Some(3));
}

#[test]
fn disjunct_sums_counts_and_tracks_mixed_lengths() {
    let g = ExpGraph::new();
    let a = g.new_dict(set(&[b"x", b"y"]));
    let b = g.new_dict(set(&[b"z"]));
    let same = g.new_disjunct(vec![a.clone(), b.clone()]);
    assert_eq!(same.count(), BigUint::from(3u32));
    assert_eq!(same.len(), Some(1));

    let wide = g.new_dict(set(&[b"long"]));
    let mixed = g.new_disjunct(vec![a, wide]);
    assert_eq!(mixed.count(), BigUint::from(3u32));
    assert_eq!(mixed.len(), None);
}

#[test]
fn singleton_composites_collapse() {
    let g = ExpGraph::new();
    let a = g.new_dict(set(&[b"x"]));
    assert!(g.new_concat(vec![a.clone()]).ptr_eq(&a));
    assert!(g.new_disjunct(vec![a.clone()]).ptr_eq(&a));
}

#[test]
fn inline_language_crosses_concats() {
    let g = ExpGraph::new();
    let a = g.new_dict(set(&[b"a", b"b"]));
    let b = g.new_dict(set(&[b"1", b"2"]));
    let c = g.new_concat(vec![a, b]);
    let mut out = inline_language(&c);
    out.sort();
    assert_eq!(
        out,
        vec![b"a1".to_vec(), b"a2".to_vec(), b"b1".to_vec(), b"b2".to_vec()]
    );
}

#[test]
fn optimize_inlines_small_disjuncts() {
    let g = ExpGraph::new();
    let a = g.new_dict(set(&[b"aa"]));
    let b = g.new_dict(set(&[b"bb"]));
    let d = g.new_disjunct(vec![a, b]);
    g.optimize().unwrap();
    assert_eq!(d.kind(), ExpKind::Dict);
    assert_eq!(d.count(), BigUint::from(2u32));
    let entries: Vec<Vec<u8>> = d.borrow().dict.iter().map(|s| s.to_vec()).collect();
    assert_eq!(entries, vec![b"aa".to_vec(), b"bb".to_vec()]);
}

#[test]
fn optimize_rejects_ambiguous_disjuncts() {
    let g = ExpGraph::new();
    let a = g.new_dict(set(&[b"ab"]));
    let b = g.new_dict(set(&[b"ab", b"cd"]));
    let _d = g.new_disjunct(vec![a, b]);
    let err = g.optimize().unwrap_err();
    assert_eq!(err, ExpandError::DuplicatePhrase("ab".to_string()));
}

#[test]
fn optimize_leaves_mixed_length_disjuncts_alone() {
    let g = ExpGraph::new();
    let a = g.new_dict(set(&[b"x"]));
    let b = g.new_dict(set(&[b"yy"]));
    let d = g.new_disjunct(vec![a, b]);
    g.optimize().unwrap();
    assert_eq!(d.kind(), ExpKind::Disjunct);
    assert_eq!(d.len(), None);
}

#[test]
fn optimize_flattens_unique_same_kind_chains() {
    let g = ExpGraph::new();
    let a = g.new_dict(set(&[b"a"]));
    let b = g.new_dict(set(&[b"b"]));
    let c = g.new_dict(set(&[b"c"]));
    let inner = g.new_concat(vec![a.clone(), b.clone()]);
    let outer = g.new_concat(vec![inner, c.clone()]);
    g.optimize().unwrap();
    assert_eq!(outer.borrow().refs.len(), 3);
    assert_eq!(outer.count(), BigUint::from(1u32));
    assert_eq!(outer.len(), Some(3));
    drop((a, b, c));
}

#[test]
fn shared_children_are_not_flattened() {
    let g = ExpGraph::new();
    let a = g.new_dict(set(&[b"a"]));
    let b = g.new_dict(set(&[b"b"]));
    let inner = g.new_concat(vec![a, b]);
    let keep = inner.clone();
    let c = g.new_dict(set(&[b"c"]));
    let outer = g.new_concat(vec![inner, c]);
    g.optimize().unwrap();
    assert_eq!(outer.borrow().refs.len(), 2);
    drop(keep);
}

#[test]
fn creation_order_is_topological() {
    let g = ExpGraph::new();
    let a = g.new_dict(set(&[b"a"]));
    let b = g.new_dict(set(&[b"b"]));
    let c = g.new_concat(vec![a, b]);
    let order: Vec<u32> = g.iter_live().iter().map(|r| r.seq()).collect();
    assert_eq!(order, vec![0, 1, 2]);
    assert_eq!(c.seq(), 2);
}
