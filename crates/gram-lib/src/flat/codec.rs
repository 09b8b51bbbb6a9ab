//! The index ↔ phrase bijection over a flat graph.
//!
//! Every node admits exactly `count` phrases, indexed `0..count`.
//! Dictionaries index directly; disjunctions stack their children's
//! ranges end to end; concatenations split the index as a mixed-radix
//! number, least significant digit on the first child. `parse` inverts
//! `generate` exactly, which is what makes a phrase a faithful witness
//! of its index.

use gram_core::entropy::sample_below;
use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, ToPrimitive, Zero};
use rand::RngCore;

use super::{FlatGraph, FlatKind, FlatNode};

/// Index not covered by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("index out of range")]
    IndexOutOfRange,
}

/// Phrase for an index, checked. The inverse of [`parse`].
pub fn encode(graph: &FlatGraph, node: &FlatNode, index: &BigUint) -> Result<Vec<u8>, CodecError> {
    if *index >= node.count {
        return Err(CodecError::IndexOutOfRange);
    }
    Ok(generate(graph, node, index))
}

/// Phrase for an index.
///
/// # Panics
///
/// `index` must be below `node.count`; anything else is a programming
/// error on the caller's side.
pub fn generate(graph: &FlatGraph, node: &FlatNode, index: &BigUint) -> Vec<u8> {
    assert!(*index < node.count, "phrase index out of range");
    let mut out = Vec::new();
    let end = generate_at(graph, node, &mut out, 0, index.clone());
    out.truncate(end);
    out
}

fn generate_at(
    graph: &FlatGraph,
    node: &FlatNode,
    out: &mut Vec<u8>,
    pos: usize,
    mut num: BigUint,
) -> usize {
    if let Some(len) = node.len {
        let end = pos + len as usize;
        if out.len() < end {
            out.resize(end, 0);
        }
    }
    match node.kind {
        FlatKind::Dict => {
            let i = num.to_usize().expect("dict index fits in usize");
            let width = graph.dicts[node.dict].width();
            out[pos..pos + width].copy_from_slice(graph.dicts[node.dict].get(i));
            pos + width
        }
        FlatKind::Disjunct => {
            for &(_, index) in &node.refs {
                let child = &graph.nodes[index];
                if num < child.count {
                    return generate_at(graph, child, out, pos, num);
                }
                num -= &child.count;
            }
            unreachable!("disjunct index exceeds its children");
        }
        FlatKind::Concat => {
            for &(offset, index) in &node.refs {
                let child = &graph.nodes[index];
                let (quotient, digit) = num.div_rem(&child.count);
                generate_at(graph, child, out, pos + offset, digit);
                num = quotient;
            }
            pos + node.len.expect("concat has a fixed length") as usize
        }
    }
}

/// Index of a phrase, or `None` if the model does not admit it.
pub fn parse(graph: &FlatGraph, node: &FlatNode, phrase: &[u8]) -> Option<BigUint> {
    if let Some(len) = node.len {
        if phrase.len() != len as usize {
            return None;
        }
    }
    match node.kind {
        FlatKind::Dict => graph.dicts[node.dict].find(phrase).map(BigUint::from),
        FlatKind::Disjunct => {
            let mut skipped = BigUint::zero();
            for &(_, index) in &node.refs {
                let child = &graph.nodes[index];
                if let Some(inner) = parse(graph, child, phrase) {
                    return Some(skipped + inner);
                }
                skipped += &child.count;
            }
            None
        }
        FlatKind::Concat => {
            let mut out = BigUint::zero();
            let mut mult = BigUint::one();
            for &(offset, index) in &node.refs {
                let child = &graph.nodes[index];
                let len = child.len? as usize;
                let slice = phrase.get(offset..offset + len)?;
                let digit = parse(graph, child, slice)?;
                out += &mult * digit;
                mult *= &child.count;
            }
            Some(out)
        }
    }
}

/// Draw a uniform random phrase, round-tripping it through [`parse`] as a
/// self-check of the model.
pub fn generate_random<R: RngCore>(graph: &FlatGraph, node: &FlatNode, rng: &mut R) -> Vec<u8> {
    let index = sample_below(rng, &node.count);
    let phrase = generate(graph, node, &index);
    let back = parse(graph, node, &phrase);
    assert_eq!(back, Some(index), "model failed its round-trip check");
    phrase
}

/// All phrases in index order. Lazy: the full language may be far larger
/// than memory.
pub fn enumerate<'g>(
    graph: &'g FlatGraph,
    node: &'g FlatNode,
) -> impl Iterator<Item = Vec<u8>> + 'g {
    let mut index = BigUint::zero();
    std::iter::from_fn(move || {
        if index >= node.count {
            return None;
        }
        let phrase = generate(graph, node, &index);
        index += 1u32;
        Some(phrase)
    })
}
