//! Expansion against an entropy target.
//!
//! Per-length expansions are accumulated from the shortest length up;
//! once the combined count clears the target (plus overshoot slack), the
//! longest droppable prefix of lengths is trimmed off and the survivors
//! become one top-level disjunction. Working from a single expander means
//! every length shares the same cache of subproblems.

use num_bigint::BigUint;
use num_traits::Zero;

use gram_core::pow2_big;

use super::{ExpGraph, ExpRef, ExpandError, Expander};
use crate::graph::NodeRef;

/// Knobs for [`expand_for_bits`].
#[derive(Debug, Clone)]
pub struct ExpandOptions {
    /// Minimum entropy of the resulting phrase set, in bits.
    pub bits: f64,
    /// Count-ratio slack: accumulation stops at `2^bits · (1+overshoot)`.
    pub overshoot: f64,
    pub min_len: u32,
    pub max_len: u32,
    pub max_nodes: usize,
    pub max_thunks: usize,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self {
            bits: 64.0,
            overshoot: 0.2,
            min_len: 0,
            max_len: 1024,
            max_nodes: 1_000_000,
            max_thunks: 250_000,
        }
    }
}

/// A compiled phrase set covering a contiguous length range.
#[derive(Debug)]
pub struct RangeExpansion {
    pub root: ExpRef,
    pub min_len: u32,
    pub max_len: u32,
}

/// Expand `root` over a length range until the phrase count reaches the
/// entropy target, then trim to the smallest sufficient length suffix.
pub fn expand_for_bits(
    root: &NodeRef,
    expgraph: &ExpGraph,
    opts: &ExpandOptions,
) -> Result<RangeExpansion, ExpandError> {
    let mut expander = Expander::new(expgraph, opts.max_nodes, opts.max_thunks);
    let floor = pow2_big(opts.bits);
    let goal = pow2_big(opts.bits + (1.0 + opts.overshoot).log2());

    let mut slices: Vec<ExpRef> = Vec::new();
    let mut total = BigUint::zero();

    for len in opts.min_len..=opts.max_len {
        let Some(slice) = expander.expand(root, len)? else {
            continue;
        };
        total += slice.count();
        slices.push(slice);
        if total < goal {
            continue;
        }

        // Drop leading lengths while what remains still meets the floor.
        let mut start = 0;
        while start < slices.len() {
            let next = &total - slices[start].count();
            if next >= floor {
                total = next;
                start += 1;
            } else {
                break;
            }
        }
        let keep: Vec<ExpRef> = slices.drain(start..).collect();
        drop(slices);

        let min_len = keep.first().and_then(|r| r.len()).unwrap_or(0);
        let max_len = keep.last().and_then(|r| r.len()).unwrap_or(0);
        let root = expgraph.new_disjunct(keep);
        return Ok(RangeExpansion {
            root,
            min_len,
            max_len,
        });
    }

    Err(ExpandError::NoSolution)
}
