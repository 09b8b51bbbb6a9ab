//! Binary emission of an expanded graph.
//!
//! Nodes are written in creation order (children always precede their
//! parents) up to and including the root. Tags pack the node kind into
//! the low two bits of a varint: `4k` for a dictionary of `k` entries,
//! `4(k−2)+1` for a concatenation of `k` children, `4(k−2)+2` for a
//! disjunction; `0` terminates the stream.
//!
//! Within a node, children are ordered for decode speed. Every node gets
//! an estimated cost to accept (`success`) and to reject (`fail`) a
//! candidate phrase; a concatenation puts cheap-to-reject children first,
//! a fixed-length disjunction puts its most selective children first.
//! Mixed-length disjunctions keep their ascending-length order, which the
//! length check already resolves.

use std::collections::HashMap;

use gram_core::varint::write_uint;
use num_bigint::BigUint;
use num_traits::ToPrimitive;

use crate::expand::{ExpGraph, ExpKind, ExpRef};

struct NodeData {
    number: usize,
    success: f64,
    fail: f64,
}

/// Serialize the graph up to and including `root`.
pub fn export(graph: &ExpGraph, root: &ExpRef) -> Vec<u8> {
    let mut out = Vec::new();
    let mut data: HashMap<usize, NodeData> = HashMap::new();
    let mut number = 0usize;

    for node in graph.iter_live() {
        let (success, fail) = match node.kind() {
            ExpKind::Dict => write_dict(&mut out, &node),
            ExpKind::Concat => write_concat(&mut out, &node, number, &data),
            ExpKind::Disjunct => write_disjunct(&mut out, &node, number, &data),
        };
        data.insert(
            node.ptr_id(),
            NodeData {
                number,
                success,
                fail,
            },
        );
        if node.ptr_eq(root) {
            break;
        }
        number += 1;
    }

    write_uint(&mut out, 0);
    out
}

fn write_dict(out: &mut Vec<u8>, node: &ExpRef) -> (f64, f64) {
    let n = node.borrow();
    let k = n.dict.len();
    write_uint(out, 4 * k as u64);
    write_uint(out, u64::from(n.len.expect("dict has a fixed length")));
    let mut prev: Option<&[u8]> = None;
    for entry in n.dict.iter() {
        match prev {
            None => out.extend_from_slice(entry),
            Some(prev) => {
                let shared = prev
                    .iter()
                    .zip(entry.iter())
                    .take_while(|(a, b)| a == b)
                    .count();
                write_uint(out, shared as u64);
                out.extend_from_slice(&entry[shared..]);
            }
        }
        prev = Some(entry);
    }
    let cost = (k as f64).log2();
    (cost + 1.0, cost + 2.0)
}

fn write_concat(
    out: &mut Vec<u8>,
    node: &ExpRef,
    number: usize,
    data: &HashMap<usize, NodeData>,
) -> (f64, f64) {
    struct Sub {
        fail: f64,
        success: f64,
        number: usize,
        pos: u64,
    }

    let n = node.borrow();
    let mut subs: Vec<Sub> = Vec::with_capacity(n.refs.len());
    let mut pos = 0u64;
    for child in &n.refs {
        let child_data = &data[&child.ptr_id()];
        subs.push(Sub {
            fail: child_data.fail,
            success: child_data.success,
            number: child_data.number,
            pos,
        });
        pos += u64::from(child.len().expect("concat child has a fixed length"));
    }
    subs.sort_by(|a, b| a.fail.total_cmp(&b.fail).then(a.number.cmp(&b.number)));

    write_uint(out, 4 * (n.refs.len() as u64 - 2) + 1);
    let mut success = 0.0;
    let mut fail = 0.0;
    let mut fact = 1.0;
    for sub in &subs {
        fail += (success + sub.fail) * fact;
        success += sub.success;
        fact *= 0.1;
        write_uint(out, sub.pos);
        write_uint(out, (number - sub.number - 1) as u64);
    }
    (1.0 + success, 1.0 + fail)
}

fn write_disjunct(
    out: &mut Vec<u8>,
    node: &ExpRef,
    number: usize,
    data: &HashMap<usize, NodeData>,
) -> (f64, f64) {
    struct Sub {
        selectivity: f64,
        success: f64,
        fail: f64,
        number: usize,
        ratio: f64,
    }

    let n = node.borrow();
    let mut subs: Vec<Sub> = Vec::with_capacity(n.refs.len());
    for child in &n.refs {
        let child_data = &data[&child.ptr_id()];
        let count = child.count();
        subs.push(Sub {
            selectivity: child_data.fail / count.to_f64().unwrap_or(f64::MAX),
            success: child_data.success,
            fail: child_data.fail,
            number: child_data.number,
            ratio: count_ratio(&count, &n.count),
        });
    }
    if n.len.is_some() {
        subs.sort_by(|a, b| {
            a.selectivity
                .total_cmp(&b.selectivity)
                .then(a.number.cmp(&b.number))
        });
    }

    write_uint(out, 4 * (n.refs.len() as u64 - 2) + 2);
    let mut success = 0.0;
    let mut fail = 0.0;
    for sub in &subs {
        success += (fail + sub.success) * sub.ratio;
        fail += sub.fail;
        write_uint(out, (number - sub.number - 1) as u64);
    }
    (1.0 + success, 1.0 + fail)
}

/// `child / total` as a double, computed through a scaled big-integer
/// division so arbitrarily large counts stay in floating-point range.
fn count_ratio(child: &BigUint, total: &BigUint) -> f64 {
    let scale = BigUint::from(10u32).pow(27);
    let scaled = (child * &scale) / total;
    scaled.to_f64().unwrap_or(0.0) * 1e-27
}
