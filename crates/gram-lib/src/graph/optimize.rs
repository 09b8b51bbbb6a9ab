//! Rewrite rules over the grammar DAG.
//!
//! The rules fold redundant structure without changing any node's
//! language:
//!
//! - `Dict {}` → `None`; `Dict {""}` → `Empty`.
//! - A `Concat` with a ∅ child is ∅; `Empty` children are dropped; an
//!   all-`Empty` concatenation is `Empty`.
//! - `None` children of a `Disjunct` are dropped; an all-∅ disjunction is
//!   `None`.
//! - Uniquely-owned same-kind children flatten into their parent.
//! - Uniquely-owned `Dict` children of a `Disjunct` merge into one
//!   dictionary; adjacent uniquely-owned `Dict` children of a `Concat`
//!   merge into their cross product when either side has a single entry.
//! - A composite with one child collapses onto that child.
//!
//! Rewrites that would steal a node out from under another owner are
//! gated on [`NodeRef::unique`]. Self-referential children (a symbol
//! defined as itself) are left opaque.

use super::{Graph, GraphNode, NodeKind, NodeRef};

/// Run the rules to a fixed point over every live node.
pub fn optimize(graph: &Graph) {
    loop {
        let mut any = false;
        for weak in graph.snapshot() {
            if let Some(rc) = weak.upgrade() {
                any |= optimize_node(graph, &Graph::wrap(rc));
            }
        }
        if !any {
            break;
        }
    }
}

/// Apply the rules to one node. A node may change kind mid-way (a
/// disjunction can collapse to a dictionary), so the dispatch re-reads the
/// kind between stages.
pub fn optimize_node(graph: &Graph, node: &NodeRef) -> bool {
    let mut changed = false;
    if node.kind() == NodeKind::Disjunct {
        changed |= optimize_disjunct(graph, node);
    }
    if node.kind() == NodeKind::Concat {
        changed |= optimize_concat(node);
    }
    if node.kind() == NodeKind::Dict {
        changed |= optimize_dict(node);
    }
    changed
}

/// Alias a handle past a singleton composite.
pub fn optimize_ref(r: &mut NodeRef) {
    let inner = {
        let node = r.borrow();
        match node.kind {
            NodeKind::Disjunct | NodeKind::Concat if node.refs.len() == 1 => {
                Some(node.refs[0].clone())
            }
            _ => None,
        }
    };
    if let Some(inner) = inner {
        *r = inner;
    }
}

fn optimize_dict(node: &NodeRef) -> bool {
    let mut n = node.borrow_mut();
    debug_assert_eq!(n.kind, NodeKind::Dict);
    if n.dict.is_empty() {
        n.kind = NodeKind::None;
        return true;
    }
    if n.dict.len() == 1 && n.dict[0].is_empty() {
        n.kind = NodeKind::Empty;
        n.dict.clear();
        return true;
    }
    false
}

/// Gather a disjunction's surviving children into `refs`, pooling the
/// entries of uniquely-owned dictionary children into `dict`.
fn collapse_disjunct(
    input: Vec<NodeRef>,
    dict: &mut Vec<Vec<u8>>,
    refs: &mut Vec<NodeRef>,
    parent: &NodeRef,
) -> bool {
    let mut modified = false;
    for child in input {
        if child.ptr_eq(parent) {
            refs.push(child);
            continue;
        }
        match child.kind() {
            NodeKind::None => {
                modified = true;
            }
            NodeKind::Disjunct if child.unique() => {
                let grand = std::mem::take(&mut child.borrow_mut().refs);
                collapse_disjunct(grand, dict, refs, parent);
                modified = true;
            }
            NodeKind::Dict if child.unique() => {
                // Moving the first dictionary is not by itself a rewrite.
                if !dict.is_empty() {
                    modified = true;
                }
                let mut entries = std::mem::take(&mut child.borrow_mut().dict);
                if dict.len() < entries.len() {
                    std::mem::swap(dict, &mut entries);
                }
                dict.append(&mut entries);
            }
            NodeKind::Concat if child.borrow().refs.len() == 1 => {
                refs.push(child.borrow().refs[0].clone());
                modified = true;
            }
            _ => refs.push(child),
        }
    }
    modified
}

fn optimize_disjunct(graph: &Graph, node: &NodeRef) -> bool {
    let children = std::mem::take(&mut node.borrow_mut().refs);
    let mut dict: Vec<Vec<u8>> = Vec::new();
    let mut refs: Vec<NodeRef> = Vec::new();
    let modified = collapse_disjunct(children, &mut dict, &mut refs, node);

    if dict.is_empty() && refs.is_empty() {
        node.borrow_mut().kind = NodeKind::None;
        return true;
    }
    if dict.is_empty() && refs.len() == 1 && refs[0].unique() && !refs[0].ptr_eq(node) {
        absorb(node, &refs[0]);
        return true;
    }
    if refs.is_empty() {
        let mut n = node.borrow_mut();
        n.kind = NodeKind::Dict;
        n.dict = dict;
        drop(n);
        optimize_dict(node);
        return true;
    }
    if !dict.is_empty() {
        refs.push(graph.new_dict(dict));
    }
    node.borrow_mut().refs = refs;
    modified
}

/// Gather a concatenation's surviving children, merging adjacent
/// uniquely-owned dictionaries when either side is a single literal.
fn collapse_concat(input: Vec<NodeRef>, refs: &mut Vec<NodeRef>, parent: &NodeRef) -> bool {
    let mut modified = false;
    for child in input {
        if child.ptr_eq(parent) {
            refs.push(child);
            continue;
        }
        match child.kind() {
            NodeKind::Empty => {
                modified = true;
            }
            NodeKind::Concat if child.unique() => {
                let grand = std::mem::take(&mut child.borrow_mut().refs);
                collapse_concat(grand, refs, parent);
                modified = true;
            }
            NodeKind::Disjunct if child.borrow().refs.len() == 1 => {
                refs.push(child.borrow().refs[0].clone());
                modified = true;
            }
            NodeKind::Dict
                if child.unique()
                    && refs
                        .last()
                        .is_some_and(|p| p.kind() == NodeKind::Dict && p.unique())
                    && {
                        let a = refs.last().expect("checked").borrow().dict.len();
                        let b = child.borrow().dict.len();
                        a == 1 || b == 1
                    } =>
            {
                let prev = refs.last().expect("checked");
                let tail = std::mem::take(&mut child.borrow_mut().dict);
                let mut p = prev.borrow_mut();
                let mut crossed = Vec::with_capacity(p.dict.len() * tail.len());
                for s1 in &p.dict {
                    for s2 in &tail {
                        let mut s = s1.clone();
                        s.extend_from_slice(s2);
                        crossed.push(s);
                    }
                }
                p.dict = crossed;
                modified = true;
            }
            _ => refs.push(child),
        }
    }
    modified
}

fn optimize_concat(node: &NodeRef) -> bool {
    let has_none = node
        .borrow()
        .refs
        .iter()
        .any(|c| !c.ptr_eq(node) && c.kind() == NodeKind::None);
    if has_none {
        let dropped = std::mem::take(&mut node.borrow_mut().refs);
        drop(dropped);
        node.borrow_mut().kind = NodeKind::None;
        return true;
    }

    let children = std::mem::take(&mut node.borrow_mut().refs);
    let mut refs: Vec<NodeRef> = Vec::new();
    let modified = collapse_concat(children, &mut refs, node);

    if refs.len() == 1 && refs[0].unique() && !refs[0].ptr_eq(node) {
        absorb(node, &refs[0]);
        return true;
    }
    if refs.is_empty() {
        node.borrow_mut().kind = NodeKind::Empty;
        return true;
    }
    node.borrow_mut().refs = refs;
    modified
}

/// Move a uniquely-owned child's payload into `node`, collapsing the
/// singleton wrapper. The child is left empty and dies with its handle.
fn absorb(node: &NodeRef, child: &NodeRef) {
    let payload = {
        let mut c = child.borrow_mut();
        GraphNode {
            kind: c.kind,
            dict: std::mem::take(&mut c.dict),
            refs: std::mem::take(&mut c.refs),
        }
    };
    *node.borrow_mut() = payload;
}
