//! The expanded graph: every node knows its phrase count.
//!
//! Three node kinds remain after expansion. A `Dict` holds its phrases
//! outright in a sorted [`StringPool`]; `Concat` multiplies its children's
//! counts; `Disjunct` adds them. `len` is the common phrase length of the
//! node, or `None` for a disjunction that mixes lengths (only the
//! top-level range node does).

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::collections::BTreeSet;
use std::rc::Rc;

use gram_core::{Pool, StringPool};
use num_bigint::BigUint;
use num_traits::Zero;

use super::ExpandError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpKind {
    Dict,
    Concat,
    Disjunct,
}

/// An expanded node.
#[derive(Debug)]
pub struct ExpNode {
    pub kind: ExpKind,
    pub count: BigUint,
    pub len: Option<u32>,
    pub dict: StringPool,
    pub refs: Vec<ExpRef>,
    /// Creation counter; gives child lists a deterministic canonical
    /// order without relying on allocation addresses.
    pub seq: u32,
}

impl Drop for ExpNode {
    /// Iterative teardown, as for grammar nodes: recursive grammars
    /// expand into chains as deep as the phrase length.
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.refs);
        while let Some(child) = pending.pop() {
            if let Ok(cell) = Rc::try_unwrap(child.0) {
                let mut node = cell.into_inner();
                pending.append(&mut node.refs);
            }
        }
    }
}

/// Handle to an expanded node.
#[derive(Debug, Clone)]
pub struct ExpRef(Rc<RefCell<ExpNode>>);

impl ExpRef {
    pub fn kind(&self) -> ExpKind {
        self.0.borrow().kind
    }

    pub fn count(&self) -> BigUint {
        self.0.borrow().count.clone()
    }

    pub fn len(&self) -> Option<u32> {
        self.0.borrow().len
    }

    pub fn seq(&self) -> u32 {
        self.0.borrow().seq
    }

    pub fn borrow(&self) -> Ref<'_, ExpNode> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, ExpNode> {
        self.0.borrow_mut()
    }

    pub fn unique(&self) -> bool {
        Rc::strong_count(&self.0) == 1
    }

    pub fn ptr_eq(&self, other: &ExpRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn ptr_id(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for ExpRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ExpRef {}

impl std::hash::Hash for ExpRef {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.ptr_id().hash(state);
    }
}

/// The expanded graph: a registry plus constructors that maintain the
/// count/length invariants.
pub struct ExpGraph {
    nodes: RefCell<Pool<ExpNode>>,
    next_seq: Cell<u32>,
}

impl ExpGraph {
    pub fn new() -> Self {
        Self {
            nodes: RefCell::new(Pool::new()),
            next_seq: Cell::new(0),
        }
    }

    fn insert(&self, mut node: ExpNode) -> ExpRef {
        let seq = self.next_seq.get();
        self.next_seq.set(seq + 1);
        node.seq = seq;
        ExpRef(self.nodes.borrow_mut().insert(node))
    }

    pub(crate) fn wrap(rc: Rc<RefCell<ExpNode>>) -> ExpRef {
        ExpRef(rc)
    }

    pub(crate) fn snapshot(&self) -> Vec<std::rc::Weak<RefCell<ExpNode>>> {
        self.nodes.borrow().snapshot()
    }

    /// Live nodes in creation order. Children always precede parents.
    pub fn iter_live(&self) -> Vec<ExpRef> {
        self.nodes.borrow().iter_live().map(ExpRef).collect()
    }

    pub fn live(&self) -> usize {
        self.nodes.borrow_mut().live()
    }

    pub(crate) fn live_at_most(&self, limit: usize) -> bool {
        self.nodes.borrow_mut().live_at_most(limit)
    }

    /// Dictionary node over a set of equal-length phrases.
    pub fn new_dict(&self, entries: BTreeSet<Vec<u8>>) -> ExpRef {
        debug_assert!(!entries.is_empty());
        let mut iter = entries.iter();
        let width = iter.next().map(|e| e.len()).unwrap_or(0);
        debug_assert!(entries.iter().all(|e| e.len() == width));
        let mut dict = StringPool::with_capacity(width, entries.len());
        for e in &entries {
            dict.append(e);
        }
        self.insert(ExpNode {
            kind: ExpKind::Dict,
            count: BigUint::from(entries.len()),
            len: Some(width as u32),
            dict,
            refs: Vec::new(),
            seq: 0,
        })
    }

    /// Concatenation node. Children must have fixed, nonzero counts.
    pub fn new_concat(&self, mut refs: Vec<ExpRef>) -> ExpRef {
        debug_assert!(!refs.is_empty());
        if refs.len() == 1 {
            return refs.pop().expect("len checked");
        }
        let mut count = BigUint::from(1u32);
        let mut len = 0u32;
        for r in &refs {
            let node = r.borrow();
            count *= &node.count;
            len += node.len.expect("concat child has fixed length");
        }
        self.insert(ExpNode {
            kind: ExpKind::Concat,
            count,
            len: Some(len),
            dict: StringPool::new(),
            refs,
            seq: 0,
        })
    }

    /// Disjunction node; `len` becomes `None` when children disagree.
    pub fn new_disjunct(&self, mut refs: Vec<ExpRef>) -> ExpRef {
        debug_assert!(!refs.is_empty());
        if refs.len() == 1 {
            return refs.pop().expect("len checked");
        }
        let mut count = BigUint::zero();
        let mut len = refs[0].len();
        for r in &refs {
            let node = r.borrow();
            count += &node.count;
            if node.len != len {
                len = None;
            }
        }
        self.insert(ExpNode {
            kind: ExpKind::Disjunct,
            count,
            len,
            dict: StringPool::new(),
            refs,
            seq: 0,
        })
    }

    /// Run the expanded-graph rewrites to a fixed point: inline small
    /// fixed-length disjunctions into dictionaries, and flatten same-kind
    /// chains through uniquely-owned children.
    pub fn optimize(&self) -> Result<(), ExpandError> {
        loop {
            let mut any = false;
            for weak in self.snapshot() {
                if let Some(rc) = weak.upgrade() {
                    any |= optimize_node(&ExpRef(rc))?;
                }
            }
            if !any {
                return Ok(());
            }
        }
    }
}

impl Default for ExpGraph {
    fn default() -> Self {
        Self::new()
    }
}

fn optimize_node(node: &ExpRef) -> Result<bool, ExpandError> {
    let kind = node.kind();
    match kind {
        ExpKind::Dict => Ok(false),
        ExpKind::Disjunct => {
            if node.borrow().count.bits() <= 6 && node.len().is_some() {
                materialize_dict(node)?;
                return Ok(true);
            }
            Ok(flatten(node, ExpKind::Disjunct))
        }
        ExpKind::Concat => Ok(flatten(node, ExpKind::Concat)),
    }
}

/// Replace a small disjunction by its language, in place.
fn materialize_dict(node: &ExpRef) -> Result<(), ExpandError> {
    let phrases = inline_language(node);
    let mut set: BTreeSet<Vec<u8>> = BTreeSet::new();
    for p in phrases {
        if !set.insert(p.clone()) {
            return Err(ExpandError::DuplicatePhrase(
                String::from_utf8_lossy(&p).into_owned(),
            ));
        }
    }
    let width = node.borrow().len.expect("fixed length checked") as usize;
    let mut dict = StringPool::with_capacity(width, set.len());
    for e in &set {
        dict.append(e);
    }
    let mut n = node.borrow_mut();
    debug_assert_eq!(BigUint::from(set.len()), n.count);
    n.kind = ExpKind::Dict;
    n.dict = dict;
    let dropped = std::mem::take(&mut n.refs);
    drop(n);
    drop(dropped);
    Ok(())
}

/// Splice uniquely-owned same-kind children into the parent.
fn flatten(node: &ExpRef, kind: ExpKind) -> bool {
    let collectable = node
        .borrow()
        .refs
        .iter()
        .any(|c| c.kind() == kind && c.unique());
    if !collectable {
        return false;
    }
    let children = std::mem::take(&mut node.borrow_mut().refs);
    let mut out = Vec::with_capacity(children.len());
    collect(children, kind, &mut out);
    node.borrow_mut().refs = out;
    true
}

fn collect(input: Vec<ExpRef>, kind: ExpKind, out: &mut Vec<ExpRef>) {
    for child in input {
        if child.kind() == kind && child.unique() {
            let grand = std::mem::take(&mut child.borrow_mut().refs);
            collect(grand, kind, out);
        } else {
            out.push(child);
        }
    }
}

/// Every phrase the node admits, duplicates included, in derivation
/// order. Only sensible for small counts; callers bound it first.
pub fn inline_language(node: &ExpRef) -> Vec<Vec<u8>> {
    let n = node.borrow();
    match n.kind {
        ExpKind::Dict => n.dict.iter().map(|s| s.to_vec()).collect(),
        ExpKind::Disjunct => {
            let mut out = Vec::new();
            for child in &n.refs {
                out.extend(inline_language(child));
            }
            out
        }
        ExpKind::Concat => {
            let mut acc: Vec<Vec<u8>> = vec![Vec::new()];
            for child in &n.refs {
                let parts = inline_language(child);
                let mut next = Vec::with_capacity(acc.len() * parts.len());
                for prefix in &acc {
                    for part in &parts {
                        let mut s = prefix.clone();
                        s.extend_from_slice(part);
                        next.push(s);
                    }
                }
                acc = next;
            }
            acc
        }
    }
}
