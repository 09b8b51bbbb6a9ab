//! Demand-driven expansion scheduler.
//!
//! Expanding `(node, len)` is a little dataflow program: a *thunk* per
//! pending question, a dependency edge per sub-question, and a work deque
//! that drains until the root question is answered. Concatenations are
//! the interesting case: the child list is bisected and every split of
//! the length budget between the two halves becomes an anonymous
//! composition thunk, so a recursive symbol is only ever consulted at
//! strictly smaller lengths.
//!
//! Expanded nodes are hash-consed as they are built: dictionaries by
//! content, composites by kind and child identity (disjunction children
//! canonicalized by creation order). Small unambiguous fixed-length
//! disjunctions are materialized into dictionaries immediately; ambiguous
//! ones are kept so a surrounding dedup can collapse them, and rejected
//! by the post-expansion optimizer if they survive into the model.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::rc::Rc;

use gram_core::Pool;
use num_bigint::BigUint;

use super::expgraph::{inline_language, ExpGraph, ExpKind, ExpRef};
use super::{ExpandError, DEDUP_LIMIT};
use crate::graph::{NodeKind, NodeRef};

/// Cache identity of a pending expansion: grammar node, target length,
/// and (for concatenations) the child subrange being split.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Key {
    len: u32,
    offset: u32,
    cutoff: u32,
    node: NodeRef,
}

impl Key {
    /// The whole-node key. A concatenation's primary key spans its full
    /// child range so subrange keys never collide with it.
    fn primary(len: u32, node: &NodeRef) -> Self {
        let cutoff = match node.kind() {
            NodeKind::Concat => node.borrow().refs.len() as u32,
            _ => 0,
        };
        Self {
            len,
            offset: 0,
            cutoff,
            node: node.clone(),
        }
    }

    fn range(len: u32, node: &NodeRef, offset: u32, cutoff: u32) -> Self {
        Self {
            len,
            offset,
            cutoff,
            node: node.clone(),
        }
    }
}

/// How a thunk combines its dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ThunkType {
    Disjunct,
    Concat,
    Dedup,
    Copy,
}

struct Thunk {
    /// Present on primary (cached) thunks; composition thunks are
    /// anonymous.
    key: Option<Key>,
    need_expansion: bool,
    done: bool,
    todo: bool,
    ttype: ThunkType,
    result: Option<ExpRef>,
    deps: Vec<ThunkRef>,
    forward: Vec<ThunkRef>,
}

type ThunkRef = Rc<std::cell::RefCell<Thunk>>;

impl Thunk {
    fn primary(key: Key) -> Self {
        Self {
            key: Some(key),
            need_expansion: true,
            done: false,
            todo: false,
            ttype: ThunkType::Disjunct,
            result: None,
            deps: Vec::new(),
            forward: Vec::new(),
        }
    }

    fn composition() -> Self {
        Self {
            key: None,
            need_expansion: false,
            done: false,
            todo: false,
            ttype: ThunkType::Concat,
            result: None,
            deps: Vec::new(),
            forward: Vec::new(),
        }
    }
}

/// Expands grammar nodes into [`ExpGraph`] nodes, one target length at a
/// time. Results are cached across calls, so stacking many lengths over
/// one expander shares all common subproblems.
pub struct Expander<'g> {
    expgraph: &'g ExpGraph,
    max_nodes: usize,
    max_thunks: usize,
    thunks: Pool<Thunk>,
    thunkmap: HashMap<Key, ThunkRef>,
    todo: VecDeque<ThunkRef>,
    dict_cons: HashMap<(u32, Vec<u8>), ExpRef>,
    node_cons: HashMap<(ExpKind, Vec<u32>), ExpRef>,
}

impl<'g> Expander<'g> {
    pub fn new(expgraph: &'g ExpGraph, max_nodes: usize, max_thunks: usize) -> Self {
        Self {
            expgraph,
            max_nodes,
            max_thunks,
            thunks: Pool::new(),
            thunkmap: HashMap::new(),
            todo: VecDeque::new(),
            dict_cons: HashMap::new(),
            node_cons: HashMap::new(),
        }
    }

    /// Expand `{w ∈ L(root) : |w| = len}`. `Ok(None)` means the language
    /// is empty at this length.
    pub fn expand(&mut self, root: &NodeRef, len: u32) -> Result<Option<ExpRef>, ExpandError> {
        let key = Key::primary(len, root);
        let root_thunk = self.dep_thunk(&key, None);

        while !root_thunk.borrow().done {
            if !self.expgraph.live_at_most(self.max_nodes) {
                return Err(ExpandError::NodeBudgetExceeded);
            }
            if !self.thunks.live_at_most(self.max_thunks) {
                return Err(ExpandError::ThunkBudgetExceeded);
            }
            let Some(now) = self.todo.pop_front() else {
                return Err(ExpandError::InfiniteRecursion);
            };
            now.borrow_mut().todo = false;
            self.process(&now)?;
        }

        let result = root_thunk.borrow().result.clone();
        Ok(result)
    }

    // ────────────────────────────────────────────────────────────────────
    // Scheduling
    // ────────────────────────────────────────────────────────────────────

    /// Get or create the primary thunk for `key`, registering `parent` as
    /// a dependent.
    fn dep_thunk(&mut self, key: &Key, parent: Option<&ThunkRef>) -> ThunkRef {
        let thunk = match self.thunkmap.get(key) {
            Some(t) => t.clone(),
            None => {
                let t = self.thunks.insert(Thunk::primary(key.clone()));
                self.thunkmap.insert(key.clone(), t.clone());
                t
            }
        };
        if !thunk.borrow().done {
            self.add_todo(&thunk, false);
            if let Some(parent) = parent {
                let mut t = thunk.borrow_mut();
                if !t.forward.iter().any(|f| Rc::ptr_eq(f, parent)) {
                    t.forward.push(parent.clone());
                }
            }
        }
        if let Some(parent) = parent {
            parent.borrow_mut().deps.push(thunk.clone());
        }
        thunk
    }

    /// Enqueue unless already queued. Re-enqueued dependents go to the
    /// front so freshly satisfied parents finalize before new splits
    /// start.
    fn add_todo(&mut self, thunk: &ThunkRef, priority: bool) {
        {
            let mut t = thunk.borrow_mut();
            if t.todo {
                return;
            }
            t.todo = true;
        }
        if priority {
            self.todo.push_front(thunk.clone());
        } else {
            self.todo.push_back(thunk.clone());
        }
    }

    fn process(&mut self, thunk: &ThunkRef) -> Result<(), ExpandError> {
        if thunk.borrow().done {
            return Ok(());
        }
        if thunk.borrow().need_expansion {
            self.expand_structure(thunk)?;
        }
        if !thunk.borrow().done {
            self.finalize(thunk)?;
        }
        if thunk.borrow().done {
            let forwards = std::mem::take(&mut thunk.borrow_mut().forward);
            for f in &forwards {
                self.add_todo(f, true);
            }
            let deps = std::mem::take(&mut thunk.borrow_mut().deps);
            for d in &deps {
                d.borrow_mut().forward.retain(|f| !Rc::ptr_eq(f, thunk));
            }
        }
        Ok(())
    }

    /// First visit: unfold the grammar node behind a primary thunk.
    fn expand_structure(&mut self, thunk: &ThunkRef) -> Result<(), ExpandError> {
        thunk.borrow_mut().need_expansion = false;
        let key = thunk.borrow().key.clone().expect("primary thunk has a key");
        match key.node.kind() {
            NodeKind::Undef => return Err(ExpandError::UndefinedNode),
            NodeKind::None => {
                thunk.borrow_mut().done = true;
            }
            NodeKind::Empty => {
                let result = (key.len == 0).then(|| self.epsilon_dict());
                let mut t = thunk.borrow_mut();
                t.done = true;
                t.result = result;
            }
            NodeKind::Dict => {
                let entries: BTreeSet<Vec<u8>> = key
                    .node
                    .borrow()
                    .dict
                    .iter()
                    .filter(|s| s.len() == key.len as usize)
                    .cloned()
                    .collect();
                let result = (!entries.is_empty()).then(|| self.make_dict(entries));
                let mut t = thunk.borrow_mut();
                t.done = true;
                t.result = result;
            }
            NodeKind::Disjunct => {
                let children = key.node.borrow().refs.clone();
                if children.is_empty() {
                    thunk.borrow_mut().done = true;
                } else {
                    thunk.borrow_mut().ttype = ThunkType::Disjunct;
                    for child in &children {
                        let k = Key::primary(key.len, child);
                        self.dep_thunk(&k, Some(thunk));
                    }
                }
            }
            NodeKind::Concat => self.expand_concat(thunk, &key),
            NodeKind::Dedup => {
                let child = key.node.borrow().refs[0].clone();
                thunk.borrow_mut().ttype = ThunkType::Dedup;
                let k = Key::primary(key.len, &child);
                self.dep_thunk(&k, Some(thunk));
            }
            NodeKind::LenLimit { min, max } => {
                if (min..=max).contains(&key.len) {
                    let child = key.node.borrow().refs[0].clone();
                    thunk.borrow_mut().ttype = ThunkType::Copy;
                    let k = Key::primary(key.len, &child);
                    self.dep_thunk(&k, Some(thunk));
                } else {
                    thunk.borrow_mut().done = true;
                }
            }
        }
        Ok(())
    }

    /// Unfold a concatenation subrange: bisect the children and make one
    /// composition thunk per split of the length budget. Splits with a
    /// side already known to be empty are skipped outright.
    fn expand_concat(&mut self, thunk: &ThunkRef, key: &Key) {
        let children = key.node.borrow().refs.clone();
        let (lo, hi) = (key.offset, key.cutoff);
        debug_assert!(hi as usize <= children.len() && hi - lo >= 1);

        if hi - lo == 1 {
            thunk.borrow_mut().ttype = ThunkType::Copy;
            let k = Key::primary(key.len, &children[lo as usize]);
            self.dep_thunk(&k, Some(thunk));
            return;
        }

        thunk.borrow_mut().ttype = ThunkType::Disjunct;
        let mid = (lo + hi) / 2;
        for s in 0..=key.len {
            let left = self.half_key(s, key, &children, lo, mid);
            let right = self.half_key(key.len - s, key, &children, mid, hi);
            if self.known_empty(&left) || self.known_empty(&right) {
                continue;
            }
            let sub = self.thunks.insert(Thunk::composition());
            thunk.borrow_mut().deps.push(sub.clone());
            sub.borrow_mut().forward.push(thunk.clone());
            // Shorter side first: if it comes up empty the split dies
            // before the longer side is explored.
            if left.len <= right.len {
                self.dep_thunk(&left, Some(&sub));
                self.dep_thunk(&right, Some(&sub));
            } else {
                self.dep_thunk(&right, Some(&sub));
                self.dep_thunk(&left, Some(&sub));
                sub.borrow_mut().deps.swap(0, 1);
            }
            self.add_todo(&sub, true);
        }
        if thunk.borrow().deps.is_empty() {
            thunk.borrow_mut().done = true;
        }
    }

    fn half_key(&self, len: u32, key: &Key, children: &[NodeRef], lo: u32, hi: u32) -> Key {
        if hi - lo == 1 {
            Key::primary(len, &children[lo as usize])
        } else {
            Key::range(len, &key.node, lo, hi)
        }
    }

    fn known_empty(&self, key: &Key) -> bool {
        self.thunkmap.get(key).is_some_and(|t| {
            let t = t.borrow();
            t.done && t.result.is_none()
        })
    }

    /// Combine finished dependencies according to the thunk type.
    fn finalize(&mut self, thunk: &ThunkRef) -> Result<(), ExpandError> {
        let ttype = thunk.borrow().ttype;
        match ttype {
            ThunkType::Disjunct => {
                let deps = thunk.borrow().deps.clone();
                let mut results = Vec::new();
                for d in &deps {
                    let db = d.borrow();
                    if !db.done {
                        return Ok(()); // wait
                    }
                    if let Some(r) = &db.result {
                        results.push(r.clone());
                    }
                }
                let result = if results.is_empty() {
                    None
                } else {
                    Some(self.make_disjunct(results))
                };
                let mut t = thunk.borrow_mut();
                t.done = true;
                t.result = result;
            }
            ThunkType::Concat => {
                let deps = thunk.borrow().deps.clone();
                let mut waiting = false;
                let mut absent = false;
                let mut parts = Vec::new();
                for d in &deps {
                    let db = d.borrow();
                    if !db.done {
                        waiting = true;
                    } else if let Some(r) = &db.result {
                        if r.len() != Some(0) {
                            parts.push(r.clone());
                        }
                    } else {
                        absent = true;
                        break;
                    }
                }
                if absent {
                    let mut t = thunk.borrow_mut();
                    t.done = true;
                    t.result = None;
                } else if !waiting {
                    // All parts of length zero means the whole split is ε.
                    let result = if parts.is_empty() {
                        self.epsilon_dict()
                    } else {
                        self.make_concat(parts)
                    };
                    let mut t = thunk.borrow_mut();
                    t.done = true;
                    t.result = Some(result);
                }
            }
            ThunkType::Dedup => {
                let dep = thunk.borrow().deps[0].clone();
                if !dep.borrow().done {
                    return Ok(());
                }
                let inner = dep.borrow().result.clone();
                let result = match inner {
                    None => None,
                    Some(inner) => {
                        let count = inner.count();
                        if count > BigUint::from(DEDUP_LIMIT) {
                            return Err(ExpandError::DedupTooLarge(count));
                        }
                        let set: BTreeSet<Vec<u8>> =
                            inline_language(&inner).into_iter().collect();
                        let dict = self.make_dict(set);
                        if dict.count() == count {
                            // No duplicates existed: the expanded form can
                            // stand in for the original everywhere.
                            dep.borrow_mut().result = Some(dict.clone());
                        }
                        Some(dict)
                    }
                };
                let mut t = thunk.borrow_mut();
                t.done = true;
                t.result = result;
            }
            ThunkType::Copy => {
                let dep = thunk.borrow().deps[0].clone();
                if !dep.borrow().done {
                    return Ok(());
                }
                let result = dep.borrow().result.clone();
                let mut t = thunk.borrow_mut();
                t.done = true;
                t.result = result;
            }
        }
        Ok(())
    }

    // ────────────────────────────────────────────────────────────────────
    // Hash-consed node construction
    // ────────────────────────────────────────────────────────────────────

    /// The canonical `{ε}` dictionary.
    fn epsilon_dict(&mut self) -> ExpRef {
        let mut set = BTreeSet::new();
        set.insert(Vec::new());
        self.make_dict(set)
    }

    fn make_dict(&mut self, entries: BTreeSet<Vec<u8>>) -> ExpRef {
        debug_assert!(!entries.is_empty());
        let width = entries.iter().next().map(|e| e.len()).unwrap_or(0) as u32;
        let mut blob = Vec::new();
        for e in &entries {
            blob.extend_from_slice(e);
        }
        if let Some(existing) = self.dict_cons.get(&(width, blob.clone())) {
            return existing.clone();
        }
        let node = self.expgraph.new_dict(entries);
        self.dict_cons.insert((width, blob), node.clone());
        node
    }

    fn make_concat(&mut self, mut refs: Vec<ExpRef>) -> ExpRef {
        if refs.len() == 1 {
            return refs.pop().expect("len checked");
        }
        let key = (
            ExpKind::Concat,
            refs.iter().map(|r| r.seq()).collect::<Vec<u32>>(),
        );
        if let Some(existing) = self.node_cons.get(&key) {
            return existing.clone();
        }
        let node = self.expgraph.new_concat(refs);
        self.node_cons.insert(key, node.clone());
        node
    }

    fn make_disjunct(&mut self, mut refs: Vec<ExpRef>) -> ExpRef {
        if refs.len() == 1 {
            return refs.pop().expect("len checked");
        }
        refs.sort_by_key(|r| r.seq());

        let mut count = BigUint::from(0u32);
        for r in &refs {
            count += r.count();
        }
        // Small fixed-length disjunctions become dictionaries on the
        // spot, unless a phrase is derivable twice: such a node may sit
        // under a dedup (which collapses it); if it instead survives into
        // the reachable graph, the optimizer rejects it as ambiguous.
        if count.bits() <= 6 && refs.iter().all(|r| r.len() == refs[0].len()) {
            let mut set = BTreeSet::new();
            let mut ambiguous = false;
            for r in &refs {
                for phrase in inline_language(r) {
                    if !set.insert(phrase) {
                        ambiguous = true;
                    }
                }
            }
            if !ambiguous {
                return self.make_dict(set);
            }
        }

        let key = (
            ExpKind::Disjunct,
            refs.iter().map(|r| r.seq()).collect::<Vec<u32>>(),
        );
        if let Some(existing) = self.node_cons.get(&key) {
            return existing.clone();
        }
        let node = self.expgraph.new_disjunct(refs);
        self.node_cons.insert(key, node.clone());
        node
    }
}

impl Drop for Expander<'_> {
    /// Thunk dependency edges run both ways (`deps` down, `forward` up),
    /// so unfinished thunks form reference cycles. Break every edge while
    /// holding the whole population alive, then let the handles go.
    fn drop(&mut self) {
        let all: Vec<ThunkRef> = self.thunks.iter_live().collect();
        for t in &all {
            let mut t = t.borrow_mut();
            t.deps.clear();
            t.forward.clear();
        }
    }
}
