//! Grammar DAG.
//!
//! The parser builds one [`Graph`] per grammar: a pool of
//! reference-counted nodes describing languages of byte strings.
//! Recursive symbols are expressed with [`NodeKind::Undef`] placeholders
//! that are filled in by [`Graph::define`] once their right-hand side is
//! known, so a symbol can refer to itself (directly or through other
//! symbols) with ordinary child handles.
//!
//! Constructors normalize as they build (see [`optimize`]); after parsing,
//! [`optimize::optimize`] runs the rewrite rules to a fixed point.

mod optimize;

#[cfg(test)]
mod optimize_tests;

pub use optimize::{optimize, optimize_node, optimize_ref};

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use gram_core::Pool;

/// What a node denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Forward reference, not yet defined.
    Undef,
    /// The empty language ∅.
    None,
    /// The language {ε}.
    Empty,
    /// A finite set of literal strings.
    Dict,
    /// Concatenation of the child languages, in order.
    Concat,
    /// Union of the child languages.
    Disjunct,
    /// The child language as a set (duplicate expansions collapsed).
    Dedup,
    /// The child language restricted to lengths in `[min, max]`.
    LenLimit { min: u32, max: u32 },
}

/// A grammar node. `dict` is meaningful for `Dict`, `refs` for the
/// composite kinds.
#[derive(Debug)]
pub struct GraphNode {
    pub kind: NodeKind,
    pub dict: Vec<Vec<u8>>,
    pub refs: Vec<NodeRef>,
}

impl GraphNode {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            dict: Vec::new(),
            refs: Vec::new(),
        }
    }
}

impl Drop for GraphNode {
    /// Iterative teardown: child handles are drained onto a pending list
    /// and unwrapped one at a time, so dropping the last handle of a long
    /// chain (`x*` builds one per recursion step) cannot overflow the
    /// stack, and cascaded drops never re-enter this node.
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.refs);
        while let Some(child) = pending.pop() {
            if let Ok(cell) = Rc::try_unwrap(child.0) {
                let mut node = cell.into_inner();
                pending.append(&mut node.refs);
                // `node` drops here with an empty child list.
            }
        }
    }
}

/// Handle to a pool-resident grammar node. Cloning is cheap; the node
/// lives until its last handle drops. Identity is pointer identity.
#[derive(Debug, Clone)]
pub struct NodeRef(Rc<RefCell<GraphNode>>);

impl NodeRef {
    pub fn kind(&self) -> NodeKind {
        self.0.borrow().kind
    }

    pub fn borrow(&self) -> Ref<'_, GraphNode> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, GraphNode> {
        self.0.borrow_mut()
    }

    /// True when this handle is the node's only owner, i.e. the node is
    /// not shared with any other parent or external holder. Rewrites that
    /// would change a node's meaning for other owners are gated on this.
    pub fn unique(&self) -> bool {
        Rc::strong_count(&self.0) == 1
    }

    pub fn ptr_eq(&self, other: &NodeRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn ptr_id(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for NodeRef {}

impl std::hash::Hash for NodeRef {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.ptr_id().hash(state);
    }
}

/// A grammar: a registry of nodes plus constructors.
///
/// Constructors run the local rewrite rules on what they build, so obvious
/// redundancy (singleton chains, ∅ absorption, adjacent literal merging)
/// never accumulates during parsing.
#[derive(Debug)]
pub struct Graph {
    nodes: RefCell<Pool<GraphNode>>,
}

impl Graph {
    pub fn new() -> Self {
        Self {
            nodes: RefCell::new(Pool::new()),
        }
    }

    fn insert(&self, node: GraphNode) -> NodeRef {
        NodeRef(self.nodes.borrow_mut().insert(node))
    }

    pub(crate) fn snapshot(&self) -> Vec<std::rc::Weak<RefCell<GraphNode>>> {
        self.nodes.borrow().snapshot()
    }

    pub(crate) fn wrap(rc: Rc<RefCell<GraphNode>>) -> NodeRef {
        NodeRef(rc)
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.borrow_mut().live()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ────────────────────────────────────────────────────────────────────
    // Constructors
    // ────────────────────────────────────────────────────────────────────

    pub fn new_none(&self) -> NodeRef {
        self.insert(GraphNode::new(NodeKind::None))
    }

    pub fn new_empty(&self) -> NodeRef {
        self.insert(GraphNode::new(NodeKind::Empty))
    }

    pub fn new_undefined(&self) -> NodeRef {
        self.insert(GraphNode::new(NodeKind::Undef))
    }

    /// Single-literal dictionary.
    pub fn new_string(&self, s: impl Into<Vec<u8>>) -> NodeRef {
        self.new_dict(vec![s.into()])
    }

    /// Multi-literal dictionary. Entries may repeat; expansion treats the
    /// dictionary as a set.
    pub fn new_dict(&self, dict: Vec<Vec<u8>>) -> NodeRef {
        let mut node = GraphNode::new(NodeKind::Dict);
        node.dict = dict;
        let r = self.insert(node);
        optimize_node(self, &r);
        r
    }

    pub fn new_concat(&self, mut refs: Vec<NodeRef>) -> NodeRef {
        if refs.len() == 1 {
            return refs.pop().expect("len checked");
        }
        if refs.is_empty() {
            return self.new_empty();
        }
        let mut node = GraphNode::new(NodeKind::Concat);
        node.refs = refs;
        let r = self.insert(node);
        optimize_node(self, &r);
        r
    }

    pub fn new_concat_pair(&self, a: NodeRef, b: NodeRef) -> NodeRef {
        self.new_concat(vec![a, b])
    }

    pub fn new_disjunct(&self, mut refs: Vec<NodeRef>) -> NodeRef {
        if refs.len() == 1 {
            return refs.pop().expect("len checked");
        }
        if refs.is_empty() {
            return self.new_none();
        }
        let mut node = GraphNode::new(NodeKind::Disjunct);
        node.refs = refs;
        let r = self.insert(node);
        optimize_node(self, &r);
        r
    }

    pub fn new_disjunct_pair(&self, a: NodeRef, b: NodeRef) -> NodeRef {
        self.new_disjunct(vec![a, b])
    }

    /// Set semantics over `child`. Dictionaries and nested dedups already
    /// expand to sets, so they pass through unchanged.
    pub fn new_dedup(&self, child: NodeRef) -> NodeRef {
        match child.kind() {
            NodeKind::Dedup | NodeKind::Dict => child,
            _ => {
                let mut node = GraphNode::new(NodeKind::Dedup);
                node.refs = vec![child];
                self.insert(node)
            }
        }
    }

    /// Restrict `child` to phrase lengths in `[min, max]`.
    pub fn new_len_limit(&self, min: u32, max: u32, child: NodeRef) -> NodeRef {
        let mut node = GraphNode::new(NodeKind::LenLimit { min, max });
        node.refs = vec![child];
        self.insert(node)
    }

    // ────────────────────────────────────────────────────────────────────
    // Definitions
    // ────────────────────────────────────────────────────────────────────

    /// Attach a definition to an `Undef` placeholder.
    ///
    /// A uniquely-owned definition is absorbed in place; a shared one is
    /// wrapped so the placeholder aliases it.
    pub fn define(&self, undef: &NodeRef, definition: NodeRef) {
        debug_assert_eq!(undef.kind(), NodeKind::Undef);
        if definition.unique() && !definition.ptr_eq(undef) {
            let payload = {
                let mut d = definition.borrow_mut();
                GraphNode {
                    kind: d.kind,
                    dict: std::mem::take(&mut d.dict),
                    refs: std::mem::take(&mut d.refs),
                }
            };
            *undef.borrow_mut() = payload;
        } else {
            let mut u = undef.borrow_mut();
            u.kind = NodeKind::Disjunct;
            u.dict.clear();
            u.refs = vec![definition];
        }
    }

    pub fn is_defined(&self, r: &NodeRef) -> bool {
        r.kind() != NodeKind::Undef
    }

    /// True when no live node is an `Undef` placeholder.
    pub fn fully_defined(&self) -> bool {
        self.nodes
            .borrow()
            .iter_live()
            .all(|rc| rc.borrow().kind != NodeKind::Undef)
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}
