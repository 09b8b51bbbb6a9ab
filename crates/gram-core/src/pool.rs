//! Weak registry for reference-counted graph nodes.
//!
//! Nodes live in `Rc<RefCell<T>>` cells owned by whoever holds handles to
//! them; the pool itself only keeps weak registrations, in creation order.
//! That split gives three properties the graph layers rely on:
//!
//! - A node is destroyed exactly when its last handle drops; the registry
//!   never keeps anything alive.
//! - `Rc::strong_count == 1` is a faithful "uniquely owned" test, because
//!   the registry does not contribute to the count.
//! - Iteration yields nodes in creation order (the topological order the
//!   exporter depends on), skipping entries that have died.
//!
//! Node types whose values contain handles into the same pool must drain
//! their children iteratively on drop (take the child handles into a
//! pending vector and unwrap them one at a time) so that deep chains tear
//! down without recursion. See `GraphNode` and `ExpNode` in `gram-lib` for
//! the pattern.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Creation-ordered weak registry of `Rc<RefCell<T>>` nodes.
#[derive(Debug)]
pub struct Pool<T> {
    items: Vec<Weak<RefCell<T>>>,
}

impl<T> Pool<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Allocate a node and register it.
    pub fn insert(&mut self, value: T) -> Rc<RefCell<T>> {
        let rc = Rc::new(RefCell::new(value));
        self.items.push(Rc::downgrade(&rc));
        rc
    }

    /// Registration slots allocated so far, dead entries included.
    pub fn allocated(&self) -> usize {
        self.items.len()
    }

    /// Drop registrations whose node has died.
    pub fn compact(&mut self) {
        self.items.retain(|w| w.strong_count() > 0);
    }

    /// Number of live nodes. Compacts.
    pub fn live(&mut self) -> usize {
        self.compact();
        self.items.len()
    }

    /// Budget check: are at most `limit` nodes alive?
    ///
    /// Cheap while the allocated length stays under the limit; compacts
    /// (and re-checks) only once the raw length crosses it.
    pub fn live_at_most(&mut self, limit: usize) -> bool {
        if self.items.len() <= limit {
            return true;
        }
        self.compact();
        self.items.len() <= limit
    }

    /// Snapshot of the registry in creation order.
    ///
    /// Sweeps that mutate nodes upgrade one entry at a time from this
    /// snapshot, so the iteration itself never inflates a node's strong
    /// count while its siblings are inspected for uniqueness.
    pub fn snapshot(&self) -> Vec<Weak<RefCell<T>>> {
        self.items.clone()
    }

    /// Iterate live nodes in creation order, upgrading as it goes.
    pub fn iter_live(&self) -> impl Iterator<Item = Rc<RefCell<T>>> + '_ {
        self.items.iter().filter_map(|w| w.upgrade())
    }
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}
