//! Length-stratified expansion of a grammar graph.
//!
//! A grammar may recurse, so its language is in general infinite; what can
//! be enumerated is the slice of the language at one phrase length. The
//! [`Expander`] computes such slices on demand, producing an [`ExpGraph`]
//! in which every node carries the exact number of phrases it admits.
//! [`expand_for_bits`] stacks per-length slices until a requested entropy
//! target is met.
//!
//! Termination on recursive grammars comes from length stratification: a
//! concatenation is only expanded by splitting its length budget between
//! its two halves, so recursion is forced through strictly smaller
//! lengths and bottoms out at zero. A cycle that consumes no length never
//! produces a finished root; the scheduler detects this as an empty work
//! queue and reports infinite recursion.

mod expander;
mod expgraph;
mod range;

#[cfg(test)]
mod expgraph_tests;

pub use expander::Expander;
pub use expgraph::{inline_language, ExpGraph, ExpKind, ExpNode, ExpRef};
pub use range::{expand_for_bits, ExpandOptions, RangeExpansion};

use num_bigint::BigUint;

/// Most combinations a `dedup(...)` is willing to enumerate.
pub const DEDUP_LIMIT: u32 = 1_000_000;

/// Expansion failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpandError {
    /// The grammar recurses without consuming length.
    #[error("infinite recursion")]
    InfiniteRecursion,
    /// More live expanded nodes than the budget allows.
    #[error("maximum node count exceeded")]
    NodeBudgetExceeded,
    /// More live thunks than the budget allows.
    #[error("maximum thunk count exceeded")]
    ThunkBudgetExceeded,
    /// `dedup(...)` over a language too large to enumerate.
    #[error("deduplication of {0} combinations exceeds the limit of {DEDUP_LIMIT}")]
    DedupTooLarge(BigUint),
    /// The same phrase is reachable through two derivations.
    #[error("duplicate expansion for {0:?}")]
    DuplicatePhrase(String),
    /// The length range cannot cover the requested entropy.
    #[error("no solution with enough entropy in range")]
    NoSolution,
    /// An undefined placeholder survived into expansion.
    #[error("undefined symbol reached during expansion")]
    UndefinedNode,
}
