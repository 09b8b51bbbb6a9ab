//! The serialized model and its codec.
//!
//! [`export`] writes an expanded graph as a compact byte stream; [`import`]
//! reads one back into a [`FlatGraph`], the vector-backed form the runtime
//! operates on. [`codec`] implements the index ↔ phrase bijection over a
//! flat graph.
//!
//! The stream is a sequence of nodes in child-before-parent order, each a
//! varint tag followed by its payload, closed by a `0` tag. Counts and
//! lengths are not stored; the importer recomputes them, so the two sides
//! only have to agree on structure.

pub mod codec;
mod export;
mod import;


pub use codec::{encode, enumerate, generate, generate_random, parse, CodecError};
pub use export::export;
pub use import::import;

use gram_core::StringPool;
use num_bigint::BigUint;

/// Node kind in a flat graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlatKind {
    Dict,
    Concat,
    Disjunct,
}

/// A node reconstructed from the stream. `refs` holds `(position, index)`
/// pairs: the child's byte offset in this node's output and its index in
/// [`FlatGraph::nodes`].
#[derive(Debug, PartialEq, Eq)]
pub struct FlatNode {
    pub kind: FlatKind,
    pub count: BigUint,
    pub len: Option<u32>,
    pub dict: usize,
    pub refs: Vec<(usize, usize)>,
}

/// A deserialized model. The root is the last node.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FlatGraph {
    pub nodes: Vec<FlatNode>,
    pub dicts: Vec<StringPool>,
}

impl FlatGraph {
    /// The model root. Graphs produced by [`import`] always have one.
    pub fn root(&self) -> &FlatNode {
        self.nodes.last().expect("imported graph is never empty")
    }
}

/// Malformed model stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImportError {
    #[error("unexpected end of model data")]
    UnexpectedEof,
    #[error("varint overflows 64 bits")]
    Overflow,
    #[error("unrecognized node tag {0}")]
    BadTag(u64),
    #[error("back-reference past the start of the model")]
    BadBackref,
    #[error("model contains no nodes")]
    EmptyModel,
    #[error("trailing bytes after end-of-model marker")]
    TrailingData,
    #[error("dictionary entries out of order")]
    UnsortedDict,
    #[error("dictionary prefix length exceeds entry width")]
    BadPrefix,
    #[error("dictionary width {0} exceeds the maximum phrase length")]
    OversizedDict(u64),
    #[error("concatenation child without a fixed length")]
    MixedLengthChild,
    #[error("child span exceeds its parent's length")]
    BadChildSpan,
}
