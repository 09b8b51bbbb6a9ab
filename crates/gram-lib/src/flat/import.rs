//! Reading a serialized model back into a [`FlatGraph`].
//!
//! The reader validates as it goes: back-references must land on earlier
//! nodes, dictionary entries must arrive strictly sorted, concatenation
//! children must have fixed lengths and stay inside their parent's span.
//! Counts and lengths are recomputed from the children, so a structurally
//! valid stream always yields a coherent model.

use gram_core::varint::{read_uint, VarintError};
use gram_core::StringPool;
use num_bigint::BigUint;
use num_traits::{One, Zero};

use super::{FlatGraph, FlatKind, FlatNode, ImportError};

/// Longest admissible dictionary entry; matches the longest phrase the
/// compiler will target.
const MAX_DICT_WIDTH: u64 = 65_536;

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn read_uint(&mut self) -> Result<u64, ImportError> {
        let (value, used) = read_uint(&self.bytes[self.pos..]).map_err(|e| match e {
            VarintError::Truncated => ImportError::UnexpectedEof,
            VarintError::Overflow => ImportError::Overflow,
        })?;
        self.pos += used;
        Ok(value)
    }

    fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], ImportError> {
        if self.bytes.len() - self.pos < n {
            return Err(ImportError::UnexpectedEof);
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }
}

/// Deserialize a model. The root is the last node of the stream.
pub fn import(bytes: &[u8]) -> Result<FlatGraph, ImportError> {
    let mut reader = Reader { bytes, pos: 0 };
    let mut graph = FlatGraph::default();

    loop {
        let tag = reader.read_uint()?;
        if tag == 0 {
            break;
        }
        let node = match tag & 3 {
            0 => read_dict(&mut reader, &mut graph, tag >> 2)?,
            1 => read_concat(&mut reader, &graph, (tag >> 2) + 2)?,
            2 => read_disjunct(&mut reader, &graph, (tag >> 2) + 2)?,
            _ => return Err(ImportError::BadTag(tag)),
        };
        graph.nodes.push(node);
    }

    if !reader.at_end() {
        return Err(ImportError::TrailingData);
    }
    if graph.nodes.is_empty() {
        return Err(ImportError::EmptyModel);
    }
    Ok(graph)
}

fn read_dict(
    reader: &mut Reader,
    graph: &mut FlatGraph,
    count: u64,
) -> Result<FlatNode, ImportError> {
    let width = reader.read_uint()?;
    if width > MAX_DICT_WIDTH {
        return Err(ImportError::OversizedDict(width));
    }
    let width = width as usize;
    // Each entry after the first consumes at least one input byte, so a
    // count beyond the remaining input cannot be satisfied.
    let remaining = (reader.bytes.len() - reader.pos) as u64;
    if count > remaining + 1 {
        return Err(ImportError::UnexpectedEof);
    }
    let mut pool = StringPool::new();
    let mut prev: Vec<u8> = Vec::new();
    for i in 0..count {
        let entry = if i == 0 {
            reader.read_bytes(width)?.to_vec()
        } else {
            let shared = reader.read_uint()? as usize;
            if shared > width {
                return Err(ImportError::BadPrefix);
            }
            let mut entry = Vec::with_capacity(width);
            entry.extend_from_slice(&prev[..shared]);
            entry.extend_from_slice(reader.read_bytes(width - shared)?);
            entry
        };
        if i > 0 && entry <= prev {
            return Err(ImportError::UnsortedDict);
        }
        pool.append(&entry);
        prev = entry;
    }
    let dict = graph.dicts.len();
    graph.dicts.push(pool);
    Ok(FlatNode {
        kind: FlatKind::Dict,
        count: BigUint::from(count),
        len: Some(width as u32),
        dict,
        refs: Vec::new(),
    })
}

fn read_concat(reader: &mut Reader, graph: &FlatGraph, k: u64) -> Result<FlatNode, ImportError> {
    let mut refs = Vec::with_capacity(k as usize);
    let mut count = BigUint::one();
    let mut len = 0u64;
    for _ in 0..k {
        let pos = reader.read_uint()? as usize;
        let index = back_reference(reader, graph)?;
        let child = &graph.nodes[index];
        let child_len = child.len.ok_or(ImportError::MixedLengthChild)?;
        count *= &child.count;
        len += u64::from(child_len);
        refs.push((pos, index));
    }
    if len > u64::from(u32::MAX) {
        return Err(ImportError::BadChildSpan);
    }
    // Every child must write inside the parent's span.
    for &(pos, index) in &refs {
        let child_len = graph.nodes[index].len.unwrap_or(0) as u64;
        if pos as u64 + child_len > len {
            return Err(ImportError::BadChildSpan);
        }
    }
    Ok(FlatNode {
        kind: FlatKind::Concat,
        count,
        len: Some(len as u32),
        dict: 0,
        refs,
    })
}

fn read_disjunct(reader: &mut Reader, graph: &FlatGraph, k: u64) -> Result<FlatNode, ImportError> {
    let mut refs = Vec::with_capacity(k as usize);
    let mut count = BigUint::zero();
    let mut len: Option<u32> = None;
    for i in 0..k {
        let index = back_reference(reader, graph)?;
        let child = &graph.nodes[index];
        count += &child.count;
        if i == 0 {
            len = child.len;
        } else if len != child.len {
            len = None;
        }
        refs.push((0, index));
    }
    Ok(FlatNode {
        kind: FlatKind::Disjunct,
        count,
        len,
        dict: 0,
        refs,
    })
}

fn back_reference(reader: &mut Reader, graph: &FlatGraph) -> Result<usize, ImportError> {
    let back = reader.read_uint()? as usize;
    let here = graph.nodes.len();
    if back >= here {
        return Err(ImportError::BadBackref);
    }
    Ok(here - 1 - back)
}
