//! `MtError`: unified error type for multitess public APIs.
//!
//! Every fallible operation in the library reports through this enum; no
//! public API panics on bad input. Allocation failures surface the
//! [`std::collections::TryReserveError`] from the backing arrays instead of
//! aborting, so a caller loading an oversized mesh gets a recoverable error.

use thiserror::Error;

/// Unified error type for multitess operations.
#[derive(Debug, Error)]
pub enum MtError {
    /// Attempted to construct an entity handle from the reserved value 0.
    #[error("entity index must be non-zero (0 is reserved as the null sentinel)")]
    ZeroIndex,
    /// A node index outside `1..=node_count`.
    #[error("invalid node index {0} (node count is {1})")]
    InvalidNode(u64, u64),
    /// An arc index outside `1..=arc_count`.
    #[error("invalid arc index {0} (arc count is {1})")]
    InvalidArc(u64, u64),
    /// A tile index outside `1..=tile_count`.
    #[error("invalid tile index {0} (tile count is {1})")]
    InvalidTile(u64, u64),
    /// A vertex index outside `1..=vertex_count`.
    #[error("invalid vertex index {0} (vertex count is {1})")]
    InvalidVertex(u64, u64),
    /// A coordinate or vertex list whose length does not match the mesh dimensions.
    #[error("arity mismatch: expected {expected} values, got {got}")]
    ArityMismatch { expected: usize, got: usize },
    /// Backing storage could not be obtained; the affected count is reset to zero.
    #[error("allocation failure: {0}")]
    Allocation(#[from] std::collections::TryReserveError),
    /// Unexpected token, wrong arity, or missing keyword while reading.
    #[error("malformed input: {0}")]
    Parse(String),
    /// A structural invariant of the DAG does not hold.
    #[error("invalid graph structure: {0}")]
    InvalidStructure(String),
    /// Underlying I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl MtError {
    /// Shorthand for a [`MtError::Parse`] with a formatted message.
    pub(crate) fn parse(msg: impl Into<String>) -> Self {
        MtError::Parse(msg.into())
    }
}
