//! Strong, zero-cost handles for mesh entities.
//!
//! Every entity (vertex, tile, node, arc) is addressed by a 1-based index
//! into a parallel array; index 0 is reserved universally as the null
//! sentinel. Each handle wraps a `NonZeroU64` so that the null value is
//! unrepresentable in memory: navigation results that may be null are
//! `Option<Id>`, and `Option<Id>` has the same size as `u64`.
//!
//! On the wire the sentinel does appear (tile lists are 0-terminated);
//! [`from_wire`](NodeId::from_wire) maps raw integers back into options.

use crate::error::MtError;
use std::{fmt, num::NonZeroU64};

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        #[repr(transparent)]
        pub struct $name(NonZeroU64);

        impl $name {
            /// Creates a handle from a raw 1-based index.
            ///
            /// # Errors
            /// Returns [`MtError::ZeroIndex`] if `raw == 0`.
            #[inline]
            pub fn new(raw: u64) -> Result<Self, MtError> {
                NonZeroU64::new(raw).map($name).ok_or(MtError::ZeroIndex)
            }

            /// Maps a wire-format integer to a handle, treating 0 as null.
            #[inline]
            pub fn from_wire(raw: u64) -> Option<Self> {
                NonZeroU64::new(raw).map($name)
            }

            /// The raw 1-based index.
            #[inline]
            pub const fn get(self) -> u64 {
                self.0.get()
            }

            /// The index as a `usize`, for direct slot access.
            #[inline]
            pub const fn index(self) -> usize {
                self.0.get() as usize
            }

            /// The handle for the next slot.
            #[inline]
            pub fn succ(self) -> Self {
                match self.0.checked_add(1) {
                    Some(next) => $name(next),
                    None => unreachable!("entity index overflow"),
                }
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.get()).finish()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.get())
            }
        }
    };
}

/// Slot count `n + 1` of a parallel array holding `n` entities, rejecting
/// counts that cannot be addressed in memory.
pub(crate) fn slot_count(n: u64) -> Result<usize, MtError> {
    usize::try_from(n)
        .ok()
        .and_then(|v| v.checked_add(1))
        .ok_or_else(|| MtError::parse(format!("entity count {n} exceeds addressable memory")))
}

entity_id!(
    /// Handle of a vertex in a [`TileSet`](crate::data::tileset::TileSet).
    VertexId
);
entity_id!(
    /// Handle of a simplicial tile in a [`TileSet`](crate::data::tileset::TileSet).
    TileId
);
entity_id!(
    /// Handle of a DAG node in an [`MtGraph`](crate::topology::graph::MtGraph).
    NodeId
);
entity_id!(
    /// Handle of a DAG arc in an [`MtGraph`](crate::topology::graph::MtGraph).
    ArcId
);

#[cfg(test)]
mod layout_tests {
    use super::*;
    use static_assertions::assert_eq_size;

    // repr(transparent) over NonZeroU64: options are free.
    assert_eq_size!(NodeId, u64);
    assert_eq_size!(Option<ArcId>, u64);
    assert_eq_size!(Option<TileId>, u64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_rejected() {
        assert!(NodeId::new(0).is_err());
        assert!(ArcId::from_wire(0).is_none());
    }

    #[test]
    fn new_get_succ() {
        let t = TileId::new(41).unwrap();
        assert_eq!(t.get(), 41);
        assert_eq!(t.succ().get(), 42);
        assert_eq!(t.index(), 41usize);
    }

    #[test]
    fn debug_and_display() {
        let n = NodeId::new(7).unwrap();
        assert_eq!(format!("{n:?}"), "NodeId(7)");
        assert_eq!(format!("{n}"), "7");
    }

    #[test]
    fn ordering_and_hash() {
        use std::collections::HashSet;
        let a = VertexId::new(1).unwrap();
        let b = VertexId::new(2).unwrap();
        assert!(a < b);
        let set: HashSet<_> = [a, b, a].into_iter().collect();
        assert_eq!(set.len(), 2);
    }
}

#[cfg(test)]
mod serde_tests {
    use super::*;

    #[test]
    fn json_roundtrip() {
        let p = NodeId::new(123).unwrap();
        let s = serde_json::to_string(&p).unwrap();
        let p2: NodeId = serde_json::from_str(&s).unwrap();
        assert_eq!(p2, p);
    }

    #[test]
    fn bincode_roundtrip() {
        let p = TileId::new(456).unwrap();
        let bytes = bincode::serialize(&p).unwrap();
        let p2: TileId = bincode::deserialize(&bytes).unwrap();
        assert_eq!(p2, p);
    }
}
