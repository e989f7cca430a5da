//! Algorithms over a loaded Multi-Tessellation: extraction and statistics.

pub mod extract;
pub mod stats;
