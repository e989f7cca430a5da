//! DAG topology: entity handles, the refinement graph, and facet matching.

pub mod facet;
pub mod graph;
pub mod handle;
