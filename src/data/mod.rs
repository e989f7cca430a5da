//! Shared geometry arrays and attribute capabilities.

pub mod attribute;
pub mod tileset;
