//! Read-only scalar attribute capability.
//!
//! Per-entity data sources (tile error bounds, interpolated fields) expose
//! only value-at-index plus their range. The graph core never consumes
//! attributes; extraction predicates and reporting tools do, and they stay
//! unaware of whether values are stored, computed from geometry, or derived
//! from the DAG.

use crate::error::MtError;

/// A read-only scalar value per entity index.
pub trait Attribute {
    /// Value at 1-based entity index `i`.
    fn value_at(&self, i: u64) -> Result<f64, MtError>;
    /// Smallest value in the source; `f64::INFINITY` when empty.
    fn min(&self) -> f64;
    /// Largest value in the source; `f64::NEG_INFINITY` when empty.
    fn max(&self) -> f64;
}

/// Attribute backed by a flat vector, slot 0 reserved.
#[derive(Debug, Clone)]
pub struct VecAttribute {
    values: Vec<f64>,
}

// Derived `Default` would produce an empty vector, losing the reserved
// slot 0 that `len` and the range queries rely on.
impl Default for VecAttribute {
    fn default() -> Self {
        Self { values: vec![0.0] }
    }
}

impl VecAttribute {
    /// Builds from per-entity values for indices `1..=values.len()`.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        let mut v = vec![0.0];
        v.extend(values);
        Self { values: v }
    }

    /// Number of entities covered.
    pub fn len(&self) -> u64 {
        (self.values.len() - 1) as u64
    }

    pub fn is_empty(&self) -> bool {
        self.values.len() <= 1
    }
}

impl Attribute for VecAttribute {
    fn value_at(&self, i: u64) -> Result<f64, MtError> {
        if i == 0 || i as usize >= self.values.len() {
            return Err(MtError::InvalidStructure(format!(
                "attribute index {i} out of range (have {})",
                self.len()
            )));
        }
        Ok(self.values[i as usize])
    }

    fn min(&self) -> f64 {
        self.values[1..]
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min)
    }

    fn max(&self) -> f64 {
        self.values[1..]
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_and_range() {
        let attr = VecAttribute::from_values([3.0, 1.0, 2.0]);
        assert_eq!(attr.len(), 3);
        assert_eq!(attr.value_at(1).unwrap(), 3.0);
        assert_eq!(attr.value_at(3).unwrap(), 2.0);
        assert_eq!(attr.min(), 1.0);
        assert_eq!(attr.max(), 3.0);
    }

    #[test]
    fn default_is_empty_but_usable() {
        let attr = VecAttribute::default();
        assert!(attr.is_empty());
        assert_eq!(attr.len(), 0);
        assert_eq!(attr.min(), f64::INFINITY);
        assert_eq!(attr.max(), f64::NEG_INFINITY);
        assert!(attr.value_at(1).is_err());
    }

    #[test]
    fn index_zero_and_overflow_rejected() {
        let attr = VecAttribute::from_values([1.0]);
        assert!(attr.value_at(0).is_err());
        assert!(attr.value_at(2).is_err());
    }
}
