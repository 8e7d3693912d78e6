//! Strongly-typed indices into a model's coordinate, body, marker and
//! muscle sets.
//!
//! Indices are dense and zero-based in the model's native ordering.
//! They are only meaningful for the model that produced them; all
//! replicas in a pool share one description, so an index resolved
//! against one replica is valid for every other.

use std::fmt;

/// Index of a generalized coordinate in the model's native ordering.
///
/// `CoordinateIndex(n)` is the n-th entry of the state's coordinate
/// vector and the n-th entry of every generalized-force vector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoordinateIndex(pub usize);

impl fmt::Display for CoordinateIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for CoordinateIndex {
    fn from(v: usize) -> Self {
        Self(v)
    }
}

/// Index of a rigid body in the model's body set (ground excluded).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyIndex(pub usize);

impl fmt::Display for BodyIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for BodyIndex {
    fn from(v: usize) -> Self {
        Self(v)
    }
}

/// Index of a marker in the model's marker set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerIndex(pub usize);

impl fmt::Display for MarkerIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of a muscle in the model's muscle set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MuscleIndex(pub usize);

impl fmt::Display for MuscleIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
