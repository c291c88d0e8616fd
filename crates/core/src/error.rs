//! Error types.
//!
//! Structural problems with the pairing table are fatal and returned as
//! [`StructureError`]. Problems with styling parameters are recovered from and
//! reported as [`LayoutAnomaly`] values alongside the layout.

use serde::Serialize;
use thiserror::Error;

/// The partners table cannot be decomposed into nested stems and loops.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructureError {
    #[error("position {position} claims partner {partner}, which does not pair back")]
    AsymmetricPartners { position: usize, partner: usize },

    #[error("position {position} is paired with itself")]
    SelfPaired { position: usize },

    #[error("pair {upstream}-{downstream} crosses pair {other_upstream}-{other_downstream}")]
    CrossingPairs {
        upstream: usize,
        downstream: usize,
        other_upstream: usize,
        other_downstream: usize,
    },
}

/// A recovered parameter problem.
#[derive(Error, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutAnomaly {
    /// A per-base entry names a position outside the sequence; it was ignored.
    #[error("per-base layout props at position {position} are out of range")]
    OutOfRangeOverride { position: usize },

    /// A loop's radius equation had no solution; the minimum radius was used.
    #[error("loop {loop_index} has degenerate geometry, clamped to radius {radius}")]
    DegenerateGeometry { loop_index: usize, radius: f64 },

    /// A stem inside a round loop asked to be flipped; it was drawn unflipped.
    #[error("stem at position {position5} lies inside a round loop and cannot be flipped")]
    IgnoredFlip { position5: usize },

    /// A parameter was not finite or out of its domain; the default was used.
    #[error("invalid layout parameter {name}, using default")]
    InvalidParameter { name: &'static str },
}
