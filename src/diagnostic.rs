//! Computation diagnostics
//!
//! Degenerate geometry (all points identical, constant columns, a flat
//! lens) is a meaningful result rather than a failure. Analyses return the
//! trivial structure together with one of these notes.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Every pairwise distance is zero; the diagram is trivial
    IdenticalPoints { points: usize },
    /// A standardized column had zero variance and was set to zero
    ConstantColumn { column: String },
    /// A lens coordinate took a single value; one interval was used for it
    FlatLens { lens_dimension: usize },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::IdenticalPoints { points } => {
                write!(f, "all {} points are identical; diagram is trivial", points)
            }
            Diagnostic::ConstantColumn { column } => {
                write!(f, "column '{}' has zero variance", column)
            }
            Diagnostic::FlatLens { lens_dimension } => {
                write!(f, "lens coordinate {} is constant", lens_dimension)
            }
        }
    }
}
