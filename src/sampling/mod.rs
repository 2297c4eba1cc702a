//! Sampling Module: Experimental Designs over Parameter Spaces
//!
//! Covers the first stage of the workflow:
//! - Declaring the tunable inputs of the simulation model
//! - Generating a reproducible design matrix with a chosen strategy
//!
//! ## Reproducibility
//!
//! Every generator is an explicitly seeded `StdRng` (or a generator owned
//! by the caller). There is no process-wide random state, so the same
//! (space, n, strategy, seed) always yields the same design, whichever
//! thread asks for it.

mod design;
mod parameter_space;
mod strategies;

pub use design::{generate, generate_with_rng, Design, Sample};
pub use parameter_space::{Parameter, ParameterKind, ParameterSpace};
pub(crate) use parameter_space::RESERVED_NAMES;
pub use strategies::{LhsCriterion, Strategy, SOBOL_MAX_DIMENSION};
