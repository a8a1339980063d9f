//! Statistical analytics cores
//!
//! Every submodule is a pure, synchronous function of typed rows; the
//! query and cache round-trips live in [`crate::engine`]. This split keeps
//! each statistical core unit-testable without I/O.

pub mod alerts;
pub mod baseline;
pub mod multivariate;
pub mod oee;
pub mod pareto;
pub mod patterns;
pub mod trend;
