#![deny(missing_docs)]
//! hopdist api contains the types shared between the relaxation workers
//! and the result aggregator: the error type, hop-count distances, the
//! input graph, and the result message wire format.
//!
//! If you want to run a relaxation, please see the hopdist_core crate.

mod error;
pub use error::*;

mod distance;
pub use distance::*;

mod graph;
pub use graph::*;

mod wire;
pub use wire::*;
