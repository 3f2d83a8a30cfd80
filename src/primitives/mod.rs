//! Core compute primitives.
//!
//! [`Matrix`] is the dense row-major container used for embeddings and
//! classifier inputs.

mod matrix;

pub use matrix::Matrix;
