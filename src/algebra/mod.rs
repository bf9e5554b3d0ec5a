//! Algebra of pending operators
//!
//! A chain of operators whose other operand is still unknown collapses into a
//! single linear-fractional transform. Composition is what makes compress
//! cheap: splicing a degree-one node out of the tree merges two transforms
//! instead of replaying a chain of operators.

mod transform;

pub use transform::LinearFractional;
