//! # Parallel expression evaluation via tree contraction
//!
//! This library evaluates arithmetic expression trees (add, subtract,
//! multiply, divide over `f64`) by rake-and-compress tree contraction:
//!
//! 1. **Rake**: fold a childless node's value into its parent
//! 2. **Compress**: splice out a degree-one internal node, composing its
//!    pending linear-fractional transform into its parent's
//! 3. **Rounds**: a worker pool applies contraction attempts to every live
//!    node concurrently, with an idle barrier between rounds, until only the
//!    root remains with a known value
//!
//! Rake and compress are confluent — the final value is independent of the
//! order and interleaving of valid applications — so rounds need no internal
//! ordering. Balanced trees contract in O(log n) rounds; degenerate chains
//! still terminate, compressing in from both ends.
//!
//! ## Usage Example
//!
//! ```
//! use rakefold::{ContractionConfig, Contractor, OpKind, TreeBuilder};
//!
//! let mut builder = TreeBuilder::new();
//! let three = builder.leaf(3.0);
//! let five = builder.leaf(5.0);
//! let sum = builder.op(OpKind::Add, three, five)?;
//! let two = builder.leaf(2.0);
//! let root = builder.op(OpKind::Multiply, sum, two)?;
//! let tree = builder.build(root)?;
//!
//! let contractor = Contractor::new(ContractionConfig::with_workers(4));
//! assert_eq!(contractor.run(tree)?, 16.0);
//! # Ok::<(), rakefold::EvalError>(())
//! ```

#![warn(missing_docs, missing_debug_implementations)]

pub mod algebra; // Linear-fractional transforms for pending operators
pub mod contract; // Per-node rake/compress protocol
pub mod pool; // Worker pool with idle barrier
pub mod tree; // Arena-backed expression trees and generators

// Re-exports for convenience
pub use algebra::LinearFractional;
pub use contract::contract;
pub use pool::WorkerPool;
pub use tree::{ExprTree, Node, NodeId, OpKind, Position, TreeBuilder};

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::debug;

/// Errors surfaced by evaluation or contraction.
///
/// Lost races during contraction are not errors; they are silently retried in
/// a later round. Either the root resolves to an exact value or one of these
/// is reported — never a partial result.
#[derive(Error, Debug, PartialEq)]
pub enum EvalError {
    /// Zero divisor in baseline evaluation, or a zero denominator when a
    /// pending transform is finally evaluated. Fatal to the whole run.
    #[error("division by zero during evaluation")]
    DivisionByZero,

    /// Structurally invalid tree, rejected at construction time.
    #[error("malformed expression tree: {0}")]
    Malformed(String),
}

/// Configuration for a contraction run.
#[derive(Debug, Clone)]
pub struct ContractionConfig {
    /// Number of worker threads (at least one; one gives the sequential
    /// baseline).
    pub workers: usize,
}

impl ContractionConfig {
    /// Config with an explicit worker count.
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }
}

impl Default for ContractionConfig {
    fn default() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self { workers }
    }
}

/// Contraction orchestrator
///
/// Owns a run's configuration and drives rounds of contraction attempts over
/// a worker pool until the root resolves. Each orchestrator is independent;
/// several may contract different trees concurrently.
#[derive(Debug)]
pub struct Contractor {
    config: ContractionConfig,
}

impl Contractor {
    /// Create an orchestrator for the given configuration.
    pub fn new(config: ContractionConfig) -> Self {
        Self { config }
    }

    /// Contract `tree` down to its root value.
    ///
    /// Consumes the tree: after the root resolves the structure is spent.
    /// A domain error discovered by any worker aborts the run at the next
    /// round barrier.
    pub fn run(&self, tree: ExprTree) -> Result<f64, EvalError> {
        let tree = Arc::new(tree);
        let pool = WorkerPool::new(self.config.workers);
        // Bound dispatch to the worker count: one chunk per worker per round.
        let stride = tree.len() / pool.workers() + 1;
        let failure: Arc<Mutex<Option<EvalError>>> = Arc::new(Mutex::new(None));
        let mut round = 0usize;

        loop {
            if let Some(value) = tree.root_value() {
                debug!(rounds = round, value, "contraction finished");
                return Ok(value);
            }

            round += 1;
            let mut start = 0;
            while start < tree.len() {
                let end = (start + stride).min(tree.len());
                let tree = Arc::clone(&tree);
                let failure = Arc::clone(&failure);
                pool.submit(move || run_chunk(&tree, start..end, &failure));
                start = end;
            }
            // The round barrier is the only cross-round synchronization.
            pool.wait_idle();

            if let Some(err) = failure.lock().take() {
                return Err(err);
            }
            debug!(round, "contraction round complete");
        }
    }
}

/// One scheduled task: contraction attempts over a contiguous id range.
fn run_chunk(tree: &ExprTree, ids: std::ops::Range<NodeId>, failure: &Mutex<Option<EvalError>>) {
    if failure.lock().is_some() {
        return;
    }
    for id in ids {
        if tree.node(id).is_resolved() {
            continue;
        }
        if let Err(err) = contract(tree, id) {
            let mut slot = failure.lock();
            if slot.is_none() {
                *slot = Some(err);
            }
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_has_workers() {
        assert!(ContractionConfig::default().workers >= 1);
    }

    #[test]
    fn test_with_workers_clamps_to_one() {
        assert_eq!(ContractionConfig::with_workers(0).workers, 1);
    }

    #[test]
    fn test_run_matches_baseline() {
        let tree = tree::shapes::perfect(5, tree::shapes::OpMix::Mixed, 7).unwrap();
        let expected = tree.compute().unwrap();
        let value = Contractor::new(ContractionConfig::with_workers(2))
            .run(tree)
            .unwrap();
        assert!((value - expected).abs() <= 1e-9 * expected.abs().max(1.0));
    }

    #[test]
    fn test_run_single_leaf() {
        let mut builder = TreeBuilder::new();
        let root = builder.leaf(4.25);
        let tree = builder.build(root).unwrap();
        let value = Contractor::new(ContractionConfig::with_workers(1))
            .run(tree)
            .unwrap();
        assert_eq!(value, 4.25);
    }
}
