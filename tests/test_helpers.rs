//! Test helper functions for building trees and comparing evaluations

#![allow(dead_code)]

use rakefold::{ContractionConfig, Contractor, EvalError, ExprTree, OpKind, TreeBuilder};

/// Build `Multiply(Add(3, 5), 2)`.
pub fn demo_tree() -> ExprTree {
    let mut b = TreeBuilder::new();
    let three = b.leaf(3.0);
    let five = b.leaf(5.0);
    let sum = b.op(OpKind::Add, three, five).unwrap();
    let two = b.leaf(2.0);
    let root = b.op(OpKind::Multiply, sum, two).unwrap();
    b.build(root).unwrap()
}

/// Build `Subtract(Subtract(10, 3), 2)`.
pub fn subtract_chain() -> ExprTree {
    let mut b = TreeBuilder::new();
    let ten = b.leaf(10.0);
    let three = b.leaf(3.0);
    let inner = b.op(OpKind::Subtract, ten, three).unwrap();
    let two = b.leaf(2.0);
    let root = b.op(OpKind::Subtract, inner, two).unwrap();
    b.build(root).unwrap()
}

/// Build `Divide(10, 0)`.
pub fn divide_by_zero_tree() -> ExprTree {
    let mut b = TreeBuilder::new();
    let ten = b.leaf(10.0);
    let zero = b.leaf(0.0);
    let root = b.op(OpKind::Divide, ten, zero).unwrap();
    b.build(root).unwrap()
}

/// Contract `tree` with the given worker count.
pub fn contract_with(tree: ExprTree, workers: usize) -> Result<f64, EvalError> {
    Contractor::new(ContractionConfig::with_workers(workers)).run(tree)
}

/// Assert two evaluation results agree within floating-point tolerance.
pub fn assert_close(actual: f64, expected: f64) {
    let tolerance = 1e-9 * expected.abs().max(1.0);
    assert!(
        (actual - expected).abs() <= tolerance,
        "values diverged: {actual} vs {expected}"
    );
}
