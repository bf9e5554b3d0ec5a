//! Benchmark tree generators
//!
//! Deterministic (seeded) builders for the tree shapes the benchmarks and
//! tests exercise: perfect binary, random balanced, left/right chains,
//! caterpillars, fibonacci trees.
//!
//! Leaves are drawn from `[1.0, 10.0)` and the mixed-operator set is
//! {Add, Multiply, Divide}, so every subtree evaluates to a positive value
//! and no generated tree can divide by zero. Subtract is available through
//! [`OpMix::Fixed`].

use rand::{rngs::StdRng, Rng, SeedableRng};

use super::{ExprTree, NodeId, OpKind, TreeBuilder};
use crate::EvalError;

/// How operator kinds are chosen while generating a tree.
#[derive(Debug, Clone, Copy)]
pub enum OpMix {
    /// Every operator node uses the same kind.
    Fixed(OpKind),
    /// Each operator node draws uniformly from {Add, Multiply, Divide}.
    Mixed,
}

impl OpMix {
    fn pick(self, rng: &mut StdRng) -> OpKind {
        match self {
            OpMix::Fixed(kind) => kind,
            OpMix::Mixed => match rng.gen_range(0..3) {
                0 => OpKind::Add,
                1 => OpKind::Multiply,
                _ => OpKind::Divide,
            },
        }
    }
}

fn rand_leaf(builder: &mut TreeBuilder, rng: &mut StdRng) -> NodeId {
    builder.leaf(rng.gen_range(1.0..10.0))
}

/// Perfect binary tree of the given depth; depth 0 is a single leaf.
/// Node count: `2^(depth+1) − 1`.
pub fn perfect(depth: u32, mix: OpMix, seed: u64) -> Result<ExprTree, EvalError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut builder = TreeBuilder::new();
    let root = perfect_at(depth, mix, &mut builder, &mut rng)?;
    builder.build(root)
}

fn perfect_at(
    depth: u32,
    mix: OpMix,
    builder: &mut TreeBuilder,
    rng: &mut StdRng,
) -> Result<NodeId, EvalError> {
    if depth == 0 {
        return Ok(rand_leaf(builder, rng));
    }
    let left = perfect_at(depth - 1, mix, builder, rng)?;
    let right = perfect_at(depth - 1, mix, builder, rng)?;
    builder.op(mix.pick(rng), left, right)
}

/// Random tree of bounded depth: each internal node splits its remaining
/// depth budget uniformly between the two subtrees.
pub fn random_balanced(depth: u32, mix: OpMix, seed: u64) -> Result<ExprTree, EvalError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut builder = TreeBuilder::new();
    let root = random_balanced_at(depth, mix, &mut builder, &mut rng)?;
    builder.build(root)
}

fn random_balanced_at(
    depth: u32,
    mix: OpMix,
    builder: &mut TreeBuilder,
    rng: &mut StdRng,
) -> Result<NodeId, EvalError> {
    if depth == 0 {
        return Ok(rand_leaf(builder, rng));
    }
    let left_budget = rng.gen_range(0..depth);
    let right_budget = depth - 1 - left_budget;
    let left = random_balanced_at(left_budget, mix, builder, rng)?;
    let right = random_balanced_at(right_budget, mix, builder, rng)?;
    builder.op(mix.pick(rng), left, right)
}

/// Degenerate chain with the deep subtree always on the left.
/// `leaves` leaves, `leaves − 1` operators.
pub fn left_chain(leaves: usize, mix: OpMix, seed: u64) -> Result<ExprTree, EvalError> {
    chain(leaves, mix, seed, true)
}

/// Degenerate chain with the deep subtree always on the right.
pub fn right_chain(leaves: usize, mix: OpMix, seed: u64) -> Result<ExprTree, EvalError> {
    chain(leaves, mix, seed, false)
}

fn chain(leaves: usize, mix: OpMix, seed: u64, deep_left: bool) -> Result<ExprTree, EvalError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut builder = TreeBuilder::new();
    let mut acc = rand_leaf(&mut builder, &mut rng);
    for _ in 1..leaves.max(1) {
        let fresh = rand_leaf(&mut builder, &mut rng);
        let kind = mix.pick(&mut rng);
        acc = if deep_left {
            builder.op(kind, acc, fresh)?
        } else {
            builder.op(kind, fresh, acc)?
        };
    }
    builder.build(acc)
}

/// Zigzag chain: the deep subtree alternates sides along the spine.
/// `spine` operator nodes, `spine + 1` leaves.
pub fn caterpillar(spine: usize, mix: OpMix, seed: u64) -> Result<ExprTree, EvalError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut builder = TreeBuilder::new();
    let mut acc = rand_leaf(&mut builder, &mut rng);
    for step in 0..spine {
        let fresh = rand_leaf(&mut builder, &mut rng);
        let kind = mix.pick(&mut rng);
        acc = if step % 2 == 0 {
            builder.op(kind, acc, fresh)?
        } else {
            builder.op(kind, fresh, acc)?
        };
    }
    builder.build(acc)
}

/// Fibonacci tree: children have depths `depth − 1` and `depth − 2`.
/// Maximally unbalanced while still logarithmic in contraction rounds.
pub fn fibonacci(depth: u32, mix: OpMix, seed: u64) -> Result<ExprTree, EvalError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut builder = TreeBuilder::new();
    let root = fibonacci_at(depth, mix, &mut builder, &mut rng)?;
    builder.build(root)
}

fn fibonacci_at(
    depth: u32,
    mix: OpMix,
    builder: &mut TreeBuilder,
    rng: &mut StdRng,
) -> Result<NodeId, EvalError> {
    if depth < 2 {
        return Ok(rand_leaf(builder, rng));
    }
    let left = fibonacci_at(depth - 1, mix, builder, rng)?;
    let right = fibonacci_at(depth - 2, mix, builder, rng)?;
    builder.op(mix.pick(rng), left, right)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_node_count() {
        for depth in 0..6 {
            let tree = perfect(depth, OpMix::Fixed(OpKind::Add), 1).unwrap();
            assert_eq!(tree.len(), (1usize << (depth + 1)) - 1);
        }
    }

    #[test]
    fn test_chain_node_count() {
        for leaves in [1, 2, 32, 100] {
            let tree = left_chain(leaves, OpMix::Mixed, 2).unwrap();
            assert_eq!(tree.len(), 2 * leaves.max(1) - 1);
        }
    }

    #[test]
    fn test_caterpillar_node_count() {
        let tree = caterpillar(10, OpMix::Mixed, 3).unwrap();
        assert_eq!(tree.len(), 21);
    }

    #[test]
    fn test_same_seed_same_tree() {
        let a = random_balanced(6, OpMix::Mixed, 42).unwrap();
        let b = random_balanced(6, OpMix::Mixed, 42).unwrap();
        assert_eq!(a.len(), b.len());
        assert_eq!(a.compute().unwrap(), b.compute().unwrap());
    }

    #[test]
    fn test_mixed_trees_never_divide_by_zero() {
        for seed in 0..25 {
            let tree = random_balanced(8, OpMix::Mixed, seed).unwrap();
            let value = tree.compute().unwrap();
            assert!(value.is_finite());
            assert!(value > 0.0);
        }
    }
}
