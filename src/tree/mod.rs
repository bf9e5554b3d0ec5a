//! Arena-backed expression trees
//!
//! The tree is a `Vec<Node>` addressed by stable indices; parent links are
//! back-references resolved through the arena, never pointers. Shape is fixed
//! before contraction starts: construction goes through [`TreeBuilder`], which
//! rejects malformed structure up front, and the only mutations afterwards are
//! the rake/compress splices the contraction itself performs.

mod node;
pub mod shapes;

pub use node::{Node, NodeId, NodeState, OpKind, Position};

use crate::EvalError;

/// A fully built expression tree, ready for baseline evaluation or
/// contraction.
#[derive(Debug)]
pub struct ExprTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl ExprTree {
    /// Arena index of the root.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Total node count (live and contracted alike).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree is empty. Never true for a built tree.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Borrow a node by id.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// Root value once contraction has finished; `None` while any part of the
    /// root's subtree is still live.
    pub fn root_value(&self) -> Option<f64> {
        let root = self.node(self.root);
        if root.live_children() != 0 {
            return None;
        }
        root.lock().value
    }

    /// Full non-contracted evaluation, used as the independent correctness
    /// oracle and sequential baseline.
    ///
    /// Pure: does not touch node state, so a baseline run can precede a
    /// contraction run on the same tree.
    pub fn compute(&self) -> Result<f64, EvalError> {
        self.compute_at(self.root)
    }

    fn compute_at(&self, id: NodeId) -> Result<f64, EvalError> {
        let node = self.node(id);
        let (left, right) = {
            let state = node.lock();
            match node.kind() {
                OpKind::Leaf => {
                    return state
                        .value
                        .ok_or_else(|| EvalError::Malformed(format!("leaf {id} has no value")))
                }
                _ => match state.children {
                    [Some(l), Some(r)] => (l, r),
                    _ => {
                        return Err(EvalError::Malformed(format!(
                            "operator node {id} is missing a child"
                        )))
                    }
                },
            }
        };

        let a = self.compute_at(left)?;
        let b = self.compute_at(right)?;
        match node.kind() {
            OpKind::Add => Ok(a + b),
            OpKind::Subtract => Ok(a - b),
            OpKind::Multiply => Ok(a * b),
            OpKind::Divide => {
                if b == 0.0 {
                    Err(EvalError::DivisionByZero)
                } else {
                    Ok(a / b)
                }
            }
            OpKind::Leaf => unreachable!("handled above"),
        }
    }
}

/// Incremental tree constructor.
///
/// Children are attached exactly once; using a node as a child of two parents
/// or finishing with nodes unreachable from the root is a construction-time
/// error, so contraction never sees malformed structure.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<Node>,
    attached: Vec<bool>,
}

impl TreeBuilder {
    /// Empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a constant leaf, returning its id.
    pub fn leaf(&mut self, value: f64) -> NodeId {
        self.nodes.push(Node::leaf(value));
        self.attached.push(false);
        self.nodes.len() - 1
    }

    /// Add an operator node over two previously created nodes.
    pub fn op(&mut self, kind: OpKind, left: NodeId, right: NodeId) -> Result<NodeId, EvalError> {
        if !kind.is_operator() {
            return Err(EvalError::Malformed("leaf used as operator".into()));
        }
        if left == right {
            return Err(EvalError::Malformed(format!(
                "node {left} used as both operands"
            )));
        }
        for child in [left, right] {
            if child >= self.nodes.len() {
                return Err(EvalError::Malformed(format!("unknown child id {child}")));
            }
            if self.attached[child] {
                return Err(EvalError::Malformed(format!(
                    "node {child} already has a parent"
                )));
            }
        }

        let id = self.nodes.len();
        self.nodes.push(Node::operator(kind, left, right));
        self.attached.push(false);
        for (child, position) in [(left, Position::Left), (right, Position::Right)] {
            let mut state = self.nodes[child].lock();
            state.parent = Some(id);
            state.position = position;
            self.attached[child] = true;
        }
        Ok(id)
    }

    /// Finish construction with `root` as the tree root.
    ///
    /// Validates that `root` is parentless and that every created node is
    /// reachable from it.
    pub fn build(self, root: NodeId) -> Result<ExprTree, EvalError> {
        if root >= self.nodes.len() {
            return Err(EvalError::Malformed(format!("unknown root id {root}")));
        }
        if self.attached[root] {
            return Err(EvalError::Malformed(format!("root {root} has a parent")));
        }

        let mut seen = vec![false; self.nodes.len()];
        let mut stack = vec![root];
        let mut reached = 0usize;
        while let Some(id) = stack.pop() {
            if seen[id] {
                return Err(EvalError::Malformed(format!("node {id} reached twice")));
            }
            seen[id] = true;
            reached += 1;
            let state = self.nodes[id].lock();
            for child in state.children.iter().flatten() {
                stack.push(*child);
            }
        }
        if reached != self.nodes.len() {
            return Err(EvalError::Malformed(format!(
                "{} of {} nodes unreachable from root",
                self.nodes.len() - reached,
                self.nodes.len()
            )));
        }

        Ok(ExprTree {
            nodes: self.nodes,
            root,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_tree() -> ExprTree {
        // (3 + 5) * 2
        let mut b = TreeBuilder::new();
        let three = b.leaf(3.0);
        let five = b.leaf(5.0);
        let sum = b.op(OpKind::Add, three, five).unwrap();
        let two = b.leaf(2.0);
        let root = b.op(OpKind::Multiply, sum, two).unwrap();
        b.build(root).unwrap()
    }

    #[test]
    fn test_baseline_compute() {
        assert_eq!(demo_tree().compute().unwrap(), 16.0);
    }

    #[test]
    fn test_baseline_compute_is_pure() {
        let tree = demo_tree();
        assert_eq!(tree.compute().unwrap(), 16.0);
        assert_eq!(tree.compute().unwrap(), 16.0);
        // Intermediate nodes still unresolved, value slots untouched.
        assert!(tree.root_value().is_none());
    }

    #[test]
    fn test_baseline_divide_by_zero() {
        let mut b = TreeBuilder::new();
        let ten = b.leaf(10.0);
        let zero = b.leaf(0.0);
        let root = b.op(OpKind::Divide, ten, zero).unwrap();
        let tree = b.build(root).unwrap();
        assert!(matches!(tree.compute(), Err(EvalError::DivisionByZero)));
    }

    #[test]
    fn test_builder_rejects_double_attachment() {
        let mut b = TreeBuilder::new();
        let shared = b.leaf(1.0);
        let other = b.leaf(2.0);
        b.op(OpKind::Add, shared, other).unwrap();
        let third = b.leaf(3.0);
        assert!(matches!(
            b.op(OpKind::Add, shared, third),
            Err(EvalError::Malformed(_))
        ));
    }

    #[test]
    fn test_builder_rejects_same_node_both_sides() {
        let mut b = TreeBuilder::new();
        let one = b.leaf(1.0);
        assert!(matches!(
            b.op(OpKind::Add, one, one),
            Err(EvalError::Malformed(_))
        ));
    }

    #[test]
    fn test_builder_rejects_unreachable_nodes() {
        let mut b = TreeBuilder::new();
        let one = b.leaf(1.0);
        let two = b.leaf(2.0);
        let root = b.op(OpKind::Add, one, two).unwrap();
        b.leaf(99.0); // orphan
        assert!(matches!(b.build(root), Err(EvalError::Malformed(_))));
    }

    #[test]
    fn test_single_leaf_tree() {
        let mut b = TreeBuilder::new();
        let root = b.leaf(7.5);
        let tree = b.build(root).unwrap();
        assert_eq!(tree.compute().unwrap(), 7.5);
        // A lone leaf is already contracted.
        assert_eq!(tree.root_value(), Some(7.5));
    }
}
