//! Expression tree nodes
//!
//! Nodes live in an arena (`ExprTree`) and refer to each other by stable
//! index. Each node carries its own lock around the mutable link/value state,
//! plus two atomic gate fields (`live_children`, `resolved`) that let workers
//! decide whether a contraction attempt is worth locking for. The atomics are
//! only ever written while the node's lock is held; an atomic read alone never
//! justifies a mutation.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use parking_lot::{Mutex, MutexGuard};

use crate::algebra::LinearFractional;

/// Stable arena index of a node.
pub type NodeId = usize;

/// Operator kind of a node.
///
/// A closed variant set: every rake rule and every baseline combine is an
/// exhaustive match over this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    /// Constant leaf; has no children and is born with a value.
    Leaf,
    /// Binary addition.
    Add,
    /// Binary subtraction (left minus right).
    Subtract,
    /// Binary multiplication.
    Multiply,
    /// Binary division (left over right).
    Divide,
}

impl OpKind {
    /// Whether this kind is an operator (has two children when built).
    pub fn is_operator(self) -> bool {
        !matches!(self, OpKind::Leaf)
    }

    /// The rake rule: the transform a parent of this kind stores when the
    /// child at `position` rakes in with known value `x` while the other
    /// operand is still unknown.
    ///
    /// Order matters for Subtract and Divide; the unknown operand is always
    /// the transform's argument `y`.
    pub fn rake_rule(self, position: Position, x: f64) -> LinearFractional {
        match (self, position) {
            // y ↦ y + x
            (OpKind::Add, _) => LinearFractional::new(1.0, x, 0.0, 1.0),
            // left operand known: y ↦ x − y
            (OpKind::Subtract, Position::Left) => LinearFractional::new(-1.0, x, 0.0, 1.0),
            // right operand known: y ↦ y − x
            (OpKind::Subtract, Position::Right) => LinearFractional::new(1.0, -x, 0.0, 1.0),
            // y ↦ x·y
            (OpKind::Multiply, _) => LinearFractional::new(x, 0.0, 0.0, 1.0),
            // dividend known: y ↦ x / y (zero divisor surfaces at eval time)
            (OpKind::Divide, Position::Left) => LinearFractional::new(0.0, x, 1.0, 0.0),
            // divisor known: y ↦ y / x
            (OpKind::Divide, Position::Right) => LinearFractional::new(1.0, 0.0, 0.0, x),
            (OpKind::Leaf, _) => unreachable!("leaves have no children to rake"),
        }
    }
}

/// Which child slot of its parent a node occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Left operand slot.
    Left,
    /// Right operand slot.
    Right,
}

impl Position {
    /// Slot index into `NodeState::children`.
    pub fn index(self) -> usize {
        match self {
            Position::Left => 0,
            Position::Right => 1,
        }
    }
}

/// The lock-protected, mutable part of a node.
#[derive(Debug)]
pub struct NodeState {
    /// Arena index of the parent; `None` for the root and for detached nodes.
    pub parent: Option<NodeId>,
    /// This node's slot under its parent. Meaningless while `parent` is
    /// `None`.
    pub position: Position,
    /// Child slots, `[left, right]`. A slot is cleared exactly once, by the
    /// rake or compress that removes the child.
    pub children: [Option<NodeId>; 2],
    /// Resolved scalar, present once the whole subtree has contracted.
    pub value: Option<f64>,
    /// Transform accumulated from the child already raked in; set exactly
    /// while an operator node has live degree 1.
    pub pending: Option<LinearFractional>,
}

impl NodeState {
    /// The sole live child, if degree is exactly one.
    pub fn sole_child(&self) -> Option<(NodeId, Position)> {
        match self.children {
            [Some(c), None] => Some((c, Position::Left)),
            [None, Some(c)] => Some((c, Position::Right)),
            _ => None,
        }
    }
}

/// One vertex of the expression tree.
#[derive(Debug)]
pub struct Node {
    kind: OpKind,
    state: Mutex<NodeState>,
    live_children: AtomicU8,
    resolved: AtomicBool,
}

impl Node {
    /// Build a leaf carrying `value`.
    pub(crate) fn leaf(value: f64) -> Self {
        Self {
            kind: OpKind::Leaf,
            state: Mutex::new(NodeState {
                parent: None,
                position: Position::Left,
                children: [None, None],
                value: Some(value),
                pending: None,
            }),
            live_children: AtomicU8::new(0),
            resolved: AtomicBool::new(false),
        }
    }

    /// Build an operator node over two child ids.
    pub(crate) fn operator(kind: OpKind, left: NodeId, right: NodeId) -> Self {
        Self {
            kind,
            state: Mutex::new(NodeState {
                parent: None,
                position: Position::Left,
                children: [Some(left), Some(right)],
                value: None,
                pending: None,
            }),
            live_children: AtomicU8::new(2),
            resolved: AtomicBool::new(false),
        }
    }

    /// Operator kind (immutable after construction).
    pub fn kind(&self) -> OpKind {
        self.kind
    }

    /// Lock the mutable state.
    pub fn lock(&self) -> MutexGuard<'_, NodeState> {
        self.state.lock()
    }

    /// Cheap gate: number of still-attached children.
    pub fn live_children(&self) -> u8 {
        self.live_children.load(Ordering::Acquire)
    }

    /// Cheap gate: whether the node has been removed for good.
    pub fn is_resolved(&self) -> bool {
        self.resolved.load(Ordering::Acquire)
    }

    /// Decrement the live-child count. Caller must hold this node's lock.
    pub(crate) fn dec_live_children(&self) {
        self.live_children.fetch_sub(1, Ordering::AcqRel);
    }

    /// Set the terminal flag. Caller must hold this node's lock; the flag is
    /// monotonic and never reset.
    pub(crate) fn mark_resolved(&self) {
        self.resolved.store(true, Ordering::Release);
    }

    /// Force the live-child count. Caller must hold this node's lock.
    pub(crate) fn set_live_children(&self, n: u8) {
        self.live_children.store(n, Ordering::Release);
    }
}
