//! Rake-and-compress contraction protocol
//!
//! `contract` is the unit of work the orchestrator hands to worker threads:
//! one attempt to remove one node from the live tree. It is idempotent and
//! safe to invoke redundantly or concurrently on any node.
//!
//! Locking discipline: every multi-lock acquisition takes the involved nodes
//! in ascending arena-index order — the one canonical total order used
//! everywhere, which rules out deadlock between overlapping attempts. Because
//! the initial state check runs before the locks are held, every mutation is
//! gated on re-validating its exact preconditions after acquisition; a
//! re-validation miss is an expected race, not an error, and the attempt
//! simply returns to be retried in a later round.

use parking_lot::MutexGuard;

use crate::tree::{ExprTree, NodeId, NodeState};
use crate::EvalError;

/// One contraction attempt on `id`.
///
/// Rakes a childless node into its parent, compresses a degree-one node out
/// of a degree-one parent's chain, or does nothing (root, degree two, already
/// resolved, or lost a race). The only error is a domain error from finally
/// evaluating a pending transform; it aborts the whole contraction.
pub fn contract(tree: &ExprTree, id: NodeId) -> Result<(), EvalError> {
    let node = tree.node(id);
    if node.is_resolved() {
        return Ok(());
    }
    match node.live_children() {
        0 => try_rake(tree, id),
        1 => try_compress(tree, id),
        _ => Ok(()),
    }
}

/// Rake: fold this node's value into its parent and detach.
fn try_rake(tree: &ExprTree, id: NodeId) -> Result<(), EvalError> {
    // Snapshot the parent link under our own lock only; it may be stale by
    // the time both locks are held.
    let parent_id = {
        let state = tree.node(id).lock();
        match (state.parent, state.value) {
            (Some(parent), Some(_)) => parent,
            // Root is never raked away; a live degree-0 node without a value
            // cannot exist, but losing that race is not ours to report.
            _ => return Ok(()),
        }
    };

    let (mut node_state, mut parent_state) = lock_pair(tree, id, parent_id);
    let node = tree.node(id);
    let parent = tree.node(parent_id);

    // Re-validate everything under both locks.
    if node.is_resolved() || parent.is_resolved() {
        return Ok(());
    }
    if node_state.parent != Some(parent_id) || node.live_children() != 0 {
        return Ok(());
    }
    let position = node_state.position;
    if parent_state.children[position.index()] != Some(id) {
        return Ok(());
    }
    let x = match node_state.value {
        Some(x) => x,
        None => return Ok(()),
    };

    // First operand to arrive stores the parent's rake rule; the second is
    // evaluated through it, resolving the parent's value on the spot.
    match parent_state.pending.take() {
        Some(transform) => parent_state.value = Some(transform.eval(x)?),
        None => parent_state.pending = Some(parent.kind().rake_rule(position, x)),
    }
    parent_state.children[position.index()] = None;
    parent.dec_live_children();
    node_state.parent = None;
    node.mark_resolved();
    Ok(())
}

/// Compress: splice this degree-one node out from between its degree-one
/// parent and its sole child, composing the pending transforms.
fn try_compress(tree: &ExprTree, id: NodeId) -> Result<(), EvalError> {
    let (parent_id, child_id) = {
        let state = tree.node(id).lock();
        let parent = match state.parent {
            Some(parent) => parent,
            None => return Ok(()), // the root is compressed into, never out
        };
        match state.sole_child() {
            Some((child, _)) => (parent, child),
            None => return Ok(()),
        }
    };
    // Cheap gate before committing to three locks; re-checked below.
    if tree.node(parent_id).live_children() != 1 {
        return Ok(());
    }

    let [mut node_state, mut parent_state, mut child_state] =
        lock_triple(tree, [id, parent_id, child_id]);
    let node = tree.node(id);
    let parent = tree.node(parent_id);
    let child = tree.node(child_id);

    if node.is_resolved() || parent.is_resolved() || child.is_resolved() {
        return Ok(());
    }
    if node.live_children() != 1 || parent.live_children() != 1 {
        return Ok(());
    }
    if node_state.parent != Some(parent_id) || child_state.parent != Some(id) {
        return Ok(());
    }
    let position = node_state.position;
    if parent_state.children[position.index()] != Some(id) {
        return Ok(());
    }
    match node_state.sole_child() {
        Some((sole, _)) if sole == child_id => {}
        _ => return Ok(()),
    }
    // A live degree-one operator always carries a pending transform; seeing
    // otherwise means the structure moved under us.
    let (parent_pending, node_pending) = match (parent_state.pending, node_state.pending) {
        (Some(parent_pending), Some(node_pending)) => (parent_pending, node_pending),
        _ => return Ok(()),
    };

    // The child's future value flows through this node's transform first,
    // then the parent's.
    parent_state.pending = Some(parent_pending.compose(&node_pending));
    parent_state.children[position.index()] = Some(child_id);
    child_state.parent = Some(parent_id);
    child_state.position = position;
    node_state.children = [None, None];
    node_state.parent = None;
    node_state.pending = None;
    node.set_live_children(0);
    node.mark_resolved();
    Ok(())
}

/// Lock two distinct nodes in ascending arena-index order; guards are
/// returned in argument order.
fn lock_pair<'t>(
    tree: &'t ExprTree,
    a: NodeId,
    b: NodeId,
) -> (MutexGuard<'t, NodeState>, MutexGuard<'t, NodeState>) {
    debug_assert_ne!(a, b);
    if a < b {
        let guard_a = tree.node(a).lock();
        let guard_b = tree.node(b).lock();
        (guard_a, guard_b)
    } else {
        let guard_b = tree.node(b).lock();
        let guard_a = tree.node(a).lock();
        (guard_a, guard_b)
    }
}

/// Lock three distinct nodes in ascending arena-index order; guards are
/// returned in argument order.
fn lock_triple<'t>(tree: &'t ExprTree, ids: [NodeId; 3]) -> [MutexGuard<'t, NodeState>; 3] {
    debug_assert!(ids[0] != ids[1] && ids[1] != ids[2] && ids[0] != ids[2]);
    let mut order = [0usize, 1, 2];
    order.sort_unstable_by_key(|&slot| ids[slot]);
    let mut guards: [Option<MutexGuard<'t, NodeState>>; 3] = [None, None, None];
    for slot in order {
        guards[slot] = Some(tree.node(ids[slot]).lock());
    }
    guards.map(|guard| guard.expect("all three slots locked"))
}
