//! Broad phase: stackful LBVH traversal per triangle.
//!
//! Every leaf queries the tree with its own (inflated) box, starting at
//! the root and descending only into overlapping children. A leaf hit
//! is reported only when its triangle id is greater than the query's,
//! so each unordered pair appears once and no triangle pairs with
//! itself. Hits are appended to a capacity-bounded buffer.

use tessel_gpu::{group_count, CommandList};
use tessel_types::constants::{ELEMENT_BLOCK_SIZE, MAX_TRAVERSAL_STACK};

use crate::lbvh::Lbvh;
use crate::pairs::AppendBuffer;

/// Produces `(query, hit)` candidate pairs with `query < hit`.
pub struct LbvhBroadPhase;

impl LbvhBroadPhase {
    /// Records `broad_phase`. Trees with fewer than two leaves record
    /// nothing: a single triangle cannot collide with itself.
    pub fn record<'a>(list: &mut CommandList<'a>, tree: &'a Lbvh, pairs: &'a AppendBuffer) {
        let n = tree.leaf_count();
        if n < 2 {
            return;
        }
        list.dispatch(
            "broad_phase",
            group_count(n, ELEMENT_BLOCK_SIZE),
            move |group| {
                let start = group as usize * ELEMENT_BLOCK_SIZE;
                for leaf in start..(start + ELEMENT_BLOCK_SIZE).min(n) {
                    query_leaf(tree, leaf as u32, pairs);
                }
            },
        );
    }
}

fn query_leaf(tree: &Lbvh, leaf: u32, pairs: &AppendBuffer) {
    let query = tree.node_aabb(leaf);
    let query_triangle = tree.leaf_triangle(leaf);
    let Some(root) = tree.root() else {
        return;
    };

    let report = |hit: u32| {
        let hit_triangle = tree.leaf_triangle(hit);
        if hit_triangle > query_triangle {
            pairs.push(&[query_triangle, hit_triangle]);
        }
    };

    // Pending right children; the path always continues left first, so
    // the stack never holds more entries than the tree is deep.
    let mut stack = [0u32; MAX_TRAVERSAL_STACK];
    let mut top = 0usize;
    let mut node = root;

    loop {
        let (left, right) = tree.children(node);
        let hit_left = tree.node_aabb(left).overlaps(&query);
        let hit_right = tree.node_aabb(right).overlaps(&query);

        let descend_left = hit_left && !tree.is_leaf(left);
        let descend_right = hit_right && !tree.is_leaf(right);
        if hit_left && !descend_left {
            report(left);
        }
        if hit_right && !descend_right {
            report(right);
        }

        node = match (descend_left, descend_right) {
            (true, true) => {
                debug_assert!(top < MAX_TRAVERSAL_STACK, "traversal stack overflow");
                if top < MAX_TRAVERSAL_STACK {
                    stack[top] = right;
                    top += 1;
                }
                left
            }
            (true, false) => left,
            (false, true) => right,
            (false, false) => {
                if top == 0 {
                    break;
                }
                top -= 1;
                stack[top]
            }
        };
    }
}
