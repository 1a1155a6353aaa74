//! Linear BVH over sorted Morton codes (Karras 2012).
//!
//! # Layout
//!
//! Flat arrays indexed by node id, `2N - 1` nodes for `N` leaves:
//!
//! ```text
//! [0, N)        leaves, in sorted Morton order; leaf i is triangle leaf_triangles[i]
//! [N, 2N - 1)   internal nodes; internal node i lives at N + i, the root is N
//! ```
//!
//! A missing parent or child is [`INVALID_NODE`]. With a single leaf
//! there are no internal nodes and leaf 0 is the root.
//!
//! # Build
//!
//! After the sort, every internal node independently finds the key range
//! it covers and its split from the common-prefix length `δ` of
//! neighbouring codes, so the whole topology is one dispatch. Equal codes
//! fall back to comparing triangle ids: the stable sort leaves equal
//! codes in ascending id order, which makes `(code, id)` strictly
//! increasing and every split well defined.
//!
//! Boxes are then refit bottom-up in a second dispatch. Each leaf climbs
//! towards the root; at every internal node it bumps that node's
//! `arrived` counter. The first child to arrive stops, the second one
//! unions both child boxes and keeps climbing.

use tessel_gpu::{group_count, CommandList, StorageBuffer};
use tessel_math::aabb::AABB_LANES;
use tessel_math::Aabb;
use tessel_types::constants::{ELEMENT_BLOCK_SIZE, INVALID_NODE};

use crate::device_mesh::{load_aabb, read_aabbs, store_aabb};

/// Device-resident hierarchy, allocated once for a fixed leaf count.
pub struct Lbvh {
    leaves: usize,
    codes: StorageBuffer<u64>,
    leaf_triangles: StorageBuffer<u32>,
    parent: StorageBuffer<u32>,
    left: StorageBuffer<u32>,
    right: StorageBuffer<u32>,
    aabbs: StorageBuffer<f32>,
    arrived: StorageBuffer<u32>,
}

impl Lbvh {
    pub fn new(leaves: usize) -> Self {
        let nodes = node_count(leaves).max(1);
        Self {
            leaves,
            codes: StorageBuffer::filled("lbvh_codes", leaves.max(1), 0),
            leaf_triangles: StorageBuffer::filled("lbvh_leaf_triangles", leaves.max(1), 0),
            parent: StorageBuffer::filled("lbvh_parent", nodes, INVALID_NODE),
            left: StorageBuffer::filled("lbvh_left", nodes, INVALID_NODE),
            right: StorageBuffer::filled("lbvh_right", nodes, INVALID_NODE),
            aabbs: StorageBuffer::filled("lbvh_aabbs", nodes * AABB_LANES, 0.0),
            arrived: StorageBuffer::filled("lbvh_arrived", leaves.saturating_sub(1).max(1), 0),
        }
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves
    }

    pub fn node_count(&self) -> usize {
        node_count(self.leaves)
    }

    /// Root node id, if the tree has any node.
    pub fn root(&self) -> Option<u32> {
        match self.leaves {
            0 => None,
            1 => Some(0),
            n => Some(n as u32),
        }
    }

    /// Sort keys; sorted in place before [`Lbvh::record_build`] runs.
    pub fn codes(&self) -> &StorageBuffer<u64> {
        &self.codes
    }

    /// Sort values; after the sort, the triangle of each leaf.
    pub fn leaf_triangles(&self) -> &StorageBuffer<u32> {
        &self.leaf_triangles
    }

    #[inline]
    pub(crate) fn is_leaf(&self, node: u32) -> bool {
        (node as usize) < self.leaves
    }

    #[inline]
    pub(crate) fn children(&self, node: u32) -> (u32, u32) {
        (self.left.load(node as usize), self.right.load(node as usize))
    }

    #[inline]
    pub(crate) fn node_aabb(&self, node: u32) -> Aabb {
        load_aabb(&self.aabbs, node as usize)
    }

    #[inline]
    pub(crate) fn leaf_triangle(&self, leaf: u32) -> u32 {
        self.leaf_triangles.load(leaf as usize)
    }

    /// Records the reset, leaf, topology and refit dispatches.
    ///
    /// Expects `codes`/`leaf_triangles` to be sorted already. Leaf `i`
    /// gets the box of triangle `leaf_triangles[i]` grown by `margin`.
    pub fn record_build<'a>(
        &'a self,
        list: &mut CommandList<'a>,
        triangle_aabbs: &'a StorageBuffer<f32>,
        margin: f32,
    ) {
        let n = self.leaves;
        if n == 0 {
            return;
        }
        let nodes = self.node_count();

        list.dispatch(
            "lbvh_reset",
            group_count(nodes, ELEMENT_BLOCK_SIZE),
            move |group| {
                for node in lanes(group, nodes) {
                    self.parent.store(node, INVALID_NODE);
                    self.left.store(node, INVALID_NODE);
                    self.right.store(node, INVALID_NODE);
                    if node >= n {
                        self.arrived.store(node - n, 0);
                    }
                }
            },
        );

        list.dispatch(
            "lbvh_leaves",
            group_count(n, ELEMENT_BLOCK_SIZE),
            move |group| {
                for leaf in lanes(group, n) {
                    let triangle = self.leaf_triangles.load(leaf) as usize;
                    let aabb = load_aabb(triangle_aabbs, triangle).inflate(margin);
                    store_aabb(&self.aabbs, leaf, &aabb);
                }
            },
        );

        if n < 2 {
            return;
        }

        list.dispatch(
            "lbvh_internal",
            group_count(n - 1, ELEMENT_BLOCK_SIZE),
            move |group| {
                for i in lanes(group, n - 1) {
                    self.build_internal(i);
                }
            },
        );

        list.dispatch(
            "lbvh_refit",
            group_count(n, ELEMENT_BLOCK_SIZE),
            move |group| {
                for leaf in lanes(group, n) {
                    self.refit_from(leaf);
                }
            },
        );
    }

    /// Common-prefix length of the augmented keys of leaves `i` and `j`;
    /// `-1` when `j` is out of range.
    #[inline]
    fn delta(&self, i: i64, j: i64) -> i64 {
        if j < 0 || j >= self.leaves as i64 {
            return -1;
        }
        let (ki, kj) = (self.codes.load(i as usize), self.codes.load(j as usize));
        if ki == kj {
            let ti = self.leaf_triangles.load(i as usize);
            let tj = self.leaf_triangles.load(j as usize);
            64 + i64::from((ti ^ tj).leading_zeros())
        } else {
            i64::from((ki ^ kj).leading_zeros())
        }
    }

    fn build_internal(&self, i: usize) {
        let n = self.leaves;
        let i = i as i64;

        // Direction of the range: towards the neighbour sharing more prefix.
        let d: i64 = if self.delta(i, i + 1) > self.delta(i, i - 1) { 1 } else { -1 };
        let delta_min = self.delta(i, i - d);

        // Upper bound for the range length, then binary search for it.
        let mut l_max: i64 = 2;
        while self.delta(i, i + l_max * d) > delta_min {
            l_max *= 2;
        }
        let mut l: i64 = 0;
        let mut t = l_max / 2;
        while t >= 1 {
            if self.delta(i, i + (l + t) * d) > delta_min {
                l += t;
            }
            t /= 2;
        }
        let j = i + l * d;

        // Split position: last leaf sharing more than delta_node with i.
        let delta_node = self.delta(i, j);
        let mut s: i64 = 0;
        let mut t = l;
        loop {
            t = (t + 1) / 2;
            if self.delta(i, i + (s + t) * d) > delta_node {
                s += t;
            }
            if t <= 1 {
                break;
            }
        }
        let gamma = i + s * d + d.min(0);

        let node = n + i as usize;
        let left = if i.min(j) == gamma {
            gamma as usize
        } else {
            n + gamma as usize
        };
        let right = if i.max(j) == gamma + 1 {
            gamma as usize + 1
        } else {
            n + gamma as usize + 1
        };

        self.left.store(node, left as u32);
        self.right.store(node, right as u32);
        self.parent.store(left, node as u32);
        self.parent.store(right, node as u32);
    }

    fn refit_from(&self, leaf: usize) {
        let n = self.leaves;
        let mut node = self.parent.load(leaf);
        while node != INVALID_NODE {
            let slot = node as usize - n;
            if self.arrived.fetch_add(slot, 1) == 0 {
                // Sibling subtree not finished yet; it will carry on.
                return;
            }
            let (left, right) = self.children(node);
            let union = self.node_aabb(left).merge(&self.node_aabb(right));
            store_aabb(&self.aabbs, node as usize, &union);
            node = self.parent.load(node as usize);
        }
    }

    /// Host readback of the whole tree. Valid after the build submission.
    pub fn snapshot(&self) -> LbvhSnapshot {
        let nodes = self.node_count();
        let parent = self.parent.read_range(0..nodes);
        let left = self.left.read_range(0..nodes);
        let right = self.right.read_range(0..nodes);
        LbvhSnapshot {
            nodes: (0..nodes)
                .map(|i| LbvhNode {
                    parent: parent[i],
                    left: left[i],
                    right: right[i],
                })
                .collect(),
            aabbs: read_aabbs(&self.aabbs, nodes),
            leaf_triangles: self.leaf_triangles.read_range(0..self.leaves),
        }
    }
}

#[inline]
fn node_count(leaves: usize) -> usize {
    (2 * leaves).saturating_sub(1)
}

/// Lane indices `[group * block, min(group * block + block, len))`.
#[inline]
fn lanes(group: u32, len: usize) -> std::ops::Range<usize> {
    let start = group as usize * ELEMENT_BLOCK_SIZE;
    start..(start + ELEMENT_BLOCK_SIZE).min(len)
}

/// Parent and child links of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LbvhNode {
    pub parent: u32,
    pub left: u32,
    pub right: u32,
}

/// Host copy of a built hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct LbvhSnapshot {
    pub nodes: Vec<LbvhNode>,
    pub aabbs: Vec<Aabb>,
    pub leaf_triangles: Vec<u32>,
}

impl LbvhSnapshot {
    pub fn leaf_count(&self) -> usize {
        self.leaf_triangles.len()
    }

    pub fn root(&self) -> Option<u32> {
        match self.leaf_count() {
            0 => None,
            1 => Some(0),
            n => Some(n as u32),
        }
    }

    /// Checks the full-binary-tree shape. Returns the first violation.
    pub fn validate_shape(&self) -> Result<(), String> {
        let n = self.leaf_count();
        if self.nodes.len() != node_count(n) {
            return Err(format!("{} nodes for {} leaves", self.nodes.len(), n));
        }
        let Some(root) = self.root() else {
            return Ok(());
        };
        if self.nodes[root as usize].parent != INVALID_NODE {
            return Err(format!("root {root} has a parent"));
        }

        let mut references = vec![0u32; self.nodes.len()];
        for (id, node) in self.nodes.iter().enumerate().skip(n) {
            for child in [node.left, node.right] {
                if child as usize >= self.nodes.len() {
                    return Err(format!("internal node {id} has invalid child {child}"));
                }
                if self.nodes[child as usize].parent != id as u32 {
                    return Err(format!("child {child} does not point back to {id}"));
                }
                references[child as usize] += 1;
            }
            if node.left == node.right {
                return Err(format!("internal node {id} has a repeated child"));
            }
        }
        for (id, node) in self.nodes.iter().enumerate().take(n) {
            if node.left != INVALID_NODE || node.right != INVALID_NODE {
                return Err(format!("leaf {id} has children"));
            }
        }
        for (id, &count) in references.iter().enumerate() {
            let expected = u32::from(id as u32 != root);
            if count != expected {
                return Err(format!("node {id} referenced {count} times"));
            }
        }

        // Every leaf reaches the root without revisiting a node.
        for leaf in 0..n {
            let mut node = leaf as u32;
            let mut steps = 0;
            while node != root {
                node = self.nodes[node as usize].parent;
                steps += 1;
                if node == INVALID_NODE || steps > self.nodes.len() {
                    return Err(format!("leaf {leaf} does not reach the root"));
                }
            }
        }

        let mut triangles = self.leaf_triangles.clone();
        triangles.sort_unstable();
        if triangles.iter().enumerate().any(|(i, &t)| t as usize != i) {
            return Err("leaf triangles are not a permutation".into());
        }
        Ok(())
    }

    /// Checks that every internal box is exactly the union of its children.
    pub fn validate_bounds(&self) -> Result<(), String> {
        let n = self.leaf_count();
        for (id, node) in self.nodes.iter().enumerate().skip(n) {
            let union = self.aabbs[node.left as usize].merge(&self.aabbs[node.right as usize]);
            if self.aabbs[id] != union {
                return Err(format!("internal node {id} box is not the union of its children"));
            }
        }
        Ok(())
    }

    /// Number of edges on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        let Some(root) = self.root() else {
            return 0;
        };
        let mut deepest = 0;
        let mut stack = vec![(root, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            if (node as usize) < self.leaf_count() {
                deepest = deepest.max(depth);
            } else {
                let links = self.nodes[node as usize];
                stack.push((links.left, depth + 1));
                stack.push((links.right, depth + 1));
            }
        }
        deepest
    }
}
