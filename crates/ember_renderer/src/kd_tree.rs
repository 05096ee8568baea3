//! Per-object k-d tree over triangle indices.
//!
//! Nodes live in a flat arena and refer to their children by index. Splits
//! are made at the midpoint of the node's longest axis, and triangles that
//! straddle the split plane are duplicated into both children, so a triangle
//! index may appear in several leaves.

use ember_core::Mesh;
use ember_math::BoundingBox;

use crate::ray::is_degenerate;
use crate::Ray;

/// A node with this many triangles or fewer becomes a leaf.
pub const LEAF_TRIANGLE_THRESHOLD: usize = 20;

/// Depth at which splitting gives up, for sets that never separate.
const MAX_DEPTH: usize = 32;

/// Index of a node in the tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub enum KdNodeKind {
    Leaf {
        triangles: Vec<u32>,
    },
    Split {
        axis: usize,
        split: f32,
        left: NodeId,
        right: NodeId,
    },
}

#[derive(Debug, Clone)]
pub struct KdNode {
    pub bounds: BoundingBox,
    pub kind: KdNodeKind,
}

/// K-d tree built once over one mesh's triangles.
#[derive(Debug, Clone)]
pub struct KdTree {
    nodes: Vec<KdNode>,
    root: NodeId,
    /// Zero-area triangles left out of every leaf.
    skipped: usize,
}

impl KdTree {
    /// Build the tree over every triangle of `mesh`.
    pub fn build(mesh: &Mesh) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            skipped: 0,
        };
        let (kept, skipped): (Vec<u32>, Vec<u32>) = (0..mesh.triangle_count() as u32)
            .partition(|&t| !is_degenerate(mesh.triangle_vertices(t as usize)));
        tree.skipped = skipped.len();
        if tree.skipped > 0 {
            log::warn!(
                "Mesh '{}': skipping {} degenerate triangle(s)",
                mesh.name,
                tree.skipped
            );
        }
        tree.root = tree.build_node(mesh, kept, mesh.bounds(), 0);

        log::debug!(
            "Built k-d tree for '{}': {} triangles, {} nodes, {} leaves, depth {}",
            mesh.name,
            mesh.triangle_count(),
            tree.node_count(),
            tree.leaf_count(),
            tree.depth()
        );
        tree
    }

    fn build_node(
        &mut self,
        mesh: &Mesh,
        triangles: Vec<u32>,
        bounds: BoundingBox,
        depth: usize,
    ) -> NodeId {
        if triangles.len() <= LEAF_TRIANGLE_THRESHOLD || depth >= MAX_DEPTH {
            return self.push(bounds, KdNodeKind::Leaf { triangles });
        }

        let axis = bounds.longest_axis();
        let split = bounds.center()[axis];

        let mut left = Vec::new();
        let mut right = Vec::new();
        for &triangle in &triangles {
            let coords = mesh
                .triangle_vertices(triangle as usize)
                .map(|v| v.position[axis]);
            let below = coords.iter().any(|&c| c < split);
            let above = coords.iter().any(|&c| c > split);
            // A vertex on the plane does not pull a triangle to that side;
            // only a triangle lying in the plane goes to both.
            if below || !above {
                left.push(triangle);
            }
            if above || !below {
                right.push(triangle);
            }
        }

        // The set cannot be separated here: one side kept everything, so its
        // box and the next split would repeat.
        if left.len() == triangles.len() || right.len() == triangles.len() {
            return self.push(bounds, KdNodeKind::Leaf { triangles });
        }

        let left_bounds = triangle_bounds(mesh, &left).unwrap_or(bounds);
        let right_bounds = triangle_bounds(mesh, &right).unwrap_or(bounds);
        let left = self.build_node(mesh, left, left_bounds, depth + 1);
        let right = self.build_node(mesh, right, right_bounds, depth + 1);

        self.push(
            bounds,
            KdNodeKind::Split {
                axis,
                split,
                left,
                right,
            },
        )
    }

    fn push(&mut self, bounds: BoundingBox, kind: KdNodeKind) -> NodeId {
        self.nodes.push(KdNode { bounds, kind });
        NodeId((self.nodes.len() - 1) as u32)
    }

    /// Intersect `ray` with the mesh this tree was built from.
    ///
    /// The ray's closest-hit record is updated in place. With `stop_at_first`
    /// the search returns as soon as any hit is recorded; otherwise the
    /// globally closest triangle is found. The tree itself is never modified.
    pub fn intersect(&self, mesh: &Mesh, ray: &mut Ray, stop_at_first: bool) -> bool {
        let root = &self.nodes[self.root.index()];
        match ray.intersect_box(&root.bounds) {
            Some(entry) if entry < ray.best_distance_squared() => {
                self.intersect_node(self.root, mesh, ray, stop_at_first)
            }
            _ => false,
        }
    }

    fn intersect_node(&self, id: NodeId, mesh: &Mesh, ray: &mut Ray, stop_at_first: bool) -> bool {
        match &self.nodes[id.index()].kind {
            KdNodeKind::Leaf { triangles } => {
                let mut hit = false;
                for &triangle in triangles {
                    let index = triangle as usize;
                    if ray.intersect_triangle(mesh.triangle_vertices(index), index) {
                        hit = true;
                        if stop_at_first {
                            return true;
                        }
                    }
                }
                hit
            }
            KdNodeKind::Split { left, right, .. } => {
                let left_entry = ray.intersect_box(&self.nodes[left.index()].bounds);
                let right_entry = ray.intersect_box(&self.nodes[right.index()].bounds);

                let mut order = [(*left, left_entry), (*right, right_entry)];
                if let (Some(l), Some(r)) = (left_entry, right_entry) {
                    if r < l {
                        order.swap(0, 1);
                    }
                } else if left_entry.is_none() {
                    order.swap(0, 1);
                }

                // Duplicated triangles make the children overlap, so a hit in
                // the nearer child does not end the search: the other child is
                // still visited while its box starts closer than the best hit.
                let mut hit = false;
                for (child, entry) in order {
                    let Some(entry) = entry else { continue };
                    if entry >= ray.best_distance_squared() {
                        continue;
                    }
                    if self.intersect_node(child, mesh, ray, stop_at_first) {
                        hit = true;
                        if stop_at_first {
                            return true;
                        }
                    }
                }
                hit
            }
        }
    }

    pub fn bounds(&self) -> BoundingBox {
        self.nodes[self.root.index()].bounds
    }

    pub fn root(&self) -> &KdNode {
        &self.nodes[self.root.index()]
    }

    pub fn node(&self, id: NodeId) -> &KdNode {
        &self.nodes[id.index()]
    }

    /// Number of zero-area triangles the tree leaves out.
    pub fn skipped_triangles(&self) -> usize {
        self.skipped
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n.kind, KdNodeKind::Leaf { .. }))
            .count()
    }

    /// Number of levels below and including the root.
    pub fn depth(&self) -> usize {
        self.depth_of(self.root)
    }

    fn depth_of(&self, id: NodeId) -> usize {
        match &self.nodes[id.index()].kind {
            KdNodeKind::Leaf { .. } => 1,
            KdNodeKind::Split { left, right, .. } => {
                1 + self.depth_of(*left).max(self.depth_of(*right))
            }
        }
    }

    /// Every triangle index stored in any leaf, duplicates included.
    pub fn leaf_triangles(&self) -> impl Iterator<Item = u32> + '_ {
        self.nodes.iter().flat_map(|node| match &node.kind {
            KdNodeKind::Leaf { triangles } => triangles.as_slice(),
            KdNodeKind::Split { .. } => &[],
        }
        .iter()
        .copied())
    }
}

fn triangle_bounds(mesh: &Mesh, triangles: &[u32]) -> Option<BoundingBox> {
    BoundingBox::from_points(triangles.iter().flat_map(|&t| {
        mesh.triangle_vertices(t as usize).map(|v| v.position)
    }))
}
