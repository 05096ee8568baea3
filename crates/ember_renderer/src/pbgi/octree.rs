//! Octree over a surfel cloud.
//!
//! Each internal node splits its box at the midpoint into eight octants.
//! Containment is inclusive, so a surfel sitting exactly on a split plane is
//! stored in every octant that touches it.

use ember_math::{BoundingBox, Vec3};

use super::Surfel;
use crate::Ray;

/// A node with this many surfels or fewer becomes a leaf.
pub const LEAF_SURFEL_THRESHOLD: usize = 16;

/// Guards against clusters of coincident surfels.
const MAX_DEPTH: usize = 16;

#[derive(Debug, Clone)]
pub enum OctreeNodeKind {
    Leaf { surfels: Vec<u32> },
    Branch { children: [u32; 8] },
}

#[derive(Debug, Clone)]
pub struct OctreeNode {
    pub bounds: BoundingBox,
    pub kind: OctreeNodeKind,
}

#[derive(Debug, Clone)]
pub struct Octree {
    nodes: Vec<OctreeNode>,
    root: u32,
}

impl Octree {
    /// Build over `surfels`. The root box covers every disc, not just the
    /// disc centers.
    pub fn build(surfels: &[Surfel]) -> Self {
        let max_radius = surfels.iter().map(|s| s.radius).fold(0.0f32, f32::max);
        let bounds = BoundingBox::from_points(surfels.iter().map(|s| s.position))
            .map(|b| b.pad(max_radius))
            .unwrap_or_else(|| BoundingBox::new(Vec3::ZERO, Vec3::ZERO));

        let mut tree = Self {
            nodes: Vec::new(),
            root: 0,
        };
        let all = (0..surfels.len() as u32).collect();
        tree.root = tree.build_node(surfels, all, bounds, 0);
        tree
    }

    fn build_node(&mut self, surfels: &[Surfel], indices: Vec<u32>, bounds: BoundingBox, depth: usize) -> u32 {
        if indices.len() <= LEAF_SURFEL_THRESHOLD || depth >= MAX_DEPTH {
            return self.push(bounds, OctreeNodeKind::Leaf { surfels: indices });
        }

        let octants = bounds.octants();
        let buckets: Vec<Vec<u32>> = octants
            .iter()
            .map(|octant| {
                indices
                    .iter()
                    .copied()
                    .filter(|&i| octant.contains(surfels[i as usize].position))
                    .collect()
            })
            .collect();

        let mut children = [0u32; 8];
        for (slot, (octant, bucket)) in children.iter_mut().zip(octants.into_iter().zip(buckets)) {
            *slot = self.build_node(surfels, bucket, octant, depth + 1);
        }
        self.push(bounds, OctreeNodeKind::Branch { children })
    }

    fn push(&mut self, bounds: BoundingBox, kind: OctreeNodeKind) -> u32 {
        self.nodes.push(OctreeNode { bounds, kind });
        (self.nodes.len() - 1) as u32
    }

    /// First surfel disc hit by `ray` closer than `max_distance`.
    ///
    /// Children are visited nearest-first by their box entry distance, and the
    /// search returns on the first leaf that yields a hit. Inside a leaf the
    /// nearest disc wins.
    pub fn intersect(&self, surfels: &[Surfel], ray: &Ray, max_distance: f32) -> Option<(usize, f32)> {
        let root = &self.nodes[self.root as usize];
        ray.intersect_box(&root.bounds)?;
        self.intersect_node(self.root, surfels, ray, max_distance)
    }

    fn intersect_node(&self, id: u32, surfels: &[Surfel], ray: &Ray, max_distance: f32) -> Option<(usize, f32)> {
        match &self.nodes[id as usize].kind {
            OctreeNodeKind::Leaf { surfels: indices } => indices
                .iter()
                .filter_map(|&i| {
                    let i = i as usize;
                    surfels[i]
                        .intersect(ray)
                        .filter(|&t| t < max_distance)
                        .map(|t| (i, t))
                })
                .min_by(|a, b| a.1.total_cmp(&b.1)),
            OctreeNodeKind::Branch { children } => {
                let mut order: Vec<(u32, f32)> = children
                    .iter()
                    .filter_map(|&child| {
                        ray.intersect_box(&self.nodes[child as usize].bounds)
                            .map(|entry| (child, entry))
                    })
                    .collect();
                order.sort_by(|a, b| a.1.total_cmp(&b.1));

                order
                    .into_iter()
                    .find_map(|(child, _)| self.intersect_node(child, surfels, ray, max_distance))
            }
        }
    }

    pub fn bounds(&self) -> BoundingBox {
        self.nodes[self.root as usize].bounds
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n.kind, OctreeNodeKind::Leaf { .. }))
            .count()
    }

    /// Surfel indices stored in leaves, duplicates included.
    pub fn leaf_surfels(&self) -> impl Iterator<Item = u32> + '_ {
        self.nodes.iter().flat_map(|node| match &node.kind {
            OctreeNodeKind::Leaf { surfels } => surfels.as_slice(),
            OctreeNodeKind::Branch { .. } => &[],
        }
        .iter()
        .copied())
    }
}
