//! Point-based global illumination.
//!
//! A [`PointCloud`] of [`Surfel`]s is shot from the lights once per scene and
//! indexed by an [`Octree`]. Shading points then gather nearby surfels as
//! virtual lights.

mod octree;
mod point_cloud;
mod surfel;

pub use octree::{Octree, OctreeNode, OctreeNodeKind, LEAF_SURFEL_THRESHOLD};
pub use point_cloud::PointCloud;
pub use surfel::Surfel;
