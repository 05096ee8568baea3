use crate::Vec3;

/// Tolerance used when validating a slab hit against the other two axes.
///
/// Rays grazing an edge or a face land a hair outside the box after the
/// division, this absorbs that round-off.
pub const BOX_EPSILON: f32 = 1e-4;

/// Axis-aligned bounding box used by the k-d tree and the surfel octree.
///
/// Invariant: `min[i] <= max[i]` on every axis for any box built from at least
/// one point.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

/// Where the ray origin sits relative to the box span on one axis.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Side {
    Left,
    Right,
    Inside,
}

impl BoundingBox {
    /// Create a box from two corners, sorting components so the invariant holds.
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Smallest box containing every point, `None` for an empty iterator.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Vec3>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut bounds = Self {
            min: first,
            max: first,
        };
        for point in points {
            bounds.extend_to(point);
        }
        Some(bounds)
    }

    /// Grow the box so it contains `point`.
    pub fn extend_to(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Scale the box about its center.
    pub fn scale(&mut self, factor: f32) {
        let center = self.center();
        let half = self.half_extent() * factor.abs();
        self.min = center - half;
        self.max = center + half;
    }

    /// Grow every side by `margin`.
    pub fn pad(&self, margin: f32) -> BoundingBox {
        BoundingBox {
            min: self.min - Vec3::splat(margin),
            max: self.max + Vec3::splat(margin),
        }
    }

    pub fn translate(&self, offset: Vec3) -> BoundingBox {
        BoundingBox {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    fn half_extent(&self) -> Vec3 {
        self.extent() * 0.5
    }

    /// Inclusive containment test.
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// True if `other` lies entirely inside this box.
    pub fn contains_box(&self, other: &BoundingBox) -> bool {
        self.contains(other.min) && self.contains(other.max)
    }

    /// Axis with the longest extent (0=X, 1=Y, 2=Z).
    ///
    /// Ties are broken with the priority Z > Y > X.
    pub fn longest_axis(&self) -> usize {
        let e = self.extent();
        if e.z >= e.y && e.z >= e.x {
            2
        } else if e.y >= e.x {
            1
        } else {
            0
        }
    }

    /// Split at the midpoint into the eight octants.
    ///
    /// Octant `i` takes the upper half on X when bit 0 is set, on Y for bit 1
    /// and on Z for bit 2.
    pub fn octants(&self) -> [BoundingBox; 8] {
        let center = self.center();
        std::array::from_fn(|i| {
            let pick = |bit: usize, axis: usize| {
                if i & bit == 0 {
                    (self.min[axis], center[axis])
                } else {
                    (center[axis], self.max[axis])
                }
            };
            let (x0, x1) = pick(1, 0);
            let (y0, y1) = pick(2, 1);
            let (z0, z1) = pick(4, 2);
            BoundingBox {
                min: Vec3::new(x0, y0, z0),
                max: Vec3::new(x1, y1, z1),
            }
        })
    }

    /// Slab intersection of the ray `origin + t * direction`.
    ///
    /// Returns the origin itself when it lies inside the box, otherwise the
    /// entry point on the box surface, or `None` when the box is missed or lies
    /// behind the ray.
    pub fn intersect(&self, origin: Vec3, direction: Vec3) -> Option<Vec3> {
        let mut inside = true;
        let mut side = [Side::Inside; 3];
        let mut candidate = [0.0f32; 3];

        for axis in 0..3 {
            if origin[axis] < self.min[axis] {
                side[axis] = Side::Left;
                candidate[axis] = self.min[axis];
                inside = false;
            } else if origin[axis] > self.max[axis] {
                side[axis] = Side::Right;
                candidate[axis] = self.max[axis];
                inside = false;
            }
        }

        if inside {
            return Some(origin);
        }

        // Zero direction components never produce a candidate plane.
        let mut max_t = [-1.0f32; 3];
        for axis in 0..3 {
            if side[axis] != Side::Inside && direction[axis] != 0.0 {
                max_t[axis] = (candidate[axis] - origin[axis]) / direction[axis];
            }
        }

        let mut plane = 0;
        for axis in 1..3 {
            if max_t[axis] > max_t[plane] {
                plane = axis;
            }
        }

        if max_t[plane] < 0.0 {
            return None;
        }

        let mut hit = Vec3::ZERO;
        for axis in 0..3 {
            if axis == plane {
                hit[axis] = candidate[axis];
            } else {
                hit[axis] = origin[axis] + max_t[plane] * direction[axis];
                if hit[axis] < self.min[axis] - BOX_EPSILON
                    || hit[axis] > self.max[axis] + BOX_EPSILON
                {
                    return None;
                }
            }
        }

        Some(hit)
    }
}
