/// Bounding volumes: axis-aligned box and sphere.
///
/// Both are computed in a geometry's local space and transformed by the
/// node's world matrix at culling time.

use glam::{Mat4, Vec3};
use super::transform::max_scale_on_axis;

// ===== AABB =====

/// Axis-Aligned Bounding Box
///
/// The empty box has `min = +inf` and `max = -inf`, so expanding it by any
/// point yields that point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner (x, y, z)
    pub min: Vec3,
    /// Maximum corner (x, y, z)
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box containing nothing
    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        }
    }

    /// Smallest box containing every point
    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Self {
        let mut aabb = Self::empty();
        for point in points {
            aabb.expand_by_point(point);
        }
        aabb
    }

    pub fn is_empty(&self) -> bool {
        self.max.x < self.min.x || self.max.y < self.min.y || self.max.z < self.min.z
    }

    /// Center point (zero for an empty box)
    pub fn center(&self) -> Vec3 {
        if self.is_empty() { Vec3::ZERO } else { (self.min + self.max) * 0.5 }
    }

    /// Extent along each axis (zero for an empty box)
    pub fn size(&self) -> Vec3 {
        if self.is_empty() { Vec3::ZERO } else { self.max - self.min }
    }

    pub fn expand_by_point(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Smallest box containing both boxes
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x
        && point.y >= self.min.y && point.y <= self.max.y
        && point.z >= self.min.z && point.z <= self.max.z
    }

    /// Test if this AABB fully contains another AABB.
    pub fn contains(&self, other: &Aabb) -> bool {
        self.min.x <= other.min.x && self.max.x >= other.max.x
        && self.min.y <= other.min.y && self.max.y >= other.max.y
        && self.min.z <= other.min.z && self.max.z >= other.max.z
    }

    /// Test if this AABB intersects (overlaps or touches) another AABB.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x
        && self.min.y <= other.max.y && self.max.y >= other.min.y
        && self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Transform this local-space AABB by a matrix, returning a new AABB.
    ///
    /// Uses the Arvo method: projects each matrix axis onto the AABB extents
    /// for a tight result without transforming all 8 corners.
    pub fn transformed(&self, matrix: &Mat4) -> Aabb {
        if self.is_empty() {
            return *self;
        }

        let translation = matrix.col(3).truncate();
        let mut new_min = translation;
        let mut new_max = translation;

        for i in 0..3 {
            let axis = matrix.col(i).truncate();
            let a = axis * self.min[i];
            let b = axis * self.max[i];
            new_min += a.min(b);
            new_max += a.max(b);
        }

        Aabb { min: new_min, max: new_max }
    }
}

// ===== SPHERE =====

/// Bounding sphere. A negative radius marks the empty sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Default for Sphere {
    fn default() -> Self {
        Self::empty()
    }
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    pub fn empty() -> Self {
        Self { center: Vec3::ZERO, radius: -1.0 }
    }

    pub fn is_empty(&self) -> bool {
        self.radius < 0.0
    }

    /// Sphere centred on the points' bounding box, with the radius reaching
    /// the farthest point
    pub fn from_points(points: &[Vec3]) -> Self {
        if points.is_empty() {
            return Self::empty();
        }

        let center = Aabb::from_points(points.iter().copied()).center();
        let radius_sq = points
            .iter()
            .map(|p| p.distance_squared(center))
            .fold(0.0f32, f32::max);

        Self { center, radius: radius_sq.sqrt() }
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        !self.is_empty() && point.distance_squared(self.center) <= self.radius * self.radius
    }

    pub fn intersects(&self, other: &Sphere) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        let reach = self.radius + other.radius;
        self.center.distance_squared(other.center) <= reach * reach
    }

    /// Transform the sphere; the radius grows by the largest axis scale
    pub fn transformed(&self, matrix: &Mat4) -> Sphere {
        if self.is_empty() {
            return *self;
        }
        Sphere {
            center: matrix.transform_point3(self.center),
            radius: self.radius * max_scale_on_axis(matrix),
        }
    }
}

#[cfg(test)]
#[path = "bounds_tests.rs"]
mod tests;
