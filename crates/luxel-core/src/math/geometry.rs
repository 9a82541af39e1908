// Copyright 2026 the luxel authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Geometric primitives used by the culling tests.
//!
//! An [`Aabb`] is the unit of space the clipmap subdivides into clusters; a
//! [`Plane`] in normal/distance form is what the cone separation test is
//! built from.

use serde::{Deserialize, Serialize};

use super::vector::Vec3;

/// An axis-aligned bounding box defined by its two extreme corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(C)]
pub struct Aabb {
    /// The corner with the smallest coordinates on all axes.
    pub min: Vec3,
    /// The corner with the largest coordinates on all axes.
    pub max: Vec3,
}

impl Aabb {
    /// Creates a new `Aabb` from two corner points.
    ///
    /// Components are sorted so `min` always holds the component-wise minimum
    /// regardless of argument order.
    #[inline]
    pub fn from_min_max(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Creates a new `Aabb` from a center point and its half-extents.
    #[inline]
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Calculates the center point of the box.
    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Calculates the half-extents (half the size on each axis).
    #[inline]
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Calculates the full size (width, height, depth) of the box.
    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Checks that `min <= max` on all axes. Degenerate boxes where
    /// `min == max` are considered valid.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// Checks if a point is contained within or on the boundary of the box.
    #[inline]
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Checks if this box fully contains another box.
    #[inline]
    pub fn contains_aabb(&self, other: &Aabb) -> bool {
        self.contains_point(other.min) && self.contains_point(other.max)
    }

    /// Returns one of the 8 corners of the box.
    ///
    /// Bit 0 of `index` selects max-x, bit 1 selects max-y, bit 2 selects
    /// max-z, so corner 0 is `min` and corner 7 is `max`.
    #[inline]
    pub fn corner(&self, index: usize) -> Vec3 {
        debug_assert!(index < 8);
        Vec3::new(
            if index & 1 != 0 { self.max.x } else { self.min.x },
            if index & 2 != 0 { self.max.y } else { self.min.y },
            if index & 4 != 0 { self.max.z } else { self.min.z },
        )
    }

    /// Radius of the sphere centered at [`Aabb::center`] that encloses the box.
    #[inline]
    pub fn bounding_sphere_radius(&self) -> f32 {
        self.half_extents().length()
    }
}

/// An infinite plane in normal/distance form.
///
/// A point `p` lies on the plane when `dot(normal, p) + distance == 0`. The
/// normal is kept unit length by the constructors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    /// The unit normal of the plane.
    pub normal: Vec3,
    /// Signed distance term of the plane equation.
    pub distance: f32,
}

impl Plane {
    /// Builds the plane through three points wound counter-clockwise.
    ///
    /// The normal follows the right-hand rule over `(b - a) × (c - a)`, so a
    /// viewer for whom `a`, `b`, `c` appear counter-clockwise is on the
    /// positive side.
    pub fn from_points(a: Vec3, b: Vec3, c: Vec3) -> Self {
        let normal = (b - a).cross(c - a).normalize();
        Self {
            normal,
            distance: -normal.dot(a),
        }
    }

    /// Signed distance from a point to the plane, positive on the normal side.
    #[inline]
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }

    /// Returns `true` if the point lies in the negative half-space of the
    /// plane, i.e. behind it when the normal points toward the viewer.
    ///
    /// Points exactly on the plane count as behind.
    #[inline]
    pub fn is_point_behind(&self, point: Vec3) -> bool {
        self.signed_distance(point) <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::approx_eq;

    #[test]
    fn test_aabb_from_min_max_sorts_components() {
        let aabb = Aabb::from_min_max(Vec3::new(4.0, 1.0, 6.0), Vec3::new(1.0, 5.0, 3.0));
        assert_eq!(aabb.min, Vec3::new(1.0, 1.0, 3.0));
        assert_eq!(aabb.max, Vec3::new(4.0, 5.0, 6.0));
        assert!(aabb.is_valid());
    }

    #[test]
    fn test_aabb_center_and_extents() {
        let aabb = Aabb::from_center_half_extents(Vec3::new(1.0, 2.0, 3.0), Vec3::splat(2.0));
        assert_eq!(aabb.center(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(aabb.half_extents(), Vec3::splat(2.0));
        assert_eq!(aabb.size(), Vec3::splat(4.0));
    }

    #[test]
    fn test_aabb_contains_point() {
        let aabb = Aabb::from_min_max(Vec3::ZERO, Vec3::splat(1.0));
        assert!(aabb.contains_point(Vec3::splat(0.5)));
        assert!(aabb.contains_point(Vec3::ZERO)); // boundary
        assert!(aabb.contains_point(Vec3::splat(1.0))); // boundary
        assert!(!aabb.contains_point(Vec3::new(1.1, 0.5, 0.5)));
        assert!(!aabb.contains_point(Vec3::new(0.5, -0.1, 0.5)));
    }

    #[test]
    fn test_aabb_contains_aabb() {
        let outer = Aabb::from_min_max(Vec3::ZERO, Vec3::splat(4.0));
        let inner = Aabb::from_min_max(Vec3::splat(1.0), Vec3::splat(3.0));
        assert!(outer.contains_aabb(&inner));
        assert!(!inner.contains_aabb(&outer));
    }

    #[test]
    fn test_aabb_corner_numbering() {
        let aabb = Aabb::from_min_max(Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(aabb.corner(0), aabb.min);
        assert_eq!(aabb.corner(7), aabb.max);
        assert_eq!(aabb.corner(1), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(aabb.corner(2), Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(aabb.corner(4), Vec3::new(0.0, 0.0, 3.0));
    }

    #[test]
    fn test_aabb_bounding_sphere_radius() {
        let aabb = Aabb::from_min_max(Vec3::ZERO, Vec3::splat(2.0));
        assert!(approx_eq(aabb.bounding_sphere_radius(), 3.0f32.sqrt()));
    }

    #[test]
    fn test_plane_from_points_winding() {
        // CCW in the XY plane seen from +Z, normal should point toward +Z.
        let plane = Plane::from_points(
            Vec3::ZERO,
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        assert!(approx_eq(plane.normal.z, 1.0));
        assert!(approx_eq(plane.distance, 0.0));

        assert!(approx_eq(plane.signed_distance(Vec3::new(0.0, 0.0, 2.0)), 2.0));
        assert!(plane.is_point_behind(Vec3::new(0.5, 0.5, -1.0)));
        assert!(plane.is_point_behind(Vec3::new(0.5, 0.5, 0.0))); // on the plane
        assert!(!plane.is_point_behind(Vec3::new(0.5, 0.5, 1.0)));
    }

    #[test]
    fn test_plane_normal_is_unit_length() {
        let plane = Plane::from_points(
            Vec3::new(3.0, 1.0, -2.0),
            Vec3::new(5.0, 0.0, 4.0),
            Vec3::new(1.0, 2.0, 2.0),
        );
        assert!(approx_eq(plane.normal.length(), 1.0));
    }
}
