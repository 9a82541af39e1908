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

//! Conservative cone-vs-AABB intersection.
//!
//! The test mirrors the compute-shader side of the culling pass: build the
//! six face planes of the box with normals pointing at the box center, and
//! declare separation only when both the cone tip and the base point farthest
//! behind a plane are behind it. False positives are possible (and fine, the
//! shading stage just visits a light that contributes nothing); false
//! negatives are not.

use crate::light::volume::Cone;
use crate::math::{Aabb, Plane, Vec3};

/// Builds the six face planes of `aabb`, wound so each normal points toward
/// the box interior. A point behind any plane is outside the box on that side.
fn face_planes(aabb: &Aabb) -> [Plane; 6] {
    // Corner numbering: bit 0 = max-x, bit 1 = max-y, bit 2 = max-z.
    let c = |i: usize| aabb.corner(i);
    [
        Plane::from_points(c(1), c(5), c(7)), // +x face
        Plane::from_points(c(0), c(1), c(3)), // -z face
        Plane::from_points(c(4), c(0), c(2)), // -x face
        Plane::from_points(c(5), c(4), c(6)), // +z face
        Plane::from_points(c(4), c(5), c(1)), // -y face
        Plane::from_points(c(7), c(6), c(2)), // +y face
    ]
}

/// Tests whether a cone's volume may overlap an axis-aligned box.
///
/// For each face plane the candidate farthest point of the cone's base disc
/// is `tip + dir*h - ((n × dir) × dir) * base_radius`. The double cross is
/// deliberately left unnormalized: its length is `sin` of the angle between
/// the plane normal and the cone axis, which shrinks the offset and therefore
/// only ever over-reports intersection, never under-reports.
///
/// When the axis is parallel to the normal the offset collapses to the base
/// center, and when it is anti-parallel the tip alone decides; both fall out
/// of the same expression.
pub fn cone_intersects_aabb(cone: &Cone, aabb: &Aabb) -> bool {
    let base_radius = cone.base_radius();
    let base_center = cone.tip + cone.direction * cone.height;

    for plane in face_planes(aabb) {
        let m = plane.normal.cross(cone.direction).cross(cone.direction);
        let farthest_base_point = base_center - m * base_radius;

        if plane.is_point_behind(cone.tip) && plane.is_point_behind(farthest_base_point) {
            return false;
        }
    }

    true
}
