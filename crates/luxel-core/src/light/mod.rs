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

//! Spot-light types and their packed wire representation.
//!
//! [`SpotLight`] is the authoring-side description of a light. The culling
//! pipelines consume [`PackedSpotLight`], the 32-byte GPU-layout record the
//! original renderer uploads once per frame: direction and cosine-range are
//! SNORM16-packed, HDR intensity is an RGB19E7 word split across two `u32`s.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::math::Vec3;

pub mod intersect;
pub mod packing;
pub mod volume;

use packing::{decode_rgb19e7, encode_rgb19e7, pack_snorm_2x16, unpack_snorm_2x16};

/// A spot light source that emits light in a cone from a single point.
///
/// # Examples
///
/// ```
/// use luxel_core::{SpotLight, Vec3};
///
/// let flashlight = SpotLight {
///     position: Vec3::new(0.0, 2.0, 0.0),
///     direction: Vec3::new(0.0, -1.0, 0.0),
///     intensity: Vec3::new(5.0, 5.0, 5.0),
///     inner_cone_angle: 15.0_f32.to_radians(),
///     outer_cone_angle: 30.0_f32.to_radians(),
/// };
/// let packed = flashlight.pack();
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpotLight {
    /// World-space position of the light (the cone tip).
    pub position: Vec3,

    /// The direction the light is pointing (normalized).
    pub direction: Vec3,

    /// Linear HDR RGB intensity.
    pub intensity: Vec3,

    /// The angle in radians within which the light is at full intensity.
    pub inner_cone_angle: f32,

    /// The angle in radians beyond which there is no light.
    ///
    /// Must be greater than `inner_cone_angle` and below 90 degrees for the
    /// light to survive bounding-volume validation.
    pub outer_cone_angle: f32,
}

impl Default for SpotLight {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            direction: -Vec3::Y,
            intensity: Vec3::splat(5.0),
            inner_cone_angle: 0.5_f32.to_radians(),
            outer_cone_angle: 2.38_f32.to_radians(),
        }
    }
}

impl SpotLight {
    /// Encodes the light into its 32-byte wire record.
    ///
    /// The direction is normalized before packing. Precision loss is that of
    /// the underlying encodings, see [`packing`].
    pub fn pack(&self) -> PackedSpotLight {
        let direction = self.direction.normalize();
        let cosine_range = self.inner_cone_angle.cos() - self.outer_cone_angle.cos();
        let intensity = encode_rgb19e7([self.intensity.x, self.intensity.y, self.intensity.z]);

        PackedSpotLight {
            position: [self.position.x, self.position.y, self.position.z],
            outer_cosine_over_cosine_range: self.outer_cone_angle.cos() / cosine_range,
            intensity: [intensity as u32, (intensity >> 32) as u32],
            direction: [
                pack_snorm_2x16(direction.x, direction.y),
                pack_snorm_2x16(direction.z, cosine_range),
            ],
        }
    }
}

/// The GPU-layout spot light record consumed by the culling pipelines.
///
/// Field layout matches the renderer's per-frame upload: 32 bytes, no padding.
/// `direction[0]` holds the SNORM16-packed x/y of the direction,
/// `direction[1]` holds z and the cosine range
/// (`cos(inner_half_angle) - cos(outer_half_angle)`).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PackedSpotLight {
    /// World-space position of the light.
    pub position: [f32; 3],
    /// `cos(outer_half_angle) / (cos(inner_half_angle) - cos(outer_half_angle))`.
    pub outer_cosine_over_cosine_range: f32,
    /// RGB19E7-encoded intensity, low word first.
    pub intensity: [u32; 2],
    /// SNORM16-packed direction and cosine range.
    pub direction: [u32; 2],
}

impl PackedSpotLight {
    /// World-space position as a vector.
    #[inline]
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.position[0], self.position[1], self.position[2])
    }

    /// Decodes the direction vector. Not re-normalized; callers that need a
    /// unit vector should normalize after the SNORM16 round trip.
    #[inline]
    pub fn direction(&self) -> Vec3 {
        let (x, y) = unpack_snorm_2x16(self.direction[0]);
        let (z, _) = unpack_snorm_2x16(self.direction[1]);
        Vec3::new(x, y, z)
    }

    /// Decodes the cosine range, `cos(inner_half_angle) - cos(outer_half_angle)`.
    #[inline]
    pub fn cosine_range(&self) -> f32 {
        let (_, cosine_range) = unpack_snorm_2x16(self.direction[1]);
        cosine_range
    }

    /// Decodes the HDR intensity triple.
    #[inline]
    pub fn intensity(&self) -> Vec3 {
        let packed = ((self.intensity[1] as u64) << 32) | self.intensity[0] as u64;
        let [r, g, b] = decode_rgb19e7(packed);
        Vec3::new(r, g, b)
    }

    /// Cosine of the outer half-angle, reconstructed from the packed fields.
    #[inline]
    pub fn cos_outer_half_angle(&self) -> f32 {
        self.outer_cosine_over_cosine_range * self.cosine_range()
    }
}
