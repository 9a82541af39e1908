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

//! Bounding-cone derivation for spot lights.
//!
//! A light enters the cull phase as a [`Cone`] sized so that everything it
//! could contribute above a fixed threshold is inside the volume. Degenerate
//! lights are rejected here, with an error, rather than asserting deep inside
//! the geometry code.

use std::fmt;

use crate::light::PackedSpotLight;
use crate::math::Vec3;

/// A bounding cone: tip, unit direction, height and half-angle cosine.
///
/// The validated constructors guarantee `0 < cos_half_angle <= 1` (half-angle
/// strictly below 90 degrees) and a finite positive height, which is what the
/// cone/AABB separation test requires.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cone {
    /// The apex of the cone (the light position).
    pub tip: Vec3,
    /// Unit vector from the tip toward the base.
    pub direction: Vec3,
    /// Distance from the tip to the base plane.
    pub height: f32,
    /// Cosine of the half-angle at the tip. Always in `(0, 1]`.
    pub cos_half_angle: f32,
}

impl Cone {
    /// Creates a cone from explicit parts, validating them.
    ///
    /// `direction` is normalized. Errors if the half-angle is 90 degrees or
    /// wider, if the height is not finite and positive, or if the direction
    /// has (near) zero length.
    pub fn new(
        tip: Vec3,
        direction: Vec3,
        height: f32,
        cos_half_angle: f32,
    ) -> Result<Self, LightVolumeError> {
        if !(cos_half_angle > 0.0 && cos_half_angle <= 1.0) {
            return Err(LightVolumeError::HalfAngleTooWide { cos_half_angle });
        }
        if !(height.is_finite() && height > 0.0) {
            return Err(LightVolumeError::InvalidHeight { height });
        }
        let direction = direction.normalize();
        if !direction.is_finite() || direction == Vec3::ZERO {
            return Err(LightVolumeError::DegenerateDirection);
        }
        Ok(Self {
            tip,
            direction,
            height,
            cos_half_angle,
        })
    }

    /// Derives the bounding cone of a packed spot light.
    ///
    /// The cone is sized so that any point where the light's strongest RGB
    /// component still contributes more than `contribution_threshold` at
    /// `max_radius` falls inside it: with `i` the max intensity component and
    /// `d = 1 - 2t / (i * r²)`, the height is `r / sqrt(1/d² - 1)`.
    ///
    /// The half-angle is the spot's outer half-angle, reconstructed from the
    /// packed cosine fields.
    pub fn from_packed_light(
        light: &PackedSpotLight,
        max_radius: f32,
        contribution_threshold: f32,
    ) -> Result<Self, LightVolumeError> {
        let intensity = light.intensity().max_component();
        if !(intensity > 0.0) {
            return Err(LightVolumeError::NonPositiveIntensity { intensity });
        }

        let determinant =
            1.0 - (2.0 * contribution_threshold) / (intensity * max_radius * max_radius);
        if !determinant.is_finite() || determinant.abs() >= 1.0 || determinant == 0.0 {
            return Err(LightVolumeError::UnboundedVolume { determinant });
        }
        let height = max_radius / (1.0 / (determinant * determinant) - 1.0).sqrt();

        // The SNORM16 round trip of a very narrow cone's cosine range can
        // push the reconstructed cosine a hair past 1; clamp rather than
        // reject those.
        let cos_half_angle = light.cos_outer_half_angle().min(1.0);

        Self::new(light.position(), light.direction(), height, cos_half_angle)
    }

    /// Radius of the cone's base disc, `height * tan(half_angle)`.
    #[inline]
    pub fn base_radius(&self) -> f32 {
        let c = self.cos_half_angle;
        let tan_half_angle = (1.0 - c * c).max(0.0).sqrt() / c;
        self.height * tan_half_angle
    }
}

/// Why a light could not be given a bounding cone.
///
/// Lights that fail here are skipped (and counted) by the pipeline rather
/// than entering the cull phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightVolumeError {
    /// The half-angle is 90 degrees or wider; the plane separation test
    /// cannot bound such a cone.
    HalfAngleTooWide {
        /// The offending half-angle cosine.
        cos_half_angle: f32,
    },
    /// The decoded intensity has no positive component.
    NonPositiveIntensity {
        /// The strongest decoded component.
        intensity: f32,
    },
    /// The contribution equation has no finite solution for this light (the
    /// threshold is unreachable or the height would be infinite).
    UnboundedVolume {
        /// The determinant of the contribution equation.
        determinant: f32,
    },
    /// The computed height is not finite and positive.
    InvalidHeight {
        /// The offending height.
        height: f32,
    },
    /// The direction vector has (near) zero length or non-finite components.
    DegenerateDirection,
}

impl fmt::Display for LightVolumeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LightVolumeError::HalfAngleTooWide { cos_half_angle } => {
                write!(
                    f,
                    "spot half-angle is 90 degrees or wider (cos = {cos_half_angle})"
                )
            }
            LightVolumeError::NonPositiveIntensity { intensity } => {
                write!(f, "light intensity is not positive (max component = {intensity})")
            }
            LightVolumeError::UnboundedVolume { determinant } => {
                write!(
                    f,
                    "contribution equation has no finite bound (determinant = {determinant})"
                )
            }
            LightVolumeError::InvalidHeight { height } => {
                write!(f, "cone height is not finite and positive ({height})")
            }
            LightVolumeError::DegenerateDirection => {
                write!(f, "light direction is degenerate")
            }
        }
    }
}

impl std::error::Error for LightVolumeError {}
