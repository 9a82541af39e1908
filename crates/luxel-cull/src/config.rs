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

//! Configuration for the clustered culling pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration for the clipmap and the culling passes.
///
/// The defaults match the reference renderer: 10 nested levels of a `4×4×4`
/// grid, lights bounded at radius 25 with a contribution cutoff of 2.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Number of nested clipmap levels. Level `lod_count - 1` is the
    /// outermost/coarsest, level 0 the innermost/finest.
    pub lod_count: u32,

    /// Clusters per axis at every level.
    ///
    /// Must be a positive multiple of 4 so that the region covered by the
    /// next finer level is aligned to whole clusters (see
    /// [`ClusterConfig::validate`]).
    pub voxels_per_dim: u32,

    /// Maximum number of lights recorded per cluster.
    ///
    /// Additional assignments are dropped and counted, never a hard error.
    pub max_lights_per_cluster: u32,

    /// World-space radius beyond which a light contributes nothing.
    pub light_max_radius: f32,

    /// Intensity below which a light's contribution is culled; together with
    /// `light_max_radius` this sizes each light's bounding cone.
    pub contribution_threshold: f32,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            lod_count: 10,
            voxels_per_dim: 4,
            max_lights_per_cluster: 128,
            light_max_radius: 25.0,
            contribution_threshold: 2.0,
        }
    }
}

impl ClusterConfig {
    /// Creates a configuration with the reference defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration for dense many-light scenes: deeper per-cluster buckets.
    pub fn high_light_count() -> Self {
        Self {
            max_lights_per_cluster: 256,
            ..Self::default()
        }
    }

    /// Configuration trading cull precision for less memory: fewer levels,
    /// shallower buckets.
    pub fn low_overhead() -> Self {
        Self {
            lod_count: 6,
            max_lights_per_cluster: 64,
            ..Self::default()
        }
    }

    /// Checks the structural constraints the pipelines rely on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lod_count == 0 {
            return Err(ConfigError::NoLevels);
        }
        if self.voxels_per_dim == 0 || self.voxels_per_dim % 4 != 0 {
            return Err(ConfigError::UnalignedVoxelDim {
                voxels_per_dim: self.voxels_per_dim,
            });
        }
        if self.max_lights_per_cluster == 0 {
            return Err(ConfigError::ZeroClusterCapacity);
        }
        if !(self.light_max_radius > 0.0 && self.light_max_radius.is_finite()) {
            return Err(ConfigError::InvalidLightRadius {
                radius: self.light_max_radius,
            });
        }
        if !(self.contribution_threshold > 0.0 && self.contribution_threshold.is_finite()) {
            return Err(ConfigError::InvalidThreshold {
                threshold: self.contribution_threshold,
            });
        }
        Ok(())
    }

    /// Number of clusters in one clipmap level.
    #[inline]
    pub const fn voxels_per_level(&self) -> u32 {
        self.voxels_per_dim * self.voxels_per_dim * self.voxels_per_dim
    }

    /// Total number of clusters across all levels.
    #[inline]
    pub const fn cluster_count(&self) -> u32 {
        self.voxels_per_level() * self.lod_count
    }

    /// Worst-case number of (light, cluster) intersections for `light_count`
    /// lights, which bounds the intersection record storage.
    #[inline]
    pub const fn max_intersection_count(&self, light_count: u32) -> u64 {
        self.cluster_count() as u64 * light_count as u64
    }

    /// Derives the clipmap root extent from a perspective camera, as the
    /// reference renderer does: twice the distance from the eye to a far-plane
    /// corner, so the outermost level encloses the whole view frustum at any
    /// orientation.
    ///
    /// `vertical_fov` is in radians.
    pub fn clipmap_extent_for_camera(far_plane: f32, vertical_fov: f32, aspect_ratio: f32) -> f32 {
        let half_height = far_plane * (vertical_fov * 0.5).tan();
        let half_width = half_height * aspect_ratio;
        2.0 * (half_width * half_width + half_height * half_height + far_plane * far_plane).sqrt()
    }
}

/// A structurally invalid [`ClusterConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    /// `lod_count` is zero.
    #[error("clipmap needs at least one level")]
    NoLevels,
    /// `voxels_per_dim` is not a positive multiple of 4, so the next finer
    /// level's region would not be aligned to whole clusters.
    #[error("voxels_per_dim must be a positive multiple of 4, got {voxels_per_dim}")]
    UnalignedVoxelDim {
        /// The rejected value.
        voxels_per_dim: u32,
    },
    /// `max_lights_per_cluster` is zero.
    #[error("per-cluster light capacity must be non-zero")]
    ZeroClusterCapacity,
    /// `light_max_radius` is not finite and positive.
    #[error("light_max_radius must be finite and positive, got {radius}")]
    InvalidLightRadius {
        /// The rejected value.
        radius: f32,
    },
    /// `contribution_threshold` is not finite and positive.
    #[error("contribution_threshold must be finite and positive, got {threshold}")]
    InvalidThreshold {
        /// The rejected value.
        threshold: f32,
    },
}
