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

//! Camera-centered nested cluster grids.
//!
//! A clipmap is a stack of `lod_count` axis-aligned regions sharing one
//! center (the camera position). The outermost region spans the configured
//! extent; each finer level halves the span per axis. Every level is
//! subdivided into `voxels_per_dim³` cluster boxes.
//!
//! The whole structure is a pure function of (camera position, extent,
//! config) and is rebuilt from scratch every frame; nothing persists across
//! frames.

use luxel_core::math::{Aabb, Vec3};

use crate::config::ClusterConfig;

/// The per-frame stack of nested cluster grids.
///
/// Storage order matches the GPU layout of the reference renderer: clusters
/// of the coarsest level (`lod_count - 1`) come first, the finest level
/// (level 0) last. Within a level, voxels are laid out x-fastest, then y,
/// then z.
#[derive(Debug, Clone)]
pub struct Clipmap {
    lod_count: u32,
    voxels_per_dim: u32,
    /// Level bounds in storage order (coarsest first).
    levels: Vec<Aabb>,
    /// All cluster boxes in storage order.
    clusters: Vec<Aabb>,
}

impl Clipmap {
    /// Builds the clipmap for a frame.
    ///
    /// `extent` is the edge length of the outermost level's bounding cube,
    /// typically from [`ClusterConfig::clipmap_extent_for_camera`]. The
    /// config is assumed validated (the pipelines do so at construction).
    pub fn build(config: &ClusterConfig, camera_position: Vec3, extent: f32) -> Self {
        let lod_count = config.lod_count;
        let voxels_per_dim = config.voxels_per_dim;
        let voxels_per_level = config.voxels_per_level() as usize;

        let mut levels = Vec::with_capacity(lod_count as usize);
        let mut clusters = Vec::with_capacity(voxels_per_level * lod_count as usize);

        let mut region =
            Aabb::from_center_half_extents(camera_position, Vec3::splat(extent * 0.5));
        for _ in 0..lod_count {
            levels.push(region);
            voxelize_region(&region, voxels_per_dim, &mut clusters);
            region = Aabb::from_center_half_extents(camera_position, region.half_extents() * 0.5);
        }

        Self {
            lod_count,
            voxels_per_dim,
            levels,
            clusters,
        }
    }

    /// Number of levels.
    #[inline]
    pub fn lod_count(&self) -> u32 {
        self.lod_count
    }

    /// Clusters per axis at every level.
    #[inline]
    pub fn voxels_per_dim(&self) -> u32 {
        self.voxels_per_dim
    }

    /// Clusters in one level.
    #[inline]
    pub fn voxels_per_level(&self) -> u32 {
        self.voxels_per_dim * self.voxels_per_dim * self.voxels_per_dim
    }

    /// Total cluster count across all levels.
    #[inline]
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    /// Bounds of one level. Level 0 is the finest, `lod_count - 1` the
    /// coarsest.
    #[inline]
    pub fn level_bounds(&self, level: u32) -> Aabb {
        self.levels[(self.lod_count - 1 - level) as usize]
    }

    /// Flattens (level, local voxel index) into the global cluster index.
    #[inline]
    pub fn global_cluster_index(&self, level: u32, local: u32) -> u32 {
        (self.lod_count - 1 - level) * self.voxels_per_level() + local
    }

    /// The box of one cluster by global index.
    #[inline]
    pub fn cluster(&self, global_index: u32) -> &Aabb {
        &self.clusters[global_index as usize]
    }

    /// All cluster boxes of one level, in local voxel order.
    pub fn level_clusters(&self, level: u32) -> &[Aabb] {
        let per_level = self.voxels_per_level() as usize;
        let start = (self.lod_count - 1 - level) as usize * per_level;
        &self.clusters[start..start + per_level]
    }

    /// Splits a local voxel index into its (x, y, z) grid coordinates.
    #[inline]
    pub fn voxel_coords(&self, local: u32) -> (u32, u32, u32) {
        let d = self.voxels_per_dim;
        (local % d, (local / d) % d, local / (d * d))
    }
}

/// Appends the `dim³` voxel boxes tiling `region` to `out`, x-fastest.
fn voxelize_region(region: &Aabb, dim: u32, out: &mut Vec<Aabb>) {
    let voxel_size = region.size() / dim as f32;
    for z in 0..dim {
        for y in 0..dim {
            for x in 0..dim {
                let min = Vec3::new(
                    region.min.x + x as f32 * voxel_size.x,
                    region.min.y + y as f32 * voxel_size.y,
                    region.min.z + z as f32 * voxel_size.z,
                );
                out.push(Aabb {
                    min,
                    max: min + voxel_size,
                });
            }
        }
    }
}
