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

//! The single-threaded reference pipeline.
//!
//! One frame is three strictly ordered phases over immutable inputs: cull
//! (hierarchical clipmap walk), scan (prefix sum of per-cluster counts) and
//! scatter (write the flat light index list). The parallel driver in
//! [`crate::parallel`] must agree with this one on every per-cluster
//! assignment set, which is what the cross-check tests hold it to.

use luxel_core::light::volume::{Cone, LightVolumeError};
use luxel_core::light::PackedSpotLight;
use luxel_core::math::Vec3;

use crate::clipmap::Clipmap;
use crate::compact::{scatter_records, LightGrid};
use crate::config::{ClusterConfig, ConfigError};
use crate::cull::{hierarchical_cull, IntersectionRecord};

/// Per-frame statistics and overflow accounting.
#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    /// Number of lights submitted for the frame.
    pub light_count: usize,
    /// Lights that failed bounding-volume validation, with the reason.
    /// These are skipped, not fatal.
    pub rejected_lights: Vec<(u32, LightVolumeError)>,
    /// Recorded (light, cluster) assignments that made it into the output.
    pub intersection_count: usize,
    /// Assignments dropped per cluster because the bucket was full.
    pub dropped_per_cluster: Vec<u32>,
    /// Total dropped assignments across all clusters.
    pub dropped_assignments: u64,
}

/// The output of one culling frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// The cluster geometry the assignment refers to.
    pub clipmap: Clipmap,
    /// Per-cluster `(offset, count)` pairs.
    pub grid: LightGrid,
    /// Flat light index list, grouped by cluster via the grid.
    pub light_index_list: Vec<u32>,
    /// Statistics and overflow accounting.
    pub stats: FrameStats,
}

impl Frame {
    /// The lights assigned to one cluster.
    pub fn lights_for_cluster(&self, cluster: u32) -> &[u32] {
        let (offset, count) = self.grid.cell(cluster);
        &self.light_index_list[offset as usize..(offset + count) as usize]
    }

    /// Inverse query: all clusters a light was assigned to.
    ///
    /// Walks the whole grid; meant for debug overlays and tests, not the hot
    /// path.
    pub fn clusters_for_light(&self, light: u32) -> Vec<u32> {
        let mut clusters = Vec::new();
        for cluster in 0..self.grid.len() as u32 {
            if self.lights_for_cluster(cluster).contains(&light) {
                clusters.push(cluster);
            }
        }
        clusters
    }
}

/// Single-threaded cull → scan → scatter driver.
#[derive(Debug, Clone)]
pub struct CullPipeline {
    config: ClusterConfig,
}

impl CullPipeline {
    /// Creates a pipeline, validating the configuration once up front.
    pub fn new(config: ClusterConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The validated configuration.
    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Runs one frame.
    ///
    /// `clipmap_extent` is the outermost level's edge length, typically from
    /// [`ClusterConfig::clipmap_extent_for_camera`]. Invalid lights are
    /// skipped and reported in the stats; the frame itself cannot fail.
    pub fn run(
        &self,
        camera_position: Vec3,
        clipmap_extent: f32,
        lights: &[PackedSpotLight],
    ) -> Frame {
        let clipmap = Clipmap::build(&self.config, camera_position, clipmap_extent);
        let (cones, rejected) = derive_cones(&self.config, lights);

        let results = hierarchical_cull(&clipmap, &cones, self.config.max_lights_per_cluster);

        finish_frame(
            &self.config,
            clipmap,
            results.records,
            results.raw_counts,
            rejected,
            lights.len(),
            scatter_records,
        )
    }
}

/// Derives the bounding cone of every light, separating out the rejects.
pub(crate) fn derive_cones(
    config: &ClusterConfig,
    lights: &[PackedSpotLight],
) -> (Vec<(u32, Cone)>, Vec<(u32, LightVolumeError)>) {
    let mut cones = Vec::with_capacity(lights.len());
    let mut rejected = Vec::new();
    for (index, light) in lights.iter().enumerate() {
        match Cone::from_packed_light(
            light,
            config.light_max_radius,
            config.contribution_threshold,
        ) {
            Ok(cone) => cones.push((index as u32, cone)),
            Err(error) => {
                log::debug!("light {index} rejected from culling: {error}");
                rejected.push((index as u32, error));
            }
        }
    }
    (cones, rejected)
}

/// Shared tail of both pipelines: clamp counts, scan, scatter, account.
///
/// `scatter` lets each driver bring its own scatter strategy (serial writes
/// here, atomic stores in the parallel path).
pub(crate) fn finish_frame<F>(
    config: &ClusterConfig,
    clipmap: Clipmap,
    records: Vec<IntersectionRecord>,
    raw_counts: Vec<u32>,
    rejected_lights: Vec<(u32, LightVolumeError)>,
    light_count: usize,
    scatter: F,
) -> Frame
where
    F: FnOnce(&[IntersectionRecord], &LightGrid) -> Vec<u32>,
{
    let cap = config.max_lights_per_cluster;
    let mut dropped_per_cluster = vec![0u32; raw_counts.len()];
    let mut dropped_assignments = 0u64;
    let counts: Vec<u32> = raw_counts
        .iter()
        .enumerate()
        .map(|(cluster, &raw)| {
            let kept = raw.min(cap);
            let dropped = raw - kept;
            dropped_per_cluster[cluster] = dropped;
            dropped_assignments += dropped as u64;
            kept
        })
        .collect();

    let grid = LightGrid::from_counts(counts);
    let light_index_list = scatter(&records, &grid);

    if dropped_assignments > 0 {
        log::warn!(
            "cluster buckets overflowed: {dropped_assignments} assignments dropped \
             (capacity {cap} per cluster)"
        );
    }
    log::debug!(
        "culled {light_count} lights into {} assignments ({} rejected)",
        records.len(),
        rejected_lights.len()
    );

    Frame {
        clipmap,
        grid,
        light_index_list,
        stats: FrameStats {
            light_count,
            rejected_lights,
            intersection_count: records.len(),
            dropped_per_cluster,
            dropped_assignments,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use luxel_core::light::SpotLight;

    fn spot(position: Vec3, direction: Vec3) -> PackedSpotLight {
        SpotLight {
            position,
            direction,
            ..Default::default()
        }
        .pack()
    }

    #[test]
    fn test_pipeline_rejects_invalid_config() {
        let config = ClusterConfig {
            voxels_per_dim: 3,
            ..Default::default()
        };
        assert!(CullPipeline::new(config).is_err());
    }

    #[test]
    fn test_empty_frame() {
        let pipeline = CullPipeline::new(ClusterConfig::default()).unwrap();
        let frame = pipeline.run(Vec3::ZERO, 1024.0, &[]);

        assert_eq!(frame.grid.total_assignments(), 0);
        assert!(frame.light_index_list.is_empty());
        assert_eq!(frame.stats.light_count, 0);
        assert_eq!(frame.stats.dropped_assignments, 0);
    }

    #[test]
    fn test_frame_totals_are_consistent() {
        let pipeline = CullPipeline::new(ClusterConfig::default()).unwrap();
        let lights: Vec<PackedSpotLight> = (0..32)
            .map(|i| {
                spot(
                    Vec3::new(i as f32 * 20.0 - 300.0, 50.0, 0.0),
                    Vec3::new(0.0, -1.0, 0.0),
                )
            })
            .collect();
        let frame = pipeline.run(Vec3::ZERO, 2048.0, &lights);

        // Sum of grid counts equals the list length and the recorded total.
        let count_sum: u32 = frame.grid.counts().iter().sum();
        assert_eq!(count_sum, frame.grid.total_assignments());
        assert_eq!(count_sum as usize, frame.light_index_list.len());
        assert_eq!(count_sum as usize, frame.stats.intersection_count);
        // Every slot was written by the scatter.
        assert!(frame.light_index_list.iter().all(|&l| l != u32::MAX));
    }

    #[test]
    fn test_rejected_light_is_reported_not_fatal() {
        let good = spot(Vec3::new(0.0, 50.0, 0.0), Vec3::new(0.0, -1.0, 0.0));
        let mut dim = SpotLight::default();
        dim.intensity = Vec3::ZERO; // fails volume validation
        let lights = [good, dim.pack()];

        let pipeline = CullPipeline::new(ClusterConfig::default()).unwrap();
        let frame = pipeline.run(Vec3::ZERO, 2048.0, &lights);

        assert_eq!(frame.stats.rejected_lights.len(), 1);
        assert_eq!(frame.stats.rejected_lights[0].0, 1);
        // The rejected light contributes no entries.
        assert!(frame.clusters_for_light(1).is_empty());
    }

    #[test]
    fn test_inverse_query_agrees_with_grid() {
        let lights = [spot(Vec3::new(100.0, 30.0, -50.0), Vec3::new(0.0, -1.0, 0.0))];
        let pipeline = CullPipeline::new(ClusterConfig::default()).unwrap();
        let frame = pipeline.run(Vec3::ZERO, 2048.0, &lights);

        let clusters = frame.clusters_for_light(0);
        assert!(!clusters.is_empty());
        for cluster in clusters {
            assert!(frame.lights_for_cluster(cluster).contains(&0));
        }
    }

    #[test]
    fn test_overflow_accounting() {
        let config = ClusterConfig {
            max_lights_per_cluster: 4,
            ..Default::default()
        };
        let pipeline = CullPipeline::new(config).unwrap();
        // A pile of identical lights in one spot overflows its buckets.
        let lights: Vec<PackedSpotLight> = (0..16)
            .map(|_| spot(Vec3::new(400.0, 400.0, 400.0), Vec3::new(0.0, -1.0, 0.0)))
            .collect();
        let frame = pipeline.run(Vec3::ZERO, 1024.0, &lights);

        assert!(frame.stats.dropped_assignments > 0);
        let dropped_sum: u64 = frame
            .stats
            .dropped_per_cluster
            .iter()
            .map(|&d| d as u64)
            .sum();
        assert_eq!(dropped_sum, frame.stats.dropped_assignments);
        // No bucket exceeds its capacity in the output.
        assert!(frame.grid.counts().iter().all(|&c| c <= 4));
    }
}
