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

//! Coarse-to-fine hierarchical light culling.
//!
//! Lights start as one active set tested against the coarsest clipmap level.
//! A hit on a *mid region* cluster (the central block the next finer level
//! covers) forwards the light to the finer level instead of recording it; any
//! other hit becomes a final (light, cluster) assignment. Lights that miss
//! the coarse region entirely are dropped without ever touching the finer
//! grids, which is what keeps the walk well below `lights × clusters` tests.

use luxel_core::light::volume::Cone;
use luxel_core::cone_intersects_aabb;

use crate::clipmap::Clipmap;

/// One recorded (light, cluster) intersection.
///
/// `local_rank` is the light's position within the cluster's bucket, assigned
/// in record order; the scatter phase turns it into the final slot index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntersectionRecord {
    /// Global cluster index into the clipmap's storage order.
    pub cluster: u32,
    /// Position within the cluster's bucket.
    pub local_rank: u32,
    /// Index of the light in the frame's light list.
    pub light: u32,
}

/// Output of the cull phase.
#[derive(Debug, Clone)]
pub struct CullResults {
    /// Recorded assignments; only ranks below the per-cluster capacity are
    /// kept.
    pub records: Vec<IntersectionRecord>,
    /// Per-cluster intersection counts *before* the capacity clamp; the
    /// excess over capacity is the number of dropped assignments.
    pub raw_counts: Vec<u32>,
}

/// Whether a voxel lies in the central region covered by the next finer
/// level.
///
/// Each finer level spans the central half of the current one, so with `d`
/// voxels per axis the region is exactly the voxels whose coordinates all lie
/// in `[d/4, 3d/4)`. Config validation keeps `d` a multiple of 4 so the
/// region is voxel-aligned.
#[inline]
pub(crate) fn in_mid_region(coords: (u32, u32, u32), voxels_per_dim: u32) -> bool {
    let lo = voxels_per_dim / 4;
    let hi = 3 * voxels_per_dim / 4;
    let (x, y, z) = coords;
    (lo..hi).contains(&x) && (lo..hi).contains(&y) && (lo..hi).contains(&z)
}

/// Runs the hierarchical cull of `cones` against `clipmap`.
///
/// `cones` pairs each bounding cone with its light index in the frame's
/// light list (lights that failed volume validation are simply absent).
/// Records are emitted in deterministic order: level by level from coarse to
/// fine, lights in active-set order, clusters in storage order.
pub fn hierarchical_cull(
    clipmap: &Clipmap,
    cones: &[(u32, Cone)],
    max_lights_per_cluster: u32,
) -> CullResults {
    let voxels_per_level = clipmap.voxels_per_level();
    let mut raw_counts = vec![0u32; clipmap.cluster_count()];
    let mut records = Vec::new();

    let mut active: Vec<usize> = (0..cones.len()).collect();
    let mut next_active: Vec<usize> = Vec::with_capacity(cones.len());
    let mut forwarded = vec![false; cones.len()];

    for level in (0..clipmap.lod_count()).rev() {
        log::trace!("culling level {level}: {} active lights", active.len());

        for &cone_index in &active {
            let (light, ref cone) = cones[cone_index];

            for local in 0..voxels_per_level {
                let global = clipmap.global_cluster_index(level, local);
                if !cone_intersects_aabb(cone, clipmap.cluster(global)) {
                    continue;
                }

                let recurses =
                    level != 0 && in_mid_region(clipmap.voxel_coords(local), clipmap.voxels_per_dim());
                if recurses {
                    if !forwarded[cone_index] {
                        forwarded[cone_index] = true;
                        next_active.push(cone_index);
                    }
                } else {
                    let rank = raw_counts[global as usize];
                    raw_counts[global as usize] += 1;
                    if rank < max_lights_per_cluster {
                        records.push(IntersectionRecord {
                            cluster: global,
                            local_rank: rank,
                            light,
                        });
                    }
                }
            }
        }

        std::mem::swap(&mut active, &mut next_active);
        next_active.clear();
        forwarded.fill(false);
    }

    CullResults {
        records,
        raw_counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClusterConfig;
    use luxel_core::math::Vec3;

    const EXTENT: f32 = 1024.0;

    fn clipmap() -> Clipmap {
        Clipmap::build(&ClusterConfig::default(), Vec3::ZERO, EXTENT)
    }

    fn narrow_cone(tip: Vec3, direction: Vec3, height: f32) -> Cone {
        Cone::new(tip, direction, height, 0.95).unwrap()
    }

    #[test]
    fn test_mid_region_matches_reference_indices_for_dim_4() {
        // The reference implementation hard-codes these eight local indices
        // for its 4x4x4 grid; the computed predicate must agree.
        let expected = [21u32, 22, 25, 26, 37, 38, 41, 42];
        let mut found = Vec::new();
        for local in 0..64u32 {
            let coords = (local % 4, (local / 4) % 4, local / 16);
            if in_mid_region(coords, 4) {
                found.push(local);
            }
        }
        assert_eq!(found, expected);
    }

    #[test]
    fn test_mid_region_scales_to_dim_8() {
        // For an 8-wide grid the region is coordinates 2..6 on every axis.
        assert!(in_mid_region((2, 2, 2), 8));
        assert!(in_mid_region((5, 5, 5), 8));
        assert!(!in_mid_region((1, 4, 4), 8));
        assert!(!in_mid_region((6, 3, 3), 8));
    }

    #[test]
    fn test_light_outside_clipmap_contributes_nothing() {
        let cone = narrow_cone(Vec3::new(2000.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), 10.0);
        let results = hierarchical_cull(&clipmap(), &[(0, cone)], 128);
        assert!(results.records.is_empty());
        assert!(results.raw_counts.iter().all(|&c| c == 0));
    }

    #[test]
    fn test_peripheral_light_terminates_at_coarse_level() {
        // Inside the outermost level's corner voxel, far outside every finer
        // level (which all span at most +/-256).
        let cone = narrow_cone(Vec3::new(400.0, 400.0, 400.0), -Vec3::Y, 5.0);
        let map = clipmap();
        let results = hierarchical_cull(&map, &[(7, cone)], 128);

        assert!(!results.records.is_empty());
        let per_level = map.voxels_per_level();
        for record in &results.records {
            // Storage order puts the coarsest level first.
            assert!(record.cluster < per_level, "recorded at a finer level");
            assert_eq!(record.light, 7);
        }
    }

    #[test]
    fn test_central_light_recurses_to_finest_level() {
        // A small cone near the camera, comfortably inside one finest-level
        // voxel (the finest level spans +/-1 here).
        let cone = narrow_cone(Vec3::new(0.3, 0.3, 0.3), -Vec3::Y, 0.2);
        let map = clipmap();
        let results = hierarchical_cull(&map, &[(0, cone)], 128);

        assert_eq!(results.records.len(), 1);
        let record = results.records[0];
        // The finest level occupies the last block of the storage order.
        let finest_start = (map.lod_count() - 1) * map.voxels_per_level();
        assert!(record.cluster >= finest_start);
        assert!(map.cluster(record.cluster).contains_point(Vec3::new(0.3, 0.3, 0.3)));
    }

    #[test]
    fn test_ranks_are_contiguous_per_cluster() {
        // Several overlapping lights in the same corner voxel.
        let cones: Vec<(u32, Cone)> = (0..5)
            .map(|i| {
                let tip = Vec3::new(400.0 + i as f32, 400.0, 400.0);
                (i, narrow_cone(tip, -Vec3::Y, 5.0))
            })
            .collect();
        let results = hierarchical_cull(&clipmap(), &cones, 128);

        let mut ranks_by_cluster: std::collections::HashMap<u32, Vec<u32>> =
            std::collections::HashMap::new();
        for r in &results.records {
            ranks_by_cluster.entry(r.cluster).or_default().push(r.local_rank);
        }
        for (cluster, mut ranks) in ranks_by_cluster {
            ranks.sort_unstable();
            let expected: Vec<u32> = (0..ranks.len() as u32).collect();
            assert_eq!(ranks, expected, "ranks not contiguous for {cluster}");
            assert_eq!(
                results.raw_counts[cluster as usize] as usize,
                ranks.len(),
                "raw count disagrees for {cluster}"
            );
        }
    }

    #[test]
    fn test_capacity_truncates_but_keeps_counting() {
        let cones: Vec<(u32, Cone)> = (0..4)
            .map(|i| (i, narrow_cone(Vec3::new(400.0, 400.0, 400.0), -Vec3::Y, 5.0)))
            .collect();
        let results = hierarchical_cull(&clipmap(), &cones, 2);

        // All four lights hit the same cluster set; only two records survive
        // per cluster while the raw count remembers all four.
        for (cluster, &raw) in results.raw_counts.iter().enumerate() {
            if raw > 0 {
                assert_eq!(raw, 4);
                let kept = results
                    .records
                    .iter()
                    .filter(|r| r.cluster == cluster as u32)
                    .count();
                assert_eq!(kept, 2);
            }
        }
    }
}
