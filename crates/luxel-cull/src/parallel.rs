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

//! Multi-threaded variant of the culling pipeline.
//!
//! Mirrors the GPU dispatch structure of the reference renderer: within a
//! clipmap level the active lights are fanned out to workers, per-cluster
//! bucket slots are claimed with an atomic `fetch_add`, and the scatter phase
//! writes the index list through atomic stores. The level loop itself stays
//! sequential because each finer level consumes the previous one's forwarded
//! set; the thread joins between phases are the barriers.
//!
//! Per-cluster assignment sets are identical to [`crate::CullPipeline`]'s as
//! long as no bucket overflows its capacity. Under overflow both drivers keep
//! exactly `max_lights_per_cluster` lights per bucket but may keep different
//! ones, since the rank race decides which assignments land below the cap.

use std::sync::atomic::{AtomicU32, Ordering};
use std::thread;

use luxel_core::cone_intersects_aabb;
use luxel_core::light::volume::Cone;
use luxel_core::light::PackedSpotLight;
use luxel_core::math::Vec3;

use crate::clipmap::Clipmap;
use crate::compact::LightGrid;
use crate::config::{ClusterConfig, ConfigError};
use crate::cull::{in_mid_region, IntersectionRecord};
use crate::pipeline::{derive_cones, finish_frame, Frame};

/// Multi-threaded cull → scan → scatter driver.
#[derive(Debug, Clone)]
pub struct ParallelCullPipeline {
    config: ClusterConfig,
    worker_count: usize,
}

impl ParallelCullPipeline {
    /// Creates a pipeline sized to the machine's available parallelism.
    pub fn new(config: ClusterConfig) -> Result<Self, ConfigError> {
        let workers = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self::with_workers(config, workers)
    }

    /// Creates a pipeline with an explicit worker count.
    pub fn with_workers(config: ClusterConfig, worker_count: usize) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            worker_count: worker_count.max(1),
        })
    }

    /// The validated configuration.
    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Number of worker threads used per phase.
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Runs one frame. Semantics match [`crate::CullPipeline::run`].
    pub fn run(
        &self,
        camera_position: Vec3,
        clipmap_extent: f32,
        lights: &[PackedSpotLight],
    ) -> Frame {
        let clipmap = Clipmap::build(&self.config, camera_position, clipmap_extent);
        let (cones, rejected) = derive_cones(&self.config, lights);

        let (records, raw_counts) = self.cull(&clipmap, &cones);

        let workers = self.worker_count;
        finish_frame(
            &self.config,
            clipmap,
            records,
            raw_counts,
            rejected,
            lights.len(),
            |records, grid| scatter_atomic(records, grid, workers),
        )
    }

    fn cull(
        &self,
        clipmap: &Clipmap,
        cones: &[(u32, Cone)],
    ) -> (Vec<IntersectionRecord>, Vec<u32>) {
        let counts: Vec<AtomicU32> = (0..clipmap.cluster_count())
            .map(|_| AtomicU32::new(0))
            .collect();
        let mut records = Vec::new();
        let mut active: Vec<usize> = (0..cones.len()).collect();

        for level in (0..clipmap.lod_count()).rev() {
            log::trace!("culling level {level}: {} active lights", active.len());
            if active.is_empty() {
                break;
            }

            let mut forwarded =
                self.cull_level(clipmap, cones, &active, level, &counts, &mut records);
            // Workers return their cones in chunk order; sort to keep the
            // next level's walk deterministic.
            forwarded.sort_unstable();
            active = forwarded;
        }

        let raw_counts = counts.into_iter().map(AtomicU32::into_inner).collect();
        (records, raw_counts)
    }

    /// Fans one level's active set out to workers over a bounded channel.
    ///
    /// Returns the cone indices forwarded to the next finer level; records
    /// land in `records`. Each cone belongs to exactly one worker, so the
    /// forwarded sets are disjoint by construction.
    fn cull_level(
        &self,
        clipmap: &Clipmap,
        cones: &[(u32, Cone)],
        active: &[usize],
        level: u32,
        counts: &[AtomicU32],
        records: &mut Vec<IntersectionRecord>,
    ) -> Vec<usize> {
        let cap = self.config.max_lights_per_cluster;
        let chunk_size = active.len().div_ceil(self.worker_count).max(1);
        let mut forwarded = Vec::new();

        let (task_tx, task_rx) = crossbeam_channel::bounded::<&[usize]>(self.worker_count);
        let (result_tx, result_rx) =
            crossbeam_channel::bounded::<(Vec<IntersectionRecord>, Vec<usize>)>(self.worker_count);

        thread::scope(|scope| {
            for _ in 0..self.worker_count {
                let task_rx = task_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move || {
                    let mut local_records = Vec::new();
                    let mut local_forwarded = Vec::new();
                    while let Ok(chunk) = task_rx.recv() {
                        for &cone_index in chunk {
                            cull_cone(
                                clipmap,
                                cones[cone_index].0,
                                &cones[cone_index].1,
                                cone_index,
                                level,
                                counts,
                                cap,
                                &mut local_records,
                                &mut local_forwarded,
                            );
                        }
                    }
                    let _ = result_tx.send((local_records, local_forwarded));
                });
            }
            drop(task_rx);
            drop(result_tx);

            for chunk in active.chunks(chunk_size) {
                if task_tx.send(chunk).is_err() {
                    break;
                }
            }
            drop(task_tx);

            for (local_records, local_forwarded) in result_rx {
                records.extend(local_records);
                forwarded.extend(local_forwarded);
            }
        });

        forwarded
    }
}

/// Tests one cone against every cluster of one level.
#[allow(clippy::too_many_arguments)]
fn cull_cone(
    clipmap: &Clipmap,
    light: u32,
    cone: &Cone,
    cone_index: usize,
    level: u32,
    counts: &[AtomicU32],
    cap: u32,
    records: &mut Vec<IntersectionRecord>,
    forwarded: &mut Vec<usize>,
) {
    let mut did_forward = false;
    for local in 0..clipmap.voxels_per_level() {
        let global = clipmap.global_cluster_index(level, local);
        if !cone_intersects_aabb(cone, clipmap.cluster(global)) {
            continue;
        }

        let recurses =
            level != 0 && in_mid_region(clipmap.voxel_coords(local), clipmap.voxels_per_dim());
        if recurses {
            if !did_forward {
                did_forward = true;
                forwarded.push(cone_index);
            }
        } else {
            let rank = counts[global as usize].fetch_add(1, Ordering::Relaxed);
            if rank < cap {
                records.push(IntersectionRecord {
                    cluster: global,
                    local_rank: rank,
                    light,
                });
            }
        }
    }
}

/// Parallel scatter: each record owns its slot (cluster offset + rank), so
/// relaxed atomic stores from any thread are race-free by construction.
fn scatter_atomic(records: &[IntersectionRecord], grid: &LightGrid, workers: usize) -> Vec<u32> {
    let slots: Vec<AtomicU32> = (0..grid.total_assignments())
        .map(|_| AtomicU32::new(u32::MAX))
        .collect();

    let chunk_size = records.len().div_ceil(workers).max(1);
    thread::scope(|scope| {
        for chunk in records.chunks(chunk_size) {
            let slots = &slots;
            scope.spawn(move || {
                for record in chunk {
                    let (offset, count) = grid.cell(record.cluster);
                    debug_assert!(record.local_rank < count);
                    slots[(offset + record.local_rank) as usize]
                        .store(record.light, Ordering::Relaxed);
                }
            });
        }
    });

    slots.into_iter().map(AtomicU32::into_inner).collect()
}
