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

//! Scan/scatter compaction of the cull results.
//!
//! Standard stream-compaction split: the *scan* turns per-cluster counts into
//! exclusive-prefix-sum offsets (the [`LightGrid`]), the *scatter* walks the
//! intersection records and writes each light index into its cluster's slice
//! of the flat light index list.

use thiserror::Error;

use crate::cull::IntersectionRecord;

/// Computes the exclusive prefix sum of `counts`.
///
/// `offsets[0] == 0` and `offsets[i] == offsets[i-1] + counts[i-1]`; the
/// total across all clusters is `offsets.last() + counts.last()`.
pub fn exclusive_prefix_sum(counts: &[u32]) -> Vec<u32> {
    let mut offsets = Vec::with_capacity(counts.len());
    let mut running = 0u32;
    for &count in counts {
        offsets.push(running);
        running += count;
    }
    offsets
}

/// Per-cluster `(offset, count)` pairs into the light index list.
///
/// This is the read-only structure the shading stage walks:
/// `light_index_list[offset..offset + count]` are the lights overlapping a
/// cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightGrid {
    offsets: Vec<u32>,
    counts: Vec<u32>,
}

impl LightGrid {
    /// Builds the grid by scanning per-cluster counts.
    pub fn from_counts(counts: Vec<u32>) -> Self {
        let offsets = exclusive_prefix_sum(&counts);
        Self { offsets, counts }
    }

    /// Number of clusters covered by the grid.
    #[inline]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// `true` if the grid covers no clusters.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// The `(offset, count)` pair of one cluster.
    #[inline]
    pub fn cell(&self, cluster: u32) -> (u32, u32) {
        (
            self.offsets[cluster as usize],
            self.counts[cluster as usize],
        )
    }

    /// All per-cluster offsets.
    #[inline]
    pub fn offsets(&self) -> &[u32] {
        &self.offsets
    }

    /// All per-cluster counts.
    #[inline]
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// Total number of light index slots, i.e. the light index list length.
    #[inline]
    pub fn total_assignments(&self) -> u32 {
        match (self.offsets.last(), self.counts.last()) {
            (Some(&offset), Some(&count)) => offset + count,
            _ => 0,
        }
    }

    /// Encodes the grid as the renderer's 3D-texture texels,
    /// `(count << 16) | offset` per cluster.
    ///
    /// Errors if any offset or count does not fit in 16 bits; callers size
    /// `max_lights_per_cluster` and the light count so that in practice this
    /// cannot happen.
    pub fn packed_texels(&self) -> Result<Vec<u32>, CompactionError> {
        self.offsets
            .iter()
            .zip(&self.counts)
            .enumerate()
            .map(|(cluster, (&offset, &count))| {
                if offset > 0xFFFF || count > 0xFFFF {
                    Err(CompactionError::CellOverflow {
                        cluster: cluster as u32,
                        offset,
                        count,
                    })
                } else {
                    Ok((count << 16) | offset)
                }
            })
            .collect()
    }
}

/// Scatters the recorded light indices into the flat light index list.
///
/// Every record writes `record.light` at `offsets[cluster] + local_rank`.
/// Ranks are unique and dense per cluster (the cull guarantees it), so each
/// slot is written exactly once.
pub fn scatter_records(records: &[IntersectionRecord], grid: &LightGrid) -> Vec<u32> {
    let mut list = vec![u32::MAX; grid.total_assignments() as usize];
    for record in records {
        let (offset, count) = grid.cell(record.cluster);
        debug_assert!(record.local_rank < count);
        list[(offset + record.local_rank) as usize] = record.light;
    }
    list
}

/// A compaction output that cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CompactionError {
    /// A cluster's offset or count exceeds the packed texel's 16-bit fields.
    #[error("light grid cell {cluster} does not fit a packed texel (offset {offset}, count {count})")]
    CellOverflow {
        /// Global cluster index of the offending cell.
        cluster: u32,
        /// The cell's offset into the light index list.
        offset: u32,
        /// The cell's light count.
        count: u32,
    },
}
