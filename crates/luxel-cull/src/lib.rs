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

//! # Luxel Cull
//!
//! Clustered light culling over a camera-centered clipmap.
//!
//! Every frame the pipeline rebuilds a stack of nested voxel grids around the
//! camera ([`Clipmap`]), walks the scene's spot lights coarse-to-fine against
//! the cluster boxes (hierarchical cull), and compacts the surviving
//! (light, cluster) pairs into the two read-only structures the shading stage
//! consumes: a per-cluster [`LightGrid`] of `(offset, count)` pairs and a flat
//! light index list.
//!
//! [`CullPipeline`] is the single-threaded reference driver with strict
//! cull → scan → scatter ordering; [`ParallelCullPipeline`] fans the cull and
//! scatter phases over a worker pool and produces the same per-cluster
//! assignment sets.

#![warn(missing_docs)]

pub mod clipmap;
pub mod compact;
pub mod config;
pub mod cull;
pub mod parallel;
pub mod pipeline;

pub use clipmap::Clipmap;
pub use compact::{exclusive_prefix_sum, CompactionError, LightGrid};
pub use config::{ClusterConfig, ConfigError};
pub use cull::{CullResults, IntersectionRecord};
pub use parallel::ParallelCullPipeline;
pub use pipeline::{CullPipeline, Frame, FrameStats};
