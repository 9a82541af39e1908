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

//! # Luxel Core
//!
//! Foundational crate for the luxel clustered light-culling library: math
//! primitives (vectors, boxes, planes), spot-light types with their packed
//! GPU wire encodings, and the conservative cone-vs-AABB intersection test
//! shared by the culling pipelines in `luxel-cull`.

#![warn(missing_docs)]

pub mod light;
pub mod math;

pub use light::intersect::cone_intersects_aabb;
pub use light::volume::{Cone, LightVolumeError};
pub use light::{PackedSpotLight, SpotLight};
pub use math::geometry::{Aabb, Plane};
pub use math::vector::Vec3;
