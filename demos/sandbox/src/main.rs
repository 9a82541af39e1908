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

// Luxel Sandbox
// Runs both culling drivers over the reference light field and compares them.

use std::time::Instant;

use anyhow::Result;
use luxel_core::light::{PackedSpotLight, SpotLight};
use luxel_core::math::Vec3;
use luxel_cull::{ClusterConfig, CullPipeline, Frame, ParallelCullPipeline};

/// The reference scene: two mirrored planar grids of spot lights hovering
/// over the ground plane, spaced one light radius apart.
fn generate_lights(config: &ClusterConfig) -> Vec<PackedSpotLight> {
    let bottom_right = Vec3::new(-809.0, 32.3175, -34.0);
    let top_left = Vec3::new(964.0, 1266.12, -34.0);
    let spacing = config.light_max_radius;
    let columns = ((top_left.x - bottom_right.x) / spacing).floor() as u32;
    let rows = ((top_left.y - bottom_right.y) / spacing).floor() as u32;

    let mut lights = Vec::with_capacity((2 * columns * rows) as usize);
    for &(z, dir_z) in &[(-34.0f32, -0.998440f32), (3.0, 0.998440)] {
        for row in 0..rows {
            for col in 0..columns {
                lights.push(
                    SpotLight {
                        position: Vec3::new(
                            bottom_right.x + col as f32 * spacing,
                            bottom_right.y + row as f32 * spacing,
                            z,
                        ),
                        direction: Vec3::new(0.045677, 0.032760, dir_z),
                        intensity: Vec3::splat(5.0),
                        ..Default::default()
                    }
                    .pack(),
                );
            }
        }
    }
    lights
}

fn report(label: &str, frame: &Frame, elapsed: std::time::Duration) {
    let stats = &frame.stats;
    let populated = frame.grid.counts().iter().filter(|&&c| c > 0).count();
    let busiest = frame.grid.counts().iter().max().copied().unwrap_or(0);

    log::info!(
        "{label}: {} lights -> {} assignments across {populated}/{} clusters \
         (busiest bucket {busiest}, {} rejected, {} dropped) in {elapsed:.2?}",
        stats.light_count,
        stats.intersection_count,
        frame.grid.len(),
        stats.rejected_lights.len(),
        stats.dropped_assignments,
    );
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ClusterConfig::default();
    let camera_position = Vec3::new(-157.229813, 369.800446, -611.180908);
    let extent =
        ClusterConfig::clipmap_extent_for_camera(4000.0, 60f32.to_radians(), 16.0 / 9.0);

    let lights = generate_lights(&config);
    log::info!("generated {} lights, clipmap extent {extent:.1}", lights.len());

    let serial = CullPipeline::new(config)?;
    let start = Instant::now();
    let serial_frame = serial.run(camera_position, extent, &lights);
    report("serial  ", &serial_frame, start.elapsed());

    let parallel = ParallelCullPipeline::new(config)?;
    let start = Instant::now();
    let parallel_frame = parallel.run(camera_position, extent, &lights);
    report("parallel", &parallel_frame, start.elapsed());

    if serial_frame.grid.counts() != parallel_frame.grid.counts() {
        anyhow::bail!("serial and parallel drivers disagree on per-cluster counts");
    }
    match serial_frame.grid.packed_texels() {
        Ok(texels) => log::info!("drivers agree; light grid packs into {} texels", texels.len()),
        Err(error) => log::warn!("drivers agree, but the grid does not pack: {error}"),
    }

    Ok(())
}
