use luxel_core::light::SpotLight;
use luxel_core::math::Vec3;
use luxel_cull::{ClusterConfig, CullPipeline, ParallelCullPipeline};

fn light_field(count: u32, spacing: f32) -> Vec<luxel_core::light::PackedSpotLight> {
    // A planar grid of downward spots, the shape the reference scene uses.
    let side = (count as f32).sqrt().ceil() as u32;
    (0..count)
        .map(|i| {
            let x = (i % side) as f32 * spacing - side as f32 * spacing * 0.5;
            let z = (i / side) as f32 * spacing - side as f32 * spacing * 0.5;
            SpotLight {
                position: Vec3::new(x, 40.0, z),
                direction: Vec3::new(0.0, -1.0, 0.0),
                ..Default::default()
            }
            .pack()
        })
        .collect()
}

#[test]
fn serial_and_parallel_assign_the_same_lights_per_cluster() {
    let config = ClusterConfig::default();
    let lights = light_field(256, 30.0);

    let serial = CullPipeline::new(config).unwrap();
    let parallel = ParallelCullPipeline::with_workers(config, 8).unwrap();

    let extent = ClusterConfig::clipmap_extent_for_camera(800.0, 60f32.to_radians(), 16.0 / 9.0);
    let a = serial.run(Vec3::ZERO, extent, &lights);
    let b = parallel.run(Vec3::ZERO, extent, &lights);

    // Capacity is far above any bucket's population here, so the drivers
    // must agree on every cluster's exact light set.
    assert_eq!(a.stats.dropped_assignments, 0);
    assert_eq!(b.stats.dropped_assignments, 0);
    assert_eq!(a.grid.counts(), b.grid.counts());
    for cluster in 0..a.grid.len() as u32 {
        let mut lhs = a.lights_for_cluster(cluster).to_vec();
        let mut rhs = b.lights_for_cluster(cluster).to_vec();
        lhs.sort_unstable();
        rhs.sort_unstable();
        assert_eq!(lhs, rhs, "cluster {cluster}");
    }
}

#[test]
fn grid_offsets_are_an_exclusive_prefix_sum_of_counts() {
    let pipeline = CullPipeline::new(ClusterConfig::default()).unwrap();
    let frame = pipeline.run(Vec3::new(10.0, 5.0, -20.0), 2048.0, &light_field(64, 50.0));

    let offsets = frame.grid.offsets();
    let counts = frame.grid.counts();
    assert_eq!(offsets[0], 0);
    for i in 1..offsets.len() {
        assert_eq!(offsets[i], offsets[i - 1] + counts[i - 1]);
    }
    assert_eq!(
        frame.grid.total_assignments() as usize,
        frame.light_index_list.len()
    );
}

#[test]
fn light_far_outside_the_clipmap_gets_no_entries() {
    let inside = SpotLight {
        position: Vec3::new(0.0, 40.0, 0.0),
        direction: Vec3::new(0.0, -1.0, 0.0),
        ..Default::default()
    }
    .pack();
    let outside = SpotLight {
        position: Vec3::new(50_000.0, 0.0, 0.0),
        direction: Vec3::new(1.0, 0.0, 0.0),
        ..Default::default()
    }
    .pack();

    let pipeline = CullPipeline::new(ClusterConfig::default()).unwrap();
    let frame = pipeline.run(Vec3::ZERO, 1024.0, &[inside, outside]);

    assert!(!frame.clusters_for_light(0).is_empty());
    assert!(frame.clusters_for_light(1).is_empty());
    assert!(frame.light_index_list.iter().all(|&l| l != 1));
}

#[test]
fn every_recorded_assignment_is_a_real_intersection() {
    // Cross-check the hierarchical walk against the flat cone-vs-box test:
    // a cluster that got a light must intersect that light's bounding cone.
    let lights = light_field(64, 40.0);
    let config = ClusterConfig::default();
    let pipeline = CullPipeline::new(config).unwrap();
    let frame = pipeline.run(Vec3::ZERO, 2048.0, &lights);

    let cones: Vec<_> = lights
        .iter()
        .map(|l| {
            luxel_core::Cone::from_packed_light(
                l,
                config.light_max_radius,
                config.contribution_threshold,
            )
            .unwrap()
        })
        .collect();

    for cluster in 0..frame.grid.len() as u32 {
        let bounds = frame.clipmap.cluster(cluster);
        for &light in frame.lights_for_cluster(cluster) {
            assert!(
                luxel_core::cone_intersects_aabb(&cones[light as usize], bounds),
                "cluster {cluster} recorded light {light} without an intersection"
            );
        }
    }
}

#[test]
fn packed_texels_round_trip_the_grid() {
    let pipeline = CullPipeline::new(ClusterConfig::default()).unwrap();
    let frame = pipeline.run(Vec3::ZERO, 2048.0, &light_field(128, 35.0));

    let texels = frame.grid.packed_texels().unwrap();
    assert_eq!(texels.len(), frame.grid.len());
    for (cluster, &texel) in texels.iter().enumerate() {
        let (offset, count) = frame.grid.cell(cluster as u32);
        assert_eq!(texel & 0xFFFF, offset);
        assert_eq!(texel >> 16, count);
    }
}

#[test]
fn overflowing_buckets_clamp_identically_in_both_drivers() {
    let config = ClusterConfig {
        max_lights_per_cluster: 3,
        ..Default::default()
    };
    // A pile of identical lights in one coarse-level voxel, far more than
    // the bucket capacity, so every touched cluster overflows and the
    // concurrent rank assignment decides which lights stay below the cap.
    let lights: Vec<_> = (0..24)
        .map(|_| {
            SpotLight {
                position: Vec3::new(400.0, 400.0, 400.0),
                direction: Vec3::new(0.0, -1.0, 0.0),
                ..Default::default()
            }
            .pack()
        })
        .collect();

    let a = CullPipeline::new(config).unwrap().run(Vec3::ZERO, 1024.0, &lights);
    let b = ParallelCullPipeline::with_workers(config, 8)
        .unwrap()
        .run(Vec3::ZERO, 1024.0, &lights);

    // Raw intersection counts are exact in both drivers, so the clamped
    // grids and the drop totals must agree even though the surviving light
    // sets may differ.
    assert!(a.stats.dropped_assignments > 0);
    assert_eq!(a.stats.dropped_assignments, b.stats.dropped_assignments);
    assert_eq!(a.stats.dropped_per_cluster, b.stats.dropped_per_cluster);
    assert_eq!(a.grid.counts(), b.grid.counts());

    for frame in [&a, &b] {
        assert!(frame.grid.counts().iter().all(|&c| c <= 3));
        // Surviving ranks are dense below the cap, so every slot is written.
        assert!(frame.light_index_list.iter().all(|&l| l != u32::MAX));
        assert!(frame
            .light_index_list
            .iter()
            .all(|&l| (l as usize) < lights.len()));
    }
}

#[test]
fn rejected_lights_are_accounted_in_both_drivers() {
    let mut dud = SpotLight::default();
    dud.intensity = Vec3::ZERO;
    let mut lights = light_field(16, 60.0);
    lights.push(dud.pack());
    let dud_index = (lights.len() - 1) as u32;

    let config = ClusterConfig::default();
    let a = CullPipeline::new(config).unwrap().run(Vec3::ZERO, 1024.0, &lights);
    let b = ParallelCullPipeline::with_workers(config, 4)
        .unwrap()
        .run(Vec3::ZERO, 1024.0, &lights);

    for frame in [&a, &b] {
        assert_eq!(frame.stats.light_count, lights.len());
        assert_eq!(frame.stats.rejected_lights.len(), 1);
        assert_eq!(frame.stats.rejected_lights[0].0, dud_index);
    }
}
