use veld_geom::{RectXZ, Vec3};
use veld_gpu::{GpuDevice, HeadlessDevice};
use veld_grass::{GrassConfig, GrassMap, GrassMapArtifact, GrassMapError, SourceMesh, bake};

fn cfg(blocks: u32) -> GrassConfig {
    GrassConfig {
        blocks,
        target_tri_area: 1.0,
        ..GrassConfig::default()
    }
}

fn ground(size: f32, y: f32) -> SourceMesh {
    let p = |x: f32, z: f32| Vec3::new(x, y, z);
    SourceMesh::new(
        "ground",
        vec![p(0.0, 0.0), p(0.0, size), p(size, size), p(size, 0.0)],
        vec![Vec3::UP; 4],
        vec![0, 1, 2, 0, 2, 3],
    )
}

/// Closed box with outward faces and flat per-face normals.
fn rock(min: Vec3, max: Vec3) -> Vec<[(Vec3, Vec3); 3]> {
    let c = |x: bool, y: bool, z: bool| {
        Vec3::new(
            if x { max.x } else { min.x },
            if y { max.y } else { min.y },
            if z { max.z } else { min.z },
        )
    };
    let faces = [
        ([c(false, true, false), c(false, true, true), c(true, true, true), c(true, true, false)], Vec3::UP),
        ([c(false, false, false), c(true, false, false), c(true, false, true), c(false, false, true)], -Vec3::UP),
        ([c(true, false, false), c(true, true, false), c(true, true, true), c(true, false, true)], Vec3::new(1.0, 0.0, 0.0)),
        ([c(false, false, false), c(false, false, true), c(false, true, true), c(false, true, false)], Vec3::new(-1.0, 0.0, 0.0)),
        ([c(false, false, true), c(true, false, true), c(true, true, true), c(false, true, true)], Vec3::new(0.0, 0.0, 1.0)),
        ([c(false, false, false), c(false, true, false), c(true, true, false), c(true, false, false)], Vec3::new(0.0, 0.0, -1.0)),
    ];
    let mut out = Vec::new();
    for (q, n) in faces {
        out.push([(q[0], n), (q[1], n), (q[2], n)]);
        out.push([(q[0], n), (q[2], n), (q[3], n)]);
    }
    out
}

// Off-grid extents so no subdivided ground vertex lands on a rock edge.
const ROCK_MIN: Vec3 = Vec3::new(5.3, -1.0, 6.1);
const ROCK_MAX: Vec3 = Vec3::new(10.1, 2.0, 9.77);

fn under_rock(p: [f32; 3], margin: f32) -> bool {
    p[0] > ROCK_MIN.x + margin
        && p[0] < ROCK_MAX.x - margin
        && p[2] > ROCK_MIN.z + margin
        && p[2] < ROCK_MAX.z - margin
}

#[test]
fn baked_blocks_stay_in_their_footprint() {
    let c = cfg(2);
    let a = bake("m", Vec3::ZERO, &[ground(16.0, 0.0)], &c);
    assert!(a.triangle_count() > 0);
    for x in 0..2u32 {
        for z in 0..2u32 {
            let e = a.table[(x + z * 2) as usize];
            assert!(e.count > 0);
            let rect = RectXZ::new(
                x as f32 * 8.0 - 1e-3,
                z as f32 * 8.0 - 1e-3,
                x as f32 * 8.0 + 8.0 + 1e-3,
                z as f32 * 8.0 + 8.0 + 1e-3,
            );
            let range = e.start as usize..(e.start + e.count * 3) as usize;
            for &i in &a.indices[range] {
                let p = a.positions[i as usize];
                assert!(rect.contains(p[0], p[2]), "{:?} escaped block ({}, {})", p, x, z);
            }
        }
    }
}

#[test]
fn blocker_cuts_grass_underneath() {
    let rock = SourceMesh::from_corners("rock", rock(ROCK_MIN, ROCK_MAX))
        .spawning(false)
        .blocking(true);
    let a = bake("m", Vec3::ZERO, &[ground(16.0, 0.0), rock], &cfg(2));
    assert!(a.triangle_count() > 0);
    for p in &a.positions {
        assert!(!under_rock(*p, 0.01), "grass vertex {:?} under the rock", p);
    }
}

#[test]
fn blocker_keeps_grass_on_its_own_surface() {
    // Ground and rock in one mesh: the mesh never occludes itself
    let mut corners = rock(ROCK_MIN, ROCK_MAX);
    let g = ground(16.0, 0.0);
    for t in g.triangles() {
        corners.push([
            (t.a.position, t.a.normal),
            (t.b.position, t.b.normal),
            (t.c.position, t.c.normal),
        ]);
    }
    let both = SourceMesh::from_corners("hill", corners).blocking(true);
    let a = bake("m", Vec3::ZERO, &[both], &cfg(2));
    assert!(a.positions.iter().any(|p| p[1] == 0.0 && under_rock(*p, 0.5)));
    // Rock top is flat and grows grass too
    assert!(a.positions.iter().any(|p| p[1] == 2.0));
    let top = a.table.iter().map(|e| e.max_height).fold(f32::MIN, f32::max);
    assert_eq!(top, 2.0);
}

#[test]
fn steep_only_meshes_bake_nothing() {
    let wall = SourceMesh::new(
        "wall",
        vec![
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(1.0, 4.0, 1.0),
            Vec3::new(1.0, 0.0, 7.0),
        ],
        vec![Vec3::new(1.0, 0.0, 0.0); 3],
        vec![0, 1, 2],
    );
    let map = GrassMap::bake("wall", Vec3::ZERO, &[wall], &cfg(2));
    assert_eq!(map.artifact().triangle_count(), 0);
    assert!(map.artifact().table.iter().all(|e| e.count == 0));

    let mut device = HeadlessDevice::new();
    let mut map = map;
    assert!(matches!(map.init_buffers(&mut device), Err(GrassMapError::Empty)));
    assert_eq!(device.stats().live_buffers, 0);
}

#[test]
fn map_buffers_upload_and_release() {
    let mut device = HeadlessDevice::new();
    let mut map = GrassMap::bake("m", Vec3::ZERO, &[ground(8.0, 0.0)], &cfg(1));
    map.init_buffers(&mut device).unwrap();
    assert!(map.buffers_initialized());
    assert_eq!(device.stats().live_buffers, 3);
    // Second init is a no-op
    map.init_buffers(&mut device).unwrap();
    assert_eq!(device.stats().created, 3);

    let b = map.buffers().unwrap();
    let idx: Vec<u32> = veld_gpu::read_slice(&device, &b.triangles).unwrap();
    assert_eq!(idx, map.artifact().indices);

    map.release_buffers(&mut device);
    assert_eq!(device.stats().live_buffers, 0);
}

#[test]
fn artifact_survives_disk() {
    let a = bake("disk", Vec3::new(-8.0, 0.0, -8.0), &[ground(16.0, 0.5)], &cfg(2));
    let path = std::env::temp_dir().join(format!("veld-grass-{}.bin", std::process::id()));
    a.save(&path).unwrap();
    let back = GrassMapArtifact::load(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(back, a);

    let map = GrassMap::new(back);
    assert!(map.contains_xz(Vec3::new(-4.0, 0.0, 7.0)));
    assert!(!map.contains_xz(Vec3::new(9.0, 0.0, 0.0)));
    let e = map.block_properties(Vec3::new(-4.0, 0.0, -4.0));
    assert_eq!(e, a.table[0]);
}

#[test]
fn corrupt_artifact_is_a_decode_error() {
    let err = GrassMapArtifact::from_bytes(&[1, 2, 3]).unwrap_err();
    assert!(matches!(err, GrassMapError::Decode(_)));
    let missing = std::env::temp_dir().join("veld-grass-does-not-exist.bin");
    assert!(matches!(GrassMapArtifact::load(&missing), Err(GrassMapError::Io(_))));
}
