//! Randomized invariants over clipping, transforms, depth testing, parallel
//! rendering, LOD selection and spatial indices.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use termray::camera::Camera;
use termray::core::{EngineConfig, IdGenerator, RenderMode};
use termray::geometry::{Mesh, Triangle};
use termray::lod::{LodGroup, LodLevel, TransitionMode};
use termray::material::Material;
use termray::math::{self, Aabb, Euler, Matrix4, Rgb, Vector3};
use termray::render::{clip_triangle, ClipVertex, Renderer, SoftwareRenderer};
use termray::scene::{Scene, SceneNode, Transform};
use termray::spatial::{Bvh, Octree, OctreeConfig, SpatialEntry, SpatialIndex};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

const CASES: usize = 200;

fn vec3(rng: &mut StdRng, lo: f64, hi: f64) -> Vector3 {
    Vector3::new(rng.gen_range(lo..hi), rng.gen_range(lo..hi), rng.gen_range(lo..hi))
}

fn area(points: &[Vector3]) -> f64 {
    points
        .windows(2)
        .skip(1)
        .map(|w| math::Triangle::new(points[0], w[0], w[1]).area())
        .sum()
}

/// Reference polygon clip against `z >= near`.
fn clip_polygon(points: &[Vector3], near: f64) -> Vec<Vector3> {
    let mut out = Vec::new();
    for (i, a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        let (ina, inb) = (a.z >= near, b.z >= near);
        if ina {
            out.push(*a);
        }
        if ina != inb {
            let t = (near - a.z) / (b.z - a.z);
            out.push(a.lerp(&b, t));
        }
    }
    out
}

#[test]
fn clipping_preserves_front_area() {
    let mut rng = StdRng::seed_from_u64(1);
    let near = 1.0;
    for _ in 0..CASES {
        let points = [vec3(&mut rng, -3.0, 3.0), vec3(&mut rng, -3.0, 3.0), vec3(&mut rng, -3.0, 3.0)];
        let out = clip_triangle(points.map(ClipVertex::new), near);
        let behind = points.iter().filter(|p| p.z < near).count();

        match behind {
            3 => assert!(out.is_empty()),
            0 => assert_eq!(out.as_slice(), &[points.map(ClipVertex::new)]),
            _ => {
                assert!(matches!(out.len(), 1 | 2));
                let pieces: f64 = out
                    .as_slice()
                    .iter()
                    .map(|t| math::Triangle::new(t[0].position, t[1].position, t[2].position).area())
                    .sum();
                let expected = area(&clip_polygon(&points, near));
                assert!((pieces - expected).abs() < 1e-9 * (1.0 + expected), "{} vs {}", pieces, expected);
                for v in out.as_slice().iter().flatten() {
                    assert!(v.position.z >= near - 1e-9);
                }
            }
        }
    }
}

#[test]
fn transforms_invert() {
    let mut rng = StdRng::seed_from_u64(2);
    for _ in 0..CASES {
        let scale = Vector3::new(
            rng.gen_range(0.2..3.0) * if rng.gen() { 1.0 } else { -1.0 },
            rng.gen_range(0.2..3.0),
            rng.gen_range(0.2..3.0),
        );
        let rotation = Euler::new(rng.gen_range(-3.0..3.0), rng.gen_range(-3.0..3.0), rng.gen_range(-3.0..3.0));
        let mut transform = Transform::from_components(vec3(&mut rng, -10.0, 10.0), rotation, scale);
        let parent = Matrix4::compose(&vec3(&mut rng, -5.0, 5.0), &Euler::new(0.3, -0.7, 1.1), &Vector3::ONE);
        transform.set_parent_world(parent);

        let p = vec3(&mut rng, -20.0, 20.0);
        let world = transform.transform_point(&p);
        let back = transform.inverse_transform_point(&world);
        assert!(back.approx_eq(&p, 1e-9), "{:?} -> {:?}", p, back);
    }
}

fn overlapping(z: f64, color: Rgb) -> Triangle {
    Triangle::new(
        Vector3::new(-2.0, -2.0, z),
        Vector3::new(2.0, -2.0, z),
        Vector3::new(0.0, 2.0, z),
        Arc::new(Material::new(color).with_double_sided(true)),
    )
}

fn draw(triangles: &[&Triangle]) -> SoftwareRenderer {
    let camera = Camera::new(90.0, 90.0, 0.1, 100.0)
        .unwrap()
        .looking_at(Vector3::new(0.0, 0.0, -5.0), Vector3::ZERO);
    let mut renderer = SoftwareRenderer::headless(EngineConfig::new(10, 10).with_color(true)).unwrap();
    renderer.initialize().unwrap();
    renderer.begin_frame();
    for tri in triangles {
        renderer.render_triangle(tri, &Matrix4::IDENTITY, &camera);
    }
    renderer.end_frame();
    renderer
}

#[test]
fn depth_test_keeps_nearest() {
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..20 {
        let (za, zb) = (rng.gen_range(-3.0..3.0), rng.gen_range(-3.0..3.0));
        let a = overlapping(za, Rgb::new(255, 0, 0));
        let b = overlapping(zb, Rgb::new(0, 0, 255));
        let (near, near_z) = if zb < za { (&b, zb) } else { (&a, za) };
        let alone = draw(&[near]);

        for order in [[&a, &b], [&b, &a]] {
            let both = draw(&order);
            let fb = both.framebuffer();
            let depth = fb.depth_at(5, 5).unwrap();
            assert!((depth - (near_z + 5.0)).abs() < 1e-9);
            if za != zb {
                assert_eq!(fb.cell(5, 5), alone.framebuffer().cell(5, 5));
            }
        }
    }
}

fn random_scene(seed: u64, count: usize) -> Scene {
    let mut rng = StdRng::seed_from_u64(seed);
    let camera = Camera::new(80.0, 60.0, 0.5, 50.0)
        .unwrap()
        .looking_at(Vector3::new(0.0, 1.0, -8.0), Vector3::ZERO);
    let mut scene = Scene::new().with_camera(camera);
    for i in 0..count {
        let center = vec3(&mut rng, -6.0, 6.0);
        let (a, b, c) = (
            center + vec3(&mut rng, -2.0, 2.0),
            center + vec3(&mut rng, -2.0, 2.0),
            center + vec3(&mut rng, -2.0, 2.0),
        );
        let material = Material::new(Rgb::new(rng.gen(), rng.gen(), rng.gen())).with_double_sided(rng.gen());
        let tri = Triangle::new(a, b, c, Arc::new(material));
        scene.add_node(SceneNode::new(format!("t{}", i)).with_payload(tri), None).unwrap();
    }
    scene
}

fn render(config: EngineConfig, seed: u64) -> Vec<termray::render::Cell> {
    let mut scene = random_scene(seed, 40);
    let mut renderer = SoftwareRenderer::headless(config).unwrap();
    renderer.initialize().unwrap();
    renderer.begin_frame();
    renderer.render_scene(&mut scene);
    renderer.end_frame();
    renderer.framebuffer().cells().to_vec()
}

#[test]
fn parallel_modes_match_single_thread() {
    init_logging();
    let mut rng = StdRng::seed_from_u64(4);
    for seed in 0..6 {
        let base = EngineConfig::new(rng.gen_range(20..90), rng.gen_range(10..50)).with_color(seed % 2 == 0);
        let expected = render(base.clone(), seed);
        for mode in [RenderMode::ParallelTiles, RenderMode::ParallelJobs, RenderMode::ParallelBatched] {
            let config = base
                .clone()
                .with_render_mode(mode)
                .with_workers(rng.gen_range(1..6))
                .with_tile_size(rng.gen_range(1..20))
                .with_batch_size(rng.gen_range(1..8));
            assert_eq!(render(config.clone(), seed), expected, "seed {} {:?}", seed, config);
        }
    }
}

/// Random triangles plus LOD groups frozen partway through a level switch.
fn transitioning_scene(seed: u64) -> Scene {
    let mut scene = random_scene(seed, 15);
    let mut rng = StdRng::seed_from_u64(seed ^ 0x10d);
    let modes = [TransitionMode::Fade, TransitionMode::CrossFade, TransitionMode::Morph];
    for i in 0..6 {
        let color = |rng: &mut StdRng| Arc::new(Material::new(Rgb::new(rng.gen(), rng.gen(), rng.gen())));
        let outgoing = Mesh::cube(rng.gen_range(0.5..6.0), color(&mut rng));
        let incoming = Mesh::cube(rng.gen_range(0.5..6.0), color(&mut rng));
        // Any camera distance past the first threshold keeps the second level.
        let mut group = LodGroup::new(vec![LodLevel::new(outgoing, 1e-3, 0.0), LodLevel::new(incoming, 1e6, 0.0)])
            .with_transition(modes[i % modes.len()], 1.0);
        group.select_by_distance(0.0);
        group.select_by_distance(1.0);
        group.update(rng.gen_range(0.05..0.95));
        let node = SceneNode::new(format!("lod{}", i))
            .with_payload(group)
            .with_transform(Transform::from_position(vec3(&mut rng, -4.0, 4.0)));
        scene.add_node(node, None).unwrap();
    }
    scene
}

#[test]
fn parallel_modes_match_single_thread_during_lod_transitions() {
    init_logging();
    let mut rng = StdRng::seed_from_u64(8);
    for seed in 0..6 {
        let base = EngineConfig::new(rng.gen_range(20..80), rng.gen_range(10..40)).with_color(true);
        let render = |config: EngineConfig| {
            let mut scene = transitioning_scene(seed);
            let mut renderer = SoftwareRenderer::headless(config).unwrap();
            renderer.initialize().unwrap();
            renderer.begin_frame();
            renderer.render_scene(&mut scene);
            renderer.end_frame();
            renderer.framebuffer().cells().to_vec()
        };
        let expected = render(base.clone());
        for mode in [RenderMode::ParallelTiles, RenderMode::ParallelJobs, RenderMode::ParallelBatched] {
            let config = base
                .clone()
                .with_render_mode(mode)
                .with_workers(rng.gen_range(2..6))
                .with_tile_size(rng.gen_range(1..12))
                .with_batch_size(rng.gen_range(1..4));
            assert_eq!(render(config.clone()), expected, "seed {} {:?}", seed, config);
        }
    }
}

#[test]
fn lod_level_held_inside_band() {
    let mut rng = StdRng::seed_from_u64(5);
    let material = Arc::new(Material::default());
    for _ in 0..CASES {
        let h = rng.gen_range(0.5..4.0);
        let mut group = LodGroup::new(
            [8.0, 20.0, 45.0, 90.0]
                .iter()
                .map(|d| LodLevel::new(Mesh::cube(1.0, material.clone()), *d, 0.0))
                .collect(),
        )
        .with_hysteresis(h);
        let d = rng.gen_range(0.0..120.0);
        let k = group.select_by_distance(d);
        for _ in 0..10 {
            let sample = d + rng.gen_range(-h..h) * 0.999;
            assert_eq!(group.select_by_distance(sample), k, "chosen at {}, sample {}, band {}", d, sample, h);
        }
    }
}

fn random_entries(rng: &mut StdRng, count: usize) -> Vec<SpatialEntry> {
    let ids = IdGenerator::new();
    (0..count)
        .map(|_| {
            let min = vec3(rng, -50.0, 50.0);
            let size = vec3(rng, 0.0, 6.0);
            SpatialEntry::new(ids.next_id(), Aabb::new(min, min + size))
        })
        .collect()
}

#[test]
fn spatial_queries_have_no_false_negatives() {
    init_logging();
    let mut rng = StdRng::seed_from_u64(6);
    let entries = random_entries(&mut rng, 300);
    let octree = Octree::build(&entries, OctreeConfig::default());
    let bvh = Bvh::build(&entries);
    let indices: [&dyn SpatialIndex; 2] = [&octree, &bvh];

    for _ in 0..CASES {
        let min = vec3(&mut rng, -60.0, 60.0);
        let query = Aabb::new(min, min + vec3(&mut rng, 0.0, 20.0));
        for index in indices {
            let found = index.query_aabb(&query);
            for entry in entries.iter().filter(|e| e.bounds.intersects_box(&query)) {
                assert!(found.contains(&entry.id));
            }
        }
    }
}

#[test]
fn bvh_root_split_close_to_best_candidate() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..20 {
        let count = rng.gen_range(2..120);
        let entries = random_entries(&mut rng, count);
        let bvh = Bvh::build(&entries);
        let best = Bvh::evaluate_splits(&entries)
            .iter()
            .map(|c| c.cost)
            .min_by(f64::total_cmp);
        if let (Some(best), Some(cost)) = (best, bvh.split_cost()) {
            assert!(cost <= 2.0 * best + 1e-9, "{} vs best {}", cost, best);
        }
    }
}
