//! End-to-end: text geometry to compiled map to collision queries.

use std::collections::BTreeSet;

use approx::assert_relative_eq;
use kd_collision::import::parse_geometry;
use kd_collision::{
    clip_velocity, CollisionConfig, KdTree, LoadError, Map, NodeRef, OVER_CLIP, TRACE_BIAS,
};
use nalgebra::{Point3, Vector3};

/// An 8x8 floor at y = 0 made of 2x2 tiles, and a wall at x = 8 facing -X.
fn room_source() -> String {
    let mut source = String::from("# test room\ng floor\n");
    let mut vertex = 0;
    for ix in 0..4 {
        for iz in 0..4 {
            let (x, z) = (ix as f32 * 2.0, iz as f32 * 2.0);
            source += &format!("v {} 0 {}\n", x, z);
            source += &format!("v {} 0 {}\n", x, z + 2.0);
            source += &format!("v {} 0 {}\n", x + 2.0, z + 2.0);
            source += &format!("v {} 0 {}\n", x + 2.0, z);
            source += &format!(
                "f {a}/1 {b}/2 {c}/3\nf {a}/1/1 {c}/3/3 {d}/4/4\n",
                a = vertex + 1,
                b = vertex + 2,
                c = vertex + 3,
                d = vertex + 4
            );
            vertex += 4;
        }
    }
    source += "vt 0 0\nvt 0 1\nvt 1 1\nvt 1 0\n";
    source += "g wall\n";
    source += "v 8 0 0\nv 8 4 4\nv 8 4 0\nv 8 0 4\n";
    source += &format!(
        "f {a}/1 {b}/3 {c}/4\nf {a}/1 {d}/2 {b}/3\n",
        a = vertex + 1,
        b = vertex + 2,
        c = vertex + 3,
        d = vertex + 4
    );
    source += "ent 1 4 1 4 0 0 0 1\n";
    source
}

fn room_tree() -> KdTree {
    KdTree::build(parse_geometry(&room_source()).unwrap())
}

fn room_map() -> Map {
    Map::load(&room_tree().compile().unwrap()).unwrap()
}

#[test]
fn tree_covers_every_triangle() {
    let tree = room_tree();
    assert_eq!(tree.geometry().triangles.len(), 34);
    assert_eq!(tree.texture_count(), 2);
    assert!(tree.node_count() > tree.leaf_count());
    assert!(tree.depth() >= 2);

    let referenced: BTreeSet<u32> = tree.leaves().flatten().copied().collect();
    assert_eq!(referenced, (0..34).collect());
}

#[test]
fn compiled_map_round_trips_geometry() {
    let tree = room_tree();
    let map = Map::load(&tree.compile().unwrap()).unwrap();

    assert_eq!(map.triangles().len(), 34);
    assert_eq!(map.textures(), &["floor".to_owned(), "wall".to_owned()]);
    assert_eq!(map.entities().len(), 1);
    assert_eq!(map.entities()[0].origin, Point3::new(4.0, 1.0, 4.0));

    // Corners weld within a tile but not across tiles, whose texture
    // coordinates differ at the shared corners.
    assert_eq!(map.vertices().len(), 16 * 4 + 4);

    for index in 0..34 {
        assert_eq!(map.triangle(index), tree.geometry().triangle(index));
    }
    for vertex in map.vertices() {
        assert_relative_eq!(vertex.normal.norm(), 1.0, epsilon = 1e-5);
        assert!(vertex.tangent.w == 1.0 || vertex.tangent.w == -1.0);
    }
}

#[test]
fn child_references_are_in_range() {
    let map = room_map();
    assert!(map.nodes().len() > 1);
    for node in map.nodes() {
        for child in [node.front, node.back] {
            match child {
                NodeRef::Node(index) => assert!(index < map.nodes().len()),
                NodeRef::Leaf(index) => assert!(index < map.leaves().len()),
            }
        }
    }
}

#[test]
fn sphere_dropped_on_floor_rests_radius_above() {
    let map = room_map();
    let start = Point3::new(3.0, 6.0, 5.5);
    let direction = Vector3::new(0.0, -12.0, 0.0);
    let radius = 0.75;

    let trace = map.trace_sphere(start, direction, radius);
    let hit = trace.hit.expect("floor hit");
    assert_relative_eq!(hit.normal, Vector3::y(), epsilon = 1e-5);

    let end = trace.end_position(start, direction);
    assert_relative_eq!(end.y, radius, epsilon = TRACE_BIAS + 1e-3);
    assert!(!map.is_sphere_stuck(end, radius));
}

#[test]
fn sphere_moving_into_wall_stops_in_front_of_it() {
    let map = room_map();
    let start = Point3::new(5.0, 2.0, 1.0);
    let direction = Vector3::new(4.0, 0.0, 0.0);

    let trace = map.trace_sphere(start, direction, 0.5);
    let hit = trace.hit.expect("wall hit");
    assert_relative_eq!(hit.normal, -Vector3::x(), epsilon = 1e-5);
    let end = trace.end_position(start, direction);
    assert!(end.x < 7.5);
    assert_relative_eq!(end.x, 7.5, epsilon = TRACE_BIAS + 1e-3);
}

#[test]
fn sphere_moving_away_is_unobstructed() {
    let map = room_map();
    let trace = map.trace_sphere(Point3::new(4.0, 2.0, 4.0), Vector3::new(0.0, 10.0, 0.0), 1.0);
    assert_eq!(trace.fraction, 1.0);
    assert!(trace.hit.is_none());
}

#[test]
fn stuck_test_follows_the_triangles() {
    let map = room_map();
    assert!(map.is_sphere_stuck(Point3::new(1.0, 0.5, 7.0), 1.0));
    assert!(map.is_sphere_stuck(Point3::new(7.6, 2.0, 2.0), 0.5));
    assert!(!map.is_sphere_stuck(Point3::new(1.0, 1.5, 7.0), 1.0));
    assert!(!map.is_sphere_stuck(Point3::new(30.0, 30.0, 30.0), 1.0));

    let overlapped = map.in_sphere(Point3::new(7.6, 2.0, 2.0), 0.5);
    let wall: Vec<u32> = overlapped.into_iter().filter(|&t| t >= 32).collect();
    assert!(!wall.is_empty());
}

#[test]
fn unstick_finds_free_space_above_the_floor() {
    let map = room_map();
    let buried = Point3::new(3.0, 0.9, 3.0);
    assert!(map.is_sphere_stuck(buried, 1.0));
    let free = map.try_unstick(buried, 1.0).expect("free position");
    assert!(!map.is_sphere_stuck(free, 1.0));
}

#[test]
fn slide_response() {
    let into_floor = clip_velocity(Vector3::new(0.0, -3.0, 0.0), Vector3::y(), 1.0);
    assert_eq!(into_floor, Vector3::zeros());

    let along_floor = Vector3::new(2.0, 0.0, -1.5);
    assert_relative_eq!(clip_velocity(along_floor, Vector3::y(), OVER_CLIP), along_floor);
}

#[test]
fn tunables_from_toml_reach_queries() {
    let config = CollisionConfig::from_toml_str("stop_epsilon = 2.5\n").unwrap();
    let map = Map::load_with_config(&room_tree().compile().unwrap(), config).unwrap();
    let out = map.clip_velocity(Vector3::new(2.0, 0.0, 3.0), Vector3::y(), OVER_CLIP);
    assert_eq!(out, Vector3::new(0.0, 0.0, 3.0));
}

#[test]
fn corrupted_maps_are_rejected() {
    let compiled = room_tree().compile().unwrap();

    let truncated = &compiled[..compiled.len() / 2];
    assert!(Map::load(truncated).is_err());

    let mut flipped = compiled.clone();
    let middle = flipped.len() / 2;
    flipped[middle] ^= 0xff;
    assert!(Map::load(&flipped).is_err());

    let mut raw = room_tree().serialize();
    raw.truncate(raw.len() - 4);
    assert!(matches!(Map::parse(&raw), Err(LoadError::Truncated { .. })));
}
