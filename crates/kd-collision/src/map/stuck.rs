//! Static sphere queries.

use nalgebra::{Point3, Vector3};

use crate::intersect::sphere_overlaps_triangle;
use crate::PlaneSide;

use super::{Map, NodeRef};

/// Diagonal directions probed by [`Map::try_unstick`].
const UNSTICK_OFFSETS: [[f32; 3]; 8] = [
    [-1.0, 1.0, -1.0],
    [1.0, 1.0, -1.0],
    [1.0, 1.0, 1.0],
    [-1.0, 1.0, 1.0],
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [1.0, -1.0, 1.0],
    [-1.0, -1.0, 1.0],
];

impl Map {
    /// Returns `true` if a sphere at `position` overlaps any triangle.
    pub fn is_sphere_stuck(&self, position: Point3<f32>, radius: f32) -> bool {
        self.root()
            .is_some_and(|root| self.stuck_node(root, position, radius))
    }

    /// Returns every triangle overlapped by a sphere at `position`, ascending
    /// and without duplicates.
    pub fn in_sphere(&self, position: Point3<f32>, radius: f32) -> Vec<u32> {
        let mut found = Vec::new();
        if let Some(root) = self.root() {
            self.collect_node(root, position, radius, &mut found);
        }
        found.sort_unstable();
        found.dedup();
        found
    }

    /// Looks for a free position near a stuck sphere.
    ///
    /// Probes the eight diagonals at one, two and three tenths of `radius`,
    /// nearest ring first, and returns the first position that is not stuck.
    pub fn try_unstick(&self, position: Point3<f32>, radius: f32) -> Option<Point3<f32>> {
        let step = radius * 0.1;
        (1..4)
            .flat_map(|ring| {
                UNSTICK_OFFSETS
                    .iter()
                    .map(move |offset| position + Vector3::from(*offset) * (ring as f32 * step))
            })
            .find(|probe| !self.is_sphere_stuck(*probe, radius))
    }

    /// Children of `node` a static sphere can reach.
    fn reachable(&self, index: usize, position: Point3<f32>, radius: f32) -> [Option<NodeRef>; 2] {
        let node = &self.nodes[index];
        let plane = self.planes[node.plane as usize];
        let epsilon = self.config.epsilon;

        if plane.shifted(radius).classify_point(position, epsilon) == PlaneSide::Front {
            [Some(node.front), None]
        } else if plane.shifted(-radius).classify_point(position, epsilon) == PlaneSide::Back {
            [Some(node.back), None]
        } else {
            [Some(node.front), Some(node.back)]
        }
    }

    fn stuck_node(&self, node: NodeRef, position: Point3<f32>, radius: f32) -> bool {
        match node {
            NodeRef::Leaf(leaf) => self.leaves[leaf].triangles.iter().any(|&triangle| {
                sphere_overlaps_triangle(&self.triangle(triangle as usize), position, radius)
            }),
            NodeRef::Node(index) => self
                .reachable(index, position, radius)
                .into_iter()
                .flatten()
                .any(|child| self.stuck_node(child, position, radius)),
        }
    }

    fn collect_node(
        &self,
        node: NodeRef,
        position: Point3<f32>,
        radius: f32,
        found: &mut Vec<u32>,
    ) {
        match node {
            NodeRef::Leaf(leaf) => found.extend(
                self.leaves[leaf].triangles.iter().copied().filter(|&triangle| {
                    sphere_overlaps_triangle(&self.triangle(triangle as usize), position, radius)
                }),
            ),
            NodeRef::Node(index) => {
                for child in self.reachable(index, position, radius).into_iter().flatten() {
                    self.collect_node(child, position, radius, found);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{GeometryStore, SourceTriangle};
    use crate::KdTree;

    fn make_triangle(store: &mut GeometryStore, corners: [[f32; 3]; 3]) {
        let base = store.positions.len() as u32;
        store.positions.extend(corners.map(Point3::from));
        store.triangles.push(SourceTriangle {
            vertices: [base, base + 1, base + 2],
            tex_coords: [0; 3],
            texture: 0,
        });
    }

    /// A floor at y = 0 and a wall at x = 10, split into many small pieces.
    fn room() -> Map {
        let mut store = GeometryStore::new();
        for i in 0..10 {
            let x = i as f32;
            make_triangle(&mut store, [[x, 0.0, 0.0], [x, 0.0, 4.0], [x + 1.0, 0.0, 4.0]]);
            make_triangle(&mut store, [[x, 0.0, 0.0], [x + 1.0, 0.0, 4.0], [x + 1.0, 0.0, 0.0]]);
        }
        make_triangle(&mut store, [[10.0, 0.0, 0.0], [10.0, 4.0, 0.0], [10.0, 4.0, 4.0]]);
        let tree = KdTree::build(store);
        assert!(tree.node_count() > 1);
        Map::parse(&tree.serialize()).unwrap()
    }

    #[test]
    fn sphere_on_floor_is_stuck() {
        let map = room();
        assert!(map.is_sphere_stuck(Point3::new(5.5, 0.5, 2.0), 1.0));
    }

    #[test]
    fn sphere_above_floor_is_free() {
        let map = room();
        assert!(!map.is_sphere_stuck(Point3::new(5.5, 1.5, 2.0), 1.0));
        assert!(!map.is_sphere_stuck(Point3::new(50.0, 50.0, 50.0), 1.0));
    }

    #[test]
    fn stuck_in_back_subtree_is_found() {
        let map = room();
        // Only the wall and the last floor pieces are near x = 9.8.
        assert!(map.is_sphere_stuck(Point3::new(9.8, 2.0, 1.0), 0.5));
        assert!(map.is_sphere_stuck(Point3::new(0.5, 0.2, 2.0), 0.5));
    }

    #[test]
    fn in_sphere_lists_overlapped_triangles() {
        let map = room();
        let hits = map.in_sphere(Point3::new(2.0, 0.5, 2.0), 0.9);
        assert!(!hits.is_empty());
        assert!(hits.windows(2).all(|w| w[0] < w[1]));
        for &triangle in &hits {
            let x = map.triangle(triangle as usize).vertices()[0].x;
            assert!((0.0..=3.0).contains(&x));
        }
        assert!(map.in_sphere(Point3::new(2.0, 5.0, 2.0), 0.9).is_empty());
    }

    #[test]
    fn unstick_moves_up_out_of_floor() {
        let map = room();
        let position = Point3::new(5.5, 0.95, 2.0);
        assert!(map.is_sphere_stuck(position, 1.0));

        let free = map.try_unstick(position, 1.0).unwrap();
        assert!(!map.is_sphere_stuck(free, 1.0));
        assert!(free.y > position.y);
        assert!((free - position).norm() <= 0.3 * 3f32.sqrt() + 1e-5);
    }

    #[test]
    fn unstick_gives_up_when_buried() {
        let map = room();
        assert!(map.try_unstick(Point3::new(5.5, 0.0, 2.0), 1.0).is_none());
    }

    #[test]
    fn unloaded_map_is_never_stuck() {
        let map = Map::new();
        assert!(!map.is_sphere_stuck(Point3::origin(), 100.0));
        assert!(map.in_sphere(Point3::origin(), 100.0).is_empty());
    }
}
