//! Swept-sphere tracing.

use nalgebra::{Point3, Vector3};

use crate::config::MAX_TRACE_DISTANCE;
use crate::intersect::sweep_sphere_triangle;
use crate::{Plane3D, PlaneSide};

use super::{Map, NodeRef};

/// Contact reported by [`Map::trace_sphere`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceHit {
    /// Contact point on the surface, or the sphere center for edge and
    /// corner contacts.
    pub point: Point3<f32>,
    /// Unit surface normal, pointing toward the sphere.
    pub normal: Vector3<f32>,
}

impl TraceHit {
    /// Plane through the contact point, facing the sphere.
    pub fn plane(&self) -> Option<Plane3D> {
        Plane3D::from_point_and_normal(self.point, self.normal)
    }
}

/// Outcome of a sphere trace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceResult {
    /// Allowed share of the displacement, in `[0, 1]`.
    pub fraction: f32,
    pub hit: Option<TraceHit>,
}

impl TraceResult {
    /// A trace that moved the whole way.
    pub const CLEAR: Self = Self {
        fraction: 1.0,
        hit: None,
    };

    #[inline]
    pub fn is_hit(&self) -> bool {
        self.hit.is_some()
    }

    /// Sphere center at the end of the allowed movement.
    pub fn end_position(&self, start: Point3<f32>, direction: Vector3<f32>) -> Point3<f32> {
        start + direction * self.fraction
    }
}

/// A sphere swept from `start` to `start + direction`.
#[derive(Debug, Clone, Copy)]
struct SphereTrace {
    start: Point3<f32>,
    direction: Vector3<f32>,
    radius: f32,
}

impl Map {
    /// Sweeps a sphere of `radius` from `start` along `direction`.
    ///
    /// Returns fraction 1.0 with no hit when the whole displacement is free.
    /// Otherwise the fraction is pulled back so the sphere stays
    /// [`CollisionConfig::trace_bias`](crate::CollisionConfig::trace_bias)
    /// away from the surface, and snapped to zero below
    /// [`CollisionConfig::min_fraction`](crate::CollisionConfig::min_fraction).
    pub fn trace_sphere(
        &self,
        start: Point3<f32>,
        direction: Vector3<f32>,
        radius: f32,
    ) -> TraceResult {
        let mut result = TraceResult::CLEAR;
        if let Some(root) = self.root() {
            let trace = SphereTrace {
                start,
                direction,
                radius,
            };
            self.trace_node(&trace, root, &mut result);
        }
        result
    }

    fn trace_node(&self, trace: &SphereTrace, node: NodeRef, result: &mut TraceResult) {
        let index = match node {
            NodeRef::Leaf(leaf) => return self.trace_leaf(trace, leaf, result),
            NodeRef::Node(index) => index,
        };

        let node = &self.nodes[index];
        let plane = self.planes[node.plane as usize];
        let end = trace.start + trace.direction;
        let epsilon = self.config.epsilon;

        let front = plane.shifted(trace.radius);
        if front.classify_point(trace.start, epsilon) == PlaneSide::Front
            && front.classify_point(end, epsilon) == PlaneSide::Front
        {
            return self.trace_node(trace, node.front, result);
        }

        let back = plane.shifted(-trace.radius);
        if back.classify_point(trace.start, epsilon) == PlaneSide::Back
            && back.classify_point(end, epsilon) == PlaneSide::Back
        {
            return self.trace_node(trace, node.back, result);
        }

        let mut front_result = *result;
        let mut back_result = *result;
        self.trace_node(trace, node.front, &mut front_result);
        self.trace_node(trace, node.back, &mut back_result);

        *result = if front_result.fraction < back_result.fraction {
            front_result
        } else {
            back_result
        };
    }

    fn trace_leaf(&self, trace: &SphereTrace, leaf: usize, result: &mut TraceResult) {
        for &triangle in &self.leaves[leaf].triangles {
            let Some(hit) = sweep_sphere_triangle(
                &self.triangle(triangle as usize),
                trace.start,
                trace.radius,
                trace.direction,
                MAX_TRACE_DISTANCE,
            ) else {
                continue;
            };

            let mut fraction = hit.fraction;
            let approach = hit.normal.dot(&trace.direction);
            if approach != 0.0 {
                fraction += self.config.trace_bias / approach;
            }
            if fraction < self.config.min_fraction {
                fraction = 0.0;
            }
            if fraction < result.fraction {
                *result = TraceResult {
                    fraction,
                    hit: Some(TraceHit {
                        point: hit.point,
                        normal: hit.normal,
                    }),
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CollisionConfig, TRACE_BIAS};
    use crate::geometry::{GeometryStore, SourceTriangle};
    use crate::KdTree;
    use approx::assert_relative_eq;

    /// A 4x4 floor at y = 0, facing +Y.
    fn floor() -> Map {
        let geometry = GeometryStore {
            positions: vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.0, 0.0, 4.0),
                Point3::new(4.0, 0.0, 4.0),
                Point3::new(4.0, 0.0, 0.0),
            ],
            triangles: vec![
                SourceTriangle {
                    vertices: [0, 1, 2],
                    tex_coords: [0; 3],
                    texture: 0,
                },
                SourceTriangle {
                    vertices: [0, 2, 3],
                    tex_coords: [0; 3],
                    texture: 0,
                },
            ],
            ..Default::default()
        };
        Map::parse(&KdTree::build(geometry).serialize()).unwrap()
    }

    #[test]
    fn drop_onto_floor_stops_radius_above() {
        let map = floor();
        let start = Point3::new(2.0, 5.0, 1.5);
        let direction = Vector3::new(0.0, -10.0, 0.0);
        let result = map.trace_sphere(start, direction, 1.0);

        let hit = result.hit.unwrap();
        assert_relative_eq!(hit.normal, Vector3::y(), epsilon = 1e-6);
        let end = result.end_position(start, direction);
        assert_relative_eq!(end.y, 1.0, epsilon = TRACE_BIAS + 1e-3);
        assert!(end.y > 1.0);
    }

    #[test]
    fn moving_away_is_clear() {
        let map = floor();
        let result = map.trace_sphere(
            Point3::new(2.0, 2.0, 2.0),
            Vector3::new(0.0, 5.0, 0.0),
            1.0,
        );
        assert_eq!(result, TraceResult::CLEAR);
    }

    #[test]
    fn short_move_above_floor_is_clear() {
        let map = floor();
        let result = map.trace_sphere(
            Point3::new(2.0, 5.0, 2.0),
            Vector3::new(0.0, -2.0, 0.0),
            1.0,
        );
        assert_eq!(result.fraction, 1.0);
        assert!(!result.is_hit());
    }

    #[test]
    fn sliding_past_the_edge_hits_the_rim() {
        let map = floor();
        // Falls just outside the floor; the sphere catches the x = 4 edge.
        let start = Point3::new(4.5, 3.0, 2.0);
        let result = map.trace_sphere(start, Vector3::new(0.0, -4.0, 0.0), 1.0);
        let hit = result.hit.unwrap();
        assert!(hit.normal.x > 0.0 && hit.normal.y > 0.0);
        assert!(result.fraction < 1.0);
    }

    #[test]
    fn contact_at_start_snaps_to_zero() {
        let map = floor();
        let result = map.trace_sphere(
            Point3::new(1.0, 1.001, 3.0),
            Vector3::new(0.0, -1.0, 0.0),
            1.0,
        );
        assert_eq!(result.fraction, 0.0);
        assert!(result.is_hit());
    }

    #[test]
    fn unloaded_map_never_collides() {
        let map = Map::with_config(CollisionConfig::default());
        let result = map.trace_sphere(Point3::origin(), Vector3::new(0.0, -100.0, 0.0), 1.0);
        assert_eq!(result, TraceResult::CLEAR);
    }

    #[test]
    fn hit_plane_faces_the_sphere() {
        let map = floor();
        let result = map.trace_sphere(
            Point3::new(1.0, 3.0, 3.0),
            Vector3::new(0.0, -3.0, 0.0),
            0.5,
        );
        let plane = result.hit.unwrap().plane().unwrap();
        assert_relative_eq!(plane.normal(), Vector3::y(), epsilon = 1e-6);
        assert_relative_eq!(plane.offset(), 0.0, epsilon = 1e-5);
    }
}
