//! Triangle representation for kd-tree building and collision tests.

use nalgebra::Point3;

use crate::{Plane3D, PlaneSide};

/// Classification of a triangle relative to a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriangleSide {
    /// No vertex is behind the plane, at least one is in front
    Front,
    /// No vertex is in front of the plane, at least one is behind
    Back,
    /// All vertices lie on the plane
    Coplanar,
    /// Vertices are on both sides (straddles the plane)
    Split,
}

/// A triangle in 3D space, defined by three vertices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    vertices: [Point3<f32>; 3],
}

impl Triangle {
    /// Creates a new triangle from three points.
    ///
    /// The winding order determines the normal direction via the right-hand rule:
    /// normal = (b - a) × (c - a)
    pub fn new(a: Point3<f32>, b: Point3<f32>, c: Point3<f32>) -> Self {
        Self {
            vertices: [a, b, c],
        }
    }

    /// Returns the three vertices of the triangle.
    #[inline]
    pub fn vertices(&self) -> &[Point3<f32>; 3] {
        &self.vertices
    }

    /// Returns the plane that this triangle lies on, or `None` if it is degenerate.
    pub fn plane(&self) -> Option<Plane3D> {
        let [a, b, c] = self.vertices;
        Plane3D::from_three_points(a, b, c)
    }

    /// Classifies this triangle relative to a plane, using `epsilon` per vertex.
    pub fn classify(&self, plane: &Plane3D, epsilon: f32) -> TriangleSide {
        let mut front = 0;
        let mut back = 0;

        for vertex in &self.vertices {
            match plane.classify_point(*vertex, epsilon) {
                PlaneSide::Front => front += 1,
                PlaneSide::Back => back += 1,
                PlaneSide::OnPlane => {}
            }
        }

        match (front, back) {
            (0, 0) => TriangleSide::Coplanar,
            (_, 0) => TriangleSide::Front,
            (0, _) => TriangleSide::Back,
            _ => TriangleSide::Split,
        }
    }
}
