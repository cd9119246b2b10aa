//! Per-vertex tangent frames (Lengyel's method).

use nalgebra::{Vector3, Vector4};

use crate::config::MATH_EPSILON;
use crate::map::{MapTriangle, MapVertex};

/// Face normal, tangent and bitangent of one triangle.
fn face_basis(vertices: &[MapVertex], triangle: &MapTriangle) -> [Vector3<f32>; 3] {
    let [a, b, c] = triangle.vertices.map(|v| &vertices[v as usize]);
    let q1 = b.position - a.position;
    let q2 = c.position - a.position;
    let normal = q1.cross(&q2);

    let s1 = b.tex_coord.x - a.tex_coord.x;
    let s2 = c.tex_coord.x - a.tex_coord.x;
    let t1 = b.tex_coord.y - a.tex_coord.y;
    let t2 = c.tex_coord.y - a.tex_coord.y;
    let det = s1 * t2 - s2 * t1;
    if det.abs() <= MATH_EPSILON {
        return [normal, Vector3::x(), Vector3::y()];
    }

    let inv = 1.0 / det;
    let tangent = (q1 * t2 - q2 * t1) * inv;
    let bitangent = (q2 * s1 - q1 * s2) * inv;
    [normal, tangent, bitangent]
}

/// Fills in the normal and tangent of every vertex referenced by `triangles`.
///
/// Face normals, tangents and bitangents are summed per vertex. The normal is
/// the normalized sum; the tangent is made orthogonal to it (falling back to
/// +X), and `tangent.w` holds the sign of `(normal x tangent) . bitangent`.
/// A vertex with no usable normal gets +Y.
pub fn generate_tangents(vertices: &mut [MapVertex], triangles: &[MapTriangle]) {
    let mut sums = vec![[Vector3::<f32>::zeros(); 3]; vertices.len()];

    for triangle in triangles {
        let basis = face_basis(vertices, triangle);
        for index in triangle.vertices {
            for (sum, value) in sums[index as usize].iter_mut().zip(&basis) {
                *sum += value;
            }
        }
    }

    for (vertex, [normal, tangent, bitangent]) in vertices.iter_mut().zip(sums) {
        let n = normal.try_normalize(f32::EPSILON).unwrap_or_else(Vector3::y);
        let t = (tangent - n * n.dot(&tangent))
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::x);
        let w = if n.cross(&t).dot(&bitangent) < 0.0 { -1.0 } else { 1.0 };

        vertex.normal = n;
        vertex.tangent = Vector4::new(t.x, t.y, t.z, w);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Point2, Point3};

    fn floor_quad(flip_u: bool) -> (Vec<MapVertex>, Vec<MapTriangle>) {
        let u = |x: f32| if flip_u { 1.0 - x } else { x };
        let vertices = vec![
            MapVertex::new(Point3::new(0.0, 0.0, 0.0), Point2::new(u(0.0), 0.0)),
            MapVertex::new(Point3::new(0.0, 0.0, 1.0), Point2::new(u(0.0), 1.0)),
            MapVertex::new(Point3::new(1.0, 0.0, 1.0), Point2::new(u(1.0), 1.0)),
            MapVertex::new(Point3::new(1.0, 0.0, 0.0), Point2::new(u(1.0), 0.0)),
        ];
        let triangles = vec![
            MapTriangle {
                texture: 0,
                vertices: [0, 1, 2],
            },
            MapTriangle {
                texture: 0,
                vertices: [0, 2, 3],
            },
        ];
        (vertices, triangles)
    }

    #[test]
    fn floor_frame() {
        let (mut vertices, triangles) = floor_quad(false);
        generate_tangents(&mut vertices, &triangles);
        for vertex in &vertices {
            assert_relative_eq!(vertex.normal, Vector3::y(), epsilon = 1e-6);
            assert_relative_eq!(vertex.tangent.xyz(), Vector3::x(), epsilon = 1e-6);
            assert_relative_eq!(vertex.normal.dot(&vertex.tangent.xyz()), 0.0, epsilon = 1e-6);
        }
        // bitangent runs along +Z, opposite to normal x tangent = -Z
        assert_eq!(vertices[0].tangent.w, -1.0);
    }

    #[test]
    fn mirrored_mapping_flips_handedness() {
        let (mut plain, triangles) = floor_quad(false);
        let (mut mirrored, _) = floor_quad(true);
        generate_tangents(&mut plain, &triangles);
        generate_tangents(&mut mirrored, &triangles);
        assert_eq!(plain[0].tangent.w, -mirrored[0].tangent.w);
        assert_relative_eq!(mirrored[0].tangent.xyz(), -Vector3::x(), epsilon = 1e-6);
    }

    #[test]
    fn degenerate_mapping_falls_back_to_x() {
        let (mut vertices, triangles) = floor_quad(false);
        for vertex in &mut vertices {
            vertex.tex_coord = Point2::origin();
        }
        generate_tangents(&mut vertices, &triangles);
        assert_relative_eq!(vertices[0].tangent.xyz(), Vector3::x(), epsilon = 1e-6);
    }

    #[test]
    fn unreferenced_vertex_gets_default_frame() {
        let mut vertices = vec![MapVertex::new(Point3::origin(), Point2::origin())];
        generate_tangents(&mut vertices, &[]);
        assert_eq!(vertices[0].normal, Vector3::y());
        assert_eq!(vertices[0].tangent, Vector4::new(1.0, 0.0, 0.0, 1.0));
    }
}
