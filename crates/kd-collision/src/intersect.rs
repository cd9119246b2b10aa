//! Sphere intersection primitives used by the collision queries.
//!
//! All swept tests parameterize the sphere center as `start + t * direction`
//! and report `t` in units of `direction`, so `t = 1` is the end of the sweep.

use nalgebra::{Point3, Vector3};

use crate::Triangle;

/// Contact found by a swept test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepHit {
    /// Sweep parameter at first contact.
    pub fraction: f32,
    /// Surface normal at the contact, pointing toward the sphere.
    pub normal: Vector3<f32>,
    /// Contact point on the face, or sphere center for edge and vertex contacts.
    pub point: Point3<f32>,
}

/// Intersects the ray `start + t * direction` with a sphere.
///
/// Returns the smaller root, which is negative when the ray starts inside
/// the sphere. Tangent rays and zero directions do not intersect.
pub fn ray_sphere(
    start: Point3<f32>,
    direction: Vector3<f32>,
    center: Point3<f32>,
    radius: f32,
) -> Option<f32> {
    let a = direction.norm_squared();
    if a == 0.0 {
        return None;
    }
    let s = start - center;
    let b = direction.dot(&s);
    let c = s.norm_squared() - radius * radius;
    let t = b * b - a * c;
    if t <= 0.0 {
        return None;
    }
    Some(-(b + t.sqrt()) / a)
}

/// Intersects the ray `start + t * direction` with the finite cylinder of
/// `radius` around the segment `edge_start..edge_end`.
///
/// The hit is rejected when it projects outside the segment.
pub fn ray_cylinder(
    start: Point3<f32>,
    direction: Vector3<f32>,
    edge_start: Point3<f32>,
    edge_end: Point3<f32>,
    radius: f32,
) -> Option<f32> {
    let pa = edge_end - edge_start;
    let s0 = start - edge_start;
    let pa_squared = pa.norm_squared();
    if pa_squared == 0.0 {
        return None;
    }
    let pa_inv_squared = 1.0 / pa_squared;

    let pva = direction.dot(&pa);
    let a = direction.norm_squared() - pva * pva * pa_inv_squared;
    let ps0a = s0.dot(&pa);
    let b = s0.dot(&direction) - ps0a * pva * pa_inv_squared;
    let c = s0.norm_squared() - radius * radius - ps0a * ps0a * pa_inv_squared;

    let discriminant = b * b - a * c;
    if discriminant < 0.0 || a == 0.0 {
        return None;
    }
    let fraction = (-b - discriminant.sqrt()) / a;
    let along = (s0 + direction * fraction).dot(&pa);
    (0.0..=pa_squared).contains(&along).then_some(fraction)
}

/// Sweeps a sphere against a triangle.
///
/// The face is tested first: a barycentric hit on the face plane, pushed out
/// by `radius`, is returned immediately. Otherwise the three edge cylinders
/// and the three corner spheres are tested and the nearest non-negative
/// contact below `max_fraction` wins.
pub fn sweep_sphere_triangle(
    triangle: &Triangle,
    start: Point3<f32>,
    radius: f32,
    direction: Vector3<f32>,
    max_fraction: f32,
) -> Option<SweepHit> {
    let [p0, p1, p2] = *triangle.vertices();

    if let Some(plane) = triangle.plane() {
        let pushed = plane.shifted(radius);
        if let Some(t) = pushed.intersect_ray(start, direction).filter(|t| *t >= 0.0) {
            let point = start + direction * t - plane.normal() * radius;

            let r = point - p0;
            let q1 = p1 - p0;
            let q2 = p2 - p0;
            let q1q2 = q1.dot(&q2);
            let q1_squared = q1.norm_squared();
            let q2_squared = q2.norm_squared();
            let inv_det = 1.0 / (q1_squared * q2_squared - q1q2 * q1q2);
            let rq1 = r.dot(&q1);
            let rq2 = r.dot(&q2);
            let w1 = inv_det * (q2_squared * rq1 - q1q2 * rq2);
            let w2 = inv_det * (-q1q2 * rq1 + q1_squared * rq2);

            if w1 >= 0.0 && w2 >= 0.0 && w1 + w2 <= 1.0 {
                return Some(SweepHit {
                    fraction: t,
                    normal: plane.normal(),
                    point,
                });
            }
        }
    }

    let mut best: Option<SweepHit> = None;
    let mut best_fraction = max_fraction;

    for i in 0..3 {
        let from = triangle.vertices()[i];
        let to = triangle.vertices()[(i + 1) % 3];

        let Some(t) = ray_cylinder(start, direction, from, to, radius) else {
            continue;
        };
        if t < 0.0 || t >= best_fraction {
            continue;
        }

        let point = start + direction * t;
        let across = (from - point).cross(&(to - point));
        let Some(normal) = across.cross(&(to - from)).try_normalize(f32::EPSILON) else {
            continue;
        };
        best_fraction = t;
        best = Some(SweepHit {
            fraction: t,
            normal,
            point,
        });
    }

    for vertex in triangle.vertices() {
        let Some(t) = ray_sphere(start, direction, *vertex, radius) else {
            continue;
        };
        if t < 0.0 || t >= best_fraction {
            continue;
        }

        let point = start + direction * t;
        let Some(normal) = (point - vertex).try_normalize(f32::EPSILON) else {
            continue;
        };
        best_fraction = t;
        best = Some(SweepHit {
            fraction: t,
            normal,
            point,
        });
    }

    best
}

/// Tests a static sphere against a triangle.
///
/// Works in sphere-relative coordinates and reports an overlap unless one of
/// the seven separating tests succeeds: the face plane, the three corner
/// regions or the three edge regions.
pub fn sphere_overlaps_triangle(triangle: &Triangle, center: Point3<f32>, radius: f32) -> bool {
    let [oa, ob, oc] = *triangle.vertices();
    let a = oa - center;
    let b = ob - center;
    let c = oc - center;
    let v = (b - a).cross(&(c - a));

    let rr = radius * radius;

    let d = a.dot(&v);
    let e = v.dot(&v);
    let sep_face = d * d > rr * e;

    let aa = a.dot(&a);
    let ab = a.dot(&b);
    let ac = a.dot(&c);
    let bb = b.dot(&b);
    let bc = b.dot(&c);
    let cc = c.dot(&c);

    let sep_a = aa > rr && ab > aa && ac > aa;
    let sep_b = bb > rr && ab > bb && bc > bb;
    let sep_c = cc > rr && ac > cc && bc > cc;

    let edge_ab = b - a;
    let edge_bc = c - b;
    let edge_ca = a - c;

    let e1 = edge_ab.dot(&edge_ab);
    let e2 = edge_bc.dot(&edge_bc);
    let e3 = edge_ca.dot(&edge_ca);

    let q1 = a * e1 - edge_ab * (ab - aa);
    let q2 = b * e2 - edge_bc * (bc - bb);
    let q3 = c * e3 - edge_ca * (ac - cc);

    let sep_ab = q1.dot(&q1) > rr * e1 * e1 && q1.dot(&(c * e1 - q1)) > 0.0;
    let sep_bc = q2.dot(&q2) > rr * e2 * e2 && q2.dot(&(a * e2 - q2)) > 0.0;
    let sep_ca = q3.dot(&q3) > rr * e3 * e3 && q3.dot(&(b * e3 - q3)) > 0.0;

    !(sep_face || sep_a || sep_b || sep_c || sep_ab || sep_bc || sep_ca)
}
