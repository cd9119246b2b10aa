//! Plane representation and operations for kd-trees and collision tests.

use nalgebra::{Point3, Vector3};

use crate::config::MATH_EPSILON;

/// Which side of a plane a point lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneSide {
    /// Point is in front of the plane (positive side of normal)
    Front,
    /// Point is behind the plane (negative side of normal)
    Back,
    /// Point lies on the plane (within epsilon tolerance)
    OnPlane,
}

/// One of the three basis axes. Split planes are always perpendicular to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// All axes in tag order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// The axis for a wire tag (0, 1 or 2).
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// The wire tag of this axis.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The unit basis vector along this axis.
    #[inline]
    pub fn unit(self) -> Vector3<f32> {
        match self {
            Axis::X => Vector3::x(),
            Axis::Y => Vector3::y(),
            Axis::Z => Vector3::z(),
        }
    }
}

/// A plane in 3D space, represented as `normal · point = offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane3D {
    normal: Vector3<f32>,
    offset: f32,
}

impl Plane3D {
    /// Creates the plane perpendicular to `axis` at distance `offset` from the origin.
    pub fn axis_aligned(axis: Axis, offset: f32) -> Self {
        Self {
            normal: axis.unit(),
            offset,
        }
    }

    /// Creates a plane from a point on the plane and a normal vector.
    ///
    /// Returns `None` if the normal has (near) zero length.
    pub fn from_point_and_normal(point: Point3<f32>, normal: Vector3<f32>) -> Option<Self> {
        let unit_normal = normal.try_normalize(f32::EPSILON)?;
        Some(Self {
            normal: unit_normal,
            offset: unit_normal.dot(&point.coords),
        })
    }

    /// Creates a plane from three points.
    /// The normal direction follows the right-hand rule: (b - a) × (c - a).
    ///
    /// Returns `None` if the points are collinear (or nearly so).
    pub fn from_three_points(a: Point3<f32>, b: Point3<f32>, c: Point3<f32>) -> Option<Self> {
        Self::from_point_and_normal(a, (b - a).cross(&(c - a)))
    }

    /// Returns the unit normal vector of the plane.
    #[inline]
    pub fn normal(&self) -> Vector3<f32> {
        self.normal
    }

    /// Returns the signed distance from the origin to the plane along the normal.
    #[inline]
    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// Returns the same plane moved `delta` along its normal.
    #[inline]
    pub fn shifted(&self, delta: f32) -> Self {
        Self {
            normal: self.normal,
            offset: self.offset + delta,
        }
    }

    /// Computes the signed distance from a point to the plane.
    /// - Positive: point is in front (same side as normal)
    /// - Negative: point is behind (opposite side from normal)
    /// - Zero: point is on the plane
    #[inline]
    pub fn signed_distance(&self, point: Point3<f32>) -> f32 {
        self.normal.dot(&point.coords) - self.offset
    }

    /// Classifies which side of the plane a point lies on, with the given tolerance.
    pub fn classify_point(&self, point: Point3<f32>, epsilon: f32) -> PlaneSide {
        let dist = self.signed_distance(point);
        if dist > epsilon {
            PlaneSide::Front
        } else if dist < -epsilon {
            PlaneSide::Back
        } else {
            PlaneSide::OnPlane
        }
    }

    /// Intersects the ray `origin + t * direction` with the plane.
    ///
    /// Returns the unbounded parameter `t`, which may be negative, or `None`
    /// if the ray is parallel to the plane.
    pub fn intersect_ray(&self, origin: Point3<f32>, direction: Vector3<f32>) -> Option<f32> {
        let denom = self.normal.dot(&direction);

        if denom.abs() < MATH_EPSILON {
            return None;
        }

        Some(-self.signed_distance(origin) / denom)
    }
}
