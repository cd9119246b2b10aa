//! Bounding spheres for kd-tree nodes.

use nalgebra::Point3;

/// A conservative sphere around a set of points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Point3<f32>,
    pub radius: f32,
}

impl BoundingSphere {
    pub fn new(center: Point3<f32>, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Computes the sphere enclosing the axis-aligned box of `points`.
    ///
    /// The center is the box center and the radius half the box diagonal.
    /// The box spans only the given points, so it does not grow to include
    /// the origin for geometry placed far from it.
    /// An empty point set yields a zero sphere at the origin.
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = Point3<f32>>,
    {
        let mut points = points.into_iter();
        let Some(first) = points.next() else {
            return Self::new(Point3::origin(), 0.0);
        };

        let (min, max) = points.fold((first, first), |(min, max), p| (min.inf(&p), max.sup(&p)));

        let half = (max - min) * 0.5;
        Self::new(min + half, half.norm())
    }
}
