//! Split plane selection strategies for kd-tree construction.
//!
//! The choice of split plane decides how balanced the tree is and how many
//! straddling triangles end up duplicated into both children.

use crate::geometry::GeometryStore;
use crate::{Axis, Plane3D, TriangleSide};

/// Triangle partition produced by one candidate split plane.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisSplit {
    pub axis: Axis,
    pub offset: f32,
    /// Triangles entirely in front of the plane
    pub front: Vec<u32>,
    /// Triangles entirely behind the plane
    pub back: Vec<u32>,
    /// Triangles straddling or lying on the plane
    pub split: Vec<u32>,
}

impl AxisSplit {
    /// Partitions `triangles` by the plane perpendicular to `axis` at `offset`.
    pub fn partition(
        geometry: &GeometryStore,
        triangles: &[u32],
        axis: Axis,
        offset: f32,
        epsilon: f32,
    ) -> Self {
        let plane = Plane3D::axis_aligned(axis, offset);
        let mut result = Self {
            axis,
            offset,
            front: Vec::new(),
            back: Vec::new(),
            split: Vec::new(),
        };

        for &index in triangles {
            match geometry.triangle(index as usize).classify(&plane, epsilon) {
                TriangleSide::Front => result.front.push(index),
                TriangleSide::Back => result.back.push(index),
                TriangleSide::Coplanar | TriangleSide::Split => result.split.push(index),
            }
        }

        result
    }

    /// Ratio of the smaller to the larger side, 1.0 when perfectly balanced.
    pub fn balance(&self) -> f32 {
        let (front, back) = (self.front.len(), self.back.len());
        let larger = front.max(back);
        if larger == 0 {
            return 0.0;
        }
        front.min(back) as f32 / larger as f32
    }
}

/// Strategy for choosing the split of a node.
pub trait SplitSelector {
    /// Chooses a split for `triangles` at recursion `depth`.
    ///
    /// `triangles` is never empty.
    fn select(
        &self,
        geometry: &GeometryStore,
        triangles: &[u32],
        depth: usize,
        epsilon: f32,
    ) -> AxisSplit;
}

/// Splits at the median vertex coordinate, on the axis giving the best balance.
///
/// The median keeps the split robust against outlying vertices. When no axis
/// separates anything, the axis cycles with depth.
#[derive(Debug, Clone, Copy, Default)]
pub struct MedianSplit;

impl MedianSplit {
    /// Median of every referenced vertex coordinate along `axis`.
    pub fn median(geometry: &GeometryStore, triangles: &[u32], axis: Axis) -> f32 {
        let mut coords: Vec<f32> = triangles
            .iter()
            .flat_map(|&index| {
                geometry
                    .triangle(index as usize)
                    .vertices()
                    .map(|v| v[axis.index()])
            })
            .collect();
        if coords.is_empty() {
            return 0.0;
        }
        coords.sort_unstable_by(f32::total_cmp);
        coords[coords.len() / 2]
    }
}

impl SplitSelector for MedianSplit {
    fn select(
        &self,
        geometry: &GeometryStore,
        triangles: &[u32],
        depth: usize,
        epsilon: f32,
    ) -> AxisSplit {
        let mut candidates: Vec<AxisSplit> = Axis::ALL
            .into_iter()
            .map(|axis| {
                let offset = Self::median(geometry, triangles, axis);
                AxisSplit::partition(geometry, triangles, axis, offset, epsilon)
            })
            .collect();

        let mut best = depth % 3;
        let mut best_ratio = 0.0;
        for (i, candidate) in candidates.iter().enumerate() {
            let ratio = candidate.balance();
            if ratio > best_ratio {
                best = i;
                best_ratio = ratio;
            }
        }

        candidates.swap_remove(best)
    }
}
