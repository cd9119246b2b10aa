//! Kd-tree node implementation.

use crate::{Axis, BoundingSphere, Plane3D};

/// Index of a node in a [`KdTree`](super::KdTree) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Position of the node in [`KdTree::nodes`](super::KdTree::nodes).
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A node in the kd-tree.
///
/// A missing child (`None`) marks a subtree that was abandoned during
/// building; it carries no collision geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum KdNode {
    /// Splits space with the plane perpendicular to `axis` at `offset`.
    Internal {
        axis: Axis,
        offset: f32,
        sphere: BoundingSphere,
        /// Subtree on the positive side of the plane
        front: Option<NodeId>,
        /// Subtree on the negative side of the plane
        back: Option<NodeId>,
    },
    /// Terminal node listing triangle indices.
    Leaf {
        triangles: Vec<u32>,
        sphere: BoundingSphere,
    },
}

impl KdNode {
    /// Checks if this node is a leaf.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self, KdNode::Leaf { .. })
    }

    /// Returns the bounding sphere of everything below this node.
    #[inline]
    pub fn sphere(&self) -> &BoundingSphere {
        match self {
            KdNode::Internal { sphere, .. } | KdNode::Leaf { sphere, .. } => sphere,
        }
    }

    /// Returns the split plane of an internal node.
    pub fn plane(&self) -> Option<Plane3D> {
        match self {
            KdNode::Internal { axis, offset, .. } => Some(Plane3D::axis_aligned(*axis, *offset)),
            KdNode::Leaf { .. } => None,
        }
    }

    /// Returns the triangle indices of a leaf (empty for internal nodes).
    pub fn triangles(&self) -> &[u32] {
        match self {
            KdNode::Leaf { triangles, .. } => triangles,
            KdNode::Internal { .. } => &[],
        }
    }
}
