//! Kd-tree container and construction.

use log::{debug, warn};
use nalgebra::Point3;

use crate::config::BuildConfig;
use crate::geometry::GeometryStore;
use crate::BoundingSphere;

use super::node::{KdNode, NodeId};
use super::selector::{MedianSplit, SplitSelector};

/// A kd-tree over the triangles of a [`GeometryStore`].
///
/// Nodes live in an arena and reference their children by [`NodeId`]. Children
/// are pushed before their parent, so the root is the last node built.
///
/// # Construction
///
/// ```ignore
/// use kd_collision::{KdTree, MedianSplit, BuildConfig};
///
/// let tree = KdTree::build(geometry);
/// let tree = KdTree::build_with(geometry, &BuildConfig::default(), &MedianSplit);
/// ```
///
/// A subtree whose bounding sphere exceeds
/// [`BuildConfig::max_trace_distance`] is abandoned with a warning and shows
/// up as a missing child. A node past [`BuildConfig::max_recursion_depth`]
/// becomes an empty leaf, so its triangles carry no collision.
#[derive(Debug, Clone)]
pub struct KdTree {
    geometry: GeometryStore,
    config: BuildConfig,
    nodes: Vec<KdNode>,
    root: Option<NodeId>,
    node_count: usize,
    leaf_count: usize,
    depth: usize,
}

impl KdTree {
    /// Builds a tree with the default configuration and [`MedianSplit`].
    pub fn build(geometry: GeometryStore) -> Self {
        Self::build_with(geometry, &BuildConfig::default(), &MedianSplit)
    }

    /// Builds a tree with `config` and [`MedianSplit`].
    pub fn build_with_config(geometry: GeometryStore, config: &BuildConfig) -> Self {
        Self::build_with(geometry, config, &MedianSplit)
    }

    /// Builds a tree using `selector` to choose split planes.
    ///
    /// Returns an empty tree if the geometry has no triangles.
    pub fn build_with<S: SplitSelector>(
        geometry: GeometryStore,
        config: &BuildConfig,
        selector: &S,
    ) -> Self {
        let mut builder = Builder {
            geometry: &geometry,
            config,
            selector,
            nodes: Vec::new(),
            node_count: 0,
            leaf_count: 0,
            depth: 0,
        };

        let root = if geometry.triangles.is_empty() {
            None
        } else {
            let all: Vec<u32> = (0..geometry.triangles.len() as u32).collect();
            builder.build_node(all, 0)
        };

        let Builder {
            nodes,
            node_count,
            leaf_count,
            depth,
            ..
        } = builder;

        debug!(
            "built kd-tree: {} triangles, {} nodes, {} leaves, depth {}",
            geometry.triangles.len(),
            node_count,
            leaf_count,
            depth
        );

        Self {
            geometry,
            config: *config,
            nodes,
            root,
            node_count,
            leaf_count,
            depth,
        }
    }

    /// Returns the geometry the tree was built over.
    #[inline]
    pub fn geometry(&self) -> &GeometryStore {
        &self.geometry
    }

    #[inline]
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    #[inline]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Returns the node with the given id.
    ///
    /// # Panics
    /// Panics if `id` does not come from this tree.
    #[inline]
    pub fn node(&self, id: NodeId) -> &KdNode {
        &self.nodes[id.0]
    }

    /// Returns all nodes, children before parents.
    #[inline]
    pub fn nodes(&self) -> &[KdNode] {
        &self.nodes
    }

    /// Returns `true` if the tree has no root.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of nodes built, leaves included. Depth-overflow leaves are not counted.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    #[inline]
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Number of distinct texture slots.
    #[inline]
    pub fn texture_count(&self) -> usize {
        self.geometry.textures.len()
    }

    /// Deepest recursion level reached (0 for a root-only tree).
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Iterates over the triangle lists of all leaves.
    pub fn leaves(&self) -> impl Iterator<Item = &[u32]> + '_ {
        self.nodes
            .iter()
            .filter(|node| node.is_leaf())
            .map(KdNode::triangles)
    }
}

struct Builder<'a, S> {
    geometry: &'a GeometryStore,
    config: &'a BuildConfig,
    selector: &'a S,
    nodes: Vec<KdNode>,
    node_count: usize,
    leaf_count: usize,
    depth: usize,
}

impl<S: SplitSelector> Builder<'_, S> {
    fn push(&mut self, node: KdNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Recursively builds the node for `triangles` at recursion `depth`.
    fn build_node(&mut self, triangles: Vec<u32>, depth: usize) -> Option<NodeId> {
        self.depth = self.depth.max(depth);

        if depth > self.config.max_recursion_depth {
            warn!(
                "recursion depth {} exceeded, discarding {} triangles from collision",
                depth,
                triangles.len()
            );
            return Some(self.push(KdNode::Leaf {
                triangles: Vec::new(),
                sphere: BoundingSphere::new(Point3::origin(), 0.0),
            }));
        }

        self.node_count += 1;

        let sphere = BoundingSphere::from_points(triangles.iter().flat_map(|&index| {
            *self.geometry.triangle(index as usize).vertices()
        }));
        if sphere.radius > self.config.max_trace_distance {
            warn!(
                "level geometry too large: subtree of {} triangles has radius {}, skipping",
                triangles.len(),
                sphere.radius
            );
            return None;
        }

        if triangles.len() <= self.config.max_triangles_per_leaf {
            return Some(self.leaf(triangles, sphere));
        }

        let split = self
            .selector
            .select(self.geometry, &triangles, depth, self.config.epsilon);

        if split.front.is_empty() || split.back.is_empty() {
            return Some(self.leaf(triangles, sphere));
        }

        let mut front_list = split.front;
        let mut back_list = split.back;
        front_list.extend_from_slice(&split.split);
        back_list.extend_from_slice(&split.split);

        let front = self.build_node(front_list, depth + 1);
        let back = self.build_node(back_list, depth + 1);

        Some(self.push(KdNode::Internal {
            axis: split.axis,
            offset: split.offset,
            sphere,
            front,
            back,
        }))
    }

    fn leaf(&mut self, triangles: Vec<u32>, sphere: BoundingSphere) -> NodeId {
        self.leaf_count += 1;
        self.push(KdNode::Leaf { triangles, sphere })
    }
}
