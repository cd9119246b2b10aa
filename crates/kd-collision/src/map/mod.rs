//! Runtime collision map.
//!
//! A [`Map`] is the loaded, flat form of a compiled kd-tree. It holds no
//! building logic: nodes reference planes and children by index, leaves list
//! triangle indices, and every query walks these arrays from node 0.
//!
//! A map is replaced as a whole on [`Map::reload`] or [`Map::unload`] and is
//! read-only otherwise, so queries take `&self`.

mod clip;
mod load;
mod stuck;
mod trace;

pub use clip::clip_velocity;
pub use trace::{TraceHit, TraceResult};

use nalgebra::{Point2, Point3, Vector3, Vector4};

use crate::config::CollisionConfig;
use crate::geometry::Entity;
use crate::{BoundingSphere, Plane3D, Triangle};

/// Child reference of a [`MapNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef {
    Node(usize),
    Leaf(usize),
}

impl NodeRef {
    /// Decodes the wire form: `>= 0` is a node index, `< 0` the complement of
    /// a leaf index.
    pub fn from_wire(value: i32) -> Self {
        if value < 0 {
            NodeRef::Leaf(!value as usize)
        } else {
            NodeRef::Node(value as usize)
        }
    }

    pub fn to_wire(self) -> i32 {
        match self {
            NodeRef::Node(index) => index as i32,
            NodeRef::Leaf(index) => !(index as i32),
        }
    }
}

/// An internal node: an axis-aligned split plane and two children.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapNode {
    /// Index into [`Map::planes`]
    pub plane: u32,
    pub front: NodeRef,
    pub back: NodeRef,
    pub sphere: BoundingSphere,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapTriangle {
    /// Index into [`Map::textures`]
    pub texture: u32,
    /// Indices into [`Map::vertices`]
    pub vertices: [u32; 3],
}

/// A welded vertex with its tangent frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapVertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
    pub tex_coord: Point2<f32>,
    /// Tangent in `xyz`, bitangent handedness (+1 or -1) in `w`.
    pub tangent: Vector4<f32>,
}

impl MapVertex {
    /// A vertex with no tangent frame yet.
    pub fn new(position: Point3<f32>, tex_coord: Point2<f32>) -> Self {
        Self {
            position,
            normal: Vector3::zeros(),
            tex_coord,
            tangent: Vector4::zeros(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapLeaf {
    pub triangles: Vec<u32>,
}

/// A loaded collision map.
///
/// The default map is unloaded: it has no nodes, and every query reports
/// no contact.
#[derive(Debug, Clone, Default)]
pub struct Map {
    planes: Vec<Plane3D>,
    textures: Vec<String>,
    nodes: Vec<MapNode>,
    triangles: Vec<MapTriangle>,
    vertices: Vec<MapVertex>,
    entities: Vec<Entity>,
    leaves: Vec<MapLeaf>,
    config: CollisionConfig,
}

impl Map {
    /// Creates an unloaded map with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an unloaded map whose queries use `config`.
    pub fn with_config(config: CollisionConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Returns `true` once a map with at least one node has been loaded.
    #[inline]
    pub fn is_loaded(&self) -> bool {
        !self.nodes.is_empty()
    }

    /// Drops all map data, keeping the configuration.
    pub fn unload(&mut self) {
        *self = Self::with_config(self.config);
    }

    #[inline]
    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    #[inline]
    pub fn planes(&self) -> &[Plane3D] {
        &self.planes
    }

    #[inline]
    pub fn textures(&self) -> &[String] {
        &self.textures
    }

    #[inline]
    pub fn nodes(&self) -> &[MapNode] {
        &self.nodes
    }

    #[inline]
    pub fn triangles(&self) -> &[MapTriangle] {
        &self.triangles
    }

    #[inline]
    pub fn vertices(&self) -> &[MapVertex] {
        &self.vertices
    }

    #[inline]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    #[inline]
    pub fn leaves(&self) -> &[MapLeaf] {
        &self.leaves
    }

    /// Returns the positions of triangle `index`.
    ///
    /// # Panics
    /// Panics if `index` is out of range. Vertex indices are validated on load.
    pub fn triangle(&self, index: usize) -> Triangle {
        let [a, b, c] = self.triangles[index].vertices;
        Triangle::new(
            self.vertices[a as usize].position,
            self.vertices[b as usize].position,
            self.vertices[c as usize].position,
        )
    }

    /// Root of the tree, if loaded.
    fn root(&self) -> Option<NodeRef> {
        self.is_loaded().then_some(NodeRef::Node(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_ref_wire_encoding() {
        assert_eq!(NodeRef::from_wire(0), NodeRef::Node(0));
        assert_eq!(NodeRef::from_wire(12), NodeRef::Node(12));
        assert_eq!(NodeRef::from_wire(-1), NodeRef::Leaf(0));
        assert_eq!(NodeRef::from_wire(-5), NodeRef::Leaf(4));
        assert_eq!(NodeRef::Leaf(0).to_wire(), -1);
        assert_eq!(NodeRef::Leaf(9).to_wire(), -10);
        assert_eq!(NodeRef::Node(3).to_wire(), 3);
    }

    #[test]
    fn default_map_is_unloaded() {
        let map = Map::new();
        assert!(!map.is_loaded());
        assert!(map.nodes().is_empty());
        assert_eq!(map.config(), &CollisionConfig::default());
    }

    #[test]
    fn unload_keeps_config() {
        let config = CollisionConfig {
            stop_epsilon: 0.5,
            ..Default::default()
        };
        let mut map = Map::with_config(config);
        map.nodes.push(MapNode {
            plane: 0,
            front: NodeRef::Leaf(0),
            back: NodeRef::Leaf(0),
            sphere: BoundingSphere::new(Point3::origin(), 1.0),
        });
        assert!(map.is_loaded());

        map.unload();
        assert!(!map.is_loaded());
        assert_eq!(map.config().stop_epsilon, 0.5);
    }
}
