//! Serializer from [`KdTree`] to the compiled wire format.

use std::io;

use log::debug;
use nalgebra::Point3;

use crate::compression;
use crate::geometry::Entity;
use crate::import::DEFAULT_TEXTURE;
use crate::kd::{KdNode, KdTree, NodeId};
use crate::map::{MapLeaf, MapNode, MapTriangle, MapVertex, NodeRef};
use crate::{Axis, BoundingSphere};

use super::{
    generate_tangents, Section, SectionEntry, WireWriter, ENTITY_SIZE, HEADER_SIZE, MAGIC,
    NODE_SIZE, PLANE_SIZE, TEXTURE_SIZE, TRIANGLE_SIZE, VERSION, VERTEX_SIZE,
};

impl KdTree {
    /// Serializes the tree into an uncompressed compiled map.
    pub fn serialize(&self) -> Vec<u8> {
        serialize(self)
    }

    /// Serializes and compresses the tree, ready to be written to disk.
    pub fn compile(&self) -> io::Result<Vec<u8>> {
        compression::compress(&self.serialize())
    }
}

/// Flat records in wire order.
#[derive(Debug, Default)]
struct Sections {
    planes: Vec<(Axis, f32)>,
    textures: Vec<String>,
    nodes: Vec<MapNode>,
    triangles: Vec<MapTriangle>,
    vertices: Vec<MapVertex>,
    entities: Vec<Entity>,
    leaves: Vec<MapLeaf>,
}

/// Serializes `tree` into an uncompressed compiled map.
pub fn serialize(tree: &KdTree) -> Vec<u8> {
    let mut sections = Sections::default();
    add_triangles(tree, &mut sections);

    if let Some(root) = tree.root() {
        add_node(tree, Some(root), &mut sections);
    }

    sections.entities = tree.geometry().entities.clone();
    generate_tangents(&mut sections.vertices, &sections.triangles);

    if sections.nodes.is_empty() {
        if sections.leaves.is_empty() {
            sections.leaves.push(MapLeaf::default());
        }
        sections.planes.push((Axis::X, 0.0));
        sections.nodes.push(MapNode {
            plane: (sections.planes.len() - 1) as u32,
            front: NodeRef::Leaf(0),
            back: NodeRef::Leaf(0),
            sphere: BoundingSphere::new(Point3::origin(), tree.config().max_trace_distance - 1.0),
        });
    }
    if sections.entities.is_empty() {
        sections.entities.push(Entity::default());
    }

    let bytes = sections.encode();
    debug!(
        "serialized map: {} planes, {} textures, {} nodes, {} triangles, {} vertices, {} entities, {} leaves ({} bytes)",
        sections.planes.len(),
        sections.textures.len(),
        sections.nodes.len(),
        sections.triangles.len(),
        sections.vertices.len(),
        sections.entities.len(),
        sections.leaves.len(),
        bytes.len()
    );
    bytes
}

/// Emits one record per source triangle, welding vertices whose position and
/// texture coordinate match within the build epsilon.
fn add_triangles(tree: &KdTree, sections: &mut Sections) {
    let geometry = tree.geometry();
    let epsilon = tree.config().epsilon;
    sections.triangles.reserve(geometry.triangles.len());

    for source in &geometry.triangles {
        let name = geometry
            .textures
            .get(source.texture as usize)
            .map_or(DEFAULT_TEXTURE, String::as_str);
        let texture = texture_index(&mut sections.textures, name);

        let mut vertices = [0u32; 3];
        for (slot, (&position, &tex_coord)) in vertices
            .iter_mut()
            .zip(source.vertices.iter().zip(&source.tex_coords))
        {
            let vertex = MapVertex::new(
                geometry.positions[position as usize],
                geometry.tex_coord(tex_coord),
            );
            // Newest first: neighbouring triangles usually share vertices.
            let found = sections
                .vertices
                .iter()
                .rposition(|other| same_vertex(other, &vertex, epsilon));
            *slot = match found {
                Some(index) => index as u32,
                None => {
                    sections.vertices.push(vertex);
                    (sections.vertices.len() - 1) as u32
                }
            };
        }

        sections.triangles.push(MapTriangle { texture, vertices });
    }
}

fn same_vertex(a: &MapVertex, b: &MapVertex, epsilon: f32) -> bool {
    (a.position - b.position).iter().all(|d| d.abs() < epsilon)
        && (a.tex_coord.x - b.tex_coord.x).abs() < epsilon
        && (a.tex_coord.y - b.tex_coord.y).abs() < epsilon
}

/// Index of the texture called `name`, truncated to fit its record.
fn texture_index(textures: &mut Vec<String>, name: &str) -> u32 {
    let name = truncate_name(name);
    match textures.iter().position(|t| t == name) {
        Some(index) => index as u32,
        None => {
            textures.push(name.to_owned());
            (textures.len() - 1) as u32
        }
    }
}

/// Longest prefix of `name` that fits a texture record with its NUL.
fn truncate_name(name: &str) -> &str {
    let mut end = name.len().min(TEXTURE_SIZE - 1);
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

/// Writes `node` and its subtree in pre-order and returns its reference.
/// Abandoned subtrees become empty leaves.
fn add_node(tree: &KdTree, node: Option<NodeId>, sections: &mut Sections) -> NodeRef {
    let Some(id) = node else {
        return add_leaf(Vec::new(), sections);
    };

    match tree.node(id) {
        KdNode::Leaf { triangles, .. } => add_leaf(triangles.clone(), sections),
        KdNode::Internal {
            axis,
            offset,
            sphere,
            front,
            back,
        } => {
            sections.planes.push((*axis, *offset));
            let index = sections.nodes.len();
            sections.nodes.push(MapNode {
                plane: (sections.planes.len() - 1) as u32,
                front: NodeRef::Leaf(0),
                back: NodeRef::Leaf(0),
                sphere: *sphere,
            });

            let front = add_node(tree, *front, sections);
            let back = add_node(tree, *back, sections);
            sections.nodes[index].front = front;
            sections.nodes[index].back = back;
            NodeRef::Node(index)
        }
    }
}

fn add_leaf(triangles: Vec<u32>, sections: &mut Sections) -> NodeRef {
    sections.leaves.push(MapLeaf { triangles });
    NodeRef::Leaf(sections.leaves.len() - 1)
}

impl Sections {
    fn lengths(&self) -> [usize; 7] {
        let leaves: usize = self.leaves.iter().map(|l| 4 + 4 * l.triangles.len()).sum();
        [
            self.planes.len() * PLANE_SIZE,
            self.textures.len() * TEXTURE_SIZE,
            self.nodes.len() * NODE_SIZE,
            self.triangles.len() * TRIANGLE_SIZE,
            self.vertices.len() * VERTEX_SIZE,
            self.entities.len() * ENTITY_SIZE,
            leaves,
        ]
    }

    fn encode(&self) -> Vec<u8> {
        let lengths = self.lengths();
        let total = HEADER_SIZE + lengths.iter().sum::<usize>() + 4;
        let mut out = WireWriter::with_capacity(total);

        out.put_u32(MAGIC);
        out.put_u32(VERSION);

        let mut offset = HEADER_SIZE;
        for (section, length) in Section::ALL.into_iter().zip(lengths) {
            let entry = SectionEntry { offset, length };
            debug!("{:?}: offset {}, {} bytes", section, entry.offset, entry.length);
            out.put_u32(entry.offset as u32);
            out.put_u32(entry.length as u32);
            offset += length;
        }

        for &(axis, offset) in &self.planes {
            out.put_u8(axis.index() as u8);
            out.put_bytes(&[0; 3]);
            out.put_f32(offset);
        }

        for name in &self.textures {
            let mut record = [0u8; TEXTURE_SIZE];
            record[..name.len()].copy_from_slice(name.as_bytes());
            out.put_bytes(&record);
        }

        for node in &self.nodes {
            out.put_u32(node.plane);
            out.put_i32(node.front.to_wire());
            out.put_i32(node.back.to_wire());
            out.put_f32(node.sphere.radius);
            out.put_vec3(&node.sphere.center.coords);
        }

        for triangle in &self.triangles {
            out.put_u32(triangle.texture);
            for index in triangle.vertices {
                out.put_u32(index);
            }
        }

        for vertex in &self.vertices {
            out.put_vec3(&vertex.position.coords);
            out.put_vec3(&vertex.normal);
            out.put_f32(vertex.tex_coord.x);
            out.put_f32(vertex.tex_coord.y);
            for component in vertex.tangent.iter() {
                out.put_f32(*component);
            }
            out.put_f32(0.0);
            out.put_f32(0.0);
        }

        for entity in &self.entities {
            out.put_u32(entity.id);
            out.put_vec3(&entity.origin.coords);
            let q = &entity.rotation;
            out.put_f32(q.i);
            out.put_f32(q.j);
            out.put_f32(q.k);
            out.put_f32(q.w);
        }

        for leaf in &self.leaves {
            out.put_u32(leaf.triangles.len() as u32);
            for &index in &leaf.triangles {
                out.put_u32(index);
            }
        }

        out.put_u32(MAGIC);
        debug_assert_eq!(out.len(), total);
        out.into_inner()
    }
}
