//! Loading and validation of compiled maps.

use log::{error, info, warn};
use nalgebra::{Point2, Quaternion, Vector4};

use crate::compression;
use crate::config::CollisionConfig;
use crate::error::LoadError;
use crate::format::{
    Section, SectionEntry, WireReader, HEADER_SIZE, MAGIC, TEXTURE_SIZE, VERSION,
};
use crate::geometry::Entity;
use crate::{Axis, BoundingSphere, Plane3D};

use super::{Map, MapLeaf, MapNode, MapTriangle, MapVertex, NodeRef};

impl Map {
    /// Decompresses and loads a compiled map with the default configuration.
    pub fn load(compressed: &[u8]) -> Result<Self, LoadError> {
        Self::load_with_config(compressed, CollisionConfig::default())
    }

    /// Decompresses and loads a compiled map whose queries use `config`.
    pub fn load_with_config(compressed: &[u8], config: CollisionConfig) -> Result<Self, LoadError> {
        let data = compression::decompress(compressed).inspect_err(|e| {
            warn!("map decompression failed: {}", e);
        })?;
        Self::parse_with_config(&data, config)
    }

    /// Loads an uncompressed compiled map with the default configuration.
    pub fn parse(data: &[u8]) -> Result<Self, LoadError> {
        Self::parse_with_config(data, CollisionConfig::default())
    }

    /// Loads an uncompressed compiled map whose queries use `config`.
    ///
    /// Every reference in the map is checked: indices are in range and child
    /// nodes come after their parent, so queries on the result never index
    /// out of bounds and every descent terminates.
    pub fn parse_with_config(data: &[u8], config: CollisionConfig) -> Result<Self, LoadError> {
        let map = parse_sections(data, config)
            .and_then(|map| map.validate().map(|()| map))
            .inspect_err(|e| match e {
                LoadError::IntegrityMarker(_) => error!("map rejected: {}", e),
                _ => warn!("map rejected: {}", e),
            })?;

        info!(
            "loaded map: {} planes, {} textures, {} nodes, {} triangles, {} vertices, {} entities, {} leaves",
            map.planes.len(),
            map.textures.len(),
            map.nodes.len(),
            map.triangles.len(),
            map.vertices.len(),
            map.entities.len(),
            map.leaves.len()
        );
        Ok(map)
    }

    /// Replaces this map with `compressed`, keeping the configuration.
    ///
    /// On failure the map is left unloaded.
    pub fn reload(&mut self, compressed: &[u8]) -> Result<(), LoadError> {
        let config = self.config;
        self.unload();
        *self = Self::load_with_config(compressed, config)?;
        Ok(())
    }

    fn validate(&self) -> Result<(), LoadError> {
        for (index, node) in self.nodes.iter().enumerate() {
            if node.plane as usize >= self.planes.len() {
                return Err(LoadError::BadPlaneReference {
                    node: index,
                    plane: node.plane,
                });
            }
            for child in [node.front, node.back] {
                // Nodes are stored in pre-order, so a child always follows its parent.
                let valid = match child {
                    NodeRef::Node(i) => i > index && i < self.nodes.len(),
                    NodeRef::Leaf(i) => i < self.leaves.len(),
                };
                if !valid {
                    return Err(LoadError::BadChildReference {
                        node: index,
                        reference: child.to_wire(),
                    });
                }
            }
        }

        for (index, triangle) in self.triangles.iter().enumerate() {
            if let Some(&vertex) = triangle
                .vertices
                .iter()
                .find(|&&v| v as usize >= self.vertices.len())
            {
                return Err(LoadError::BadTriangleVertex {
                    triangle: index,
                    vertex,
                });
            }
            if triangle.texture as usize >= self.textures.len() {
                return Err(LoadError::BadTriangleTexture {
                    triangle: index,
                    texture: triangle.texture,
                });
            }
        }

        for (index, leaf) in self.leaves.iter().enumerate() {
            if let Some(&triangle) = leaf
                .triangles
                .iter()
                .find(|&&t| t as usize >= self.triangles.len())
            {
                return Err(LoadError::BadLeafTriangle {
                    leaf: index,
                    triangle,
                });
            }
        }

        Ok(())
    }
}

fn parse_sections(data: &[u8], config: CollisionConfig) -> Result<Map, LoadError> {
    let mut header = WireReader::new(data);
    let magic = header.u32()?;
    if magic != MAGIC {
        return Err(LoadError::BadMagic(magic));
    }
    let version = header.u32()?;
    if version != VERSION {
        return Err(LoadError::BadVersion(version));
    }

    let mut entries = [SectionEntry::default(); 7];
    for (entry, section) in entries.iter_mut().zip(Section::ALL) {
        *entry = SectionEntry {
            offset: header.u32()? as usize,
            length: header.u32()? as usize,
        };
        check_entry(section, *entry, data.len())?;
    }
    let [planes, textures, nodes, triangles, vertices, entities, leaves] = entries;

    let mut map = Map::with_config(config);

    let mut reader = WireReader::section(data, planes);
    while !reader.is_empty() {
        let tag = reader.u8()?;
        reader.take(3)?;
        let offset = reader.f32()?;
        let axis = Axis::from_index(tag as usize).ok_or(LoadError::BadPlaneAxis {
            index: map.planes.len(),
            axis: tag,
        })?;
        map.planes.push(Plane3D::axis_aligned(axis, offset));
    }

    let mut reader = WireReader::section(data, textures);
    while !reader.is_empty() {
        let record = reader.take(TEXTURE_SIZE)?;
        let end = record.iter().position(|&b| b == 0).unwrap_or(record.len());
        map.textures
            .push(String::from_utf8_lossy(&record[..end]).into_owned());
    }

    let mut reader = WireReader::section(data, nodes);
    while !reader.is_empty() {
        let plane = reader.u32()?;
        let front = NodeRef::from_wire(reader.i32()?);
        let back = NodeRef::from_wire(reader.i32()?);
        let radius = reader.f32()?;
        let center = reader.point3()?;
        map.nodes.push(MapNode {
            plane,
            front,
            back,
            sphere: BoundingSphere::new(center, radius),
        });
    }

    let mut reader = WireReader::section(data, triangles);
    while !reader.is_empty() {
        let texture = reader.u32()?;
        let vertices = [reader.u32()?, reader.u32()?, reader.u32()?];
        map.triangles.push(MapTriangle { texture, vertices });
    }

    let mut reader = WireReader::section(data, vertices);
    while !reader.is_empty() {
        let position = reader.point3()?;
        let normal = reader.vec3()?;
        let tex_coord = Point2::new(reader.f32()?, reader.f32()?);
        let tangent = Vector4::new(reader.f32()?, reader.f32()?, reader.f32()?, reader.f32()?);
        reader.take(8)?;
        map.vertices.push(MapVertex {
            position,
            normal,
            tex_coord,
            tangent,
        });
    }

    let mut reader = WireReader::section(data, entities);
    while !reader.is_empty() {
        let id = reader.u32()?;
        let origin = reader.point3()?;
        let [x, y, z, w] = [reader.f32()?, reader.f32()?, reader.f32()?, reader.f32()?];
        map.entities.push(Entity {
            id,
            origin,
            rotation: Quaternion::new(w, x, y, z),
        });
    }

    let mut reader = WireReader::section(data, leaves);
    while !reader.is_empty() {
        let count = reader.u32()? as usize;
        let bytes = reader.take(count.saturating_mul(4))?;
        let triangles = bytes
            .chunks_exact(4)
            .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        map.leaves.push(MapLeaf { triangles });
    }

    let mut trailer = WireReader::new(data);
    trailer.take(leaves.offset + leaves.length)?;
    let marker = trailer.u32()?;
    if marker != MAGIC {
        return Err(LoadError::IntegrityMarker(marker));
    }

    Ok(map)
}

fn check_entry(section: Section, entry: SectionEntry, total: usize) -> Result<(), LoadError> {
    let in_bounds = entry
        .offset
        .checked_add(entry.length)
        .is_some_and(|end| entry.offset >= HEADER_SIZE && end <= total);
    if !in_bounds {
        return Err(LoadError::SectionBounds {
            section,
            offset: entry.offset,
            length: entry.length,
            total,
        });
    }
    match section.stride() {
        Some(stride) if entry.length % stride != 0 => Err(LoadError::SectionSize {
            section,
            length: entry.length,
            stride,
        }),
        _ => Ok(()),
    }
}
