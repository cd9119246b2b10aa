//! Compiled map wire format.
//!
//! A compiled map is a little-endian byte buffer:
//!
//! ```text
//! u32 magic, u32 version
//! 7 x (u32 offset, u32 byte length)    planes, textures, nodes, triangles,
//!                                      vertices, entities, leaves
//! section payloads, in the same order
//! u32 magic                            integrity marker
//! ```
//!
//! Every section but the leaves holds fixed-size records. A leaf record is a
//! `u32` triangle count followed by that many `u32` triangle indices.

mod tangent;
mod write;

pub use tangent::generate_tangents;
pub use write::serialize;

use nalgebra::{Point3, Vector3};

use crate::error::LoadError;

/// Leading and trailing marker of a compiled map.
pub const MAGIC: u32 = 0x6655_1133;

/// Format version written and accepted.
pub const VERSION: u32 = 1;

/// Size of the magic, the version and the seven section descriptors.
pub const HEADER_SIZE: usize = 8 + Section::ALL.len() * 8;

pub const PLANE_SIZE: usize = 8;
pub const TEXTURE_SIZE: usize = 64;
pub const NODE_SIZE: usize = 28;
pub const TRIANGLE_SIZE: usize = 16;
pub const VERTEX_SIZE: usize = 56;
pub const ENTITY_SIZE: usize = 32;

/// The sections of a compiled map, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Planes,
    Textures,
    Nodes,
    Triangles,
    Vertices,
    Entities,
    Leaves,
}

impl Section {
    pub const ALL: [Section; 7] = [
        Section::Planes,
        Section::Textures,
        Section::Nodes,
        Section::Triangles,
        Section::Vertices,
        Section::Entities,
        Section::Leaves,
    ];

    /// Record size, or `None` for the variable-length leaves.
    pub fn stride(self) -> Option<usize> {
        match self {
            Section::Planes => Some(PLANE_SIZE),
            Section::Textures => Some(TEXTURE_SIZE),
            Section::Nodes => Some(NODE_SIZE),
            Section::Triangles => Some(TRIANGLE_SIZE),
            Section::Vertices => Some(VERTEX_SIZE),
            Section::Entities => Some(ENTITY_SIZE),
            Section::Leaves => None,
        }
    }
}

/// Location of a section payload within the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SectionEntry {
    pub offset: usize,
    pub length: usize,
}

/// Appends little-endian scalars to a buffer.
#[derive(Debug, Default)]
pub(crate) struct WireWriter {
    buf: Vec<u8>,
}

impl WireWriter {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn put_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn put_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_f32(&mut self, value: f32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn put_vec3(&mut self, v: &Vector3<f32>) {
        self.put_f32(v.x);
        self.put_f32(v.y);
        self.put_f32(v.z);
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

/// Reads little-endian scalars from a byte slice.
///
/// Offsets in errors are relative to `base`, the position of the slice in the
/// whole buffer.
#[derive(Debug, Clone)]
pub(crate) struct WireReader<'a> {
    data: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            base: 0,
        }
    }

    /// Reader over `entry` of `data`, which must already be bounds-checked.
    pub fn section(data: &'a [u8], entry: SectionEntry) -> Self {
        Self {
            data: &data[entry.offset..entry.offset + entry.length],
            pos: 0,
            base: entry.offset,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pos == self.data.len()
    }

    pub fn take(&mut self, len: usize) -> Result<&'a [u8], LoadError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or(LoadError::Truncated {
                offset: self.base + self.pos,
                needed: len,
            })?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    pub fn take_array<const N: usize>(&mut self) -> Result<[u8; N], LoadError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn u8(&mut self) -> Result<u8, LoadError> {
        Ok(self.take_array::<1>()?[0])
    }

    pub fn u32(&mut self) -> Result<u32, LoadError> {
        self.take_array().map(u32::from_le_bytes)
    }

    pub fn i32(&mut self) -> Result<i32, LoadError> {
        self.take_array().map(i32::from_le_bytes)
    }

    pub fn f32(&mut self) -> Result<f32, LoadError> {
        self.take_array().map(f32::from_le_bytes)
    }

    pub fn vec3(&mut self) -> Result<Vector3<f32>, LoadError> {
        Ok(Vector3::new(self.f32()?, self.f32()?, self.f32()?))
    }

    pub fn point3(&mut self) -> Result<Point3<f32>, LoadError> {
        self.vec3().map(Point3::from)
    }
}
