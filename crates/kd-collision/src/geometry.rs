//! Raw level geometry as produced by the importer.

use nalgebra::{Point2, Point3, Quaternion};

use crate::Triangle;

/// A placed entity: an id with an origin and a rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entity {
    pub id: u32,
    pub origin: Point3<f32>,
    pub rotation: Quaternion<f32>,
}

impl Default for Entity {
    fn default() -> Self {
        Self {
            id: 0,
            origin: Point3::origin(),
            rotation: Quaternion::identity(),
        }
    }
}

/// A triangle as imported: indices into the store's position, texture
/// coordinate and texture arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceTriangle {
    pub vertices: [u32; 3],
    pub tex_coords: [u32; 3],
    pub texture: u32,
}

/// Vertex, triangle, texture and entity arrays for one level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryStore {
    pub positions: Vec<Point3<f32>>,
    pub tex_coords: Vec<Point2<f32>>,
    pub triangles: Vec<SourceTriangle>,
    pub textures: Vec<String>,
    pub entities: Vec<Entity>,
}

impl GeometryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the slot index of the texture called `name`, adding it if needed.
    pub fn texture_slot(&mut self, name: &str) -> u32 {
        match self.textures.iter().position(|t| t == name) {
            Some(index) => index as u32,
            None => {
                self.textures.push(name.to_owned());
                (self.textures.len() - 1) as u32
            }
        }
    }

    /// Returns the positions of triangle `index`.
    ///
    /// # Panics
    /// Panics if the triangle or one of its vertex indices is out of range.
    pub fn triangle(&self, index: usize) -> Triangle {
        let [a, b, c] = self.triangles[index].vertices;
        Triangle::new(
            self.positions[a as usize],
            self.positions[b as usize],
            self.positions[c as usize],
        )
    }

    /// Returns the texture coordinate at `index`, or the origin if there is none.
    pub fn tex_coord(&self, index: u32) -> Point2<f32> {
        self.tex_coords
            .get(index as usize)
            .copied()
            .unwrap_or_else(Point2::origin)
    }
}
