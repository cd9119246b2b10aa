//! Parser for the line-based level geometry format.
//!
//! ```text
//! v x y z                      vertex position
//! vt u v [w]                   texture coordinate (w ignored)
//! ent id ox oy oz rx ry rz rw  placed entity
//! g name                       texture slot for following faces
//! f a/ta b/tb c/tc             triangle, 1-based indices
//! f a/ta/sa b/tb/sb c/tc/sc    same, third index ignored
//! ```
//!
//! Unknown directives, comments and blank lines are skipped.

use std::str::FromStr;

use nalgebra::{Point2, Point3, Quaternion};

use crate::error::ImportError;
use crate::geometry::{Entity, GeometryStore, SourceTriangle};

/// Texture slot used by faces declared before any `g` line.
pub const DEFAULT_TEXTURE: &str = "default";

/// Parses level geometry from its text form.
pub fn parse_geometry(source: &str) -> Result<GeometryStore, ImportError> {
    let mut store = GeometryStore::new();
    let mut texture: Option<u32> = None;
    // Faces may reference vertices declared later, so indices are resolved at the end.
    let mut faces: Vec<(usize, [[i64; 2]; 3], u32)> = Vec::new();

    for (number, line) in source.lines().enumerate() {
        let line_no = number + 1;
        let mut tokens = line.split_whitespace();
        let Some(directive) = tokens.next() else {
            continue;
        };
        let operands: Vec<&str> = tokens.collect();
        let malformed = || ImportError::Malformed {
            line: line_no,
            directive: directive.to_owned(),
        };

        match directive {
            "v" => {
                let [x, y, z] = parse_floats::<3>(&operands).ok_or_else(malformed)?;
                store.positions.push(Point3::new(x, y, z));
            }
            "vt" => {
                if !(2..=3).contains(&operands.len()) {
                    return Err(malformed());
                }
                let [u, v] = parse_floats::<2>(&operands[..2]).ok_or_else(malformed)?;
                store.tex_coords.push(Point2::new(u, v));
            }
            "ent" => {
                let (id, rest) = operands.split_first().ok_or_else(malformed)?;
                let id = id.parse::<u32>().map_err(|_| malformed())?;
                let [ox, oy, oz, rx, ry, rz, rw] = parse_floats::<7>(rest).ok_or_else(malformed)?;
                store.entities.push(Entity {
                    id,
                    origin: Point3::new(ox, oy, oz),
                    rotation: Quaternion::new(rw, rx, ry, rz),
                });
            }
            "g" => {
                let [name] = operands.as_slice() else {
                    return Err(malformed());
                };
                texture = Some(store.texture_slot(name));
            }
            "f" => {
                if operands.len() != 3 {
                    return Err(malformed());
                }
                let mut corners = [[0i64; 2]; 3];
                for (corner, operand) in corners.iter_mut().zip(&operands) {
                    *corner = parse_corner(operand).ok_or_else(malformed)?;
                }
                let slot = *texture.get_or_insert_with(|| store.texture_slot(DEFAULT_TEXTURE));
                faces.push((line_no, corners, slot));
            }
            _ => {}
        }
    }

    for (line, corners, slot) in faces {
        let mut triangle = SourceTriangle {
            vertices: [0; 3],
            tex_coords: [0; 3],
            texture: slot,
        };
        for (i, [vertex, tex_coord]) in corners.into_iter().enumerate() {
            triangle.vertices[i] = resolve_index(vertex, store.positions.len(), line)?;
            triangle.tex_coords[i] = resolve_index(tex_coord, store.tex_coords.len(), line)?;
        }
        store.triangles.push(triangle);
    }

    Ok(store)
}

fn parse_floats<const N: usize>(operands: &[&str]) -> Option<[f32; N]> {
    if operands.len() != N {
        return None;
    }
    let mut values = [0.0; N];
    for (value, operand) in values.iter_mut().zip(operands) {
        *value = f32::from_str(operand).ok()?;
    }
    Some(values)
}

/// Parses `a/ta` or `a/ta/sa` into `[a, ta]`.
fn parse_corner(operand: &str) -> Option<[i64; 2]> {
    let parts: Vec<&str> = operand.split('/').collect();
    if !(2..=3).contains(&parts.len()) {
        return None;
    }
    let vertex = parts[0].parse().ok()?;
    let tex_coord = parts[1].parse().ok()?;
    if let Some(extra) = parts.get(2) {
        extra.parse::<i64>().ok()?;
    }
    Some([vertex, tex_coord])
}

fn resolve_index(index: i64, count: usize, line: usize) -> Result<u32, ImportError> {
    if index < 1 || index as usize > count {
        return Err(ImportError::IndexOutOfRange { line, index, count });
    }
    Ok((index - 1) as u32)
}
