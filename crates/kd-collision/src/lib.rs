//! Kd-tree collision geometry for static level meshes.
//!
//! Level triangles are imported into a [`GeometryStore`], partitioned offline
//! into a [`KdTree`] and compiled into a compressed binary map. At runtime the
//! map is loaded into a flat [`Map`] that answers swept-sphere traces, static
//! overlap tests and slide responses.
//!
//! ```ignore
//! use kd_collision::{import::parse_geometry, KdTree, Map, OVER_CLIP};
//!
//! let tree = KdTree::build(parse_geometry(&source)?);
//! let map = Map::load(&tree.compile()?)?;
//!
//! let trace = map.trace_sphere(position, velocity * dt, radius);
//! if let Some(hit) = trace.hit {
//!     velocity = map.clip_velocity(velocity, hit.normal, OVER_CLIP);
//! }
//! ```

pub mod compression;
pub mod config;
pub mod error;
pub mod format;
pub mod geometry;
pub mod import;
pub mod intersect;
pub mod kd;
pub mod map;
mod plane;
mod sphere;
mod triangle;

pub use config::{
    BuildConfig, CollisionConfig, BUILD_EPSILON, MATH_EPSILON, MAX_RECURSION_DEPTH,
    MAX_TRACE_DISTANCE, MAX_TRIANGLES_PER_LEAF, MIN_FRACTION, OVER_CLIP, STOP_EPSILON, TRACE_BIAS,
};
pub use error::{ConfigError, ImportError, LoadError};
pub use geometry::{Entity, GeometryStore, SourceTriangle};
pub use kd::{AxisSplit, KdNode, KdTree, MedianSplit, NodeId, SplitSelector};
pub use map::{
    clip_velocity, Map, MapLeaf, MapNode, MapTriangle, MapVertex, NodeRef, TraceHit, TraceResult,
};
pub use plane::{Axis, Plane3D, PlaneSide};
pub use sphere::BoundingSphere;
pub use triangle::{Triangle, TriangleSide};
