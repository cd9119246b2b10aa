//! Offline kd-tree construction over level triangles.
//!
//! The builder recursively partitions a triangle index set with axis-aligned
//! planes until each node holds only a handful of triangles. Triangles that
//! straddle a split plane are referenced from both children rather than cut,
//! so a triangle index can appear in several leaves.
//!
//! # Example
//!
//! ```ignore
//! use kd_collision::{import::parse_geometry, KdTree};
//!
//! let geometry = parse_geometry(&std::fs::read_to_string("level.obj")?)?;
//! let tree = KdTree::build(geometry);
//! let compiled = tree.compile()?;
//! ```
//!
//! # Architecture
//!
//! - [`KdTree`]: owns the geometry and an arena of nodes
//! - [`KdNode`]: an internal split node or a leaf holding triangle indices
//! - [`SplitSelector`]: strategy choosing the split plane of a node

mod node;
mod selector;
mod tree;

pub use node::{KdNode, NodeId};
pub use selector::{AxisSplit, MedianSplit, SplitSelector};
pub use tree::KdTree;
