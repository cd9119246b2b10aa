//! Tunables for tree construction and collision queries.
//!
//! The constants carry the values the map format and the movement code were
//! tuned against. [`BuildConfig`] and [`CollisionConfig`] group them so a host
//! can override individual values, for instance from a TOML table.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Upper bound on a node's bounding-sphere radius and on a trace distance.
pub const MAX_TRACE_DISTANCE: f32 = 99999.999;

/// Plane offset used to classify points during building and tree descent.
pub const BUILD_EPSILON: f32 = 0.01;

/// Nodes holding this many triangles or fewer become leaves.
pub const MAX_TRIANGLES_PER_LEAF: usize = 5;

/// Deepest recursion level the builder descends to.
pub const MAX_RECURSION_DEPTH: usize = 35;

/// Distance (2cm) kept between a swept sphere and the surface it hits.
pub const TRACE_BIAS: f32 = 0.02;

/// Trace fractions below this (0.5% of the displacement) snap to zero.
pub const MIN_FRACTION: f32 = 0.005;

/// Velocity components smaller than this are cancelled by [`clip_velocity`](crate::clip_velocity).
pub const STOP_EPSILON: f32 = 0.2;

/// Default over-bounce for slide response. Lower values are stickier.
pub const OVER_CLIP: f32 = 1.01;

/// Tolerance for parallel tests, unit-length tests and degenerate texture mappings.
pub const MATH_EPSILON: f32 = 1e-5;

/// Parameters of [`KdTree::build_with_config`](crate::KdTree::build_with_config).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Subtrees whose bounding radius exceeds this are abandoned.
    pub max_trace_distance: f32,
    /// Point classification tolerance, also used for vertex welding.
    pub epsilon: f32,
    pub max_triangles_per_leaf: usize,
    pub max_recursion_depth: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            max_trace_distance: MAX_TRACE_DISTANCE,
            epsilon: BUILD_EPSILON,
            max_triangles_per_leaf: MAX_TRIANGLES_PER_LEAF,
            max_recursion_depth: MAX_RECURSION_DEPTH,
        }
    }
}

impl BuildConfig {
    /// Reads a configuration from TOML. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

/// Parameters used by every query on a [`Map`](crate::Map).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Split-plane classification tolerance during descent.
    pub epsilon: f32,
    pub trace_bias: f32,
    pub min_fraction: f32,
    pub stop_epsilon: f32,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            epsilon: BUILD_EPSILON,
            trace_bias: TRACE_BIAS,
            min_fraction: MIN_FRACTION,
            stop_epsilon: STOP_EPSILON,
        }
    }
}

impl CollisionConfig {
    /// Reads a configuration from TOML. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}
