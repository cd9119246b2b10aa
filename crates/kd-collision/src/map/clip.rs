//! Slide response.

use nalgebra::Vector3;

use crate::config::STOP_EPSILON;

use super::Map;

/// Removes the part of `velocity` going into a surface with `normal`.
///
/// The normal component is scaled by `over_bounce` when moving into the
/// surface and divided by it when moving away, then subtracted. Output
/// components smaller than [`STOP_EPSILON`] in magnitude are zeroed.
pub fn clip_velocity(
    velocity: Vector3<f32>,
    normal: Vector3<f32>,
    over_bounce: f32,
) -> Vector3<f32> {
    clip(velocity, normal, over_bounce, STOP_EPSILON)
}

fn clip(
    velocity: Vector3<f32>,
    normal: Vector3<f32>,
    over_bounce: f32,
    stop_epsilon: f32,
) -> Vector3<f32> {
    let mut backoff = velocity.dot(&normal);
    if backoff < 0.0 {
        backoff *= over_bounce;
    } else {
        backoff /= over_bounce;
    }

    (velocity - normal * backoff).map(|v| if v.abs() < stop_epsilon { 0.0 } else { v })
}

impl Map {
    /// [`clip_velocity`] with the configured
    /// [`stop_epsilon`](crate::CollisionConfig::stop_epsilon).
    #[inline]
    pub fn clip_velocity(
        &self,
        velocity: Vector3<f32>,
        normal: Vector3<f32>,
        over_bounce: f32,
    ) -> Vector3<f32> {
        clip(velocity, normal, over_bounce, self.config.stop_epsilon)
    }
}
