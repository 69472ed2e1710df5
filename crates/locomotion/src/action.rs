//! # Action Scaling
//!
//! Maps normalised policy outputs in `[-1, 1]` to joint position targets.

use crate::config::RobotConfig;
use physics::JointLimits;

/// Clamps one raw action component into `[-1, 1]`; NaN becomes 0.
#[must_use]
pub fn clamp_action(a: f32) -> f32 {
    if a.is_nan() {
        0.0
    } else {
        a.clamp(-1.0, 1.0)
    }
}

/// Converts a raw action into joint targets.
///
/// With `ACTION_LIMIT > 0` each target moves around the home posture by at
/// most `ACTION_LIMIT` times half the joint's native range, so the whole
/// action interval spans exactly `ACTION_LIMIT` of that range. With
/// `ACTION_LIMIT == 0` the action covers the full native range from `lower`
/// to `upper`. Targets are not clipped to the limits here; the physics
/// backend enforces them.
///
/// `raw`, `home` and `limits` must have the same length.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn scale_action(
    raw: &[f32],
    config: &RobotConfig,
    home: &[f32],
    limits: &[JointLimits],
) -> Vec<f32> {
    let action_limit = config.action_limit;
    debug_assert_eq!(raw.len(), home.len());
    debug_assert_eq!(raw.len(), limits.len());
    raw.iter()
        .zip(home)
        .zip(limits)
        .map(|((&a, &home), limits)| {
            let a = clamp_action(a);
            let span = limits.span();
            if action_limit == 0.0 {
                limits.lower + (a + 1.0) / 2.0 * span
            } else {
                home + a * action_limit * span / 2.0
            }
        })
        .collect()
}
